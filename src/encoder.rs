//! Payload encoding
//!
//! The record is wrapped as `{"device_details": {...}}`, serialized to JSON
//! with the record's fixed field order and base64-encoded (standard alphabet,
//! no line wrapping). Encoding never fails from the caller's point of view:
//! an unserializable record yields an empty payload.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::record::AttributeRecord;

/// Key wrapping the attribute map
pub const ENVELOPE_KEY: &str = "device_details";

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Payload has no `device_details` object")]
    MissingEnvelope,
}

#[derive(Serialize)]
struct Envelope<'a> {
    device_details: &'a AttributeRecord,
}

/// Canonical JSON document for `record`
pub fn to_json(record: &AttributeRecord) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(&Envelope {
        device_details: record,
    })?)
}

/// Encoded payload bytes; empty on failure
pub fn encode(record: &AttributeRecord) -> Vec<u8> {
    encode_string(record).into_bytes()
}

/// Encoded payload as text; empty on failure
pub fn encode_string(record: &AttributeRecord) -> String {
    match to_json(record) {
        Ok(json) => STANDARD.encode(json),
        Err(e) => {
            warn!("Dropping unserializable record: {e}");
            String::new()
        }
    }
}

/// Decode a payload back to its JSON document
pub fn decode(payload: &str) -> Result<serde_json::Value, DecodeError> {
    let bytes = STANDARD.decode(payload.trim())?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)?;
    if !value.get(ENVELOPE_KEY).is_some_and(|v| v.is_object()) {
        return Err(DecodeError::MissingEnvelope);
    }
    Ok(value)
}

/// Decode a payload into a typed record
pub fn decode_record(payload: &str) -> Result<AttributeRecord, DecodeError> {
    let mut value = decode(payload)?;
    let details = value
        .get_mut(ENVELOPE_KEY)
        .map(serde_json::Value::take)
        .ok_or(DecodeError::MissingEnvelope)?;
    Ok(serde_json::from_value(details)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_record;

    #[test]
    fn test_encoding_is_deterministic() {
        let record = sample_record();
        assert_eq!(encode(&record), encode(&record));
        assert!(!encode(&record).is_empty());
    }

    #[test]
    fn test_no_line_wrapping() {
        let payload = encode_string(&sample_record());
        assert!(payload.len() > 76);
        assert!(!payload.contains('\n'));
        assert!(!payload.contains('\r'));
    }

    #[test]
    fn test_envelope_and_field_order() {
        let json = to_json(&sample_record()).unwrap();
        assert!(json.starts_with("{\"device_details\":{\"android_id\":"));
        assert!(json.ends_with("}}"));

        let first = json.find("\"android_id\"").unwrap();
        let middle = json.find("\"kernel_arch\"").unwrap();
        let last = json.find("\"device_location\"").unwrap();
        assert!(first < middle && middle < last);
        assert!(json.contains("\"type\":\"android\""));
    }

    #[test]
    fn test_nulls_are_present() {
        let mut record = sample_record();
        record.gsf_id = None;
        record.wifi_mac_address = None;
        let value = decode(&encode_string(&record)).unwrap();
        let details = value[ENVELOPE_KEY].as_object().unwrap();

        assert!(details.contains_key("gsf_id"));
        assert!(details["gsf_id"].is_null());
        assert!(details["wifi_mac_address"].is_null());
    }

    #[test]
    fn test_decode_record() {
        let record = sample_record();
        let decoded = decode_record(&encode_string(&record)).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode("%%%"), Err(DecodeError::Base64(_))));
        assert!(matches!(
            decode(&STANDARD.encode("not json")),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            decode(&STANDARD.encode("{\"other\":1}")),
            Err(DecodeError::MissingEnvelope)
        ));
    }
}
