//! Provider fallback chains
//!
//! A fallback chain tries an ordered list of sources for one logical
//! attribute and keeps the first one that produces a value. Each source is
//! isolated: an error or an empty answer moves on to the next source and is
//! recorded as an [`AttemptResult`] for diagnostics.
//!
//! The concrete chains built on top of [`FallbackChain`]:
//!
//! - [`location`]: external high-accuracy provider → built-in location manager → geocoding
//! - [`network`]: active link → Wi-Fi info, plus the injectable ISP enrichment hook
//! - [`cellular`]: per-slot identifiers → legacy device id, gated on elevated trust

pub mod cellular;
pub mod location;
pub mod network;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{diagnostics::ServiceLevel, platform::ProbeError};

/// Tagged outcome of a chain; never an error
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment<T> {
    Found(T),
    NotAvailable,
}

impl<T> Enrichment<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotAvailable => None,
        }
    }
}

impl<T> From<Option<T>> for Enrichment<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NotAvailable, Self::Found)
    }
}

/// Error from a single source attempt
#[derive(Debug, Error)]
pub enum SourceError {
    /// Source needs a capability that is not granted
    #[error("Missing capability: {0}")]
    MissingCapability(String),

    /// Source is not installed on this host
    #[error("Source absent: {0}")]
    Absent(String),

    /// Underlying platform read failed
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// A source that can be tried as part of a fallback chain
#[async_trait]
pub trait FallbackSource<T>: Send + Sync {
    /// Human-readable name for this source
    fn name(&self) -> &str;

    /// Quick check if this source might work (fast, no I/O)
    fn is_candidate(&self) -> bool {
        true
    }

    /// Try the source; `Ok(None)` means it answered but had nothing
    async fn attempt(&self) -> Result<Option<T>, SourceError>;

    /// Service level a value from this source represents
    fn service_level(&self) -> ServiceLevel;
}

/// Record of an attempt to use a source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    /// Source name
    pub source_name: String,
    /// Did it succeed?
    pub success: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// How long the attempt took (in milliseconds)
    pub duration_ms: u64,
}

impl AttemptResult {
    pub fn success(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            source_name: name.into(),
            success: true,
            error: None,
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            source_name: name.into(),
            success: false,
            error: Some(error.into()),
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Error when no source produced a value
#[derive(Debug, Error)]
#[error("All {count} sources failed")]
pub struct ChainExhausted {
    /// Number of sources tried
    pub count: usize,
    /// Results from each attempt
    pub attempts: Vec<AttemptResult>,
}

/// Ordered list of sources for one attribute
pub struct FallbackChain<T> {
    sources: Vec<Box<dyn FallbackSource<T>>>,
    selected_index: Option<usize>,
    attempts: Vec<AttemptResult>,
}

impl<T> FallbackChain<T> {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            selected_index: None,
            attempts: Vec::new(),
        }
    }

    /// Append a source
    pub fn add<S: FallbackSource<T> + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Append a source when present
    pub fn add_optional(mut self, source: Option<Box<dyn FallbackSource<T>>>) -> Self {
        if let Some(source) = source {
            self.sources.push(source);
        }
        self
    }

    /// Try each source in order and return the first value
    pub async fn execute(&mut self) -> Result<(T, ServiceLevel), ChainExhausted> {
        self.attempts.clear();
        self.selected_index = None;

        for (i, source) in self.sources.iter().enumerate() {
            if !source.is_candidate() {
                self.attempts.push(AttemptResult::failure(
                    source.name(),
                    "Not a candidate on this host",
                    Duration::ZERO,
                ));
                continue;
            }

            let start = Instant::now();
            match source.attempt().await {
                Ok(Some(value)) => {
                    debug!("{} answered in {:?}", source.name(), start.elapsed());
                    self.selected_index = Some(i);
                    self.attempts
                        .push(AttemptResult::success(source.name(), start.elapsed()));
                    return Ok((value, source.service_level()));
                }
                Ok(None) => {
                    debug!("{} had no value", source.name());
                    self.attempts.push(AttemptResult::failure(
                        source.name(),
                        "No value",
                        start.elapsed(),
                    ));
                }
                Err(e) => {
                    debug!("{} failed: {}", source.name(), e);
                    self.attempts.push(AttemptResult::failure(
                        source.name(),
                        e.to_string(),
                        start.elapsed(),
                    ));
                }
            }
        }

        Err(ChainExhausted {
            count: self.sources.len(),
            attempts: self.attempts.clone(),
        })
    }

    /// Get all attempts (for diagnostics)
    pub fn attempts(&self) -> &[AttemptResult] {
        &self.attempts
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected_index
            .and_then(|i| self.sources.get(i))
            .map(|s| s.name())
    }
}

impl<T> Default for FallbackChain<T> {
    fn default() -> Self {
        Self::new()
    }
}
