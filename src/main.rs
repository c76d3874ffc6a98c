//! device-snapshot - collect a device attribute snapshot of this host
//!
//! Entry point for the CLI binary.

use std::{
    io::{BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use device_snapshot::{
    config::{self, Config},
    encoder,
    permissions::{describe_capabilities, RemediationChoice, SettingsPrompt},
    platform::linux::{FileStore, LinuxHost},
    Capability, CollectCallbacks, CollectionOrchestrator, SnapshotAssembler,
};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for device-snapshot
#[derive(Parser, Debug)]
#[command(name = "device-snapshot")]
#[command(version, about = "Permission-gated device attribute snapshot", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "DEVICE_SNAPSHOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact); defaults to the config value
    #[arg(long)]
    pub log_format: Option<String>,

    /// Write logs to file (in addition to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Output format (base64|json)
    #[arg(long, default_value = "base64")]
    pub format: String,

    /// Print the collection diagnostics instead of the payload
    #[arg(long)]
    pub diagnose: bool,

    /// Decode a payload and pretty-print it, then exit
    #[arg(long, value_name = "PAYLOAD")]
    pub decode: Option<String>,

    /// Request location enrichment
    #[arg(long)]
    pub location: bool,

    /// Request telephony enrichment
    #[arg(long)]
    pub telephony: bool,

    /// Offer to open settings when a capability is permanently denied
    #[arg(long)]
    pub guided: bool,
}

/// Settings prompt on the terminal; "settings" is the config file
struct ConsoleSettingsPrompt {
    config_path: PathBuf,
}

#[async_trait]
impl SettingsPrompt for ConsoleSettingsPrompt {
    async fn prompt_open_settings(&self, permanently_denied: &[Capability]) -> RemediationChoice {
        let body = describe_capabilities(permanently_denied);
        let answer = tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\nPermission required\n{body}Open settings? [y/N] ");
            let _ = stderr.flush();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) if matches!(line.trim(), "y" | "Y" | "yes") => {
                RemediationChoice::OpenSettings
            }
            _ => RemediationChoice::Cancel,
        }
    }

    fn open_app_settings(&self) {
        eprintln!(
            "Edit [permissions] in {} to grant access.",
            self.config_path.display()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(payload) = &args.decode {
        let document = encoder::decode(payload).context("Failed to decode payload")?;
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Invalid configuration: {}", config_path.display()))?
        .with_overrides(args.location, args.telephony, args.guided);

    init_logging(&args, &config.logging)?;

    info!(
        "device-snapshot v{} ({} {}, commit {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("BUILD_DATE").unwrap_or("unknown"),
        option_env!("BUILD_TIME").unwrap_or(""),
        option_env!("GIT_HASH").unwrap_or("unknown")
    );

    let store = FileStore::in_default_location();
    info!("Identity store: {}", store.path().display());
    let host = LinuxHost::new().with_store(store);
    let assembler = SnapshotAssembler::new(Arc::new(host), config.collector_settings());
    let gate = Arc::new(config.permission_gate()?);
    let orchestrator = CollectionOrchestrator::new(gate, assembler).with_settings_prompt(
        Arc::new(ConsoleSettingsPrompt {
            config_path: config_path.clone(),
        }),
    );

    let (tx, rx) = oneshot::channel();
    let callbacks = CollectCallbacks::new(move |payload| {
        let _ = tx.send(payload);
    })
    .on_denied(|denied, permanently_denied| {
        warn!(
            "Collected without: denied={:?}, permanently_denied={:?}",
            denied, permanently_denied
        );
    });

    let summary = orchestrator
        .collect(config.enrichment_flags(), callbacks)
        .await;
    let payload = rx.await.context("Collection finished without a payload")?;

    if args.diagnose {
        println!("Pass: {}", summary.pass);
        println!("Payload: {} bytes", summary.payload_len);
        match &summary.diagnostics {
            Some(diagnostics) => print!("{}", diagnostics.format_text()),
            None => println!("Snapshot failed; an empty payload was delivered"),
        }
    } else if payload.is_empty() {
        anyhow::bail!("Snapshot failed; no payload produced");
    } else {
        match args.format.as_str() {
            "json" => {
                let document = encoder::decode(&payload)?;
                println!("{}", serde_json::to_string_pretty(&document)?);
            }
            _ => println!("{payload}"),
        }
    }

    if let Some(remediation) = summary.remediation {
        let choice = remediation.await.context("Settings prompt failed")?;
        info!("Settings prompt closed: {:?}", choice);
    }

    Ok(())
}

/// Initialize tracing (stderr, plus an optional log file)
fn init_logging(args: &Args, logging_config: &config::LoggingConfig) -> Result<()> {
    use std::fs::{self, File};

    // CLI -v flag overrides config
    let log_level = match args.verbose {
        0 => logging_config.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("device_snapshot={log_level},warn"))
    });

    let format = args
        .log_format
        .clone()
        .unwrap_or_else(|| logging_config.format.clone());

    // CLI --log-file overrides config.log_dir
    let log_file_path: Option<PathBuf> = if let Some(cli_path) = &args.log_file {
        Some(cli_path.clone())
    } else if logging_config.log_dir.is_some() {
        let log_dir = config::resolve_log_dir(&logging_config.log_dir);
        if let Err(e) = fs::create_dir_all(&log_dir) {
            eprintln!(
                "Warning: Cannot create log directory {}: {e}",
                log_dir.display()
            );
            None
        } else {
            let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
            Some(log_dir.join(format!("device-snapshot-{timestamp}.log")))
        }
    } else {
        None
    };

    let log_file = log_file_path
        .as_ref()
        .and_then(|path| match File::create(path) {
            Ok(f) => Some((Arc::new(f), path.clone())),
            Err(e) => {
                eprintln!(
                    "Warning: Cannot create log file {}: {e}, logging to console only",
                    path.display()
                );
                None
            }
        });

    if let Some((file, ref log_file_path)) = log_file {
        match format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
        }
        info!("Logging to file: {}", log_file_path.display());
    } else {
        match format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
        }
    }

    Ok(())
}
