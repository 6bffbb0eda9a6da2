use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command, value_parser};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use threshold_view::{
    Config, FailurePolicy, HttpBackend, TerminalImage, TerminalLabel, Threshold, ThresholdUpdater,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let matches = Command::new("threshold-view")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Debounced threshold slider client for an image-regenerating backend")
        .arg(
            Arg::new("image")
                .long("image")
                .value_name("FILENAME")
                .help("Uploaded image filename the backend should regenerate")
                .required_unless_present("upload")
                .conflicts_with("upload"),
        )
        .arg(
            Arg::new("upload")
                .long("upload")
                .value_name("PATH")
                .help("Upload a local image first and tune its threshold")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("initial-threshold")
                .long("initial-threshold")
                .value_name("VALUE")
                .help("Threshold sent along with --upload")
                .default_value("128"),
        )
        .arg(
            Arg::new("server")
                .long("server")
                .value_name("URL")
                .help("Backend base URL (overrides config and THRESHOLD_VIEW_SERVER)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("JSON config file")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("interval-ms")
                .long("interval-ms")
                .value_name("MS")
                .help("Quiet interval before a request is sent")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("timeout-secs")
                .long("timeout-secs")
                .value_name("SECS")
                .help("Request timeout (default: none)")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("quiet-failures")
                .long("quiet-failures")
                .help("Drop failed requests silently instead of logging them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("save")
                .long("save")
                .value_name("PATH")
                .help("Download the final combined image to PATH")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("values")
                .value_name("VALUES")
                .help("Threshold values; read one per line from stdin when omitted")
                .num_args(0..),
        )
        .get_matches();

    let mut config = Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if let Some(server) = matches.get_one::<String>("server") {
        config.server_url = server.clone();
    }
    if let Some(ms) = matches.get_one::<u64>("interval-ms") {
        config.quiet_interval_ms = *ms;
    }
    if let Some(secs) = matches.get_one::<u64>("timeout-secs") {
        config.request_timeout_secs = Some(*secs);
    }
    let policy = if matches.get_flag("quiet-failures") {
        FailurePolicy::Ignore
    } else {
        FailurePolicy::Log
    };

    let backend = Arc::new(HttpBackend::new(&config)?);

    let image_filename = match matches.get_one::<PathBuf>("upload") {
        Some(path) => {
            let initial = matches
                .get_one::<String>("initial-threshold")
                .map(|raw| Threshold::parse(raw))
                .unwrap_or_else(|| Threshold::from(128i64));
            backend
                .upload(path, &initial)
                .await
                .with_context(|| format!("Failed to upload {}", path.display()))?
        }
        None => matches
            .get_one::<String>("image")
            .context("--image or --upload is required")?
            .clone(),
    };

    tracing::info!("Targeting {} for {}", config.update_url(), image_filename);

    let label = Arc::new(TerminalLabel::default());
    let image = Arc::new(TerminalImage::default());
    let updater = ThresholdUpdater::new(
        Arc::clone(&backend),
        label.clone(),
        image.clone(),
        config.quiet_interval(),
    )
    .with_failure_policy(policy);

    match matches.get_many::<String>("values") {
        Some(values) => {
            for raw in values {
                updater.update_threshold_value(Threshold::parse(raw), &image_filename);
            }
        }
        None => {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
                if line.trim().is_empty() {
                    continue;
                }
                updater.update_threshold_value(Threshold::parse(&line), &image_filename);
            }
        }
    }

    updater.settle().await;

    if let Some(dest) = matches.get_one::<PathBuf>("save") {
        let src = image
            .last()
            .context("No combined image was returned; nothing to save")?;
        let path = src.split('?').next().unwrap_or(src.as_str());
        let bytes = backend.fetch_processed(path).await?;
        tokio::fs::write(dest, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        tracing::info!("Saved {} ({} bytes) to {}", path, bytes.len(), dest.display());
    }

    Ok(())
}
