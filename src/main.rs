#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level as TraceLevel, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use hover_trailer::remote::{embed_url, extract_video_id};
use hover_trailer::{ErrorBody, PluginSettings, TrailerCandidates, select_trailer};

#[derive(Debug, Parser)]
#[command(name = "hover-trailer", version, about = "Hover trailer preview tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate settings and print the client configuration payload
    Snapshot {
        /// Settings file (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Pick the preview trailer from a trailer list JSON document
    Select { file: PathBuf },
    /// Print the embed URL for a remote trailer link
    Embed { url: String },
}

/// Error body plus the HTTP status it maps to
#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    #[serde(flatten)]
    body: ErrorBody,
}

/// Print the error body and report failure to the shell
fn fail(status: u16, body: ErrorBody) -> Result<ExitCode> {
    error!(status, code = %body.code, request_id = %body.request_id, "{}", body.message);
    println!("{}", serde_json::to_string_pretty(&ErrorResponse { status, body })?);
    Ok(ExitCode::FAILURE)
}

fn snapshot(config: Option<PathBuf>) -> Result<ExitCode> {
    let snapshot = match PluginSettings::load(config.as_deref()).and_then(|s| s.snapshot()) {
        Ok(snapshot) => snapshot,
        Err(e) => return fail(e.status(), ErrorBody::from(&e)),
    };
    info!(
        hover_delay_ms = snapshot.hover_delay_ms,
        sizing = ?snapshot.sizing_mode,
        positioning = ?snapshot.positioning_mode,
        "Configuration valid"
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(ExitCode::SUCCESS)
}

fn select(file: PathBuf) -> Result<ExitCode> {
    let contents = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read trailer list {}", file.display()))?;
    let candidates: TrailerCandidates = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid trailer list {}", file.display()))?;
    debug!(
        local = candidates.local.len(),
        remote = candidates.remote.len(),
        "Loaded trailer candidates"
    );

    match select_trailer(&candidates) {
        Some(trailer) => {
            info!(trailer = %trailer.name, kind = ?trailer.trailer_type, "Selected trailer");
            println!("{}", serde_json::to_string_pretty(trailer)?);
            Ok(ExitCode::SUCCESS)
        }
        None => fail(404, ErrorBody::not_found("No trailers found for this item")),
    }
}

fn embed(url: String) -> Result<ExitCode> {
    let video_id = extract_video_id(&url)
        .with_context(|| format!("No video id recognised in {url}"))?;
    println!("{video_id}");
    println!("{}", embed_url(&video_id));
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    // Logs go to stderr so stdout stays machine-readable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match Cli::parse().command {
        Command::Snapshot { config } => snapshot(config),
        Command::Select { file } => select(file),
        Command::Embed { url } => embed(url),
    }
}
