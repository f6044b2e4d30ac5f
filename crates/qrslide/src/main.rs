//! qrslide: send a text file through a simulated screen-to-camera link.
//!
//! Usage: `qrslide <FILE> [OUTPUT_DIR]`
//!
//! The file is split into slides, shown on a simulated screen and read back
//! by a simulated camera running a receiver session. The received copy is
//! written to OUTPUT_DIR (default: the configured received directory) and a
//! JSON report goes to stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use qrslide_core::config::QrslideConfig;
use qrslide_services::{
    persist, run_loopback, NoiseModel, Receiver, ReceiverStatus, Sender, SenderStatus,
};

#[derive(Debug, Serialize)]
struct TransferReport {
    file_name: String,
    bytes: usize,
    chunks: usize,
    sender_frames: u64,
    receiver_frames: u64,
    output_path: PathBuf,
    sender_status: SenderStatus,
    receiver_status: ReceiverStatus,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = QrslideConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = QrslideConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        QrslideConfig::default()
    });

    let mut args = std::env::args().skip(1);
    let source = args
        .next()
        .map(PathBuf::from)
        .context("usage: qrslide <FILE> [OUTPUT_DIR]")?;
    let output_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.storage.received_dir.clone());

    let report = transfer(&config, &source, &output_dir).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn transfer(config: &QrslideConfig, source: &Path, output_dir: &Path) -> Result<TransferReport> {
    let mut sender = Sender::new();
    sender
        .begin_file(source)
        .with_context(|| format!("cannot send {}", source.display()))?;

    let noise = NoiseModel::from(&config.channel);
    tracing::info!(
        file_name = sender.file_name(),
        chunks = sender.chunk_count(),
        miss_rate = noise.miss_rate,
        "transfer starting"
    );

    let outcome = run_loopback(sender, Receiver::new(), noise, &config.capture)
        .await
        .context("transfer did not complete")?;

    let mut receiver = outcome.receiver;
    let receiver_status = receiver.status();
    let file = receiver
        .take_file()
        .context("receiver completed without a file")?;
    let output_path = persist(output_dir, &file)
        .with_context(|| format!("cannot save into {}", output_dir.display()))?;

    Ok(TransferReport {
        bytes: file.content.len(),
        chunks: outcome.sender.chunk_count(),
        sender_frames: outcome.sender_frames,
        receiver_frames: outcome.receiver_frames,
        output_path,
        sender_status: outcome.sender.status(),
        receiver_status,
        file_name: file.file_name,
    })
}
