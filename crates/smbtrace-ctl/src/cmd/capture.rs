//! Capture listing and packet inspection commands.

use anyhow::{Context, Result};

use smbtrace_core::config::SmbtraceConfig;
use smbtrace_core::Summary;
use smbtrace_services::{CaptureSession, TsharkTool};

async fn open(config: &SmbtraceConfig, capture: &str) -> Result<CaptureSession<TsharkTool>> {
    let tool = TsharkTool::new(config.tool.clone());
    let mut session = CaptureSession::new(tool, config.capture.clone());
    session
        .load_capture(capture)
        .await
        .with_context(|| format!("failed to load {capture}"))?;
    Ok(session)
}

fn format_row(summary: &Summary) -> String {
    format!(
        "{:>6}  {:>12.6}  {:<22}  {:<22}  {:<8}  {}",
        summary.number,
        summary.timestamp,
        summary.source,
        summary.destination,
        summary.protocol,
        summary.info
    )
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_list(config: &SmbtraceConfig, capture: &str, json: bool) -> Result<()> {
    let session = open(config, capture).await?;
    let summaries = session.summaries();

    if json {
        println!("{}", serde_json::to_string_pretty(summaries)?);
        return Ok(());
    }
    if summaries.is_empty() {
        println!("No matching packets in {capture}.");
        return Ok(());
    }

    println!(
        "{:>6}  {:>12}  {:<22}  {:<22}  {:<8}  {}",
        "No.", "Time", "Source", "Destination", "Protocol", "Info"
    );
    for summary in summaries {
        println!("{}", format_row(summary));
    }
    println!("\n  {} packets", summaries.len());

    Ok(())
}

pub async fn cmd_show(
    config: &SmbtraceConfig,
    capture: &str,
    number: u32,
    json: bool,
) -> Result<()> {
    let session = open(config, capture).await?;
    let tree = session
        .detail_tree(number)
        .await
        .with_context(|| format!("failed to fetch packet {number}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*tree)?);
        return Ok(());
    }
    if let Some(summary) = session.summary(number) {
        println!("{}", format_row(summary));
        println!();
    }
    print!("{tree}");

    Ok(())
}

pub async fn cmd_raw(config: &SmbtraceConfig, capture: &str, number: u32) -> Result<()> {
    let session = open(config, capture).await?;
    let markup = session
        .detail_markup(number)
        .await
        .with_context(|| format!("failed to fetch packet {number}"))?;
    print!("{}", String::from_utf8_lossy(&markup));
    Ok(())
}
