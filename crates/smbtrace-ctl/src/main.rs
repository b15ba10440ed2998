//! smbtrace-ctl — command-line interface for browsing SMB captures.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use smbtrace_core::config::SmbtraceConfig;

mod cmd;

fn print_usage() {
    println!("Usage: smbtrace-ctl [--json] <command>");
    println!();
    println!("Commands:");
    println!("  list <capture>        List SMB/SMB2 packets in a capture file");
    println!("  show <capture> <no>   Show the protocol field tree of one packet");
    println!("  raw <capture> <no>    Print the detail markup of one packet");
    println!("  config                Write the default config if missing and show it");
    println!();
    println!("Options:");
    println!("  --json   Emit JSON instead of text (list, show)");
    println!();
    println!("Logging is controlled by RUST_LOG, e.g. RUST_LOG=smbtrace_services=debug");
}

fn load_config() -> SmbtraceConfig {
    SmbtraceConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        SmbtraceConfig::default()
    })
}

fn parse_number(value: &str) -> Result<u32> {
    value
        .parse()
        .with_context(|| format!("packet number must be a positive integer, got {value:?}"))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --json option
    let mut json = false;
    let mut remaining: Vec<&str> = Vec::new();
    for arg in &args {
        if arg == "--json" {
            json = true;
        } else {
            remaining.push(arg);
        }
    }

    match remaining.as_slice() {
        ["list", capture] => cmd::capture::cmd_list(&load_config(), capture, json).await,
        ["show", capture, number] => {
            let number = parse_number(number)?;
            cmd::capture::cmd_show(&load_config(), capture, number, json).await
        }
        ["raw", capture, number] => {
            let number = parse_number(number)?;
            cmd::capture::cmd_raw(&load_config(), capture, number).await
        }
        ["config"] => cmd::config::cmd_config(),
        ["help"] | ["--help"] | ["-h"] | [] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
