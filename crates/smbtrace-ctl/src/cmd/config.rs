//! Config file bootstrap and display.

use anyhow::{Context, Result};

use smbtrace_core::config::SmbtraceConfig;

pub fn cmd_config() -> Result<()> {
    let path = SmbtraceConfig::write_default_if_missing()
        .context("failed to write default config")?;
    let config = SmbtraceConfig::load().context("failed to load config")?;

    let timeout = match config.tool.timeout() {
        Some(limit) => format!("{}s", limit.as_secs()),
        None => "none".to_string(),
    };

    println!("═══════════════════════════════════════");
    println!("  smbtrace configuration");
    println!("═══════════════════════════════════════");
    println!("  File           : {}", path.display());
    println!("  Tool program   : {}", config.tool.program.display());
    println!("  Tool timeout   : {}", timeout);
    println!("  Display filter : {}", config.capture.display_filter);

    Ok(())
}
