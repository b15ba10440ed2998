//! Process-backed capture tool.
//!
//! Spawns the configured analysis program once per request, waits for it to
//! exit and hands back everything it wrote to stdout. A configured timeout
//! bounds the wait; an expired child is killed when its future is dropped.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use bytes::Bytes;
use tokio::process::Command;

use smbtrace_core::config::ToolConfig;
use smbtrace_core::tool::{CaptureTool, MarkupFormat, ToolError};

/// Runs `<program> -r <capture> -Y <filter> -T <format>`.
#[derive(Debug, Clone)]
pub struct TsharkTool {
    config: ToolConfig,
}

impl TsharkTool {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    pub fn program(&self) -> &Path {
        &self.config.program
    }

    fn command(&self, capture: &Path, filter: &str, format: MarkupFormat) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.arg("-r")
            .arg(capture)
            .args(["-Y", filter, "-T", format.as_arg()])
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl CaptureTool for TsharkTool {
    async fn run(
        &self,
        capture: &Path,
        filter: &str,
        format: MarkupFormat,
    ) -> Result<Bytes, ToolError> {
        let program = self.config.program.display().to_string();
        tracing::debug!(program, capture = %capture.display(), filter, %format, "running capture tool");

        let started = Instant::now();
        let output = self.command(capture, filter, format).output();
        let output = match self.config.timeout() {
            Some(limit) => match tokio::time::timeout(limit, output).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(program, ?limit, filter, "capture tool timed out");
                    return Err(ToolError::Timeout(limit));
                }
            },
            None => output.await,
        }
        .map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(program, status = %output.status, stderr, "capture tool failed");
            return Err(ToolError::Exit {
                status: output.status,
                stderr,
            });
        }
        if output.stdout.is_empty() {
            return Err(ToolError::EmptyOutput);
        }

        tracing::info!(
            %format,
            bytes = output.stdout.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "capture tool finished"
        );
        Ok(Bytes::from(output.stdout))
    }
}
