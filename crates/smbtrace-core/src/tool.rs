//! The external capture-analysis tool, seen from this side.
//!
//! The tool is a black box: given a capture file, a display filter and an
//! output format it returns the bytes it wrote to stdout. Decoding happens
//! entirely inside it; we only parse the declarative markup it emits.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;

/// Display filter for the summary listing: SMB and SMB2 traffic, minus
/// browser announcements riding on top of SMB.
pub const DEFAULT_DISPLAY_FILTER: &str = "!browser && (smb||smb2)";

/// Output formats requested from the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkupFormat {
    /// Column-oriented listing, one row per packet (`-T psml`).
    Summary,
    /// Fully expanded protocol tree per packet (`-T pdml`).
    Detail,
}

impl MarkupFormat {
    /// Value passed to the tool's `-T` option.
    pub fn as_arg(self) -> &'static str {
        match self {
            MarkupFormat::Summary => "psml",
            MarkupFormat::Detail => "pdml",
        }
    }
}

impl fmt::Display for MarkupFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// Display filter selecting exactly one frame.
pub fn frame_filter(number: u32) -> String {
    format!("frame.number == {number}")
}

/// Anything that can answer `(capture, filter, format) -> bytes`.
///
/// The process-backed implementation lives in `smbtrace-services`; tests
/// substitute canned output.
pub trait CaptureTool: Send + Sync {
    fn run(
        &self,
        capture: &Path,
        filter: &str,
        format: MarkupFormat,
    ) -> impl Future<Output = Result<Bytes, ToolError>> + Send;
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no result within {0:?}")]
    Timeout(Duration),

    #[error("{status}: {stderr}")]
    Exit {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("tool produced no output")]
    EmptyOutput,
}
