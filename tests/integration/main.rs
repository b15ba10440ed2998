//! smbtrace integration test harness.
//!
//! Tests here run the real process-backed tool against a shell script that
//! stands in for tshark. The script reads its canned output from the
//! directory holding the capture file, so every test works in a private
//! directory and can shape the tool's answers by writing files there:
//!
//!   listing.psml     summary markup returned for `-T psml`
//!   detail-<N>.pdml  detail markup returned for `-Y "frame.number == N"`
//!   delay            seconds to sleep before answering
//!
//! Each invocation is appended to `invocations.log` as `<format> <filter>`.
//! Requires /bin/sh; tests print SKIP and return when it is missing.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use anyhow::{Context, Result};

use smbtrace_core::config::{CaptureConfig, ToolConfig};
use smbtrace_services::{CaptureSession, TsharkTool};

mod capture;
mod tool;

// ── Harness ───────────────────────────────────────────────────────────────────

pub const LISTING: &str = include_str!("fixtures/listing.psml");
pub const DETAIL_5: &str = include_str!("fixtures/detail-5.pdml");

const FAKE_TSHARK: &str = r#"#!/bin/sh
# Stand-in for: tshark -r <capture> -Y <filter> -T <psml|pdml>
capture="$2"
filter="$4"
format="$6"
dir=$(dirname "$capture")

echo "$format $filter" >> "$dir/invocations.log"

if [ ! -f "$capture" ]; then
    echo "tshark: The file \"$capture\" doesn't exist." >&2
    exit 2
fi
if [ -f "$dir/delay" ]; then
    sleep "$(cat "$dir/delay")"
fi

case "$format" in
    psml)
        cat "$dir/listing.psml"
        ;;
    pdml)
        frame="${filter##* }"
        if [ -f "$dir/detail-$frame.pdml" ]; then
            cat "$dir/detail-$frame.pdml"
        else
            printf '<?xml version="1.0"?>\n<pdml version="0" creator="fake"></pdml>\n'
        fi
        ;;
    *)
        echo "tshark: Invalid -T parameter \"$format\"" >&2
        exit 1
        ;;
esac
"#;

static COUNTER: AtomicU64 = AtomicU64::new(0);
static SCRIPT: OnceLock<PathBuf> = OnceLock::new();

/// Whether the script stand-in can run here.
pub fn skip_unless_ready() -> bool {
    if cfg!(unix) && Path::new("/bin/sh").exists() {
        return true;
    }
    eprintln!("SKIP: /bin/sh not available");
    false
}

/// Write the fake tool once per test binary and return its path.
fn fake_tshark() -> &'static Path {
    SCRIPT.get_or_init(|| {
        let dir = std::env::temp_dir().join(format!("smbtrace-bin-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("failed to create script dir");
        let path = dir.join("tshark");
        let staging = dir.join("tshark.tmp");
        std::fs::write(&staging, FAKE_TSHARK).expect("failed to write fake tshark");
        make_executable(&staging);
        // Never exec a path that still has a writer open on it (ETXTBSY).
        std::fs::rename(&staging, &path).expect("failed to install fake tshark");
        path
    })
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("failed to chmod fake tshark");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}

/// A private capture directory served by the fake tool.
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    /// New directory holding an (empty) capture file and the default listing.
    pub fn new() -> Result<Self> {
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir()
            .join(format!("smbtrace-it-{}-{}", std::process::id(), id));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let ws = Self { dir };
        std::fs::write(ws.capture(), b"")?;
        ws.write("listing.psml", LISTING)?;
        Ok(ws)
    }

    pub fn capture(&self) -> PathBuf {
        self.dir.join("smb.pcap")
    }

    pub fn write(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn set_detail(&self, number: u32, markup: &str) -> Result<()> {
        self.write(&format!("detail-{number}.pdml"), markup)
    }

    /// Lines logged by the fake tool, oldest first.
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.join("invocations.log"))
            .map(|log| log.lines().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    pub fn tool(&self, timeout_secs: u64) -> TsharkTool {
        TsharkTool::new(ToolConfig {
            program: fake_tshark().to_path_buf(),
            timeout_secs,
        })
    }

    pub fn session(&self) -> CaptureSession<TsharkTool> {
        CaptureSession::new(self.tool(10), CaptureConfig::default())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}
