//! Loaded-capture session.
//!
//! Owns the summary listing and the detail cache for one capture file.
//! Loading a new capture replaces both; a failed load leaves the previous
//! capture untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;

use smbtrace_core::config::CaptureConfig;
use smbtrace_core::tool::{frame_filter, CaptureTool, MarkupFormat};
use smbtrace_core::{parse_detail, parse_summary, DetailNode, FetchError, LoadError, Summary};

use crate::cache::{CachedDetail, DetailCache};

struct LoadedCapture {
    path: PathBuf,
    summaries: Vec<Summary>,
    details: DetailCache,
}

pub struct CaptureSession<T> {
    tool: T,
    display_filter: String,
    capture: Option<LoadedCapture>,
}

impl<T: CaptureTool> CaptureSession<T> {
    pub fn new(tool: T, settings: CaptureConfig) -> Self {
        Self {
            tool,
            display_filter: settings.display_filter,
            capture: None,
        }
    }

    /// Build the summary listing for `path` and make it the loaded capture.
    pub async fn load_capture(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        let markup = self
            .tool
            .run(path, &self.display_filter, MarkupFormat::Summary)
            .await?;
        let summaries = parse_summary(&markup).inspect_err(|e| {
            tracing::warn!(capture = %path.display(), error = %e, "summary markup rejected");
        })?;

        tracing::info!(
            capture = %path.display(),
            packets = summaries.len(),
            "capture loaded"
        );
        self.capture = Some(LoadedCapture {
            path: path.to_path_buf(),
            summaries,
            details: DetailCache::new(),
        });
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.capture.is_some()
    }

    pub fn capture_path(&self) -> Option<&Path> {
        self.capture.as_ref().map(|c| c.path.as_path())
    }

    /// Summary rows in capture order. Empty when nothing is loaded.
    pub fn summaries(&self) -> &[Summary] {
        self.capture
            .as_ref()
            .map(|c| c.summaries.as_slice())
            .unwrap_or(&[])
    }

    /// Summary row for frame `number`, if it passed the listing filter.
    pub fn summary(&self, number: u32) -> Option<&Summary> {
        let summaries = self.summaries();
        summaries
            .binary_search_by_key(&number, |s| s.number)
            .ok()
            .map(|i| &summaries[i])
    }

    /// Protocol field tree for frame `number`.
    ///
    /// Markup that did not parse stays cached and is parsed again here to
    /// report the same error, without running the tool.
    pub async fn detail_tree(&self, number: u32) -> Result<Arc<DetailNode>, FetchError> {
        let detail = self.detail(number).await?;
        match detail.tree {
            Some(tree) => Ok(tree),
            None => parse_detail(&detail.markup, number).map(Arc::new),
        }
    }

    /// Detail markup for frame `number`, exactly as the tool produced it,
    /// whether or not it parses.
    pub async fn detail_markup(&self, number: u32) -> Result<Bytes, FetchError> {
        Ok(self.detail(number).await?.markup)
    }

    /// Number of packets whose detail is cached.
    pub fn cached_details(&self) -> usize {
        self.capture.as_ref().map_or(0, |c| c.details.len())
    }

    async fn detail(&self, number: u32) -> Result<CachedDetail, FetchError> {
        let capture = self.capture.as_ref().ok_or(FetchError::NoCapture)?;
        capture
            .details
            .get_or_fetch(number, || async {
                tracing::debug!(number, "detail cache miss");
                let filter = frame_filter(number);
                let markup = self
                    .tool
                    .run(&capture.path, &filter, MarkupFormat::Detail)
                    .await?;
                let tree = parse_detail(&markup, number)
                    .inspect_err(|e| tracing::warn!(number, error = %e, "detail markup rejected"))
                    .ok();
                Ok::<_, FetchError>(CachedDetail::new(markup, tree))
            })
            .await
    }
}
