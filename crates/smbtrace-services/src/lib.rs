//! smbtrace-services — runtime side of smbtrace: running the analysis
//! tool, caching packet detail, and the loaded-capture session.

pub mod cache;
pub mod session;
pub mod tshark;

pub use cache::{CachedDetail, DetailCache};
pub use session::CaptureSession;
pub use tshark::TsharkTool;
