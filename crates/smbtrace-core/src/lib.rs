//! smbtrace-core — capture listing and packet detail parsing.
//! The services and ctl crates depend on this one.

pub mod config;
pub mod detail;
pub mod markup;
pub mod summary;
pub mod tool;

pub use detail::{parse_detail, DetailNode, FetchError};
pub use summary::{parse_summary, LoadError, Summary};
pub use tool::{CaptureTool, MarkupFormat, ToolError};
