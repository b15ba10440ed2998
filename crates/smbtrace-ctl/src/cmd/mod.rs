//! CLI command modules.

pub mod capture;
pub mod config;
