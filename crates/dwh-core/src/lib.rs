//! `dwh-core` — configuration and shared error types for the dwh-loader
//! workspace.

pub mod config;
pub mod error;

pub use config::DwhConfig;
pub use error::{DwhError, Result};
