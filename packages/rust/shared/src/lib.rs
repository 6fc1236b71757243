//! Shared types, error model, and configuration for edgepick.
//!
//! This crate is the foundation depended on by all other edgepick crates.
//! It provides:
//! - [`EdgepickError`] — the unified error type
//! - Domain types ([`Carrier`], [`Endpoint`], [`CarrierMap`], [`MergedResult`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, OutputConfig, RunConfig, SourceConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{EdgepickError, Result};
pub use types::{Carrier, CarrierMap, Endpoint, MergedResult, ipv4_shaped, is_ipv4};
