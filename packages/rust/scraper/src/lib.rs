//! Source scraping: table fetching, row extraction, and per-source retry.
//!
//! This crate provides:
//! - [`table`] — the [`FetchRows`] capability and the HTTP/HTML implementation
//! - [`extract`] — carrier normalization and row → endpoint extraction
//! - [`source`] — the retrying source fetcher with its sanity threshold

pub mod extract;
pub mod source;
pub mod table;

pub use extract::{extract_endpoint, normalize_carrier, rows_to_carrier_map};
pub use source::{MIN_SOURCE_IPS, fetch_source};
pub use table::{FetchRows, HttpTableFetcher, RawRow};
