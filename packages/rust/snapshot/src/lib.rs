//! Snapshot formatting and commit.
//!
//! Turns a merged result into the plain-text snapshot document and writes it
//! to the target path, fully replacing any prior snapshot. The write is a
//! temp-file + rename, so a half-written snapshot is never observable.
//! Validation (the commit threshold) happens in the pipeline strictly before
//! anything here runs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use edgepick_shared::{Carrier, EdgepickError, MergedResult, Result};

/// Outcome of a committed snapshot.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    /// Path the snapshot was written to.
    pub path: PathBuf,
    /// Size of the written document in bytes.
    pub bytes: usize,
    /// Whether the content differs from the prior snapshot (true when no
    /// prior snapshot existed).
    pub changed: bool,
}

/// Render the snapshot document.
///
/// Header line with the UTC generation timestamp, then one section per
/// carrier in fixed display order. Empty carriers still get their section
/// header with a zero count.
pub fn format_snapshot(merged: &MergedResult, generated_at: DateTime<Utc>) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "# Updated (UTC): {}",
        generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));
    lines.push(String::new());

    for carrier in Carrier::DISPLAY_ORDER {
        let endpoints = merged.endpoints(carrier);
        lines.push(format!("## {} ({})", carrier.name(), endpoints.len()));
        lines.extend(endpoints.iter().map(|e| e.as_str().to_string()));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Write the snapshot document to `path`, replacing prior content wholesale.
pub fn commit_snapshot(path: &Path, content: &str) -> Result<CommitOutcome> {
    let changed = match std::fs::read_to_string(path) {
        Ok(prior) => content_hash(&prior) != content_hash(content),
        Err(_) => true,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| EdgepickError::io(parent, e))?;
        }
    }

    let temp = temp_path(path);
    std::fs::write(&temp, content).map_err(|e| EdgepickError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| EdgepickError::io(path, e))?;

    debug!(path = %path.display(), bytes = content.len(), "snapshot written");
    if !changed {
        info!(path = %path.display(), "snapshot content unchanged since last run");
    }

    Ok(CommitOutcome {
        path: path.to_path_buf(),
        bytes: content.len(),
        changed,
    })
}

/// Sibling temp file used for the atomic replace.
fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "snapshot".to_string());
    path.with_file_name(format!(".{file_name}.tmp"))
}

/// SHA-256 hex digest of snapshot content, for change detection.
fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
