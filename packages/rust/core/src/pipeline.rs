//! End-to-end `sync` pipeline: dispatch → collect → merge → trim → validate
//! → commit.
//!
//! Both sources are fetched concurrently and independently; one source's
//! failure never cancels or corrupts the other's outcome. Only the final
//! threshold check can abort the run, and it runs strictly before any write,
//! so a degraded run leaves the prior snapshot untouched.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, instrument, warn};

use edgepick_scraper::{FetchRows, fetch_source};
use edgepick_shared::{Carrier, EdgepickError, Result, RunConfig};
use edgepick_snapshot::{commit_snapshot, format_snapshot};

use crate::merge::merge;

/// Result of a committed `sync` run.
#[derive(Debug)]
pub struct RunSummary {
    /// Grand total of endpoints written.
    pub total: usize,
    /// Per-carrier counts in display order.
    pub counts: Vec<(Carrier, usize)>,
    /// Path of the committed snapshot.
    pub snapshot_path: std::path::PathBuf,
    /// Whether the snapshot content changed since the prior run.
    pub changed: bool,
    /// How many sources reached success.
    pub sources_ok: usize,
    /// How many sources failed after retries.
    pub sources_failed: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a source finishes successfully.
    fn source_succeeded(&self, name: &str, endpoints: usize);
    /// Called when a source fails after exhausting retries.
    fn source_failed(&self, name: &str, error: &str);
    /// Called when the pipeline commits.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn source_succeeded(&self, _name: &str, _endpoints: usize) {}
    fn source_failed(&self, _name: &str, _error: &str) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Run the full sync pipeline.
///
/// 1. Dispatch both source fetches concurrently
/// 2. Collect each outcome independently
/// 3. Merge whatever succeeded
/// 4. Trim per-carrier sequences
/// 5. Validate the merged total against the commit threshold
/// 6. Format and commit the snapshot
#[instrument(skip_all, fields(out = %config.output_path.display()))]
pub async fn sync_snapshot<F: FetchRows>(
    config: &RunConfig,
    fetcher: &F,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    config.validate()?;

    // validate() guarantees exactly two sources.
    let first = &config.sources[0];
    let second = &config.sources[1];

    progress.phase("Fetching sources");
    info!(first = %first.name, second = %second.name, "dispatching source fetches");

    let (first_outcome, second_outcome) = tokio::join!(
        fetch_source(first, fetcher),
        fetch_source(second, fetcher),
    );

    let mut maps = Vec::new();
    let mut sources_ok = 0;
    let mut sources_failed = 0;

    for (source, outcome) in [(first, first_outcome), (second, second_outcome)] {
        match outcome {
            Ok(map) => {
                info!(source = %source.name, endpoints = map.len(), "source succeeded");
                progress.source_succeeded(&source.name, map.len());
                sources_ok += 1;
                maps.push(map);
            }
            Err(e) => {
                warn!(source = %source.name, error = %e, "source failed, excluded from merge");
                progress.source_failed(&source.name, &e.to_string());
                sources_failed += 1;
            }
        }
    }

    progress.phase("Merging sources");
    let mut merged = merge(maps);
    merged.trim(config.top_n_per_carrier);

    let total = merged.total();
    if total < config.min_total_ips {
        // Refuse to replace a good snapshot with a near-empty one.
        return Err(EdgepickError::Threshold {
            total,
            min: config.min_total_ips,
        });
    }

    progress.phase("Writing snapshot");
    let document = format_snapshot(&merged, Utc::now());
    let outcome = commit_snapshot(&config.output_path, &document)?;

    let summary = RunSummary {
        total,
        counts: merged.counts(),
        snapshot_path: outcome.path,
        changed: outcome.changed,
        sources_ok,
        sources_failed,
        elapsed: start.elapsed(),
    };

    info!(
        total = summary.total,
        sources_ok,
        sources_failed,
        changed = summary.changed,
        path = %summary.snapshot_path.display(),
        "snapshot committed"
    );
    progress.done(&summary);

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::path::Path;

    use url::Url;

    use edgepick_scraper::RawRow;
    use edgepick_shared::SourceConfig;

    /// Fake collaborator: canned rows per host, anything else is unreachable.
    struct FakeFetcher {
        rows_by_host: HashMap<&'static str, Vec<RawRow>>,
    }

    impl FakeFetcher {
        fn new(rows_by_host: HashMap<&'static str, Vec<RawRow>>) -> Self {
            Self { rows_by_host }
        }
    }

    impl FetchRows for FakeFetcher {
        async fn fetch_rows(&self, url: &Url, _timeout: Duration) -> Result<Vec<RawRow>> {
            let host = url.host_str().unwrap_or_default();
            match self.rows_by_host.get(host) {
                Some(rows) => Ok(rows.clone()),
                None => Err(EdgepickError::Network(format!("{url}: unreachable"))),
            }
        }
    }

    fn source(name: &str, host: &str) -> SourceConfig {
        SourceConfig {
            name: name.into(),
            url: format!("https://{host}/table"),
            timeout_secs: 5,
            retry_attempts: 2,
            retry_delay_ms: 1,
        }
    }

    fn run_config(out: &Path) -> RunConfig {
        RunConfig {
            sources: vec![source("alpha", "a.example.com"), source("beta", "b.example.com")],
            output_path: out.to_path_buf(),
            top_n_per_carrier: 0,
            min_total_ips: 10,
        }
    }

    fn rows(carrier: &str, ips: &[&str]) -> Vec<RawRow> {
        ips.iter()
            .map(|ip| vec![carrier.to_string(), ip.to_string()])
            .collect()
    }

    fn mobile_block(count: usize) -> Vec<RawRow> {
        (1..=count)
            .map(|i| vec!["移动".to_string(), format!("104.16.{i}.1")])
            .collect()
    }

    fn telecom_block(count: usize) -> Vec<RawRow> {
        (1..=count)
            .map(|i| vec!["电信".to_string(), format!("104.17.{i}.1")])
            .collect()
    }

    #[tokio::test]
    async fn one_degraded_source_below_threshold_aborts_without_writing() {
        // Alpha renders only 2 rows (fails the per-source sanity check after
        // retries), beta is unreachable. Nothing survives to the merge.
        let fetcher = FakeFetcher::new(HashMap::from([(
            "a.example.com",
            rows("移动", &["1.1.1.1"])
                .into_iter()
                .chain(rows("联通", &["2.2.2.2"]))
                .collect::<Vec<_>>(),
        )]));

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("snapshot.txt");
        let config = run_config(&out);

        let err = sync_snapshot(&config, &fetcher, &SilentProgress)
            .await
            .unwrap_err();

        match err {
            EdgepickError::Threshold { total, min } => {
                assert_eq!(total, 0);
                assert_eq!(min, 10);
            }
            other => panic!("expected Threshold, got {other}"),
        }
        assert!(!out.exists(), "aborted run must not write");
    }

    #[tokio::test]
    async fn surviving_source_alone_can_carry_the_run() {
        let fetcher = FakeFetcher::new(HashMap::from([("a.example.com", mobile_block(12))]));

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("snapshot.txt");
        let config = run_config(&out);

        let summary = sync_snapshot(&config, &fetcher, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(summary.total, 12);
        assert_eq!(summary.sources_ok, 1);
        assert_eq!(summary.sources_failed, 1);
        assert!(out.exists());
    }

    #[tokio::test]
    async fn two_healthy_sources_commit_fixed_order_sections() {
        let fetcher = FakeFetcher::new(HashMap::from([
            ("a.example.com", mobile_block(8)),
            ("b.example.com", telecom_block(5)),
        ]));

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("snapshot.txt");
        let config = run_config(&out);

        let summary = sync_snapshot(&config, &fetcher, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(summary.total, 13);
        assert_eq!(
            summary.counts,
            vec![
                (Carrier::Mobile, 8),
                (Carrier::Unicom, 0),
                (Carrier::Telecom, 5),
            ]
        );

        let doc = std::fs::read_to_string(&out).unwrap();
        let mobile = doc.find("## Mobile (8)").expect("mobile section");
        let unicom = doc.find("## Unicom (0)").expect("unicom section");
        let telecom = doc.find("## Telecom (5)").expect("telecom section");
        assert!(mobile < unicom && unicom < telecom);
        assert!(doc.starts_with("# Updated (UTC): "));
    }

    #[tokio::test]
    async fn threshold_gate_is_exact() {
        // 5 + 5 with one cross-source duplicate merges to 9 < 10: abort.
        let mut beta = mobile_block(1);
        beta.extend(telecom_block(4));
        let fetcher = FakeFetcher::new(HashMap::from([
            ("a.example.com", mobile_block(5)),
            ("b.example.com", beta),
        ]));

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("snapshot.txt");
        let config = run_config(&out);

        let err = sync_snapshot(&config, &fetcher, &SilentProgress)
            .await
            .unwrap_err();
        match err {
            EdgepickError::Threshold { total, min } => {
                assert_eq!(total, 9);
                assert_eq!(min, 10);
            }
            other => panic!("expected Threshold, got {other}"),
        }
        assert!(!out.exists());

        // The same shape with distinct endpoints reaches exactly 10: commit.
        let fetcher = FakeFetcher::new(HashMap::from([
            ("a.example.com", mobile_block(5)),
            ("b.example.com", telecom_block(5)),
        ]));
        let summary = sync_snapshot(&config, &fetcher, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(summary.total, 10);
        assert!(out.exists());
    }

    #[tokio::test]
    async fn cross_source_duplicates_keep_first_position() {
        let mut beta = mobile_block(2);
        beta.extend(telecom_block(5));
        let fetcher = FakeFetcher::new(HashMap::from([
            ("a.example.com", mobile_block(6)),
            ("b.example.com", beta),
        ]));

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("snapshot.txt");
        let config = run_config(&out);

        let summary = sync_snapshot(&config, &fetcher, &SilentProgress)
            .await
            .unwrap();

        // Beta's two mobile endpoints are duplicates of alpha's first two.
        assert_eq!(summary.total, 11);
        let doc = std::fs::read_to_string(&out).unwrap();
        assert!(doc.contains("## Mobile (6)"));
        let first_ip_line = doc.lines().nth(3).unwrap();
        assert_eq!(first_ip_line, "104.16.1.1");
    }

    #[tokio::test]
    async fn trim_caps_each_carrier_before_validation() {
        let mut alpha = mobile_block(6);
        alpha.extend(telecom_block(6));
        let fetcher = FakeFetcher::new(HashMap::from([("a.example.com", alpha)]));

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("snapshot.txt");
        let mut config = run_config(&out);
        config.top_n_per_carrier = 3;
        config.min_total_ips = 5;

        let summary = sync_snapshot(&config, &fetcher, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(summary.total, 6);
        let doc = std::fs::read_to_string(&out).unwrap();
        assert!(doc.contains("## Mobile (3)"));
        assert!(doc.contains("## Telecom (3)"));
        // Head of the sequence survives, in order.
        assert!(doc.contains("104.16.1.1\n104.16.2.1\n104.16.3.1"));
        assert!(!doc.contains("104.16.4.1"));
    }

    #[tokio::test]
    async fn committed_run_replaces_prior_snapshot_wholesale() {
        let fetcher = FakeFetcher::new(HashMap::from([("a.example.com", mobile_block(12))]));

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("snapshot.txt");
        std::fs::write(&out, "# stale\nold-content\n").unwrap();

        let config = run_config(&out);
        let summary = sync_snapshot(&config, &fetcher, &SilentProgress)
            .await
            .unwrap();
        assert!(summary.changed);

        let doc = std::fs::read_to_string(&out).unwrap();
        assert!(!doc.contains("old-content"));
        assert!(doc.contains("## Mobile (12)"));
    }

    #[tokio::test]
    async fn aborted_run_leaves_prior_snapshot_untouched() {
        let fetcher = FakeFetcher::new(HashMap::new());

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("snapshot.txt");
        std::fs::write(&out, "# good prior snapshot\n").unwrap();

        let config = run_config(&out);
        let err = sync_snapshot(&config, &fetcher, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, EdgepickError::Threshold { total: 0, .. }));

        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "# good prior snapshot\n"
        );
    }

    #[tokio::test]
    async fn invalid_config_fails_before_fetching() {
        let fetcher = FakeFetcher::new(HashMap::new());

        let dir = tempfile::tempdir().unwrap();
        let mut config = run_config(&dir.path().join("snapshot.txt"));
        config.sources.pop();

        let err = sync_snapshot(&config, &fetcher, &SilentProgress)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exactly 2"));
    }
}
