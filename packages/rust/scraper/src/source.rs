//! Per-source fetching with bounded retry and a sanity threshold.

use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use edgepick_shared::{CarrierMap, EdgepickError, Result, SourceConfig};

use crate::extract::rows_to_carrier_map;
use crate::table::FetchRows;

/// A source that renders fewer entries than this is treated as a fetch
/// failure (the page likely did not render correctly), not as a legitimate
/// empty result.
pub const MIN_SOURCE_IPS: usize = 5;

/// Fetch one source to a terminal outcome: a carrier map, or the last error
/// after retries are exhausted. Failures here never affect the other source.
pub async fn fetch_source<F: FetchRows>(source: &SourceConfig, fetcher: &F) -> Result<CarrierMap> {
    let url = Url::parse(&source.url).map_err(|e| {
        EdgepickError::validation(format!(
            "source '{}' has invalid url '{}': {e}",
            source.name, source.url
        ))
    })?;
    let timeout = Duration::from_secs(source.timeout_secs);
    let delay = Duration::from_millis(source.retry_delay_ms);
    let attempts = source.retry_attempts.max(1);

    for attempt in 1..=attempts {
        match fetch_once(source, fetcher, &url, timeout).await {
            Ok(map) => {
                info!(
                    source = %source.name,
                    attempt,
                    endpoints = map.len(),
                    "source fetch succeeded"
                );
                return Ok(map);
            }
            Err(e) if attempt < attempts => {
                warn!(
                    source = %source.name,
                    attempt,
                    attempts,
                    error = %e,
                    "source fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(
                    source = %source.name,
                    attempts,
                    error = %e,
                    "source fetch failed, retries exhausted"
                );
                return Err(e);
            }
        }
    }

    unreachable!("retry loop always returns");
}

/// One attempt: fetch rows, extract the carrier map, sanity-check the count.
async fn fetch_once<F: FetchRows>(
    source: &SourceConfig,
    fetcher: &F,
    url: &Url,
    timeout: Duration,
) -> Result<CarrierMap> {
    let rows = fetcher.fetch_rows(url, timeout).await?;
    let map = rows_to_carrier_map(&rows);

    let count = map.len();
    if count < MIN_SOURCE_IPS {
        return Err(EdgepickError::Degraded {
            source: source.name.clone(),
            count,
            min: MIN_SOURCE_IPS,
        });
    }

    Ok(map)
}
