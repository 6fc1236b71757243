//! The page-fetch collaborator: turns a source locator into raw table rows.
//!
//! Everything downstream (extraction, merge, validation) depends only on the
//! narrow [`FetchRows`] capability, so tests can inject canned rows and the
//! core never touches the network.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use edgepick_shared::{EdgepickError, Result};

/// User-Agent string for fetch requests.
const USER_AGENT: &str = concat!("edgepick/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// One table row as a sequence of cell texts. No schema guarantee.
pub type RawRow = Vec<String>;

// ---------------------------------------------------------------------------
// FetchRows
// ---------------------------------------------------------------------------

/// Capability to fetch the carrier/IP table rows rendered at a locator.
///
/// Fails when the page cannot be retrieved within `timeout` or does not
/// contain a matching table. Implemented by [`HttpTableFetcher`] in
/// production and by canned fakes in tests.
pub trait FetchRows {
    fn fetch_rows(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<RawRow>>> + Send;
}

// ---------------------------------------------------------------------------
// HttpTableFetcher
// ---------------------------------------------------------------------------

/// Production fetcher: HTTP GET via `reqwest`, then `table tbody tr`
/// extraction from the returned document.
pub struct HttpTableFetcher {
    client: Client,
}

impl HttpTableFetcher {
    /// Create a fetcher with a shared HTTP client. Per-call timeouts come
    /// from the source config, not the client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| EdgepickError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl FetchRows for HttpTableFetcher {
    async fn fetch_rows(&self, url: &Url, timeout: Duration) -> Result<Vec<RawRow>> {
        let response = self
            .client
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| EdgepickError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EdgepickError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EdgepickError::Network(format!("{url}: body read failed: {e}")))?;

        let rows = extract_table_rows(&body);
        debug!(%url, rows = rows.len(), "fetched table rows");

        if rows.is_empty() {
            // The render-failure analog: the page came back but the table
            // never materialized.
            return Err(EdgepickError::parse(format!(
                "{url}: no table rows in response"
            )));
        }

        Ok(rows)
    }
}

/// Extract `table tbody tr` rows as trimmed `td` cell texts.
fn extract_table_rows(html: &str) -> Vec<RawRow> {
    let doc = Html::parse_document(html);
    let row_sel = Selector::parse("table tbody tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();

    doc.select(&row_sel)
        .map(|row| {
            row.select(&cell_sel)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect()
        })
        .collect()
}
