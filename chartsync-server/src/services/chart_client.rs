//! Chart source client
//!
//! Fetches the public chart pages and extracts (rank, title, artist)
//! triples from their markup. Parsing is a pure function over the HTML
//! so the selectors can be exercised against fixtures.

use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::info;

use crate::models::ChartEntry;
use crate::services::RateLimiter;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; chartsync/0.1)";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Chart pages are fetched one per run plus one per genre; half a second
/// of spacing keeps the source comfortable.
const RATE_LIMIT_MS: u64 = 500;

/// Chart fetch and parse errors
#[derive(Debug, Error)]
pub enum ChartError {
    /// Network failure (timeout, connection refused)
    #[error("Network error: {0}")]
    Network(String),

    /// Chart source returned a non-success status
    #[error("Chart source error {0}: {1}")]
    Source(u16, String),

    /// Page markup did not contain the expected structure
    #[error("Malformed chart markup: {0}")]
    Markup(String),
}

/// HTTP client for the chart source
pub struct ChartClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl ChartClient {
    pub fn new(base_url: &str) -> Result<Self, ChartError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ChartError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::new(RATE_LIMIT_MS),
        })
    }

    /// Fetch today's top chart in rank order
    pub async fn fetch_top_chart(&self) -> Result<Vec<ChartEntry>, ChartError> {
        let url = format!("{}/chart/index.htm", self.base_url);
        let html = self.fetch_page(&url).await?;

        let entries = parse_chart_rows(&html)?;
        info!(count = entries.len(), "Fetched top chart");
        Ok(entries)
    }

    /// Fetch the newest songs for one genre code
    pub async fn fetch_genre_chart(&self, genre_code: &str) -> Result<Vec<ChartEntry>, ChartError> {
        let url = format!("{}/genre/song_list.htm?gnrCode={}", self.base_url, genre_code);
        let html = self.fetch_page(&url).await?;

        let entries = parse_chart_rows(&html)?;
        info!(genre_code = %genre_code, count = entries.len(), "Fetched genre chart");
        Ok(entries)
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ChartError> {
        self.rate_limiter.wait().await;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ChartError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChartError::Source(status.as_u16(), body));
        }

        response
            .text()
            .await
            .map_err(|e| ChartError::Network(e.to_string()))
    }
}

/// Extract (rank, title, artist) rows from chart page markup.
///
/// Song rows are `<tr>` elements classed `lst50`/`lst100`. The title
/// lives under `div.rank01 a`, the primary artist under the first
/// `div.rank02 a` (later anchors repeat featured artists). The rank cell
/// is `span.rank`; rows without a parseable one fall back to document
/// order. Rows missing a title or artist (ads, spacers) are skipped.
pub fn parse_chart_rows(html: &str) -> Result<Vec<ChartEntry>, ChartError> {
    let document = Html::parse_document(html);
    let row_sel = selector("tr.lst50, tr.lst100")?;
    let rank_sel = selector("span.rank")?;
    let title_sel = selector("div.rank01 a")?;
    let artist_sel = selector("div.rank02 a")?;

    let mut entries = Vec::new();
    for (idx, row) in document.select(&row_sel).enumerate() {
        let title = match row.select(&title_sel).next() {
            Some(el) => text_of(&el),
            None => continue,
        };
        let artist = row
            .select(&artist_sel)
            .next()
            .map(|el| text_of(&el))
            .unwrap_or_default();

        if title.is_empty() || artist.is_empty() {
            continue;
        }

        let rank = row
            .select(&rank_sel)
            .next()
            .and_then(|el| text_of(&el).parse::<i64>().ok())
            .unwrap_or(idx as i64 + 1);

        entries.push(ChartEntry { rank, title, artist });
    }

    Ok(entries)
}

fn selector(css: &str) -> Result<Selector, ChartError> {
    Selector::parse(css).map_err(|e| ChartError::Markup(format!("bad selector '{}': {:?}", css, e)))
}

fn text_of(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
