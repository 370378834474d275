//! Blog search client, the second tier of the chain.
//!
//! The search API has no volume data. Monthly volume is approximated from the total
//! number of matching blog posts, and related rows come from the shared suffix table.
use crate::config::{SecondaryCredentials, Timeouts};
use crate::related::related_keywords;
use crate::tier::{KeywordTier, UpstreamUnavailable, upstream_json};
use crate::types::{CompetitionLevel, Keyword, KeywordMetrics, Source};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const BLOG_SEARCH_PATH: &str = "/v1/search/blog.json";

const VOLUME_PER_POST: u64 = 3;

#[derive(Deserialize)]
struct BlogSearchResponse {
    total: u64,
}

pub fn competition_for_total(total: u64) -> CompetitionLevel {
    if total > 50_000 {
        CompetitionLevel::High
    } else if total > 10_000 {
        CompetitionLevel::Medium
    } else {
        CompetitionLevel::Low
    }
}

/// Main and related rows estimated from a blog post count.
pub fn estimate_from_total(keyword: &Keyword, total: u64) -> Vec<KeywordMetrics> {
    let volume = total.saturating_mul(VOLUME_PER_POST);
    let main = KeywordMetrics::from_volume(
        keyword.as_str(),
        volume,
        competition_for_total(total),
        Source::Secondary,
    );

    std::iter::once(main)
        .chain(related_keywords(keyword, volume, Source::Secondary))
        .collect()
}

pub struct SecondaryKeywordClient {
    client: reqwest::Client,
    url: String,
    credentials: SecondaryCredentials,
}

impl SecondaryKeywordClient {
    pub fn new(
        base_url: &Url,
        credentials: SecondaryCredentials,
        timeouts: &Timeouts,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .build()?;

        let url = format!(
            "{}{}",
            base_url.as_str().trim_end_matches('/'),
            BLOG_SEARCH_PATH
        );

        Ok(SecondaryKeywordClient {
            client,
            url,
            credentials,
        })
    }

    /// Number of blog posts matching the keyword.
    pub async fn content_total(&self, keyword: &Keyword) -> Result<u64, UpstreamUnavailable> {
        let request = self
            .client
            .get(&self.url)
            .query(&[
                ("query", keyword.as_str()),
                ("display", "1"),
                ("sort", "sim"),
            ])
            .header("X-Client-Id", self.credentials.client_id.as_str())
            .header("X-Client-Secret", self.credentials.client_secret.as_str());

        let body: BlogSearchResponse = upstream_json(Source::Secondary, request).await?;
        Ok(body.total)
    }

    pub async fn fetch(
        &self,
        keyword: &Keyword,
    ) -> Result<Vec<KeywordMetrics>, UpstreamUnavailable> {
        let total = self.content_total(keyword).await?;
        tracing::debug!(keyword = %keyword, total, "blog search responded");
        Ok(estimate_from_total(keyword, total))
    }
}

#[async_trait]
impl KeywordTier for SecondaryKeywordClient {
    fn source(&self) -> Source {
        Source::Secondary
    }

    async fn attempt(&self, keyword: &Keyword) -> Result<Vec<KeywordMetrics>, UpstreamUnavailable> {
        self.fetch(keyword).await
    }
}
