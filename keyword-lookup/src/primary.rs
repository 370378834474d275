//! Client for the signed keyword tool API, the first tier of the chain.
use crate::config::{PrimaryCredentials, Timeouts};
use crate::signer::{RequestSigner, current_timestamp_millis};
use crate::tier::{KeywordTier, UpstreamUnavailable, upstream_json};
use crate::types::{CompetitionLevel, Keyword, KeywordMetrics, Source};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use url::Url;

pub const KEYWORDS_TOOL_PATH: &str = "/keywordstool";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeywordsToolResponse {
    #[serde(default)]
    keyword_list: Vec<KeywordsToolRow>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeywordsToolRow {
    rel_keyword: String,
    #[serde(default, deserialize_with = "deserialize_count")]
    monthly_pc_qc_cnt: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    monthly_mobile_qc_cnt: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    monthly_ave_pc_clk_cnt: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    monthly_ave_mobile_clk_cnt: u64,
    #[serde(default)]
    comp_idx: Option<String>,
}

impl From<KeywordsToolRow> for KeywordMetrics {
    fn from(row: KeywordsToolRow) -> Self {
        let competition_level = row
            .comp_idx
            .as_deref()
            .and_then(CompetitionLevel::from_label)
            .unwrap_or(CompetitionLevel::Medium);

        KeywordMetrics {
            keyword: row.rel_keyword,
            monthly_desktop_searches: row.monthly_pc_qc_cnt,
            monthly_mobile_searches: row.monthly_mobile_qc_cnt,
            average_desktop_clicks: row.monthly_ave_pc_clk_cnt,
            average_mobile_clicks: row.monthly_ave_mobile_clk_cnt,
            competition_level,
            source: Source::Primary,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Number(f64),
    Text(String),
}

// Counts arrive as numbers, or as text such as "< 10" for low volume keywords.
fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<RawCount>::deserialize(deserializer)? {
        Some(RawCount::Number(n)) => floor_count(n),
        Some(RawCount::Text(text)) => {
            let digits: String = text
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '<' && *c != ',')
                .collect();
            digits.parse().map(floor_count).unwrap_or(0)
        }
        None => 0,
    };
    Ok(count)
}

fn floor_count(n: f64) -> u64 {
    if n.is_finite() && n > 0.0 {
        n.floor() as u64
    } else {
        0
    }
}

pub struct PrimaryKeywordClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
    customer_id: String,
    signer: RequestSigner,
}

impl PrimaryKeywordClient {
    pub fn new(
        base_url: &Url,
        credentials: PrimaryCredentials,
        timeouts: &Timeouts,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .build()?;

        let url = format!(
            "{}{}",
            base_url.as_str().trim_end_matches('/'),
            KEYWORDS_TOOL_PATH
        );

        Ok(PrimaryKeywordClient {
            client,
            url,
            api_key: credentials.api_key,
            customer_id: credentials.customer_id,
            signer: RequestSigner::new(credentials.secret_key),
        })
    }

    pub async fn fetch(
        &self,
        keyword: &Keyword,
    ) -> Result<Vec<KeywordMetrics>, UpstreamUnavailable> {
        let timestamp = current_timestamp_millis();
        let signature = self.signer.sign(&timestamp, "GET", KEYWORDS_TOOL_PATH);

        let request = self
            .client
            .get(&self.url)
            .query(&[("hintKeywords", keyword.as_str()), ("showDetail", "1")])
            .header("X-Timestamp", timestamp.as_str())
            .header("X-API-KEY", self.api_key.as_str())
            .header("X-Customer", self.customer_id.as_str())
            .header("X-Signature", signature.as_str());

        let body: KeywordsToolResponse = upstream_json(Source::Primary, request).await?;
        tracing::debug!(
            keyword = %keyword,
            rows = body.keyword_list.len(),
            "keyword tool responded"
        );

        Ok(body.keyword_list.into_iter().map(KeywordMetrics::from).collect())
    }
}

#[async_trait]
impl KeywordTier for PrimaryKeywordClient {
    fn source(&self) -> Source {
        Source::Primary
    }

    async fn attempt(&self, keyword: &Keyword) -> Result<Vec<KeywordMetrics>, UpstreamUnavailable> {
        self.fetch(keyword).await
    }
}
