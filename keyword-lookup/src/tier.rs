use crate::types::{Keyword, KeywordMetrics, Source};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// One step of the fallback chain.
///
/// Tiers are tried in order and the first `Ok` wins. A tier reports any failure as
/// `UpstreamUnavailable`, which the chain treats as a signal to move on.
#[async_trait]
pub trait KeywordTier: Send + Sync {
    fn source(&self) -> Source;

    async fn attempt(&self, keyword: &Keyword) -> Result<Vec<KeywordMetrics>, UpstreamUnavailable>;
}

#[derive(thiserror::Error, Debug)]
#[error("{tier} tier unavailable: {cause}")]
pub struct UpstreamUnavailable {
    pub tier: Source,
    #[source]
    pub cause: UnavailableCause,
}

#[derive(thiserror::Error, Debug)]
pub enum UnavailableCause {
    #[error("request timed out")]
    Timeout,
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    #[error("unreadable response body: {0}")]
    Decode(String),
}

impl UpstreamUnavailable {
    pub fn new(tier: Source, cause: UnavailableCause) -> Self {
        UpstreamUnavailable { tier, cause }
    }

    pub(crate) fn from_reqwest(tier: Source, err: reqwest::Error) -> Self {
        let cause = if err.is_timeout() {
            UnavailableCause::Timeout
        } else if err.is_decode() {
            UnavailableCause::Decode(err.to_string())
        } else {
            UnavailableCause::Transport(err)
        };
        UpstreamUnavailable::new(tier, cause)
    }
}

/// Sends `request` and decodes a JSON body from a 200 response.
pub(crate) async fn upstream_json<T: DeserializeOwned>(
    tier: Source,
    request: reqwest::RequestBuilder,
) -> Result<T, UpstreamUnavailable> {
    let response = request
        .send()
        .await
        .map_err(|e| UpstreamUnavailable::from_reqwest(tier, e))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(UpstreamUnavailable::new(
            tier,
            UnavailableCause::Status(status),
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| UpstreamUnavailable::from_reqwest(tier, e))?;

    serde_json::from_slice(&body)
        .map_err(|e| UpstreamUnavailable::new(tier, UnavailableCause::Decode(e.to_string())))
}
