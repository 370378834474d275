use crate::config::Config;
use crate::metrics_defs::{
    LOOKUP_DURATION, LOOKUP_EXHAUSTED, LOOKUP_REQUESTS, LOOKUP_SERVED, TIER_ATTEMPTS,
    TIER_FAILURES,
};
use crate::primary::PrimaryKeywordClient;
use crate::secondary::SecondaryKeywordClient;
use crate::synthetic::SyntheticKeywordGenerator;
use crate::tier::KeywordTier;
use crate::types::{Keyword, KeywordLookupResult, Source};
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum LookupError {
    #[error("a non-empty keyword is required")]
    InvalidArgument,

    #[error("every keyword source failed")]
    Exhausted,
}

/// Runs the fallback chain for a keyword.
///
/// Tiers are attempted one at a time in the order given, never concurrently. The
/// first tier to succeed answers the lookup; a failing tier is logged and the next one
/// is tried. With the synthetic generator at the end of the chain a valid keyword
/// always gets an answer.
#[derive(Clone)]
pub struct KeywordLookup {
    tiers: Arc<[Arc<dyn KeywordTier>]>,
}

impl KeywordLookup {
    pub fn new(tiers: Vec<Arc<dyn KeywordTier>>) -> Self {
        KeywordLookup {
            tiers: tiers.into(),
        }
    }

    /// Builds the chain from config. Tiers without credentials are left out, the
    /// synthetic generator is always last.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let mut tiers: Vec<Arc<dyn KeywordTier>> = Vec::with_capacity(3);

        match config.primary.credentials() {
            Some(credentials) => tiers.push(Arc::new(PrimaryKeywordClient::new(
                &config.primary.base_url,
                credentials,
                &config.timeouts,
            )?)),
            None => {
                tracing::warn!("primary keyword API credentials not configured, tier disabled")
            }
        }

        match config.secondary.credentials() {
            Some(credentials) => tiers.push(Arc::new(SecondaryKeywordClient::new(
                &config.secondary.base_url,
                credentials,
                &config.timeouts,
            )?)),
            None => {
                tracing::warn!("blog search API credentials not configured, tier disabled")
            }
        }

        tiers.push(Arc::new(SyntheticKeywordGenerator::new()));

        Ok(KeywordLookup::new(tiers))
    }

    /// Sources of the configured tiers, in the order they are tried.
    pub fn sources(&self) -> Vec<Source> {
        self.tiers.iter().map(|tier| tier.source()).collect()
    }

    pub async fn lookup(&self, raw_keyword: &str) -> Result<KeywordLookupResult, LookupError> {
        let keyword = Keyword::parse(raw_keyword)?;
        counter!(LOOKUP_REQUESTS).increment(1);
        let started = Instant::now();

        for tier in self.tiers.iter() {
            let source = tier.source();
            counter!(TIER_ATTEMPTS, "tier" => source.as_str()).increment(1);

            match tier.attempt(&keyword).await {
                Ok(rows) => {
                    let result = KeywordLookupResult::from_rows(&keyword, source, rows);
                    histogram!(LOOKUP_DURATION).record(started.elapsed().as_secs_f64());
                    counter!(LOOKUP_SERVED, "source" => source.as_str()).increment(1);
                    tracing::info!(
                        keyword = %keyword,
                        source = %source,
                        total = result.main_keyword().total_searches(),
                        related = result.related_keywords().len(),
                        "keyword lookup served"
                    );
                    return Ok(result);
                }
                Err(err) => {
                    counter!(TIER_FAILURES, "tier" => source.as_str()).increment(1);
                    tracing::warn!(
                        keyword = %keyword,
                        tier = %source,
                        error = %err,
                        "keyword tier unavailable, falling through"
                    );
                }
            }
        }

        counter!(LOOKUP_EXHAUSTED).increment(1);
        tracing::error!(
            keyword = %keyword,
            tiers = self.tiers.len(),
            "every keyword tier failed"
        );
        Err(LookupError::Exhausted)
    }
}
