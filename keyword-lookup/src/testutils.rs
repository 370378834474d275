use crate::tier::{KeywordTier, UnavailableCause, UpstreamUnavailable};
use crate::types::{CompetitionLevel, Keyword, KeywordMetrics, Source};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Records which tiers were attempted, in order, and with which keyword.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<(Source, String)>>>);

impl CallLog {
    fn record(&self, source: Source, keyword: &Keyword) {
        self.0
            .lock()
            .unwrap()
            .push((source, keyword.as_str().to_string()));
    }

    pub fn calls(&self) -> Vec<Source> {
        self.0.lock().unwrap().iter().map(|(s, _)| *s).collect()
    }

    pub fn keywords(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|(_, k)| k.clone()).collect()
    }
}

pub struct MockTier {
    source: Source,
    rows: Option<Vec<KeywordMetrics>>,
    log: CallLog,
}

impl MockTier {
    pub fn succeeding(
        source: Source,
        rows: Vec<KeywordMetrics>,
        log: &CallLog,
    ) -> Arc<dyn KeywordTier> {
        Arc::new(MockTier {
            source,
            rows: Some(rows),
            log: log.clone(),
        })
    }

    pub fn failing(source: Source, log: &CallLog) -> Arc<dyn KeywordTier> {
        Arc::new(MockTier {
            source,
            rows: None,
            log: log.clone(),
        })
    }
}

#[async_trait]
impl KeywordTier for MockTier {
    fn source(&self) -> Source {
        self.source
    }

    async fn attempt(&self, keyword: &Keyword) -> Result<Vec<KeywordMetrics>, UpstreamUnavailable> {
        self.log.record(self.source, keyword);
        self.rows.clone().ok_or_else(|| {
            UpstreamUnavailable::new(
                self.source,
                UnavailableCause::Decode("mock upstream failure".into()),
            )
        })
    }
}

/// Tier with a bug: every attempt panics.
pub struct PanickingTier;

pub fn panicking_tier() -> Arc<dyn KeywordTier> {
    Arc::new(PanickingTier)
}

#[async_trait]
impl KeywordTier for PanickingTier {
    fn source(&self) -> Source {
        Source::Primary
    }

    async fn attempt(
        &self,
        _keyword: &Keyword,
    ) -> Result<Vec<KeywordMetrics>, UpstreamUnavailable> {
        panic!("tier defect: secret-key=abc123");
    }
}

/// Row with a made-up source; the chain re-tags rows with the answering tier.
pub fn row(keyword: &str, volume: u64) -> KeywordMetrics {
    KeywordMetrics::from_volume(
        keyword,
        volume,
        CompetitionLevel::Medium,
        Source::Synthetic,
    )
}
