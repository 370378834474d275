//! Last tier of the chain: plausible metrics derived from the keyword itself.
//!
//! Output is a pure function of the keyword so repeated lookups agree. The sequence
//! generator is `frac(sin(seed) * 10000)` with the seed incremented after every draw,
//! seeded with the sum of the keyword's UTF-16 code units. Other generators would
//! produce different numbers for the same keyword, so this one must stay as is.
use crate::related::related_keywords;
use crate::tier::{KeywordTier, UpstreamUnavailable};
use crate::types::{CompetitionLevel, Keyword, KeywordMetrics, Source, percent_of, split_volume};
use async_trait::async_trait;

const MIN_VOLUME: u64 = 5_000;
const VOLUME_RANGE: f64 = 40_000.0;
const HIGH_COMPETITION_VOLUME: u64 = 20_000;

struct SeededSequence {
    seed: f64,
}

impl SeededSequence {
    fn for_keyword(keyword: &str) -> Self {
        SeededSequence {
            seed: keyword.encode_utf16().map(f64::from).sum(),
        }
    }

    fn next(&mut self) -> f64 {
        let x = self.seed.sin() * 10_000.0;
        self.seed += 1.0;
        x - x.floor()
    }
}

pub fn base_volume(keyword: &str) -> u64 {
    let mut sequence = SeededSequence::for_keyword(keyword);
    (sequence.next() * VOLUME_RANGE).floor() as u64 + MIN_VOLUME
}

/// HIGH strictly above 20000, MEDIUM otherwise.
pub fn competition_for_base_volume(base_volume: u64) -> CompetitionLevel {
    if base_volume > HIGH_COMPETITION_VOLUME {
        CompetitionLevel::High
    } else {
        CompetitionLevel::Medium
    }
}

pub fn metrics_for_base_volume(keyword: &str, base_volume: u64) -> KeywordMetrics {
    let (desktop, mobile) = split_volume(base_volume);
    KeywordMetrics {
        keyword: keyword.to_string(),
        monthly_desktop_searches: desktop,
        monthly_mobile_searches: mobile,
        average_desktop_clicks: percent_of(base_volume, 1),
        average_mobile_clicks: percent_of(base_volume, 2),
        competition_level: competition_for_base_volume(base_volume),
        source: Source::Synthetic,
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SyntheticKeywordGenerator;

impl SyntheticKeywordGenerator {
    pub fn new() -> Self {
        SyntheticKeywordGenerator
    }

    pub fn generate(&self, keyword: &Keyword) -> Vec<KeywordMetrics> {
        let base = base_volume(keyword.as_str());
        let main = metrics_for_base_volume(keyword.as_str(), base);

        std::iter::once(main)
            .chain(related_keywords(keyword, base, Source::Synthetic))
            .collect()
    }
}

#[async_trait]
impl KeywordTier for SyntheticKeywordGenerator {
    fn source(&self) -> Source {
        Source::Synthetic
    }

    async fn attempt(&self, keyword: &Keyword) -> Result<Vec<KeywordMetrics>, UpstreamUnavailable> {
        Ok(self.generate(keyword))
    }
}
