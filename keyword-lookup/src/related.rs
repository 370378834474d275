// Related keyword rows shared by the secondary and synthetic tiers. Neither source
// knows real related searches, so a fixed table of marketing suffixes stands in.
use crate::types::{CompetitionLevel, Keyword, KeywordMetrics, Source, percent_of};

/// Suffix appended to the base keyword, and the percentage of the base volume the
/// related row receives.
pub const RELATED_KEYWORD_POLICY: [(&str, u64); 5] = [
    ("추천", 80),
    ("후기", 70),
    ("가격", 60),
    ("예약", 50),
    ("전문", 40),
];

pub fn related_keywords(
    keyword: &Keyword,
    base_volume: u64,
    source: Source,
) -> Vec<KeywordMetrics> {
    RELATED_KEYWORD_POLICY
        .iter()
        .map(|(suffix, percent)| {
            KeywordMetrics::from_volume(
                format!("{keyword} {suffix}"),
                percent_of(base_volume, *percent),
                CompetitionLevel::Medium,
                source,
            )
        })
        .collect()
}
