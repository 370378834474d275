use crate::lookup::LookupError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Which tier of the fallback chain produced a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Source {
    Primary,
    Secondary,
    Synthetic,
}

impl Source {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Source::Primary => "primary",
            Source::Secondary => "secondary",
            Source::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
}

impl CompetitionLevel {
    /// Parses the competition index label used by the keyword tool ("낮음", "중간", "높음").
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "낮음" => Some(CompetitionLevel::Low),
            "중간" => Some(CompetitionLevel::Medium),
            "높음" => Some(CompetitionLevel::High),
            _ => None,
        }
    }
}

/// A validated search keyword: trimmed and never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keyword(String);

impl Keyword {
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LookupError::InvalidArgument);
        }
        Ok(Keyword(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key used to compare keywords: whitespace removed, lowercased.
pub fn normalize_keyword(keyword: &str) -> String {
    keyword
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// `percent`% of `volume`, floored. Computed in u128 so upstream-sized volumes cannot
/// overflow.
pub fn percent_of(volume: u64, percent: u64) -> u64 {
    let scaled = u128::from(volume) * u128::from(percent) / 100;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Splits a monthly search volume into its desktop and mobile shares (35% / 65%).
pub fn split_volume(volume: u64) -> (u64, u64) {
    (percent_of(volume, 35), percent_of(volume, 65))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMetrics {
    pub keyword: String,
    pub monthly_desktop_searches: u64,
    pub monthly_mobile_searches: u64,
    #[serde(default)]
    pub average_desktop_clicks: u64,
    #[serde(default)]
    pub average_mobile_clicks: u64,
    pub competition_level: CompetitionLevel,
    pub source: Source,
}

impl KeywordMetrics {
    /// Row with `volume` split between desktop and mobile and no click data.
    pub fn from_volume<K: Into<String>>(
        keyword: K,
        volume: u64,
        competition_level: CompetitionLevel,
        source: Source,
    ) -> Self {
        let (desktop, mobile) = split_volume(volume);
        KeywordMetrics {
            keyword: keyword.into(),
            monthly_desktop_searches: desktop,
            monthly_mobile_searches: mobile,
            average_desktop_clicks: 0,
            average_mobile_clicks: 0,
            competition_level,
            source,
        }
    }

    pub fn total_searches(&self) -> u64 {
        self.monthly_desktop_searches
            .saturating_add(self.monthly_mobile_searches)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordLookupResult {
    main_keyword: KeywordMetrics,
    related_keywords: Vec<KeywordMetrics>,
}

impl KeywordLookupResult {
    /// Normalizes the rows returned by one tier.
    ///
    /// Every row is tagged with `source`. The row matching `keyword` becomes the main
    /// keyword; when the tier returned none, a zero-volume row stands in. Related rows
    /// keep upstream order with the main keyword and repeats removed.
    pub fn from_rows(keyword: &Keyword, source: Source, rows: Vec<KeywordMetrics>) -> Self {
        let wanted = normalize_keyword(keyword.as_str());
        let mut main_keyword = None;
        let mut related_keywords = Vec::new();
        let mut seen = HashSet::new();

        for mut row in rows {
            let key = normalize_keyword(&row.keyword);
            if key.is_empty() {
                continue;
            }
            row.source = source;

            if key == wanted {
                if main_keyword.is_none() {
                    main_keyword = Some(row);
                }
            } else if seen.insert(key) {
                related_keywords.push(row);
            }
        }

        let main_keyword = main_keyword.unwrap_or_else(|| {
            KeywordMetrics::from_volume(keyword.as_str(), 0, CompetitionLevel::Low, source)
        });

        KeywordLookupResult {
            main_keyword,
            related_keywords,
        }
    }

    pub fn main_keyword(&self) -> &KeywordMetrics {
        &self.main_keyword
    }

    pub fn related_keywords(&self) -> &[KeywordMetrics] {
        &self.related_keywords
    }

    pub fn source(&self) -> Source {
        self.main_keyword.source
    }

    /// Flattens into the wire ordering: main keyword first, then related keywords.
    pub fn into_keyword_list(self) -> Vec<KeywordMetrics> {
        let mut list = Vec::with_capacity(self.related_keywords.len() + 1);
        list.push(self.main_keyword);
        list.extend(self.related_keywords);
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(keyword: &str, volume: u64, source: Source) -> KeywordMetrics {
        KeywordMetrics::from_volume(keyword, volume, CompetitionLevel::Medium, source)
    }

    #[test]
    fn test_keyword_parse() {
        assert_eq!(Keyword::parse("  강남맛집 ").unwrap().as_str(), "강남맛집");
        assert_eq!(Keyword::parse(""), Err(LookupError::InvalidArgument));
        assert_eq!(Keyword::parse(" \t\n"), Err(LookupError::InvalidArgument));
    }

    #[test]
    fn test_competition_labels() {
        assert_eq!(CompetitionLevel::from_label("낮음"), Some(CompetitionLevel::Low));
        assert_eq!(CompetitionLevel::from_label("중간"), Some(CompetitionLevel::Medium));
        assert_eq!(CompetitionLevel::from_label(" 높음 "), Some(CompetitionLevel::High));
        assert_eq!(CompetitionLevel::from_label("high"), None);
    }

    #[test]
    fn test_split_volume_floors() {
        assert_eq!(split_volume(180_000), (63_000, 117_000));
        assert_eq!(split_volume(7), (2, 4));
        assert_eq!(split_volume(0), (0, 0));
    }

    #[test]
    fn test_split_volume_near_max() {
        let (desktop, mobile) = split_volume(u64::MAX);
        assert_eq!(desktop, u64::MAX / 100 * 35 + u64::MAX % 100 * 35 / 100);
        assert!(mobile > desktop);
        assert_eq!(percent_of(u64::MAX, 100), u64::MAX);

        let mut row =
            KeywordMetrics::from_volume("seo", 0, CompetitionLevel::Low, Source::Primary);
        row.monthly_desktop_searches = u64::MAX;
        row.monthly_mobile_searches = 1;
        assert_eq!(row.total_searches(), u64::MAX);
    }

    #[test]
    fn test_from_rows_picks_main_and_dedupes() {
        let keyword = Keyword::parse("강남 맛집").unwrap();
        let rows = vec![
            row("강남역맛집", 100, Source::Secondary),
            row("강남맛집", 5000, Source::Primary),
            row("강남역 맛집", 90, Source::Primary),
            row("강남 맛집", 10, Source::Primary),
            row("", 1, Source::Primary),
            row("신사맛집", 80, Source::Primary),
        ];

        let result = KeywordLookupResult::from_rows(&keyword, Source::Primary, rows);

        assert_eq!(result.main_keyword().keyword, "강남맛집");
        assert_eq!(result.main_keyword().total_searches(), 5000);
        let related: Vec<_> = result
            .related_keywords()
            .iter()
            .map(|r| r.keyword.as_str())
            .collect();
        assert_eq!(related, vec!["강남역맛집", "신사맛집"]);
        assert!(result.related_keywords().iter().all(|r| r.source == Source::Primary));
        assert_eq!(result.source(), Source::Primary);
    }

    #[test]
    fn test_from_rows_without_main_row() {
        let keyword = Keyword::parse("seo agency").unwrap();
        let result = KeywordLookupResult::from_rows(&keyword, Source::Primary, vec![]);

        assert_eq!(result.main_keyword().keyword, "seo agency");
        assert_eq!(result.main_keyword().total_searches(), 0);
        assert_eq!(result.main_keyword().competition_level, CompetitionLevel::Low);
        assert!(result.related_keywords().is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(row("seo", 100, Source::Synthetic)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "keyword": "seo",
                "monthlyDesktopSearches": 35,
                "monthlyMobileSearches": 65,
                "averageDesktopClicks": 0,
                "averageMobileClicks": 0,
                "competitionLevel": "MEDIUM",
                "source": "SYNTHETIC",
            })
        );
    }
}
