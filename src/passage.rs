use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier issued by the passage service for a single passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassageId(pub i64);

impl fmt::Display for PassageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a registered site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub i64);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassageStatus {
    Pending,
    Translated,
}

impl PassageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Translated => "Translated",
        }
    }
}

/// One fetched unit of translatable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Position in the batch this passage was fetched with
    pub index: usize,
    pub content: String,
    pub snapshot_name: Option<String>,
    pub passage_id: PassageId,
    pub site_url: String,
    pub site_id: SiteId,
    pub status: PassageStatus,
}

impl Passage {
    pub fn is_translated(&self) -> bool {
        self.status == PassageStatus::Translated
    }

    /// First `max_chars` characters of the content, for list views.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteInfo {
    pub site_url: String,
    pub site_id: SiteId,
}

impl From<&Passage> for SiteInfo {
    fn from(passage: &Passage) -> Self {
        Self {
            site_url: passage.site_url.clone(),
            site_id: passage.site_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// A bounded result, conceptually one matching passage
    #[default]
    Single,
    /// Every pending passage of the site
    All,
}

impl SearchScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "single" => Some(Self::Single),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchCriteria {
    pub site_id: Option<SiteId>,
    pub scope: SearchScope,
}

impl SearchCriteria {
    pub fn new(site_id: Option<SiteId>, scope: SearchScope) -> Self {
        Self { site_id, scope }
    }

    /// Build criteria from raw user input. Input that does not start with an
    /// integer means "no site filter" and is never an error.
    pub fn parse(raw_site_id: &str, scope: SearchScope) -> Self {
        Self {
            site_id: parse_site_filter(raw_site_id),
            scope,
        }
    }
}

/// Leading-integer parse: optional sign then digits, trailing text ignored.
pub fn parse_site_filter(raw: &str) -> Option<SiteId> {
    let trimmed = raw.trim();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };

    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());

    if end == 0 {
        return None;
    }

    digits[..end].parse::<i64>().ok().map(|value| SiteId(sign * value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_site_filter() {
        assert_eq!(parse_site_filter(""), None);
        assert_eq!(parse_site_filter("   "), None);
        assert_eq!(parse_site_filter("abc"), None);
        assert_eq!(parse_site_filter("42"), Some(SiteId(42)));
        assert_eq!(parse_site_filter(" 42 "), Some(SiteId(42)));
        assert_eq!(parse_site_filter("12abc"), Some(SiteId(12)));
        assert_eq!(parse_site_filter("-3"), Some(SiteId(-3)));
        assert_eq!(parse_site_filter("-"), None);
        assert_eq!(parse_site_filter("99999999999999999999999"), None);
    }

    #[test]
    fn test_search_criteria_parse() {
        let criteria = SearchCriteria::parse("7", SearchScope::All);
        assert_eq!(criteria.site_id, Some(SiteId(7)));
        assert_eq!(criteria.scope, SearchScope::All);

        assert_eq!(SearchCriteria::parse("abc", SearchScope::Single), SearchCriteria::default());
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let passage = Passage {
            index: 0,
            content: "Acessibilidade é um direito".to_string(),
            snapshot_name: None,
            passage_id: PassageId(1),
            site_url: "https://example.org".to_string(),
            site_id: SiteId(1),
            status: PassageStatus::Pending,
        };
        assert_eq!(passage.preview(15), "Acessibilidade ...");
        assert_eq!(passage.preview(100), "Acessibilidade é um direito");
    }
}
