// Listing filters and facet extraction for session tables.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::Session;

/// Optional listing filters. Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionFilter {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Case-insensitive substring of any speaker name.
    pub author: Option<String>,
    pub format: Option<String>,
    pub tag: Option<String>,
    pub status: Option<String>,
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl SessionFilter {
    pub fn is_empty(&self) -> bool {
        [&self.title, &self.author, &self.format, &self.tag, &self.status]
            .into_iter()
            .all(|v| active(v).is_none())
    }

    pub fn matches(&self, session: &Session) -> bool {
        if let Some(title) = active(&self.title) {
            if !session.title.to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }
        if let Some(author) = active(&self.author) {
            let needle = author.to_lowercase();
            if !session
                .speakers
                .iter()
                .any(|sp| sp.name.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        if let Some(format) = active(&self.format) {
            if session.format != format {
                return false;
            }
        }
        if let Some(tag) = active(&self.tag) {
            if !session.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(status) = active(&self.status) {
            if session.status != status {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, sessions: Vec<Session>) -> Vec<Session> {
        if self.is_empty() {
            return sessions;
        }
        sessions.into_iter().filter(|s| self.matches(s)).collect()
    }
}

/// Distinct values available for the format, status and tag filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionFacets {
    pub formats: Vec<String>,
    pub statuses: Vec<String>,
    pub tags: Vec<String>,
}

impl SessionFacets {
    pub fn collect(sessions: &[Session]) -> Self {
        let mut facets = Self::default();
        for session in sessions {
            push_unique(&mut facets.formats, &session.format);
            push_unique(&mut facets.statuses, &session.status);
            for tag in &session.tags {
                push_unique(&mut facets.tags, tag);
            }
        }
        sort_tags(&mut facets.tags);
        facets
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

/// Year tags (exactly four digits).
fn is_year_tag(tag: &str) -> bool {
    tag.len() == 4 && tag.bytes().all(|b| b.is_ascii_digit())
}

/// Alphabetical, case-insensitive, with four-digit year tags last.
pub fn sort_tags(tags: &mut [String]) {
    tags.sort_by(|a, b| match (is_year_tag(a), is_year_tag(b)) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::normalize::normalize_session;
    use serde_json::json;

    fn sample() -> Vec<Session> {
        vec![
            normalize_session(
                &json!({
                    "id": "a",
                    "title": "Rust in Production",
                    "format": "presentation",
                    "status": "accepted",
                    "speakers": [{"name": "Ada Lovelace"}],
                    "data": {"tagswithauthor": {"value": [{"tag": "core"}, {"tag": "2024"}]}}
                }),
                "2024",
            ),
            normalize_session(
                &json!({
                    "id": "b",
                    "title": "Kotlin Workshop",
                    "format": "workshop",
                    "speakers": [{"name": "Grace Hopper"}],
                    "data": {"tagswithauthor": {"value": [{"tag": "lang"}]}}
                }),
                "2024",
            ),
        ]
    }

    fn ids(sessions: &[Session]) -> Vec<&str> {
        sessions.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = SessionFilter {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.is_empty());
        assert_eq!(filter.apply(sample()).len(), 2);
    }

    #[test]
    fn test_title_and_author_are_case_insensitive() {
        let filter = SessionFilter {
            title: Some("rust".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(sample())), vec!["a"]);

        let filter = SessionFilter {
            author: Some("HOPPER".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(sample())), vec!["b"]);
    }

    #[test]
    fn test_exact_matches() {
        let filter = SessionFilter {
            format: Some("workshop".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(sample())), vec!["b"]);

        let filter = SessionFilter {
            tag: Some("core".into()),
            status: Some("accepted".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(sample())), vec!["a"]);

        let filter = SessionFilter {
            status: Some("confirm".into()),
            ..Default::default()
        };
        assert!(filter.apply(sample()).is_empty());
    }

    #[test]
    fn test_facets() {
        let facets = SessionFacets::collect(&sample());
        assert_eq!(facets.formats, vec!["presentation", "workshop"]);
        assert_eq!(facets.statuses, vec!["accepted", "confirmed"]);
        assert_eq!(facets.tags, vec!["core", "lang", "2024"]);
    }

    #[test]
    fn test_sort_tags_years_last() {
        let mut tags: Vec<String> = ["2023", "sec", "Ai", "12345", "arch", "2022"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        sort_tags(&mut tags);
        assert_eq!(tags, vec!["12345", "Ai", "arch", "sec", "2022", "2023"]);
    }
}
