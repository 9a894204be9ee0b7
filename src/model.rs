// Conference and session records shared by the client, cache and HTTP layers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::BUILTIN_CONFERENCES;
use crate::error::{Result, SessionsError};

/// Upstream session record, kept as semi-structured JSON.
pub type RawSession = Value;

/// One yearly edition of the conference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conference {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slottimes: Option<Value>,
    pub year: String,
}

#[derive(Deserialize)]
struct UpstreamConference {
    id: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    slottimes: Option<Value>,
}

impl Conference {
    /// Build a conference from one element of the upstream conference list.
    pub fn from_upstream(value: Value) -> Result<Self> {
        let raw: UpstreamConference = serde_json::from_value(value)
            .map_err(|e| SessionsError::MalformedResponse(format!("conference record: {}", e)))?;
        let year = year_from_slug(&raw.slug);
        Ok(Self {
            id: raw.id,
            slug: raw.slug,
            name: raw.name,
            slottimes: raw.slottimes.filter(|v| !v.is_null()),
            year,
        })
    }

    /// The static list shown when the upstream cannot be reached at all.
    pub fn builtin_list() -> Vec<Self> {
        BUILTIN_CONFERENCES
            .iter()
            .map(|(slug, name)| Self {
                id: (*slug).to_string(),
                slug: (*slug).to_string(),
                name: (*name).to_string(),
                slottimes: None,
                year: year_from_slug(slug),
            })
            .collect()
    }
}

/// `javazone_2023` -> `2023`. Empty when the slug carries no `_` segment.
pub fn year_from_slug(slug: &str) -> String {
    slug.split('_').nth(1).unwrap_or_default().to_string()
}

/// Sort newest year first. Stable, so equal years keep upstream order.
pub fn sort_newest_first(conferences: &mut [Conference]) {
    conferences.sort_by(|a, b| b.year.cmp(&a.year));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    pub name: String,
}

/// Canonical display record for a submitted talk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub session_id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub summary: String,
    pub format: String,
    pub length: String,
    pub language: String,
    pub room: String,
    pub start_time: String,
    pub end_time: String,
    pub video: String,
    pub speakers: Vec<Speaker>,
    pub status: String,
    pub tags: Vec<String>,
    pub year: String,
}

/// Which tier answered a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    /// The lazily initialized primary cache.
    Primary,
    /// A direct upstream call made after the primary cache failed.
    Fallback,
    /// The built-in conference list.
    Static,
}

/// A value tagged with the tier that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub value: T,
    pub source: CacheSource,
}

impl<T> Sourced<T> {
    pub fn primary(value: T) -> Self {
        Self {
            value,
            source: CacheSource::Primary,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            source: CacheSource::Fallback,
        }
    }
}
