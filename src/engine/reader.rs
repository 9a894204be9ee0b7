// Read façade: page-facing accessors over the cache, with a direct-upstream fallback path.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::cache::{CacheStatus, SessionCache};
use super::filter::{SessionFacets, SessionFilter};
use super::normalize::{normalize_session, normalize_sessions};
use super::stats::StatsSnapshot;
use crate::error::{Result, SessionsError};
use crate::model::{
    sort_newest_first, year_from_slug, CacheSource, Conference, RawSession, Session, Sourced,
};
use crate::source::traits::ConferenceSource;

/// Everything a session table needs for one conference year.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListing {
    pub selected_year: String,
    pub is_future_year: bool,
    pub conference: Option<Conference>,
    pub available_conferences: Vec<Conference>,
    pub sessions: Vec<Session>,
    /// Session count before filtering.
    pub total: usize,
    pub facets: SessionFacets,
    pub source: CacheSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionDetail {
    pub session: Session,
    pub raw: RawSession,
    pub source: CacheSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub status: CacheStatus,
    pub stats: StatsSnapshot,
}

pub struct SessionReader {
    cache: Arc<SessionCache>,
    source: Arc<dyn ConferenceSource>,
}

impl SessionReader {
    pub fn new(cache: Arc<SessionCache>, source: Arc<dyn ConferenceSource>) -> Self {
        Self { cache, source }
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    /// All conferences, newest year first.
    pub async fn conferences(&self) -> Result<Sourced<Vec<Conference>>> {
        let mut result = match self.cache.conferences().await {
            Ok(conferences) => Sourced::primary(conferences),
            Err(e) => {
                warn!("primary cache unavailable, fetching conferences directly: {}", e);
                Sourced::fallback(self.cache.fallback_conferences().await?)
            }
        };
        sort_newest_first(&mut result.value);
        Ok(result)
    }

    /// Normalized sessions of one conference.
    pub async fn sessions(&self, conference_id: &str) -> Result<Sourced<Vec<Session>>> {
        match self.cache.sessions(conference_id).await {
            Ok(sessions) => Ok(Sourced::primary(sessions)),
            Err(e) => {
                warn!(
                    "primary cache unavailable for conference {}, fetching directly: {}",
                    conference_id, e
                );
                let raw = self.cache.fallback_sessions(conference_id).await?;
                let year = self.year_of(conference_id);
                Ok(Sourced::fallback(normalize_sessions(&raw, &year)))
            }
        }
    }

    pub async fn list_conferences(&self) -> Result<Sourced<Vec<Conference>>> {
        self.conferences().await
    }

    /// Sessions for `year` (or the newest conference when absent), filtered.
    pub async fn list_sessions(
        &self,
        year: Option<&str>,
        filter: &SessionFilter,
    ) -> Result<SessionListing> {
        let conferences = self.conferences().await?;
        let selected_year = year
            .filter(|y| !y.is_empty())
            .map(str::to_string)
            .or_else(|| conferences.value.first().map(|c| c.year.clone()))
            .unwrap_or_default();
        let is_future_year = is_future_year(&selected_year, Utc::now().year());

        if conferences.value.is_empty() {
            return Ok(SessionListing {
                selected_year,
                is_future_year,
                conference: None,
                available_conferences: Vec::new(),
                sessions: Vec::new(),
                total: 0,
                facets: SessionFacets::default(),
                source: conferences.source,
            });
        }

        let conference = conferences
            .value
            .iter()
            .find(|c| c.year == selected_year)
            .cloned()
            .ok_or_else(|| SessionsError::NoConferenceForYear(selected_year.clone()))?;

        let sessions = self.sessions(&conference.id).await?;
        let source = if conferences.source == CacheSource::Primary
            && sessions.source == CacheSource::Primary
        {
            CacheSource::Primary
        } else {
            CacheSource::Fallback
        };

        let total = sessions.value.len();
        let facets = SessionFacets::collect(&sessions.value);
        let sessions = filter.apply(sessions.value);
        debug!(
            "listing year={} conference={} total={} shown={}",
            selected_year,
            conference.id,
            total,
            sessions.len()
        );

        Ok(SessionListing {
            selected_year,
            is_future_year,
            conference: Some(conference),
            available_conferences: conferences.value,
            sessions,
            total,
            facets,
            source,
        })
    }

    /// One session by normalized id. Cache misses go to the detail endpoint.
    pub async fn session_detail(&self, session_id: &str) -> Result<Option<SessionDetail>> {
        match self.cache.session_record(session_id).await {
            Ok(Some(record)) => {
                return Ok(Some(SessionDetail {
                    session: record.session,
                    raw: record.raw,
                    source: CacheSource::Primary,
                }))
            }
            Ok(None) => debug!("session {} not cached, asking upstream", session_id),
            Err(e) => warn!(
                "primary cache unavailable, fetching session {} directly: {}",
                session_id, e
            ),
        }

        match self.source.fetch_session_detail(session_id).await {
            Ok(raw) => {
                let year = raw
                    .get("conferenceId")
                    .and_then(|v| v.as_str())
                    .map(|id| self.year_of(id))
                    .unwrap_or_default();
                Ok(Some(SessionDetail {
                    session: normalize_session(&raw, &year),
                    raw,
                    source: CacheSource::Fallback,
                }))
            }
            Err(SessionsError::UpstreamRequestFailed { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The unauthenticated public program of a conference.
    pub async fn public_sessions(&self, conference_slug: &str) -> Result<Vec<Session>> {
        let raw = self.source.fetch_public_sessions(conference_slug).await?;
        Ok(normalize_sessions(&raw, &year_from_slug(conference_slug)))
    }

    pub fn report(&self) -> CacheReport {
        CacheReport {
            status: self.cache.status(),
            stats: self.cache.stats(),
        }
    }

    fn year_of(&self, conference_id: &str) -> String {
        self.cache
            .known_conference(conference_id)
            .map(|c| c.year)
            .unwrap_or_else(|| year_from_slug(conference_id))
    }
}

/// True when `year` parses and lies after `current_year`.
pub fn is_future_year(year: &str, current_year: i32) -> bool {
    year.parse::<i32>().is_ok_and(|y| y > current_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_future_year() {
        assert!(is_future_year("2031", 2030));
        assert!(!is_future_year("2030", 2030));
        assert!(!is_future_year("2021", 2030));
        assert!(!is_future_year("", 2030));
        assert!(!is_future_year("soon", 2030));
    }
}
