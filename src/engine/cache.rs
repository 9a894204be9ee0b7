// In-memory conference/session cache with single-flight lazy initialization and a tagged fallback tier.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::normalize::normalize_sessions;
use super::stats::{StatsCollector, StatsSnapshot};
use crate::error::{Result, SessionsError};
use crate::model::{Conference, RawSession, Session};
use crate::source::traits::ConferenceSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Empty,
    Initializing,
    Ready,
}

/// One conference together with its sessions, raw and normalized.
#[derive(Debug, Clone)]
pub struct ConferenceEntry {
    pub conference: Conference,
    pub raw: Vec<RawSession>,
    pub sessions: Vec<Session>,
}

/// A single cached session and the conference it belongs to.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub conference_id: String,
    pub session: Session,
    pub raw: RawSession,
}

/// Contents of a completed initialization pass. Never mutated after publication.
#[derive(Debug, Default)]
pub struct CacheSnapshot {
    conferences: Vec<Conference>,
    entries: HashMap<String, ConferenceEntry>,
}

impl CacheSnapshot {
    pub fn conferences(&self) -> &[Conference] {
        &self.conferences
    }

    pub fn entry(&self, conference_id: &str) -> Option<&ConferenceEntry> {
        self.entries.get(conference_id)
    }

    /// First session whose normalized id matches, searching conferences in list order.
    pub fn find_session(&self, session_id: &str) -> Option<SessionRecord> {
        self.conferences
            .iter()
            .filter_map(|c| self.entries.get(&c.id))
            .find_map(|entry| {
                entry
                    .sessions
                    .iter()
                    .position(|s| s.id == session_id)
                    .map(|idx| SessionRecord {
                        conference_id: entry.conference.id.clone(),
                        session: entry.sessions[idx].clone(),
                        raw: entry.raw[idx].clone(),
                    })
            })
    }
}

enum State {
    Empty,
    Initializing,
    Ready(Arc<CacheSnapshot>),
}

/// Results of direct upstream calls made after the primary cache failed.
/// Never merged into the primary snapshot.
#[derive(Default)]
struct FallbackTier {
    conferences: Option<Vec<Conference>>,
    sessions: HashMap<String, Vec<RawSession>>,
}

pub struct SessionCache {
    source: Arc<dyn ConferenceSource>,
    state: RwLock<State>,
    init_lock: AsyncMutex<()>,
    /// Bumped every time an initialization pass ends or the cache is cleared.
    generation: AtomicU64,
    last_failure: Mutex<Option<SessionsError>>,
    fallback: RwLock<FallbackTier>,
    fallback_lock: AsyncMutex<()>,
    stats: Arc<StatsCollector>,
}

impl SessionCache {
    pub fn new(source: Arc<dyn ConferenceSource>) -> Self {
        Self {
            source,
            state: RwLock::new(State::Empty),
            init_lock: AsyncMutex::new(()),
            generation: AtomicU64::new(0),
            last_failure: Mutex::new(None),
            fallback: RwLock::new(FallbackTier::default()),
            fallback_lock: AsyncMutex::new(()),
            stats: Arc::new(StatsCollector::new()),
        }
    }

    pub fn status(&self) -> CacheStatus {
        match &*self.state.read() {
            State::Empty => CacheStatus::Empty,
            State::Initializing => CacheStatus::Initializing,
            State::Ready(_) => CacheStatus::Ready,
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Populate the cache now instead of on first read.
    pub async fn initialize(&self) -> Result<()> {
        self.snapshot().await.map(|_| ())
    }

    /// The ready snapshot, running the initialization pass if needed.
    ///
    /// Only one pass runs at a time. Callers that arrive while a pass is in
    /// flight wait for it and receive its outcome, including its error.
    pub async fn snapshot(&self) -> Result<Arc<CacheSnapshot>> {
        if let Some(snapshot) = self.ready_snapshot() {
            self.stats.record_primary_hit();
            return Ok(snapshot);
        }

        let observed = self.generation.load(Ordering::Acquire);
        let _guard = self.init_lock.lock().await;

        if let Some(snapshot) = self.ready_snapshot() {
            self.stats.record_primary_hit();
            return Ok(snapshot);
        }
        if self.generation.load(Ordering::Acquire) != observed {
            let failure = self.last_failure.lock().clone();
            if let Some(e) = failure {
                debug!("sharing failure of the pass this caller waited on");
                return Err(e);
            }
        }

        self.run_initialization().await
    }

    pub async fn conferences(&self) -> Result<Vec<Conference>> {
        Ok(self.snapshot().await?.conferences().to_vec())
    }

    pub async fn conference_entry(&self, conference_id: &str) -> Result<ConferenceEntry> {
        self.snapshot()
            .await?
            .entry(conference_id)
            .cloned()
            .ok_or_else(|| SessionsError::UnknownConference(conference_id.to_string()))
    }

    pub async fn sessions(&self, conference_id: &str) -> Result<Vec<Session>> {
        Ok(self.conference_entry(conference_id).await?.sessions)
    }

    pub async fn raw_sessions(&self, conference_id: &str) -> Result<Vec<RawSession>> {
        Ok(self.conference_entry(conference_id).await?.raw)
    }

    pub async fn session(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.session_record(session_id).await?.map(|r| r.session))
    }

    pub async fn raw_session(&self, session_id: &str) -> Result<Option<RawSession>> {
        Ok(self.session_record(session_id).await?.map(|r| r.raw))
    }

    pub async fn session_record(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        Ok(self.snapshot().await?.find_session(session_id))
    }

    /// Look up a conference without triggering initialization.
    pub fn known_conference(&self, conference_id: &str) -> Option<Conference> {
        if let Some(snapshot) = self.ready_snapshot() {
            if let Some(entry) = snapshot.entry(conference_id) {
                return Some(entry.conference.clone());
            }
        }
        self.fallback
            .read()
            .conferences
            .as_ref()
            .and_then(|list| list.iter().find(|c| c.id == conference_id).cloned())
    }

    /// Drop both tiers. The next read starts a fresh initialization pass.
    pub async fn clear(&self) {
        let _guard = self.init_lock.lock().await;
        let _fallback_guard = self.fallback_lock.lock().await;
        *self.state.write() = State::Empty;
        *self.last_failure.lock() = None;
        *self.fallback.write() = FallbackTier::default();
        self.generation.fetch_add(1, Ordering::Release);
        info!("session cache cleared");
    }

    /// Conference list from the fallback tier, fetched directly on first use.
    pub async fn fallback_conferences(&self) -> Result<Vec<Conference>> {
        let cached = self.fallback.read().conferences.clone();
        if let Some(conferences) = cached {
            self.stats.record_fallback_hit();
            return Ok(conferences);
        }

        let _guard = self.fallback_lock.lock().await;
        let cached = self.fallback.read().conferences.clone();
        if let Some(conferences) = cached {
            self.stats.record_fallback_hit();
            return Ok(conferences);
        }

        self.stats.record_fallback_fetch();
        self.stats.record_upstream_fetch();
        let conferences = self.source.fetch_conferences().await?;
        info!("fallback tier cached {} conferences", conferences.len());
        self.fallback.write().conferences = Some(conferences.clone());
        Ok(conferences)
    }

    /// Raw sessions from the fallback tier, fetched directly on first use.
    pub async fn fallback_sessions(&self, conference_id: &str) -> Result<Vec<RawSession>> {
        let cached = self.fallback.read().sessions.get(conference_id).cloned();
        if let Some(sessions) = cached {
            self.stats.record_fallback_hit();
            return Ok(sessions);
        }

        let _guard = self.fallback_lock.lock().await;
        let cached = self.fallback.read().sessions.get(conference_id).cloned();
        if let Some(sessions) = cached {
            self.stats.record_fallback_hit();
            return Ok(sessions);
        }

        self.stats.record_fallback_fetch();
        self.stats.record_upstream_fetch();
        let sessions = self.source.fetch_sessions(conference_id).await?;
        info!(
            "fallback tier cached {} sessions for conference {}",
            sessions.len(),
            conference_id
        );
        self.fallback
            .write()
            .sessions
            .insert(conference_id.to_string(), sessions.clone());
        Ok(sessions)
    }

    fn ready_snapshot(&self) -> Option<Arc<CacheSnapshot>> {
        match &*self.state.read() {
            State::Ready(snapshot) => Some(Arc::clone(snapshot)),
            _ => None,
        }
    }

    /// Caller must hold `init_lock`.
    async fn run_initialization(&self) -> Result<Arc<CacheSnapshot>> {
        *self.state.write() = State::Initializing;
        self.stats.record_initialization();
        info!("initializing session cache");

        let result = match self.populate().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.state.write() = State::Ready(Arc::clone(&snapshot));
                *self.last_failure.lock() = None;
                info!(
                    "session cache ready: {} conferences",
                    snapshot.conferences().len()
                );
                Ok(snapshot)
            }
            Err(e) => {
                // Partial results are discarded; the next caller starts over.
                *self.state.write() = State::Empty;
                *self.last_failure.lock() = Some(e.clone());
                self.stats.record_init_failure();
                warn!("session cache initialization failed: {}", e);
                Err(e)
            }
        };

        self.generation.fetch_add(1, Ordering::Release);
        result
    }

    /// Fetch every conference and then, one at a time in list order, its sessions.
    async fn populate(&self) -> Result<CacheSnapshot> {
        self.stats.record_upstream_fetch();
        let conferences = self.source.fetch_conferences().await?;

        let mut entries = HashMap::with_capacity(conferences.len());
        for conference in &conferences {
            self.stats.record_upstream_fetch();
            let raw = self.source.fetch_sessions(&conference.id).await?;
            let sessions = normalize_sessions(&raw, &conference.year);
            info!(
                "cached {} sessions for {} ({})",
                sessions.len(),
                conference.name,
                conference.id
            );
            entries.insert(
                conference.id.clone(),
                ConferenceEntry {
                    conference: conference.clone(),
                    raw,
                    sessions,
                },
            );
        }

        Ok(CacheSnapshot {
            conferences,
            entries,
        })
    }
}
