// Shared test fixtures: an in-memory, fetch-counting conference source.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use libum::error::{Result, SessionsError};
use libum::model::{Conference, RawSession};
use libum::source::traits::ConferenceSource;

pub fn conference(id: &str, slug: &str, name: &str) -> Conference {
    Conference::from_upstream(json!({ "id": id, "slug": slug, "name": name })).unwrap()
}

pub fn raw_session(id: &str, title: &str, speaker: &str) -> Value {
    json!({
        "id": id,
        "sessionId": id,
        "data": {
            "title": { "privateData": false, "value": title },
            "format": { "privateData": false, "value": "presentation" },
            "tagswithauthor": { "privateData": true, "value": [{ "tag": "core", "author": "pk" }] }
        },
        "speakers": [{ "name": speaker }]
    })
}

fn server_error() -> SessionsError {
    SessionsError::UpstreamRequestFailed {
        status: 500,
        status_text: "Internal Server Error".to_string(),
    }
}

#[derive(Default)]
pub struct MockSource {
    conferences: Mutex<Vec<Conference>>,
    sessions: Mutex<HashMap<String, Vec<Value>>>,
    details: Mutex<HashMap<String, Value>>,
    failing_sessions: Mutex<HashSet<String>>,
    failing_conferences: Mutex<bool>,
    delay: Mutex<Option<Duration>>,
    conference_fetches: AtomicUsize,
    session_fetches: Mutex<HashMap<String, usize>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conference(self, conf: Conference, sessions: Vec<Value>) -> Self {
        self.sessions.lock().insert(conf.id.clone(), sessions);
        self.conferences.lock().push(conf);
        self
    }

    pub fn with_detail(self, slug: &str, detail: Value) -> Self {
        self.details.lock().insert(slug.to_string(), detail);
        self
    }

    /// Every upstream call sleeps this long before answering.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }

    pub fn fail_sessions(&self, conference_id: &str) {
        self.failing_sessions.lock().insert(conference_id.to_string());
    }

    pub fn heal_sessions(&self, conference_id: &str) {
        self.failing_sessions.lock().remove(conference_id);
    }

    pub fn fail_conferences(&self, fail: bool) {
        *self.failing_conferences.lock() = fail;
    }

    pub fn conference_fetches(&self) -> usize {
        self.conference_fetches.load(Ordering::SeqCst)
    }

    pub fn session_fetches(&self, conference_id: &str) -> usize {
        self.session_fetches
            .lock()
            .get(conference_id)
            .copied()
            .unwrap_or(0)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ConferenceSource for MockSource {
    async fn fetch_conferences(&self) -> Result<Vec<Conference>> {
        self.conference_fetches.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if *self.failing_conferences.lock() {
            return Err(server_error());
        }
        Ok(self.conferences.lock().clone())
    }

    async fn fetch_sessions(&self, conference_id: &str) -> Result<Vec<RawSession>> {
        *self
            .session_fetches
            .lock()
            .entry(conference_id.to_string())
            .or_insert(0) += 1;
        self.pause().await;
        if self.failing_sessions.lock().contains(conference_id) {
            return Err(server_error());
        }
        Ok(self
            .sessions
            .lock()
            .get(conference_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_session_detail(&self, slug: &str) -> Result<RawSession> {
        self.details
            .lock()
            .get(slug)
            .cloned()
            .ok_or(SessionsError::UpstreamRequestFailed {
                status: 404,
                status_text: "Not Found".to_string(),
            })
    }

    async fn fetch_public_sessions(&self, conference_slug: &str) -> Result<Vec<RawSession>> {
        let id = self
            .conferences
            .lock()
            .iter()
            .find(|c| c.slug == conference_slug)
            .map(|c| c.id.clone());
        Ok(id
            .and_then(|id| self.sessions.lock().get(&id).cloned())
            .unwrap_or_default())
    }
}
