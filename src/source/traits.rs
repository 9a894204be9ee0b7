use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Conference, RawSession};

/// Read-only view of the upstream conference API.
#[async_trait]
pub trait ConferenceSource: Send + Sync {
    /// All conferences, in upstream order.
    async fn fetch_conferences(&self) -> Result<Vec<Conference>>;

    /// Every submitted session of one conference.
    async fn fetch_sessions(&self, conference_id: &str) -> Result<Vec<RawSession>>;

    /// One detailed session record.
    async fn fetch_session_detail(&self, slug: &str) -> Result<RawSession>;

    /// The unauthenticated public program of a conference.
    async fn fetch_public_sessions(&self, conference_slug: &str) -> Result<Vec<RawSession>>;
}
