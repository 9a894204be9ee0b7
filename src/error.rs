// Error taxonomy shared by the upstream client, the cache and the read façade.

/// Errors raised while fetching, caching or reading conference data.
///
/// `Clone` so the outcome of one initialization pass can be handed to every
/// caller that waited on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionsError {
    /// No Basic-Auth credential configured.
    #[error("authorization credentials missing; set MORESLEEP_BASIC_AUTH")]
    CredentialsMissing,

    /// Upstream answered 401.
    #[error("authorization failed; check the upstream credentials")]
    AuthenticationFailed,

    /// Upstream answered with any other non-success status.
    #[error("upstream request failed: {status} {status_text}")]
    UpstreamRequestFailed { status: u16, status_text: String },

    /// Body was not JSON, even after control-character sanitization.
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    /// No cached session list for this conference id.
    #[error("no cached sessions found for conference {0}")]
    UnknownConference(String),

    /// No conference matches the requested year.
    #[error("no conference found for year {0}")]
    NoConferenceForYear(String),

    /// Connection-level failure (DNS, TLS, reset, body read).
    #[error("transport error: {0}")]
    Transport(String),
}

impl SessionsError {
    /// True for failures that originate upstream rather than in local state.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed
                | Self::UpstreamRequestFailed { .. }
                | Self::MalformedResponse(_)
                | Self::Transport(_)
        )
    }
}

impl From<reqwest::Error> for SessionsError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SessionsError>;
