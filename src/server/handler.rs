// Axum request handlers: expose the read façade as a small JSON API for page renderers.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, CredentialSummary};
use crate::engine::filter::SessionFilter;
use crate::engine::reader::{CacheReport, SessionDetail, SessionListing, SessionReader};
use crate::error::SessionsError;
use crate::model::{CacheSource, Conference, Session};
use crate::source::diagnostics::ApiCheck;
use crate::source::http_source::HttpSource;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<SessionReader>,
    pub config: Arc<AppConfig>,
    /// Direct client for connectivity checks, bypassing the cache.
    pub upstream: Arc<HttpSource>,
}

pub struct AppServer {
    addr: SocketAddr,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl AppServer {
    /// Bind `bind_addr` (port 0 picks a free port) and serve in the background.
    pub async fn start(state: AppState, bind_addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let app = router(state);

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("http server stopped: {}", e);
            }
        });

        info!("listening on http://{}", addr);
        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Absolute URL for a path on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/conferences", get(conferences_handler))
        .route("/api/sessions", get(sessions_handler))
        .route("/api/sessions/{id}", get(session_handler))
        .route("/api/public/{slug}", get(public_sessions_handler))
        .route("/api/stats", get(stats_handler))
        .route("/debug/env", get(debug_env_handler))
        .route("/debug/api", get(debug_api_handler))
        .with_state(state)
}

struct ApiError(SessionsError);

impl From<SessionsError> for ApiError {
    fn from(e: SessionsError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SessionsError::UnknownConference(_) | SessionsError::NoConferenceForYear(_) => {
                StatusCode::NOT_FOUND
            }
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::NOT_FOUND {
            debug!("request failed: {}", self.0);
        } else {
            error!("request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConferencesBody {
    pub conferences: Vec<Conference>,
    pub source: CacheSource,
}

/// GET /api/conferences. Falls back to the built-in list when nothing else answers.
async fn conferences_handler(State(state): State<AppState>) -> Json<ConferencesBody> {
    match state.reader.list_conferences().await {
        Ok(sourced) => Json(ConferencesBody {
            conferences: sourced.value,
            source: sourced.source,
        }),
        Err(e) => {
            warn!("serving built-in conference list: {}", e);
            Json(ConferencesBody {
                conferences: Conference::builtin_list(),
                source: CacheSource::Static,
            })
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListingQuery {
    year: Option<String>,
    title: Option<String>,
    author: Option<String>,
    format: Option<String>,
    tag: Option<String>,
    status: Option<String>,
}

/// GET /api/sessions?year=&title=&author=&format=&tag=&status=
async fn sessions_handler(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<SessionListing>, ApiError> {
    let filter = SessionFilter {
        title: query.title,
        author: query.author,
        format: query.format,
        tag: query.tag,
        status: query.status,
    };
    let listing = state
        .reader
        .list_sessions(query.year.as_deref(), &filter)
        .await?;
    Ok(Json(listing))
}

/// GET /api/sessions/{id}
async fn session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.reader.session_detail(&id).await? {
        Some(detail) => Ok(Json::<SessionDetail>(detail).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("session {} not found", id) })),
        )
            .into_response()),
    }
}

#[derive(Debug, Serialize)]
struct PublicSessionsBody {
    sessions: Vec<Session>,
}

/// GET /api/public/{slug}. Unauthenticated public program.
async fn public_sessions_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicSessionsBody>, ApiError> {
    let sessions = state.reader.public_sessions(&slug).await?;
    Ok(Json(PublicSessionsBody { sessions }))
}

async fn stats_handler(State(state): State<AppState>) -> Json<CacheReport> {
    Json(state.reader.report())
}

#[derive(Debug, Serialize)]
struct Diagnostics {
    environment: String,
    upstream_url: String,
    credential: CredentialSummary,
}

/// GET /debug/env. Credential presence and shape, never its value.
async fn debug_env_handler(State(state): State<AppState>) -> Json<Diagnostics> {
    Json(Diagnostics {
        environment: state.config.environment.clone(),
        upstream_url: state.config.upstream_url.clone(),
        credential: state.config.credential_summary(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiCheckQuery {
    conference: Option<String>,
}

/// GET /debug/api?conference=. Calls the upstream directly and reports status and payload shape.
async fn debug_api_handler(
    State(state): State<AppState>,
    Query(query): Query<ApiCheckQuery>,
) -> Json<ApiCheck> {
    let report = state
        .upstream
        .check_api(query.conference.as_deref().filter(|c| !c.is_empty()))
        .await;
    info!(
        "upstream check authenticated={} conferences_ok={} sessions_ok={}",
        report.authenticated,
        report.conferences.as_ref().is_some_and(|c| c.ok),
        report.sessions.as_ref().is_some_and(|c| c.ok)
    );
    Json(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: SessionsError) -> StatusCode {
        ApiError(e).into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(SessionsError::UnknownConference("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(SessionsError::NoConferenceForYear("1999".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(SessionsError::CredentialsMissing),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(SessionsError::AuthenticationFailed),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(SessionsError::UpstreamRequestFailed {
                status: 503,
                status_text: "Service Unavailable".into()
            }),
            StatusCode::BAD_GATEWAY
        );
    }
}
