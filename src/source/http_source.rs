use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use super::diagnostics::{ApiCheck, EndpointCheck, PayloadShape};
use super::payload::{parse_json, Payload};
use super::traits::ConferenceSource;
use crate::config::BUILTIN_CONFERENCES;
use crate::error::{Result, SessionsError};
use crate::model::{Conference, RawSession};

/// Client for the conference API, authenticating with HTTP Basic auth.
pub struct HttpSource {
    client: Client,
    base_url: String,
    credential: Option<String>,
}

impl HttpSource {
    pub fn new(base_url: String, credential: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// `Basic <base64(user:pass)>`, or `CredentialsMissing`.
    fn authorization(&self) -> Result<String> {
        match self.credential.as_deref() {
            Some(c) if !c.is_empty() => Ok(format!("Basic {}", STANDARD.encode(c))),
            _ => {
                warn!("upstream credential missing");
                Err(SessionsError::CredentialsMissing)
            }
        }
    }

    /// Base URL plus `segments`, each percent-encoded as exactly one path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SessionsError::Transport(format!("invalid upstream url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SessionsError::Transport("upstream url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn build_request(&self, url: Url, authorization: Option<&str>) -> RequestBuilder {
        let mut req = self.client.get(url).header("Accept", "application/json");
        if let Some(auth) = authorization {
            req = req.header("Authorization", auth);
        }
        req
    }

    async fn send(&self, segments: &[&str], authenticated: bool) -> Result<(String, Response)> {
        let authorization = if authenticated {
            Some(self.authorization()?)
        } else {
            None
        };
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        let resp = self
            .build_request(url, authorization.as_deref())
            .send()
            .await?;
        debug!("upstream GET {} status={}", path, resp.status().as_u16());
        Ok((path, resp))
    }

    async fn get_json(&self, segments: &[&str], authenticated: bool) -> Result<Value> {
        let (path, resp) = self.send(segments, authenticated).await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("upstream rejected credentials path={}", path);
            return Err(SessionsError::AuthenticationFailed);
        }
        if !status.is_success() {
            warn!("upstream request failed path={} status={}", path, status.as_u16());
            return Err(SessionsError::UpstreamRequestFailed {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body: Bytes = resp.bytes().await?;
        parse_json(&body)
    }

    /// Call one authenticated endpoint and describe what came back. Never fails.
    async fn check_endpoint(&self, segments: &[&str]) -> (EndpointCheck, Option<Value>) {
        let mut check = EndpointCheck {
            path: format!("/{}", segments.join("/")),
            ..EndpointCheck::default()
        };
        let (path, resp) = match self.send(segments, true).await {
            Ok(sent) => sent,
            Err(e) => {
                check.error = Some(e.to_string());
                return (check, None);
            }
        };
        let status = resp.status();
        check.path = path;
        check.status = Some(status.as_u16());
        check.ok = status.is_success();
        check.status_text = status.canonical_reason().unwrap_or_default().to_string();
        if !check.ok {
            return (check, None);
        }

        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => {
                check.error = Some(e.to_string());
                return (check, None);
            }
        };
        match parse_json(&body) {
            Ok(value) => {
                check.data = Some(PayloadShape::of(&value));
                (check, Some(value))
            }
            Err(e) => {
                check.error = Some(e.to_string());
                (check, None)
            }
        }
    }

    /// Connectivity report for the conference list and one conference's sessions.
    ///
    /// The session check uses `conference_id` when given, else the first id in
    /// the conference list, else the newest built-in conference.
    pub async fn check_api(&self, conference_id: Option<&str>) -> ApiCheck {
        if !self.has_credential() {
            return ApiCheck {
                authenticated: false,
                conferences: None,
                sessions: None,
            };
        }

        let (conferences, value) = self.check_endpoint(&["data", "conference"]).await;
        let listed_id = value.and_then(|v| {
            Payload::classify(v, "conferences")
                .into_items()
                .first()
                .and_then(|c| c.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        let target = conference_id
            .map(str::to_string)
            .or(listed_id)
            .or_else(|| BUILTIN_CONFERENCES.first().map(|(slug, _)| (*slug).to_string()))
            .unwrap_or_default();

        let (sessions, _) = self
            .check_endpoint(&["data", "conference", target.as_str(), "session"])
            .await;

        ApiCheck {
            authenticated: true,
            conferences: Some(conferences),
            sessions: Some(sessions),
        }
    }
}

#[async_trait]
impl ConferenceSource for HttpSource {
    async fn fetch_conferences(&self) -> Result<Vec<Conference>> {
        let value = self.get_json(&["data", "conference"], true).await?;
        let conferences: Vec<Conference> = Payload::classify(value, "conferences")
            .into_items()
            .into_iter()
            .filter_map(|item| match Conference::from_upstream(item) {
                Ok(conference) => Some(conference),
                Err(e) => {
                    warn!("skipping conference record: {}", e);
                    None
                }
            })
            .collect();
        debug!("fetched {} conferences", conferences.len());
        Ok(conferences)
    }

    async fn fetch_sessions(&self, conference_id: &str) -> Result<Vec<RawSession>> {
        let value = self
            .get_json(&["data", "conference", conference_id, "session"], true)
            .await?;
        let sessions = Payload::classify(value, "sessions").into_items();
        debug!(
            "fetched {} sessions for conference {}",
            sessions.len(),
            conference_id
        );
        Ok(sessions)
    }

    async fn fetch_session_detail(&self, slug: &str) -> Result<RawSession> {
        self.get_json(&["data", "session", slug], true).await
    }

    async fn fetch_public_sessions(&self, conference_slug: &str) -> Result<Vec<RawSession>> {
        let value = self
            .get_json(&["public", "allSessions", conference_slug], false)
            .await?;
        Ok(Payload::classify(value, "sessions").into_items())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(base: &str) -> HttpSource {
        HttpSource::new(base.to_string(), Some("u:p".to_string()))
    }

    #[test]
    fn test_endpoint_encodes_each_segment() {
        let src = source("http://upstream.test/");
        let url = src.endpoint(&["data", "session", "../conference"]).unwrap();
        assert_eq!(url.path(), "/data/session/..%2Fconference");

        let url = src.endpoint(&["data", "session", "abc?x=1#top"]).unwrap();
        assert_eq!(url.path(), "/data/session/abc%3Fx=1%23top");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = source("http://upstream.test/api")
            .endpoint(&["data", "conference"])
            .unwrap();
        assert_eq!(url.as_str(), "http://upstream.test/api/data/conference");
    }

    #[test]
    fn test_endpoint_rejects_invalid_base() {
        assert!(matches!(
            source("not a url").endpoint(&["data"]),
            Err(SessionsError::Transport(_))
        ));
    }
}
