//! vSphere REST API HTTP client with session-based authentication.
//!
//! Communicates with vCenter via `https://{host}:{port}/api/...`.
//! Manages session lifecycle (create / delete) and provides typed helpers.

use crate::error::{VsphereError, VsphereResult};
use crate::types::VsphereConfig;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const SESSION_HEADER: &str = "vmware-api-session-id";

/// vSphere REST API client.
pub struct VsphereClient {
    client: Client,
    base_url: String,
    session_id: Option<String>,
    config: VsphereConfig,
}

impl VsphereClient {
    /// Build a new client from config (does NOT create a session yet).
    pub fn new(config: &VsphereConfig) -> VsphereResult<Self> {
        let base_url = format!("https://{}:{}", config.host, config.port);
        Self::with_base_url(config, base_url)
    }

    /// Build a client against an explicit base URL such as
    /// `http://127.0.0.1:8080`. Host and port in `config` are ignored.
    pub fn with_base_url(config: &VsphereConfig, base_url: impl Into<String>) -> VsphereResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VsphereError::connection(format!("Failed to build HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            session_id: None,
            config: config.clone(),
        })
    }

    /// Base URL for API calls.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether we have an active session.
    pub fn is_connected(&self) -> bool {
        self.session_id.is_some()
    }

    /// Current session ID (if any).
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Current config.
    pub fn config(&self) -> &VsphereConfig {
        &self.config
    }

    // ── Session management ──────────────────────────────────────────

    /// Create a new API session (POST /api/session).
    pub async fn login(&mut self) -> VsphereResult<String> {
        let url = format!("{}/api/session", self.base_url);
        tracing::debug!(url = %url, user = %self.config.username, "creating vSphere session");

        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(VsphereError::auth("Invalid credentials"));
        }

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VsphereError::api(
                status.as_u16(),
                format!("Login failed: {body}"),
            ));
        }

        // Session ID comes back as a quoted JSON string
        let session_id: String = resp.json().await.map_err(|e| {
            VsphereError::parse(format!("Failed to parse session response: {e}"))
        })?;

        self.session_id = Some(session_id.clone());
        Ok(session_id)
    }

    /// Delete the current session (DELETE /api/session).
    ///
    /// Teardown problems are logged only; the local session is always dropped.
    pub async fn logout(&mut self) {
        if let Some(sid) = self.session_id.take() {
            let url = format!("{}/api/session", self.base_url);
            match self
                .client
                .delete(&url)
                .header(SESSION_HEADER, sid.as_str())
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!("vSphere session closed");
                }
                Ok(resp) => {
                    tracing::warn!(status = %resp.status(), "vSphere session delete was rejected");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to delete vSphere session");
                }
            }
        }
    }

    /// Check if the session is still valid (GET /api/session).
    pub async fn check_session(&self) -> VsphereResult<bool> {
        let sid = self.require_session()?;
        let url = format!("{}/api/session", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header(SESSION_HEADER, sid)
            .send()
            .await?;

        Ok(resp.status().is_success())
    }

    // ── HTTP helpers ────────────────────────────────────────────────

    fn require_session(&self) -> VsphereResult<&str> {
        self.session_id
            .as_deref()
            .ok_or_else(|| VsphereError::connection("Not logged in: no active session"))
    }

    /// GET a JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> VsphereResult<T> {
        self.get_with_params(path, &[]).await
    }

    /// GET a JSON response with query params (borrowed).
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> VsphereResult<T> {
        let sid = self.require_session()?;
        let url = format!("{}{}", self.base_url, path);
        tracing::trace!(url = %url, ?params, "GET");
        let resp = self
            .client
            .get(&url)
            .header(SESSION_HEADER, sid)
            .query(params)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        Self::parse_response(resp).await
    }

    /// POST with JSON body, return parsed response.
    pub async fn post<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> VsphereResult<T> {
        let sid = self.require_session()?;
        let url = format!("{}{}", self.base_url, path);
        tracing::trace!(url = %url, "POST");
        let resp = self
            .client
            .post(&url)
            .header(SESSION_HEADER, sid)
            .json(body)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        Self::parse_response(resp).await
    }

    /// POST an operation as an asynchronous task (`vmw-task=true`) and
    /// return the task identifier.
    pub async fn post_task<B: serde::Serialize>(&self, path: &str, body: &B) -> VsphereResult<String> {
        let sep = if path.contains('?') { '&' } else { '?' };
        let path = format!("{path}{sep}vmw-task=true");
        let task: Option<String> = self.post(&path, body).await?;
        task.filter(|t| !t.is_empty())
            .ok_or_else(|| VsphereError::parse(format!("No task id returned by {path}")))
    }

    // ── Internal helpers ────────────────────────────────────────────

    async fn check_status(resp: Response) -> VsphereResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let code = status.as_u16();
        let body = resp.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED => Err(VsphereError::auth(format!("Session expired or invalid: {body}"))),
            StatusCode::FORBIDDEN => Err(VsphereError::access_denied(format!("Access denied: {body}"))),
            StatusCode::NOT_FOUND => Err(VsphereError::not_found(format!("Resource not found: {body}"))),
            _ => Err(VsphereError::api(code, format!("API error {code}: {body}"))),
        }
    }

    async fn parse_response<T: DeserializeOwned>(resp: Response) -> VsphereResult<T> {
        let text = resp.text().await.map_err(|e| {
            VsphereError::parse(format!("Failed to read response body: {e}"))
        })?;

        if text.is_empty() {
            // Some vSphere endpoints return empty body for success
            return serde_json::from_str("null").map_err(|e| {
                VsphereError::parse(format!("Cannot deserialise empty response: {e}"))
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            let snippet: String = text.chars().take(500).collect();
            VsphereError::parse(format!("JSON parse error: {e}; body: {snippet}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> VsphereConfig {
        VsphereConfig {
            host: "vcenter.lab.local".into(),
            username: "administrator@vsphere.local".into(),
            password: "secret".into(),
            ..Default::default()
        }
    }

    #[test]
    fn base_url_uses_https_host_and_port() {
        let client = VsphereClient::new(&VsphereConfig { port: 8443, ..config() }).unwrap();
        assert_eq!(client.base_url(), "https://vcenter.lab.local:8443");
        assert!(!client.is_connected());
    }

    #[test]
    fn explicit_base_url_strips_trailing_slash() {
        let client = VsphereClient::with_base_url(&config(), "http://127.0.0.1:9000/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9000");
    }

    #[tokio::test]
    async fn requests_without_session_fail_fast() {
        let client = VsphereClient::new(&config()).unwrap();
        let err = client.get::<serde_json::Value>("/api/vcenter/vm").await.unwrap_err();
        assert_eq!(err.kind, crate::error::VsphereErrorKind::ConnectionError);
    }

    #[test]
    fn logout_without_session_is_a_no_op() {
        let mut client = VsphereClient::new(&config()).unwrap();
        tokio_test::block_on(client.logout());
        assert!(client.session_id().is_none());
    }
}
