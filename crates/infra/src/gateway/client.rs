//! HTTP client for the device-management vendor API.

use std::time::Duration;

use async_trait::async_trait;
use credilock_core::lockout::ports::{DeviceGateway, DirectoryDevice};
use credilock_domain::{CredilockError, DirectoryConfig, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::session::SessionCache;
use crate::http::HttpClient;

/// Client for the external device directory.
///
/// Holds its own session state and is constructed once per process, then
/// shared by reference with the reconciliation engine (no global state).
pub struct DirectoryClient {
    base_url: String,
    http: HttpClient,
    username: String,
    password: String,
    profile_normal: String,
    profile_blocked: String,
    session: SessionCache,
}

impl DirectoryClient {
    /// Build a client from configuration. The per-call timeout bounds every
    /// vendor interaction so a hung call degrades into a per-device error.
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .max_attempts(3)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            username: config.username.clone(),
            password: config.password.clone(),
            profile_normal: config.profile_normal.clone(),
            profile_blocked: config.profile_blocked.clone(),
            session: SessionCache::default(),
        })
    }

    /// Obtain a usable session token, logging in if the cache is empty.
    async fn token(&self) -> Result<String> {
        if let Some(token) = self.session.current().await {
            return Ok(token);
        }
        self.authenticate().await
    }

    async fn authenticate(&self) -> Result<String> {
        let login_url = format!("{}/api/auth/login", self.base_url);
        let body = LoginRequest { username: &self.username, password: &self.password };

        let request = self.http.request(Method::POST, &login_url).json(&body);
        let response = self.http.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            let detail = body_text(response).await;
            return Err(CredilockError::Auth(format!(
                "directory login failed (HTTP {status}): {detail}"
            )));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| CredilockError::Internal(format!("invalid login response: {e}")))?;

        info!(expires_in = login.expires_in, "authenticated against device directory");
        self.session
            .store(login.token.clone(), Duration::from_secs(login.expires_in))
            .await;
        Ok(login.token)
    }

    /// Send an authorized request, transparently re-authenticating once when
    /// the vendor reports the session as stale (401). One retry per call,
    /// not unbounded.
    async fn authorized_send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&HttpClient, &str) -> RequestBuilder,
    {
        let token = self.token().await?;
        let response = self.http.send(build(&self.http, &token)).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("directory session rejected; re-authenticating once");
        self.session.invalidate().await;
        let token = self.authenticate().await?;
        let response = self.http.send(build(&self.http, &token)).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(CredilockError::Auth(
                "directory rejected a freshly issued session token".into(),
            ));
        }
        Ok(response)
    }

    async fn assign_profile(
        &self,
        device_number: &str,
        profile_id: &str,
        note: Option<&str>,
    ) -> Result<()> {
        let url = format!("{}/api/devices/{}/profile", self.base_url, device_number);
        let response = self
            .authorized_send(|http, token| {
                http.request(Method::PUT, &url)
                    .bearer_auth(token)
                    .json(&ProfileAssignment { profile_id, note })
            })
            .await
            .map_err(|e| gateway_error(device_number, e))?;

        let status = response.status();
        if status.is_success() {
            debug!(device_number, profile_id, "profile assigned");
            return Ok(());
        }

        let detail = body_text(response).await;
        Err(CredilockError::Gateway(format!(
            "profile assignment for device {device_number} failed (HTTP {status}): {detail}"
        )))
    }
}

#[async_trait]
impl DeviceGateway for DirectoryClient {
    async fn find_device(&self, device_number: &str) -> Result<Option<DirectoryDevice>> {
        let url = format!("{}/api/devices/{}", self.base_url, device_number);
        let response = self
            .authorized_send(|http, token| http.request(Method::GET, &url).bearer_auth(token))
            .await
            .map_err(|e| gateway_error(device_number, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let record: DeviceRecord = response.json().await.map_err(|e| {
                    CredilockError::Gateway(format!(
                        "invalid directory response for device {device_number}: {e}"
                    ))
                })?;
                Ok(Some(DirectoryDevice {
                    locked: record.profile_id == self.profile_blocked,
                    device_number: record.id,
                    name: record.name,
                }))
            }
            status => {
                let detail = body_text(response).await;
                Err(CredilockError::Gateway(format!(
                    "device lookup for {device_number} failed (HTTP {status}): {detail}"
                )))
            }
        }
    }

    async fn lock_device(&self, device_number: &str, reason: &str) -> Result<()> {
        self.assign_profile(device_number, &self.profile_blocked, Some(reason)).await
    }

    async fn unlock_device(&self, device_number: &str) -> Result<()> {
        self.assign_profile(device_number, &self.profile_normal, None).await
    }
}

/// Network/auth failures surface to the engine under the gateway taxonomy so
/// a pass can catch them per device.
fn gateway_error(device_number: &str, err: CredilockError) -> CredilockError {
    match err {
        CredilockError::Gateway(_) => err,
        other => CredilockError::Gateway(format!("device {device_number}: {other}")),
    }
}

async fn body_text(response: Response) -> String {
    response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string())
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceRecord {
    id: String,
    name: Option<String>,
    profile_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileAssignment<'a> {
    profile_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}
