use crate::config::IdentityConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const DEV_DEFAULT_EMAIL: &str = "test@example.com";

/// Identity asserted by the external identity provider for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub email: String,
}

impl VerifiedIdentity {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
        }
    }

    /// Stable identity used while verification is switched off.
    pub fn development(email: Option<&str>) -> Self {
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(DEV_DEFAULT_EMAIL);
        Self::new(format!("dev-{email}"), email)
    }
}

/// Validates bearer tokens with the identity provider's account lookup
/// endpoint (Firebase Identity Toolkit wire format).
#[derive(Clone)]
pub struct IdentityProvider {
    http: Client,
    cfg: IdentityConfig,
}

impl IdentityProvider {
    pub fn new(cfg: IdentityConfig) -> Self {
        Self {
            http: Client::new(),
            cfg,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cfg.enabled
    }

    /// Resolves the caller. With verification disabled, any request (token
    /// or not) runs as the development identity for `dev_email`.
    pub async fn authenticate(
        &self,
        token: Option<&str>,
        dev_email: Option<&str>,
    ) -> AppResult<VerifiedIdentity> {
        if !self.is_enabled() {
            return Ok(VerifiedIdentity::development(dev_email));
        }

        match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => self.verify_token(token).await,
            None => Err(AppError::AuthError(
                "Unauthorized: No token provided".to_string(),
            )),
        }
    }

    pub async fn verify_token(&self, token: &str) -> AppResult<VerifiedIdentity> {
        let url = format!(
            "{}/v1/accounts:lookup?key={}",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.api_key
        );

        let resp = self
            .http
            .post(&url)
            .json(&json!({ "idToken": token }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("identity lookup failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            log::warn!("Identity token rejected: HTTP {}: {}", status.as_u16(), body);
            return Err(AppError::AuthError("Unauthorized: Invalid token".to_string()));
        }

        let body: LookupResponse = resp.json().await?;
        identity_from_lookup(body)
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

fn identity_from_lookup(body: LookupResponse) -> AppResult<VerifiedIdentity> {
    let invalid = || AppError::AuthError("Unauthorized: Invalid token".to_string());

    let user = body.users.into_iter().next().ok_or_else(invalid)?;
    let email = user.email.filter(|e| !e.is_empty()).ok_or_else(invalid)?;
    Ok(VerifiedIdentity::new(user.local_id, email))
}
