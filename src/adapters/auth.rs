use crate::adapters::{read_json, send_error};
use crate::config::toml_config::ServiceConfig;
use crate::utils::error::{ReplenishError, Result};
use reqwest::Client;
use std::fmt;

/// Bearer token handed to each HTTP client for the whole run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("token", &"***").finish()
    }
}

/// Returns the configured static token, or exchanges client credentials for one.
pub async fn acquire_credential(
    client: &Client,
    service: &str,
    config: &ServiceConfig,
) -> Result<Credential> {
    if let Some(token) = &config.token {
        return Ok(Credential::bearer(token.clone()));
    }

    let auth = config
        .auth
        .as_ref()
        .ok_or_else(|| ReplenishError::MissingConfigError {
            field: format!("{}.auth", service),
        })?;

    tracing::debug!("🔑 Requesting {} token from {}", service, auth.token_url);
    let response = client
        .post(&auth.token_url)
        .basic_auth(&auth.client_id, Some(&auth.client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(|e| send_error(service, e))?;

    let body = read_json(service, response, false).await?;
    let token = body
        .get("access_token")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ReplenishError::malformed(service, "token response lacks access_token"))?;

    Ok(Credential::bearer(token))
}
