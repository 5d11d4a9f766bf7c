use crate::config::MoncashConfig;
use crate::moncash::MoncashError;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Renew this many seconds before the gateway-reported expiry.
pub const RENEW_BUFFER_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    fetched_at: Instant,
    expires_in_secs: u64,
}

pub fn needs_refresh(age_secs: u64, expires_in_secs: u64) -> bool {
    age_secs + RENEW_BUFFER_SECS >= expires_in_secs
}

/// OAuth bearer token cache. MonCash tokens are short-lived (59s), so every
/// outbound call goes through here rather than re-authenticating.
#[derive(Clone)]
pub struct TokenCache {
    client_id: String,
    client_secret: String,
    api_host: String,
    timeout_ms: u64,
    client: reqwest::Client,
    inner: Arc<RwLock<Option<CachedToken>>>,
}

impl TokenCache {
    pub fn new(cfg: &MoncashConfig, client: reqwest::Client) -> Self {
        Self {
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            api_host: cfg.api_host.clone(),
            timeout_ms: cfg.timeout_ms,
            client,
            inner: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn bearer(&self) -> Result<String, MoncashError> {
        {
            let read = self.inner.read().await;
            if let Some(cached) = &*read {
                if !needs_refresh(cached.fetched_at.elapsed().as_secs(), cached.expires_in_secs) {
                    return Ok(cached.value.clone());
                }
            }
        }

        let fresh = self.fetch().await?;
        let value = fresh.value.clone();
        let mut write = self.inner.write().await;
        *write = Some(fresh);
        Ok(value)
    }

    async fn fetch(&self) -> Result<CachedToken, MoncashError> {
        let url = format!("https://{}/oauth/token", self.api_host);
        let resp = self
            .client
            .post(url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header("Accept", "application/json")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body("scope=read,write&grant_type=client_credentials")
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MoncashError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let token: TokenResponse = resp.json().await?;
        Ok(CachedToken {
            value: token.access_token,
            fetched_at: Instant::now(),
            expires_in_secs: token.expires_in.unwrap_or(59),
        })
    }
}
