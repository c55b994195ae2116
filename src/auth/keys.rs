use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use tokio::sync::RwLock;

use super::AuthError;
use crate::errors::AppError;

pub const DEFAULT_MIN_REFRESH_SECS: u64 = 30;

/// Resolves issuer signing keys by key identifier.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// `Ok(None)` when no key carries `kid`.
    async fn key(&self, kid: &str) -> Result<Option<Jwk>, AuthError>;
}

fn find_jwk<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|key| key.common.key_id.as_deref() == Some(kid))
}

/// Fixed key set, loaded once.
#[derive(Debug, Clone)]
pub struct StaticKeySource {
    keys: JwkSet,
}

impl StaticKeySource {
    pub fn new(keys: JwkSet) -> Self {
        Self { keys }
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| AppError::configuration(format!("failed to read {}: {err}", path.display())))?;
        let keys: JwkSet = serde_json::from_str(&raw)
            .map_err(|err| AppError::configuration(format!("invalid JWKS in {}: {err}", path.display())))?;
        Ok(Self::new(keys))
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn key(&self, kid: &str) -> Result<Option<Jwk>, AuthError> {
        Ok(find_jwk(&self.keys, kid).cloned())
    }
}

#[derive(Debug, Clone)]
struct CachedJwks {
    jwks: JwkSet,
    fetched_at: Instant,
    expires_at: Instant,
}

/// Key set published by the issuer, cached for `ttl`.
///
/// An unknown `kid` forces one refetch so rotated keys are picked up
/// before the cache expires. Such refetches happen at most once per
/// `min_refresh`; in between, unknown ids are answered from the cache.
#[derive(Debug)]
pub struct JwksKeySource {
    client: reqwest::Client,
    url: String,
    ttl: Duration,
    min_refresh: Duration,
    cache: RwLock<Option<CachedJwks>>,
}

impl JwksKeySource {
    pub fn new(url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            ttl,
            min_refresh: Duration::from_secs(DEFAULT_MIN_REFRESH_SECS),
            cache: RwLock::new(None),
        }
    }

    pub fn with_min_refresh(mut self, min_refresh: Duration) -> Self {
        self.min_refresh = min_refresh;
        self
    }

    async fn cached(&self) -> Option<CachedJwks> {
        let guard = self.cache.read().await;
        let fresh = guard
            .as_ref()
            .filter(|entry| entry.expires_at > Instant::now())
            .cloned();
        fresh
    }

    async fn refresh(&self) -> Result<JwkSet, AuthError> {
        tracing::debug!(url = %self.url, "fetching signing keys");

        let jwks: JwkSet = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| AuthError::KeySetUnavailable(err.to_string()))?
            .json()
            .await
            .map_err(|err| AuthError::KeySetUnavailable(err.to_string()))?;

        let now = Instant::now();
        let mut guard = self.cache.write().await;
        *guard = Some(CachedJwks {
            jwks: jwks.clone(),
            fetched_at: now,
            expires_at: now + self.ttl,
        });

        Ok(jwks)
    }
}

#[async_trait]
impl KeySource for JwksKeySource {
    async fn key(&self, kid: &str) -> Result<Option<Jwk>, AuthError> {
        if let Some(entry) = self.cached().await {
            if let Some(key) = find_jwk(&entry.jwks, kid) {
                return Ok(Some(key.clone()));
            }
            if entry.fetched_at.elapsed() < self.min_refresh {
                tracing::debug!(kid, "unknown key id, refetch throttled");
                return Ok(None);
            }
        }

        let jwks = self.refresh().await?;
        Ok(find_jwk(&jwks, kid).cloned())
    }
}
