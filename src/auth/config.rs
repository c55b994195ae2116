use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

use super::keys::DEFAULT_MIN_REFRESH_SECS;
use crate::errors::AppError;

const DEFAULT_JWKS_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Identity provider domain, e.g. `coffee.eu.auth0.com`.
    pub domain: String,
    pub audience: String,
    pub algorithms: Vec<Algorithm>,
    /// Local JWKS document used instead of fetching from the issuer.
    pub jwks_file: Option<PathBuf>,
    pub jwks_ttl: Duration,
    /// Shortest gap between refetches triggered by an unknown `kid`.
    pub jwks_min_refresh: Duration,
    /// Clock skew allowed on `exp`, in seconds. Zero rejects a token the
    /// moment it expires.
    pub leeway_secs: u64,
}

impl AuthConfig {
    pub fn new(domain: impl Into<String>, audience: impl Into<String>) -> Self {
        let domain = domain.into();
        let domain = domain
            .trim_start_matches("https://")
            .trim_end_matches('/')
            .to_string();

        Self {
            domain,
            audience: audience.into(),
            algorithms: vec![Algorithm::RS256],
            jwks_file: None,
            jwks_ttl: Duration::from_secs(DEFAULT_JWKS_TTL_SECS),
            jwks_min_refresh: Duration::from_secs(DEFAULT_MIN_REFRESH_SECS),
            leeway_secs: 0,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        let domain = std::env::var("AUTH0_DOMAIN").map_err(|_| AppError::configuration("AUTH0_DOMAIN not set"))?;
        let audience = std::env::var("API_AUDIENCE").map_err(|_| AppError::configuration("API_AUDIENCE not set"))?;

        let mut config = Self::new(domain, audience);

        if let Ok(raw) = std::env::var("AUTH_ALGORITHMS") {
            config.algorithms = parse_algorithms(&raw)?;
        }

        config.jwks_file = std::env::var("AUTH_JWKS_FILE")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        config.jwks_ttl = Duration::from_secs(env_secs("AUTH_JWKS_TTL_SECS", DEFAULT_JWKS_TTL_SECS)?);
        config.jwks_min_refresh =
            Duration::from_secs(env_secs("AUTH_JWKS_MIN_REFRESH_SECS", DEFAULT_MIN_REFRESH_SECS)?);
        config.leeway_secs = env_secs("AUTH_LEEWAY_SECS", 0)?;

        Ok(config)
    }

    pub fn issuer(&self) -> String {
        format!("https://{}/", self.domain)
    }

    pub fn jwks_url(&self) -> String {
        format!("https://{}/.well-known/jwks.json", self.domain)
    }
}

fn env_secs(name: &str, default: u64) -> Result<u64, AppError> {
    std::env::var(name)
        .map(|val| val.parse::<u64>())
        .unwrap_or(Ok(default))
        .map_err(|_| AppError::configuration(format!("{name} must be a valid integer")))
}

fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, AppError> {
    let algorithms = raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            Algorithm::from_str(name)
                .map_err(|_| AppError::configuration(format!("unsupported algorithm in AUTH_ALGORITHMS: {name}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if algorithms.is_empty() {
        return Err(AppError::configuration("AUTH_ALGORITHMS must list at least one algorithm"));
    }

    Ok(algorithms)
}
