use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

struct JwksCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
}

impl JwksCache {
    fn lookup(&self, kid: &str, ttl: Duration) -> Option<DecodingKey> {
        if self.fetched_at.elapsed() >= ttl {
            return None;
        }
        self.keys.get(kid).cloned()
    }
}

/// Fetches the issuer's signing keys and caches them for `cache_ttl`.
///
/// An unknown `kid` forces a refetch so rotated keys are picked up early.
pub struct JwksClient {
    jwks_url: String,
    client: reqwest::Client,
    cache: RwLock<Option<JwksCache>>,
    cache_ttl: Duration,
}

impl JwksClient {
    pub fn new(jwks_url: &str, cache_ttl: Duration) -> Self {
        Self {
            jwks_url: jwks_url.to_string(),
            client: reqwest::Client::new(),
            cache: RwLock::new(None),
            cache_ttl,
        }
    }

    pub async fn get_key(&self, kid: &str) -> Result<DecodingKey, JwksError> {
        if let Some(key) = self
            .cache
            .read()
            .await
            .as_ref()
            .and_then(|cache| cache.lookup(kid, self.cache_ttl))
        {
            return Ok(key);
        }

        let keys = self.fetch_keys().await?;
        let key = keys.get(kid).cloned();

        *self.cache.write().await = Some(JwksCache {
            keys,
            fetched_at: Instant::now(),
        });

        key.ok_or_else(|| JwksError::KeyNotFound(kid.to_string()))
    }

    async fn fetch_keys(&self) -> Result<HashMap<String, DecodingKey>, JwksError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| JwksError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(JwksError::Fetch(format!("HTTP {}", response.status())));
        }

        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| JwksError::Parse(e.to_string()))?;

        tracing::debug!("Fetched {} keys from {}", jwks.keys.len(), self.jwks_url);

        rsa_keys(jwks.keys)
    }
}

/// Keep RSA keys only; other key types cannot verify RS256 tokens
fn rsa_keys(keys: Vec<Jwk>) -> Result<HashMap<String, DecodingKey>, JwksError> {
    let mut decoded = HashMap::new();

    for jwk in keys.into_iter().filter(|k| k.kty == "RSA") {
        let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
            return Err(JwksError::KeyConversion(format!(
                "RSA key '{}' is missing its modulus or exponent",
                jwk.kid
            )));
        };

        let key = DecodingKey::from_rsa_components(n, e)
            .map_err(|err| JwksError::KeyConversion(err.to_string()))?;
        decoded.insert(jwk.kid, key);
    }

    Ok(decoded)
}

#[derive(Debug, thiserror::Error)]
pub enum JwksError {
    #[error("Failed to fetch JWKS: {0}")]
    Fetch(String),

    #[error("Failed to parse JWKS: {0}")]
    Parse(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Failed to convert key: {0}")]
    KeyConversion(String),
}
