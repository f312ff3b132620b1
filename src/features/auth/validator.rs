use super::model::AuthenticatedUser;
use crate::core::config::AuthConfig;
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::jwks::JwksClient;

/// Claim carrying the caller's roles
const ROLES_CLAIM: &str = "roles";

pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    audience: String,
    leeway: u64,
    username_claim: String,
}

/// Registered claims are checked by jsonwebtoken; the rest are kept for mapping
#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl JwtValidator {
    pub fn new(jwks_client: Arc<JwksClient>, config: &AuthConfig) -> Self {
        Self {
            jwks_client,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            leeway: config.jwt_leeway.as_secs(),
            username_claim: config.username_claim.clone(),
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Auth(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Auth(format!(
                "Unsupported algorithm: {:?}. Only RS256 is allowed",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::Auth("Missing kid in token header".to_string()))?;

        let decoding_key = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        Ok(user_from_claims(token_data.claims, &self.username_claim))
    }
}

/// Build the principal, falling back to `sub` when the username claim is absent
fn user_from_claims(claims: Claims, username_claim: &str) -> AuthenticatedUser {
    let username = claims
        .extra
        .get(username_claim)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| claims.sub.clone());

    let roles = claims
        .extra
        .get(ROLES_CLAIM)
        .and_then(Value::as_array)
        .map(|roles| {
            roles
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    AuthenticatedUser {
        sub: claims.sub,
        username,
        roles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> Claims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_username_and_roles_from_claims() {
        let user = user_from_claims(
            claims(json!({
                "sub": "u-1",
                "iss": "https://auth.test",
                "username": "alice",
                "roles": ["inspector", 42, "super_admin"]
            })),
            "username",
        );

        assert_eq!(user.sub, "u-1");
        assert_eq!(user.username, "alice");
        assert_eq!(user.roles, vec!["inspector", "super_admin"]);
    }

    #[test]
    fn test_username_falls_back_to_sub() {
        let user = user_from_claims(
            claims(json!({ "sub": "u-2", "preferred_username": "" })),
            "preferred_username",
        );

        assert_eq!(user.username, "u-2");
        assert!(user.roles.is_empty());
    }
}
