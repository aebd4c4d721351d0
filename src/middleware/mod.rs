use actix_web::{dev, error::ErrorUnauthorized, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::config::Config;

/// Claims carried by every staff bearer token. Issuance lives outside the
/// web tier (setup CLI, city identity provider); this module only verifies.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The worker's document id.
    pub sub: Uuid,
    /// The worker's display name.
    pub name: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Mints an HS256 bearer token for a worker. Used by the setup CLI and tests.
pub fn issue_worker_token(
    worker_id: Uuid,
    name: &str,
    secret: &str,
    valid_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: worker_id,
        name: name.to_string(),
        exp: (now + Duration::hours(valid_hours)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validates a bearer token and returns its claims. Signature and expiration
/// are checked; anything else is the issuer's business.
pub fn validate_worker_token(
    token: &str,
    secret: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// The authenticated staff member behind a request. Extracting this from a
/// request without a valid `Authorization: Bearer <token>` header yields 401.
#[derive(Debug, Serialize)]
pub struct AuthenticatedWorker {
    pub worker_id: Uuid,
    pub name: String,
}

impl FromRequest for AuthenticatedWorker {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let config = match req.app_data::<web::Data<Config>>() {
            Some(config) => config,
            None => {
                log::error!("AuthenticatedWorker extractor used without Config in app data.");
                return ready(Err(ErrorUnauthorized("Authentication is not configured.")));
            }
        };

        let header = match req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
        {
            Some(header) => header,
            None => return ready(Err(ErrorUnauthorized("Missing Authorization header."))),
        };

        let token = match header.strip_prefix("Bearer ") {
            Some(token) => token,
            None => {
                return ready(Err(ErrorUnauthorized(
                    "Invalid Authorization format. Expected: Bearer <token>",
                )))
            }
        };

        match validate_worker_token(token, &config.jwt_secret) {
            Ok(claims) => ready(Ok(AuthenticatedWorker {
                worker_id: claims.sub,
                name: claims.name,
            })),
            Err(_) => ready(Err(ErrorUnauthorized("Invalid or expired token."))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "an-adequately-long-test-signing-secret";

    #[test]
    fn issued_tokens_validate() {
        let worker_id = Uuid::new_v4();
        let token = issue_worker_token(worker_id, "Asha Rao", SECRET, 1).unwrap();

        let claims = validate_worker_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, worker_id);
        assert_eq!(claims.name, "Asha Rao");
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = issue_worker_token(Uuid::new_v4(), "Asha Rao", SECRET, 1).unwrap();
        assert!(validate_worker_token(&token, "a-different-but-also-long-secret!").is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = issue_worker_token(Uuid::new_v4(), "Asha Rao", SECRET, -2).unwrap();
        assert!(validate_worker_token(&token, SECRET).is_err());
    }
}
