use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(expiry_hours as i64),
        })
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(user_id, email, Utc::now())
    }

    fn issue_at(&self, user_id: Uuid, email: &str, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires_at = now + self.expiry;
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))?;
        let expires_at = Utc.timestamp_opt(claims.exp, 0).single().unwrap_or(expires_at);
        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(TokenIssuer::new("", 24), Err(AuthError::InvalidSecret)));
    }

    #[test]
    fn issued_tokens_verify() {
        let issuer = TokenIssuer::new("test-secret", 24).unwrap();
        let id = Uuid::new_v4();
        let issued = issuer.issue(id, "editor@kmci.org").unwrap();
        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "editor@kmci.org");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn expired_and_foreign_tokens_fail() {
        let issuer = TokenIssuer::new("test-secret", 1).unwrap();
        let stale = issuer
            .issue_at(Uuid::new_v4(), "a@kmci.org", Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(matches!(issuer.verify(&stale.token), Err(AuthError::InvalidToken)));

        let other = TokenIssuer::new("other-secret", 1).unwrap();
        let foreign = other.issue(Uuid::new_v4(), "a@kmci.org").unwrap();
        assert!(matches!(issuer.verify(&foreign.token), Err(AuthError::InvalidToken)));
        assert!(matches!(issuer.verify("not.a.jwt"), Err(AuthError::InvalidToken)));
    }
}
