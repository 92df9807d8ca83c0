use jiff::Timestamp;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vigil_core::enums::Role;
use vigil_core::models::user::User;

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Claims carried by every token this service issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

/// HS256 signing and verification keys derived from one shared secret.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self::with_expiry_check(secret, true)
    }

    /// `validate_exp = false` accepts expired tokens (testing profile only).
    pub fn with_expiry_check(secret: &str, validate_exp: bool) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = validate_exp;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user: &User, kind: TokenKind, ttl_secs: i64) -> Result<String, AuthError> {
        self.issue_at(user, kind, ttl_secs, Timestamp::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        user: &User,
        kind: TokenKind,
        ttl_secs: i64,
        now: Timestamp,
    ) -> Result<String, AuthError> {
        let iat = now.as_second();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            kind,
            iat,
            exp: iat.saturating_add(ttl_secs),
            jti: Uuid::new_v4(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;
        if data.claims.kind != expected {
            return Err(AuthError::WrongTokenKind {
                expected: expected.as_str(),
                found: data.claims.kind.as_str(),
            });
        }
        Ok(data.claims)
    }
}
