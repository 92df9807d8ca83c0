use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("expected {expected} token, got {found}")]
    WrongTokenKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("malformed password hash")]
    MalformedHash,

    #[error("hash iterations must be positive")]
    InvalidIterations,

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}
