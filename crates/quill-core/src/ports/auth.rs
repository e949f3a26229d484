//! Authentication ports.

use uuid::Uuid;

/// Claims carried by a verified token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub exp: i64,
}

/// Token service trait - issues and verifies signed identity assertions.
pub trait TokenService: Send + Sync {
    /// Issue a token asserting the given user identity.
    fn generate_token(&self, user_id: Uuid) -> Result<String, AuthError>;

    /// Verify signature and expiry, returning the decoded claims.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password with a per-password salt.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Hashing error: {0}")]
    Hashing(String),
}
