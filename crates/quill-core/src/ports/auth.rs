//! Authentication and authorization ports.

/// Role granted to the blog administrator.
pub const ADMIN_ROLE: &str = "admin";

/// Claims carried by an access token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub subject: String,
    pub email: String,
    pub roles: Vec<String>,
    pub exp: i64,
}

/// Token service trait for issuing and checking bearer tokens.
pub trait TokenService: Send + Sync {
    fn generate_token(
        &self,
        subject: &str,
        email: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError>;

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of issued tokens.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a PHC-formatted hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Hashing error: {0}")]
    HashingError(String),
}
