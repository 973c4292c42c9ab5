use std::sync::Arc;

use chrono::Duration;

use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::guard;
use crate::guard::RoutePolicy;
use crate::issuer::AccessToken;
use crate::issuer::TokenIssuer;
use crate::jwt::IdentityClaims;
use crate::jwt::JwtHandler;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::store::CredentialStore;
use crate::store::StoreError;
use crate::validator::CredentialValidator;
use crate::verifier::TokenVerifier;

/// Authentication coordinator combining credential validation, token
/// issuance, token verification and route authorization.
pub struct Authenticator {
    validator: CredentialValidator,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
}

/// Token signing configuration, fixed at startup.
#[derive(Clone)]
pub struct TokenSettings {
    /// Secret key for HS256 signing
    pub secret: Vec<u8>,
    /// Issuer tag stamped into and required from every token
    pub issuer: String,
    /// Token lifetime
    pub ttl: Duration,
}

/// Authentication operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Token issuance failed: {0}")]
    TokenIssuanceFailed(String),

    #[error("Access forbidden")]
    Forbidden,

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error(transparent)]
    CredentialStore(#[from] StoreError),
}

impl AuthenticationError {
    /// Errors caused by the caller's missing or bad credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthenticationError::InvalidCredentials
                | AuthenticationError::MissingToken
                | AuthenticationError::InvalidToken(_)
                | AuthenticationError::ExpiredToken
        )
    }

    /// Errors caused by the server rather than the caller.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            AuthenticationError::TokenIssuanceFailed(_)
                | AuthenticationError::Password(_)
                | AuthenticationError::CredentialStore(_)
        )
    }
}

impl Authenticator {
    /// Create a new authenticator reading time from the system clock.
    ///
    /// # Arguments
    /// * `store` - Credential lookup port
    /// * `password_hasher` - Hasher shared with the service that stores passwords
    /// * `settings` - Signing key, issuer and token lifetime
    ///
    /// # Errors
    /// * `Password` - Hasher could not produce the decoy hash
    pub fn new(
        store: Arc<dyn CredentialStore>,
        password_hasher: Arc<PasswordHasher>,
        settings: TokenSettings,
    ) -> Result<Self, AuthenticationError> {
        Self::with_clock(store, password_hasher, settings, Arc::new(SystemClock))
    }

    /// Create a new authenticator with an explicit clock.
    pub fn with_clock(
        store: Arc<dyn CredentialStore>,
        password_hasher: Arc<PasswordHasher>,
        settings: TokenSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthenticationError> {
        let jwt_handler = Arc::new(JwtHandler::new(&settings.secret));

        Ok(Self {
            validator: CredentialValidator::new(store, password_hasher)?,
            issuer: TokenIssuer::new(
                Arc::clone(&jwt_handler),
                settings.issuer.clone(),
                settings.ttl,
                Arc::clone(&clock),
            ),
            verifier: TokenVerifier::new(jwt_handler, settings.issuer, clock),
        })
    }

    /// Verify credentials and generate an access token.
    ///
    /// # Arguments
    /// * `identifier` - Login identifier (email)
    /// * `password` - Plaintext password to verify
    ///
    /// # Returns
    /// AccessToken for the matching identity
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown identifier or wrong password
    /// * `TokenIssuanceFailed` - Token generation failed
    /// * `Password` / `CredentialStore` - Server-side failure during validation
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<AccessToken, AuthenticationError> {
        let identity = self.validator.validate(identifier, password).await?;
        self.issuer.issue(&identity)
    }

    /// Validate a raw token.
    pub fn validate_token(&self, token: &str) -> Result<IdentityClaims, AuthenticationError> {
        self.verifier.verify(token)
    }

    /// Validate the token carried by an `Authorization` header value.
    ///
    /// # Errors
    /// * `MissingToken` - No bearer token present
    /// * `InvalidToken` - Signature or structure is wrong
    /// * `ExpiredToken` - Token is past its expiry
    pub fn validate_bearer(
        &self,
        authorization: Option<&str>,
    ) -> Result<IdentityClaims, AuthenticationError> {
        self.verifier.verify_bearer(authorization)
    }

    /// Apply a route policy to verified claims.
    ///
    /// # Errors
    /// * `Forbidden` - Policy denies the caller
    pub fn authorize(
        &self,
        claims: &IdentityClaims,
        policy: &RoutePolicy,
        path_subject: Option<&str>,
    ) -> Result<(), AuthenticationError> {
        if guard::authorize(claims, policy, path_subject) {
            Ok(())
        } else {
            Err(AuthenticationError::Forbidden)
        }
    }
}
