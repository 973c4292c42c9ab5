use std::sync::Arc;

use serde::Deserialize;

use crate::authenticator::AuthenticationError;
use crate::clock::Clock;
use crate::jwt::IdentityClaims;
use crate::jwt::JwtHandler;

const BEARER_SCHEME: &str = "bearer";

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively and may be followed by any run
/// of whitespace.
///
/// # Errors
/// * `MissingToken` - Header is absent, uses another scheme, or carries no token
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthenticationError> {
    header
        .map(str::trim_start)
        .and_then(|value| value.split_once(char::is_whitespace))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case(BEARER_SCHEME))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or(AuthenticationError::MissingToken)
}

#[derive(Deserialize)]
struct UnverifiedSubject {
    sub: Option<String>,
}

/// Verifies presented access tokens and rebuilds the caller's claims.
///
/// Verification never consults the credential store: role changes made after
/// issuance only take effect once the token expires.
pub struct TokenVerifier {
    jwt_handler: Arc<JwtHandler>,
    issuer: String,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    pub fn new(jwt_handler: Arc<JwtHandler>, issuer: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            jwt_handler,
            issuer: issuer.into(),
            clock,
        }
    }

    /// Verify a token's signature and expiry.
    ///
    /// # Arguments
    /// * `token` - Raw JWT string
    ///
    /// # Returns
    /// Claims carried by the token
    ///
    /// # Errors
    /// * `InvalidToken` - Signature, issuer or structure is wrong
    /// * `ExpiredToken` - Expiry is before the current time
    pub fn verify(&self, token: &str) -> Result<IdentityClaims, AuthenticationError> {
        let claims: IdentityClaims =
            self.jwt_handler
                .decode(token, &self.issuer)
                .map_err(|e| {
                    let claimed_subject = self
                        .jwt_handler
                        .decode_unverified::<UnverifiedSubject>(token)
                        .ok()
                        .and_then(|unverified| unverified.sub);
                    tracing::warn!(
                        reason = %e,
                        claimed_subject = ?claimed_subject,
                        "Access token rejected"
                    );
                    AuthenticationError::InvalidToken(e.to_string())
                })?;

        let now = self.clock.now().timestamp();
        if claims.is_expired(now) {
            tracing::warn!(
                subject = %claims.sub,
                exp = claims.exp,
                now,
                "Access token expired"
            );
            return Err(AuthenticationError::ExpiredToken);
        }

        Ok(claims)
    }

    /// Verify the token carried by an authorization header value.
    ///
    /// # Errors
    /// * `MissingToken` - No bearer token present
    /// * `InvalidToken` / `ExpiredToken` - See [`TokenVerifier::verify`]
    pub fn verify_bearer(&self, header: Option<&str>) -> Result<IdentityClaims, AuthenticationError> {
        let token = extract_bearer_token(header)?;
        self.verify(token)
    }
}
