use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::authenticator::AuthenticationError;
use crate::clock::Clock;
use crate::identity::Identity;
use crate::jwt::IdentityClaims;
use crate::jwt::JwtHandler;

/// Signed bearer token handed out after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// JWT access token
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Builds and signs access tokens for validated identities.
pub struct TokenIssuer {
    jwt_handler: Arc<JwtHandler>,
    issuer: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(
        jwt_handler: Arc<JwtHandler>,
        issuer: impl Into<String>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            jwt_handler,
            issuer: issuer.into(),
            ttl,
            clock,
        }
    }

    /// Issue a signed token for an identity.
    ///
    /// # Arguments
    /// * `identity` - Identity returned by credential validation
    ///
    /// # Returns
    /// AccessToken with the signed JWT and its expiry
    ///
    /// # Errors
    /// * `TokenIssuanceFailed` - Signing failed (server-side misconfiguration)
    pub fn issue(&self, identity: &Identity) -> Result<AccessToken, AuthenticationError> {
        let now = self.clock.now();
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            tracing::error!(
                ttl_seconds = self.ttl.num_seconds(),
                incident = "token_issuance",
                "Token lifetime overflows the expiry timestamp"
            );
            AuthenticationError::TokenIssuanceFailed("token lifetime out of range".to_string())
        })?;
        let claims = IdentityClaims::for_identity(identity, &self.issuer, now, self.ttl);

        let access_token = self.jwt_handler.encode(&claims).map_err(|e| {
            tracing::error!(
                subject = %claims.sub,
                error = %e,
                incident = "token_issuance",
                "Failed to sign access token"
            );
            AuthenticationError::TokenIssuanceFailed(e.to_string())
        })?;

        tracing::debug!(subject = %claims.sub, exp = claims.exp, "Access token issued");

        Ok(AccessToken {
            access_token,
            expires_at,
        })
    }
}
