use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::identity::Identity;
use crate::identity::ADMIN_ROLE;
use crate::identity::DEFAULT_ROLE;

/// Claims carried by an access token.
///
/// Built once by the issuer before signing, or rebuilt by the verifier after
/// the signature checks out. Never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityClaims {
    /// Subject (user identifier)
    pub sub: String,

    /// Login email of the subject
    pub email: String,

    /// Roles granted to the subject
    #[serde(default)]
    pub roles: Vec<String>,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl IdentityClaims {
    /// Create claims for a validated identity.
    ///
    /// Falls back to the email as subject when the identity has no id, and to
    /// the default role when it carries no roles.
    ///
    /// # Arguments
    /// * `identity` - Identity produced by credential validation
    /// * `issuer` - Issuer tag stamped into the token
    /// * `issued_at` - Issuance instant
    /// * `ttl` - Lifetime of the token
    pub fn for_identity(
        identity: &Identity,
        issuer: impl ToString,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let sub = if identity.subject.is_empty() {
            identity.email.clone()
        } else {
            identity.subject.clone()
        };

        let roles = if identity.roles.is_empty() {
            vec![DEFAULT_ROLE.to_string()]
        } else {
            identity.roles.clone()
        };

        Self {
            sub,
            email: identity.email.clone(),
            roles,
            iss: issuer.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }

    /// Check whether the subject holds a role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    /// Check if token is expired.
    ///
    /// The token is no longer valid from the expiry second onwards.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp <= current_timestamp
    }

    /// Expiry as a timestamp, if representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}
