use std::fmt;

/// Role granting access to every user resource.
pub const ADMIN_ROLE: &str = "admin";

/// Role assigned when an identity carries none.
pub const DEFAULT_ROLE: &str = "user";

/// Stored login record as returned by a [`CredentialStore`](crate::store::CredentialStore).
///
/// `password_hash` is only populated when the lookup explicitly asked for it.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub subject: String,
    pub identifier: String,
    pub roles: Vec<String>,
    pub password_hash: Option<String>,
}

impl CredentialRecord {
    /// Project the record into an [`Identity`], dropping the password hash.
    pub fn into_identity(self) -> Identity {
        Identity {
            subject: self.subject,
            email: self.identifier,
            roles: self.roles,
        }
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("subject", &self.subject)
            .field("identifier", &self.identifier)
            .field("roles", &self.roles)
            .field(
                "password_hash",
                &self.password_hash.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Verified caller identity, free of any secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub email: String,
    pub roles: Vec<String>,
}
