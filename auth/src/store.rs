use async_trait::async_trait;
use thiserror::Error;

use crate::identity::CredentialRecord;

/// Failure of the backing credential store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Credential store error: {0}")]
pub struct StoreError(pub String);

/// Lookup port for stored credentials, implemented by the service owning user records.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Find a credential record by its identifying attribute.
    ///
    /// # Arguments
    /// * `identifier` - Unique login identifier (email)
    /// * `include_secret_hash` - Populate `password_hash`; ordinary reads pass `false`
    ///
    /// # Returns
    /// Optional record (None if no record matches)
    ///
    /// # Errors
    /// * `StoreError` - Backing store failed
    async fn find_by_identifier(
        &self,
        identifier: &str,
        include_secret_hash: bool,
    ) -> Result<Option<CredentialRecord>, StoreError>;
}
