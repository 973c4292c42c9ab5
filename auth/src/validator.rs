use std::sync::Arc;

use crate::authenticator::AuthenticationError;
use crate::identity::Identity;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::store::CredentialStore;

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-identifiers";

/// Checks a presented identifier/secret pair against the credential store.
///
/// This is the only component that ever asks the store for a password hash.
pub struct CredentialValidator {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<PasswordHasher>,
    decoy_hash: String,
}

impl CredentialValidator {
    /// Create a validator over a credential store.
    ///
    /// Precomputes a decoy hash with the same cost so that unknown identifiers
    /// take as long to reject as wrong passwords.
    ///
    /// # Errors
    /// * `PasswordError` - Decoy hash could not be computed
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<PasswordHasher>,
    ) -> Result<Self, PasswordError> {
        let decoy_hash = hasher.hash(DECOY_PASSWORD)?;

        Ok(Self {
            store,
            hasher,
            decoy_hash,
        })
    }

    /// Validate credentials and return the matching identity.
    ///
    /// # Arguments
    /// * `identifier` - Login identifier (email)
    /// * `secret` - Plaintext password
    ///
    /// # Returns
    /// Identity of the record, without its password hash
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown identifier or wrong password
    /// * `CredentialStore` - Store lookup failed or returned no hash
    /// * `Password` - Stored hash is malformed or unsupported
    pub async fn validate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Identity, AuthenticationError> {
        let record = self
            .store
            .find_by_identifier(identifier, true)
            .await
            .map_err(|e| {
                tracing::error!(identifier, error = %e, "Credential lookup failed");
                AuthenticationError::from(e)
            })?;

        let Some(record) = record else {
            // Outcome is ignored; only the elapsed time matters.
            let _ = self.verify_off_thread(secret, self.decoy_hash.clone()).await;
            tracing::warn!(
                identifier,
                outcome = "unknown_identifier",
                "Credential validation failed"
            );
            return Err(AuthenticationError::InvalidCredentials);
        };

        let Some(stored_hash) = record.password_hash.clone() else {
            tracing::error!(
                identifier,
                "Credential store returned a record without password hash"
            );
            return Err(AuthenticationError::CredentialStore(
                crate::store::StoreError("password hash was not returned".to_string()),
            ));
        };

        let matches = self
            .verify_off_thread(secret, stored_hash)
            .await
            .map_err(|e| {
                tracing::error!(identifier, error = %e, "Stored password hash is unusable");
                e
            })?;

        if !matches {
            tracing::warn!(
                identifier,
                outcome = "wrong_secret",
                "Credential validation failed"
            );
            return Err(AuthenticationError::InvalidCredentials);
        }

        tracing::info!(
            identifier,
            subject = %record.subject,
            outcome = "success",
            "Credential validation succeeded"
        );

        Ok(record.into_identity())
    }

    /// Run the hash comparison on the blocking pool.
    ///
    /// Once spawned the comparison runs to completion even if the caller is dropped.
    async fn verify_off_thread(
        &self,
        secret: &str,
        hash: String,
    ) -> Result<bool, AuthenticationError> {
        let hasher = Arc::clone(&self.hasher);
        let secret = secret.to_owned();

        tokio::task::spawn_blocking(move || hasher.verify(&secret, &hash))
            .await
            .map_err(|e| PasswordError::VerificationFailed(e.to_string()))?
            .map_err(AuthenticationError::from)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use mockall::mock;

    use super::*;
    use crate::identity::CredentialRecord;
    use crate::password::HashingCost;
    use crate::store::StoreError;

    mock! {
        pub TestCredentialStore {}

        #[async_trait]
        impl CredentialStore for TestCredentialStore {
            async fn find_by_identifier(
                &self,
                identifier: &str,
                include_secret_hash: bool,
            ) -> Result<Option<CredentialRecord>, StoreError>;
        }
    }

    fn cheap_hasher() -> Arc<PasswordHasher> {
        Arc::new(
            PasswordHasher::with_cost(HashingCost {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            })
            .unwrap(),
        )
    }

    fn record_with_password(hasher: &PasswordHasher, password: &str) -> CredentialRecord {
        CredentialRecord {
            subject: "user123".to_string(),
            identifier: "alice@example.com".to_string(),
            roles: vec!["user".to_string()],
            password_hash: Some(hasher.hash(password).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_validate_success_strips_hash() {
        let hasher = cheap_hasher();
        let record = record_with_password(&hasher, "password123");

        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_identifier()
            .withf(|identifier, include_secret_hash| {
                identifier == "alice@example.com" && *include_secret_hash
            })
            .times(1)
            .returning(move |_, _| Ok(Some(record.clone())));

        let validator = CredentialValidator::new(Arc::new(store), hasher).unwrap();

        let identity = validator
            .validate("alice@example.com", "password123")
            .await
            .expect("Validation failed");

        assert_eq!(
            identity,
            Identity {
                subject: "user123".to_string(),
                email: "alice@example.com".to_string(),
                roles: vec!["user".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_identifier_and_wrong_secret_are_indistinguishable() {
        let hasher = cheap_hasher();
        let record = record_with_password(&hasher, "password123");

        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_identifier()
            .returning(move |identifier, _| {
                if identifier == "alice@example.com" {
                    Ok(Some(record.clone()))
                } else {
                    Ok(None)
                }
            });

        let validator = CredentialValidator::new(Arc::new(store), hasher).unwrap();

        let unknown = validator
            .validate("nobody@example.com", "password123")
            .await
            .unwrap_err();
        let wrong_secret = validator
            .validate("alice@example.com", "wrong_password")
            .await
            .unwrap_err();

        assert_eq!(unknown, AuthenticationError::InvalidCredentials);
        assert_eq!(wrong_secret, AuthenticationError::InvalidCredentials);
        assert_eq!(unknown.to_string(), wrong_secret.to_string());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_invalid_credentials() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_identifier()
            .times(1)
            .returning(|_, _| Err(StoreError("connection refused".to_string())));

        let validator = CredentialValidator::new(Arc::new(store), cheap_hasher()).unwrap();

        let result = validator.validate("alice@example.com", "password123").await;
        assert!(matches!(
            result,
            Err(AuthenticationError::CredentialStore(_))
        ));
    }

    #[tokio::test]
    async fn test_record_without_hash_is_a_store_fault() {
        let mut store = MockTestCredentialStore::new();
        store.expect_find_by_identifier().returning(|_, _| {
            Ok(Some(CredentialRecord {
                subject: "user123".to_string(),
                identifier: "alice@example.com".to_string(),
                roles: vec![],
                password_hash: None,
            }))
        });

        let validator = CredentialValidator::new(Arc::new(store), cheap_hasher()).unwrap();

        let result = validator.validate("alice@example.com", "password123").await;
        assert!(matches!(
            result,
            Err(AuthenticationError::CredentialStore(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_stored_hash_is_a_password_error() {
        let mut store = MockTestCredentialStore::new();
        store.expect_find_by_identifier().returning(|_, _| {
            Ok(Some(CredentialRecord {
                subject: "user123".to_string(),
                identifier: "alice@example.com".to_string(),
                roles: vec![],
                password_hash: Some("not-a-phc-string".to_string()),
            }))
        });

        let validator = CredentialValidator::new(Arc::new(store), cheap_hasher()).unwrap();

        let result = validator.validate("alice@example.com", "password123").await;
        assert!(matches!(result, Err(AuthenticationError::Password(_))));
    }
}
