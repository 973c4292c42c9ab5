use thiserror::Error;

/// Error type for password operations.
///
/// A password that simply does not match is not an error; these variants
/// describe failures of the hashing machinery itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Password verification failed: {0}")]
    VerificationFailed(String),

    #[error("Invalid hashing cost: {0}")]
    InvalidCost(String),
}
