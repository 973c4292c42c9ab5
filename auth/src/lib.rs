//! Authentication and authorization core for the user service.
//!
//! - Password hashing (Argon2id, tunable cost)
//! - Credential validation against a pluggable credential store
//! - JWT access token issuance and verification
//! - Route access policies (role requirements and self-access)
//!
//! The service owning user records implements [`CredentialStore`]; everything
//! else here is stateless apart from the signing key and hashing cost fixed at
//! startup.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Route Policies
//! ```
//! use auth::{authorize, IdentityClaims, RoutePolicy};
//!
//! let claims = IdentityClaims {
//!     sub: "u1".to_string(),
//!     email: "alice@example.com".to_string(),
//!     roles: vec!["user".to_string()],
//!     iss: "user-service".to_string(),
//!     iat: 0,
//!     exp: 3600,
//! };
//!
//! let policy = RoutePolicy::require_roles(["admin", "user"]).with_self_access("id");
//! assert!(authorize(&claims, &policy, Some("u1")));
//! assert!(!authorize(&claims, &policy, Some("u2")));
//! ```

pub mod authenticator;
pub mod clock;
pub mod guard;
pub mod identity;
pub mod issuer;
pub mod jwt;
pub mod password;
pub mod store;
pub mod validator;
pub mod verifier;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use authenticator::TokenSettings;
pub use clock::Clock;
pub use clock::FixedClock;
pub use clock::SystemClock;
pub use guard::authorize;
pub use guard::RoutePolicy;
pub use identity::CredentialRecord;
pub use identity::Identity;
pub use identity::ADMIN_ROLE;
pub use identity::DEFAULT_ROLE;
pub use issuer::AccessToken;
pub use issuer::TokenIssuer;
pub use jwt::IdentityClaims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::HashingCost;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use store::CredentialStore;
pub use store::StoreError;
pub use validator::CredentialValidator;
pub use verifier::extract_bearer_token;
pub use verifier::TokenVerifier;
