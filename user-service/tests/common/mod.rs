use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::Authenticator;
use auth::CredentialRecord;
use auth::CredentialStore;
use auth::HashingCost;
use auth::JwtHandler;
use auth::PasswordHasher;
use auth::StoreError;
use auth::TokenSettings;
use chrono::Utc;
use serde_json::json;
use user_service::domain::user::models::EmailAddress;
use user_service::domain::user::models::PersonName;
use user_service::domain::user::models::User;
use user_service::domain::user::models::UserId;
use user_service::domain::user::ports::UserRepository;
use user_service::domain::user::service::UserService;
use user_service::inbound::http::router::create_router;
use user_service::user::errors::UserError;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const JWT_ISSUER: &str = "user-service-test";

/// In-memory stand-in for the Postgres repository.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, (User, String)>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User, password_hash: String) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|(u, _)| u.email == user.email) {
            return Err(UserError::EmailAlreadyExists(user.email.to_string()));
        }
        users.insert(user.id, (user.clone(), password_hash));
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.users.lock().unwrap().get(id).map(|(u, _)| u.clone()))
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .map(|(u, _)| u.clone())
            .collect())
    }

    async fn update(&self, user: User, password_hash: Option<String>) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        let entry = users
            .get_mut(&user.id)
            .ok_or_else(|| UserError::NotFound(user.id.to_string()))?;
        entry.0 = user.clone();
        if let Some(hash) = password_hash {
            entry.1 = hash;
        }
        Ok(user)
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserError> {
        self.users
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl CredentialStore for InMemoryUserRepository {
    async fn find_by_identifier(
        &self,
        identifier: &str,
        include_secret_hash: bool,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|(u, _)| u.email.as_str() == identifier)
            .map(|(u, hash)| CredentialRecord {
                subject: u.id.to_string(),
                identifier: u.email.to_string(),
                roles: u.roles.clone(),
                password_hash: include_secret_hash.then(|| hash.clone()),
            }))
    }
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub repository: Arc<InMemoryUserRepository>,
    pub password_hasher: Arc<PasswordHasher>,
    pub api_client: reqwest::Client,
    pub jwt_handler: JwtHandler,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let repository = Arc::new(InMemoryUserRepository::default());
        let password_hasher = Arc::new(
            PasswordHasher::with_cost(HashingCost {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            })
            .expect("Failed to build password hasher"),
        );

        let authenticator = Arc::new(
            Authenticator::new(
                repository.clone(),
                Arc::clone(&password_hasher),
                TokenSettings {
                    secret: JWT_SECRET.to_vec(),
                    issuer: JWT_ISSUER.to_string(),
                    ttl: chrono::Duration::hours(1),
                },
            )
            .expect("Failed to build authenticator"),
        );

        let user_service = Arc::new(UserService::new(
            Arc::clone(&repository),
            Arc::clone(&password_hasher),
        ));

        let router = create_router(user_service, authenticator);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            repository,
            password_hasher,
            api_client: reqwest::Client::new(),
            jwt_handler: JwtHandler::new(JWT_SECRET),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .put(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Register a user through the API and return its id
    pub async fn register(&self, email: &str, password: &str) -> String {
        let response = self
            .post("/api/users/register")
            .json(&json!({
                "email": email,
                "password": password,
                "first_name": "Test",
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Insert an admin directly into the repository and return its id
    pub async fn seed_admin(&self, email: &str, password: &str) -> String {
        let user = User {
            id: UserId::new(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            first_name: PersonName::new("Admin".to_string()).unwrap(),
            last_name: None,
            roles: vec![auth::ADMIN_ROLE.to_string()],
            created_at: Utc::now(),
        };
        let hash = self.password_hasher.hash(password).unwrap();

        self.repository
            .create(user, hash)
            .await
            .expect("Failed to seed admin")
            .id
            .to_string()
    }

    /// Log in and return the access token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["accessToken"].as_str().unwrap().to_string()
    }
}
