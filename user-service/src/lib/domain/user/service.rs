use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::Password;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
/// Shares its password hasher with the authenticator so stored hashes and
/// login verification agree on the work factor.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    password_hasher: Arc<auth::PasswordHasher>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `password_hasher` - Hasher configured with the service work factor
    ///
    /// # Returns
    /// Configured user service instance
    pub fn new(repository: Arc<UR>, password_hasher: Arc<auth::PasswordHasher>) -> Self {
        Self {
            repository,
            password_hasher,
        }
    }

    async fn hash_password(&self, password: Password) -> Result<String, UserError> {
        let hasher = Arc::clone(&self.password_hasher);

        tokio::task::spawn_blocking(move || hasher.hash(password.expose()))
            .await
            .map_err(|e| UserError::PasswordHashing(e.to_string()))?
            .map_err(UserError::from)
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError> {
        let password_hash = self.hash_password(command.password).await?;

        let user = User {
            id: UserId::new(),
            email: command.email,
            first_name: command.first_name,
            last_name: command.last_name,
            roles: vec![auth::DEFAULT_ROLE.to_string()],
            created_at: Utc::now(),
        };

        let created_user = self.repository.create(user, password_hash).await?;
        tracing::info!(user_id = %created_user.id, "User registered");

        Ok(created_user)
    }

    async fn list_users(&self) -> Result<Vec<User>, UserError> {
        self.repository.list_all().await
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }

    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<User, UserError> {
        let mut user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))?;

        if let Some(first_name) = command.first_name {
            user.first_name = first_name;
        }

        if let Some(last_name) = command.last_name {
            user.last_name = Some(last_name);
        }

        let password_hash = match command.password {
            Some(password) => Some(self.hash_password(password).await?),
            None => None,
        };

        self.repository.update(user, password_hash).await
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), UserError> {
        self.repository.delete(id).await?;
        tracing::info!(user_id = %id, "User deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use auth::HashingCost;
    use auth::PasswordHasher;
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::PersonName;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User, password_hash: String) -> Result<User, UserError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;
            async fn list_all(&self) -> Result<Vec<User>, UserError>;
            async fn update(&self, user: User, password_hash: Option<String>) -> Result<User, UserError>;
            async fn delete(&self, id: &UserId) -> Result<(), UserError>;
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

    fn sample_user(id: UserId) -> User {
        User {
            id,
            email: EmailAddress::new("test@example.com".to_string()).unwrap(),
            first_name: PersonName::new("Ada".to_string()).unwrap(),
            last_name: None,
            roles: vec!["user".to_string()],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_create()
            .withf(|user, password_hash| {
                user.email.as_str() == "test@example.com"
                    && user.roles == vec!["user".to_string()]
                    && password_hash.starts_with("$argon2id$")
            })
            .times(1)
            .returning(|user, _| Ok(user));

        let hasher = cheap_hasher();
        let service = UserService::new(Arc::new(repository), hasher);

        let command = CreateUserCommand::new(
            EmailAddress::new("test@example.com".to_string()).unwrap(),
            Password::new("password123".to_string()).unwrap(),
            PersonName::new("Ada".to_string()).unwrap(),
            Some(PersonName::new("Lovelace".to_string()).unwrap()),
        );

        let user = service.create_user(command).await.unwrap();
        assert_eq!(user.email.as_str(), "test@example.com");
        assert_eq!(user.first_name.as_str(), "Ada");
        assert_eq!(user.last_name.unwrap().as_str(), "Lovelace");
    }

    #[tokio::test]
    async fn test_created_hash_verifies_with_shared_hasher() {
        let mut repository = MockTestUserRepository::new();
        let hasher = cheap_hasher();
        let verifying_hasher = Arc::clone(&hasher);

        repository
            .expect_create()
            .withf(move |_, password_hash| {
                verifying_hasher
                    .verify("password123", password_hash)
                    .unwrap()
            })
            .times(1)
            .returning(|user, _| Ok(user));

        let service = UserService::new(Arc::new(repository), hasher);
        let command = CreateUserCommand::new(
            EmailAddress::new("test@example.com".to_string()).unwrap(),
            Password::new("password123".to_string()).unwrap(),
            PersonName::new("Ada".to_string()).unwrap(),
            None,
        );

        assert!(service.create_user(command).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let mut repository = MockTestUserRepository::new();

        repository.expect_create().times(1).returning(|user, _| {
            Err(UserError::EmailAlreadyExists(
                user.email.as_str().to_string(),
            ))
        });

        let service = UserService::new(Arc::new(repository), cheap_hasher());

        let command = CreateUserCommand::new(
            EmailAddress::new("test@example.com".to_string()).unwrap(),
            Password::new("password456".to_string()).unwrap(),
            PersonName::new("Ada".to_string()).unwrap(),
            None,
        );

        let result = service.create_user(command).await;
        assert!(matches!(
            result.unwrap_err(),
            UserError::EmailAlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn test_list_users() {
        let mut repository = MockTestUserRepository::new();

        let users = vec![sample_user(UserId::new()), sample_user(UserId::new())];
        let returned_users = users.clone();
        repository
            .expect_list_all()
            .times(1)
            .returning(move || Ok(returned_users.clone()));

        let service = UserService::new(Arc::new(repository), cheap_hasher());

        assert_eq!(service.list_users().await.unwrap(), users);
    }

    #[tokio::test]
    async fn test_get_user_success() {
        let mut repository = MockTestUserRepository::new();

        let user_id = UserId::new();
        let returned_user = sample_user(user_id);
        repository
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(returned_user.clone())));

        let service = UserService::new(Arc::new(repository), cheap_hasher());

        let user = service.get_user(&user_id).await.unwrap();
        assert_eq!(user.id, user_id);
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = UserService::new(Arc::new(repository), cheap_hasher());

        let result = service.get_user(&UserId::new()).await;
        assert!(matches!(result.unwrap_err(), UserError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_user_names_keeps_password() {
        let mut repository = MockTestUserRepository::new();

        let user_id = UserId::new();
        let returned_user = sample_user(user_id);
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(returned_user.clone())));

        repository
            .expect_update()
            .withf(|user, password_hash| {
                user.first_name.as_str() == "Grace"
                    && user.last_name.as_ref().map(|n| n.as_str()) == Some("Hopper")
                    && password_hash.is_none()
            })
            .times(1)
            .returning(|user, _| Ok(user));

        let service = UserService::new(Arc::new(repository), cheap_hasher());

        let command = UpdateUserCommand {
            password: None,
            first_name: Some(PersonName::new("Grace".to_string()).unwrap()),
            last_name: Some(PersonName::new("Hopper".to_string()).unwrap()),
        };

        let updated = service.update_user(&user_id, command).await.unwrap();
        assert_eq!(updated.first_name.as_str(), "Grace");
        assert_eq!(updated.email.as_str(), "test@example.com");
    }

    #[tokio::test]
    async fn test_update_user_password_is_rehashed() {
        let mut repository = MockTestUserRepository::new();

        let user_id = UserId::new();
        let returned_user = sample_user(user_id);
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(returned_user.clone())));

        repository
            .expect_update()
            .withf(|_, password_hash| {
                password_hash
                    .as_deref()
                    .is_some_and(|hash| hash.starts_with("$argon2id$"))
            })
            .times(1)
            .returning(|user, _| Ok(user));

        let service = UserService::new(Arc::new(repository), cheap_hasher());

        let command = UpdateUserCommand {
            password: Some(Password::new("newpassword".to_string()).unwrap()),
            first_name: None,
            last_name: None,
        };

        assert!(service.update_user(&user_id, command).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));
        repository.expect_update().times(0);

        let service = UserService::new(Arc::new(repository), cheap_hasher());

        let command = UpdateUserCommand {
            password: None,
            first_name: Some(PersonName::new("Grace".to_string()).unwrap()),
            last_name: None,
        };

        let result = service.update_user(&UserId::new(), command).await;
        assert!(matches!(result.unwrap_err(), UserError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_user_success() {
        let mut repository = MockTestUserRepository::new();

        let user_id = UserId::new();
        repository
            .expect_delete()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(|_| Ok(()));

        let service = UserService::new(Arc::new(repository), cheap_hasher());

        assert!(service.delete_user(&user_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        let user_id = UserId::new();
        repository
            .expect_delete()
            .times(1)
            .returning(move |_| Err(UserError::NotFound(user_id.to_string())));

        let service = UserService::new(Arc::new(repository), cheap_hasher());

        let result = service.delete_user(&user_id).await;
        assert!(matches!(result.unwrap_err(), UserError::NotFound(_)));
    }
}
