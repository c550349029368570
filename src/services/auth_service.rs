use crate::models::User;
use crate::repositories::{RepositoryError, UserRepository};
use argon2::{password_hash::PasswordHash, Argon2, PasswordVerifier};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    pub async fn authenticate(&self, request: LoginRequest) -> Result<User, AuthServiceError> {
        let (email, password) = match (request.email, request.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                (email, password)
            }
            _ => return Err(AuthServiceError::MissingCredentials),
        };

        // Find user by email
        let user = self
            .user_repository
            .find_by_email(&email)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        // Users created through one-time codes have no password
        let Some(password_hash) = user.password_hash.as_deref() else {
            return Err(AuthServiceError::InvalidCredentials);
        };

        if !self.verify_password(&password, password_hash) {
            return Err(AuthServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<User, AuthServiceError> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)
    }

    fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        if let Ok(parsed_hash) = PasswordHash::new(password_hash) {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::user_repository::MockUserRepository;
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        PasswordHasher,
    };
    use chrono::Utc;
    use mockall::predicate::*;

    fn user_with_hash(password_hash: Option<String>) -> User {
        User {
            id: "u1".to_string(),
            email: "test@example.com".to_string(),
            name: None,
            password_hash,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn login(password: &str) -> LoginRequest {
        LoginRequest {
            email: Some("test@example.com".to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_authenticate_invalid_email() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_email()
            .with(eq("test@example.com"))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(None) }));

        let service = AuthService::new(Arc::new(mock_repo));

        let result = service.authenticate(login("password123")).await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_checks_hash() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"password123", &salt)
            .unwrap()
            .to_string();

        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_find_by_email().returning(move |_| {
            let user = user_with_hash(Some(hash.clone()));
            Box::pin(async move { Ok(Some(user)) })
        });

        let service = AuthService::new(Arc::new(mock_repo));

        assert!(service.authenticate(login("password123")).await.is_ok());
        assert!(matches!(
            service.authenticate(login("wrong")).await,
            Err(AuthServiceError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_authenticate_passwordless_user() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_find_by_email().returning(|_| {
            let user = user_with_hash(None);
            Box::pin(async move { Ok(Some(user)) })
        });

        let service = AuthService::new(Arc::new(mock_repo));

        let result = service.authenticate(login("anything")).await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_missing_fields() {
        let service = AuthService::new(Arc::new(MockUserRepository::new()));

        let result = service
            .authenticate(LoginRequest {
                email: Some("test@example.com".to_string()),
                password: None,
            })
            .await;
        assert!(matches!(result, Err(AuthServiceError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_get_user_by_id_not_found() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_id()
            .with(eq("u1"))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(None) }));

        let service = AuthService::new(Arc::new(mock_repo));

        let result = service.get_user_by_id("u1").await;
        assert!(matches!(result, Err(AuthServiceError::UserNotFound)));
    }
}
