use crate::models::{ImageCount, NewUser, User, UserDetail, UserProjectSummary};
use crate::repositories::{ImageRepository, ProjectRepository, RepositoryError, UserRepository};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Email is required")]
    MissingEmail,
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("User already exists")]
    EmailTaken,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    projects: Arc<dyn ProjectRepository>,
    images: Arc<dyn ImageRepository>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        projects: Arc<dyn ProjectRepository>,
        images: Arc<dyn ImageRepository>,
    ) -> Self {
        Self {
            users,
            projects,
            images,
        }
    }

    /// Password signup. The hash never leaves the service.
    pub async fn signup(&self, request: SignupRequest) -> Result<User, UserServiceError> {
        let (email, password) = match (non_empty(request.email), non_empty(request.password)) {
            (Some(email), Some(password)) => (email, password),
            _ => return Err(UserServiceError::MissingCredentials),
        };

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(UserServiceError::EmailTaken);
        }

        let password_hash = self.hash_password(&password)?;

        match self
            .users
            .create_user(NewUser {
                email,
                name: non_empty(request.name),
                password_hash: Some(password_hash),
            })
            .await
        {
            Ok(user) => Ok(user),
            Err(RepositoryError::AlreadyExists) => Err(UserServiceError::EmailTaken),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Returns the existing user for `email`, or creates one. The flag is
    /// `true` when a new user was created.
    pub async fn get_or_create(
        &self,
        email: Option<String>,
        name: Option<String>,
    ) -> Result<(User, bool), UserServiceError> {
        let email = non_empty(email).ok_or(UserServiceError::MissingEmail)?;

        if let Some(existing) = self.users.find_by_email(&email).await? {
            return Ok((existing, false));
        }

        let name = non_empty(name).or_else(|| email.split('@').next().map(str::to_string));

        match self
            .users
            .create_user(NewUser {
                email: email.clone(),
                name,
                password_hash: None,
            })
            .await
        {
            Ok(user) => Ok((user, true)),
            // Lost a race with a concurrent create
            Err(RepositoryError::AlreadyExists) => {
                let user = self
                    .users
                    .find_by_email(&email)
                    .await?
                    .ok_or(UserServiceError::UserNotFound)?;
                Ok((user, false))
            }
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.users.list_users().await?)
    }

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.users.find_by_id(id).await?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.users.find_by_email(email).await?)
    }

    pub async fn get_user_detail(&self, id: &str) -> Result<UserDetail, UserServiceError> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(UserServiceError::UserNotFound)?;

        let mut projects = Vec::new();
        for project in self.projects.list_by_user(&user.id).await? {
            let images = self.images.count_by_project(&project.id).await?;
            projects.push(UserProjectSummary {
                id: project.id,
                name: project.name,
                description: project.description,
                created_at: project.created_at,
                count: ImageCount { images },
            });
        }

        Ok(UserDetail {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
            projects,
        })
    }

    /// Applies a name change. `None` leaves the user untouched.
    pub async fn update_user(
        &self,
        id: &str,
        name: Option<Option<String>>,
    ) -> Result<User, UserServiceError> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(UserServiceError::UserNotFound)?;

        let Some(name) = name else {
            return Ok(user);
        };

        match self.users.update_name(id, name).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Deletes the user along with every project it owns and their images.
    pub async fn delete_user(&self, id: &str) -> Result<(), UserServiceError> {
        if self.users.find_by_id(id).await?.is_none() {
            return Err(UserServiceError::UserNotFound);
        }

        let project_ids: Vec<String> = self
            .projects
            .list_by_user(id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        let images = self.images.delete_by_projects(project_ids).await?;
        let projects = self.projects.delete_by_user(id).await?;
        tracing::debug!(
            "Deleting user {} with {} projects and {} images",
            id,
            projects,
            images
        );

        match self.users.delete_user(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    fn hash_password(&self, password: &str) -> Result<String, UserServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserServiceError::HashingError(e.to_string()))
    }
}
