use crate::models::{
    CreateProjectRequest, ImageSummary, NewProject, NewUser, Project, ProjectChanges,
    ProjectListing, ProjectWithImages, UpdateProjectRequest, User,
};
use crate::repositories::{ImageRepository, ProjectRepository, RepositoryError, UserRepository};
use std::sync::Arc;

/// Owner assigned when a project is created before any user exists.
pub const DEFAULT_OWNER_EMAIL: &str = "test@example.com";
pub const DEFAULT_OWNER_NAME: &str = "Test User";

#[derive(Debug, thiserror::Error)]
pub enum ProjectServiceError {
    #[error("Project name is required")]
    MissingName,
    #[error("Project not found")]
    ProjectNotFound,
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    images: Arc<dyn ImageRepository>,
    users: Arc<dyn UserRepository>,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        images: Arc<dyn ImageRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            projects,
            images,
            users,
        }
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectListing>, ProjectServiceError> {
        let mut listings = Vec::new();
        for project in self.projects.list_projects().await? {
            let images = self
                .images
                .list_by_project(&project.id)
                .await?
                .iter()
                .map(ImageSummary::from)
                .collect();
            listings.push(ProjectListing { project, images });
        }
        Ok(listings)
    }

    pub async fn get_project(&self, id: &str) -> Result<ProjectWithImages, ProjectServiceError> {
        let project = self
            .projects
            .find_by_id(id)
            .await?
            .ok_or(ProjectServiceError::ProjectNotFound)?;
        let images = self.images.list_by_project(&project.id).await?;

        Ok(ProjectWithImages { project, images })
    }

    /// Creates a project, storing the wizard fields as JSON metadata in the
    /// description.
    pub async fn create_project(
        &self,
        request: CreateProjectRequest,
    ) -> Result<Project, ProjectServiceError> {
        let name = request
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .ok_or(ProjectServiceError::MissingName)?;

        let owner = self.resolve_owner(request.user_id.as_deref()).await?;
        let description = serde_json::to_string(&request.metadata()).ok();

        Ok(self
            .projects
            .create_project(NewProject {
                name,
                description,
                user_id: owner.id,
            })
            .await?)
    }

    async fn resolve_owner(&self, user_id: Option<&str>) -> Result<User, ProjectServiceError> {
        if let Some(user_id) = user_id {
            if let Some(user) = self.users.find_by_id(user_id).await? {
                return Ok(user);
            }
            tracing::warn!("Unknown userId {}; assigning project to first user", user_id);
        }

        if let Some(user) = self.users.find_first().await? {
            return Ok(user);
        }

        tracing::info!("No users exist; creating {}", DEFAULT_OWNER_EMAIL);
        match self
            .users
            .create_user(NewUser {
                email: DEFAULT_OWNER_EMAIL.to_string(),
                name: Some(DEFAULT_OWNER_NAME.to_string()),
                password_hash: None,
            })
            .await
        {
            Ok(user) => Ok(user),
            Err(RepositoryError::AlreadyExists) => self
                .users
                .find_by_email(DEFAULT_OWNER_EMAIL)
                .await?
                .ok_or(ProjectServiceError::RepositoryError(RepositoryError::NotFound)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_project(
        &self,
        id: &str,
        request: UpdateProjectRequest,
    ) -> Result<Project, ProjectServiceError> {
        let name = request
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or(ProjectServiceError::MissingName)?;

        match self
            .projects
            .update_project(
                id,
                ProjectChanges {
                    name: Some(name),
                    description: request.description,
                },
            )
            .await
        {
            Ok(project) => Ok(project),
            Err(RepositoryError::NotFound) => Err(ProjectServiceError::ProjectNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the project and all of its images.
    pub async fn delete_project(&self, id: &str) -> Result<(), ProjectServiceError> {
        if self.projects.find_by_id(id).await?.is_none() {
            return Err(ProjectServiceError::ProjectNotFound);
        }

        let removed = self.images.delete_by_project(id).await?;
        tracing::debug!("Deleting project {} with {} images", id, removed);

        match self.projects.delete_project(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(ProjectServiceError::ProjectNotFound),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectMetadata;
    use crate::repositories::image_repository::MockImageRepository;
    use crate::repositories::project_repository::MockProjectRepository;
    use crate::repositories::user_repository::MockUserRepository;
    use crate::repositories::InMemoryStore;
    use chrono::Utc;

    fn in_memory_service() -> ProjectService {
        let store = Arc::new(InMemoryStore::new());
        ProjectService::new(store.clone(), store.clone(), store)
    }

    #[tokio::test]
    async fn test_create_without_users_creates_default_owner() {
        let store = Arc::new(InMemoryStore::new());
        let service = ProjectService::new(store.clone(), store.clone(), store.clone());

        let project = service
            .create_project(CreateProjectRequest {
                name: Some("Spring".to_string()),
                purpose: Some("Launch".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let owner = store
            .find_by_email(DEFAULT_OWNER_EMAIL)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.user_id, owner.id);
        assert_eq!(owner.name.as_deref(), Some(DEFAULT_OWNER_NAME));

        let metadata = ProjectMetadata::parse(project.description.as_deref().unwrap()).unwrap();
        assert_eq!(metadata.description, "Launch");
        assert_eq!(metadata.purpose.as_deref(), Some("Launch"));
    }

    #[tokio::test]
    async fn test_create_uses_given_user() {
        let store = Arc::new(InMemoryStore::new());
        let service = ProjectService::new(store.clone(), store.clone(), store.clone());
        store
            .create_user(NewUser::with_email("first@example.com"))
            .await
            .unwrap();
        let second = store
            .create_user(NewUser::with_email("second@example.com"))
            .await
            .unwrap();

        let project = service
            .create_project(CreateProjectRequest {
                name: Some("Mine".to_string()),
                user_id: Some(second.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(project.user_id, second.id);
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let result = in_memory_service()
            .create_project(CreateProjectRequest::default())
            .await;
        assert!(matches!(result, Err(ProjectServiceError::MissingName)));
    }

    #[tokio::test]
    async fn test_update_requires_name_and_existing_project() {
        let service = in_memory_service();

        let missing_name = service
            .update_project("p1", UpdateProjectRequest::default())
            .await;
        assert!(matches!(missing_name, Err(ProjectServiceError::MissingName)));

        let missing_project = service
            .update_project(
                "p1",
                UpdateProjectRequest {
                    name: Some("New".to_string()),
                    description: None,
                },
            )
            .await;
        assert!(matches!(
            missing_project,
            Err(ProjectServiceError::ProjectNotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_images_first() {
        let mut projects = MockProjectRepository::new();
        let mut images = MockImageRepository::new();
        let mut seq = mockall::Sequence::new();

        projects.expect_find_by_id().returning(|id| {
            let project = Project {
                id: id.to_string(),
                name: "P".to_string(),
                description: None,
                user_id: "u1".to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            Box::pin(async move { Ok(Some(project)) })
        });
        images
            .expect_delete_by_project()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(async move { Ok(3) }));
        projects
            .expect_delete_project()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(async move { Ok(()) }));

        let service = ProjectService::new(
            Arc::new(projects),
            Arc::new(images),
            Arc::new(MockUserRepository::new()),
        );
        service.delete_project("p1").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_project() {
        let result = in_memory_service().delete_project("nope").await;
        assert!(matches!(result, Err(ProjectServiceError::ProjectNotFound)));
    }
}
