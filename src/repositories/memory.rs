//! Process-local store used when no database is configured.
//!
//! Records live behind a single lock and are kept in insertion order, so
//! newest-first listings are a reverse walk.

use super::{
    ImageRepository, ProjectRepository, RepositoryError, RepositoryResult, UserRepository,
    VerificationCodeRepository,
};
use crate::models::{
    now, Image, ImageChanges, NewImage, NewProject, NewUser, Project, ProjectChanges, User,
    VerificationCode,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct State {
    users: Vec<User>,
    projects: Vec<Project>,
    images: Vec<Image>,
    codes: Vec<VerificationCode>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T: Clone>(items: impl DoubleEndedIterator<Item = T>) -> Vec<T> {
    items.rev().collect()
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, new_user: NewUser) -> RepositoryResult<User> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == new_user.email) {
            return Err(RepositoryError::AlreadyExists);
        }

        let created_at = now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            created_at,
            updated_at: created_at,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_first(&self) -> RepositoryResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.first().cloned())
    }

    async fn list_users(&self) -> RepositoryResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(newest_first(state.users.iter().cloned()))
    }

    async fn upsert_by_email(&self, email: &str) -> RepositoryResult<User> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.iter().find(|u| u.email == email) {
            return Ok(user.clone());
        }

        let created_at = now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: None,
            password_hash: None,
            created_at,
            updated_at: created_at,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_name(&self, id: &str, name: Option<String>) -> RepositoryResult<User> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        user.name = name;
        user.updated_at = now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &str) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn create_project(&self, new_project: NewProject) -> RepositoryResult<Project> {
        let mut state = self.state.write().await;
        let created_at = now();
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name: new_project.name,
            description: new_project.description,
            user_id: new_project.user_id,
            created_at,
            updated_at: created_at,
        };
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Project>> {
        let state = self.state.read().await;
        Ok(state.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects(&self) -> RepositoryResult<Vec<Project>> {
        let state = self.state.read().await;
        Ok(newest_first(state.projects.iter().cloned()))
    }

    async fn list_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Project>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state
                .projects
                .iter()
                .filter(|p| p.user_id == user_id)
                .cloned(),
        ))
    }

    async fn update_project(
        &self,
        id: &str,
        changes: ProjectChanges,
    ) -> RepositoryResult<Project> {
        let mut state = self.state.write().await;
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(name) = changes.name {
            project.name = name;
        }
        if let Some(description) = changes.description {
            project.description = description;
        }
        project.updated_at = now();
        Ok(project.clone())
    }

    async fn delete_project(&self, id: &str) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        let before = state.projects.len();
        state.projects.retain(|p| p.id != id);
        if state.projects.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_user(&self, user_id: &str) -> RepositoryResult<u64> {
        let mut state = self.state.write().await;
        let before = state.projects.len();
        state.projects.retain(|p| p.user_id != user_id);
        Ok((before - state.projects.len()) as u64)
    }
}

#[async_trait]
impl ImageRepository for InMemoryStore {
    async fn create_image(&self, new_image: NewImage) -> RepositoryResult<Image> {
        let mut state = self.state.write().await;
        let created_at = now();
        let image = Image {
            id: Uuid::new_v4().to_string(),
            url: new_image.url,
            project_id: new_image.project_id,
            selected: false,
            revise: false,
            reject: false,
            revise_note: None,
            reject_note: None,
            reel_note: None,
            variations: new_image.variations,
            created_at,
            updated_at: created_at,
        };
        state.images.push(image.clone());
        Ok(image)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Image>> {
        let state = self.state.read().await;
        Ok(state.images.iter().find(|i| i.id == id).cloned())
    }

    async fn list_images(&self) -> RepositoryResult<Vec<Image>> {
        let state = self.state.read().await;
        Ok(newest_first(state.images.iter().cloned()))
    }

    async fn list_by_project(&self, project_id: &str) -> RepositoryResult<Vec<Image>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state
                .images
                .iter()
                .filter(|i| i.project_id == project_id)
                .cloned(),
        ))
    }

    async fn count_by_project(&self, project_id: &str) -> RepositoryResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .images
            .iter()
            .filter(|i| i.project_id == project_id)
            .count() as i64)
    }

    async fn update_image(&self, id: &str, changes: ImageChanges) -> RepositoryResult<Image> {
        let mut state = self.state.write().await;
        let image = state
            .images
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(RepositoryError::NotFound)?;
        changes.apply_to(image);
        image.updated_at = now();
        Ok(image.clone())
    }

    async fn delete_image(&self, id: &str) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        let before = state.images.len();
        state.images.retain(|i| i.id != id);
        if state.images.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_project(&self, project_id: &str) -> RepositoryResult<u64> {
        let mut state = self.state.write().await;
        let before = state.images.len();
        state.images.retain(|i| i.project_id != project_id);
        Ok((before - state.images.len()) as u64)
    }

    async fn delete_by_projects(&self, project_ids: Vec<String>) -> RepositoryResult<u64> {
        let mut state = self.state.write().await;
        let before = state.images.len();
        state.images.retain(|i| !project_ids.contains(&i.project_id));
        Ok((before - state.images.len()) as u64)
    }
}

#[async_trait]
impl VerificationCodeRepository for InMemoryStore {
    async fn create_code(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> RepositoryResult<VerificationCode> {
        let mut state = self.state.write().await;
        let record = VerificationCode {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            code: code.to_string(),
            expires_at,
            created_at: now(),
        };
        state.codes.push(record.clone());
        Ok(record)
    }

    async fn consume(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<VerificationCode>> {
        let mut state = self.state.write().await;
        let position = state
            .codes
            .iter()
            .rposition(|c| c.email == email && c.code == code && !c.is_expired_at(now));
        Ok(position.map(|index| state.codes.remove(index)))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> RepositoryResult<u64> {
        let mut state = self.state.write().await;
        let before = state.codes.len();
        state.codes.retain(|c| !c.is_expired_at(now));
        Ok((before - state.codes.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReviewState;

    #[tokio::test]
    async fn test_duplicate_email() {
        let store = InMemoryStore::new();
        store
            .create_user(NewUser::with_email("a@b.com"))
            .await
            .unwrap();

        let result = store.create_user(NewUser::with_email("a@b.com")).await;
        assert!(matches!(result, Err(RepositoryError::AlreadyExists)));
    }

    #[tokio::test]
    async fn test_images_listed_newest_first() {
        let store = InMemoryStore::new();
        for url in ["/1.png", "/2.png", "/3.png"] {
            store
                .create_image(NewImage {
                    url: url.to_string(),
                    project_id: "p".to_string(),
                    variations: vec![],
                })
                .await
                .unwrap();
        }

        let urls: Vec<String> = store
            .list_by_project("p")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.url)
            .collect();
        assert_eq!(urls, vec!["/3.png", "/2.png", "/1.png"]);
        assert_eq!(store.count_by_project("p").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_image_changes_state() {
        let store = InMemoryStore::new();
        let image = store
            .create_image(NewImage {
                url: "/1.png".to_string(),
                project_id: "p".to_string(),
                variations: vec![],
            })
            .await
            .unwrap();

        let updated = store
            .update_image(
                &image.id,
                ImageChanges {
                    review_state: Some(ReviewState::Selected),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.selected);
        assert!(!updated.revise && !updated.reject);
    }

    #[tokio::test]
    async fn test_code_single_use() {
        let store = InMemoryStore::new();
        let issued_at = now();
        store
            .create_code("a@b.com", "123456", VerificationCode::expiry_from(issued_at))
            .await
            .unwrap();

        assert!(store
            .consume("a@b.com", "123456", issued_at)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .consume("a@b.com", "123456", issued_at)
            .await
            .unwrap()
            .is_none());
    }
}
