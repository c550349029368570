use super::{RepositoryError, RepositoryResult};
use crate::models::{now, NewProject, Project, ProjectChanges};
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ProjectRepository: Send + Sync {
    async fn create_project(&self, new_project: NewProject) -> RepositoryResult<Project>;
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Project>>;
    async fn list_projects(&self) -> RepositoryResult<Vec<Project>>;
    async fn list_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Project>>;
    async fn update_project(&self, id: &str, changes: ProjectChanges)
        -> RepositoryResult<Project>;
    async fn delete_project(&self, id: &str) -> RepositoryResult<()>;
    /// Deletes every project owned by `user_id`, returning how many went.
    async fn delete_by_user(&self, user_id: &str) -> RepositoryResult<u64>;
}

pub struct SqliteProjectRepository {
    pool: SqlitePool,
}

impl SqliteProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const PROJECT_COLUMNS: &str = "id, name, description, user_id, created_at, updated_at";

#[async_trait]
impl ProjectRepository for SqliteProjectRepository {
    async fn create_project(&self, new_project: NewProject) -> RepositoryResult<Project> {
        let id = Uuid::new_v4().to_string();
        let created_at = now();

        sqlx::query(
            "INSERT INTO projects (id, name, description, user_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&new_project.name)
        .bind(&new_project.description)
        .bind(&new_project.user_id)
        .bind(created_at)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        self.find_by_id(&id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE id = ?",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn list_projects(&self) -> RepositoryResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects ORDER BY created_at DESC, rowid DESC",
            PROJECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn list_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
            PROJECT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn update_project(
        &self,
        id: &str,
        changes: ProjectChanges,
    ) -> RepositoryResult<Project> {
        let mut project = self
            .find_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if let Some(name) = changes.name {
            project.name = name;
        }
        if let Some(description) = changes.description {
            project.description = description;
        }

        sqlx::query("UPDATE projects SET name = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(&project.name)
            .bind(&project.description)
            .bind(now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn delete_project(&self, id: &str) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_by_user(&self, user_id: &str) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM projects WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::repositories::{SqliteUserRepository, UserRepository};
    use crate::test_utils::test_helpers::create_test_db;

    async fn setup() -> (SqliteProjectRepository, String) {
        let pool = create_test_db().await.unwrap();
        let user = SqliteUserRepository::new(pool.clone())
            .create_user(NewUser::with_email("owner@example.com"))
            .await
            .unwrap();
        (SqliteProjectRepository::new(pool), user.id)
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (repo, user_id) = setup().await;

        for name in ["first", "second", "third"] {
            repo.create_project(NewProject {
                name: name.to_string(),
                description: None,
                user_id: user_id.clone(),
            })
            .await
            .unwrap();
        }

        let names: Vec<String> = repo
            .list_projects()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_update_leaves_absent_fields() {
        let (repo, user_id) = setup().await;
        let project = repo
            .create_project(NewProject {
                name: "Catalog".to_string(),
                description: Some("Summer".to_string()),
                user_id,
            })
            .await
            .unwrap();

        let updated = repo
            .update_project(
                &project.id,
                ProjectChanges {
                    name: Some("Catalog v2".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Catalog v2");
        assert_eq!(updated.description.as_deref(), Some("Summer"));

        let cleared = repo
            .update_project(
                &project.id,
                ProjectChanges {
                    name: None,
                    description: Some(None),
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.description, None);
    }

    #[tokio::test]
    async fn test_update_missing_project() {
        let (repo, _) = setup().await;
        let result = repo
            .update_project("missing", ProjectChanges::default())
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }
}
