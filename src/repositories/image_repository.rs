use super::{RepositoryError, RepositoryResult};
use crate::models::{now, Image, ImageChanges, NewImage};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ImageRepository: Send + Sync {
    async fn create_image(&self, new_image: NewImage) -> RepositoryResult<Image>;
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Image>>;
    async fn list_images(&self) -> RepositoryResult<Vec<Image>>;
    async fn list_by_project(&self, project_id: &str) -> RepositoryResult<Vec<Image>>;
    async fn count_by_project(&self, project_id: &str) -> RepositoryResult<i64>;
    async fn update_image(&self, id: &str, changes: ImageChanges) -> RepositoryResult<Image>;
    async fn delete_image(&self, id: &str) -> RepositoryResult<()>;
    async fn delete_by_project(&self, project_id: &str) -> RepositoryResult<u64>;
    async fn delete_by_projects(&self, project_ids: Vec<String>) -> RepositoryResult<u64>;
}

pub struct SqliteImageRepository {
    pool: SqlitePool,
}

impl SqliteImageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const IMAGE_COLUMNS: &str = "id, url, project_id, selected, revise, reject, revise_note, \
                             reject_note, reel_note, variations, created_at, updated_at";

#[async_trait]
impl ImageRepository for SqliteImageRepository {
    async fn create_image(&self, new_image: NewImage) -> RepositoryResult<Image> {
        let id = Uuid::new_v4().to_string();
        let created_at = now();
        let variations = serde_json::to_string(&new_image.variations)
            .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;

        sqlx::query(
            "INSERT INTO images (id, url, project_id, variations, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&new_image.url)
        .bind(&new_image.project_id)
        .bind(&variations)
        .bind(created_at)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        self.find_by_id(&id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Image>> {
        let image = sqlx::query_as::<_, Image>(&format!(
            "SELECT {} FROM images WHERE id = ?",
            IMAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(image)
    }

    async fn list_images(&self) -> RepositoryResult<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(&format!(
            "SELECT {} FROM images ORDER BY created_at DESC, rowid DESC",
            IMAGE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    async fn list_by_project(&self, project_id: &str) -> RepositoryResult<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(&format!(
            "SELECT {} FROM images WHERE project_id = ? ORDER BY created_at DESC, rowid DESC",
            IMAGE_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    async fn count_by_project(&self, project_id: &str) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM images WHERE project_id = ?")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn update_image(&self, id: &str, changes: ImageChanges) -> RepositoryResult<Image> {
        let mut image = self
            .find_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        changes.apply_to(&mut image);

        sqlx::query(
            "UPDATE images SET selected = ?, revise = ?, reject = ?, revise_note = ?, \
             reject_note = ?, reel_note = ?, updated_at = ? WHERE id = ?",
        )
        .bind(image.selected)
        .bind(image.revise)
        .bind(image.reject)
        .bind(&image.revise_note)
        .bind(&image.reject_note)
        .bind(&image.reel_note)
        .bind(now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn delete_image(&self, id: &str) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_by_project(&self, project_id: &str) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM images WHERE project_id = ?")
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_by_projects(&self, project_ids: Vec<String>) -> RepositoryResult<u64> {
        if project_ids.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("DELETE FROM images WHERE project_id IN (");
        let mut separated = builder.separated(", ");
        for project_id in &project_ids {
            separated.push_bind(project_id.clone());
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
