use super::{RepositoryError, RepositoryResult};
use crate::models::{now, VerificationCode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait VerificationCodeRepository: Send + Sync {
    async fn create_code(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> RepositoryResult<VerificationCode>;

    /// Atomically removes a matching, unexpired code. Returns `None` when no
    /// such code exists, so a code can be consumed at most once.
    async fn consume(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<VerificationCode>>;

    async fn delete_expired(&self, now: DateTime<Utc>) -> RepositoryResult<u64>;
}

pub struct SqliteVerificationCodeRepository {
    pool: SqlitePool,
}

impl SqliteVerificationCodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationCodeRepository for SqliteVerificationCodeRepository {
    async fn create_code(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> RepositoryResult<VerificationCode> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO verification_codes (id, email, code, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(code)
        .bind(expires_at)
        .bind(now())
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, VerificationCode>(
            "SELECT id, email, code, expires_at, created_at FROM verification_codes WHERE id = ?",
        )
        .bind(&id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn consume(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<VerificationCode>> {
        let mut tx = self.pool.begin().await?;

        let found = sqlx::query_as::<_, VerificationCode>(
            "SELECT id, email, code, expires_at, created_at FROM verification_codes \
             WHERE email = ? AND code = ? AND expires_at > ? \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(email)
        .bind(code)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(found) = found else {
            tx.commit().await?;
            return Ok(None);
        };

        let result = sqlx::query("DELETE FROM verification_codes WHERE id = ?")
            .bind(&found.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if result.rows_affected() == 1 {
            Ok(Some(found))
        } else {
            Ok(None)
        }
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM verification_codes WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::create_test_db;
    use chrono::Duration;

    #[tokio::test]
    async fn test_code_is_consumed_once() {
        let pool = create_test_db().await.unwrap();
        let repo = SqliteVerificationCodeRepository::new(pool);
        let issued_at = now();

        repo.create_code(
            "a@b.com",
            "123456",
            VerificationCode::expiry_from(issued_at),
        )
        .await
        .unwrap();

        let first = repo.consume("a@b.com", "123456", issued_at).await.unwrap();
        assert!(first.is_some());

        let second = repo.consume("a@b.com", "123456", issued_at).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_expired_code_is_rejected_and_cleaned_up() {
        let pool = create_test_db().await.unwrap();
        let repo = SqliteVerificationCodeRepository::new(pool);
        let issued_at = now();

        repo.create_code(
            "a@b.com",
            "654321",
            VerificationCode::expiry_from(issued_at),
        )
        .await
        .unwrap();

        let later = issued_at + Duration::minutes(11);
        assert!(repo
            .consume("a@b.com", "654321", later)
            .await
            .unwrap()
            .is_none());
        assert_eq!(repo.delete_expired(later).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_wrong_email_does_not_match() {
        let pool = create_test_db().await.unwrap();
        let repo = SqliteVerificationCodeRepository::new(pool);
        let issued_at = now();

        repo.create_code(
            "a@b.com",
            "111111",
            VerificationCode::expiry_from(issued_at),
        )
        .await
        .unwrap();

        assert!(repo
            .consume("other@b.com", "111111", issued_at)
            .await
            .unwrap()
            .is_none());
    }
}
