pub mod image_repository;
pub mod memory;
pub mod project_repository;
pub mod user_repository;
pub mod verification_code_repository;

pub use image_repository::{ImageRepository, SqliteImageRepository};
pub use memory::InMemoryStore;
pub use project_repository::{ProjectRepository, SqliteProjectRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};
pub use verification_code_repository::{
    SqliteVerificationCodeRepository, VerificationCodeRepository,
};

use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
    #[error("Stored data is invalid: {0}")]
    InvalidData(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// The persistence client: one handle per entity, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub images: Arc<dyn ImageRepository>,
    pub codes: Arc<dyn VerificationCodeRepository>,
}

impl Repositories {
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            users: Arc::new(SqliteUserRepository::new(pool.clone())),
            projects: Arc::new(SqliteProjectRepository::new(pool.clone())),
            images: Arc::new(SqliteImageRepository::new(pool.clone())),
            codes: Arc::new(SqliteVerificationCodeRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(InMemoryStore::new())
    }

    pub fn from_store(store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            projects: store.clone(),
            images: store.clone(),
            codes: store,
        }
    }
}
