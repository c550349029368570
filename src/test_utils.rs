pub mod test_helpers {
    use async_trait::async_trait;
    use axum::Router;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;

    use crate::auth::TokenSigner;
    use crate::config::session::{SessionConfig, AUTH_COOKIE_NAME};
    use crate::repositories::{Repositories, RepositoryError, RepositoryResult, UserRepository};
    use crate::services::{EmailError, EmailService};
    use crate::{routes, AppState};

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when you need to test features that don't work with in-memory databases
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = crate::db::create_pool(&database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok((pool, temp_file))
    }

    /// Email service that keeps every sent code for assertions.
    #[derive(Clone, Default)]
    pub struct RecordingEmailService {
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl RecordingEmailService {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().map(|s| s.clone()).unwrap_or_default()
        }

        /// Most recent code sent to `email`.
        pub fn last_code_for(&self, email: &str) -> Option<String> {
            self.sent()
                .into_iter()
                .rev()
                .find(|(to, _)| to == email)
                .map(|(_, code)| code)
        }
    }

    #[async_trait]
    impl EmailService for RecordingEmailService {
        async fn send_verification_code(
            &self,
            to_email: &str,
            code: &str,
        ) -> Result<(), EmailError> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push((to_email.to_string(), code.to_string()));
            }
            Ok(())
        }
    }

    pub fn test_signer() -> TokenSigner {
        TokenSigner::new(b"test-session-key".to_vec(), 7 * 24 * 60 * 60)
    }

    /// `Cookie` header value for a session of the user with `email`,
    /// created on demand and signed with [`test_signer`].
    pub async fn session_cookie(
        repositories: &Repositories,
        email: &str,
    ) -> RepositoryResult<String> {
        let user = repositories.users.upsert_by_email(email).await?;
        let token = test_signer()
            .issue(&user.id, &user.email, chrono::Utc::now())
            .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;
        Ok(format!("{}={}", AUTH_COOKIE_NAME, token))
    }

    pub fn test_state(
        repositories: Repositories,
        email: RecordingEmailService,
        public_dir: &Path,
    ) -> AppState {
        AppState::new(
            repositories,
            Box::new(email),
            public_dir,
            SessionConfig::default(),
            test_signer(),
        )
    }

    /// Full application router over the given store.
    pub fn test_app(
        repositories: Repositories,
        email: RecordingEmailService,
        public_dir: &Path,
    ) -> Router {
        routes::app(test_state(repositories, email, public_dir), public_dir)
    }
}
