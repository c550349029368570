use crate::models::{now, User, VerificationCode};
use crate::repositories::{RepositoryError, UserRepository, VerificationCodeRepository};
use crate::services::email_service::{EmailError, EmailService};
use rand::Rng;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Email is required")]
    MissingEmail,
    #[error("Email and code are required")]
    MissingFields,
    #[error("Invalid or expired code")]
    InvalidCode,
    #[error("Email error: {0}")]
    EmailError(#[from] EmailError),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

/// One-time sign-in codes: issue, deliver, consume.
pub struct VerificationService {
    codes: Arc<dyn VerificationCodeRepository>,
    users: Arc<dyn UserRepository>,
    email_service: Box<dyn EmailService>,
}

impl VerificationService {
    pub fn new(
        codes: Arc<dyn VerificationCodeRepository>,
        users: Arc<dyn UserRepository>,
        email_service: Box<dyn EmailService>,
    ) -> Self {
        Self {
            codes,
            users,
            email_service,
        }
    }

    fn generate_code() -> String {
        rand::thread_rng().gen_range(100_000..1_000_000).to_string()
    }

    pub async fn send_code(&self, email: Option<String>) -> Result<(), VerificationError> {
        let email = email
            .filter(|e| !e.is_empty())
            .ok_or(VerificationError::MissingEmail)?;

        let code = Self::generate_code();
        let issued_at = now();
        self.codes
            .create_code(&email, &code, VerificationCode::expiry_from(issued_at))
            .await?;
        tracing::debug!("Stored verification code for {}", email);

        match self
            .email_service
            .send_verification_code(&email, &code)
            .await
        {
            Ok(()) => {
                tracing::info!("Verification code sent to: {}", email);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to send verification code to {}: {:?}", email, e);
                Err(e.into())
            }
        }
    }

    /// Consumes a matching unexpired code and returns the user for `email`,
    /// creating one on first sign-in.
    pub async fn verify_code(
        &self,
        email: Option<String>,
        code: Option<String>,
    ) -> Result<User, VerificationError> {
        let (email, code) = match (email, code) {
            (Some(email), Some(code)) if !email.is_empty() && !code.is_empty() => (email, code),
            _ => return Err(VerificationError::MissingFields),
        };

        self.codes
            .consume(&email, &code, now())
            .await?
            .ok_or(VerificationError::InvalidCode)?;

        Ok(self.users.upsert_by_email(&email).await?)
    }

    pub async fn cleanup_expired(&self) -> Result<u64, VerificationError> {
        let removed = self.codes.delete_expired(now()).await?;
        if removed > 0 {
            tracing::info!("Removed {} expired verification codes", removed);
        }
        Ok(removed)
    }
}
