pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod review;
pub mod routes;
pub mod seed;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use auth::token::TokenSigner;
use config::session::SessionConfig;
use repositories::Repositories;
use services::{
    AuthService, EmailService, ImageService, ProjectService, UploadService, UserService,
    VariationService, VerificationService,
};
use std::{path::Path, sync::Arc};

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub verification_service: Arc<VerificationService>,
    pub project_service: Arc<ProjectService>,
    pub image_service: Arc<ImageService>,
    pub variation_service: Arc<VariationService>,
    pub upload_service: Arc<UploadService>,
    pub session_config: SessionConfig,
    pub token_signer: TokenSigner,
}

impl AppState {
    /// Wires every service onto one set of repositories.
    pub fn new(
        repositories: Repositories,
        email_service: Box<dyn EmailService>,
        public_dir: &Path,
        session_config: SessionConfig,
        token_signer: TokenSigner,
    ) -> Self {
        let Repositories {
            users,
            projects,
            images,
            codes,
        } = repositories;

        AppState {
            user_service: Arc::new(UserService::new(
                users.clone(),
                projects.clone(),
                images.clone(),
            )),
            auth_service: Arc::new(AuthService::new(users.clone())),
            verification_service: Arc::new(VerificationService::new(
                codes,
                users.clone(),
                email_service,
            )),
            project_service: Arc::new(ProjectService::new(
                projects.clone(),
                images.clone(),
                users,
            )),
            image_service: Arc::new(ImageService::new(images, projects)),
            variation_service: Arc::new(VariationService::new(public_dir)),
            upload_service: Arc::new(UploadService::new(public_dir)),
            session_config,
            token_signer,
        }
    }
}
