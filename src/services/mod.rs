pub mod auth_service;
pub mod email_service;
pub mod image_service;
pub mod project_service;
pub mod upload_service;
pub mod user_service;
pub mod variation_service;
pub mod verification_service;

pub use auth_service::{AuthService, AuthServiceError, LoginRequest};
pub use email_service::{create_email_service, EmailError, EmailService, MockEmailService};
pub use image_service::{ImageService, ImageServiceError};
pub use project_service::{ProjectService, ProjectServiceError};
pub use upload_service::{UploadError, UploadRequest, UploadService, UPLOAD_BODY_LIMIT};
pub use user_service::{SignupRequest, UserService, UserServiceError};
pub use variation_service::{
    ConceptVariations, SelectVariationRequest, VariationError, VariationService,
};
pub use verification_service::{VerificationError, VerificationService};
