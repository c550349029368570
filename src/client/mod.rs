pub mod api;
pub mod wizard;

pub use api::{ApiClient, ClientError};
pub use wizard::{ConceptDraft, ProjectDraft, VisualFocus, WizardError};
