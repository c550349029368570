pub mod image;
pub mod project;
pub mod review;
pub mod user;
pub mod verification_code;

pub use image::{
    CreateImageRequest, Image, ImageChanges, ImageSummary, ImageUpdate, NewImage, NoteType,
    NoteUpdateRequest,
};
pub use project::{
    CreateProjectRequest, NewProject, Project, ProjectChanges, ProjectListing, ProjectMetadata,
    ProjectWithImages, UpdateProjectRequest,
};
pub use review::{resolve_flag_update, ReviewAction, ReviewFlags, ReviewState, ReviewUpdateError};
pub use user::{
    CreateUserRequest, ImageCount, NewUser, PublicUser, UpdateUserRequest, User, UserDetail,
    UserProjectSummary,
};
pub use verification_code::{
    SendCodeRequest, VerificationCode, VerifyCodeRequest, CODE_TTL_MINUTES,
};

use serde::{Deserialize, Deserializer};

// Keeps "key present with null" apart from "key absent" in partial updates.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Current time, truncated to microseconds so values round-trip through the
/// store unchanged.
pub fn now() -> chrono::DateTime<chrono::Utc> {
    use chrono::{DurationRound, TimeDelta};

    let now = chrono::Utc::now();
    now.duration_trunc(TimeDelta::microseconds(1)).unwrap_or(now)
}
