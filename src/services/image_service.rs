use crate::models::{
    resolve_flag_update, CreateImageRequest, Image, ImageChanges, ImageUpdate, NewImage, NoteType,
    NoteUpdateRequest, ReviewUpdateError,
};
use crate::repositories::{ImageRepository, ProjectRepository, RepositoryError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ImageServiceError {
    #[error("URL and projectId are required")]
    MissingFields,
    #[error("Note type and content are required")]
    MissingNote,
    #[error("Invalid note type. Must be reviseNote, rejectNote, or reelNote")]
    InvalidNoteType,
    #[error("{0}")]
    ConflictingFlags(#[from] ReviewUpdateError),
    #[error("Image not found")]
    ImageNotFound,
    #[error("Project not found")]
    ProjectNotFound,
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct ImageService {
    images: Arc<dyn ImageRepository>,
    projects: Arc<dyn ProjectRepository>,
}

impl ImageService {
    pub fn new(images: Arc<dyn ImageRepository>, projects: Arc<dyn ProjectRepository>) -> Self {
        Self { images, projects }
    }

    pub async fn list_images(
        &self,
        project_id: Option<&str>,
    ) -> Result<Vec<Image>, ImageServiceError> {
        let images = match project_id.filter(|id| !id.is_empty()) {
            Some(project_id) => self.images.list_by_project(project_id).await?,
            None => self.images.list_images().await?,
        };
        Ok(images)
    }

    pub async fn get_image(&self, id: &str) -> Result<Image, ImageServiceError> {
        self.images
            .find_by_id(id)
            .await?
            .ok_or(ImageServiceError::ImageNotFound)
    }

    pub async fn create_image(
        &self,
        request: CreateImageRequest,
    ) -> Result<Image, ImageServiceError> {
        let (url, project_id) = match (request.url, request.project_id) {
            (Some(url), Some(project_id)) if !url.is_empty() && !project_id.is_empty() => {
                (url, project_id)
            }
            _ => return Err(ImageServiceError::MissingFields),
        };

        if self.projects.find_by_id(&project_id).await?.is_none() {
            return Err(ImageServiceError::ProjectNotFound);
        }

        Ok(self
            .images
            .create_image(NewImage {
                url,
                project_id,
                variations: request.variations,
            })
            .await?)
    }

    /// Applies a partial update. Review flags go through the toggle rules;
    /// note keys are copied as given.
    pub async fn update_image(
        &self,
        id: &str,
        update: ImageUpdate,
    ) -> Result<Image, ImageServiceError> {
        let current = self.get_image(id).await?;

        let committed = current.review_state();
        let next = resolve_flag_update(committed, update.selected, update.revise, update.reject)?;

        let changes = ImageChanges {
            review_state: (next != committed).then_some(next),
            revise_note: update.revise_note,
            reject_note: update.reject_note,
            reel_note: update.reel_note,
        };
        if next != committed {
            tracing::debug!("Image {} review state {:?} -> {:?}", id, committed, next);
        }

        self.apply_changes(id, changes).await
    }

    pub async fn update_note(
        &self,
        id: &str,
        request: NoteUpdateRequest,
    ) -> Result<Image, ImageServiceError> {
        let (note_type, content) = match (request.note_type, request.content) {
            (Some(note_type), Some(content)) if !note_type.is_empty() && !content.is_empty() => {
                (note_type, content)
            }
            _ => return Err(ImageServiceError::MissingNote),
        };
        let note_type: NoteType = note_type
            .parse()
            .map_err(|_| ImageServiceError::InvalidNoteType)?;

        self.get_image(id).await?;

        let mut changes = ImageChanges::default();
        match note_type {
            NoteType::ReviseNote => changes.revise_note = Some(Some(content)),
            NoteType::RejectNote => changes.reject_note = Some(Some(content)),
            NoteType::ReelNote => changes.reel_note = Some(Some(content)),
        }

        self.apply_changes(id, changes).await
    }

    async fn apply_changes(
        &self,
        id: &str,
        changes: ImageChanges,
    ) -> Result<Image, ImageServiceError> {
        match self.images.update_image(id, changes).await {
            Ok(image) => Ok(image),
            Err(RepositoryError::NotFound) => Err(ImageServiceError::ImageNotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_image(&self, id: &str) -> Result<(), ImageServiceError> {
        match self.images.delete_image(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(ImageServiceError::ImageNotFound),
            Err(e) => Err(e.into()),
        }
    }
}
