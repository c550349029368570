//! Grid and fullscreen review controller.
//!
//! The grid shows one card per concept. Fullscreen works on a copy of the
//! grid's overrides so in-flight toggles there never leak into the grid
//! before the server confirms them.

use async_trait::async_trait;
use std::sync::Arc;

use super::concept::{group_concepts, Concept, Variation};
use super::debounce::{Debouncer, NOTE_SAVE_DELAY};
use super::overrides::OverrideMap;
use super::viewer::{next_variation, previous_variation, Viewport};
use crate::client::ClientError;
use crate::models::{Image, ImageUpdate, NoteType, ReviewAction, ReviewState};

/// The API calls the review screen needs.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ReviewBackend: Send + Sync {
    async fn list_images(&self, project_id: Option<String>) -> Result<Vec<Image>, ClientError>;

    async fn update_image(&self, id: &str, update: ImageUpdate) -> Result<Image, ClientError>;

    /// `None` or empty content clears the note.
    async fn save_note(
        &self,
        id: &str,
        note_type: NoteType,
        content: Option<String>,
    ) -> Result<Image, ClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Unknown variation: {0}")]
    UnknownVariation(String),
    #[error(transparent)]
    Backend(#[from] ClientError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridCard {
    pub concept_id: String,
    pub variation_id: String,
    pub url: String,
    pub state: ReviewState,
    pub note: String,
    pub variation_count: usize,
}

/// A toggle recorded locally and waiting to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommit {
    pub image_id: String,
    pub update: ImageUpdate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreloadTargets {
    pub primary: String,
    pub variations: Vec<String>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// Keys the fullscreen viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    ArrowLeft,
    ArrowRight,
    Escape,
}

#[derive(Debug, Clone)]
struct FullscreenView {
    concept_index: usize,
    // None while the main image is shown
    shown_variation: Option<String>,
    overrides: OverrideMap,
    viewport: Viewport,
}

pub struct ReviewSession {
    backend: Arc<dyn ReviewBackend>,
    concepts: Vec<Concept>,
    grid_overrides: OverrideMap,
    fullscreen: Option<FullscreenView>,
    note_saves: Debouncer<String>,
}

impl ReviewSession {
    pub fn new(backend: Arc<dyn ReviewBackend>, images: &[Image]) -> Self {
        Self {
            backend,
            concepts: group_concepts(images),
            grid_overrides: OverrideMap::new(),
            fullscreen: None,
            note_saves: Debouncer::new(NOTE_SAVE_DELAY),
        }
    }

    pub async fn load(
        backend: Arc<dyn ReviewBackend>,
        project_id: Option<String>,
    ) -> Result<Self, ReviewError> {
        let images = backend.list_images(project_id).await?;
        tracing::debug!("Loaded {} images for review", images.len());
        Ok(Self::new(backend, &images))
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn concept(&self, id: &str) -> Option<&Concept> {
        self.concepts.iter().find(|c| c.id == id)
    }

    fn concept_index_of(&self, variation_id: &str) -> Option<usize> {
        self.concepts.iter().position(|c| c.contains(variation_id))
    }

    fn variation(&self, variation_id: &str) -> Option<&Variation> {
        self.concepts.iter().find_map(|c| c.variation(variation_id))
    }

    fn active_overrides(&self) -> &OverrideMap {
        match &self.fullscreen {
            Some(view) => &view.overrides,
            None => &self.grid_overrides,
        }
    }

    pub fn committed_state(&self, variation_id: &str) -> Option<ReviewState> {
        self.variation(variation_id).map(|v| v.state)
    }

    /// State as the current view shows it, overrides included.
    pub fn effective_state(&self, variation_id: &str) -> Option<ReviewState> {
        let committed = self.committed_state(variation_id)?;
        Some(self.active_overrides().effective(variation_id, committed))
    }

    pub fn pending_override_count(&self) -> usize {
        self.active_overrides().len()
    }

    pub fn grid(&self) -> Vec<GridCard> {
        self.concepts
            .iter()
            .map(|concept| {
                let shown = concept.representative();
                GridCard {
                    concept_id: concept.id.clone(),
                    variation_id: shown.id.clone(),
                    url: shown.url.clone(),
                    state: self.grid_overrides.effective(&shown.id, shown.state),
                    note: shown.note.clone(),
                    variation_count: concept.variations.len(),
                }
            })
            .collect()
    }

    /// Grid-level choice of which variation represents a concept.
    pub fn select_variation(&mut self, concept_id: &str, variation_id: Option<&str>) -> bool {
        match self.concepts.iter_mut().find(|c| c.id == concept_id) {
            Some(concept) => {
                concept.select_variation(variation_id);
                true
            }
            None => false,
        }
    }

    // Review actions

    /// Records the toggle locally. Variations that only exist client-side
    /// commit immediately and yield no server call.
    pub fn begin_toggle(
        &mut self,
        variation_id: &str,
        action: ReviewAction,
    ) -> Result<Option<PendingCommit>, ReviewError> {
        let index = self
            .concept_index_of(variation_id)
            .ok_or_else(|| ReviewError::UnknownVariation(variation_id.to_string()))?;

        let overrides = match &mut self.fullscreen {
            Some(view) => &mut view.overrides,
            None => &mut self.grid_overrides,
        };
        let Some(variation) = self.concepts[index].variation_mut(variation_id) else {
            return Err(ReviewError::UnknownVariation(variation_id.to_string()));
        };

        let next = overrides.toggle(variation_id, variation.state, action);

        if !variation.is_persisted() {
            variation.state = next;
            overrides.settle(variation_id);
            return Ok(None);
        }

        Ok(Some(PendingCommit {
            image_id: variation_id.to_string(),
            update: ImageUpdate::for_state(next),
        }))
    }

    /// Settles a commit. The server's copy replaces the committed state; on
    /// failure the previous committed state stands.
    pub fn finish_toggle(
        &mut self,
        image_id: &str,
        result: Result<Image, ClientError>,
    ) -> Result<ReviewState, ReviewError> {
        self.grid_overrides.settle(image_id);
        if let Some(view) = &mut self.fullscreen {
            view.overrides.settle(image_id);
        }

        match result {
            Ok(image) => {
                for concept in &mut self.concepts {
                    if concept.apply_committed(&image) {
                        break;
                    }
                }
                Ok(image.review_state())
            }
            Err(e) => {
                tracing::warn!("Review update for {} failed: {}", image_id, e);
                Err(e.into())
            }
        }
    }

    pub async fn toggle(
        &mut self,
        variation_id: &str,
        action: ReviewAction,
    ) -> Result<ReviewState, ReviewError> {
        let Some(commit) = self.begin_toggle(variation_id, action)? else {
            return self
                .committed_state(variation_id)
                .ok_or_else(|| ReviewError::UnknownVariation(variation_id.to_string()));
        };

        let result = self
            .backend
            .update_image(&commit.image_id, commit.update)
            .await;
        self.finish_toggle(&commit.image_id, result)
    }

    /// Updates the note locally and schedules a debounced save. Notes are
    /// saved only for persisted variations in the revise or reject state;
    /// returns whether a save was scheduled.
    pub fn edit_note(&mut self, variation_id: &str, text: &str) -> Result<bool, ReviewError> {
        let state = self
            .effective_state(variation_id)
            .ok_or_else(|| ReviewError::UnknownVariation(variation_id.to_string()))?;

        let Some(variation) = self
            .concepts
            .iter_mut()
            .find_map(|c| c.variation_mut(variation_id))
        else {
            return Err(ReviewError::UnknownVariation(variation_id.to_string()));
        };
        variation.note = text.to_string();

        let Some(note_type) = state.note_type() else {
            return Ok(false);
        };
        if !variation.is_persisted() {
            return Ok(false);
        }

        let backend = Arc::clone(&self.backend);
        let id = variation_id.to_string();
        let content = Some(text.to_string()).filter(|t| !t.is_empty());
        self.note_saves.schedule(id.clone(), async move {
            if let Err(e) = backend.save_note(&id, note_type, content).await {
                tracing::warn!("Failed to save note for {}: {}", id, e);
            }
        });
        Ok(true)
    }

    pub fn has_pending_note(&self, variation_id: &str) -> bool {
        self.note_saves.is_pending(&variation_id.to_string())
    }

    // Fullscreen

    pub fn open_fullscreen(&mut self, concept_id: &str) -> bool {
        let Some(index) = self.concepts.iter().position(|c| c.id == concept_id) else {
            return false;
        };
        self.fullscreen = Some(FullscreenView {
            concept_index: index,
            shown_variation: self.concepts[index].selected_variation_id.clone(),
            overrides: self.grid_overrides.clone(),
            viewport: Viewport::new(),
        });
        true
    }

    /// Keeps the variation shown last as the concept's choice.
    pub fn close_fullscreen(&mut self) {
        self.commit_shown_variation();
        self.fullscreen = None;
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_some()
    }

    pub fn fullscreen_concept(&self) -> Option<&Concept> {
        self.fullscreen
            .as_ref()
            .map(|view| &self.concepts[view.concept_index])
    }

    /// The variation on screen and its effective state.
    pub fn fullscreen_variation(&self) -> Option<(&Variation, ReviewState)> {
        let view = self.fullscreen.as_ref()?;
        let concept = &self.concepts[view.concept_index];
        let variation = view
            .shown_variation
            .as_deref()
            .and_then(|id| concept.variation(id))
            .unwrap_or_else(|| concept.main());
        let state = view.overrides.effective(&variation.id, variation.state);
        Some((variation, state))
    }

    pub async fn toggle_shown(&mut self, action: ReviewAction) -> Result<ReviewState, ReviewError> {
        let id = match self.fullscreen_variation() {
            Some((variation, _)) => variation.id.clone(),
            None => return Err(ReviewError::UnknownVariation(String::new())),
        };
        self.toggle(&id, action).await
    }

    pub fn show_next_variation(&mut self) {
        if let Some(view) = &mut self.fullscreen {
            let concept = &self.concepts[view.concept_index];
            view.shown_variation = next_variation(concept, view.shown_variation.as_deref());
        }
    }

    pub fn show_previous_variation(&mut self) {
        if let Some(view) = &mut self.fullscreen {
            let concept = &self.concepts[view.concept_index];
            view.shown_variation = previous_variation(concept, view.shown_variation.as_deref());
        }
    }

    /// Returns whether the key was handled. Keys are ignored outside
    /// fullscreen.
    pub fn handle_key(&mut self, key: ViewerKey) -> bool {
        if !self.is_fullscreen() {
            return false;
        }
        match key {
            ViewerKey::ArrowRight => self.show_next_variation(),
            ViewerKey::ArrowLeft => self.show_previous_variation(),
            ViewerKey::Escape => self.close_fullscreen(),
        }
        true
    }

    pub fn has_next_concept(&self) -> bool {
        self.fullscreen
            .as_ref()
            .is_some_and(|view| view.concept_index + 1 < self.concepts.len())
    }

    pub fn has_previous_concept(&self) -> bool {
        self.fullscreen
            .as_ref()
            .is_some_and(|view| view.concept_index > 0)
    }

    pub fn next_concept(&mut self) -> bool {
        if !self.has_next_concept() {
            return false;
        }
        self.move_fullscreen(1);
        true
    }

    pub fn previous_concept(&mut self) -> bool {
        if !self.has_previous_concept() {
            return false;
        }
        self.move_fullscreen(-1);
        true
    }

    fn move_fullscreen(&mut self, step: isize) {
        self.commit_shown_variation();
        if let Some(view) = &mut self.fullscreen {
            let index = view.concept_index.saturating_add_signed(step);
            view.concept_index = index;
            view.shown_variation = self.concepts[index].selected_variation_id.clone();
            view.viewport.reset();
        }
    }

    fn commit_shown_variation(&mut self) {
        if let Some(view) = &self.fullscreen {
            let shown = view.shown_variation.clone();
            self.concepts[view.concept_index].select_variation(shown.as_deref());
        }
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.fullscreen.as_ref().map(|view| &view.viewport)
    }

    pub fn viewport_mut(&mut self) -> Option<&mut Viewport> {
        self.fullscreen.as_mut().map(|view| &mut view.viewport)
    }

    /// What to warm up for the fullscreen concept: the shown image first,
    /// then its siblings and the neighbouring concepts' cards.
    pub fn preload_targets(&self) -> Option<PreloadTargets> {
        let view = self.fullscreen.as_ref()?;
        let (shown, _) = self.fullscreen_variation()?;
        let concept = &self.concepts[view.concept_index];

        let neighbour = |index: Option<usize>| {
            index
                .and_then(|i| self.concepts.get(i))
                .map(|c| c.representative().url.clone())
        };

        Some(PreloadTargets {
            primary: shown.url.clone(),
            variations: concept
                .variations
                .iter()
                .filter(|v| v.id != shown.id)
                .map(|v| v.url.clone())
                .collect(),
            next: neighbour(view.concept_index.checked_add(1)),
            previous: neighbour(view.concept_index.checked_sub(1)),
        })
    }
}
