//! Client-side review engine: concept grouping, optimistic review state,
//! the fullscreen viewer and image preloading.

pub mod concept;
pub mod debounce;
pub mod overrides;
pub mod preload;
pub mod session;
pub mod viewer;

pub use concept::{group_concepts, Concept, Variation};
pub use debounce::{Debouncer, NOTE_SAVE_DELAY};
pub use overrides::OverrideMap;
pub use preload::{HttpImageFetcher, ImageFetcher, PreloadError, Preloader};
pub use session::{
    GridCard, PendingCommit, PreloadTargets, ReviewBackend, ReviewError, ReviewSession, ViewerKey,
};
pub use viewer::{next_variation, previous_variation, Offset, Viewport};
