use std::collections::HashMap;

use crate::models::{ReviewAction, ReviewState};

/// Optimistic review states keyed by image id.
///
/// A local toggle records an override that wins over the committed state.
/// The override is dropped once the commit for that id settles, whether it
/// succeeded or not; the committed state is authoritative afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideMap {
    overrides: HashMap<String, ReviewState>,
}

impl OverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<ReviewState> {
        self.overrides.get(id).copied()
    }

    pub fn effective(&self, id: &str, committed: ReviewState) -> ReviewState {
        self.get(id).unwrap_or(committed)
    }

    /// Applies `action` on top of what the user currently sees and records
    /// the result.
    pub fn toggle(&mut self, id: &str, committed: ReviewState, action: ReviewAction) -> ReviewState {
        let next = self.effective(id, committed).apply(action);
        self.overrides.insert(id.to_string(), next);
        next
    }

    pub fn settle(&mut self, id: &str) -> Option<ReviewState> {
        self.overrides.remove(id)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}
