use super::image::NoteType;
use serde::{Deserialize, Serialize};

/// Committed review state of a single image.
///
/// The three persisted flags (`selected`, `revise`, `reject`) are mutually
/// exclusive, so an image is always in exactly one of these four states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewState {
    #[default]
    None,
    Selected,
    Revise,
    Reject,
}

/// A reviewer action. Every action is always available; invoking the action
/// matching the current state toggles the image back to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Select,
    Revise,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewFlags {
    pub selected: bool,
    pub revise: bool,
    pub reject: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewUpdateError {
    #[error("Only one of selected, revise or reject may be set")]
    ConflictingFlags,
}

impl ReviewAction {
    pub fn target(self) -> ReviewState {
        match self {
            ReviewAction::Select => ReviewState::Selected,
            ReviewAction::Revise => ReviewState::Revise,
            ReviewAction::Reject => ReviewState::Reject,
        }
    }
}

impl ReviewState {
    /// Rows written before the exclusivity rule may carry several flags;
    /// `selected` wins over `revise`, which wins over `reject`.
    pub fn from_flags(selected: bool, revise: bool, reject: bool) -> Self {
        if selected {
            ReviewState::Selected
        } else if revise {
            ReviewState::Revise
        } else if reject {
            ReviewState::Reject
        } else {
            ReviewState::None
        }
    }

    pub fn flags(self) -> ReviewFlags {
        ReviewFlags {
            selected: self == ReviewState::Selected,
            revise: self == ReviewState::Revise,
            reject: self == ReviewState::Reject,
        }
    }

    pub fn apply(self, action: ReviewAction) -> Self {
        let target = action.target();
        if self == target {
            ReviewState::None
        } else {
            target
        }
    }

    /// Which persisted note field a note written in this state belongs to.
    /// Notes written while selected are not persisted.
    pub fn note_type(self) -> Option<NoteType> {
        match self {
            ReviewState::Revise => Some(NoteType::ReviseNote),
            ReviewState::Reject => Some(NoteType::RejectNote),
            ReviewState::None | ReviewState::Selected => None,
        }
    }
}

impl From<ReviewFlags> for ReviewState {
    fn from(flags: ReviewFlags) -> Self {
        ReviewState::from_flags(flags.selected, flags.revise, flags.reject)
    }
}

/// Resolves a partial flag update against the committed state.
///
/// A single flag sent as `true` toggles that action. Flags sent as `false`
/// only clear themselves. Absent flags leave the state alone.
pub fn resolve_flag_update(
    current: ReviewState,
    selected: Option<bool>,
    revise: Option<bool>,
    reject: Option<bool>,
) -> Result<ReviewState, ReviewUpdateError> {
    let requested = [
        (selected, ReviewAction::Select),
        (revise, ReviewAction::Revise),
        (reject, ReviewAction::Reject),
    ];

    let mut actions = requested
        .iter()
        .filter(|(value, _)| *value == Some(true))
        .map(|(_, action)| *action);

    match (actions.next(), actions.next()) {
        (Some(_), Some(_)) => Err(ReviewUpdateError::ConflictingFlags),
        (Some(action), None) => Ok(current.apply(action)),
        (None, _) => {
            let cleared = requested
                .iter()
                .any(|(value, action)| *value == Some(false) && action.target() == current);
            Ok(if cleared { ReviewState::None } else { current })
        }
    }
}
