use super::double_option;
use super::review::ReviewState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    pub url: String,
    pub project_id: String,
    pub selected: bool,
    pub revise: bool,
    pub reject: bool,
    pub revise_note: Option<String>,
    pub reject_note: Option<String>,
    pub reel_note: Option<String>,
    #[serde(default)]
    pub variations: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Image {
    pub fn review_state(&self) -> ReviewState {
        ReviewState::from_flags(self.selected, self.revise, self.reject)
    }

    pub fn set_review_state(&mut self, state: ReviewState) {
        let flags = state.flags();
        self.selected = flags.selected;
        self.revise = flags.revise;
        self.reject = flags.reject;
    }

    pub fn note(&self, note_type: NoteType) -> Option<&str> {
        match note_type {
            NoteType::ReviseNote => self.revise_note.as_deref(),
            NoteType::RejectNote => self.reject_note.as_deref(),
            NoteType::ReelNote => self.reel_note.as_deref(),
        }
    }
}

// The variations column holds a JSON array of URLs.
impl<'r> FromRow<'r, SqliteRow> for Image {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let variations: String = row.try_get("variations")?;
        let variations = serde_json::from_str(&variations).map_err(|e| {
            sqlx::Error::ColumnDecode {
                index: "variations".to_string(),
                source: Box::new(e),
            }
        })?;

        Ok(Image {
            id: row.try_get("id")?,
            url: row.try_get("url")?,
            project_id: row.try_get("project_id")?,
            selected: row.try_get("selected")?,
            revise: row.try_get("revise")?,
            reject: row.try_get("reject")?,
            revise_note: row.try_get("revise_note")?,
            reject_note: row.try_get("reject_note")?,
            reel_note: row.try_get("reel_note")?,
            variations,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Compact view of an image embedded in project listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub id: String,
    pub url: String,
    pub selected: bool,
    pub revise: bool,
    pub reject: bool,
}

impl From<&Image> for ImageSummary {
    fn from(image: &Image) -> Self {
        ImageSummary {
            id: image.id.clone(),
            url: image.url.clone(),
            selected: image.selected,
            revise: image.revise,
            reject: image.reject,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteType {
    #[serde(rename = "reviseNote")]
    ReviseNote,
    #[serde(rename = "rejectNote")]
    RejectNote,
    #[serde(rename = "reelNote")]
    ReelNote,
}

impl NoteType {
    pub fn as_str(self) -> &'static str {
        match self {
            NoteType::ReviseNote => "reviseNote",
            NoteType::RejectNote => "rejectNote",
            NoteType::ReelNote => "reelNote",
        }
    }
}

impl std::str::FromStr for NoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reviseNote" => Ok(NoteType::ReviseNote),
            "rejectNote" => Ok(NoteType::RejectNote),
            "reelNote" => Ok(NoteType::ReelNote),
            other => Err(format!("Unknown note type: {}", other)),
        }
    }
}

// Request models

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImageRequest {
    pub url: Option<String>,
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variations: Vec<String>,
}

/// Partial update of an image. Absent keys are left untouched; note keys
/// present as `null` clear the note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revise: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub revise_note: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub reject_note: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub reel_note: Option<Option<String>>,
}

impl ImageUpdate {
    /// Update that moves an image to `state` when sent as a single action.
    pub fn for_state(state: ReviewState) -> Self {
        let flags = state.flags();
        ImageUpdate {
            selected: Some(flags.selected),
            revise: Some(flags.revise),
            reject: Some(flags.reject),
            ..Default::default()
        }
    }

    pub fn with_note(mut self, note_type: NoteType, content: Option<String>) -> Self {
        match note_type {
            NoteType::ReviseNote => self.revise_note = Some(content),
            NoteType::RejectNote => self.reject_note = Some(content),
            NoteType::ReelNote => self.reel_note = Some(content),
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteUpdateRequest {
    #[serde(rename = "type")]
    pub note_type: Option<String>,
    pub content: Option<String>,
}

// Repository models

#[derive(Debug, Clone)]
pub struct NewImage {
    pub url: String,
    pub project_id: String,
    pub variations: Vec<String>,
}

/// Field-by-field changes applied by the image repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageChanges {
    pub review_state: Option<ReviewState>,
    pub revise_note: Option<Option<String>>,
    pub reject_note: Option<Option<String>>,
    pub reel_note: Option<Option<String>>,
}

impl ImageChanges {
    pub fn apply_to(&self, image: &mut Image) {
        if let Some(state) = self.review_state {
            image.set_review_state(state);
        }
        if let Some(note) = &self.revise_note {
            image.revise_note = note.clone();
        }
        if let Some(note) = &self.reject_note {
            image.reject_note = note.clone();
        }
        if let Some(note) = &self.reel_note {
            image.reel_note = note.clone();
        }
    }
}
