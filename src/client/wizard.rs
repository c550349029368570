//! Project-creation wizard model: name, purpose, image quantity, visual
//! focus and a list of concept drafts, submitted as one `POST /api/projects`.

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::api::{ApiClient, ClientError};
use crate::models::{CreateProjectRequest, Project};

pub const DEFAULT_QUANTITY: u32 = 5;
pub const MAX_QUANTITY: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualFocus {
    Product,
    Model,
    Graphic,
    Lifestyle,
}

impl VisualFocus {
    pub const ALL: [VisualFocus; 4] = [
        VisualFocus::Product,
        VisualFocus::Model,
        VisualFocus::Graphic,
        VisualFocus::Lifestyle,
    ];

    pub fn id(self) -> &'static str {
        match self {
            VisualFocus::Product => "product",
            VisualFocus::Model => "model",
            VisualFocus::Graphic => "graphic",
            VisualFocus::Lifestyle => "lifestyle",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VisualFocus::Product => "Product-Focused",
            VisualFocus::Model => "Model/People-Centric",
            VisualFocus::Graphic => "Graphic/Text-Heavy",
            VisualFocus::Lifestyle => "Lifestyle/UGC Inspired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptDraft {
    #[serde(skip)]
    pub id: String,
    pub images: Vec<String>,
    pub inspo_links: Vec<String>,
    pub notes: String,
}

impl ConceptDraft {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            images: Vec::new(),
            inspo_links: Vec::new(),
            notes: String::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Please enter a project name")]
    MissingName,
    #[error("Please select a focus")]
    MissingPurpose,
    #[error("Please select a visual style")]
    MissingFocus,
    #[error("Failed to create project: {0}")]
    Submit(#[from] ClientError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub purpose: String,
    pub focus: Option<VisualFocus>,
    quantity: u32,
    concepts: Vec<ConceptDraft>,
    expanded: Option<String>,
}

impl Default for ProjectDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectDraft {
    /// Starts with a single empty concept, expanded.
    pub fn new() -> Self {
        let mut draft = Self {
            name: String::new(),
            purpose: String::new(),
            focus: None,
            quantity: DEFAULT_QUANTITY,
            concepts: Vec::new(),
            expanded: None,
        };
        draft.add_concept();
        draft
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.clamp(1, MAX_QUANTITY);
    }

    pub fn increment_quantity(&mut self) {
        self.set_quantity(self.quantity.saturating_add(1));
    }

    pub fn decrement_quantity(&mut self) {
        self.set_quantity(self.quantity.saturating_sub(1));
    }

    pub fn concepts(&self) -> &[ConceptDraft] {
        &self.concepts
    }

    pub fn expanded(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    /// Appends an empty concept and makes it the expanded one.
    pub fn add_concept(&mut self) -> &str {
        let concept = ConceptDraft::new();
        self.expanded = Some(concept.id.clone());
        self.concepts.push(concept);
        &self.concepts[self.concepts.len() - 1].id
    }

    /// Removing the expanded concept expands the last remaining one.
    pub fn remove_concept(&mut self, id: &str) {
        self.concepts.retain(|c| c.id != id);
        if self.expanded.as_deref() == Some(id) {
            self.expanded = self.concepts.last().map(|c| c.id.clone());
        }
    }

    pub fn concept_mut(&mut self, id: &str) -> Option<&mut ConceptDraft> {
        self.concepts.iter_mut().find(|c| c.id == id)
    }

    pub fn toggle_expansion(&mut self, id: &str) {
        if self.expanded.as_deref() == Some(id) {
            self.expanded = None;
        } else {
            self.expanded = Some(id.to_string());
        }
    }

    pub fn validate(&self) -> Result<VisualFocus, WizardError> {
        if self.name.trim().is_empty() {
            return Err(WizardError::MissingName);
        }
        if self.purpose.trim().is_empty() {
            return Err(WizardError::MissingPurpose);
        }
        self.focus.ok_or(WizardError::MissingFocus)
    }

    /// Builds the create request; the purpose doubles as the description.
    pub fn to_request(&self, user_id: Option<&str>) -> Result<CreateProjectRequest, WizardError> {
        let focus = self.validate()?;

        Ok(CreateProjectRequest {
            name: Some(self.name.trim().to_string()),
            description: Some(self.purpose.clone()),
            user_id: user_id.map(str::to_string),
            purpose: Some(self.purpose.clone()),
            focus: Some(focus.id().to_string()),
            quantity: Some(self.quantity),
            concepts: Some(json!(self.concepts)),
        })
    }

    /// Creates the project and resets the draft on success. Without a user
    /// id the server assigns an owner.
    pub async fn submit(
        &mut self,
        client: &ApiClient,
        user_id: Option<&str>,
    ) -> Result<Project, WizardError> {
        let request = self.to_request(user_id)?;
        let project = client.create_project(&request).await?;
        tracing::info!("Project created: {}", project.id);

        *self = ProjectDraft::new();
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_draft_has_one_expanded_concept() {
        let draft = ProjectDraft::new();
        assert_eq!(draft.concepts().len(), 1);
        assert_eq!(draft.expanded(), Some(draft.concepts()[0].id.as_str()));
        assert_eq!(draft.quantity(), DEFAULT_QUANTITY);
    }

    #[test]
    fn test_removing_expanded_concept_expands_last() {
        let mut draft = ProjectDraft::new();
        let first = draft.concepts()[0].id.clone();
        let second = draft.add_concept().to_string();
        let third = draft.add_concept().to_string();

        draft.toggle_expansion(&second);
        draft.remove_concept(&second);
        assert_eq!(draft.expanded(), Some(third.as_str()));

        draft.remove_concept(&first);
        assert_eq!(draft.expanded(), Some(third.as_str()));
        assert_eq!(draft.concepts().len(), 1);
    }

    #[test]
    fn test_toggle_expansion_collapses() {
        let mut draft = ProjectDraft::new();
        let id = draft.concepts()[0].id.clone();
        draft.toggle_expansion(&id);
        assert_eq!(draft.expanded(), None);
        draft.toggle_expansion(&id);
        assert_eq!(draft.expanded(), Some(id.as_str()));
    }

    #[test]
    fn test_quantity_is_clamped() {
        let mut draft = ProjectDraft::new();
        draft.set_quantity(1);
        draft.decrement_quantity();
        assert_eq!(draft.quantity(), 1);

        draft.set_quantity(MAX_QUANTITY);
        draft.increment_quantity();
        assert_eq!(draft.quantity(), MAX_QUANTITY);
    }

    #[test]
    fn test_validation_order() {
        let mut draft = ProjectDraft::new();
        assert!(matches!(draft.validate(), Err(WizardError::MissingName)));

        draft.name = "Spring drop".to_string();
        assert!(matches!(draft.validate(), Err(WizardError::MissingPurpose)));

        draft.purpose = "Launch".to_string();
        assert!(matches!(draft.validate(), Err(WizardError::MissingFocus)));

        draft.focus = Some(VisualFocus::Lifestyle);
        assert_eq!(draft.validate().unwrap(), VisualFocus::Lifestyle);
    }

    #[test]
    fn test_request_carries_wizard_fields() {
        let mut draft = ProjectDraft::new();
        draft.name = "  Spring drop ".to_string();
        draft.purpose = "Launch".to_string();
        draft.focus = Some(VisualFocus::Product);
        let id = draft.concepts()[0].id.clone();
        draft.concept_mut(&id).unwrap().notes = "gold tones".to_string();

        let request = draft.to_request(Some("u1")).unwrap();
        assert_eq!(request.name.as_deref(), Some("Spring drop"));
        assert_eq!(request.description.as_deref(), Some("Launch"));
        assert_eq!(request.focus.as_deref(), Some("product"));
        assert_eq!(request.quantity, Some(DEFAULT_QUANTITY));
        assert_eq!(
            request.concepts,
            Some(json!([{ "images": [], "inspoLinks": [], "notes": "gold tones" }]))
        );
    }
}
