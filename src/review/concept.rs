use crate::models::{Image, ReviewState};

const EXTRA_VARIATION_MARKER: &str = "-extra-variation-";

/// One reviewable picture within a concept.
#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    pub id: String,
    pub url: String,
    pub note: String,
    pub state: ReviewState,
}

impl Variation {
    fn from_image(image: &Image) -> Self {
        let state = image.review_state();
        Variation {
            id: image.id.clone(),
            url: image.url.clone(),
            note: state
                .note_type()
                .and_then(|note_type| image.note(note_type))
                .unwrap_or_default()
                .to_string(),
            state,
        }
    }

    fn extra(image_id: &str, index: usize, url: &str) -> Self {
        Variation {
            id: extra_variation_id(image_id, index),
            url: url.to_string(),
            note: String::new(),
            state: ReviewState::None,
        }
    }

    /// Whether this variation exists server-side.
    pub fn is_persisted(&self) -> bool {
        !is_extra_variation(&self.id)
    }
}

/// Images sharing a directory, shown as one grid card.
///
/// `variations[0]` is the main image and its id is the concept id.
#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    pub id: String,
    pub name: String,
    pub directory_path: String,
    pub variations: Vec<Variation>,
    pub selected_variation_id: Option<String>,
}

impl Concept {
    pub fn main(&self) -> &Variation {
        &self.variations[0]
    }

    /// Everything but the main image, in carousel order.
    pub fn alternates(&self) -> &[Variation] {
        &self.variations[1..]
    }

    pub fn variation(&self, id: &str) -> Option<&Variation> {
        self.variations.iter().find(|v| v.id == id)
    }

    pub fn variation_mut(&mut self, id: &str) -> Option<&mut Variation> {
        self.variations.iter_mut().find(|v| v.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.variation(id).is_some()
    }

    /// The variation the grid shows for this concept.
    pub fn representative(&self) -> &Variation {
        self.selected_variation_id
            .as_deref()
            .and_then(|id| self.variation(id))
            .unwrap_or_else(|| self.main())
    }

    /// Choosing the main image clears the selection.
    pub fn select_variation(&mut self, variation_id: Option<&str>) {
        self.selected_variation_id = variation_id
            .filter(|id| *id != self.id && self.contains(id))
            .map(str::to_string);
    }

    /// Replaces a variation's committed state with the server's copy.
    pub fn apply_committed(&mut self, image: &Image) -> bool {
        match self.variation_mut(&image.id) {
            Some(variation) => {
                variation.state = image.review_state();
                true
            }
            None => false,
        }
    }
}

pub fn extra_variation_id(image_id: &str, index: usize) -> String {
    format!("{}{}{}", image_id, EXTRA_VARIATION_MARKER, index)
}

pub fn is_extra_variation(id: &str) -> bool {
    id.contains(EXTRA_VARIATION_MARKER)
}

/// `/images/<dir>/<file>` -> `<dir>`. URLs with fewer segments group by the
/// whole URL.
pub fn concept_directory(url: &str) -> &str {
    url.split('/').nth(2).filter(|s| !s.is_empty()).unwrap_or(url)
}

/// Groups images by directory, keeping the order in which directories first
/// appear. The first image of each group is the main image; its stored
/// variation URLs become extra, never-persisted variations.
pub fn group_concepts(images: &[Image]) -> Vec<Concept> {
    let mut groups: Vec<(&str, Vec<&Image>)> = Vec::new();
    for image in images {
        let dir = concept_directory(&image.url);
        match groups.iter_mut().find(|(name, _)| *name == dir) {
            Some((_, members)) => members.push(image),
            None => groups.push((dir, vec![image])),
        }
    }

    groups
        .into_iter()
        .map(|(dir, members)| {
            let first = members[0];
            let mut variations: Vec<Variation> =
                members.iter().map(|image| Variation::from_image(image)).collect();
            variations.extend(
                first
                    .variations
                    .iter()
                    .enumerate()
                    .map(|(index, url)| Variation::extra(&first.id, index, url)),
            );

            Concept {
                id: first.id.clone(),
                name: dir.to_string(),
                directory_path: format!("/images/{}", dir),
                variations,
                selected_variation_id: None,
            }
        })
        .collect()
}
