//! Fullscreen viewer math: wheel zoom, drag-to-pan and the variation
//! carousel.

use super::concept::Concept;

pub const ZOOM_STEP: f64 = 0.2;
pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    scale: f64,
    offset: Offset,
    drag_anchor: Option<Offset>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: MIN_SCALE,
            offset: Offset::default(),
            drag_anchor: None,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn is_zoomed(&self) -> bool {
        self.scale > MIN_SCALE
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Wheel event; negative `delta_y` (wheel up) zooms in. Zooming out pulls
    /// the pan offset toward the center so scale 1 always ends centered.
    pub fn wheel(&mut self, delta_y: f64) {
        let step = if -delta_y > 0.0 { ZOOM_STEP } else { -ZOOM_STEP };
        // Round to the step grid so repeated steps land exactly on the bounds
        let new_scale = (((self.scale + step) * 10.0).round() / 10.0).clamp(MIN_SCALE, MAX_SCALE);

        if new_scale < self.scale {
            let factor = (new_scale - 1.0) / (self.scale - 1.0);
            self.offset.x *= factor;
            self.offset.y *= factor;
        }

        self.scale = new_scale;
    }

    /// Drags only start while zoomed in.
    pub fn start_drag(&mut self, pointer_x: f64, pointer_y: f64) -> bool {
        if !self.is_zoomed() {
            return false;
        }
        self.drag_anchor = Some(Offset {
            x: pointer_x - self.offset.x,
            y: pointer_y - self.offset.y,
        });
        true
    }

    pub fn drag_to(&mut self, pointer_x: f64, pointer_y: f64) {
        if let (Some(anchor), true) = (self.drag_anchor, self.is_zoomed()) {
            self.offset = Offset {
                x: pointer_x - anchor.x,
                y: pointer_y - anchor.y,
            };
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Carousel step to the right. `current` is `None` while the main image is
/// shown. Right from main goes to the first alternate, right from the last
/// alternate returns to main.
pub fn next_variation(concept: &Concept, current: Option<&str>) -> Option<String> {
    let alternates = concept.alternates();
    match position(concept, current) {
        None => alternates.first().map(|v| v.id.clone()),
        Some(index) if index + 1 == alternates.len() => None,
        Some(index) => Some(alternates[index + 1].id.clone()),
    }
}

/// Carousel step to the left, mirroring [`next_variation`].
pub fn previous_variation(concept: &Concept, current: Option<&str>) -> Option<String> {
    let alternates = concept.alternates();
    match position(concept, current) {
        None => alternates.last().map(|v| v.id.clone()),
        Some(0) => None,
        Some(index) => Some(alternates[index - 1].id.clone()),
    }
}

fn position(concept: &Concept, current: Option<&str>) -> Option<usize> {
    let current = current?;
    concept.alternates().iter().position(|v| v.id == current)
}
