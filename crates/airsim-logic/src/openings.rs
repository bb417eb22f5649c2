//! Passages and windows cut into the room.
//!
//! At most two of each kind. The first passage sits in the front wall
//! (`z = -0.5`), the second in the back wall (`z = +0.5`); the first
//! window in the left wall (`x = -0.5`), the second in the right wall
//! (`x = +0.5`). Sizes are fixed fractions of the face.
//!
//! The catalog feeds both the renderer (outlines) and the concentration
//! presets (counts). [`OpeningCatalog::revision`] changes on every
//! mutation so cached projections know when to rebuild.

use serde::{Deserialize, Serialize};

use crate::constants::openings::*;
use crate::geometry::{Axis, OpeningDefinition};

/// Kind of opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpeningKind {
    /// Doorway-like opening in the front/back wall.
    Passage,
    /// Window in a side wall.
    Window,
}

impl OpeningKind {
    /// Quad for the `slot`-th opening of this kind (0 or 1).
    pub fn definition(self, slot: u8) -> OpeningDefinition {
        let side = if slot == 0 { -1.0 } else { 1.0 };
        match self {
            OpeningKind::Passage => OpeningDefinition::on_face(
                Axis::Z,
                side,
                PASSAGE_WIDTH_FRACTION * 0.5,
                PASSAGE_HEIGHT_FRACTION * 0.5,
            ),
            OpeningKind::Window => OpeningDefinition::on_face(
                Axis::X,
                side,
                WINDOW_WIDTH_FRACTION * 0.5,
                WINDOW_HEIGHT_FRACTION * 0.5,
            ),
        }
    }
}

/// Current set of openings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpeningCatalog {
    passages: u8,
    windows: u8,
    #[serde(skip)]
    revision: u64,
}

impl OpeningCatalog {
    /// Catalog with the given counts, each clamped to `0..=2`.
    pub fn with_counts(passages: u8, windows: u8) -> Self {
        Self {
            passages: passages.min(MAX_PER_KIND),
            windows: windows.min(MAX_PER_KIND),
            revision: 0,
        }
    }

    pub fn passage_count(&self) -> u8 {
        self.passages
    }

    pub fn window_count(&self) -> u8 {
        self.windows
    }

    pub fn count(&self, kind: OpeningKind) -> u8 {
        match kind {
            OpeningKind::Passage => self.passages,
            OpeningKind::Window => self.windows,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Add one opening. Returns `false` if the kind is already at its cap.
    pub fn add(&mut self, kind: OpeningKind) -> bool {
        let slot = self.slot_mut(kind);
        if *slot >= MAX_PER_KIND {
            return false;
        }
        *slot += 1;
        self.revision += 1;
        true
    }

    /// Remove the most recently added opening. Returns `false` if none exist.
    pub fn remove(&mut self, kind: OpeningKind) -> bool {
        let slot = self.slot_mut(kind);
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        self.revision += 1;
        true
    }

    pub fn add_passage(&mut self) -> bool {
        self.add(OpeningKind::Passage)
    }

    pub fn remove_passage(&mut self) -> bool {
        self.remove(OpeningKind::Passage)
    }

    pub fn add_window(&mut self) -> bool {
        self.add(OpeningKind::Window)
    }

    pub fn remove_window(&mut self) -> bool {
        self.remove(OpeningKind::Window)
    }

    /// Visit every opening, passages first, in slot order.
    pub fn for_each_opening<F>(&self, mut visitor: F)
    where
        F: FnMut(OpeningKind, &OpeningDefinition),
    {
        for (kind, count) in [
            (OpeningKind::Passage, self.passages),
            (OpeningKind::Window, self.windows),
        ] {
            for slot in 0..count {
                visitor(kind, &kind.definition(slot));
            }
        }
    }

    fn slot_mut(&mut self, kind: OpeningKind) -> &mut u8 {
        match kind {
            OpeningKind::Passage => &mut self.passages,
            OpeningKind::Window => &mut self.windows,
        }
    }
}
