//! Session state: the contact being edited plus preview visibility.
//!
//! The back face is hidden in the preview; exporting has to reveal it for the
//! capture and hide it again afterwards. [`RevealGuard`] scopes that change so
//! the face is hidden again on every exit path, including errors and
//! cancellation.

use crate::contact::ContactRecord;
use crate::rendering::layout::{self, CardTemplate, FaceLayout};
use crate::rendering::Face;
use std::ops::Deref;
use std::path::PathBuf;

const EMPTY_PREVIEW_HINT: &str = "Gib deine Daten ein, um eine Vorschau zu sehen.";

/// Which faces the preview currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    front_visible: bool,
    back_visible: bool,
}

impl Default for Preview {
    fn default() -> Self {
        Self {
            front_visible: true,
            back_visible: false,
        }
    }
}

impl Preview {
    pub fn is_visible(&self, face: Face) -> bool {
        match face {
            Face::Front => self.front_visible,
            Face::Back => self.back_visible,
        }
    }

    fn set_visible(&mut self, face: Face, visible: bool) {
        match face {
            Face::Front => self.front_visible = visible,
            Face::Back => self.back_visible = visible,
        }
    }

    /// Make `face` visible until the returned guard is dropped.
    pub fn reveal(&mut self, face: Face) -> RevealGuard<'_> {
        let was_visible = self.is_visible(face);
        self.set_visible(face, true);
        RevealGuard {
            preview: self,
            face,
            was_visible,
        }
    }
}

/// Scoped visibility change; restores the previous state on drop.
#[must_use = "the face is hidden again as soon as the guard is dropped"]
pub struct RevealGuard<'a> {
    preview: &'a mut Preview,
    face: Face,
    was_visible: bool,
}

impl RevealGuard<'_> {
    /// Whether the face had to be toggled from hidden to visible
    pub fn was_revealed(&self) -> bool {
        !self.was_visible
    }
}

impl Deref for RevealGuard<'_> {
    type Target = Preview;

    fn deref(&self) -> &Preview {
        &*self.preview
    }
}

impl Drop for RevealGuard<'_> {
    fn drop(&mut self) {
        if !self.was_visible {
            self.preview.set_visible(self.face, false);
        }
    }
}

/// A contact record together with its preview state.
#[derive(Debug, Clone, Default)]
pub struct CardSession {
    pub record: ContactRecord,
    pub preview: Preview,
}

impl CardSession {
    pub fn new(record: ContactRecord) -> Self {
        Self {
            record,
            preview: Preview::default(),
        }
    }

    /// Layout of `face` as the preview currently shows it, `None` when the
    /// face is hidden or has nothing to show (front without a name).
    pub fn layout(
        record: &ContactRecord,
        preview: &Preview,
        face: Face,
        template: CardTemplate,
        logo: Option<&PathBuf>,
        qr_size_px: u32,
    ) -> Option<FaceLayout> {
        if !preview.is_visible(face) {
            return None;
        }
        match face {
            Face::Front => layout::layout_front(record, template, logo),
            Face::Back => Some(layout::layout_back(record, qr_size_px)),
        }
    }

    /// One-line description of what the preview shows
    pub fn preview_text(&self) -> String {
        if self.record.has_name() {
            self.record.full_name()
        } else {
            EMPTY_PREVIEW_HINT.to_string()
        }
    }
}
