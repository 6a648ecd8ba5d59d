//! Grid planner: a fixed 12-slot mockup of a 3-column profile feed.
//!
//! Slot position is the physical grid position. Slots are never inserted
//! or removed, only mutated in place or swapped, so the grid always holds
//! exactly [`SLOT_COUNT`] positions.

use std::sync::Arc;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::SourceFile;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of slots in the planner (4 rows of 3).
pub const SLOT_COUNT: usize = 12;

/// Columns in the rendered grid.
pub const GRID_COLUMNS: usize = 3;

/// Context sent to caption generation when the draft is empty.
pub const GENERIC_CAPTION_PROMPT: &str = "Write an engaging, aesthetic caption for this photo.";

/// Caption shown in the live preview when nothing (captioned) is hovered.
pub const DEFAULT_HOVER_CAPTION: &str = "Essential minimalism for your daily life. Discover our \
     new collection designed for modern living. #SimpleLiving #Kanagara";

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridSlot {
    pub id: String,
    pub url: Option<String>,
    #[serde(skip)]
    pub file: Option<Arc<SourceFile>>,
    pub caption: String,
    pub storage_path: Option<String>,
}

impl GridSlot {
    /// An empty slot for grid position `index`.
    pub fn empty(index: usize) -> Self {
        Self {
            id: default_slot_id(index),
            url: None,
            file: None,
            caption: String::new(),
            storage_path: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_none()
    }

    fn clear(&mut self) {
        self.url = None;
        self.file = None;
        self.caption.clear();
        self.storage_path = None;
    }
}

/// Stable default id of the slot created for position `index`.
pub fn default_slot_id(index: usize) -> String {
    format!("slot-{index}")
}

/// Where a drop on a slot originated.
#[derive(Debug, Clone)]
pub enum DropSource {
    /// A file dragged in from the operating system.
    ExternalFile(Arc<SourceFile>),
    /// The slot drag started with [`GridPlanner::start_slot_drag`].
    Slot,
}

/// Open caption editor: the slot being edited and its unsaved draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptionEditor {
    pub index: usize,
    pub draft: String,
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GridPlanner {
    slots: Vec<GridSlot>,
    dragged_index: Option<usize>,
    dragging_external_file: bool,
    hovered_url: Option<String>,
    caption_editor: Option<CaptionEditor>,
}

impl Default for GridPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl GridPlanner {
    pub fn new() -> Self {
        Self {
            slots: (0..SLOT_COUNT).map(GridSlot::empty).collect(),
            dragged_index: None,
            dragging_external_file: false,
            hovered_url: None,
            caption_editor: None,
        }
    }

    /// Replace every slot, e.g. with a grid fetched from persistence.
    pub fn restore(&mut self, slots: Vec<GridSlot>) -> Result<(), CoreError> {
        if slots.len() != SLOT_COUNT {
            return Err(CoreError::Validation(format!(
                "Planner grid must have exactly {SLOT_COUNT} slots, got {}",
                slots.len()
            )));
        }
        *self = Self {
            slots,
            ..Self::new()
        };
        Ok(())
    }

    pub fn slots(&self) -> &[GridSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Result<&GridSlot, CoreError> {
        check_index(index)?;
        Ok(&self.slots[index])
    }

    pub fn dragged_index(&self) -> Option<usize> {
        self.dragged_index
    }

    pub fn is_dragging_external_file(&self) -> bool {
        self.dragging_external_file
    }

    pub fn hovered_url(&self) -> Option<&str> {
        self.hovered_url.as_deref()
    }

    pub fn caption_editor(&self) -> Option<&CaptionEditor> {
        self.caption_editor.as_ref()
    }

    // -- slot content ---------------------------------------------------------

    /// Put `file` into a slot; the caption is left as it was.
    pub fn assign_file(&mut self, index: usize, file: Arc<SourceFile>) -> Result<&GridSlot, CoreError> {
        check_index(index)?;
        let slot = &mut self.slots[index];
        slot.url = Some(file.to_data_url());
        slot.file = Some(file);
        slot.storage_path = None;
        Ok(&self.slots[index])
    }

    /// Point a slot at durable storage after its file has been uploaded.
    pub fn set_storage(&mut self, index: usize, url: String, storage_path: String) -> Result<(), CoreError> {
        check_index(index)?;
        let slot = &mut self.slots[index];
        if self.hovered_url.is_some() && self.hovered_url == slot.url {
            self.hovered_url = Some(url.clone());
        }
        slot.url = Some(url);
        slot.storage_path = Some(storage_path);
        Ok(())
    }

    /// Reset one slot to empty without shifting any other slot.
    ///
    /// Returns the removed slot content. A live preview showing the removed
    /// image is cleared as well.
    pub fn remove_slot(&mut self, index: usize) -> Result<GridSlot, CoreError> {
        check_index(index)?;
        let removed = self.slots[index].clone();
        if removed.url.is_some() && self.hovered_url == removed.url {
            self.hovered_url = None;
        }
        self.slots[index].clear();
        Ok(removed)
    }

    /// Swap the full contents of two slots. Applying it twice is a no-op.
    pub fn reorder(&mut self, source: usize, target: usize) -> Result<(), CoreError> {
        check_index(source)?;
        check_index(target)?;
        self.slots.swap(source, target);
        Ok(())
    }

    /// Empty every slot and drop all transient state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // -- drag and drop --------------------------------------------------------

    pub fn start_slot_drag(&mut self, index: usize) -> Result<(), CoreError> {
        check_index(index)?;
        self.dragged_index = Some(index);
        Ok(())
    }

    pub fn start_external_file_drag(&mut self) {
        self.dragging_external_file = true;
    }

    pub fn end_external_file_drag(&mut self) {
        self.dragging_external_file = false;
    }

    /// Handle a drop on `target`.
    ///
    /// External files are assigned to the target slot; an internal drag
    /// swaps the dragged slot with the target.
    pub fn drop_on(&mut self, target: usize, source: DropSource) -> Result<(), CoreError> {
        check_index(target)?;
        match source {
            DropSource::ExternalFile(file) => {
                self.assign_file(target, file)?;
                self.dragging_external_file = false;
            }
            DropSource::Slot => {
                if let Some(dragged) = self.dragged_index.take() {
                    if dragged != target {
                        self.reorder(dragged, target)?;
                    }
                }
            }
        }
        Ok(())
    }

    // -- live preview ---------------------------------------------------------

    /// Sync the preview to a slot (or to nothing).
    pub fn hover(&mut self, index: Option<usize>) -> Result<(), CoreError> {
        self.hovered_url = match index {
            Some(i) => self.slot(i)?.url.clone(),
            None => None,
        };
        Ok(())
    }

    /// Caption of the hovered slot, or the default preview caption.
    pub fn hover_caption(&self) -> &str {
        self.hovered_url
            .as_deref()
            .and_then(|url| self.slots.iter().find(|s| s.url.as_deref() == Some(url)))
            .map(|s| s.caption.as_str())
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_HOVER_CAPTION)
    }

    // -- captions -------------------------------------------------------------

    /// Open the caption editor on a slot with its saved caption as draft.
    pub fn edit_caption(&mut self, index: usize) -> Result<&CaptionEditor, CoreError> {
        let draft = self.slot(index)?.caption.clone();
        let editor = self.caption_editor.insert(CaptionEditor { index, draft });
        Ok(&*editor)
    }

    pub fn set_draft(&mut self, text: impl Into<String>) -> Result<(), CoreError> {
        let editor = self.open_editor_mut()?;
        editor.draft = text.into();
        Ok(())
    }

    pub fn close_caption_editor(&mut self) {
        self.caption_editor = None;
    }

    /// Commit `text` as the caption of a slot. Closes the editor if it was
    /// open on that slot.
    pub fn save_caption(&mut self, index: usize, text: impl Into<String>) -> Result<(), CoreError> {
        check_index(index)?;
        self.slots[index].caption = text.into();
        if self.caption_editor.as_ref().is_some_and(|e| e.index == index) {
            self.caption_editor = None;
        }
        Ok(())
    }

    /// Commit the open editor's draft; returns the slot index it was saved to.
    pub fn save_draft(&mut self) -> Result<usize, CoreError> {
        let CaptionEditor { index, draft } = self
            .caption_editor
            .clone()
            .ok_or_else(|| CoreError::Conflict("No caption editor is open".into()))?;
        self.save_caption(index, draft)?;
        Ok(index)
    }

    /// Inputs for generating a caption for the slot being edited: the slot
    /// and the draft as context (or a generic prompt when empty).
    ///
    /// The slot is returned rather than its file because a slot restored
    /// from persistence only carries a URL.
    pub fn caption_request(&self, index: usize) -> Result<(GridSlot, String), CoreError> {
        let editor = self
            .caption_editor
            .as_ref()
            .filter(|e| e.index == index)
            .ok_or_else(|| CoreError::Conflict(format!("Caption editor is not open on slot {index}")))?;
        let slot = self.slot(index)?;
        if slot.is_empty() {
            return Err(CoreError::Validation(format!(
                "Slot {index} has no image to caption"
            )));
        }
        let context = if editor.draft.trim().is_empty() {
            GENERIC_CAPTION_PROMPT.to_string()
        } else {
            editor.draft.clone()
        };
        Ok((slot.clone(), context))
    }

    /// Overwrite the draft with a generated caption.
    ///
    /// Ignored (returns `false`) when the editor has since been closed or
    /// moved to another slot. The saved caption is never touched.
    pub fn apply_generated_caption(&mut self, index: usize, caption: String) -> bool {
        match self.caption_editor.as_mut() {
            Some(editor) if editor.index == index => {
                editor.draft = caption;
                true
            }
            _ => false,
        }
    }

    fn open_editor_mut(&mut self) -> Result<&mut CaptionEditor, CoreError> {
        self.caption_editor
            .as_mut()
            .ok_or_else(|| CoreError::Conflict("No caption editor is open".into()))
    }
}

fn check_index(index: usize) -> Result<(), CoreError> {
    if index < SLOT_COUNT {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Slot index {index} out of range (0..{SLOT_COUNT})"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> Arc<SourceFile> {
        SourceFile::new(name, "image/png", name.as_bytes().to_vec()).shared()
    }

    #[test]
    fn new_planner_has_twelve_empty_slots() {
        let planner = GridPlanner::new();
        assert_eq!(planner.slots().len(), SLOT_COUNT);
        assert!(planner.slots().iter().all(GridSlot::is_empty));
        assert_eq!(planner.slots()[7].id, "slot-7");
    }

    #[test]
    fn assign_keeps_existing_caption() {
        let mut planner = GridPlanner::new();
        planner.save_caption(2, "launch day").unwrap();
        planner.assign_file(2, file("a.png")).unwrap();
        let slot = planner.slot(2).unwrap();
        assert!(slot.url.is_some());
        assert_eq!(slot.caption, "launch day");
    }

    #[test]
    fn remove_clears_only_that_slot() {
        let mut planner = GridPlanner::new();
        planner.assign_file(0, file("a.png")).unwrap();
        planner.assign_file(1, file("b.png")).unwrap();
        planner.save_caption(0, "first").unwrap();

        planner.remove_slot(0).unwrap();
        assert!(planner.slot(0).unwrap().is_empty());
        assert_eq!(planner.slot(0).unwrap().caption, "");
        assert_eq!(planner.slot(0).unwrap().id, "slot-0");
        assert!(!planner.slot(1).unwrap().is_empty());
    }

    #[test]
    fn remove_clears_matching_hover_preview() {
        let mut planner = GridPlanner::new();
        planner.assign_file(4, file("a.png")).unwrap();
        planner.hover(Some(4)).unwrap();
        assert!(planner.hovered_url().is_some());

        planner.remove_slot(4).unwrap();
        assert!(planner.hovered_url().is_none());
        assert_eq!(planner.hover_caption(), DEFAULT_HOVER_CAPTION);
    }

    #[test]
    fn remove_other_slot_keeps_hover_preview() {
        let mut planner = GridPlanner::new();
        planner.assign_file(4, file("a.png")).unwrap();
        planner.assign_file(5, file("b.png")).unwrap();
        planner.hover(Some(4)).unwrap();
        planner.remove_slot(5).unwrap();
        assert!(planner.hovered_url().is_some());
    }

    #[test]
    fn reorder_twice_restores_arrangement() {
        let mut planner = GridPlanner::new();
        planner.assign_file(1, file("a.png")).unwrap();
        planner.assign_file(9, file("b.png")).unwrap();
        let before = planner.slots().to_vec();

        planner.reorder(1, 9).unwrap();
        assert_ne!(planner.slots(), before.as_slice());
        planner.reorder(1, 9).unwrap();
        assert_eq!(planner.slots(), before.as_slice());
    }

    #[test]
    fn swap_moves_captions_with_images() {
        let mut planner = GridPlanner::new();
        planner.assign_file(0, file("a.png")).unwrap();
        planner.save_caption(0, "caption A").unwrap();
        planner.assign_file(3, file("b.png")).unwrap();
        planner.save_caption(3, "caption B").unwrap();
        let url_a = planner.slot(0).unwrap().url.clone();
        let url_b = planner.slot(3).unwrap().url.clone();

        planner.start_slot_drag(0).unwrap();
        planner.drop_on(3, DropSource::Slot).unwrap();

        assert_eq!(planner.slot(0).unwrap().url, url_b);
        assert_eq!(planner.slot(0).unwrap().caption, "caption B");
        assert_eq!(planner.slot(3).unwrap().url, url_a);
        assert_eq!(planner.slot(3).unwrap().caption, "caption A");
        assert_eq!(planner.dragged_index(), None);
    }

    #[test]
    fn drop_on_same_slot_is_noop() {
        let mut planner = GridPlanner::new();
        planner.assign_file(2, file("a.png")).unwrap();
        let before = planner.slots().to_vec();
        planner.start_slot_drag(2).unwrap();
        planner.drop_on(2, DropSource::Slot).unwrap();
        assert_eq!(planner.slots(), before.as_slice());
    }

    #[test]
    fn external_drop_assigns_and_ends_file_drag() {
        let mut planner = GridPlanner::new();
        planner.start_external_file_drag();
        assert!(planner.is_dragging_external_file());

        planner.drop_on(6, DropSource::ExternalFile(file("c.png"))).unwrap();
        assert!(!planner.slot(6).unwrap().is_empty());
        assert!(!planner.is_dragging_external_file());
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut planner = GridPlanner::new();
        assert!(planner.reorder(0, SLOT_COUNT).is_err());
        assert!(planner.remove_slot(12).is_err());
        assert!(planner.assign_file(99, file("a.png")).is_err());
    }

    #[test]
    fn caption_editor_draft_round() {
        let mut planner = GridPlanner::new();
        planner.save_caption(1, "old").unwrap();
        assert_eq!(planner.edit_caption(1).unwrap().draft, "old");

        planner.set_draft("new").unwrap();
        assert_eq!(planner.slot(1).unwrap().caption, "old");

        assert_eq!(planner.save_draft().unwrap(), 1);
        assert_eq!(planner.slot(1).unwrap().caption, "new");
        assert!(planner.caption_editor().is_none());
    }

    #[test]
    fn caption_request_uses_draft_or_generic_prompt() {
        let mut planner = GridPlanner::new();
        planner.assign_file(0, file("a.png")).unwrap();
        planner.edit_caption(0).unwrap();

        let (_, context) = planner.caption_request(0).unwrap();
        assert_eq!(context, GENERIC_CAPTION_PROMPT);

        planner.set_draft("cozy desk setup").unwrap();
        let (_, context) = planner.caption_request(0).unwrap();
        assert_eq!(context, "cozy desk setup");
    }

    #[test]
    fn caption_request_requires_image() {
        let mut planner = GridPlanner::new();
        planner.edit_caption(0).unwrap();
        assert!(matches!(planner.caption_request(0), Err(CoreError::Validation(_))));
    }

    #[test]
    fn generated_caption_overwrites_draft_only() {
        let mut planner = GridPlanner::new();
        planner.save_caption(0, "saved").unwrap();
        planner.edit_caption(0).unwrap();

        assert!(planner.apply_generated_caption(0, "generated".into()));
        assert_eq!(planner.caption_editor().unwrap().draft, "generated");
        assert_eq!(planner.slot(0).unwrap().caption, "saved");
    }

    #[test]
    fn generated_caption_ignored_after_editor_closed() {
        let mut planner = GridPlanner::new();
        planner.edit_caption(0).unwrap();
        planner.close_caption_editor();
        assert!(!planner.apply_generated_caption(0, "late".into()));
    }

    #[test]
    fn hover_caption_prefers_slot_caption() {
        let mut planner = GridPlanner::new();
        planner.assign_file(3, file("a.png")).unwrap();
        planner.save_caption(3, "hovered caption").unwrap();
        planner.hover(Some(3)).unwrap();
        assert_eq!(planner.hover_caption(), "hovered caption");
    }

    #[test]
    fn restore_requires_full_grid() {
        let mut planner = GridPlanner::new();
        assert!(planner.restore(vec![GridSlot::empty(0)]).is_err());
        let mut slots: Vec<GridSlot> = (0..SLOT_COUNT).map(GridSlot::empty).collect();
        slots[5].url = Some("memory://x".into());
        planner.restore(slots).unwrap();
        assert!(!planner.slot(5).unwrap().is_empty());
    }
}
