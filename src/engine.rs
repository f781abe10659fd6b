//! Interaction engine: turns pointer and keyboard input into sticker changes.
//!
//! `EngineCore` owns the sticker store, the UI state and the single active
//! `InteractionState`. Every handler runs to completion and returns the
//! `Action`s the host must carry out (persist, delete remotely, redraw). The
//! engine never talks to the network itself.
//!
//! Every mutation goes through a grant minted from the session's
//! `Capabilities`; a role without the capability gets `None` and the handler
//! returns without touching the store.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::{debug, warn};

use crate::consts::{MIN_CREATE_SIZE, MIN_RESIZE_SIZE};
use crate::doc::{CommitOutcome, NewSticker, Sticker, StickerId, StickerPatch, StickerStore};
use crate::geom::{Point, Rect};
use crate::hit::{Hit, HitPart, hit_test};
use crate::input::{CursorStyle, InteractionState, Key, ResizeHandle, Tool, UiState};
use crate::permission::{BoardRole, Capabilities, capabilities};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Persist this sticker: create it when its id is temporary, update it
    /// otherwise.
    PersistSticker(Sticker),
    /// Delete a sticker on the backend.
    DeleteSticker { id: String },
    /// Local state changed; redraw.
    RenderNeeded,
}

/// Core engine state for one board.
pub struct EngineCore {
    pub store: StickerStore,
    pub ui: UiState,
    pub interaction: InteractionState,
    role: BoardRole,
    caps: Capabilities,
    /// Persist drag/resize geometry on every pointer-move instead of only on
    /// release.
    pub stream_motion: bool,
}

impl EngineCore {
    #[must_use]
    pub fn new(board_id: impl Into<String>, role: BoardRole) -> Self {
        Self {
            store: StickerStore::new(board_id),
            ui: UiState::default(),
            interaction: InteractionState::Idle,
            role,
            caps: capabilities(role),
            stream_motion: false,
        }
    }

    // --- Data inputs ---

    /// Hydrate the store from a fetched board. Resets selection and any gesture.
    pub fn load(&mut self, stickers: Vec<Sticker>) {
        self.store.load(stickers);
        self.ui.selected = None;
        self.interaction = InteractionState::Idle;
    }

    /// Reconcile a provisional sticker with the record the backend created.
    pub fn commit_create(&mut self, temp: &StickerId, persisted: Sticker) -> Vec<Action> {
        let Some(grant) = self.caps.create_grant() else {
            return Vec::new();
        };
        match self.store.commit_create(&grant, temp, persisted) {
            CommitOutcome::Committed { id, resync } => {
                self.retarget(temp, &id);
                let mut actions = vec![Action::RenderNeeded];
                if resync {
                    if let Some(sticker) = self.store.get(&id) {
                        actions.push(Action::PersistSticker(sticker.clone()));
                    }
                }
                actions
            }
            CommitOutcome::Orphaned { id } => {
                debug!(%temp, %id, "created sticker was deleted locally; removing remote copy");
                id.as_permanent()
                    .map(|id| vec![Action::DeleteSticker { id: id.to_string() }])
                    .unwrap_or_default()
            }
            CommitOutcome::Unknown => Vec::new(),
        }
    }

    /// A create request failed. The provisional sticker stays on the board
    /// under its temporary id and is not persisted again.
    pub fn create_failed(&mut self, temp: &StickerId) -> Vec<Action> {
        let Some(grant) = self.caps.create_grant() else {
            return Vec::new();
        };
        if self.store.fail_create(&grant, temp) {
            debug!(%temp, "provisional sticker kept local-only");
        }
        Vec::new()
    }

    // --- Direct UI commands ---

    /// Switch tools. Roles that cannot create may only use the cursor.
    pub fn set_tool(&mut self, tool: Tool) -> bool {
        if tool == Tool::Sticker && !self.caps.can_create() {
            debug!(role = self.role.as_str(), "sticker tool refused");
            return false;
        }
        self.ui.tool = tool;
        true
    }

    /// Choose the active color; the selected sticker, if any, takes it too.
    pub fn set_active_color(&mut self, color: &str) -> Vec<Action> {
        let Some(grant) = self.caps.mutate_grant() else {
            return Vec::new();
        };
        self.ui.active_color = color.to_string();
        let Some(id) = self.ui.selected.clone() else {
            return Vec::new();
        };
        match self.store.update(&grant, &id, &StickerPatch::color(color)) {
            Some(sticker) => changed(sticker),
            None => Vec::new(),
        }
    }

    /// Replace a sticker's text.
    pub fn set_text(&mut self, id: &StickerId, text: &str) -> Vec<Action> {
        let Some(grant) = self.caps.mutate_grant() else {
            debug!(role = self.role.as_str(), "text edit refused");
            return Vec::new();
        };
        match self.store.update(&grant, id, &StickerPatch::text(text)) {
            Some(sticker) => changed(sticker),
            None => Vec::new(),
        }
    }

    /// Record whether a text field currently has keyboard focus.
    pub fn set_text_focus(&mut self, focused: bool) {
        self.ui.text_focused = focused;
    }

    /// Delete a sticker (delete button or key).
    pub fn delete(&mut self, id: &StickerId) -> Vec<Action> {
        let Some(grant) = self.caps.delete_grant() else {
            debug!(role = self.role.as_str(), "delete refused");
            return Vec::new();
        };
        let Some(removed) = self.store.remove(&grant, id) else {
            return Vec::new();
        };
        self.forget(id);
        let mut actions = vec![Action::RenderNeeded];
        if let Some(id) = removed.id.as_permanent() {
            actions.push(Action::DeleteSticker { id: id.to_string() });
        }
        actions
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, pt: Point) -> Vec<Action> {
        if !self.interaction.is_idle() {
            warn!(state = ?self.interaction, "pointer-down during an active interaction; ignored");
            return Vec::new();
        }

        match hit_test(pt, &self.store, self.ui.selected.as_ref(), self.caps.can_mutate()) {
            Some(Hit { sticker_id, part: HitPart::ResizeHandle(handle) }) => self.begin_resize(sticker_id, handle, pt),
            Some(Hit { sticker_id, part: HitPart::Body }) => {
                let actions = self.select(&sticker_id);
                if self.ui.tool == Tool::Cursor {
                    self.begin_drag(sticker_id, pt);
                }
                actions
            }
            None => {
                if self.ui.tool == Tool::Sticker {
                    self.begin_create(pt)
                } else {
                    self.clear_selection()
                }
            }
        }
    }

    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        if !pt.is_finite() {
            debug!(state = ?self.interaction, "non-finite pointer-move ignored");
            return Vec::new();
        }
        let (target, rect) = match &self.interaction {
            InteractionState::Idle => return Vec::new(),
            InteractionState::Creating { target, anchor } => {
                let Some(grant) = self.caps.create_grant() else {
                    return Vec::new();
                };
                if !self.store.shape_provisional(&grant, target, creation_rect(*anchor, pt)) {
                    self.interaction = InteractionState::Idle;
                }
                return vec![Action::RenderNeeded];
            }
            InteractionState::Dragging { target, anchor, origin } => (target.clone(), drag_rect(*origin, *anchor, pt)),
            InteractionState::Resizing { target, handle, anchor, origin } => {
                (target.clone(), resize_rect(*origin, *handle, *anchor, pt))
            }
        };

        let Some(grant) = self.caps.mutate_grant() else {
            return Vec::new();
        };
        let Some(sticker) = self.store.update(&grant, &target, &StickerPatch::geometry(rect)) else {
            self.interaction = InteractionState::Idle;
            return Vec::new();
        };
        let mut actions = vec![Action::RenderNeeded];
        if self.stream_motion {
            actions.extend(persist_if_permanent(sticker));
        }
        actions
    }

    pub fn on_pointer_up(&mut self, pt: Point) -> Vec<Action> {
        match std::mem::take(&mut self.interaction) {
            InteractionState::Idle => Vec::new(),
            InteractionState::Dragging { target, origin, .. } | InteractionState::Resizing { target, origin, .. }
                if !pt.is_finite() =>
            {
                self.cancel_geometry(&target, origin)
            }
            InteractionState::Dragging { target, anchor, origin } => {
                self.finish_geometry(&target, origin, drag_rect(origin, anchor, pt))
            }
            InteractionState::Resizing { target, handle, anchor, origin } => {
                self.finish_geometry(&target, origin, resize_rect(origin, handle, anchor, pt))
            }
            InteractionState::Creating { target, anchor } => self.finish_create(&target, anchor, pt),
        }
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        if !key.is_delete() || self.ui.text_focused {
            return Vec::new();
        }
        let Some(selected) = self.ui.selected.clone() else {
            return Vec::new();
        };
        let mut actions = self.delete(&selected);
        if actions.is_empty() {
            return actions;
        }
        // The key always ends the gesture; a sticker still being drawn is dropped.
        if let InteractionState::Creating { target, .. } = &self.interaction {
            let target = target.clone();
            actions.extend(self.discard_provisional(&target));
        }
        self.interaction = InteractionState::Idle;
        actions
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> Option<&StickerId> {
        self.ui.selected.as_ref()
    }

    #[must_use]
    pub fn stickers(&self) -> &[Sticker] {
        self.store.all()
    }

    #[must_use]
    pub fn sticker(&self, id: &StickerId) -> Option<&Sticker> {
        self.store.get(id)
    }

    #[must_use]
    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    #[must_use]
    pub fn role(&self) -> BoardRole {
        self.role
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.ui.tool
    }

    /// Pointer affordance for the current tool and gesture.
    #[must_use]
    pub fn cursor(&self) -> CursorStyle {
        match &self.interaction {
            InteractionState::Dragging { .. } => CursorStyle::Move,
            InteractionState::Resizing { handle: ResizeHandle::TopLeft | ResizeHandle::BottomRight, .. } => {
                CursorStyle::ResizeNwse
            }
            InteractionState::Resizing { .. } => CursorStyle::ResizeNesw,
            InteractionState::Creating { .. } => CursorStyle::Crosshair,
            InteractionState::Idle if self.ui.tool == Tool::Sticker => CursorStyle::Crosshair,
            InteractionState::Idle => CursorStyle::Default,
        }
    }

    // --- Transitions ---

    fn begin_drag(&mut self, target: StickerId, anchor: Point) {
        if !self.caps.can_mutate() {
            return;
        }
        let Some(sticker) = self.store.get(&target) else {
            return;
        };
        self.interaction = InteractionState::Dragging { origin: sticker.rect(), target, anchor };
    }

    fn begin_resize(&mut self, target: StickerId, handle: ResizeHandle, anchor: Point) -> Vec<Action> {
        if !self.caps.can_mutate() {
            return Vec::new();
        }
        let Some(sticker) = self.store.get(&target) else {
            return Vec::new();
        };
        self.interaction = InteractionState::Resizing { origin: sticker.rect(), target, handle, anchor };
        Vec::new()
    }

    fn begin_create(&mut self, anchor: Point) -> Vec<Action> {
        let Some(grant) = self.caps.create_grant() else {
            return Vec::new();
        };
        let target = self.store.create_local(
            &grant,
            NewSticker {
                rect: Rect::new(anchor.x, anchor.y, 0.0, 0.0),
                text: String::new(),
                color: self.ui.active_color.clone(),
            },
        );
        self.interaction = InteractionState::Creating { target, anchor };
        vec![Action::RenderNeeded]
    }

    fn finish_geometry(&mut self, target: &StickerId, origin: Rect, rect: Rect) -> Vec<Action> {
        let Some(grant) = self.caps.mutate_grant() else {
            return Vec::new();
        };
        let Some(sticker) = self.store.update(&grant, target, &StickerPatch::geometry(rect)) else {
            return Vec::new();
        };
        if rect == origin {
            return Vec::new();
        }
        let mut actions = vec![Action::RenderNeeded];
        actions.extend(persist_if_permanent(sticker));
        actions
    }

    /// End a drag or resize without applying the release point. The sticker
    /// goes back to where the gesture started.
    fn cancel_geometry(&mut self, target: &StickerId, origin: Rect) -> Vec<Action> {
        debug!(%target, "non-finite pointer-up; gesture cancelled");
        let Some(grant) = self.caps.mutate_grant() else {
            return Vec::new();
        };
        if self.store.get(target).is_none_or(|s| s.rect() == origin) {
            return Vec::new();
        }
        let Some(sticker) = self.store.update(&grant, target, &StickerPatch::geometry(origin)) else {
            return Vec::new();
        };
        let mut actions = vec![Action::RenderNeeded];
        // Streamed moves already reached the backend; put it back too.
        if self.stream_motion {
            actions.extend(persist_if_permanent(sticker));
        }
        actions
    }

    fn finish_create(&mut self, target: &StickerId, anchor: Point, pt: Point) -> Vec<Action> {
        let Some(grant) = self.caps.create_grant() else {
            return Vec::new();
        };
        let rect = finalize_creation_rect(anchor, pt);
        if !pt.is_finite() || !rect.is_finite() {
            debug!(%target, "degenerate sticker discarded");
            return self.discard_provisional(target);
        }
        if !self.store.shape_provisional(&grant, target, rect) {
            return Vec::new();
        }
        let Some(sticker) = self.store.submit_create(&grant, target) else {
            return Vec::new();
        };
        self.ui.tool = Tool::Cursor;
        self.ui.selected = Some(target.clone());
        vec![Action::RenderNeeded, Action::PersistSticker(sticker)]
    }

    /// Drop a provisional sticker that was never sent to the backend.
    fn discard_provisional(&mut self, target: &StickerId) -> Vec<Action> {
        let Some(grant) = self.caps.create_grant() else {
            return Vec::new();
        };
        if self.store.abandon_create(&grant, target).is_none() {
            return Vec::new();
        }
        self.forget(target);
        vec![Action::RenderNeeded]
    }

    fn select(&mut self, id: &StickerId) -> Vec<Action> {
        if !self.caps.is_read_only() {
            if let Some(sticker) = self.store.get(id) {
                self.ui.active_color.clone_from(&sticker.color);
            }
        }
        if self.ui.selected.as_ref() == Some(id) {
            return Vec::new();
        }
        self.ui.selected = Some(id.clone());
        vec![Action::RenderNeeded]
    }

    fn clear_selection(&mut self) -> Vec<Action> {
        if self.ui.selected.take().is_some() {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    /// Drop every reference to a sticker that no longer exists.
    fn forget(&mut self, id: &StickerId) {
        if self.ui.selected.as_ref() == Some(id) {
            self.ui.selected = None;
        }
        if self.interaction.target() == Some(id) {
            self.interaction = InteractionState::Idle;
        }
    }

    /// Point selection and the active gesture at a sticker's new id.
    fn retarget(&mut self, from: &StickerId, to: &StickerId) {
        if self.ui.selected.as_ref() == Some(from) {
            self.ui.selected = Some(to.clone());
        }
        match &mut self.interaction {
            InteractionState::Dragging { target, .. }
            | InteractionState::Resizing { target, .. }
            | InteractionState::Creating { target, .. }
                if *target == *from =>
            {
                *target = to.clone();
            }
            _ => {}
        }
    }
}

/// A sticker changed outside a pointer gesture: redraw and persist.
fn changed(sticker: &Sticker) -> Vec<Action> {
    let mut actions = vec![Action::RenderNeeded];
    actions.extend(persist_if_permanent(sticker));
    actions
}

fn persist_if_permanent(sticker: &Sticker) -> Vec<Action> {
    if sticker.id.is_temporary() {
        Vec::new()
    } else {
        vec![Action::PersistSticker(sticker.clone())]
    }
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// Position of a dragged sticker: origin plus the pointer's total travel.
#[must_use]
pub fn drag_rect(origin: Rect, anchor: Point, cursor: Point) -> Rect {
    let (dx, dy) = cursor.delta_from(anchor);
    Rect { x: origin.x + dx, y: origin.y + dy, ..origin }
}

/// Geometry of a sticker resized by `handle`.
///
/// Edges named by the handle follow the pointer; opposite edges stay put.
/// Width and height never drop below [`MIN_RESIZE_SIZE`]; when clamped, the
/// moving edge stops at the minimum distance from the pinned one.
#[must_use]
pub fn resize_rect(origin: Rect, handle: ResizeHandle, anchor: Point, cursor: Point) -> Rect {
    let (dx, dy) = cursor.delta_from(anchor);

    let (x, width) = if handle.moves_left() {
        let width = (origin.width - dx).max(MIN_RESIZE_SIZE);
        (origin.right() - width, width)
    } else {
        (origin.x, (origin.width + dx).max(MIN_RESIZE_SIZE))
    };

    let (y, height) = if handle.moves_top() {
        let height = (origin.height - dy).max(MIN_RESIZE_SIZE);
        (origin.bottom() - height, height)
    } else {
        (origin.y, (origin.height + dy).max(MIN_RESIZE_SIZE))
    };

    Rect::new(x, y, width, height)
}

/// Live geometry of a sticker being drawn from `anchor` to `cursor`.
///
/// Follows the pointer in any direction; may be smaller than the creation
/// minimum while the gesture lasts.
#[must_use]
pub fn creation_rect(anchor: Point, cursor: Point) -> Rect {
    Rect::new(
        anchor.x.min(cursor.x),
        anchor.y.min(cursor.y),
        (cursor.x - anchor.x).abs(),
        (cursor.y - anchor.y).abs(),
    )
}

/// Final geometry of a drawn sticker: [`creation_rect`] grown to at least
/// [`MIN_CREATE_SIZE`] in each dimension.
///
/// The top-left corner stays where the live rectangle had it, so a short
/// drag up or left still starts at the pointer.
#[must_use]
pub fn finalize_creation_rect(anchor: Point, cursor: Point) -> Rect {
    let live = creation_rect(anchor, cursor);
    Rect {
        width: live.width.max(MIN_CREATE_SIZE),
        height: live.height.max(MIN_CREATE_SIZE),
        ..live
    }
}
