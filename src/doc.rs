//! Document model: stickers, their identities, and the in-memory store.
//!
//! This module defines what is on a board (`Sticker`), how a sticker is
//! identified before and after the backend has acknowledged it (`StickerId`),
//! a sparse-update type for incremental edits (`StickerPatch`), the wire
//! record exchanged with the board API (`StickerRecord`), and the runtime
//! store that owns every live sticker of one board (`StickerStore`).
//!
//! Mutations are optimistic: they land in the store synchronously and the
//! caller is handed back what it needs to persist. Operations that name an
//! unknown id are no-ops, which makes late network completions harmless.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geom::Rect;
use crate::permission::{CreateGrant, DeleteGrant, MutateGrant};

/// Identity of a sticker.
///
/// `Temporary` ids are minted locally for provisional stickers that the
/// backend has not acknowledged yet. `Permanent` ids are issued by the
/// backend. Reconciliation swaps the former for the latter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StickerId {
    Temporary(Uuid),
    Permanent(String),
}

impl StickerId {
    #[must_use]
    pub fn permanent(id: impl Into<String>) -> Self {
        Self::Permanent(id.into())
    }

    #[must_use]
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// The backend id, if this sticker has one.
    #[must_use]
    pub fn as_permanent(&self) -> Option<&str> {
        match self {
            Self::Permanent(id) => Some(id),
            Self::Temporary(_) => None,
        }
    }
}

impl fmt::Display for StickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temporary(token) => write!(f, "temporary:{token}"),
            Self::Permanent(id) => f.write_str(id),
        }
    }
}

/// A sticker as held in the local store.
#[derive(Debug, Clone, PartialEq)]
pub struct Sticker {
    pub id: StickerId,
    pub board_id: String,
    /// Left edge in board-local pixels. May be negative.
    pub x: f64,
    /// Top edge in board-local pixels. May be negative.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    /// CSS color string, usually one of [`crate::consts::PALETTE`].
    pub color: String,
}

impl Sticker {
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Convert to the wire record. `None` for provisional stickers, which
    /// have no backend id to put on the wire.
    #[must_use]
    pub fn to_record(&self) -> Option<StickerRecord> {
        let id = self.id.as_permanent()?;
        Some(StickerRecord {
            id: id.to_string(),
            dashboard_id: self.board_id.clone(),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            text: self.text.clone(),
            color: self.color.clone(),
        })
    }

    fn apply(&mut self, patch: &StickerPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(w) = patch.width {
            self.width = w;
        }
        if let Some(h) = patch.height {
            self.height = h;
        }
        if let Some(ref text) = patch.text {
            self.text.clone_from(text);
        }
        if let Some(ref color) = patch.color {
            self.color.clone_from(color);
        }
    }
}

impl From<StickerRecord> for Sticker {
    fn from(record: StickerRecord) -> Self {
        Self {
            id: StickerId::Permanent(record.id),
            board_id: record.dashboard_id,
            x: record.x,
            y: record.y,
            width: record.width,
            height: record.height,
            text: record.text,
            color: record.color,
        }
    }
}

/// A sticker as the board API stores and returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickerRecord {
    pub id: String,
    /// Board the sticker belongs to. The API calls boards "dashboards".
    pub dashboard_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub color: String,
}

/// Fields for a sticker that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSticker {
    pub rect: Rect,
    pub text: String,
    pub color: String,
}

/// Sparse update for a sticker. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StickerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl StickerPatch {
    /// Patch that overwrites position and size.
    #[must_use]
    pub fn geometry(rect: Rect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Default::default() }
    }

    #[must_use]
    pub fn color(color: impl Into<String>) -> Self {
        Self { color: Some(color.into()), ..Default::default() }
    }
}

/// Result of reconciling a provisional sticker with its persisted record.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// The provisional entry was replaced by the persisted one.
    ///
    /// `resync` is set when the provisional sticker was edited while its
    /// creation was in flight; local fields were kept and the caller must
    /// persist them under the new id.
    Committed { id: StickerId, resync: bool },
    /// The provisional sticker was deleted locally before the backend
    /// confirmed it. Nothing was inserted; the backend record `id` is now an
    /// orphan the caller should delete remotely.
    Orphaned { id: StickerId },
    /// The temporary id is not known to this store.
    Unknown,
}

/// In-memory store of the stickers of one board, in insertion order.
///
/// Insertion order is render order: later stickers draw on top.
pub struct StickerStore {
    board_id: String,
    stickers: Vec<Sticker>,
    /// Provisional stickers whose create request is in flight.
    creating: HashSet<Uuid>,
    /// Provisional stickers edited after their create request was sent.
    edited_provisional: HashSet<Uuid>,
    /// Provisional stickers deleted before their creation was confirmed.
    deleted_provisional: HashSet<Uuid>,
}

impl StickerStore {
    /// Create an empty store for a board.
    #[must_use]
    pub fn new(board_id: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            stickers: Vec::new(),
            creating: HashSet::new(),
            edited_provisional: HashSet::new(),
            deleted_provisional: HashSet::new(),
        }
    }

    #[must_use]
    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    /// Replace every sticker with a freshly fetched set.
    ///
    /// Later duplicates of an id are dropped so ids stay unique.
    pub fn load(&mut self, stickers: Vec<Sticker>) {
        self.stickers.clear();
        self.creating.clear();
        self.edited_provisional.clear();
        self.deleted_provisional.clear();
        for sticker in stickers {
            if !self.contains(&sticker.id) {
                self.stickers.push(sticker);
            }
        }
    }

    /// Insert a provisional sticker and return its temporary id.
    pub fn create_local(&mut self, _grant: &CreateGrant, new: NewSticker) -> StickerId {
        let mut id = StickerId::Temporary(Uuid::new_v4());
        while self.contains(&id) {
            id = StickerId::Temporary(Uuid::new_v4());
        }
        self.stickers.push(Sticker {
            id: id.clone(),
            board_id: self.board_id.clone(),
            x: new.rect.x,
            y: new.rect.y,
            width: new.rect.width,
            height: new.rect.height,
            text: new.text,
            color: new.color,
        });
        id
    }

    /// Set the geometry of a provisional sticker that is still being drawn.
    ///
    /// Unlike [`StickerStore::update`] this does not count as an edit after
    /// the create request. Returns false for unknown or permanent ids.
    pub fn shape_provisional(&mut self, _grant: &CreateGrant, id: &StickerId, rect: Rect) -> bool {
        if !id.is_temporary() {
            return false;
        }
        let Some(sticker) = self.get_mut(id) else {
            return false;
        };
        sticker.apply(&StickerPatch::geometry(rect));
        true
    }

    /// Mark a provisional sticker's create request as sent and return the
    /// sticker to persist. `None` for unknown or permanent ids.
    pub fn submit_create(&mut self, _grant: &CreateGrant, id: &StickerId) -> Option<Sticker> {
        let StickerId::Temporary(token) = id else {
            return None;
        };
        let sticker = self.get(id)?.clone();
        self.creating.insert(*token);
        Some(sticker)
    }

    /// Swap a provisional sticker for the record the backend persisted.
    ///
    /// The persisted sticker takes the provisional one's position in the
    /// order, in a single step.
    pub fn commit_create(&mut self, _grant: &CreateGrant, temp: &StickerId, persisted: Sticker) -> CommitOutcome {
        let StickerId::Temporary(token) = temp else {
            return CommitOutcome::Unknown;
        };
        self.creating.remove(token);
        if self.deleted_provisional.remove(token) {
            return CommitOutcome::Orphaned { id: persisted.id };
        }
        let Some(pos) = self.position(temp) else {
            return CommitOutcome::Unknown;
        };

        let resync = self.edited_provisional.remove(token);
        let replacement = if resync {
            Sticker { id: persisted.id, board_id: persisted.board_id, ..self.stickers[pos].clone() }
        } else {
            persisted
        };
        let id = replacement.id.clone();

        let mut pos = pos;
        if let Some(dup) = self.position(&id) {
            self.stickers.remove(dup);
            if dup < pos {
                pos -= 1;
            }
        }
        self.stickers[pos] = replacement;
        CommitOutcome::Committed { id, resync }
    }

    /// Record that a create request failed. The provisional sticker, if it
    /// still exists, stays in place under its temporary id; it is not rolled
    /// back. Returns whether it is still present.
    pub fn fail_create(&mut self, _grant: &CreateGrant, temp: &StickerId) -> bool {
        let StickerId::Temporary(token) = temp else {
            return false;
        };
        self.creating.remove(token);
        self.edited_provisional.remove(token);
        self.deleted_provisional.remove(token);
        self.contains(temp)
    }

    /// Drop a provisional sticker that was never sent to the backend.
    pub fn abandon_create(&mut self, _grant: &CreateGrant, temp: &StickerId) -> Option<Sticker> {
        let StickerId::Temporary(token) = temp else {
            return None;
        };
        self.creating.remove(token);
        self.edited_provisional.remove(token);
        self.deleted_provisional.remove(token);
        let pos = self.position(temp)?;
        Some(self.stickers.remove(pos))
    }

    /// Merge a patch into a sticker. Returns the updated sticker, or `None`
    /// (and changes nothing) if the id is unknown.
    pub fn update(&mut self, _grant: &MutateGrant, id: &StickerId, patch: &StickerPatch) -> Option<&Sticker> {
        let pos = self.position(id)?;
        if let StickerId::Temporary(token) = id {
            if self.creating.contains(token) {
                self.edited_provisional.insert(*token);
            }
        }
        let sticker = &mut self.stickers[pos];
        sticker.apply(patch);
        Some(sticker)
    }

    /// Remove a sticker, returning it if it was present.
    pub fn remove(&mut self, _grant: &DeleteGrant, id: &StickerId) -> Option<Sticker> {
        let pos = self.position(id)?;
        if let StickerId::Temporary(token) = id {
            self.edited_provisional.remove(token);
            if self.creating.contains(token) {
                self.deleted_provisional.insert(*token);
            }
        }
        Some(self.stickers.remove(pos))
    }

    #[must_use]
    pub fn get(&self, id: &StickerId) -> Option<&Sticker> {
        self.stickers.iter().find(|s| &s.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &StickerId) -> bool {
        self.position(id).is_some()
    }

    /// All stickers in render order (bottom first).
    #[must_use]
    pub fn all(&self) -> &[Sticker] {
        &self.stickers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stickers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stickers.is_empty()
    }

    fn position(&self, id: &StickerId) -> Option<usize> {
        self.stickers.iter().position(|s| &s.id == id)
    }

    fn get_mut(&mut self, id: &StickerId) -> Option<&mut Sticker> {
        self.stickers.iter_mut().find(|s| &s.id == id)
    }
}
