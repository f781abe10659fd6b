//! Input model: tools, keys, resize handles, and the interaction state machine.
//!
//! `Tool` captures what a pointer-down on empty canvas means. `InteractionState`
//! is the single gesture tracked between pointer-down and pointer-up, carrying
//! the anchor and origin snapshot needed to recompute geometry on every move
//! and to finalize on release. `InputEvent` is the serializable form of all of
//! the above, used to script a session.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::doc::StickerId;
use crate::geom::{Point, Rect};

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Select, move and resize (default).
    #[default]
    Cursor,
    /// Draw a new sticker.
    Sticker,
}

/// A keyboard key, named as the browser reports it (e.g. `"Delete"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key(pub String);

impl Key {
    /// Delete and Backspace both remove the selected sticker.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self.0.as_str(), "Delete" | "Backspace")
    }
}

/// Corner resize handle.
///
/// Serialized as the compass-like tags `tl`, `tr`, `bl`, `br`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeHandle {
    #[serde(rename = "tl")]
    TopLeft,
    #[serde(rename = "tr")]
    TopRight,
    #[serde(rename = "bl")]
    BottomLeft,
    #[serde(rename = "br")]
    BottomRight,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 4] = [Self::TopLeft, Self::TopRight, Self::BottomLeft, Self::BottomRight];

    /// Whether this handle moves the left edge (otherwise the right edge).
    #[must_use]
    pub fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }

    /// Whether this handle moves the top edge (otherwise the bottom edge).
    #[must_use]
    pub fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight)
    }

    /// Position of this handle on a rectangle.
    #[must_use]
    pub fn position(self, rect: &Rect) -> Point {
        let x = if self.moves_left() { rect.x } else { rect.right() };
        let y = if self.moves_top() { rect.y } else { rect.bottom() };
        Point::new(x, y)
    }

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::TopLeft => "tl",
            Self::TopRight => "tr",
            Self::BottomLeft => "bl",
            Self::BottomRight => "br",
        }
    }
}

/// The active gesture. At most one exists per session.
///
/// Each active variant carries what pointer-move needs to recompute the
/// target's geometry from scratch and what pointer-up needs to finalize it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Moving an existing sticker.
    Dragging {
        target: StickerId,
        /// Pointer position at pointer-down.
        anchor: Point,
        /// Sticker geometry at pointer-down.
        origin: Rect,
    },
    /// Resizing the selected sticker by one of its corners.
    Resizing {
        target: StickerId,
        handle: ResizeHandle,
        anchor: Point,
        origin: Rect,
    },
    /// Drawing a new provisional sticker from `anchor`.
    Creating { target: StickerId, anchor: Point },
}

impl InteractionState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The sticker the active gesture operates on.
    #[must_use]
    pub fn target(&self) -> Option<&StickerId> {
        match self {
            Self::Idle => None,
            Self::Dragging { target, .. } | Self::Resizing { target, .. } | Self::Creating { target, .. } => {
                Some(target)
            }
        }
    }
}

/// Pointer affordance the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorStyle {
    Default,
    Crosshair,
    Move,
    /// Diagonal resize along top-left / bottom-right.
    ResizeNwse,
    /// Diagonal resize along top-right / bottom-left.
    ResizeNesw,
}

/// Persistent UI state visible to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub tool: Tool,
    /// At most one sticker is selected at a time.
    pub selected: Option<StickerId>,
    /// Color given to the next created sticker.
    pub active_color: String,
    /// Set while a text field has keyboard focus; suppresses key deletes.
    pub text_focused: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tool: Tool::default(),
            selected: None,
            active_color: crate::consts::DEFAULT_COLOR.to_string(),
            text_focused: false,
        }
    }
}

/// One input, in the form used by scripted sessions.
///
/// Ids are backend ids. A missing id on `text` targets the selected sticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    KeyDown { key: String },
    Tool { tool: Tool },
    Color { color: String },
    Text {
        #[serde(default)]
        id: Option<String>,
        text: String,
    },
    TextFocus { focused: bool },
    Delete { id: String },
}
