//! Board session: one user's live view of one board.
//!
//! DESIGN
//! ======
//! A `BoardSession` is the single writer of its board's state. It owns the
//! `EngineCore` and every input takes `&mut self`, so store mutations are
//! serialized by ownership. Engine handlers return `Action`s; persistence
//! actions are spawned as tokio tasks against the shared gateway and report
//! back through an mpsc channel. Completions are applied only when the host
//! calls `poll_completions` (non-blocking) or `settle` (await all).
//!
//! ERROR HANDLING
//! ==============
//! Access failures while loading abandon the session (`SessionError`).
//! Persistence failures are logged and counted; local state is never rolled
//! back. A sticker whose creation failed stays on the board under its
//! temporary id and is not persisted again.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::doc::{Sticker, StickerId};
use crate::engine::{Action, EngineCore};
use crate::gateway::{GatewayError, SyncGateway};
use crate::geom::Point;
use crate::input::{CursorStyle, InputEvent, InteractionState, Key, Tool};
use crate::permission::{BoardRole, Capabilities};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The caller may not open the board. Not retried.
    #[error("no access to board {board_id}: {source}")]
    Access {
        board_id: String,
        #[source]
        source: GatewayError,
    },

    /// The board could not be fetched for another reason.
    #[error("failed to load board {board_id}: {source}")]
    Load {
        board_id: String,
        #[source]
        source: GatewayError,
    },
}

// =============================================================================
// COMPLETIONS
// =============================================================================

/// Result of one gateway call, delivered back to the session.
#[derive(Debug)]
enum Completion {
    Created { temp: StickerId, result: Result<Sticker, GatewayError> },
    Updated { id: StickerId, result: Result<Sticker, GatewayError> },
    Deleted { id: String, result: Result<(), GatewayError> },
}

// =============================================================================
// VIEW
// =============================================================================

/// Serializable summary of a session, as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub board_id: String,
    pub name: String,
    pub role: BoardRole,
    pub capabilities: Capabilities,
    pub tool: Tool,
    pub active_color: String,
    pub cursor: CursorStyle,
    pub selected: Option<String>,
    pub stickers: Vec<StickerView>,
    pub pending: usize,
    pub persistence_failures: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StickerView {
    pub id: String,
    /// Not yet acknowledged by the backend.
    pub provisional: bool,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub color: String,
}

impl From<&Sticker> for StickerView {
    fn from(sticker: &Sticker) -> Self {
        Self {
            id: sticker.id.to_string(),
            provisional: sticker.id.is_temporary(),
            x: sticker.x,
            y: sticker.y,
            width: sticker.width,
            height: sticker.height,
            text: sticker.text.clone(),
            color: sticker.color.clone(),
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

pub struct BoardSession {
    board_id: String,
    name: String,
    engine: EngineCore,
    gateway: Arc<dyn SyncGateway>,
    runtime: Handle,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    persistence_failures: usize,
}

impl BoardSession {
    /// Fetch a board and start a session on it.
    ///
    /// `stream_motion` persists drag/resize geometry on every pointer-move
    /// instead of once on release.
    ///
    /// # Errors
    ///
    /// [`SessionError::Access`] when the board is missing or forbidden,
    /// [`SessionError::Load`] for any other fetch failure.
    pub async fn open(
        gateway: Arc<dyn SyncGateway>,
        board_id: &str,
        stream_motion: bool,
    ) -> Result<Self, SessionError> {
        let snapshot = match gateway.fetch_board(board_id).await {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_access_error() => {
                warn!(%board_id, error = %e, "board access denied; abandoning session");
                return Err(SessionError::Access { board_id: board_id.to_string(), source: e });
            }
            Err(e) => {
                warn!(%board_id, error = %e, "board load failed");
                return Err(SessionError::Load { board_id: board_id.to_string(), source: e });
            }
        };

        let name = snapshot.name.clone();
        let mut engine = EngineCore::new(board_id, snapshot.role);
        engine.stream_motion = stream_motion;
        engine.load(snapshot.into_stickers());
        info!(
            %board_id,
            role = engine.role().as_str(),
            stickers = engine.stickers().len(),
            stream_motion,
            "board loaded"
        );

        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Ok(Self {
            board_id: board_id.to_string(),
            name,
            engine,
            gateway,
            runtime: Handle::current(),
            completions_tx,
            completions_rx,
            in_flight: 0,
            persistence_failures: 0,
        })
    }

    // --- Input ---
    //
    // Every input returns whether the board needs a redraw.

    pub fn pointer_down(&mut self, pt: Point) -> bool {
        let actions = self.engine.on_pointer_down(pt);
        self.run(actions)
    }

    pub fn pointer_move(&mut self, pt: Point) -> bool {
        let actions = self.engine.on_pointer_move(pt);
        self.run(actions)
    }

    pub fn pointer_up(&mut self, pt: Point) -> bool {
        let actions = self.engine.on_pointer_up(pt);
        self.run(actions)
    }

    pub fn key_down(&mut self, key: &Key) -> bool {
        let actions = self.engine.on_key_down(key);
        self.run(actions)
    }

    /// Returns `false` when the role may not use `tool`.
    pub fn set_tool(&mut self, tool: Tool) -> bool {
        self.engine.set_tool(tool)
    }

    pub fn set_color(&mut self, color: &str) -> bool {
        let changed = self.engine.ui.active_color != color;
        let actions = self.engine.set_active_color(color);
        let render = self.run(actions);
        render || (changed && self.engine.ui.active_color == color)
    }

    pub fn set_text(&mut self, id: &StickerId, text: &str) -> bool {
        let actions = self.engine.set_text(id, text);
        self.run(actions)
    }

    pub fn set_text_focus(&mut self, focused: bool) {
        self.engine.set_text_focus(focused);
    }

    pub fn delete_sticker(&mut self, id: &StickerId) -> bool {
        let actions = self.engine.delete(id);
        self.run(actions)
    }

    /// Apply one scripted input event.
    pub fn dispatch(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { x, y } => self.pointer_down(Point::new(x, y)),
            InputEvent::PointerMove { x, y } => self.pointer_move(Point::new(x, y)),
            InputEvent::PointerUp { x, y } => self.pointer_up(Point::new(x, y)),
            InputEvent::KeyDown { key } => self.key_down(&Key(key)),
            InputEvent::Tool { tool } => self.set_tool(tool),
            InputEvent::Color { color } => self.set_color(&color),
            InputEvent::Text { id, text } => {
                let target = match id {
                    Some(id) => StickerId::permanent(id),
                    None => match self.engine.selection() {
                        Some(selected) => selected.clone(),
                        None => {
                            debug!("text event without id and no selection; ignored");
                            return false;
                        }
                    },
                };
                self.set_text(&target, &text)
            }
            InputEvent::TextFocus { focused } => {
                self.set_text_focus(focused);
                false
            }
            InputEvent::Delete { id } => self.delete_sticker(&StickerId::permanent(id)),
        }
    }

    // --- Completions ---

    /// Apply every completion that has already arrived. Never waits.
    pub fn poll_completions(&mut self) -> bool {
        let mut render = false;
        while let Ok(completion) = self.completions_rx.try_recv() {
            render |= self.complete(completion);
        }
        render
    }

    /// Wait until every gateway call, including follow-ups issued while
    /// applying completions, has finished.
    pub async fn settle(&mut self) -> bool {
        let mut render = false;
        while self.in_flight > 0 {
            let Some(completion) = self.completions_rx.recv().await else {
                break;
            };
            render |= self.complete(completion);
        }
        render
    }

    // --- Queries ---

    #[must_use]
    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn role(&self) -> BoardRole {
        self.engine.role()
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.engine.capabilities()
    }

    /// Stickers in render order (later draws on top).
    #[must_use]
    pub fn stickers(&self) -> &[Sticker] {
        self.engine.stickers()
    }

    #[must_use]
    pub fn sticker(&self, id: &StickerId) -> Option<&Sticker> {
        self.engine.sticker(id)
    }

    #[must_use]
    pub fn selection(&self) -> Option<&StickerId> {
        self.engine.selection()
    }

    #[must_use]
    pub fn interaction(&self) -> &InteractionState {
        self.engine.interaction()
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.engine.tool()
    }

    #[must_use]
    pub fn active_color(&self) -> &str {
        &self.engine.ui.active_color
    }

    #[must_use]
    pub fn cursor(&self) -> CursorStyle {
        self.engine.cursor()
    }

    /// Gateway calls spawned but not yet applied.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    /// Gateway calls that failed since the session opened.
    #[must_use]
    pub fn persistence_failures(&self) -> usize {
        self.persistence_failures
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            board_id: self.board_id.clone(),
            name: self.name.clone(),
            role: self.role(),
            capabilities: self.capabilities(),
            tool: self.tool(),
            active_color: self.active_color().to_string(),
            cursor: self.cursor(),
            selected: self.selection().map(ToString::to_string),
            stickers: self.stickers().iter().map(StickerView::from).collect(),
            pending: self.in_flight,
            persistence_failures: self.persistence_failures,
        }
    }

    // --- Internals ---

    fn run(&mut self, actions: Vec<Action>) -> bool {
        let mut render = false;
        for action in actions {
            match action {
                Action::RenderNeeded => render = true,
                Action::PersistSticker(sticker) => self.spawn_persist(sticker),
                Action::DeleteSticker { id } => self.spawn_delete(id),
            }
        }
        render
    }

    fn spawn_persist(&mut self, sticker: Sticker) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.completions_tx.clone();
        self.in_flight += 1;
        self.runtime.spawn(async move {
            let result = gateway.persist_sticker(&sticker).await;
            let completion = if sticker.id.is_temporary() {
                Completion::Created { temp: sticker.id, result }
            } else {
                Completion::Updated { id: sticker.id, result }
            };
            if tx.send(completion).is_err() {
                debug!("session closed before persist completion was delivered");
            }
        });
    }

    fn spawn_delete(&mut self, id: String) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.completions_tx.clone();
        self.in_flight += 1;
        self.runtime.spawn(async move {
            let result = gateway.delete_sticker(&id).await;
            if tx.send(Completion::Deleted { id, result }).is_err() {
                debug!("session closed before delete completion was delivered");
            }
        });
    }

    fn complete(&mut self, completion: Completion) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Created { temp, result: Ok(stored) } => {
                debug!(%temp, id = %stored.id, "sticker created");
                let actions = self.engine.commit_create(&temp, stored);
                self.run(actions)
            }
            Completion::Created { temp, result: Err(e) } => {
                self.record_failure("create", &temp.to_string(), &e);
                let actions = self.engine.create_failed(&temp);
                self.run(actions)
            }
            Completion::Updated { id, result: Err(e) } => {
                self.record_failure("update", &id.to_string(), &e);
                false
            }
            Completion::Deleted { id, result: Err(e) } => {
                self.record_failure("delete", &id, &e);
                false
            }
            Completion::Updated { result: Ok(_), .. } | Completion::Deleted { result: Ok(()), .. } => false,
        }
    }

    fn record_failure(&mut self, op: &'static str, sticker_id: &str, error: &GatewayError) {
        self.persistence_failures += 1;
        warn!(
            board_id = %self.board_id,
            %sticker_id,
            op,
            error = %error,
            code = error.error_code(),
            "sticker persistence failed"
        );
    }
}
