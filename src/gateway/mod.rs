//! Gateway: the boundary between a board session and the board API.
//!
//! DESIGN
//! ======
//! Every network side effect of a session goes through [`SyncGateway`]. The
//! session never retries or rolls back; a failed call is logged and counted.
//! Keeping the calls behind one trait lets a retry policy be layered in later
//! without touching the interaction engine.
//!
//! Implementations:
//! - [`http::HttpGateway`] talks to the board REST API with `reqwest`.
//! - [`memory::MemoryGateway`] keeps one board in memory (offline runs, tests).

pub mod http;
pub mod memory;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use crate::doc::{Sticker, StickerRecord};
use crate::permission::BoardRole;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors produced by a [`SyncGateway`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The board or sticker does not exist, or is hidden from the caller.
    #[error("not found")]
    NotFound,

    /// The caller has no access to the board.
    #[error("forbidden")]
    Forbidden,

    /// The bearer token is missing or rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// The request never produced a response (connect, timeout, body read).
    #[error("request failed: {0}")]
    Request(String),

    /// The API answered with an unexpected status.
    #[error("unexpected response: status {status}")]
    Response { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl GatewayError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "E_NOT_FOUND",
            Self::Forbidden => "E_FORBIDDEN",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::Request(_) => "E_REQUEST",
            Self::Response { .. } => "E_RESPONSE",
            Self::Parse(_) => "E_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// The caller may not see or touch the resource. A session that hits this
    /// while loading is abandoned.
    #[must_use]
    pub fn is_access_error(&self) -> bool {
        matches!(self, Self::NotFound | Self::Forbidden | Self::Unauthorized)
    }

    /// Transport failures and overload/server errors. Nothing retries yet.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// A board as fetched at session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub id: String,
    pub name: String,
    /// The caller's role on this board.
    pub role: BoardRole,
    #[serde(default)]
    pub stickers: Vec<StickerRecord>,
}

impl BoardSnapshot {
    /// Stickers in store form, in the order the API returned them.
    #[must_use]
    pub fn into_stickers(self) -> Vec<Sticker> {
        self.stickers.into_iter().map(Sticker::from).collect()
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Board persistence as seen by a session. Enables mocking in tests.
#[async_trait::async_trait]
pub trait SyncGateway: Send + Sync {
    /// Load a board with all of its stickers.
    ///
    /// # Errors
    ///
    /// Access errors (`NotFound`, `Forbidden`, `Unauthorized`) when the caller
    /// may not open the board; any other variant for transport problems.
    async fn fetch_board(&self, board_id: &str) -> Result<BoardSnapshot, GatewayError>;

    /// Create the sticker when its id is temporary, update it otherwise.
    ///
    /// Returns the stored record, which carries the permanent id.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the call fails.
    async fn persist_sticker(&self, sticker: &Sticker) -> Result<Sticker, GatewayError>;

    /// Delete a sticker by its backend id.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the call fails.
    async fn delete_sticker(&self, id: &str) -> Result<(), GatewayError>;
}
