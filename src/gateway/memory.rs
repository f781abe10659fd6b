//! In-memory gateway holding a single board. Used for offline runs and tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use super::{BoardSnapshot, GatewayError, SyncGateway};
use crate::doc::{Sticker, StickerRecord};
use crate::permission::BoardRole;

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

pub struct MemoryGateway {
    board_id: String,
    name: String,
    role: BoardRole,
    stickers: Mutex<Vec<StickerRecord>>,
}

impl MemoryGateway {
    #[must_use]
    pub fn new(board_id: impl Into<String>, name: impl Into<String>, role: BoardRole) -> Self {
        Self { board_id: board_id.into(), name: name.into(), role, stickers: Mutex::new(Vec::new()) }
    }

    /// Seed the board with existing records.
    #[must_use]
    pub fn with_stickers(self, records: Vec<StickerRecord>) -> Self {
        *self.lock() = records;
        self
    }

    /// Current stored records, in creation order.
    #[must_use]
    pub fn stickers(&self) -> Vec<StickerRecord> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StickerRecord>> {
        self.stickers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl SyncGateway for MemoryGateway {
    async fn fetch_board(&self, board_id: &str) -> Result<BoardSnapshot, GatewayError> {
        if board_id != self.board_id {
            return Err(GatewayError::NotFound);
        }
        Ok(BoardSnapshot { id: self.board_id.clone(), name: self.name.clone(), role: self.role, stickers: self.stickers() })
    }

    async fn persist_sticker(&self, sticker: &Sticker) -> Result<Sticker, GatewayError> {
        if sticker.board_id != self.board_id {
            return Err(GatewayError::NotFound);
        }
        let mut stickers = self.lock();
        match sticker.id.as_permanent() {
            None => {
                let record = StickerRecord {
                    id: Uuid::new_v4().to_string(),
                    dashboard_id: self.board_id.clone(),
                    x: sticker.x,
                    y: sticker.y,
                    width: sticker.width,
                    height: sticker.height,
                    text: sticker.text.clone(),
                    color: sticker.color.clone(),
                };
                stickers.push(record.clone());
                Ok(Sticker::from(record))
            }
            Some(id) => {
                let stored = stickers
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or(GatewayError::NotFound)?;
                stored.x = sticker.x;
                stored.y = sticker.y;
                stored.width = sticker.width;
                stored.height = sticker.height;
                stored.text.clone_from(&sticker.text);
                stored.color.clone_from(&sticker.color);
                Ok(Sticker::from(stored.clone()))
            }
        }
    }

    async fn delete_sticker(&self, id: &str) -> Result<(), GatewayError> {
        let mut stickers = self.lock();
        let pos = stickers
            .iter()
            .position(|r| r.id == id)
            .ok_or(GatewayError::NotFound)?;
        stickers.remove(pos);
        Ok(())
    }
}
