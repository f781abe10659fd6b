#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::HANDLE_RADIUS_PX;
use crate::doc::{StickerId, StickerStore};
use crate::geom::Point;
use crate::input::ResizeHandle;

/// Which part of a sticker was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeHandle),
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub sticker_id: StickerId,
    pub part: HitPart,
}

/// Test which sticker (if any) is under `pt`.
///
/// The selected sticker is checked first: its corner handles (only when
/// `handles` is set, i.e. the user may resize), then its body, since it draws
/// above the others. Remaining stickers are checked topmost first.
#[must_use]
pub fn hit_test(pt: Point, store: &StickerStore, selected: Option<&StickerId>, handles: bool) -> Option<Hit> {
    if let Some(sticker) = selected.and_then(|id| store.get(id)) {
        let rect = sticker.rect();
        if handles {
            for handle in ResizeHandle::ALL {
                let corner = handle.position(&rect);
                let (dx, dy) = pt.delta_from(corner);
                if dx * dx + dy * dy <= HANDLE_RADIUS_PX * HANDLE_RADIUS_PX {
                    return Some(Hit { sticker_id: sticker.id.clone(), part: HitPart::ResizeHandle(handle) });
                }
            }
        }
        if rect.contains(pt) {
            return Some(Hit { sticker_id: sticker.id.clone(), part: HitPart::Body });
        }
    }

    store
        .all()
        .iter()
        .rev()
        .find(|s| s.rect().contains(pt))
        .map(|s| Hit { sticker_id: s.id.clone(), part: HitPart::Body })
}
