//! Shared numeric constants and the sticker color palette.

// ── Geometry ────────────────────────────────────────────────────

/// Minimum width and height of a newly created sticker once finalized.
pub const MIN_CREATE_SIZE: f64 = 100.0;

/// Minimum width and height of an existing sticker after a resize.
pub const MIN_RESIZE_SIZE: f64 = 50.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Hit slop in pixels around each corner resize handle.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

// ── Palette ─────────────────────────────────────────────────────

/// Colors offered by the toolbar. Stickers may still carry any other color
/// string verbatim.
pub const PALETTE: [&str; 8] = [
    "#fff9b1", // yellow
    "#daf7a6", // green
    "#ffc3a0", // orange
    "#ffafb0", // red
    "#e0ffff", // cyan
    "#dcd0ff", // purple
    "#d3d3d3", // gray
    "#ffffff", // white
];

/// Active color at the start of every session.
pub const DEFAULT_COLOR: &str = PALETTE[0];
