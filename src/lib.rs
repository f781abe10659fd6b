//! Sticker board interaction engine and session runtime.
//!
//! A board is a 2D surface of rectangular sticker notes. This crate turns raw
//! pointer and keyboard input into sticker changes, keeps the local
//! authoritative view of a board's stickers, reconciles locally minted
//! sticker ids with the ids the backend assigns, and gates every mutation
//! through the caller's role on the board. Persistence goes through the
//! [`gateway::SyncGateway`] trait; the engine itself never touches the
//! network.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | [`session::BoardSession`]: loads a board, routes input, dispatches persistence |
//! | [`engine`] | Interaction state machine, testable as [`engine::EngineCore`] |
//! | [`doc`] | Sticker model, ids, and the in-memory [`doc::StickerStore`] |
//! | [`permission`] | Board roles, capabilities and mutation grants |
//! | [`input`] | Tools, keys, resize handles, interaction and UI state, scripted events |
//! | [`hit`] | Hit-testing against stickers and resize handles |
//! | [`geom`] | `Point` and `Rect` in board-local pixels |
//! | [`gateway`] | Board API trait with HTTP and in-memory implementations |
//! | [`config`] | Environment configuration |
//! | [`consts`] | Minimum sizes, handle slop and the color palette |

pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod gateway;
pub mod geom;
pub mod hit;
pub mod input;
pub mod permission;
pub mod session;
