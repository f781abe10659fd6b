//! Permission gate: board roles, their capability sets, and mutation grants.
//!
//! A `Capabilities` value can only be derived from a `BoardRole`, and the
//! grant tokens (`CreateGrant`, `MutateGrant`, `DeleteGrant`) can only be
//! minted from a `Capabilities` that allows them. Every mutating entry point
//! of the store takes the matching grant by reference, so code that has not
//! passed the gate has nothing to call it with.

#[cfg(test)]
#[path = "permission_test.rs"]
mod permission_test;

use serde::{Deserialize, Serialize};

/// The current user's role on a board. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardRole {
    /// Owner of the board. The board API also calls this role "owner".
    #[serde(alias = "owner")]
    Creator,
    /// Invited with edit rights.
    Editor,
    /// Invited read-only.
    Viewer,
}

impl BoardRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }
}

impl std::str::FromStr for BoardRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creator" | "owner" => Ok(Self::Creator),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            other => Err(format!("unknown board role: {other}")),
        }
    }
}

/// Operations the canvas allows for a role.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    can_create: bool,
    can_mutate: bool,
    can_delete: bool,
    can_invite: bool,
}

/// Map a role to its capability set.
///
/// Creators and editors get create/mutate/delete; only creators may invite.
/// Viewers get nothing.
#[must_use]
pub fn capabilities(role: BoardRole) -> Capabilities {
    match role {
        BoardRole::Creator => Capabilities { can_create: true, can_mutate: true, can_delete: true, can_invite: true },
        BoardRole::Editor => Capabilities { can_create: true, can_mutate: true, can_delete: true, can_invite: false },
        BoardRole::Viewer => Capabilities { can_create: false, can_mutate: false, can_delete: false, can_invite: false },
    }
}

impl Capabilities {
    #[must_use]
    pub fn can_create(&self) -> bool {
        self.can_create
    }

    #[must_use]
    pub fn can_mutate(&self) -> bool {
        self.can_mutate
    }

    #[must_use]
    pub fn can_delete(&self) -> bool {
        self.can_delete
    }

    #[must_use]
    pub fn can_invite(&self) -> bool {
        self.can_invite
    }

    /// True when nothing may be changed; the canvas is inspection-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        !(self.can_create || self.can_mutate || self.can_delete)
    }

    #[must_use]
    pub fn create_grant(&self) -> Option<CreateGrant> {
        self.can_create.then_some(CreateGrant { _sealed: () })
    }

    #[must_use]
    pub fn mutate_grant(&self) -> Option<MutateGrant> {
        self.can_mutate.then_some(MutateGrant { _sealed: () })
    }

    #[must_use]
    pub fn delete_grant(&self) -> Option<DeleteGrant> {
        self.can_delete.then_some(DeleteGrant { _sealed: () })
    }
}

/// Proof that the session may create stickers.
#[derive(Debug, Clone, Copy)]
pub struct CreateGrant {
    _sealed: (),
}

/// Proof that the session may move, resize, recolor and edit stickers.
#[derive(Debug, Clone, Copy)]
pub struct MutateGrant {
    _sealed: (),
}

/// Proof that the session may delete stickers.
#[derive(Debug, Clone, Copy)]
pub struct DeleteGrant {
    _sealed: (),
}
