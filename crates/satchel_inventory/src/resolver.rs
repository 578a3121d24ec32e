//! # Container Resolver
//!
//! Maps `(kind, id)` pairs coming from gestures and inbound pushes to one of
//! the four fixed [`Endpoint`]s.
//!
//! ```text
//!   id given?  ── yes ──► left.id | "player" → Left
//!      │                  left.backpack.id   → LeftBackpack
//!      │                  right.id           → Right
//!      │                  right.backpack.id  → RightBackpack
//!      no
//!      ▼
//!   kind:  player → Left, backpack → LeftBackpack,
//!          otherBackpack → RightBackpack, anything else → Right
//! ```
//!
//! Utility strips never resolve here.

use crate::container::ContainerKind;
use crate::state::{Endpoint, RootState};

/// Id that always addresses the player's container.
pub const PLAYER_SENTINEL: &str = "player";

/// Resolved endpoints of a transfer gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Where the item comes from.
    pub source: Endpoint,
    /// Where it goes; `None` aborts the gesture.
    pub target: Option<Endpoint>,
}

/// Finds the open endpoint whose container id is `id`.
#[must_use]
pub fn resolve_by_id(state: &RootState, id: &str) -> Option<Endpoint> {
    if id == PLAYER_SENTINEL {
        return Some(Endpoint::Left);
    }
    Endpoint::ALL.into_iter().find(|endpoint| {
        state
            .container(*endpoint)
            .is_some_and(|container| !container.id.is_empty() && container.id == id)
    })
}

/// Maps a container kind to its fixed endpoint, if that endpoint is open.
#[must_use]
pub fn resolve_by_kind(state: &RootState, kind: &ContainerKind) -> Option<Endpoint> {
    let endpoint = match kind {
        ContainerKind::Player => Endpoint::Left,
        ContainerKind::Backpack => Endpoint::LeftBackpack,
        ContainerKind::OtherBackpack => Endpoint::RightBackpack,
        ContainerKind::Utility | ContainerKind::OtherUtility => return None,
        _ => Endpoint::Right,
    };
    state.container(endpoint).map(|_| endpoint)
}

/// Resolves one gesture endpoint: by id when given, else by kind.
#[must_use]
pub fn resolve_endpoint(
    state: &RootState,
    kind: Option<&ContainerKind>,
    id: Option<&str>,
) -> Option<Endpoint> {
    match id {
        Some(id) => resolve_by_id(state, id),
        None => kind.and_then(|kind| resolve_by_kind(state, kind)),
    }
}

/// Resolves both endpoints of a transfer.
///
/// An unresolved source falls back to the player. When no target resolves
/// the opposite side is used: a player source goes right, anything else
/// goes left.
#[must_use]
pub fn resolve_transfer(
    state: &RootState,
    source_kind: &ContainerKind,
    source_id: Option<&str>,
    target_kind: Option<&ContainerKind>,
    target_id: Option<&str>,
) -> Resolution {
    let source = resolve_endpoint(state, Some(source_kind), source_id).unwrap_or(Endpoint::Left);

    let explicit = target_kind.is_some() || target_id.is_some();
    let target = if explicit {
        resolve_endpoint(state, target_kind, target_id)
    } else if *source_kind == ContainerKind::Player {
        Some(Endpoint::Right)
    } else {
        Some(Endpoint::Left)
    };

    Resolution { source, target }
}

/// Resolves the container an inbound refresh entry addresses.
///
/// An id that matches no open container returns `None`; the caller skips
/// the entry.
#[must_use]
pub fn resolve_refresh_target(
    state: &RootState,
    id: Option<&str>,
    kind: Option<&ContainerKind>,
) -> Option<Endpoint> {
    if let Some(id) = id {
        return resolve_by_id(state, id);
    }
    match kind {
        Some(ContainerKind::Backpack) => state.container(Endpoint::LeftBackpack).map(|_| Endpoint::LeftBackpack),
        Some(ContainerKind::OtherBackpack) => {
            state.container(Endpoint::RightBackpack).map(|_| Endpoint::RightBackpack)
        }
        Some(ContainerKind::Player) => Some(Endpoint::Left),
        _ => Some(Endpoint::Right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;

    fn state_with_backpacks() -> RootState {
        let mut left = Container::new("char-1", ContainerKind::Player, 10);
        left.backpack = Some(Box::new(Container::new("bag-1", ContainerKind::Backpack, 5)));
        let mut right = Container::new("trunk-9", ContainerKind::Other("trunk".into()), 20);
        right.backpack = Some(Box::new(Container::new("bag-2", ContainerKind::OtherBackpack, 5)));
        RootState::new(left, right)
    }

    #[test]
    fn test_resolve_by_id() {
        let state = state_with_backpacks();
        assert_eq!(resolve_by_id(&state, "player"), Some(Endpoint::Left));
        assert_eq!(resolve_by_id(&state, "char-1"), Some(Endpoint::Left));
        assert_eq!(resolve_by_id(&state, "bag-1"), Some(Endpoint::LeftBackpack));
        assert_eq!(resolve_by_id(&state, "trunk-9"), Some(Endpoint::Right));
        assert_eq!(resolve_by_id(&state, "bag-2"), Some(Endpoint::RightBackpack));
        assert_eq!(resolve_by_id(&state, "nowhere"), None);
    }

    #[test]
    fn test_resolve_by_kind() {
        let state = state_with_backpacks();
        assert_eq!(resolve_by_kind(&state, &ContainerKind::Player), Some(Endpoint::Left));
        assert_eq!(resolve_by_kind(&state, &ContainerKind::Backpack), Some(Endpoint::LeftBackpack));
        assert_eq!(resolve_by_kind(&state, &ContainerKind::Shop), Some(Endpoint::Right));
        assert_eq!(resolve_by_kind(&state, &ContainerKind::Utility), None);

        let bare = RootState::default();
        assert_eq!(resolve_by_kind(&bare, &ContainerKind::Backpack), None);
    }

    #[test]
    fn test_missing_target_defaults_to_opposite_side() {
        let state = state_with_backpacks();
        let from_player = resolve_transfer(&state, &ContainerKind::Player, None, None, None);
        assert_eq!(from_player.source, Endpoint::Left);
        assert_eq!(from_player.target, Some(Endpoint::Right));

        let from_trunk = resolve_transfer(&state, &ContainerKind::Other("trunk".into()), None, None, None);
        assert_eq!(from_trunk.source, Endpoint::Right);
        assert_eq!(from_trunk.target, Some(Endpoint::Left));
    }

    #[test]
    fn test_explicit_unknown_target_is_unresolved() {
        let state = state_with_backpacks();
        let resolution = resolve_transfer(
            &state,
            &ContainerKind::Player,
            None,
            Some(&ContainerKind::Container),
            Some("closed-box"),
        );
        assert_eq!(resolution.target, None);
    }

    #[test]
    fn test_refresh_resolution() {
        let state = state_with_backpacks();
        assert_eq!(resolve_refresh_target(&state, Some("bag-2"), None), Some(Endpoint::RightBackpack));
        assert_eq!(resolve_refresh_target(&state, Some("stale"), None), None);
        assert_eq!(
            resolve_refresh_target(&state, None, Some(&ContainerKind::Backpack)),
            Some(Endpoint::LeftBackpack)
        );
        assert_eq!(resolve_refresh_target(&state, None, None), Some(Endpoint::Right));
    }
}
