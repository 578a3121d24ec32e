//! # Root State
//!
//! Exactly two top-level containers: `left` (always the player) and `right`
//! (the opened counterpart). Each may carry one nested backpack, giving at
//! most four addressable transfer endpoints.

use serde::{Deserialize, Serialize};

use crate::container::{Container, ContainerKind};
use crate::error::{InventoryError, InventoryResult};
use crate::item::ItemInstance;

/// One of the four fixed transfer endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// The player's container.
    Left,
    /// The player's backpack.
    LeftBackpack,
    /// The opened container.
    Right,
    /// The backpack nested in the opened container.
    RightBackpack,
}

impl Endpoint {
    /// All endpoints in resolution order.
    pub const ALL: [Self; 4] = [Self::Left, Self::LeftBackpack, Self::Right, Self::RightBackpack];
}

/// A slot addressed by endpoint and 1-based index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotRef {
    /// The container.
    pub endpoint: Endpoint,
    /// 1-based slot index.
    pub index: u32,
}

impl SlotRef {
    /// Creates a slot reference.
    #[inline]
    #[must_use]
    pub const fn new(endpoint: Endpoint, index: u32) -> Self {
        Self { endpoint, index }
    }
}

/// The left/right pair of open containers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RootState {
    /// The player.
    pub left: Container,
    /// The opened counterpart.
    pub right: Container,
}

impl Default for RootState {
    fn default() -> Self {
        Self {
            left: Container::new("", ContainerKind::Player, 0),
            right: Container::new("", ContainerKind::Other(String::new()), 0),
        }
    }
}

impl RootState {
    /// Creates a state from two containers.
    #[must_use]
    pub const fn new(left: Container, right: Container) -> Self {
        Self { left, right }
    }

    /// The container at an endpoint, if open.
    #[must_use]
    pub fn container(&self, endpoint: Endpoint) -> Option<&Container> {
        match endpoint {
            Endpoint::Left => Some(&self.left),
            Endpoint::LeftBackpack => self.left.backpack.as_deref(),
            Endpoint::Right => Some(&self.right),
            Endpoint::RightBackpack => self.right.backpack.as_deref(),
        }
    }

    /// Mutable container at an endpoint, if open.
    pub fn container_mut(&mut self, endpoint: Endpoint) -> Option<&mut Container> {
        match endpoint {
            Endpoint::Left => Some(&mut self.left),
            Endpoint::LeftBackpack => self.left.backpack.as_deref_mut(),
            Endpoint::Right => Some(&mut self.right),
            Endpoint::RightBackpack => self.right.backpack.as_deref_mut(),
        }
    }

    /// The container at an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::EndpointUnavailable`] if it is not open.
    pub fn require(&self, endpoint: Endpoint) -> InventoryResult<&Container> {
        self.container(endpoint)
            .ok_or(InventoryError::EndpointUnavailable(endpoint))
    }

    /// Mutable variant of [`RootState::require`].
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::EndpointUnavailable`] if it is not open.
    pub fn require_mut(&mut self, endpoint: Endpoint) -> InventoryResult<&mut Container> {
        self.container_mut(endpoint)
            .ok_or(InventoryError::EndpointUnavailable(endpoint))
    }

    /// Item at a slot reference.
    #[must_use]
    pub fn item(&self, at: SlotRef) -> Option<&ItemInstance> {
        self.container(at.endpoint).and_then(|c| c.item(at.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_without_backpacks() {
        let state = RootState::default();
        assert!(state.container(Endpoint::Left).is_some());
        assert!(state.container(Endpoint::LeftBackpack).is_none());
        assert_eq!(
            state.require(Endpoint::RightBackpack).unwrap_err(),
            InventoryError::EndpointUnavailable(Endpoint::RightBackpack)
        );
    }
}
