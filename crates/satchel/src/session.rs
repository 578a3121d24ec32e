//! # Session Driver
//!
//! Runs intents against a remote channel.
//!
//! ```text
//! intent ──► fetch unknown source item through the channel
//!        ──lock──► InventoryClient (check + optimistic write) ──unlock──►
//!        ──► channel.request ... timeout ──► Outcome
//!        ──lock──► settle(ticket, outcome) ──unlock──► Completion
//! ```
//!
//! The client lock is never held across the round trip, so pushes and
//! other intents proceed while a confirmation is in flight.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;

use satchel_inventory::{ContainerKind, ItemCatalog};
use satchel_sync::protocol::DecodeError;
use satchel_sync::{
    confirm, ChannelCatalog, ChannelStats, Dispatch, DragSource, DropTarget, IntentAbort, InventoryClient, Outcome,
    PaymentMethod, PushEvent, PushReport, RejectReason, RemoteChannel, Settlement, Ticket, TransportError,
};

use crate::config::EngineConfig;
use crate::events::{InboundPush, PushReceiver};

/// Errors surfaced by the session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The intent failed a local precondition; nothing was sent.
    #[error("intent aborted: {0}")]
    Aborted(#[from] IntentAbort),
    /// A push could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// How a dispatched request ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The authority accepted; the optimistic write stands.
    Confirmed(Ticket),
    /// The authority refused or never answered; local state was restored.
    RolledBack {
        /// The settled ticket.
        ticket: Ticket,
        /// Why.
        reason: RejectReason,
    },
    /// The ticket was abandoned by a setup push before the answer arrived.
    Superseded(Ticket),
    /// A fire-and-forget request was sent.
    Sent {
        /// Operation name.
        operation: &'static str,
        /// The authority's answer.
        outcome: Outcome,
    },
}

impl Completion {
    /// Whether the request took effect.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        match self {
            Self::Confirmed(_) => true,
            Self::Sent { outcome, .. } => outcome.is_fulfilled(),
            Self::RolledBack { .. } | Self::Superseded(_) => false,
        }
    }
}

/// An inventory client bound to a remote channel.
pub struct Session<C: ?Sized> {
    client: Arc<Mutex<InventoryClient>>,
    catalog: ItemCatalog,
    channel: Arc<C>,
    timeout: Duration,
    stats: ChannelStats,
}

impl<C> Session<C>
where
    C: RemoteChannel + ?Sized,
{
    /// Creates a session with an empty client.
    #[must_use]
    pub fn new(config: &EngineConfig, channel: Arc<C>, catalog: ItemCatalog) -> Self {
        let client = InventoryClient::new(config.client_config(), catalog.clone());
        Self {
            client: Arc::new(Mutex::new(client)),
            catalog,
            channel,
            timeout: config.request_timeout(),
            stats: ChannelStats::default(),
        }
    }

    /// Shared handle to the client.
    #[must_use]
    pub fn client(&self) -> Arc<Mutex<InventoryClient>> {
        Arc::clone(&self.client)
    }

    /// Runs `read` against the client under the lock.
    pub fn inspect<R>(&self, read: impl FnOnce(&InventoryClient) -> R) -> R {
        read(&self.client.lock())
    }

    /// Confirmation statistics.
    #[must_use]
    pub const fn stats(&self) -> &ChannelStats {
        &self.stats
    }

    /// Sets the drag quantity.
    pub fn set_drag_quantity(&self, quantity: u32) {
        self.client.lock().set_drag_quantity(quantity);
    }

    /// Sets the half-split modifier.
    pub fn set_precise_split(&self, active: bool) {
        self.client.lock().set_precise_split(active);
    }

    /// Drop gesture.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Aborted`] if a local precondition fails.
    pub async fn drop_item(&self, source: &DragSource, target: &DropTarget) -> SessionResult<Completion> {
        self.resolve_item(source).await;
        let dispatch = self.client.lock().drop_item(source, target)?;
        Ok(self.dispatch(dispatch).await)
    }

    /// Quick move to the opposite side.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Aborted`] if a local precondition fails.
    pub async fn quick_move(&self, source: &DragSource) -> SessionResult<Completion> {
        self.resolve_item(source).await;
        let dispatch = self.client.lock().quick_move(source)?;
        Ok(self.dispatch(dispatch).await)
    }

    /// Shop purchase.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Aborted`] if a local precondition fails.
    pub async fn purchase(
        &self,
        shop_slot: u32,
        to_slot: u32,
        payment: Option<PaymentMethod>,
    ) -> SessionResult<Completion> {
        self.resolve_item(&DragSource::new(ContainerKind::Shop, shop_slot)).await;
        let dispatch = self.client.lock().purchase(shop_slot, to_slot, payment)?;
        Ok(self.dispatch(dispatch).await)
    }

    /// Craft enqueue.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Aborted`] if a local precondition fails.
    pub async fn craft(&self, recipe_slot: u32, to_slot: Option<u32>, count: Option<u32>) -> SessionResult<Completion> {
        self.resolve_item(&DragSource::new(ContainerKind::Crafting, recipe_slot)).await;
        let dispatch = self.client.lock().craft(recipe_slot, to_slot, count)?;
        Ok(self.dispatch(dispatch).await)
    }

    /// Craft cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Aborted`] if a local precondition fails.
    pub async fn cancel_craft(&self, position: usize) -> SessionResult<Completion> {
        let dispatch = self.client.lock().cancel_craft(position)?;
        Ok(self.dispatch(dispatch).await)
    }

    /// Utility strip assignment.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Aborted`] if a local precondition fails.
    pub async fn assign_utility(&self, from_slot: u32, utility_slot: u32) -> SessionResult<Completion> {
        let dispatch = self.client.lock().assign_utility(from_slot, utility_slot)?;
        Ok(self.dispatch(dispatch).await)
    }

    /// Sends a dispatch and settles its ticket.
    pub async fn dispatch(&self, dispatch: Dispatch) -> Completion {
        let operation = dispatch.request.operation();
        let outcome = match tokio::time::timeout(self.timeout, confirm(&*self.channel, &dispatch.request)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let error = TransportError::Timeout {
                    operation: operation.to_owned(),
                    millis: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                };
                tracing::warn!(%error, "confirmation timed out");
                Outcome::Rejected(RejectReason::Transport(error.to_string()))
            }
        };
        self.stats.record(&outcome);

        let Some(ticket) = dispatch.ticket else {
            return Completion::Sent { operation, outcome };
        };
        let settlement = self.client.lock().settle(ticket, &outcome);
        match (settlement, outcome) {
            (Settlement::Committed, _) => Completion::Confirmed(ticket),
            (Settlement::RolledBack, Outcome::Rejected(reason)) => Completion::RolledBack { ticket, reason },
            (Settlement::RolledBack, Outcome::Fulfilled) | (Settlement::Unknown, _) => Completion::Superseded(ticket),
        }
    }

    /// Decodes and applies one push, then fetches unknown catalog entries.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Decode`] if the push is malformed; local
    /// state is untouched in that case.
    pub async fn apply_push(&self, name: &str, payload: Value) -> SessionResult<PushReport> {
        let event = PushEvent::decode(name, payload)?;
        let (report, unknown) = {
            let mut client = self.client.lock();
            let report = client.apply_push(event);
            (report, client.take_unknown_items())
        };
        self.prefetch(&unknown).await;
        Ok(report)
    }

    /// Applies every pending push on the bus. Malformed pushes are logged
    /// and skipped.
    pub async fn pump(&self, receiver: &PushReceiver) -> PushReport {
        let mut total = PushReport::default();
        for InboundPush { name, payload } in receiver.drain() {
            match self.apply_push(&name, payload).await {
                Ok(report) => {
                    total.applied += report.applied;
                    total.skipped += report.skipped;
                }
                Err(error) => {
                    tracing::warn!(event = %name, %error, "push dropped");
                    total.skipped += 1;
                }
            }
        }
        total
    }

    /// Fetches the catalog entries of `names` that are not cached yet.
    pub async fn prefetch(&self, names: &[String]) {
        let missing = self.catalog.missing(names.iter().map(String::as_str));
        if missing.is_empty() {
            return;
        }
        let source = ChannelCatalog::new(&*self.channel);
        for name in &missing {
            if self.catalog.fetch(name, &source).await.is_none() {
                tracing::warn!(%name, "authority has no catalog entry");
            }
        }
    }

    /// Fetches the entry of the item `source` points at if the catalog
    /// lacks it. The client lock is released before the round trip.
    async fn resolve_item(&self, source: &DragSource) {
        let unknown = self.client.lock().uncached_source_item(source);
        if let Some(name) = unknown {
            self.prefetch(&[name]).await;
        }
    }
}
