//! # Confirmation Ledger
//!
//! Optimistic writes with per-request rollback.
//!
//! ## How It Works
//!
//! 1. The intent snapshots `left` and `right` and opens a ticket
//! 2. The transfer operator mutates local state immediately
//! 3. The request travels to the authority
//! 4. Fulfilled: the ticket is committed and the snapshot discarded
//! 5. Rejected: the snapshot is restored verbatim
//!
//! ```text
//! begin:    [T1 snap] [T2 snap]
//!              │         │
//! mutate:   [  op 1  ][  op 2  ]
//!              │         │
//! settle:   T2 ✗ ──► restore T2 snapshot
//!           T1 ✓ ──► discard T1 snapshot
//! ```
//!
//! Each ticket restores only its own snapshot. Overlapping tickets that
//! touch the same container can therefore undo each other's writes;
//! the authority's next refresh repairs such races.

use std::collections::BTreeMap;
use std::time::Instant;

use satchel_inventory::{Container, RootState};

/// Handle of one outstanding confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Raw ticket number.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Verbatim copy of both top-level containers.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// The player container.
    pub left: Container,
    /// The opened container.
    pub right: Container,
}

impl Snapshot {
    /// Captures a state.
    #[must_use]
    pub fn capture(state: &RootState) -> Self {
        Self {
            left: state.left.clone(),
            right: state.right.clone(),
        }
    }

    /// Writes the snapshot back.
    pub fn restore(self, state: &mut RootState) {
        state.left = self.left;
        state.right = self.right;
    }
}

#[derive(Debug)]
struct Pending {
    snapshot: Snapshot,
    operation: &'static str,
    opened_at: Instant,
}

/// What settling a ticket did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settlement {
    /// The optimistic write stands.
    Committed,
    /// The snapshot was restored.
    RolledBack,
    /// The ticket was not outstanding (already settled or abandoned).
    Unknown,
}

/// Outstanding confirmations and their snapshots.
#[derive(Debug, Default)]
pub struct ConfirmationLedger {
    next: u64,
    pending: BTreeMap<Ticket, Pending>,
}

impl ConfirmationLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: 1,
            pending: BTreeMap::new(),
        }
    }

    /// Snapshots `state` and opens a ticket.
    pub fn begin(&mut self, state: &RootState, operation: &'static str) -> Ticket {
        let ticket = Ticket(self.next.max(1));
        self.next = ticket.0 + 1;
        self.pending.insert(
            ticket,
            Pending {
                snapshot: Snapshot::capture(state),
                operation,
                opened_at: Instant::now(),
            },
        );
        tracing::debug!(ticket = ticket.0, operation, "confirmation pending");
        ticket
    }

    /// Snapshots `state`, runs `mutate`, and opens a ticket if it succeeds.
    ///
    /// On error the state is restored and no ticket stays open.
    ///
    /// # Errors
    ///
    /// Propagates the error of `mutate`.
    pub fn apply<F, E>(&mut self, state: &mut RootState, operation: &'static str, mutate: F) -> Result<Ticket, E>
    where
        F: FnOnce(&mut RootState) -> Result<(), E>,
    {
        let ticket = self.begin(state, operation);
        match mutate(state) {
            Ok(()) => Ok(ticket),
            Err(error) => {
                self.rollback(ticket, state);
                Err(error)
            }
        }
    }

    /// Discards the snapshot of a fulfilled ticket.
    pub fn commit(&mut self, ticket: Ticket) -> Settlement {
        match self.pending.remove(&ticket) {
            Some(pending) => {
                tracing::debug!(
                    ticket = ticket.0,
                    operation = pending.operation,
                    elapsed_ms = pending.opened_at.elapsed().as_millis() as u64,
                    "confirmation fulfilled"
                );
                Settlement::Committed
            }
            None => Settlement::Unknown,
        }
    }

    /// Restores the snapshot of a rejected ticket.
    pub fn rollback(&mut self, ticket: Ticket, state: &mut RootState) -> Settlement {
        match self.pending.remove(&ticket) {
            Some(pending) => {
                tracing::info!(ticket = ticket.0, operation = pending.operation, "rolling back optimistic write");
                pending.snapshot.restore(state);
                Settlement::RolledBack
            }
            None => Settlement::Unknown,
        }
    }

    /// Drops every outstanding ticket without restoring anything.
    pub fn abandon_all(&mut self) -> usize {
        let abandoned = self.pending.len();
        if abandoned > 0 {
            tracing::debug!(abandoned, "abandoning outstanding confirmations");
        }
        self.pending.clear();
        abandoned
    }

    /// Whether any confirmation is outstanding.
    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of outstanding confirmations.
    #[inline]
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }
}
