//! # Transport Layer
//!
//! The request/response channel to the authority.
//!
//! ## Design
//!
//! - [`RemoteChannel`] is the only seam between the engine and the outside world
//! - Transport failures are values, never panics; a failed confirmation
//!   is a rejection
//! - [`ChannelCatalog`] lets the item catalog fetch unknown entries through
//!   the same channel

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use satchel_inventory::{CatalogEntry, CatalogSource};

use crate::protocol::{operation, Outcome, RejectReason, Request, Response};

/// Errors raised by a remote channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No answer within the deadline.
    #[error("'{operation}' timed out after {millis} ms")]
    Timeout {
        /// The operation.
        operation: String,
        /// The deadline.
        millis: u64,
    },
    /// The channel is gone.
    #[error("channel closed")]
    Closed,
    /// Any other failure.
    #[error("transport failure: {0}")]
    Failed(String),
}

/// Result type for channel operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Request/response channel to the authority.
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    /// Sends `payload` under `operation` and waits for the raw response.
    async fn request(&self, operation: &str, payload: Value) -> TransportResult<Value>;
}

/// Channel statistics.
#[derive(Debug, Default)]
pub struct ChannelStats {
    /// Requests sent.
    pub requests_sent: AtomicU64,
    /// Confirmations accepted.
    pub fulfilled: AtomicU64,
    /// Confirmations refused by the authority.
    pub refused: AtomicU64,
    /// Requests that failed in transport.
    pub transport_failures: AtomicU64,
}

impl ChannelStats {
    /// Records the outcome of one confirmation.
    pub fn record(&self, outcome: &Outcome) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            Outcome::Fulfilled => &self.fulfilled,
            Outcome::Rejected(RejectReason::Refused(_)) => &self.refused,
            Outcome::Rejected(RejectReason::Transport(_)) => &self.transport_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Sends a request and maps the answer (or its absence) to an [`Outcome`].
pub async fn confirm<C>(channel: &C, request: &Request) -> Outcome
where
    C: RemoteChannel + ?Sized,
{
    match channel.request(request.operation(), request.payload()).await {
        Ok(raw) => Response::decode(raw).into_outcome(),
        Err(error) => {
            tracing::warn!(operation = request.operation(), %error, "confirmation failed in transport");
            Outcome::Rejected(RejectReason::Transport(error.to_string()))
        }
    }
}

/// Catalog source backed by a remote channel (`getItemData`).
pub struct ChannelCatalog<'a, C: ?Sized> {
    channel: &'a C,
}

impl<'a, C: ?Sized> ChannelCatalog<'a, C> {
    /// Wraps a channel.
    #[must_use]
    pub const fn new(channel: &'a C) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl<C> CatalogSource for ChannelCatalog<'_, C>
where
    C: RemoteChannel + ?Sized,
{
    async fn item_data(&self, name: &str) -> Option<CatalogEntry> {
        let raw = match self
            .channel
            .request(operation::GET_ITEM_DATA, Value::String(name.to_owned()))
            .await
        {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(name, %error, "catalog fetch failed");
                return None;
            }
        };
        let body = match Response::decode(raw) {
            Response::Envelope {
                success: true,
                data: Some(data),
                ..
            } => data,
            Response::Other(body) => body,
            _ => return None,
        };
        match serde_json::from_value::<CatalogEntry>(body) {
            Ok(entry) if !entry.name.is_empty() => Some(entry),
            Ok(_) => None,
            Err(error) => {
                tracing::warn!(name, %error, "malformed catalog entry");
                None
            }
        }
    }
}
