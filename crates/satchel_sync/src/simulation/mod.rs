//! # Authority Simulation
//!
//! An in-process stand-in for the remote authority, for tests and demos.
//!
//! ## Features
//!
//! - Latency and jitter
//! - Random refusals and stalls
//! - Scripted verdicts that override the random ones
//! - `getItemData` answered from a local catalog
//! - A log of every request received

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use satchel_inventory::ItemCatalog;

use crate::protocol::operation;
use crate::transport::{RemoteChannel, TransportError, TransportResult};

/// Behaviour of the simulated authority.
#[derive(Clone, Debug)]
pub struct AuthorityConditions {
    /// Base latency in milliseconds.
    pub base_latency_ms: u32,
    /// Jitter (variance) in milliseconds.
    pub jitter_ms: u32,
    /// Refused confirmations (0-100).
    pub refusal_percent: u8,
    /// Confirmations that never answer (0-100).
    pub stall_percent: u8,
}

impl AuthorityConditions {
    /// Instant, always accepts.
    pub const PERFECT: Self = Self {
        base_latency_ms: 0,
        jitter_ms: 0,
        refusal_percent: 0,
        stall_percent: 0,
    };

    /// Typical server round trip.
    pub const GOOD: Self = Self {
        base_latency_ms: 20,
        jitter_ms: 5,
        refusal_percent: 0,
        stall_percent: 0,
    };

    /// Slow server that sometimes refuses.
    pub const POOR: Self = Self {
        base_latency_ms: 100,
        jitter_ms: 50,
        refusal_percent: 10,
        stall_percent: 2,
    };

    /// Refuses or stalls a large share of requests.
    pub const HOSTILE: Self = Self {
        base_latency_ms: 30,
        jitter_ms: 20,
        refusal_percent: 40,
        stall_percent: 10,
    };

    /// Latency for one request.
    #[must_use]
    pub fn generate_latency(&self, rng_value: u32) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            i64::from(rng_value % (self.jitter_ms * 2)) - i64::from(self.jitter_ms)
        } else {
            0
        };
        let latency = (i64::from(self.base_latency_ms) + jitter).max(0);
        Duration::from_millis(latency.unsigned_abs())
    }

    /// Picks a verdict from two random values.
    #[must_use]
    pub fn draw_verdict(&self, refusal_roll: u32, stall_roll: u32) -> Verdict {
        if (stall_roll % 100) < u32::from(self.stall_percent) {
            Verdict::Stall
        } else if (refusal_roll % 100) < u32::from(self.refusal_percent) {
            Verdict::Refuse(Some("simulated refusal".to_owned()))
        } else {
            Verdict::Accept
        }
    }
}

impl Default for AuthorityConditions {
    fn default() -> Self {
        Self::GOOD
    }
}

/// How the authority answers one confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Answers `true`.
    Accept,
    /// Answers `{ success: false, error }`.
    Refuse(Option<String>),
    /// Fails in transport.
    Fail,
    /// Never answers.
    Stall,
}

/// Minimal LCG (MINSTD); deterministic per seed.
#[derive(Debug)]
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    const fn new(seed: u64) -> Self {
        Self {
            state: if seed % 2_147_483_647 == 0 { 1 } else { seed },
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn next(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(48271).wrapping_rem(2_147_483_647);
        self.state as u32
    }
}

/// A request the authority received.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceivedRequest {
    /// Operation name.
    pub operation: String,
    /// Payload.
    pub payload: Value,
}

/// Simulated authority.
#[derive(Debug)]
pub struct SimulatedAuthority {
    conditions: AuthorityConditions,
    rng: Mutex<SimpleRng>,
    script: Mutex<VecDeque<Verdict>>,
    received: Mutex<Vec<ReceivedRequest>>,
    catalog: ItemCatalog,
}

impl SimulatedAuthority {
    /// Creates an authority with a seeded random source.
    #[must_use]
    pub fn new(conditions: AuthorityConditions, catalog: ItemCatalog, seed: u64) -> Self {
        Self {
            conditions,
            rng: Mutex::new(SimpleRng::new(seed)),
            script: Mutex::new(VecDeque::new()),
            received: Mutex::new(Vec::new()),
            catalog,
        }
    }

    /// An instant authority that accepts everything not scripted.
    #[must_use]
    pub fn perfect(catalog: ItemCatalog) -> Self {
        Self::new(AuthorityConditions::PERFECT, catalog, 1)
    }

    /// Queues verdicts for the next confirmations, in order.
    pub fn script(&self, verdicts: impl IntoIterator<Item = Verdict>) {
        self.script.lock().extend(verdicts);
    }

    /// Requests received so far.
    #[must_use]
    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().clone()
    }

    /// Operation names received so far.
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        self.received.lock().iter().map(|r| r.operation.clone()).collect()
    }

    fn next_verdict(&self) -> (Verdict, Duration) {
        let mut rng = self.rng.lock();
        let latency = self.conditions.generate_latency(rng.next());
        let scripted = self.script.lock().pop_front();
        let verdict = scripted.unwrap_or_else(|| {
            let refusal_roll = rng.next();
            let stall_roll = rng.next();
            self.conditions.draw_verdict(refusal_roll, stall_roll)
        });
        (verdict, latency)
    }

    fn item_data(&self, payload: &Value) -> Value {
        let entry = payload.as_str().and_then(|name| self.catalog.get(name));
        match entry {
            Some(entry) => serde_json::to_value(entry).unwrap_or(Value::Null),
            None => Value::Null,
        }
    }
}

#[async_trait]
impl RemoteChannel for SimulatedAuthority {
    async fn request(&self, operation: &str, payload: Value) -> TransportResult<Value> {
        self.received.lock().push(ReceivedRequest {
            operation: operation.to_owned(),
            payload: payload.clone(),
        });

        if operation == operation::GET_ITEM_DATA {
            return Ok(self.item_data(&payload));
        }

        let (verdict, latency) = self.next_verdict();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        tracing::trace!(operation, ?verdict, "authority verdict");
        match verdict {
            Verdict::Accept => Ok(Value::Bool(true)),
            Verdict::Refuse(error) => Ok(json!({ "success": false, "error": error })),
            Verdict::Fail => Err(TransportError::Failed("simulated failure".to_owned())),
            Verdict::Stall => {
                std::future::pending::<()>().await;
                Err(TransportError::Closed)
            }
        }
    }
}
