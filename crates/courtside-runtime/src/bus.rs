// crates/courtside-runtime/src/bus.rs
// ============================================================================
// Module: In-Process Event Bus
// Description: Bounded fan-out pub/sub for live updates.
// Purpose: Deliver fire-and-forget events to SSE handlers and the chat bot.
// Dependencies: serde_json, tokio
// ============================================================================

//! ## Overview
//! The bus is in-process only: `publish` fans an event out to every
//! subscriber of its type plus the wildcard subscribers. Buffers are
//! bounded; overflow drops the oldest events (subscribers observe a lag, not
//! an error). Nothing is persisted and nothing crosses process boundaries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::broadcast;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default per-subscriber buffer capacity.
const DEFAULT_CAPACITY: usize = 256;

/// Wildcard subscription type.
pub const WILDCARD: &str = "*";

// ============================================================================
// SECTION: Bus Event
// ============================================================================

/// One published event.
#[derive(Debug, Clone)]
pub struct BusEvent {
    /// Dotted event type.
    pub event_type: String,
    /// Structured payload.
    pub payload: Value,
}

// ============================================================================
// SECTION: Event Bus
// ============================================================================

/// In-process fan-out bus with bounded, drop-oldest buffers.
pub struct EventBus {
    /// Broadcast channel per event type (plus the wildcard channel).
    channels: Mutex<BTreeMap<String, broadcast::Sender<BusEvent>>>,
    /// Per-subscriber buffer capacity.
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    /// Creates a bus with the given per-subscriber capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { channels: Mutex::new(BTreeMap::new()), capacity: capacity.max(1) }
    }

    /// Returns the sender for a type, creating the channel on first use.
    fn sender(&self, event_type: &str) -> Option<broadcast::Sender<BusEvent>> {
        let mut channels = self.channels.lock().ok()?;
        Some(
            channels
                .entry(event_type.to_string())
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .clone(),
        )
    }

    /// Publishes an event to its type channel and the wildcard channel.
    ///
    /// Fire-and-forget: delivery failures (no subscribers) are ignored and
    /// slow subscribers lose their oldest buffered events.
    pub fn publish(&self, event_type: &str, payload: Value) {
        let event = BusEvent { event_type: event_type.to_string(), payload };
        for channel in [event_type, WILDCARD] {
            if let Some(sender) = self.sender(channel) {
                let _ = sender.send(event.clone());
            }
        }
    }

    /// Subscribes to one event type (or [`WILDCARD`] for everything).
    #[must_use]
    pub fn subscribe(&self, event_type: &str) -> broadcast::Receiver<BusEvent> {
        self.sender(event_type).map_or_else(
            || broadcast::channel(self.capacity).1,
            |sender| sender.subscribe(),
        )
    }
}
