//! Event types for the LucidInvest event system
//!
//! Provides shared event definitions and the EventBus used by the portal.
//! Events are broadcast via EventBus and serialized for SSE transmission;
//! sync progress events are the operator's only feedback channel during a
//! monthly sync run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// LucidInvest event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LucidEvent {
    /// A monthly sync run started
    SyncStarted {
        /// Reporting-month label being synced
        month: String,
        /// Whether the day-of-month gate was bypassed
        forced: bool,
        timestamp: DateTime<Utc>,
    },

    /// Human-readable progress line from the sync orchestrator
    SyncProgress {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A monthly sync run finished
    SyncCompleted {
        /// Reporting-month label that was synced
        month: String,
        /// Number of new analyses persisted by this run
        new_analyses: usize,
        timestamp: DateTime<Utc>,
    },

    /// A monthly sync run aborted on an unrecoverable error
    SyncFailed {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// An analysis was created or regenerated
    AnalysisSaved {
        ticker: String,
        /// Reporting-month label of the saved analysis
        month: String,
        timestamp: DateTime<Utc>,
    },

    /// A subscription changed out-of-band (payment webhook)
    SubscriptionChanged {
        email: String,
        tier: String,
        status: String,
        timestamp: DateTime<Utc>,
    },
}

impl LucidEvent {
    /// Event type name for SSE event framing
    pub fn event_type(&self) -> &str {
        match self {
            LucidEvent::SyncStarted { .. } => "SyncStarted",
            LucidEvent::SyncProgress { .. } => "SyncProgress",
            LucidEvent::SyncCompleted { .. } => "SyncCompleted",
            LucidEvent::SyncFailed { .. } => "SyncFailed",
            LucidEvent::AnalysisSaved { .. } => "AnalysisSaved",
            LucidEvent::SubscriptionChanged { .. } => "SubscriptionChanged",
        }
    }

    /// Progress event with the current timestamp
    pub fn progress(message: impl Into<String>) -> Self {
        LucidEvent::SyncProgress {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Broadcast event bus shared by the orchestrator and the SSE endpoint
///
/// Wraps tokio::sync::broadcast: subscribers receive events emitted after
/// subscription; slow subscribers drop the oldest events past capacity.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LucidEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<LucidEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring the no-subscriber case
    ///
    /// Progress events are advisory; a sync run must proceed whether or not
    /// anyone is watching the stream.
    pub fn emit_lossy(&self, event: LucidEvent) {
        let _ = self.tx.send(event);
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
