//! Event bus shared by the QuickFix admin console.
//!
//! Every list screen publishes its lifecycle here: fetches starting and
//! settling, optimistic mutations being applied and confirmed (or rolled
//! back), and corrections such as page clamping. Identifiers are sequential,
//! so reconnecting consumers (the console's activity feed, audit sinks) can
//! replay what they missed by passing the last id they saw. Internally the
//! bus wraps `tokio::broadcast` with a bounded replay ring; once the ring is
//! full the oldest envelopes fall off, which mirrors the broadcast channel's
//! own lag behaviour.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::sync::broadcast::{Receiver, Sender};
use uuid::Uuid;

pub mod notify;

/// Identifier assigned to each event emitted by the console.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Discriminates the four write operations a list screen can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    SetField,
}

impl MutationKind {
    /// Stable lowercase label, used for log fields and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
            MutationKind::SetField => "set_field",
        }
    }
}

/// Typed lifecycle events surfaced by the list controllers.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    FetchStarted {
        screen: String,
        epoch: u64,
        page: u32,
    },
    FetchApplied {
        screen: String,
        epoch: u64,
        page: u32,
        total: u64,
    },
    FetchDiscarded {
        screen: String,
        epoch: u64,
        latest: u64,
    },
    FetchFailed {
        screen: String,
        epoch: u64,
        message: String,
    },
    SearchCommitted {
        screen: String,
        keyword: String,
    },
    PageCorrected {
        screen: String,
        from: u32,
        to: u32,
    },
    MutationApplied {
        screen: String,
        kind: MutationKind,
        target: Option<Uuid>,
    },
    MutationSettled {
        screen: String,
        kind: MutationKind,
        target: Option<Uuid>,
    },
    MutationRolledBack {
        screen: String,
        kind: MutationKind,
        target: Option<Uuid>,
        message: String,
    },
    MutationRejected {
        screen: String,
        kind: MutationKind,
        target: Option<Uuid>,
        message: String,
    },
    SessionRefreshed {
        description: String,
    },
}

impl Event {
    /// Machine-friendly discriminator for feed consumers.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Event::FetchStarted { .. } => "fetch_started",
            Event::FetchApplied { .. } => "fetch_applied",
            Event::FetchDiscarded { .. } => "fetch_discarded",
            Event::FetchFailed { .. } => "fetch_failed",
            Event::SearchCommitted { .. } => "search_committed",
            Event::PageCorrected { .. } => "page_corrected",
            Event::MutationApplied { .. } => "mutation_applied",
            Event::MutationSettled { .. } => "mutation_settled",
            Event::MutationRolledBack { .. } => "mutation_rolled_back",
            Event::MutationRejected { .. } => "mutation_rejected",
            Event::SessionRefreshed { .. } => "session_refreshed",
        }
    }

    /// Screen label the event belongs to, when it is screen-scoped.
    #[must_use]
    pub fn screen(&self) -> Option<&str> {
        match self {
            Event::FetchStarted { screen, .. }
            | Event::FetchApplied { screen, .. }
            | Event::FetchDiscarded { screen, .. }
            | Event::FetchFailed { screen, .. }
            | Event::SearchCommitted { screen, .. }
            | Event::PageCorrected { screen, .. }
            | Event::MutationApplied { screen, .. }
            | Event::MutationSettled { screen, .. }
            | Event::MutationRolledBack { screen, .. }
            | Event::MutationRejected { screen, .. } => Some(screen),
            Event::SessionRefreshed { .. } => None,
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and
/// emission timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct EventEnvelope {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

/// Shared event bus built on top of `tokio::broadcast`.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    replay: Arc<Mutex<VecDeque<EventEnvelope>>>,
    next_id: Arc<std::sync::atomic::AtomicU64>,
    replay_capacity: usize,
}

impl EventBus {
    /// Construct a new bus with the provided broadcast capacity.
    ///
    /// The broadcast channel uses the same capacity as the replay ring, so a
    /// consumer that lags far enough to drop live events has also lost them
    /// from replay.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "event bus capacity must be positive");
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            replay: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            next_id: Arc::new(std::sync::atomic::AtomicU64::new(1)),
            replay_capacity: capacity,
        }
    }

    /// Construct a bus with the default replay ring size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }

    /// Publish a new event, assigning it the next sequential identifier.
    ///
    /// # Panics
    ///
    /// Panics if the replay ring mutex has been poisoned.
    #[must_use]
    pub fn publish(&self, event: Event) -> EventId {
        let id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };

        {
            let mut replay = self.replay.lock().expect("event replay mutex poisoned");
            if replay.len() == self.replay_capacity {
                replay.pop_front();
            }
            replay.push_back(envelope.clone());
        }

        let _ = self.sender.send(envelope);
        id
    }

    /// Subscribe to the bus, replaying any buffered events newer than `since_id`.
    ///
    /// The live receiver is attached before the replay ring is copied, so an
    /// event published while the subscription forms lands in the backlog, the
    /// channel, or both; the stream drops the duplicate.
    ///
    /// # Panics
    ///
    /// Panics if the replay ring mutex has been poisoned.
    #[must_use]
    pub fn subscribe(&self, since_id: Option<EventId>) -> EventStream {
        let receiver = self.sender.subscribe();
        let mut backlog = VecDeque::new();
        if let Some(since) = since_id {
            let replay = self.replay.lock().expect("event replay mutex poisoned");
            for item in replay.iter() {
                if item.id > since {
                    backlog.push_back(item.clone());
                }
            }
        }

        EventStream {
            backlog,
            receiver,
            cursor: 0,
        }
    }

    /// Returns the last assigned identifier, if any events have been published.
    ///
    /// # Panics
    ///
    /// Panics if the replay ring mutex has been poisoned.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        let replay = self.replay.lock().expect("event replay mutex poisoned");
        replay.back().map(|event| event.id)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream wrapper that yields events from the replay backlog first, then from
/// the live broadcast channel. Each event is delivered at most once, in
/// identifier order.
pub struct EventStream {
    backlog: VecDeque<EventEnvelope>,
    receiver: Receiver<EventEnvelope>,
    cursor: EventId,
}

impl EventStream {
    /// Receive the next event, draining the replay backlog before going live.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        loop {
            // The live channel overlaps the tail of the backlog; the cursor
            // drops anything already yielded.
            if let Some(event) = self.backlog.pop_front() {
                if event.id > self.cursor {
                    self.cursor = event.id;
                    return Some(event);
                }
                continue;
            }

            match self.receiver.recv().await {
                Ok(event) => {
                    if event.id > self.cursor {
                        self.cursor = event.id;
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
