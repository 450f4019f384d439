//! Maps lifecycle events to operator-facing notifications.
//!
//! State handling stays silent; anything the operator should see as a toast
//! is derived here from the event stream instead. Events with no entry in the
//! table (fetch starts, discards, page corrections) stay silent.

use crate::{Event, EventEnvelope, MutationKind};

/// Visual severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A toast-style message for the console operator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Derive the notification that should be shown for `envelope`, if any.
#[must_use]
pub fn notification_for(envelope: &EventEnvelope) -> Option<Notification> {
    match &envelope.event {
        Event::MutationSettled { kind, .. } => Some(Notification::success(settled_message(*kind))),
        Event::MutationRolledBack { message, .. } | Event::MutationRejected { message, .. } => {
            Some(Notification::error(message.clone()))
        }
        Event::FetchFailed { message, .. } => Some(Notification::error(message.clone())),
        Event::SessionRefreshed { description } => Some(Notification {
            level: NotificationLevel::Info,
            message: description.clone(),
        }),
        Event::FetchStarted { .. }
        | Event::FetchApplied { .. }
        | Event::FetchDiscarded { .. }
        | Event::SearchCommitted { .. }
        | Event::PageCorrected { .. }
        | Event::MutationApplied { .. } => None,
    }
}

fn settled_message(kind: MutationKind) -> &'static str {
    match kind {
        MutationKind::Create => "Record created.",
        MutationKind::Update | MutationKind::SetField => "Changes saved.",
        MutationKind::Delete => "Record deleted.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn envelope(event: Event) -> EventEnvelope {
        EventEnvelope {
            id: 1,
            timestamp: Utc::now(),
            event,
        }
    }

    #[test]
    fn settled_mutations_announce_success() {
        let toast = notification_for(&envelope(Event::MutationSettled {
            screen: "users".into(),
            kind: MutationKind::Delete,
            target: None,
        }))
        .expect("settled mutations notify");
        assert_eq!(toast.level, NotificationLevel::Success);
        assert_eq!(toast.message, "Record deleted.");
    }

    #[test]
    fn rollbacks_surface_the_failure_message() {
        let toast = notification_for(&envelope(Event::MutationRolledBack {
            screen: "tickets".into(),
            kind: MutationKind::SetField,
            target: None,
            message: "The ticket could not be updated.".into(),
        }))
        .expect("rollbacks notify");
        assert_eq!(toast.level, NotificationLevel::Error);
        assert_eq!(toast.message, "The ticket could not be updated.");
    }

    #[test]
    fn optimistic_application_stays_silent() {
        assert!(
            notification_for(&envelope(Event::MutationApplied {
                screen: "guides".into(),
                kind: MutationKind::Update,
                target: None,
            }))
            .is_none()
        );
        assert!(
            notification_for(&envelope(Event::PageCorrected {
                screen: "guides".into(),
                from: 4,
                to: 3,
            }))
            .is_none()
        );
    }
}
