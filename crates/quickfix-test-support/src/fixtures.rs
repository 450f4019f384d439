//! Deterministic sample rows for every admin screen.
//!
//! Identifiers derive from the sample index and timestamps are fixed, so
//! assertions can name exact values instead of capturing them first.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use quickfix_api_models::{
    Category, Guide, GuideDraft, GuideStatus, NewsletterSubscriber, PlanKind, SubscriberDraft,
    Subscription, SubscriptionStatus, SupportTicket, TicketDraft, TicketPriority, TicketStatus,
    UserAccount, UserDraft, UserRole,
};
use quickfix_list_core::ResourceSet;

/// Base instant all fixture timestamps count from.
fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).expect("fixture epoch")
}

/// Identifier for sample `n`, stable across runs.
#[must_use]
pub fn sample_id(n: u8) -> Uuid {
    Uuid::from_u128(u128::from(n) + 1)
}

/// A platform account row for sample index `n`.
#[must_use]
pub fn sample_user(n: u8) -> UserAccount {
    UserAccount {
        id: sample_id(n),
        name: format!("User {n}"),
        email: format!("user{n}@example.com"),
        role: UserRole::Member,
        active: true,
        created_at: epoch(),
    }
}

/// `count` consecutive account rows starting at sample index 0.
#[must_use]
pub fn sample_users(count: u8) -> Vec<UserAccount> {
    (0..count).map(sample_user).collect()
}

/// Wrap rows into the set a backend page of size ten would produce.
#[must_use]
pub fn page_of<R>(items: Vec<R>, total: u64, page: u32) -> ResourceSet<R> {
    ResourceSet::from_page(items, total, page, 10)
}

/// A valid account creation payload.
#[must_use]
pub fn user_draft() -> UserDraft {
    UserDraft {
        name: "New User".into(),
        email: "new.user@example.com".into(),
        role: UserRole::Editor,
        password: "correct-horse".into(),
    }
}

/// An account creation payload that fails every check.
#[must_use]
pub fn invalid_user_draft() -> UserDraft {
    UserDraft {
        name: String::new(),
        email: "not-an-address".into(),
        role: UserRole::Member,
        password: "short".into(),
    }
}

/// A guide row for sample index `n`.
#[must_use]
pub fn sample_guide(n: u8) -> Guide {
    Guide {
        id: sample_id(n),
        title: format!("Guide {n}"),
        slug: format!("guide-{n}"),
        category_id: sample_id(200),
        category_name: Some("Drivetrain".into()),
        status: GuideStatus::Published,
        featured: false,
        updated_at: epoch(),
    }
}

/// A valid guide creation payload.
#[must_use]
pub fn guide_draft() -> GuideDraft {
    GuideDraft {
        title: "Fixing a slipped chain".into(),
        slug: "fixing-a-slipped-chain".into(),
        category_id: sample_id(200),
    }
}

/// A category row for sample index `n`.
#[must_use]
pub fn sample_category(n: u8) -> Category {
    Category {
        id: sample_id(n),
        name: format!("Category {n}"),
        slug: format!("category-{n}"),
        guide_count: u64::from(n) * 3,
    }
}

/// A subscription row for sample index `n`.
#[must_use]
pub fn sample_subscription(n: u8) -> Subscription {
    Subscription {
        id: sample_id(n),
        user_id: sample_id(100),
        user_email: format!("subscriber{n}@example.com"),
        plan: PlanKind::Monthly,
        status: SubscriptionStatus::Active,
        auto_renew: true,
        started_at: epoch(),
        renews_at: Some(epoch()),
    }
}

/// A newsletter signup; `linked` controls whether a platform account exists
/// for the address.
#[must_use]
pub fn sample_subscriber(n: u8, linked: bool) -> NewsletterSubscriber {
    NewsletterSubscriber {
        id: sample_id(n),
        email: format!("reader{n}@example.com"),
        user_id: linked.then(|| sample_id(100)),
        confirmed: false,
        subscribed_at: epoch(),
    }
}

/// A valid newsletter signup payload.
#[must_use]
pub fn subscriber_draft() -> SubscriberDraft {
    SubscriberDraft {
        email: "reader@example.com".into(),
    }
}

/// A support ticket row for sample index `n`.
#[must_use]
pub fn sample_ticket(n: u8) -> SupportTicket {
    SupportTicket {
        id: sample_id(n),
        subject: format!("Ticket {n}"),
        requester_email: format!("rider{n}@example.com"),
        status: TicketStatus::Open,
        priority: TicketPriority::Normal,
        assignee_id: None,
        assignee_name: None,
        updated_at: epoch(),
    }
}

/// A valid ticket creation payload.
#[must_use]
pub fn ticket_draft() -> TicketDraft {
    TicketDraft {
        subject: "Brakes rubbing after wheel swap".into(),
        requester_email: "rider@example.com".into(),
        priority: TicketPriority::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_ids_are_stable_and_distinct() {
        assert_eq!(sample_id(0), sample_id(0));
        assert_ne!(sample_id(0), sample_id(1));
        assert_ne!(sample_id(0), Uuid::nil());
    }

    #[test]
    fn page_of_derives_page_count() {
        let set = page_of(sample_users(10), 23, 1);
        assert_eq!(set.page_count, 3);
        assert_eq!(set.items.len(), 10);
    }

    #[test]
    fn subscriber_linkage_is_controlled() {
        assert!(sample_subscriber(1, true).user_id.is_some());
        assert!(sample_subscriber(1, false).user_id.is_none());
    }
}
