use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

use quickfix_api_models::{
    NewsletterSubscriber, SubscriberField, SupportTicket, TicketField, UserAccount, UserFilter,
    UserPatch, UserRole,
};
use quickfix_controller::{ControllerConfig, ListController, ListSnapshot, SessionFeed};
use quickfix_events::{Event, EventBus, EventStream, MutationKind};
use quickfix_list_core::{GatewayError, ListResource, MutationOutcome, ResourceSet};
use quickfix_telemetry::Metrics;
use quickfix_test_support::fixtures::{
    invalid_user_draft, page_of, sample_id, sample_subscriber, sample_ticket, sample_user,
    sample_users, user_draft,
};
use quickfix_test_support::mocks::{RecordedMutation, ScriptedGateway};

const WAIT: Duration = Duration::from_secs(2);
const WINDOW: Duration = Duration::from_millis(40);

fn test_config() -> ControllerConfig {
    ControllerConfig {
        page_size: 10,
        debounce_window: WINDOW,
    }
}

fn controller_for<R: ListResource>(
    gateway: &ScriptedGateway<R>,
    bus: &EventBus,
) -> Result<ListController<ScriptedGateway<R>>> {
    Ok(ListController::new(
        gateway.clone(),
        bus.clone(),
        Metrics::new()?,
        &test_config(),
    ))
}

/// Wait until the snapshot stream publishes a state matching `predicate`.
async fn wait_for<R, F>(
    rx: &mut watch::Receiver<ListSnapshot<R>>,
    mut predicate: F,
) -> Result<ListSnapshot<R>>
where
    R: Clone,
    F: FnMut(&ListSnapshot<R>) -> bool,
{
    loop {
        {
            let current = rx.borrow_and_update();
            if predicate(&current) {
                return Ok(current.clone());
            }
        }
        timeout(WAIT, rx.changed())
            .await
            .context("timed out waiting for a matching snapshot")??;
    }
}

/// Collect events until one matches `predicate`, returning everything seen.
async fn wait_for_event<F>(stream: &mut EventStream, mut predicate: F) -> Result<Vec<Event>>
where
    F: FnMut(&Event) -> bool,
{
    let mut seen = Vec::new();
    loop {
        let envelope = timeout(WAIT, stream.next())
            .await
            .context("timed out waiting for a matching event")?
            .context("event stream closed")?;
        let matched = predicate(&envelope.event);
        seen.push(envelope.event);
        if matched {
            return Ok(seen);
        }
    }
}

/// Collect events until the stream stays quiet for a beat.
async fn drain_events(stream: &mut EventStream) -> Vec<Event> {
    let mut seen = Vec::new();
    while let Ok(Some(envelope)) = timeout(Duration::from_millis(60), stream.next()).await {
        seen.push(envelope.event);
    }
    seen
}

#[tokio::test]
async fn initial_fetch_fills_the_first_page() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(3), 3, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    assert!(controller.snapshot().is_blank());
    controller.start();

    let snapshot = wait_for(&mut rx, |snap| !snap.loading && !snap.items.is_empty()).await?;
    assert_eq!(snapshot.items.len(), 3);
    assert_eq!(snapshot.total, 3);
    assert_eq!(snapshot.page, 1);
    assert!(!snapshot.pagination_visible());

    let calls = gateway.list_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].page, 1);
    assert_eq!(calls[0].page_size, 10);
    assert_eq!(calls[0].keyword, None);
    Ok(())
}

#[tokio::test]
async fn a_superseded_fetch_never_overwrites_newer_rows() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list_after(Duration::from_millis(80), Ok(page_of(sample_users(2), 2, 1)));
    let bus = EventBus::new();
    let mut events = bus.subscribe(None);
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    sleep(Duration::from_millis(10)).await;

    gateway.push_list(Ok(page_of(sample_users(5), 5, 1)));
    controller.refresh();

    let seen = wait_for_event(&mut events, |event| {
        matches!(event, Event::FetchDiscarded { epoch: 1, .. })
    })
    .await?;
    assert!(
        seen.iter()
            .any(|event| matches!(event, Event::FetchApplied { epoch: 2, .. }))
    );

    let snapshot = wait_for(&mut rx, |snap| !snap.loading).await?;
    assert_eq!(snapshot.items.len(), 5, "the older response must not land");
    assert_eq!(gateway.list_call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn changing_the_filter_returns_to_the_first_page() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(10), 35, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.page_count == 4).await?;

    gateway.push_list(Ok(page_of(sample_users(10), 35, 3)));
    controller.set_page(3);
    wait_for(&mut rx, |snap| snap.page == 3 && !snap.loading).await?;

    gateway.push_list(Ok(page_of(sample_users(4), 4, 1)));
    controller.set_filter(UserFilter {
        role: Some(UserRole::Editor),
    });
    let snapshot = wait_for(&mut rx, |snap| {
        snap.page == 1 && !snap.loading && snap.total == 4
    })
    .await?;
    assert_eq!(snapshot.items.len(), 4);

    let calls = gateway.list_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2].page, 1, "a filter change starts over at page one");
    assert_eq!(
        calls[2].filter,
        UserFilter {
            role: Some(UserRole::Editor)
        }
    );
    Ok(())
}

#[tokio::test]
async fn page_requests_beyond_the_end_clamp_to_the_last_page() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(10), 31, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.page_count == 4).await?;

    gateway.push_list(Ok(page_of(vec![sample_user(30)], 31, 4)));
    controller.set_page(99);
    let snapshot = wait_for(&mut rx, |snap| snap.page == 4 && !snap.loading).await?;
    assert_eq!(snapshot.items.len(), 1);

    let calls = gateway.list_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].page, 4);
    Ok(())
}

#[tokio::test]
async fn unchanged_page_filter_and_keyword_do_not_refetch() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(10), 35, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.total == 35).await?;

    controller.set_page(1);
    controller.set_page(0);
    controller.set_filter(UserFilter::default());
    controller.search_input("   ");
    sleep(WINDOW * 3).await;

    assert_eq!(
        gateway.list_call_count(),
        1,
        "no-op transitions must stay quiet"
    );
    assert_eq!(controller.snapshot().keyword, None);
    Ok(())
}

#[tokio::test]
async fn rapid_keystrokes_commit_one_search_for_the_final_text() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(10), 35, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.total == 35).await?;

    gateway.push_list(Ok(page_of(sample_users(10), 35, 2)));
    controller.set_page(2);
    wait_for(&mut rx, |snap| snap.page == 2 && !snap.loading).await?;

    gateway.push_list(Ok(page_of(sample_users(3), 3, 1)));
    controller.search_input("c");
    controller.search_input("ch");
    controller.search_input("chain");

    let echoed = controller.snapshot();
    assert_eq!(echoed.search_text, "chain", "typed text echoes immediately");
    assert_eq!(echoed.keyword, None, "the keyword waits for the quiet window");

    let snapshot = wait_for(&mut rx, |snap| {
        snap.keyword.as_deref() == Some("chain") && !snap.loading
    })
    .await?;
    assert_eq!(snapshot.total, 3);
    assert_eq!(snapshot.page, 1);
    assert!(
        !snapshot.pagination_visible(),
        "one page of matches needs no pager"
    );

    sleep(WINDOW * 2).await;
    let calls = gateway.list_calls();
    assert_eq!(calls.len(), 3, "three keystrokes coalesce into one fetch");
    assert_eq!(calls[2].keyword.as_deref(), Some("chain"));
    assert_eq!(calls[2].page, 1, "a committed search starts over at page one");
    Ok(())
}

#[tokio::test]
async fn a_failed_update_rolls_the_rows_back() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(3), 3, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.items.len() == 3).await?;

    gateway.push_update_after(
        Duration::from_millis(50),
        Err(GatewayError::Api {
            status: 422,
            message: Some("Email already in use.".into()),
        }),
    );
    let patch = UserPatch {
        name: "Renamed Rider".into(),
        email: "renamed@example.com".into(),
        role: UserRole::Member,
    };
    let target = sample_user(1).id;

    let (outcome, observed) = tokio::join!(
        controller.update(target, patch),
        wait_for(&mut rx, |snap| {
            snap.items.iter().any(|user| user.name == "Renamed Rider")
        })
    );
    observed?;
    assert_eq!(
        outcome,
        MutationOutcome::RolledBack {
            message: "Email already in use.".into()
        }
    );

    let snapshot = wait_for(&mut rx, |snap| {
        snap.items.iter().all(|user| user.name != "Renamed Rider")
    })
    .await?;
    assert_eq!(snapshot.items[1].name, "User 1", "the previous rows are back");
    assert_eq!(
        snapshot.error.as_deref(),
        Some("Email already in use."),
        "the failure reaches the snapshot"
    );
    assert_eq!(gateway.mutations(), vec![RecordedMutation::Update(target)]);
    Ok(())
}

#[tokio::test]
async fn a_failed_delete_restores_the_row() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(3), 3, 1)));
    let bus = EventBus::new();
    let mut events = bus.subscribe(None);
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.items.len() == 3).await?;

    gateway.push_delete_after(
        Duration::from_millis(50),
        Err(GatewayError::Api {
            status: 409,
            message: Some("The user still owns published guides.".into()),
        }),
    );
    let target = sample_user(1).id;

    let (outcome, observed) = tokio::join!(
        controller.delete(target),
        wait_for(&mut rx, |snap| snap.items.len() == 2 && snap.total == 2)
    );
    observed?;
    assert_eq!(
        outcome,
        MutationOutcome::RolledBack {
            message: "The user still owns published guides.".into()
        }
    );

    let snapshot = wait_for(&mut rx, |snap| snap.items.len() == 3).await?;
    assert_eq!(snapshot.total, 3);
    assert_eq!(snapshot.items[1].name, "User 1", "the deleted row is back");
    assert_eq!(
        snapshot.error.as_deref(),
        Some("The user still owns published guides.")
    );
    assert_eq!(gateway.mutations(), vec![RecordedMutation::Delete(target)]);

    wait_for_event(&mut events, |event| {
        matches!(
            event,
            Event::MutationRolledBack {
                kind: MutationKind::Delete,
                target: Some(id),
                ..
            } if *id == target
        )
    })
    .await?;
    Ok(())
}

#[tokio::test]
async fn rollback_is_skipped_when_a_fetch_replaced_the_rows_mid_flight() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(3), 3, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.items.len() == 3).await?;

    gateway.push_update_after(
        Duration::from_millis(80),
        Err(GatewayError::Transport {
            detail: "socket closed".into(),
        }),
    );
    let patch = UserPatch {
        name: "Renamed Rider".into(),
        email: "renamed@example.com".into(),
        role: UserRole::Member,
    };

    let (outcome, ()) = tokio::join!(controller.update(sample_user(0).id, patch), async {
        sleep(Duration::from_millis(20)).await;
        gateway.push_list(Ok(page_of(sample_users(5), 5, 1)));
        controller.refresh();
    });
    assert!(matches!(outcome, MutationOutcome::RolledBack { .. }));

    let snapshot = wait_for(&mut rx, |snap| !snap.loading && snap.items.len() == 5).await?;
    assert_eq!(
        snapshot.items[0].name, "User 0",
        "the fetched rows stand; no stale rollback is applied"
    );
    assert_eq!(snapshot.total, 5);
    Ok(())
}

#[tokio::test]
async fn create_shows_a_provisional_row_then_adopts_the_backend_page() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(10), 35, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.total == 35).await?;

    let mut created = sample_user(40);
    created.name = "New User".into();
    gateway.push_create_after(Duration::from_millis(50), Ok(created));
    gateway.push_list(Ok(page_of(sample_users(10), 36, 1)));

    let (outcome, observed) = tokio::join!(
        controller.create(user_draft()),
        wait_for(&mut rx, |snap| {
            snap.total == 36
                && snap
                    .items
                    .first()
                    .is_some_and(|user| user.name == "New User")
        })
    );
    let provisional = observed?;
    assert_eq!(outcome, MutationOutcome::Settled);
    assert_eq!(provisional.items.len(), 10, "a full page stays a full page");

    let snapshot = wait_for(&mut rx, |snap| {
        !snap.loading
            && snap.total == 36
            && snap.items.first().is_some_and(|user| user.name == "User 0")
    })
    .await?;
    assert_eq!(snapshot.items.len(), 10);
    assert_eq!(
        gateway.list_call_count(),
        2,
        "a settled create re-fetches the page"
    );
    assert_eq!(gateway.mutations(), vec![RecordedMutation::Create]);
    Ok(())
}

#[tokio::test]
async fn deleting_the_last_row_of_the_final_page_steps_back_a_page() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(10), 31, 1)));
    let bus = EventBus::new();
    let mut events = bus.subscribe(None);
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.page_count == 4).await?;

    gateway.push_list(Ok(page_of(vec![sample_user(30)], 31, 4)));
    controller.set_page(4);
    wait_for(&mut rx, |snap| snap.page == 4 && !snap.loading).await?;

    gateway.push_delete(Ok(()));
    gateway.push_list(Ok(page_of(sample_users(10), 30, 3)));
    let outcome = controller.delete(sample_user(30).id).await;
    assert_eq!(outcome, MutationOutcome::Settled);

    let snapshot = wait_for(&mut rx, |snap| {
        !snap.loading && snap.page == 3 && snap.total == 30
    })
    .await?;
    assert_eq!(snapshot.page_count, 3);
    assert_eq!(snapshot.items.len(), 10);

    let calls = gateway.list_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2].page, 3, "the empty page is never re-asked for");

    let seen = wait_for_event(&mut events, |event| {
        matches!(
            event,
            Event::MutationSettled {
                kind: MutationKind::Delete,
                ..
            }
        )
    })
    .await?;
    assert!(
        seen.iter()
            .any(|event| matches!(event, Event::PageCorrected { from: 4, to: 3, .. }))
    );
    Ok(())
}

#[tokio::test]
async fn deleting_a_row_mid_page_stays_on_the_page() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(3), 3, 1)));
    let bus = EventBus::new();
    let mut events = bus.subscribe(None);
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.items.len() == 3).await?;

    gateway.push_delete(Ok(()));
    gateway.push_list(Ok(page_of(vec![sample_user(0), sample_user(2)], 2, 1)));
    let outcome = controller.delete(sample_user(1).id).await;
    assert_eq!(outcome, MutationOutcome::Settled);

    let snapshot = wait_for(&mut rx, |snap| !snap.loading && snap.total == 2).await?;
    assert_eq!(snapshot.page, 1);
    assert_eq!(snapshot.items.len(), 2);

    let seen = wait_for_event(&mut events, |event| {
        matches!(
            event,
            Event::MutationSettled {
                kind: MutationKind::Delete,
                ..
            }
        )
    })
    .await?;
    assert!(
        !seen
            .iter()
            .any(|event| matches!(event, Event::PageCorrected { .. })),
        "no page correction while the page still has rows"
    );
    Ok(())
}

#[tokio::test]
async fn a_settled_update_adopts_the_backend_copy_without_refetching() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(3), 3, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.items.len() == 3).await?;

    let mut canonical = sample_user(1);
    canonical.name = "Rider One".into();
    canonical.email = "rider.one@example.com".into();
    gateway.push_update(Ok(canonical));

    let patch = UserPatch {
        name: "Rider 1".into(),
        email: "rider.one@example.com".into(),
        role: UserRole::Member,
    };
    let outcome = controller.update(sample_user(1).id, patch).await;
    assert_eq!(outcome, MutationOutcome::Settled);

    let snapshot = wait_for(&mut rx, |snap| {
        snap.items.get(1).is_some_and(|user| user.name == "Rider One")
    })
    .await?;
    assert_eq!(snapshot.total, 3);
    assert_eq!(
        gateway.list_call_count(),
        1,
        "in-place reconciliation skips the refetch"
    );
    Ok(())
}

#[tokio::test]
async fn reassigning_a_ticket_backfills_the_assignee_name_from_the_backend() -> Result<()> {
    let gateway: ScriptedGateway<SupportTicket> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(vec![sample_ticket(0)], 1, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.items.len() == 1).await?;

    let assignee = sample_id(7);
    let mut canonical = sample_ticket(0);
    canonical.assignee_id = Some(assignee);
    canonical.assignee_name = Some("Casey Lee".into());
    gateway.push_set_field_after(Duration::from_millis(40), Ok(canonical));

    let (outcome, observed) = tokio::join!(
        controller.set_field(sample_ticket(0).id, TicketField::Assignee(Some(assignee))),
        wait_for(&mut rx, |snap| {
            snap.items.first().is_some_and(|ticket| {
                ticket.assignee_id == Some(assignee) && ticket.assignee_name.is_none()
            })
        })
    );
    observed?;
    assert_eq!(outcome, MutationOutcome::Settled);

    let snapshot = wait_for(&mut rx, |snap| {
        snap.items
            .first()
            .is_some_and(|ticket| ticket.assignee_name.as_deref() == Some("Casey Lee"))
    })
    .await?;
    assert_eq!(snapshot.items[0].assignee_id, Some(assignee));
    assert_eq!(gateway.list_call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_backend_call() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(3), 3, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.items.len() == 3).await?;

    let outcome = controller.create(invalid_user_draft()).await;
    let MutationOutcome::Rejected { message } = outcome else {
        panic!("an invalid draft must be rejected, got {outcome:?}");
    };
    assert!(message.contains("valid email address"));
    assert!(
        gateway.mutations().is_empty(),
        "validation failures never reach the network"
    );

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.total, 3, "rejected input leaves the rows untouched");
    assert_eq!(snapshot.items.len(), 3);
    Ok(())
}

#[tokio::test]
async fn unlinked_subscribers_cannot_change_their_preference() -> Result<()> {
    let gateway: ScriptedGateway<NewsletterSubscriber> = ScriptedGateway::new();
    let unlinked = sample_subscriber(0, false);
    let linked = sample_subscriber(1, true);
    gateway.push_list(Ok(page_of(vec![unlinked.clone(), linked.clone()], 2, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.items.len() == 2).await?;

    let outcome = controller
        .set_field(unlinked.id, SubscriberField::Confirmed(true))
        .await;
    let MutationOutcome::Rejected { message } = outcome else {
        panic!("an unlinked subscriber must be rejected");
    };
    assert!(message.contains("no linked user account"));
    assert!(gateway.mutations().is_empty());

    let mut confirmed = linked.clone();
    confirmed.confirmed = true;
    gateway.push_set_field(Ok(confirmed));
    let outcome = controller
        .set_field(linked.id, SubscriberField::Confirmed(true))
        .await;
    assert_eq!(outcome, MutationOutcome::Settled);
    assert_eq!(
        gateway.mutations(),
        vec![RecordedMutation::SetField(linked.id)]
    );

    let snapshot = wait_for(&mut rx, |snap| {
        snap.items.get(1).is_some_and(|subscriber| subscriber.confirmed)
    })
    .await?;
    assert!(!snapshot.items[0].confirmed);
    Ok(())
}

#[tokio::test]
async fn a_failed_preference_toggle_reverts_the_subscriber() -> Result<()> {
    let gateway: ScriptedGateway<NewsletterSubscriber> = ScriptedGateway::new();
    let subscriber = sample_subscriber(7, true);
    gateway.push_list(Ok(page_of(vec![subscriber.clone()], 1, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.items.len() == 1).await?;

    gateway.push_set_field_after(
        Duration::from_millis(50),
        Err(GatewayError::Api {
            status: 500,
            message: None,
        }),
    );
    let (outcome, observed) = tokio::join!(
        controller.set_field(subscriber.id, SubscriberField::Confirmed(true)),
        wait_for(&mut rx, |snap| {
            snap.items.first().is_some_and(|row| row.confirmed)
        })
    );
    observed?;
    assert_eq!(
        outcome,
        MutationOutcome::RolledBack {
            message: "The server rejected the request (HTTP 500).".into()
        }
    );

    let snapshot = wait_for(&mut rx, |snap| {
        snap.items.first().is_some_and(|row| !row.confirmed)
    })
    .await?;
    assert_eq!(
        snapshot.error.as_deref(),
        Some("The server rejected the request (HTTP 500).")
    );
    assert_eq!(
        gateway.mutations(),
        vec![RecordedMutation::SetField(subscriber.id)]
    );
    Ok(())
}

#[tokio::test]
async fn writes_take_turns_on_one_screen() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(3), 3, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.items.len() == 3).await?;

    let mut canon_zero = sample_user(0);
    canon_zero.name = "Canon Zero".into();
    let mut canon_one = sample_user(1);
    canon_one.name = "Canon One".into();
    gateway.push_update_after(Duration::from_millis(60), Ok(canon_zero));
    gateway.push_update(Ok(canon_one));

    let first = UserPatch {
        name: "Temp Zero".into(),
        email: "user0@example.com".into(),
        role: UserRole::Member,
    };
    let second = UserPatch {
        name: "Temp One".into(),
        email: "user1@example.com".into(),
        role: UserRole::Member,
    };

    let (outcome_zero, outcome_one, observed) = tokio::join!(
        controller.update(sample_user(0).id, first),
        controller.update(sample_user(1).id, second),
        wait_for(&mut rx, |snap| {
            snap.items.first().is_some_and(|user| user.name == "Temp Zero")
                && snap.items.get(1).is_some_and(|user| user.name == "User 1")
        })
    );
    observed?;
    assert_eq!(outcome_zero, MutationOutcome::Settled);
    assert_eq!(outcome_one, MutationOutcome::Settled);
    assert_eq!(
        gateway.mutations(),
        vec![
            RecordedMutation::Update(sample_user(0).id),
            RecordedMutation::Update(sample_user(1).id),
        ],
        "the second write waits for the first to settle"
    );

    let snapshot = wait_for(&mut rx, |snap| {
        snap.items.first().is_some_and(|user| user.name == "Canon Zero")
            && snap.items.get(1).is_some_and(|user| user.name == "Canon One")
    })
    .await?;
    assert_eq!(snapshot.total, 3);
    Ok(())
}

#[tokio::test]
async fn a_failed_fetch_clears_the_rows_and_surfaces_the_error() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Err(GatewayError::Api {
        status: 500,
        message: None,
    }));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();

    controller.start();
    let failed = wait_for(&mut rx, |snap| snap.error.is_some()).await?;
    assert!(
        failed.items.is_empty(),
        "failed fetches leave no half-applied rows"
    );
    assert_eq!(
        failed.error.as_deref(),
        Some("The server rejected the request (HTTP 500).")
    );
    assert!(!failed.loading);

    gateway.push_list_after(Duration::from_millis(40), Ok(page_of(sample_users(3), 3, 1)));
    controller.refresh();
    let retrying = wait_for(&mut rx, |snap| snap.loading).await?;
    assert_eq!(
        retrying.error, None,
        "starting a fetch clears the previous error"
    );

    let recovered = wait_for(&mut rx, |snap| !snap.loading && !snap.items.is_empty()).await?;
    assert_eq!(recovered.items.len(), 3);
    assert_eq!(recovered.error, None);
    Ok(())
}

#[tokio::test]
async fn session_changes_refresh_the_list() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.set_default_list(page_of(sample_users(3), 3, 1));
    let bus = EventBus::new();
    let mut events = bus.subscribe(None);
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();
    let feed = SessionFeed::new();
    controller.attach_session(feed.subscribe());

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.items.len() == 3).await?;
    assert_eq!(gateway.list_call_count(), 1);

    feed.announce("api key rotated");
    let seen = wait_for_event(&mut events, |event| {
        matches!(event, Event::FetchApplied { epoch: 2, .. })
    })
    .await?;
    assert!(seen.iter().any(|event| matches!(
        event,
        Event::SessionRefreshed { description } if description == "api key rotated"
    )));
    assert_eq!(gateway.list_call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn a_page_size_change_restarts_from_page_one() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list(Ok(page_of(sample_users(10), 60, 1)));
    let bus = EventBus::new();
    let controller = controller_for(&gateway, &bus)?;
    let mut rx = controller.subscribe();
    let feed = SessionFeed::new();
    controller.attach_session(feed.subscribe());

    controller.start();
    wait_for(&mut rx, |snap| !snap.loading && snap.page_count == 6).await?;

    gateway.push_list(Ok(page_of(sample_users(10), 60, 3)));
    controller.set_page(3);
    wait_for(&mut rx, |snap| snap.page == 3 && !snap.loading).await?;

    gateway.push_list(Ok(ResourceSet::from_page(sample_users(25), 60, 1, 25)));
    feed.announce_page_size(25, "rows per page set to 25");

    let snapshot = wait_for(&mut rx, |snap| !snap.loading && snap.items.len() == 25).await?;
    assert_eq!(snapshot.page, 1);
    assert_eq!(snapshot.page_count, 3);

    let calls = gateway.list_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2].page, 1, "a new page size starts over at page one");
    assert_eq!(calls[2].page_size, 25);
    Ok(())
}

#[tokio::test]
async fn dropping_the_controller_silences_in_flight_work() -> Result<()> {
    let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
    gateway.push_list_after(Duration::from_millis(60), Ok(page_of(sample_users(3), 3, 1)));
    let bus = EventBus::new();
    let mut events = bus.subscribe(None);
    let metrics = Metrics::new()?;
    assert_eq!(metrics.snapshot().active_screens, 0);

    let controller =
        ListController::new(gateway.clone(), bus.clone(), metrics.clone(), &test_config());
    assert_eq!(metrics.snapshot().active_screens, 1);

    controller.start();
    controller.search_input("never committed");
    drop(controller);
    assert_eq!(metrics.snapshot().active_screens, 0);

    sleep(Duration::from_millis(120)).await;
    let seen = drain_events(&mut events).await;
    assert!(
        seen.iter()
            .any(|event| matches!(event, Event::FetchStarted { .. }))
    );
    assert!(
        !seen.iter().any(|event| matches!(
            event,
            Event::FetchApplied { .. } | Event::FetchFailed { .. } | Event::SearchCommitted { .. }
        )),
        "a closed screen hears nothing back"
    );
    assert_eq!(gateway.list_call_count(), 1);
    Ok(())
}
