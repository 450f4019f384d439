//! Shared connection context, errors, and the screen driver for the console.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use quickfix_api_models::FieldEncode;
use quickfix_client::{
    AdminApi, ApiKeyCredential, AuthFeed, ClientConfig, ClientError, RestGateway,
};
use quickfix_controller::{ControllerConfig, ListController, ListSnapshot};
use quickfix_events::notify::{NotificationLevel, notification_for};
use quickfix_events::{Event, EventBus, EventId};
use quickfix_list_core::{
    DEFAULT_PAGE_SIZE, ListResource, MutationOutcome, ResourceGateway, clamp_page,
    normalize_keyword,
};
use quickfix_telemetry::Metrics;

use crate::cli::Cli;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ClientError> for CliError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::InvalidBaseUrl { .. } | ClientError::InvalidApiKey { .. } => {
                Self::Validation(error.to_string())
            }
            ClientError::Build { .. } => Self::failure(error),
        }
    }
}

/// Connection context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) api: AdminApi,
    pub(crate) events: EventBus,
    pub(crate) metrics: Metrics,
}

impl AppContext {
    /// Build the shared API connection from the global CLI options.
    pub(crate) fn connect(cli: &Cli) -> CliResult<Self> {
        let credential = cli
            .api_key
            .as_deref()
            .map(ApiKeyCredential::parse)
            .transpose()?;
        let auth = AuthFeed::new(credential);
        let config = ClientConfig::new(&cli.url).with_timeout(Duration::from_secs(cli.timeout));
        let metrics = Metrics::new().map_err(CliError::failure)?;
        let api = AdminApi::connect(&config, auth.subscribe(), metrics.clone())?;
        debug!(url = %cli.url, "console context ready");
        Ok(Self {
            api,
            events: EventBus::new(),
            metrics,
        })
    }

    /// A screen driver for one collection, fetching through the shared API.
    pub(crate) fn screen<R>(&self, page_size: Option<u32>) -> Screen<RestGateway<R>>
    where
        R: ListResource + DeserializeOwned,
        R::Draft: Serialize,
        R::Patch: Serialize,
        R::Field: FieldEncode,
    {
        // Keywords arrive whole from the command line, so no debounce window.
        let config = ControllerConfig {
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            debounce_window: Duration::ZERO,
        };
        Screen {
            controller: ListController::new(
                self.api.gateway::<R>(),
                self.events.clone(),
                self.metrics.clone(),
                &config,
            ),
            events: self.events.clone(),
        }
    }
}

/// One admin screen driven to completion for a single command.
///
/// Fetches settle through the event stream rather than by polling the
/// snapshot: the driver records a high-water mark before each operation and
/// subscribes from it afterwards, so a fetch that finishes before the console
/// starts listening is still observed.
pub(crate) struct Screen<G: ResourceGateway + 'static> {
    controller: ListController<G>,
    events: EventBus,
}

impl<G: ResourceGateway + 'static> Screen<G> {
    /// Load the screen with `filter`, an optional keyword, and a page.
    pub(crate) async fn load(
        &self,
        filter: <G::Item as ListResource>::Filter,
        keyword: Option<&str>,
        page: u32,
    ) -> CliResult<ListSnapshot<G::Item>> {
        let mark = self.events.last_event_id();
        if filter == <G::Item as ListResource>::Filter::default() {
            self.controller.start();
        } else {
            self.controller.set_filter(filter);
        }
        let mut snapshot = self.await_fetch(mark).await?;

        if let Some(keyword) = keyword.and_then(normalize_keyword) {
            let mark = self.events.last_event_id();
            self.controller.search_input(&keyword);
            snapshot = self.await_fetch(mark).await?;
        }

        // A request for the page already shown triggers no fetch; only wait
        // when the clamped target differs.
        if clamp_page(page, snapshot.page_count) != snapshot.page {
            let mark = self.events.last_event_id();
            self.controller.set_page(page);
            snapshot = self.await_fetch(mark).await?;
        }

        Ok(snapshot)
    }

    /// Create a row and wait for the confirming refetch.
    pub(crate) async fn create(&self, draft: <G::Item as ListResource>::Draft) -> CliResult<()> {
        let mark = self.events.last_event_id();
        let outcome = self.controller.create(draft).await;
        self.settle(outcome, mark, true).await
    }

    /// Apply an edit; the reconciled row lands in the snapshot directly.
    pub(crate) async fn update(
        &self,
        id: Uuid,
        patch: <G::Item as ListResource>::Patch,
    ) -> CliResult<()> {
        let mark = self.events.last_event_id();
        let outcome = self.controller.update(id, patch).await;
        self.settle(outcome, mark, false).await
    }

    /// Remove a row and wait for the refetch that backfills the page.
    pub(crate) async fn delete(&self, id: Uuid) -> CliResult<()> {
        let mark = self.events.last_event_id();
        let outcome = self.controller.delete(id).await;
        self.settle(outcome, mark, true).await
    }

    /// Change a single field on a visible row.
    pub(crate) async fn set_field(
        &self,
        id: Uuid,
        change: <G::Item as ListResource>::Field,
    ) -> CliResult<()> {
        let mark = self.events.last_event_id();
        let outcome = self.controller.set_field(id, change).await;
        self.settle(outcome, mark, false).await
    }

    /// The rows currently shown.
    #[allow(dead_code)] // exercised by the driver tests below
    pub(crate) fn snapshot(&self) -> ListSnapshot<G::Item> {
        self.controller.snapshot()
    }

    /// Map a mutation outcome onto exit semantics, waiting for the refetch
    /// that creates and deletes schedule before declaring success.
    async fn settle(
        &self,
        outcome: MutationOutcome,
        mark: Option<EventId>,
        refetches: bool,
    ) -> CliResult<()> {
        match outcome {
            MutationOutcome::Settled => {
                if refetches {
                    self.await_fetch(mark).await?;
                }
                self.print_toasts(mark).await;
                Ok(())
            }
            MutationOutcome::Rejected { message } => Err(CliError::validation(message)),
            MutationOutcome::RolledBack { message } => Err(CliError::failure(anyhow!("{message}"))),
        }
    }

    /// Wait for the first fetch after `mark` to settle for this screen.
    async fn await_fetch(&self, mark: Option<EventId>) -> CliResult<ListSnapshot<G::Item>> {
        // Subscribing from zero replays the whole ring, so a fetch that
        // settled before this call is not missed.
        let mut stream = self.events.subscribe(Some(mark.unwrap_or(0)));
        while let Some(envelope) = stream.next().await {
            if envelope
                .event
                .screen()
                .is_some_and(|screen| screen != G::Item::COLLECTION)
            {
                continue;
            }
            match envelope.event {
                Event::FetchApplied { .. } => return Ok(self.controller.snapshot()),
                Event::FetchFailed { message, .. } => {
                    return Err(CliError::failure(anyhow!("{message}")));
                }
                _ => {}
            }
        }
        Err(CliError::failure(anyhow!(
            "the event stream closed before the fetch settled"
        )))
    }

    /// Print the informational toasts published since `mark`.
    ///
    /// Error-level notifications are skipped; those reach the operator
    /// through the command's failure path instead.
    async fn print_toasts(&self, mark: Option<EventId>) {
        let Some(end) = self.events.last_event_id() else {
            return;
        };
        if mark == Some(end) {
            return;
        }
        let mut stream = self.events.subscribe(Some(mark.unwrap_or(0)));
        while let Some(envelope) = stream.next().await {
            if let Some(note) = notification_for(&envelope) {
                if note.level != NotificationLevel::Error {
                    println!("{}", note.message);
                }
            }
            if envelope.id >= end {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickfix_api_models::{UserAccount, UserFilter};
    use quickfix_list_core::GatewayError;
    use quickfix_test_support::fixtures::{page_of, sample_id, sample_users};
    use quickfix_test_support::mocks::ScriptedGateway;

    fn screen_over(gateway: ScriptedGateway<UserAccount>) -> Screen<ScriptedGateway<UserAccount>> {
        let events = EventBus::new();
        let config = ControllerConfig {
            page_size: 10,
            debounce_window: Duration::ZERO,
        };
        Screen {
            controller: ListController::new(
                gateway,
                events.clone(),
                Metrics::new().expect("metrics"),
                &config,
            ),
            events,
        }
    }

    #[test]
    fn client_errors_split_by_severity() {
        let invalid = CliError::from(ClientError::InvalidApiKey {
            detail: "expected key_id:secret".into(),
        });
        assert_eq!(invalid.exit_code(), 2);
        assert!(invalid.display_message().contains("invalid API key"));

        assert_eq!(CliError::failure(anyhow!("boom")).exit_code(), 3);
        assert_eq!(CliError::failure(anyhow!("boom")).display_message(), "boom");
    }

    #[tokio::test]
    async fn loads_settle_through_the_event_stream() {
        let gateway = ScriptedGateway::new();
        gateway.push_list(Ok(page_of(sample_users(3), 3, 1)));
        let screen = screen_over(gateway);

        let snapshot = screen
            .load(UserFilter::default(), None, 1)
            .await
            .expect("load settles");
        assert_eq!(snapshot.items.len(), 3);
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn loads_commit_keyword_then_page() {
        let gateway = ScriptedGateway::new();
        gateway.push_list(Ok(page_of(sample_users(10), 23, 1)));
        gateway.push_list(Ok(page_of(sample_users(10), 23, 1)));
        gateway.push_list(Ok(page_of(sample_users(3), 23, 3)));
        let screen = screen_over(gateway.clone());

        let snapshot = screen
            .load(UserFilter::default(), Some("chain"), 3)
            .await
            .expect("load settles");

        assert_eq!(snapshot.page, 3);
        let calls = gateway.list_calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].keyword.as_deref(), Some("chain"));
        assert_eq!(calls[1].page, 1, "a fresh keyword starts from page one");
        assert_eq!(calls[2].page, 3);
    }

    #[tokio::test]
    async fn single_page_loads_skip_the_page_fetch() {
        let gateway = ScriptedGateway::new();
        gateway.push_list(Ok(page_of(sample_users(3), 3, 1)));
        let screen = screen_over(gateway.clone());

        let snapshot = screen
            .load(UserFilter::default(), None, 7)
            .await
            .expect("load settles");
        assert_eq!(snapshot.page, 1);
        assert_eq!(gateway.list_call_count(), 1);
    }

    #[tokio::test]
    async fn failed_fetches_exit_operationally() {
        let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
        gateway.push_list(Err(GatewayError::Api {
            status: 502,
            message: None,
        }));
        let screen = screen_over(gateway);

        let err = screen
            .load(UserFilter::default(), None, 1)
            .await
            .expect_err("load fails");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("HTTP 502"));
    }

    #[tokio::test]
    async fn rejected_drafts_never_reach_the_gateway() {
        let gateway = ScriptedGateway::new();
        let screen = screen_over(gateway.clone());

        let err = screen
            .create(quickfix_test_support::fixtures::invalid_user_draft())
            .await
            .expect_err("draft is rejected");
        assert_eq!(err.exit_code(), 2);
        assert!(gateway.mutations().is_empty());
    }

    #[tokio::test]
    async fn deletes_wait_for_the_confirming_refetch() {
        let gateway = ScriptedGateway::new();
        gateway.push_list(Ok(page_of(sample_users(3), 3, 1)));
        let screen = screen_over(gateway.clone());
        screen
            .load(UserFilter::default(), None, 1)
            .await
            .expect("load settles");

        gateway.push_delete(Ok(()));
        gateway.push_list(Ok(page_of(sample_users(2), 2, 1)));
        screen.delete(sample_id(0)).await.expect("delete settles");

        assert_eq!(screen.snapshot().items.len(), 2);
        assert_eq!(gateway.list_call_count(), 2);
    }

    #[tokio::test]
    async fn gateway_failures_roll_the_screen_back() {
        let gateway = ScriptedGateway::new();
        gateway.push_list(Ok(page_of(sample_users(2), 2, 1)));
        let screen = screen_over(gateway.clone());
        screen
            .load(UserFilter::default(), None, 1)
            .await
            .expect("load settles");

        gateway.push_delete(Err(GatewayError::Transport {
            detail: "connection reset".into(),
        }));
        let err = screen.delete(sample_id(0)).await.expect_err("rolled back");

        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.display_message(),
            "Connection problem. Check your network and try again."
        );
        assert_eq!(screen.snapshot().items.len(), 2, "removal was rolled back");
    }
}
