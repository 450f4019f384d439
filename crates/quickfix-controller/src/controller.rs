//! The per-screen state machine.
//!
//! All state lives behind one lock and every await happens outside it.
//! Fetches carry an epoch; a completion that is not the newest epoch is
//! discarded without touching state. Mutations take an async gate so only
//! one write is in flight per screen, and each keeps a rollback copy of the
//! rows it changed optimistically.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use quickfix_events::{Event, EventBus};
use quickfix_list_core::{
    DEFAULT_PAGE_SIZE, GatewayResult, ListQuery, ListResource, MutationIntent, MutationOutcome,
    ResourceGateway, ResourceSet, clamp_page, normalize_keyword, page_count_for,
};
use quickfix_telemetry::Metrics;

use crate::debounce::DebouncedSearch;
use crate::session::SessionInfo;
use crate::snapshot::ListSnapshot;

/// Tuning knobs for one controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Rows requested per page.
    pub page_size: u32,
    /// Quiet time after the last keystroke before a search commits.
    pub debounce_window: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce_window: Duration::from_millis(500),
        }
    }
}

struct ListState<R: ListResource> {
    query: ListQuery<R::Filter>,
    search_text: String,
    set: ResourceSet<R>,
    loading: bool,
    error: Option<String>,
    /// Bumped on every wholesale row replacement; optimistic edits do not
    /// count. A mutation only rolls back if this still matches what it saw
    /// when it applied its projection.
    set_version: u64,
}

struct Shared<G: ResourceGateway> {
    gateway: G,
    events: EventBus,
    metrics: Metrics,
    state: RwLock<ListState<G::Item>>,
    epoch: AtomicU64,
    closed: AtomicBool,
    snapshot_tx: watch::Sender<ListSnapshot<G::Item>>,
    mutation_gate: AsyncMutex<()>,
}

/// How a confirmed write folds back into the visible rows.
enum Settlement<R> {
    /// The rows changed shape; ask the backend for the page again.
    Refetch,
    /// Replace the row in place with the backend's canonical copy.
    Reconcile(R),
    /// A row is gone; correct the page if it emptied out, then re-fetch.
    Removed,
}

impl<G: ResourceGateway + 'static> Shared<G> {
    fn screen(&self) -> &'static str {
        <G::Item as ListResource>::COLLECTION
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ListState<G::Item>> {
        self.state.read().expect("list state lock poisoned")
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ListState<G::Item>> {
        self.state.write().expect("list state lock poisoned")
    }

    fn emit(&self, event: Event) {
        let _ = self.events.publish(event);
    }

    fn publish_snapshot(&self, state: &ListState<G::Item>) {
        self.snapshot_tx.send_replace(ListSnapshot::assemble(
            &state.set,
            state.loading,
            state.error.clone(),
            state.search_text.clone(),
            state.query.keyword.clone(),
        ));
    }

    /// Issue a fetch for the current query, superseding whatever is in
    /// flight.
    fn begin_fetch(self: &Arc<Self>) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let query = {
            let mut state = self.write_state();
            state.loading = true;
            state.error = None;
            self.publish_snapshot(&state);
            state.query.clone()
        };
        debug!(
            screen = self.screen(),
            epoch,
            page = query.page,
            "starting list fetch"
        );
        self.emit(Event::FetchStarted {
            screen: self.screen().to_string(),
            epoch,
            page: query.page,
        });

        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let result = shared.gateway.list(&query).await;
            shared.complete_fetch(epoch, result);
        });
    }

    fn complete_fetch(self: &Arc<Self>, epoch: u64, result: GatewayResult<ResourceSet<G::Item>>) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let latest = self.epoch.load(Ordering::SeqCst);
        if epoch != latest {
            debug!(
                screen = self.screen(),
                epoch, latest, "discarding superseded fetch"
            );
            self.metrics.inc_fetch(self.screen(), "discarded");
            self.emit(Event::FetchDiscarded {
                screen: self.screen().to_string(),
                epoch,
                latest,
            });
            return;
        }

        match result {
            Ok(set) => {
                if let Some(corrected) = set.corrected_page() {
                    {
                        let mut state = self.write_state();
                        state.query.page = corrected;
                    }
                    info!(
                        screen = self.screen(),
                        from = set.page,
                        to = corrected,
                        "page came back empty; moving to the previous one"
                    );
                    self.metrics.inc_page_correction(self.screen());
                    self.emit(Event::PageCorrected {
                        screen: self.screen().to_string(),
                        from: set.page,
                        to: corrected,
                    });
                    self.begin_fetch();
                    return;
                }

                let (page, total) = (set.page, set.total);
                {
                    let mut state = self.write_state();
                    state.query.page = set.page.max(1);
                    state.set = set;
                    state.set_version += 1;
                    state.loading = false;
                    state.error = None;
                    self.publish_snapshot(&state);
                }
                debug!(
                    screen = self.screen(),
                    epoch, page, total, "list fetch applied"
                );
                self.metrics.inc_fetch(self.screen(), "applied");
                self.emit(Event::FetchApplied {
                    screen: self.screen().to_string(),
                    epoch,
                    page,
                    total,
                });
            }
            Err(err) => {
                let message = err.display_message();
                {
                    let mut state = self.write_state();
                    let page = state.query.page;
                    state.set = ResourceSet {
                        items: Vec::new(),
                        total: 0,
                        page,
                        page_count: 0,
                    };
                    state.set_version += 1;
                    state.loading = false;
                    state.error = Some(message.clone());
                    self.publish_snapshot(&state);
                }
                warn!(screen = self.screen(), epoch, error = %err, "list fetch failed");
                self.metrics.inc_fetch(self.screen(), "failed");
                self.emit(Event::FetchFailed {
                    screen: self.screen().to_string(),
                    epoch,
                    message,
                });
            }
        }
    }

    /// Runs on the debounce task once the window has elapsed.
    fn commit_search(self: &Arc<Self>, raw: String) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let keyword = normalize_keyword(&raw);
        let changed = {
            let mut state = self.write_state();
            if state.query.keyword == keyword {
                false
            } else {
                state.query = state.query.clone().with_keyword(&raw);
                true
            }
        };
        if changed {
            info!(
                screen = self.screen(),
                keyword = keyword.as_deref().unwrap_or_default(),
                "search committed"
            );
            self.metrics.inc_search(self.screen(), "committed");
            self.emit(Event::SearchCommitted {
                screen: self.screen().to_string(),
                keyword: keyword.unwrap_or_default(),
            });
            self.begin_fetch();
        }
    }
}

fn apply_projection<R: ListResource>(state: &mut ListState<R>, intent: &MutationIntent<R>) {
    match intent {
        MutationIntent::Create { draft } => {
            if let Some(row) = R::provisional(draft) {
                state.set.items.insert(0, row);
                let page_size = usize::try_from(state.query.page_size).unwrap_or(usize::MAX);
                state.set.items.truncate(page_size);
                state.set.total += 1;
                state.set.page_count = page_count_for(state.set.total, state.query.page_size);
            }
        }
        MutationIntent::Update { id, patch } => {
            if let Some(row) = state.set.items.iter_mut().find(|row| row.id() == *id) {
                row.merge(patch);
            }
        }
        MutationIntent::Delete { id } => {
            let before = state.set.items.len();
            state.set.items.retain(|row| row.id() != *id);
            if state.set.items.len() < before {
                state.set.total = state.set.total.saturating_sub(1);
                state.set.page_count = page_count_for(state.set.total, state.query.page_size);
            }
        }
        MutationIntent::SetField { id, change } => {
            if let Some(row) = state.set.items.iter_mut().find(|row| row.id() == *id) {
                row.apply_field(change);
            }
        }
    }
}

/// Owns one screen's list: its query, rows, fetch racing, and writes.
///
/// Dropping the controller cancels the pending search commit and marks the
/// screen closed, so completions that are still in flight land on nothing.
pub struct ListController<G: ResourceGateway + 'static> {
    shared: Arc<Shared<G>>,
    debounce: DebouncedSearch,
}

impl<G: ResourceGateway + 'static> ListController<G> {
    /// Build a controller for `gateway`'s collection. No fetch happens until
    /// [`start`](Self::start).
    #[must_use]
    pub fn new(gateway: G, events: EventBus, metrics: Metrics, config: &ControllerConfig) -> Self {
        let query = ListQuery::new(<G::Item as ListResource>::Filter::default())
            .with_page_size(config.page_size);
        let (snapshot_tx, _initial_rx) = watch::channel(ListSnapshot::initial());
        metrics.inc_active_screens();

        let shared = Arc::new(Shared {
            gateway,
            events,
            metrics,
            state: RwLock::new(ListState {
                query,
                search_text: String::new(),
                set: ResourceSet::empty(),
                loading: false,
                error: None,
                set_version: 0,
            }),
            epoch: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            snapshot_tx,
            mutation_gate: AsyncMutex::new(()),
        });
        info!(screen = shared.screen(), "list controller ready");

        Self {
            shared,
            debounce: DebouncedSearch::new(config.debounce_window),
        }
    }

    /// Collection label this controller serves.
    #[must_use]
    pub fn screen(&self) -> &'static str {
        self.shared.screen()
    }

    /// Issue the initial fetch.
    pub fn start(&self) {
        self.shared.begin_fetch();
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ListSnapshot<G::Item> {
        self.shared.snapshot_tx.borrow().clone()
    }

    /// Watch for snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<G::Item>> {
        self.shared.snapshot_tx.subscribe()
    }

    /// Move to `page`, clamped to the pages that exist. Same page, no fetch.
    pub fn set_page(&self, page: u32) {
        let changed = {
            let mut state = self.shared.write_state();
            let clamped = clamp_page(page, state.set.page_count);
            if clamped == state.query.page {
                false
            } else {
                state.query.page = clamped;
                true
            }
        };
        if changed {
            self.shared.begin_fetch();
        }
    }

    /// Swap the screen filter. An unchanged filter is a no-op; a changed one
    /// returns to page one and fetches.
    pub fn set_filter(&self, filter: <G::Item as ListResource>::Filter) {
        let changed = {
            let mut state = self.shared.write_state();
            if state.query.filter == filter {
                false
            } else {
                state.query = state.query.clone().with_filter(filter);
                true
            }
        };
        if changed {
            self.shared.begin_fetch();
        }
    }

    /// Re-run the current query.
    pub fn refresh(&self) {
        self.shared.begin_fetch();
    }

    /// Record a keystroke in the search box. The text echoes immediately;
    /// the keyword commits only after the debounce window passes quietly.
    pub fn search_input(&self, raw: &str) {
        {
            let mut state = self.shared.write_state();
            state.search_text = raw.to_string();
            self.shared.publish_snapshot(&state);
        }
        let shared = Arc::clone(&self.shared);
        let raw = raw.to_string();
        let superseded = self.debounce.schedule(async move {
            shared.commit_search(raw);
        });
        if superseded {
            self.shared
                .metrics
                .inc_search(self.shared.screen(), "superseded");
        }
    }

    /// Refresh whenever the session feed announces a change.
    pub fn attach_session(&self, mut session: watch::Receiver<SessionInfo>) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            while session.changed().await.is_ok() {
                if shared.closed.load(Ordering::SeqCst) {
                    break;
                }
                let info = session.borrow_and_update().clone();
                if let Some(page_size) = info.page_size {
                    {
                        let mut state = shared.write_state();
                        state.query = state.query.clone().with_page_size(page_size).with_page(1);
                    }
                    info!(
                        screen = shared.screen(),
                        page_size, "page size changed; returning to page one"
                    );
                }
                info!(
                    screen = shared.screen(),
                    revision = info.revision,
                    "session changed; refreshing list"
                );
                shared.emit(Event::SessionRefreshed {
                    description: info.description,
                });
                shared.begin_fetch();
            }
        });
    }

    /// Create a row from `draft`.
    pub async fn create(&self, draft: <G::Item as ListResource>::Draft) -> MutationOutcome {
        self.mutate(MutationIntent::Create { draft }).await
    }

    /// Edit the row identified by `id`.
    pub async fn update(
        &self,
        id: Uuid,
        patch: <G::Item as ListResource>::Patch,
    ) -> MutationOutcome {
        self.mutate(MutationIntent::Update { id, patch }).await
    }

    /// Remove the row identified by `id`.
    pub async fn delete(&self, id: Uuid) -> MutationOutcome {
        self.mutate(MutationIntent::Delete { id }).await
    }

    /// Change a single field on the row identified by `id`.
    pub async fn set_field(
        &self,
        id: Uuid,
        change: <G::Item as ListResource>::Field,
    ) -> MutationOutcome {
        self.mutate(MutationIntent::SetField { id, change }).await
    }

    #[allow(clippy::too_many_lines)]
    async fn mutate(&self, intent: MutationIntent<G::Item>) -> MutationOutcome {
        let shared = &self.shared;
        let screen = shared.screen();
        let kind = intent.kind();

        if let Err(errors) = intent.validate() {
            let message = errors.summary();
            debug!(
                screen,
                kind = kind.as_str(),
                "mutation rejected by validation"
            );
            shared.metrics.inc_mutation(screen, kind.as_str(), "rejected");
            shared.emit(Event::MutationRejected {
                screen: screen.to_string(),
                kind,
                target: intent.target(),
                message: message.clone(),
            });
            return MutationOutcome::Rejected { message };
        }

        if let MutationIntent::SetField { id, change } = &intent {
            let blocked = {
                let state = shared.read_state();
                state
                    .set
                    .items
                    .iter()
                    .find(|row| row.id() == *id)
                    .and_then(|row| row.missing_dependency(change))
            };
            if let Some(message) = blocked {
                debug!(
                    screen,
                    kind = kind.as_str(),
                    "mutation rejected; target lacks a dependency"
                );
                shared.metrics.inc_mutation(screen, kind.as_str(), "rejected");
                shared.emit(Event::MutationRejected {
                    screen: screen.to_string(),
                    kind,
                    target: Some(*id),
                    message: message.to_string(),
                });
                return MutationOutcome::Rejected {
                    message: message.to_string(),
                };
            }
        }

        // One write at a time per screen.
        let _permit = shared.mutation_gate.lock().await;

        let (rollback, version_at_apply) = {
            let mut state = shared.write_state();
            let rollback = state.set.clone();
            apply_projection(&mut state, &intent);
            state.error = None;
            shared.publish_snapshot(&state);
            (rollback, state.set_version)
        };
        debug!(screen, kind = kind.as_str(), "optimistic projection applied");
        shared.emit(Event::MutationApplied {
            screen: screen.to_string(),
            kind,
            target: intent.target(),
        });

        let settlement: GatewayResult<Settlement<G::Item>> = match &intent {
            MutationIntent::Create { draft } => shared
                .gateway
                .create(draft)
                .await
                .map(|_| Settlement::Refetch),
            MutationIntent::Update { id, patch } => shared
                .gateway
                .update(*id, patch)
                .await
                .map(Settlement::Reconcile),
            MutationIntent::Delete { id } => {
                shared.gateway.delete(*id).await.map(|()| Settlement::Removed)
            }
            MutationIntent::SetField { id, change } => shared
                .gateway
                .set_field(*id, change)
                .await
                .map(Settlement::Reconcile),
        };

        match settlement {
            Ok(settlement) => {
                if !shared.closed.load(Ordering::SeqCst) {
                    match settlement {
                        Settlement::Reconcile(row) => {
                            let mut state = shared.write_state();
                            let id = row.id();
                            if let Some(slot) =
                                state.set.items.iter_mut().find(|item| item.id() == id)
                            {
                                *slot = row;
                                shared.publish_snapshot(&state);
                            }
                        }
                        Settlement::Refetch => shared.begin_fetch(),
                        Settlement::Removed => {
                            let correction = {
                                let mut state = shared.write_state();
                                let correction =
                                    state.set.corrected_page().map(|to| (state.set.page, to));
                                if let Some((_, to)) = correction {
                                    state.query.page = to;
                                }
                                correction
                            };
                            if let Some((from, to)) = correction {
                                info!(screen, from, to, "page emptied by delete; moving back");
                                shared.metrics.inc_page_correction(screen);
                                shared.emit(Event::PageCorrected {
                                    screen: screen.to_string(),
                                    from,
                                    to,
                                });
                            }
                            shared.begin_fetch();
                        }
                    }
                }
                info!(screen, kind = kind.as_str(), "mutation settled");
                shared.metrics.inc_mutation(screen, kind.as_str(), "settled");
                shared.emit(Event::MutationSettled {
                    screen: screen.to_string(),
                    kind,
                    target: intent.target(),
                });
                MutationOutcome::Settled
            }
            Err(err) => {
                let message = err.display_message();
                if !shared.closed.load(Ordering::SeqCst) {
                    let mut state = shared.write_state();
                    if state.set_version == version_at_apply {
                        state.set = rollback;
                        state.error = Some(message.clone());
                        shared.publish_snapshot(&state);
                    } else {
                        debug!(screen, "skipping rollback; a fetch already replaced the rows");
                    }
                }
                warn!(screen, kind = kind.as_str(), error = %err, "mutation failed; rolling back");
                shared
                    .metrics
                    .inc_mutation(screen, kind.as_str(), "rolled_back");
                shared.emit(Event::MutationRolledBack {
                    screen: screen.to_string(),
                    kind,
                    target: intent.target(),
                    message: message.clone(),
                });
                MutationOutcome::RolledBack { message }
            }
        }
    }
}

impl<G: ResourceGateway + 'static> Drop for ListController<G> {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.debounce.cancel();
        self.shared.metrics.dec_active_screens();
        debug!(screen = self.shared.screen(), "list controller closed");
    }
}
