//! A gateway whose every answer is scripted by the test.
//!
//! Responses are queued per operation and played back in order, each after
//! its scripted delay. Queue two list responses where the first is slower
//! than the second and you have reproduced an out-of-order backend without
//! touching a network stack. Every call is recorded for later assertions.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use uuid::Uuid;

use quickfix_list_core::{
    GatewayError, GatewayResult, ListQuery, ListResource, ResourceGateway, ResourceSet,
};

/// One write operation as the gateway saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedMutation {
    /// `create` was called.
    Create,
    /// `update` was called for the given row.
    Update(Uuid),
    /// `delete` was called for the given row.
    Delete(Uuid),
    /// `set_field` was called for the given row.
    SetField(Uuid),
}

struct Scripted<T> {
    delay: Duration,
    result: T,
}

struct Inner<R: ListResource> {
    list: VecDeque<Scripted<GatewayResult<ResourceSet<R>>>>,
    default_list: Option<ResourceSet<R>>,
    creates: VecDeque<Scripted<GatewayResult<R>>>,
    updates: VecDeque<Scripted<GatewayResult<R>>>,
    deletes: VecDeque<Scripted<GatewayResult<()>>>,
    set_fields: VecDeque<Scripted<GatewayResult<R>>>,
    list_calls: Vec<ListQuery<R::Filter>>,
    mutations: Vec<RecordedMutation>,
}

impl<R: ListResource> Default for Inner<R> {
    fn default() -> Self {
        Self {
            list: VecDeque::new(),
            default_list: None,
            creates: VecDeque::new(),
            updates: VecDeque::new(),
            deletes: VecDeque::new(),
            set_fields: VecDeque::new(),
            list_calls: Vec::new(),
            mutations: Vec::new(),
        }
    }
}

fn unscripted(operation: &str) -> GatewayError {
    GatewayError::Transport {
        detail: format!("unscripted {operation} call"),
    }
}

/// In-memory [`ResourceGateway`] driven entirely by queued responses.
pub struct ScriptedGateway<R: ListResource> {
    inner: Arc<Mutex<Inner<R>>>,
}

impl<R: ListResource> Clone for ScriptedGateway<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: ListResource> Default for ScriptedGateway<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ListResource> ScriptedGateway<R> {
    /// A gateway with nothing scripted; every call fails until told otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<R>> {
        self.inner.lock().expect("scripted gateway mutex poisoned")
    }

    /// Queue the next `list` response, served immediately.
    pub fn push_list(&self, result: GatewayResult<ResourceSet<R>>) {
        self.push_list_after(Duration::ZERO, result);
    }

    /// Queue the next `list` response, served after `delay`.
    pub fn push_list_after(&self, delay: Duration, result: GatewayResult<ResourceSet<R>>) {
        self.lock().list.push_back(Scripted { delay, result });
    }

    /// Serve this set whenever the `list` queue is empty.
    pub fn set_default_list(&self, set: ResourceSet<R>) {
        self.lock().default_list = Some(set);
    }

    /// Queue the next `create` response, served immediately.
    pub fn push_create(&self, result: GatewayResult<R>) {
        self.push_create_after(Duration::ZERO, result);
    }

    /// Queue the next `create` response, served after `delay`.
    pub fn push_create_after(&self, delay: Duration, result: GatewayResult<R>) {
        self.lock().creates.push_back(Scripted { delay, result });
    }

    /// Queue the next `update` response, served immediately.
    pub fn push_update(&self, result: GatewayResult<R>) {
        self.push_update_after(Duration::ZERO, result);
    }

    /// Queue the next `update` response, served after `delay`.
    pub fn push_update_after(&self, delay: Duration, result: GatewayResult<R>) {
        self.lock().updates.push_back(Scripted { delay, result });
    }

    /// Queue the next `delete` response, served immediately.
    pub fn push_delete(&self, result: GatewayResult<()>) {
        self.push_delete_after(Duration::ZERO, result);
    }

    /// Queue the next `delete` response, served after `delay`.
    pub fn push_delete_after(&self, delay: Duration, result: GatewayResult<()>) {
        self.lock().deletes.push_back(Scripted { delay, result });
    }

    /// Queue the next `set_field` response, served immediately.
    pub fn push_set_field(&self, result: GatewayResult<R>) {
        self.push_set_field_after(Duration::ZERO, result);
    }

    /// Queue the next `set_field` response, served after `delay`.
    pub fn push_set_field_after(&self, delay: Duration, result: GatewayResult<R>) {
        self.lock().set_fields.push_back(Scripted { delay, result });
    }

    /// Every `list` query the gateway has seen, in call order.
    #[must_use]
    pub fn list_calls(&self) -> Vec<ListQuery<R::Filter>> {
        self.lock().list_calls.clone()
    }

    /// Number of `list` calls the gateway has seen.
    #[must_use]
    pub fn list_call_count(&self) -> usize {
        self.lock().list_calls.len()
    }

    /// Every write operation the gateway has seen, in call order.
    #[must_use]
    pub fn mutations(&self) -> Vec<RecordedMutation> {
        self.lock().mutations.clone()
    }
}

#[async_trait]
impl<R: ListResource> ResourceGateway for ScriptedGateway<R> {
    type Item = R;

    async fn list(&self, query: &ListQuery<R::Filter>) -> GatewayResult<ResourceSet<R>> {
        let scripted = {
            let mut inner = self.lock();
            inner.list_calls.push(query.clone());
            let next = inner.list.pop_front();
            next.unwrap_or_else(|| Scripted {
                delay: Duration::ZERO,
                result: inner
                    .default_list
                    .clone()
                    .ok_or_else(|| unscripted("list")),
            })
        };
        if !scripted.delay.is_zero() {
            sleep(scripted.delay).await;
        }
        scripted.result
    }

    async fn create(&self, _draft: &R::Draft) -> GatewayResult<R> {
        let scripted = {
            let mut inner = self.lock();
            inner.mutations.push(RecordedMutation::Create);
            inner.creates.pop_front()
        };
        play(scripted, "create").await
    }

    async fn update(&self, id: Uuid, _patch: &R::Patch) -> GatewayResult<R> {
        let scripted = {
            let mut inner = self.lock();
            inner.mutations.push(RecordedMutation::Update(id));
            inner.updates.pop_front()
        };
        play(scripted, "update").await
    }

    async fn delete(&self, id: Uuid) -> GatewayResult<()> {
        let scripted = {
            let mut inner = self.lock();
            inner.mutations.push(RecordedMutation::Delete(id));
            inner.deletes.pop_front()
        };
        play(scripted, "delete").await
    }

    async fn set_field(&self, id: Uuid, _change: &R::Field) -> GatewayResult<R> {
        let scripted = {
            let mut inner = self.lock();
            inner.mutations.push(RecordedMutation::SetField(id));
            inner.set_fields.pop_front()
        };
        play(scripted, "set_field").await
    }
}

async fn play<T>(scripted: Option<Scripted<GatewayResult<T>>>, operation: &str) -> GatewayResult<T> {
    match scripted {
        Some(Scripted { delay, result }) => {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            result
        }
        None => Err(unscripted(operation)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{page_of, sample_user, sample_users};
    use quickfix_api_models::{UserAccount, UserFilter};
    use quickfix_list_core::ListQuery;
    use std::time::Instant;

    #[tokio::test]
    async fn scripts_play_back_in_order_with_delays() {
        let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
        gateway.push_list_after(
            Duration::from_millis(40),
            Ok(page_of(sample_users(2), 2, 1)),
        );
        gateway.push_list(Ok(page_of(sample_users(1), 1, 1)));

        let query = ListQuery::new(UserFilter::default());
        let started = Instant::now();
        let first = gateway.list(&query).await.expect("first scripted set");
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(first.items.len(), 2);

        let second = gateway.list(&query).await.expect("second scripted set");
        assert_eq!(second.items.len(), 1);
        assert_eq!(gateway.list_call_count(), 2);
    }

    #[tokio::test]
    async fn unscripted_calls_fail_loudly() {
        let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
        let query = ListQuery::new(UserFilter::default());
        let err = gateway.list(&query).await.expect_err("nothing scripted");
        assert!(matches!(err, GatewayError::Transport { .. }));

        gateway.set_default_list(page_of(sample_users(3), 3, 1));
        assert!(gateway.list(&query).await.is_ok());
    }

    #[tokio::test]
    async fn mutations_are_recorded_with_their_targets() {
        let gateway: ScriptedGateway<UserAccount> = ScriptedGateway::new();
        let row = sample_user(4);
        gateway.push_delete(Ok(()));
        gateway.push_set_field(Ok(row.clone()));

        gateway.delete(row.id).await.expect("scripted delete");
        let _ = gateway
            .set_field(row.id, &quickfix_api_models::UserField::Active(false))
            .await
            .expect("scripted set_field");

        assert_eq!(
            gateway.mutations(),
            vec![
                RecordedMutation::Delete(row.id),
                RecordedMutation::SetField(row.id),
            ]
        );
    }
}
