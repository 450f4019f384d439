//! The async seam between list machinery and whatever serves the data.
//!
//! Production uses the HTTP client crate; tests script a gateway in memory.
//! Either way the controller only ever sees this trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::GatewayResult;
use crate::query::ListQuery;
use crate::resource::ListResource;
use crate::set::ResourceSet;

/// Backend operations for one resource collection.
///
/// Write operations return the canonical row the backend persisted so the
/// console can reconcile its optimistic projection with reality.
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    /// Row type this gateway serves.
    type Item: ListResource;

    /// Fetch one page matching `query`.
    async fn list(
        &self,
        query: &ListQuery<<Self::Item as ListResource>::Filter>,
    ) -> GatewayResult<ResourceSet<Self::Item>>;

    /// Persist a new row composed from `draft`.
    async fn create(
        &self,
        draft: &<Self::Item as ListResource>::Draft,
    ) -> GatewayResult<Self::Item>;

    /// Apply `patch` to the row identified by `id`.
    async fn update(
        &self,
        id: Uuid,
        patch: &<Self::Item as ListResource>::Patch,
    ) -> GatewayResult<Self::Item>;

    /// Remove the row identified by `id`.
    async fn delete(&self, id: Uuid) -> GatewayResult<()>;

    /// Change a single field on the row identified by `id`.
    async fn set_field(
        &self,
        id: Uuid,
        change: &<Self::Item as ListResource>::Field,
    ) -> GatewayResult<Self::Item>;
}
