//! The seam every admin screen implements to plug into the list machinery.

use uuid::Uuid;

use crate::error::ValidationErrors;
use crate::query::FilterParams;

/// Pre-flight validation for payloads the operator composed in a form.
pub trait Validate {
    /// Check the payload before any network traffic happens.
    ///
    /// # Errors
    ///
    /// Returns every violation found, not just the first.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for () {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// A row type that can live in a paginated, filterable admin list.
///
/// The controller is generic over this trait; each screen (users, guides,
/// tickets, ...) supplies one implementation and gets the full fetch,
/// pagination, search, and optimistic-mutation behaviour for free.
pub trait ListResource: Clone + Send + Sync + 'static {
    /// Payload for creating a new row.
    type Draft: Validate + Clone + Send + Sync + 'static;
    /// Payload for editing an existing row.
    type Patch: Validate + Clone + Send + Sync + 'static;
    /// A single-field toggle or assignment (activate, feature, close, ...).
    type Field: Clone + Send + Sync + 'static;
    /// Screen-specific filter state.
    type Filter: FilterParams + Clone + PartialEq + Default + Send + Sync + 'static;

    /// Collection segment in API paths, doubling as the screen label in
    /// events and logs.
    const COLLECTION: &'static str;

    /// Stable identifier of this row.
    fn id(&self) -> Uuid;

    /// Fold an edit payload into this row, for the optimistic projection.
    fn merge(&mut self, patch: &Self::Patch);

    /// Apply a single-field change to this row, for the optimistic
    /// projection.
    fn apply_field(&mut self, change: &Self::Field);

    /// Build a provisional row from a draft so a create can show up before
    /// the backend confirms it. Screens whose rows need server-assigned
    /// state can return `None` to skip the optimistic insert.
    fn provisional(draft: &Self::Draft) -> Option<Self> {
        let _ = draft;
        None
    }

    /// When a field change cannot work because this row lacks something it
    /// depends on, return the operator-facing explanation. The controller
    /// rejects the change before any network traffic.
    fn missing_dependency(&self, change: &Self::Field) -> Option<&'static str> {
        let _ = change;
        None
    }
}
