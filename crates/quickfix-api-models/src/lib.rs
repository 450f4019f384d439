#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the QuickFix admin API.
//!
//! Every admin screen's row, draft, patch, field change, and filter lives
//! here, together with its [`ListResource`] binding. Keeping the wire types
//! and the list-machinery bindings in one crate means the HTTP client and the
//! console agree on the contract by construction.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quickfix_list_core::{FilterParams, ListResource, ResourceSet, Validate, ValidationErrors};

/// RFC9457-compatible problem document surfaced on validation/runtime errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    /// URI reference identifying the problem type.
    pub kind: String,
    /// Short, human-readable summary of the issue.
    pub title: String,
    /// HTTP status code associated with the error.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Detailed diagnostic message when available.
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Parameters that failed validation, if applicable.
    pub invalid_params: Option<Vec<ProblemInvalidParam>>,
}

impl ProblemDetails {
    /// The most specific operator-facing sentence the document carries.
    #[must_use]
    pub fn best_message(&self) -> String {
        self.detail.clone().unwrap_or_else(|| self.title.clone())
    }
}

/// Invalid parameter pointer surfaced alongside a [`ProblemDetails`] payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemInvalidParam {
    /// JSON Pointer to the offending field.
    pub pointer: String,
    /// Human-readable description of the validation failure.
    pub message: String,
}

/// Wire shape of every paginated list response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageEnvelope<T> {
    #[serde(default = "Vec::new")]
    /// Rows on the requested page.
    pub items: Vec<T>,
    /// Total rows matching the query across all pages.
    pub total: u64,
    /// One-based page index the rows came from.
    pub page: u32,
}

impl<T> PageEnvelope<T> {
    /// Convert the wire envelope into the console's resource set, deriving
    /// the page count from the query's page size.
    #[must_use]
    pub fn into_set(self, page_size: u32) -> ResourceSet<T> {
        ResourceSet::from_page(self.items, self.total, self.page, page_size)
    }
}

/// Wire shape of a single-field change request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldChangeRequest {
    /// Name of the field being changed.
    pub field: String,
    /// New value, encoded as JSON.
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional operator note recorded with the change.
    pub note: Option<String>,
}

impl FieldChangeRequest {
    /// A change request without a note.
    #[must_use]
    pub const fn new(field: String, value: serde_json::Value) -> Self {
        Self {
            field,
            value,
            note: None,
        }
    }

    /// Attach an operator note to the change.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Field changes that know their wire encoding.
pub trait FieldEncode {
    /// Encode the change for the `PATCH .../field` endpoint.
    fn to_request(&self) -> FieldChangeRequest;
}

/// Screens without single-field changes use `()` as their field type; the
/// console never issues a field request for them.
impl FieldEncode for () {
    fn to_request(&self) -> FieldChangeRequest {
        FieldChangeRequest::new(String::new(), serde_json::Value::Null)
    }
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));
static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug regex"));

fn check_required(errors: &mut ValidationErrors, field: &'static str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.push(field, format!("{label} is required."));
    }
}

fn check_email(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if !EMAIL_RE.is_match(value.trim()) {
        errors.push(field, "Enter a valid email address.");
    }
}

fn check_slug(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if !SLUG_RE.is_match(value.trim()) {
        errors.push(
            field,
            "Slug may only contain lowercase letters, digits and dashes.",
        );
    }
}

/// Role a platform account holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full administrative access.
    Admin,
    /// Can author and publish guides.
    Editor,
    /// Handles support tickets only.
    Support,
    /// Regular reader account.
    Member,
}

impl UserRole {
    /// Stable lowercase label used in filters and tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Support => "support",
            Self::Member => "member",
        }
    }
}

/// A platform account as the users screen lists it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAccount {
    /// Stable identifier of the account.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email address.
    pub email: String,
    /// Role the account holds.
    pub role: UserRole,
    /// Whether the account may sign in.
    pub active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a platform account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserDraft {
    /// Display name.
    pub name: String,
    /// Login email address.
    pub email: String,
    /// Role to assign.
    pub role: UserRole,
    /// Initial password.
    pub password: String,
}

impl Validate for UserDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_required(&mut errors, "name", &self.name, "Name");
        check_email(&mut errors, "email", &self.email);
        if self.password.chars().count() < 8 {
            errors.push("password", "Password must be at least 8 characters.");
        }
        errors.into_result()
    }
}

/// Payload for editing a platform account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPatch {
    /// Display name.
    pub name: String,
    /// Login email address.
    pub email: String,
    /// Role the account holds.
    pub role: UserRole,
}

impl Validate for UserPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_required(&mut errors, "name", &self.name, "Name");
        check_email(&mut errors, "email", &self.email);
        errors.into_result()
    }
}

/// Single-field changes the users screen offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    /// Allow or block sign-in.
    Active(bool),
}

impl FieldEncode for UserField {
    fn to_request(&self) -> FieldChangeRequest {
        match self {
            Self::Active(active) => {
                FieldChangeRequest::new("active".into(), serde_json::Value::Bool(*active))
            }
        }
    }
}

/// Filter state for the users screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserFilter {
    /// Restrict the list to one role.
    pub role: Option<UserRole>,
}

impl FilterParams for UserFilter {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.role
            .map(|role| ("role", role.as_str().to_string()))
            .into_iter()
            .collect()
    }
}

impl ListResource for UserAccount {
    type Draft = UserDraft;
    type Patch = UserPatch;
    type Field = UserField;
    type Filter = UserFilter;

    const COLLECTION: &'static str = "users";

    fn id(&self) -> Uuid {
        self.id
    }

    fn merge(&mut self, patch: &Self::Patch) {
        self.name = patch.name.clone();
        self.email = patch.email.clone();
        self.role = patch.role;
    }

    fn apply_field(&mut self, change: &Self::Field) {
        match change {
            UserField::Active(active) => self.active = *active,
        }
    }

    fn provisional(draft: &Self::Draft) -> Option<Self> {
        Some(Self {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            email: draft.email.clone(),
            role: draft.role,
            active: true,
            created_at: Utc::now(),
        })
    }
}

/// Publication state of a guide.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GuideStatus {
    /// Being written, not visible to readers.
    Draft,
    /// Live on the site.
    Published,
    /// Removed from the site but kept for reference.
    Archived,
}

impl GuideStatus {
    /// Stable lowercase label used in filters and tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

/// A repair guide as the guides screen lists it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Guide {
    /// Stable identifier of the guide.
    pub id: Uuid,
    /// Reader-facing title.
    pub title: String,
    /// URL slug.
    pub slug: String,
    /// Category the guide belongs to.
    pub category_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Category display name, when the backend joined it in.
    pub category_name: Option<String>,
    /// Publication state.
    pub status: GuideStatus,
    /// Whether the guide is pinned to the landing page.
    pub featured: bool,
    /// When the guide was last edited.
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a guide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuideDraft {
    /// Reader-facing title.
    pub title: String,
    /// URL slug.
    pub slug: String,
    /// Category the guide belongs to.
    pub category_id: Uuid,
}

impl Validate for GuideDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_required(&mut errors, "title", &self.title, "Title");
        check_slug(&mut errors, "slug", &self.slug);
        errors.into_result()
    }
}

/// Payload for editing a guide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuidePatch {
    /// Reader-facing title.
    pub title: String,
    /// URL slug.
    pub slug: String,
    /// Category the guide belongs to.
    pub category_id: Uuid,
}

impl Validate for GuidePatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_required(&mut errors, "title", &self.title, "Title");
        check_slug(&mut errors, "slug", &self.slug);
        errors.into_result()
    }
}

/// Single-field changes the guides screen offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideField {
    /// Pin or unpin from the landing page.
    Featured(bool),
    /// Move the guide to a different publication state.
    Status(GuideStatus),
}

impl FieldEncode for GuideField {
    fn to_request(&self) -> FieldChangeRequest {
        match self {
            Self::Featured(featured) => {
                FieldChangeRequest::new("featured".into(), serde_json::Value::Bool(*featured))
            }
            Self::Status(status) => FieldChangeRequest::new(
                "status".into(),
                serde_json::Value::String(status.as_str().into()),
            ),
        }
    }
}

/// Filter state for the guides screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuideFilter {
    /// Restrict the list to one category.
    pub category_id: Option<Uuid>,
    /// Restrict the list to one publication state.
    pub status: Option<GuideStatus>,
}

impl FilterParams for GuideFilter {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category_id) = self.category_id {
            pairs.push(("category_id", category_id.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs
    }
}

impl ListResource for Guide {
    type Draft = GuideDraft;
    type Patch = GuidePatch;
    type Field = GuideField;
    type Filter = GuideFilter;

    const COLLECTION: &'static str = "guides";

    fn id(&self) -> Uuid {
        self.id
    }

    fn merge(&mut self, patch: &Self::Patch) {
        self.title = patch.title.clone();
        self.slug = patch.slug.clone();
        if self.category_id != patch.category_id {
            self.category_id = patch.category_id;
            // The joined name belongs to the old category; reconcile fills it.
            self.category_name = None;
        }
    }

    fn apply_field(&mut self, change: &Self::Field) {
        match change {
            GuideField::Featured(featured) => self.featured = *featured,
            GuideField::Status(status) => self.status = *status,
        }
    }

    fn provisional(draft: &Self::Draft) -> Option<Self> {
        Some(Self {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            slug: draft.slug.clone(),
            category_id: draft.category_id,
            category_name: None,
            status: GuideStatus::Draft,
            featured: false,
            updated_at: Utc::now(),
        })
    }
}

/// A guide category as the categories screen lists it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    /// Stable identifier of the category.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Number of guides filed under the category.
    pub guide_count: u64,
}

/// Payload for creating a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryDraft {
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
}

impl Validate for CategoryDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_required(&mut errors, "name", &self.name, "Name");
        check_slug(&mut errors, "slug", &self.slug);
        errors.into_result()
    }
}

/// Payload for editing a category.
pub type CategoryPatch = CategoryDraft;

impl ListResource for Category {
    type Draft = CategoryDraft;
    type Patch = CategoryPatch;
    type Field = ();
    type Filter = ();

    const COLLECTION: &'static str = "categories";

    fn id(&self) -> Uuid {
        self.id
    }

    fn merge(&mut self, patch: &Self::Patch) {
        self.name = patch.name.clone();
        self.slug = patch.slug.clone();
    }

    fn apply_field(&mut self, _change: &Self::Field) {}

    fn provisional(draft: &Self::Draft) -> Option<Self> {
        Some(Self {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            slug: draft.slug.clone(),
            guide_count: 0,
        })
    }
}

/// Billing plan a subscription is on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    /// No charge, limited access.
    Free,
    /// Billed monthly.
    Monthly,
    /// Billed yearly.
    Annual,
}

impl PlanKind {
    /// Stable lowercase label used in filters and tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }
}

/// Billing state of a subscription.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid up and running.
    Active,
    /// A renewal charge failed.
    PastDue,
    /// Ended by the subscriber or by billing.
    Canceled,
}

impl SubscriptionStatus {
    /// Stable lowercase label used in filters and tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
        }
    }
}

/// A paid subscription as the subscriptions screen lists it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subscription {
    /// Stable identifier of the subscription.
    pub id: Uuid,
    /// Account that owns the subscription.
    pub user_id: Uuid,
    /// Owner's email, joined in for display.
    pub user_email: String,
    /// Billing plan.
    pub plan: PlanKind,
    /// Billing state.
    pub status: SubscriptionStatus,
    /// Whether the subscription renews automatically.
    pub auto_renew: bool,
    /// When the subscription started.
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Next renewal, absent once canceled.
    pub renews_at: Option<DateTime<Utc>>,
}

/// Payload for granting a subscription to an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionDraft {
    /// Account to grant the subscription to.
    pub user_id: Uuid,
    /// Billing plan to grant.
    pub plan: PlanKind,
}

impl Validate for SubscriptionDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// Payload for moving a subscription to a different plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionPatch {
    /// Billing plan to move to.
    pub plan: PlanKind,
}

impl Validate for SubscriptionPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// Single-field changes the subscriptions screen offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionField {
    /// Turn automatic renewal on or off.
    AutoRenew(bool),
}

impl FieldEncode for SubscriptionField {
    fn to_request(&self) -> FieldChangeRequest {
        match self {
            Self::AutoRenew(auto_renew) => {
                FieldChangeRequest::new("auto_renew".into(), serde_json::Value::Bool(*auto_renew))
            }
        }
    }
}

/// Filter state for the subscriptions screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscriptionFilter {
    /// Restrict the list to one plan.
    pub plan: Option<PlanKind>,
    /// Restrict the list to one billing state.
    pub status: Option<SubscriptionStatus>,
}

impl FilterParams for SubscriptionFilter {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(plan) = self.plan {
            pairs.push(("plan", plan.as_str().to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs
    }
}

impl ListResource for Subscription {
    type Draft = SubscriptionDraft;
    type Patch = SubscriptionPatch;
    type Field = SubscriptionField;
    type Filter = SubscriptionFilter;

    const COLLECTION: &'static str = "subscriptions";

    fn id(&self) -> Uuid {
        self.id
    }

    fn merge(&mut self, patch: &Self::Patch) {
        self.plan = patch.plan;
    }

    fn apply_field(&mut self, change: &Self::Field) {
        match change {
            SubscriptionField::AutoRenew(auto_renew) => self.auto_renew = *auto_renew,
        }
    }

    // Billing assigns the start and renewal dates, so a subscription only
    // appears once the backend confirms it.
}

/// A newsletter signup as the newsletter screen lists it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsletterSubscriber {
    /// Stable identifier of the signup.
    pub id: Uuid,
    /// Address the newsletter goes to.
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Platform account linked to the address, when one exists.
    pub user_id: Option<Uuid>,
    /// Whether the address completed double opt-in.
    pub confirmed: bool,
    /// When the signup happened.
    pub subscribed_at: DateTime<Utc>,
}

/// Payload for adding a newsletter signup by hand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriberDraft {
    /// Address to subscribe.
    pub email: String,
}

impl Validate for SubscriberDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_email(&mut errors, "email", &self.email);
        errors.into_result()
    }
}

/// Payload for correcting a signup's address.
pub type SubscriberPatch = SubscriberDraft;

/// Single-field changes the newsletter screen offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberField {
    /// Mark the address as confirmed or unconfirmed.
    Confirmed(bool),
}

impl FieldEncode for SubscriberField {
    fn to_request(&self) -> FieldChangeRequest {
        match self {
            Self::Confirmed(confirmed) => {
                FieldChangeRequest::new("confirmed".into(), serde_json::Value::Bool(*confirmed))
            }
        }
    }
}

/// Filter state for the newsletter screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscriberFilter {
    /// Restrict the list to confirmed or unconfirmed signups.
    pub confirmed: Option<bool>,
}

impl FilterParams for SubscriberFilter {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.confirmed
            .map(|confirmed| ("confirmed", confirmed.to_string()))
            .into_iter()
            .collect()
    }
}

impl ListResource for NewsletterSubscriber {
    type Draft = SubscriberDraft;
    type Patch = SubscriberPatch;
    type Field = SubscriberField;
    type Filter = SubscriberFilter;

    const COLLECTION: &'static str = "newsletter";

    fn id(&self) -> Uuid {
        self.id
    }

    fn merge(&mut self, patch: &Self::Patch) {
        self.email = patch.email.clone();
    }

    fn apply_field(&mut self, change: &Self::Field) {
        match change {
            SubscriberField::Confirmed(confirmed) => self.confirmed = *confirmed,
        }
    }

    fn provisional(draft: &Self::Draft) -> Option<Self> {
        Some(Self {
            id: Uuid::new_v4(),
            email: draft.email.clone(),
            user_id: None,
            confirmed: false,
            subscribed_at: Utc::now(),
        })
    }

    fn missing_dependency(&self, change: &Self::Field) -> Option<&'static str> {
        let SubscriberField::Confirmed(_) = change;
        if self.user_id.is_none() {
            Some("This subscriber has no linked user account, so their preference cannot be changed.")
        } else {
            None
        }
    }
}

/// Workflow state of a support ticket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Waiting for first contact.
    Open,
    /// Waiting on the requester.
    Pending,
    /// Fixed, awaiting confirmation.
    Resolved,
    /// Done.
    Closed,
}

impl TicketStatus {
    /// Stable lowercase label used in filters and tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

/// Urgency of a support ticket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    /// Can wait.
    Low,
    /// Default queue position.
    Normal,
    /// Jump the queue.
    High,
    /// Drop everything.
    Urgent,
}

impl TicketPriority {
    /// Stable lowercase label used in filters and tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

/// A support ticket as the tickets screen lists it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupportTicket {
    /// Stable identifier of the ticket.
    pub id: Uuid,
    /// One-line problem statement.
    pub subject: String,
    /// Address of the person asking.
    pub requester_email: String,
    /// Workflow state.
    pub status: TicketStatus,
    /// Urgency.
    pub priority: TicketPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Staff account working the ticket.
    pub assignee_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Staff display name, joined in for display.
    pub assignee_name: Option<String>,
    /// When the ticket last changed.
    pub updated_at: DateTime<Utc>,
}

/// Payload for opening a ticket on someone's behalf.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketDraft {
    /// One-line problem statement.
    pub subject: String,
    /// Address of the person asking.
    pub requester_email: String,
    /// Urgency to file under.
    pub priority: TicketPriority,
}

impl Validate for TicketDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_required(&mut errors, "subject", &self.subject, "Subject");
        check_email(&mut errors, "requester_email", &self.requester_email);
        errors.into_result()
    }
}

/// Payload for editing a ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketPatch {
    /// One-line problem statement.
    pub subject: String,
    /// Urgency to file under.
    pub priority: TicketPriority,
}

impl Validate for TicketPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_required(&mut errors, "subject", &self.subject, "Subject");
        errors.into_result()
    }
}

/// Single-field changes the tickets screen offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketField {
    /// Move the ticket to a different workflow state.
    Status(TicketStatus),
    /// Hand the ticket to a staff account, or back to the queue.
    Assignee(Option<Uuid>),
}

impl FieldEncode for TicketField {
    fn to_request(&self) -> FieldChangeRequest {
        match self {
            Self::Status(status) => FieldChangeRequest::new(
                "status".into(),
                serde_json::Value::String(status.as_str().into()),
            ),
            Self::Assignee(assignee) => FieldChangeRequest::new(
                "assignee_id".into(),
                assignee.map_or(serde_json::Value::Null, |id| {
                    serde_json::Value::String(id.to_string())
                }),
            ),
        }
    }
}

/// Filter state for the tickets screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TicketFilter {
    /// Restrict the list to one workflow state.
    pub status: Option<TicketStatus>,
    /// Restrict the list to one urgency.
    pub priority: Option<TicketPriority>,
}

impl FilterParams for TicketFilter {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.as_str().to_string()));
        }
        pairs
    }
}

impl ListResource for SupportTicket {
    type Draft = TicketDraft;
    type Patch = TicketPatch;
    type Field = TicketField;
    type Filter = TicketFilter;

    const COLLECTION: &'static str = "tickets";

    fn id(&self) -> Uuid {
        self.id
    }

    fn merge(&mut self, patch: &Self::Patch) {
        self.subject = patch.subject.clone();
        self.priority = patch.priority;
    }

    fn apply_field(&mut self, change: &Self::Field) {
        match change {
            TicketField::Status(status) => self.status = *status,
            TicketField::Assignee(assignee) => {
                self.assignee_id = *assignee;
                // The joined display name catches up when the backend row
                // replaces this projection.
                self.assignee_name = None;
            }
        }
    }

    fn provisional(draft: &Self::Draft) -> Option<Self> {
        Some(Self {
            id: Uuid::new_v4(),
            subject: draft.subject.clone(),
            requester_email: draft.requester_email.clone(),
            status: TicketStatus::Open,
            priority: draft.priority,
            assignee_id: None,
            assignee_name: None,
            updated_at: Utc::now(),
        })
    }
}
