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
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Screen-agnostic building blocks for paginated admin lists.
//!
//! Layout: `query.rs` (list queries and their transitions), `set.rs` (resource
//! pages and pagination math), `resource.rs` (the [`ListResource`] seam each
//! screen implements), `mutation.rs` (typed write intents and their outcomes),
//! `gateway.rs` (the async backend seam), `error.rs` (failure taxonomy).

pub mod error;
pub mod gateway;
pub mod mutation;
pub mod query;
pub mod resource;
pub mod set;

pub use error::{FieldViolation, GatewayError, GatewayResult, ValidationErrors};
pub use gateway::ResourceGateway;
pub use mutation::{MutationIntent, MutationOutcome, MutationRejection};
pub use query::{DEFAULT_PAGE_SIZE, FilterParams, ListQuery, normalize_keyword};
pub use resource::{ListResource, Validate};
pub use set::{ResourceSet, clamp_page, page_count_for};
