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

//! The list controller every QuickFix admin screen runs on.
//!
//! One controller owns one screen's query, rows, and in-flight work. Fetches
//! are raced through epochs so only the newest one lands, searches debounce
//! before committing, and writes apply optimistically with a rollback held
//! aside. Consumers watch a [`ListSnapshot`] channel; nothing here renders.
//!
//! Layout: `controller.rs` (the state machine), `snapshot.rs` (the published
//! view), `debounce.rs` (trailing-edge scheduling), `session.rs` (session
//! change feed).

pub mod controller;
pub mod debounce;
pub mod session;
pub mod snapshot;

pub use controller::{ControllerConfig, ListController};
pub use debounce::DebouncedSearch;
pub use session::{SessionFeed, SessionInfo};
pub use snapshot::ListSnapshot;
