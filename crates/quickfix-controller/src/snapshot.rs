//! The immutable view of a screen that consumers render from.

use quickfix_list_core::ResourceSet;

/// Everything a screen needs to draw itself, captured at one instant.
///
/// Snapshots are cheap to clone and carry no behaviour; the controller
/// publishes a fresh one after every state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot<R> {
    /// Rows to render, already in display order.
    pub items: Vec<R>,
    /// Total rows matching the query across all pages.
    pub total: u64,
    /// One-based page the rows belong to.
    pub page: u32,
    /// Number of pages available.
    pub page_count: u32,
    /// True while a fetch is in flight.
    pub loading: bool,
    /// Operator-facing sentence when the last fetch failed.
    pub error: Option<String>,
    /// What the search box currently shows, committed or not.
    pub search_text: String,
    /// The committed search keyword, when one is active.
    pub keyword: Option<String>,
}

impl<R> ListSnapshot<R> {
    /// The snapshot published before the first fetch settles.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            page_count: 0,
            loading: false,
            error: None,
            search_text: String::new(),
            keyword: None,
        }
    }

    /// True when pagination controls are worth showing.
    #[must_use]
    pub const fn pagination_visible(&self) -> bool {
        self.page_count > 1
    }

    /// True when the screen should show its empty state rather than a table.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.items.is_empty() && !self.loading && self.error.is_none()
    }
}

impl<R: Clone> ListSnapshot<R> {
    /// Assemble a snapshot from the controller's pieces.
    #[must_use]
    pub fn assemble(
        set: &ResourceSet<R>,
        loading: bool,
        error: Option<String>,
        search_text: String,
        keyword: Option<String>,
    ) -> Self {
        Self {
            items: set.items.clone(),
            total: set.total,
            page: set.page,
            page_count: set.page_count,
            loading,
            error,
            search_text,
            keyword,
        }
    }
}
