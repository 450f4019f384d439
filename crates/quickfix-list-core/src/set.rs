//! Resource pages and the pagination arithmetic around them.

/// One page of results as the backend described it.
///
/// A set is always replaced wholesale when a fetch settles; nothing ever
/// merges rows from two different fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSet<R> {
    /// Rows on this page, in backend order.
    pub items: Vec<R>,
    /// Total rows matching the query across all pages.
    pub total: u64,
    /// One-based index of the page these rows came from.
    pub page: u32,
    /// Number of pages the total spans at the query's page size.
    pub page_count: u32,
}

impl<R> Default for ResourceSet<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R> ResourceSet<R> {
    /// The set shown before any fetch has settled.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            page_count: 0,
        }
    }

    /// Build a set from a backend page, deriving the page count.
    #[must_use]
    pub fn from_page(items: Vec<R>, total: u64, page: u32, page_size: u32) -> Self {
        Self {
            items,
            total,
            page,
            page_count: page_count_for(total, page_size),
        }
    }

    /// True when the page holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when the total spans more than one page, i.e. when pagination
    /// controls are worth showing.
    #[must_use]
    pub const fn is_paged(&self) -> bool {
        self.page_count > 1
    }

    /// The page the console should move to when this page came back empty
    /// even though earlier pages exist. Happens when the last row of the
    /// final page is deleted.
    #[must_use]
    pub const fn corrected_page(&self) -> Option<u32> {
        if self.items.is_empty() && self.page > 1 {
            Some(self.page - 1)
        } else {
            None
        }
    }
}

/// Number of pages `total` rows span at `page_size` rows per page.
///
/// Zero rows span zero pages; any remainder adds a final partial page.
#[must_use]
pub fn page_count_for(total: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let count = total.div_ceil(page_size);
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Clamp a requested page into the range the set actually has.
///
/// An empty list still has a notional page one so the console never renders
/// "page 0".
#[must_use]
pub const fn clamp_page(requested: u32, page_count: u32) -> u32 {
    let highest = if page_count == 0 { 1 } else { page_count };
    if requested < 1 {
        1
    } else if requested > highest {
        highest
    } else {
        requested
    }
}
