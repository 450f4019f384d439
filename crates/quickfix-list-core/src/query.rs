//! List queries and the transitions the console applies to them.
//!
//! A query is the full description of what a screen is looking at: the page,
//! the page size, an optional search keyword, and a screen-specific filter.
//! Transitions that change what the list *contains* (filter, keyword) always
//! jump back to the first page; transitions that only move *within* the list
//! (page) leave the rest untouched.

/// Page size used by every admin screen unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Screen-specific filter state that knows how to encode itself for the API.
pub trait FilterParams {
    /// Query-string pairs this filter contributes, omitting unset fields.
    fn query_pairs(&self) -> Vec<(&'static str, String)>;
}

impl FilterParams for () {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Normalise raw search input: trim surrounding whitespace, treat the empty
/// string as "no keyword".
#[must_use]
pub fn normalize_keyword(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Everything needed to ask the backend for one page of a screen's list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery<F> {
    /// One-based page index.
    pub page: u32,
    /// Number of items requested per page.
    pub page_size: u32,
    /// Committed search keyword, already normalised.
    pub keyword: Option<String>,
    /// Screen-specific filter.
    pub filter: F,
}

impl<F: Default> Default for ListQuery<F> {
    fn default() -> Self {
        Self::new(F::default())
    }
}

impl<F> ListQuery<F> {
    /// First page of an unfiltered, unsearched list.
    pub const fn new(filter: F) -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            keyword: None,
            filter,
        }
    }

    /// Override the page size; zero is floored to one.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Move to a different page of the same list; zero is floored to one.
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Swap in a new filter. The list contents change, so the query returns
    /// to the first page.
    #[must_use]
    pub fn with_filter(mut self, filter: F) -> Self {
        self.filter = filter;
        self.page = 1;
        self
    }

    /// Commit a search keyword. The list contents change, so the query
    /// returns to the first page.
    #[must_use]
    pub fn with_keyword(mut self, raw: &str) -> Self {
        self.keyword = normalize_keyword(raw);
        self.page = 1;
        self
    }
}

impl<F: FilterParams> ListQuery<F> {
    /// Full query-string pairs for this query, filter included.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if let Some(keyword) = &self.keyword {
            pairs.push(("keyword", keyword.clone()));
        }
        pairs.extend(self.filter.query_pairs());
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct RoleFilter(Option<&'static str>);

    impl FilterParams for RoleFilter {
        fn query_pairs(&self) -> Vec<(&'static str, String)> {
            self.0.map(|role| ("role", role.to_string())).into_iter().collect()
        }
    }

    #[test]
    fn filter_change_returns_to_first_page() {
        let query = ListQuery::new(RoleFilter(None)).with_page(7);
        assert_eq!(query.page, 7);

        let query = query.with_filter(RoleFilter(Some("editor")));
        assert_eq!(query.page, 1);
        assert_eq!(query.filter, RoleFilter(Some("editor")));
    }

    #[test]
    fn keyword_change_returns_to_first_page_and_normalises() {
        let query = ListQuery::new(RoleFilter(None))
            .with_page(3)
            .with_keyword("  derailleur  ");
        assert_eq!(query.page, 1);
        assert_eq!(query.keyword.as_deref(), Some("derailleur"));

        let query = query.with_page(2).with_keyword("   ");
        assert_eq!(query.page, 1);
        assert_eq!(query.keyword, None);
    }

    #[test]
    fn page_zero_is_floored() {
        let query = ListQuery::new(RoleFilter(None)).with_page(0);
        assert_eq!(query.page, 1);
        assert_eq!(ListQuery::new(RoleFilter(None)).with_page_size(0).page_size, 1);
    }

    #[test]
    fn query_pairs_skip_unset_keyword_and_filter() {
        let bare = ListQuery::new(RoleFilter(None));
        assert_eq!(
            bare.query_pairs(),
            vec![("page", "1".to_string()), ("page_size", "10".to_string())]
        );

        let full = ListQuery::new(RoleFilter(Some("admin")))
            .with_keyword("chain")
            .with_page(2);
        assert_eq!(
            full.query_pairs(),
            vec![
                ("page", "2".to_string()),
                ("page_size", "10".to_string()),
                ("keyword", "chain".to_string()),
                ("role", "admin".to_string()),
            ]
        );
    }
}
