//! Text filter, category filter and pagination over a snapshot.

use flowdex_core::{CatalogItem, FlowdexError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Category value that disables category filtering.
pub const ALL_CATEGORIES: &str = "all";

/// Raw, unvalidated list parameters as they arrive in a query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// Validated list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Lowercased filter text, `None` when absent or blank.
    pub text: Option<String>,
    pub category: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            text: None,
            category: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

fn parse_positive(field: &str, raw: Option<&str>, default: usize) -> Result<usize> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<usize>() {
        Ok(0) => Err(FlowdexError::InvalidQuery(format!("{} must be at least 1", field))),
        Ok(n) => Ok(n),
        Err(_) => Err(FlowdexError::InvalidQuery(format!(
            "{} must be a positive integer, got '{}'",
            field, raw
        ))),
    }
}

impl ListQuery {
    pub fn new(text: Option<&str>, category: Option<&str>, page: usize, page_size: usize) -> Result<Self> {
        if page == 0 {
            return Err(FlowdexError::InvalidQuery("page must be at least 1".into()));
        }
        if page_size == 0 {
            return Err(FlowdexError::InvalidQuery("per_page must be at least 1".into()));
        }
        Ok(Self {
            text: text.map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase),
            category: category
                .map(str::trim)
                .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
                .map(str::to_string),
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        })
    }

    /// Validate raw parameters. Page sizes above the maximum are clamped.
    pub fn from_params(params: &ListParams) -> Result<Self> {
        let page = parse_positive("page", params.page.as_deref(), 1)?;
        let page_size = parse_positive("per_page", params.per_page.as_deref(), DEFAULT_PAGE_SIZE)?;
        Self::new(params.q.as_deref(), params.category.as_deref(), page, page_size)
    }

    pub fn matches(&self, item: &CatalogItem) -> bool {
        let category_ok = self.category.as_ref().is_none_or(|c| item.category == *c);
        category_ok && self.text.as_deref().is_none_or(|t| item.matches_text(t))
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage {
    pub items: Vec<CatalogItem>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
}

/// Filter `items` and cut out the requested page.
pub fn paginate(items: &[CatalogItem], query: &ListQuery) -> ListPage {
    let matched: Vec<&CatalogItem> = items.iter().filter(|i| query.matches(i)).collect();
    let total = matched.len();
    let start = (query.page - 1).saturating_mul(query.page_size);

    ListPage {
        items: matched
            .into_iter()
            .skip(start)
            .take(query.page_size)
            .cloned()
            .collect(),
        total,
        page: query.page,
        page_size: query.page_size,
        page_count: total.div_ceil(query.page_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn item(name: &str, description: &str, category: &str) -> CatalogItem {
        CatalogItem {
            id: name.into(),
            filename: format!("{}.zip", name),
            name: name.into(),
            category: category.into(),
            kind: "W".into(),
            source: "community".into(),
            description: description.into(),
            tags: vec![category.into(), "Coze".into()],
            url: String::new(),
            details: None,
            path: PathBuf::new(),
            revision: 0,
        }
    }

    fn params(page: Option<&str>, per_page: Option<&str>) -> ListParams {
        ListParams {
            page: page.map(str::to_string),
            per_page: per_page.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let q = ListQuery::from_params(&ListParams::default()).unwrap();
        assert_eq!(q, ListQuery::default());
    }

    #[test]
    fn rejects_bad_numbers() {
        for (page, per_page) in [(Some("0"), None), (None, Some("0")), (Some("abc"), None), (None, Some("-5"))] {
            let err = ListQuery::from_params(&params(page, per_page)).unwrap_err();
            assert!(matches!(err, FlowdexError::InvalidQuery(_)), "{:?}", (page, per_page));
        }
    }

    #[test]
    fn clamps_page_size() {
        let q = ListQuery::from_params(&params(Some("2"), Some("500"))).unwrap();
        assert_eq!(q.page, 2);
        assert_eq!(q.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn all_category_means_no_filter() {
        let q = ListQuery::new(None, Some("all"), 1, 20).unwrap();
        assert_eq!(q.category, None);
    }

    #[test]
    fn text_filter_is_case_insensitive_over_tags() {
        let items = vec![item("a", "Web SEARCH tool", "工具"), item("b", "other", "coze-x"), item("c", "x", "y")];
        let page = paginate(&items, &ListQuery::new(Some("search"), None, 1, 20).unwrap());
        assert_eq!(page.total, 1);
        let page = paginate(&items, &ListQuery::new(Some("COZE"), None, 1, 20).unwrap());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn category_filter_is_exact() {
        let items = vec![item("a", "", "工具"), item("b", "", "工具箱")];
        let page = paginate(&items, &ListQuery::new(None, Some("工具"), 1, 20).unwrap());
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "a");
    }

    #[test]
    fn page_length_invariant() {
        let items: Vec<_> = (0..23).map(|i| item(&format!("w{}", i), "", "c")).collect();
        for page_size in [1, 5, 7, 20, 23, 100] {
            for page in 1..=6 {
                let p = paginate(&items, &ListQuery::new(None, None, page, page_size).unwrap());
                let expected = page_size.min(23usize.saturating_sub((page - 1) * page_size));
                assert_eq!(p.items.len(), expected, "page={} size={}", page, page_size);
                assert_eq!(p.page_count, 23usize.div_ceil(page_size));
            }
        }
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let p = paginate(&[], &ListQuery::default());
        assert_eq!(p.total, 0);
        assert_eq!(p.page_count, 0);
        assert!(p.items.is_empty());
    }
}
