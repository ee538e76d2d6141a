//! Pagination for list endpoints.
//!
//! `page` and `limit` arrive as untrusted query strings. They are resolved
//! leniently: anything unusable falls back to a default instead of failing
//! the request. Totals always come from a separate `COUNT(*)` under the same
//! filter, never from the length of the returned page.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Resolved pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number, always >= 1.
    pub page: i64,
    /// Rows per page, always within `[1, PAGE_LIMIT_MAX]`.
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: defaults::PAGE,
            limit: defaults::PAGE_LIMIT,
        }
    }
}

impl Page {
    /// Resolve raw `page` / `limit` query values.
    ///
    /// - `page`: missing, non-numeric or `< 1` → 1
    /// - `limit`: missing, non-numeric or `< 1` → 10; `> 100` → 100
    pub fn resolve(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = parse_int(page)
            .filter(|p| *p >= 1)
            .unwrap_or(defaults::PAGE);
        let limit = match parse_int(limit) {
            Some(l) if l > defaults::PAGE_LIMIT_MAX => defaults::PAGE_LIMIT_MAX,
            Some(l) if l >= 1 => l,
            _ => defaults::PAGE_LIMIT,
        };
        Self { page, limit }
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Build the response metadata once the total is known.
    pub fn meta(&self, total: i64) -> PageMeta {
        PageMeta {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: total_pages(total, self.limit),
        }
    }
}

/// `ceil(total / limit)`; zero rows means zero pages.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
}

/// Pagination metadata returned with every list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// A page of rows plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing() {
        let p = Page::resolve(None, None);
        assert_eq!(p, Page { page: 1, limit: 10 });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_page_below_one_resolves_to_one() {
        for raw in ["0", "-1", "-500"] {
            assert_eq!(Page::resolve(Some(raw), None).page, 1, "page={raw}");
        }
    }

    #[test]
    fn test_non_numeric_page_resolves_to_one() {
        for raw in ["abc", "", "  ", "1.5", "NaN"] {
            assert_eq!(Page::resolve(Some(raw), None).page, 1, "page={raw:?}");
        }
    }

    #[test]
    fn test_limit_above_max_clamps() {
        assert_eq!(Page::resolve(None, Some("101")).limit, 100);
        assert_eq!(Page::resolve(None, Some("100000")).limit, 100);
        assert_eq!(Page::resolve(None, Some("100")).limit, 100);
    }

    #[test]
    fn test_limit_below_one_or_garbage_defaults() {
        for raw in ["0", "-3", "ten", ""] {
            assert_eq!(Page::resolve(None, Some(raw)).limit, 10, "limit={raw:?}");
        }
    }

    #[test]
    fn test_offset_is_page_minus_one_times_limit() {
        let p = Page::resolve(Some("3"), Some("20"));
        assert_eq!(p.offset(), 40);

        for page in 1..=5 {
            for limit in [1, 7, 10, 100] {
                let p = Page::resolve(Some(&page.to_string()), Some(&limit.to_string()));
                assert_eq!(p.offset(), (page - 1) * limit);
            }
        }
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let p = Page::resolve(Some(" 2 "), Some(" 5"));
        assert_eq!(p, Page { page: 2, limit: 5 });
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(101, 10), 11);
        assert_eq!(total_pages(100, 10), 10);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(0, 10), 0);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let meta = Page::resolve(Some("2"), Some("10")).meta(35);
        let json = serde_json::to_value(meta).unwrap();
        assert_eq!(json["page"], 2);
        assert_eq!(json["limit"], 10);
        assert_eq!(json["total"], 35);
        assert_eq!(json["totalPages"], 4);
    }

    #[test]
    fn test_page_past_the_end_is_kept() {
        // Out-of-range pages are served as empty pages, not clamped.
        let p = Page::resolve(Some("50"), Some("10"));
        assert_eq!(p.page, 50);
        assert_eq!(p.meta(11).total_pages, 2);
    }
}
