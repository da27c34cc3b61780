use serde::{Deserialize, Serialize};

use crate::{
    constants::{MAX_PAGE_NUMBER, MAX_PAGE_SIZE},
    error::ApiError,
};

/// `page` is 1-based; `limit` falls back to the listing's default page size.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page
            .filter(|page| *page >= 1)
            .unwrap_or(1)
            .min(MAX_PAGE_NUMBER)
    }

    pub fn limit(&self, default: i64) -> i64 {
        self.limit
            .filter(|limit| *limit >= 1)
            .unwrap_or(default)
            .min(MAX_PAGE_SIZE)
    }

    pub fn offset(&self, default: i64) -> i64 {
        (self.page() - 1).saturating_mul(self.limit(default))
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> PageContext<T> {
    /// `total_rows` comes from a window count, so an empty page past the
    /// first carries no total and is reported as out of range.
    pub fn from_rows(
        rows: Vec<T>,
        total_rows: i64,
        page_size: i64,
        page: i64,
    ) -> Result<Self, ApiError> {
        if rows.is_empty() {
            return match page {
                1 => Ok(Self::no_rows()),
                _ => Err(ApiError::InvalidPage),
            };
        }
        let page_count = (total_rows + page_size - 1) / page_size;

        Ok(Self {
            results: rows,
            count: total_rows,
            next: (page < page_count).then_some(page + 1),
            previous: (page > 1).then_some(page - 1),
        })
    }

    pub fn no_rows() -> Self {
        Self {
            results: vec![],
            count: 0,
            next: None,
            previous: None,
        }
    }

    pub fn map<U, F>(self, f: F) -> PageContext<U>
    where
        F: FnMut(T) -> U,
    {
        PageContext {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_and_bounds() {
        let query = PageQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(6), 6);
        assert_eq!(query.offset(6), 0);

        let query = PageQuery {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(query.offset(6), 20);

        let query = PageQuery {
            page: Some(0),
            limit: Some(100_000),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(6), MAX_PAGE_SIZE);
    }

    #[test]
    fn huge_page_number_does_not_overflow() {
        let query = PageQuery {
            page: Some(i64::MAX),
            limit: Some(10),
        };
        assert_eq!(query.page(), MAX_PAGE_NUMBER);
        assert_eq!(query.offset(6), (MAX_PAGE_NUMBER - 1) * 10);

        let query = PageQuery {
            page: Some(i64::MAX),
            limit: Some(i64::MAX),
        };
        assert!(query.offset(6) > 0);
    }

    #[test]
    fn first_middle_and_last_page() {
        let page = PageContext::from_rows(vec![1, 2, 3], 8, 3, 1).unwrap();
        assert_eq!((page.count, page.next, page.previous), (8, Some(2), None));

        let page = PageContext::from_rows(vec![4, 5, 6], 8, 3, 2).unwrap();
        assert_eq!((page.next, page.previous), (Some(3), Some(1)));

        let page = PageContext::from_rows(vec![7, 8], 8, 3, 3).unwrap();
        assert_eq!((page.next, page.previous), (None, Some(2)));
    }

    #[test]
    fn empty_first_page() {
        let page: PageContext<i32> = PageContext::from_rows(vec![], 0, 6, 1).unwrap();
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());
        assert_eq!((page.next, page.previous), (None, None));
    }

    #[test]
    fn page_past_the_end_is_invalid() {
        let result: Result<PageContext<i32>, ApiError> = PageContext::from_rows(vec![], 8, 6, 5);
        assert!(matches!(result, Err(ApiError::InvalidPage)));

        let result: Result<PageContext<i32>, ApiError> = PageContext::from_rows(vec![], 0, 6, 2);
        assert!(matches!(result, Err(ApiError::InvalidPage)));
    }

    #[test]
    fn map_keeps_counters() {
        let page = PageContext::from_rows(vec![1, 2], 4, 2, 1).unwrap().map(|n| n * 10);
        assert_eq!(page.results, vec![10, 20]);
        assert_eq!(page.next, Some(2));
    }
}
