//! Page request/response and offset arithmetic.

use serde::{Deserialize, Serialize};

/// Default page size applied when the caller asks for a non-positive one
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// One page of `T`
///
/// `current` and `size` are caller input (1-based page number, rows per page);
/// `total` and `records` are filled in by `BaseDao::select_page`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub current: i64,
    pub size: i64,
    pub total: i64,
    pub records: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

impl<T> Page<T> {
    pub fn new(current: i64, size: i64) -> Self {
        Self {
            current,
            size,
            total: 0,
            records: Vec::new(),
        }
    }

    /// Window for this page after normalization
    pub fn pagination(&self) -> Pagination {
        paginate(self.current, self.size)
    }
}

/// Offset/limit pair applied to a data query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

/// `current <= 0` becomes 1 and `size <= 0` becomes [`DEFAULT_PAGE_SIZE`];
/// offset is `(current - 1) * size`.
pub fn paginate(current: i64, size: i64) -> Pagination {
    let current = if current <= 0 { 1 } else { current as u64 };
    let size = if size <= 0 {
        DEFAULT_PAGE_SIZE as u64
    } else {
        size as u64
    };
    Pagination {
        offset: (current - 1).saturating_mul(size),
        limit: size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_normalizes_non_positive_input() {
        assert_eq!(paginate(0, 0), Pagination { offset: 0, limit: 10 });
        assert_eq!(paginate(-3, -1), Pagination { offset: 0, limit: 10 });
    }

    #[test]
    fn test_paginate_offset() {
        assert_eq!(paginate(3, 10), Pagination { offset: 20, limit: 10 });
        assert_eq!(paginate(1, 25), Pagination { offset: 0, limit: 25 });
    }

    #[test]
    fn test_page_serializes_with_field_names() {
        let mut page: Page<i32> = Page::new(2, 5);
        page.total = 7;
        page.records = vec![6, 7];
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["current"], 2);
        assert_eq!(json["total"], 7);
        assert_eq!(json["records"], serde_json::json!([6, 7]));
    }
}
