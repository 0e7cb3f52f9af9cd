// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

const DEFAULT_LIMIT: i64 = 30;
const MAX_LIMIT: i64 = 100;

// Query params de paginação usados por todas as listagens.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PaginationQuery {
    /// Página corrente, nunca menor que 1.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Tamanho da página, limitado a [1, 100].
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

// Envelope de paginação que o frontend espera (camelCase).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub limit: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageInfo {
    pub fn new(query: &PaginationQuery, total_count: i64) -> Self {
        let limit = query.limit();
        let page = query.page();
        let total_pages = if total_count == 0 {
            0
        } else {
            (total_count + limit - 1) / limit
        };
        Self {
            current_page: page,
            total_pages,
            total_count,
            limit,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(page: Option<i64>, limit: Option<i64>) -> PaginationQuery {
        PaginationQuery { page, limit }
    }

    #[test]
    fn clamps_page_and_limit() {
        assert_eq!(q(None, None).page(), 1);
        assert_eq!(q(Some(0), None).page(), 1);
        assert_eq!(q(Some(-3), None).page(), 1);
        assert_eq!(q(None, None).limit(), 30);
        assert_eq!(q(None, Some(0)).limit(), 1);
        assert_eq!(q(None, Some(5000)).limit(), 100);
    }

    #[test]
    fn offset_follows_page() {
        assert_eq!(q(Some(1), Some(30)).offset(), 0);
        assert_eq!(q(Some(3), Some(30)).offset(), 60);
    }

    #[test]
    fn page_info_rounds_up() {
        let info = PageInfo::new(&q(Some(2), Some(30)), 61);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next_page);
        assert!(info.has_prev_page);

        let empty = PageInfo::new(&q(None, None), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }
}
