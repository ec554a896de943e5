use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PageQuery {
    pub page: Option<i64>,
}

impl PageQuery {
    pub fn new(page: i64) -> Self {
        Self { page: Some(page) }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(0)
    }

    /// `(offset, limit)` of a fixed-size page, or `None` for a page <= 0.
    /// The offset saturates at `i64::MAX`, the largest value the database binds.
    pub fn window(&self, page_size: u64) -> Option<(u64, u64)> {
        let page = self.page();
        if page <= 0 {
            return None;
        }
        let offset = (page as u64 - 1)
            .saturating_mul(page_size)
            .min(i64::MAX as u64);
        Some((offset, page_size))
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    /// Exact status label, e.g. `Delivered`.
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_pages_have_no_window() {
        assert_eq!(PageQuery::default().window(10), None);
        assert_eq!(PageQuery::new(0).window(10), None);
        assert_eq!(PageQuery::new(-3).window(10), None);
    }

    #[test]
    fn windows_skip_previous_pages() {
        assert_eq!(PageQuery::new(1).window(10), Some((0, 10)));
        assert_eq!(PageQuery::new(2).window(10), Some((10, 10)));
        assert_eq!(PageQuery::new(3).window(20), Some((40, 20)));
    }

    #[test]
    fn huge_pages_clamp_the_offset() {
        let max = i64::MAX as u64;
        assert_eq!(PageQuery::new(i64::MAX).window(10), Some((max, 10)));
        assert_eq!(PageQuery::new(1_000_000_000_000_000_000).window(10), Some((max, 10)));
        assert_eq!(PageQuery::new(i64::MAX).window(1), Some((max - 1, 1)));
    }
}
