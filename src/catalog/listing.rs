//! Listing requests: which books, in which order, which page.
//!
//! The store applies the request in SQL. Date order is newest first; rating
//! order compares the rounded average (see [`crate::catalog::rating`]) with
//! unrated books last, then falls back to date order. Insertion order breaks
//! the remaining ties so pages never overlap.

/// Exact-match listing filter. `None` leaves the field unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Required genre.
    pub genre: Option<String>,
    /// Required author.
    pub author: Option<String>,
}

impl BookFilter {
    /// Build a filter, treating blank values as absent.
    pub fn new(genre: Option<&str>, author: Option<&str>) -> Self {
        Self {
            genre: non_blank(genre),
            author: non_blank(author),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest first.
    #[default]
    Date,
    /// Highest average rating first, unrated books last.
    Rating,
}

impl SortOrder {
    /// Parse a query value. Anything other than `rating` means date order.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("rating") => SortOrder::Rating,
            _ => SortOrder::Date,
        }
    }
}

/// Resolved page request. Both fields are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Maximum items per page.
    pub limit: u32,
}

impl PageRequest {
    /// Resolve raw query values. Missing, non-integer or non-positive values
    /// fall back to defaults; `limit` is capped at `max_limit`.
    pub fn resolve(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: u32,
        max_limit: u32,
    ) -> Self {
        let max_limit = max_limit.max(1);
        let page = parse_positive(page).unwrap_or(1);
        let limit = parse_positive(limit)
            .unwrap_or(default_limit.max(1))
            .min(max_limit);
        Self { page, limit }
    }

    /// Number of books skipped before this page.
    pub fn offset(&self) -> usize {
        (self.page as usize)
            .saturating_sub(1)
            .saturating_mul(self.limit as usize)
    }
}

fn parse_positive(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v >= 1)
}

/// Complete listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Filter.
    pub filter: BookFilter,
    /// Order.
    pub sort: SortOrder,
    /// Page.
    pub page: PageRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps_bad_values() {
        assert_eq!(
            PageRequest::resolve(None, None, 10, 100),
            PageRequest { page: 1, limit: 10 }
        );
        assert_eq!(
            PageRequest::resolve(Some("0"), Some("-3"), 10, 100),
            PageRequest { page: 1, limit: 10 }
        );
        assert_eq!(
            PageRequest::resolve(Some("abc"), Some("2.5"), 10, 100),
            PageRequest { page: 1, limit: 10 }
        );
        assert_eq!(
            PageRequest::resolve(Some(" 3 "), Some("500"), 10, 100),
            PageRequest { page: 3, limit: 100 }
        );
        assert_eq!(PageRequest { page: 3, limit: 20 }.offset(), 40);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse(Some("rating")), SortOrder::Rating);
        assert_eq!(SortOrder::parse(Some("Rating")), SortOrder::Rating);
        assert_eq!(SortOrder::parse(Some("date")), SortOrder::Date);
        assert_eq!(SortOrder::parse(Some("title")), SortOrder::Date);
        assert_eq!(SortOrder::parse(None), SortOrder::Date);
    }

    #[test]
    fn test_filter_ignores_blank_values() {
        let filter = BookFilter::new(Some(""), Some("Harper Lee"));
        assert_eq!(filter.genre, None);
        assert_eq!(filter.author.as_deref(), Some("Harper Lee"));
    }
}
