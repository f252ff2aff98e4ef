//! Book catalog: listings, details and reviews.

pub mod listing;
pub mod rating;
mod service;

pub use listing::{BookFilter, ListQuery, PageRequest, SortOrder};
pub use rating::RatingSummary;
pub use service::{
    BookDetail, BookPage, BookSummary, CatalogService, NewBook, NewReview, ReviewView, UserRef,
};
