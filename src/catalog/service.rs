//! Catalog service: the operations behind the book and review routes.

use crate::catalog::listing::{BookFilter, ListQuery, PageRequest, SortOrder};
use crate::catalog::rating::RatingSummary;
use crate::config::ListingConfig;
use crate::db::{
    self, BookAggregate, Database, ReviewWithAuthor, StoredBook, StoredReview, User,
    now_timestamp,
};
use crate::error::{AppError, Result};
use crate::validation::FieldChecks;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Lowest accepted rating.
pub const MIN_RATING: i64 = 1;
/// Highest accepted rating.
pub const MAX_RATING: i64 = 5;

/// Public reference to a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserRef {
    /// User ID.
    pub id: String,
    /// Username.
    pub username: String,
}

/// Book as shown in listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    /// Book ID.
    pub id: String,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Genre.
    pub genre: String,
    /// Submitting user.
    pub created_by: UserRef,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Mean rating to one decimal, `null` without reviews.
    pub avg_rating: Option<f64>,
    /// Number of reviews.
    pub review_count: i64,
}

impl BookSummary {
    fn new(book: StoredBook, creator_name: String, rating: RatingSummary) -> Self {
        Self {
            created_by: UserRef {
                id: book.created_by,
                username: creator_name,
            },
            created_at: db::timestamp_to_datetime(book.created_at),
            avg_rating: rating.average(),
            review_count: rating.count,
            id: book.id,
            title: book.title,
            author: book.author,
            genre: book.genre,
        }
    }
}

impl From<BookAggregate> for BookSummary {
    fn from(entry: BookAggregate) -> Self {
        let rating = RatingSummary::new(entry.review_count, entry.rating_sum);
        Self::new(entry.book, entry.creator_name, rating)
    }
}

/// Review with its author.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    /// Review ID.
    pub id: String,
    /// Reviewed book ID.
    pub book: String,
    /// Reviewer.
    pub user: UserRef,
    /// Rating from 1 to 5.
    pub rating: i64,
    /// Review text.
    pub text: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

impl From<ReviewWithAuthor> for ReviewView {
    fn from(row: ReviewWithAuthor) -> Self {
        let review = row.review;
        Self {
            id: review.id,
            book: review.book_id,
            user: UserRef {
                id: review.user_id,
                username: row.username,
            },
            rating: review.rating,
            text: review.text,
            created_at: db::timestamp_to_datetime(review.created_at),
        }
    }
}

/// Book with its reviews.
#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    /// Book fields, rating included.
    #[serde(flatten)]
    pub book: BookSummary,
    /// Reviews, newest first.
    pub reviews: Vec<ReviewView>,
}

/// One listing page.
#[derive(Debug, Clone, Serialize)]
pub struct BookPage {
    /// Books on this page.
    pub books: Vec<BookSummary>,
    /// Number of books matching the filter across all pages.
    pub total: usize,
}

/// Book submission. Fields stay raw JSON so a wrongly typed value is
/// reported against its field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBook {
    /// Title.
    #[serde(default)]
    pub title: Option<Value>,
    /// Author.
    #[serde(default)]
    pub author: Option<Value>,
    /// Genre.
    #[serde(default)]
    pub genre: Option<Value>,
}

/// Review submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReview {
    /// Rating; integers and integer strings are accepted, anything else is
    /// kept as `None` and rejected by validation.
    #[serde(default, deserialize_with = "lenient_integer")]
    pub rating: Option<i64>,
    /// Review text.
    #[serde(default)]
    pub text: Option<Value>,
}

fn lenient_integer<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Catalog operations over the shared store.
pub struct CatalogService {
    db: Database,
    default_limit: u32,
    max_limit: u32,
}

impl CatalogService {
    /// Create a new catalog service.
    pub fn new(db: Database, listing: &ListingConfig) -> Self {
        Self {
            db,
            default_limit: listing.default_limit,
            max_limit: listing.max_limit,
        }
    }

    /// Build a listing query from raw request values.
    pub fn query(
        &self,
        page: Option<&str>,
        limit: Option<&str>,
        genre: Option<&str>,
        author: Option<&str>,
        sort: Option<&str>,
    ) -> ListQuery {
        ListQuery {
            filter: BookFilter::new(genre, author),
            sort: SortOrder::parse(sort),
            page: PageRequest::resolve(page, limit, self.default_limit, self.max_limit),
        }
    }

    /// List one page of books matching the filter.
    pub fn list_books(&self, query: &ListQuery) -> Result<BookPage> {
        let (rows, total) = self.db.list_books(query)?;

        tracing::debug!(
            genre = ?query.filter.genre,
            author = ?query.filter.author,
            sort = ?query.sort,
            page = query.page.page,
            limit = query.page.limit,
            total,
            returned = rows.len(),
            "Listed books"
        );

        Ok(BookPage {
            books: rows.into_iter().map(BookSummary::from).collect(),
            total,
        })
    }

    /// Get a book with its reviews and average rating.
    pub fn get_book(&self, id: &str) -> Result<BookDetail> {
        let (entry, reviews) = self
            .db
            .book_with_reviews(id)?
            .ok_or_else(|| AppError::NotFound("Book".to_string()))?;

        Ok(BookDetail {
            book: BookSummary::from(entry),
            reviews: reviews.into_iter().map(ReviewView::from).collect(),
        })
    }

    /// Submit a new book.
    pub fn add_book(&self, input: NewBook, creator: &User) -> Result<BookSummary> {
        let mut checks = FieldChecks::new();
        let title = checks.text("title", "Title", input.title.as_ref());
        let author = checks.text("author", "Author", input.author.as_ref());
        let genre = checks.text("genre", "Genre", input.genre.as_ref());
        checks.finish()?;

        let (Some(title), Some(author), Some(genre)) = (title, author, genre) else {
            return Err(AppError::Internal("Validated book fields missing".to_string()));
        };

        let book = StoredBook {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            author,
            genre,
            created_by: creator.id.clone(),
            created_at: now_timestamp(),
        };

        self.db.insert_book(&book)?;

        tracing::info!(
            book_id = %book.id,
            title = %book.title,
            user_id = %creator.id,
            "Book added"
        );

        Ok(BookSummary::new(
            book,
            creator.username.clone(),
            RatingSummary::default(),
        ))
    }

    /// Reviews of a book, newest first. Unknown books have no reviews.
    pub fn list_reviews(&self, book_id: &str) -> Result<Vec<ReviewView>> {
        Ok(self
            .db
            .reviews_for_book(book_id)?
            .into_iter()
            .map(ReviewView::from)
            .collect())
    }

    /// Add a review to a book. The same user may review a book any number of
    /// times.
    pub fn add_review(&self, book_id: &str, input: NewReview, author: &User) -> Result<ReviewView> {
        let mut checks = FieldChecks::new();
        let rating = match input.rating {
            Some(r) if (MIN_RATING..=MAX_RATING).contains(&r) => Some(r),
            _ => {
                checks.check(
                    "rating",
                    Err(format!("Rating must be {}-{}", MIN_RATING, MAX_RATING)),
                );
                None
            }
        };
        let text = checks.text("text", "Text", input.text.as_ref());
        checks.finish()?;

        let (Some(rating), Some(text)) = (rating, text) else {
            return Err(AppError::Internal("Validated review fields missing".to_string()));
        };

        if !self.db.book_exists(book_id)? {
            return Err(AppError::NotFound("Book".to_string()));
        }

        let review = StoredReview {
            id: uuid::Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            user_id: author.id.clone(),
            rating,
            text,
            created_at: now_timestamp(),
        };

        self.db.insert_review(&review)?;

        tracing::info!(
            review_id = %review.id,
            book_id = %review.book_id,
            user_id = %author.id,
            rating = review.rating,
            "Review added"
        );

        Ok(ReviewView::from(ReviewWithAuthor {
            review,
            username: author.username.clone(),
        }))
    }
}
