mod schema;

pub use schema::Database;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: String,
    /// Display name shown next to books and reviews.
    pub username: String,
    /// Login email, stored lower-cased.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account creation time, Unix milliseconds.
    pub created_at: i64,
}

/// Authentication session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session token.
    pub token: String,
    /// User ID.
    pub user_id: String,
    /// Expiration time, Unix milliseconds.
    pub expires_at: i64,
}

/// Stored book row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBook {
    /// Book ID.
    pub id: String,
    /// Book title.
    pub title: String,
    /// Author name, matched exactly by listing filters.
    pub author: String,
    /// Genre, matched exactly by listing filters.
    pub genre: String,
    /// ID of the user who submitted the book.
    pub created_by: String,
    /// Creation time, Unix milliseconds.
    pub created_at: i64,
}

/// Stored review row. Linked to its book only through `book_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReview {
    /// Review ID.
    pub id: String,
    /// Reviewed book.
    pub book_id: String,
    /// Reviewing user.
    pub user_id: String,
    /// Rating from 1 to 5.
    pub rating: i64,
    /// Review text.
    pub text: String,
    /// Creation time, Unix milliseconds.
    pub created_at: i64,
}

/// Book joined with its creator name and review aggregate.
#[derive(Debug, Clone)]
pub struct BookAggregate {
    /// The book itself.
    pub book: StoredBook,
    /// Creator username.
    pub creator_name: String,
    /// Number of reviews referencing the book.
    pub review_count: i64,
    /// Sum of their ratings.
    pub rating_sum: i64,
}

/// Review joined with the reviewer's username.
#[derive(Debug, Clone)]
pub struct ReviewWithAuthor {
    /// The review itself.
    pub review: StoredReview,
    /// Reviewer username.
    pub username: String,
}

/// Current time in Unix milliseconds. Every stored timestamp uses this unit.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a millisecond timestamp to DateTime.
pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts).unwrap_or_else(Utc::now)
}
