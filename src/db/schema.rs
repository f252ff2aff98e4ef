use crate::catalog::{ListQuery, SortOrder};
use crate::db::*;
use crate::error::{AppError, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, ToSql, params, params_from_iter};
use std::path::Path;
use std::sync::Arc;

/// Book columns, creator name and `(count, sum)` of review ratings.
const AGGREGATE_SELECT: &str = "SELECT b.id, b.title, b.author, b.genre, b.created_by, b.created_at,
        u.username, COUNT(r.id), COALESCE(SUM(r.rating), 0)
 FROM books b
 JOIN users u ON u.id = b.created_by
 LEFT JOIN reviews r ON r.book_id = b.id";

/// Mean rating in tenths rounded half up, the same value as
/// `RatingSummary::tenths`. Only meaningful when `COUNT(r.id) > 0`.
const RATING_TENTHS: &str =
    "(20 * COALESCE(SUM(r.rating), 0) + COUNT(r.id)) / (2 * COUNT(r.id))";

/// Database wrapper for thread-safe access.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Store(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Open in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Store(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- Users table
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            -- Sessions table
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            -- Books table
            CREATE TABLE IF NOT EXISTS books (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                genre TEXT NOT NULL,
                created_by TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (created_by) REFERENCES users(id)
            );

            -- Reviews table; the book's rating set is every row with its book_id
            CREATE TABLE IF NOT EXISTS reviews (
                id TEXT PRIMARY KEY,
                book_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                text TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (book_id) REFERENCES books(id),
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_books_genre ON books(genre);
            CREATE INDEX IF NOT EXISTS idx_books_author ON books(author);
            CREATE INDEX IF NOT EXISTS idx_reviews_book ON reviews(book_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);
            "#,
        )
        .map_err(|e| AppError::Store(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    // ========== USER OPERATIONS ==========

    /// Create a new user.
    pub fn create_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (id, username, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id,
                user.username,
                user.email,
                user.password_hash,
                user.created_at,
            ],
        )
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint") {
                AppError::invalid_field("email", "Email is already registered")
            } else {
                AppError::Store(format!("Failed to create user: {}", e))
            }
        })?;
        Ok(())
    }

    /// Get user by email.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, username, email, password_hash, created_at
             FROM users WHERE email = ?1",
            params![email],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| AppError::Store(format!("Failed to get user: {}", e)))
    }

    /// Get user by ID.
    pub fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, username, email, password_hash, created_at
             FROM users WHERE id = ?1",
            params![id],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| AppError::Store(format!("Failed to get user: {}", e)))
    }

    /// List all users.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, username, email, password_hash, created_at
                 FROM users ORDER BY email",
            )
            .map_err(|e| AppError::Store(format!("Failed to prepare query: {}", e)))?;

        let users = stmt
            .query_map([], Self::row_to_user)
            .map_err(|e| AppError::Store(format!("Failed to list users: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Store(format!("Failed to collect users: {}", e)))?;

        Ok(users)
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    // ========== SESSION OPERATIONS ==========

    /// Create session.
    pub fn create_session(&self, session: &Session) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
            params![session.token, session.user_id, session.expires_at],
        )
        .map_err(|e| AppError::Store(format!("Failed to create session: {}", e)))?;
        Ok(())
    }

    /// Get session by token.
    pub fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT token, user_id, expires_at FROM sessions WHERE token = ?1",
            params![token],
            |row| {
                Ok(Session {
                    token: row.get(0)?,
                    user_id: row.get(1)?,
                    expires_at: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(|e| AppError::Store(format!("Failed to get session: {}", e)))
    }

    /// Delete session.
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])
            .map_err(|e| AppError::Store(format!("Failed to delete session: {}", e)))?;
        Ok(())
    }

    /// Cleanup expired sessions.
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                params![now_timestamp()],
            )
            .map_err(|e| AppError::Store(format!("Failed to cleanup sessions: {}", e)))?;
        Ok(rows)
    }

    // ========== BOOK OPERATIONS ==========

    /// Insert a new book.
    pub fn insert_book(&self, book: &StoredBook) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO books (id, title, author, genre, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                book.id,
                book.title,
                book.author,
                book.genre,
                book.created_by,
                book.created_at,
            ],
        )
        .map_err(|e| AppError::Store(format!("Failed to save book: {}", e)))?;
        Ok(())
    }

    /// Whether a book with this ID exists.
    pub fn book_exists(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM books WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )
        .map_err(|e| AppError::Store(format!("Failed to look up book: {}", e)))
    }

    /// Get a book with its aggregate and its reviews, read under one lock so
    /// the rating always agrees with the review list.
    pub fn book_with_reviews(
        &self,
        id: &str,
    ) -> Result<Option<(BookAggregate, Vec<ReviewWithAuthor>)>> {
        let conn = self.conn.lock();
        let Some(book) = Self::query_book(&conn, id)? else {
            return Ok(None);
        };
        let reviews = Self::query_reviews(&conn, id)?;
        Ok(Some((book, reviews)))
    }

    fn query_book(conn: &Connection, id: &str) -> Result<Option<BookAggregate>> {
        conn.query_row(
            &format!("{} WHERE b.id = ?1 GROUP BY b.id", AGGREGATE_SELECT),
            params![id],
            Self::row_to_aggregate,
        )
        .optional()
        .map_err(|e| AppError::Store(format!("Failed to get book: {}", e)))
    }

    /// One page of books matching the exact-match filters, ordered and cut
    /// by the store, together with the number of matches on all pages.
    pub fn list_books(&self, query: &ListQuery) -> Result<(Vec<BookAggregate>, usize)> {
        let limit = i64::from(query.page.limit);
        let offset = i64::try_from(query.page.offset()).unwrap_or(i64::MAX);

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<&dyn ToSql> = Vec::new();
        if let Some(genre) = &query.filter.genre {
            clauses.push("b.genre = ?");
            values.push(genre);
        }
        if let Some(author) = &query.filter.author {
            clauses.push("b.author = ?");
            values.push(author);
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let order_clause = match query.sort {
            SortOrder::Date => "b.created_at DESC, b.rowid DESC".to_string(),
            SortOrder::Rating => format!(
                "CASE WHEN COUNT(r.id) = 0 THEN 1 ELSE 0 END, {} DESC, \
                 b.created_at DESC, b.rowid DESC",
                RATING_TENTHS
            ),
        };

        let conn = self.conn.lock();

        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM books b {}", where_clause),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )
            .map_err(|e| AppError::Store(format!("Failed to count books: {}", e)))?;

        let sql = format!(
            "{} {} GROUP BY b.id ORDER BY {} LIMIT ? OFFSET ?",
            AGGREGATE_SELECT, where_clause, order_clause
        );
        values.push(&limit);
        values.push(&offset);

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AppError::Store(format!("Failed to prepare query: {}", e)))?;

        let books = stmt
            .query_map(params_from_iter(values), Self::row_to_aggregate)
            .map_err(|e| AppError::Store(format!("Failed to list books: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Store(format!("Failed to collect books: {}", e)))?;

        Ok((books, usize::try_from(total).unwrap_or_default()))
    }

    fn row_to_aggregate(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookAggregate> {
        Ok(BookAggregate {
            book: StoredBook {
                id: row.get(0)?,
                title: row.get(1)?,
                author: row.get(2)?,
                genre: row.get(3)?,
                created_by: row.get(4)?,
                created_at: row.get(5)?,
            },
            creator_name: row.get(6)?,
            review_count: row.get(7)?,
            rating_sum: row.get(8)?,
        })
    }

    // ========== REVIEW OPERATIONS ==========

    /// Insert a review. A dangling `book_id` is reported as not found.
    pub fn insert_review(&self, review: &StoredReview) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO reviews (id, book_id, user_id, rating, text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                review.id,
                review.book_id,
                review.user_id,
                review.rating,
                review.text,
                review.created_at,
            ],
        )
        .map_err(|e| {
            if e.to_string().contains("FOREIGN KEY constraint") {
                AppError::NotFound("Book".to_string())
            } else {
                AppError::Store(format!("Failed to save review: {}", e))
            }
        })?;
        Ok(())
    }

    /// Reviews of a book with reviewer names, newest first.
    pub fn reviews_for_book(&self, book_id: &str) -> Result<Vec<ReviewWithAuthor>> {
        let conn = self.conn.lock();
        Self::query_reviews(&conn, book_id)
    }

    fn query_reviews(conn: &Connection, book_id: &str) -> Result<Vec<ReviewWithAuthor>> {
        let mut stmt = conn
            .prepare(
                "SELECT r.id, r.book_id, r.user_id, r.rating, r.text, r.created_at, u.username
                 FROM reviews r
                 JOIN users u ON u.id = r.user_id
                 WHERE r.book_id = ?1
                 ORDER BY r.created_at DESC, r.rowid DESC",
            )
            .map_err(|e| AppError::Store(format!("Failed to prepare query: {}", e)))?;

        let reviews = stmt
            .query_map(params![book_id], |row| {
                Ok(ReviewWithAuthor {
                    review: StoredReview {
                        id: row.get(0)?,
                        book_id: row.get(1)?,
                        user_id: row.get(2)?,
                        rating: row.get(3)?,
                        text: row.get(4)?,
                        created_at: row.get(5)?,
                    },
                    username: row.get(6)?,
                })
            })
            .map_err(|e| AppError::Store(format!("Failed to get reviews: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Store(format!("Failed to collect reviews: {}", e)))?;

        Ok(reviews)
    }

    /// Total number of stored reviews.
    #[cfg(test)]
    pub fn count_reviews(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))
            .map_err(|e| AppError::Store(format!("Failed to count reviews: {}", e)))
    }
}
