//! bookverse: a book catalog and review server.
//!
//! Users register, submit books and review them. The listing endpoint
//! filters by genre and author, derives each book's average rating from its
//! reviews on every read, sorts by date or rating, and paginates.
//!
//! # Features
//!
//! - Exact-match genre/author filters with unpaginated totals
//! - Average rating rounded to one decimal, `null` for unrated books
//! - Rating sort with unrated books last and deterministic tie-breaks
//! - Bearer-token sessions with Argon2 password hashes
//! - Embedded SQLite storage

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Authentication and user management.
pub mod auth;
/// Books, ratings and reviews.
pub mod catalog;
/// Configuration and CLI.
pub mod config;
/// Database operations.
pub mod db;
/// Error types.
pub mod error;
/// HTTP server.
pub mod server;
/// Request field validation.
pub mod validation;


pub use config::{Cli, Command, Config};
pub use db::Database;
pub use error::{AppError, Result};
pub use server::AppState;
