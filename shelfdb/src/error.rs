use crate::book::BookId;
use thiserror::Error;

/// Errors surfaced by [`crate::BookService`].
#[derive(Error, Debug)]
pub enum ShelfError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Book not found: {id}")]
    NotFound { id: BookId },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised by [`crate::store::BookStore`] implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("ISBN already stored: {isbn}")]
    DuplicateIsbn { isbn: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store task failed: {0}")]
    Task(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ShelfError>;
