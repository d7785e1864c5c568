pub mod book;
pub mod isbn;
pub mod validation;
pub mod store;
pub mod sqlite;
pub mod service;
pub mod error;

pub use book::{Book, BookId};
pub use error::{Result, ShelfError, StoreError};
pub use isbn::{Isbn, IsbnError, IsbnKind, IsbnValidator};
pub use service::BookService;
pub use sqlite::SqliteStore;
pub use store::{BookStore, MemoryStore};
pub use validation::{BookValidator, ValidationResult, Validator};
