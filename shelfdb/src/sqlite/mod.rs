use crate::book::{Book, BookId};
use crate::error::StoreError;
use crate::store::BookStore;
use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// SQLite-backed [`BookStore`]. ISBN uniqueness is enforced by a `UNIQUE`
/// index, so a write that loses a race still fails with
/// [`StoreError::DuplicateIsbn`].
///
/// Every call runs on the blocking pool; the connection is shared behind a
/// mutex.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        initialize_tables(&conn)?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Other("SQLite connection lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn initialize_tables(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            isbn TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_books_isbn ON books(isbn);
        ",
    )?;
    Ok(())
}

fn row_to_book(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        isbn: row.get(3)?,
    })
}

/// Translate a unique-index violation into [`StoreError::DuplicateIsbn`].
fn write_error(err: rusqlite::Error, isbn: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::DuplicateIsbn {
                isbn: isbn.to_string(),
            }
        }
        _ => StoreError::Sqlite(err),
    }
}

#[async_trait]
impl BookStore for SqliteStore {
    async fn create(&self, book: Book) -> Result<Book, StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO books (title, author, isbn) VALUES (?1, ?2, ?3)",
                params![book.title, book.author, book.isbn],
            )
            .map_err(|e| write_error(e, &book.isbn))?;
            let id = conn.last_insert_rowid();
            Ok(book.with_id(id))
        })
        .await
    }

    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        self.with_conn(move |conn| {
            let book = conn
                .query_row(
                    "SELECT id, title, author, isbn FROM books WHERE id = ?1",
                    params![id],
                    row_to_book,
                )
                .optional()?;
            Ok(book)
        })
        .await
    }

    async fn get_all(&self) -> Result<Vec<Book>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, title, author, isbn FROM books ORDER BY id")?;
            let rows = stmt.query_map([], row_to_book)?;

            let mut books = Vec::new();
            for row in rows {
                books.push(row?);
            }
            Ok(books)
        })
        .await
    }

    async fn update(&self, book: &Book) -> Result<bool, StoreError> {
        let book = book.clone();
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE books SET title = ?1, author = ?2, isbn = ?3 WHERE id = ?4",
                    params![book.title, book.author, book.isbn, book.id],
                )
                .map_err(|e| write_error(e, &book.isbn))?;
            Ok(changed > 0)
        })
        .await
    }

    async fn remove(&self, id: BookId) -> Result<bool, StoreError> {
        self.with_conn(move |conn| {
            let changed = conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn isbn_exists(
        &self,
        isbn: &str,
        exclude_id: Option<BookId>,
    ) -> Result<bool, StoreError> {
        let isbn = isbn.to_string();
        self.with_conn(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM books WHERE isbn = ?1 AND (?2 IS NULL OR id != ?2) LIMIT 1",
                    params![isbn, exclude_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }
}
