use crate::book::{Book, BookId};
use crate::error::{Result, ShelfError, StoreError};
use crate::isbn;
use crate::store::BookStore;
use crate::validation::{BookValidator, Validator};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Validation message for an ISBN already held by another book.
pub const DUPLICATE_ISBN: &str = "Identifier already in use by another record";

/// The catalog's single point of invariant enforcement.
///
/// Every write runs validate, then the uniqueness check, then the store
/// mutation, in that order. A book that fails any step is never written.
/// Writers for the same canonical ISBN are serialized, and a duplicate
/// reported by the store itself is treated the same as one found by the
/// pre-check.
pub struct BookService<S, V = BookValidator> {
    store: S,
    validator: V,
    isbn_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: BookStore> BookService<S> {
    /// Service with the default title/author/ISBN validator.
    pub fn new(store: S) -> Self {
        Self::with_validator(store, BookValidator::new())
    }
}

impl<S: BookStore, V: Validator<Book>> BookService<S, V> {
    pub fn with_validator(store: S, validator: V) -> Self {
        BookService {
            store,
            validator,
            isbn_locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Validate and store a new book. Returns the store-assigned id.
    pub async fn add(&self, book: Book) -> Result<BookId> {
        if book.is_stored() {
            return Err(ShelfError::InvalidArgument(format!(
                "new book must not carry an id (got {})",
                book.id
            )));
        }

        let book = self.prepare(book)?;
        log::debug!("Adding book with ISBN {}", book.isbn);

        let _lock = self.lock_isbn(&book.isbn).await;

        if self.store.isbn_exists(&book.isbn, None).await? {
            log::warn!("Rejected add: ISBN {} already stored", book.isbn);
            return Err(ShelfError::Validation(DUPLICATE_ISBN.into()));
        }

        let created = self.store.create(book).await.map_err(write_error)?;
        log::info!("Added book {} (ISBN {})", created.id, created.isbn);
        Ok(created.id)
    }

    pub async fn get_by_id(&self, id: BookId) -> Result<Option<Book>> {
        Ok(self.store.get_by_id(id).await?)
    }

    /// Snapshot of every stored book in store order.
    pub async fn get_all(&self) -> Result<Vec<Book>> {
        Ok(self.store.get_all().await?)
    }

    /// Replace every field of an existing book. The book may keep its own ISBN.
    pub async fn update(&self, book: Book) -> Result<bool> {
        if !book.is_stored() {
            return Err(ShelfError::InvalidArgument(
                "book id is required for update".into(),
            ));
        }

        let id = book.id;
        log::debug!("Updating book {id}");

        if self.store.get_by_id(id).await?.is_none() {
            return Err(ShelfError::NotFound { id });
        }

        let book = self.prepare(book)?;

        let _lock = self.lock_isbn(&book.isbn).await;

        if self.store.isbn_exists(&book.isbn, Some(id)).await? {
            log::warn!("Rejected update of book {id}: ISBN {} held by another book", book.isbn);
            return Err(ShelfError::Validation(DUPLICATE_ISBN.into()));
        }

        if !self.store.update(&book).await.map_err(write_error)? {
            // removed between the existence check and the write
            return Err(ShelfError::NotFound { id });
        }

        log::info!("Updated book {id} (ISBN {})", book.isbn);
        Ok(true)
    }

    /// Remove a book. `Ok(false)` means there was nothing to delete.
    pub async fn delete(&self, id: BookId) -> Result<bool> {
        log::debug!("Deleting book {id}");

        if self.store.get_by_id(id).await?.is_none() {
            return Ok(false);
        }

        let removed = self.store.remove(id).await?;
        if removed {
            log::info!("Deleted book {id}");
        }
        Ok(removed)
    }

    /// Run field validation and canonicalize the ISBN for storage.
    fn prepare(&self, mut book: Book) -> Result<Book> {
        let result = self.validator.validate(&book);
        if let Some(message) = result.message() {
            log::warn!("Rejected book: {message}");
            return Err(ShelfError::Validation(message));
        }

        book.isbn = isbn::canonical_key(&book.isbn);
        Ok(book)
    }

    async fn lock_isbn(&self, isbn: &str) -> IsbnLock<'_> {
        let mutex = self
            .isbn_locks
            .entry(isbn.to_string())
            .or_default()
            .clone();
        let guard = mutex.lock_owned().await;

        IsbnLock {
            locks: &self.isbn_locks,
            key: isbn.to_string(),
            guard: Some(guard),
        }
    }
}

/// Held for the check-then-write window of one ISBN.
struct IsbnLock<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for IsbnLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // The map holds the last reference unless another writer is queued.
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

fn write_error(err: StoreError) -> ShelfError {
    match err {
        StoreError::DuplicateIsbn { isbn } => {
            log::warn!("Store rejected duplicate ISBN {isbn}");
            ShelfError::Validation(DUPLICATE_ISBN.into())
        }
        other => ShelfError::Store(other),
    }
}
