use crate::book::{Book, BookId};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Persistence contract behind [`crate::BookService`].
///
/// Stores own id assignment and physical storage. They compare ISBNs by plain
/// string equality; the service always hands them the canonical form.
/// Writes that would duplicate an ISBN held by another book must fail with
/// [`StoreError::DuplicateIsbn`].
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persist a new book and return it with its assigned id.
    async fn create(&self, book: Book) -> Result<Book, StoreError>;

    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>, StoreError>;

    /// All books, oldest first.
    async fn get_all(&self) -> Result<Vec<Book>, StoreError>;

    /// Overwrite the book with `book.id`. Returns `false` if no such book.
    async fn update(&self, book: &Book) -> Result<bool, StoreError>;

    /// Returns `false` if no such book.
    async fn remove(&self, id: BookId) -> Result<bool, StoreError>;

    /// Whether any book other than `exclude_id` holds `isbn`.
    async fn isbn_exists(&self, isbn: &str, exclude_id: Option<BookId>)
        -> Result<bool, StoreError>;
}

#[async_trait]
impl<T: BookStore + ?Sized> BookStore for Arc<T> {
    async fn create(&self, book: Book) -> Result<Book, StoreError> {
        (**self).create(book).await
    }

    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        (**self).get_by_id(id).await
    }

    async fn get_all(&self) -> Result<Vec<Book>, StoreError> {
        (**self).get_all().await
    }

    async fn update(&self, book: &Book) -> Result<bool, StoreError> {
        (**self).update(book).await
    }

    async fn remove(&self, id: BookId) -> Result<bool, StoreError> {
        (**self).remove(id).await
    }

    async fn isbn_exists(
        &self,
        isbn: &str,
        exclude_id: Option<BookId>,
    ) -> Result<bool, StoreError> {
        (**self).isbn_exists(isbn, exclude_id).await
    }
}

#[derive(Debug)]
struct MemoryState {
    next_id: BookId,
    books: BTreeMap<BookId, Book>,
}

impl MemoryState {
    fn holder_of(&self, isbn: &str, exclude_id: Option<BookId>) -> Option<BookId> {
        self.books
            .values()
            .find(|b| b.isbn == isbn && Some(b.id) != exclude_id)
            .map(|b| b.id)
    }
}

/// Deterministic in-memory store. Ids start at 1 and increase, so listing
/// order is insertion order.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            state: Mutex::new(MemoryState {
                next_id: 1,
                books: BTreeMap::new(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.books.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn create(&self, mut book: Book) -> Result<Book, StoreError> {
        let mut state = self.state.lock().await;

        if state.holder_of(&book.isbn, None).is_some() {
            return Err(StoreError::DuplicateIsbn { isbn: book.isbn });
        }

        book.id = state.next_id;
        state.next_id += 1;
        state.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        Ok(self.state.lock().await.books.get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.state.lock().await.books.values().cloned().collect())
    }

    async fn update(&self, book: &Book) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;

        if !state.books.contains_key(&book.id) {
            return Ok(false);
        }
        if state.holder_of(&book.isbn, Some(book.id)).is_some() {
            return Err(StoreError::DuplicateIsbn {
                isbn: book.isbn.clone(),
            });
        }

        state.books.insert(book.id, book.clone());
        Ok(true)
    }

    async fn remove(&self, id: BookId) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.books.remove(&id).is_some())
    }

    async fn isbn_exists(
        &self,
        isbn: &str,
        exclude_id: Option<BookId>,
    ) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.holder_of(isbn, exclude_id).is_some())
    }
}
