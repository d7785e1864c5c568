// Book record - the single catalog entity

use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a book. `0` means "not yet stored".
pub type BookId = i64;

/// A catalog record. `id` is assigned by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

impl Book {
    /// Build an unsaved book (id `0`).
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Self {
        Book {
            id: 0,
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
        }
    }

    /// Same fields, different id.
    pub fn with_id(mut self, id: BookId) -> Self {
        self.id = id;
        self
    }

    /// Whether the store has assigned an id yet.
    pub fn is_stored(&self) -> bool {
        self.id != 0
    }
}
