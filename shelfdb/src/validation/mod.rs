use crate::book::Book;
use crate::isbn::IsbnValidator;

/// Result of validating a value: every violated rule, in the order checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Append every diagnostic from `other`, keeping order.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }

    /// All diagnostics joined with `", "`, or `None` when valid.
    pub fn message(&self) -> Option<String> {
        if self.is_ok() {
            None
        } else {
            Some(self.errors.join(", "))
        }
    }
}

/// A validation capability, selected at construction time.
pub trait Validator<T: ?Sized>: Send + Sync {
    fn validate(&self, value: &T) -> ValidationResult;
}

/// Structural checks for a [`Book`] plus the injected ISBN validator.
/// Never short-circuits: all rules run and every violation is reported.
#[derive(Debug, Clone, Default)]
pub struct BookValidator<V = IsbnValidator> {
    isbn: V,
}

impl BookValidator<IsbnValidator> {
    pub fn new() -> Self {
        Self::with_isbn_validator(IsbnValidator)
    }
}

impl<V: Validator<str>> BookValidator<V> {
    pub fn with_isbn_validator(isbn: V) -> Self {
        BookValidator { isbn }
    }
}

impl<V: Validator<str>> Validator<Book> for BookValidator<V> {
    fn validate(&self, book: &Book) -> ValidationResult {
        let mut result = ValidationResult::new();

        if book.title.trim().is_empty() {
            result.push("Title is required");
        }

        if book.author.trim().is_empty() {
            result.push("Author is required");
        }

        result.merge(self.isbn.validate(&book.isbn));
        result
    }
}
