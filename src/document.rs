//! Tokenized documents.
//!
//! A [`Document`] is the fixed token sequence an entity index is built over.
//! It is never mutated after construction, so any number of indexes may borrow
//! the same document at once.

use crate::occurrence::OccurrenceIndex;
use serde::{Deserialize, Serialize};

/// An immutable, ordered sequence of token texts.
///
/// # Example
///
/// ```rust
/// use anno_prior::Document;
///
/// let doc = Document::from_whitespace("John Smith met john smith");
/// assert_eq!(doc.len(), 5);
/// assert_eq!(doc.token(1), Some("Smith"));
/// assert_eq!(doc.positions_of("JOHN"), &[0, 3]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Document {
    tokens: Vec<String>,
    occurrences: OccurrenceIndex,
}

impl Document {
    /// Create a document from token texts.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let occurrences = OccurrenceIndex::new(&tokens);
        Self {
            tokens,
            occurrences,
        }
    }

    /// Create a document by splitting `text` on whitespace.
    pub fn from_whitespace(text: &str) -> Self {
        Self::new(text.split_whitespace())
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True if the document has no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token text at `position`.
    #[must_use]
    pub fn token(&self, position: usize) -> Option<&str> {
        self.tokens.get(position).map(String::as_str)
    }

    /// All token texts.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Positions at which `word` occurs, compared case-insensitively.
    #[must_use]
    pub fn positions_of(&self, word: &str) -> &[usize] {
        self.occurrences.positions_of(word)
    }

    /// The case-insensitive recurrence index over this document.
    #[must_use]
    pub fn occurrence_index(&self) -> &OccurrenceIndex {
        &self.occurrences
    }
}

impl From<Vec<String>> for Document {
    fn from(tokens: Vec<String>) -> Self {
        Self::new(tokens)
    }
}

impl From<Document> for Vec<String> {
    fn from(doc: Document) -> Self {
        doc.tokens
    }
}

impl<S: Into<String>> FromIterator<S> for Document {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
