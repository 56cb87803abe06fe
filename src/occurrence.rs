//! Case-insensitive recurrence search over a fixed token sequence.
//!
//! Every token is case-folded and interned to a dense symbol id once, when the
//! document is loaded. Each symbol keeps a posting list of the positions where
//! it occurs, so finding the other places a word sequence begins only touches
//! the positions sharing its first word instead of the whole document.
//!
//! The lookup is a black-box equivalent of the naive scan: a candidate matches
//! when every token of the sequence, compared case-insensitively, recurs
//! contiguously from that candidate, and candidates running past the end of the
//! document never match.

use std::collections::HashMap;

/// Dense id of a case-folded token.
pub type Symbol = u32;

/// Inverted index from case-folded token to the positions it occurs at.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceIndex {
    /// Folded symbol per position.
    symbols: Vec<Symbol>,
    /// Positions (ascending) per symbol.
    postings: Vec<Vec<usize>>,
    /// Folded text to symbol.
    lookup: HashMap<String, Symbol>,
}

/// Case-fold a token the way occurrences are compared.
#[must_use]
pub fn fold(token: &str) -> String {
    token.to_lowercase()
}

impl OccurrenceIndex {
    /// Build the index over `tokens`.
    pub fn new<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut index = Self {
            symbols: Vec::with_capacity(tokens.len()),
            postings: Vec::new(),
            lookup: HashMap::new(),
        };
        for (position, token) in tokens.iter().enumerate() {
            let folded = fold(token.as_ref());
            let next = index.postings.len() as Symbol;
            let symbol = *index.lookup.entry(folded).or_insert(next);
            if symbol == next {
                index.postings.push(Vec::new());
            }
            index.postings[symbol as usize].push(position);
            index.symbols.push(symbol);
        }
        index
    }

    /// Number of indexed positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True if no positions are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Number of distinct folded tokens.
    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.postings.len()
    }

    /// Folded symbol at `position`.
    #[must_use]
    pub fn symbol(&self, position: usize) -> Option<Symbol> {
        self.symbols.get(position).copied()
    }

    /// Positions at which `word` occurs, compared case-insensitively.
    #[must_use]
    pub fn positions_of(&self, word: &str) -> &[usize] {
        self.lookup
            .get(&fold(word))
            .map(|&symbol| self.postings[symbol as usize].as_slice())
            .unwrap_or(&[])
    }

    /// True iff the `len` tokens starting at `start` recur starting at `candidate`.
    ///
    /// Out-of-range spans never match.
    #[must_use]
    pub fn matches_at(&self, start: usize, len: usize, candidate: usize) -> bool {
        let n = self.symbols.len();
        if len == 0 || start.saturating_add(len) > n || candidate.saturating_add(len) > n {
            return false;
        }
        self.symbols[start..start + len] == self.symbols[candidate..candidate + len]
    }

    /// Every position other than `start` at which the span `start..start + len` recurs.
    ///
    /// Returned in ascending order.
    #[must_use]
    pub fn occurrences(&self, start: usize, len: usize) -> Vec<usize> {
        let Some(first) = self.symbol(start) else {
            return Vec::new();
        };
        self.postings[first as usize]
            .iter()
            .copied()
            .filter(|&candidate| candidate != start && self.matches_at(start, len, candidate))
            .collect()
    }
}
