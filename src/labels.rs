//! Label inventories.
//!
//! Samplers work on small integer label codes; [`LabelIndex`] maps those codes
//! to and from label names such as `"PER"` or `"O"`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A label code.
pub type Label = usize;

/// Bidirectional map between label names and dense label codes.
///
/// Codes are assigned in insertion order starting at 0.
///
/// # Example
///
/// ```rust
/// use anno_prior::LabelIndex;
///
/// let labels = LabelIndex::new(["O", "PER", "ORG"]).unwrap();
/// assert_eq!(labels.index_of("PER"), Some(1));
/// assert_eq!(labels.get(2), Some("ORG"));
/// assert_eq!(labels.encode(&["PER", "O"]).unwrap(), vec![1, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelIndex {
    names: Vec<String>,
    #[serde(skip)]
    codes: HashMap<String, Label>,
}

impl LabelIndex {
    /// Build an index from label names, rejecting duplicates.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self {
            names: Vec::new(),
            codes: HashMap::new(),
        };
        for name in names {
            let name = name.into();
            if index.codes.contains_key(&name) {
                return Err(Error::invalid_input(format!("Duplicate label: {}", name)));
            }
            index.codes.insert(name.clone(), index.names.len());
            index.names.push(name);
        }
        Ok(index)
    }

    /// Code for `name`, if present.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<Label> {
        self.codes.get(name).copied()
    }

    /// Code for `name`, or [`Error::UnknownLabel`].
    pub fn require(&self, name: &str) -> Result<Label> {
        self.index_of(name).ok_or_else(|| Error::unknown_label(name))
    }

    /// Name of `label`, if it is a valid code.
    #[must_use]
    pub fn get(&self, label: Label) -> Option<&str> {
        self.names.get(label).map(String::as_str)
    }

    /// Number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if the inventory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True if `label` is a valid code.
    #[must_use]
    pub fn contains(&self, label: Label) -> bool {
        label < self.names.len()
    }

    /// Label names in code order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Encode a sequence of label names.
    pub fn encode<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Label>> {
        names.iter().map(|name| self.require(name.as_ref())).collect()
    }

    /// Decode a sequence of label codes.
    pub fn decode(&self, labels: &[Label]) -> Result<Vec<&str>> {
        labels
            .iter()
            .map(|&label| {
                self.get(label)
                    .ok_or_else(|| Error::unknown_label(label.to_string()))
            })
            .collect()
    }

    /// Name of `label`, or a placeholder for codes outside the inventory.
    pub(crate) fn display_name(&self, label: Label) -> String {
        self.get(label)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", label))
    }
}

impl TryFrom<Vec<String>> for LabelIndex {
    type Error = Error;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::new(names)
    }
}

impl From<LabelIndex> for Vec<String> {
    fn from(index: LabelIndex) -> Self {
        index.names
    }
}

impl fmt::Display for LabelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_rejected() {
        let err = LabelIndex::new(["O", "PER", "O"]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_encode_unknown_label() {
        let labels = LabelIndex::new(["O", "PER"]).unwrap();
        let err = labels.encode(&["PER", "LOC"]).unwrap_err();
        assert!(matches!(err, Error::UnknownLabel(ref l) if l == "LOC"));
    }

    #[test]
    fn test_decode_roundtrip() {
        let labels = LabelIndex::new(["O", "PER", "ORG"]).unwrap();
        assert_eq!(labels.decode(&[2, 0, 1]).unwrap(), vec!["ORG", "O", "PER"]);
        assert!(labels.decode(&[3]).is_err());
    }

    #[test]
    fn test_serde_rebuilds_lookup() {
        let labels = LabelIndex::new(["O", "LOC"]).unwrap();
        let json = serde_json::to_string(&labels).unwrap();
        let back: LabelIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back.index_of("LOC"), Some(1));

        let dup: std::result::Result<LabelIndex, _> = serde_json::from_str(r#"["O","O"]"#);
        assert!(dup.is_err());
    }
}
