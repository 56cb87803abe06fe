//! # anno-prior
//!
//! Entity-consistency priors for sampling-based sequence labeling.
//!
//! - **Entity cache**: [`EntityIndex`] keeps every labeled entity of a document,
//!   and the other places its words recur, up to date under single-position
//!   label edits without rescanning the document.
//! - **Priors**: [`SequencePrior`] scores a labeling from that cache;
//!   [`EntityPriorModel`] exposes it to a sampler as per-position label scores.
//! - **Configuration**: [`PriorConfig`] holds label inventories and weight
//!   tables, loadable from JSON.
//!
//! # Example
//!
//! ```rust
//! use anno_prior::{Document, EntityIndex, LabelIndex};
//!
//! let labels = LabelIndex::new(["O", "PER", "ORG"]).unwrap();
//! let doc = Document::from_whitespace("John Smith works at Acme Corp . John Smith is here");
//! let tags = ["PER", "PER", "O", "O", "ORG", "ORG", "O", "PER", "PER", "O", "O"];
//! let background = labels.require("O").unwrap();
//!
//! let mut index = EntityIndex::new(&doc, labels.encode(&tags).unwrap(), background).unwrap();
//! let john = index.entity_at(0).unwrap();
//! assert_eq!(john.other_occurrences(), &[7]);
//!
//! // "is" directly follows the second "John Smith", which grows to cover it.
//! index.relabel(9, labels.require("PER").unwrap()).unwrap();
//! assert_eq!(index.entity_at(9).unwrap().words(), ["John", "Smith", "is"]);
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod labels;
pub mod occurrence;
pub mod prior;

pub use cache::{EditKind, Entity, EntityId, EntityIndex, Side};
pub use config::{PriorConfig, WeightEntry};
pub use document::Document;
pub use error::{Error, Result};
pub use labels::{Label, LabelIndex};
pub use prior::{EntityPriorModel, SequencePrior, UniformPrior};
