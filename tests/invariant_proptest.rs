//! Property-based tests for the entity index.
//!
//! Documents are drawn from a tiny vocabulary with case variants so that
//! recurrences, merges and splits happen constantly.

use anno_prior::prior::EmpiricalPrior;
use anno_prior::{Document, EntityIndex, Label, PriorConfig, SequencePrior};
use proptest::prelude::*;

const BACKGROUND: Label = 0;
const NUM_LABELS: Label = 3;

fn token() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["a", "A", "b", "B", "c"])
}

fn document_and_labels() -> impl Strategy<Value = (Vec<&'static str>, Vec<Label>)> {
    (1usize..30).prop_flat_map(|n| {
        (
            prop::collection::vec(token(), n),
            prop::collection::vec(0..NUM_LABELS, n),
        )
    })
}

fn edits() -> impl Strategy<Value = Vec<(usize, Label)>> {
    prop::collection::vec((any::<usize>(), 0..NUM_LABELS), 0..60)
}

proptest! {
    /// INVARIANT: every structural invariant holds after every edit
    #[test]
    fn invariants_survive_edits((tokens, labels) in document_and_labels(), edits in edits()) {
        let doc = Document::new(tokens);
        let mut index = EntityIndex::new(&doc, labels, BACKGROUND).unwrap();
        prop_assert!(index.check_invariants().is_ok());

        for (position, label) in edits {
            let position = position % doc.len();
            index.relabel(position, label).unwrap();
            let check = index.check_invariants();
            prop_assert!(check.is_ok(), "after relabel({}, {}): {:?}\n{}", position, label, check, index);
        }
    }

    /// INVARIANT: a full rebuild from the final labels equals the incremental index
    #[test]
    fn rebuild_matches_incremental((tokens, labels) in document_and_labels(), edits in edits()) {
        let doc = Document::new(tokens);
        let mut index = EntityIndex::new(&doc, labels, BACKGROUND).unwrap();
        for (position, label) in edits {
            index.relabel(position % doc.len(), label).unwrap();
        }
        let rebuilt = EntityIndex::new(&doc, index.labels().to_vec(), BACKGROUND).unwrap();
        prop_assert_eq!(&index, &rebuilt);
        prop_assert_eq!(index.entity_count(), rebuilt.entity_count());
    }

    /// INVARIANT: other occurrences equal a brute-force case-insensitive scan
    #[test]
    fn occurrences_match_brute_force((tokens, labels) in document_and_labels(), edits in edits()) {
        let folded: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        let doc = Document::new(tokens);
        let mut index = EntityIndex::new(&doc, labels, BACKGROUND).unwrap();
        for (position, label) in edits {
            index.relabel(position % doc.len(), label).unwrap();
        }

        let n = folded.len();
        for entity in index.entities() {
            let words: Vec<String> = entity.words().iter().map(|w| w.to_lowercase()).collect();
            let expected: Vec<usize> = (0..n)
                .filter(|&q| q != entity.start())
                .filter(|&q| q + words.len() <= n && folded[q..q + words.len()] == words[..])
                .collect();
            prop_assert_eq!(entity.other_occurrences(), expected.as_slice());
        }
    }

    /// INVARIANT: an edit followed by its reversal restores the index
    #[test]
    fn edit_then_revert_is_identity(
        (tokens, labels) in document_and_labels(),
        position in any::<usize>(),
        label in 0..NUM_LABELS
    ) {
        let doc = Document::new(tokens);
        let mut index = EntityIndex::new(&doc, labels, BACKGROUND).unwrap();
        let before = index.clone();
        let position = position % doc.len();

        let old = index.relabel(position, label).unwrap();
        index.relabel(position, old).unwrap();
        prop_assert_eq!(&index, &before);
    }

    /// INVARIANT: adjacent positions with equal non-background labels share an entity
    #[test]
    fn adjacent_same_label_share_entity((tokens, labels) in document_and_labels(), edits in edits()) {
        let doc = Document::new(tokens);
        let mut index = EntityIndex::new(&doc, labels, BACKGROUND).unwrap();
        for (position, label) in edits {
            index.relabel(position % doc.len(), label).unwrap();
        }
        let labels = index.labels();
        for i in 0..labels.len() {
            prop_assert_eq!(index.entity_at(i).is_some(), labels[i] != BACKGROUND);
            if i + 1 < labels.len() && labels[i] == labels[i + 1] && labels[i] != BACKGROUND {
                prop_assert_eq!(index.entity_id_at(i), index.entity_id_at(i + 1));
            }
        }
    }

    /// INVARIANT: applying a caller-written sequence agrees with relabel
    #[test]
    fn apply_agrees_with_relabel((tokens, labels) in document_and_labels(), edits in edits()) {
        let doc = Document::new(tokens);
        let mut sequence = labels.clone();
        let mut via_apply = EntityIndex::new(&doc, labels.clone(), BACKGROUND).unwrap();
        let mut via_relabel = EntityIndex::new(&doc, labels, BACKGROUND).unwrap();

        for (position, label) in edits {
            let position = position % doc.len();
            let old = std::mem::replace(&mut sequence[position], label);
            let applied = via_apply.apply(&sequence, position, old).unwrap();
            let before = via_relabel.clone();
            via_relabel.relabel(position, label).unwrap();
            prop_assert_eq!(&via_apply, &via_relabel, "{} diverged from\n{}", applied, before);
        }
    }

    /// INVARIANT: scoring depends only on the labeling, not on edit history
    #[test]
    fn prior_score_is_history_independent((tokens, labels) in document_and_labels(), edits in edits()) {
        let config = PriorConfig::new().with_labels(["O", "PER", "ORG"]);
        let prior = EmpiricalPrior::from_config(&config).unwrap();
        let doc = Document::new(tokens);
        let mut index = EntityIndex::new(&doc, labels, BACKGROUND).unwrap();
        for (position, label) in edits {
            index.relabel(position % doc.len(), label).unwrap();
        }
        let rebuilt = EntityIndex::new(&doc, index.labels().to_vec(), BACKGROUND).unwrap();
        prop_assert_eq!(prior.score(&index), prior.score(&rebuilt));
    }
}
