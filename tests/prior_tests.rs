//! Priors and the sampler-facing model.

use anno_prior::prior::{log_normalize, occurrence_pairs, EmpiricalPrior};
use anno_prior::{
    Document, EntityIndex, EntityPriorModel, Error, LabelIndex, PriorConfig, SequencePrior,
    UniformPrior,
};
use std::io::Write;

fn config() -> PriorConfig {
    PriorConfig::new()
        .with_labels(["O", "PER", "ORG"])
        .with_same_type(0.0, -1.0)
        .with_different_type(-2.0, -1.5)
        .with_unlabeled(-1.0)
}

fn model(doc: &Document) -> EntityPriorModel<'_, EmpiricalPrior> {
    let config = config();
    let prior = EmpiricalPrior::from_config(&config).unwrap();
    EntityPriorModel::new(doc, config.label_index().unwrap(), "O", prior).unwrap()
}

#[test]
fn scores_of_restores_index() {
    let doc = Document::from_whitespace("Acme Corp sued Acme Corp in Acme");
    let mut m = model(&doc);
    m.set_initial_sequence(vec![2, 2, 0, 1, 0, 0, 2]).unwrap();
    let before = m.index().clone();

    for position in 0..doc.len() {
        let scores = m.scores_of(position).unwrap();
        assert_eq!(scores.len(), 3);
        assert_eq!(m.index(), &before, "probing {} changed the index", position);
    }
    m.index().check_invariants().unwrap();
}

#[test]
fn score_of_matches_current_score() {
    let doc = Document::from_whitespace("Acme Corp sued Acme Corp");
    let mut m = model(&doc);
    m.set_initial_sequence(vec![2, 2, 0, 1, 1]).unwrap();
    let current = m.score();
    assert_eq!(current, -4.0);
    for position in 0..doc.len() {
        assert_eq!(m.score_of(position).unwrap(), current);
    }
}

#[test]
fn conditional_distribution_prefers_consistency() {
    let doc = Document::from_whitespace("Acme hired Acme");
    let mut m = model(&doc);
    m.set_initial_sequence(vec![2, 0, 0]).unwrap();

    let dist = m.conditional_distribution(2).unwrap();
    assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!(dist[2] > dist[0]);
    assert!(dist[0] > dist[1]);
}

#[test]
fn greedy_sweeps_never_lower_the_score() {
    let doc = Document::from_whitespace("Acme Corp sued Acme Corp while acme watched Corp");
    let mut m = model(&doc);
    m.set_initial_sequence(vec![2, 2, 0, 1, 0, 0, 1, 0, 2]).unwrap();

    let mut score = m.score();
    for _ in 0..3 {
        for position in 0..m.length() {
            let scores = m.scores_of(position).unwrap();
            let best = (0..scores.len())
                .max_by(|&a, &b| scores[a].total_cmp(&scores[b]))
                .unwrap();
            m.relabel(position, best).unwrap();
            let next = m.score();
            assert!(next >= score - 1e-12, "{} dropped to {}", score, next);
            score = next;
        }
    }
    m.index().check_invariants().unwrap();
    let rebuilt = EntityIndex::new(&doc, m.index().labels().to_vec(), 0).unwrap();
    assert_eq!(m.index(), &rebuilt);
}

#[test]
fn update_sequence_element_validates_label() {
    let doc = Document::from_whitespace("a b c");
    let mut m = model(&doc);
    let mut sequence = vec![0, 0, 0];

    sequence[1] = 1;
    m.update_sequence_element(&sequence, 1, 0).unwrap();
    assert_eq!(m.index().entity_at(1).unwrap().label(), 1);

    sequence[2] = 7;
    let err = m.update_sequence_element(&sequence, 2, 0).unwrap_err();
    assert!(matches!(err, Error::UnknownLabel(_)));
    assert_eq!(m.index().labels(), &[0, 1, 0]);
}

#[test]
fn display_uses_label_names() {
    let doc = Document::from_whitespace("Acme hired Jo");
    let mut m = model(&doc);
    m.set_initial_sequence(vec![2, 0, 1]).unwrap();
    let text = m.to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "1\thired\tO");
    assert!(lines[2].starts_with("2\tJo\tPER\t\"Jo\" start: 2 type: PER"));

    assert_eq!(m.index().window(2, 1, m.label_index()).lines().count(), 2);
    assert_eq!(m.index().window(1, 1, m.label_index()).lines().count(), 3);
}

#[test]
fn boxed_priors_are_interchangeable() {
    let doc = Document::from_whitespace("Jo met Jo");
    let index = EntityIndex::new(&doc, vec![1, 0, 2], 0).unwrap();
    let priors: Vec<Box<dyn SequencePrior>> = vec![
        Box::new(UniformPrior),
        Box::new(EmpiricalPrior::from_config(&config()).unwrap()),
    ];
    let scores: Vec<f64> = priors.iter().map(|p| p.score(&index)).collect();
    assert_eq!(scores, vec![0.0, -4.0]);
    assert_eq!(occurrence_pairs(&index).count(), 2);
}

#[test]
fn config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "labels": ["O", "PER", "ORG"],
            "background": "O",
            "weights": [{{"label": "PER", "other": "ORG", "exact": true, "weight": -5.0}}],
            "unlabeled": -0.25
        }}"#
    )
    .unwrap();

    let config = PriorConfig::from_path(file.path()).unwrap();
    let prior = EmpiricalPrior::from_config(&config).unwrap();
    assert_eq!(prior.weight(1, 2, true), -5.0);
    assert_eq!(prior.unlabeled_weight(), -0.25);
    assert_eq!(prior.labels(), &LabelIndex::new(["O", "PER", "ORG"]).unwrap());
}

#[test]
fn config_errors() {
    assert!(matches!(
        PriorConfig::from_path("/nonexistent/prior.json"),
        Err(Error::Io(_))
    ));
    assert!(matches!(
        PriorConfig::from_json_str("[1, 2"),
        Err(Error::Json(_))
    ));
    assert!(matches!(
        PriorConfig::from_json_str(r#"{"background": "NONE"}"#),
        Err(Error::Config(_))
    ));
}

#[test]
fn log_normalize_is_shift_invariant() {
    let mut a = vec![1.0, 2.0, 3.0];
    let mut b = vec![101.0, 102.0, 103.0];
    log_normalize(&mut a);
    log_normalize(&mut b);
    for (x, y) in a.iter().zip(&b) {
        assert!((x - y).abs() < 1e-9);
    }
}

#[test]
fn model_takes_background_from_config() {
    let config = PriorConfig::new()
        .with_labels(["O", "PER", "MISC"])
        .with_background("MISC");
    let prior = EmpiricalPrior::from_config(&config).unwrap();
    let doc = Document::from_whitespace("Jo met Jo");

    let mut m = EntityPriorModel::from_config(&doc, &config, prior).unwrap();
    assert_eq!(m.index().background(), 2);
    assert_eq!(m.index().labels(), &[2, 2, 2]);
    assert_eq!(m.index().entity_count(), 0);

    m.set_initial_sequence(vec![1, 2, 0]).unwrap();
    assert!(m.index().entity_at(1).is_none());
    assert_eq!(m.index().entity_at(2).unwrap().label(), 0);
    m.index().check_invariants().unwrap();

    let invalid = config.clone().with_background("NONE");
    let prior = EmpiricalPrior::from_config(&PriorConfig::new()).unwrap();
    assert!(matches!(
        EntityPriorModel::from_config(&doc, &invalid, prior),
        Err(Error::Config(_))
    ));
}
