use engine::boolean::boolean_search;
use engine::corpus::{Corpus, RawDocument};
use engine::index::{build_index, SearchIndex};
use engine::lemma::EnglishLemmatizer;
use engine::stats::document_frequency;
use engine::vector::vector_search;
use engine::QueryError;
use std::collections::BTreeSet;

fn ingest(texts: &[&str]) -> (Corpus, EnglishLemmatizer) {
    let lem = EnglishLemmatizer::new();
    let records = texts
        .iter()
        .enumerate()
        .map(|(i, text)| RawDocument {
            source: format!("https://example.com/page/{}", i + 1),
            text: text.to_string(),
        })
        .collect();
    (Corpus::ingest(records, &lem), lem)
}

fn ids(set: &BTreeSet<u32>) -> Vec<u32> {
    set.iter().copied().collect()
}

/// Two documents, lemmas [cat, dog] and [dog, bird].
fn scenario_corpus() -> (SearchIndex, EnglishLemmatizer) {
    let (corpus, lem) = ingest(&["cat dog", "dog bird"]);
    assert_eq!(corpus.docs[0].lemmas, vec!["cat", "dog"]);
    assert_eq!(corpus.docs[1].lemmas, vec!["dog", "bird"]);
    (build_index(&corpus), lem)
}

#[test]
fn scenario_a_document_frequencies() {
    let (corpus, _) = ingest(&["cat dog", "dog bird"]);
    let df = document_frequency(corpus.docs.iter().map(|d| &d.lemmas));
    assert_eq!(df.get("cat"), Some(&1));
    assert_eq!(df.get("dog"), Some(&2));
    assert_eq!(df.get("bird"), Some(&1));
}

#[test]
fn scenario_a_boolean_queries() {
    let (index, lem) = scenario_corpus();
    assert_eq!(ids(&boolean_search(&index, &lem, "cat AND dog").unwrap()), vec![1]);
    assert_eq!(ids(&boolean_search(&index, &lem, "dog OR bird").unwrap()), vec![1, 2]);
    assert_eq!(ids(&boolean_search(&index, &lem, "NOT cat").unwrap()), vec![2]);
}

#[test]
fn scenario_b_deterministic_tie_break() {
    // In the two-document scenario corpus "dog" occurs everywhere, so its
    // weight is zero and no positive score exists. Exact ties are exercised
    // on two documents symmetric around the query lemma instead.
    let (corpus, lem) = ingest(&["cat dog", "cat bird", "fish"]);
    let index = build_index(&corpus);
    let hits = vector_search(&index, &lem, "cat");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].score, hits[1].score);
    assert_eq!((hits[0].doc_id, hits[1].doc_id), (1, 2));
}

#[test]
fn scenario_c_degenerate_queries() {
    let (index, lem) = scenario_corpus();
    // Closed-class-only text normalizes to nothing.
    assert!(vector_search(&index, &lem, "of the and to").is_empty());
    // A boolean expression with no recognized literals evaluates to the
    // empty set rather than an error.
    assert!(boolean_search(&index, &lem, "42 %%").unwrap().is_empty());
}

#[test]
fn unknown_literal_is_an_empty_posting_set() {
    let (index, lem) = scenario_corpus();
    assert!(boolean_search(&index, &lem, "zebra").unwrap().is_empty());
    assert_eq!(ids(&boolean_search(&index, &lem, "NOT zebra").unwrap()), vec![1, 2]);
}

#[test]
fn double_negation_restores_the_posting_set() {
    let (index, lem) = scenario_corpus();
    let original = boolean_search(&index, &lem, "cat").unwrap();
    let doubled = boolean_search(&index, &lem, "NOT (NOT cat)").unwrap();
    assert_eq!(original, doubled);
}

#[test]
fn and_distributes_over_or() {
    let (corpus, lem) = ingest(&[
        "cat dog",
        "dog bird",
        "cat bird fish",
        "fish",
        "cat dog bird",
    ]);
    let index = build_index(&corpus);
    let lhs = boolean_search(&index, &lem, "cat AND (dog OR bird)").unwrap();
    let rhs = boolean_search(&index, &lem, "(cat AND dog) OR (cat AND bird)").unwrap();
    assert_eq!(lhs, rhs);
}

#[test]
fn malformed_queries_report_invalid_syntax() {
    let (index, lem) = scenario_corpus();
    assert_eq!(boolean_search(&index, &lem, "AND cat"), Err(QueryError::InvalidSyntax));
    assert_eq!(boolean_search(&index, &lem, "cat AND"), Err(QueryError::InvalidSyntax));
    assert_eq!(boolean_search(&index, &lem, "cat OR AND dog"), Err(QueryError::InvalidSyntax));
    assert_eq!(boolean_search(&index, &lem, "NOT"), Err(QueryError::InvalidSyntax));
}

#[test]
fn unmatched_closing_parenthesis_is_tolerated() {
    let (index, lem) = scenario_corpus();
    assert_eq!(ids(&boolean_search(&index, &lem, "cat AND dog)").unwrap()), vec![1]);
    assert_eq!(ids(&boolean_search(&index, &lem, ")cat").unwrap()), vec![1]);
}

#[test]
fn inflected_query_matches_lemma_postings() {
    let (corpus, lem) = ingest(&["running dogs", "sleeping cats"]);
    let index = build_index(&corpus);
    // Both the indexed "dogs" and the query "dog" reduce to the same lemma.
    assert_eq!(ids(&boolean_search(&index, &lem, "dog").unwrap()), vec![1]);
    let hits = vector_search(&index, &lem, "runs");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].doc_id, 1);
}

#[test]
fn vector_results_are_sorted_descending() {
    let (corpus, lem) = ingest(&[
        "cat cat cat dog",
        "cat dog dog bird",
        "bird fish",
        "cat",
    ]);
    let index = build_index(&corpus);
    let hits = vector_search(&index, &lem, "cat");
    assert!(!hits.is_empty());
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for hit in &hits {
        assert!(hit.score > 0.0);
    }
}
