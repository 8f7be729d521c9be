use crate::corpus::DocId;
use crate::index::SearchIndex;
use crate::lemma::Lemmatizer;
use std::collections::BTreeMap;

/// One ranked result: a document and its cosine similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
}

/// Rank documents by cosine similarity between the query's raw term-frequency
/// vector and the documents' tf-idf vectors.
///
/// Only the documents carry idf weight; the query keeps raw counts. The dot
/// product runs over the query's lemmas alone via the weighted postings, so
/// work is proportional to the matched posting lists. Documents with a
/// non-positive dot product are excluded outright. Sorted by score
/// descending, document id ascending on exact ties.
pub fn vector_search<L: Lemmatizer + ?Sized>(
    index: &SearchIndex,
    lemmatizer: &L,
    query: &str,
) -> Vec<SearchHit> {
    let lemmas = query_lemmas(lemmatizer, query);
    if lemmas.is_empty() {
        return Vec::new();
    }

    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for lemma in lemmas {
        *counts.entry(lemma).or_insert(0) += 1;
    }
    let sum_sq: f64 = counts.values().map(|&c| (c as f64) * (c as f64)).sum();
    let query_norm = if sum_sq > 0.0 { sum_sq.sqrt() } else { 1.0 };

    let mut dots: BTreeMap<DocId, f64> = BTreeMap::new();
    for (lemma, count) in &counts {
        if let Some(by_doc) = index.weighted_postings(lemma) {
            for (&doc_id, &weight) in by_doc {
                *dots.entry(doc_id).or_insert(0.0) += *count as f64 * weight;
            }
        }
    }

    let mut hits: Vec<SearchHit> = dots
        .into_iter()
        .filter(|&(_, dot)| dot > 0.0)
        .map(|(doc_id, dot)| {
            let doc_norm = index.vector(doc_id).map(|v| v.norm).unwrap_or(1.0);
            SearchHit { doc_id, score: dot / (query_norm * doc_norm) }
        })
        .collect();

    hits.sort_unstable_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    hits
}

/// Normalize query text through the full document pipeline and keep the
/// lemma sequence.
pub fn query_lemmas<L: Lemmatizer + ?Sized>(lemmatizer: &L, query: &str) -> Vec<String> {
    lemmatizer
        .normalize(query)
        .into_iter()
        .map(|pair| pair.lemma)
        .collect()
}
