use crate::corpus::{Corpus, DocId};
use crate::stats::document_frequency;
use crate::weights::{compute_weights, WeightVector};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Immutable retrieval index over one corpus snapshot.
///
/// Built once per batch; a rebuild produces a fresh value that callers swap
/// in whole. Both query engines hold read access only.
#[derive(Debug, Default)]
pub struct SearchIndex {
    num_docs: u32,
    sources: BTreeMap<DocId, String>,
    /// lemma -> documents containing it at least once
    postings: BTreeMap<String, BTreeSet<DocId>>,
    /// lemma -> per-document tf-idf weight, identical to the vector entries
    weighted: BTreeMap<String, BTreeMap<DocId, f64>>,
    /// document -> sparse tf-idf vector; empty documents have no entry
    vectors: BTreeMap<DocId, WeightVector>,
}

impl SearchIndex {
    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn source(&self, doc_id: DocId) -> Option<&str> {
        self.sources.get(&doc_id).map(String::as_str)
    }

    pub fn sources(&self) -> &BTreeMap<DocId, String> {
        &self.sources
    }

    pub fn postings(&self, lemma: &str) -> Option<&BTreeSet<DocId>> {
        self.postings.get(lemma)
    }

    pub fn all_postings(&self) -> &BTreeMap<String, BTreeSet<DocId>> {
        &self.postings
    }

    pub fn weighted_postings(&self, lemma: &str) -> Option<&BTreeMap<DocId, f64>> {
        self.weighted.get(lemma)
    }

    pub fn vector(&self, doc_id: DocId) -> Option<&WeightVector> {
        self.vectors.get(&doc_id)
    }

    pub fn vectors(&self) -> &BTreeMap<DocId, WeightVector> {
        &self.vectors
    }

    /// The boolean universe `{1..N}`, the complement base for NOT.
    pub fn all_doc_ids(&self) -> BTreeSet<DocId> {
        (1..=self.num_docs).collect()
    }

    /// Assemble an index from already-loaded parts; used by the persistence
    /// layer. The weighted postings are derived from the vectors so the two
    /// representations cannot drift apart.
    pub fn from_parts(
        sources: BTreeMap<DocId, String>,
        postings: BTreeMap<String, BTreeSet<DocId>>,
        vectors: BTreeMap<DocId, WeightVector>,
    ) -> Self {
        let num_docs = sources.len() as u32;
        let weighted = derive_weighted(&vectors);
        Self { num_docs, sources, postings, weighted, vectors }
    }
}

fn derive_weighted(
    vectors: &BTreeMap<DocId, WeightVector>,
) -> BTreeMap<String, BTreeMap<DocId, f64>> {
    let mut weighted: BTreeMap<String, BTreeMap<DocId, f64>> = BTreeMap::new();
    for (&doc_id, vector) in vectors {
        for (lemma, w) in &vector.weights {
            weighted.entry(lemma.clone()).or_default().insert(doc_id, w.tfidf);
        }
    }
    weighted
}

/// Two-pass batch build: gather document frequencies, then compute weight
/// vectors (in parallel, merged in ascending doc-id order) and fold the
/// postings. Empty documents count toward N but produce no postings.
pub fn build_index(corpus: &Corpus) -> SearchIndex {
    let num_docs = corpus.len() as u32;
    let df = document_frequency(corpus.docs.iter().map(|d| &d.lemmas));

    let per_doc: Vec<(DocId, Option<WeightVector>)> = corpus
        .docs
        .par_iter()
        .map(|doc| (doc.id, compute_weights(&doc.lemmas, &df, num_docs)))
        .collect();

    let mut vectors: BTreeMap<DocId, WeightVector> = BTreeMap::new();
    let mut postings: BTreeMap<String, BTreeSet<DocId>> = BTreeMap::new();
    for (doc_id, vector) in per_doc {
        let Some(vector) = vector else { continue };
        for lemma in vector.weights.keys() {
            postings.entry(lemma.clone()).or_default().insert(doc_id);
        }
        vectors.insert(doc_id, vector);
    }

    let sources = corpus
        .docs
        .iter()
        .map(|d| (d.id, d.source.clone()))
        .collect();

    tracing::info!(
        num_docs,
        num_lemmas = postings.len(),
        "index build complete"
    );

    let weighted = derive_weighted(&vectors);
    SearchIndex { num_docs, sources, postings, weighted, vectors }
}
