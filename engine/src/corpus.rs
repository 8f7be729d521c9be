use crate::lemma::Lemmatizer;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub type DocId = u32;

/// Crawl output record before ingestion: a source identifier and raw text.
/// Document ids are assigned here, at ingestion time, in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub source: String,
    pub text: String,
}

/// A normalized document. `tokens` and `lemmas` are parallel sequences from
/// the lemmatizer; repeats are retained so term frequency can be derived.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub source: String,
    pub tokens: Vec<String>,
    pub lemmas: Vec<String>,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

/// A full corpus snapshot. Read-only once built; ids are 1-based and
/// contiguous, so `docs[i].id == i + 1`.
#[derive(Debug, Default)]
pub struct Corpus {
    pub docs: Vec<Document>,
}

impl Corpus {
    /// Normalize raw crawl records into a corpus. Per-document work runs in
    /// parallel; id assignment follows arrival order regardless.
    pub fn ingest<L: Lemmatizer + ?Sized>(records: Vec<RawDocument>, lemmatizer: &L) -> Self {
        let docs: Vec<Document> = records
            .into_par_iter()
            .enumerate()
            .map(|(i, rec)| {
                let pairs = lemmatizer.normalize(&rec.text);
                let mut tokens = Vec::with_capacity(pairs.len());
                let mut lemmas = Vec::with_capacity(pairs.len());
                for pair in pairs {
                    tokens.push(pair.token);
                    lemmas.push(pair.lemma);
                }
                Document {
                    id: i as DocId + 1,
                    source: rec.source,
                    tokens,
                    lemmas,
                }
            })
            .collect();
        Self { docs }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
