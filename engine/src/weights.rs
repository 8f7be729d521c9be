use std::collections::BTreeMap;

/// Weight of a single term in a document. The idf factor is kept next to the
/// final weight because the persisted format emits both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermWeight {
    pub idf: f64,
    pub tfidf: f64,
}

/// Sparse tf-idf vector for one document, with its Euclidean norm cached.
///
/// Weights are keyed in lexicographic term order so the norm accumulates in
/// a fixed order and stays reproducible across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    pub weights: BTreeMap<String, TermWeight>,
    pub norm: f64,
}

impl WeightVector {
    /// Recompute the norm from the stored weights. A vector with no mass
    /// gets norm 1.0 so similarity division is always defined; such a
    /// document simply cannot match any positive-dot-product query.
    pub fn from_weights(weights: BTreeMap<String, TermWeight>) -> Self {
        let sum_sq: f64 = weights.values().map(|w| w.tfidf * w.tfidf).sum();
        let norm = if sum_sq > 0.0 { sum_sq.sqrt() } else { 1.0 };
        Self { weights, norm }
    }

    pub fn get(&self, term: &str) -> Option<f64> {
        self.weights.get(term).map(|w| w.tfidf)
    }
}

/// Compute the tf-idf vector for one document's term sequence.
///
/// `tf = count / len`, `idf = ln(N / df)` with the natural log; `ln(1) = 0`
/// is a valid zero weight when a term occurs in every document. A document
/// with an empty sequence produces no vector at all.
pub fn compute_weights(
    sequence: &[String],
    df: &BTreeMap<String, u32>,
    total_docs: u32,
) -> Option<WeightVector> {
    if sequence.is_empty() || total_docs == 0 {
        return None;
    }
    let len = sequence.len() as f64;

    let mut counts: BTreeMap<&String, u32> = BTreeMap::new();
    for term in sequence {
        *counts.entry(term).or_insert(0) += 1;
    }

    let mut weights = BTreeMap::new();
    for (term, count) in counts {
        // By construction df contains every term of the current document.
        let df_t = df.get(term).copied().unwrap_or(1);
        let tf = count as f64 / len;
        let idf = (total_docs as f64 / df_t as f64).ln();
        weights.insert(term.clone(), TermWeight { idf, tfidf: tf * idf });
    }
    Some(WeightVector::from_weights(weights))
}
