use std::collections::{BTreeMap, BTreeSet};

/// Document frequency: for each term, the number of documents containing it
/// at least once. Occurrences within a document never inflate the count.
///
/// Works on any per-document term sequences, so the same pass serves lemma
/// and surface-token statistics. An empty corpus yields an empty map.
pub fn document_frequency<'a, I, S>(sequences: I) -> BTreeMap<String, u32>
where
    I: IntoIterator<Item = S>,
    S: IntoIterator<Item = &'a String>,
{
    let mut df: BTreeMap<String, u32> = BTreeMap::new();
    for seq in sequences {
        let distinct: BTreeSet<&String> = seq.into_iter().collect();
        for term in distinct {
            *df.entry(term.clone()).or_insert(0) += 1;
        }
    }
    df
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seqs(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|s| s.iter().map(|t| t.to_string()).collect())
            .collect()
    }

    #[test]
    fn counts_documents_not_occurrences() {
        let docs = seqs(&[&["cat", "dog", "cat", "cat"], &["dog", "bird"]]);
        let df = document_frequency(docs.iter());
        assert_eq!(df.get("cat"), Some(&1));
        assert_eq!(df.get("dog"), Some(&2));
        assert_eq!(df.get("bird"), Some(&1));
    }

    #[test]
    fn df_is_bounded_by_corpus_size() {
        let docs = seqs(&[&["cat", "dog"], &["dog", "bird"], &["dog"]]);
        let n = docs.len() as u32;
        let df = document_frequency(docs.iter());
        for (_, &count) in df.iter() {
            assert!(count >= 1);
            assert!(count <= n);
        }
    }

    #[test]
    fn empty_documents_contribute_nothing() {
        let docs = seqs(&[&[], &["cat"]]);
        let df = document_frequency(docs.iter());
        assert_eq!(df.len(), 1);
        assert_eq!(df.get("cat"), Some(&1));
    }

    #[test]
    fn empty_corpus_yields_empty_map() {
        let docs: Vec<Vec<String>> = Vec::new();
        let df = document_frequency(docs.iter());
        assert!(df.is_empty());
    }
}
