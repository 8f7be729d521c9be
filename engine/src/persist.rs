use crate::corpus::DocId;
use crate::index::SearchIndex;
use crate::weights::{TermWeight, WeightVector};
use anyhow::{anyhow, Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File layout of a persisted index directory. The formats are line-oriented
/// text kept compatible with the pre-existing tooling around them.
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// One line per document: `<id> <source>`.
    pub fn docmap(&self) -> PathBuf {
        self.root.join("index.txt")
    }

    /// Per-document lemma weights: `<lemma> <idf> <tfidf>`, six decimals.
    pub fn lemma_weights_dir(&self) -> PathBuf {
        self.root.join("tf_idf_lemmas")
    }

    /// Per-document surface-token weights, same line format.
    pub fn token_weights_dir(&self) -> PathBuf {
        self.root.join("tf_idf_tokens")
    }

    /// Sorted lemma -> ascending doc-id list.
    pub fn inverted(&self) -> PathBuf {
        self.root.join("inverted_index.json")
    }

    fn weight_file(dir: &Path, doc_id: DocId) -> PathBuf {
        dir.join(format!("{doc_id}.txt"))
    }
}

pub fn save_docmap(paths: &IndexPaths, sources: &BTreeMap<DocId, String>) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = BufWriter::new(File::create(paths.docmap())?);
    for (doc_id, source) in sources {
        writeln!(f, "{doc_id} {source}")?;
    }
    f.flush()?;
    Ok(())
}

pub fn load_docmap(paths: &IndexPaths) -> Result<BTreeMap<DocId, String>> {
    let file = paths.docmap();
    let reader = BufReader::new(
        File::open(&file).with_context(|| format!("open {}", file.display()))?,
    );
    let mut sources = BTreeMap::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (id, source) = line
            .split_once(' ')
            .ok_or_else(|| anyhow!("{}:{}: malformed docmap line", file.display(), lineno + 1))?;
        let doc_id: DocId = id
            .parse()
            .with_context(|| format!("{}:{}: bad document id", file.display(), lineno + 1))?;
        sources.insert(doc_id, source.to_string());
    }
    Ok(sources)
}

fn save_weight_vectors(
    dir: &Path,
    vectors: &BTreeMap<DocId, WeightVector>,
) -> Result<()> {
    create_dir_all(dir)?;
    for (&doc_id, vector) in vectors {
        let mut f = BufWriter::new(File::create(IndexPaths::weight_file(dir, doc_id))?);
        for (term, w) in &vector.weights {
            writeln!(f, "{term} {:.6} {:.6}", w.idf, w.tfidf)?;
        }
        f.flush()?;
    }
    Ok(())
}

pub fn save_lemma_weights(
    paths: &IndexPaths,
    vectors: &BTreeMap<DocId, WeightVector>,
) -> Result<()> {
    save_weight_vectors(&paths.lemma_weights_dir(), vectors)
}

pub fn save_token_weights(
    paths: &IndexPaths,
    vectors: &BTreeMap<DocId, WeightVector>,
) -> Result<()> {
    save_weight_vectors(&paths.token_weights_dir(), vectors)
}

/// Load one weight file back into a vector, recomputing the norm. A line
/// that does not parse is a build failure, not a silently skipped entry.
fn load_weight_vector(file: &Path) -> Result<WeightVector> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("open {}", file.display()))?,
    );
    let mut weights = BTreeMap::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(term), Some(idf), Some(tfidf)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(anyhow!(
                "{}:{}: malformed weight line",
                file.display(),
                lineno + 1
            ));
        };
        let idf: f64 = idf
            .parse()
            .with_context(|| format!("{}:{}: bad idf value", file.display(), lineno + 1))?;
        let tfidf: f64 = tfidf
            .parse()
            .with_context(|| format!("{}:{}: bad tfidf value", file.display(), lineno + 1))?;
        weights.insert(term.to_string(), TermWeight { idf, tfidf });
    }
    Ok(WeightVector::from_weights(weights))
}

/// Load lemma weight vectors for every document listed in the docmap. A
/// missing file means the document had no retained lemmas and simply has no
/// vector.
pub fn load_lemma_weights(
    paths: &IndexPaths,
    sources: &BTreeMap<DocId, String>,
) -> Result<BTreeMap<DocId, WeightVector>> {
    let dir = paths.lemma_weights_dir();
    let mut vectors = BTreeMap::new();
    for &doc_id in sources.keys() {
        let file = IndexPaths::weight_file(&dir, doc_id);
        if !file.exists() {
            continue;
        }
        vectors.insert(doc_id, load_weight_vector(&file)?);
    }
    Ok(vectors)
}

pub fn save_postings(
    paths: &IndexPaths,
    postings: &BTreeMap<String, BTreeSet<DocId>>,
) -> Result<()> {
    create_dir_all(&paths.root)?;
    let as_lists: BTreeMap<&String, Vec<DocId>> = postings
        .iter()
        .map(|(lemma, ids)| (lemma, ids.iter().copied().collect()))
        .collect();
    let f = BufWriter::new(File::create(paths.inverted())?);
    serde_json::to_writer_pretty(f, &as_lists)?;
    Ok(())
}

pub fn load_postings(paths: &IndexPaths) -> Result<BTreeMap<String, BTreeSet<DocId>>> {
    let file = paths.inverted();
    let reader = BufReader::new(
        File::open(&file).with_context(|| format!("open {}", file.display()))?,
    );
    let as_lists: BTreeMap<String, Vec<DocId>> =
        serde_json::from_reader(reader).with_context(|| format!("parse {}", file.display()))?;
    Ok(as_lists
        .into_iter()
        .map(|(lemma, ids)| (lemma, ids.into_iter().collect()))
        .collect())
}

/// Persist every artifact of a built index. Token-level vectors are written
/// alongside the lemma-level ones when provided.
pub fn save_index(
    paths: &IndexPaths,
    index: &SearchIndex,
    token_vectors: Option<&BTreeMap<DocId, WeightVector>>,
) -> Result<()> {
    save_docmap(paths, index.sources())?;
    save_lemma_weights(paths, index.vectors())?;
    if let Some(tokens) = token_vectors {
        save_token_weights(paths, tokens)?;
    }
    save_postings(paths, index.all_postings())?;
    tracing::info!(root = %paths.root.display(), "index persisted");
    Ok(())
}

/// Reassemble a queryable index from disk. Any unreadable or corrupt file
/// surfaces as an error; a partially-loaded index is never returned.
pub fn load_index(paths: &IndexPaths) -> Result<SearchIndex> {
    let sources = load_docmap(paths)?;
    let vectors = load_lemma_weights(paths, &sources)?;
    let postings = load_postings(paths)?;
    Ok(SearchIndex::from_parts(sources, postings, vectors))
}
