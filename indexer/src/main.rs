use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use engine::boolean::boolean_search;
use engine::corpus::{Corpus, DocId, RawDocument};
use engine::index::build_index;
use engine::lemma::EnglishLemmatizer;
use engine::persist::{load_index, save_index, IndexPaths};
use engine::stats::document_frequency;
use engine::vector::vector_search;
use engine::weights::{compute_weights, WeightVector};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    url: String,
    #[serde(default)]
    title: String,
    body: String,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query the lemma-based tf-idf index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from crawl JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
    },
    /// Evaluate a boolean expression (AND/OR/NOT, parentheses) against an index
    Boolean {
        /// Index directory
        #[arg(long)]
        index: String,
        /// Expression, e.g. "(cat AND dog) OR NOT bird"
        #[arg(long)]
        query: String,
    },
    /// Rank documents for a free-text query by cosine similarity
    Vector {
        /// Index directory
        #[arg(long)]
        index: String,
        /// Free-text query
        #[arg(long)]
        query: String,
        /// Number of results to print
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build(&input, &output),
        Commands::Boolean { index, query } => run_boolean(&index, &query),
        Commands::Vector { index, query, top } => run_vector(&index, &query, top),
    }
}

fn build(input: &str, output: &str) -> Result<()> {
    let records = read_records(Path::new(input))?;
    if records.is_empty() {
        return Err(anyhow!("no input documents found under {input}"));
    }
    tracing::info!(num_records = records.len(), "ingesting documents");

    let lemmatizer = EnglishLemmatizer::new();
    let corpus = Corpus::ingest(records, &lemmatizer);
    let index = build_index(&corpus);
    let token_vectors = token_weight_vectors(&corpus);

    let paths = IndexPaths::new(output);
    save_index(&paths, &index, Some(&token_vectors))?;
    tracing::info!(output, num_docs = index.num_docs(), "build complete");
    Ok(())
}

/// Surface-token weight files mirror the lemma ones; the vector query path
/// never reads them, they exist for the surrounding tooling.
fn token_weight_vectors(corpus: &Corpus) -> BTreeMap<DocId, WeightVector> {
    let df = document_frequency(corpus.docs.iter().map(|d| &d.tokens));
    let n = corpus.len() as u32;
    corpus
        .docs
        .iter()
        .filter_map(|doc| compute_weights(&doc.tokens, &df, n).map(|v| (doc.id, v)))
        .collect()
}

fn read_records(input: &Path) -> Result<Vec<RawDocument>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else {
        files.push(input.to_path_buf());
    }

    let mut records = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut records)?;
        } else {
            read_json(&file, &mut records)?;
        }
    }
    Ok(records)
}

fn read_jsonl(file: &Path, records: &mut Vec<RawDocument>) -> Result<()> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("open {}", file.display()))?,
    );
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: malformed record", file.display(), lineno + 1))?;
        records.push(to_record(doc));
    }
    Ok(())
}

fn read_json(file: &Path, records: &mut Vec<RawDocument>) -> Result<()> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("open {}", file.display()))?,
    );
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parse {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                records.push(to_record(serde_json::from_value(v)?));
            }
        }
        serde_json::Value::Object(_) => {
            records.push(to_record(serde_json::from_value(json)?));
        }
        _ => {}
    }
    Ok(())
}

fn to_record(doc: InputDoc) -> RawDocument {
    // The title is part of the page text; closed-class filtering applies
    // to it the same as to the body.
    let text = if doc.title.is_empty() {
        doc.body
    } else {
        format!("{}\n{}", doc.title, doc.body)
    };
    RawDocument { source: doc.url, text }
}

fn run_boolean(index_dir: &str, query: &str) -> Result<()> {
    let index = load_index(&IndexPaths::new(index_dir))?;
    let lemmatizer = EnglishLemmatizer::new();
    match boolean_search(&index, &lemmatizer, query) {
        Ok(result) if result.is_empty() => println!("no matching documents"),
        Ok(result) => {
            let ids: Vec<String> = result.iter().map(|id| id.to_string()).collect();
            println!("documents: {}", ids.join(" "));
        }
        Err(err) => println!("error: {err}"),
    }
    Ok(())
}

fn run_vector(index_dir: &str, query: &str, top: usize) -> Result<()> {
    let index = load_index(&IndexPaths::new(index_dir))?;
    let lemmatizer = EnglishLemmatizer::new();
    let hits = vector_search(&index, &lemmatizer, query);
    if hits.is_empty() {
        println!("no matching documents");
        return Ok(());
    }
    for (rank, hit) in hits.iter().take(top.max(1)).enumerate() {
        let source = index.source(hit.doc_id).unwrap_or("<unknown>");
        println!("{}. [{:.4}] doc {}  {}", rank + 1, hit.score, hit.doc_id, source);
    }
    Ok(())
}
