use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"[a-zA-Z]+").expect("valid regex");
    static ref CLOSED_CLASS: HashSet<&'static str> = {
        // Closed-class vocabulary: prepositions, conjunctions, determiners,
        // particles, pronouns. These carry no content and never enter the index.
        let prepositions: &[&str] = &[
            "aboard","about","above","across","after","against","along","amid","among","around","at",
            "before","behind","below","beneath","beside","besides","between","beyond","by",
            "despite","down","during","except","for","from","in","inside","into",
            "near","of","off","on","onto","out","outside","over","past",
            "through","throughout","till","toward","towards","under","underneath","until","up","upon",
            "with","within","without",
        ];
        let conjunctions: &[&str] = &[
            "and","but","or","nor","so","yet","although","because","if","lest","once","since",
            "than","that","though","unless","whereas","wherever","whether","while",
        ];
        let determiners: &[&str] = &[
            "a","an","the","this","these","those","each","every","either","neither",
            "some","any","no","few","fewer","many","much","more","most","several",
            "all","both","half","enough","such","what","which","whose",
        ];
        let particles: &[&str] = &["to", "not"];
        let pronouns: &[&str] = &[
            "i","me","my","mine","myself","you","your","yours","yourself","yourselves",
            "he","him","his","himself","she","her","hers","herself","it","its","itself",
            "we","us","our","ours","ourselves","they","them","their","theirs","themselves",
            "who","whom","anybody","anyone","anything","everybody","everyone","everything",
            "nobody","nothing","somebody","someone","something","one","oneself",
        ];
        prepositions
            .iter()
            .chain(conjunctions)
            .chain(determiners)
            .chain(particles)
            .chain(pronouns)
            .copied()
            .collect()
    };
}

fn is_closed_class(word: &str) -> bool {
    CLOSED_CLASS.contains(word)
}

/// A surface token paired with its normalized lemma.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermPair {
    pub token: String,
    pub lemma: String,
}

/// Linguistic normalization capability injected into ingestion and querying.
///
/// The engine never implements lemmatization itself; it only consumes the
/// `(token, lemma)` stream this boundary produces.
pub trait Lemmatizer: Send + Sync {
    /// Full document pipeline: extract alphabetic tokens, drop closed-class
    /// words, and lemmatize the rest. Order and repetition are preserved.
    fn normalize(&self, text: &str) -> Vec<TermPair>;

    /// Simplified single-word path used for boolean query literals:
    /// lower-case and lemmatize, with no closed-class filtering.
    fn normalize_word(&self, word: &str) -> String;
}

/// English normalizer backed by a Snowball stemmer.
///
/// Construct once before any indexing or querying and pass by reference;
/// the stemmer model is loaded at construction time.
pub struct EnglishLemmatizer {
    stemmer: Stemmer,
}

impl EnglishLemmatizer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }
}

impl Default for EnglishLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer for EnglishLemmatizer {
    fn normalize(&self, text: &str) -> Vec<TermPair> {
        let folded = text.nfkc().collect::<String>().to_lowercase();
        let mut pairs = Vec::new();
        for mat in WORD_RE.find_iter(&folded) {
            let token = mat.as_str();
            if is_closed_class(token) {
                continue;
            }
            pairs.push(TermPair {
                token: token.to_string(),
                lemma: self.stemmer.stem(token).to_string(),
            });
        }
        pairs
    }

    fn normalize_word(&self, word: &str) -> String {
        let folded = word.nfkc().collect::<String>().to_lowercase();
        self.stemmer.stem(&folded).to_string()
    }
}
