//! Batch retrieval and ranking engine: corpus normalization, tf-idf
//! weighting, inverted-index construction, and boolean plus vector-space
//! querying over a static corpus snapshot.

pub mod boolean;
pub mod corpus;
pub mod index;
pub mod lemma;
pub mod persist;
pub mod stats;
pub mod vector;
pub mod weights;

pub use boolean::{boolean_search, QueryError};
pub use corpus::{Corpus, DocId, Document, RawDocument};
pub use index::{build_index, SearchIndex};
pub use lemma::{EnglishLemmatizer, Lemmatizer, TermPair};
pub use vector::{vector_search, SearchHit};
pub use weights::{compute_weights, TermWeight, WeightVector};
