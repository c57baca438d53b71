mod error;
mod loader;
mod stopwords;
mod tfidf;

pub use error::{Error, Result};
pub use loader::load_documents;
pub use stopwords::is_stopword;
pub use tfidf::{ScoredDoc, TfidfIndex};
