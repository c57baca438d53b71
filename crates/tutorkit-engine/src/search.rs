use crate::error::Result;

/// A retrieved document fragment
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub text: String,
    pub source: String,
    pub score: f64,
}

/// Retrieval seam of the expert pipeline.
///
/// `search` returns hits ranked by descending score; an empty corpus yields
/// an empty result. The pipeline treats a failure the same as an empty
/// result and degrades to its stock apology, so implementations are free to
/// error on infrastructure problems.
pub trait SearchIndex {
    fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>>;
}
