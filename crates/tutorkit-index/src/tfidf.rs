use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::loader::load_documents;
use crate::stopwords::is_stopword;

/// A ranked retrieval hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDoc {
    pub text: String,
    pub source: String,
    pub score: f64,
}

/// TF-IDF index over the lesson corpus.
///
/// Fitted once at session start; queries are transformed with the fitted
/// idf table and scored by dot product against the l2-normalized document
/// vectors (equals cosine similarity).
pub struct TfidfIndex {
    docs: Vec<String>,
    doc_names: Vec<String>,
    vocab: HashMap<String, usize>,
    idf: Vec<f64>,
    doc_vectors: Vec<HashMap<usize, f64>>,
}

impl TfidfIndex {
    /// Fit an index over an in-memory corpus. Documents are named
    /// `doc_1..doc_n` in load order.
    pub fn fit(docs: Vec<String>) -> Self {
        let doc_names = (1..=docs.len()).map(|i| format!("doc_{}", i)).collect();
        let tokenized: Vec<Vec<String>> = docs.iter().map(|d| tokenize(d)).collect();

        let mut vocab: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokens {
                let term_id = match vocab.get(token) {
                    Some(&id) => id,
                    None => {
                        let id = vocab.len();
                        vocab.insert(token.clone(), id);
                        doc_freq.push(0);
                        id
                    }
                };
                if !seen.contains(&term_id) {
                    seen.push(term_id);
                    doc_freq[term_id] += 1;
                }
            }
        }

        // Smoothed idf: ln((1 + n) / (1 + df)) + 1
        let n = docs.len() as f64;
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let doc_vectors = tokenized
            .iter()
            .map(|tokens| vectorize(tokens, &vocab, &idf))
            .collect();

        Self {
            docs,
            doc_names,
            vocab,
            idf,
            doc_vectors,
        }
    }

    /// Load and index a document folder.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self::fit(load_documents(dir)?))
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Rank documents against the query, best first. An empty corpus yields
    /// an empty result; otherwise the top `top_k` documents are returned
    /// even when their score is zero, mirroring plain argsort ranking.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<ScoredDoc> {
        if self.docs.is_empty() || top_k == 0 {
            return Vec::new();
        }
        let query_vec = vectorize(&tokenize(query), &self.vocab, &self.idf);

        let mut scores: Vec<(usize, f64)> = self
            .doc_vectors
            .iter()
            .map(|dv| dot(&query_vec, dv))
            .enumerate()
            .collect();
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        scores
            .into_iter()
            .take(top_k)
            .map(|(i, score)| ScoredDoc {
                text: self.docs[i].clone(),
                source: self.doc_names[i].clone(),
                score,
            })
            .collect()
    }
}

/// Lowercased word tokens of at least two characters, stop words removed.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2 && !is_stopword(t))
        .map(str::to_string)
        .collect()
}

/// l2-normalized tf-idf vector, sparse over term ids.
fn vectorize(tokens: &[String], vocab: &HashMap<String, usize>, idf: &[f64]) -> HashMap<usize, f64> {
    let mut counts: HashMap<usize, f64> = HashMap::new();
    for token in tokens {
        if let Some(&term_id) = vocab.get(token) {
            *counts.entry(term_id).or_insert(0.0) += 1.0;
        }
    }
    for (term_id, value) in counts.iter_mut() {
        *value *= idf[*term_id];
    }
    let norm = counts.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in counts.values_mut() {
            *value /= norm;
        }
    }
    counts
}

fn dot(a: &HashMap<usize, f64>, b: &HashMap<usize, f64>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term_id, va)| large.get(term_id).map(|vb| va * vb))
        .sum()
}
