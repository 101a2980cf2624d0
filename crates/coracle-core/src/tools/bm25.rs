//! BM25 full-text index over tool names and descriptions
//!
//! Kept deliberately small: the corpus is a tool catalog (hundreds of
//! short documents), so a plain posting-list index scored with standard
//! BM25 handles short queries like "github repo" well without any
//! external dependency.

use std::collections::HashMap;

const K1: f64 = 1.5;
const B: f64 = 0.75;

/// Posting-list index for a fixed set of documents.
///
/// Documents are addressed by their build-time position, which callers map
/// back to registry insertion order.
#[derive(Debug, Default)]
pub(crate) struct Bm25Index {
    /// token -> (doc index, term frequency)
    postings: HashMap<String, Vec<(usize, u32)>>,
    doc_len: Vec<usize>,
    avg_len: f64,
}

impl Bm25Index {
    pub(crate) fn build<'a>(docs: impl Iterator<Item = &'a str>) -> Self {
        let mut index = Self::default();

        for (doc, text) in docs.enumerate() {
            let tokens = tokenize(text);
            index.doc_len.push(tokens.len());

            let mut freq: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *freq.entry(token).or_default() += 1;
            }
            for (token, count) in freq {
                index.postings.entry(token).or_default().push((doc, count));
            }
        }

        let total: usize = index.doc_len.iter().sum();
        index.avg_len = if index.doc_len.is_empty() {
            0.0
        } else {
            total as f64 / index.doc_len.len() as f64
        };

        index
    }

    /// Score every document against the query and return the positive hits
    /// sorted by descending score, ties broken by document index.
    pub(crate) fn search(&self, query: &str) -> Vec<(usize, f64)> {
        let n = self.doc_len.len();
        if n == 0 {
            return Vec::new();
        }

        let mut scores = vec![0.0f64; n];
        for token in tokenize(query) {
            let Some(postings) = self.postings.get(&token) else {
                continue;
            };

            let df = postings.len() as f64;
            let idf = ((n as f64 - df + 0.5) / (df + 0.5) + 1.0).ln();

            for &(doc, tf) in postings {
                let tf = tf as f64;
                let norm = K1 * (1.0 - B + B * self.doc_len[doc] as f64 / self.avg_len);
                scores[doc] += idf * (tf * (K1 + 1.0)) / (tf + norm);
            }
        }

        let mut hits: Vec<(usize, f64)> = scores
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
        hits
    }
}

/// Lowercased alphanumeric runs.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_alphanumeric_runs() {
        assert_eq!(
            tokenize("tool_search: GitHub repos, v2!"),
            vec!["tool", "search", "github", "repos", "v2"]
        );
        assert!(tokenize("  ---  ").is_empty());
    }

    #[test]
    fn unique_token_hits_its_document() {
        let docs = [
            "read_file Read the contents of a file",
            "stock_quote Fetch a stock market quote",
            "send_email Send an email over SMTP",
        ];
        let index = Bm25Index::build(docs.iter().copied());

        let hits = index.search("email");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 2);
    }

    #[test]
    fn more_matching_terms_rank_higher() {
        let docs = [
            "github_search Search GitHub repositories",
            "web_search Search the web",
        ];
        let index = Bm25Index::build(docs.iter().copied());

        let hits = index.search("github search");
        assert_eq!(hits[0].0, 0);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn ties_break_by_document_index() {
        let docs = ["alpha tool", "alpha tool"];
        let index = Bm25Index::build(docs.iter().copied());

        let hits = index.search("alpha");
        assert_eq!(hits[0].0, 0);
        assert_eq!(hits[1].0, 1);
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = Bm25Index::build(std::iter::empty());
        assert!(index.search("anything").is_empty());
    }

    #[test]
    fn no_match_returns_nothing() {
        let index = Bm25Index::build(["read_file reads files"].into_iter());
        assert!(index.search("quantum chromodynamics").is_empty());
    }
}
