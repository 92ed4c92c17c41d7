//! Lexical reranking of search results.
//!
//! A result scores one point per query term found in its title or content.
//! Terms are lowercase whitespace tokens of at least three characters that
//! are not stopwords. A term repeated in the query counts once per repeat.

use std::collections::HashSet;
use std::sync::LazyLock;

use groupmind_types::tool::SearchHit;

const MIN_TERM_CHARS: usize = 3;

static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // English
        "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "is", "was", "are", "were", "be", "been", "has", "have", "had", "do", "did",
        "will", "would", "can", "could", "that", "this", "it", "its", "as", "up", "out", "if",
        "about", "into",
        // Russian
        "и", "в", "на", "с", "по", "за", "к", "о", "у", "из", "от", "до", "не", "что", "как",
        "но", "а", "или", "же", "ли", "бы", "то", "это", "он", "она", "они", "мы", "вы", "я",
        "ты", "его", "её", "их", "нет",
    ]
    .into_iter()
    .collect()
});

/// Scoring terms extracted from a query, in query order.
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TERM_CHARS && !STOPWORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Number of `terms` present in the hit's title or content.
pub fn score(hit: &SearchHit, terms: &[String]) -> usize {
    let haystack = format!("{} {}", hit.title, hit.content).to_lowercase();
    terms.iter().filter(|t| haystack.contains(t.as_str())).count()
}

/// Stable sort by descending score; ties keep provider order.
///
/// A query with no scoring terms leaves the order untouched.
pub fn rerank(hits: Vec<SearchHit>, query: &str) -> Vec<SearchHit> {
    let terms = query_terms(query);
    if terms.is_empty() {
        return hits;
    }
    let mut scored: Vec<(usize, SearchHit)> = hits
        .into_iter()
        .map(|hit| (score(&hit, &terms), hit))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, hit)| hit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, content: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            url: format!("https://example.com/{title}"),
            content: content.to_string(),
        }
    }

    #[test]
    fn terms_drop_short_words_and_stopwords() {
        assert_eq!(
            query_terms("The Rust borrow checker and IT"),
            vec!["rust".to_string(), "borrow".to_string(), "checker".to_string()]
        );
        assert_eq!(query_terms("что это за матч"), vec!["матч".to_string()]);
        assert!(query_terms("a an to").is_empty());
    }

    #[test]
    fn two_term_match_ranks_above_one() {
        let hits = vec![
            hit("one", "rust only"),
            hit("two", "rust and tokio together"),
            hit("zero", "nothing relevant"),
        ];
        let ranked = rerank(hits, "rust tokio");
        let titles: Vec<&str> = ranked.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["two", "one", "zero"]);
    }

    #[test]
    fn ties_keep_provider_order() {
        let hits = vec![
            hit("first", "tokio"),
            hit("second", "nothing"),
            hit("third", "tokio"),
            hit("fourth", "nothing"),
        ];
        let ranked = rerank(hits, "tokio runtime");
        let titles: Vec<&str> = ranked.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "third", "second", "fourth"]);
    }

    #[test]
    fn repeated_query_terms_weigh_more() {
        let terms = query_terms("rust rust news");
        assert_eq!(terms, vec!["rust", "rust", "news"]);
        assert_eq!(score(&hit("a", "rust release"), &terms), 2);
        assert_eq!(score(&hit("b", "daily news"), &terms), 1);

        let ranked = rerank(vec![hit("b", "daily news"), hit("a", "rust release")], "rust rust news");
        assert_eq!(ranked[0].title, "a");
    }

    #[test]
    fn title_counts_toward_score() {
        let terms = query_terms("lancedb vectors");
        assert_eq!(score(&hit("LanceDB", "stores vectors"), &terms), 2);
    }

    #[test]
    fn query_without_terms_is_identity() {
        let hits = vec![hit("b", "x"), hit("a", "y")];
        let ranked = rerank(hits.clone(), "is it");
        assert_eq!(ranked, hits);
    }
}
