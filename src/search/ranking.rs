//! Relevance scoring, snippet extraction and tag augmentation / 相关性评分、片段提取、标签扩充

use std::collections::{HashMap, HashSet};

use super::schema::Entry;
use super::tags::Tags;
use super::tokenizer::Tokenizer;

/// Default snippet window, in tokens / 默认片段长度（词元数）
pub const DEFAULT_SNIPPET_LENGTH: usize = 200;

const NAME_WEIGHT: usize = 3;
const ALL_TERMS_BONUS: usize = 5;
const UNIQUE_MATCH_WEIGHT: usize = 10;
const TAG_WEIGHT: usize = 2;
/// Content with at least this many tokens is not length-penalized
const FULL_LENGTH_TOKENS: f64 = 100.0;
/// How many frequent content tokens are considered for tag augmentation
const FREQUENT_TOKENS: usize = 5;

/// Score an entry against tokenized query words / 计算相关性分数
///
/// `query_words` is used as given, duplicates included.
pub fn rate(tokenizer: &Tokenizer, entry: &Entry, query_words: &[String]) -> f64 {
    let content_tokens = tokenizer.tokenize(&entry.content);
    let name_tokens: HashSet<String> = tokenizer.tokenize(&entry.name).into_iter().collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in &content_tokens {
        *counts.entry(token.as_str()).or_default() += 1;
    }
    let count_of = |word: &str| counts.get(word).copied().unwrap_or(0);

    let distinct: HashSet<&str> = query_words.iter().map(String::as_str).collect();
    let unique_matches = distinct.iter().filter(|&&word| count_of(word) > 0).count();

    let content_score: usize = query_words.iter().map(|word| count_of(word.as_str())).sum();
    let name_score = NAME_WEIGHT
        * query_words
            .iter()
            .filter(|word| name_tokens.contains(*word))
            .count();
    // Every term present somewhere, not necessarily adjacent
    let all_terms_score = if query_words.iter().all(|word| count_of(word.as_str()) > 0) {
        ALL_TERMS_BONUS
    } else {
        0
    };
    let unique_match_score = UNIQUE_MATCH_WEIGHT * unique_matches;
    let tag_score = TAG_WEIGHT
        * entry
            .tags
            .iter()
            .filter(|tag| {
                let tag_tokens = tokenizer.tokenize(tag);
                query_words.iter().any(|word| tag_tokens.contains(word))
            })
            .count();

    let length_penalty = (content_tokens.len() as f64 / FULL_LENGTH_TOKENS).min(1.0);
    let raw = content_score + name_score + all_terms_score + unique_match_score + tag_score;
    raw as f64 * length_penalty
}

/// Best window of `max_length` tokens, as the original substring / 提取最佳片段
///
/// A window scores `count(word) * sqrt(chars(word))` summed over the query
/// words. The earliest window wins ties. `"..."` is appended when the content
/// is longer than `max_length` characters.
pub fn snippet(
    tokenizer: &Tokenizer,
    content: &str,
    query_words: &[String],
    max_length: usize,
) -> String {
    let tokens = tokenizer.tokenize_spans(content);
    let window = max_length.max(1);

    // Distinct query words with their weight, multiplicity folded in
    let mut weights: Vec<(&str, f64)> = Vec::new();
    for word in query_words {
        let weight = (word.chars().count() as f64).sqrt();
        match weights.iter_mut().find(|(w, _)| *w == word.as_str()) {
            Some((_, total)) => *total += weight,
            None => weights.push((word.as_str(), weight)),
        }
    }
    let slot = |token: &str| weights.iter().position(|(w, _)| *w == token);

    let mut counts = vec![0usize; weights.len()];
    let score = |counts: &[usize]| -> f64 {
        counts
            .iter()
            .zip(&weights)
            .map(|(count, (_, weight))| *count as f64 * weight)
            .sum()
    };

    let first_end = window.min(tokens.len());
    for token in &tokens[..first_end] {
        if let Some(i) = slot(token.text.as_str()) {
            counts[i] += 1;
        }
    }

    let mut best_start = 0;
    let mut best_score = score(&counts);
    for start in 1..=tokens.len().saturating_sub(window) {
        if let Some(i) = slot(tokens[start - 1].text.as_str()) {
            counts[i] -= 1;
        }
        if let Some(i) = slot(tokens[start + window - 1].text.as_str()) {
            counts[i] += 1;
        }
        let current = score(&counts);
        if current > best_score {
            best_score = current;
            best_start = start;
        }
    }

    let end = (best_start + window).min(tokens.len());
    let mut text = if best_start < end {
        let (first, last) = (&tokens[best_start], &tokens[end - 1]);
        content[first.span.start..last.span.end].to_string()
    } else {
        String::new()
    };

    if content.chars().count() > max_length {
        text.push_str("...");
    }
    text
}

/// Tags for a query hit / 为查询结果扩充标签
///
/// Original tags stay first and in order. Then come query words found in the
/// content, then those of the most frequent content tokens that are neither
/// a tag nor a query word.
pub fn update_tags(
    tokenizer: &Tokenizer,
    original: &Tags,
    content: &str,
    query_words: &[String],
) -> Tags {
    let words = tokenizer.tokenize(content);

    // Counts in first-occurrence order
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for word in &words {
        match slots.get(word.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slots.insert(word.as_str(), counts.len());
                counts.push((word.as_str(), 1));
            }
        }
    }

    let mut updated = original.clone();
    for word in query_words {
        if slots.contains_key(word.as_str()) && !updated.contains(word) {
            updated.push(word.as_str());
        }
    }

    let query_set: HashSet<&str> = query_words.iter().map(String::as_str).collect();
    // Stable sort keeps first-occurrence order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    for (word, _) in counts.into_iter().take(FREQUENT_TOKENS) {
        if !original.contains(word) && !query_set.contains(word) {
            updated.push(word);
        }
    }

    updated
}
