//! Document store - in-memory inverted index / 文档存储与倒排索引
//!
//! Primitive operations / 原语操作：
//! - add_entry: append and index one entry / 追加并索引条目
//! - query: ranked keyword search / 排序关键词搜索
//! - save / load_from_file / load_or_create: see `persist` / 持久化
//!
//! The collection is append-only; an entry's position is its id and is what
//! postings lists refer to. There is no internal locking, wrap the store in
//! `SharedStore` when several threads need it.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::ranking::{self, DEFAULT_SNIPPET_LENGTH};
use super::schema::{Entry, QueryHit};
use super::tags::Tags;
use super::tokenizer::Tokenizer;

/// Document store / 文档存储
#[derive(Debug, Clone)]
pub struct DocumentStore {
    /// Entries in insertion order / 按插入顺序存储的条目
    entries: Vec<Entry>,
    /// Inverted index: token -> entry positions / 倒排索引
    postings: HashMap<String, Vec<usize>>,
    tokenizer: Tokenizer,
    snippet_length: usize,
}

/// Index statistics / 索引统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub entry_count: usize,
    pub token_count: usize,
    pub posting_count: usize,
}

impl DocumentStore {
    /// Create an empty store using the jieba tokenizer / 创建空存储
    pub fn new() -> Self {
        Self::with_tokenizer(Tokenizer::new())
    }

    pub fn with_tokenizer(tokenizer: Tokenizer) -> Self {
        Self {
            entries: Vec::new(),
            postings: HashMap::new(),
            tokenizer,
            snippet_length: DEFAULT_SNIPPET_LENGTH,
        }
    }

    /// Snippet window in tokens, at least 1 / 片段长度
    pub fn with_snippet_length(mut self, snippet_length: usize) -> Self {
        self.snippet_length = snippet_length.max(1);
        self
    }

    /// Empty store with the same tokenizer and settings / 相同配置的空存储
    pub fn empty_like(&self) -> Self {
        Self::with_tokenizer(self.tokenizer.clone()).with_snippet_length(self.snippet_length)
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn snippet_length(&self) -> usize {
        self.snippet_length
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// Postings list for a token / 获取词元的倒排列表
    pub fn postings(&self, token: &str) -> Option<&[usize]> {
        self.postings.get(token).map(Vec::as_slice)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entry_count: self.entries.len(),
            token_count: self.postings.len(),
            posting_count: self.postings.values().map(Vec::len).sum(),
        }
    }

    /// Append and index an entry, returning its position / 添加条目
    ///
    /// `tags` may be a list or a comma-joined string.
    pub fn add_entry(
        &mut self,
        name: impl Into<String>,
        content: impl Into<String>,
        tags: impl Into<Tags>,
    ) -> usize {
        self.push_entry(Entry::new(name, content, tags))
    }

    /// Append an already built entry (used by the loader) / 追加已构建的条目
    pub(crate) fn push_entry(&mut self, entry: Entry) -> usize {
        let index = self.entries.len();
        for token in self.tokenizer.tokenize(&entry.content) {
            self.postings.entry(token).or_default().push(index);
        }
        self.entries.push(entry);
        index
    }

    /// Ranked keyword query / 排序查询
    ///
    /// Candidates are entries sharing at least one token with the query.
    /// Equal scores are ordered by ascending position.
    pub fn query(&self, text: &str, top_n: usize) -> Vec<QueryHit> {
        if top_n == 0 {
            return Vec::new();
        }

        let query_words = self.tokenizer.tokenize(text);
        let candidates: BTreeSet<usize> = query_words
            .iter()
            .filter_map(|word| self.postings.get(word))
            .flatten()
            .copied()
            .collect();

        let mut scored: Vec<(usize, f64)> = candidates
            .into_iter()
            .filter_map(|index| {
                let entry = self.entries.get(index)?;
                Some((index, ranking::rate(&self.tokenizer, entry, &query_words)))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        tracing::debug!(
            "Query {:?}: {} tokens, {} candidates",
            text,
            query_words.len(),
            scored.len()
        );

        scored
            .into_iter()
            .take(top_n)
            .map(|(index, score)| {
                let entry = &self.entries[index];
                QueryHit {
                    name: entry.name.clone(),
                    content: ranking::snippet(
                        &self.tokenizer,
                        &entry.content,
                        &query_words,
                        self.snippet_length,
                    ),
                    tags: ranking::update_tags(
                        &self.tokenizer,
                        &entry.tags,
                        &entry.content,
                        &query_words,
                    )
                    .joined(),
                    index,
                    score,
                }
            })
            .collect()
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
