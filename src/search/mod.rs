//! Search module - in-memory keyword index over document lines / 搜索模块
//!
//! Architecture principles / 架构原则：
//! - The store only exposes primitive operations: add_entry, query, save, load
//! - Ingestion (walking a corpus, dedup) lives in `crate::indexer`
//! - Call direction: indexer / CLI → search (unidirectional) / 调用方向
//!
//! Index features / 索引特性：
//! - CJK text segmented with jieba, other scripts split into word runs
//! - Ranking by term frequency, name and tag matches, with a length penalty
//! - Snippets and query-time tag augmentation
//! - CSV persistence with tolerant loading

pub mod engine;
pub mod persist;
pub mod ranking;
pub mod schema;
pub mod shared;
pub mod tags;
pub mod tokenizer;

pub use engine::{DocumentStore, IndexStats};
pub use persist::{LoadReport, RowError, SkippedRow};
pub use schema::{Entry, QueryHit};
pub use shared::SharedStore;
pub use tags::{RawTags, Tags};
pub use tokenizer::{
    detect_language, extract_keywords, tokenize, JiebaSegmenter, Language, Segmenter, Tokenizer,
};
