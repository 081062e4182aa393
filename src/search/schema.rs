//! Index entry and query hit definitions / 索引条目与查询结果定义

use chrono::Local;
use serde::{Deserialize, Serialize};

use super::tags::Tags;

/// Format of `Entry::timestamp` / 时间戳格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One indexed unit of content, usually a single line of a source document / 索引条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Source document identifier, not unique / 来源文档名
    pub name: String,
    /// Creation time, kept as an opaque string / 创建时间
    pub timestamp: String,
    /// Indexed text / 索引文本
    pub content: String,
    /// Tags; the first one is the primary tag / 标签
    pub tags: Tags,
}

impl Entry {
    /// Create an entry stamped with the current local time / 创建条目
    pub fn new(name: impl Into<String>, content: impl Into<String>, tags: impl Into<Tags>) -> Self {
        Self {
            name: name.into(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            content: content.into(),
            tags: tags.into(),
        }
    }
}

/// Ranked query result / 查询结果
///
/// `tags` is augmented at query time and may differ from the stored tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    pub name: String,
    /// Best matching snippet of the entry content / 内容片段
    pub content: String,
    /// Comma-joined, query-augmented tags / 查询时扩充的标签
    pub tags: String,
    /// Position of the entry in the store / 条目位置
    pub index: usize,
    pub score: f64,
}
