//! Error types / 错误类型

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the index store, extraction, the indexer and configuration / 错误
#[derive(Debug, Error)]
pub enum FiberError {
    /// Persisted index file does not exist / 索引文件不存在
    #[error("Index file not found: {0}")]
    NotFound(PathBuf),

    /// IO error / IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error (includes invalid UTF-8) / CSV 错误
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Atomic rename of the temporary index file failed / 临时文件重命名失败
    #[error("Failed to persist index file: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// Corrupt docx/pptx container / 压缩包错误
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Malformed Office XML part / XML 解析错误
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Spreadsheet could not be read / 表格读取错误
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// PDF text extraction failed / PDF 提取错误
    #[error("PDF error: {0}")]
    Pdf(String),

    /// JSON (config) error / JSON 错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error / 配置错误
    #[error("Config error: {0}")]
    Config(String),
}

impl FiberError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error means the index file was missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for index operations
pub type Result<T> = std::result::Result<T, FiberError>;
