//! Application configuration module / 应用配置模块
//!
//! Manages configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{FiberError, Result};
use crate::search::ranking::DEFAULT_SNIPPET_LENGTH;

/// Global configuration instance / 全局配置实例
static CONFIG: OnceCell<Arc<RwLock<AppConfig>>> = OnceCell::new();

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Index file location / 索引文件位置
    pub storage: StorageConfig,
    /// Query defaults / 查询默认值
    pub search: SearchConfig,
    /// Corpus ingestion / 语料索引
    pub indexer: IndexerConfig,
}

/// Storage configuration / 存储配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory path / 数据目录路径
    pub data_dir: String,
    /// Index file (relative to data_dir) / 索引文件
    pub index_file: String,
}

/// Search configuration / 搜索配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results returned when no count is given / 默认返回结果数
    pub default_top_n: usize,
    /// Snippet window in tokens / 片段长度
    pub snippet_length: usize,
}

/// Indexer configuration / 索引器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Directory walked by `index` / 语料目录
    pub corpus_dir: String,
    /// File extensions to ingest, lowercase, without dot / 支持的扩展名
    pub extensions: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            index_file: "arcana_index.csv".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_n: 5,
            snippet_length: DEFAULT_SNIPPET_LENGTH,
        }
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            corpus_dir: "cache".to_string(),
            extensions: ["txt", "md", "csv", "docx", "pptx", "xls", "xlsx", "pdf"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl AppConfig {
    /// Get the full data directory path / 获取数据目录路径
    pub fn get_data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    /// Get the full index file path / 获取索引文件路径
    pub fn get_index_path(&self) -> PathBuf {
        self.get_data_dir().join(&self.storage.index_file)
    }

    /// Get the corpus directory / 获取语料目录
    pub fn get_corpus_dir(&self) -> PathBuf {
        PathBuf::from(&self.indexer.corpus_dir)
    }
}

/// Get the default config file path / 获取配置文件路径
pub fn default_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config(config_path: &Path) -> Result<AppConfig> {
    if config_path.exists() {
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| FiberError::config(format!("Failed to read config file: {}", e)))?;

        let config: AppConfig = serde_json::from_str(&content)?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        let config = AppConfig::default();
        save_config(&config, config_path)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config: &AppConfig, config_path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;

    std::fs::write(config_path, content)
        .map_err(|e| FiberError::config(format!("Failed to write config file: {}", e)))?;

    Ok(())
}

/// Initialize global configuration / 初始化全局配置
pub fn init_config(config_path: &Path) -> Result<Arc<RwLock<AppConfig>>> {
    let config = load_config(config_path)?;

    let config_arc = Arc::new(RwLock::new(config));

    CONFIG
        .set(config_arc.clone())
        .map_err(|_| FiberError::config("Config already initialized"))?;

    Ok(config_arc)
}

/// Get global configuration instance / 获取全局配置实例
pub fn get_config() -> Arc<RwLock<AppConfig>> {
    CONFIG
        .get_or_init(|| {
            let config = load_config(&default_config_path()).unwrap_or_default();
            Arc::new(RwLock::new(config))
        })
        .clone()
}

/// Get a read-only snapshot of current config / 获取当前配置的只读快照
pub fn config() -> AppConfig {
    get_config().read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let config = load_config(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "search": { "default_top_n": 12 } }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.search.default_top_n, 12);
        assert_eq!(config.search.snippet_length, DEFAULT_SNIPPET_LENGTH);
        assert_eq!(config.get_index_path(), PathBuf::from("data").join("arcana_index.csv"));
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(load_config(&path), Err(FiberError::Json(_))));
    }
}
