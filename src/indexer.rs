//! Corpus indexer - feeds document lines into the store / 语料索引器
//!
//! - Walks the corpus directory recursively, sorted by file name so runs are repeatable
//! - Symlinked directories are not followed; symlinked files are read
//! - Text comes from `crate::extract` (plain text, docx, pptx, spreadsheets, pdf)
//! - One entry per trimmed, non-blank line, tagged with its keywords
//! - `(file name, line)` pairs already in the store are skipped
//! - An unreadable directory entry or file is logged and counted, the run goes on

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use walkdir::WalkDir;

use crate::config::IndexerConfig;
use crate::error::Result;
use crate::extract::extract_text;
use crate::search::{detect_language, DocumentStore};

/// Result of an indexing run / 索引运行结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    pub files_processed: usize,
    pub files_failed: usize,
    pub entries_added: usize,
    pub duplicates_skipped: usize,
}

/// Corpus indexer / 语料索引器
#[derive(Debug, Clone)]
pub struct CorpusIndexer {
    extensions: HashSet<String>,
}

impl CorpusIndexer {
    pub fn new(config: &IndexerConfig) -> Self {
        Self::with_extensions(&config.extensions)
    }

    pub fn with_extensions<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Whether a file has one of the configured extensions / 是否为支持的文件类型
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Ingest every supported file under `corpus_dir` into `store` / 索引语料目录
    pub fn run(&self, store: &mut DocumentStore, corpus_dir: &Path) -> Result<IndexSummary> {
        let mut seen: HashSet<(String, String)> = store
            .entries()
            .iter()
            .map(|entry| (entry.name.clone(), entry.content.clone()))
            .collect();
        if !seen.is_empty() {
            tracing::info!("Existing index has {} entries, duplicates will be skipped", seen.len());
        }

        // A missing corpus is an error, not an empty run
        std::fs::metadata(corpus_dir)?;

        let mut summary = IndexSummary::default();
        for item in WalkDir::new(corpus_dir).follow_links(false).sort_by_file_name() {
            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    summary.files_failed += 1;
                    tracing::warn!("Failed to read {:?}: {}", e.path().unwrap_or(corpus_dir), e);
                    continue;
                }
            };

            let path = entry.path();
            // Directories and symlinks to directories are skipped here
            if !path.is_file() || !self.accepts(path) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();

            match extract_text(path) {
                Ok(text) => {
                    let before = summary.entries_added;
                    ingest_text(store, &name, &text, &mut seen, &mut summary);
                    summary.files_processed += 1;
                    tracing::info!("Processed {}: {} entries indexed", name, summary.entries_added - before);
                }
                Err(e) => {
                    summary.files_failed += 1;
                    tracing::warn!("Failed to process {}: {}", name, e);
                }
            }
        }

        tracing::info!(
            "Indexed {} entries from {:?} ({} files, {} failed, {} duplicates)",
            summary.entries_added,
            corpus_dir,
            summary.files_processed,
            summary.files_failed,
            summary.duplicates_skipped
        );
        Ok(summary)
    }

    /// Load `index_file` (if any), ingest the corpus, save back / 索引并保存
    pub fn index_into_file(
        &self,
        store: &mut DocumentStore,
        corpus_dir: &Path,
        index_file: &Path,
    ) -> Result<IndexSummary> {
        store.load_or_create(index_file)?;
        let summary = self.run(store, corpus_dir)?;

        if let Some(parent) = index_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        store.save(index_file)?;
        Ok(summary)
    }
}

/// Add one entry per new non-blank line
fn ingest_text(
    store: &mut DocumentStore,
    name: &str,
    text: &str,
    seen: &mut HashSet<(String, String)>,
    summary: &mut IndexSummary,
) {
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if !seen.insert((name.to_string(), line.to_string())) {
            summary.duplicates_skipped += 1;
            continue;
        }
        let keywords = store
            .tokenizer()
            .extract_keywords(line, detect_language(line));
        store.add_entry(name, line, keywords);
        summary.entries_added += 1;
    }
}
