//! Flat-file persistence / 平面文件持久化
//!
//! File format (CSV, one row per entry, header first) / 文件格式：
//! name,timestamp,content,tags
//!
//! - Fields with a comma, quote or newline are quoted, quotes doubled
//! - `tags` is one comma-joined field; legacy `[...]` list literals are accepted on load
//! - Rows written as a single tab-separated field are recovered
//! - Saving writes a temp file next to the target and renames it over the target
//! - Loading builds a fresh store and only replaces the live one on success

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::engine::DocumentStore;
use super::schema::Entry;
use super::tags::RawTags;
use crate::error::{FiberError, Result};

/// Header row / 表头
pub const HEADER: [&str; 4] = ["name", "timestamp", "content", "tags"];

/// Why a row was skipped / 行被跳过的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("empty field '{0}'")]
    EmptyField(&'static str),
}

/// A row that was skipped during load / 被跳过的行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the file
    pub line: u64,
    pub error: RowError,
}

/// Outcome of a load / 加载结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Column positions resolved from the header
#[derive(Debug, Clone, Copy)]
enum Layout {
    Columns {
        name: Option<usize>,
        timestamp: Option<usize>,
        content: Option<usize>,
        tags: Option<usize>,
    },
    /// Whole file written as tab-separated lines
    TabSeparated,
}

impl Layout {
    fn resolve(headers: &StringRecord) -> Self {
        let position = |column: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == column)
        };

        if headers.len() == 1 {
            let fields: Vec<&str> = headers[0]
                .trim_start_matches('\u{feff}')
                .split('\t')
                .map(str::trim)
                .collect();
            if fields == HEADER {
                return Layout::TabSeparated;
            }
        }

        Layout::Columns {
            name: position("name"),
            timestamp: position("timestamp"),
            content: position("content"),
            tags: position("tags"),
        }
    }

    fn parse(&self, record: &StringRecord) -> std::result::Result<Entry, RowError> {
        match *self {
            // The reader split on commas inside content; put them back
            Layout::TabSeparated => {
                parse_tab_separated(&record.iter().collect::<Vec<_>>().join(","))
            }
            Layout::Columns {
                name,
                timestamp,
                content,
                tags,
            } => {
                // A single tab-joined field inside a comma file
                if record.len() == 1 {
                    if let Some(line) = record.get(0).filter(|line| line.split('\t').count() == 4) {
                        return parse_tab_separated(line);
                    }
                }

                let field = |position: Option<usize>, column: &'static str| {
                    position
                        .and_then(|i| record.get(i))
                        .ok_or(RowError::MissingField(column))
                };
                build_entry(
                    field(name, "name")?,
                    field(timestamp, "timestamp")?,
                    field(content, "content")?,
                    field(tags, "tags")?,
                )
            }
        }
    }
}

fn parse_tab_separated(line: &str) -> std::result::Result<Entry, RowError> {
    let mut fields = line.split('\t');
    let mut next = |column: &'static str| fields.next().ok_or(RowError::MissingField(column));
    let name = next("name")?;
    let timestamp = next("timestamp")?;
    let content = next("content")?;
    let tags = next("tags")?;
    build_entry(name, timestamp, content, tags)
}

fn build_entry(
    name: &str,
    timestamp: &str,
    content: &str,
    tags: &str,
) -> std::result::Result<Entry, RowError> {
    if name.trim().is_empty() {
        return Err(RowError::EmptyField("name"));
    }
    if content.trim().is_empty() {
        return Err(RowError::EmptyField("content"));
    }

    Ok(Entry {
        name: name.to_string(),
        timestamp: timestamp.to_string(),
        content: content.to_string(),
        tags: RawTags::classify(tags).resolve(),
    })
}

impl DocumentStore {
    /// Write every entry to `path`, replacing it atomically / 保存到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = WriterBuilder::new().from_writer(temp.as_file());
            writer.write_record(HEADER)?;
            for entry in self.entries() {
                let tags = entry.tags.joined();
                writer.write_record([
                    entry.name.as_str(),
                    entry.timestamp.as_str(),
                    entry.content.as_str(),
                    tags.as_str(),
                ])?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        // Temp files are created owner-only; keep the mode of the file being replaced
        if let Ok(metadata) = std::fs::metadata(path) {
            temp.as_file().set_permissions(metadata.permissions())?;
        }
        temp.persist(path)?;

        tracing::info!("Saved {} entries to {:?}", self.len(), path);
        Ok(())
    }

    /// Read `path` into a new store with the same settings, leaving `self` alone / 读取文件到新存储
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<(DocumentStore, LoadReport)> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FiberError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(BufReader::new(file));
        let layout = Layout::resolve(reader.headers()?);

        let mut store = self.empty_like();
        let mut report = LoadReport::default();
        let mut record = StringRecord::new();

        // IO and UTF-8 errors abort the whole load
        while reader.read_record(&mut record)? {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            match layout.parse(&record) {
                Ok(entry) => {
                    store.push_entry(entry);
                    report.loaded += 1;
                }
                Err(error) => {
                    tracing::warn!("Skipped malformed row at line {} of {:?}: {}", line, path, error);
                    report.skipped.push(SkippedRow { line, error });
                }
            }
        }

        Ok((store, report))
    }

    /// Replace the store with the contents of `path` / 从文件加载
    ///
    /// On any error the current contents are kept.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let path = path.as_ref();
        let (store, report) = self.read_file(path)?;
        *self = store;

        tracing::info!(
            "Loaded {} entries from {:?} ({} skipped)",
            report.loaded,
            path,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Load `path`, or start empty when it does not exist / 加载或新建
    ///
    /// Returns `None` when the file was missing.
    pub fn load_or_create(&mut self, path: impl AsRef<Path>) -> Result<Option<LoadReport>> {
        let path = path.as_ref();
        match self.load_from_file(path) {
            Ok(report) => Ok(Some(report)),
            Err(FiberError::NotFound(_)) => {
                tracing::info!("{:?} not found, starting with an empty index", path);
                *self = self.empty_like();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
