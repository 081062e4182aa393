//! Shared store handle for concurrent hosts / 并发共享的存储句柄
//!
//! One lock guards the whole store. Reloads build the new store without
//! holding the lock and swap it in at the end, so readers never observe a
//! half-loaded index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;

use super::engine::{DocumentStore, IndexStats};
use super::persist::LoadReport;
use super::schema::QueryHit;
use super::tags::Tags;
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<DocumentStore>>,
}

impl SharedStore {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn query(&self, text: &str, top_n: usize) -> Vec<QueryHit> {
        self.inner.read().query(text, top_n)
    }

    pub fn add_entry(
        &self,
        name: impl Into<String>,
        content: impl Into<String>,
        tags: impl Into<Tags>,
    ) -> usize {
        self.inner.write().add_entry(name, content, tags)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn stats(&self) -> IndexStats {
        self.inner.read().stats()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.inner.read().save(path)
    }

    /// Run `f` with shared access / 只读访问
    pub fn read<R>(&self, f: impl FnOnce(&DocumentStore) -> R) -> R {
        f(&*self.inner.read())
    }

    /// Run `f` with exclusive access / 独占访问
    pub fn write<R>(&self, f: impl FnOnce(&mut DocumentStore) -> R) -> R {
        f(&mut *self.inner.write())
    }

    /// Load `path` into a new store, then swap it in / 重新加载并替换
    ///
    /// The live store is untouched when loading fails.
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let template = self.inner.read().empty_like();
        let (store, report) = template.read_file(path)?;
        *self.inner.write() = store;
        Ok(report)
    }

    /// `reload` on the blocking thread pool / 在后台线程重新加载
    pub fn reload_in_background(&self, path: impl Into<PathBuf>) -> JoinHandle<Result<LoadReport>> {
        let shared = self.clone();
        let path = path.into();
        tokio::task::spawn_blocking(move || {
            let report = shared.reload(&path)?;
            tracing::info!(
                "Background reload of {:?} done: {} entries ({} skipped)",
                path,
                report.loaded,
                report.skipped.len()
            );
            Ok(report)
        })
    }
}
