pub mod config;
pub mod error;
pub mod extract;
pub mod indexer;
pub mod search;

pub use error::{FiberError, Result};
pub use search::{DocumentStore, QueryHit, SharedStore};
