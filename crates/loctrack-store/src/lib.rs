//! Append-only local persistence for location samples.
//!
//! This crate provides SQLite-based storage for captured location samples.
//! Samples are written once and never updated or deleted.
//!
//! # Features
//!
//! - Append samples with store-assigned, increasing ids
//! - Fetch the most recent sample
//! - List the full history or everything since a timestamp, newest first
//! - Filtered, paginated queries through [`SampleQuery`]
//!
//! # Example
//!
//! ```no_run
//! use loctrack_store::{SampleQuery, Store};
//!
//! let store = Store::open_default()?;
//!
//! let latest = store.most_recent()?;
//! let page = store.query_samples(&SampleQuery::new().limit(10))?;
//! # Ok::<(), loctrack_store::Error>(())
//! ```

mod error;
mod queries;
mod schema;
mod store;

pub use error::{Error, Result};
pub use queries::SampleQuery;
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/loctrack/samples.db`
/// - macOS: `~/Library/Application Support/loctrack/samples.db`
/// - Windows: `C:\Users\<user>\AppData\Local\loctrack\samples.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("loctrack")
        .join("samples.db")
}
