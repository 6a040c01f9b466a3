//! # PathDB Core
//!
//! An embedded, filesystem-backed key-value store.
//!
//! Keys are dot-delimited hierarchical paths (`"config.network.eth0"`) that
//! map directly onto a directory tree; values are opaque bytes, JSON records,
//! or lists thereof, optionally encrypted with AES-GCM. Every record is kept
//! as a primary file plus a `_bak` shadow copy, and reads transparently heal
//! whichever copy is missing or corrupt from the surviving one.
//!
//! Mutual exclusion between processes and threads is delegated entirely to OS
//! advisory file locks (see [`pathdb_engine`]); there is no central lock
//! manager and no daemon.
//!
//! ## Building blocks
//!
//! - [`Database`] - facade over a root collection
//! - [`Collection`] - directory-scoped handle; derives children, enumerates
//!   and copies/moves/purges subtrees
//! - [`Query`] - get/set/delete against a collection's keys, in raw, JSON
//!   buffer and encrypted forms
//! - [`Index`] - presence set backed by empty marker files under a reserved
//!   `.ix_` namespace
//! - [`Cipher`] - AES-128/256-GCM capability shared across a collection tree
//!
//! ## Example
//!
//! ```no_run
//! use pathdb_core::Database;
//!
//! let db = Database::open("/var/lib/app/store")?;
//! db.set("config.network.host", b"10.0.0.1")?;
//! assert_eq!(db.get("config.network.host")?, b"10.0.0.1");
//!
//! let sensors = db.collection("sensors");
//! for name in sensors.list_children()? {
//!     println!("sensor: {name}");
//! }
//! # Ok::<(), pathdb_core::StoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod crypto;
mod database;
mod dircopy;
mod error;
mod index;
mod query;

pub use collection::Collection;
pub use crypto::Cipher;
pub use database::Database;
pub use error::{StoreError, StoreResult};
pub use index::Index;
pub use query::Query;

pub use pathdb_engine::{Config, EngineError, FileEngine};

/// A structured record payload: a JSON object with dynamically typed fields.
pub type Buffer = serde_json::Map<String, serde_json::Value>;

/// Re-exported JSON value type used inside [`Buffer`] records.
pub use serde_json::Value;

/// Separator between key segments.
pub(crate) const KEY_SEP: char = '.';
/// Suffix of the shadow backup file kept next to every record.
pub(crate) const BAK_SUFFIX: &str = "_bak";
/// Reserved directory prefix for index namespaces.
pub(crate) const INDEX_PREFIX: &str = ".ix_";
