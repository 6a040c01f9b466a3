//! # PathDB Engine
//!
//! Advisory-locked, bounded-wait file I/O for PathDB.
//!
//! This crate provides the lowest-level I/O abstraction for PathDB. The
//! engine is an **opaque byte mover** - it knows nothing about keys, record
//! pairs, or payload encodings. Those live in `pathdb_core`.
//!
//! ## Design Principles
//!
//! - Every read takes a *shared* OS advisory lock, every write an *exclusive*
//!   one, so handles in different processes serialize through the filesystem
//!   itself rather than through an in-memory mutex
//! - Lock acquisition is non-blocking with a timed retry loop; a zero timeout
//!   fails fast without sleeping
//! - In-flight retry loops can be cancelled from another thread
//! - Locks are released on every exit path via an RAII guard
//!
//! ## Example
//!
//! ```no_run
//! use pathdb_engine::FileEngine;
//! use std::path::Path;
//!
//! let engine = FileEngine::new();
//! engine.write_file(Path::new("/var/lib/app/data/node"), b"payload")?;
//! let data = engine.read_file(Path::new("/var/lib/app/data/node"))?;
//! assert_eq!(&data, b"payload");
//! # Ok::<(), pathdb_engine::EngineError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;

pub use config::Config;
pub use engine::FileEngine;
pub use error::{EngineError, EngineResult};
