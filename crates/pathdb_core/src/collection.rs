//! Directory-scoped handles over a subtree of keys.

use crate::crypto::{Cipher, SharedCipher};
use crate::dircopy;
use crate::error::{StoreError, StoreResult};
use crate::index::Index;
use crate::query::Query;
use crate::{INDEX_PREFIX, KEY_SEP};
use parking_lot::RwLock;
use pathdb_engine::Config;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// A directory-scoped handle over a subtree of keys.
///
/// Collections are cheap, stateless-except-config handles: construction does
/// no I/O, children are derived rather than stored, and directories only come
/// into existence on the first successful write beneath them.
///
/// The installed cipher is the one piece of state shared *by identity* across
/// a collection's descendants: every handle derived with [`child`](Self::child)
/// (or bound into a [`Query`]/[`Index`]) sees the same cipher slot, and
/// re-installing overwrites it for all of them.
///
/// # Example
///
/// ```no_run
/// use pathdb_core::Collection;
///
/// let root = Collection::new("/var/lib/app/store")?;
/// let sensors = root.child("sensors.rack1");
/// sensors.query().set("temp", b"21.5")?;
/// # Ok::<(), pathdb_core::StoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Collection {
    base_path: PathBuf,
    cipher: SharedCipher,
}

impl Collection {
    /// Creates a collection rooted at `path`. No I/O is performed.
    ///
    /// The path is lexically cleaned (`.` and `..` components resolved)
    /// before validation, so spellings like `"/tmp/.."` cannot smuggle the
    /// filesystem root past the check.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if the cleaned path is empty or has no parent
    /// distinct from itself (the filesystem root cannot host a collection).
    pub fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = clean_path(path.as_ref());
        if path.as_os_str().is_empty() || path.parent().is_none() {
            return Err(StoreError::invalid_path(path));
        }
        Ok(Self {
            base_path: path,
            cipher: Arc::new(RwLock::new(None)),
        })
    }

    /// Internal constructor for derived handles sharing an existing cipher.
    pub(crate) fn at(base_path: PathBuf, cipher: SharedCipher) -> Self {
        Self { base_path, cipher }
    }

    /// Returns the base directory of this collection.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub(crate) fn cipher(&self) -> &SharedCipher {
        &self.cipher
    }

    /// Resolves a dot-delimited key to a path under the collection base.
    ///
    /// The empty key denotes the base path itself.
    #[must_use]
    pub fn key_path(&self, key: &str) -> PathBuf {
        if key.is_empty() {
            return self.base_path.clone();
        }
        let mut path = self.base_path.clone();
        for segment in key.split(KEY_SEP) {
            path.push(segment);
        }
        path
    }

    /// Returns true if the base path exists and is a directory.
    #[must_use]
    pub fn exists(&self) -> bool {
        fs::metadata(&self.base_path)
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Derives and installs an AES-128-GCM cipher from `secret`.
    ///
    /// The cipher slot is shared: every handle already derived from this
    /// collection starts using the new cipher immediately.
    ///
    /// # Errors
    ///
    /// Returns `KeyDerivationFailed` if the secret is rejected.
    pub fn init_aes128(&self, secret: &str) -> StoreResult<()> {
        let cipher = Cipher::aes128(secret)?;
        *self.cipher.write() = Some(cipher);
        Ok(())
    }

    /// Derives and installs an AES-256-GCM cipher from `secret`.
    ///
    /// # Errors
    ///
    /// Returns `KeyDerivationFailed` if the secret is rejected.
    pub fn init_aes256(&self, secret: &str) -> StoreResult<()> {
        let cipher = Cipher::aes256(secret)?;
        *self.cipher.write() = Some(cipher);
        Ok(())
    }

    /// Derives a child collection at `key`, inheriting the cipher reference.
    /// Pure derivation, no I/O.
    #[must_use]
    pub fn child(&self, key: &str) -> Collection {
        Collection::at(self.key_path(key), Arc::clone(&self.cipher))
    }

    /// Lists the immediate child collections, sorted by name.
    ///
    /// Hidden directories (dot-prefixed, which includes index namespaces)
    /// are excluded, and the traversal does not descend into them.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the base directory cannot be read.
    pub fn list_children(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Lists the indexes directly under this collection, prefix stripped,
    /// sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the base directory cannot be read.
    pub fn list_indexes(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(stripped) = name.strip_prefix(INDEX_PREFIX) {
                names.push(stripped.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Materializes [`list_children`](Self::list_children) into live handles.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the base directory cannot be read.
    pub fn children(&self) -> StoreResult<Vec<Collection>> {
        let names = self.list_children()?;
        Ok(names.iter().map(|name| self.child(name)).collect())
    }

    /// Copies the subtree at `src_key` under `dst_key`.
    ///
    /// The destination is `dst_key` + the last segment of `src_key` and must
    /// not already exist.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for an empty source key, `NotExist` if the source
    /// is absent, `NotADirectory` if it is a regular file, `AlreadyExists` if
    /// the destination is occupied, or an I/O error from the copy itself.
    pub fn copy(&self, src_key: &str, dst_key: &str) -> StoreResult<()> {
        if src_key.is_empty() {
            return Err(StoreError::invalid_key("source key is empty"));
        }

        let src_path = self.key_path(src_key);
        match fs::metadata(&src_path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotExist)
            }
            Err(err) => return Err(err.into()),
            Ok(meta) if !meta.is_dir() => return Err(StoreError::not_a_directory(&src_path)),
            Ok(_) => {}
        }

        let src_base = src_key.rsplit(KEY_SEP).next().unwrap_or(src_key);
        let dst_path = if dst_key.is_empty() {
            self.key_path(src_base)
        } else {
            let mut path = self.key_path(dst_key);
            path.push(src_base);
            path
        };
        if dst_path.exists() {
            return Err(StoreError::already_exists(&dst_path));
        }

        dircopy::copy_dir(&src_path, &dst_path)?;
        Ok(())
    }

    /// Moves the subtree at `src_key` under `dst_key`.
    ///
    /// Implemented as [`copy`](Self::copy) followed by
    /// [`purge`](Self::purge); explicitly non-atomic. A crash between the two
    /// steps leaves both subtrees present.
    ///
    /// # Errors
    ///
    /// Any error from the copy or purge step.
    pub fn move_to(&self, src_key: &str, dst_key: &str) -> StoreResult<()> {
        self.copy(src_key, dst_key)?;
        self.purge(src_key)
    }

    /// Recursively removes the subtree at `key`. No-op if absent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for an empty key, `NotADirectory` if the key
    /// resolves to a regular file, or an I/O error from the removal.
    pub fn purge(&self, key: &str) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::invalid_key("key is empty"));
        }

        let path = self.key_path(key);
        match fs::metadata(&path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
            Ok(meta) if !meta.is_dir() => Err(StoreError::not_a_directory(&path)),
            Ok(_) => {
                fs::remove_dir_all(&path)?;
                Ok(())
            }
        }
    }

    /// Opens a query bound to this collection with default engine settings.
    #[must_use]
    pub fn query(&self) -> Query {
        Query::new(self.clone())
    }

    /// Opens a query with an explicit engine configuration.
    ///
    /// Configuration is per query instance: sibling queries over the same
    /// path may wait for locks with different patience.
    #[must_use]
    pub fn query_with(&self, config: Config) -> Query {
        Query::with_config(self.clone(), config)
    }

    /// Opens the index named by `key`.
    ///
    /// Only the first key segment receives the reserved `.ix_` prefix, so the
    /// index for `"a.b"` lives at `.ix_a/b`. This keeps the index namespace
    /// disjoint from ordinary data keys.
    #[must_use]
    pub fn index(&self, key: &str) -> Index {
        let mut parts = key.split(KEY_SEP);
        let first = parts.next().unwrap_or_default();
        let mut path = self.base_path.join(format!("{INDEX_PREFIX}{first}"));
        for part in parts {
            path.push(part);
        }
        Index::new(Collection::at(path, Arc::clone(&self.cipher)))
    }
}

/// Lexically resolves `.` and `..` components without touching the
/// filesystem. `..` above an absolute root stays at the root; `..` above a
/// relative start is kept.
fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => cleaned.push(Component::ParentDir),
            },
            other => cleaned.push(other),
        }
    }
    cleaned
}
