//! Database facade over a root collection.

use crate::collection::Collection;
use crate::error::StoreResult;
use crate::index::Index;
use crate::query::Query;
use crate::Buffer;
use std::path::Path;

/// The main store handle: a root [`Collection`] with a bound root [`Query`].
///
/// `Database` is a convenience facade - everything it does can also be done
/// through collections and queries directly. Opening performs no disk I/O;
/// directories appear lazily on first write.
///
/// # Example
///
/// ```no_run
/// use pathdb_core::Database;
///
/// let db = Database::open("/var/lib/app/store")?;
/// db.set("config.host", b"10.0.0.1")?;
///
/// db.init_aes256("s3cret")?;
/// db.set_secure("config.token", b"charlie-7")?;
/// # Ok::<(), pathdb_core::StoreError>(())
/// ```
#[derive(Debug)]
pub struct Database {
    root: Collection,
    query: Query,
}

impl Database {
    /// Opens a store rooted at `path`. No disk I/O is performed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if the root path is unusable (see
    /// [`Collection::new`]).
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let root = Collection::new(path)?;
        let query = root.query();
        Ok(Self { root, query })
    }

    /// Returns the root collection.
    #[must_use]
    pub fn root(&self) -> &Collection {
        &self.root
    }

    /// Derives the collection at `key`.
    #[must_use]
    pub fn collection(&self, key: &str) -> Collection {
        self.root.child(key)
    }

    /// Opens the index named by `key` under the root.
    #[must_use]
    pub fn index(&self, key: &str) -> Index {
        self.root.index(key)
    }

    /// Returns the root-level query.
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Installs an AES-128-GCM cipher for this store and all handles derived
    /// from it.
    ///
    /// # Errors
    ///
    /// Returns `KeyDerivationFailed` if the secret is rejected.
    pub fn init_aes128(&self, secret: &str) -> StoreResult<()> {
        self.root.init_aes128(secret)
    }

    /// Installs an AES-256-GCM cipher for this store and all handles derived
    /// from it.
    ///
    /// # Errors
    ///
    /// Returns `KeyDerivationFailed` if the secret is rejected.
    pub fn init_aes256(&self, secret: &str) -> StoreResult<()> {
        self.root.init_aes256(secret)
    }

    /// Cancels any lock acquisition currently blocking on the root query.
    pub fn cancel(&self) {
        self.query.cancel();
    }

    /// Returns true iff the primary file for `key` exists.
    #[must_use]
    pub fn is_exist(&self, key: &str) -> bool {
        self.query.is_exist(key)
    }

    /// Reads the raw record at `key`. See [`Query::get`].
    pub fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.query.get(key)
    }

    /// Writes `value` to both copies of `key`. See [`Query::set`].
    pub fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.query.set(key, value)
    }

    /// Removes both copies of `key`. See [`Query::delete`].
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        self.query.delete(key)
    }

    /// Reads the JSON record at `key`. See [`Query::get_buffer`].
    pub fn get_buffer(&self, key: &str) -> StoreResult<Buffer> {
        self.query.get_buffer(key)
    }

    /// Writes a JSON record to `key`. See [`Query::set_buffer`].
    pub fn set_buffer(&self, key: &str, value: &Buffer) -> StoreResult<()> {
        self.query.set_buffer(key, value)
    }

    /// Reads the JSON record list at `key`. See [`Query::get_buffer_list`].
    pub fn get_buffer_list(&self, key: &str) -> StoreResult<Vec<Buffer>> {
        self.query.get_buffer_list(key)
    }

    /// Writes a JSON record list to `key`. See [`Query::set_buffer_list`].
    pub fn set_buffer_list(&self, key: &str, value: &[Buffer]) -> StoreResult<()> {
        self.query.set_buffer_list(key, value)
    }

    /// Reads and decrypts the record at `key`. See [`Query::get_secure`].
    pub fn get_secure(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.query.get_secure(key)
    }

    /// Encrypts and writes `value` to `key`. See [`Query::set_secure`].
    pub fn set_secure(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.query.set_secure(key, value)
    }

    /// Reads an encrypted JSON record. See [`Query::get_secure_buffer`].
    pub fn get_secure_buffer(&self, key: &str) -> StoreResult<Buffer> {
        self.query.get_secure_buffer(key)
    }

    /// Writes an encrypted JSON record. See [`Query::set_secure_buffer`].
    pub fn set_secure_buffer(&self, key: &str, value: &Buffer) -> StoreResult<()> {
        self.query.set_secure_buffer(key, value)
    }

    /// Reads an encrypted JSON record list. See
    /// [`Query::get_secure_buffer_list`].
    pub fn get_secure_buffer_list(&self, key: &str) -> StoreResult<Vec<Buffer>> {
        self.query.get_secure_buffer_list(key)
    }

    /// Writes an encrypted JSON record list. See
    /// [`Query::set_secure_buffer_list`].
    pub fn set_secure_buffer_list(&self, key: &str, value: &[Buffer]) -> StoreResult<()> {
        self.query.set_secure_buffer_list(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::Value;
    use tempfile::tempdir;

    #[test]
    fn open_rejects_filesystem_root() {
        assert!(matches!(
            Database::open("/"),
            Err(StoreError::InvalidPath { .. })
        ));
    }

    #[test]
    fn facade_roundtrip() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("store")).unwrap();

        db.set("a.1.11", b"payload").unwrap();
        assert!(db.is_exist("a.1.11"));
        assert_eq!(db.get("a.1.11").unwrap(), b"payload");

        db.delete("a.1.11").unwrap();
        assert!(!db.is_exist("a.1.11"));
    }

    #[test]
    fn facade_buffers() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("store")).unwrap();

        let mut buf = Buffer::new();
        buf.insert("enabled".to_string(), Value::from(true));
        db.set_buffer("cfg", &buf).unwrap();

        let loaded = db.get_buffer("cfg").unwrap();
        assert_eq!(loaded.get("enabled"), Some(&Value::from(true)));

        db.set_buffer_list("cfgs", &[buf]).unwrap();
        assert_eq!(db.get_buffer_list("cfgs").unwrap().len(), 1);
    }

    #[test]
    fn cipher_shared_with_derived_collections() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("store")).unwrap();

        // Collection derived before the cipher is installed.
        let early = db.collection("devices");

        db.init_aes256("s3cret").unwrap();
        db.set_secure("root.secret", b"r").unwrap();

        // The earlier handle shares the slot by identity.
        early.query().set_secure("k", b"v").unwrap();
        assert_eq!(early.query().get_secure("k").unwrap(), b"v");
    }

    #[test]
    fn secure_before_init_fails_closed() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("store")).unwrap();

        assert!(matches!(
            db.get_secure("k"),
            Err(StoreError::NoSecurity)
        ));
    }

    #[test]
    fn index_under_root() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("store")).unwrap();

        db.index("online").mark("dev-1").unwrap();
        assert!(db.index("online").check("dev-1"));
    }
}
