//! Key-addressed record operations with dual-file redundancy.
//!
//! Every record is physically two files: the primary (`<key>`) and a shadow
//! backup (`<key>_bak`). Writes update both; reads prefer the primary and
//! fall back to the backup, opportunistically rewriting whichever copy was
//! missing or bad ("heal-on-read"). The two writes of a pair are independent
//! lock/write cycles - no lock spans both - so a reader racing exactly
//! between them may transiently observe a stale backup. The heal protocol
//! recovers from that; it does not prevent it.

use crate::collection::Collection;
use crate::crypto::Cipher;
use crate::error::{StoreError, StoreResult};
use crate::{Buffer, BAK_SUFFIX};
use pathdb_engine::{Config, FileEngine};
use std::fs;
use std::path::{Path, PathBuf};

/// A bound store instance: get/set/delete against one collection's keys.
///
/// Each query carries its own [`FileEngine`] and therefore its own lock
/// timeout policy and cancellation flag; sibling queries over the same
/// collection do not share either.
///
/// # Example
///
/// ```no_run
/// use pathdb_core::Collection;
///
/// let col = Collection::new("/var/lib/app/store")?;
/// let query = col.query();
/// query.set("device.serial", b"A-1021")?;
/// assert!(query.is_exist("device.serial"));
/// # Ok::<(), pathdb_core::StoreError>(())
/// ```
#[derive(Debug)]
pub struct Query {
    engine: FileEngine,
    collection: Collection,
}

impl Query {
    pub(crate) fn new(collection: Collection) -> Self {
        Self::with_config(collection, Config::default())
    }

    pub(crate) fn with_config(collection: Collection, config: Config) -> Self {
        Self {
            engine: FileEngine::with_config(config),
            collection,
        }
    }

    /// Returns the underlying file engine.
    #[must_use]
    pub fn engine(&self) -> &FileEngine {
        &self.engine
    }

    /// Cancels any lock acquisition currently blocking on this query.
    pub fn cancel(&self) {
        self.engine.cancel();
    }

    /// Primary and backup paths for `key`.
    fn paths(&self, key: &str) -> (PathBuf, PathBuf) {
        (
            self.collection.key_path(key),
            self.collection.key_path(&format!("{key}{BAK_SUFFIX}")),
        )
    }

    /// Lists the keys stored directly in this collection, sorted.
    ///
    /// Backup files and subdirectories are excluded.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the collection directory cannot be read.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(self.collection.base_path())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(BAK_SUFFIX) {
                keys.push(name);
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Returns true iff the primary file for `key` exists.
    ///
    /// A surviving backup alone does not count here, but it still feeds
    /// [`get`](Self::get)'s recovery path.
    #[must_use]
    pub fn is_exist(&self, key: &str) -> bool {
        self.engine.file_exists(&self.collection.key_path(key))
    }

    /// Reads the raw record at `key`.
    ///
    /// # Errors
    ///
    /// Returns `NotExist` if neither copy exists, otherwise the most recent
    /// failure from the read chain.
    pub fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.read_healed(key, |raw| Ok(raw.to_vec()))
    }

    /// Writes `value` to both copies of `key`.
    ///
    /// The primary is written first; if that fails the backup is not
    /// attempted. A backup failure after a successful primary write is
    /// surfaced: the record is stored, but redundancy was not established.
    ///
    /// # Errors
    ///
    /// Returns the engine error of the failing write.
    pub fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let (primary, backup) = self.paths(key);
        self.engine.write_file(&primary, value)?;
        self.engine.write_file(&backup, value)?;
        Ok(())
    }

    /// Removes both copies of `key`. No-op if neither exists.
    ///
    /// # Errors
    ///
    /// Returns the engine error of a failing primary purge; a backup purge
    /// failure is logged and ignored.
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        let (primary, backup) = self.paths(key);
        if self.engine.file_exists(&backup) {
            if let Err(err) = self.engine.purge_file(&backup) {
                tracing::debug!(key, error = %err, "backup purge failed");
            }
        }
        if self.engine.file_exists(&primary) {
            self.engine.purge_file(&primary)?;
        }
        Ok(())
    }

    /// Reads the JSON record at `key`.
    ///
    /// A copy is good only if both the raw read and the JSON decode succeed;
    /// a primary that reads fine but fails to decode triggers backup
    /// fallback exactly like a read failure.
    ///
    /// # Errors
    ///
    /// `NotExist`, `Decode`, or an engine error.
    pub fn get_buffer(&self, key: &str) -> StoreResult<Buffer> {
        self.read_healed(key, |raw| Ok(serde_json::from_slice(raw)?))
    }

    /// Reads the JSON record list at `key`.
    ///
    /// # Errors
    ///
    /// `NotExist`, `Decode`, or an engine error.
    pub fn get_buffer_list(&self, key: &str) -> StoreResult<Vec<Buffer>> {
        self.read_healed(key, |raw| Ok(serde_json::from_slice(raw)?))
    }

    /// Writes a JSON record to `key` (pretty-printed on disk).
    ///
    /// # Errors
    ///
    /// `Encode` on encoding failure, or the error of the failing write.
    pub fn set_buffer(&self, key: &str, value: &Buffer) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(value).map_err(StoreError::Encode)?;
        self.set(key, &data)
    }

    /// Writes a JSON record list to `key` (pretty-printed on disk).
    ///
    /// # Errors
    ///
    /// `Encode` on encoding failure, or the error of the failing write.
    pub fn set_buffer_list(&self, key: &str, value: &[Buffer]) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(value).map_err(StoreError::Encode)?;
        self.set(key, &data)
    }

    /// Reads and decrypts the record at `key`.
    ///
    /// A copy is good only if read *and* authenticated decryption succeed.
    /// Heal writes carry the ciphertext, never the plaintext.
    ///
    /// # Errors
    ///
    /// `NoSecurity` (before any disk I/O) if no cipher is installed;
    /// otherwise `NotExist`, `DecryptionFailed`, or an engine error.
    pub fn get_secure(&self, key: &str) -> StoreResult<Vec<u8>> {
        let cipher = self.cipher_snapshot()?;
        self.read_healed(key, |raw| cipher.decrypt(raw))
    }

    /// Encrypts `value` and writes it to both copies of `key`.
    ///
    /// # Errors
    ///
    /// `NoSecurity`, `EncryptionFailed`, or the error of the failing write.
    pub fn set_secure(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let cipher = self.cipher_snapshot()?;
        let data = cipher.encrypt(value)?;
        self.set(key, &data)
    }

    /// Reads, decrypts and JSON-decodes the record at `key`.
    ///
    /// # Errors
    ///
    /// `NoSecurity`, `NotExist`, `DecryptionFailed`, `Decode`, or an engine
    /// error.
    pub fn get_secure_buffer(&self, key: &str) -> StoreResult<Buffer> {
        let cipher = self.cipher_snapshot()?;
        self.read_healed(key, |raw| {
            let plain = cipher.decrypt(raw)?;
            Ok(serde_json::from_slice(&plain)?)
        })
    }

    /// Reads, decrypts and JSON-decodes the record list at `key`.
    ///
    /// # Errors
    ///
    /// `NoSecurity`, `NotExist`, `DecryptionFailed`, `Decode`, or an engine
    /// error.
    pub fn get_secure_buffer_list(&self, key: &str) -> StoreResult<Vec<Buffer>> {
        let cipher = self.cipher_snapshot()?;
        self.read_healed(key, |raw| {
            let plain = cipher.decrypt(raw)?;
            Ok(serde_json::from_slice(&plain)?)
        })
    }

    /// JSON-encodes (compact), encrypts and writes a record to `key`.
    ///
    /// # Errors
    ///
    /// `NoSecurity`, `Encode`, `EncryptionFailed`, or the error of the
    /// failing write.
    pub fn set_secure_buffer(&self, key: &str, value: &Buffer) -> StoreResult<()> {
        let data = serde_json::to_vec(value).map_err(StoreError::Encode)?;
        self.set_secure(key, &data)
    }

    /// JSON-encodes (compact), encrypts and writes a record list to `key`.
    ///
    /// # Errors
    ///
    /// `NoSecurity`, `Encode`, `EncryptionFailed`, or the error of the
    /// failing write.
    pub fn set_secure_buffer_list(&self, key: &str, value: &[Buffer]) -> StoreResult<()> {
        let data = serde_json::to_vec(value).map_err(StoreError::Encode)?;
        self.set_secure(key, &data)
    }

    /// Takes a clone of the installed cipher out of the shared slot.
    ///
    /// The slot lock is released before any file I/O starts, so a concurrent
    /// cipher re-install never waits behind a locked read/heal cycle. An
    /// operation keeps using the cipher it snapshotted.
    ///
    /// # Errors
    ///
    /// `NoSecurity` if no cipher is installed.
    fn cipher_snapshot(&self) -> StoreResult<Cipher> {
        self.collection
            .cipher()
            .read()
            .clone()
            .ok_or(StoreError::NoSecurity)
    }

    /// The dual-file read protocol.
    ///
    /// Try the primary: on a good read-and-decode, heal the backup and
    /// return. Otherwise try the backup: on success, heal the primary and
    /// return. `NotExist` only when neither copy exists; otherwise the last
    /// failure encountered.
    fn read_healed<T, F>(&self, key: &str, decode: F) -> StoreResult<T>
    where
        F: Fn(&[u8]) -> StoreResult<T>,
    {
        let (primary, backup) = self.paths(key);
        let mut last_err = StoreError::NotExist;

        if self.engine.file_exists(&primary) {
            match self.read_copy(&primary, &decode) {
                Ok((raw, value)) => {
                    self.heal(&backup, &raw);
                    return Ok(value);
                }
                Err(err) => last_err = err,
            }
        }

        if self.engine.file_exists(&backup) {
            match self.read_copy(&backup, &decode) {
                Ok((raw, value)) => {
                    tracing::debug!(key, "record recovered from backup copy");
                    self.heal(&primary, &raw);
                    return Ok(value);
                }
                Err(err) => last_err = err,
            }
        }

        Err(last_err)
    }

    /// Reads one copy and runs the full decode chain over it.
    fn read_copy<T, F>(&self, path: &Path, decode: &F) -> StoreResult<(Vec<u8>, T)>
    where
        F: Fn(&[u8]) -> StoreResult<T>,
    {
        let raw = self.engine.read_file(path)?;
        let value = decode(&raw)?;
        Ok((raw, value))
    }

    /// Best-effort rewrite of the bad copy from the good one's raw bytes.
    ///
    /// Failures are logged and discarded so a successful read is never turned
    /// into an error by a failed opportunistic heal.
    fn heal(&self, path: &Path, raw: &[u8]) {
        if let Err(err) = self.engine.write_file(path, raw) {
            tracing::warn!(path = %path.display(), error = %err, "heal write failed");
        }
    }
}
