//! Presence sets backed by empty marker files.

use crate::collection::Collection;
use crate::error::StoreResult;
use crate::KEY_SEP;
use pathdb_engine::FileEngine;
use std::fs;
use std::io;

/// A named presence set under a collection's reserved `.ix_` namespace.
///
/// Members are empty marker files named by the member value; sub-indexes are
/// nested directories. Built with [`Collection::index`]: the index for key
/// `"a.b"` lives at `.ix_a/b`, so indexes can never collide with ordinary
/// data keys.
///
/// All membership operations are idempotent.
///
/// # Example
///
/// ```no_run
/// use pathdb_core::Collection;
///
/// let col = Collection::new("/var/lib/app/store")?;
/// let online = col.index("devices.online");
/// online.mark("dev-17")?;
/// assert!(online.check("dev-17"));
/// # Ok::<(), pathdb_core::StoreError>(())
/// ```
#[derive(Debug)]
pub struct Index {
    collection: Collection,
    engine: FileEngine,
}

impl Index {
    pub(crate) fn new(collection: Collection) -> Self {
        Self {
            collection,
            engine: FileEngine::new(),
        }
    }

    /// Adds `value` to the set by touching its marker file.
    ///
    /// # Errors
    ///
    /// Returns an engine error if the marker cannot be created.
    pub fn mark(&self, value: &str) -> StoreResult<()> {
        self.engine
            .touch_file(&self.collection.key_path(value))
            .map_err(Into::into)
    }

    /// Returns true if `value` is in the set.
    #[must_use]
    pub fn check(&self, value: &str) -> bool {
        self.engine.file_exists(&self.collection.key_path(value))
    }

    /// Removes `value` from the set. No-op if absent.
    ///
    /// # Errors
    ///
    /// Returns an engine error if a present marker cannot be removed.
    pub fn clear(&self, value: &str) -> StoreResult<()> {
        self.collection.query().delete(value)
    }

    /// Lists all marked values, sorted.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the index directory cannot be read.
    pub fn list(&self) -> StoreResult<Vec<String>> {
        self.collection.query().keys()
    }

    /// Lists the sub-indexes nested under this index, sorted.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the index directory cannot be read.
    pub fn list_indexes(&self) -> StoreResult<Vec<String>> {
        self.collection.list_children()
    }

    /// Removes `value` from every sub-index of this index, best effort.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the sub-indexes cannot be enumerated;
    /// individual clear failures are logged and skipped.
    pub fn clear_all(&self, value: &str) -> StoreResult<()> {
        for name in self.list_indexes()? {
            let key = format!("{name}{KEY_SEP}{value}");
            if let Err(err) = self.collection.query().delete(&key) {
                tracing::debug!(key, error = %err, "sub-index clear failed");
            }
        }
        Ok(())
    }

    /// Deletes the entire index subtree, sub-indexes included. No-op if the
    /// index was never materialized.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the removal.
    pub fn purge(&self) -> StoreResult<()> {
        match fs::remove_dir_all(self.collection.base_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn root(dir: &tempfile::TempDir) -> Collection {
        Collection::new(dir.path().join("store")).unwrap()
    }

    #[test]
    fn mark_check_clear() {
        let dir = tempdir().unwrap();
        let index = root(&dir).index("tags");

        index.mark("KEY").unwrap();
        assert!(index.check("KEY"));
        assert!(index.list().unwrap().contains(&"KEY".to_string()));

        index.clear("KEY").unwrap();
        assert!(!index.check("KEY"));
        assert!(!index.list().unwrap().contains(&"KEY".to_string()));

        // Idempotent operations.
        index.mark("KEY").unwrap();
        index.mark("KEY").unwrap();
        index.clear("KEY").unwrap();
        index.clear("KEY").unwrap();
    }

    #[test]
    fn naming_rule_prefixes_first_segment_only() {
        let dir = tempdir().unwrap();
        let col = root(&dir);

        col.index("a.b").mark("v").unwrap();

        let expected = col.base_path().join(".ix_a").join("b").join("v");
        assert!(expected.is_file());
    }

    #[test]
    fn markers_are_empty_files() {
        let dir = tempdir().unwrap();
        let col = root(&dir);
        col.index("tags").mark("v1").unwrap();

        let marker = col.base_path().join(".ix_tags").join("v1");
        assert_eq!(fs::metadata(marker).unwrap().len(), 0);
    }

    #[test]
    fn list_excludes_sub_indexes() {
        let dir = tempdir().unwrap();
        let col = root(&dir);

        col.index("tags").mark("v1").unwrap();
        col.index("tags.nested").mark("v2").unwrap();

        let index = col.index("tags");
        assert_eq!(index.list().unwrap(), vec!["v1"]);
        assert_eq!(index.list_indexes().unwrap(), vec!["nested"]);
    }

    #[test]
    fn clear_all_sweeps_sub_indexes() {
        let dir = tempdir().unwrap();
        let col = root(&dir);

        col.index("tags.red").mark("KEY").unwrap();
        col.index("tags.blue").mark("KEY").unwrap();
        col.index("tags.blue").mark("OTHER").unwrap();

        col.index("tags").clear_all("KEY").unwrap();

        assert!(!col.index("tags.red").check("KEY"));
        assert!(!col.index("tags.blue").check("KEY"));
        assert!(col.index("tags.blue").check("OTHER"));
    }

    #[test]
    fn purge_removes_index_subtree() {
        let dir = tempdir().unwrap();
        let col = root(&dir);

        // Anchor the base dir so listing works after the purge.
        col.query().set("data.k", b"v").unwrap();
        col.index("tags").mark("v1").unwrap();
        assert_eq!(col.list_indexes().unwrap(), vec!["tags"]);

        col.index("tags").purge().unwrap();
        assert!(col.list_indexes().unwrap().is_empty());

        // Purging an absent index is a no-op.
        col.index("tags").purge().unwrap();
    }
}
