//! Advisory-locked file operations with a timed, cancellable retry loop.

use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

/// Lock flavor requested by an operation.
#[derive(Debug, Clone, Copy)]
enum LockMode {
    /// Shared lock for reads.
    Shared,
    /// Exclusive lock for writes.
    Exclusive,
}

/// Releases the advisory lock when dropped.
///
/// Holding the guard ties the lock lifetime to the caller's scope, so every
/// exit path of an operation - success or error - releases the lock.
struct LockGuard<'f> {
    file: &'f File,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        // Fully qualified: `File` grew inherent locking methods on newer
        // toolchains and they must not shadow the fs2 ones.
        let _ = fs2::FileExt::unlock(self.file);
    }
}

/// Byte-level file I/O guarded by OS advisory locks.
///
/// Reads take a shared lock, writes an exclusive one. Lock acquisition is
/// non-blocking with a configurable retry loop: on contention the engine
/// polls until the lock is granted, the deadline passes (`LockTimeout`), or
/// [`cancel`](Self::cancel) is called from another thread (`Cancelled`).
///
/// Two engines addressing the same path - in the same process or not -
/// serialize through the OS lock, not through any in-memory state. The
/// cancellation flag is the only mutable state an engine carries, so all
/// operations take `&self` and the engine is freely shareable across threads.
///
/// # Example
///
/// ```no_run
/// use pathdb_engine::{Config, FileEngine};
/// use std::path::Path;
/// use std::time::Duration;
///
/// // Fail fast instead of waiting on contended locks.
/// let engine = FileEngine::with_config(Config::new().op_timeout(Duration::ZERO));
/// let data = engine.read_file(Path::new("/var/lib/app/data/node"))?;
/// # Ok::<(), pathdb_engine::EngineError>(())
/// ```
#[derive(Debug)]
pub struct FileEngine {
    config: Config,
    cancelled: AtomicBool,
}

impl Default for FileEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FileEngine {
    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an engine with the given configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns true if `path` exists and is a regular file.
    ///
    /// A path that exists as a directory is reported as absent; callers that
    /// care about directories check them explicitly.
    #[must_use]
    pub fn file_exists(&self, path: &Path) -> bool {
        fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
    }

    /// Reads the full contents of `path` under a shared lock.
    ///
    /// # Errors
    ///
    /// Returns `Read` if the file cannot be opened or read, `LockTimeout` if
    /// the lock stayed contended past the configured deadline, or `Cancelled`
    /// if [`cancel`](Self::cancel) fired while waiting.
    pub fn read_file(&self, path: &Path) -> EngineResult<Vec<u8>> {
        let file = File::open(path).map_err(EngineError::Read)?;
        let _lock = self.acquire(&file, LockMode::Shared)?;

        let mut data = Vec::new();
        let mut reader = &file;
        reader.read_to_end(&mut data).map_err(EngineError::Read)?;
        Ok(data)
    }

    /// Writes `data` to `path` under an exclusive lock, truncating any
    /// previous contents.
    ///
    /// Missing parent directories are created first with the configured
    /// directory permission bits; the file itself is created with the
    /// configured file permission bits.
    ///
    /// # Errors
    ///
    /// Returns `Write`, `LockTimeout` or `Cancelled`.
    pub fn write_file(&self, path: &Path, data: &[u8]) -> EngineResult<()> {
        if !self.file_exists(path) {
            if let Some(parent) = path.parent() {
                self.create_dir_tree(parent).map_err(EngineError::Write)?;
            }
        }

        let file = self
            .write_options(true)
            .open(path)
            .map_err(EngineError::Write)?;
        let _lock = self.acquire(&file, LockMode::Exclusive)?;

        let mut writer = &file;
        writer.write_all(data).map_err(EngineError::Write)?;
        Ok(())
    }

    /// Creates `path` as an empty file if it does not exist.
    ///
    /// Existing contents are left untouched. Missing parent directories are
    /// created first. Used for index marker files.
    ///
    /// # Errors
    ///
    /// Returns `Write` if the directory tree or file cannot be created.
    pub fn touch_file(&self, path: &Path) -> EngineResult<()> {
        if !self.file_exists(path) {
            if let Some(parent) = path.parent() {
                self.create_dir_tree(parent).map_err(EngineError::Write)?;
            }
        }

        self.write_options(false)
            .open(path)
            .map_err(EngineError::Write)?;
        Ok(())
    }

    /// Removes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Purge` on any removal failure, including a missing file.
    /// Callers in this system test existence first and purge only when
    /// present.
    pub fn purge_file(&self, path: &Path) -> EngineResult<()> {
        fs::remove_file(path).map_err(EngineError::Purge)
    }

    /// Cancels any in-flight or future lock retry loop on this engine.
    ///
    /// The signal is one-shot: the flag is cleared again at the start of each
    /// new lock acquisition, so cancellation applies to "the next attempt
    /// sequence", it does not disable the engine.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Acquires an advisory lock on `file`, polling until success, deadline
    /// or cancellation.
    fn acquire<'f>(&self, file: &'f File, mode: LockMode) -> EngineResult<LockGuard<'f>> {
        self.cancelled.store(false, Ordering::SeqCst);
        let deadline = Instant::now() + self.config.op_timeout;

        loop {
            let attempt = match mode {
                LockMode::Shared => fs2::FileExt::try_lock_shared(file),
                LockMode::Exclusive => fs2::FileExt::try_lock_exclusive(file),
            };
            match attempt {
                Ok(()) => return Ok(LockGuard { file }),
                Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                    if self.config.op_timeout.is_zero() {
                        // Fail-fast mode: no sleep on the contended path.
                        return Err(EngineError::LockTimeout);
                    }
                    tracing::trace!(mode = ?mode, "lock contended, polling");
                }
                Err(err) => return Err(EngineError::Lock(err)),
            }

            thread::sleep(self.config.op_polling);
            if self.cancelled.load(Ordering::SeqCst) {
                return Err(EngineError::Cancelled);
            }
            if Instant::now() >= deadline {
                return Err(EngineError::LockTimeout);
            }
        }
    }

    /// Creates `dir` and any missing ancestors with the configured
    /// directory permission bits.
    fn create_dir_tree(&self, dir: &Path) -> std::io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(self.config.dir_perm);
        }
        builder.create(dir)
    }

    /// Open options for writes, with the configured file permission bits.
    fn write_options(&self, truncate: bool) -> OpenOptions {
        let mut opts = OpenOptions::new();
        opts.write(true).create(true).truncate(truncate);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(self.config.file_perm);
        }
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");

        let engine = FileEngine::new();
        engine.write_file(&path, b"hello world").unwrap();

        let data = engine.read_file(&path).unwrap();
        assert_eq!(&data, b"hello world");
    }

    #[test]
    fn write_truncates_previous_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");

        let engine = FileEngine::new();
        engine.write_file(&path, b"a longer first value").unwrap();
        engine.write_file(&path, b"short").unwrap();

        assert_eq!(engine.read_file(&path).unwrap(), b"short");
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("record");

        let engine = FileEngine::new();
        engine.write_file(&path, b"deep").unwrap();

        assert!(path.exists());
        assert!(dir.path().join("a").join("b").is_dir());
    }

    #[test]
    fn read_missing_fails() {
        let dir = tempdir().unwrap();
        let engine = FileEngine::new();

        let result = engine.read_file(&dir.path().join("absent"));
        assert!(matches!(result, Err(EngineError::Read(_))));
    }

    #[test]
    fn file_exists_distinguishes_files_and_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");

        let engine = FileEngine::new();
        assert!(!engine.file_exists(&path));
        assert!(!engine.file_exists(dir.path()));

        engine.write_file(&path, b"x").unwrap();
        assert!(engine.file_exists(&path));
    }

    #[test]
    fn touch_creates_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ix").join("marker");

        let engine = FileEngine::new();
        engine.touch_file(&path).unwrap();

        assert!(engine.file_exists(&path));
        assert_eq!(engine.read_file(&path).unwrap(), b"");
    }

    #[test]
    fn touch_preserves_existing_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");

        let engine = FileEngine::new();
        engine.write_file(&path, b"keep me").unwrap();
        engine.touch_file(&path).unwrap();

        assert_eq!(engine.read_file(&path).unwrap(), b"keep me");
    }

    #[test]
    fn purge_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");

        let engine = FileEngine::new();
        engine.write_file(&path, b"x").unwrap();
        engine.purge_file(&path).unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn purge_missing_fails() {
        let dir = tempdir().unwrap();
        let engine = FileEngine::new();

        let result = engine.purge_file(&dir.path().join("absent"));
        assert!(matches!(result, Err(EngineError::Purge(_))));
    }

    #[test]
    fn fail_fast_on_contended_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");

        let engine = FileEngine::new();
        engine.write_file(&path, b"x").unwrap();

        // Hold an exclusive lock from a second handle.
        let blocker = File::open(&path).unwrap();
        fs2::FileExt::lock_exclusive(&blocker).unwrap();

        let fast = FileEngine::with_config(Config::new().op_timeout(Duration::ZERO));
        let started = Instant::now();
        let result = fast.read_file(&path);

        assert!(matches!(result, Err(EngineError::LockTimeout)));
        // No sleep on the fail-fast path.
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn timeout_elapses_on_contended_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");

        let engine = FileEngine::with_config(
            Config::new()
                .op_timeout(Duration::from_millis(200))
                .op_polling(Duration::from_millis(20)),
        );
        engine.write_file(&path, b"x").unwrap();

        let blocker = File::open(&path).unwrap();
        fs2::FileExt::lock_exclusive(&blocker).unwrap();

        let started = Instant::now();
        let result = engine.write_file(&path, b"y");

        assert!(matches!(result, Err(EngineError::LockTimeout)));
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn cancel_breaks_pending_acquisition() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");

        let engine = FileEngine::with_config(
            Config::new()
                .op_timeout(Duration::from_secs(10))
                .op_polling(Duration::from_millis(20)),
        );
        engine.write_file(&path, b"x").unwrap();

        let blocker = File::open(&path).unwrap();
        fs2::FileExt::lock_exclusive(&blocker).unwrap();

        let started = Instant::now();
        thread::scope(|s| {
            s.spawn(|| {
                thread::sleep(Duration::from_millis(100));
                engine.cancel();
            });
            let result = engine.read_file(&path);
            assert!(matches!(result, Err(EngineError::Cancelled)));
        });
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn cancel_is_one_shot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");

        let engine = FileEngine::new();
        engine.cancel();

        // The flag is cleared at the start of the next acquisition, so an
        // uncontended operation after cancel() succeeds.
        engine.write_file(&path, b"x").unwrap();
        assert_eq!(engine.read_file(&path).unwrap(), b"x");
    }
}
