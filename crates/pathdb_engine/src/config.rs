//! Engine configuration.

use std::time::Duration;

/// Default timeout for blocked lock acquisitions.
const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(3);
/// Default polling interval while a lock is contended.
const DEFAULT_OP_POLLING: Duration = Duration::from_millis(100);
/// Default permission bits for newly created directories.
const DEFAULT_DIR_PERM: u32 = 0o775;
/// Default permission bits for newly created files.
const DEFAULT_FILE_PERM: u32 = 0o664;

/// Configuration for a [`FileEngine`](crate::FileEngine).
///
/// Each engine instance carries its own configuration; two engines over the
/// same path may wait for locks with different patience.
#[derive(Debug, Clone)]
pub struct Config {
    /// How long a blocked lock acquisition may wait before failing with
    /// `LockTimeout`. `Duration::ZERO` selects the fail-fast path: a
    /// contended lock fails immediately, without sleeping.
    pub op_timeout: Duration,

    /// How long to sleep between lock attempts while contended.
    pub op_polling: Duration,

    /// Permission bits for directories created on first write (Unix only).
    pub dir_perm: u32,

    /// Permission bits for files created by writes (Unix only).
    pub file_perm: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            op_timeout: DEFAULT_OP_TIMEOUT,
            op_polling: DEFAULT_OP_POLLING,
            dir_perm: DEFAULT_DIR_PERM,
            file_perm: DEFAULT_FILE_PERM,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lock acquisition timeout.
    #[must_use]
    pub const fn op_timeout(mut self, value: Duration) -> Self {
        self.op_timeout = value;
        self
    }

    /// Sets the polling interval for contended locks.
    #[must_use]
    pub const fn op_polling(mut self, value: Duration) -> Self {
        self.op_polling = value;
        self
    }

    /// Sets the permission bits for new directories.
    #[must_use]
    pub const fn dir_perm(mut self, value: u32) -> Self {
        self.dir_perm = value;
        self
    }

    /// Sets the permission bits for new files.
    #[must_use]
    pub const fn file_perm(mut self, value: u32) -> Self {
        self.file_perm = value;
        self
    }
}
