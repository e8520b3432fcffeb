//! Advisory `flock`-based locks.
//!
//! A [`FileLock`] holds an exclusive lock on `<dir>/<name>.lock` until it is
//! dropped. Locks on separately opened files conflict even inside a single
//! process, so the same primitive serialises threads and processes alike.

use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};

use nix::{
    errno::Errno,
    fcntl::{Flock, FlockArg},
};

use crate::error::{LockError, LockResult};

pub struct FileLock {
    _file: Flock<File>,
    path: PathBuf,
}

impl FileLock {
    fn lock_path(dir: &Path, name: &str) -> LockResult<PathBuf> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| {
                LockError::Directory {
                    path: dir.to_path_buf(),
                    source,
                }
            })?;
        }

        let sanitized: String = name
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        Ok(dir.join(format!("{sanitized}.lock")))
    }

    fn open(path: &Path) -> LockResult<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| {
                LockError::Open {
                    path: path.to_path_buf(),
                    source,
                }
            })
    }

    /// Blocks until the exclusive lock `name` inside `dir` is acquired.
    pub fn acquire(dir: &Path, name: &str) -> LockResult<Self> {
        let path = Self::lock_path(dir, name)?;
        let file = Self::open(&path)?;

        let file = Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, err)| {
            LockError::AcquireFailed(format!("{}: {}", path.display(), err))
        })?;

        Ok(Self {
            _file: file,
            path,
        })
    }

    /// Attempts the lock without blocking; `None` means another holder has it.
    pub fn try_acquire(dir: &Path, name: &str) -> LockResult<Option<Self>> {
        let path = Self::lock_path(dir, name)?;
        let file = Self::open(&path)?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(file) => {
                Ok(Some(Self {
                    _file: file,
                    path,
                }))
            }
            Err((_, Errno::EWOULDBLOCK)) => Ok(None),
            Err((_, err)) => {
                Err(LockError::AcquireFailed(format!(
                    "{}: {}",
                    path.display(),
                    err
                )))
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;

    #[test]
    fn test_lock_path_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let path = FileLock::lock_path(dir.path(), "sync-arch/cn").unwrap();
        assert!(path.ends_with("sync-arch_cn.lock"));
    }

    #[test]
    fn test_lock_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/locks");
        let lock = FileLock::acquire(&nested, "sync-core").unwrap();
        assert!(nested.is_dir());
        assert!(lock.path().starts_with(&nested));
    }

    #[test]
    fn test_exclusive_lock() {
        let dir = tempfile::tempdir().unwrap();
        let held = FileLock::acquire(dir.path(), "sync-core").unwrap();
        assert!(FileLock::try_acquire(dir.path(), "sync-core")
            .unwrap()
            .is_none());

        drop(held);
        assert!(FileLock::try_acquire(dir.path(), "sync-core")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_different_names_do_not_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let a = FileLock::acquire(dir.path(), "sync-core").unwrap();
        let b = FileLock::try_acquire(dir.path(), "sync-extra").unwrap();
        assert!(b.is_some());
        assert_ne!(a.path(), b.unwrap().path());
    }

    #[test]
    fn test_acquire_blocks_until_released() {
        let dir = tempfile::tempdir().unwrap();
        let lock_dir = dir.path().to_path_buf();
        let held = FileLock::acquire(&lock_dir, "sync-block").unwrap();

        let handle = thread::spawn(move || {
            let lock = FileLock::acquire(&lock_dir, "sync-block").unwrap();
            lock.path().to_path_buf()
        });

        thread::sleep(Duration::from_millis(100));
        let expected = held.path().to_path_buf();
        drop(held);

        assert_eq!(handle.join().unwrap(), expected);
    }
}
