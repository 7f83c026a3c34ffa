// ErrWarden - platform/lock.rs
//
// Single-instance guard. Two instances draining the same source would each
// read and truncate it, duplicating or losing records, so the process takes
// an exclusive advisory lock on a lock file at startup and holds it until
// exit. The kernel drops the lock when the process dies, however it dies,
// so a leftover file never blocks a restart.
//
// The file content is the owner's PID, for diagnostics only. The file is
// left in place on exit: unlinking it would let a late starter lock an
// inode nobody else can see.

use crate::util::error::LockError;
use fs4::fs_std::FileExt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Held for the process lifetime; the lock is released when this is dropped.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    _file: File,
}

impl InstanceLock {
    /// Take the lock at `path`, creating the file and its parent directories
    /// as needed.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let io_err = |e: io::Error| LockError::Io {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        // No truncate on open: the current owner's PID must survive a
        // failed attempt.
        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;

        if let Err(e) = file.try_lock_exclusive() {
            if is_contended(&e) {
                return Err(LockError::AlreadyRunning {
                    path: path.to_path_buf(),
                    pid: read_owner_pid(path),
                });
            }
            return Err(io_err(e));
        }

        let pid = std::process::id();
        file.set_len(0)
            .and_then(|()| writeln!(file, "{pid}"))
            .and_then(|()| file.flush())
            .map_err(io_err)?;

        tracing::debug!(lock = %path.display(), pid, "Instance lock acquired");
        Ok(Self {
            path: path.to_path_buf(),
            _file: file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs4::lock_contended_error().raw_os_error()
}

fn read_owner_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
}
