//! The open file behind a document: random-access reads for offloaded lines, an advisory shared
//! lock while the file is open, and in-place rewrites on save.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::{FileExt, MetadataExt};
use std::path::{Path, PathBuf};

use core_text::{LineSource, Offload};
use thiserror::Error;
use tracing::{debug, warn};

/// The advisory lock could not be released before, or taken again after, an in-place rewrite.
///
/// Travels inside the `io::Error` returned by [`LineSource::overwrite`]. `rewritten` tells
/// whether the new contents reached the file.
#[derive(Debug, Error)]
#[error("advisory lock on {path} could not be {action}: {source}")]
pub struct LockError {
    pub path: PathBuf,
    pub action: &'static str,
    pub rewritten: bool,
    #[source]
    pub source: io::Error,
}

impl LockError {
    /// The lock failure carried by `err`, if it is one.
    pub fn find(err: &io::Error) -> Option<&LockError> {
        err.get_ref()?.downcast_ref::<LockError>()
    }
}

fn flock(file: &File, op: libc::c_int) -> io::Result<()> {
    // SAFETY: the descriptor is owned by `file` and stays open for the duration of the call.
    let rc = unsafe { libc::flock(file.as_raw_fd(), op) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Take a shared advisory lock without blocking. Fails if another process holds it exclusively.
pub fn lock_shared(file: &File) -> io::Result<()> {
    flock(file, libc::LOCK_SH | libc::LOCK_NB)
}

pub fn unlock(file: &File) -> io::Result<()> {
    flock(file, libc::LOCK_UN)
}

/// `(device, inode)` identifying a file independent of the path used to reach it.
pub fn file_identity(meta: &std::fs::Metadata) -> (u64, u64) {
    (meta.dev(), meta.ino())
}

#[derive(Debug)]
pub struct FileSource {
    file: File,
    path: PathBuf,
    locked: bool,
}

impl FileSource {
    /// Open `path` for reading. The file is not locked until [`FileSource::lock`].
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            file: File::open(path)?,
            path: path.to_path_buf(),
            locked: false,
        })
    }

    /// Hold a shared lock until the source is dropped.
    pub fn lock(&mut self) -> io::Result<()> {
        if self.locked {
            return Ok(());
        }
        lock_shared(&self.file)?;
        self.locked = true;
        debug!(target: "io.lock", path = %self.path.display(), "lock_acquired");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn identity(&self) -> io::Result<(u64, u64)> {
        Ok(file_identity(&self.file.metadata()?))
    }
}

impl LineSource for FileSource {
    fn read_raw(&self, span: Offload) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; span.len as usize];
        self.file.read_exact_at(&mut buf, span.offset)?;
        Ok(buf)
    }

    /// Release the lock, truncate and rewrite the file in place, then lock again.
    ///
    /// Rewriting in place keeps the inode, so the read handle sees the new contents and spans
    /// recorded during the save stay valid.
    fn overwrite(&mut self, contents: &mut dyn io::Read) -> io::Result<()> {
        if self.locked {
            unlock(&self.file).map_err(|source| {
                io::Error::other(LockError {
                    path: self.path.clone(),
                    action: "released",
                    rewritten: false,
                    source,
                })
            })?;
            debug!(target: "io.lock", path = %self.path.display(), "lock_released");
        }
        let written = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .and_then(|mut out| {
                out.set_len(0)?;
                let n = io::copy(contents, &mut out)?;
                out.flush()?;
                out.sync_all()?;
                Ok(n)
            });
        if self.locked {
            if let Err(source) = lock_shared(&self.file) {
                warn!(target: "io.lock", path = %self.path.display(), error = %source, "lock_reacquire_failed");
                self.locked = false;
                return Err(written.err().unwrap_or_else(|| {
                    io::Error::other(LockError {
                        path: self.path.clone(),
                        action: "reacquired",
                        rewritten: true,
                        source,
                    })
                }));
            }
            debug!(target: "io.lock", path = %self.path.display(), "lock_reacquired");
        }
        let written = written?;
        debug!(target: "io.save", path = %self.path.display(), bytes = written, "file_rewritten");
        Ok(())
    }
}

impl Drop for FileSource {
    fn drop(&mut self) {
        if self.locked {
            let _ = unlock(&self.file);
        }
    }
}
