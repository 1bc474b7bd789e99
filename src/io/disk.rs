use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::{LockBenchError, Result, TEMP_FILE_PREFIX};

static SCRATCH_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Uniquely named scratch file, removed when dropped
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    file: File,
}

impl ScratchFile {
    /// Create a new scratch file in `dir`, truncated to exactly `len` bytes
    pub fn create(dir: &Path, len: u64) -> Result<Self> {
        let path = dir.join(unique_name());
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                LockBenchError::TempFile(format!("Failed to create {}: {}", path.display(), e))
            })?;

        // From here on the guard owns the path and removes it on any failure.
        let scratch = Self { path, file };
        scratch.file.set_len(len)?;
        debug!(path = %scratch.path.display(), len, "created scratch file");
        Ok(scratch)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the file on disk
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Write a whole chunk, then flush and sync it to the device
    pub fn write_durable(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file.write_all(buf)?;
        self.file.flush()?;
        self.file.sync_all()
    }

    /// Fill `buf` completely from the current position
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.file.read_exact(buf)
    }

    pub fn rewind(&mut self) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0)).map(|_| ())
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %err, "failed to remove scratch file");
        }
    }
}

fn unique_name() -> String {
    format!(
        "{}{}_{}_{:08x}.dat",
        TEMP_FILE_PREFIX,
        process::id(),
        SCRATCH_SEQUENCE.fetch_add(1, Ordering::Relaxed),
        rand::random::<u32>()
    )
}
