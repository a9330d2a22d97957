//! File-backed medium image
//!
//! Lets a simulated device keep its contents across process restarts. The
//! file is a raw byte-for-byte copy of the device array; every applied write
//! is written through and synced before the frame completes.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{FramError, FramResult};
use crate::platform_durability::durable_sync;

/// Open image file plus its path for error context
pub struct ImageFile {
    file: File,
    path: PathBuf,
}

impl ImageFile {
    /// Open the image at `path`, creating it filled with `fill` if absent.
    ///
    /// Returns the handle and the current contents. An existing file whose
    /// length is not `size` is rejected.
    pub fn open(path: &Path, size: usize, fill: u8) -> FramResult<(Self, Vec<u8>)> {
        let io_err = |e: io::Error| FramError::Io {
            path: Some(path.to_path_buf()),
            kind: e.kind(),
            message: e.to_string(),
        };

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;

        let len = file.metadata().map_err(io_err)?.len();
        let contents = if len == 0 {
            let contents = vec![fill; size];
            file.write_all(&contents).map_err(io_err)?;
            durable_sync(&file).map_err(io_err)?;
            contents
        } else if len == size as u64 {
            let mut contents = vec![0u8; size];
            file.read_exact(&mut contents).map_err(io_err)?;
            contents
        } else {
            return Err(FramError::InvalidConfig {
                reason: format!("image {} is {} bytes, expected {}", path.display(), len, size),
            });
        };

        Ok((Self { file, path: path.to_path_buf() }, contents))
    }

    /// Write `bytes` at `offset` and sync
    pub fn persist(&mut self, offset: usize, bytes: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(bytes)?;
        durable_sync(&self.file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
