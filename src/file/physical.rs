//! Memory-mapped access to `.msym` side files.
//!
//! [`crate::file::physical::Physical`] maps a side file read-only into the address space so
//! that [`crate::seqpoints::SeqPointData::from_file`] can decode it without first copying the
//! whole file into a buffer.

use crate::{
    Error::{Error, FileError},
    Result,
};

use memmap2::Mmap;
use std::{fs, path::Path};

/// A read-only, memory-mapped file.
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data, `None` for empty files which cannot be mapped
    data: Option<Mmap>,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file.
    ///
    /// # Arguments
    /// * `path` - Path to the file on disk
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or
    /// [`crate::Error::Error`] if memory mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        let len = file.metadata().map_err(FileError)?.len();
        if len == 0 {
            return Ok(Physical { data: None });
        }

        // The mapping is only ever read, and side files are not modified while a domain loads them.
        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(Error(error.to_string())),
        };

        Ok(Physical { data: Some(mmap) })
    }

    /// Returns the complete file contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
