//! Sequence-point side files of ahead-of-time compiled images.
//!
//! An AOT compiler cannot register blobs with a running domain, so it collects them in a
//! [`SeqPointData`] and writes them next to the image as `<image><SEQ_POINT_AOT_EXT>`. When
//! the image is loaded the runtime reads the file back and registers every entry.
//!
//! # File Format
//!
//! ```text
//! entry count     varint
//! per entry:
//!   method token  varint
//!   method index  varint
//!   blob          SeqPointInfo, self-delimiting
//! ```

use std::{fs, path::Path, sync::Arc};

use rayon::prelude::*;
use tracing::debug;

use crate::{
    file::{parser::Parser, Physical},
    metadata::{MethodKey, Token},
    runtime::Domain,
    seqpoints::SeqPointInfo,
    utils::{encoded_int_size, write_7bit_encoded_int},
    Error, Result,
};

/// Extension appended to an image name to form its sequence-point side file.
pub const SEQ_POINT_AOT_EXT: &str = ".msym";

/// Returns the side-file path for `image_name`.
///
/// ```rust
/// use seqpoints::seqpoints::aot_seq_point_path;
///
/// assert_eq!(aot_seq_point_path("mscorlib.dll"), "mscorlib.dll.msym");
/// ```
#[must_use]
pub fn aot_seq_point_path(image_name: &str) -> String {
    format!("{image_name}{SEQ_POINT_AOT_EXT}")
}

/// One method's blob inside a side file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqPointDataEntry {
    /// Metadata token of the compiled method
    pub method_token: Token,
    /// Index of the compiled body inside the image, distinguishes instantiations
    pub method_index: u32,
    /// The method's sequence points
    pub info: Arc<SeqPointInfo>,
}

/// Collection of sequence-point blobs persisted alongside an AOT image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeqPointData {
    entries: Vec<SeqPointDataEntry>,
}

impl SeqPointData {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        SeqPointData {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Appends the blob of the method identified by `method_token` and `method_index`.
    pub fn add(&mut self, method_token: Token, method_index: u32, info: Arc<SeqPointInfo>) {
        self.entries.push(SeqPointDataEntry {
            method_token,
            method_index,
            info,
        });
    }

    /// Returns the blob stored for `(method_token, method_index)`.
    #[must_use]
    pub fn get(&self, method_token: Token, method_index: u32) -> Option<Arc<SeqPointInfo>> {
        self.entries
            .iter()
            .find(|entry| entry.method_token == method_token && entry.method_index == method_index)
            .map(|entry| Arc::clone(&entry.info))
    }

    /// Returns all entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[SeqPointDataEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the collection holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the collection into the side-file format.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload: usize = self
            .entries
            .iter()
            .map(|entry| {
                encoded_int_size(entry.method_token.value())
                    + encoded_int_size(entry.method_index)
                    + entry.info.len()
            })
            .sum();
        let mut buffer = Vec::with_capacity(payload + 5);

        // Entry counts are bounded by the number of methods in an image
        #[allow(clippy::cast_possible_truncation)]
        write_7bit_encoded_int(self.entries.len() as u32, &mut buffer);
        for entry in &self.entries {
            write_7bit_encoded_int(entry.method_token.value(), &mut buffer);
            write_7bit_encoded_int(entry.method_index, &mut buffer);
            buffer.extend_from_slice(entry.info.as_bytes());
        }

        buffer
    }

    /// Parses a side file held in memory.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for empty input, [`crate::Error::OutOfBounds`] for
    /// truncated input and [`crate::Error::Malformed`] for damaged blobs or trailing bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Empty);
        }

        let mut parser = Parser::new(data);
        let count = parser.read_7bit_encoded_int()? as usize;

        // Every entry takes at least four bytes, do not trust the count for allocation
        let mut result = Self::with_capacity(count.min(parser.remaining() / 4));
        for _ in 0..count {
            let method_token = Token::new(parser.read_7bit_encoded_int()?);
            let method_index = parser.read_7bit_encoded_int()?;
            let info = SeqPointInfo::read(&mut parser)?;
            result.add(method_token, method_index, Arc::new(info));
        }

        if parser.has_more_data() {
            return Err(malformed_error!(
                "{} trailing bytes after {} side file entries",
                parser.remaining(),
                count
            ));
        }

        Ok(result)
    }

    /// Reads and parses the side file at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, otherwise see
    /// [`SeqPointData::from_bytes`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let physical = Physical::new(path)?;
        if physical.is_empty() {
            return Err(Error::Empty);
        }

        Self::from_bytes(physical.data())
    }

    /// Writes the collection to `path`, replacing any existing file.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be written.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_bytes())?;
        debug!(
            path = %path.display(),
            entries = self.entries.len(),
            "wrote sequence point side file"
        );
        Ok(())
    }

    /// Registers every entry with `domain` under the key `resolve` returns for it.
    ///
    /// Entries `resolve` maps to `None` are skipped. Resolution runs in parallel, the
    /// registry keeps the first blob stored for a key. Returns the number of entries that
    /// were registered.
    pub fn load_into<F>(&self, domain: &Domain, resolve: F) -> usize
    where
        F: Fn(&SeqPointDataEntry) -> Option<MethodKey> + Sync,
    {
        let registered = self
            .entries
            .par_iter()
            .filter_map(|entry| resolve(entry).map(|method| (method, entry)))
            .filter(|(method, entry)| {
                domain.register_seq_points(method.clone(), Arc::clone(&entry.info))
            })
            .count();

        debug!(
            domain = domain.id(),
            entries = self.entries.len(),
            registered,
            "loaded sequence point side file"
        );
        registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seqpoints::{SeqPointInfoBuilder, SequencePoint};

    fn info(natives: &[i32]) -> Arc<SeqPointInfo> {
        let mut builder = SeqPointInfoBuilder::new(false);
        for (il, native) in natives.iter().enumerate() {
            builder.add_seq_point(&SequencePoint::new(il as i32, *native), &[]);
        }
        Arc::new(builder.finish())
    }

    fn sample() -> SeqPointData {
        let mut data = SeqPointData::new();
        data.add(Token::method_def(1), 0, info(&[0, 4, 8]));
        data.add(Token::method_def(2), 1, info(&[]));
        data.add(Token::method_def(2), 7, info(&[3]));
        data
    }

    #[test]
    fn aot_path() {
        assert_eq!(aot_seq_point_path("app.exe"), "app.exe.msym");
        assert_eq!(aot_seq_point_path(""), ".msym");
    }

    #[test]
    fn lookup_by_token_and_index() {
        let data = sample();
        assert_eq!(data.len(), 3);
        assert_eq!(data.get(Token::method_def(1), 0).unwrap().point_count(), 3);
        assert_eq!(data.get(Token::method_def(2), 7).unwrap().point_count(), 1);
        assert!(data.get(Token::method_def(2), 2).is_none());
    }

    #[test]
    fn bytes_reproduce_entries() {
        let data = sample();
        let parsed = SeqPointData::from_bytes(&data.to_bytes()).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn damaged_side_files() {
        assert!(matches!(SeqPointData::from_bytes(&[]), Err(Error::Empty)));

        let bytes = sample().to_bytes();
        assert!(SeqPointData::from_bytes(&bytes[..bytes.len() - 1]).is_err());

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(matches!(
            SeqPointData::from_bytes(&trailing),
            Err(Error::Malformed { .. })
        ));

        // Claims a million entries, carries none
        assert!(matches!(
            SeqPointData::from_bytes(&[0xC0, 0x84, 0x3D]),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "seqpoints-data-{}{}",
            std::process::id(),
            SEQ_POINT_AOT_EXT
        ));

        let data = sample();
        data.write_to_file(&path).unwrap();
        let loaded = SeqPointData::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, data);
    }

    #[test]
    fn load_into_domain() {
        let domain = Domain::new(1, "test");
        let data = sample();

        let registered = data.load_into(&domain, |entry| {
            (entry.method_index != 1).then(|| MethodKey::new(entry.method_token))
        });

        // Index 1 is skipped, index 0 and 7 carry different tokens
        assert_eq!(registered, 2);
        assert_eq!(
            domain
                .get_seq_points(&MethodKey::new(Token::method_def(2)))
                .unwrap()
                .point_count(),
            1
        );

        // Loading again registers nothing new
        assert_eq!(data.load_into(&domain, |e| Some(MethodKey::new(e.method_token))), 0);
    }
}
