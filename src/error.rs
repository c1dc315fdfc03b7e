use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Most of the crate never fails: query misses are reported as [`None`], duplicate sequence
/// points are silently dropped by the encoder and cyclic control flow is expected input. Errors
/// are reserved for inputs that cannot be trusted, i.e. blobs and side files read back from
/// memory or disk, and control-flow graphs that reference blocks or instructions which do not
/// exist.
///
/// # Error Categories
///
/// ## Decoding Errors
/// - [`Error::Malformed`] - Corrupted blob or side file
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of a buffer
/// - [`Error::GraphError`] - Control-flow graph referencing unknown blocks or instructions
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors while reading or writing side files
/// - [`Error::Error`] - Miscellaneous failures, e.g. memory mapping
///
/// # Examples
///
/// ```rust
/// use seqpoints::{Error, seqpoints::SeqPointInfo};
///
/// match SeqPointInfo::from_bytes(&[0x01, 0x05, 0x00]) {
///     Ok(info) => println!("{} bytes", info.len()),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed blob: {} ({}:{})", message, file, line);
///     }
///     Err(Error::OutOfBounds { .. }) => eprintln!("Truncated blob"),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input is damaged and could not be decoded.
    ///
    /// This error indicates that a blob, a side file or a control-flow graph does not
    /// conform to the expected structure. The error includes the source location where the
    /// malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while decoding.
    ///
    /// This error occurs when trying to read data beyond the end of a blob or side file.
    /// It's a safety check to prevent buffer overruns on truncated input.
    #[error("Out of Bound read would have occurred! - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Provided input was empty.
    ///
    /// This error occurs when an empty buffer is provided where a side file was expected.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while reading or writing `.msym` side files.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Control-flow graph error.
    ///
    /// Raised when a control-flow graph handed to the sequence-point pass references a
    /// block or a sequence-point instruction that does not exist.
    #[error("{0}")]
    GraphError(String),

    /// Generic error for miscellaneous failures.
    ///
    /// Used for errors that don't fit into other categories or for
    /// wrapping external library errors with additional context.
    #[error("{0}")]
    Error(String),
}
