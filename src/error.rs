use thiserror::Error;

use crate::model::SymbolKind;

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

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::Malformed`] - A descriptor, mapping file or manifest could not be parsed
/// - [`Error::Configuration`] - The run configuration is unusable; fatal before processing starts
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Json`] - JSON (de)serialization errors
///
/// ## Mapping Errors
/// - [`Error::NamespaceExhausted`] - A random naming mode ran out of unique candidates
/// - [`Error::Aborted`] - The run was aborted through its [`crate::engine::AbortHandle`]
///
/// ## Rewrite Errors
/// - [`Error::RemapFailed`] - The bulk remapping engine could not resolve a referenced type
/// - [`Error::Archive`] - The archive container could not be decoded or encoded
///
/// # Examples
///
/// ```rust
/// use classcloak::{descriptor::parse_method_descriptor, Error};
///
/// match parse_method_descriptor("(I") {
///     Ok(_) => unreachable!(),
///     Err(Error::Malformed { message, .. }) => println!("bad descriptor: {message}"),
///     Err(e) => println!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input is damaged and could not be parsed.
    ///
    /// Raised for invalid JVM descriptors, unreadable mapping files and broken
    /// manifest blocks. The error includes the source location where the
    /// malformation was detected for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The configuration is invalid.
    ///
    /// Configuration errors are detected before any class is processed and
    /// always abort the run.
    #[error("Invalid configuration - {0}")]
    Configuration(String),

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// A random naming mode could not find an unused candidate.
    ///
    /// Deterministic modes can never produce this error; the random modes
    /// report it once every candidate of their fixed alphabet/length has been issued.
    #[error("Name space for {kind} names is exhausted")]
    NamespaceExhausted {
        /// The symbol kind whose generator ran dry
        kind: SymbolKind,
    },

    /// The bulk remapping engine failed for a type that is present neither in
    /// the archive nor on the supplied classpath.
    ///
    /// This is fatal: the rewrite aborts before the destination path is touched.
    #[error("Remapping failed for {type_name}: {message}")]
    RemapFailed {
        /// Internal name of the type that could not be resolved
        type_name: String,
        /// Description reported by the remapping engine
        message: String,
    },

    /// The archive container could not be decoded or encoded.
    #[error("Archive error - {0}")]
    Archive(String),

    /// The run was aborted before this phase started.
    #[error("The run was aborted")]
    Aborted,
}
