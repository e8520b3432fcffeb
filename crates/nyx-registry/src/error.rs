//! Error types for the registry crate.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while reading a snapshot archive or parsing its records.
#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error("Invalid snapshot archive: {0}")]
    #[diagnostic(
        code(nyx_registry::archive_format),
        help("The snapshot should be a (gzip, xz or zstd compressed) tar archive")
    )]
    ArchiveFormat(String),

    #[error("Missing required field {0}")]
    #[diagnostic(
        code(nyx_registry::missing_field),
        help("Package entries need FILENAME, NAME, VERSION, ARCH, PACKAGER and BUILDDATE")
    )]
    MissingField(&'static str),

    #[error("Package entry {path} is not valid UTF-8: {source}")]
    #[diagnostic(
        code(nyx_registry::invalid_encoding),
        help("Metadata blocks must be UTF-8 encoded")
    )]
    InvalidEncoding {
        path: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Malformed value for field {field}: {value:?}")]
    #[diagnostic(code(nyx_registry::malformed_field))]
    MalformedField { field: &'static str, value: String },

    #[error("Error while {action}: {source}")]
    #[diagnostic(code(nyx_registry::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },
}

impl RegistryError {
    /// Whether the error concerns a single metadata block rather than the
    /// archive as a whole.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::MalformedField { .. } | Self::InvalidEncoding { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            RegistryError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
