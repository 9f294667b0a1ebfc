//! Contains types representing errors encountered while reading or writing libraries.

use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

/// A boxed error type produced by an external metadata codec or module deserializer.
///
/// Workaround for https://github.com/rust-lang/project-error-handling/issues/16
#[repr(transparent)]
pub struct CodecError(Box<dyn std::error::Error + Send + Sync>);

impl CodecError {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Self(Box::from(error))
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.0
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CodecError {
    fn from(error: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self(error)
    }
}

impl Debug for CodecError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for CodecError {}

/// A diagnostic produced by the external bitcode linker for failures other than linking,
/// such as serializing a module to disk.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct BitcodeError {
    message: String,
}

impl BitcodeError {
    pub(crate) fn new<M: Display>(message: M) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    /// The linker's diagnostic, captured verbatim.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The error type used when linking an external native bitcode file into a library fails.
///
/// The linker's diagnostic is captured verbatim alongside the path of the offending artifact.
#[derive(Debug, thiserror::Error)]
#[error("failed to link {path:?}: {message}")]
pub struct LinkError {
    path: PathBuf,
    message: String,
}

impl LinkError {
    pub(crate) fn new<M: Display>(path: PathBuf, message: M) -> Self {
        Self {
            path,
            message: message.to_string(),
        }
    }

    /// The path of the bitcode file that could not be linked.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A reader was opened over a path that does not exist.
    #[error("library path {0:?} does not exist")]
    NotFound(PathBuf),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Bitcode(#[from] BitcodeError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    InvalidLinkData(#[from] crate::link_data::InvalidLinkDataError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The error type used when a library operation fails.
///
/// Every failure here is fatal to the enclosing library operation; no retries or partial
/// recovery are performed. The kind is reference counted rather than boxed so that errors
/// cached by a reader's lazily initialized fields can be cloned on every access.
#[derive(Clone)]
#[repr(transparent)]
pub struct Error(Arc<ErrorKind>);

impl Error {
    pub fn new<E: Into<ErrorKind>>(kind: E) -> Self {
        Self(Arc::new(kind.into()))
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0.as_ref())
    }
}

impl<E: Into<ErrorKind>> From<E> for Error {
    fn from(kind: E) -> Self {
        Self::new(kind)
    }
}
