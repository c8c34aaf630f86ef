use std::io;
use std::path::{Path, PathBuf};

/// A specialized `Result` type for junction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The category of a junction error.
///
/// Every failing operation reports exactly one kind, so callers can branch on
/// [`Error::kind`] instead of decoding OS error numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The path cannot be resolved to an absolute local path.
    #[error("invalid path")]
    InvalidPath,
    /// The junction target does not exist or is not a directory.
    #[error("target directory not found")]
    TargetNotFound,
    /// The junction path already exists or already carries a reparse point.
    #[error("already exists")]
    AlreadyExists,
    /// The path does not exist.
    #[error("not found")]
    NotFound,
    /// The path exists but carries no reparse point at all.
    #[error("not a reparse point")]
    NotAReparsePoint,
    /// The path carries a reparse point of another type, such as a symbolic link.
    #[error("unsupported reparse tag")]
    UnsupportedReparseTag,
    /// The reparse data returned by the filesystem is inconsistent.
    #[error("malformed reparse data buffer")]
    MalformedBuffer,
    /// The target path does not fit into a reparse data buffer.
    #[error("reparse data buffer too large")]
    BufferTooLarge,
    /// The caller-provided output buffer cannot hold the target path.
    #[error("output buffer too small")]
    BufferTooSmall,
    /// The process lacks the access rights or privileges for the request.
    #[error("access denied")]
    AccessDenied,
    /// The filesystem driver refused a reparse point request.
    #[error("reparse point request rejected by the filesystem")]
    DriverRejected,
    /// The path is not a junction.
    #[error("not a junction")]
    NotAJunction,
    /// Any other I/O failure.
    #[error("I/O error")]
    IoError,
}

impl ErrorKind {
    fn io_kind(self) -> io::ErrorKind {
        match self {
            ErrorKind::InvalidPath | ErrorKind::BufferTooSmall => io::ErrorKind::InvalidInput,
            ErrorKind::TargetNotFound | ErrorKind::NotFound => io::ErrorKind::NotFound,
            ErrorKind::AlreadyExists => io::ErrorKind::AlreadyExists,
            ErrorKind::AccessDenied => io::ErrorKind::PermissionDenied,
            ErrorKind::MalformedBuffer => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::Other,
        }
    }
}

/// The error type for junction operations.
///
/// Besides its [`ErrorKind`], an error remembers the path it concerns, the
/// underlying OS error (exposed through [`std::error::Error::source`]) and,
/// for a failed [`create`](crate::create), the failure to roll back the
/// directory it had created.
#[derive(Debug, thiserror::Error)]
#[error("{kind}{}", display_path(.path))]
pub struct Error {
    kind: ErrorKind,
    path: Option<PathBuf>,
    #[source]
    source: Option<io::Error>,
    cleanup: Option<io::Error>,
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(": `{}`", path.display()),
        None => String::new(),
    }
}

#[cfg_attr(not(windows), allow(dead_code))]
impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            source: None,
            cleanup: None,
        }
    }

    pub(crate) fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    pub(crate) fn with_source(mut self, source: io::Error) -> Self {
        self.source = Some(source);
        self
    }

    pub(crate) fn with_cleanup(mut self, cleanup: io::Error) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    // Keeps path and source, which still explain what happened.
    pub(crate) fn reclassify(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the path the failed operation was acting on, if known.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the OS error code behind this error, if there is one.
    pub fn raw_os_error(&self) -> Option<i32> {
        self.source.as_ref().and_then(io::Error::raw_os_error)
    }

    /// Returns the failure to remove the directory left behind by a failed
    /// [`create`](crate::create).
    ///
    /// This is a warning only: the error kind always describes the original
    /// failure.
    pub fn cleanup_error(&self) -> Option<&io::Error> {
        self.cleanup.as_ref()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<Error> for io::Error {
    fn from(mut err: Error) -> Self {
        if err.path.is_none() && err.cleanup.is_none() {
            if let Some(source) = err.source.take() {
                return source;
            }
        }
        io::Error::new(err.kind.io_kind(), err)
    }
}
