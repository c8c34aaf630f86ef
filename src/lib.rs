//! Library for creating, querying and deleting NTFS junctions.
//!
//! Junction Points are a little known NTFS v5+ feature roughly equivalent to UNIX
//! directory symbolic links. They are directory reparse points tagged
//! `IO_REPARSE_TAG_MOUNT_POINT` which store the target twice: once as a
//! `\??\C:\target\` substitute name the filesystem follows, and once as a
//! `C:\target` print name shown to users.
//!
//! Junctions created here are interchangeable with those made by `mklink /J`.
//! Directory symbolic links and other reparse points are never mistaken for
//! junctions.
//!
//! The operations are only available on Windows. Errors are reported as
//! [`Error`], whose [`ErrorKind`] tells the failure cases apart.
#![deny(rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/ntfs-junction/0.1.0")]

mod error;
mod internals;

#[cfg(all(windows, feature = "ffi"))]
pub mod ffi;

pub use crate::error::{Error, ErrorKind, Result};

#[cfg(windows)]
use std::path::{Path, PathBuf};

/// Creates a junction point from the specified directory to the specified target directory.
///
/// `target` must be an existing directory, `junction` must not exist yet. On
/// failure no half-created junction is left behind.
///
/// N.B. Only works on NTFS.
///
/// # Errors
///
/// * [`ErrorKind::InvalidPath`] if `target` is not a local absolute path once
///   resolved against the current directory.
/// * [`ErrorKind::TargetNotFound`] if `target` is not an existing directory.
/// * [`ErrorKind::AlreadyExists`] if `junction` already exists.
/// * [`ErrorKind::BufferTooLarge`] if `target` is too long for a reparse point.
/// * [`ErrorKind::AccessDenied`] or [`ErrorKind::DriverRejected`] if the
///   filesystem refuses the request.
///
/// # Example
///
/// ```rust
/// # use std::fs;
/// # use ntfs_junction::create;
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let tmpdir = tempfile::tempdir()?;
///     let target = tmpdir.path().join("target");
///     let junction = tmpdir.path().join("junction");
///     # fs::create_dir_all(&target)?;
///     create(&target, &junction)?;
///     Ok(())
/// }
/// ```
#[cfg(windows)]
pub fn create<P, Q>(target: P, junction: Q) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    crate::internals::create(target.as_ref(), junction.as_ref())
}

/// Deletes a junction, leaving its target directory and contents untouched.
///
/// Both the reparse point and the directory entry carrying it are removed.
///
/// N.B. Only works on NTFS.
///
/// # Errors
///
/// * [`ErrorKind::NotFound`] if `junction` does not exist.
/// * [`ErrorKind::NotAJunction`] if `junction` is a plain directory, a file or
///   another kind of reparse point. Nothing is deleted in that case.
///
/// # Example
///
/// ```rust
/// # use std::fs;
/// # use ntfs_junction::{create, delete};
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let tmpdir = tempfile::tempdir()?;
///     let target = tmpdir.path().join("target");
///     let junction = tmpdir.path().join("junction");
///     # fs::create_dir_all(&target)?;
///     create(&target, &junction)?;
///     delete(&junction)?;
///     assert!(!junction.exists());
///     assert!(target.exists());
///     Ok(())
/// }
/// ```
#[cfg(windows)]
pub fn delete<P: AsRef<Path>>(junction: P) -> Result<()> {
    crate::internals::delete(junction.as_ref())
}

/// Determines whether the specified path exists and refers to a junction point.
///
/// A missing path, a plain file or directory and a symbolic link are all just
/// `false`.
///
/// # Example
///
/// ```rust
/// # use ntfs_junction::is_junction;
/// assert!(is_junction(r"C:\Users\Default User"));
/// assert!(!is_junction(r"C:\Windows"));
/// ```
#[cfg(windows)]
pub fn is_junction<P: AsRef<Path>>(path: P) -> bool {
    crate::internals::is_junction(path.as_ref())
}

/// Gets the target of the specified junction point, as shown by `dir` and
/// other tools.
///
/// N.B. Only works on NTFS.
///
/// # Errors
///
/// * [`ErrorKind::NotFound`] if `junction` does not exist.
/// * [`ErrorKind::NotAReparsePoint`] if `junction` is a plain file or directory.
/// * [`ErrorKind::UnsupportedReparseTag`] if `junction` is another kind of
///   reparse point, such as a directory symbolic link.
/// * [`ErrorKind::MalformedBuffer`] if the stored reparse data is inconsistent.
///
/// # Example
///
/// ```rust
/// # use ntfs_junction::get_target;
/// fn main() -> ntfs_junction::Result<()> {
///     assert_eq!(get_target(r"C:\Users\Default User")?.to_str(), Some(r"C:\Users\Default"));
///     Ok(())
/// }
/// ```
#[cfg(windows)]
pub fn get_target<P: AsRef<Path>>(junction: P) -> Result<PathBuf> {
    crate::internals::get_target(junction.as_ref())
}

/// Like [`get_target`], but writes the target into `buf` as a NUL terminated
/// UTF-16 string and returns its length without the terminator.
///
/// # Errors
///
/// Those of [`get_target`], and [`ErrorKind::BufferTooSmall`] if `buf` cannot
/// hold the target and its terminator. `buf` is left untouched then.
///
/// # Example
///
/// ```rust
/// # use ntfs_junction::get_target_into;
/// fn main() -> ntfs_junction::Result<()> {
///     let mut buf = [0u16; 260];
///     let len = get_target_into(r"C:\Users\Default User", &mut buf)?;
///     assert_eq!(String::from_utf16_lossy(&buf[..len]), r"C:\Users\Default");
///     Ok(())
/// }
/// ```
#[cfg(windows)]
pub fn get_target_into<P: AsRef<Path>>(junction: P, buf: &mut [u16]) -> Result<usize> {
    crate::internals::get_target_into(junction.as_ref(), buf)
}

#[cfg(all(test, windows))]
mod tests;
