//! C-callable surface over the four junction operations.
//!
//! Paths are NUL terminated UTF-16 strings. Failures are reported as a
//! [`JunctionStatus`] code instead of an [`Error`](crate::Error).

use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use std::path::PathBuf;
use std::slice;

use log::debug;

use crate::ErrorKind;

#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JunctionStatus {
    Ok = 0,
    InvalidPath = 1,
    TargetNotFound = 2,
    AlreadyExists = 3,
    NotFound = 4,
    NotAReparsePoint = 5,
    UnsupportedReparseTag = 6,
    MalformedBuffer = 7,
    BufferTooLarge = 8,
    BufferTooSmall = 9,
    AccessDenied = 10,
    DriverRejected = 11,
    NotAJunction = 12,
    IoError = 13,
}

impl From<ErrorKind> for JunctionStatus {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidPath => JunctionStatus::InvalidPath,
            ErrorKind::TargetNotFound => JunctionStatus::TargetNotFound,
            ErrorKind::AlreadyExists => JunctionStatus::AlreadyExists,
            ErrorKind::NotFound => JunctionStatus::NotFound,
            ErrorKind::NotAReparsePoint => JunctionStatus::NotAReparsePoint,
            ErrorKind::UnsupportedReparseTag => JunctionStatus::UnsupportedReparseTag,
            ErrorKind::MalformedBuffer => JunctionStatus::MalformedBuffer,
            ErrorKind::BufferTooLarge => JunctionStatus::BufferTooLarge,
            ErrorKind::BufferTooSmall => JunctionStatus::BufferTooSmall,
            ErrorKind::AccessDenied => JunctionStatus::AccessDenied,
            ErrorKind::DriverRejected => JunctionStatus::DriverRejected,
            ErrorKind::NotAJunction => JunctionStatus::NotAJunction,
            ErrorKind::IoError => JunctionStatus::IoError,
        }
    }
}

fn status(result: crate::Result<()>) -> JunctionStatus {
    match result {
        Ok(()) => JunctionStatus::Ok,
        Err(err) => {
            debug!("{}", err);
            err.kind().into()
        }
    }
}

unsafe fn path_from_wide(ptr: *const u16) -> Option<PathBuf> {
    if ptr.is_null() {
        return None;
    }
    let mut len = 0;
    while *ptr.add(len) != 0 {
        len += 1;
    }
    Some(PathBuf::from(OsString::from_wide(slice::from_raw_parts(ptr, len))))
}

/// Creates a junction at `link` pointing to the directory `target`.
///
/// # Safety
///
/// `link` and `target` must be null or point to NUL terminated UTF-16 strings.
#[no_mangle]
pub unsafe extern "C" fn ntfs_junction_create(link: *const u16, target: *const u16) -> JunctionStatus {
    match (path_from_wide(link), path_from_wide(target)) {
        (Some(link), Some(target)) => status(crate::create(target, link)),
        _ => JunctionStatus::InvalidPath,
    }
}

/// Returns whether `path` is a junction.
///
/// # Safety
///
/// `path` must be null or point to a NUL terminated UTF-16 string.
#[no_mangle]
pub unsafe extern "C" fn ntfs_junction_is_junction(path: *const u16) -> bool {
    match path_from_wide(path) {
        Some(path) => crate::is_junction(path),
        None => false,
    }
}

/// Writes the target of the junction `path` into `out`, NUL terminated.
///
/// `capacity` is the size of `out` in UTF-16 code units, terminator included.
///
/// # Safety
///
/// `path` must be null or point to a NUL terminated UTF-16 string. `out` must
/// be null or valid for writes of `capacity` code units.
#[no_mangle]
pub unsafe extern "C" fn ntfs_junction_get_target(path: *const u16, out: *mut u16, capacity: usize) -> JunctionStatus {
    let path = match path_from_wide(path) {
        Some(path) if !out.is_null() => path,
        _ => return JunctionStatus::InvalidPath,
    };
    let buf = slice::from_raw_parts_mut(out, capacity);
    status(crate::get_target_into(path, buf).map(drop))
}

/// Deletes the junction `path`, leaving its target untouched.
///
/// # Safety
///
/// `path` must be null or point to a NUL terminated UTF-16 string.
#[no_mangle]
pub unsafe extern "C" fn ntfs_junction_delete(path: *const u16) -> JunctionStatus {
    match path_from_wide(path) {
        Some(path) => status(crate::delete(path)),
        None => JunctionStatus::InvalidPath,
    }
}
