//! The three reparse point requests, with handle lifecycle and error
//! classification.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use log::{debug, warn};
use scopeguard::ScopeGuard;

use super::c::{
    ERROR_ACCESS_DENIED, ERROR_ALREADY_EXISTS, ERROR_BAD_PATHNAME, ERROR_DIR_NOT_EMPTY, ERROR_FILE_EXISTS,
    ERROR_FILE_NOT_FOUND, ERROR_INVALID_NAME, ERROR_NOT_ALL_ASSIGNED, ERROR_NOT_A_REPARSE_POINT, ERROR_PATH_NOT_FOUND,
    ERROR_PRIVILEGE_NOT_HELD, ERROR_REPARSE_ATTRIBUTE_CONFLICT, FILE_ATTRIBUTE_READONLY,
};
use super::cast::BytesAsReparseDataBuffer;
use super::codec::ReparseRecord;
use super::helpers;
use crate::{Error, ErrorKind, Result};

/// What kind of call an OS error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Opening, creating, removing or changing attributes of a path.
    File,
    /// A `FSCTL_*_REPARSE_POINT` device control request.
    Control,
}

/// Maps an OS error onto the error taxonomy, keeping it as the source.
pub fn classify(err: io::Error, request: Request, path: &Path) -> Error {
    let kind = match err.raw_os_error().map(|code| code as u32) {
        Some(ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND) => ErrorKind::NotFound,
        Some(ERROR_ACCESS_DENIED | ERROR_PRIVILEGE_NOT_HELD | ERROR_NOT_ALL_ASSIGNED) => ErrorKind::AccessDenied,
        Some(ERROR_NOT_A_REPARSE_POINT) => ErrorKind::NotAReparsePoint,
        Some(ERROR_ALREADY_EXISTS | ERROR_FILE_EXISTS | ERROR_DIR_NOT_EMPTY | ERROR_REPARSE_ATTRIBUTE_CONFLICT) => {
            ErrorKind::AlreadyExists
        }
        Some(ERROR_INVALID_NAME | ERROR_BAD_PATHNAME) => ErrorKind::InvalidPath,
        _ if request == Request::Control => ErrorKind::DriverRejected,
        _ => ErrorKind::IoError,
    };
    Error::new(kind).with_path(path).with_source(err)
}

fn open(path: &Path, rdwr: bool) -> Result<File> {
    helpers::open_reparse_point(path, rdwr).map_err(|e| classify(e, Request::File, path))
}

/// Writes `record` onto the empty directory `junction`.
///
/// On failure the directory is removed again; a failure to do so is attached
/// to the returned error as a warning.
pub fn set_reparse_point(junction: &Path, record: &ReparseRecord) -> Result<()> {
    debug!("setting mount point on `{}`", junction.display());
    let mut rdb = BytesAsReparseDataBuffer::new();
    let result = record
        .encode(rdb.as_bytes_mut())
        .map_err(|e| e.with_path(junction))
        .and_then(|len| {
            let file = open(junction, true)?;
            helpers::set_reparse_point(helpers::handle(&file), &rdb.as_bytes()[..len])
                .map_err(|e| classify(e, Request::Control, junction))
        });
    result.map_err(|err| rollback(junction, err))
}

fn rollback(junction: &Path, err: Error) -> Error {
    debug!("removing `{}` after failed junction creation: {}", junction.display(), err);
    match fs::remove_dir(junction) {
        Ok(()) => err,
        Err(cleanup) => {
            warn!("could not remove `{}`: {}", junction.display(), cleanup);
            err.with_cleanup(cleanup)
        }
    }
}

/// Reads and decodes the mount point of `path`.
pub fn get_reparse_point(path: &Path) -> Result<ReparseRecord> {
    debug!("querying reparse point of `{}`", path.display());
    let file = open(path, false)?;
    read_record(&file, path)
}

fn read_record(file: &File, path: &Path) -> Result<ReparseRecord> {
    let mut rdb = BytesAsReparseDataBuffer::new();
    let len = helpers::get_reparse_data_point(helpers::handle(file), &mut rdb)
        .map_err(|e| classify(e, Request::Control, path))?;
    ReparseRecord::decode(&rdb.as_bytes()[..len]).map_err(|e| e.with_path(path))
}

/// Clears the mount point of `junction` and removes the then empty directory.
///
/// The target directory and its contents are never touched. Anything that is
/// not a mount point is left alone and reported as [`ErrorKind::NotAJunction`].
pub fn remove_reparse_point(junction: &Path) -> Result<()> {
    debug!("removing mount point `{}`", junction.display());
    // Nothing but a mount point is ever opened for writing.
    get_reparse_point(junction).map_err(not_a_junction)?;

    without_readonly(junction, || {
        let file = open(junction, true)?;
        // The tag is checked again on the handle the delete request goes to.
        read_record(&file, junction).map_err(not_a_junction)?;
        helpers::delete_reparse_point(helpers::handle(&file)).map_err(|e| classify(e, Request::Control, junction))?;
        drop(file);
        // Only succeeds for an empty directory, which the junction now is.
        fs::remove_dir(junction).map_err(|e| classify(e, Request::File, junction))
    })
}

fn not_a_junction(err: Error) -> Error {
    match err.kind() {
        ErrorKind::NotAReparsePoint | ErrorKind::UnsupportedReparseTag | ErrorKind::NotAJunction => {
            err.reclassify(ErrorKind::NotAJunction)
        }
        _ => err,
    }
}

// Runs `f` with the read-only attribute of `path` cleared. The attribute is
// put back only when `f` fails: on success `path` no longer exists.
fn without_readonly(path: &Path, f: impl FnOnce() -> Result<()>) -> Result<()> {
    let attrs = helpers::get_attributes(path).map_err(|e| classify(e, Request::File, path))?;
    if attrs & FILE_ATTRIBUTE_READONLY == 0 {
        return f();
    }
    helpers::set_attributes(path, attrs & !FILE_ATTRIBUTE_READONLY).map_err(|e| classify(e, Request::File, path))?;
    let restore = scopeguard::guard(attrs, |attrs| {
        if let Err(e) = helpers::set_attributes(path, attrs) {
            warn!("could not restore attributes of `{}`: {}", path.display(), e);
        }
    });
    f()?;
    ScopeGuard::into_inner(restore);
    Ok(())
}
