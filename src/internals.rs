#![cfg_attr(not(windows), allow(dead_code))]

mod utf16;
mod c;
mod cast;
mod codec;
mod path;

#[cfg(windows)]
mod driver;
#[cfg(windows)]
mod helpers;

#[cfg(windows)]
pub use self::windows::*;

#[cfg(windows)]
mod windows {
    use std::ffi::OsString;
    use std::fs;
    use std::io;
    use std::os::windows::ffi::OsStringExt;
    use std::path::{Path, PathBuf};

    use log::trace;

    use super::codec::ReparseRecord;
    use super::driver::{self, Request};
    use super::path;
    use crate::{Error, ErrorKind, Result};

    pub fn create(target: &Path, junction: &Path) -> Result<()> {
        // We're using low-level APIs to create the junction, and these are more picky about paths.
        // For example, forward slashes cannot be used as a path separator, so we should try to
        // canonicalize the path first.
        let normalized = path::normalize(target)?;
        match fs::metadata(target) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(Error::new(ErrorKind::TargetNotFound).with_path(target)),
            Err(e) => return Err(Error::new(ErrorKind::TargetNotFound).with_path(target).with_source(e)),
        }
        let record = ReparseRecord::mount_point(normalized.substitute_name(), normalized.print_name())
            .map_err(|e| e.with_path(target))?;

        // `create_dir` is the existence check: it fails atomically if anything,
        // including a dangling junction, is already there.
        fs::create_dir(junction).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => Error::new(ErrorKind::AlreadyExists).with_path(junction).with_source(e),
            _ => driver::classify(e, Request::File, junction),
        })?;
        driver::set_reparse_point(junction, &record)
    }

    pub fn delete(junction: &Path) -> Result<()> {
        driver::remove_reparse_point(junction)
    }

    pub fn is_junction(path: &Path) -> bool {
        match driver::get_reparse_point(path) {
            Ok(_) => true,
            Err(err) => {
                trace!("{}", err);
                false
            }
        }
    }

    pub fn get_target(junction: &Path) -> Result<PathBuf> {
        let record = driver::get_reparse_point(junction)?;
        Ok(PathBuf::from(OsString::from_wide(&record.target())))
    }

    pub fn get_target_into(junction: &Path, buf: &mut [u16]) -> Result<usize> {
        let record = driver::get_reparse_point(junction)?;
        let target = record.target();
        // Room for the UNICODE_NULL as well.
        if buf.len() <= target.len() {
            return Err(Error::new(ErrorKind::BufferTooSmall).with_path(junction));
        }
        buf[..target.len()].copy_from_slice(&target);
        buf[target.len()] = 0;
        Ok(target.len())
    }
}
