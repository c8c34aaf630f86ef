//! Turns a caller supplied path into the two names stored in a junction.

use super::utf16::{
    DEVICE_PATH_PREFIX, NON_INTERPRETED_PATH_PREFIX, SEPARATOR, VERBATIM_PATH_PREFIX, VERBATIM_UNC_PREFIX,
};
use crate::{Error, ErrorKind, Result};

/// A junction target in both forms a mount point stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTarget {
    /// `C:\dir`, shown to users.
    print_name: Vec<u16>,
    /// `\??\C:\dir`, followed by the filesystem.
    substitute_name: Vec<u16>,
}

impl NormalizedTarget {
    /// Builds both names from an absolute path as returned by `GetFullPathNameW`.
    ///
    /// Only drive-absolute local paths qualify: UNC shares and device
    /// namespace paths cannot be junction targets.
    pub fn from_full_path(full: &[u16]) -> Result<Self> {
        let full: Vec<u16> = full
            .iter()
            .map(|&c| if c == u16::from(b'/') { SEPARATOR } else { c })
            .collect();

        if full.starts_with(&VERBATIM_UNC_PREFIX) {
            return Err(Error::new(ErrorKind::InvalidPath));
        }
        let print_name = if let Some(rest) = full.strip_prefix(&VERBATIM_PATH_PREFIX[..]) {
            rest
        } else if let Some(rest) = full.strip_prefix(&NON_INTERPRETED_PATH_PREFIX[..]) {
            rest
        } else if full.starts_with(&DEVICE_PATH_PREFIX) || full.starts_with(&[SEPARATOR, SEPARATOR]) {
            return Err(Error::new(ErrorKind::InvalidPath));
        } else {
            &full[..]
        };
        if !is_drive_absolute(print_name) {
            return Err(Error::new(ErrorKind::InvalidPath));
        }

        let substitute_name = NON_INTERPRETED_PATH_PREFIX
            .iter()
            .chain(print_name.iter())
            .copied()
            .collect();
        Ok(Self {
            print_name: print_name.to_vec(),
            substitute_name,
        })
    }

    pub fn print_name(&self) -> &[u16] {
        &self.print_name
    }

    pub fn substitute_name(&self) -> &[u16] {
        &self.substitute_name
    }
}

fn is_drive_absolute(path: &[u16]) -> bool {
    match path {
        [drive, colon, sep, ..] => {
            *drive < 0x80
                && (*drive as u8).is_ascii_alphabetic()
                && *colon == u16::from(b':')
                && *sep == SEPARATOR
        }
        _ => false,
    }
}

#[cfg(windows)]
pub use self::windows::normalize;

#[cfg(windows)]
mod windows {
    use std::mem::MaybeUninit;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;
    use std::{io, ptr};

    use super::super::c::{GetFullPathNameW, GetLastError, SetLastError, ERROR_INSUFFICIENT_BUFFER};
    use super::super::utf16::NON_INTERPRETED_PATH_PREFIX;
    use super::NormalizedTarget;
    use crate::{Error, ErrorKind, Result};

    /// Resolves `path` against the current directory and normalizes it.
    ///
    /// NT paths (`\??\C:\dir`) are already absolute and taken as they are;
    /// `GetFullPathNameW` would resolve them against the current drive.
    pub fn normalize(path: &Path) -> Result<NormalizedTarget> {
        let wide: Vec<u16> = path.as_os_str().encode_wide().collect();
        let full = if wide.starts_with(&NON_INTERPRETED_PATH_PREFIX) {
            if wide.contains(&0) {
                return Err(Error::new(ErrorKind::InvalidPath).with_path(path));
            }
            wide
        } else {
            get_full_path(path)?
        };
        NormalizedTarget::from_full_path(&full).map_err(|e| e.with_path(path))
    }

    type MaybeU16 = MaybeUninit<u16>;
    // Returns the absolute form of `target`, without a terminating NUL.
    // Ref: <rust-lang/rust/src/libstd/sys/windows/mod.rs#L106>.
    fn get_full_path(target: &Path) -> Result<Vec<u16>> {
        let invalid = || Error::new(ErrorKind::InvalidPath).with_path(target);
        let mut path: Vec<u16> = target.as_os_str().encode_wide().collect();
        if path.is_empty() || path.contains(&0) {
            return Err(invalid());
        }
        path.push(0);

        let file_part = ptr::null_mut();
        const U16_UNINIT: MaybeU16 = MaybeU16::uninit();
        // Start off with a stack buf but then spill over to the heap if we end up
        // needing more space.
        //
        // This initial size also works around `GetFullPathNameW` returning
        // incorrect size hints for some short paths:
        // https://github.com/dylni/normpath/issues/5
        let mut stack_buf: [MaybeU16; 512] = [U16_UNINIT; 512];
        let mut heap_buf: Vec<MaybeU16> = Vec::new();
        unsafe {
            let mut n = stack_buf.len();
            loop {
                let buf = if n <= stack_buf.len() {
                    &mut stack_buf[..]
                } else {
                    let extra = n - heap_buf.len();
                    heap_buf.reserve(extra);
                    // We used `reserve` and not `reserve_exact`, so in theory we
                    // may have gotten more than requested. If so, we'd like to use
                    // it... so long as we won't cause overflow.
                    n = heap_buf.capacity().min(u32::MAX as usize);
                    // Safety: MaybeUninit<u16> does not need initialization
                    heap_buf.set_len(n);
                    &mut heap_buf[..]
                };

                SetLastError(0);
                let k = GetFullPathNameW(path.as_ptr(), n as u32, maybe_slice_to_ptr(buf), file_part) as usize;
                if k == 0 {
                    return Err(invalid().with_source(io::Error::last_os_error()));
                }
                if GetLastError() == ERROR_INSUFFICIENT_BUFFER {
                    n = n.saturating_mul(2).min(u32::MAX as usize);
                } else if k > n {
                    n = k;
                } else {
                    // Safety: First `k` values are initialized.
                    let slice: &[u16] = maybe_slice_assume_init(&buf[..k]);
                    return Ok(slice.into());
                }
            }
        }
    }

    unsafe fn maybe_slice_to_ptr(s: &mut [MaybeU16]) -> *mut u16 {
        s.as_mut_ptr() as *mut u16
    }

    unsafe fn maybe_slice_assume_init(s: &[MaybeU16]) -> &[u16] {
        // SAFETY: `MaybeUninit<T>` and T are guaranteed to have the same layout
        &*(s as *const [MaybeU16] as *const [u16])
    }
}
