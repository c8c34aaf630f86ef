//! Encoding and decoding of mount point reparse data buffers.
//!
//! Layout, all fields little endian:
//!
//! ```text
//! offset  size  field
//!      0     4  ReparseTag
//!      4     2  ReparseDataLength      (bytes after Reserved)
//!      6     2  Reserved
//!      8     2  SubstituteNameOffset   (relative to PathBuffer)
//!     10     2  SubstituteNameLength   (bytes, without UNICODE_NULL)
//!     12     2  PrintNameOffset
//!     14     2  PrintNameLength
//!     16     -  PathBuffer
//! ```
//!
//! See <https://learn.microsoft.com/en-us/windows-hardware/drivers/ddi/ntifs/ns-ntifs-_reparse_data_buffer>.

use std::borrow::Cow;
use std::ops::Range;

use super::c::{
    IO_REPARSE_TAG_MOUNT_POINT, MAXIMUM_REPARSE_DATA_BUFFER_SIZE, MOUNT_POINT_REPARSE_BUFFER_HEADER_SIZE,
    REPARSE_DATA_BUFFER_HEADER_SIZE, REPARSE_GUID_DATA_BUFFER_HEADER_SIZE,
};
use super::utf16::{NON_INTERPRETED_PATH_PREFIX, SEPARATOR, VERBATIM_PATH_PREFIX, VOLUME_GUID_PREFIX};
use crate::{Error, ErrorKind, Result};

const WCHAR_SIZE: usize = std::mem::size_of::<u16>();
const UNICODE_NULL_SIZE: usize = WCHAR_SIZE;
const PATH_BUFFER_OFFSET: usize =
    (REPARSE_DATA_BUFFER_HEADER_SIZE + MOUNT_POINT_REPARSE_BUFFER_HEADER_SIZE) as usize;

/// In-memory form of a mount point reparse data buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReparseRecord {
    substitute_name: Vec<u16>,
    print_name: Vec<u16>,
}

impl ReparseRecord {
    /// Builds the record for a new junction.
    ///
    /// `substitute_name` is the `\??\`-prefixed path the filesystem follows and
    /// gets a trailing separator like native junctions do; `print_name` is
    /// stored as given.
    pub fn mount_point(substitute_name: &[u16], print_name: &[u16]) -> Result<Self> {
        let mut substitute_name = substitute_name.to_vec();
        if substitute_name.last() != Some(&SEPARATOR) {
            substitute_name.push(SEPARATOR);
        }
        let record = Self {
            substitute_name,
            print_name: print_name.to_vec(),
        };
        if record.encoded_len() > MAXIMUM_REPARSE_DATA_BUFFER_SIZE as usize {
            return Err(Error::new(ErrorKind::BufferTooLarge));
        }
        Ok(record)
    }

    /// The directory the junction points to, in display form.
    ///
    /// Junctions written by some tools, and volume mount points, carry an
    /// empty print name. The substitute name is used for them: without its
    /// `\??\` prefix for drive paths, as a `\\?\Volume{..}\` path for volumes.
    pub fn target(&self) -> Cow<'_, [u16]> {
        if !self.print_name.is_empty() {
            return Cow::Borrowed(&self.print_name);
        }
        if self.substitute_name.starts_with(&VOLUME_GUID_PREFIX) {
            let rest = &self.substitute_name[NON_INTERPRETED_PATH_PREFIX.len()..];
            return Cow::Owned(VERBATIM_PATH_PREFIX.iter().chain(rest).copied().collect());
        }
        Cow::Borrowed(
            self.substitute_name
                .strip_prefix(&NON_INTERPRETED_PATH_PREFIX[..])
                .unwrap_or(&self.substitute_name),
        )
    }

    /// Value of the `ReparseDataLength` field.
    pub fn data_length(&self) -> usize {
        MOUNT_POINT_REPARSE_BUFFER_HEADER_SIZE as usize
            + self.substitute_name.len() * WCHAR_SIZE
            + UNICODE_NULL_SIZE
            + self.print_name.len() * WCHAR_SIZE
            + UNICODE_NULL_SIZE
    }

    /// Size in bytes of the whole request passed to `FSCTL_SET_REPARSE_POINT`.
    pub fn encoded_len(&self) -> usize {
        REPARSE_DATA_BUFFER_HEADER_SIZE as usize + self.data_length()
    }

    /// Writes the record into `buf` and returns the number of bytes used.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let len = self.encoded_len();
        if len > buf.len() || len > MAXIMUM_REPARSE_DATA_BUFFER_SIZE as usize {
            return Err(Error::new(ErrorKind::BufferTooLarge));
        }
        let buf = &mut buf[..len];
        buf.fill(0);

        // Names are NUL terminated but the terminators are not part of the lengths.
        let substitute_len = self.substitute_name.len() * WCHAR_SIZE;
        let print_offset = substitute_len + UNICODE_NULL_SIZE;
        let print_len = self.print_name.len() * WCHAR_SIZE;

        // Every value below fits in u16: `len` is at most 16 KiB.
        put_u32(buf, 0, IO_REPARSE_TAG_MOUNT_POINT);
        put_u16(buf, 4, self.data_length() as u16);
        put_u16(buf, 6, 0);
        put_u16(buf, 8, 0);
        put_u16(buf, 10, substitute_len as u16);
        put_u16(buf, 12, print_offset as u16);
        put_u16(buf, 14, print_len as u16);

        let path_buffer = &mut buf[PATH_BUFFER_OFFSET..];
        put_wide(path_buffer, 0, &self.substitute_name);
        put_wide(path_buffer, print_offset, &self.print_name);
        Ok(len)
    }

    /// Parses the output of `FSCTL_GET_REPARSE_POINT`.
    ///
    /// Trailing separators are removed from both names, except where that
    /// would turn a root into a relative path.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < REPARSE_DATA_BUFFER_HEADER_SIZE as usize {
            return Err(malformed());
        }
        match get_u32(buf, 0) {
            IO_REPARSE_TAG_MOUNT_POINT => {}
            0 => return Err(Error::new(ErrorKind::NotAJunction)),
            _ => return Err(Error::new(ErrorKind::UnsupportedReparseTag)),
        }

        let data_length = usize::from(get_u16(buf, 4));
        let end = REPARSE_DATA_BUFFER_HEADER_SIZE as usize + data_length;
        if data_length < MOUNT_POINT_REPARSE_BUFFER_HEADER_SIZE as usize || end > buf.len() {
            return Err(malformed());
        }
        let path_buffer = &buf[PATH_BUFFER_OFFSET..end];

        let substitute = name_span(path_buffer, get_u16(buf, 8), get_u16(buf, 10))?;
        let print = name_span(path_buffer, get_u16(buf, 12), get_u16(buf, 14))?;
        if overlaps(&substitute, &print) {
            return Err(malformed());
        }

        let substitute_name = get_wide(&path_buffer[substitute]);
        let print_name = get_wide(&path_buffer[print]);
        Ok(Self {
            substitute_name: trim_trailing_separator(&substitute_name).to_vec(),
            print_name: trim_trailing_separator(&print_name).to_vec(),
        })
    }
}

/// Input of `FSCTL_DELETE_REPARSE_POINT`: a GUID buffer header carrying the
/// mount point tag and no data.
///
/// See <https://learn.microsoft.com/en-us/windows/win32/api/winioctl/ni-winioctl-fsctl_delete_reparse_point>.
pub fn delete_request() -> [u8; REPARSE_GUID_DATA_BUFFER_HEADER_SIZE as usize] {
    let mut buf = [0u8; REPARSE_GUID_DATA_BUFFER_HEADER_SIZE as usize];
    put_u32(&mut buf, 0, IO_REPARSE_TAG_MOUNT_POINT);
    buf
}

fn malformed() -> Error {
    Error::new(ErrorKind::MalformedBuffer)
}

fn name_span(path_buffer: &[u8], offset: u16, len: u16) -> Result<Range<usize>> {
    let (offset, len) = (usize::from(offset), usize::from(len));
    if offset % WCHAR_SIZE != 0 || len % WCHAR_SIZE != 0 || offset + len > path_buffer.len() {
        return Err(malformed());
    }
    Ok(offset..offset + len)
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    !a.is_empty() && !b.is_empty() && a.start < b.end && b.start < a.end
}

fn trim_trailing_separator(name: &[u16]) -> &[u16] {
    match name.split_last() {
        Some((&SEPARATOR, rest)) if !is_root(rest) => rest,
        _ => name,
    }
}

// `rest` is the name without its trailing separator.
fn is_root(rest: &[u16]) -> bool {
    match rest.last() {
        None => true,
        Some(&c) if c == u16::from(b':') => true,
        Some(_) => {
            rest.starts_with(&VOLUME_GUID_PREFIX) && !rest[VOLUME_GUID_PREFIX.len()..].contains(&SEPARATOR)
        }
    }
}

fn get_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn get_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn get_wide(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(WCHAR_SIZE)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect()
}

fn put_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_wide(buf: &mut [u8], at: usize, wide: &[u16]) {
    for (i, c) in wide.iter().enumerate() {
        put_u16(buf, at + i * WCHAR_SIZE, *c);
    }
}
