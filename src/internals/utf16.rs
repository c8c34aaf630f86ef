// FIXME(const_generic)
/// Convert ASCII bytes to UTF-16 sequences.
macro_rules! utf16s {
    ($src:expr) => {{
        const SRC: &[u8] = $src;
        const N: usize = SRC.len();
        let mut i = 0;
        let mut dst = [0u16; N];
        while i < N {
            dst[i] = SRC[i] as u16;
            i += 1;
        }
        dst
    }};
}

/// UTF-16 code unit of the path separator `\`.
pub const SEPARATOR: u16 = b'\\' as u16;

/// This prefix indicates to NTFS that the path is to be treated as a non-interpreted
/// path in the virtual file system.
pub const NON_INTERPRETED_PATH_PREFIX: [u16; 4] = utf16s!(br"\??\");
/// Prefix of a Win32 verbatim path, which skips path normalization.
pub const VERBATIM_PATH_PREFIX: [u16; 4] = utf16s!(br"\\?\");
/// Prefix of a verbatim UNC path.
pub const VERBATIM_UNC_PREFIX: [u16; 8] = utf16s!(br"\\?\UNC\");
/// Prefix of a Win32 device namespace path.
pub const DEVICE_PATH_PREFIX: [u16; 4] = utf16s!(br"\\.\");
/// Start of the substitute name of a volume mount point.
pub const VOLUME_GUID_PREFIX: [u16; 11] = utf16s!(br"\??\Volume{");
