// Layout constants of the reparse data structures. They are plain numbers so
// the codec can be built and tested on every platform; on Windows they are
// checked against windows-sys below.

/// Largest reparse data buffer the filesystem accepts or returns, 16 KiB.
pub const MAXIMUM_REPARSE_DATA_BUFFER_SIZE: u32 = 16 * 1024;
/// Reparse tag of a junction (mount point).
pub const IO_REPARSE_TAG_MOUNT_POINT: u32 = 0xA000_0003;
/// Reparse tag of a symbolic link.
#[cfg_attr(not(test), allow(dead_code))]
pub const IO_REPARSE_TAG_SYMLINK: u32 = 0xA000_000C;

/// Reparse Data Buffer header size: `ReparseTag`, `ReparseDataLength`, `Reserved`.
pub const REPARSE_DATA_BUFFER_HEADER_SIZE: u16 = 8;
/// Reparse GUID Data Buffer header size: the above plus a 16 byte GUID.
pub const REPARSE_GUID_DATA_BUFFER_HEADER_SIZE: u16 = 24;
/// MountPointReparseBuffer header size: offset and length of both names.
pub const MOUNT_POINT_REPARSE_BUFFER_HEADER_SIZE: u16 = 8;

#[cfg(windows)]
pub use self::sys::*;

#[cfg(windows)]
mod sys {
    use std::alloc::Layout;
    use std::mem::size_of;
    use std::os::windows::io::RawHandle;

    use windows_sys::core::GUID;
    pub use windows_sys::Win32::Foundation::{
        CloseHandle, GetLastError, SetLastError, ERROR_ACCESS_DENIED, ERROR_ALREADY_EXISTS, ERROR_BAD_PATHNAME,
        ERROR_DIR_NOT_EMPTY, ERROR_FILE_EXISTS, ERROR_FILE_NOT_FOUND, ERROR_INSUFFICIENT_BUFFER, ERROR_INVALID_NAME,
        ERROR_NOT_ALL_ASSIGNED, ERROR_NOT_A_REPARSE_POINT, ERROR_PATH_NOT_FOUND, ERROR_PRIVILEGE_NOT_HELD,
        ERROR_REPARSE_ATTRIBUTE_CONFLICT, GENERIC_READ, GENERIC_WRITE, HANDLE,
    };
    pub use windows_sys::Win32::Security::{
        AdjustTokenPrivileges, LookupPrivilegeValueW, SE_PRIVILEGE_ENABLED, TOKEN_ADJUST_PRIVILEGES, TOKEN_PRIVILEGES,
    };
    // See more in <https://learn.microsoft.com/en-us/windows/win32/secauthz/privilege-constants>.
    pub use windows_sys::Win32::Security::{SE_BACKUP_NAME, SE_RESTORE_NAME};
    pub use windows_sys::Win32::Storage::FileSystem::{
        GetFileAttributesW, GetFullPathNameW, SetFileAttributesW, FILE_ATTRIBUTE_READONLY, FILE_FLAG_BACKUP_SEMANTICS,
        FILE_FLAG_OPEN_REPARSE_POINT, FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE, INVALID_FILE_ATTRIBUTES,
    };
    pub use windows_sys::Win32::System::Ioctl::{
        FSCTL_DELETE_REPARSE_POINT, FSCTL_GET_REPARSE_POINT, FSCTL_SET_REPARSE_POINT,
    };
    pub use windows_sys::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};
    pub use windows_sys::Win32::System::IO::DeviceIoControl;

    // Makes sure layout of RawHandle and windows-sys's HANDLE are the same
    // for pointer casts between them.
    const _: () = {
        let std_layout = Layout::new::<RawHandle>();
        let win_sys_layout = Layout::new::<HANDLE>();
        assert!(std_layout.size() == win_sys_layout.size());
        assert!(std_layout.align() == win_sys_layout.align());
    };

    // Our copies of the layout constants must agree with the platform headers.
    const _: () = {
        use windows_sys::Win32::Storage::FileSystem::MAXIMUM_REPARSE_DATA_BUFFER_SIZE as SYS_MAX;
        use windows_sys::Win32::System::SystemServices::{
            IO_REPARSE_TAG_MOUNT_POINT as SYS_MOUNT_POINT, IO_REPARSE_TAG_SYMLINK as SYS_SYMLINK,
        };
        assert!(super::MAXIMUM_REPARSE_DATA_BUFFER_SIZE == SYS_MAX);
        assert!(super::IO_REPARSE_TAG_MOUNT_POINT == SYS_MOUNT_POINT);
        assert!(super::IO_REPARSE_TAG_SYMLINK == SYS_SYMLINK);

        let rgdb_header_size = size_of::<u32>() + size_of::<u16>() * 2 + size_of::<GUID>();
        assert!(rgdb_header_size == super::REPARSE_GUID_DATA_BUFFER_HEADER_SIZE as usize);
    };
}
