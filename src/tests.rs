use std::env;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::os::windows::ffi::OsStrExt;
use std::os::windows::fs::{symlink_dir, symlink_file};
use std::path::Path;

use tempfile::TempDir;
use windows_sys::Win32::Storage::FileSystem::{GetFileAttributesW, SetFileAttributesW, FILE_ATTRIBUTE_READONLY};

use crate::ErrorKind;

// https://docs.microsoft.com/en-us/windows/desktop/debug/system-error-codes
const ERROR_NOT_A_REPARSE_POINT: i32 = 0x1126;
const ERROR_ALREADY_EXISTS: i32 = 0xb7;

fn create_tempdir() -> TempDir {
    tempfile::Builder::new()
        .prefix("junction-test-")
        .tempdir_in("target/debug")
        .unwrap()
}

fn write_file(path: &Path, contents: &[u8]) {
    File::create(path).unwrap().write_all(contents).unwrap();
}

// Flips the read-only attribute of `path` itself, never of a junction's target.
fn set_readonly(path: &Path, readonly: bool) {
    let wide: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();
    unsafe {
        let attrs = GetFileAttributesW(wide.as_ptr());
        assert_ne!(attrs, u32::MAX, "no attributes for {:?}", path);
        let attrs = if readonly {
            attrs | FILE_ATTRIBUTE_READONLY
        } else {
            attrs & !FILE_ATTRIBUTE_READONLY
        };
        assert_ne!(SetFileAttributesW(wide.as_ptr(), attrs), 0);
    }
}

#[test]
fn create_dir_all_with_junctions() {
    let tmpdir = create_tempdir();
    let target = tmpdir.path().join("target");

    let junction = tmpdir.path().join("junction");
    let b = junction.join("a/b");

    fs::create_dir_all(&target).unwrap();

    super::create(&target, &junction).unwrap();
    fs::create_dir_all(&b).unwrap();
    // the junction itself is not a directory, but `is_dir()` on a Path
    // follows links
    assert!(junction.is_dir());
    assert!(b.exists());
    assert!(target.join("a/b").is_dir());
}

#[test]
fn create_recursive_rmdir() {
    let tmpdir = create_tempdir();
    let d1 = tmpdir.path().join("d1"); // "d1"
    let dt = d1.join("t"); // "d1/t"
    let dtt = dt.join("t"); // "d1/t/t"
    let d2 = tmpdir.path().join("d2"); // "d2"
    let canary = d2.join("do_not_delete"); // "d2/do_not_delete"

    fs::create_dir_all(dtt).unwrap();
    fs::create_dir_all(&d2).unwrap();
    write_file(&canary, b"foo");

    super::create(d2, dt.join("d2")).unwrap(); // "d1/t/d2" -> "d2"

    let _ = symlink_file(&canary, d1.join("canary")); // d1/canary -> d2/do_not_delete
    fs::remove_dir_all(&d1).unwrap();

    assert!(!d1.is_dir());
    assert!(canary.exists());
}

#[test]
fn create_recursive_rmdir_of_symlink() {
    // test we do not recursively delete a symlink but only dirs.
    let tmpdir = create_tempdir();
    let link = tmpdir.path().join("link");
    let dir = tmpdir.path().join("dir");
    let canary = dir.join("do_not_delete");
    fs::create_dir_all(&dir).unwrap();
    write_file(&canary, b"foo");
    super::create(&dir, &link).unwrap();
    fs::remove_dir_all(&link).unwrap();

    assert!(!link.is_dir());
    assert!(canary.exists());
}

#[test]
fn create_directory_exist_before() {
    let tmpdir = create_tempdir();

    let target = tmpdir.path().join("target");
    let junction = tmpdir.path().join("junction");

    fs::create_dir_all(&target).unwrap();
    fs::create_dir_all(&junction).unwrap();
    write_file(&junction.join("keep"), b"foo");

    let err = super::create(&target, &junction).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(err.raw_os_error(), Some(ERROR_ALREADY_EXISTS));
    assert!(!super::is_junction(&junction));
    assert!(junction.join("keep").exists(), "existing directory must be left alone");
}

#[test]
fn create_over_file() {
    let tmpdir = create_tempdir();
    let target = tmpdir.path().join("target");
    let junction = tmpdir.path().join("junction");
    fs::create_dir_all(&target).unwrap();
    write_file(&junction, b"foo");

    let err = super::create(&target, &junction).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert!(junction.is_file());
}

#[test]
fn create_target_no_exist() {
    let tmpdir = create_tempdir();

    let target = tmpdir.path().join("target");
    let junction = tmpdir.path().join("junction");

    let err = super::create(&target, &junction).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TargetNotFound);
    assert_eq!(err.path(), Some(target.as_path()));
    assert!(!junction.exists(), "nothing may be left behind");
}

#[test]
fn create_target_is_file() {
    let tmpdir = create_tempdir();

    let target = tmpdir.path().join("target");
    let junction = tmpdir.path().join("junction");
    write_file(&target, b"foo");

    let err = super::create(&target, &junction).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TargetNotFound);
    assert!(!junction.exists());
}

#[test]
fn create_junction_parent_missing() {
    let tmpdir = create_tempdir();
    let target = tmpdir.path().join("target");
    let junction = tmpdir.path().join("missing").join("junction");
    fs::create_dir_all(&target).unwrap();

    let err = super::create(&target, &junction).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn create_relative_target() {
    let tmpdir = create_tempdir();
    let target = tmpdir.path().join("target");
    let junction = tmpdir.path().join("junction");
    fs::create_dir_all(&target).unwrap();

    let cwd = env::current_dir().unwrap();
    let relative = target.strip_prefix(&cwd).unwrap();
    assert!(relative.is_relative());

    super::create(relative, &junction).unwrap();
    let resolved = super::get_target(&junction).unwrap();
    assert!(resolved.is_absolute());
    assert_eq!(resolved, target);
}

#[test]
fn create_with_forward_slashes() {
    let tmpdir = create_tempdir();
    let target = tmpdir.path().join("target");
    let junction = tmpdir.path().join("junction");
    fs::create_dir_all(&target).unwrap();

    let slashed = target.to_str().unwrap().replace('\\', "/");
    super::create(&slashed, &junction).unwrap();
    assert!(!super::get_target(&junction).unwrap().to_str().unwrap().contains('/'));
}

#[test]
fn delete_junctions() {
    let tmpdir = create_tempdir();

    let non_existence_dir = tmpdir.path().join("non_existence_dir");
    let err = super::delete(non_existence_dir).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let dir_not_junction = tmpdir.path().join("dir_not_junction");
    fs::create_dir_all(&dir_not_junction).unwrap();
    write_file(&dir_not_junction.join("keep"), b"foo");
    let err = super::delete(&dir_not_junction).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAJunction);
    assert_eq!(err.raw_os_error(), Some(ERROR_NOT_A_REPARSE_POINT));
    assert!(dir_not_junction.join("keep").exists(), "plain directory must be left alone");

    let file = tmpdir.path().join("foo-file");
    write_file(&file, b"foo");
    let err = super::delete(&file).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAJunction);
    assert!(file.exists());
}

#[test]
fn delete_keeps_target() {
    let tmpdir = create_tempdir();
    let target = tmpdir.path().join("target");
    let junction = tmpdir.path().join("junction");
    let nested = target.join("nested");
    fs::create_dir_all(&nested).unwrap();
    write_file(&target.join("file"), b"foo");
    write_file(&nested.join("file"), b"bar");

    super::create(&target, &junction).unwrap();
    super::delete(&junction).unwrap();

    assert!(!junction.exists(), "junction directory entry is removed");
    let mut contents = String::new();
    File::open(target.join("file"))
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "foo");
    assert!(nested.join("file").exists());
}

#[test]
fn delete_readonly_junction() {
    let tmpdir = create_tempdir();
    let target = tmpdir.path().join("target");
    let junction = tmpdir.path().join("junction");
    fs::create_dir_all(&target).unwrap();
    write_file(&target.join("file"), b"foo");

    super::create(&target, &junction).unwrap();
    set_readonly(&junction, true);
    assert!(fs::symlink_metadata(&junction).unwrap().permissions().readonly());
    assert!(!fs::metadata(&target).unwrap().permissions().readonly());

    super::delete(&junction).unwrap();
    assert!(fs::symlink_metadata(&junction).is_err(), "junction directory entry is removed");
    assert!(target.join("file").exists());
    assert!(!fs::metadata(&target).unwrap().permissions().readonly());
}

#[test]
fn delete_readonly_non_junctions() {
    let tmpdir = create_tempdir();

    let file = tmpdir.path().join("readonly-file");
    write_file(&file, b"foo");
    set_readonly(&file, true);
    let err = super::delete(&file).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAJunction);
    assert!(file.exists());
    assert!(fs::metadata(&file).unwrap().permissions().readonly());

    let dir = tmpdir.path().join("readonly-dir");
    fs::create_dir_all(&dir).unwrap();
    set_readonly(&dir, true);
    let err = super::delete(&dir).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAJunction);
    assert_eq!(err.raw_os_error(), Some(ERROR_NOT_A_REPARSE_POINT));
    assert!(dir.is_dir());
    assert!(fs::metadata(&dir).unwrap().permissions().readonly());

    set_readonly(&file, false);
    set_readonly(&dir, false);
}

#[test]
fn dangling_junction() {
    let tmpdir = create_tempdir();
    let target = tmpdir.path().join("target");
    let junction = tmpdir.path().join("junction");
    fs::create_dir_all(&target).unwrap();

    super::create(&target, &junction).unwrap();
    fs::remove_dir(&target).unwrap();

    assert!(super::is_junction(&junction));
    assert_eq!(super::get_target(&junction).unwrap(), target);
    super::delete(&junction).unwrap();
    assert!(!super::is_junction(&junction));
}

#[test]
fn is_junction_verify() {
    let tmpdir = create_tempdir();

    // Check no such directory or file
    let no_such_dir = tmpdir.path().join("no_such_dir");
    assert!(!super::is_junction(no_such_dir));

    // Target exists but not a junction
    let file = tmpdir.path().join("file");
    write_file(&file, b"foo");
    assert!(!super::is_junction(&file));

    let target = tmpdir.path().join("target");
    let junction = tmpdir.path().join("junction");
    let file = target.join("file");
    let junction_file = junction.join("file");

    fs::create_dir_all(&target).unwrap();
    write_file(&file, b"foo");
    assert!(!super::is_junction(&target));

    assert!(
        !junction_file.exists(),
        "file should not be located until junction created"
    );
    assert!(!super::is_junction(&junction), "junction not created yet");

    super::create(&target, &junction).unwrap();
    assert!(super::is_junction(&junction), "junction should exist now");
    assert_eq!(&super::get_target(&junction).unwrap(), &target);
    assert!(junction_file.exists(), "file should be accessible via the junction");

    super::delete(&junction).unwrap();
    assert!(!super::is_junction(&junction), "junction had been deleted");
    assert!(
        !junction_file.exists(),
        "file should not be located after junction deleted"
    );
    assert!(file.exists(), "target should not be deleted");
}

#[test]
fn directory_symlink_is_not_a_junction() {
    let tmpdir = create_tempdir();
    let target = tmpdir.path().join("target");
    let symlink = tmpdir.path().join("symlink");
    fs::create_dir_all(&target).unwrap();
    if symlink_dir(&target, &symlink).is_err() {
        // Needs developer mode or SeCreateSymbolicLinkPrivilege.
        return;
    }

    assert!(!super::is_junction(&symlink));
    let err = super::get_target(&symlink).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedReparseTag);
    let err = super::delete(&symlink).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAJunction);
    assert!(symlink.exists(), "symlink must not be deleted");
}

#[test]
fn get_target_user_dirs() {
    // junction
    assert_eq!(
        super::get_target(r"C:\Users\Default User").unwrap().to_str(),
        Some(r"C:\Users\Default"),
    );
    // junction with special permissions
    #[cfg(feature = "unstable_admin")]
    assert_eq!(
        super::get_target(r"C:\Documents and Settings\").unwrap().to_str(),
        Some(r"C:\Users"),
    );

    let tmpdir = create_tempdir();

    let non_existence_dir = tmpdir.path().join("non_existence_dir");
    let err = super::get_target(non_existence_dir).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let dir_not_junction = tmpdir.path().join("dir_not_junction");
    fs::create_dir_all(&dir_not_junction).unwrap();
    let err = super::get_target(dir_not_junction).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAReparsePoint);
    assert_eq!(err.raw_os_error(), Some(ERROR_NOT_A_REPARSE_POINT));

    let file = tmpdir.path().join("foo-file");
    write_file(&file, b"foo");
    let err = super::get_target(file).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAReparsePoint);
}

#[test]
fn get_target_into_capacity() {
    let tmpdir = create_tempdir();
    let target = tmpdir.path().join("target");
    let junction = tmpdir.path().join("junction");
    fs::create_dir_all(&target).unwrap();
    super::create(&target, &junction).unwrap();

    let expected: Vec<u16> = super::get_target(&junction)
        .unwrap()
        .to_str()
        .unwrap()
        .encode_utf16()
        .collect();

    // The terminator needs a slot too.
    let mut exact = vec![0xFFFFu16; expected.len()];
    let err = super::get_target_into(&junction, &mut exact).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
    assert!(exact.iter().all(|&c| c == 0xFFFF), "buffer untouched on failure");

    let mut buf = vec![0xFFFFu16; expected.len() + 1];
    let len = super::get_target_into(&junction, &mut buf).unwrap();
    assert_eq!(len, expected.len());
    assert_eq!(&buf[..len], &expected[..]);
    assert_eq!(buf[len], 0);
}

#[test]
fn recreate_from_reported_target() {
    let tmpdir = create_tempdir();
    let target = tmpdir.path().join("target");
    let first = tmpdir.path().join("first");
    let second = tmpdir.path().join("second");
    fs::create_dir_all(&target).unwrap();

    super::create(&target, &first).unwrap();
    super::create(super::get_target(&first).unwrap(), &second).unwrap();
    assert_eq!(super::get_target(&first).unwrap(), super::get_target(&second).unwrap());
}

#[test]
fn scenario() {
    let tmpdir = create_tempdir();
    let test_dir = tmpdir.path().join("TestDir");
    let junction = tmpdir.path().join("TestDirJunc");
    fs::create_dir_all(&test_dir).unwrap();
    File::create(test_dir.join("boo.txt")).unwrap();

    assert!(!super::is_junction(&test_dir));
    super::create(&test_dir, &junction).unwrap();
    assert!(super::is_junction(&junction));
    assert_eq!(super::get_target(&junction).unwrap(), test_dir);
    File::open(junction.join("boo.txt")).unwrap();

    super::delete(&junction).unwrap();
    assert!(!super::is_junction(&junction));
    assert!(test_dir.join("boo.txt").exists());
}
