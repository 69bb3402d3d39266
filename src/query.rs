//! Status and access queries
//!
//! The same questions can be asked of a path or of an open handle. Path
//! queries resolve against the process working directory at call time;
//! handle queries go to the file the handle already refers to.

use crate::error::{PathError, Result};
use crate::handle::{Access, Handle};
use crate::metadata::Metadata;
use crate::paths::PosixPath;
use crate::sys;

/// Something whose file status can be queried
pub trait Inspect {
    /// Status, following a trailing symlink
    fn stat(&self) -> Result<Metadata>;

    /// Status of a trailing symlink itself
    fn lstat(&self) -> Result<Metadata>;

    /// Access check with the effective credentials
    fn access(&self, mode: Access) -> Result<bool>;
}

impl Inspect for PosixPath {
    fn stat(&self) -> Result<Metadata> {
        sys::fstatat(sys::AT_FDCWD, self.as_str(), true)
    }

    fn lstat(&self) -> Result<Metadata> {
        sys::fstatat(sys::AT_FDCWD, self.as_str(), false)
    }

    fn access(&self, mode: Access) -> Result<bool> {
        sys::faccessat(sys::AT_FDCWD, self.as_str(), mode.to_native())
    }
}

impl Inspect for Handle {
    fn stat(&self) -> Result<Metadata> {
        Handle::stat(self)
    }

    /// Same as `stat`: a handle is already resolved
    fn lstat(&self) -> Result<Metadata> {
        Handle::stat(self)
    }

    fn access(&self, mode: Access) -> Result<bool> {
        Handle::access(self, mode)
    }
}

/// A missing entry, or a non-directory used as a path component
fn is_missing(err: &PathError) -> bool {
    err.is_not_found() || err.os_code() == Some(libc::ENOTDIR)
}

fn missing_as_false(result: Result<bool>) -> Result<bool> {
    match result {
        Err(err) if is_missing(&err) => Ok(false),
        other => other,
    }
}

pub fn stat<T: Inspect + ?Sized>(target: &T) -> Result<Metadata> {
    target.stat()
}

pub fn lstat<T: Inspect + ?Sized>(target: &T) -> Result<Metadata> {
    target.lstat()
}

/// Whether the target exists; a missing component is `false`, not an error
pub fn exists<T: Inspect + ?Sized>(target: &T) -> Result<bool> {
    missing_as_false(target.stat().map(|_| true))
}

pub fn is_dir<T: Inspect + ?Sized>(target: &T) -> Result<bool> {
    missing_as_false(target.stat().map(|m| m.is_dir()))
}

pub fn is_file<T: Inspect + ?Sized>(target: &T) -> Result<bool> {
    missing_as_false(target.stat().map(|m| m.is_file()))
}

/// Checks the link itself, so a dangling symlink still counts
pub fn is_symlink<T: Inspect + ?Sized>(target: &T) -> Result<bool> {
    missing_as_false(target.lstat().map(|m| m.is_symlink()))
}

pub fn is_readable<T: Inspect + ?Sized>(target: &T) -> Result<bool> {
    missing_as_false(target.access(Access::READ))
}

pub fn is_writable<T: Inspect + ?Sized>(target: &T) -> Result<bool> {
    missing_as_false(target.access(Access::WRITE))
}

pub fn is_executable<T: Inspect + ?Sized>(target: &T) -> Result<bool> {
    missing_as_false(target.access(Access::EXECUTE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::OpenFlags;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn path_in(dir: &TempDir, name: &str) -> PosixPath {
        PosixPath::try_from(dir.path().join(name).as_path()).unwrap()
    }

    #[test]
    fn test_path_queries() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("file"), b"data").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let file = path_in(&dir, "file");
        let sub = path_in(&dir, "sub");
        assert!(exists(&file).unwrap());
        assert!(is_file(&file).unwrap());
        assert!(!is_dir(&file).unwrap());
        assert!(is_dir(&sub).unwrap());
        assert!(!is_symlink(&sub).unwrap());
        assert_eq!(stat(&file).unwrap().size, 4);
    }

    #[test]
    fn test_missing_is_false() {
        let dir = TempDir::new().unwrap();
        let missing = path_in(&dir, "missing");
        assert!(!exists(&missing).unwrap());
        assert!(!is_file(&missing).unwrap());
        assert!(!is_readable(&missing).unwrap());
        assert!(stat(&missing).unwrap_err().is_not_found());
    }

    #[test]
    fn test_file_as_directory_component_is_false() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("file"), b"").unwrap();
        let through_file = path_in(&dir, "file").join_segment("x").unwrap();

        assert_eq!(exists(&through_file), Ok(false));
        assert_eq!(is_dir(&through_file), Ok(false));
        assert_eq!(is_file(&through_file), Ok(false));
        assert_eq!(is_symlink(&through_file), Ok(false));
        assert_eq!(is_readable(&through_file), Ok(false));
        assert_eq!(is_writable(&through_file), Ok(false));
        assert_eq!(is_executable(&through_file), Ok(false));
        assert_eq!(stat(&through_file).unwrap_err().os_code(), Some(libc::ENOTDIR));
    }

    #[test]
    fn test_dangling_symlink() {
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("link")).unwrap();
        let link = path_in(&dir, "link");
        assert!(!exists(&link).unwrap());
        assert!(is_symlink(&link).unwrap());
        assert!(lstat(&link).unwrap().is_symlink());
    }

    #[test]
    fn test_access_bits() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("script");
        std::fs::write(&script, b"#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let script = path_in(&dir, "script");
        assert!(is_readable(&script).unwrap());
        assert!(is_executable(&script).unwrap());
    }

    #[test]
    fn test_handle_queries() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("file"), b"abc").unwrap();
        let mut handle = Handle::open(&path_in(&dir, "file"), OpenFlags::READ).unwrap();
        assert!(is_file(&handle).unwrap());
        assert!(exists(&handle).unwrap());
        assert!(is_readable(&handle).unwrap());
        assert_eq!(lstat(&handle).unwrap(), stat(&handle).unwrap());

        handle.close().unwrap();
        assert!(matches!(
            exists(&handle),
            Err(PathError::HandleClosed { .. })
        ));
    }
}
