//! Native call boundary
//!
//! Every `libc` call in the crate lives here. Callers get typed results and
//! [`PathError::Os`] values naming the call that failed; raw structures never
//! leave this module.

use std::ffi::{CStr, CString};
use std::mem;
use std::os::raw::c_int;
use std::os::unix::io::RawFd;
use std::ptr::NonNull;

use crate::error::{InvalidReason, PathError, Result};
use crate::metadata::{FileKind, Metadata};

pub(crate) const AT_FDCWD: RawFd = libc::AT_FDCWD;

fn cstring(text: &str) -> Result<CString> {
    CString::new(text).map_err(|_| PathError::invalid(text, InvalidReason::Char, Some("\0")))
}

fn check(call: &'static str, res: c_int) -> Result<c_int> {
    if res < 0 {
        Err(PathError::last_os_error(call))
    } else {
        Ok(res)
    }
}

pub(crate) fn open(path: &str, flags: c_int, mode: u32) -> Result<RawFd> {
    let cstr = cstring(path)?;
    check("open", unsafe {
        libc::open(cstr.as_ptr(), flags | libc::O_CLOEXEC, mode as libc::c_uint)
    })
}

pub(crate) fn openat(dirfd: RawFd, path: &str, flags: c_int, mode: u32) -> Result<RawFd> {
    let cstr = cstring(path)?;
    check("openat", unsafe {
        libc::openat(dirfd, cstr.as_ptr(), flags | libc::O_CLOEXEC, mode as libc::c_uint)
    })
}

pub(crate) fn close(fd: RawFd) -> Result<()> {
    check("close", unsafe { libc::close(fd) }).map(drop)
}

pub(crate) fn dup(fd: RawFd) -> Result<RawFd> {
    check("fcntl", unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, 0) })
}

pub(crate) fn read(fd: RawFd, buf: &mut [u8]) -> Result<usize> {
    let res = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
    if res < 0 {
        return Err(PathError::last_os_error("read"));
    }
    Ok(res as usize)
}

pub(crate) fn write(fd: RawFd, buf: &[u8]) -> Result<usize> {
    let res = unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) };
    if res < 0 {
        return Err(PathError::last_os_error("write"));
    }
    Ok(res as usize)
}

pub(crate) fn fsync(fd: RawFd) -> Result<()> {
    check("fsync", unsafe { libc::fsync(fd) }).map(drop)
}

pub(crate) fn fstat(fd: RawFd) -> Result<Metadata> {
    let mut st = unsafe { mem::zeroed::<libc::stat>() };
    check("fstat", unsafe { libc::fstat(fd, &mut st) })?;
    Ok(metadata_from_raw(&st))
}

pub(crate) fn fstatat(dirfd: RawFd, path: &str, follow: bool) -> Result<Metadata> {
    let cstr = cstring(path)?;
    let flags = if follow { 0 } else { libc::AT_SYMLINK_NOFOLLOW };
    let mut st = unsafe { mem::zeroed::<libc::stat>() };
    check("fstatat", unsafe {
        libc::fstatat(dirfd, cstr.as_ptr(), &mut st, flags)
    })?;
    Ok(metadata_from_raw(&st))
}

/// Effective-credential access check; denial is `Ok(false)`, not an error
pub(crate) fn faccessat(dirfd: RawFd, path: &str, mode: c_int) -> Result<bool> {
    let cstr = cstring(path)?;
    let res = unsafe { libc::faccessat(dirfd, cstr.as_ptr(), mode, libc::AT_EACCESS) };
    if res == 0 {
        return Ok(true);
    }
    let err = PathError::last_os_error("faccessat");
    match err.os_code() {
        Some(libc::EACCES) | Some(libc::EPERM) | Some(libc::EROFS) | Some(libc::ETXTBSY) => {
            Ok(false)
        }
        _ => Err(err),
    }
}

pub(crate) fn mkdirat(dirfd: RawFd, path: &str, mode: u32) -> Result<()> {
    let cstr = cstring(path)?;
    check("mkdirat", unsafe {
        libc::mkdirat(dirfd, cstr.as_ptr(), mode as libc::mode_t)
    })
    .map(drop)
}

pub(crate) fn unlinkat(dirfd: RawFd, path: &str, remove_dir: bool) -> Result<()> {
    let cstr = cstring(path)?;
    let flags = if remove_dir { libc::AT_REMOVEDIR } else { 0 };
    check("unlinkat", unsafe { libc::unlinkat(dirfd, cstr.as_ptr(), flags) }).map(drop)
}

pub(crate) fn renameat(old_dirfd: RawFd, old: &str, new_dirfd: RawFd, new: &str) -> Result<()> {
    let old = cstring(old)?;
    let new = cstring(new)?;
    check("renameat", unsafe {
        libc::renameat(old_dirfd, old.as_ptr(), new_dirfd, new.as_ptr())
    })
    .map(drop)
}

pub(crate) fn linkat(old_dirfd: RawFd, old: &str, new_dirfd: RawFd, new: &str) -> Result<()> {
    let old = cstring(old)?;
    let new = cstring(new)?;
    check("linkat", unsafe {
        libc::linkat(old_dirfd, old.as_ptr(), new_dirfd, new.as_ptr(), 0)
    })
    .map(drop)
}

pub(crate) fn symlinkat(target: &str, dirfd: RawFd, path: &str) -> Result<()> {
    let target = cstring(target)?;
    let path = cstring(path)?;
    check("symlinkat", unsafe {
        libc::symlinkat(target.as_ptr(), dirfd, path.as_ptr())
    })
    .map(drop)
}

pub(crate) fn readlinkat(dirfd: RawFd, path: &str) -> Result<Vec<u8>> {
    let cstr = cstring(path)?;
    let mut buf = vec![0u8; 256];
    loop {
        let res = unsafe {
            libc::readlinkat(dirfd, cstr.as_ptr(), buf.as_mut_ptr().cast(), buf.len())
        };
        if res < 0 {
            return Err(PathError::last_os_error("readlinkat"));
        }
        let len = res as usize;
        if len < buf.len() {
            buf.truncate(len);
            return Ok(buf);
        }
        buf.resize(buf.len() * 2, 0);
    }
}

pub(crate) fn fchmod(fd: RawFd, mode: u32) -> Result<()> {
    check("fchmod", unsafe { libc::fchmod(fd, mode as libc::mode_t) }).map(drop)
}

pub(crate) fn fchown(fd: RawFd, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
    // -1 leaves the id unchanged.
    let uid = uid.map_or(!0, |v| v as libc::uid_t);
    let gid = gid.map_or(!0, |v| v as libc::gid_t);
    check("fchown", unsafe { libc::fchown(fd, uid, gid) }).map(drop)
}

pub(crate) fn fchmodat(dirfd: RawFd, path: &str, mode: u32) -> Result<()> {
    let cstr = cstring(path)?;
    check("fchmodat", unsafe {
        libc::fchmodat(dirfd, cstr.as_ptr(), mode as libc::mode_t, 0)
    })
    .map(drop)
}

pub(crate) fn fchownat(dirfd: RawFd, path: &str, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
    let cstr = cstring(path)?;
    let uid = uid.map_or(!0, |v| v as libc::uid_t);
    let gid = gid.map_or(!0, |v| v as libc::gid_t);
    check("fchownat", unsafe {
        libc::fchownat(dirfd, cstr.as_ptr(), uid, gid, 0)
    })
    .map(drop)
}

/// Self-referential path that reaches `fd` through the descriptor table
#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) fn fd_self_path(fd: RawFd) -> Result<String> {
    Ok(format!("/proc/self/fd/{fd}"))
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub(crate) fn fd_self_path(fd: RawFd) -> Result<String> {
    fd_path(fd)
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
pub(crate) fn fd_self_path(_fd: RawFd) -> Result<String> {
    Err(PathError::Os {
        call: "fd_self_path",
        code: libc::ENOSYS,
    })
}

/// Location `fd` currently refers to
#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) fn fd_path(fd: RawFd) -> Result<String> {
    let bytes = readlinkat(AT_FDCWD, &fd_self_path(fd)?)?;
    String::from_utf8(bytes).map_err(|err| PathError::InvalidEncoding {
        name: String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub(crate) fn fd_path(fd: RawFd) -> Result<String> {
    let mut buf = vec![0u8; libc::PATH_MAX as usize];
    check("fcntl", unsafe {
        libc::fcntl(fd, libc::F_GETPATH, buf.as_mut_ptr())
    })?;
    let text = CStr::from_bytes_until_nul(&buf)
        .map_err(|_| PathError::Os {
            call: "fcntl",
            code: libc::ENAMETOOLONG,
        })?
        .to_str()
        .map_err(|_| PathError::InvalidEncoding {
            name: String::from_utf8_lossy(&buf).into_owned(),
        })?;
    Ok(text.to_string())
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
pub(crate) fn fd_path(_fd: RawFd) -> Result<String> {
    Err(PathError::Os {
        call: "fd_path",
        code: libc::ENOSYS,
    })
}

/// Entry read from a directory scan
pub(crate) struct RawEntry {
    pub(crate) name: Vec<u8>,
    pub(crate) kind: Option<FileKind>,
}

/// Open directory scan owning its descriptor
pub(crate) struct DirStream {
    dirp: NonNull<libc::DIR>,
}

impl DirStream {
    /// Take ownership of `fd`; on failure the descriptor is closed.
    pub(crate) fn from_fd(fd: RawFd) -> Result<Self> {
        let dirp = unsafe { libc::fdopendir(fd) };
        match NonNull::new(dirp) {
            Some(dirp) => Ok(DirStream { dirp }),
            None => {
                let err = PathError::last_os_error("fdopendir");
                unsafe { libc::close(fd) };
                Err(err)
            }
        }
    }

    pub(crate) fn rewind(&mut self) {
        unsafe { libc::rewinddir(self.dirp.as_ptr()) };
    }

    /// Next raw entry, `.` and `..` excluded
    pub(crate) fn next_entry(&mut self) -> Result<Option<RawEntry>> {
        loop {
            set_errno(0);
            let ent = unsafe { libc::readdir(self.dirp.as_ptr()) };
            if ent.is_null() {
                return match errno() {
                    0 => Ok(None),
                    code => Err(PathError::Os {
                        call: "readdir",
                        code,
                    }),
                };
            }
            let ent = unsafe { &*ent };
            let name = unsafe { CStr::from_ptr(ent.d_name.as_ptr()) }.to_bytes();
            if name == b"." || name == b".." {
                continue;
            }
            return Ok(Some(RawEntry {
                name: name.to_vec(),
                kind: kind_from_dirent(ent),
            }));
        }
    }

    pub(crate) fn close(self) -> Result<()> {
        let dirp = self.dirp;
        mem::forget(self);
        check("closedir", unsafe { libc::closedir(dirp.as_ptr()) }).map(drop)
    }
}

impl Drop for DirStream {
    fn drop(&mut self) {
        unsafe { libc::closedir(self.dirp.as_ptr()) };
    }
}

#[cfg(target_os = "linux")]
fn errno_location() -> *mut c_int {
    unsafe { libc::__errno_location() }
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
fn errno_location() -> *mut c_int {
    unsafe { libc::__error() }
}

#[cfg(any(target_os = "android", target_os = "netbsd", target_os = "openbsd"))]
fn errno_location() -> *mut c_int {
    unsafe { libc::__errno() }
}

fn errno() -> c_int {
    unsafe { *errno_location() }
}

fn set_errno(value: c_int) {
    unsafe { *errno_location() = value };
}

#[cfg(not(any(target_os = "solaris", target_os = "illumos", target_os = "haiku")))]
fn kind_from_dirent(ent: &libc::dirent) -> Option<FileKind> {
    match ent.d_type {
        libc::DT_DIR => Some(FileKind::Directory),
        libc::DT_REG => Some(FileKind::File),
        libc::DT_LNK => Some(FileKind::Symlink),
        libc::DT_FIFO => Some(FileKind::Fifo),
        libc::DT_SOCK => Some(FileKind::Socket),
        libc::DT_CHR => Some(FileKind::CharDevice),
        libc::DT_BLK => Some(FileKind::BlockDevice),
        _ => None,
    }
}

#[cfg(any(target_os = "solaris", target_os = "illumos", target_os = "haiku"))]
fn kind_from_dirent(_ent: &libc::dirent) -> Option<FileKind> {
    None
}

pub(crate) fn kind_from_mode(mode: u32) -> FileKind {
    match mode & libc::S_IFMT as u32 {
        m if m == libc::S_IFDIR as u32 => FileKind::Directory,
        m if m == libc::S_IFREG as u32 => FileKind::File,
        m if m == libc::S_IFLNK as u32 => FileKind::Symlink,
        m if m == libc::S_IFIFO as u32 => FileKind::Fifo,
        m if m == libc::S_IFSOCK as u32 => FileKind::Socket,
        m if m == libc::S_IFCHR as u32 => FileKind::CharDevice,
        m if m == libc::S_IFBLK as u32 => FileKind::BlockDevice,
        _ => FileKind::Unknown,
    }
}

fn seconds(secs: i64, nanos: i64) -> f64 {
    secs as f64 + nanos as f64 * 1e-9
}

/// Interpret the host `struct stat`; field widths differ per target.
#[allow(clippy::unnecessary_cast)]
fn metadata_from_raw(st: &libc::stat) -> Metadata {
    Metadata {
        device: st.st_dev as u64,
        inode: st.st_ino as u64,
        nlink: st.st_nlink as u64,
        mode: st.st_mode as u32,
        uid: st.st_uid as u32,
        gid: st.st_gid as u32,
        rdev: st.st_rdev as u64,
        size: st.st_size as u64,
        blksize: st.st_blksize as u64,
        blocks: st.st_blocks as u64,
        atime: seconds(st.st_atime as i64, st.st_atime_nsec as i64),
        mtime: seconds(st.st_mtime as i64, st.st_mtime_nsec as i64),
        ctime: seconds(st.st_ctime as i64, st.st_ctime_nsec as i64),
    }
}
