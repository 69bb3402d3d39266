//! Descriptor-backed resource handles
//!
//! A [`Handle`] owns one native descriptor. Opening relative to a parent
//! handle resolves the name against the parent's descriptor, so renaming an
//! ancestor directory after the parent was opened cannot redirect the open.
//!
//! Release is explicit through [`Handle::close`], which is idempotent. Dropping
//! an open handle still releases it, but logs a warning: the drop path cannot
//! report errors.

use std::fmt;
use std::io;
use std::os::raw::c_int;
use std::os::unix::io::RawFd;

use bitflags::bitflags;

use crate::dir::DirReader;
use crate::error::{PathError, Result};
use crate::metadata::{FileKind, Metadata};
use crate::paths::PosixPath;
use crate::sys;

bitflags! {
    /// Mode used to acquire a handle
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const CREATE = 1 << 2;
        const EXCL = 1 << 3;
        const TRUNC = 1 << 4;
        const APPEND = 1 << 5;
        const DIRECTORY = 1 << 6;
        const NOFOLLOW = 1 << 7;
        /// Reference only: usable for resolution and status, not for I/O
        const PATH = 1 << 8;
    }
}

impl OpenFlags {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn reference_only() -> c_int {
        libc::O_PATH
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn reference_only() -> c_int {
        libc::O_RDONLY
    }

    pub(crate) fn to_native(self) -> c_int {
        let mut flags = if self.contains(OpenFlags::PATH) {
            Self::reference_only()
        } else if self.contains(OpenFlags::READ | OpenFlags::WRITE) {
            libc::O_RDWR
        } else if self.contains(OpenFlags::WRITE) {
            libc::O_WRONLY
        } else {
            libc::O_RDONLY
        };

        if self.contains(OpenFlags::CREATE) {
            flags |= libc::O_CREAT;
        }
        if self.contains(OpenFlags::EXCL) {
            flags |= libc::O_EXCL;
        }
        if self.contains(OpenFlags::TRUNC) {
            flags |= libc::O_TRUNC;
        }
        if self.contains(OpenFlags::APPEND) {
            flags |= libc::O_APPEND;
        }
        if self.contains(OpenFlags::DIRECTORY) {
            flags |= libc::O_DIRECTORY;
        }
        if self.contains(OpenFlags::NOFOLLOW) {
            flags |= libc::O_NOFOLLOW;
        }
        flags
    }
}

bitflags! {
    /// Access to check for; the empty set checks existence
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Access: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const EXECUTE = 1 << 2;
    }
}

impl Access {
    pub(crate) fn to_native(self) -> c_int {
        if self.is_empty() {
            return libc::F_OK;
        }
        let mut mode = 0;
        if self.contains(Access::READ) {
            mode |= libc::R_OK;
        }
        if self.contains(Access::WRITE) {
            mode |= libc::W_OK;
        }
        if self.contains(Access::EXECUTE) {
            mode |= libc::X_OK;
        }
        mode
    }
}

const DEFAULT_FILE_MODE: u32 = 0o666;
const DEFAULT_DIR_MODE: u32 = 0o777;

/// An open native filesystem handle
pub struct Handle {
    fd: RawFd,
    flags: OpenFlags,
    open: bool,
}

impl Handle {
    fn from_fd(fd: RawFd, flags: OpenFlags) -> Self {
        log::trace!("acquired fd {fd} ({flags:?})");
        Handle {
            fd,
            flags,
            open: true,
        }
    }

    /// Open `path`, resolving relative paths against the working directory
    ///
    /// # Examples
    /// ```no_run
    /// use handlepath::{Handle, OpenFlags, PosixPath};
    ///
    /// let mut etc = Handle::open(&PosixPath::parse("/etc").unwrap(), OpenFlags::PATH).unwrap();
    /// let hosts = PosixPath::parse("hosts").unwrap();
    /// let mut file = etc.open_at(&hosts, OpenFlags::READ).unwrap();
    /// file.close().unwrap();
    /// etc.close().unwrap();
    /// ```
    pub fn open(path: &PosixPath, flags: OpenFlags) -> Result<Handle> {
        Self::open_with_mode(path, flags, DEFAULT_FILE_MODE)
    }

    /// Open `path`, using `mode` for a newly created file
    pub fn open_with_mode(path: &PosixPath, flags: OpenFlags, mode: u32) -> Result<Handle> {
        let fd = sys::open(path.as_str(), flags.to_native(), mode)?;
        Ok(Self::from_fd(fd, flags))
    }

    /// Open `path` relative to this handle's descriptor
    ///
    /// `path` must be relative; an absolute path would bypass the descriptor.
    pub fn open_at(&self, path: &PosixPath, flags: OpenFlags) -> Result<Handle> {
        self.open_at_with_mode(path, flags, DEFAULT_FILE_MODE)
    }

    pub fn open_at_with_mode(&self, path: &PosixPath, flags: OpenFlags, mode: u32) -> Result<Handle> {
        let fd = self.live_fd("open_at")?;
        let path = self.relative(path)?;
        let child = sys::openat(fd, path, flags.to_native(), mode)?;
        Ok(Self::from_fd(child, flags))
    }

    fn live_fd(&self, operation: &'static str) -> Result<RawFd> {
        if self.open {
            Ok(self.fd)
        } else {
            Err(PathError::HandleClosed { operation })
        }
    }

    fn relative<'p>(&self, path: &'p PosixPath) -> Result<&'p str> {
        if path.is_absolute() {
            return Err(PathError::AbsolutePath {
                base: format!("fd {}", self.fd),
                path: path.to_string(),
            });
        }
        Ok(path.as_str())
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Flags the handle was opened with
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    /// The native descriptor
    pub fn raw_fd(&self) -> Result<RawFd> {
        self.live_fd("raw_fd")
    }

    /// Give up ownership of the descriptor without closing it
    pub fn into_raw_fd(mut self) -> Result<RawFd> {
        let fd = self.live_fd("into_raw_fd")?;
        self.open = false;
        Ok(fd)
    }

    /// Release the descriptor; closing a closed handle does nothing
    pub fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        // The descriptor is gone even if close reports an error.
        self.open = false;
        log::trace!("releasing fd {}", self.fd);
        sys::close(self.fd)
    }

    /// Reopen with different flags
    ///
    /// Returns `None` in two cases: the handle is closed, or it was opened
    /// with `flags`. Only the second means this handle can serve the request,
    /// so check [`is_open`](Self::is_open) before reusing it. Otherwise a second handle onto the same file is opened through
    /// the descriptor itself and this one stays open.
    pub fn reopen(&self, flags: OpenFlags) -> Result<Option<Handle>> {
        if !self.open || flags == self.flags {
            return Ok(None);
        }
        // The self-path is itself a link, and the file already exists.
        let native = (flags - (OpenFlags::NOFOLLOW | OpenFlags::CREATE | OpenFlags::EXCL)).to_native();
        let reopened = sys::open(&sys::fd_self_path(self.fd)?, native, 0)?;
        Ok(Some(Self::from_fd(reopened, flags)))
    }

    /// Duplicate the descriptor; the two handles share file position
    pub fn try_clone(&self) -> Result<Handle> {
        let fd = sys::dup(self.live_fd("try_clone")?)?;
        Ok(Self::from_fd(fd, self.flags))
    }

    /// Current location of the handle
    ///
    /// This is a snapshot for display: the file may move as soon as it is
    /// taken, so never feed it back into a relative open.
    pub fn to_path(&self) -> Result<PosixPath> {
        let fd = self.live_fd("to_path")?;
        PosixPath::parse(&sys::fd_path(fd)?)
    }

    pub fn stat(&self) -> Result<Metadata> {
        sys::fstat(self.live_fd("stat")?)
    }

    /// Status of `path` relative to this handle
    pub fn stat_at(&self, path: &PosixPath, follow: bool) -> Result<Metadata> {
        let fd = self.live_fd("stat_at")?;
        sys::fstatat(fd, self.relative(path)?, follow)
    }

    pub fn kind(&self) -> Result<FileKind> {
        Ok(self.stat()?.kind())
    }

    /// Check access with the process's effective credentials
    pub fn access(&self, mode: Access) -> Result<bool> {
        let fd = self.live_fd("access")?;
        sys::faccessat(sys::AT_FDCWD, &sys::fd_self_path(fd)?, mode.to_native())
    }

    pub fn is_readable(&self) -> Result<bool> {
        self.access(Access::READ)
    }

    pub fn is_writable(&self) -> Result<bool> {
        self.access(Access::WRITE)
    }

    pub fn is_executable(&self) -> Result<bool> {
        self.access(Access::EXECUTE)
    }

    /// Lazily list the directory this handle refers to
    pub fn read_dir(&self) -> Result<DirReader<'_>> {
        self.live_fd("read_dir")?;
        Ok(DirReader::new(self))
    }

    pub fn create_dir_at(&self, path: &PosixPath) -> Result<()> {
        self.create_dir_at_with_mode(path, DEFAULT_DIR_MODE)
    }

    pub fn create_dir_at_with_mode(&self, path: &PosixPath, mode: u32) -> Result<()> {
        let fd = self.live_fd("create_dir_at")?;
        sys::mkdirat(fd, self.relative(path)?, mode)
    }

    pub fn remove_file_at(&self, path: &PosixPath) -> Result<()> {
        let fd = self.live_fd("remove_file_at")?;
        sys::unlinkat(fd, self.relative(path)?, false)
    }

    pub fn remove_dir_at(&self, path: &PosixPath) -> Result<()> {
        let fd = self.live_fd("remove_dir_at")?;
        sys::unlinkat(fd, self.relative(path)?, true)
    }

    /// Rename `from` under this handle to `to` under `to_dir`
    pub fn rename_at(&self, from: &PosixPath, to_dir: &Handle, to: &PosixPath) -> Result<()> {
        let fd = self.live_fd("rename_at")?;
        let to_fd = to_dir.live_fd("rename_at")?;
        sys::renameat(fd, self.relative(from)?, to_fd, to_dir.relative(to)?)
    }

    pub fn hard_link_at(&self, from: &PosixPath, to_dir: &Handle, to: &PosixPath) -> Result<()> {
        let fd = self.live_fd("hard_link_at")?;
        let to_fd = to_dir.live_fd("hard_link_at")?;
        sys::linkat(fd, self.relative(from)?, to_fd, to_dir.relative(to)?)
    }

    /// Create a symlink named `path` pointing at `target`
    pub fn symlink_at(&self, target: &str, path: &PosixPath) -> Result<()> {
        let fd = self.live_fd("symlink_at")?;
        sys::symlinkat(target, fd, self.relative(path)?)
    }

    /// Target text of the symlink `path`
    pub fn read_link_at(&self, path: &PosixPath) -> Result<String> {
        let fd = self.live_fd("read_link_at")?;
        let bytes = sys::readlinkat(fd, self.relative(path)?)?;
        String::from_utf8(bytes).map_err(|err| PathError::InvalidEncoding {
            name: String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })
    }

    pub fn set_permissions(&self, mode: u32) -> Result<()> {
        let fd = self.live_fd("set_permissions")?;
        if self.flags.contains(OpenFlags::PATH) {
            sys::fchmodat(sys::AT_FDCWD, &sys::fd_self_path(fd)?, mode)
        } else {
            sys::fchmod(fd, mode)
        }
    }

    /// Change ownership; `None` leaves an id unchanged
    pub fn set_owner(&self, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        let fd = self.live_fd("set_owner")?;
        if self.flags.contains(OpenFlags::PATH) {
            sys::fchownat(sys::AT_FDCWD, &sys::fd_self_path(fd)?, uid, gid)
        } else {
            sys::fchown(fd, uid, gid)
        }
    }

    pub fn sync(&self) -> Result<()> {
        sys::fsync(self.live_fd("sync")?)
    }
}

impl io::Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(sys::read(self.live_fd("read")?, buf)?)
    }
}

impl io::Write for Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(sys::write(self.live_fd("write")?, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.live_fd("flush")?;
        Ok(())
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("fd", &self.fd)
            .field("flags", &self.flags)
            .field("open", &self.open)
            .finish()
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if self.open {
            log::warn!("fd {} dropped while open, releasing it", self.fd);
            if let Err(err) = self.close() {
                log::warn!("releasing dropped fd {} failed: {err}", self.fd);
            }
        }
    }
}
