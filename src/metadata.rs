//! Typed file status
//!
//! [`Metadata`] is decoded from the native status record and answers the type
//! and mode-bit predicates. Permission questions that depend on process
//! credentials go through an access check instead; see
//! [`Handle::access`](crate::Handle::access).

/// Coarse file type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Directory,
    File,
    Symlink,
    Fifo,
    Socket,
    CharDevice,
    BlockDevice,
    Unknown,
}

const S_ISUID: u32 = 0o4000;
const S_ISGID: u32 = 0o2000;
const S_ISVTX: u32 = 0o1000;

/// File status as reported by `fstat`/`fstatat`
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub device: u64,
    pub inode: u64,
    pub nlink: u64,
    /// Type and permission bits, as in `st_mode`
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub rdev: u64,
    pub size: u64,
    pub blksize: u64,
    pub blocks: u64,
    /// Seconds since the epoch, with the nanosecond part as a fraction
    pub atime: f64,
    pub mtime: f64,
    pub ctime: f64,
}

impl Metadata {
    #[cfg(unix)]
    pub fn kind(&self) -> FileKind {
        crate::sys::kind_from_mode(self.mode)
    }

    /// Permission bits including setuid, setgid and sticky
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }

    pub fn is_setuid(&self) -> bool {
        self.mode & S_ISUID != 0
    }

    pub fn is_setgid(&self) -> bool {
        self.mode & S_ISGID != 0
    }

    pub fn is_sticky(&self) -> bool {
        self.mode & S_ISVTX != 0
    }
}

#[cfg(unix)]
impl Metadata {
    pub fn is_dir(&self) -> bool {
        self.kind() == FileKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind() == FileKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind() == FileKind::Symlink
    }

    pub fn is_fifo(&self) -> bool {
        self.kind() == FileKind::Fifo
    }

    pub fn is_socket(&self) -> bool {
        self.kind() == FileKind::Socket
    }

    pub fn is_char_device(&self) -> bool {
        self.kind() == FileKind::CharDevice
    }

    pub fn is_block_device(&self) -> bool {
        self.kind() == FileKind::BlockDevice
    }

    /// Whether two records describe the same file
    pub fn same_file(&self, other: &Metadata) -> bool {
        self.device == other.device && self.inode == other.inode
    }
}
