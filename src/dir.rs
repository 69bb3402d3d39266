//! Directory listing
//!
//! A [`DirReader`] scans a private read-only open of `.` relative to its
//! directory handle, so the caller's descriptor and its file position are
//! never touched. The
//! scan opens on the first call to `next` and is closed exactly once, when it
//! is exhausted, on error, on [`DirReader::close`] or on drop.

use std::iter::FusedIterator;

use crate::error::{PathError, Result};
use crate::handle::{Handle, OpenFlags};
use crate::metadata::{FileKind, Metadata};
use crate::paths::PosixPath;
use crate::sys::{self, DirStream, RawEntry};

/// One name in a directory listing
///
/// An entry holds no descriptor of its own; it borrows the parent handle and
/// resolves the name against it on demand.
#[derive(Debug, Clone)]
pub struct DirEntry<'a> {
    parent: &'a Handle,
    name: String,
    kind: FileKind,
}

impl<'a> DirEntry<'a> {
    pub fn parent(&self) -> &'a Handle {
        self.parent
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type as reported by the listing, without following symlinks
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    /// The entry name as a single-segment relative path
    pub fn segment(&self) -> Result<PosixPath> {
        PosixPath::from_segments([self.name.as_str()])
    }

    /// Parent location joined with the entry name
    pub fn to_path(&self) -> Result<PosixPath> {
        self.parent.to_path()?.join_segment(&self.name)
    }

    /// Open the entry relative to its parent handle
    pub fn open(&self, flags: OpenFlags) -> Result<Handle> {
        self.parent.open_at(&self.segment()?, flags)
    }

    pub fn stat(&self, follow: bool) -> Result<Metadata> {
        self.parent.stat_at(&self.segment()?, follow)
    }
}

enum ScanState {
    Unopened,
    Open(DirStream),
    Closed,
}

/// Lazy iterator over the entries of a directory handle
pub struct DirReader<'a> {
    handle: &'a Handle,
    state: ScanState,
}

impl<'a> DirReader<'a> {
    pub(crate) fn new(handle: &'a Handle) -> Self {
        DirReader {
            handle,
            state: ScanState::Unopened,
        }
    }

    fn start(&mut self) -> Result<()> {
        let flags = (OpenFlags::READ | OpenFlags::DIRECTORY).to_native();
        let fd = sys::openat(self.handle.raw_fd()?, ".", flags, 0)?;
        let mut stream = DirStream::from_fd(fd)?;
        stream.rewind();
        log::trace!("opened directory scan on fd {fd}");
        self.state = ScanState::Open(stream);
        Ok(())
    }

    /// Close the scan; later calls to `next` return `None`
    pub fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, ScanState::Closed) {
            ScanState::Open(stream) => {
                log::trace!("closing directory scan");
                stream.close()
            }
            _ => Ok(()),
        }
    }

    fn entry(&self, raw: RawEntry) -> Result<DirEntry<'a>> {
        let name = String::from_utf8(raw.name).map_err(|err| PathError::InvalidEncoding {
            name: String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })?;
        let kind = match raw.kind {
            Some(kind) => kind,
            None => sys::fstatat(self.handle.raw_fd()?, &name, false)?.kind(),
        };
        Ok(DirEntry {
            parent: self.handle,
            name,
            kind,
        })
    }
}

impl<'a> Iterator for DirReader<'a> {
    type Item = Result<DirEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let ScanState::Unopened = self.state {
            if let Err(err) = self.start() {
                self.state = ScanState::Closed;
                return Some(Err(err));
            }
        }

        let stream = match &mut self.state {
            ScanState::Open(stream) => stream,
            _ => return None,
        };

        match stream.next_entry() {
            Ok(Some(raw)) => Some(self.entry(raw)),
            Ok(None) => self.close().err().map(Err),
            Err(err) => {
                let _ = self.close();
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for DirReader<'_> {}
