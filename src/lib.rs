//! # handlepath
//!
//! Platform-aware path algebra and descriptor-relative filesystem handles.
//!
//! Paths are normalized values that never touch the filesystem: segments are
//! validated against the platform's rules when the path is built, and `..`
//! is resolved arithmetically when paths are joined. Handles pin an open
//! directory or file, so later operations resolve relative to the object
//! itself and not to a name that may have been swapped underneath.
//!
//! ## Features
//!
//! - **Path algebra**: parse, join, parent and basename for POSIX and Windows
//! - **Validation**: reserved names, forbidden characters and suffixes are
//!   rejected at construction
//! - **Handles**: `openat`-style access relative to an open descriptor
//! - **Tree reduction**: map/reduce over a directory hierarchy through handles
//!
//! ## Examples
//!
//! ### Path Algebra
//!
//! ```rust
//! use handlepath::{PathError, PosixPath, WindowsPath};
//!
//! let base = PosixPath::parse("/a/b").unwrap();
//! let rel = PosixPath::parse("../../c").unwrap();
//! assert_eq!(base.join(&rel).unwrap().as_str(), "/c");
//!
//! // Ascending past the root is an error, not a silent clamp
//! let rel = PosixPath::parse("../../../c").unwrap();
//! assert!(matches!(
//!     base.join(&rel),
//!     Err(PathError::InsufficientParents { .. })
//! ));
//!
//! let win = WindowsPath::parse("C:/Users/me").unwrap();
//! assert_eq!(win.as_str(), "C:\\Users\\me");
//! assert_eq!(win.basename(), Some("me"));
//! ```
//!
//! ### Validation
//!
//! ```rust
//! use handlepath::{validate_windows_segment, WindowsPath};
//!
//! assert!(validate_windows_segment("CON", false).is_err());
//! assert!(WindowsPath::from_segments(["dir", "file?"]).is_err());
//! ```
//!
//! ### Handles
//!
//! ```rust,no_run
//! # #[cfg(unix)] {
//! use handlepath::{Handle, OpenFlags, PosixPath};
//!
//! let mut dir = Handle::open(&PosixPath::parse("/etc").unwrap(), OpenFlags::PATH).unwrap();
//! let mut hosts = dir
//!     .open_at(&PosixPath::parse("hosts").unwrap(), OpenFlags::READ)
//!     .unwrap();
//! println!("{} bytes", hosts.stat().unwrap().size);
//! hosts.close().unwrap();
//! dir.close().unwrap();
//! # }
//! ```

mod error;
mod generic;
mod metadata;
mod paths;
mod platform;
mod validate;

#[cfg(unix)]
mod dir;
#[cfg(unix)]
mod handle;
#[cfg(unix)]
pub mod query;
#[cfg(unix)]
mod reduce;
#[cfg(unix)]
mod sys;

// Generators module for property testing (available in tests)
#[cfg(test)]
pub mod generators;

// Re-export main public API
pub use error::{InvalidReason, PathError, Result};
pub use generic::{GenericPath, Segments};
pub use metadata::{FileKind, Metadata};
pub use paths::{PosixPath, WindowsPath};
pub use platform::{Platform, Posix, Windows};
pub use validate::{validate_posix_segment, validate_windows_segment};

#[cfg(unix)]
pub use dir::{DirEntry, DirReader};
#[cfg(unix)]
pub use handle::{Access, Handle, OpenFlags};
#[cfg(unix)]
pub use paths::NativePath;
#[cfg(unix)]
pub use query::Inspect;
#[cfg(unix)]
pub use reduce::{mapreduce, reduce, Node, TreeReducer};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
