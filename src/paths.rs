//! Platform path types
//!
//! [`PosixPath`] and [`WindowsPath`] are single-field wrappers over
//! [`GenericPath`] that pin the dialect, so a POSIX path can never be joined
//! onto a Windows one.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{PathError, Result};
use crate::generic::{GenericPath, Segments};
use crate::platform::{Posix, Windows};

macro_rules! platform_path {
    ($(#[$meta:meta])* $name:ident, $platform:ty) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $name(GenericPath<$platform>);

        impl $name {
            /// Parse and normalize a path string
            pub fn parse(path: &str) -> Result<Self> {
                GenericPath::parse(path).map(Self)
            }

            /// Build a path from individual segments
            pub fn from_segments<I, S>(segments: I) -> Result<Self>
            where
                I: IntoIterator<Item = S>,
                S: AsRef<str>,
            {
                GenericPath::from_segments(segments).map(Self)
            }

            /// The self-reference path `.`
            pub fn current() -> Self {
                Self(GenericPath::current())
            }

            /// The parent-reference path `..`
            pub fn parent_ref() -> Self {
                Self(GenericPath::parent_ref())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            pub fn as_generic(&self) -> &GenericPath<$platform> {
                &self.0
            }

            pub fn into_generic(self) -> GenericPath<$platform> {
                self.0
            }

            pub fn is_absolute(&self) -> bool {
                self.0.is_absolute()
            }

            pub fn is_root(&self) -> bool {
                self.0.is_root()
            }

            pub fn is_current(&self) -> bool {
                self.0.is_current()
            }

            /// See [`GenericPath::root`]
            pub fn root(&self) -> Option<Self> {
                self.0.root().map(Self)
            }

            /// See [`GenericPath::parent`]
            pub fn parent(&self) -> Self {
                Self(self.0.parent())
            }

            /// See [`GenericPath::basename`]
            pub fn basename(&self) -> Option<&str> {
                self.0.basename()
            }

            /// See [`GenericPath::join`]
            pub fn join(&self, other: &Self) -> Result<Self> {
                self.0.join(&other.0).map(Self)
            }

            /// Join a single segment, validated as a standalone name
            pub fn join_segment(&self, segment: &str) -> Result<Self> {
                self.join(&Self::from_segments([segment])?)
            }

            pub fn depth(&self) -> usize {
                self.0.depth()
            }

            pub fn segments(&self) -> Segments<'_, $platform> {
                self.0.segments()
            }

            pub fn starts_with(&self, prefix: &Self) -> bool {
                self.0.starts_with(&prefix.0)
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                self.0.partial_cmp(&other.0)
            }
        }

        impl From<GenericPath<$platform>> for $name {
            fn from(path: GenericPath<$platform>) -> Self {
                Self(path)
            }
        }

        impl FromStr for $name {
            type Err = PathError;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = PathError;

            fn try_from(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.as_str())
            }
        }
    };
}

platform_path!(
    /// A path under POSIX rules
    ///
    /// # Examples
    /// ```
    /// use handlepath::PosixPath;
    ///
    /// let base = PosixPath::parse("/srv/data").unwrap();
    /// let file = base.join(&PosixPath::parse("../logs/today").unwrap()).unwrap();
    /// assert_eq!(file.as_str(), "/srv/logs/today");
    /// assert_eq!(file.basename(), Some("today"));
    /// ```
    PosixPath,
    Posix
);

platform_path!(
    /// A path under Windows rules
    ///
    /// `/` is accepted on input and stored as `\`.
    ///
    /// # Examples
    /// ```
    /// use handlepath::WindowsPath;
    ///
    /// let path = WindowsPath::parse("C:/Users/me/notes.txt").unwrap();
    /// assert_eq!(path.as_str(), r"C:\Users\me\notes.txt");
    /// assert_eq!(path.root().unwrap().as_str(), r"C:\");
    /// ```
    WindowsPath,
    Windows
);

/// The path type for the host platform
#[cfg(unix)]
pub type NativePath = PosixPath;

#[cfg(unix)]
impl PosixPath {
    pub fn to_std_path(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(self.as_str())
    }
}

#[cfg(unix)]
impl TryFrom<&std::path::Path> for PosixPath {
    type Error = PathError;

    fn try_from(path: &std::path::Path) -> Result<Self> {
        let text = path.to_str().ok_or_else(|| PathError::InvalidEncoding {
            name: path.to_string_lossy().into_owned(),
        })?;
        Self::parse(text)
    }
}
