//! Platform dialects
//!
//! A [`Platform`] fixes the separator, the pseudo-segment spellings, the root
//! syntax and the segment validator. Dialects are zero-sized tags resolved at
//! compile time.

use std::borrow::Cow;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::Result;
use crate::validate::{validate_posix_segment, validate_windows_segment};

/// Compile-time description of a path dialect
pub trait Platform: Copy + Clone + Debug + Default + Eq + Hash + Send + Sync + 'static {
    /// Separator written between segments
    const SEPARATOR: char;

    /// Self-reference segment
    const SELF_SEGMENT: &'static str = ".";

    /// Parent-reference segment
    const PARENT_SEGMENT: &'static str = "..";

    /// Rewrite alternate separators to [`Self::SEPARATOR`]
    fn normalize_separators(path: &str) -> Cow<'_, str> {
        Cow::Borrowed(path)
    }

    /// Split a separator-normalized path into its root and the remainder
    ///
    /// The returned root always ends in the separator. An empty root means the
    /// path is relative.
    fn split_root(path: &str) -> Result<(Cow<'_, str>, &str)>;

    /// Validate one segment
    fn validate(segment: &str, multipart: bool) -> Result<()>;
}

/// POSIX dialect: `/` separator, single-byte root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Posix;

impl Platform for Posix {
    const SEPARATOR: char = '/';

    fn split_root(path: &str) -> Result<(Cow<'_, str>, &str)> {
        match path.strip_prefix('/') {
            Some(rest) => Ok((Cow::Borrowed("/"), rest)),
            None => Ok((Cow::Borrowed(""), path)),
        }
    }

    fn validate(segment: &str, multipart: bool) -> Result<()> {
        validate_posix_segment(segment, multipart)
    }
}

/// Windows dialect: `\` separator, drive or UNC roots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Windows;

impl Platform for Windows {
    const SEPARATOR: char = '\\';

    fn normalize_separators(path: &str) -> Cow<'_, str> {
        if path.contains('/') {
            Cow::Owned(path.replace('/', "\\"))
        } else {
            Cow::Borrowed(path)
        }
    }

    fn split_root(path: &str) -> Result<(Cow<'_, str>, &str)> {
        let bytes = path.as_bytes();

        // \\server\share
        if let Some(unc) = path.strip_prefix("\\\\") {
            let (server, rest) = unc.split_once('\\').unwrap_or((unc, ""));
            let (share, rest) = rest.split_once('\\').unwrap_or((rest, ""));
            Self::validate(server, false)?;
            Self::validate(share, false)?;
            return Ok((Cow::Owned(format!("\\\\{server}\\{share}\\")), rest));
        }

        // X:\
        if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'\\'
        {
            return Ok((Cow::Borrowed(&path[..3]), &path[3..]));
        }

        match path.strip_prefix('\\') {
            Some(rest) => Ok((Cow::Borrowed("\\"), rest)),
            None => Ok((Cow::Borrowed(""), path)),
        }
    }

    fn validate(segment: &str, multipart: bool) -> Result<()> {
        validate_windows_segment(segment, multipart)
    }
}
