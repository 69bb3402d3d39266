//! Generic path algebra
//!
//! A [`GenericPath`] is one normalized string plus two byte offsets:
//! `rootsep`, the length of the root prefix (zero for relative paths), and
//! `lastsep`, the start of the final segment (zero when the final segment is
//! the whole path or the path is a bare root). Keeping the offsets makes
//! [`root`](GenericPath::root), [`parent`](GenericPath::parent) and
//! [`basename`](GenericPath::basename) constant time and lets
//! [`join`](GenericPath::join) work in time proportional to the right-hand
//! side.
//!
//! Normalization collapses repeated separators and `.` segments. `..` is only
//! collapsed by [`join`](GenericPath::join), never while parsing, because
//! `a/..` is not `.` when `a` is a symlink. The single exception is a `..`
//! directly under a root, which is dropped since the root is its own parent.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::{PathError, Result};
use crate::platform::Platform;

/// Immutable, normalized path for platform `P`
#[derive(Clone)]
pub struct GenericPath<P: Platform> {
    data: String,
    rootsep: usize,
    lastsep: usize,
    platform: PhantomData<P>,
}

impl<P: Platform> GenericPath<P> {
    fn from_raw(data: String, rootsep: usize, lastsep: usize) -> Self {
        debug_assert!(rootsep <= data.len() && lastsep <= data.len());
        GenericPath {
            data,
            rootsep,
            lastsep,
            platform: PhantomData,
        }
    }

    /// Parse and normalize a path string
    ///
    /// # Examples
    /// ```
    /// use handlepath::{GenericPath, Posix};
    ///
    /// let path = GenericPath::<Posix>::parse("/usr//local/./bin/").unwrap();
    /// assert_eq!(path.as_str(), "/usr/local/bin");
    /// assert_eq!(path.basename(), Some("bin"));
    /// ```
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(PathError::EmptyPath);
        }

        let normalized = P::normalize_separators(path);
        let (root, rest) = P::split_root(&normalized)?;

        let mut data = String::with_capacity(normalized.len());
        data.push_str(&root);
        let rootsep = data.len();
        let mut lastsep = 0;

        for segment in rest.split(P::SEPARATOR) {
            if segment.is_empty() || segment == P::SELF_SEGMENT {
                continue;
            }
            P::validate(segment, true)?;
            if segment == P::PARENT_SEGMENT && rootsep > 0 && data.len() == rootsep {
                continue;
            }
            lastsep = push_segment::<P>(&mut data, rootsep, segment);
        }

        if data.is_empty() {
            data.push_str(P::SELF_SEGMENT);
        }

        Ok(Self::from_raw(data, rootsep, lastsep))
    }

    /// Build a path from individual segments
    ///
    /// Each segment is validated on its own, so separators and pseudo-segments
    /// are rejected, except that the first segment may be a bare root and a
    /// leading run of `..` is kept as written.
    ///
    /// # Examples
    /// ```
    /// use handlepath::{GenericPath, Posix};
    ///
    /// let path = GenericPath::<Posix>::from_segments(["..", "..", "src"]).unwrap();
    /// assert_eq!(path.as_str(), "../../src");
    ///
    /// let path = GenericPath::<Posix>::from_segments(["/", "etc", "hosts"]).unwrap();
    /// assert_eq!(path.as_str(), "/etc/hosts");
    ///
    /// assert!(GenericPath::<Posix>::from_segments(["a/b"]).is_err());
    /// ```
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut data = String::new();
        let mut rootsep = 0;
        let mut lastsep = 0;
        let mut leading = true;
        let mut count = 0usize;

        for segment in segments {
            let segment = segment.as_ref();
            count += 1;

            if count == 1 {
                if let Some(root) = bare_root::<P>(segment)? {
                    data.push_str(&root);
                    rootsep = data.len();
                    continue;
                }
            }

            if leading && segment == P::PARENT_SEGMENT {
                if rootsep > 0 {
                    continue;
                }
            } else {
                P::validate(segment, false)?;
                leading = false;
            }
            lastsep = push_segment::<P>(&mut data, rootsep, segment);
        }

        if count == 0 {
            return Err(PathError::EmptyPath);
        }

        Ok(Self::from_raw(data, rootsep, lastsep))
    }

    /// The self-reference path `.`
    pub fn current() -> Self {
        Self::from_raw(P::SELF_SEGMENT.to_string(), 0, 0)
    }

    /// The parent-reference path `..`
    pub fn parent_ref() -> Self {
        Self::from_raw(P::PARENT_SEGMENT.to_string(), 0, 0)
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn is_absolute(&self) -> bool {
        self.rootsep != 0
    }

    /// Whether the path is a bare root
    pub fn is_root(&self) -> bool {
        self.rootsep != 0 && self.rootsep == self.data.len()
    }

    /// Whether the path is exactly the self-reference segment
    pub fn is_current(&self) -> bool {
        self.data == P::SELF_SEGMENT
    }

    /// The root prefix, or `None` for relative paths
    pub fn root(&self) -> Option<Self> {
        if self.rootsep == 0 {
            None
        } else if self.is_root() {
            Some(self.clone())
        } else {
            Some(Self::from_raw(self.data[..self.rootsep].to_string(), self.rootsep, 0))
        }
    }

    /// The final segment
    ///
    /// Returns `None` when the final segment is `..`: the real name depends on
    /// whether earlier segments are symlinks. A bare root is its own basename.
    pub fn basename(&self) -> Option<&str> {
        let name = &self.data[self.lastsep..];
        if name == P::PARENT_SEGMENT {
            None
        } else {
            Some(name)
        }
    }

    /// The enclosing path
    ///
    /// A path ending in `..` gains another `..`; a bare root is its own parent.
    ///
    /// # Examples
    /// ```
    /// use handlepath::{GenericPath, Posix};
    ///
    /// let path = GenericPath::<Posix>::parse("a/b").unwrap();
    /// assert_eq!(path.parent().as_str(), "a");
    /// assert_eq!(path.parent().parent().as_str(), ".");
    /// assert_eq!(path.parent().parent().parent().as_str(), "..");
    /// assert_eq!(path.parent().parent().parent().parent().as_str(), "../..");
    /// ```
    pub fn parent(&self) -> Self {
        if self.is_root() {
            return self.clone();
        }

        if &self.data[self.lastsep..] == P::PARENT_SEGMENT {
            let mut data = String::with_capacity(self.data.len() + 3);
            data.push_str(&self.data);
            let lastsep = push_segment::<P>(&mut data, self.rootsep, P::PARENT_SEGMENT);
            return Self::from_raw(data, self.rootsep, lastsep);
        }

        if self.rootsep == 0 && self.lastsep == 0 {
            return if self.is_current() {
                Self::parent_ref()
            } else {
                Self::current()
            };
        }

        if self.lastsep == self.rootsep {
            return Self::from_raw(self.data[..self.rootsep].to_string(), self.rootsep, 0);
        }

        let prefix = &self.data[..self.lastsep - P::SEPARATOR.len_utf8()];
        let lastsep = last_segment_start::<P>(prefix, self.rootsep);
        Self::from_raw(prefix.to_string(), self.rootsep, lastsep)
    }

    /// Join a relative path onto this one
    ///
    /// Leading `..` segments of `other` consume trailing segments of `self`.
    /// When a relative `self` runs out the result starts with `..`; when a
    /// rooted `self` runs out the join fails with
    /// [`PathError::InsufficientParents`].
    ///
    /// # Examples
    /// ```
    /// use handlepath::{GenericPath, Posix};
    ///
    /// let base = GenericPath::<Posix>::parse("/a/b").unwrap();
    /// let rel = GenericPath::<Posix>::parse("../../c").unwrap();
    /// assert_eq!(base.join(&rel).unwrap().as_str(), "/c");
    ///
    /// let base = GenericPath::<Posix>::parse("a/b").unwrap();
    /// let rel = GenericPath::<Posix>::parse("../../../c").unwrap();
    /// assert_eq!(base.join(&rel).unwrap().as_str(), "../c");
    /// ```
    pub fn join(&self, other: &Self) -> Result<Self> {
        if other.is_absolute() {
            return Err(PathError::AbsolutePath {
                base: self.data.clone(),
                path: other.data.clone(),
            });
        }

        if self.is_current() {
            return Ok(other.clone());
        }
        if other.is_current() {
            return Ok(self.clone());
        }

        let sep_len = P::SEPARATOR.len_utf8();
        let mut tail = other.data.as_str();
        let mut tail_start = 0;
        let mut end = self.data.len();
        let mut underflow = 0usize;
        let mut walked = false;

        while !tail.is_empty() {
            let (head, rest, next_start) = match tail.find(P::SEPARATOR) {
                Some(i) => (&tail[..i], &tail[i + sep_len..], tail_start + i + sep_len),
                None => (tail, "", other.data.len()),
            };

            if head == P::PARENT_SEGMENT {
                let prefix = &self.data[..end];
                if self.rootsep != 0 && end == self.rootsep {
                    return Err(PathError::InsufficientParents {
                        path: self.data.clone(),
                        needed: tail
                            .split(P::SEPARATOR)
                            .take_while(|s| *s == P::PARENT_SEGMENT)
                            .count(),
                    });
                }
                let start = last_segment_start::<P>(prefix, self.rootsep);
                if end == 0 || &prefix[start..] == P::PARENT_SEGMENT {
                    underflow += 1;
                } else if start == self.rootsep {
                    end = self.rootsep;
                } else {
                    end = start - sep_len;
                }
            } else if head != P::SELF_SEGMENT {
                break;
            }

            walked = true;
            tail = rest;
            tail_start = next_start;
        }

        if !walked {
            let mut data = String::with_capacity(self.data.len() + sep_len + other.data.len());
            data.push_str(&self.data);
            if !self.is_root() {
                data.push(P::SEPARATOR);
            }
            let offset = data.len();
            data.push_str(&other.data);
            return Ok(Self::from_raw(data, self.rootsep, offset + other.lastsep));
        }

        let mut data = String::with_capacity(end + underflow * 3 + sep_len + tail.len());
        data.push_str(&self.data[..end]);
        let mut lastsep = last_segment_start::<P>(&data, self.rootsep);
        for _ in 0..underflow {
            lastsep = push_segment::<P>(&mut data, self.rootsep, P::PARENT_SEGMENT);
        }
        if !tail.is_empty() {
            let offset = push_segment::<P>(&mut data, self.rootsep, tail);
            lastsep = offset + (other.lastsep - tail_start);
        } else if data.is_empty() {
            data.push_str(P::SELF_SEGMENT);
            lastsep = 0;
        }

        Ok(Self::from_raw(data, self.rootsep, lastsep))
    }

    /// Number of segments, counting the root as one
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Iterate segments left to right, the root first when present
    ///
    /// # Examples
    /// ```
    /// use handlepath::{GenericPath, Posix};
    ///
    /// let path = GenericPath::<Posix>::parse("/a/b").unwrap();
    /// let segments: Vec<_> = path.segments().collect();
    /// assert_eq!(segments, ["/", "a", "b"]);
    /// ```
    pub fn segments(&self) -> Segments<'_, P> {
        Segments {
            path: self,
            cursor: 0,
        }
    }

    /// Segment-wise prefix test
    pub fn starts_with(&self, prefix: &Self) -> bool {
        let head = prefix.data.as_str();
        if !self.data.starts_with(head) {
            return false;
        }
        self.data.len() == head.len()
            || prefix.is_root()
            || self.data[head.len()..].starts_with(P::SEPARATOR)
    }
}

/// Append a segment, inserting a separator unless `data` is empty or a bare
/// root, and return the offset the segment starts at.
fn push_segment<P: Platform>(data: &mut String, rootsep: usize, segment: &str) -> usize {
    if data.len() > rootsep {
        data.push(P::SEPARATOR);
    }
    let start = data.len();
    data.push_str(segment);
    start
}

/// Start of the final segment of normalized `data`, zero for a bare root.
fn last_segment_start<P: Platform>(data: &str, rootsep: usize) -> usize {
    if data.len() == rootsep {
        return 0;
    }
    rootsep
        + data[rootsep..]
            .rfind(P::SEPARATOR)
            .map_or(0, |i| i + P::SEPARATOR.len_utf8())
}

/// The normalized root if `segment` is exactly a root.
fn bare_root<P: Platform>(segment: &str) -> Result<Option<String>> {
    let normalized = P::normalize_separators(segment);
    let (root, rest) = P::split_root(&normalized)?;
    if root.is_empty() || !rest.is_empty() {
        Ok(None)
    } else {
        Ok(Some(root.into_owned()))
    }
}

/// Iterator over the segments of a [`GenericPath`]
#[derive(Clone)]
pub struct Segments<'a, P: Platform> {
    path: &'a GenericPath<P>,
    cursor: usize,
}

impl<'a, P: Platform> Iterator for Segments<'a, P> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.path.data.as_str();
        if self.cursor >= data.len() {
            return None;
        }

        if self.cursor == 0 && self.path.rootsep != 0 {
            self.cursor = self.path.rootsep;
            return Some(&data[..self.path.rootsep]);
        }

        let start = self.cursor;
        let end = data[start..]
            .find(P::SEPARATOR)
            .map_or(data.len(), |i| start + i);
        self.cursor = end + P::SEPARATOR.len_utf8();
        Some(&data[start..end])
    }
}

impl<P: Platform> PartialEq for GenericPath<P> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<P: Platform> Eq for GenericPath<P> {}

impl<P: Platform> Hash for GenericPath<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

/// Ancestor order: a path is less than every path it is a proper prefix of.
impl<P: Platform> PartialOrd for GenericPath<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else if other.starts_with(self) {
            Some(Ordering::Less)
        } else if self.starts_with(other) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl<P: Platform> fmt::Display for GenericPath<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}

impl<P: Platform> fmt::Debug for GenericPath<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GenericPath({:?})", self.data)
    }
}

impl<P: Platform> FromStr for GenericPath<P> {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<P: Platform> AsRef<str> for GenericPath<P> {
    fn as_ref(&self) -> &str {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Posix, Windows};

    fn posix(s: &str) -> GenericPath<Posix> {
        GenericPath::parse(s).unwrap()
    }

    fn windows(s: &str) -> GenericPath<Windows> {
        GenericPath::parse(s).unwrap()
    }

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(posix("a//b").as_str(), "a/b");
        assert_eq!(posix("/a/b/").as_str(), "/a/b");
        assert_eq!(posix("./a/./b/.").as_str(), "a/b");
        assert_eq!(posix("///").as_str(), "/");
        assert_eq!(posix("./.").as_str(), ".");
        assert_eq!(posix("a/../b").as_str(), "a/../b");
        assert_eq!(posix("/../a").as_str(), "/a");
        assert_eq!(posix("/..").as_str(), "/");
        assert_eq!(posix("../../a").as_str(), "../../a");
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(GenericPath::<Posix>::parse(""), Err(PathError::EmptyPath));
        assert!(matches!(
            GenericPath::<Posix>::parse("a/b\0c"),
            Err(PathError::InvalidSegment { .. })
        ));
        assert!(matches!(
            GenericPath::<Windows>::parse("a\\CON\\b"),
            Err(PathError::InvalidSegment { .. })
        ));
    }

    #[test]
    fn test_offsets() {
        let p = posix("/a/bc");
        assert_eq!((p.rootsep, p.lastsep), (1, 3));
        let p = posix("a");
        assert_eq!((p.rootsep, p.lastsep), (0, 0));
        let p = posix("/");
        assert_eq!((p.rootsep, p.lastsep), (1, 0));
        let p = windows("C:\\x\\y");
        assert_eq!((p.rootsep, p.lastsep), (3, 5));
    }

    #[test]
    fn test_root() {
        assert_eq!(posix("/a/b").root(), Some(posix("/")));
        assert_eq!(posix("/").root(), Some(posix("/")));
        assert_eq!(posix("a/b").root(), None);
        assert_eq!(windows("C:\\a").root(), Some(windows("C:\\")));
        assert_eq!(
            windows("//srv/share/a").root().unwrap().as_str(),
            "\\\\srv\\share\\"
        );
    }

    #[test]
    fn test_basename() {
        assert_eq!(posix("/a/b").basename(), Some("b"));
        assert_eq!(posix("a").basename(), Some("a"));
        assert_eq!(posix("/a/b/..").basename(), None);
        assert_eq!(posix("..").basename(), None);
        assert_eq!(posix("/..").basename(), Some("/"));
        assert_eq!(windows("C:\\dir\\f.txt").basename(), Some("f.txt"));
    }

    #[test]
    fn test_parent() {
        assert_eq!(posix("/a/b").parent(), posix("/a"));
        assert_eq!(posix("/a").parent(), posix("/"));
        assert_eq!(posix("/").parent(), posix("/"));
        assert_eq!(posix("a").parent(), posix("."));
        assert_eq!(posix(".").parent(), posix(".."));
        assert_eq!(posix("..").parent(), posix("../.."));
        assert_eq!(posix("../..").parent(), posix("../../.."));
        assert_eq!(posix("/a/..").parent().as_str(), "/a/../..");
        assert_eq!(windows("C:\\a\\b").parent(), windows("C:\\a"));
        assert_eq!(windows("C:\\a").parent(), windows("C:\\"));
    }

    #[test]
    fn test_parent_recomputes_lastsep() {
        let p = posix("/abc/de/f").parent();
        assert_eq!(p.basename(), Some("de"));
        assert_eq!(p.parent().basename(), Some("abc"));
    }

    #[test]
    fn test_join_plain() {
        let joined = posix("/a").join(&posix("b/c")).unwrap();
        assert_eq!(joined.as_str(), "/a/b/c");
        assert_eq!(joined.basename(), Some("c"));

        assert_eq!(posix("/").join(&posix("x")).unwrap().as_str(), "/x");
        assert_eq!(posix("a").join(&posix("b")).unwrap().basename(), Some("b"));
        assert_eq!(
            windows("C:\\").join(&windows("a\\b")).unwrap().as_str(),
            "C:\\a\\b"
        );
    }

    #[test]
    fn test_join_self_segment() {
        let p = posix("/a/b");
        assert_eq!(p.join(&GenericPath::current()).unwrap(), p);
        assert_eq!(
            GenericPath::<Posix>::current().join(&posix("a/b")).unwrap(),
            posix("a/b")
        );
        assert_eq!(
            GenericPath::<Posix>::current()
                .join(&GenericPath::parent_ref())
                .unwrap(),
            posix("..")
        );
    }

    #[test]
    fn test_join_parent_walk() {
        assert_eq!(posix("/a/b").join(&posix("../../c")).unwrap(), posix("/c"));
        assert_eq!(posix("a/b").join(&posix("../../../c")).unwrap(), posix("../c"));
        assert_eq!(posix("/a/b").join(&posix("..")).unwrap(), posix("/a"));
        assert_eq!(posix("/a/b").join(&posix("../..")).unwrap(), posix("/"));
        assert_eq!(posix("a/b").join(&posix("../..")).unwrap(), posix("."));
        assert_eq!(posix("a").join(&posix("../..")).unwrap(), posix(".."));
        assert_eq!(posix("../x").join(&posix("../../c")).unwrap(), posix("../../c"));
        assert_eq!(posix("/a/..").join(&posix("..")).unwrap().as_str(), "/a/../..");
        assert_eq!(
            windows("C:\\a\\b").join(&windows("..\\c")).unwrap(),
            windows("C:\\a\\c")
        );
    }

    #[test]
    fn test_join_lastsep_after_walk() {
        let joined = posix("/aa/bb").join(&posix("../cc/dd")).unwrap();
        assert_eq!(joined.as_str(), "/aa/cc/dd");
        assert_eq!(joined.basename(), Some("dd"));
        assert_eq!(joined.parent().basename(), Some("cc"));

        let joined = posix("x").join(&posix("../../y")).unwrap();
        assert_eq!(joined.as_str(), "../y");
        assert_eq!(joined.basename(), Some("y"));

        let joined = posix("/aa/bb").join(&posix("..")).unwrap();
        assert_eq!(joined.basename(), Some("aa"));
    }

    #[test]
    fn test_join_errors() {
        assert_eq!(
            posix("/a").join(&posix("../..")),
            Err(PathError::InsufficientParents {
                path: "/a".to_string(),
                needed: 1,
            })
        );
        assert_eq!(
            posix("/").join(&posix("../../x")),
            Err(PathError::InsufficientParents {
                path: "/".to_string(),
                needed: 2,
            })
        );
        assert!(matches!(
            posix("a").join(&posix("/b")),
            Err(PathError::AbsolutePath { .. })
        ));
    }

    #[test]
    fn test_segments() {
        assert_eq!(posix("a/b").segments().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(posix("/").segments().collect::<Vec<_>>(), ["/"]);
        assert_eq!(
            windows("\\\\srv\\share\\x").segments().collect::<Vec<_>>(),
            ["\\\\srv\\share\\", "x"]
        );
        assert_eq!(posix("/a/b").depth(), 3);
        assert_eq!(posix(".").depth(), 1);

        // Restartable: a fresh iterator starts over.
        let path = posix("x/y");
        let mut first = path.segments();
        first.next();
        assert_eq!(path.segments().next(), Some("x"));
    }

    #[test]
    fn test_from_segments() {
        assert_eq!(
            GenericPath::<Posix>::from_segments(["a", "b"]).unwrap(),
            posix("a/b")
        );
        assert_eq!(
            GenericPath::<Posix>::from_segments(["..", "a"]).unwrap(),
            posix("../a")
        );
        assert_eq!(
            GenericPath::<Posix>::from_segments(["/", "..", "a"]).unwrap(),
            posix("/a")
        );
        assert_eq!(
            GenericPath::<Windows>::from_segments(["C:\\", "dir"]).unwrap(),
            windows("C:\\dir")
        );
        assert_eq!(
            GenericPath::<Posix>::from_segments(Vec::<String>::new()),
            Err(PathError::EmptyPath)
        );
        assert!(GenericPath::<Posix>::from_segments(["a", ".."]).is_err());
        assert!(GenericPath::<Posix>::from_segments(["."]).is_err());
        assert!(GenericPath::<Posix>::from_segments(["a", ""]).is_err());
    }

    #[test]
    fn test_starts_with_and_order() {
        assert!(posix("/a/b").starts_with(&posix("/a")));
        assert!(posix("/a/b").starts_with(&posix("/")));
        assert!(!posix("/ab").starts_with(&posix("/a")));
        assert!(posix("/a") < posix("/a/b"));
        assert!(posix("/a/b") > posix("/"));
        assert_eq!(posix("/a").partial_cmp(&posix("/b")), None);
    }
}
