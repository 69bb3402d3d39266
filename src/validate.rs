//! Segment validation
//!
//! Pure classification of candidate path segments for each platform dialect.
//! Windows rules are a superset of the POSIX rules: a segment that fails the
//! POSIX checks is rejected before any Windows-only check runs.

use crate::error::{InvalidReason, PathError, Result};

/// Device names Windows reserves regardless of directory.
///
/// Matched literally against the whole segment, so `CON.txt` is accepted.
pub(crate) const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

const WINDOWS_FORBIDDEN: [char; 7] = ['<', '>', ':', '"', '|', '?', '*'];

/// Validate a segment under POSIX rules
///
/// With `multipart` set the segment comes from splitting a whole path string,
/// so the pseudo-segments `.` and `..` are accepted and the separator check is
/// skipped.
///
/// # Examples
/// ```
/// use handlepath::validate_posix_segment;
///
/// assert!(validate_posix_segment("file.txt", false).is_ok());
/// assert!(validate_posix_segment("..", false).is_err());
/// assert!(validate_posix_segment("..", true).is_ok());
/// assert!(validate_posix_segment("a/b", false).is_err());
/// ```
pub fn validate_posix_segment(segment: &str, multipart: bool) -> Result<()> {
    if segment.is_empty() {
        return Err(PathError::invalid(segment, InvalidReason::Empty, None));
    }

    if !multipart && (segment == "." || segment == "..") {
        return Err(PathError::invalid(
            segment,
            InvalidReason::Reserved,
            Some(segment),
        ));
    }

    if segment.contains('\0') {
        return Err(PathError::invalid(segment, InvalidReason::Char, Some("\0")));
    }

    if !multipart && segment.contains('/') {
        return Err(PathError::invalid(
            segment,
            InvalidReason::Separator,
            Some("/"),
        ));
    }

    Ok(())
}

/// Validate a segment under Windows rules
///
/// # Examples
/// ```
/// use handlepath::validate_windows_segment;
///
/// assert!(validate_windows_segment("report.txt", false).is_ok());
/// assert!(validate_windows_segment("CON", false).is_err());
/// assert!(validate_windows_segment("name.", false).is_err());
/// assert!(validate_windows_segment("a:b", false).is_err());
/// ```
pub fn validate_windows_segment(segment: &str, multipart: bool) -> Result<()> {
    validate_posix_segment(segment, multipart)?;

    if RESERVED_NAMES.contains(&segment) {
        return Err(PathError::invalid(
            segment,
            InvalidReason::Reserved,
            Some(segment),
        ));
    }

    // Pseudo-segments only survive the POSIX pass in multipart mode.
    let pseudo = segment == "." || segment == "..";
    if !pseudo {
        if let Some(last) = segment.chars().last().filter(|c| *c == '.' || *c == ' ') {
            return Err(PathError::invalid(
                segment,
                InvalidReason::Suffix,
                Some(last.encode_utf8(&mut [0; 4])),
            ));
        }
    }

    if let Some(c) = segment.chars().find(|c| WINDOWS_FORBIDDEN.contains(c)) {
        return Err(PathError::invalid(
            segment,
            InvalidReason::Char,
            Some(c.encode_utf8(&mut [0; 4])),
        ));
    }

    if !multipart && segment.contains('\\') {
        return Err(PathError::invalid(
            segment,
            InvalidReason::Separator,
            Some("\\"),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(result: Result<()>) -> InvalidReason {
        match result {
            Err(PathError::InvalidSegment { reason, .. }) => reason,
            other => panic!("expected InvalidSegment, got {other:?}"),
        }
    }

    #[test]
    fn test_posix_segments() {
        // Valid segments
        assert!(validate_posix_segment("file.txt", false).is_ok());
        assert!(validate_posix_segment(".hidden", false).is_ok());
        assert!(validate_posix_segment("...", false).is_ok());
        assert!(validate_posix_segment("with space ", false).is_ok());
        assert!(validate_posix_segment("CON", false).is_ok());
        assert!(validate_posix_segment("a\\b", false).is_ok());

        // Invalid segments with specific reasons
        assert_eq!(reason(validate_posix_segment("", false)), InvalidReason::Empty);
        assert_eq!(reason(validate_posix_segment("", true)), InvalidReason::Empty);
        assert_eq!(
            reason(validate_posix_segment(".", false)),
            InvalidReason::Reserved
        );
        assert_eq!(
            reason(validate_posix_segment("..", false)),
            InvalidReason::Reserved
        );
        assert_eq!(
            reason(validate_posix_segment("file\0null", true)),
            InvalidReason::Char
        );
        assert_eq!(
            reason(validate_posix_segment("a/b", false)),
            InvalidReason::Separator
        );
    }

    #[test]
    fn test_posix_multipart() {
        assert!(validate_posix_segment(".", true).is_ok());
        assert!(validate_posix_segment("..", true).is_ok());
        assert!(validate_posix_segment("a/b", true).is_ok());
    }

    #[test]
    fn test_windows_segments() {
        assert!(validate_windows_segment("report.txt", false).is_ok());
        assert!(validate_windows_segment("..", true).is_ok());
        assert!(validate_windows_segment(".", true).is_ok());

        assert_eq!(
            reason(validate_windows_segment("CON", false)),
            InvalidReason::Reserved
        );
        assert_eq!(
            reason(validate_windows_segment("LPT9", false)),
            InvalidReason::Reserved
        );
        assert_eq!(
            reason(validate_windows_segment("name.", false)),
            InvalidReason::Suffix
        );
        assert_eq!(
            reason(validate_windows_segment("name ", false)),
            InvalidReason::Suffix
        );
        for bad in ["a<b", "a>b", "a:b", "a\"b", "a|b", "a?b", "a*b"] {
            assert_eq!(reason(validate_windows_segment(bad, false)), InvalidReason::Char);
        }
        assert_eq!(
            reason(validate_windows_segment("a\\b", false)),
            InvalidReason::Separator
        );
        assert!(validate_windows_segment("a\\b", true).is_ok());
    }

    #[test]
    fn test_windows_inherits_posix_rules() {
        assert_eq!(reason(validate_windows_segment("", false)), InvalidReason::Empty);
        assert_eq!(
            reason(validate_windows_segment("a/b", false)),
            InvalidReason::Separator
        );
        assert_eq!(
            reason(validate_windows_segment("..", false)),
            InvalidReason::Reserved
        );
    }

    #[test]
    fn test_reserved_names_are_literal() {
        // Only the exact spelling is reserved.
        assert!(validate_windows_segment("CON.txt", false).is_ok());
        assert!(validate_windows_segment("con", false).is_ok());
        assert!(validate_windows_segment("COM10", false).is_ok());
    }

    #[test]
    fn test_error_carries_particular() {
        match validate_windows_segment("a?b", false) {
            Err(PathError::InvalidSegment {
                segment,
                particular,
                ..
            }) => {
                assert_eq!(segment, "a?b");
                assert_eq!(particular.as_deref(), Some("?"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
