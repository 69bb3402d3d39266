//! Property test generators for path algebra
//!
//! Strategies produce segment sequences as well as rendered strings, so the
//! tests can compare what the parser builds against what the segments say it
//! should build.

use proptest::prelude::*;

use crate::validate::RESERVED_NAMES;

/// Generators for path testing scenarios
pub struct PathGenerators;

impl PathGenerators {
    /// A segment accepted on every platform
    pub fn segment() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,12}[a-zA-Z0-9_]"
            .prop_filter("Not a reserved name", |s| {
                !RESERVED_NAMES.contains(&s.as_str())
            })
    }

    /// One to `max` portable segments
    pub fn segments(max: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(Self::segment(), 1..=max)
    }

    /// Relative POSIX path with no parent references
    pub fn relative_path() -> impl Strategy<Value = String> {
        Self::segments(5).prop_map(|segs| segs.join("/"))
    }

    pub fn absolute_path() -> impl Strategy<Value = String> {
        Self::relative_path().prop_map(|path| format!("/{}", path))
    }

    /// Relative path starting with `n` parent references
    pub fn ascending_path() -> impl Strategy<Value = (usize, String)> {
        (1usize..4, Self::relative_path()).prop_map(|(n, rest)| {
            let mut parts = vec![".."; n].join("/");
            parts.push('/');
            parts.push_str(&rest);
            (n, parts)
        })
    }

    /// A relative path written with redundant separators and `.` segments
    pub fn noisy_path() -> impl Strategy<Value = (String, String)> {
        Self::segments(4).prop_map(|segs| {
            let clean = segs.join("/");
            let noisy = segs
                .iter()
                .enumerate()
                .map(|(i, s)| if i % 2 == 0 { format!("./{s}") } else { s.clone() })
                .collect::<Vec<_>>()
                .join("//");
            (noisy, clean)
        })
    }

    /// Windows path under a drive root, written with forward slashes
    pub fn windows_drive_path() -> impl Strategy<Value = String> {
        (prop::char::range('A', 'Z'), Self::relative_path())
            .prop_map(|(drive, rest)| format!("{drive}:/{rest}"))
    }

    /// Segments rejected by the POSIX validator
    pub fn invalid_posix_segment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("".to_string()),
            Just(".".to_string()),
            Just("..".to_string()),
            Just("a/b".to_string()),
            Just("nul\0byte".to_string()),
        ]
    }

    /// Segments accepted on POSIX but rejected on Windows
    pub fn windows_only_invalid_segment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("CON".to_string()),
            Just("PRN".to_string()),
            Just("AUX".to_string()),
            Just("NUL".to_string()),
            Just("COM1".to_string()),
            Just("LPT9".to_string()),
            Just("trailing.".to_string()),
            Just("trailing ".to_string()),
            Just("file<script>".to_string()),
            Just("file|pipe".to_string()),
            Just("file?query".to_string()),
            Just("file*glob".to_string()),
            Just("file\"quote".to_string()),
            Just("back\\slash".to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::{PosixPath, WindowsPath};
    use crate::validate::{validate_posix_segment, validate_windows_segment};

    proptest! {
        #[test]
        fn segments_are_valid_everywhere(segment in PathGenerators::segment()) {
            prop_assert!(validate_posix_segment(&segment, false).is_ok());
            prop_assert!(validate_windows_segment(&segment, false).is_ok());
        }

        #[test]
        fn invalid_posix_segments_are_rejected(segment in PathGenerators::invalid_posix_segment()) {
            prop_assert!(validate_posix_segment(&segment, false).is_err());
            prop_assert!(validate_windows_segment(&segment, false).is_err());
        }

        #[test]
        fn windows_only_segments_split_the_platforms(
            segment in PathGenerators::windows_only_invalid_segment()
        ) {
            prop_assert!(validate_posix_segment(&segment, false).is_ok());
            prop_assert!(validate_windows_segment(&segment, false).is_err());
        }

        #[test]
        fn noisy_paths_have_the_same_segments((noisy, clean) in PathGenerators::noisy_path()) {
            prop_assert_eq!(noisy.replace("./", "").replace("//", "/"), clean);
        }

        #[test]
        fn clean_paths_parse_verbatim(
            relative in PathGenerators::relative_path(),
            absolute in PathGenerators::absolute_path(),
        ) {
            let parsed_relative = PosixPath::parse(&relative).unwrap();
            let parsed_absolute = PosixPath::parse(&absolute).unwrap();
            prop_assert_eq!(parsed_relative.as_str(), relative.as_str());
            prop_assert_eq!(parsed_absolute.as_str(), absolute.as_str());
        }

        #[test]
        fn ascending_paths_keep_their_parents((n, path) in PathGenerators::ascending_path()) {
            let parsed = PosixPath::parse(&path).unwrap();
            let leading = parsed.segments().take_while(|s| *s == "..").count();
            prop_assert_eq!(leading, n);
        }

        #[test]
        fn drive_paths_are_absolute(path in PathGenerators::windows_drive_path()) {
            let parsed = WindowsPath::parse(&path).unwrap();
            prop_assert!(parsed.is_absolute());
            prop_assert_eq!(parsed.as_str(), path.replace('/', "\\"));
        }
    }
}
