//! Path syntax helpers.
//!
//! Absolute paths are `/`-delimited. Input is trimmed, backslashes become
//! forward slashes, empty segments and `.` are dropped and `..` pops a
//! segment (never above the root).

use smallvec::SmallVec;

pub const ROOT: &str = "/";
pub const SEPARATOR: char = '/';

/// Segment list of a path; most test paths are a handful of levels deep.
pub type Segments<'a> = SmallVec<[&'a str; 8]>;

/// Split into normalized segments.
pub fn segments(path: &str) -> Segments<'_> {
    let mut out = Segments::new();
    for seg in path.trim().split(['/', '\\']) {
        let seg = seg.trim();
        match seg {
            "" | "." => {}
            ".." => { out.pop(); }
            _ => out.push(seg),
        }
    }
    out
}

/// Normalize to an absolute path. Blank or absent input maps to
/// `/<untitled>`.
pub fn normalize(path: Option<&str>, untitled: &str) -> String {
    match path.map(str::trim) {
        None | Some("") => format!("{SEPARATOR}{untitled}"),
        Some(p) => from_segments(&segments(p)),
    }
}

pub fn from_segments(segs: &[&str]) -> String {
    if segs.is_empty() {
        return ROOT.to_owned();
    }
    let mut out = String::new();
    for s in segs {
        out.push(SEPARATOR);
        out.push_str(s);
    }
    out
}

/// `join("/", "a") == "/a"`, `join("/a", "b") == "/a/b"`.
pub fn join(parent: &str, name: &str) -> String {
    if parent == ROOT {
        format!("{SEPARATOR}{name}")
    } else {
        format!("{parent}{SEPARATOR}{name}")
    }
}

/// Split a normalized absolute path into (parent path, name).
/// The root has no parent.
pub fn split_last(path: &str) -> Option<(&str, &str)> {
    if path == ROOT {
        return None;
    }
    let idx = path.rfind(SEPARATOR)?;
    let parent = if idx == 0 { ROOT } else { &path[..idx] };
    Some((parent, &path[idx + 1..]))
}

pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Some("  root/section/page "), "untitled"), "/root/section/page");
        assert_eq!(normalize(Some("\\a\\b\\"), "untitled"), "/a/b");
        assert_eq!(normalize(Some("/a//b/./c/../d"), "untitled"), "/a/b/d");
        assert_eq!(normalize(Some("/"), "untitled"), "/");
        assert_eq!(normalize(Some("   "), "untitled"), "/untitled");
        assert_eq!(normalize(None, "untitled"), "/untitled");
    }

    #[test]
    fn test_join_and_split() {
        assert_eq!(join("/", "a"), "/a");
        assert_eq!(join("/a", "b"), "/a/b");
        assert_eq!(split_last("/a/b"), Some(("/a", "b")));
        assert_eq!(split_last("/a"), Some(("/", "a")));
        assert_eq!(split_last("/"), None);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(parts in prop::collection::vec("[a-z0-9]{1,6}", 0..6), sep in "[/\\\\]") {
            let raw = parts.join(&sep);
            let once = normalize(Some(&raw), "untitled");
            let twice = normalize(Some(&once), "untitled");
            prop_assert_eq!(&once, &twice);
            prop_assert!(once.starts_with('/'));
            prop_assert!(once == "/" || !once.ends_with('/'));
        }

        #[test]
        fn prop_segments_roundtrip(parts in prop::collection::vec("[a-z]{1,5}", 1..6)) {
            let path = format!("/{}", parts.join("/"));
            let segs = segments(&path);
            prop_assert_eq!(from_segments(&segs), path.clone());
        }
    }
}
