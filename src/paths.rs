//! Path helpers shared by note parsing, discovery and id assignment.

use std::{
    borrow::Cow,
    path::{Component, Path},
};
use walkdir::DirEntry;

/// Utility function to replace separators and convert to unicode (via to_string_lossy) on os path.
///
/// Note ids hash this form of a path, so it must not depend on the host separator.
pub fn os_path_to_string<P: AsRef<Path>>(os_path_ref: P) -> String {
    let res = os_path_ref
        .as_ref()
        .components()
        .filter_map(|c| match c {
            Component::RootDir => Some(Cow::from("".to_string())),
            Component::CurDir => None,
            _ => Some(c.as_os_str().to_string_lossy()),
        })
        .collect::<Vec<_>>()
        .join("/");
    tracing::trace!(
        "os_path_to_string: turned {:?} into {}",
        os_path_ref.as_ref().components(),
        res
    );
    res
}

/// File name without its final extension, if the path names a file at all.
pub fn file_stem<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .filter(|stem| !stem.is_empty())
}

pub fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

pub fn has_extension<P: AsRef<Path>>(path: P, extension: &str) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.eq_ignore_ascii_case(extension))
        .is_some()
}
