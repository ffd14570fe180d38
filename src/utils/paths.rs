//! Posix path helpers for bundle file names.
//!
//! Bundle keys always use `/` separators regardless of the host platform, so
//! these helpers work on strings instead of `std::path::Path`.

use crate::plugin::hooks::{FileNameTemplate, InputOption, OutputOptions};

/// Directory portion of `path`, `.` when there is none
pub fn dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        None => ".",
        Some(0) => "/",
        Some(idx) => &trimmed[..idx],
    }
}

/// Last segment of `path`
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        None => trimmed,
        Some(idx) => &trimmed[idx + 1..],
    }
}

/// Last segment of `path` without its final extension
///
/// Leading dots are part of the name, so `.bashrc` keeps its full name.
pub fn file_stem(path: &str) -> &str {
    let base = basename(path);
    match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    }
}

/// Joins segments with `/`, dropping empty and `.` segments and resolving `..`
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    let absolute = segments
        .iter()
        .map(|s| s.as_ref())
        .find(|s| !s.is_empty())
        .map(|s| s.starts_with('/'))
        .unwrap_or(false);

    let mut parts: Vec<&str> = Vec::new();
    for segment in segments {
        for part in segment.as_ref().split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    if matches!(parts.last(), Some(last) if *last != "..") {
                        parts.pop();
                    } else if !absolute {
                        parts.push("..");
                    }
                }
                other => parts.push(other),
            }
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Whether `file_name` names a file below the output root
///
/// Rejects empty names, absolute names and any `..` segment.
pub fn is_output_relative(file_name: &str) -> bool {
    !file_name.is_empty()
        && !file_name.starts_with('/')
        && !file_name.starts_with('\\')
        && file_name
            .split(|c: char| c == '/' || c == '\\')
            .all(|segment| segment != "..")
}

/// Base name without extension of the first build entry
pub fn extract_file_name(input: &InputOption) -> String {
    input
        .first_entry()
        .map(|entry| file_stem(entry).to_string())
        .unwrap_or_default()
}

/// Prefixes `file_name` with the directory of a static asset file name pattern
///
/// Function-valued patterns are not resolved and contribute no directory.
pub fn extract_full_path(output_options: Option<&OutputOptions>, file_name: &str) -> String {
    let asset_dir = match output_options.and_then(|o| o.asset_file_names.as_ref()) {
        Some(FileNameTemplate::Static(pattern)) => Some(dirname(pattern)),
        Some(FileNameTemplate::Dynamic(_)) | None => None,
    };

    match asset_dir {
        Some(dir) if !dir.is_empty() && dir != "." => join(&[dir, file_name]),
        _ => file_name.to_string(),
    }
}
