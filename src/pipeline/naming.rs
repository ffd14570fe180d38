//! File name templating for chunks and assets.

use crate::plugin::hooks::FileNameTemplate;
use crate::utils::paths::basename;
use sha2::{Digest, Sha256};

pub const DEFAULT_ENTRY_FILE_NAMES: &str = "assets/[name]-[hash].js";
pub const DEFAULT_ASSET_FILE_NAMES: &str = "assets/[name]-[hash][extname]";

/// Length of the `[hash]` placeholder replacement
pub const HASH_LENGTH: usize = 8;

/// Hex prefix of the SHA-256 digest over `parts`
pub fn content_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(HASH_LENGTH);
    digest
}

/// Splits an asset name into `(stem, extension without dot)`
fn split_extension(name: &str) -> (&str, &str) {
    let base = basename(name);
    match base.rfind('.') {
        Some(idx) if idx > 0 => (&name[..name.len() - base.len() + idx], &base[idx + 1..]),
        _ => (name, ""),
    }
}

/// Renders an asset file name from `pattern`
pub fn render_asset_file_name(pattern: &str, name: &str, source: &str) -> String {
    let (stem, ext) = split_extension(name);
    let extname = if ext.is_empty() {
        String::new()
    } else {
        format!(".{}", ext)
    };

    pattern
        .replace("[name]", stem)
        .replace("[hash]", &content_hash(&[source]))
        .replace("[extname]", &extname)
        .replace("[ext]", ext)
}

/// Renders a chunk file name from `pattern`; `hash_input` feeds `[hash]`
pub fn render_chunk_file_name(pattern: &str, name: &str, hash_input: &[&str]) -> String {
    pattern
        .replace("[name]", name)
        .replace("[hash]", &content_hash(hash_input))
}

/// Pattern for `name`, falling back to `default` when none is configured
pub fn pattern_or_default(template: Option<&FileNameTemplate>, name: &str, default: &str) -> String {
    template
        .map(|t| t.pattern_for(name))
        .unwrap_or_else(|| default.to_string())
}

/// Appends a counter before the extension of `file_name`
pub fn numbered(file_name: &str, counter: usize) -> String {
    let base_start = file_name.len() - basename(file_name).len();
    match file_name[base_start..].rfind('.') {
        Some(idx) if idx > 0 => {
            let split = base_start + idx;
            format!("{}{}{}", &file_name[..split], counter, &file_name[split..])
        }
        _ => format!("{}{}", file_name, counter),
    }
}
