//! Payload types exchanged between the host pipeline and plugin hooks.

use super::registry::PluginEntry;
use crate::utils::paths::file_stem;
use std::fmt;
use std::sync::Arc;

/// Opaque handle returned by the host when a plugin emits a file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceId(String);

impl ReferenceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entry points of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOption {
    /// A single entry module
    Single(String),

    /// Several entry modules, each named after its file stem
    List(Vec<String>),

    /// Entry modules keyed by chunk name, in declaration order
    Named(Vec<(String, String)>),
}

impl InputOption {
    /// The value whose file stem names the build: the path of the first
    /// entry, or the first key of a named input
    pub fn first_entry(&self) -> Option<&str> {
        match self {
            InputOption::Single(id) => Some(id.as_str()),
            InputOption::List(ids) => ids.first().map(String::as_str),
            InputOption::Named(entries) => entries.first().map(|(name, _)| name.as_str()),
        }
    }

    /// Every entry as `(chunk name, module id)`
    pub fn entries(&self) -> Vec<(String, String)> {
        match self {
            InputOption::Single(id) => vec![(file_stem(id).to_string(), id.clone())],
            InputOption::List(ids) => ids
                .iter()
                .map(|id| (file_stem(id).to_string(), id.clone()))
                .collect(),
            InputOption::Named(entries) => entries.clone(),
        }
    }
}

impl From<&str> for InputOption {
    fn from(id: &str) -> Self {
        InputOption::Single(id.to_string())
    }
}

/// Function form of a file name pattern: receives the chunk or asset name
/// and returns the pattern to render
pub type FileNameFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A file name pattern made of literal text and `[name]`, `[hash]`, `[ext]`
/// and `[extname]` placeholders
#[derive(Clone)]
pub enum FileNameTemplate {
    Static(String),
    Dynamic(FileNameFn),
}

impl FileNameTemplate {
    /// Pattern to render for an output named `name`
    pub fn pattern_for(&self, name: &str) -> String {
        match self {
            FileNameTemplate::Static(pattern) => pattern.clone(),
            FileNameTemplate::Dynamic(f) => f(name),
        }
    }
}

impl fmt::Debug for FileNameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileNameTemplate::Static(pattern) => f.debug_tuple("Static").field(pattern).finish(),
            FileNameTemplate::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

impl From<&str> for FileNameTemplate {
    fn from(pattern: &str) -> Self {
        FileNameTemplate::Static(pattern.to_string())
    }
}

/// Output naming configuration as seen by the `output_options` hook
///
/// Unset patterns fall back to the host defaults when files are named.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub entry_file_names: Option<FileNameTemplate>,
    pub chunk_file_names: Option<FileNameTemplate>,
    pub asset_file_names: Option<FileNameTemplate>,
}

/// Arguments of the `build_start` hook
pub struct BuildStartOptions<'a> {
    /// Every registered plugin, in execution order
    pub plugins: &'a [PluginEntry],

    /// Configured entry points
    pub input: &'a InputOption,
}

impl BuildStartOptions<'_> {
    /// Finds a registered plugin by name
    pub fn find_plugin(&self, name: &str) -> Option<&PluginEntry> {
        self.plugins.iter().find(|entry| entry.name() == name)
    }
}

/// A chunk as passed to `render_chunk` and hash augmentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChunk {
    pub name: String,
    pub facade_module_id: Option<String>,
    /// Module ids bundled into the chunk, in render order
    pub module_ids: Vec<String>,
    pub is_entry: bool,
}

/// Result of a `transform` hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub code: String,
    /// Source map of this transform, as JSON text
    pub map: Option<String>,
}

/// A file a plugin asks the host to add to the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    /// Name fed to the asset file name pattern
    pub name: Option<String>,

    /// Exact output path, bypassing the pattern
    pub file_name: Option<String>,

    pub source: String,
}

impl EmittedAsset {
    /// An asset named through the asset file name pattern
    pub fn named(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            file_name: None,
            source: source.into(),
        }
    }

    /// An asset written at an exact output path
    pub fn at_path(file_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: None,
            file_name: Some(file_name.into()),
            source: source.into(),
        }
    }
}

/// Hash augmentation function held in a plugin's hook table
///
/// Returning a non-empty string folds it into the chunk's content hash.
pub type AugmentChunkHashFn = Arc<dyn Fn(&RenderedChunk) -> Option<String> + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_entries() {
        let input = InputOption::List(vec!["src/main.ts".into(), "src/admin.ts".into()]);
        assert_eq!(
            input.entries(),
            vec![
                ("main".to_string(), "src/main.ts".to_string()),
                ("admin".to_string(), "src/admin.ts".to_string())
            ]
        );
        assert_eq!(input.first_entry(), Some("src/main.ts"));

        let named = InputOption::Named(vec![("foo".into(), "pages/foo.ts".into())]);
        assert_eq!(named.first_entry(), Some("foo"));
    }

    #[test]
    fn test_dynamic_template_pattern() {
        let template =
            FileNameTemplate::Dynamic(Arc::new(|name: &str| format!("js/{}.[hash].js", name)));
        assert_eq!(template.pattern_for("main"), "js/main.[hash].js");
        assert_eq!(format!("{:?}", template), "Dynamic(<fn>)");
    }
}
