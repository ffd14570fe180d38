use crate::constants::default_extensions;
use std::fmt;
use std::sync::Arc;

/// Formats the value written into a `sourceMappingURL` comment from the
/// merged map's base file name
pub type UrlFormatter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// User-facing options of the css-sourcemap plugin
#[derive(Clone)]
pub struct CssSourcemapOptions {
    /// Module suffixes whose maps are collected
    pub extensions: Vec<String>,

    /// When false the plugin registers without engaging any hook
    pub enabled: bool,

    /// Subdirectory of each stylesheet's directory that receives its map
    pub folder: String,

    pub get_url: UrlFormatter,
}

impl CssSourcemapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn get_url(mut self, get_url: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.get_url = Arc::new(get_url);
        self
    }

    /// URL written for the map named `file_name`
    pub fn format_url(&self, file_name: &str) -> String {
        (self.get_url)(file_name)
    }
}

impl Default for CssSourcemapOptions {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            enabled: true,
            folder: String::new(),
            get_url: Arc::new(|file_name: &str| file_name.to_string()),
        }
    }
}

impl fmt::Debug for CssSourcemapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CssSourcemapOptions")
            .field("extensions", &self.extensions)
            .field("enabled", &self.enabled)
            .field("folder", &self.folder)
            .finish_non_exhaustive()
    }
}
