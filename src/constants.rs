/// Name the plugin registers under
pub const PLUGIN_NAME: &str = "css-sourcemap";

/// Name of the host's built-in CSS post-processing plugin whose hash hook is observed
pub const CSS_POST_PLUGIN_NAME: &str = "vite:css-post";

/// Module suffixes tracked when no extensions are configured
pub const EXTENSIONS: &[&str] = &[".css", ".scss"];

/// Suffix of emitted stylesheet assets that receive a merged map
pub const CSS_ASSET_SUFFIX: &str = ".css";

/// Token that makes a file name template content-addressed
pub const HASH_TOKEN: &str = "[hash]";

/// Returns the default extension set as owned strings
pub fn default_extensions() -> Vec<String> {
    EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}
