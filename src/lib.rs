pub mod bundle;
pub mod config;
pub mod constants;
pub mod logging;
pub mod merge;
pub mod options;
pub mod pipeline;
pub mod plugin;
pub mod sourcemap_plugin;
pub mod tracker;
pub mod utils;
use miette::Diagnostic;

pub use bundle::{OutputAsset, OutputBundle, OutputChunk, OutputFile};
pub use options::CssSourcemapOptions;
pub use pipeline::Pipeline;
pub use sourcemap_plugin::{css_sourcemap, CssSourcemapPlugin};
pub use utils::has_valid_extension;

/// Result type alias for the crate
pub type Result<T> = miette::Result<T>;

/// Error types surfaced by builds and configuration loading
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum CssSourcemapError {
    #[error("Build failed in plugin '{plugin}': {message}")]
    #[diagnostic(
        code(css_sourcemap::plugin_failed),
        help("A plugin hook returned an error. If the message names `vite:css-post`, the host pipeline does not register its built-in CSS post-processing plugin.")
    )]
    PluginFailed { plugin: String, message: String },

    #[error("Invalid build input: {0}")]
    #[diagnostic(
        code(css_sourcemap::invalid_input),
        help("Every entry named in the input option must exist in the module graph, and imports must resolve to known module ids.")
    )]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(css_sourcemap::config_error),
        help("Check the [sourcemap] table of .css-sourcemap.toml. Supported keys are extensions, enabled, folder and url_prefix.")
    )]
    ConfigError(String),

    #[error("File operation failed: {0}")]
    #[diagnostic(
        code(css_sourcemap::file_error),
        help("Check if you have necessary permissions and that the path exists.")
    )]
    FileError(String),
}
