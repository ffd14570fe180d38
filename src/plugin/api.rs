use super::hooks::{
    AugmentChunkHashFn, BuildStartOptions, EmittedAsset, OutputOptions, ReferenceId,
    RenderedChunk, TransformResult,
};
use super::manifest::PluginManifest;
use crate::bundle::OutputBundle;

/// Result type for plugin operations
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors that can occur during plugin operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// Plugin execution failed
    ExecutionFailed(String),

    /// Referenced file or plugin not found
    NotFound(String),

    /// Invalid plugin
    Invalid(String),

    /// A plugin this one relies on is not registered
    DependencyError(String),
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginError::ExecutionFailed(msg) => write!(f, "Plugin execution failed: {}", msg),
            PluginError::NotFound(msg) => write!(f, "Not found: {}", msg),
            PluginError::Invalid(msg) => write!(f, "Invalid plugin: {}", msg),
            PluginError::DependencyError(msg) => write!(f, "Dependency error: {}", msg),
        }
    }
}

impl std::error::Error for PluginError {}

/// Services the host offers to a running hook
pub trait PluginContext {
    /// Source map of the module currently being transformed, combining every
    /// transform that ran before the calling plugin
    fn get_combined_sourcemap(&self) -> PluginResult<String>;

    /// Adds a file to the bundle and returns a handle to it
    ///
    /// An explicit `file_name` must stay inside the output directory.
    fn emit_file(&mut self, asset: EmittedAsset) -> PluginResult<ReferenceId>;

    /// Resolves a handle from `emit_file` to the file's final name
    fn get_file_name(&self, reference: &ReferenceId) -> PluginResult<String>;
}

/// Host side of the context used while a module is transformed
pub trait TransformContext: PluginContext {
    /// Records the map returned by a transform so later plugins see it in
    /// `get_combined_sourcemap`
    fn push_map(&mut self, map: String);

    fn as_plugin_context(&mut self) -> &mut dyn PluginContext;
}

/// The trait every pipeline plugin implements
///
/// Hooks are called in a fixed order per build: `build_start`, `transform`
/// for each module, `output_options`, `render_chunk` for each chunk, hash
/// augmentation for content-hashed chunks, then `generate_bundle`. The host
/// calls a hook only when the matching flag in the manifest's capabilities is
/// set, so every method has a no-op default.
pub trait Plugin: Send + Sync {
    /// Get plugin metadata
    fn metadata(&self) -> PluginManifest;

    /// Called once before any module is loaded
    fn build_start(
        &mut self,
        ctx: &mut dyn PluginContext,
        options: &BuildStartOptions<'_>,
    ) -> PluginResult<()> {
        let _ = (ctx, options);
        Ok(())
    }

    /// Inspect or replace the output naming configuration
    fn output_options(&mut self, options: OutputOptions) -> PluginResult<OutputOptions> {
        Ok(options)
    }

    /// Transform one module. `None` leaves the module untouched.
    fn transform(
        &mut self,
        ctx: &mut dyn PluginContext,
        code: &str,
        id: &str,
    ) -> PluginResult<Option<TransformResult>> {
        let _ = (ctx, code, id);
        Ok(None)
    }

    /// Rewrite the code of a rendered chunk. `None` keeps it.
    fn render_chunk(
        &mut self,
        ctx: &mut dyn PluginContext,
        code: &str,
        chunk: &RenderedChunk,
    ) -> PluginResult<Option<String>> {
        let _ = (ctx, code, chunk);
        Ok(None)
    }

    /// Hash augmentation function installed in the host's hook table at
    /// registration. Other plugins may wrap it during `build_start`.
    fn augment_chunk_hash_hook(&self) -> Option<AugmentChunkHashFn> {
        None
    }

    /// Inspect and mutate the finished bundle before it is written
    fn generate_bundle(
        &mut self,
        ctx: &mut dyn PluginContext,
        options: &OutputOptions,
        bundle: &mut OutputBundle,
    ) -> PluginResult<()> {
        let _ = (ctx, options, bundle);
        Ok(())
    }
}
