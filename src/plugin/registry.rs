use super::api::{Plugin, PluginContext, PluginError, PluginResult, TransformContext};
use super::hooks::{
    AugmentChunkHashFn, BuildStartOptions, InputOption, OutputOptions, RenderedChunk,
};
use super::manifest::{ApplyMode, HookCapabilities, PluginManifest};
use crate::bundle::OutputBundle;
use crate::{CssSourcemapError, Result};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Per-plugin hook slots the host calls through
///
/// Slots can be read and replaced after registration, which is how one
/// plugin decorates another plugin's hook.
#[derive(Default, Clone)]
pub struct HookTable {
    pub augment_chunk_hash: Option<AugmentChunkHashFn>,
}

/// A plugin registered with the host
#[derive(Clone)]
pub struct PluginEntry {
    manifest: PluginManifest,
    plugin: Arc<RwLock<Box<dyn Plugin>>>,
    hooks: Arc<RwLock<HookTable>>,
}

impl PluginEntry {
    fn new(plugin: Box<dyn Plugin>) -> Self {
        let manifest = plugin.metadata();
        let hooks = HookTable {
            augment_chunk_hash: plugin.augment_chunk_hash_hook(),
        };

        Self {
            manifest,
            plugin: Arc::new(RwLock::new(plugin)),
            hooks: Arc::new(RwLock::new(hooks)),
        }
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    /// Current hash augmentation function, if any
    pub fn augment_chunk_hash(&self) -> Option<AugmentChunkHashFn> {
        self.hooks
            .read()
            .ok()
            .and_then(|hooks| hooks.augment_chunk_hash.clone())
    }

    /// Installs `hook` as the hash augmentation function
    pub fn replace_augment_chunk_hash(&self, hook: AugmentChunkHashFn) -> PluginResult<()> {
        let mut hooks = self.hooks.write().map_err(|_| {
            PluginError::ExecutionFailed(format!(
                "Failed to acquire hook table lock for plugin '{}'",
                self.name()
            ))
        })?;
        hooks.augment_chunk_hash = Some(hook);
        Ok(())
    }

    /// Runs `f` with exclusive access to the plugin
    fn with_plugin_mut<T>(
        &self,
        f: impl FnOnce(&mut dyn Plugin) -> PluginResult<T>,
    ) -> Result<T> {
        let mut plugin = self.plugin.write().map_err(|_| CssSourcemapError::PluginFailed {
            plugin: self.name().to_string(),
            message: "Failed to acquire plugin lock".to_string(),
        })?;

        f(&mut **plugin).map_err(|e| self.failure(e))
    }

    fn failure(&self, error: PluginError) -> miette::Report {
        CssSourcemapError::PluginFailed {
            plugin: self.name().to_string(),
            message: error.to_string(),
        }
        .into()
    }
}

/// Ordered set of plugins taking part in a build
pub struct PluginRegistry {
    entries: Vec<PluginEntry>,
    mode: ApplyMode,
}

impl PluginRegistry {
    /// Create an empty registry for a pipeline running in `mode`
    pub fn new(mode: ApplyMode) -> Self {
        Self {
            entries: Vec::new(),
            mode,
        }
    }

    /// Register a plugin
    ///
    /// Plugins restricted to another mode are skipped. Entries stay sorted by
    /// their enforce bucket, keeping registration order within a bucket.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> PluginResult<()> {
        let entry = PluginEntry::new(plugin);
        let manifest = entry.manifest();

        manifest.validate().map_err(PluginError::Invalid)?;

        if !manifest.applies_to(self.mode) {
            info!(plugin = %manifest.name, mode = ?self.mode, "Skipping plugin for build mode");
            return Ok(());
        }

        if self.get(&manifest.name).is_some() {
            return Err(PluginError::Invalid(format!(
                "Plugin with name '{}' is already registered",
                manifest.name
            )));
        }

        debug!(plugin = %manifest.name, "Registered plugin");
        self.entries.push(entry);
        self.entries.sort_by_key(|entry| entry.manifest().enforce);
        Ok(())
    }

    /// All registered plugins in execution order
    pub fn entries(&self) -> &[PluginEntry] {
        &self.entries
    }

    /// Get a plugin by name
    pub fn get(&self, name: &str) -> Option<&PluginEntry> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// Get all plugin names in execution order
    pub fn plugin_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.name().to_string())
            .collect()
    }

    /// Get the number of registered plugins
    pub fn plugin_count(&self) -> usize {
        self.entries.len()
    }

    fn engaged(
        &self,
        hook: impl Fn(&HookCapabilities) -> bool,
    ) -> impl Iterator<Item = &PluginEntry> {
        self.entries
            .iter()
            .filter(move |entry| hook(&entry.manifest().capabilities))
    }

    pub fn dispatch_build_start(
        &self,
        ctx: &mut dyn PluginContext,
        input: &InputOption,
    ) -> Result<()> {
        let options = BuildStartOptions {
            plugins: &self.entries,
            input,
        };

        for entry in self.engaged(|caps| caps.build_start) {
            debug!(plugin = entry.name(), "build_start");
            entry.with_plugin_mut(|plugin| plugin.build_start(ctx, &options))?;
        }
        Ok(())
    }

    pub fn dispatch_output_options(&self, options: OutputOptions) -> Result<OutputOptions> {
        let mut options = options;
        for entry in self.engaged(|caps| caps.output_options) {
            options = entry.with_plugin_mut(|plugin| plugin.output_options(options))?;
        }
        Ok(options)
    }

    /// Runs every transform over one module, feeding each result's map back
    /// into the context before the next plugin runs
    pub fn dispatch_transform(
        &self,
        ctx: &mut dyn TransformContext,
        code: String,
        id: &str,
    ) -> Result<String> {
        let mut code = code;
        for entry in self.engaged(|caps| caps.transform) {
            let result = entry
                .with_plugin_mut(|plugin| plugin.transform(ctx.as_plugin_context(), &code, id))?;
            if let Some(result) = result {
                if let Some(map) = result.map {
                    ctx.push_map(map);
                }
                code = result.code;
            }
        }
        Ok(code)
    }

    pub fn dispatch_render_chunk(
        &self,
        ctx: &mut dyn PluginContext,
        code: String,
        chunk: &RenderedChunk,
    ) -> Result<String> {
        let mut code = code;
        for entry in self.engaged(|caps| caps.render_chunk) {
            if let Some(rendered) =
                entry.with_plugin_mut(|plugin| plugin.render_chunk(ctx, &code, chunk))?
            {
                code = rendered;
            }
        }
        Ok(code)
    }

    /// Concatenation of every non-empty hash augmentation result for `chunk`
    pub fn dispatch_augment_chunk_hash(&self, chunk: &RenderedChunk) -> String {
        let mut augmented = String::new();
        for entry in self.engaged(|caps| caps.augment_chunk_hash) {
            if let Some(hook) = entry.augment_chunk_hash() {
                if let Some(result) = hook(chunk).filter(|r| !r.is_empty()) {
                    debug!(plugin = entry.name(), chunk = %chunk.name, "Augmented chunk hash");
                    augmented.push_str(&result);
                }
            }
        }
        augmented
    }

    pub fn dispatch_generate_bundle(
        &self,
        ctx: &mut dyn PluginContext,
        options: &OutputOptions,
        bundle: &mut OutputBundle,
    ) -> Result<()> {
        for entry in self.engaged(|caps| caps.generate_bundle) {
            debug!(plugin = entry.name(), "generate_bundle");
            entry.with_plugin_mut(|plugin| plugin.generate_bundle(ctx, options, bundle))?;
        }
        Ok(())
    }
}
