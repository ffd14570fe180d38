//! Bookkeeping that ties emitted stylesheets back to the modules they came from.
//!
//! The host never says which modules ended up in which CSS asset. Two signals
//! recover it: the key returned by the CSS post plugin's hash augmentation
//! (the file names of the CSS assets a chunk imports), or, when output names
//! carry no hash and augmentation never runs, a key derived from the asset
//! file name pattern and the first entry's name during chunk rendering.

use crate::constants::{CSS_POST_PLUGIN_NAME, HASH_TOKEN};
use crate::logging;
use crate::plugin::hooks::{
    BuildStartOptions, FileNameTemplate, OutputOptions, ReferenceId, RenderedChunk,
};
use crate::plugin::{PluginError, PluginResult};
use crate::utils::{extract_file_name, extract_full_path, has_valid_extension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// How chunk-to-module associations are observed for a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssociationMode {
    /// Entry names carry `[hash]`: observe the CSS post plugin's hash augmentation
    #[default]
    HashAugmentation,

    /// Entry names are static: record every rendered chunk under the derived key
    ChunkRender,
}

impl AssociationMode {
    /// Picks the mode for an output configuration
    ///
    /// Function-valued entry patterns are not evaluated and keep hash mode.
    pub fn from_output_options(options: &OutputOptions) -> Self {
        match &options.entry_file_names {
            Some(FileNameTemplate::Static(pattern)) if !pattern.contains(HASH_TOKEN) => {
                AssociationMode::ChunkRender
            }
            _ => AssociationMode::HashAugmentation,
        }
    }
}

/// Chunk or asset key to contributing module ids, in observation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationTable {
    entries: HashMap<String, Vec<String>>,
}

impl AssociationTable {
    pub fn record(&mut self, key: &str, module_id: &str) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .push(module_id.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    associations: AssociationTable,
    map_handles: HashMap<String, ReferenceId>,
    template_name: String,
    output_options: Option<OutputOptions>,
    mode: AssociationMode,
}

impl TrackerState {
    fn fallback_key(&self) -> String {
        extract_full_path(self.output_options.as_ref(), &self.template_name)
    }
}

/// Association state of one plugin instance
pub struct AssociationTracker {
    extensions: Vec<String>,
    state: Arc<Mutex<TrackerState>>,
}

impl AssociationTracker {
    pub fn new(extensions: Vec<String>) -> Self {
        Self {
            extensions,
            state: Arc::new(Mutex::new(TrackerState::default())),
        }
    }

    /// Whether `module_id` contributes a map
    pub fn tracks(&self, module_id: &str) -> bool {
        has_valid_extension(module_id, &self.extensions)
    }

    fn state(&self) -> PluginResult<MutexGuard<'_, TrackerState>> {
        self.state.lock().map_err(|_| {
            PluginError::ExecutionFailed("Association tracker state is poisoned".to_string())
        })
    }

    /// Installs the hash observer on the CSS post plugin and records the
    /// template name of the build
    ///
    /// Fails when the CSS post plugin is not registered: without it no CSS
    /// asset can be linked to its modules.
    pub fn observe(&self, options: &BuildStartOptions<'_>) -> PluginResult<()> {
        let css_post = options.find_plugin(CSS_POST_PLUGIN_NAME).ok_or_else(|| {
            PluginError::DependencyError(format!("{} plugin not found.", CSS_POST_PLUGIN_NAME))
        })?;

        self.state()?.template_name = extract_file_name(options.input);

        let Some(original) = css_post.augment_chunk_hash() else {
            logging::log_hash_hook_absent(css_post.name());
            return Ok(());
        };

        let state = Arc::clone(&self.state);
        let extensions = self.extensions.clone();
        css_post.replace_augment_chunk_hash(Arc::new(move |chunk: &RenderedChunk| {
            let result = original(chunk);

            if let Some(key) = result.as_deref().filter(|key| !key.is_empty()) {
                match state.lock() {
                    Ok(mut state) => {
                        for id in &chunk.module_ids {
                            if has_valid_extension(id, &extensions) {
                                logging::log_association_recorded(key, id);
                                state.associations.record(key, id);
                            }
                        }
                    }
                    Err(_) => logging::log_association_dropped(key, &chunk.name),
                }
            }

            result
        }))?;

        logging::log_hash_hook_wrapped(css_post.name());
        Ok(())
    }

    /// Stores the output configuration and settles the association mode
    pub fn configure_output(&self, options: &OutputOptions) -> PluginResult<AssociationMode> {
        let mode = AssociationMode::from_output_options(options);
        let mut state = self.state()?;
        state.output_options = Some(options.clone());
        state.mode = mode;

        logging::log_association_mode(&format!("{:?}", mode), &state.fallback_key());
        Ok(mode)
    }

    /// Records a rendered chunk's tracked modules under the derived key when
    /// hash augmentation will not run
    pub fn observe_rendered_chunk(&self, chunk: &RenderedChunk) -> PluginResult<()> {
        let mut state = self.state()?;
        if state.mode != AssociationMode::ChunkRender {
            return Ok(());
        }

        let key = state.fallback_key();
        for id in &chunk.module_ids {
            if self.tracks(id) {
                logging::log_association_recorded(&key, id);
                state.associations.record(&key, id);
            }
        }
        Ok(())
    }

    /// Stores the handle of a module's individually emitted map
    pub fn record_individual_map(&self, module_id: &str, handle: ReferenceId) -> PluginResult<()> {
        logging::log_individual_map_recorded(module_id, handle.as_str());
        self.state()?
            .map_handles
            .insert(module_id.to_string(), handle);
        Ok(())
    }

    /// Modules that contributed to the CSS asset at `file_name`
    ///
    /// Looks up the exact file name, then the derived key; empty when neither
    /// was recorded.
    pub fn contributing_modules(&self, file_name: &str) -> PluginResult<Vec<String>> {
        let state = self.state()?;
        let modules = state
            .associations
            .get(file_name)
            .or_else(|| state.associations.get(&state.fallback_key()))
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        Ok(modules)
    }

    pub fn map_handle(&self, module_id: &str) -> PluginResult<Option<ReferenceId>> {
        Ok(self.state()?.map_handles.get(module_id).cloned())
    }

    pub fn mode(&self) -> PluginResult<AssociationMode> {
        Ok(self.state()?.mode)
    }

    /// Snapshot of the association table
    pub fn associations(&self) -> PluginResult<AssociationTable> {
        Ok(self.state()?.associations.clone())
    }
}
