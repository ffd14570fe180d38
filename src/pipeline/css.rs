//! Built-in stylesheet plugins of the reference pipeline.
//!
//! `vite:css` runs before user plugins and gives every stylesheet module a
//! line-identity source map. `vite:css-post` runs after them: it pulls the
//! stylesheet text out of the module graph, emits one CSS asset per chunk at
//! render time and folds the emitted CSS file names into the chunk hash.

use crate::constants::CSS_POST_PLUGIN_NAME;
use crate::plugin::hooks::{AugmentChunkHashFn, EmittedAsset, RenderedChunk, TransformResult};
use crate::plugin::{
    Enforce, HookCapabilities, Plugin, PluginContext, PluginError, PluginManifest, PluginResult,
};
use crate::utils::has_valid_extension;
use sourcemap::SourceMapBuilder;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Name of the built-in stylesheet transform plugin
pub const CSS_PLUGIN_NAME: &str = "vite:css";

/// Module suffixes the pipeline treats as stylesheets
pub const CSS_LANGS: &[&str] = &[".css", ".scss", ".sass", ".less"];

pub fn is_css_request(id: &str) -> bool {
    has_valid_extension(id, CSS_LANGS)
}

/// Maps every line of `code` to the same line of `id`
fn identity_map(id: &str, code: &str) -> PluginResult<String> {
    let mut builder = SourceMapBuilder::new(None);
    let src_id = builder.add_source(id);
    builder.set_source_contents(src_id, Some(code));

    for line in 0..code.lines().count() {
        builder.add_raw(line as u32, 0, line as u32, 0, Some(src_id), None);
    }

    let mut buf = Vec::new();
    builder
        .into_sourcemap()
        .to_writer(&mut buf)
        .map_err(|e| PluginError::ExecutionFailed(format!("Failed to encode map: {}", e)))?;
    String::from_utf8(buf).map_err(|e| PluginError::ExecutionFailed(e.to_string()))
}

/// Pre plugin producing the first source map of each stylesheet
#[derive(Debug, Default)]
pub struct CssPlugin;

impl Plugin for CssPlugin {
    fn metadata(&self) -> PluginManifest {
        PluginManifest::new(
            CSS_PLUGIN_NAME,
            HookCapabilities {
                transform: true,
                ..HookCapabilities::default()
            },
        )
        .with_enforce(Enforce::Pre)
    }

    fn transform(
        &mut self,
        _ctx: &mut dyn PluginContext,
        code: &str,
        id: &str,
    ) -> PluginResult<Option<TransformResult>> {
        if !is_css_request(id) {
            return Ok(None);
        }

        Ok(Some(TransformResult {
            code: code.to_string(),
            map: Some(identity_map(id, code)?),
        }))
    }
}

#[derive(Debug, Default)]
struct CssPostState {
    /// Stylesheet text by module id
    styles: HashMap<String, String>,
    /// CSS asset file names imported by each chunk
    imported_css: HashMap<String, Vec<String>>,
}

/// Post plugin turning stylesheet modules into CSS assets
#[derive(Debug, Default)]
pub struct CssPostPlugin {
    state: Arc<Mutex<CssPostState>>,
}

impl CssPostPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PluginResult<std::sync::MutexGuard<'_, CssPostState>> {
        self.state
            .lock()
            .map_err(|_| PluginError::ExecutionFailed("css-post state is poisoned".to_string()))
    }
}

impl Plugin for CssPostPlugin {
    fn metadata(&self) -> PluginManifest {
        PluginManifest::new(
            CSS_POST_PLUGIN_NAME,
            HookCapabilities {
                transform: true,
                render_chunk: true,
                augment_chunk_hash: true,
                ..HookCapabilities::default()
            },
        )
        .with_enforce(Enforce::Post)
    }

    fn transform(
        &mut self,
        _ctx: &mut dyn PluginContext,
        code: &str,
        id: &str,
    ) -> PluginResult<Option<TransformResult>> {
        if !is_css_request(id) {
            return Ok(None);
        }

        self.lock()?.styles.insert(id.to_string(), code.to_string());

        // Stylesheets leave the JS output entirely
        Ok(Some(TransformResult {
            code: String::new(),
            map: None,
        }))
    }

    fn render_chunk(
        &mut self,
        ctx: &mut dyn PluginContext,
        _code: &str,
        chunk: &RenderedChunk,
    ) -> PluginResult<Option<String>> {
        let chunk_css: Vec<String> = {
            let state = self.lock()?;
            chunk
                .module_ids
                .iter()
                .filter_map(|id| state.styles.get(id).cloned())
                .collect()
        };

        if chunk_css.is_empty() {
            return Ok(None);
        }

        let reference = ctx.emit_file(EmittedAsset::named(
            format!("{}.css", chunk.name),
            chunk_css.join("\n"),
        ))?;
        let file_name = ctx.get_file_name(&reference)?;

        self.lock()?
            .imported_css
            .entry(chunk.name.clone())
            .or_default()
            .push(file_name);

        Ok(None)
    }

    fn augment_chunk_hash_hook(&self) -> Option<AugmentChunkHashFn> {
        let state = Arc::clone(&self.state);
        Some(Arc::new(move |chunk: &RenderedChunk| {
            let state = state.lock().ok()?;
            let imported = state.imported_css.get(&chunk.name)?;
            (!imported.is_empty()).then(|| imported.concat())
        }))
    }
}
