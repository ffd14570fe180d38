//! The css-sourcemap plugin.
//!
//! Each tracked stylesheet module emits its own map during `transform`. At
//! `generate_bundle` those maps are folded into one map per CSS asset, the
//! individual maps are dropped from the bundle and the stylesheet gets a
//! trailing `sourceMappingURL` comment.

use crate::bundle::{OutputBundle, OutputFile};
use crate::constants::{CSS_ASSET_SUFFIX, PLUGIN_NAME};
use crate::logging;
use crate::merge::{merge_source_map, MergedMap};
use crate::options::CssSourcemapOptions;
use crate::plugin::hooks::{
    BuildStartOptions, EmittedAsset, OutputOptions, RenderedChunk, TransformResult,
};
use crate::plugin::{
    ApplyMode, HookCapabilities, Plugin, PluginContext, PluginError, PluginManifest,
    PluginResult,
};
use crate::tracker::AssociationTracker;
use crate::utils::{basename, dirname, file_stem, join};

/// Creates a plugin instance with fresh association state
pub fn css_sourcemap(options: CssSourcemapOptions) -> CssSourcemapPlugin {
    CssSourcemapPlugin::new(options)
}

pub struct CssSourcemapPlugin {
    options: CssSourcemapOptions,
    /// `None` when the plugin is disabled
    tracker: Option<AssociationTracker>,
}

impl CssSourcemapPlugin {
    pub fn new(options: CssSourcemapOptions) -> Self {
        let tracker = options
            .enabled
            .then(|| AssociationTracker::new(options.extensions.clone()));
        Self { options, tracker }
    }

    pub fn options(&self) -> &CssSourcemapOptions {
        &self.options
    }

    /// Association state, absent for a disabled plugin
    pub fn tracker(&self) -> Option<&AssociationTracker> {
        self.tracker.as_ref()
    }

    fn emit_merged_map(
        &self,
        tracker: &AssociationTracker,
        ctx: &mut dyn PluginContext,
        bundle: &mut OutputBundle,
        css_file: &str,
    ) -> PluginResult<()> {
        let modules = tracker.contributing_modules(css_file)?;
        if modules.is_empty() {
            logging::log_no_contributing_modules(css_file);
        }

        let mut merged = MergedMap::Empty;
        for module_id in &modules {
            let Some(handle) = tracker.map_handle(module_id)? else {
                logging::log_missing_map_handle(module_id);
                continue;
            };

            let map_file = ctx.get_file_name(&handle)?;
            let source = match bundle.remove(&map_file) {
                Some(OutputFile::Asset(asset)) => Some(asset.source),
                _ => {
                    logging::log_missing_map_asset(&map_file);
                    None
                }
            };

            merged = merge_source_map(merged, source.as_deref())
                .map_err(|e| PluginError::ExecutionFailed(e.to_string()))?;
        }

        let map_name = format!("{}.map", basename(css_file));
        let folder = self.options.folder.as_str();
        let map_path = join(&[dirname(css_file), folder, map_name.as_str()]);
        let map_source = merged
            .to_source_text()
            .map_err(|e| PluginError::ExecutionFailed(e.to_string()))?;

        ctx.emit_file(EmittedAsset::at_path(map_path.as_str(), map_source))?;

        if let Some(asset) = bundle.get_mut(css_file).and_then(OutputFile::as_asset_mut) {
            asset.source.push_str(&format!(
                "\n/*# sourceMappingURL={} */",
                self.options.format_url(&map_name)
            ));
        }

        logging::log_merged_map_emitted(css_file, &map_path, modules.len());
        Ok(())
    }
}

impl Plugin for CssSourcemapPlugin {
    fn metadata(&self) -> PluginManifest {
        let capabilities = if self.tracker.is_some() {
            HookCapabilities {
                build_start: true,
                output_options: true,
                transform: true,
                render_chunk: true,
                augment_chunk_hash: false,
                generate_bundle: true,
            }
        } else {
            HookCapabilities::default()
        };

        PluginManifest::new(PLUGIN_NAME, capabilities).with_apply(ApplyMode::Build)
    }

    fn build_start(
        &mut self,
        _ctx: &mut dyn PluginContext,
        options: &BuildStartOptions<'_>,
    ) -> PluginResult<()> {
        match &self.tracker {
            Some(tracker) => tracker.observe(options),
            None => Ok(()),
        }
    }

    fn output_options(&mut self, options: OutputOptions) -> PluginResult<OutputOptions> {
        if let Some(tracker) = &self.tracker {
            tracker.configure_output(&options)?;
        }
        Ok(options)
    }

    fn transform(
        &mut self,
        ctx: &mut dyn PluginContext,
        code: &str,
        id: &str,
    ) -> PluginResult<Option<TransformResult>> {
        let Some(tracker) = &self.tracker else {
            return Ok(None);
        };
        if !tracker.tracks(id) {
            return Ok(None);
        }

        let stem = file_stem(id).replacen(".module", "", 1);
        let combined = ctx.get_combined_sourcemap()?;
        let reference =
            ctx.emit_file(EmittedAsset::named(format!("{}.map", stem), combined.clone()))?;
        tracker.record_individual_map(id, reference)?;

        Ok(Some(TransformResult {
            code: code.to_string(),
            map: Some(combined),
        }))
    }

    fn render_chunk(
        &mut self,
        _ctx: &mut dyn PluginContext,
        _code: &str,
        chunk: &RenderedChunk,
    ) -> PluginResult<Option<String>> {
        if let Some(tracker) = &self.tracker {
            tracker.observe_rendered_chunk(chunk)?;
        }
        Ok(None)
    }

    fn generate_bundle(
        &mut self,
        ctx: &mut dyn PluginContext,
        _options: &OutputOptions,
        bundle: &mut OutputBundle,
    ) -> PluginResult<()> {
        let Some(tracker) = &self.tracker else {
            return Ok(());
        };

        let css_files: Vec<String> = bundle
            .assets()
            .filter(|asset| asset.file_name.ends_with(CSS_ASSET_SUFFIX))
            .map(|asset| asset.file_name.clone())
            .collect();

        for css_file in css_files {
            self.emit_merged_map(tracker, ctx, bundle, &css_file)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::ReferenceId;
    use std::collections::HashMap;

    /// Context that names emitted assets after their `name`
    #[derive(Default)]
    struct RecordingContext {
        combined: String,
        emitted: Vec<EmittedAsset>,
        names: HashMap<ReferenceId, String>,
    }

    impl PluginContext for RecordingContext {
        fn get_combined_sourcemap(&self) -> PluginResult<String> {
            Ok(self.combined.clone())
        }

        fn emit_file(&mut self, asset: EmittedAsset) -> PluginResult<ReferenceId> {
            let reference = ReferenceId::new(format!("ref-{}", self.emitted.len()));
            let file_name = asset
                .file_name
                .clone()
                .or_else(|| asset.name.as_ref().map(|n| format!("assets/{}", n)))
                .unwrap_or_default();
            self.names.insert(reference.clone(), file_name);
            self.emitted.push(asset);
            Ok(reference)
        }

        fn get_file_name(&self, reference: &ReferenceId) -> PluginResult<String> {
            self.names
                .get(reference)
                .cloned()
                .ok_or_else(|| PluginError::NotFound(reference.to_string()))
        }
    }

    #[test]
    fn test_transform_strips_module_infix() {
        let mut plugin = css_sourcemap(CssSourcemapOptions::default());
        let mut ctx = RecordingContext {
            combined: "{}".into(),
            ..RecordingContext::default()
        };

        let result = plugin
            .transform(&mut ctx, ".a{}", "/src/card.module.scss")
            .unwrap()
            .unwrap();

        assert_eq!(result.code, ".a{}");
        assert_eq!(result.map.as_deref(), Some("{}"));
        assert_eq!(ctx.emitted[0].name.as_deref(), Some("card.map"));
        assert!(plugin
            .tracker()
            .unwrap()
            .map_handle("/src/card.module.scss")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_transform_skips_untracked_modules() {
        let mut plugin = css_sourcemap(CssSourcemapOptions::default());
        let mut ctx = RecordingContext::default();

        assert!(plugin
            .transform(&mut ctx, "a{}", "/src/theme.less")
            .unwrap()
            .is_none());
        assert!(ctx.emitted.is_empty());
    }

    #[test]
    fn test_disabled_plugin_is_inert() {
        let mut plugin = css_sourcemap(CssSourcemapOptions::default().enabled(false));
        let manifest = plugin.metadata();

        assert_eq!(manifest.name, PLUGIN_NAME);
        assert_eq!(manifest.apply, Some(ApplyMode::Build));
        assert!(manifest.capabilities.is_inert());
        assert!(plugin.tracker().is_none());

        let mut ctx = RecordingContext::default();
        assert!(plugin
            .transform(&mut ctx, "a{}", "/src/a.css")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_css_asset_without_modules_still_linked() {
        let mut plugin = css_sourcemap(CssSourcemapOptions::default().folder("custom-sourcemaps"));
        let mut ctx = RecordingContext::default();
        let mut bundle = OutputBundle::new();
        bundle.insert_asset("styles.css", "body { color: red; }");

        plugin
            .generate_bundle(&mut ctx, &OutputOptions::default(), &mut bundle)
            .unwrap();

        assert_eq!(ctx.emitted.len(), 1);
        assert_eq!(
            ctx.emitted[0].file_name.as_deref(),
            Some("custom-sourcemaps/styles.css.map")
        );
        assert_eq!(ctx.emitted[0].source, "null");
        assert_eq!(
            bundle.asset_source("styles.css"),
            Some("body { color: red; }\n/*# sourceMappingURL=styles.css.map */")
        );
    }
}
