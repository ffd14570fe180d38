use super::naming::{numbered, render_asset_file_name};
use crate::bundle::{OutputAsset, OutputFile};
use crate::plugin::hooks::{EmittedAsset, FileNameTemplate, ReferenceId};
use crate::plugin::{PluginContext, PluginError, PluginResult, TransformContext};
use crate::utils::is_output_relative;
use std::collections::HashMap;

/// An emitted asset whose final name may still be unknown
#[derive(Debug)]
struct PendingAsset {
    reference: ReferenceId,
    name: Option<String>,
    file_name: Option<String>,
    source: String,
}

/// Module currently being transformed
#[derive(Debug)]
struct ActiveModule {
    id: String,
    original_code: String,
    combined_map: Option<String>,
}

/// Context the reference pipeline hands to every hook
///
/// Assets emitted with a `name` are named once the asset file name pattern
/// is known, which is after `output_options`. Assets emitted with an explicit
/// `file_name` keep it.
#[derive(Debug, Default)]
pub struct HostContext {
    asset_file_names: Option<FileNameTemplate>,
    default_asset_file_names: String,
    names_fixed: bool,
    pending: Vec<PendingAsset>,
    file_names: HashMap<ReferenceId, String>,
    taken: HashMap<String, String>,
    active: Option<ActiveModule>,
    next_reference: usize,
}

impl HostContext {
    pub fn new(default_asset_file_names: impl Into<String>) -> Self {
        Self {
            default_asset_file_names: default_asset_file_names.into(),
            ..Self::default()
        }
    }

    /// Starts the transform of one module
    pub fn begin_module(&mut self, id: &str, code: &str) {
        self.active = Some(ActiveModule {
            id: id.to_string(),
            original_code: code.to_string(),
            combined_map: None,
        });
    }

    pub fn end_module(&mut self) {
        self.active = None;
    }

    /// Fixes the asset file name pattern and names every asset emitted so far
    pub fn finalize_asset_names(&mut self, template: Option<FileNameTemplate>) {
        self.asset_file_names = template;
        self.names_fixed = true;

        let mut pending = std::mem::take(&mut self.pending);
        for asset in pending.iter_mut().filter(|asset| asset.file_name.is_none()) {
            let file_name =
                self.assign_file_name(asset.name.as_deref().unwrap_or("asset"), &asset.source);
            self.file_names.insert(asset.reference.clone(), file_name.clone());
            asset.file_name = Some(file_name);
        }
        self.pending = pending;
    }

    /// Picks a unique file name for an asset named `name`
    fn assign_file_name(&mut self, name: &str, source: &str) -> String {
        let pattern = self
            .asset_file_names
            .as_ref()
            .map(|t| t.pattern_for(name))
            .unwrap_or_else(|| self.default_asset_file_names.clone());
        let base = render_asset_file_name(&pattern, name, source);

        let mut candidate = base.clone();
        let mut counter = 2;
        while let Some(existing) = self.taken.get(&candidate) {
            if existing == source {
                return candidate;
            }
            candidate = numbered(&base, counter);
            counter += 1;
        }

        self.taken.insert(candidate.clone(), source.to_string());
        candidate
    }

    /// Drains named assets into bundle files
    ///
    /// Assets still waiting for a name stay pending.
    pub fn take_named_assets(&mut self) -> Vec<OutputFile> {
        let (named, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|asset| asset.file_name.is_some());
        self.pending = waiting;

        named
            .into_iter()
            .filter_map(|asset| {
                asset.file_name.map(|file_name| {
                    OutputFile::Asset(OutputAsset {
                        file_name,
                        name: asset.name,
                        source: asset.source,
                    })
                })
            })
            .collect()
    }
}

impl PluginContext for HostContext {
    fn get_combined_sourcemap(&self) -> PluginResult<String> {
        let active = self.active.as_ref().ok_or_else(|| {
            PluginError::ExecutionFailed(
                "get_combined_sourcemap is only available during transform".to_string(),
            )
        })?;

        if let Some(map) = &active.combined_map {
            return Ok(map.clone());
        }

        Ok(serde_json::json!({
            "version": 3,
            "sources": [active.id],
            "sourcesContent": [active.original_code],
            "names": [],
            "mappings": "",
        })
        .to_string())
    }

    fn emit_file(&mut self, asset: EmittedAsset) -> PluginResult<ReferenceId> {
        if let Some(file_name) = asset
            .file_name
            .as_deref()
            .filter(|file_name| !is_output_relative(file_name))
        {
            return Err(PluginError::Invalid(format!(
                "Emitted file name '{}' must be relative to the output directory without '..' segments",
                file_name
            )));
        }

        let reference = ReferenceId::new(format!("asset-{}", self.next_reference));
        self.next_reference += 1;

        let file_name = match &asset.file_name {
            Some(file_name) => Some(file_name.clone()),
            None if self.names_fixed => Some(
                self.assign_file_name(asset.name.as_deref().unwrap_or("asset"), &asset.source),
            ),
            None => None,
        };

        if let Some(file_name) = &file_name {
            self.file_names.insert(reference.clone(), file_name.clone());
        }

        self.pending.push(PendingAsset {
            reference: reference.clone(),
            name: asset.name,
            file_name,
            source: asset.source,
        });
        Ok(reference)
    }

    fn get_file_name(&self, reference: &ReferenceId) -> PluginResult<String> {
        self.file_names.get(reference).cloned().ok_or_else(|| {
            PluginError::NotFound(format!(
                "File name of '{}' is not known yet or the reference is invalid",
                reference
            ))
        })
    }
}

impl TransformContext for HostContext {
    fn push_map(&mut self, map: String) {
        if let Some(active) = self.active.as_mut() {
            active.combined_map = Some(map);
        }
    }

    fn as_plugin_context(&mut self) -> &mut dyn PluginContext {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::naming::DEFAULT_ASSET_FILE_NAMES;

    #[test]
    fn test_named_assets_wait_for_pattern() {
        let mut ctx = HostContext::new(DEFAULT_ASSET_FILE_NAMES);
        let reference = ctx.emit_file(EmittedAsset::named("style.map", "{}")).unwrap();
        assert!(ctx.get_file_name(&reference).is_err());
        assert!(ctx.take_named_assets().is_empty());

        ctx.finalize_asset_names(Some("maps/[name][extname]".into()));
        assert_eq!(ctx.get_file_name(&reference).unwrap(), "maps/style.map");
        assert_eq!(ctx.take_named_assets().len(), 1);
    }

    #[test]
    fn test_escaping_file_names_rejected() {
        let mut ctx = HostContext::new(DEFAULT_ASSET_FILE_NAMES);

        for file_name in ["../escaped/a.css.map", "/tmp/a.css.map", "assets/../../a.map"] {
            let err = ctx
                .emit_file(EmittedAsset::at_path(file_name, "{}"))
                .unwrap_err();
            assert!(matches!(err, PluginError::Invalid(_)), "{}", file_name);
        }

        assert!(ctx
            .emit_file(EmittedAsset::at_path("assets/maps/a.css.map", "{}"))
            .is_ok());
        assert_eq!(ctx.take_named_assets().len(), 1);
    }
}
