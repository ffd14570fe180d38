//! A minimal in-memory host pipeline.
//!
//! Drives registered plugins through the phases of one build in a fixed
//! order: build start, module transforms, output options, chunk rendering,
//! hash augmentation for content-hashed chunks, and bundle generation. Each
//! entry becomes one chunk holding its transitive imports, dependencies
//! first.

pub mod context;
pub mod css;
pub mod naming;

pub use context::HostContext;
pub use css::{CssPlugin, CssPostPlugin};

use crate::bundle::{OutputBundle, OutputChunk, OutputFile};
use crate::constants::HASH_TOKEN;
use crate::logging;
use crate::plugin::hooks::{InputOption, OutputOptions, RenderedChunk};
use crate::plugin::{ApplyMode, Plugin, PluginRegistry};
use crate::{CssSourcemapError, Result};
use itertools::Itertools;
use naming::{
    pattern_or_default, render_chunk_file_name, DEFAULT_ASSET_FILE_NAMES,
    DEFAULT_ENTRY_FILE_NAMES,
};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A source file known to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceModule {
    pub id: String,
    pub code: String,
    /// Ids of statically imported modules, in import order
    pub imports: Vec<String>,
}

/// Every module a build can reach
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: BTreeMap<String, SourceModule>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module with its imports
    pub fn module<I, S>(mut self, id: &str, code: &str, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(SourceModule {
            id: id.to_string(),
            code: code.to_string(),
            imports: imports.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn insert(&mut self, module: SourceModule) {
        self.modules.insert(module.id.clone(), module);
    }

    pub fn get(&self, id: &str) -> Option<&SourceModule> {
        self.modules.get(id)
    }

    /// Modules reachable from `entry`, each after the modules it imports
    pub fn execution_order(&self, entry: &str) -> Result<Vec<String>> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        self.visit(entry, &mut visited, &mut order)?;
        Ok(order)
    }

    fn visit(&self, id: &str, visited: &mut HashSet<String>, order: &mut Vec<String>) -> Result<()> {
        if !visited.insert(id.to_string()) {
            return Ok(());
        }

        let module = self.get(id).ok_or_else(|| {
            CssSourcemapError::InvalidInput(format!("Module '{}' is not in the module graph", id))
        })?;

        for import in &module.imports {
            self.visit(import, visited, order)?;
        }
        order.push(id.to_string());
        Ok(())
    }
}

/// One build of a module graph through a set of plugins
pub struct Pipeline {
    registry: PluginRegistry,
    graph: ModuleGraph,
    input: InputOption,
    output: OutputOptions,
}

impl Pipeline {
    /// A build pipeline with the built-in stylesheet plugins registered
    pub fn new(graph: ModuleGraph, input: InputOption) -> Result<Self> {
        Self::without_builtins(graph, input)
            .plugin(CssPlugin)?
            .plugin(CssPostPlugin::new())
    }

    /// A build pipeline with no plugins at all
    pub fn without_builtins(graph: ModuleGraph, input: InputOption) -> Self {
        Self {
            registry: PluginRegistry::new(ApplyMode::Build),
            graph,
            input,
            output: OutputOptions::default(),
        }
    }

    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Result<Self> {
        let name = plugin.metadata().name;
        self.registry
            .register(Box::new(plugin))
            .map_err(|e| CssSourcemapError::PluginFailed {
                plugin: name,
                message: e.to_string(),
            })?;
        Ok(self)
    }

    pub fn output(mut self, output: OutputOptions) -> Self {
        self.output = output;
        self
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Runs every phase and returns the generated bundle
    pub fn build(self) -> Result<OutputBundle> {
        let Pipeline {
            registry,
            graph,
            input,
            output,
        } = self;

        let entries = input.entries();
        if entries.is_empty() {
            return Err(
                CssSourcemapError::InvalidInput("No entry modules configured".into()).into(),
            );
        }
        logging::log_build_start(registry.plugin_count(), entries.len());

        let mut ctx = HostContext::new(DEFAULT_ASSET_FILE_NAMES);
        registry.dispatch_build_start(&mut ctx, &input)?;

        let mut chunk_modules = Vec::with_capacity(entries.len());
        for (name, entry) in entries {
            let order = graph.execution_order(&entry)?;
            chunk_modules.push((name, entry, order));
        }

        let mut transformed: HashMap<String, String> = HashMap::new();
        for id in chunk_modules
            .iter()
            .flat_map(|(_, _, order)| order.iter())
            .unique()
        {
            let module = graph.get(id).ok_or_else(|| {
                CssSourcemapError::InvalidInput(format!("Module '{}' is not in the module graph", id))
            })?;

            ctx.begin_module(id, &module.code);
            let code = registry.dispatch_transform(&mut ctx, module.code.clone(), id)?;
            ctx.end_module();
            transformed.insert(id.clone(), code);
        }

        let output = registry.dispatch_output_options(output)?;
        ctx.finalize_asset_names(output.asset_file_names.clone());

        let mut rendered = Vec::with_capacity(chunk_modules.len());
        for (name, entry, order) in chunk_modules {
            let code = order
                .iter()
                .filter_map(|id| transformed.get(id))
                .filter(|code| !code.is_empty())
                .join("\n");

            let chunk = RenderedChunk {
                name,
                facade_module_id: Some(entry),
                module_ids: order,
                is_entry: true,
            };

            let code = registry.dispatch_render_chunk(&mut ctx, code, &chunk)?;
            logging::log_chunk_rendered(&chunk.name, chunk.module_ids.len());
            rendered.push((chunk, code));
        }

        let mut bundle = OutputBundle::new();
        for (chunk, code) in rendered {
            let pattern = pattern_or_default(
                output.entry_file_names.as_ref(),
                &chunk.name,
                DEFAULT_ENTRY_FILE_NAMES,
            );
            let augmented = if pattern.contains(HASH_TOKEN) {
                registry.dispatch_augment_chunk_hash(&chunk)
            } else {
                String::new()
            };

            let file_name = render_chunk_file_name(&pattern, &chunk.name, &[&code, &augmented]);
            bundle.insert(OutputFile::Chunk(OutputChunk {
                file_name,
                name: chunk.name,
                code,
                module_ids: chunk.module_ids,
                is_entry: chunk.is_entry,
            }));
        }

        for file in ctx.take_named_assets() {
            bundle.insert(file);
        }

        registry.dispatch_generate_bundle(&mut ctx, &output, &mut bundle)?;
        for file in ctx.take_named_assets() {
            bundle.insert(file);
        }

        logging::log_build_complete(bundle.len());
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> ModuleGraph {
        ModuleGraph::new()
            .module("src/main.ts", "import './style.css'", ["src/style.css", "src/util.ts"])
            .module("src/util.ts", "export {}", ["src/style.css"])
            .module("src/style.css", "body { margin: 0; }", Vec::<String>::new())
    }

    #[test]
    fn test_execution_order_is_dependencies_first() {
        assert_eq!(
            graph().execution_order("src/main.ts").unwrap(),
            vec!["src/style.css", "src/util.ts", "src/main.ts"]
        );
    }

    #[test]
    fn test_missing_import_is_rejected() {
        let graph = ModuleGraph::new().module("src/main.ts", "", ["src/missing.css"]);
        assert!(graph.execution_order("src/main.ts").is_err());
    }

    #[test]
    fn test_builtins_emit_css_asset() {
        let bundle = Pipeline::new(graph(), InputOption::from("src/main.ts"))
            .unwrap()
            .build()
            .unwrap();

        let css: Vec<_> = bundle
            .assets()
            .filter(|asset| asset.file_name.ends_with(".css"))
            .collect();
        assert_eq!(css.len(), 1);
        assert!(css[0].file_name.starts_with("assets/main-"));
        assert_eq!(css[0].source, "body { margin: 0; }");

        let chunk = bundle
            .iter()
            .find_map(|(_, file)| match file {
                OutputFile::Chunk(chunk) => Some(chunk),
                OutputFile::Asset(_) => None,
            })
            .unwrap();
        assert!(!chunk.code.contains("margin"));
    }

    #[test]
    fn test_no_entries_is_an_error() {
        let result = Pipeline::without_builtins(graph(), InputOption::List(vec![])).build();
        assert!(result.is_err());
    }
}
