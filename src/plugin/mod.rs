pub mod api;
pub mod hooks;
pub mod manifest;
pub mod registry;

pub use api::{Plugin, PluginContext, PluginError, PluginResult, TransformContext};
pub use hooks::{
    AugmentChunkHashFn, BuildStartOptions, EmittedAsset, FileNameFn, FileNameTemplate,
    InputOption, OutputOptions, ReferenceId, RenderedChunk, TransformResult,
};
pub use manifest::{ApplyMode, Enforce, HookCapabilities, PluginManifest};
pub use registry::{HookTable, PluginEntry, PluginRegistry};
