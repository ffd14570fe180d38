//! Structured logging for the css-sourcemap plugin and the reference pipeline.
//!
//! Every event goes through a helper here so field names stay consistent
//! across hooks. Soft gaps in the association data are logged at `debug`
//! and never change the outcome of a build.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable that switches subscriber output to JSON
pub const JSON_LOG_ENV: &str = "CSS_SOURCEMAP_JSON";

/// Install a global subscriber writing to stderr
///
/// `RUST_LOG` takes precedence over `level`. Returns false when a global
/// subscriber was already installed.
pub fn init_tracing(level: &str) -> bool {
    let fallback_filter = format!("css_sourcemap={}", level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| fallback_filter.into());

    if std::env::var(JSON_LOG_ENV).is_ok() {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .try_init()
            .is_ok()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    }
}

/// Log the hash observer being installed.
pub fn log_hash_hook_wrapped(plugin: &str) {
    tracing::debug!(plugin, "Observing chunk hash augmentation");
}

/// Log a CSS post plugin that exposes no hash augmentation.
pub fn log_hash_hook_absent(plugin: &str) {
    tracing::debug!(plugin, "Plugin has no hash augmentation hook to observe");
}

/// Log the association mode chosen for the output.
pub fn log_association_mode(mode: &str, fallback_key: &str) {
    tracing::debug!(mode, fallback_key, "Association mode selected");
}

pub fn log_association_recorded(key: &str, module_id: &str) {
    tracing::trace!(key, module = module_id, "Module associated with output");
}

/// Log an association lost because the tracker state is poisoned.
pub fn log_association_dropped(key: &str, chunk: &str) {
    tracing::warn!(
        key,
        chunk,
        "Tracker state is poisoned, chunk modules were not associated"
    );
}

pub fn log_individual_map_recorded(module_id: &str, reference: &str) {
    tracing::trace!(module = module_id, reference, "Module source map emitted");
}

/// Log a module that was associated but never emitted a map.
pub fn log_missing_map_handle(module_id: &str) {
    tracing::debug!(module = module_id, "No emitted source map recorded for module");
}

/// Log an emitted map asset that is gone from the bundle.
pub fn log_missing_map_asset(file_name: &str) {
    tracing::debug!(file = file_name, "Module source map asset missing from bundle");
}

/// Log a stylesheet with no associated modules.
pub fn log_no_contributing_modules(css_file: &str) {
    tracing::debug!(
        css = css_file,
        "No contributing modules found, emitting empty source map"
    );
}

/// Log a merged map written next to its stylesheet.
pub fn log_merged_map_emitted(css_file: &str, map_file: &str, modules: usize) {
    tracing::info!(
        css = css_file,
        map = map_file,
        modules,
        "Merged stylesheet source map"
    );
}

/// Log the start of a pipeline build.
pub fn log_build_start(plugins: usize, entries: usize) {
    tracing::info!(plugins, entries, "Starting build");
}

/// Log a completed pipeline build.
pub fn log_build_complete(files: usize) {
    tracing::info!(files, "Build completed");
}

/// Log a chunk being rendered.
pub fn log_chunk_rendered(chunk: &str, modules: usize) {
    tracing::debug!(chunk, modules, "Chunk rendered");
}
