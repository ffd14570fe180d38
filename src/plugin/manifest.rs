/// Build mode a plugin is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Build,
    Serve,
}

/// Position of a plugin relative to user plugins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Enforce {
    Pre,
    #[default]
    Normal,
    Post,
}

/// Manifest describing a plugin and the hooks it engages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginManifest {
    /// Plugin name
    pub name: String,

    /// Restricts the plugin to one build mode; `None` applies everywhere
    pub apply: Option<ApplyMode>,

    /// Ordering bucket
    pub enforce: Enforce,

    /// Hooks the host should dispatch to this plugin
    pub capabilities: HookCapabilities,
}

/// Hooks a plugin implements
///
/// The host dispatches a hook only when its flag is set, so a plugin with no
/// capabilities is inert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookCapabilities {
    pub build_start: bool,
    pub output_options: bool,
    pub transform: bool,
    pub render_chunk: bool,
    pub augment_chunk_hash: bool,
    pub generate_bundle: bool,
}

impl HookCapabilities {
    /// Every hook engaged
    pub fn all() -> Self {
        Self {
            build_start: true,
            output_options: true,
            transform: true,
            render_chunk: true,
            augment_chunk_hash: true,
            generate_bundle: true,
        }
    }

    /// True when no hook is engaged
    pub fn is_inert(&self) -> bool {
        *self == Self::default()
    }
}

impl PluginManifest {
    /// A manifest for a plugin that runs in every mode with default ordering
    pub fn new(name: impl Into<String>, capabilities: HookCapabilities) -> Self {
        Self {
            name: name.into(),
            apply: None,
            enforce: Enforce::Normal,
            capabilities,
        }
    }

    pub fn with_apply(mut self, apply: ApplyMode) -> Self {
        self.apply = Some(apply);
        self
    }

    pub fn with_enforce(mut self, enforce: Enforce) -> Self {
        self.enforce = enforce;
        self
    }

    /// Whether the plugin takes part in a pipeline running in `mode`
    pub fn applies_to(&self, mode: ApplyMode) -> bool {
        self.apply.map_or(true, |apply| apply == mode)
    }

    /// Validate the manifest
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Plugin name cannot be empty".to_string());
        }

        if self.name.chars().any(char::is_whitespace) {
            return Err(format!("Plugin name '{}' contains whitespace", self.name));
        }

        Ok(())
    }
}
