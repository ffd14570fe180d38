//! In-memory build output handed to `generate_bundle` hooks.

use crate::utils::is_output_relative;
use crate::{CssSourcemapError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A non-code output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputAsset {
    pub file_name: String,
    /// Name the asset was emitted under, before file name templating
    pub name: Option<String>,
    pub source: String,
}

/// A rendered code chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub file_name: String,
    pub name: String,
    pub code: String,
    pub module_ids: Vec<String>,
    pub is_entry: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFile {
    Asset(OutputAsset),
    Chunk(OutputChunk),
}

impl OutputFile {
    pub fn file_name(&self) -> &str {
        match self {
            OutputFile::Asset(asset) => &asset.file_name,
            OutputFile::Chunk(chunk) => &chunk.file_name,
        }
    }

    /// Text written to disk for this file
    pub fn contents(&self) -> &str {
        match self {
            OutputFile::Asset(asset) => &asset.source,
            OutputFile::Chunk(chunk) => &chunk.code,
        }
    }

    pub fn as_asset(&self) -> Option<&OutputAsset> {
        match self {
            OutputFile::Asset(asset) => Some(asset),
            OutputFile::Chunk(_) => None,
        }
    }

    pub fn as_asset_mut(&mut self) -> Option<&mut OutputAsset> {
        match self {
            OutputFile::Asset(asset) => Some(asset),
            OutputFile::Chunk(_) => None,
        }
    }
}

/// Output files keyed by file name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBundle {
    files: BTreeMap<String, OutputFile>,
}

impl OutputBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `file` under its file name, returning any file it replaced
    pub fn insert(&mut self, file: OutputFile) -> Option<OutputFile> {
        self.files.insert(file.file_name().to_string(), file)
    }

    pub fn insert_asset(&mut self, file_name: impl Into<String>, source: impl Into<String>) {
        let file_name = file_name.into();
        self.insert(OutputFile::Asset(OutputAsset {
            file_name,
            name: None,
            source: source.into(),
        }));
    }

    pub fn get(&self, file_name: &str) -> Option<&OutputFile> {
        self.files.get(file_name)
    }

    pub fn get_mut(&mut self, file_name: &str) -> Option<&mut OutputFile> {
        self.files.get_mut(file_name)
    }

    pub fn remove(&mut self, file_name: &str) -> Option<OutputFile> {
        self.files.remove(file_name)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.files.contains_key(file_name)
    }

    /// Source of the asset at `file_name`, if that file is an asset
    pub fn asset_source(&self, file_name: &str) -> Option<&str> {
        self.get(file_name)
            .and_then(OutputFile::as_asset)
            .map(|asset| asset.source.as_str())
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OutputFile)> {
        self.files.iter()
    }

    pub fn assets(&self) -> impl Iterator<Item = &OutputAsset> {
        self.files.values().filter_map(OutputFile::as_asset)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every file below `dir`, creating directories as needed
    ///
    /// Fails before writing anything when a file name would land outside
    /// `dir`.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if let Some(file_name) = self.files.keys().find(|name| !is_output_relative(name)) {
            return Err(CssSourcemapError::FileError(format!(
                "Refusing to write {:?} outside of {:?}",
                file_name, dir
            ))
            .into());
        }

        let mut written = Vec::with_capacity(self.files.len());
        for (file_name, file) in &self.files {
            let path = dir.join(file_name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    CssSourcemapError::FileError(format!(
                        "Failed to create output directory {:?}: {}",
                        parent, e
                    ))
                })?;
            }

            fs::write(&path, file.contents()).map_err(|e| {
                CssSourcemapError::FileError(format!("Failed to write {:?}: {}", path, e))
            })?;
            written.push(path);
        }

        Ok(written)
    }
}
