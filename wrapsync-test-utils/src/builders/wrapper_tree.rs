//! Builder for wrapper trees used as test fixtures

use std::fs;
use std::path::{Path, PathBuf};
use wrapsync_core::FileEntry;

/// Builder for a wrapper directory, usable in memory or on disk
#[derive(Debug, Clone, Default)]
pub struct WrapperTreeBuilder {
    files: Vec<(String, Vec<u8>)>,
}

impl WrapperTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at a `/`-separated relative path
    pub fn file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.files.push((path.to_string(), content.into()));
        self
    }

    /// Typical wrapper layout: manifest, schema and a nested module
    pub fn sample() -> Self {
        Self::new()
            .file("wrap.info", "{\"name\":\"sample\"}")
            .file("wrap.wasm", [0u8, 97, 115, 109])
            .file("src/schema.graphql", "type Module { ping: String! }")
    }

    /// File entries in insertion order
    pub fn entries(&self) -> Vec<FileEntry> {
        self.files
            .iter()
            .map(|(path, content)| FileEntry::new(path.as_str(), content.clone()))
            .collect()
    }

    /// Write the tree below `root`, returning the paths written
    pub fn write_to(&self, root: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.files.len());
        for (path, content) in &self.files {
            let destination = root.join(path);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&destination, content)?;
            written.push(destination);
        }
        Ok(written)
    }
}
