//! Where texture bytes come from.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::TextureError;

/// Resolves a body name to encoded image bytes. Implementations are called
/// from loader worker threads, so they may block.
pub trait TextureSource: Send + Sync {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, TextureError>;
}

/// Reads `<root>/<name>.<extension>` from disk.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extension: String,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P, extension: &str) -> Self {
        DirectorySource {
            root: root.as_ref().to_path_buf(),
            extension: extension.trim_start_matches('.').to_owned(),
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, self.extension))
    }
}

impl TextureSource for DirectorySource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, TextureError> {
        let path = self.path_for(name);
        fs::read(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => TextureError::NotFound {
                name: name.to_owned(),
                path: path.display().to_string(),
            },
            _ => TextureError::Io {
                name: name.to_owned(),
                source,
            },
        })
    }
}

/// Bytes bundled into the program, keyed by body name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    images: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, name: &str, bytes: Vec<u8>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: &str, bytes: Vec<u8>) {
        self.images.insert(name.to_owned(), bytes);
    }
}

impl TextureSource for MemorySource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, TextureError> {
        self.images
            .get(name)
            .cloned()
            .ok_or_else(|| TextureError::NotFound {
                name: name.to_owned(),
                path: format!("<memory>/{}", name),
            })
    }
}
