//! Directory-backed storage for the maintained patch series.

use crate::error::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A named unit of source modification expressed as a diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchArtifact {
    name: String,
    content: Vec<u8>,
}

impl PatchArtifact {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        PatchArtifact {
            name: name.into(),
            content,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// An ordered set of patch names backed by files in one directory.
///
/// Contents are loaded lazily; a name with no file behind it is a normal,
/// queryable condition (`Ok(None)`), never an error.
#[derive(Debug, Clone)]
pub struct PatchSet {
    dir: PathBuf,
    names: Vec<String>,
}

impl PatchSet {
    /// A patch set with an explicit, caller-specified order
    pub fn new(dir: impl Into<PathBuf>, names: Vec<String>) -> Self {
        PatchSet {
            dir: dir.into(),
            names,
        }
    }

    /// Scan a directory for `*.patch` / `*.diff` files, ordered by name
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut names = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };

            if name.ends_with(".patch") || name.ends_with(".diff") {
                names.push(name.to_string());
            }
        }

        names.sort();

        Ok(PatchSet {
            dir: dir.to_path_buf(),
            names,
        })
    }

    /// The ordered patch names
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Load one artifact by name; absence is `Ok(None)`
    pub fn load(&self, name: &str) -> Result<Option<PatchArtifact>> {
        match fs::read(self.dir.join(name)) {
            Ok(content) => Ok(Some(PatchArtifact::new(name, content))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
