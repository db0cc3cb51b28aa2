//! Durable storage for generated report files.
//!
//! Files live under `<root>/reports/` and are addressed by a name relative
//! to the root (`reports/roster_1a2b3c4d.csv`). Every save gets a fresh
//! suffix, so two identical requests never overwrite each other.

use std::fs;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::error::{Entity, ReportError, ReportResult};

const REPORTS_DIR: &str = "reports";

/// A saved artifact: its name relative to the media root and its public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    base_url: String,
}

impl ArtifactStore {
    /// `base_url` is the prefix media is served under, e.g. `/media`.
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `content` under a unique name derived from `filename`.
    pub fn save(&self, filename: &str, content: &[u8]) -> ReportResult<StoredArtifact> {
        let dir = self.root.join(REPORTS_DIR);
        fs::create_dir_all(&dir)?;

        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (filename, None),
        };
        let suffix = Uuid::new_v4().simple().to_string();
        let unique = match ext {
            Some(ext) => format!("{}_{}.{}", stem, &suffix[..8], ext),
            None => format!("{}_{}", stem, &suffix[..8]),
        };

        fs::write(dir.join(&unique), content)?;

        let name = format!("{REPORTS_DIR}/{unique}");
        tracing::debug!(%name, bytes = content.len(), "saved artifact");
        Ok(StoredArtifact {
            url: self.url_for(&name),
            name,
        })
    }

    pub fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    /// Read an artifact back. Names that escape the root are not found.
    pub fn open(&self, name: &str) -> ReportResult<Vec<u8>> {
        let path = self.resolve(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ReportError::not_found(Entity::Artifact, name))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an artifact, typically one whose log record failed to commit.
    pub fn remove(&self, name: &str) -> ReportResult<()> {
        let path = self.resolve(name)?;
        fs::remove_file(path)?;
        tracing::debug!(%name, "removed artifact");
        Ok(())
    }

    fn resolve(&self, name: &str) -> ReportResult<PathBuf> {
        let relative = Path::new(name);
        let safe = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(ReportError::not_found(Entity::Artifact, name));
        }
        Ok(self.root.join(relative))
    }
}
