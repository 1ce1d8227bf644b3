use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::types::{NetworkCatalog, NetworkName};

/// Writes run artifacts to the output directory. Every artifact goes
/// through a temp file and an atomic rename so a crashed run never leaves a
/// truncated file behind; completed artifacts from an aborted run stay
/// as-is.
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write_catalog(
        &self,
        network: NetworkName,
        catalog: &NetworkCatalog,
    ) -> anyhow::Result<()> {
        self.write_global(&format!("{network}.json"), catalog)
    }

    pub fn write_global<T: Serialize>(&self, name: &str, data: &T) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(name);
        let temp = self.dir.join(format!(".{name}.tmp"));
        fs::write(&temp, serde_json::to_vec(data)?)?;
        fs::rename(&temp, &target)?;
        info!("wrote {}", target.display());
        Ok(())
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
