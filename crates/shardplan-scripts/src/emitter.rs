//! Script file emission.
//!
//! All generated scripts live under `<deployment_dir>/bin`. Aggregate
//! scripts sit directly in `bin/`; per-instance scripts sit in a per-host
//! subdirectory `bin/<host>/` so they can be shipped to (or mounted on)
//! the host that runs them. Every emitted file is executable.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use shardplan_commons::Result;

/// One rendered script, addressed relative to the `bin` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    pub rel_path: PathBuf,
    pub content: String,
}

impl ScriptFile {
    pub fn new(rel_path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            rel_path: rel_path.into(),
            content: content.into(),
        }
    }

    /// A script placed in a host's subdirectory.
    pub fn for_host(host: &str, name: impl AsRef<Path>, content: impl Into<String>) -> Self {
        Self::new(PathBuf::from(host).join(name.as_ref()), content)
    }
}

/// Writes rendered scripts as executable files.
#[derive(Debug, Clone)]
pub struct ScriptEmitter {
    bin_dir: PathBuf,
}

impl ScriptEmitter {
    pub fn new<P: AsRef<Path>>(deployment_dir: P) -> Self {
        Self {
            bin_dir: deployment_dir.as_ref().join("bin"),
        }
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Writes one script, creating directories as needed, and returns the
    /// absolute path of the written file.
    pub fn write(&self, script: &ScriptFile) -> Result<PathBuf> {
        let path = self.bin_dir.join(&script.rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &script.content)?;
        make_executable(&path)?;
        Ok(path)
    }

    /// Writes a whole set of scripts, returning the written paths in
    /// input order.
    pub fn write_all(&self, scripts: &[ScriptFile]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(scripts.len());
        for script in scripts {
            written.push(self.write(script)?);
        }
        info!(count = written.len(), dir = %self.bin_dir.display(), "emitted scripts");
        Ok(written)
    }

    /// Absolute path a relative script name resolves to, without writing.
    pub fn resolve(&self, rel_path: impl AsRef<Path>) -> PathBuf {
        self.bin_dir.join(rel_path.as_ref())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
