//! Paths inside the `kpitree/` control directory.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

pub const CONTROL_DIR: &str = "kpitree";

/// Walk upward from `start` to find the directory containing `kpitree/`.
pub fn find_root_from(start: &Path) -> Result<PathBuf> {
    let mut dir = start;
    loop {
        if dir.join(CONTROL_DIR).is_dir() {
            return Ok(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => bail!("no kpitree workspace found; run `kpitree init` to create one here"),
        }
    }
}

/// Walk upward from the current working directory.
pub fn find_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    find_root_from(&cwd)
}

pub fn control_dir(root: &Path) -> PathBuf {
    root.join(CONTROL_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONTROL_DIR).join("config.kpi")
}

pub fn store_dir(root: &Path) -> PathBuf {
    root.join(CONTROL_DIR).join("store")
}
