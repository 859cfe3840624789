//! `kpitree init` — create the `kpitree/` control directory.

use std::fs;
use std::path::Path;

use anyhow::{Result, bail};
use crossterm::style::Stylize;

use super::open_workspace;
use crate::parser::config;
use crate::project;

pub fn run() -> Result<()> {
    let root = std::env::current_dir()?;
    run_in(&root)
}

pub fn run_in(root: &Path) -> Result<()> {
    let config_path = project::config_path(root);
    if config_path.exists() {
        bail!("kpitree is already initialised (kpitree/config.kpi exists)");
    }

    fs::create_dir_all(project::store_dir(root))?;
    config::save(root, &config::Config::default())?;
    println!("  {} kpitree/config.kpi", "Created".green().bold());

    let (_, mut ws) = open_workspace(root)?;
    ws.persist()?;
    println!(
        "  {} kpitree/store/ with {} preset tabs",
        "Created".green().bold(),
        ws.tabs().len().to_string().green()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::tabs::WORKSPACE_KEY;
    use crate::workspace::{BlobStore, FileBlobStore};
    use tempfile::TempDir;

    #[test]
    fn creates_control_directory_and_config() {
        let dir = TempDir::new().unwrap();
        run_in(dir.path()).unwrap();
        let content = fs::read_to_string(dir.path().join("kpitree/config.kpi")).unwrap();
        assert!(content.starts_with("# kpitree configuration"));
        assert!(content.contains("default_preset: financial"));
        assert!(dir.path().join("kpitree/store").is_dir());
    }

    #[test]
    fn writes_initial_workspace() {
        let dir = TempDir::new().unwrap();
        run_in(dir.path()).unwrap();
        let blobs = FileBlobStore::new(project::store_dir(dir.path()));
        let stored = blobs.get(WORKSPACE_KEY).unwrap().unwrap();
        assert!(stored.contains("preset-financial"));
    }

    #[test]
    fn error_if_already_initialised() {
        let dir = TempDir::new().unwrap();
        run_in(dir.path()).unwrap();
        assert!(run_in(dir.path()).is_err());
    }
}
