//! CLI subcommands. Each `run` resolves the project root and delegates to a
//! `run_in` that tests can call against a temporary directory.

pub mod init;
pub mod links;
pub mod nodes;
pub mod show;
pub mod tabs;
pub mod transfer;

use std::path::Path;

use anyhow::{Result, bail};
use crossterm::style::Stylize;

use crate::parser::config::{self, Config};
use crate::project;
use crate::workspace::{FileBlobStore, TabManager};

pub type Workspace = TabManager<FileBlobStore>;

/// Load the config and restore the persisted workspace under `root`.
pub fn open_workspace(root: &Path) -> Result<(Config, Workspace)> {
    let cfg = config::load(root)?;
    let blobs = FileBlobStore::new(project::store_dir(root));
    let ws = TabManager::restore(blobs, cfg.workspace_settings());
    Ok((cfg, ws))
}

/// Fail unless the active tab holds `id`.
fn require_node(ws: &Workspace, id: &str) -> Result<()> {
    if ws.active_tab().store().find_node_by_id(id).is_none() {
        bail!("node '{}' not found in tab '{}'", id, ws.active_tab().name);
    }
    Ok(())
}

/// Preset data is rebuilt on every load, so edits there do not survive.
fn note_if_preset(ws: &Workspace) {
    let tab = ws.active_tab();
    if tab.is_preset() {
        println!(
            "  {} '{}' is a preset tab; its data resets on the next run. Use `kpitree tab duplicate` to keep changes.",
            "Note".yellow().bold(),
            tab.name
        );
    }
}
