//! `kpitree tabs` and `kpitree tab ...` — list and manage workspace tabs.

use std::path::Path;

use anyhow::{Result, anyhow};
use crossterm::style::Stylize;

use super::{Workspace, open_workspace};
use crate::project;
use crate::workspace::TabKind;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

pub fn run_list() -> Result<()> {
    list_in(&project::find_root()?)
}

pub fn run_new(name: &str) -> Result<()> {
    new_in(&project::find_root()?, name)
}

pub fn run_switch(tab: &str) -> Result<()> {
    switch_in(&project::find_root()?, tab)
}

pub fn run_rename(tab: &str, name: &str) -> Result<()> {
    rename_in(&project::find_root()?, tab, name)
}

pub fn run_close(tab: &str) -> Result<()> {
    close_in(&project::find_root()?, tab)
}

pub fn run_duplicate(tab: &str) -> Result<()> {
    duplicate_in(&project::find_root()?, tab)
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

pub fn list_in(root: &Path) -> Result<()> {
    let (_, ws) = open_workspace(root)?;
    for line in tab_lines(&ws) {
        println!("{}", line);
    }
    Ok(())
}

pub fn new_in(root: &Path, name: &str) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    let id = ws.create_tab(name)?;
    println!("  {} tab '{}' ({})", "Opened".green().bold(), ws.active_tab().name, id.dark_grey());
    Ok(())
}

pub fn switch_in(root: &Path, tab: &str) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    let id = resolve_tab(&ws, tab)?;
    ws.switch_tab(&id)?;
    println!("  {} '{}'", "Active".green().bold(), ws.active_tab().name);
    Ok(())
}

pub fn rename_in(root: &Path, tab: &str, name: &str) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    let id = resolve_tab(&ws, tab)?;
    ws.rename_tab(&id, name)?;
    println!("  {} {}", "Renamed".green().bold(), id.dark_grey());
    Ok(())
}

pub fn close_in(root: &Path, tab: &str) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    let id = resolve_tab(&ws, tab)?;
    ws.close_tab(&id)?;
    println!(
        "  {} {}; active tab is now '{}'",
        "Closed".green().bold(),
        id.dark_grey(),
        ws.active_tab().name
    );
    Ok(())
}

pub fn duplicate_in(root: &Path, tab: &str) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    let id = resolve_tab(&ws, tab)?;
    let copy = ws.duplicate_tab(&id)?;
    println!(
        "  {} '{}' ({})",
        "Duplicated".green().bold(),
        ws.active_tab().name,
        copy.dark_grey()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Accept a tab id or an exact tab name.
pub(crate) fn resolve_tab(ws: &Workspace, key: &str) -> Result<String> {
    ws.find_tab(key)
        .map(|t| t.id.clone())
        .ok_or_else(|| anyhow!("no tab named or with id '{}'", key))
}

fn tab_lines(ws: &Workspace) -> Vec<String> {
    let active = ws.active_tab().id.as_str();
    ws.tabs()
        .iter()
        .map(|t| {
            let marker = if t.id == active { "*" } else { " " };
            let kind = match t.kind {
                TabKind::Preset { preset } => format!("preset:{preset}"),
                TabKind::Custom => "custom".to_string(),
            };
            format!(
                "{} {}  {}  [{}, {} nodes]",
                marker,
                t.name,
                t.id,
                kind,
                t.store().node_count()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        init::run_in(dir.path()).unwrap();
        dir
    }

    #[test]
    fn list_marks_active_tab() {
        let dir = setup();
        let (_, ws) = open_workspace(dir.path()).unwrap();
        let lines = tab_lines(&ws);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("* Financial  preset-financial  [preset:financial"));
        assert!(lines[1].starts_with("  ESG"));
    }

    #[test]
    fn new_tab_survives_reopen() {
        let dir = setup();
        new_in(dir.path(), "Plant B").unwrap();
        let (_, ws) = open_workspace(dir.path()).unwrap();
        assert_eq!(ws.active_tab().name, "Plant B");
        assert_eq!(ws.tabs().len(), 4);
    }

    #[test]
    fn switch_by_name() {
        let dir = setup();
        switch_in(dir.path(), "Operations").unwrap();
        let (_, ws) = open_workspace(dir.path()).unwrap();
        assert_eq!(ws.active_tab().id, "preset-operations");
    }

    #[test]
    fn rename_close_and_duplicate() {
        let dir = setup();
        new_in(dir.path(), "Draft").unwrap();
        rename_in(dir.path(), "Draft", "Final").unwrap();
        duplicate_in(dir.path(), "Final").unwrap();
        close_in(dir.path(), "Final").unwrap();

        let (_, ws) = open_workspace(dir.path()).unwrap();
        let names: Vec<&str> = ws.tabs().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Financial", "ESG", "Operations", "Final (copy)"]);
    }

    #[test]
    fn preset_cannot_be_closed() {
        let dir = setup();
        let err = close_in(dir.path(), "ESG").unwrap_err();
        assert!(err.to_string().contains("preset"));
    }

    #[test]
    fn unknown_tab_is_an_error() {
        let dir = setup();
        assert!(switch_in(dir.path(), "nope").is_err());
    }
}
