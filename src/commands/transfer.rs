//! `kpitree import` and `kpitree export`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crossterm::style::Stylize;

use super::{note_if_preset, open_workspace};
use crate::codec::{self, FileFormat};
use crate::project;

pub fn run_import(path: &Path, replace: bool) -> Result<()> {
    import_in(&project::find_root()?, path, replace)
}

pub fn run_export(path: &Path, format: Option<FileFormat>) -> Result<()> {
    export_in(&project::find_root()?, path, format).map(|_| ())
}

/// Read `path` into a new tab named after the file, or with `replace` into
/// the active tab. A failed read leaves the workspace untouched.
pub fn import_in(root: &Path, path: &Path, replace: bool) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    let imported = codec::import_file(path)
        .with_context(|| format!("cannot import {}", path.display()))?;
    let report = imported.report.clone();

    if replace {
        ws.replace_active_forest(imported.forest)?;
    } else {
        ws.open_tab(&imported.name, imported.forest)?;
    }
    println!(
        "  {} {} nodes into tab '{}'",
        "Imported".green().bold(),
        report.nodes.to_string().green(),
        ws.active_tab().name
    );
    if report.relationships > 0 {
        println!("  {} {} relationships", "Linked".green().bold(), report.relationships);
    }
    if report.dropped_relationships > 0 {
        println!(
            "  {} {} relationships pointed at missing topics and were dropped",
            "Warning".yellow().bold(),
            report.dropped_relationships
        );
    }
    if replace {
        note_if_preset(&ws);
    }
    Ok(())
}

/// Write the active tab to `path`. The format comes from `format`, else the
/// file extension, else the configured `export_format` (whose extension is
/// then added to the path).
pub fn export_in(root: &Path, path: &Path, format: Option<FileFormat>) -> Result<PathBuf> {
    let (cfg, ws) = open_workspace(root)?;
    let (path, format) = match format {
        Some(f) => (path.to_path_buf(), f),
        None => match FileFormat::from_path(path) {
            Ok(f) => (path.to_path_buf(), f),
            Err(_) if path.extension().is_none() => {
                let f = cfg.export_format;
                (path.with_extension(f.extension()), f)
            }
            Err(e) => return Err(e.into()),
        },
    };
    codec::export_file(&path, ws.active_forest(), format)
        .with_context(|| format!("cannot export to {}", path.display()))?;
    println!(
        "  {} '{}' to {}",
        "Exported".green().bold(),
        ws.active_tab().name,
        path.display()
    );
    Ok(path)
}
