//! `kpitree link`, `unlink`, `relabel`, `links` — cross-links on the active tab.

use std::path::Path;

use anyhow::{Result, anyhow, bail};
use crossterm::style::Stylize;

use super::{note_if_preset, open_workspace, require_node};
use crate::project;
use crate::store::{RelationshipEntry, TreeStore};

pub fn run_link(from: &str, to: &str, label: Option<&str>) -> Result<()> {
    link_in(&project::find_root()?, from, to, label).map(|_| ())
}

pub fn run_unlink(from: &str, to: &str) -> Result<()> {
    unlink_in(&project::find_root()?, from, to)
}

pub fn run_relabel(from: &str, to: &str, label: Option<&str>) -> Result<()> {
    relabel_in(&project::find_root()?, from, to, label)
}

pub fn run_links(node: Option<&str>, prune: bool) -> Result<()> {
    links_in(&project::find_root()?, node, prune)
}

pub fn link_in(root: &Path, from: &str, to: &str, label: Option<&str>) -> Result<String> {
    let (_, mut ws) = open_workspace(root)?;
    let id = ws
        .edit_active(|store| store.create_link_between(from, to, label))?
        .map_err(|rejection| anyhow!("link rejected: {}", rejection))?;
    println!("  {} {} -> {}", "Linked".green().bold(), from, to);
    note_if_preset(&ws);
    Ok(id)
}

pub fn unlink_in(root: &Path, from: &str, to: &str) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    if !ws.edit_active(|store| store.delete_link(from, to))? {
        bail!("no link between '{}' and '{}'", from, to);
    }
    println!("  {} {} -- {}", "Unlinked".green().bold(), from, to);
    note_if_preset(&ws);
    Ok(())
}

pub fn relabel_in(root: &Path, from: &str, to: &str, label: Option<&str>) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    if !ws.edit_active(|store| store.update_link_label(from, to, label))? {
        bail!("'{}' has no link to '{}'", from, to);
    }
    println!("  {} {} -> {}", "Relabelled".green().bold(), from, to);
    note_if_preset(&ws);
    Ok(())
}

/// List relationships: one node's outgoing edges, or every linked pair.
/// With `prune`, edges to deleted nodes are dropped first.
pub fn links_in(root: &Path, node: Option<&str>, prune: bool) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    if prune {
        let pruned = ws.edit_active(|store| store.prune_dangling_links())?;
        println!("  {} {} dangling edges", "Pruned".green().bold(), pruned);
    }
    let store = ws.active_tab().store();
    let lines = match node {
        Some(id) => {
            require_node(&ws, id)?;
            node_link_lines(store, id)
        }
        None => pair_lines(&store.get_all_relationships()),
    };
    if lines.is_empty() {
        println!("  No links.");
    } else {
        for line in lines {
            println!("  {}", line);
        }
    }
    Ok(())
}

fn pair_lines(entries: &[RelationshipEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| match &e.label {
            Some(label) => format!("{} -> {} : {}", e.source, e.target, label),
            None => format!("{} -> {} :", e.source, e.target),
        })
        .collect()
}

fn node_link_lines(store: &TreeStore, id: &str) -> Vec<String> {
    store
        .relationships_of(id)
        .into_iter()
        .map(|r| {
            let arrow = if r.is_reverse() { "<-" } else { "->" };
            match &r.label {
                Some(label) => format!("{} {} {} : {}", id, arrow, r.target_id, label),
                None => format!("{} {} {} :", id, arrow, r.target_id),
            }
        })
        .collect()
}
