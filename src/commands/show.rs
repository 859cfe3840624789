//! `kpitree show`, `nodes`, `search`, `filter`, `expand`, `collapse` —
//! browsing the active tab.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;
use crossterm::style::Stylize;

use super::{Workspace, open_workspace, require_node};
use crate::model::KpiNode;
use crate::project;
use crate::store::{NodeEntry, TreeStore};

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

pub fn run_show(all: bool) -> Result<()> {
    show_in(&project::find_root()?, all)
}

pub fn run_nodes() -> Result<()> {
    nodes_in(&project::find_root()?)
}

pub fn run_search(term: &str) -> Result<()> {
    search_in(&project::find_root()?, term)
}

pub fn run_filter(esg_only: bool) -> Result<()> {
    filter_in(&project::find_root()?, esg_only)
}

pub fn run_expand(node: Option<&str>) -> Result<()> {
    expand_in(&project::find_root()?, node)
}

pub fn run_collapse(node: Option<&str>) -> Result<()> {
    collapse_in(&project::find_root()?, node)
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// Print the active tab. With `all`, every node is shown regardless of the
/// tab's expansion state.
pub fn show_in(root: &Path, all: bool) -> Result<()> {
    let (_, ws) = open_workspace(root)?;
    print_active(&ws, all);
    Ok(())
}

pub fn nodes_in(root: &Path) -> Result<()> {
    let (_, ws) = open_workspace(root)?;
    for line in node_lines(&ws.active_tab().store().get_all_nodes()) {
        println!("  {}", line);
    }
    Ok(())
}

pub fn search_in(root: &Path, term: &str) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    ws.set_search(term)?;
    print_active(&ws, false);
    Ok(())
}

pub fn filter_in(root: &Path, esg_only: bool) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    ws.set_esg_only(esg_only)?;
    print_active(&ws, false);
    Ok(())
}

pub fn expand_in(root: &Path, node: Option<&str>) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    match node {
        None => ws.expand_all()?,
        Some(id) => {
            require_node(&ws, id)?;
            if !ws.active_tab().ui.expanded.contains(id) {
                ws.toggle_expanded(id)?;
            }
        }
    }
    print_active(&ws, false);
    Ok(())
}

pub fn collapse_in(root: &Path, node: Option<&str>) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    match node {
        None => ws.collapse_all()?,
        Some(id) => {
            require_node(&ws, id)?;
            if ws.active_tab().ui.expanded.contains(id) {
                ws.toggle_expanded(id)?;
            }
        }
    }
    print_active(&ws, false);
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn print_active(ws: &Workspace, all: bool) {
    let tab = ws.active_tab();
    let mut header = format!("  {}", tab.name.as_str().bold());
    if !tab.ui.search.is_empty() {
        header.push_str(&format!("  search: \"{}\"", tab.ui.search));
    }
    if tab.ui.esg_only {
        header.push_str("  [ESG only]");
    }
    println!("{}", header);

    let visible = tab.visible_forest();
    if visible.is_empty() {
        println!("  {}", "(nothing to show)".dark_grey());
        return;
    }
    let expanded = (!all).then_some(&tab.ui.expanded);
    for line in render_tree(&visible, tab.store(), expanded) {
        println!("  {}", line);
    }
    if let Some(reason) = tab.store().move_error() {
        println!("  {} {}", "Move rejected:".red().bold(), reason);
    }
}

/// One line per visible node. `expanded == None` shows everything.
pub fn render_tree(
    nodes: &[KpiNode],
    store: &TreeStore,
    expanded: Option<&BTreeSet<String>>,
) -> Vec<String> {
    let mut out = Vec::new();
    for node in nodes {
        render_node(node, 0, store, expanded, &mut out);
    }
    out
}

fn render_node(
    node: &KpiNode,
    depth: usize,
    store: &TreeStore,
    expanded: Option<&BTreeSet<String>>,
    out: &mut Vec<String>,
) {
    let open = expanded.is_none_or(|set| set.contains(&node.id));
    let toggle = match (node.has_children(), open) {
        (false, _) => "•",
        (true, true) => "▾",
        (true, false) => "▸",
    };
    let mut line = format!("{}{} {}", "  ".repeat(depth), toggle, node.name);
    if let Some(unit) = &node.unit {
        line.push_str(&format!(" ({unit})"));
    }
    if let Some(esg) = node.esg {
        line.push_str(&format!(" [{esg}]"));
    }
    if let Some(scope) = node.scope {
        line.push_str(&format!(" [scope {scope}]"));
    }
    if node.is_detached {
        line.push_str(" [detached]");
    }
    for marker in &node.markers {
        line.push_str(&format!(" #{marker}"));
    }
    let links = store.relationships_of(&node.id).len();
    if links > 0 {
        line.push_str(&format!(" ↔{links}"));
    }
    line.push_str(&format!("  ({})", node.id));
    out.push(line);

    if open {
        for child in &node.children {
            render_node(child, depth + 1, store, expanded, out);
        }
    }
}

fn node_lines(entries: &[NodeEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| {
            let path = if e.path.is_empty() { e.name.as_str() } else { e.path.as_str() };
            format!("{:<28} {:<12} {}", e.id, e.category.as_str(), path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use crate::model::Esg;
    use tempfile::TempDir;

    fn store() -> TreeStore {
        let mut cost = KpiNode::new("cost", "Cost")
            .with_unit("€")
            .with_child(KpiNode::new("cost-energy", "Energy").with_esg(Esg::E));
        cost.markers.push("flag-red".into());
        let mut store = TreeStore::new(vec![KpiNode::new("root", "EBITDA").with_child(cost)]);
        store.create_link_between("cost-energy", "root", Some("hits")).unwrap();
        store
    }

    #[test]
    fn render_everything() {
        let store = store();
        let lines = render_tree(store.forest(), &store, None);
        assert_eq!(
            lines,
            vec![
                "▾ EBITDA ↔1  (root)".to_string(),
                "  ▾ Cost (€) #flag-red  (cost)".to_string(),
                "    • Energy [E] ↔1  (cost-energy)".to_string(),
            ]
        );
    }

    #[test]
    fn collapsed_nodes_hide_children() {
        let store = store();
        let expanded: BTreeSet<String> = ["root".to_string()].into_iter().collect();
        let lines = render_tree(store.forest(), &store, Some(&expanded));
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("▸ Cost"));
    }

    #[test]
    fn node_lines_include_sentinel_and_paths() {
        let store = store();
        let lines = node_lines(&store.get_all_nodes());
        assert!(lines[0].starts_with("__root__"));
        assert!(lines[3].ends_with("EBITDA > Cost > Energy"));
    }

    #[test]
    fn search_persists_and_expands_ancestors() {
        let dir = TempDir::new().unwrap();
        init::run_in(dir.path()).unwrap();
        search_in(dir.path(), "energy").unwrap();
        let (_, ws) = open_workspace(dir.path()).unwrap();
        assert_eq!(ws.active_tab().ui.search, "energy");
        assert!(ws.active_tab().ui.expanded.contains("cost"));
    }

    #[test]
    fn expand_and_collapse_single_node() {
        let dir = TempDir::new().unwrap();
        init::run_in(dir.path()).unwrap();
        expand_in(dir.path(), Some("revenue")).unwrap();
        expand_in(dir.path(), Some("revenue")).unwrap();
        let (_, ws) = open_workspace(dir.path()).unwrap();
        assert!(ws.active_tab().ui.expanded.contains("revenue"));

        collapse_in(dir.path(), Some("revenue")).unwrap();
        let (_, ws) = open_workspace(dir.path()).unwrap();
        assert!(!ws.active_tab().ui.expanded.contains("revenue"));

        assert!(expand_in(dir.path(), Some("ghost")).is_err());
    }
}
