//! `kpitree add`, `add-sibling`, `edit`, `mv`, `rm`, `dup`, `category`,
//! `mark` — node mutations on the active tab.

use std::path::Path;

use anyhow::{Result, anyhow, bail};
use crossterm::style::Stylize;

use super::{note_if_preset, open_workspace, require_node};
use crate::model::{Esg, NodeCategory, NodeFields, Scope};
use crate::project;
use crate::store::{MoveOutcome, MoveTarget, ROOT_SENTINEL_ID, SiblingPosition};

/// Field values given on the command line. `None` leaves a field as it is;
/// for `unit`, `esg` and `scope` the value `none` (or an empty string) clears it.
#[derive(Debug, Clone, Default)]
pub struct FieldArgs {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub esg: Option<String>,
    pub scope: Option<String>,
}

impl FieldArgs {
    /// Overlay these arguments on `base`.
    pub fn apply(&self, mut base: NodeFields) -> Result<NodeFields> {
        if let Some(name) = &self.name {
            let name = name.trim();
            if name.is_empty() {
                bail!("name cannot be empty");
            }
            base.name = name.to_string();
        }
        if let Some(unit) = &self.unit {
            base.unit = clearable(unit).map(String::from);
        }
        if let Some(esg) = &self.esg {
            base.esg = match clearable(esg) {
                None => None,
                Some(v) => Some(Esg::parse(v).ok_or_else(|| anyhow!("esg must be E, S or G (got '{}')", v))?),
            };
        }
        if let Some(scope) = &self.scope {
            base.scope = match clearable(scope) {
                None => None,
                Some(v) => Some(Scope::parse(v).ok_or_else(|| anyhow!("scope must be 1, 2 or 3 (got '{}')", v))?),
            };
        }
        Ok(base)
    }
}

fn clearable(value: &str) -> Option<&str> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(value)
    }
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

pub fn run_add(parent: Option<&str>, fields: &FieldArgs) -> Result<()> {
    add_in(&project::find_root()?, parent, fields).map(|_| ())
}

pub fn run_add_sibling(anchor: &str, before: bool, fields: &FieldArgs) -> Result<()> {
    add_sibling_in(&project::find_root()?, anchor, before, fields).map(|_| ())
}

pub fn run_edit(node: &str, fields: &FieldArgs) -> Result<()> {
    edit_in(&project::find_root()?, node, fields)
}

pub fn run_move(node: &str, target: Option<&str>) -> Result<()> {
    move_in(&project::find_root()?, node, target)
}

pub fn run_remove(node: &str) -> Result<()> {
    remove_in(&project::find_root()?, node)
}

pub fn run_duplicate(node: &str) -> Result<()> {
    duplicate_in(&project::find_root()?, node).map(|_| ())
}

pub fn run_category(node: &str, category: &str) -> Result<()> {
    category_in(&project::find_root()?, node, category)
}

pub fn run_mark(node: &str, marker: &str) -> Result<()> {
    mark_in(&project::find_root()?, node, marker)
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// Add a metric under `parent`, or at the top level when `parent` is `None`.
pub fn add_in(root: &Path, parent: Option<&str>, args: &FieldArgs) -> Result<String> {
    let fields = new_fields(args)?;
    let (_, mut ws) = open_workspace(root)?;
    let parent_id = parent.unwrap_or(ROOT_SENTINEL_ID);
    if parent_id != ROOT_SENTINEL_ID {
        require_node(&ws, parent_id)?;
    }
    let id = ws
        .edit_active(|store| store.add_node(parent_id, &fields))?
        .ok_or_else(|| anyhow!("node '{}' not found", parent_id))?;
    println!("  {} '{}' ({})", "Added".green().bold(), fields.name, id.as_str().dark_grey());
    note_if_preset(&ws);
    Ok(id)
}

pub fn add_sibling_in(root: &Path, anchor: &str, before: bool, args: &FieldArgs) -> Result<String> {
    let fields = new_fields(args)?;
    let (_, mut ws) = open_workspace(root)?;
    let position = if before {
        SiblingPosition::Before
    } else {
        SiblingPosition::After
    };
    let id = ws
        .edit_active(|store| store.add_sibling_node(anchor, &fields, position))?
        .ok_or_else(|| anyhow!("anchor node '{}' not found", anchor))?;
    println!("  {} '{}' ({})", "Added".green().bold(), fields.name, id.as_str().dark_grey());
    note_if_preset(&ws);
    Ok(id)
}

pub fn edit_in(root: &Path, node: &str, args: &FieldArgs) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    let current = ws
        .active_tab()
        .store()
        .find_node_by_id(node)
        .ok_or_else(|| anyhow!("node '{}' not found", node))?;
    let base = NodeFields {
        name: current.name.clone(),
        unit: current.unit.clone(),
        esg: current.esg,
        scope: current.scope,
    };
    let fields = args.apply(base)?;
    ws.edit_active(|store| store.edit_node(node, &fields))?;
    println!("  {} {}", "Updated".green().bold(), node);
    note_if_preset(&ws);
    Ok(())
}

/// Move `node` under `target` (`None`, `top` or the root sentinel for the
/// top level).
pub fn move_in(root: &Path, node: &str, target: Option<&str>) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    let target = MoveTarget::from_id(target.filter(|t| !t.eq_ignore_ascii_case("top")));
    match ws.edit_active(|store| store.move_node(node, &target))? {
        Ok(MoveOutcome::Moved) => {
            println!("  {} {}", "Moved".green().bold(), node);
            note_if_preset(&ws);
        }
        Ok(MoveOutcome::TargetMissing) => {
            println!("  {}", "Target not found; nothing moved.".dark_grey());
        }
        Err(rejection) => bail!("move rejected: {}", rejection),
    }
    Ok(())
}

pub fn remove_in(root: &Path, node: &str) -> Result<()> {
    let (_, mut ws) = open_workspace(root)?;
    let removed = ws
        .edit_active(|store| store.delete_node(node))?
        .ok_or_else(|| anyhow!("node '{}' not found", node))?;
    println!(
        "  {} '{}' and {} descendants",
        "Removed".green().bold(),
        removed.name,
        removed.subtree_len() - 1
    );
    note_if_preset(&ws);
    Ok(())
}

pub fn duplicate_in(root: &Path, node: &str) -> Result<String> {
    let (_, mut ws) = open_workspace(root)?;
    let id = ws
        .edit_active(|store| store.duplicate_node(node))?
        .ok_or_else(|| anyhow!("node '{}' not found", node))?;
    println!("  {} {} as {}", "Duplicated".green().bold(), node, id.as_str().dark_grey());
    note_if_preset(&ws);
    Ok(id)
}

/// Pin a category, or `auto` to go back to inference.
pub fn category_in(root: &Path, node: &str, category: &str) -> Result<()> {
    let category = if category.trim().eq_ignore_ascii_case("auto") {
        None
    } else {
        let parsed = NodeCategory::parse(category).ok_or_else(|| {
            let known: Vec<&str> = NodeCategory::ALL.iter().map(|c| c.as_str()).collect();
            anyhow!("unknown category '{}' (expected auto or one of: {})", category, known.join(", "))
        })?;
        Some(parsed)
    };
    let (_, mut ws) = open_workspace(root)?;
    require_node(&ws, node)?;
    ws.edit_active(|store| store.set_category(node, category))?;
    let effective = ws
        .active_tab()
        .store()
        .category_of(node)
        .unwrap_or(NodeCategory::Metric);
    println!("  {} {} is now {}", "Category".green().bold(), node, effective.as_str().cyan());
    note_if_preset(&ws);
    Ok(())
}

pub fn mark_in(root: &Path, node: &str, marker: &str) -> Result<()> {
    let marker = marker.trim();
    if marker.is_empty() {
        bail!("marker cannot be empty");
    }
    let (_, mut ws) = open_workspace(root)?;
    let set = ws
        .edit_active(|store| store.toggle_marker(node, marker))?
        .ok_or_else(|| anyhow!("node '{}' not found", node))?;
    let verb = if set { "Marked" } else { "Unmarked" };
    println!("  {} {} #{}", verb.green().bold(), node, marker);
    note_if_preset(&ws);
    Ok(())
}

fn new_fields(args: &FieldArgs) -> Result<NodeFields> {
    if args.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        bail!("a new node needs a name");
    }
    args.apply(NodeFields::default())
}
