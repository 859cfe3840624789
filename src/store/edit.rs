//! Add, edit, delete, duplicate and tag nodes.

use tracing::debug;

use super::{ROOT_SENTINEL_ID, TreeStore};
use crate::model::forest;
use crate::model::node::{REVERSE_SUFFIX, new_node_id, new_relationship_id};
use crate::model::{KpiNode, NodeCategory, NodeFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingPosition {
    Before,
    After,
}

impl TreeStore {
    /// Append a new `metric` leaf under `parent_id` (or at the top level for
    /// the root sentinel). No category check: a metric may go anywhere.
    ///
    /// Returns the new id, or `None` when the parent does not exist.
    pub fn add_node(&mut self, parent_id: &str, fields: &NodeFields) -> Option<String> {
        let node = KpiNode::metric(fields);
        let id = node.id.clone();
        if parent_id == ROOT_SENTINEL_ID {
            self.forest.push(node);
        } else {
            forest::find_mut(&mut self.forest, parent_id)?
                .children
                .push(node);
        }
        debug!(parent = parent_id, id = %id, "node added");
        Some(id)
    }

    /// Insert a new leaf directly before or after `anchor_id` among its
    /// siblings. Returns `None` (forest unchanged) when the anchor is unknown.
    pub fn add_sibling_node(
        &mut self,
        anchor_id: &str,
        fields: &NodeFields,
        position: SiblingPosition,
    ) -> Option<String> {
        let siblings = forest::siblings_mut(&mut self.forest, anchor_id)?;
        let idx = siblings.iter().position(|n| n.id == anchor_id)?;
        let node = KpiNode::metric(fields);
        let id = node.id.clone();
        let at = match position {
            SiblingPosition::Before => idx,
            SiblingPosition::After => idx + 1,
        };
        siblings.insert(at, node);
        debug!(anchor = anchor_id, id = %id, ?position, "sibling added");
        Some(id)
    }

    /// Overwrite name, unit, ESG tag and scope. Children, relationships,
    /// markers and category are left alone.
    pub fn edit_node(&mut self, node_id: &str, fields: &NodeFields) -> bool {
        match forest::find_mut(&mut self.forest, node_id) {
            Some(node) => {
                fields.apply_to(node);
                true
            }
            None => false,
        }
    }

    /// Remove the node and its whole subtree.
    ///
    /// Edges elsewhere that point into the removed subtree are kept; they are
    /// filtered out wherever relationships are read and can be dropped with
    /// [`TreeStore::prune_dangling_links`].
    pub fn delete_node(&mut self, node_id: &str) -> Option<KpiNode> {
        let removed = forest::remove(&mut self.forest, node_id)?;
        if let Some(source) = self.link_source.as_deref() {
            if source == removed.id || removed.has_descendant(source) {
                self.link_source = None;
            }
        }
        debug!(id = node_id, removed = removed.subtree_len(), "node deleted");
        Some(removed)
    }

    /// Deep-copy the subtree rooted at `node_id` with fresh ids throughout and
    /// insert it right after the original. Only the copy's root is renamed.
    ///
    /// Relationships and markers are copied as they are; links keep pointing
    /// at the original targets.
    pub fn duplicate_node(&mut self, node_id: &str) -> Option<String> {
        let siblings = forest::siblings_mut(&mut self.forest, node_id)?;
        let idx = siblings.iter().position(|n| n.id == node_id)?;
        let mut copy = siblings[idx].clone();
        reassign_ids(&mut copy);
        copy.name = format!("{} (copy)", copy.name);
        let id = copy.id.clone();
        siblings.insert(idx + 1, copy);
        debug!(original = node_id, copy = %id, "node duplicated");
        Some(id)
    }

    /// Add `marker` if absent, remove it if present. Returns the new state
    /// (`Some(true)` = now set), or `None` for an unknown node.
    pub fn toggle_marker(&mut self, node_id: &str, marker: &str) -> Option<bool> {
        let node = forest::find_mut(&mut self.forest, node_id)?;
        if let Some(idx) = node.markers.iter().position(|m| m == marker) {
            node.markers.remove(idx);
            Some(false)
        } else {
            node.markers.push(marker.to_string());
            Some(true)
        }
    }

    /// Pin (or with `None`, un-pin) a node's category.
    pub fn set_category(&mut self, node_id: &str, category: Option<NodeCategory>) -> bool {
        match forest::find_mut(&mut self.forest, node_id) {
            Some(node) => {
                node.category = category;
                true
            }
            None => false,
        }
    }
}

fn reassign_ids(node: &mut KpiNode) {
    node.id = new_node_id();
    for rel in &mut node.relationships {
        let fresh = new_relationship_id();
        rel.id = if rel.is_reverse() {
            format!("{fresh}{REVERSE_SUFFIX}")
        } else {
            fresh
        };
    }
    for child in &mut node.children {
        reassign_ids(child);
    }
}
