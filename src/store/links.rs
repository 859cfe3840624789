//! Cross-links between nodes.
//!
//! A link is stored as two directed records: the forward edge on the source
//! and, unless the target already points back, a synthesized mirror on the
//! target whose id ends in `-reverse`. Read paths treat the pair as one
//! relationship and skip edges whose target no longer exists.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, warn};

use super::TreeStore;
use crate::model::forest;
use crate::model::node::{REVERSE_SUFFIX, new_relationship_id};
use crate::model::{KpiNode, NodeRelationship};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkRejection {
    #[error("no link source selected")]
    NoSource,
    #[error("cannot link a node to itself")]
    SelfLink,
    #[error("'{from}' is already linked to '{to}'")]
    Duplicate { from: String, to: String },
    #[error("node '{0}' not found")]
    NodeNotFound(String),
}

/// One relationship as seen by the UI: a linked pair, listed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipEntry {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

impl TreeStore {
    /// Remember `node_id` as the source of the next [`TreeStore::create_link`].
    pub fn start_link(&mut self, node_id: &str) -> bool {
        if self.find_node_by_id(node_id).is_none() {
            return false;
        }
        self.link_source = Some(node_id.to_string());
        true
    }

    pub fn cancel_link(&mut self) {
        self.link_source = None;
    }

    pub fn link_source(&self) -> Option<&str> {
        self.link_source.as_deref()
    }

    /// Link the selected source to `target_id`. Clears the selection on success.
    pub fn create_link(
        &mut self,
        target_id: &str,
        label: Option<&str>,
    ) -> Result<String, LinkRejection> {
        let source = self.link_source.clone().ok_or(LinkRejection::NoSource)?;
        let id = self.create_link_between(&source, target_id, label)?;
        self.link_source = None;
        Ok(id)
    }

    /// Link `from` to `to`, writing the forward edge and its mirror.
    pub fn create_link_between(
        &mut self,
        from: &str,
        to: &str,
        label: Option<&str>,
    ) -> Result<String, LinkRejection> {
        if from == to {
            return Err(LinkRejection::SelfLink);
        }
        let source = self
            .find_node_by_id(from)
            .ok_or_else(|| LinkRejection::NodeNotFound(from.to_string()))?;
        if !forest::contains(&self.forest, to) {
            return Err(LinkRejection::NodeNotFound(to.to_string()));
        }
        if source.has_link_to(to) {
            warn!(from, to, "duplicate link rejected");
            return Err(LinkRejection::Duplicate {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        let id = new_relationship_id();
        let prefix = self.settings.reverse_label_prefix.clone();
        attach_link_pair(&mut self.forest, from, to, &id, label, &prefix);
        debug!(from, to, id = %id, "link created");
        Ok(id)
    }

    /// Remove the link between `from` and `to` in both directions.
    pub fn delete_link(&mut self, from: &str, to: &str) -> bool {
        let mut removed = 0usize;
        for (owner, target) in [(from, to), (to, from)] {
            if let Some(node) = forest::find_mut(&mut self.forest, owner) {
                let before = node.relationships.len();
                node.relationships.retain(|r| r.target_id != target);
                removed += before - node.relationships.len();
            }
        }
        debug!(from, to, removed, "link deleted");
        removed > 0
    }

    /// Rewrite the label of the forward edge `from -> to`.
    pub fn update_link_label(&mut self, from: &str, to: &str, label: Option<&str>) -> bool {
        let Some(node) = forest::find_mut(&mut self.forest, from) else {
            return false;
        };
        match node.relationships.iter_mut().find(|r| r.target_id == to) {
            Some(rel) => {
                rel.label = normalize_label(label);
                true
            }
            None => false,
        }
    }

    /// Outgoing edges of one node whose targets still exist.
    pub fn relationships_of(&self, node_id: &str) -> Vec<&NodeRelationship> {
        let Some(node) = self.find_node_by_id(node_id) else {
            return Vec::new();
        };
        node.relationships
            .iter()
            .filter(|r| forest::contains(&self.forest, &r.target_id))
            .collect()
    }

    pub fn get_all_relationships(&self) -> Vec<RelationshipEntry> {
        canonical_relationships(&self.forest)
    }

    /// Drop every edge whose target is no longer in the forest.
    pub fn prune_dangling_links(&mut self) -> usize {
        let ids: HashSet<String> = forest::walk(&self.forest).map(|n| n.id.clone()).collect();
        let mut pruned = 0usize;
        forest::for_each_mut(&mut self.forest, &mut |node| {
            let before = node.relationships.len();
            node.relationships.retain(|r| ids.contains(&r.target_id));
            pruned += before - node.relationships.len();
        });
        debug!(pruned, "dangling links pruned");
        pruned
    }
}

/// Write the forward edge `from -> to` with id `id`, then the mirror on `to`
/// unless `to` already links back to `from`. The mirror's label is the
/// forward label behind `reverse_prefix`.
///
/// The forward edge is always written; callers that must not duplicate a
/// link check [`KpiNode::has_link_to`] first. Returns false when either
/// endpoint is missing.
pub fn attach_link_pair(
    forest_nodes: &mut [KpiNode],
    from: &str,
    to: &str,
    id: &str,
    label: Option<&str>,
    reverse_prefix: &str,
) -> bool {
    if !forest::contains(forest_nodes, from) || !forest::contains(forest_nodes, to) {
        return false;
    }
    let label = normalize_label(label);
    if let Some(source) = forest::find_mut(forest_nodes, from) {
        source.relationships.push(NodeRelationship {
            id: id.to_string(),
            target_id: to.to_string(),
            label: label.clone(),
        });
    }
    if let Some(target) = forest::find_mut(forest_nodes, to) {
        if !target.has_link_to(from) {
            target.relationships.push(NodeRelationship {
                id: format!("{id}{REVERSE_SUFFIX}"),
                target_id: from.to_string(),
                label: label.map(|l| format!("{reverse_prefix} {l}")),
            });
        }
    }
    true
}

/// One entry per linked pair, in forest order, preferring the forward record
/// over a synthesized mirror. Edges to missing nodes are skipped.
pub fn canonical_relationships(forest_nodes: &[KpiNode]) -> Vec<RelationshipEntry> {
    let ids: HashSet<&str> = forest::walk(forest_nodes).map(|n| n.id.as_str()).collect();
    let mut entries: Vec<RelationshipEntry> = Vec::new();
    let mut by_pair: HashMap<(String, String), (usize, bool)> = HashMap::new();

    for node in forest::walk(forest_nodes) {
        for rel in &node.relationships {
            if !ids.contains(rel.target_id.as_str()) {
                continue;
            }
            let key = pair_key(&node.id, &rel.target_id);
            let entry = RelationshipEntry {
                id: rel.id.clone(),
                source: node.id.clone(),
                target: rel.target_id.clone(),
                label: rel.label.clone(),
            };
            match by_pair.get(&key) {
                None => {
                    by_pair.insert(key, (entries.len(), rel.is_reverse()));
                    entries.push(entry);
                }
                Some(&(idx, true)) if !rel.is_reverse() => {
                    entries[idx] = entry;
                    by_pair.insert(key, (idx, false));
                }
                Some(_) => {}
            }
        }
    }
    entries
}

/// Every directed record worth writing to a file: each forward edge, plus
/// any mirror whose forward edge is gone. Edges to missing nodes are skipped.
pub fn export_relationships(forest_nodes: &[KpiNode]) -> Vec<RelationshipEntry> {
    let ids: HashSet<&str> = forest::walk(forest_nodes).map(|n| n.id.as_str()).collect();
    let forward: HashSet<(&str, &str, &str)> = forest::walk(forest_nodes)
        .flat_map(|n| n.relationships.iter().map(move |r| (n, r)))
        .filter(|(_, r)| !r.is_reverse())
        .map(|(n, r)| (r.id.as_str(), n.id.as_str(), r.target_id.as_str()))
        .collect();

    let mut entries = Vec::new();
    for node in forest::walk(forest_nodes) {
        for rel in &node.relationships {
            if !ids.contains(rel.target_id.as_str()) {
                continue;
            }
            if let Some(base) = rel.id.strip_suffix(REVERSE_SUFFIX) {
                if forward.contains(&(base, rel.target_id.as_str(), node.id.as_str())) {
                    continue;
                }
            }
            entries.push(RelationshipEntry {
                id: rel.id.clone(),
                source: node.id.clone(),
                target: rel.target_id.clone(),
                label: rel.label.clone(),
            });
        }
    }
    entries
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

fn normalize_label(label: Option<&str>) -> Option<String> {
    label.map(str::trim).filter(|l| !l.is_empty()).map(String::from)
}
