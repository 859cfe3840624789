//! The tree store: single owner of one forest and every mutation on it.
//!
//! Every operation either applies completely or leaves the forest untouched.
//! Validation failures come back as values ([`MoveRejection`],
//! [`LinkRejection`]); nothing here panics or aborts on bad input.

mod edit;
mod links;
mod moves;

use std::time::{Duration, Instant};

use crate::model::forest::{self, ParentLookup};
use crate::model::{KpiNode, NodeCategory, infer_category};

pub use edit::SiblingPosition;
pub use links::{
    LinkRejection, RelationshipEntry, attach_link_pair, canonical_relationships, export_relationships,
};
pub use moves::{MoveOutcome, MoveRejection, MoveTarget};

/// Id of the synthetic "top level" entry offered by pickers.
pub const ROOT_SENTINEL_ID: &str = "__root__";

pub const DEFAULT_REVERSE_LABEL_PREFIX: &str = "←";

/// Tunables for a [`TreeStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// How long a rejected move stays visible.
    pub move_error_ttl: Duration,
    /// Prepended to the label of a synthesized reverse edge.
    pub reverse_label_prefix: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            move_error_ttl: Duration::from_secs(5),
            reverse_label_prefix: DEFAULT_REVERSE_LABEL_PREFIX.to_string(),
        }
    }
}

/// A rejected move, remembered until it expires.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TransientError {
    reason: String,
    raised_at: Instant,
}

/// Flattened view of one node for pickers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    pub id: String,
    pub name: String,
    /// Names from the top-level ancestor down to this node, joined by `" > "`.
    pub path: String,
    pub has_children: bool,
    pub category: NodeCategory,
}

#[derive(Debug, Clone, Default)]
pub struct TreeStore {
    forest: Vec<KpiNode>,
    link_source: Option<String>,
    move_error: Option<TransientError>,
    settings: StoreSettings,
}

impl TreeStore {
    pub fn new(forest: Vec<KpiNode>) -> Self {
        Self::with_settings(forest, StoreSettings::default())
    }

    pub fn with_settings(forest: Vec<KpiNode>, settings: StoreSettings) -> Self {
        Self {
            forest,
            link_source: None,
            move_error: None,
            settings,
        }
    }

    pub fn forest(&self) -> &[KpiNode] {
        &self.forest
    }

    pub fn into_forest(self) -> Vec<KpiNode> {
        self.forest
    }

    /// Swap in a whole new forest (import, tab reset). Clears transient state.
    pub fn replace_forest(&mut self, forest: Vec<KpiNode>) {
        self.forest = forest;
        self.link_source = None;
        self.move_error = None;
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn node_count(&self) -> usize {
        forest::count(&self.forest)
    }

    pub fn find_node_by_id(&self, id: &str) -> Option<&KpiNode> {
        forest::find(&self.forest, id)
    }

    pub fn find_parent_of_node(&self, id: &str) -> ParentLookup<'_> {
        forest::find_parent(&self.forest, id)
    }

    pub fn category_of(&self, id: &str) -> Option<NodeCategory> {
        self.find_node_by_id(id).map(infer_category)
    }

    /// Every node flattened for a picker, preceded by the top-level sentinel.
    pub fn get_all_nodes(&self) -> Vec<NodeEntry> {
        let mut entries = vec![NodeEntry {
            id: ROOT_SENTINEL_ID.to_string(),
            name: "Top level".to_string(),
            path: String::new(),
            has_children: !self.forest.is_empty(),
            category: NodeCategory::Root,
        }];
        for (node, ancestors) in forest::walk_with_ancestors(&self.forest) {
            let mut trail = ancestors;
            trail.push(node.name.as_str());
            entries.push(NodeEntry {
                id: node.id.clone(),
                name: node.name.clone(),
                path: trail.join(" > "),
                has_children: node.has_children(),
                category: infer_category(node),
            });
        }
        entries
    }

    /// The most recent move rejection, if it has not yet expired at `now`.
    pub fn move_error_at(&self, now: Instant) -> Option<&str> {
        self.move_error
            .as_ref()
            .filter(|e| now.saturating_duration_since(e.raised_at) < self.settings.move_error_ttl)
            .map(|e| e.reason.as_str())
    }

    pub fn move_error(&self) -> Option<&str> {
        self.move_error_at(Instant::now())
    }

    pub fn clear_move_error(&mut self) {
        self.move_error = None;
    }

    fn raise_move_error(&mut self, reason: String) {
        self.move_error = Some(TransientError {
            reason,
            raised_at: Instant::now(),
        });
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_forest;
    use super::*;

    #[test]
    fn get_all_nodes_starts_with_sentinel_and_builds_breadcrumbs() {
        let store = TreeStore::new(sample_forest());
        let entries = store.get_all_nodes();
        assert_eq!(entries[0].id, ROOT_SENTINEL_ID);
        assert_eq!(entries.len(), store.node_count() + 1);

        let volume = entries.iter().find(|e| e.id == "prod-volume").unwrap();
        assert_eq!(volume.path, "Enterprise Value > Revenue > Production Volume");
        assert_eq!(volume.category, NodeCategory::Production);
        assert!(!volume.has_children);

        let revenue = entries.iter().find(|e| e.id == "revenue").unwrap();
        assert!(revenue.has_children);
    }

    #[test]
    fn find_parent_of_node_reports_top_level() {
        let store = TreeStore::new(sample_forest());
        assert_eq!(store.find_parent_of_node("ops"), ParentLookup::TopLevel);
        assert_eq!(store.find_parent_of_node("missing"), ParentLookup::NotFound);
    }

    #[test]
    fn independent_stores_do_not_share_state() {
        let mut a = TreeStore::new(sample_forest());
        let b = TreeStore::new(sample_forest());
        a.delete_node("ops");
        assert!(a.find_node_by_id("ops").is_none());
        assert!(b.find_node_by_id("ops").is_some());
    }

    #[test]
    fn move_error_expires_after_ttl() {
        let mut store = TreeStore::new(sample_forest());
        store.raise_move_error("nope".into());
        let raised = store.move_error.as_ref().unwrap().raised_at;
        assert_eq!(store.move_error_at(raised), Some("nope"));
        assert_eq!(
            store.move_error_at(raised + Duration::from_secs(5)),
            None,
            "error should clear once the ttl elapses"
        );
    }
}
