//! Search and ESG filtering over a forest.

use std::collections::BTreeSet;

use crate::model::KpiNode;

/// A search term plus the ESG-only switch, as held in a tab's UI state.
#[derive(Debug, Clone, Copy)]
pub struct Filter<'a> {
    pub search: &'a str,
    pub esg_only: bool,
}

impl<'a> Filter<'a> {
    pub fn new(search: &'a str, esg_only: bool) -> Self {
        Self { search, esg_only }
    }

    pub fn is_identity(&self) -> bool {
        self.search.trim().is_empty() && !self.esg_only
    }

    /// Case-insensitive match on name, id or unit, restricted to ESG-tagged
    /// nodes when `esg_only` is set.
    pub fn matches(&self, node: &KpiNode) -> bool {
        if self.esg_only && node.esg.is_none() {
            return false;
        }
        let term = self.search.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        node.name.to_lowercase().contains(&term)
            || node.id.to_lowercase().contains(&term)
            || node
                .unit
                .as_deref()
                .is_some_and(|u| u.to_lowercase().contains(&term))
    }
}

/// A pruned copy of `forest` holding every matching node and the ancestors
/// needed to reach it.
pub fn filter_forest(forest: &[KpiNode], search: &str, esg_only: bool) -> Vec<KpiNode> {
    let filter = Filter::new(search, esg_only);
    if filter.is_identity() {
        return forest.to_vec();
    }
    forest.iter().filter_map(|n| prune(n, &filter)).collect()
}

fn prune(node: &KpiNode, filter: &Filter<'_>) -> Option<KpiNode> {
    let children: Vec<KpiNode> = node.children.iter().filter_map(|c| prune(c, filter)).collect();
    if children.is_empty() && !filter.matches(node) {
        return None;
    }
    let mut kept = node.clone();
    kept.children = children;
    Some(kept)
}

/// Ids of every node that has a matching descendant, i.e. the nodes to expand
/// so that all matches are visible.
pub fn ancestors_of_matches(forest: &[KpiNode], search: &str, esg_only: bool) -> BTreeSet<String> {
    let filter = Filter::new(search, esg_only);
    let mut out = BTreeSet::new();
    if filter.is_identity() {
        return out;
    }
    for node in forest {
        collect_ancestors(node, &filter, &mut out);
    }
    out
}

/// Returns true when `node` or anything below it matches.
fn collect_ancestors(node: &KpiNode, filter: &Filter<'_>, out: &mut BTreeSet<String>) -> bool {
    let mut below = false;
    for child in &node.children {
        below |= collect_ancestors(child, filter, out);
    }
    if below {
        out.insert(node.id.clone());
    }
    below || filter.matches(node)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Esg, forest};

    fn sample() -> Vec<KpiNode> {
        vec![
            KpiNode::new("root", "Enterprise Value")
                .with_child(
                    KpiNode::new("revenue", "Revenue")
                        .with_child(KpiNode::new("prod-volume", "Production Volume").with_unit("t")),
                )
                .with_child(
                    KpiNode::new("cost", "Operating Cost")
                        .with_child(KpiNode::new("cost-energy", "Energy Cost").with_esg(Esg::E)),
                ),
            KpiNode::new("ops", "Operations"),
        ]
    }

    fn ids(forest_nodes: &[KpiNode]) -> Vec<String> {
        forest::walk(forest_nodes).map(|n| n.id.clone()).collect()
    }

    #[test]
    fn empty_filter_is_identity() {
        assert_eq!(filter_forest(&sample(), "  ", false), sample());
    }

    #[test]
    fn search_keeps_matches_and_ancestors() {
        let filtered = filter_forest(&sample(), "VOLUME", false);
        assert_eq!(ids(&filtered), vec!["root", "revenue", "prod-volume"]);
    }

    #[test]
    fn matching_parent_does_not_keep_unmatched_children() {
        let filtered = filter_forest(&sample(), "cost", false);
        // "cost" matches both Operating Cost and Energy Cost.
        assert_eq!(ids(&filtered), vec!["root", "cost", "cost-energy"]);
        let filtered = filter_forest(&sample(), "enterprise", false);
        assert_eq!(ids(&filtered), vec!["root"]);
    }

    #[test]
    fn unit_is_searched() {
        let filtered = filter_forest(&sample(), "t", false);
        assert!(ids(&filtered).contains(&"prod-volume".to_string()));
    }

    #[test]
    fn esg_only_keeps_tagged_nodes() {
        let filtered = filter_forest(&sample(), "", true);
        assert_eq!(ids(&filtered), vec!["root", "cost", "cost-energy"]);
        assert!(filter_forest(&sample(), "revenue", true).is_empty());
    }

    #[test]
    fn ancestors_to_expand() {
        let expand = ancestors_of_matches(&sample(), "energy", false);
        assert_eq!(
            expand.into_iter().collect::<Vec<_>>(),
            vec!["cost".to_string(), "root".to_string()]
        );
        assert!(ancestors_of_matches(&sample(), "", false).is_empty());
    }
}
