//! Depth-first lookups and structural edits over a forest of [`KpiNode`]s.

use crate::model::node::KpiNode;

/// Where a node sits in the forest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParentLookup<'a> {
    /// The node is a top-level entry.
    TopLevel,
    Parent(&'a KpiNode),
    NotFound,
}

pub fn find<'a>(forest: &'a [KpiNode], id: &str) -> Option<&'a KpiNode> {
    for node in forest {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find(&node.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_mut<'a>(forest: &'a mut [KpiNode], id: &str) -> Option<&'a mut KpiNode> {
    for node in forest {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_parent<'a>(forest: &'a [KpiNode], id: &str) -> ParentLookup<'a> {
    if forest.iter().any(|n| n.id == id) {
        return ParentLookup::TopLevel;
    }
    fn walk<'a>(node: &'a KpiNode, id: &str) -> Option<&'a KpiNode> {
        if node.children.iter().any(|c| c.id == id) {
            return Some(node);
        }
        node.children.iter().find_map(|c| walk(c, id))
    }
    forest
        .iter()
        .find_map(|n| walk(n, id))
        .map_or(ParentLookup::NotFound, ParentLookup::Parent)
}

/// The sibling list holding `id` (the forest itself for top-level nodes).
pub fn siblings_mut<'a>(forest: &'a mut Vec<KpiNode>, id: &str) -> Option<&'a mut Vec<KpiNode>> {
    if forest.iter().any(|n| n.id == id) {
        return Some(forest);
    }
    for node in forest.iter_mut() {
        if let Some(found) = siblings_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Detach and return the subtree rooted at `id`.
pub fn remove(forest: &mut Vec<KpiNode>, id: &str) -> Option<KpiNode> {
    let siblings = siblings_mut(forest, id)?;
    let idx = siblings.iter().position(|n| n.id == id)?;
    Some(siblings.remove(idx))
}

/// Pre-order traversal of every node in the forest.
pub fn walk(forest: &[KpiNode]) -> impl Iterator<Item = &KpiNode> {
    let mut stack: Vec<&KpiNode> = forest.iter().rev().collect();
    std::iter::from_fn(move || {
        let node = stack.pop()?;
        stack.extend(node.children.iter().rev());
        Some(node)
    })
}

/// Pre-order traversal paired with each node's ancestor names (root first).
pub fn walk_with_ancestors(forest: &[KpiNode]) -> Vec<(&KpiNode, Vec<&str>)> {
    fn visit<'a>(node: &'a KpiNode, trail: &mut Vec<&'a str>, out: &mut Vec<(&'a KpiNode, Vec<&'a str>)>) {
        out.push((node, trail.clone()));
        trail.push(node.name.as_str());
        for child in &node.children {
            visit(child, trail, out);
        }
        trail.pop();
    }
    let mut out = Vec::new();
    let mut trail = Vec::new();
    for node in forest {
        visit(node, &mut trail, &mut out);
    }
    out
}

/// Mutable pre-order visit of every node.
pub fn for_each_mut(forest: &mut [KpiNode], f: &mut dyn FnMut(&mut KpiNode)) {
    for node in forest {
        f(node);
        for_each_mut(&mut node.children, f);
    }
}

pub fn count(forest: &[KpiNode]) -> usize {
    forest.iter().map(KpiNode::subtree_len).sum()
}

pub fn contains(forest: &[KpiNode], id: &str) -> bool {
    find(forest, id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<KpiNode> {
        vec![
            KpiNode::new("a", "A")
                .with_child(KpiNode::new("a1", "A1").with_child(KpiNode::new("a1x", "A1x")))
                .with_child(KpiNode::new("a2", "A2")),
            KpiNode::new("b", "B"),
        ]
    }

    #[test]
    fn find_reaches_every_depth() {
        let f = sample();
        assert_eq!(find(&f, "a1x").map(|n| n.name.as_str()), Some("A1x"));
        assert_eq!(find(&f, "b").map(|n| n.name.as_str()), Some("B"));
        assert!(find(&f, "zzz").is_none());
    }

    #[test]
    fn find_parent_distinguishes_top_level_and_missing() {
        let f = sample();
        assert_eq!(find_parent(&f, "a"), ParentLookup::TopLevel);
        match find_parent(&f, "a1x") {
            ParentLookup::Parent(p) => assert_eq!(p.id, "a1"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(find_parent(&f, "nope"), ParentLookup::NotFound);
    }

    #[test]
    fn remove_detaches_whole_subtree() {
        let mut f = sample();
        let removed = remove(&mut f, "a1").unwrap();
        assert_eq!(removed.subtree_len(), 2);
        assert!(!contains(&f, "a1x"));
        assert_eq!(count(&f), 3);
    }

    #[test]
    fn walk_is_pre_order() {
        let f = sample();
        let ids: Vec<&str> = walk(&f).map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a1", "a1x", "a2", "b"]);
    }

    #[test]
    fn walk_with_ancestors_builds_trails() {
        let f = sample();
        let trails = walk_with_ancestors(&f);
        let (node, trail) = &trails[2];
        assert_eq!(node.id, "a1x");
        assert_eq!(trail, &vec!["A", "A1"]);
    }
}
