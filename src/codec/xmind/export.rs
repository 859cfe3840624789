//! Forest → XMind sheets.

use std::collections::HashSet;

use super::model::{MarkerRef, RelationshipRecord, Sheet, Topic, TopicChildren};
use super::{PLACEHOLDER_ROOT_ID, PLACEHOLDER_ROOT_TITLE, esg_label, scope_label};
use crate::model::KpiNode;
use crate::store::{RelationshipEntry, export_relationships};

/// `"Name (unit)"` when a unit is present, else the bare name.
pub fn compose_title(name: &str, unit: Option<&str>) -> String {
    match unit.map(str::trim).filter(|u| !u.is_empty()) {
        Some(unit) => format!("{name} ({unit})"),
        None => name.to_string(),
    }
}

/// Build one sheet per attached top-level node.
///
/// Detached top-level nodes hang off the first sheet's root. The first sheet
/// carries every relationship in the forest; later sheets carry only the
/// relationships whose two ends both lie inside their own tree. With no
/// attached roots, a placeholder root topic holds the detached nodes.
pub fn to_sheets(forest: &[KpiNode]) -> Vec<Sheet> {
    let (attached, detached): (Vec<&KpiNode>, Vec<&KpiNode>) =
        forest.iter().partition(|n| !n.is_detached);
    let all_links = export_relationships(forest);
    let detached_topics: Vec<Topic> = detached.iter().map(|n| to_topic(n, true)).collect();

    if attached.is_empty() {
        if detached_topics.is_empty() {
            return Vec::new();
        }
        let root_topic = Topic {
            id: PLACEHOLDER_ROOT_ID.to_string(),
            class: Some("topic".to_string()),
            title: Some(PLACEHOLDER_ROOT_TITLE.to_string()),
            children: TopicChildren {
                detached: detached_topics,
                ..TopicChildren::default()
            },
            ..Topic::default()
        };
        return vec![Sheet {
            id: format!("sheet-{PLACEHOLDER_ROOT_ID}"),
            class: Some("sheet".to_string()),
            title: Some(PLACEHOLDER_ROOT_TITLE.to_string()),
            root_topic,
            relationships: all_links.iter().map(to_record).collect(),
        }];
    }

    let mut detached_topics = Some(detached_topics);
    attached
        .iter()
        .enumerate()
        .map(|(idx, root)| {
            let mut root_topic = to_topic(root, false);
            let relationships = if idx == 0 {
                if let Some(floating) = detached_topics.take() {
                    root_topic.children.detached = floating;
                }
                all_links.iter().map(to_record).collect()
            } else {
                let inside = subtree_ids(root);
                all_links
                    .iter()
                    .filter(|l| inside.contains(l.source.as_str()) && inside.contains(l.target.as_str()))
                    .map(to_record)
                    .collect()
            };
            Sheet {
                id: format!("sheet-{}", root.id),
                class: Some("sheet".to_string()),
                title: Some(root.name.clone()),
                root_topic,
                relationships,
            }
        })
        .collect()
}

fn to_topic(node: &KpiNode, detached: bool) -> Topic {
    let mut labels = Vec::new();
    if let Some(esg) = node.esg {
        labels.push(esg_label(esg));
    }
    if let Some(scope) = node.scope {
        labels.push(scope_label(scope));
    }
    Topic {
        id: node.id.clone(),
        class: Some("topic".to_string()),
        title: Some(compose_title(&node.name, node.unit.as_deref())),
        attributed_title: None,
        position: if detached { node.position } else { None },
        markers: node
            .markers
            .iter()
            .map(|m| MarkerRef {
                marker_id: m.clone(),
            })
            .collect(),
        labels,
        children: TopicChildren {
            attached: node.children.iter().map(|c| to_topic(c, false)).collect(),
            ..TopicChildren::default()
        },
    }
}

fn to_record(link: &RelationshipEntry) -> RelationshipRecord {
    RelationshipRecord {
        id: link.id.clone(),
        end1_id: link.source.clone(),
        end2_id: link.target.clone(),
        title: link.label.clone(),
    }
}

fn subtree_ids(root: &KpiNode) -> HashSet<&str> {
    fn collect<'a>(node: &'a KpiNode, out: &mut HashSet<&'a str>) {
        out.insert(node.id.as_str());
        for child in &node.children {
            collect(child, out);
        }
    }
    let mut out = HashSet::new();
    collect(root, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Esg, NodeRelationship, Position, Scope};

    fn link(owner: &mut KpiNode, id: &str, target: &str, label: &str) {
        owner.relationships.push(NodeRelationship {
            id: id.into(),
            target_id: target.into(),
            label: Some(label.into()),
        });
    }

    #[test]
    fn compose_title_folds_unit() {
        assert_eq!(compose_title("Revenue", Some("$")), "Revenue ($)");
        assert_eq!(compose_title("Revenue", Some(" ")), "Revenue");
        assert_eq!(compose_title("Revenue", None), "Revenue");
    }

    #[test]
    fn one_sheet_per_attached_root_with_detached_on_first() {
        let mut floating = KpiNode::new("f", "Floating");
        floating.is_detached = true;
        floating.position = Some(Position { x: 1.0, y: 2.0 });
        let forest = vec![
            KpiNode::new("a", "A").with_child(KpiNode::new("a1", "A1")),
            floating,
            KpiNode::new("b", "B"),
        ];
        let sheets = to_sheets(&forest);
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].root_topic.id, "a");
        assert_eq!(sheets[0].root_topic.children.detached.len(), 1);
        assert_eq!(
            sheets[0].root_topic.children.detached[0].position,
            Some(Position { x: 1.0, y: 2.0 })
        );
        assert!(sheets[1].root_topic.children.detached.is_empty());
        assert_eq!(sheets[1].title.as_deref(), Some("B"));
    }

    #[test]
    fn first_sheet_carries_all_relationships() {
        let mut a = KpiNode::new("a", "A").with_child(KpiNode::new("a1", "A1"));
        let mut b = KpiNode::new("b", "B").with_child(KpiNode::new("b1", "B1"));
        link(&mut a, "cross", "b", "cross sheet");
        link(&mut b.children[0], "inner", "b", "inside b");
        b.relationships.push(NodeRelationship {
            id: "inner-reverse".into(),
            target_id: "b1".into(),
            label: Some("← inside b".into()),
        });
        let sheets = to_sheets(&[a, b]);

        let first: Vec<&str> = sheets[0].relationships.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(first, vec!["cross", "inner"]);
        let second: Vec<&str> = sheets[1].relationships.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(second, vec!["inner"]);
        assert_eq!(sheets[1].relationships[0].end1_id, "b1");
    }

    #[test]
    fn opposite_forward_edges_are_both_written() {
        let mut a = KpiNode::new("a", "A");
        let mut b = KpiNode::new("b", "B");
        link(&mut a, "r1", "b", "x");
        link(&mut b, "r1-reverse", "a", "← x");
        link(&mut b, "r2", "a", "y");
        let root = KpiNode::new("root", "Root").with_child(a).with_child(b);

        let sheets = to_sheets(&[root]);
        let records: Vec<(&str, &str, &str)> = sheets[0]
            .relationships
            .iter()
            .map(|r| (r.id.as_str(), r.end1_id.as_str(), r.end2_id.as_str()))
            .collect();
        assert_eq!(records, vec![("r1", "a", "b"), ("r2", "b", "a")]);
    }

    #[test]
    fn orphaned_mirror_is_written_in_its_own_direction() {
        let mut b = KpiNode::new("b", "B");
        link(&mut b, "r1-reverse", "a", "← x");
        let root = KpiNode::new("root", "Root")
            .with_child(KpiNode::new("a", "A"))
            .with_child(b);

        let sheets = to_sheets(&[root]);
        assert_eq!(sheets[0].relationships.len(), 1);
        assert_eq!(sheets[0].relationships[0].end1_id, "b");
        assert_eq!(sheets[0].relationships[0].end2_id, "a");
    }

    #[test]
    fn detached_only_forest_gets_placeholder_root() {
        let mut floating = KpiNode::new("f", "Floating");
        floating.is_detached = true;
        let sheets = to_sheets(&[floating]);
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].root_topic.id, PLACEHOLDER_ROOT_ID);
        assert_eq!(sheets[0].root_topic.title.as_deref(), Some("Root"));
        assert_eq!(sheets[0].root_topic.children.detached[0].id, "f");
        assert!(sheets[0].root_topic.children.attached.is_empty());
    }

    #[test]
    fn empty_forest_has_no_sheets() {
        assert!(to_sheets(&[]).is_empty());
    }

    #[test]
    fn markers_and_tags_are_emitted() {
        let mut node = KpiNode::new("a", "Emissions")
            .with_unit("tCO2e")
            .with_esg(Esg::E)
            .with_scope(Scope::Indirect);
        node.markers = vec!["flag-red".into()];
        let sheets = to_sheets(&[node]);
        let topic = &sheets[0].root_topic;
        assert_eq!(topic.title.as_deref(), Some("Emissions (tCO2e)"));
        assert_eq!(topic.markers[0].marker_id, "flag-red");
        assert_eq!(topic.labels, vec!["esg:E".to_string(), "scope:2".to_string()]);
        assert_eq!(topic.position, None);
    }
}
