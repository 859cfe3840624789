//! XMind sheets → forest.

use std::collections::HashSet;

use tracing::warn;

use super::model::{RelationshipRecord, Sheet, Topic};
use super::{PLACEHOLDER_ROOT_ID, TopicTag, parse_label};
use crate::model::{KpiNode, forest};
use crate::store::{DEFAULT_REVERSE_LABEL_PREFIX, attach_link_pair};

/// Marker added to nodes that came from a topic's `summary` grouping.
pub const SUMMARY_MARKER: &str = "summary";

/// What an import produced, beyond the forest itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub sheets: usize,
    pub nodes: usize,
    /// Relationship records attached to the forest.
    pub relationships: usize,
    /// Records dropped because an endpoint was missing.
    pub dropped_relationships: usize,
}

/// Split `"Revenue ($)"` into `("Revenue", Some("$"))`.
///
/// Only a trailing parenthesised group preceded by whitespace counts as a
/// unit, and neither part may be empty.
pub fn split_title(title: &str) -> (String, Option<String>) {
    let trimmed = title.trim();
    let whole = || (trimmed.to_string(), None);
    let Some(body) = trimmed.strip_suffix(')') else {
        return whole();
    };
    let Some(open) = body.rfind('(') else {
        return whole();
    };
    let (name, unit) = (&body[..open], &body[open + 1..]);
    if !name.ends_with(char::is_whitespace) || unit.contains(['(', ')']) {
        return whole();
    }
    let (name, unit) = (name.trim_end(), unit.trim());
    if name.is_empty() || unit.is_empty() {
        return whole();
    }
    (name.to_string(), Some(unit.to_string()))
}

/// Convert every sheet, then resolve relationship records against the
/// complete forest.
pub fn from_sheets(sheets: &[Sheet]) -> (Vec<KpiNode>, ImportReport) {
    let mut nodes: Vec<KpiNode> = Vec::new();
    let mut records: Vec<&RelationshipRecord> = Vec::new();
    let mut seen_records: HashSet<&str> = HashSet::new();

    for sheet in sheets {
        let mut floating = Vec::new();
        collect_detached(&sheet.root_topic, &mut floating);
        if sheet.root_topic.id != PLACEHOLDER_ROOT_ID {
            nodes.push(to_node(&sheet.root_topic));
        }
        nodes.extend(floating);

        for record in &sheet.relationships {
            if seen_records.insert(record.id.as_str()) {
                records.push(record);
            }
        }
    }

    let mut report = ImportReport {
        sheets: sheets.len(),
        nodes: forest::count(&nodes),
        ..ImportReport::default()
    };
    for record in records {
        let attached = attach_link_pair(
            &mut nodes,
            &record.end1_id,
            &record.end2_id,
            &record.id,
            record.title.as_deref(),
            DEFAULT_REVERSE_LABEL_PREFIX,
        );
        if attached {
            report.relationships += 1;
        } else {
            warn!(
                id = %record.id,
                end1 = %record.end1_id,
                end2 = %record.end2_id,
                "dropping relationship with missing endpoint"
            );
            report.dropped_relationships += 1;
        }
    }
    (nodes, report)
}

fn to_node(topic: &Topic) -> KpiNode {
    let (name, unit) = split_title(&topic.best_title());
    let mut node = KpiNode::new(topic.id.clone(), name);
    node.unit = unit;
    node.markers = topic.markers.iter().map(|m| m.marker_id.clone()).collect();
    for label in &topic.labels {
        match parse_label(label) {
            Some(TopicTag::Esg(esg)) => node.esg = Some(esg),
            Some(TopicTag::Scope(scope)) => node.scope = Some(scope),
            None => {}
        }
    }
    for child in &topic.children.attached {
        node.children.push(to_node(child));
    }
    for summary in &topic.children.summary {
        let mut child = to_node(summary);
        if !child.has_marker(SUMMARY_MARKER) {
            child.markers.push(SUMMARY_MARKER.to_string());
        }
        node.children.push(child);
    }
    node
}

/// Lift every detached topic, at any depth, to a top-level detached node.
fn collect_detached(topic: &Topic, out: &mut Vec<KpiNode>) {
    for floating in &topic.children.detached {
        let mut node = to_node(floating);
        node.is_detached = true;
        node.position = floating.position;
        out.push(node);
        collect_detached(floating, out);
    }
    for child in topic.children.attached.iter().chain(&topic.children.summary) {
        collect_detached(child, out);
    }
}
