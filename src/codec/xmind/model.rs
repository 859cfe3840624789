//! The XMind Zen document shapes (`content.json`, `metadata.json`,
//! `manifest.json`).
//!
//! Only the fields this crate reads or writes are modelled. Everything else in
//! a real XMind file is ignored on import.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Position;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub root_topic: Topic,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelationshipRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Rich-text title runs, preferred over `title` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributed_title: Option<Vec<TitleRun>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<MarkerRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "TopicChildren::is_empty")]
    pub children: TopicChildren,
}

impl Topic {
    /// The most complete title the topic carries: joined rich-text runs, then
    /// the plain title, then an empty string.
    pub fn best_title(&self) -> String {
        if let Some(runs) = &self.attributed_title {
            let joined: String = runs.iter().map(|r| r.text.as_str()).collect();
            if !joined.trim().is_empty() {
                return joined;
            }
        }
        self.title.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRun {
    pub text: String,
}

/// The three child groupings a topic can have.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicChildren {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attached: Vec<Topic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detached: Vec<Topic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summary: Vec<Topic>,
}

impl TopicChildren {
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty() && self.detached.is_empty() && self.summary.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRef {
    pub marker_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRecord {
    pub id: String,
    pub end1_id: String,
    pub end2_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub creator: Creator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    pub version: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            creator: Creator {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "file-entries")]
    pub file_entries: BTreeMap<String, FileEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        let file_entries = [super::CONTENT_JSON, super::METADATA_JSON]
            .into_iter()
            .map(|name| (name.to_string(), FileEntry::default()))
            .collect();
        Self { file_entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zen_topic_with_all_groupings() {
        let json = r#"{
            "id": "t1",
            "class": "topic",
            "title": "Revenue ($)",
            "markers": [{"markerId": "priority-1"}],
            "children": {
                "attached": [{"id": "t2", "title": "Volume"}],
                "summary": [{"id": "t3", "title": "Total"}]
            },
            "unknownField": 42
        }"#;
        let topic: Topic = serde_json::from_str(json).unwrap();
        assert_eq!(topic.best_title(), "Revenue ($)");
        assert_eq!(topic.markers[0].marker_id, "priority-1");
        assert_eq!(topic.children.attached.len(), 1);
        assert_eq!(topic.children.summary.len(), 1);
        assert!(topic.children.detached.is_empty());
    }

    #[test]
    fn attributed_title_wins_over_plain_title() {
        let topic = Topic {
            title: Some("plain".into()),
            attributed_title: Some(vec![
                TitleRun { text: "Rich ".into() },
                TitleRun { text: "Title".into() },
            ]),
            ..Topic::default()
        };
        assert_eq!(topic.best_title(), "Rich Title");
    }

    #[test]
    fn blank_attributed_title_falls_back() {
        let topic = Topic {
            title: Some("plain".into()),
            attributed_title: Some(vec![TitleRun { text: " ".into() }]),
            ..Topic::default()
        };
        assert_eq!(topic.best_title(), "plain");
    }

    #[test]
    fn manifest_serialises_with_dashed_key() {
        let json = serde_json::to_string(&Manifest::default()).unwrap();
        assert_eq!(
            json,
            r#"{"file-entries":{"content.json":{},"metadata.json":{}}}"#
        );
    }

    #[test]
    fn empty_children_are_omitted() {
        let topic = Topic {
            id: "t".into(),
            title: Some("T".into()),
            ..Topic::default()
        };
        let json = serde_json::to_string(&topic).unwrap();
        assert_eq!(json, r#"{"id":"t","title":"T"}"#);
    }
}
