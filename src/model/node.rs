//! KPI forest data shapes.
//!
//! Field names serialise in camelCase so that a JSON export can be read back by
//! any tool that speaks the same document shape (`isDetached`, `targetId`).

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::category::NodeCategory;

/// Suffix carried by relationship ids that were synthesized as the mirror of
/// another edge.
pub const REVERSE_SUFFIX: &str = "-reverse";

/// Environmental / Social / Governance tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Esg {
    E,
    S,
    G,
}

impl Esg {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::E => "E",
            Self::S => "S",
            Self::G => "G",
        }
    }

    /// Accepts `E`, `S`, `G` in either case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "E" | "e" => Some(Self::E),
            "S" | "s" => Some(Self::S),
            "G" | "g" => Some(Self::G),
            _ => None,
        }
    }
}

impl fmt::Display for Esg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GHG emission scope. Serialised as the bare number `1`, `2` or `3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Scope {
    Direct,
    Indirect,
    ValueChain,
}

impl Scope {
    pub fn number(self) -> u8 {
        match self {
            Self::Direct => 1,
            Self::Indirect => 2,
            Self::ValueChain => 3,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse::<u8>().ok().and_then(|n| Self::try_from(n).ok())
    }
}

impl TryFrom<u8> for Scope {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Direct),
            2 => Ok(Self::Indirect),
            3 => Ok(Self::ValueChain),
            other => Err(format!("emission scope must be 1, 2 or 3 (got {other})")),
        }
    }
}

impl From<Scope> for u8 {
    fn from(scope: Scope) -> Self {
        scope.number()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Layout coordinate of a detached node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A directed, optionally labelled link from the owning node to `target_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRelationship {
    pub id: String,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl NodeRelationship {
    /// True for edges synthesized as the mirror of a forward edge.
    pub fn is_reverse(&self) -> bool {
        self.id.ends_with(REVERSE_SUFFIX)
    }
}

/// A node in a KPI tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiNode {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esg: Option<Esg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Explicit category. When absent the category is inferred from id and name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<NodeCategory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<KpiNode>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_detached: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<NodeRelationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl KpiNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit: None,
            esg: None,
            scope: None,
            category: None,
            children: Vec::new(),
            is_detached: false,
            relationships: Vec::new(),
            markers: Vec::new(),
            position: None,
        }
    }

    /// A fresh `metric` leaf carrying the given editable fields.
    pub fn metric(fields: &NodeFields) -> Self {
        let mut node = Self::new(new_node_id(), fields.name.clone());
        node.category = Some(NodeCategory::Metric);
        fields.apply_to(&mut node);
        node
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_esg(mut self, esg: Esg) -> Self {
        self.esg = Some(esg);
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_child(mut self, child: KpiNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(KpiNode::subtree_len).sum::<usize>()
    }

    /// True when `id` names a node strictly below this one.
    pub fn has_descendant(&self, id: &str) -> bool {
        self.children
            .iter()
            .any(|c| c.id == id || c.has_descendant(id))
    }

    pub fn has_link_to(&self, target_id: &str) -> bool {
        self.relationships.iter().any(|r| r.target_id == target_id)
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| m == marker)
    }
}

/// The user-editable fields of a node: what Add and Edit accept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFields {
    pub name: String,
    pub unit: Option<String>,
    pub esg: Option<Esg>,
    pub scope: Option<Scope>,
}

impl NodeFields {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Overwrite the four editable fields. Blank units are stored as `None`.
    pub fn apply_to(&self, node: &mut KpiNode) {
        node.name = self.name.clone();
        node.unit = self
            .unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from);
        node.esg = self.esg;
        node.scope = self.scope;
    }
}

pub fn new_node_id() -> String {
    format!("node-{}", Uuid::new_v4().simple())
}

pub fn new_relationship_id() -> String {
    format!("rel-{}", Uuid::new_v4().simple())
}
