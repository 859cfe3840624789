//! Reparenting with category and cycle checks.

use thiserror::Error;
use tracing::{debug, warn};

use super::{ROOT_SENTINEL_ID, TreeStore};
use crate::model::forest;
use crate::model::{NodeCategory, infer_category, is_legal_parent};

/// Destination of a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveTarget {
    /// Become a new top-level node.
    TopLevel,
    /// Become the last child of this node.
    Node(String),
}

impl MoveTarget {
    /// `None`, an empty string and the root sentinel all mean "top level".
    pub fn from_id(id: Option<&str>) -> Self {
        match id.map(str::trim) {
            None | Some("") | Some(ROOT_SENTINEL_ID) => Self::TopLevel,
            Some(id) => Self::Node(id.to_string()),
        }
    }

    fn node_id(&self) -> Option<&str> {
        match self {
            Self::TopLevel => None,
            Self::Node(id) => Some(id),
        }
    }
}

/// Why a move was refused. `Display` is the user-facing reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveRejection {
    #[error("cannot move a node into itself")]
    SelfMove,
    #[error("node '{0}' not found")]
    NodeNotFound(String),
    #[error("target '{0}' not found")]
    TargetNotFound(String),
    #[error("cannot move '{node}' under its own descendant '{target}'")]
    Cycle { node: String, target: String },
    #[error("root nodes cannot be moved")]
    ImmovableRoot,
    #[error("a {child} node cannot be placed under a {parent} node")]
    IllegalPlacement {
        child: NodeCategory,
        parent: NodeCategory,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The target id did not resolve; nothing happened and no error is shown.
    TargetMissing,
}

impl TreeStore {
    /// Check whether `node_id` may become a child of `target`.
    ///
    /// Checks run in a fixed order: self-move, unknown node, cycle, immovable
    /// root, unknown target, then the category table.
    pub fn validate_move(&self, node_id: &str, target: &MoveTarget) -> Result<(), MoveRejection> {
        if target.node_id() == Some(node_id) {
            return Err(MoveRejection::SelfMove);
        }
        let node = self
            .find_node_by_id(node_id)
            .ok_or_else(|| MoveRejection::NodeNotFound(node_id.to_string()))?;
        if let Some(target_id) = target.node_id() {
            if node.has_descendant(target_id) {
                return Err(MoveRejection::Cycle {
                    node: node_id.to_string(),
                    target: target_id.to_string(),
                });
            }
        }
        let child = infer_category(node);
        if child == NodeCategory::Root {
            return Err(MoveRejection::ImmovableRoot);
        }
        let parent = match target.node_id() {
            None => NodeCategory::Root,
            Some(target_id) => self
                .find_node_by_id(target_id)
                .map(infer_category)
                .ok_or_else(|| MoveRejection::TargetNotFound(target_id.to_string()))?,
        };
        if !is_legal_parent(child, parent) {
            return Err(MoveRejection::IllegalPlacement { child, parent });
        }
        Ok(())
    }

    /// Move the subtree rooted at `node_id` to the end of `target`'s children
    /// (or to the end of the forest for [`MoveTarget::TopLevel`]).
    ///
    /// A rejection is also kept as the transient move error. An unknown target
    /// is a silent no-op.
    pub fn move_node(
        &mut self,
        node_id: &str,
        target: &MoveTarget,
    ) -> Result<MoveOutcome, MoveRejection> {
        match self.validate_move(node_id, target) {
            Ok(()) => {}
            Err(MoveRejection::TargetNotFound(id)) => {
                debug!(node = node_id, target = %id, "move target not found, ignoring");
                return Ok(MoveOutcome::TargetMissing);
            }
            Err(rejection) => {
                warn!(node = node_id, reason = %rejection, "move rejected");
                self.raise_move_error(rejection.to_string());
                return Err(rejection);
            }
        }

        let Some(mut subtree) = forest::remove(&mut self.forest, node_id) else {
            return Err(MoveRejection::NodeNotFound(node_id.to_string()));
        };
        match target {
            MoveTarget::TopLevel => self.forest.push(subtree),
            MoveTarget::Node(target_id) => {
                subtree.is_detached = false;
                subtree.position = None;
                match forest::find_mut(&mut self.forest, target_id) {
                    Some(parent) => parent.children.push(subtree),
                    // Validation guarantees the target survives the removal.
                    None => self.forest.push(subtree),
                }
            }
        }
        self.move_error = None;
        debug!(node = node_id, ?target, "node moved");
        Ok(MoveOutcome::Moved)
    }
}
