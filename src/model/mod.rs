pub mod category;
pub mod forest;
pub mod node;

pub use category::{NodeCategory, infer_category, is_legal_parent};
pub use node::{Esg, KpiNode, NodeFields, NodeRelationship, Position, Scope};

/// A forest is the ordered list of root nodes of one workspace tab.
pub type Forest = Vec<KpiNode>;
