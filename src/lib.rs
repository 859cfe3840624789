//! Editor core for KPI trees: a forest of metric nodes with category-checked
//! reparenting, cross-links, tabbed workspaces and JSON / XMind interchange.

pub mod codec;
pub mod commands;
pub mod logging;
pub mod model;
pub mod parser;
pub mod project;
pub mod store;
pub mod workspace;

pub use codec::{CodecError, FileFormat, ImportReport, Imported, export_file, import_file};
pub use model::{Esg, KpiNode, NodeCategory, NodeFields, NodeRelationship, Position, Scope};
pub use store::{LinkRejection, MoveOutcome, MoveRejection, MoveTarget, TreeStore};
pub use workspace::{BlobStore, TabManager};
