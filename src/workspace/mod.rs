//! Multiple named forests ("tabs"), their view state, and persistence.

pub mod blob;
pub mod filter;
pub mod presets;
pub mod tabs;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore, StoreError};
pub use filter::{ancestors_of_matches, filter_forest};
pub use presets::PresetKey;
pub use tabs::{Tab, TabKind, TabManager, UiState, WorkspaceError, WorkspaceSettings};
