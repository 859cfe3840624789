//! The tab manager: several independently editable forests, persisted
//! write-through to a [`BlobStore`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::blob::{BlobStore, StoreError};
use super::filter::{ancestors_of_matches, filter_forest};
use super::presets::PresetKey;
use crate::model::{KpiNode, forest};
use crate::store::{StoreSettings, TreeStore};

/// Key of the single entry holding the tab list and the active tab id.
pub const WORKSPACE_KEY: &str = "kpitree.workspace";
/// Prefix of the per-(feature, view) last-modified entries.
pub const DIRTY_KEY_PREFIX: &str = "kpitree.dirty";
/// Feature name used when a tab's forest changes.
pub const TREE_FEATURE: &str = "tree";

const UNTITLED: &str = "Untitled";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("no tab with id '{0}'")]
    TabNotFound(String),
    #[error("'{name}' is a preset tab and cannot be {action}")]
    PresetTab { name: String, action: &'static str },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TabKind {
    Preset { preset: PresetKey },
    Custom,
}

/// Per-tab view state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    #[serde(default)]
    pub expanded: BTreeSet<String>,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub esg_only: bool,
}

#[derive(Debug, Clone)]
pub struct Tab {
    pub id: String,
    pub name: String,
    pub kind: TabKind,
    pub ui: UiState,
    store: TreeStore,
}

impl Tab {
    fn preset(key: PresetKey, settings: &StoreSettings) -> Self {
        Self {
            id: preset_tab_id(key),
            name: key.title().to_string(),
            kind: TabKind::Preset { preset: key },
            ui: UiState::default(),
            store: TreeStore::with_settings(key.dataset(), settings.clone()),
        }
    }

    fn custom(name: &str, forest: Vec<KpiNode>, settings: &StoreSettings) -> Self {
        Self {
            id: new_tab_id(),
            name: tab_name(name),
            kind: TabKind::Custom,
            ui: UiState::default(),
            store: TreeStore::with_settings(forest, settings.clone()),
        }
    }

    pub fn is_preset(&self) -> bool {
        matches!(self.kind, TabKind::Preset { .. })
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    pub fn forest(&self) -> &[KpiNode] {
        self.store.forest()
    }

    /// The forest as the tab shows it, after search and ESG filtering.
    pub fn visible_forest(&self) -> Vec<KpiNode> {
        filter_forest(self.forest(), &self.ui.search, self.ui.esg_only)
    }
}

pub fn preset_tab_id(key: PresetKey) -> String {
    format!("preset-{key}")
}

fn new_tab_id() -> String {
    format!("tab-{}", Uuid::new_v4().simple())
}

fn tab_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        UNTITLED.to_string()
    } else {
        name.to_string()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTab {
    id: String,
    name: String,
    kind: TabKind,
    /// Present for custom tabs only; presets are rebuilt from their dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Vec<KpiNode>>,
    #[serde(default)]
    ui: UiState,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedWorkspace {
    tabs: Vec<PersistedTab>,
    active_tab_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSettings {
    /// Tab selected when nothing else can be.
    pub default_preset: PresetKey,
    pub store: StoreSettings,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            default_preset: PresetKey::Financial,
            store: StoreSettings::default(),
        }
    }
}

pub struct TabManager<S: BlobStore> {
    tabs: Vec<Tab>,
    active: usize,
    blobs: S,
    settings: WorkspaceSettings,
}

impl<S: BlobStore> TabManager<S> {
    /// Load the workspace from `blobs`, falling back to one tab per preset
    /// when nothing usable is stored.
    pub fn restore(blobs: S, settings: WorkspaceSettings) -> Self {
        let stored = match blobs.get(WORKSPACE_KEY) {
            Ok(Some(text)) => match serde_json::from_str::<PersistedWorkspace>(&text) {
                Ok(ws) => Some(ws),
                Err(e) => {
                    warn!(error = %e, "stored workspace is unreadable; using presets");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "cannot read stored workspace; using presets");
                None
            }
        };

        let mut manager = Self {
            tabs: Vec::new(),
            active: 0,
            blobs,
            settings,
        };
        match stored {
            Some(ws) if !ws.tabs.is_empty() => manager.load(ws),
            _ => manager.load_defaults(),
        }
        manager
    }

    fn load(&mut self, ws: PersistedWorkspace) {
        let store_settings = self.settings.store.clone();
        self.tabs = ws
            .tabs
            .into_iter()
            .map(|t| {
                let forest = match t.kind {
                    TabKind::Preset { preset } => preset.dataset(),
                    TabKind::Custom => t.data.unwrap_or_default(),
                };
                Tab {
                    id: t.id,
                    name: t.name,
                    kind: t.kind,
                    ui: t.ui,
                    store: TreeStore::with_settings(forest, store_settings.clone()),
                }
            })
            .collect();
        self.active = self
            .index_of(&ws.active_tab_id)
            .unwrap_or_else(|| self.default_index());
        debug!(tabs = self.tabs.len(), active = %self.active_tab().id, "workspace restored");
    }

    fn load_defaults(&mut self) {
        self.tabs = PresetKey::ALL
            .into_iter()
            .map(|k| Tab::preset(k, &self.settings.store))
            .collect();
        self.active = self.default_index();
        debug!("workspace initialised from presets");
    }

    /// Index of the default preset tab, else the first tab.
    fn default_index(&self) -> usize {
        let id = preset_tab_id(self.settings.default_preset);
        self.index_of(&id).unwrap_or(0)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    fn require(&self, id: &str) -> Result<usize, WorkspaceError> {
        self.index_of(id)
            .ok_or_else(|| WorkspaceError::TabNotFound(id.to_string()))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn active_tab(&self) -> &Tab {
        &self.tabs[self.active]
    }

    pub fn active_forest(&self) -> &[KpiNode] {
        self.active_tab().forest()
    }

    pub fn tab(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    /// Resolve a tab by id, or by name when no id matches.
    pub fn find_tab(&self, id_or_name: &str) -> Option<&Tab> {
        self.tab(id_or_name)
            .or_else(|| self.tabs.iter().find(|t| t.name == id_or_name))
    }

    pub fn blobs(&self) -> &S {
        &self.blobs
    }

    pub fn settings(&self) -> &WorkspaceSettings {
        &self.settings
    }

    // -----------------------------------------------------------------------
    // Tab lifecycle
    // -----------------------------------------------------------------------

    /// Open a new empty custom tab and activate it.
    pub fn create_tab(&mut self, name: &str) -> Result<String, WorkspaceError> {
        self.open_tab(name, Vec::new())
    }

    /// Open a custom tab holding `forest` (an import, typically) and activate it.
    pub fn open_tab(&mut self, name: &str, forest: Vec<KpiNode>) -> Result<String, WorkspaceError> {
        let tab = Tab::custom(name, forest, &self.settings.store);
        let id = tab.id.clone();
        info!(id = %id, name = %tab.name, nodes = tab.store.node_count(), "tab opened");
        self.tabs.push(tab);
        self.active = self.tabs.len() - 1;
        self.persist()?;
        Ok(id)
    }

    pub fn switch_tab(&mut self, id: &str) -> Result<(), WorkspaceError> {
        self.active = self.require(id)?;
        self.persist()
    }

    pub fn rename_tab(&mut self, id: &str, name: &str) -> Result<(), WorkspaceError> {
        let idx = self.require(id)?;
        self.reject_preset(idx, "renamed")?;
        self.tabs[idx].name = tab_name(name);
        self.persist()
    }

    /// Close a custom tab. When it was active, the tab now at the same index
    /// (or the one before, if it was last) becomes active.
    pub fn close_tab(&mut self, id: &str) -> Result<(), WorkspaceError> {
        let idx = self.require(id)?;
        self.reject_preset(idx, "closed")?;
        self.tabs.remove(idx);

        if self.tabs.is_empty() {
            self.tabs
                .push(Tab::preset(self.settings.default_preset, &self.settings.store));
            self.active = 0;
        } else if idx == self.active {
            self.active = idx.min(self.tabs.len() - 1);
        } else if idx < self.active {
            self.active -= 1;
        }
        info!(id, "tab closed");
        self.persist()
    }

    /// Deep-copy a tab's data and view state into a new custom tab placed
    /// right after it, and activate the copy.
    pub fn duplicate_tab(&mut self, id: &str) -> Result<String, WorkspaceError> {
        let idx = self.require(id)?;
        let source = &self.tabs[idx];
        let copy = Tab {
            id: new_tab_id(),
            name: format!("{} (copy)", source.name),
            kind: TabKind::Custom,
            ui: source.ui.clone(),
            store: TreeStore::with_settings(source.forest().to_vec(), self.settings.store.clone()),
        };
        let new_id = copy.id.clone();
        self.tabs.insert(idx + 1, copy);
        self.active = idx + 1;
        self.persist()?;
        Ok(new_id)
    }

    fn reject_preset(&self, idx: usize, action: &'static str) -> Result<(), WorkspaceError> {
        let tab = &self.tabs[idx];
        if tab.is_preset() {
            return Err(WorkspaceError::PresetTab {
                name: tab.name.clone(),
                action,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Run `f` against the active tab's store. Persists and stamps the tab
    /// as modified only when the forest changed.
    pub fn edit_active<R>(
        &mut self,
        f: impl FnOnce(&mut TreeStore) -> R,
    ) -> Result<R, WorkspaceError> {
        let tab = &mut self.tabs[self.active];
        let before = tab.store.forest().to_vec();
        let out = f(&mut tab.store);
        if tab.store.forest() == before.as_slice() {
            debug!(tab = %tab.id, "edit left the forest unchanged");
            return Ok(out);
        }
        let view = tab.id.clone();
        self.persist()?;
        self.mark_dirty(TREE_FEATURE, &view)?;
        Ok(out)
    }

    /// Replace the active tab's whole forest, e.g. with a freshly imported one.
    pub fn replace_active_forest(&mut self, forest: Vec<KpiNode>) -> Result<(), WorkspaceError> {
        self.edit_active(|store| store.replace_forest(forest))
    }

    // -----------------------------------------------------------------------
    // View state
    // -----------------------------------------------------------------------

    fn edit_ui<R>(&mut self, f: impl FnOnce(&mut UiState, &[KpiNode]) -> R) -> Result<R, WorkspaceError> {
        let tab = &mut self.tabs[self.active];
        let out = f(&mut tab.ui, tab.store.forest());
        self.persist()?;
        Ok(out)
    }

    /// Flip one node's expansion. Returns the new state.
    pub fn toggle_expanded(&mut self, node_id: &str) -> Result<bool, WorkspaceError> {
        self.edit_ui(|ui, _| {
            if ui.expanded.remove(node_id) {
                false
            } else {
                ui.expanded.insert(node_id.to_string());
                true
            }
        })
    }

    pub fn expand_all(&mut self) -> Result<(), WorkspaceError> {
        self.edit_ui(|ui, nodes| {
            ui.expanded = forest::walk(nodes)
                .filter(|n| n.has_children())
                .map(|n| n.id.clone())
                .collect();
        })
    }

    pub fn collapse_all(&mut self) -> Result<(), WorkspaceError> {
        self.edit_ui(|ui, _| ui.expanded.clear())
    }

    /// Set the search term and expand every ancestor of a match.
    pub fn set_search(&mut self, term: &str) -> Result<(), WorkspaceError> {
        self.edit_ui(|ui, nodes| {
            ui.search = term.trim().to_string();
            ui.expanded
                .extend(ancestors_of_matches(nodes, &ui.search, ui.esg_only));
        })
    }

    pub fn set_esg_only(&mut self, esg_only: bool) -> Result<(), WorkspaceError> {
        self.edit_ui(|ui, nodes| {
            ui.esg_only = esg_only;
            ui.expanded
                .extend(ancestors_of_matches(nodes, &ui.search, ui.esg_only));
        })
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write the tab list and active tab id through to the blob store.
    pub fn persist(&mut self) -> Result<(), WorkspaceError> {
        let ws = PersistedWorkspace {
            tabs: self
                .tabs
                .iter()
                .map(|t| PersistedTab {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    kind: t.kind,
                    data: match t.kind {
                        TabKind::Preset { .. } => None,
                        TabKind::Custom => Some(t.forest().to_vec()),
                    },
                    ui: t.ui.clone(),
                })
                .collect(),
            active_tab_id: self.active_tab().id.clone(),
        };
        let text = serde_json::to_string(&ws).map_err(StoreError::from)?;
        self.blobs.set(WORKSPACE_KEY, &text)?;
        Ok(())
    }

    /// Record "now" as the last modification of `(feature, view)`.
    pub fn mark_dirty(&mut self, feature: &str, view: &str) -> Result<(), WorkspaceError> {
        let stamp = Utc::now().to_rfc3339();
        self.blobs.set(&dirty_key(feature, view), &stamp)?;
        Ok(())
    }

    pub fn last_modified(&self, feature: &str, view: &str) -> Result<Option<DateTime<Utc>>, WorkspaceError> {
        let Some(text) = self.blobs.get(&dirty_key(feature, view))? else {
            return Ok(None);
        };
        Ok(DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)))
    }
}

fn dirty_key(feature: &str, view: &str) -> String {
    format!("{DIRTY_KEY_PREFIX}:{feature}:{view}")
}
