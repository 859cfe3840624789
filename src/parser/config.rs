//! Parser and writer for `kpitree/config.kpi`.
//!
//! The file is a list of `key: value` lines. Blank lines and lines starting
//! with `#` are ignored. Every key is optional; missing keys keep their
//! defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::codec::FileFormat;
use crate::project;
use crate::store::{DEFAULT_REVERSE_LABEL_PREFIX, StoreSettings};
use crate::workspace::{PresetKey, WorkspaceSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub move_error_ttl_secs: u64,
    pub default_preset: PresetKey,
    pub reverse_label_prefix: String,
    pub export_format: FileFormat,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            move_error_ttl_secs: 5,
            default_preset: PresetKey::Financial,
            reverse_label_prefix: DEFAULT_REVERSE_LABEL_PREFIX.to_string(),
            export_format: FileFormat::Xmind,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            move_error_ttl: Duration::from_secs(self.move_error_ttl_secs),
            reverse_label_prefix: self.reverse_label_prefix.clone(),
        }
    }

    pub fn workspace_settings(&self) -> WorkspaceSettings {
        WorkspaceSettings {
            default_preset: self.default_preset,
            store: self.store_settings(),
        }
    }
}

pub fn parse(input: &str) -> Result<Config> {
    let mut cfg = Config::default();
    for (i, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            bail!("expected `key: value` at line {}", i + 1);
        };
        let (key, value) = (key.trim(), value.trim());
        if value.is_empty() {
            bail!("missing value for '{}' at line {}", key, i + 1);
        }
        match key {
            "move_error_ttl_secs" => {
                cfg.move_error_ttl_secs = value.parse().with_context(|| {
                    format!("move_error_ttl_secs must be a whole number (line {})", i + 1)
                })?;
            }
            "default_preset" => {
                cfg.default_preset = match PresetKey::parse(value) {
                    Some(p) => p,
                    None => bail!("unknown preset '{}' at line {}", value, i + 1),
                };
            }
            "reverse_label_prefix" => cfg.reverse_label_prefix = value.to_string(),
            "export_format" => {
                cfg.export_format = match FileFormat::parse(value) {
                    Some(f) => f,
                    None => bail!("export_format must be json or xmind (line {})", i + 1),
                };
            }
            "log_level" => cfg.log_level = value.to_string(),
            other => bail!("unknown config key '{}' at line {}", other, i + 1),
        }
    }
    Ok(cfg)
}

/// Write `cfg` as a commented config file.
pub fn serialize(cfg: &Config) -> String {
    format!(
        "\
# kpitree configuration
#
# Seconds a rejected move stays visible.
move_error_ttl_secs: {}
# Tab selected when no other tab can be (financial, esg, operations).
default_preset: {}
# Prefix for the label of a link's mirrored edge.
reverse_label_prefix: {}
# Format used by `kpitree export` when the path has no .json/.xmind extension.
export_format: {}
# Log filter when KPITREE_LOG is unset (error, warn, info, debug, trace).
log_level: {}
",
        cfg.move_error_ttl_secs,
        cfg.default_preset,
        cfg.reverse_label_prefix,
        cfg.export_format.extension(),
        cfg.log_level,
    )
}

/// Write `cfg` to the config file under `root`.
pub fn save(root: &Path, cfg: &Config) -> Result<()> {
    let path = project::config_path(root);
    fs::write(&path, serialize(cfg)).with_context(|| format!("cannot write {}", path.display()))
}

/// Read the config under `root`, or defaults when the file does not exist.
pub fn load(root: &Path) -> Result<Config> {
    let path = project::config_path(root);
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    parse(&content).with_context(|| format!("invalid {}", path.display()))
}
