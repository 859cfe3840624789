//! Reading and writing forests as files.
//!
//! Two formats are supported: plain JSON (`.json`) and XMind Zen archives
//! (`.xmind`). The format is chosen from the file extension.

pub mod json;
pub mod xmind;

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::model::KpiNode;
pub use xmind::ImportReport;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("expected a JSON array of nodes, found {found}")]
    NotAnArray { found: &'static str },
    #[error("node #{index} is malformed")]
    MalformedNode {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("archive is missing {0}")]
    MissingMember(&'static str),
    #[error("legacy XML XMind files are not supported; re-save the map in a current XMind version")]
    LegacyXmlUnsupported,
    #[error("invalid JSON")]
    Json(#[from] serde_json::Error),
    #[error("invalid archive")]
    Archive(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("unsupported file type '{0}' (expected .json or .xmind)")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Xmind,
}

impl FileFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "xmind" => Some(Self::Xmind),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, CodecError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::parse(ext).ok_or_else(|| CodecError::UnknownFormat(path.display().to_string()))
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xmind => "xmind",
        }
    }
}

/// A forest read from disk, named after the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Imported {
    pub name: String,
    pub forest: Vec<KpiNode>,
    pub report: ImportReport,
}

pub fn import_file(path: &Path) -> Result<Imported, CodecError> {
    let format = FileFormat::from_path(path)?;
    let (forest, report) = match format {
        FileFormat::Json => {
            let forest = json::deserialize(&fs::read_to_string(path)?)?;
            let report = ImportReport {
                nodes: crate::model::forest::count(&forest),
                ..ImportReport::default()
            };
            (forest, report)
        }
        FileFormat::Xmind => xmind::import_bytes(&fs::read(path)?)?,
    };
    if report.dropped_relationships > 0 {
        warn!(
            path = %path.display(),
            dropped = report.dropped_relationships,
            "some relationships could not be resolved"
        );
    }
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Imported")
        .to_string();
    info!(path = %path.display(), nodes = report.nodes, "imported");
    Ok(Imported {
        name,
        forest,
        report,
    })
}

pub fn export_file(path: &Path, forest: &[KpiNode], format: FileFormat) -> Result<(), CodecError> {
    match format {
        FileFormat::Json => fs::write(path, json::serialize(forest)?)?,
        FileFormat::Xmind => fs::write(path, xmind::export_bytes(forest)?)?,
    }
    info!(path = %path.display(), ?format, "exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;

    fn forest() -> Vec<KpiNode> {
        vec![KpiNode::new("root", "Root").with_child(KpiNode::new("rev-1", "Revenue").with_unit("$"))]
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(FileFormat::from_path(&PathBuf::from("a/b.json")).unwrap(), FileFormat::Json);
        assert_eq!(FileFormat::from_path(&PathBuf::from("map.XMIND")).unwrap(), FileFormat::Xmind);
        assert!(matches!(
            FileFormat::from_path(&PathBuf::from("notes.txt")),
            Err(CodecError::UnknownFormat(_))
        ));
        assert!(FileFormat::from_path(&PathBuf::from("no_extension")).is_err());
    }

    #[test]
    fn json_file_round_trip_names_tab_after_stem() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Plant KPIs.json");
        export_file(&path, &forest(), FileFormat::Json).unwrap();

        let imported = import_file(&path).unwrap();
        assert_eq!(imported.name, "Plant KPIs");
        assert_eq!(imported.forest, forest());
        assert_eq!(imported.report.nodes, 2);
    }

    #[test]
    fn xmind_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.xmind");
        export_file(&path, &forest(), FileFormat::Xmind).unwrap();

        let imported = import_file(&path).unwrap();
        assert_eq!(imported.name, "board");
        assert_eq!(imported.forest, forest());
        assert_eq!(imported.report.sheets, 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = import_file(&dir.path().join("gone.json")).unwrap_err();
        assert!(matches!(err, CodecError::Io(_)));
    }
}
