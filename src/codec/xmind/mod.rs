//! XMind (Zen) archives.
//!
//! An `.xmind` file is a zip holding `content.json` (an array of sheets),
//! `metadata.json` and `manifest.json`. Legacy archives that only carry
//! `content.xml` are recognised and rejected.

pub mod export;
pub mod import;
pub mod model;

use std::io::{Cursor, Read, Seek, Write};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::CodecError;
use crate::model::{Esg, KpiNode, Scope};
use self::model::{Manifest, Metadata, Sheet};

pub use import::ImportReport;

pub const CONTENT_JSON: &str = "content.json";
pub const METADATA_JSON: &str = "metadata.json";
pub const MANIFEST_JSON: &str = "manifest.json";
pub const CONTENT_XML: &str = "content.xml";

/// Id of the synthetic root written when a forest has only detached nodes.
/// Dropped again on import.
pub const PLACEHOLDER_ROOT_ID: &str = "kpitree-placeholder-root";
pub const PLACEHOLDER_ROOT_TITLE: &str = "Root";

const ESG_LABEL_PREFIX: &str = "esg:";
const SCOPE_LABEL_PREFIX: &str = "scope:";

pub fn esg_label(esg: Esg) -> String {
    format!("{ESG_LABEL_PREFIX}{esg}")
}

pub fn scope_label(scope: Scope) -> String {
    format!("{SCOPE_LABEL_PREFIX}{}", scope.number())
}

/// Read an `esg:` or `scope:` topic label. Anything else is `None`.
pub fn parse_label(label: &str) -> Option<TopicTag> {
    let label = label.trim();
    if let Some(rest) = label.strip_prefix(ESG_LABEL_PREFIX) {
        return Esg::parse(rest).map(TopicTag::Esg);
    }
    if let Some(rest) = label.strip_prefix(SCOPE_LABEL_PREFIX) {
        return Scope::parse(rest).map(TopicTag::Scope);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicTag {
    Esg(Esg),
    Scope(Scope),
}

/// Encode a forest as the bytes of an `.xmind` archive.
pub fn export_bytes(forest: &[KpiNode]) -> Result<Vec<u8>, CodecError> {
    let sheets = export::to_sheets(forest);
    let mut buf = Cursor::new(Vec::new());
    write_archive(&mut buf, &sheets)?;
    Ok(buf.into_inner())
}

/// Decode the bytes of an `.xmind` archive into a forest.
pub fn import_bytes(bytes: &[u8]) -> Result<(Vec<KpiNode>, ImportReport), CodecError> {
    let sheets = read_archive(Cursor::new(bytes))?;
    Ok(import::from_sheets(&sheets))
}

pub fn write_archive<W: Write + Seek>(writer: W, sheets: &[Sheet]) -> Result<(), CodecError> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(CONTENT_JSON, options)?;
    zip.write_all(serde_json::to_string(sheets)?.as_bytes())?;

    zip.start_file(METADATA_JSON, options)?;
    zip.write_all(serde_json::to_string(&Metadata::default())?.as_bytes())?;

    zip.start_file(MANIFEST_JSON, options)?;
    zip.write_all(serde_json::to_string(&Manifest::default())?.as_bytes())?;

    zip.finish()?;
    debug!(sheets = sheets.len(), "xmind archive written");
    Ok(())
}

pub fn read_archive<R: Read + Seek>(reader: R) -> Result<Vec<Sheet>, CodecError> {
    let mut archive = ZipArchive::new(reader)?;
    let has_content = archive.file_names().any(|n| n == CONTENT_JSON);
    if !has_content {
        let legacy = archive.file_names().any(|n| n == CONTENT_XML);
        return Err(if legacy {
            CodecError::LegacyXmlUnsupported
        } else {
            CodecError::MissingMember(CONTENT_JSON)
        });
    }

    let mut text = String::new();
    archive.by_name(CONTENT_JSON)?.read_to_string(&mut text)?;
    let sheets: Vec<Sheet> = serde_json::from_str(&text)?;
    debug!(sheets = sheets.len(), "xmind archive read");
    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{NodeRelationship, Position};

    fn zip_with(members: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buf);
            for (name, body) in members {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn archive_has_the_three_members() {
        let bytes = export_bytes(&[KpiNode::new("a", "A")]).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec![CONTENT_JSON, MANIFEST_JSON, METADATA_JSON]);
    }

    #[test]
    fn round_trip_keeps_tree_units_tags_and_links() {
        let mut revenue = KpiNode::new("revenue", "Revenue")
            .with_unit("$")
            .with_esg(Esg::G)
            .with_scope(Scope::Direct);
        revenue.markers = vec!["priority-1".into()];
        revenue.relationships.push(NodeRelationship {
            id: "r1".into(),
            target_id: "cost".into(),
            label: Some("offsets".into()),
        });
        let mut cost = KpiNode::new("cost", "Cost");
        cost.relationships.push(NodeRelationship {
            id: "r1-reverse".into(),
            target_id: "revenue".into(),
            label: Some("← offsets".into()),
        });
        let mut floating = KpiNode::new("float", "Floating");
        floating.is_detached = true;
        floating.position = Some(Position { x: 3.0, y: 4.0 });

        let forest = vec![
            KpiNode::new("root", "Root KPI").with_child(revenue).with_child(cost),
            floating,
        ];
        let bytes = export_bytes(&forest).unwrap();
        let (imported, report) = import_bytes(&bytes).unwrap();

        assert_eq!(imported, forest);
        assert_eq!(report.sheets, 1);
        assert_eq!(report.relationships, 1);
        assert_eq!(report.dropped_relationships, 0);
    }

    #[test]
    fn opposite_links_round_trip() {
        let mut a = KpiNode::new("a", "A");
        a.relationships.push(NodeRelationship {
            id: "r1".into(),
            target_id: "b".into(),
            label: Some("x".into()),
        });
        let mut b = KpiNode::new("b", "B");
        b.relationships.push(NodeRelationship {
            id: "r1-reverse".into(),
            target_id: "a".into(),
            label: Some("← x".into()),
        });
        b.relationships.push(NodeRelationship {
            id: "r2".into(),
            target_id: "a".into(),
            label: Some("y".into()),
        });
        let forest = vec![KpiNode::new("root", "Root").with_child(a).with_child(b)];

        let (imported, report) = import_bytes(&export_bytes(&forest).unwrap()).unwrap();
        assert_eq!(imported, forest);
        assert_eq!(report.relationships, 2);
    }

    #[test]
    fn detached_only_forest_round_trips_without_placeholder() {
        let mut floating = KpiNode::new("float", "Floating");
        floating.is_detached = true;
        let bytes = export_bytes(&[floating.clone()]).unwrap();
        let (imported, _) = import_bytes(&bytes).unwrap();
        assert_eq!(imported, vec![floating]);
    }

    #[test]
    fn legacy_xml_archive_is_rejected() {
        let bytes = zip_with(&[(CONTENT_XML, "<xmap-content/>")]);
        let err = import_bytes(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::LegacyXmlUnsupported));
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn archive_without_content_is_rejected() {
        let bytes = zip_with(&[(METADATA_JSON, "{}")]);
        assert!(matches!(
            import_bytes(&bytes),
            Err(CodecError::MissingMember(CONTENT_JSON))
        ));
    }

    #[test]
    fn garbage_bytes_are_an_archive_error() {
        assert!(matches!(
            import_bytes(b"definitely not a zip"),
            Err(CodecError::Archive(_))
        ));
    }

    #[test]
    fn labels_parse_back_to_tags() {
        assert_eq!(parse_label("esg:S"), Some(TopicTag::Esg(Esg::S)));
        assert_eq!(parse_label(" scope:3 "), Some(TopicTag::Scope(Scope::ValueChain)));
        assert_eq!(parse_label("scope:9"), None);
        assert_eq!(parse_label("important"), None);
        assert_eq!(esg_label(Esg::E), "esg:E");
        assert_eq!(scope_label(Scope::Indirect), "scope:2");
    }
}
