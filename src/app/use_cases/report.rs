//! Textbericht über entfernte Duplikate.

use super::file_io::{write_atomically, ArtifactNames};
use crate::core::RemovalRecord;
use crate::error::{CleanerError, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Zeitformat im Berichtskopf.
pub const REPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SEPARATOR: &str = "----------------------------------------";

/// Erzeugt den Berichtstext.
///
/// Kopf mit Eingabedatei, Erstellungszeit und Gesamtzahl, danach ein Block
/// pro entferntem Placemark. Fehlende Werte erscheinen als `None`.
pub fn render_report(
    records: &[RemovalRecord],
    input_file: &str,
    generated_at: DateTime<Local>,
) -> String {
    let mut out = String::new();
    out.push_str("KMZ Cleaner - Duplicate Removal Report\n");
    out.push_str(&format!("Input file: {}\n", input_file));
    out.push_str(&format!(
        "Generated: {}\n",
        generated_at.format(REPORT_TIME_FORMAT)
    ));
    out.push_str(&format!("Total duplicates removed: {}\n", records.len()));
    out.push_str(SEPARATOR);
    out.push('\n');

    for (index, record) in records.iter().enumerate() {
        let normalized = record
            .coordinates
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        out.push_str(&format!("#{}\n", index + 1));
        out.push_str(&format!(
            "Name: {}\n",
            record.name.as_deref().unwrap_or("None")
        ));
        out.push_str(&format!("Geometry: {}\n", record.kind));
        out.push_str(&format!(
            "Folder: {}\n",
            record.folder.as_deref().unwrap_or("None")
        ));
        out.push_str(&format!(
            "Raw coordinates: {}\n",
            record.raw_coordinates.trim()
        ));
        out.push_str(&format!("Normalized coordinates: {}\n", normalized));
        out.push_str(SEPARATOR);
        out.push('\n');
    }

    out
}

/// Schreibt den Bericht als `Report_<base>_<timestamp>.txt` nach
/// `destination_dir`.
pub fn write_report(
    records: &[RemovalRecord],
    input_file: &str,
    destination_dir: &Path,
    names: &ArtifactNames,
) -> Result<PathBuf> {
    let target = destination_dir.join(names.report());
    let content = render_report(records, input_file, names.generated_at());

    write_atomically(&target, content.as_bytes()).map_err(|source| {
        CleanerError::ReportWrite {
            path: target.clone(),
            source,
        }
    })?;

    log::info!(
        "Bericht gespeichert: {} ({} Einträge)",
        target.display(),
        records.len()
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{normalize_coordinates, GeometryKind};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn names() -> ArtifactNames {
        ArtifactNames::new(
            Path::new("Flur.kmz"),
            Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        )
    }

    fn record(name: Option<&str>, folder: Option<&str>) -> RemovalRecord {
        let raw = "8.1,47.2,0 8.2,47.3,0";
        RemovalRecord {
            name: name.map(str::to_string),
            kind: GeometryKind::Polygon,
            folder: folder.map(str::to_string),
            raw_coordinates: raw.to_string(),
            coordinates: normalize_coordinates(raw),
        }
    }

    #[test]
    fn test_render_report_layout() {
        let text = render_report(
            &[record(Some("Lot A"), Some("Nord")), record(None, None)],
            "Flur.kmz",
            names().generated_at(),
        );

        assert!(text.contains("Input file: Flur.kmz\n"));
        assert!(text.contains("Generated: 2025-01-02 03:04:05\n"));
        assert!(text.contains("Total duplicates removed: 2\n"));
        assert!(text.contains("Name: Lot A\nGeometry: Polygon\nFolder: Nord\n"));
        assert!(text.contains("Name: None\nGeometry: Polygon\nFolder: None\n"));
        assert!(text.contains("Raw coordinates: 8.1,47.2,0 8.2,47.3,0\n"));
        assert!(text.contains(
            "Normalized coordinates: (8.100000, 47.200000) (8.200000, 47.300000)\n"
        ));
        assert_eq!(text.matches(SEPARATOR).count(), 3);
    }

    #[test]
    fn test_empty_report_has_header_only() {
        let text = render_report(&[], "Flur.kmz", names().generated_at());
        assert!(text.contains("Total duplicates removed: 0"));
        assert!(!text.contains("Name:"));
    }

    #[test]
    fn test_write_report_file_name() {
        let tmp = TempDir::new().unwrap();
        let path = write_report(&[record(Some("x"), None)], "Flur.kmz", tmp.path(), &names())
            .unwrap();

        assert_eq!(path, tmp.path().join("Report_Flur_20250102_030405.txt"));
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("Name: x"));
    }

    #[test]
    fn test_write_report_failure_is_surfaced() {
        let tmp = TempDir::new().unwrap();
        let err = write_report(&[], "Flur.kmz", &tmp.path().join("fehlt"), &names())
            .expect_err("Fehler erwartet");
        assert!(matches!(err, CleanerError::ReportWrite { .. }));
    }
}
