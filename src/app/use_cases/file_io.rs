//! Use-Case-Funktionen für Dateiaktionen.
//! Alle Dateisystem-Operationen auf Dokument und Ausgabe-Artefakten sind hier
//! zentralisiert.

use crate::archive::{self, ARCHIVE_EXTENSION};
use crate::core::Document;
use crate::error::{CleanerError, Result};
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Zeitstempel-Format in Dateinamen.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Dateinamen der Artefakte eines Laufs.
///
/// Alle drei Artefakte teilen Basisname und Zeitstempel.
#[derive(Debug, Clone)]
pub struct ArtifactNames {
    base: String,
    generated_at: DateTime<Local>,
}

impl ArtifactNames {
    /// Erfasst Basisname der Eingabe und Zeitstempel.
    pub fn new(input: &Path, generated_at: DateTime<Local>) -> Self {
        let base = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "input".to_string());
        Self { base, generated_at }
    }

    /// Basisname der Eingabe ohne Endung
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Zeitpunkt des Laufs
    pub fn generated_at(&self) -> DateTime<Local> {
        self.generated_at
    }

    fn timestamp(&self) -> String {
        self.generated_at.format(FILE_TIMESTAMP_FORMAT).to_string()
    }

    /// `<base>_cleaned_<timestamp>.<ext>`
    pub fn cleaned(&self, extension: &str) -> String {
        format!("{}_cleaned_{}.{}", self.base, self.timestamp(), extension)
    }

    /// `<base>_cleaned_<timestamp>.kmz`
    pub fn cleaned_archive(&self) -> String {
        self.cleaned(ARCHIVE_EXTENSION)
    }

    /// `Report_<base>_<timestamp>.txt`
    pub fn report(&self) -> String {
        format!("Report_{}_{}.txt", self.base, self.timestamp())
    }
}

/// Lädt und parst ein KML-Dokument.
pub fn load_document(path: &Path) -> Result<Document> {
    let xml_content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            CleanerError::MalformedDocument {
                path: path.to_path_buf(),
                message: "Datei ist kein gueltiges UTF-8".to_string(),
            }
        } else {
            CleanerError::WorkArea {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let document =
        crate::xml::parse_kml(&xml_content).map_err(|e| CleanerError::MalformedDocument {
            path: path.to_path_buf(),
            message: format!("{e:#}"),
        })?;

    log::info!(
        "KML geladen: '{}' ({} Elemente)",
        path.display(),
        document.arena_len()
    );
    Ok(document)
}

/// Schreibt den bereinigten Baum zurück in die Arbeitskopie.
pub fn save_document(document: &Document, path: &Path) -> Result<()> {
    let xml_content = crate::xml::write_kml(document);
    std::fs::write(path, xml_content).map_err(|source| CleanerError::WorkArea {
        path: path.to_path_buf(),
        source,
    })
}

/// Legt das Ausgabeverzeichnis an.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| CleanerError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Kopiert die bereinigte Arbeitskopie des KML als eigenständige Datei.
///
/// Die Datei wird byteweise kopiert, nicht neu serialisiert.
pub fn write_standalone_copy(
    document_path: &Path,
    destination_dir: &Path,
    names: &ArtifactNames,
) -> Result<PathBuf> {
    let extension = document_path
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive::DOCUMENT_EXTENSION.to_string());
    let target = destination_dir.join(names.cleaned(&extension));

    let write_err = |source| CleanerError::DocumentWrite {
        path: target.clone(),
        source,
    };
    let content = std::fs::read(document_path).map_err(write_err)?;
    write_atomically(&target, &content).map_err(write_err)?;

    log::info!("Bereinigte KML gespeichert: {}", target.display());
    Ok(target)
}

/// Packt das Arbeitsverzeichnis als bereinigte KMZ ins Ausgabeverzeichnis.
pub fn write_archive(
    work_dir: &Path,
    destination_dir: &Path,
    names: &ArtifactNames,
    exclude: &dyn Fn(&Path) -> bool,
) -> Result<PathBuf> {
    let target = destination_dir.join(names.cleaned_archive());
    archive::pack_directory(work_dir, &target, exclude)?;
    Ok(target)
}

/// Schreibt Bytes über eine temporäre Datei im Zielverzeichnis, damit unter
/// dem endgültigen Namen nie eine halbe Datei liegt.
pub(crate) fn write_atomically(target: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(content)?;
    temp.flush()?;
    archive::set_artifact_permissions(temp.as_file())?;
    temp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
