//! Fehlertypen des KMZ-Cleaners.
//!
//! Die Varianten folgen den Phasen eines Laufs: Lesen (Archiv, Dokument),
//! Verarbeitung (Arbeitsverzeichnis) und Schreiben (Artefakte). Schreibfehler
//! lassen sich über [`CleanerError::is_write_phase`] von früheren Fehlern
//! unterscheiden.

use std::path::PathBuf;
use thiserror::Error;

/// Fehler eines Bereinigungslaufs.
#[derive(Debug, Error)]
pub enum CleanerError {
    /// KMZ-Datei fehlt, ist kein gueltiges ZIP oder ein Eintrag ist unlesbar
    #[error("KMZ-Archiv '{}' konnte nicht gelesen werden: {source}", path.display())]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Kein KML-Dokument im Archiv
    #[error("Kein KML-Dokument in '{}' gefunden", path.display())]
    DocumentNotFound { path: PathBuf },

    /// KML-Dokument ist kein wohlgeformtes XML
    #[error("KML-Dokument '{}' ist fehlerhaft: {message}", path.display())]
    MalformedDocument { path: PathBuf, message: String },

    /// I/O-Fehler im Arbeitsverzeichnis (Entpacken, Bilder löschen, Dokument zurückschreiben)
    #[error("Arbeitsverzeichnis-Fehler bei '{}': {source}", path.display())]
    WorkArea {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Ausgabe-Verzeichnis konnte nicht angelegt werden
    #[error("Ausgabe-Verzeichnis '{}' konnte nicht angelegt werden: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bereinigte KMZ-Datei konnte nicht geschrieben werden
    #[error("Bereinigte KMZ-Datei '{}' konnte nicht geschrieben werden: {source}", path.display())]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bereinigte KML-Kopie konnte nicht geschrieben werden
    #[error("Bereinigte KML-Datei '{}' konnte nicht geschrieben werden: {source}", path.display())]
    DocumentWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bericht konnte nicht geschrieben werden
    #[error("Bericht '{}' konnte nicht geschrieben werden: {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Konfigurationsdatei konnte nicht gelesen oder geschrieben werden
    #[error("Konfiguration '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl CleanerError {
    /// Prüft ob der Fehler erst beim Schreiben der Artefakte auftrat,
    /// also nachdem die bereinigten Daten bereits berechnet waren.
    pub fn is_write_phase(&self) -> bool {
        matches!(
            self,
            Self::OutputDir { .. }
                | Self::ArchiveWrite { .. }
                | Self::DocumentWrite { .. }
                | Self::ReportWrite { .. }
        )
    }

    /// Wandelt einen ZIP-Fehler beim Lesen in `ArchiveRead` um.
    pub(crate) fn archive_read(path: impl Into<PathBuf>, err: zip::result::ZipError) -> Self {
        Self::ArchiveRead {
            path: path.into(),
            source: zip_to_io(err),
        }
    }

    /// Wandelt einen ZIP-Fehler beim Schreiben in `ArchiveWrite` um.
    pub(crate) fn archive_write(path: impl Into<PathBuf>, err: zip::result::ZipError) -> Self {
        Self::ArchiveWrite {
            path: path.into(),
            source: zip_to_io(err),
        }
    }
}

fn zip_to_io(err: zip::result::ZipError) -> std::io::Error {
    match err {
        zip::result::ZipError::Io(io) => io,
        other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
    }
}

/// Result-Alias für Bibliotheksfunktionen.
pub type Result<T> = std::result::Result<T, CleanerError>;
