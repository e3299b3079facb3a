//! KMZ-Archiv: Entpacken in ein temporäres Arbeitsverzeichnis und Packen
//! eines Arbeitsverzeichnisses in ein neues Archiv.

use crate::error::{CleanerError, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Datei-Endung des KML-Dokuments im Archiv
pub const DOCUMENT_EXTENSION: &str = "kml";
/// Dateirechte der Ausgabe-Artefakte (Unix)
#[cfg(unix)]
const ARTIFACT_MODE: u32 = 0o644;
/// Datei-Endung des Archivs
pub const ARCHIVE_EXTENSION: &str = "kmz";

/// Temporäres Arbeitsverzeichnis mit dem entpackten Archiv-Inhalt.
///
/// Das Verzeichnis wird beim Drop gelöscht, auch wenn der Lauf mit einem
/// Fehler oder Panic abbricht.
#[derive(Debug)]
pub struct WorkArea {
    dir: tempfile::TempDir,
    /// KML-Dateien relativ zum Arbeitsverzeichnis, in Archiv-Reihenfolge
    documents: Vec<PathBuf>,
}

impl WorkArea {
    /// Wurzel des Arbeitsverzeichnisses
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Alle KML-Dateien (relativ) in Archiv-Reihenfolge
    pub fn documents(&self) -> &[PathBuf] {
        &self.documents
    }

    /// Absoluter Pfad des zu bereinigenden KML-Dokuments.
    ///
    /// Enthält das Archiv mehrere KML-Dateien, gilt die erste in
    /// Archiv-Reihenfolge (wie bei Google Earth).
    pub fn document_path(&self) -> PathBuf {
        // extract_archive garantiert mindestens ein Dokument
        self.dir.path().join(&self.documents[0])
    }

    /// Löscht das Arbeitsverzeichnis explizit und meldet Fehler dabei.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|source| CleanerError::WorkArea { path, source })
    }
}

/// Entpackt ein KMZ-Archiv in ein neues temporäres Arbeitsverzeichnis.
///
/// Einträge mit unsicheren Pfaden (`..`, absolute Pfade) werden übersprungen.
/// Fehlt ein KML-Dokument, schlägt die Funktion mit `DocumentNotFound` fehl.
pub fn extract_archive(archive_path: &Path) -> Result<WorkArea> {
    let read_err = |source| CleanerError::ArchiveRead {
        path: archive_path.to_path_buf(),
        source,
    };

    let file = File::open(archive_path).map_err(read_err)?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| CleanerError::archive_read(archive_path, e))?;

    let dir = tempfile::Builder::new()
        .prefix("kmz_cleaner_")
        .tempdir()
        .map_err(|source| CleanerError::WorkArea {
            path: std::env::temp_dir(),
            source,
        })?;

    let mut documents = Vec::new();
    let mut file_count = 0usize;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| CleanerError::archive_read(archive_path, e))?;
        if entry.is_dir() {
            continue;
        }

        let Some(relative) = entry.enclosed_name() else {
            log::warn!("Unsicherer Pfad im Archiv übersprungen: '{}'", entry.name());
            continue;
        };

        let target = dir.path().join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CleanerError::WorkArea {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut content = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut content).map_err(read_err)?;
        std::fs::write(&target, &content).map_err(|source| CleanerError::WorkArea {
            path: target.clone(),
            source,
        })?;
        file_count += 1;

        if has_extension(&relative, DOCUMENT_EXTENSION) {
            documents.push(relative);
        }
    }

    if documents.is_empty() {
        return Err(CleanerError::DocumentNotFound {
            path: archive_path.to_path_buf(),
        });
    }

    if documents.len() > 1 {
        log::warn!(
            "Archiv enthält {} KML-Dateien, verwende '{}' (ignoriert: {:?})",
            documents.len(),
            documents[0].display(),
            &documents[1..]
        );
    }

    log::info!(
        "KMZ '{}' entpackt: {} Dateien nach '{}'",
        archive_path.display(),
        file_count,
        dir.path().display()
    );

    Ok(WorkArea { dir, documents })
}

/// Packt alle Dateien unter `work_dir` in ein neues Archiv unter `output`.
///
/// Dateien, für die `exclude` `true` liefert, werden ausgelassen. KML-Dateien
/// auf oberster Ebene stehen vorne, alle übrigen Einträge folgen sortiert nach
/// relativem Pfad. Das Archiv wird zuerst in eine temporäre Datei im
/// Zielverzeichnis geschrieben und erst danach umbenannt.
///
/// Gibt die Anzahl geschriebener Einträge zurück.
pub fn pack_directory(
    work_dir: &Path,
    output: &Path,
    exclude: &dyn Fn(&Path) -> bool,
) -> Result<usize> {
    let write_err = |source| CleanerError::ArchiveWrite {
        path: output.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    collect_files(work_dir, work_dir, &mut files).map_err(write_err)?;
    files.retain(|relative| !exclude(relative));
    files.sort_by_key(|relative| (!is_root_document(relative), relative.clone()));

    let target_dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(target_dir).map_err(write_err)?;

    {
        let mut writer = ZipWriter::new(BufWriter::new(temp.as_file_mut()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for relative in &files {
            writer
                .start_file(archive_entry_name(relative), options)
                .map_err(|e| CleanerError::archive_write(output, e))?;
            let mut source = File::open(work_dir.join(relative)).map_err(write_err)?;
            std::io::copy(&mut source, &mut writer).map_err(write_err)?;
        }

        let buffered = writer
            .finish()
            .map_err(|e| CleanerError::archive_write(output, e))?;
        buffered
            .into_inner()
            .map_err(|e| write_err(e.into_error()))?;
    }

    set_artifact_permissions(temp.as_file()).map_err(write_err)?;
    temp.persist(output).map_err(|e| write_err(e.error))?;

    log::info!(
        "KMZ geschrieben: '{}' ({} Einträge)",
        output.display(),
        files.len()
    );
    Ok(files.len())
}

/// Listet alle Datei-Einträge eines Archivs in Archiv-Reihenfolge.
pub fn list_archive_entries(archive_path: &Path) -> Result<Vec<String>> {
    let file = File::open(archive_path).map_err(|source| CleanerError::ArchiveRead {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| CleanerError::archive_read(archive_path, e))?;

    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| CleanerError::archive_read(archive_path, e))?;
        if entry.is_file() {
            names.push(entry.name().to_string());
        }
    }
    Ok(names)
}

/// Prüft ob ein Pfad eine der Bild-Endungen trägt (Groß-/Kleinschreibung egal).
pub fn is_image_file(path: &Path, image_extensions: &[String]) -> bool {
    image_extensions
        .iter()
        .any(|ext| has_extension(path, ext.trim_start_matches('.')))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

fn is_root_document(relative: &Path) -> bool {
    relative.components().count() == 1 && has_extension(relative, DOCUMENT_EXTENSION)
}

/// ZIP-Eintragsname mit `/` als Trenner, unabhängig vom Betriebssystem.
fn archive_entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Gibt eine temporäre Datei vor dem Umbenennen für andere lesbar frei
/// (tempfile legt sie mit 0600 an).
#[cfg(unix)]
pub(crate) fn set_artifact_permissions(file: &File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(ARTIFACT_MODE))
}

#[cfg(not(unix))]
pub(crate) fn set_artifact_permissions(_file: &File) -> std::io::Result<()> {
    Ok(())
}

/// Sammelt alle Dateien unter `dir` rekursiv als Pfade relativ zu `base`.
pub(crate) fn collect_files(
    base: &Path,
    dir: &Path,
    files: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(base, &path, files)?;
        } else if let Ok(relative) = path.strip_prefix(base) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(())
}
