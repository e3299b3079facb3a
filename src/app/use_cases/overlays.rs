//! Entfernt GroundOverlays aus dem Baum und ihre Rasterbilder aus dem
//! Arbeitsverzeichnis.

use crate::archive::collect_files;
use crate::core::Document;
use crate::error::{CleanerError, Result};
use std::path::{Path, PathBuf};

/// Ergebnis der Overlay-Bereinigung.
#[derive(Debug, Clone, Default)]
pub struct OverlayStripResult {
    /// Anzahl entfernter `<GroundOverlay>`-Elemente
    pub removed_overlays: usize,
    /// Gelöschte Bilder (relativ zum Arbeitsverzeichnis), sortiert
    pub deleted_images: Vec<PathBuf>,
}

/// Entfernt alle GroundOverlays aus `document` und löscht anschließend jede
/// Datei unter `work_dir`, die `is_image` als Rasterbild erkennt.
pub fn strip_overlays(
    document: &mut Document,
    work_dir: &Path,
    is_image: &dyn Fn(&Path) -> bool,
) -> Result<OverlayStripResult> {
    let removed_overlays = document.remove_ground_overlays();

    let mut files = Vec::new();
    collect_files(work_dir, work_dir, &mut files).map_err(|source| CleanerError::WorkArea {
        path: work_dir.to_path_buf(),
        source,
    })?;
    files.sort();

    let mut deleted_images = Vec::new();
    for relative in files.into_iter().filter(|f| is_image(f)) {
        let path = work_dir.join(&relative);
        std::fs::remove_file(&path).map_err(|source| CleanerError::WorkArea { path, source })?;
        log::debug!("Bild gelöscht: {}", relative.display());
        deleted_images.push(relative);
    }

    log::info!(
        "{} GroundOverlays entfernt, {} Bilder gelöscht",
        removed_overlays,
        deleted_images.len()
    );

    Ok(OverlayStripResult {
        removed_overlays,
        deleted_images,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::is_image_file;
    use crate::xml::parse_kml;
    use tempfile::TempDir;

    #[test]
    fn test_strip_overlays_and_jpgs() {
        let tmp = TempDir::new().unwrap();
        let work = tmp.path();
        std::fs::create_dir_all(work.join("files")).unwrap();
        for name in ["files/a.jpg", "files/b.jpg", "c.JPG", "doc.kml", "files/notes.txt"] {
            std::fs::write(work.join(name), b"x").unwrap();
        }

        let mut doc = parse_kml(
            "<kml><Document>\
               <GroundOverlay><Icon><href>files/a.jpg</href></Icon></GroundOverlay>\
               <Placemark><name>bleibt</name></Placemark>\
             </Document></kml>",
        )
        .unwrap();

        let exts = vec!["jpg".to_string()];
        let result = strip_overlays(&mut doc, work, &|p| is_image_file(p, &exts)).unwrap();

        assert_eq!(result.removed_overlays, 1);
        assert_eq!(result.deleted_images.len(), 3);
        assert!(doc.find_descendants(doc.root(), "GroundOverlay").is_empty());
        assert_eq!(doc.find_descendants(doc.root(), "Placemark").len(), 1);

        let mut remaining = Vec::new();
        collect_files(work, work, &mut remaining).unwrap();
        remaining.sort();
        assert_eq!(
            remaining,
            vec![PathBuf::from("doc.kml"), PathBuf::from("files/notes.txt")]
        );
    }

    #[test]
    fn test_strip_without_overlays_is_noop() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("doc.kml"), b"<kml/>").unwrap();
        let mut doc = parse_kml("<kml><Document/></kml>").unwrap();

        let result = strip_overlays(&mut doc, tmp.path(), &|_| false).unwrap();
        assert_eq!(result.removed_overlays, 0);
        assert!(result.deleted_images.is_empty());
        assert!(tmp.path().join("doc.kml").is_file());
    }
}
