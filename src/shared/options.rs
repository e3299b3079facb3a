//! Zentrale Konfiguration für den KMZ-Cleaner.
//!
//! `CleanerOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use crate::error::{CleanerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name des Ausgabe-Verzeichnisses im Home-Verzeichnis.
pub const OUTPUT_DIR_NAME: &str = "KMZ_Cleaner_Output";

/// Fallback-Ausgabeverzeichnis, falls kein Home-Verzeichnis ermittelbar ist.
pub const FALLBACK_OUTPUT_DIR: &str = "output";

/// Name der Optionen-Datei neben der Binary.
pub const CONFIG_FILE_NAME: &str = "kmz_cleaner.toml";

/// Bild-Endungen, die als Overlay-Rasterbilder gelten.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff"];

/// Alle zur Laufzeit änderbaren Optionen.
/// Wird als `kmz_cleaner.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanerOptions {
    /// Zielverzeichnis für KMZ, KML und Bericht (None = `~/KMZ_Cleaner_Output`)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Endungen der Rasterbilder, die gelöscht und nicht mitgepackt werden
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    /// GroundOverlays und Rasterbilder entfernen
    #[serde(default = "default_strip_ground_overlays")]
    pub strip_ground_overlays: bool,
}

impl Default for CleanerOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            image_extensions: default_image_extensions(),
            strip_ground_overlays: true,
        }
    }
}

/// Serde-Default für `image_extensions`.
fn default_image_extensions() -> Vec<String> {
    DEFAULT_IMAGE_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_strip_ground_overlays() -> bool {
    true
}

impl CleanerOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Lädt eine ausdrücklich angegebene Optionen-Datei. Fehler werden
    /// gemeldet statt durch Standardwerte ersetzt.
    pub fn load_required(path: &Path) -> Result<Self> {
        let config_err = |message: String| CleanerError::Config {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        let opts = toml::from_str(&content).map_err(|e| config_err(e.to_string()))?;
        log::info!("Optionen geladen aus: {}", path.display());
        Ok(opts)
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| PathBuf::from("kmz_cleaner"))
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(CONFIG_FILE_NAME)
    }

    /// Effektives Ausgabeverzeichnis.
    pub fn resolved_output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        dirs::home_dir()
            .map(|home| home.join(OUTPUT_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_OUTPUT_DIR))
    }

    /// Prüft ob ein Pfad auf ein zu entfernendes Rasterbild zeigt.
    pub fn is_image_file(&self, path: &Path) -> bool {
        crate::archive::is_image_file(path, &self.image_extensions)
    }
}
