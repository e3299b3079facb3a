//! Ablauf eines Bereinigungslaufs: Entpacken, Laden, Duplikate entfernen,
//! Overlays entfernen, Artefakte schreiben.

use super::use_cases::{file_io, overlays, report, ArtifactNames, OverlayStripResult};
use crate::archive::{self, WorkArea};
use crate::core::{deduplicate_placemarks, scan_duplicates, DeduplicationResult, RemovalRecord};
use crate::error::{CleanerError, Result};
use crate::shared::CleanerOptions;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Ergebnis eines vollständigen Laufs.
///
/// Fehler beim Schreiben einzelner Artefakte brechen den Lauf nicht ab,
/// sondern landen in `write_failures`.
#[derive(Debug)]
pub struct CleanOutcome {
    pub input: PathBuf,
    pub dedup: DeduplicationResult,
    pub overlays: OverlayStripResult,
    pub report_path: Option<PathBuf>,
    pub document_path: Option<PathBuf>,
    pub archive_path: Option<PathBuf>,
    pub write_failures: Vec<CleanerError>,
}

impl CleanOutcome {
    /// `true`, wenn alle drei Artefakte geschrieben wurden.
    pub fn is_complete(&self) -> bool {
        self.write_failures.is_empty()
            && self.report_path.is_some()
            && self.document_path.is_some()
            && self.archive_path.is_some()
    }

    /// Alle geschriebenen Artefakte in Schreib-Reihenfolge
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
        [&self.report_path, &self.document_path, &self.archive_path]
            .into_iter()
            .filter_map(|p| p.as_deref())
    }
}

/// Vorschau ohne Änderungen und ohne Ausgabe-Dateien.
#[derive(Debug, Clone)]
pub struct DryRunSummary {
    pub input: PathBuf,
    /// KML-Dokument relativ zum Archiv
    pub document: PathBuf,
    pub scanned: usize,
    pub skipped: usize,
    pub unique: usize,
    pub records: Vec<RemovalRecord>,
}

impl DryRunSummary {
    /// Anzahl der Placemarks, die ein echter Lauf entfernen würde
    pub fn duplicate_count(&self) -> usize {
        self.records.len()
    }
}

/// Bereinigt ein KMZ-Archiv und schreibt die Artefakte ins Ausgabeverzeichnis.
pub fn clean_archive(input: &Path, options: &CleanerOptions) -> Result<CleanOutcome> {
    let names = ArtifactNames::new(input, Local::now());
    clean_archive_with_names(input, options, &names)
}

/// Wie [`clean_archive`], aber mit vorgegebenen Artefakt-Namen.
pub fn clean_archive_with_names(
    input: &Path,
    options: &CleanerOptions,
    names: &ArtifactNames,
) -> Result<CleanOutcome> {
    log::info!("Bereinige '{}'", input.display());

    let work_area = archive::extract_archive(input)?;
    let document_path = work_area.document_path();
    let mut document = file_io::load_document(&document_path)?;

    let dedup = deduplicate_placemarks(&mut document);

    let overlays = if options.strip_ground_overlays {
        overlays::strip_overlays(&mut document, work_area.path(), &|p| {
            options.is_image_file(p)
        })?
    } else {
        log::info!("GroundOverlays bleiben erhalten");
        OverlayStripResult::default()
    };

    file_io::save_document(&document, &document_path)?;

    let mut outcome = CleanOutcome {
        input: input.to_path_buf(),
        dedup,
        overlays,
        report_path: None,
        document_path: None,
        archive_path: None,
        write_failures: Vec::new(),
    };

    let output_dir = options.resolved_output_dir();
    match file_io::ensure_output_dir(&output_dir) {
        Ok(()) => write_artifacts(
            &mut outcome,
            &work_area,
            &document_path,
            &output_dir,
            names,
            options,
        ),
        Err(e) => {
            log::error!("{}", e);
            outcome.write_failures.push(e);
        }
    }

    release(work_area);

    if outcome.is_complete() {
        log::info!(
            "Fertig: {} Duplikate entfernt, Ausgabe in '{}'",
            outcome.dedup.removed,
            output_dir.display()
        );
    } else {
        log::warn!(
            "Bereinigung berechnet, aber {} Artefakt(e) nicht geschrieben",
            outcome.write_failures.len()
        );
    }
    Ok(outcome)
}

/// Schreibt Bericht, KML-Kopie und Archiv. Der Bericht kommt zuerst.
fn write_artifacts(
    outcome: &mut CleanOutcome,
    work_area: &WorkArea,
    document_path: &Path,
    output_dir: &Path,
    names: &ArtifactNames,
    options: &CleanerOptions,
) {
    let input_file = outcome
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| outcome.input.display().to_string());

    let report = report::write_report(&outcome.dedup.records, &input_file, output_dir, names);
    outcome.report_path = collect(report, &mut outcome.write_failures);

    let copy = file_io::write_standalone_copy(document_path, output_dir, names);
    outcome.document_path = collect(copy, &mut outcome.write_failures);

    let exclude = |p: &Path| options.is_image_file(p);
    let packed = file_io::write_archive(work_area.path(), output_dir, names, &exclude);
    outcome.archive_path = collect(packed, &mut outcome.write_failures);
}

fn collect(result: Result<PathBuf>, failures: &mut Vec<CleanerError>) -> Option<PathBuf> {
    match result {
        Ok(path) => Some(path),
        Err(e) => {
            log::error!("{}", e);
            failures.push(e);
            None
        }
    }
}

fn release(work_area: WorkArea) {
    if let Err(e) = work_area.close() {
        log::warn!("{}", e);
    }
}

/// Analysiert ein Archiv, ohne etwas zu verändern oder zu schreiben.
pub fn dry_run(input: &Path) -> Result<DryRunSummary> {
    let work_area = archive::extract_archive(input)?;
    let document_path = work_area.document_path();
    let document = file_io::load_document(&document_path)?;

    let plan = scan_duplicates(&document);
    let summary = DryRunSummary {
        input: input.to_path_buf(),
        document: document_path
            .strip_prefix(work_area.path())
            .map(Path::to_path_buf)
            .unwrap_or(document_path.clone()),
        scanned: plan.scanned_count(),
        skipped: plan.skipped_count(),
        unique: plan.unique_count(),
        records: plan.records().to_vec(),
    };

    release(work_area);

    log::info!(
        "Probelauf: {} von {} Placemarks wären Duplikate",
        summary.duplicate_count(),
        summary.scanned
    );
    Ok(summary)
}
