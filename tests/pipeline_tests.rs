use chrono::{Local, TimeZone};
use kmz_cleaner::app::{clean_archive_with_names, dry_run, ArtifactNames};
use kmz_cleaner::archive::list_archive_entries;
use kmz_cleaner::{parse_kml, CleanerError, CleanerOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const FIXTURE: &str = include_str!("fixtures/field_lots.kml");

fn write_kmz(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    for (name, content) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

fn fixture_kmz(dir: &Path) -> PathBuf {
    let input = dir.join("field_lots.kmz");
    write_kmz(
        &input,
        &[
            ("doc.kml", FIXTURE.as_bytes()),
            ("files/luftbild.jpg", b"jpeg"),
            ("files/legende.png", b"png"),
            ("files/ortho.JPG", b"jpeg"),
            ("files/readme.txt", b"Flurkarte"),
        ],
    );
    input
}

fn options(output_dir: PathBuf) -> CleanerOptions {
    CleanerOptions {
        output_dir: Some(output_dir),
        ..CleanerOptions::default()
    }
}

fn names(input: &Path) -> ArtifactNames {
    ArtifactNames::new(input, Local.with_ymd_and_hms(2024, 11, 5, 17, 30, 0).unwrap())
}

#[test]
fn test_clean_archive_writes_three_artifacts() {
    let tmp = TempDir::new().unwrap();
    let input = fixture_kmz(tmp.path());
    let out = tmp.path().join("out");

    let outcome = clean_archive_with_names(&input, &options(out.clone()), &names(&input))
        .expect("Lauf fehlgeschlagen");

    assert!(outcome.is_complete());
    assert_eq!(outcome.dedup.removed, 2);
    assert_eq!(outcome.overlays.removed_overlays, 1);
    assert_eq!(outcome.overlays.deleted_images.len(), 3);

    assert_eq!(
        outcome.report_path.as_deref(),
        Some(out.join("Report_field_lots_20241105_173000.txt").as_path())
    );
    assert_eq!(
        outcome.document_path.as_deref(),
        Some(out.join("field_lots_cleaned_20241105_173000.kml").as_path())
    );
    assert_eq!(
        outcome.archive_path.as_deref(),
        Some(out.join("field_lots_cleaned_20241105_173000.kmz").as_path())
    );

    let entries = list_archive_entries(outcome.archive_path.as_ref().unwrap()).unwrap();
    assert_eq!(entries, vec!["doc.kml", "files/readme.txt"]);

    let cleaned = std::fs::read_to_string(outcome.document_path.as_ref().unwrap()).unwrap();
    let doc = parse_kml(&cleaned).unwrap();
    assert!(doc.find_descendants(doc.root(), "GroundOverlay").is_empty());
    assert_eq!(doc.find_descendants(doc.root(), "Placemark").len(), 5);

    let report = std::fs::read_to_string(outcome.report_path.as_ref().unwrap()).unwrap();
    assert!(report.contains("Input file: field_lots.kmz"));
    assert!(report.contains("Total duplicates removed: 2"));
}

#[test]
fn test_packing_excludes_images_still_on_disk() {
    let tmp = TempDir::new().unwrap();
    let input = fixture_kmz(tmp.path());
    let out = tmp.path().join("out");
    let opts = CleanerOptions {
        strip_ground_overlays: false,
        ..options(out)
    };

    let outcome = clean_archive_with_names(&input, &opts, &names(&input)).unwrap();

    assert_eq!(outcome.overlays.removed_overlays, 0);
    let entries = list_archive_entries(outcome.archive_path.as_ref().unwrap()).unwrap();
    assert!(entries.iter().all(|e| {
        let lower = e.to_ascii_lowercase();
        !lower.ends_with(".jpg") && !lower.ends_with(".png")
    }));

    let cleaned = std::fs::read_to_string(outcome.document_path.as_ref().unwrap()).unwrap();
    assert!(cleaned.contains("GroundOverlay"));
}

#[test]
fn test_second_run_removes_nothing() {
    let tmp = TempDir::new().unwrap();
    let input = fixture_kmz(tmp.path());
    let first = clean_archive_with_names(
        &input,
        &options(tmp.path().join("eins")),
        &names(&input),
    )
    .unwrap();

    let cleaned = first.archive_path.unwrap();
    let second = clean_archive_with_names(
        &cleaned,
        &options(tmp.path().join("zwei")),
        &names(&cleaned),
    )
    .unwrap();

    assert!(second.is_complete());
    assert_eq!(second.dedup.removed, 0);
    assert_eq!(second.overlays.removed_overlays, 0);
}

#[test]
fn test_dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let input = fixture_kmz(tmp.path());
    let before = std::fs::read_dir(tmp.path()).unwrap().count();

    let summary = dry_run(&input).unwrap();

    assert_eq!(summary.document, PathBuf::from("doc.kml"));
    assert_eq!(summary.duplicate_count(), 2);
    assert_eq!(summary.scanned, 6);
    assert_eq!(summary.unique, 4);
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), before);
    assert_eq!(list_archive_entries(&input).unwrap().len(), 5);
}

#[test]
fn test_archive_without_kml_aborts_without_output() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("bilder.kmz");
    write_kmz(&input, &[("files/a.jpg", b"jpeg")]);
    let out = tmp.path().join("out");

    let err = clean_archive_with_names(&input, &options(out.clone()), &names(&input))
        .expect_err("Fehler erwartet");

    assert!(matches!(err, CleanerError::DocumentNotFound { .. }));
    assert!(!out.exists());
}

#[test]
fn test_malformed_kml_aborts_without_output() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("kaputt.kmz");
    write_kmz(&input, &[("doc.kml", b"<kml><Document><Placemark></kml>")]);
    let out = tmp.path().join("out");

    let err = clean_archive_with_names(&input, &options(out.clone()), &names(&input))
        .expect_err("Fehler erwartet");

    assert!(matches!(err, CleanerError::MalformedDocument { .. }));
    assert!(!err.is_write_phase());
    assert!(!out.exists());
}

#[test]
fn test_unwritable_output_is_collected() {
    let tmp = TempDir::new().unwrap();
    let input = fixture_kmz(tmp.path());
    // Eine Datei blockiert das Ausgabeverzeichnis
    let blocker = tmp.path().join("blockiert");
    std::fs::write(&blocker, b"").unwrap();

    let outcome = clean_archive_with_names(&input, &options(blocker), &names(&input))
        .expect("Bereinigung selbst muss gelingen");

    assert!(!outcome.is_complete());
    assert_eq!(outcome.dedup.removed, 2);
    assert_eq!(outcome.write_failures.len(), 1);
    assert!(outcome.write_failures[0].is_write_phase());
    assert_eq!(outcome.artifacts().count(), 0);
}
