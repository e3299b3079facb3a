//! KMZ Cleaner Library.
//! Entfernt doppelte Placemarks und GroundOverlays aus KMZ-Archiven.
//! Core-Funktionalität als Library exportiert für Tests und Wiederverwendung.

pub mod app;
pub mod archive;
pub mod core;
pub mod error;
pub mod shared;
pub mod xml;

pub use app::{clean_archive, dry_run, ArtifactNames, CleanOutcome, DryRunSummary, OverlayStripResult};
pub use core::{
    deduplicate_placemarks, scan_duplicates, DedupPlan, DeduplicationResult, Document,
    GeometryKind, RemovalRecord,
};
pub use error::{CleanerError, Result};
pub use shared::CleanerOptions;
pub use xml::{parse_kml, write_kml};
