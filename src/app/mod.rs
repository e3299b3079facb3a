//! Application-Layer: Pipeline und Use-Cases.

pub mod pipeline;
pub mod use_cases;

pub use pipeline::{clean_archive, clean_archive_with_names, dry_run, CleanOutcome, DryRunSummary};
pub use use_cases::{ArtifactNames, OverlayStripResult};
