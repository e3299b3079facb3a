//! Use-Cases der Application-Layer-Orchestrierung.

pub mod file_io;
pub mod overlays;
pub mod report;

pub use file_io::ArtifactNames;
pub use overlays::{strip_overlays, OverlayStripResult};
pub use report::{render_report, write_report};
