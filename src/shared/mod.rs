//! Geteilte Typen für schichtübergreifende Verträge.
//!
//! Enthält die Laufzeit-Optionen, die von Pipeline und CLI gemeinsam
//! genutzt werden.

pub mod options;

pub use options::CleanerOptions;
pub use options::{DEFAULT_IMAGE_EXTENSIONS, OUTPUT_DIR_NAME};
