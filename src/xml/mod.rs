//! KML Import/Export.
//!
//! Dieses Modul parst KML-Dokumente in den Arena-Baum aus [`crate::core`]
//! und schreibt ihn deterministisch zurück.

pub mod parser;
pub mod writer;

pub use parser::parse_kml;
pub use writer::write_kml;
