//! Core-Domänentypen: KML-Baum, Geometrie, Duplikat-Bereinigung.

pub mod document;
pub mod geometry;

pub use document::{
    deduplicate_placemarks, local_name, scan_duplicates, DedupPlan, DeduplicationResult,
    Document, IdentityKey, Node, NodeId, RemovalRecord,
};
pub use geometry::{extract_geometry, normalize_coordinates, Coordinate, Geometry, GeometryKind};
