//! Duplikat-Erkennung und -Bereinigung für Placemarks mit identischer Geometrie.
//!
//! Ablauf in zwei Phasen: [`scan_duplicates`] liest den Baum einmal in
//! Dokument-Reihenfolge und merkt sich pro Identitäts-Schlüssel das zuletzt
//! gesehene Placemark. Jedes frühere Vorkommen landet im [`DedupPlan`].
//! [`DedupPlan::apply`] hängt die markierten Placemarks anschließend aus.
//! Überlebende bleiben an ihrer Position im Baum.

use super::{Document, NodeId, PLACEMARK_TAG};
use crate::core::geometry::{extract_geometry, normalize_coordinates, Coordinate, GeometryKind};
use indexmap::map::Entry;
use indexmap::IndexMap;

/// Identität eines Placemarks: Name, Geometrie-Art, gerundete Koordinaten.
///
/// Ein fehlender Name ist Teil des Schlüssels; zwei unbenannte Placemarks mit
/// gleicher Geometrie sind Duplikate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub name: Option<String>,
    pub kind: GeometryKind,
    pub coordinates: Vec<Coordinate>,
}

/// Protokoll-Eintrag für ein entferntes Placemark.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalRecord {
    pub name: Option<String>,
    pub kind: GeometryKind,
    /// Name des nächstgelegenen benannten Ordners
    pub folder: Option<String>,
    /// Unveränderter `<coordinates>`-Text
    pub raw_coordinates: String,
    pub coordinates: Vec<Coordinate>,
}

/// Aktueller Inhaber eines Schlüssels, beim ersten Sehen erfasst.
#[derive(Debug, Clone)]
struct Occupant {
    node: NodeId,
    folder: Option<String>,
    raw_coordinates: String,
}

/// Ergebnis der Scan-Phase: was entfernt würde, ohne den Baum anzufassen.
#[derive(Debug, Clone, Default)]
pub struct DedupPlan {
    victims: Vec<NodeId>,
    records: Vec<RemovalRecord>,
    scanned: usize,
    skipped: usize,
    unique: usize,
}

impl DedupPlan {
    /// Zu entfernende Placemarks in Erkennungs-Reihenfolge
    pub fn victims(&self) -> &[NodeId] {
        &self.victims
    }

    /// Protokoll-Einträge in Erkennungs-Reihenfolge
    pub fn records(&self) -> &[RemovalRecord] {
        &self.records
    }

    /// Anzahl der Duplikate
    pub fn duplicate_count(&self) -> usize {
        self.victims.len()
    }

    /// Anzahl unterschiedlicher Identitäts-Schlüssel
    pub fn unique_count(&self) -> usize {
        self.unique
    }

    /// Anzahl Placemarks mit Geometrie
    pub fn scanned_count(&self) -> usize {
        self.scanned
    }

    /// Anzahl Placemarks ohne erkannte Geometrie (nie entfernt)
    pub fn skipped_count(&self) -> usize {
        self.skipped
    }

    /// Hängt alle markierten Placemarks aus dem Baum aus.
    pub fn apply(self, doc: &mut Document) -> DeduplicationResult {
        let mut removed = 0usize;
        for &victim in &self.victims {
            if doc.remove(victim) {
                removed += 1;
            } else {
                log::warn!("Placemark {:?} war bereits ausgehängt", victim);
            }
        }

        log::info!(
            "Duplikat-Bereinigung: {} von {} Placemarks entfernt ({} eindeutig, {} ohne Geometrie)",
            removed,
            self.scanned,
            self.unique,
            self.skipped
        );

        DeduplicationResult {
            records: self.records,
            removed,
            scanned: self.scanned,
            skipped: self.skipped,
            unique: self.unique,
        }
    }
}

/// Ergebnis einer Duplikat-Bereinigung.
#[derive(Debug, Clone, Default)]
pub struct DeduplicationResult {
    /// Entfernte Placemarks in Erkennungs-Reihenfolge
    pub records: Vec<RemovalRecord>,
    /// Anzahl entfernter Placemarks
    pub removed: usize,
    /// Anzahl Placemarks mit Geometrie vor der Bereinigung
    pub scanned: usize,
    /// Anzahl Placemarks ohne Geometrie
    pub skipped: usize,
    /// Anzahl unterschiedlicher Identitäts-Schlüssel (= Überlebende mit Geometrie)
    pub unique: usize,
}

impl DeduplicationResult {
    /// Prüft ob Duplikate gefunden und bereinigt wurden.
    pub fn had_duplicates(&self) -> bool {
        self.removed > 0
    }
}

/// Scan-Phase: ermittelt alle Duplikate, ohne den Baum zu verändern.
///
/// Bei jedem erneuten Auftreten eines Schlüssels wird der bisherige Inhaber
/// zum Opfer und das aktuelle Placemark übernimmt den Schlüssel. Am Ende
/// überlebt so pro Schlüssel das zuletzt gesehene Placemark.
pub fn scan_duplicates(doc: &Document) -> DedupPlan {
    let mut seen: IndexMap<IdentityKey, Occupant> = IndexMap::new();
    let mut plan = DedupPlan::default();

    for placemark in doc.find_descendants(doc.root(), PLACEMARK_TAG) {
        let Some(geometry) = extract_geometry(doc, placemark) else {
            plan.skipped += 1;
            continue;
        };
        plan.scanned += 1;

        let name = doc.get_name(placemark);
        let key = IdentityKey {
            name,
            kind: geometry.kind,
            coordinates: normalize_coordinates(&geometry.coordinates),
        };
        let current = Occupant {
            node: placemark,
            folder: doc.nearest_enclosing_group(placemark),
            raw_coordinates: geometry.coordinates,
        };

        match seen.entry(key) {
            Entry::Occupied(mut entry) => {
                let previous = std::mem::replace(entry.get_mut(), current);
                let key = entry.key();
                log::debug!(
                    "Duplikat: '{}' ({}) in Ordner '{}'",
                    key.name.as_deref().unwrap_or("None"),
                    key.kind,
                    previous.folder.as_deref().unwrap_or("None")
                );
                plan.victims.push(previous.node);
                plan.records.push(RemovalRecord {
                    name: key.name.clone(),
                    kind: key.kind,
                    folder: previous.folder,
                    raw_coordinates: previous.raw_coordinates,
                    coordinates: key.coordinates.clone(),
                });
            }
            Entry::Vacant(entry) => {
                entry.insert(current);
            }
        }
    }

    plan.unique = seen.len();
    plan
}

/// Entfernt alle früheren Vorkommen doppelter Placemarks aus dem Dokument.
pub fn deduplicate_placemarks(doc: &mut Document) -> DeduplicationResult {
    scan_duplicates(doc).apply(doc)
}
