//! Geometrie-Erkennung und Koordinaten-Normalisierung für Placemarks.

use super::document::{Document, NodeId};
use std::fmt;

/// Tag-Name des Koordinaten-Elements (ohne Namespace).
pub const COORDINATES_TAG: &str = "coordinates";

/// Anzahl Nachkommastellen beim Vergleich von Koordinaten.
pub const COORDINATE_DECIMALS: i32 = 6;

const COORDINATE_SCALE: f64 = 1_000_000.0;

/// Geometrie-Art eines Placemarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeometryKind {
    Polygon,
    LineString,
    MultiGeometry,
    LinearRing,
    Point,
}

impl GeometryKind {
    /// Suchreihenfolge: die erste gefundene Art gewinnt.
    pub const PRIORITY: [GeometryKind; 5] = [
        GeometryKind::Polygon,
        GeometryKind::LineString,
        GeometryKind::MultiGeometry,
        GeometryKind::LinearRing,
        GeometryKind::Point,
    ];

    /// KML-Tag-Name ohne Namespace
    pub fn tag(self) -> &'static str {
        match self {
            GeometryKind::Polygon => "Polygon",
            GeometryKind::LineString => "LineString",
            GeometryKind::MultiGeometry => "MultiGeometry",
            GeometryKind::LinearRing => "LinearRing",
            GeometryKind::Point => "Point",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Gefundene Geometrie eines Placemarks.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub kind: GeometryKind,
    /// Geometrie-Element im Baum
    pub node: NodeId,
    /// Unveränderter Text des ersten `<coordinates>`-Elements (leer, falls keines)
    pub coordinates: String,
}

/// Normalisierte Koordinate (auf 6 Nachkommastellen gerundet).
///
/// Intern als Mikrograd gespeichert, damit Gleichheit und Hash exakt auf der
/// gerundeten Darstellung arbeiten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    lon_micro: i64,
    lat_micro: i64,
}

impl Coordinate {
    /// Rundet Längen- und Breitengrad auf 6 Nachkommastellen.
    ///
    /// Gibt `None` für nicht-endliche Werte und für Werte zurück, deren
    /// Mikrograd nicht in `i64` passen.
    pub fn from_degrees(lon: f64, lat: f64) -> Option<Self> {
        Some(Self {
            lon_micro: to_micro(lon)?,
            lat_micro: to_micro(lat)?,
        })
    }

    pub fn lon(self) -> f64 {
        self.lon_micro as f64 / COORDINATE_SCALE
    }

    pub fn lat(self) -> f64 {
        self.lat_micro as f64 / COORDINATE_SCALE
    }
}

/// Skaliert auf Mikrograd; `as i64` würde außerhalb des Wertebereichs sättigen.
fn to_micro(degrees: f64) -> Option<i64> {
    let scaled = (degrees * COORDINATE_SCALE).round();
    let in_range = scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64;
    in_range.then_some(scaled as i64)
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon(), self.lat())
    }
}

/// Sucht die Geometrie eines Placemarks.
///
/// Die Geometrie-Arten werden in der Reihenfolge von [`GeometryKind::PRIORITY`]
/// im gesamten Teilbaum gesucht (nicht nur direkte Kinder). Eine
/// `MultiGeometry` mit Polygonen wird daher als `Polygon` erkannt.
pub fn extract_geometry(doc: &Document, placemark: NodeId) -> Option<Geometry> {
    GeometryKind::PRIORITY.iter().find_map(|&kind| {
        let node = doc.find_first_descendant(placemark, kind.tag())?;
        let coordinates = doc
            .find_first_descendant(node, COORDINATES_TAG)
            .and_then(|coords| doc.node(coords).text.clone())
            .unwrap_or_default();
        Some(Geometry {
            kind,
            node,
            coordinates,
        })
    })
}

/// Zerlegt einen `<coordinates>`-Text in gerundete (lon, lat)-Paare.
///
/// Tupel werden durch Whitespace getrennt, Felder durch Komma. Tupel mit
/// weniger als zwei Feldern oder nicht-numerischen Werten werden übersprungen.
pub fn normalize_coordinates(text: &str) -> Vec<Coordinate> {
    text.split_whitespace()
        .filter_map(|tuple| {
            let mut fields = tuple.split(',');
            let lon = fields.next()?.trim().parse::<f64>().ok()?;
            let lat = fields.next()?.trim().parse::<f64>().ok()?;
            Coordinate::from_degrees(lon, lat)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_rounds_to_six_decimals() {
        let coords = normalize_coordinates("10.12345649,50.9876544,0 -3.5,40.0000004");
        assert_eq!(coords.len(), 2);
        assert_relative_eq!(coords[0].lon(), 10.123456, epsilon = 1e-9);
        assert_relative_eq!(coords[0].lat(), 50.987654, epsilon = 1e-9);
        assert_relative_eq!(coords[1].lon(), -3.5, epsilon = 1e-9);
        assert_relative_eq!(coords[1].lat(), 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_normalize_skips_malformed_tuples() {
        let coords = normalize_coordinates("1.0,2.0,0 abc,def 3.0,4.0,0");
        assert_eq!(coords.len(), 2);

        let coords = normalize_coordinates("5.0 ,6.0 7.0,nan 8.0,9.0");
        assert_eq!(coords, vec![Coordinate::from_degrees(8.0, 9.0).unwrap()]);
    }

    #[test]
    fn test_normalize_empty_text() {
        assert!(normalize_coordinates("").is_empty());
        assert!(normalize_coordinates("  \n\t ").is_empty());
    }

    #[test]
    fn test_precision_tolerance() {
        let a = normalize_coordinates("1.1234561,2.0");
        let b = normalize_coordinates("1.1234564,2.0");
        assert_eq!(a, b);

        let c = normalize_coordinates("1.123457,2.0");
        assert_ne!(a, c);
    }

    #[test]
    fn test_out_of_range_values_are_malformed() {
        assert_eq!(Coordinate::from_degrees(1e20, 0.0), None);
        assert_eq!(Coordinate::from_degrees(0.0, -2e20), None);
        assert!(Coordinate::from_degrees(9.0e12, 0.0).is_some());

        let coords = normalize_coordinates("1e20,0 2e20,0 8.0,47.0");
        assert_eq!(coords, vec![Coordinate::from_degrees(8.0, 47.0).unwrap()]);
    }

    #[test]
    fn test_coordinate_display() {
        let c = Coordinate::from_degrees(8.5, -47.25).unwrap();
        assert_eq!(c.to_string(), "(8.500000, -47.250000)");
    }

    #[test]
    fn test_extract_geometry_priority() {
        let mut doc = Document::new("kml", Vec::new());
        let placemark = doc.append_child(doc.root(), "Placemark", Vec::new());
        let multi = doc.append_child(placemark, "MultiGeometry", Vec::new());
        let point = doc.append_child(multi, "Point", Vec::new());
        let point_coords = doc.append_child(point, "coordinates", Vec::new());
        doc.set_text(point_coords, "1,1,0");
        let polygon = doc.append_child(multi, "Polygon", Vec::new());
        let polygon_coords = doc.append_child(polygon, "coordinates", Vec::new());
        doc.set_text(polygon_coords, "2,2,0 3,3,0");

        let geometry = extract_geometry(&doc, placemark).expect("Geometrie erwartet");
        assert_eq!(geometry.kind, GeometryKind::Polygon);
        assert_eq!(geometry.node, polygon);
        assert_eq!(geometry.coordinates, "2,2,0 3,3,0");
    }

    #[test]
    fn test_extract_geometry_without_coordinates() {
        let mut doc = Document::new("kml", Vec::new());
        let placemark = doc.append_child(doc.root(), "kml:Placemark", Vec::new());
        doc.append_child(placemark, "kml:LineString", Vec::new());

        let geometry = extract_geometry(&doc, placemark).expect("Geometrie erwartet");
        assert_eq!(geometry.kind, GeometryKind::LineString);
        assert!(geometry.coordinates.is_empty());
    }

    #[test]
    fn test_extract_geometry_absent() {
        let mut doc = Document::new("kml", Vec::new());
        let placemark = doc.append_child(doc.root(), "Placemark", Vec::new());
        let name = doc.append_child(placemark, "name", Vec::new());
        doc.set_text(name, "Nur Name");

        assert!(extract_geometry(&doc, placemark).is_none());
    }
}
