//! Writer für KML-Dokumente.

use crate::core::{Document, NodeId};

/// Einrückung pro Ebene
const INDENT: &str = "  ";

/// Schreibt ein [`Document`] als KML-String.
///
/// Die Ausgabe ist deterministisch: Attribute in gespeicherter Reihenfolge,
/// Kinder in Baum-Reihenfolge, zwei Leerzeichen Einrückung. Ausgehängte
/// Knoten erscheinen nicht.
pub fn write_kml(doc: &Document) -> String {
    let mut output = String::new();
    output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    write_element(doc, doc.root(), 0, &mut output);
    output
}

fn write_element(doc: &Document, id: NodeId, depth: usize, output: &mut String) {
    let node = doc.node(id);
    let indent = INDENT.repeat(depth);

    output.push_str(&indent);
    output.push('<');
    output.push_str(&node.tag);
    for (key, value) in &node.attributes {
        output.push_str(&format!(" {}=\"{}\"", key, escape_xml(value)));
    }

    if node.children().is_empty() {
        match node.text.as_deref() {
            Some(text) => {
                output.push_str(&format!(">{}</{}>\n", escape_xml(text), node.tag));
            }
            None => output.push_str("/>\n"),
        }
        return;
    }

    output.push('>');
    if let Some(text) = node.text.as_deref() {
        output.push_str(&escape_xml(text));
    }
    output.push('\n');

    for &child in node.children() {
        write_element(doc, child, depth + 1, output);
    }

    output.push_str(&format!("{}</{}>\n", indent, node.tag));
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("Lot A & B"), "Lot A &amp; B");
        assert_eq!(escape_xml("<b>\"x\"</b>"), "&lt;b&gt;&quot;x&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_write_layout() {
        let mut doc = Document::new(
            "kml",
            vec![(
                "xmlns".to_string(),
                "http://www.opengis.net/kml/2.2".to_string(),
            )],
        );
        let document = doc.append_child(doc.root(), "Document", Vec::new());
        let placemark = doc.append_child(document, "Placemark", vec![("id".into(), "p1".into())]);
        let name = doc.append_child(placemark, "name", Vec::new());
        doc.set_text(name, "Lot A");
        doc.append_child(placemark, "visibility", Vec::new());

        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark id="p1">
      <name>Lot A</name>
      <visibility/>
    </Placemark>
  </Document>
</kml>
"#;
        assert_eq!(write_kml(&doc), expected);
    }

    #[test]
    fn test_removed_nodes_are_not_written() {
        let mut doc = Document::new("kml", Vec::new());
        let keep = doc.append_child(doc.root(), "Placemark", Vec::new());
        let drop = doc.append_child(doc.root(), "GroundOverlay", Vec::new());
        doc.set_text(keep, "bleibt");
        doc.remove(drop);

        let written = write_kml(&doc);
        assert!(written.contains("<Placemark>bleibt</Placemark>"));
        assert!(!written.contains("GroundOverlay"));
    }
}
