//! Parser für KML-Dokumente.

use crate::core::{Document, NodeId};
use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;


/// Parsed ein KML-Dokument aus einem XML-String in einen [`Document`]-Baum.
///
/// Text, CDATA und Entity-Referenzen eines Elements werden in Reihenfolge
/// zusammengefügt. Reiner Einrückungs-Whitespace zwischen Kind-Elementen wird
/// verworfen. Kommentare und Processing-Instructions werden ignoriert.
pub fn parse_kml(xml_content: &str) -> Result<Document> {
    let mut reader = Reader::from_str(xml_content);

    let mut buffer = Vec::new();
    let mut document: Option<Document> = None;
    // Offene Elemente und ihr bisher gesammelter Text
    let mut open: Vec<(NodeId, String)> = Vec::new();

    loop {
        match reader.read_event_into(&mut buffer) {
            Ok(Event::Start(ref e)) => {
                let id = open_element(&reader, e, &mut document, &open)?;
                open.push((id, String::new()));
            }
            Ok(Event::Empty(ref e)) => {
                open_element(&reader, e, &mut document, &open)?;
            }
            Ok(Event::End(_)) => {
                let (id, text) = open
                    .pop()
                    .context("Schließendes Tag ohne öffnendes Element")?;
                if let Some(doc) = document.as_mut() {
                    finish_text(doc, id, text);
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.xml_content()?;
                if let Some((_, collected)) = open.last_mut() {
                    collected.push_str(&text);
                } else if !text.trim().is_empty() {
                    bail!("Text außerhalb des Wurzel-Elements: '{}'", text.trim());
                }
            }
            Ok(Event::CData(e)) => {
                let text = reader.decoder().decode(&e)?;
                if let Some((_, collected)) = open.last_mut() {
                    collected.push_str(&text);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some((_, collected)) = open.last_mut() {
                    if let Some(ch) = e.resolve_char_ref()? {
                        collected.push(ch);
                    } else {
                        let name = e.decode()?;
                        match quick_xml::escape::resolve_predefined_entity(&name) {
                            Some(resolved) => collected.push_str(resolved),
                            None => {
                                log::warn!("Unbekannte Entity '&{};' bleibt unverändert", name);
                                collected.push('&');
                                collected.push_str(&name);
                                collected.push(';');
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(err).with_context(|| {
                    format!(
                        "Fehler beim Parsen des KML an Position {}",
                        reader.buffer_position()
                    )
                })
            }
            _ => {}
        }

        buffer.clear();
    }

    if let Some((id, _)) = open.last() {
        let tag = document
            .as_ref()
            .map(|doc| doc.node(*id).tag.clone())
            .unwrap_or_default();
        bail!("Element <{}> wird nicht geschlossen", tag);
    }

    document.context("Kein Wurzel-Element gefunden")
}

/// Legt ein Element an: als Wurzel, falls noch keine existiert, sonst als
/// Kind des innersten offenen Elements.
fn open_element(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
    document: &mut Option<Document>,
    open: &[(NodeId, String)],
) -> Result<NodeId> {
    let name = e.name();
    let tag = reader.decoder().decode(name.as_ref())?.into_owned();

    let mut attributes = Vec::new();
    for attr in e.attributes().with_checks(false) {
        let attr = attr?;
        let key = reader.decoder().decode(attr.key.as_ref())?.into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    let Some(doc) = document.as_mut() else {
        return Ok(document.insert(Document::new(tag, attributes)).root());
    };

    match open.last() {
        Some((parent, _)) => Ok(doc.append_child(*parent, tag, attributes)),
        None => bail!("Mehr als ein Wurzel-Element (<{}>)", tag),
    }
}

/// Übernimmt den gesammelten Text in den Knoten.
///
/// Elemente mit Kindern behalten nur getrimmten, nicht-leeren Text;
/// Blatt-Elemente behalten ihren Text unverändert.
fn finish_text(doc: &mut Document, id: NodeId, text: String) {
    let has_children = !doc.node(id).children().is_empty();
    if has_children {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            doc.set_text(id, trimmed);
        }
    } else if !text.is_empty() {
        doc.set_text(id, text);
    }
}
