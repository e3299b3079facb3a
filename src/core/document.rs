//! KML-Dokumentbaum als Arena.
//!
//! Alle Knoten liegen in einem `Vec<Node>` und werden über [`NodeId`]
//! adressiert. Jeder Knoten kennt seinen Eltern-Index und die geordnete Liste
//! seiner Kinder. Entfernen hängt einen Knoten nur aus der Kinderliste des
//! Eltern-Knotens aus; der Speicher bleibt bis zum Ende des Laufs bestehen,
//! bereits berechnete `NodeId`s bleiben dadurch gültig.

pub mod dedup;


pub use dedup::{
    deduplicate_placemarks, scan_duplicates, DedupPlan, DeduplicationResult, IdentityKey,
    RemovalRecord,
};

/// Tag-Name eines Placemarks (ohne Namespace).
pub const PLACEMARK_TAG: &str = "Placemark";
/// Tag-Name eines Ordners (ohne Namespace).
pub const FOLDER_TAG: &str = "Folder";
/// Tag-Name eines Namens-Elements (ohne Namespace).
pub const NAME_TAG: &str = "name";
/// Tag-Name eines Ground-Overlays (ohne Namespace).
pub const GROUND_OVERLAY_TAG: &str = "GroundOverlay";

/// Stabiler Index eines Knotens in der Arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Ein Element des KML-Baums.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Vollständiger Tag-Name inkl. Namespace-Präfix (z.B. `kml:Placemark`)
    pub tag: String,
    /// Attribute in Quell-Reihenfolge (Schlüssel, unescapter Wert)
    pub attributes: Vec<(String, String)>,
    /// Textinhalt (Text, CDATA und Entity-Referenzen zusammengefügt)
    pub text: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    fn new(tag: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            tag,
            attributes,
            text: None,
            children: Vec::new(),
            parent: None,
        }
    }

    /// Tag-Name ohne Namespace-Präfix.
    pub fn local_name(&self) -> &str {
        local_name(&self.tag)
    }

    /// Kinder in Dokument-Reihenfolge
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Eltern-Knoten (None für die Wurzel und ausgehängte Knoten)
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Entfernt ein Namespace-Präfix (`kml:Placemark` → `Placemark`,
/// `{http://www.opengis.net/kml/2.2}Placemark` → `Placemark`).
///
/// Alle Tag-Vergleiche im Crate laufen über diese Funktion.
pub fn local_name(tag: &str) -> &str {
    let tag = tag.rsplit_once('}').map_or(tag, |(_, rest)| rest);
    tag.rsplit_once(':').map_or(tag, |(_, rest)| rest)
}

/// Prüft ob ein Tag (Namespace-bereinigt) dem gesuchten Namen entspricht.
pub fn tag_matches(tag: &str, wanted: &str) -> bool {
    local_name(tag) == wanted
}

/// Geparstes KML-Dokument.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Erstellt ein Dokument mit einem einzelnen Wurzel-Element.
    pub fn new(root_tag: impl Into<String>, attributes: Vec<(String, String)>) -> Self {
        Self {
            nodes: vec![Node::new(root_tag.into(), attributes)],
            root: NodeId(0),
        }
    }

    /// Wurzel-Element (`<kml>`)
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Zugriff auf einen Knoten.
    ///
    /// `NodeId`s stammen immer aus diesem Dokument; ein fremder Index ist ein
    /// Programmierfehler.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Anzahl aller jemals angelegten Knoten (inkl. ausgehängter)
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Hängt ein neues Element als letztes Kind an `parent` an.
    pub fn append_child(
        &mut self,
        parent: NodeId,
        tag: impl Into<String>,
        attributes: Vec<(String, String)>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut node = Node::new(tag.into(), attributes);
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Setzt den Textinhalt eines Elements.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id.0].text = Some(text.into());
    }

    /// Hängt einen Knoten (samt Teilbaum) aus seinem Eltern-Knoten aus.
    ///
    /// Gibt `false` zurück für die Wurzel oder bereits ausgehängte Knoten.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return false;
        };
        self.nodes[parent.0].children.retain(|&child| child != id);
        true
    }

    /// Prüft ob ein Knoten noch über die Wurzel erreichbar ist.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Alle Nachfahren von `node` (ohne `node` selbst), deren Tag ohne
    /// Namespace `tag` entspricht, in Dokument-Reihenfolge.
    pub fn find_descendants(&self, node: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(node)
            .filter(|&id| tag_matches(&self.nodes[id.0].tag, tag))
            .collect()
    }

    /// Erster Nachfahre mit passendem Tag in Dokument-Reihenfolge.
    pub fn find_first_descendant(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(node)
            .find(|&id| tag_matches(&self.nodes[id.0].tag, tag))
    }

    /// Direktes Kind mit passendem Tag.
    pub fn find_child(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        self.nodes[node.0]
            .children
            .iter()
            .copied()
            .find(|&id| tag_matches(&self.nodes[id.0].tag, tag))
    }

    /// Pre-Order-Iterator über alle Nachfahren (ohne `node` selbst).
    pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.nodes[node.0].children.clone();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Name eines Knotens: Text des direkten `<name>`-Kinds, sonst des ersten
    /// `<name>`-Nachfahren. Führende/abschließende Leerzeichen werden entfernt,
    /// ein leerer Name gilt als fehlend.
    pub fn get_name(&self, node: NodeId) -> Option<String> {
        let name_node = self
            .find_child(node, NAME_TAG)
            .or_else(|| self.find_first_descendant(node, NAME_TAG))?;
        self.text_of(name_node)
    }

    /// Getrimmter Text eines Knotens; leer oder nur Whitespace ergibt `None`.
    fn text_of(&self, node: NodeId) -> Option<String> {
        self.nodes[node.0]
            .text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }

    /// Name des nächstgelegenen benannten `<Folder>`-Vorfahren.
    ///
    /// Unbenannte Ordner werden übersprungen; ohne benannten Ordner bis zur
    /// Wurzel ist das Ergebnis `None`.
    pub fn nearest_enclosing_group(&self, node: NodeId) -> Option<String> {
        let mut current = self.nodes[node.0].parent;
        while let Some(ancestor) = current {
            if tag_matches(&self.nodes[ancestor.0].tag, FOLDER_TAG) {
                let name = self
                    .find_child(ancestor, NAME_TAG)
                    .and_then(|name_node| self.text_of(name_node));
                if name.is_some() {
                    return name;
                }
            }
            current = self.nodes[ancestor.0].parent;
        }
        None
    }

    /// Entfernt alle `<GroundOverlay>`-Elemente aus dem Baum.
    ///
    /// Gibt die Anzahl entfernter Overlays zurück.
    pub fn remove_ground_overlays(&mut self) -> usize {
        let overlays = self.find_descendants(self.root, GROUND_OVERLAY_TAG);
        let mut removed = 0;
        for overlay in overlays {
            // Verschachtelte Overlays verschwinden mit ihrem Vorfahren
            if self.is_attached(overlay) && self.remove(overlay) {
                removed += 1;
            }
        }
        removed
    }
}

/// Pre-Order-Iterator über einen Teilbaum, siehe [`Document::descendants`].
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.nodes[id.0].children.iter().rev().copied());
        Some(id)
    }
}
