//! Arc model: the raw relations parsed out of the presentation,
//! calculation, and definition linkbases before tree-building.

use std::collections::HashMap;

use super::element::ConceptId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkbaseKind {
    Presentation,
    Calculation,
    Definition,
}

/// Definition-linkbase arcrole qualifiers this crate cares about. Only the
/// dimensional arcroles are distinguished; anything else is tracked as
/// `Other` so it's still available to a caller inspecting the raw arc, but
/// doesn't need its own tree-building code path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DefinitionArcrole {
    HypercubeDimension,
    DimensionDomain,
    DomainMember,
    DimensionDefault,
    Other(String),
}

impl DefinitionArcrole {
    pub fn from_uri(uri: &str) -> Self {
        if uri.ends_with("hypercube-dimension") {
            DefinitionArcrole::HypercubeDimension
        } else if uri.ends_with("dimension-domain") {
            DefinitionArcrole::DimensionDomain
        } else if uri.ends_with("domain-member") {
            DefinitionArcrole::DomainMember
        } else if uri.ends_with("dimension-default") {
            DefinitionArcrole::DimensionDefault
        } else {
            DefinitionArcrole::Other(uri.to_string())
        }
    }
}

/// A single directed arc edge. `order` defaults to
/// document order when the source XML omits an explicit `order`/`xlink:order`
/// attribute.
#[derive(Debug, Clone)]
pub struct Arc {
    pub from: ConceptId,
    pub to: ConceptId,
    pub role: String,
    pub order: f64,
    pub preferred_label: Option<String>,
    /// Calculation-linkbase weight; defaults to +1.0 when absent.
    pub weight: Option<f64>,
    pub definition_arcrole: Option<DefinitionArcrole>,
}

/// Arcs grouped by (linkbase kind, role URI); each group forms one tree.
#[derive(Debug, Clone, Default)]
pub struct ArcTable {
    groups: HashMap<(LinkbaseKind, String), Vec<Arc>>,
}

impl ArcTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: LinkbaseKind, arc: Arc) {
        self.groups
            .entry((kind, arc.role.clone()))
            .or_default()
            .push(arc);
    }

    pub fn roles(&self, kind: LinkbaseKind) -> impl Iterator<Item = &str> {
        self.groups
            .keys()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, role)| role.as_str())
    }

    pub fn arcs_for(&self, kind: LinkbaseKind, role: &str) -> &[Arc] {
        self.groups
            .get(&(kind, role.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
