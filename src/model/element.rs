//! Element catalog: the taxonomy-concept descriptors every arc and fact
//! resolves against.

use std::collections::HashMap;

/// The scalar kind a concept carries. `Monetary` and `PerShare` both need a
/// unit; `Shares` facts carry a "shares" unit; `Pure` is for ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Monetary,
    Shares,
    PerShare,
    Pure,
    String,
    Date,
    Boolean,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodType {
    Duration,
    Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BalanceType {
    Debit,
    Credit,
}

/// A qualified concept name: namespace URI + local name. Kept as a pair
/// rather than a single interned string so that a company extension
/// concept never collides with a `us-gaap` concept of the same local name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ConceptId {
    pub namespace: String,
    pub local_name: String,
}

impl ConceptId {
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    /// `prefix:LocalName`-style rendering used in diagnostics and labels
    /// when no standard label is available.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.namespace_prefix(), self.local_name)
    }

    /// Best-effort short prefix for a namespace URI (e.g.
    /// `http://fasb.org/us-gaap/2023` -> `us-gaap`). Falls back to the full
    /// URI when no recognizable taxonomy marker is present.
    fn namespace_prefix(&self) -> String {
        for marker in ["us-gaap", "dei", "ifrs-full", "srt"] {
            if self.namespace.contains(marker) {
                return marker.to_string();
            }
        }
        self.namespace.clone()
    }
}

/// A single element descriptor in the catalog.
#[derive(Debug, Clone)]
pub struct ElementDescriptor {
    pub id: ConceptId,
    pub data_type: DataType,
    pub period_type: PeriodType,
    pub balance_type: Option<BalanceType>,
    pub is_abstract: bool,
    /// Label role URI -> label text (e.g. the standard-label role,
    /// terse-label role, period-start/period-end roles).
    pub labels: HashMap<String, String>,
}

pub const LABEL_ROLE_STANDARD: &str = "http://www.xbrl.org/2003/role/label";
pub const LABEL_ROLE_TERSE: &str = "http://www.xbrl.org/2003/role/terseLabel";
pub const LABEL_ROLE_PERIOD_START: &str = "http://www.xbrl.org/2003/role/periodStartLabel";
pub const LABEL_ROLE_PERIOD_END: &str = "http://www.xbrl.org/2003/role/periodEndLabel";
pub const LABEL_ROLE_NEGATED: &str = "http://www.xbrl.org/2009/role/negatedLabel";

/// Local-name suffixes that mark an abstract "header" concept even when the
/// taxonomy's `abstract` flag wasn't set on the element itself.
const ABSTRACT_SUFFIXES: &[&str] = &["Abstract", "Axis", "Domain", "Member", "LineItems", "Table"];

impl ElementDescriptor {
    pub fn label(&self, role: &str) -> Option<&str> {
        self.labels.get(role).map(String::as_str)
    }

    pub fn standard_label(&self) -> &str {
        self.label(LABEL_ROLE_STANDARD)
            .unwrap_or(self.id.local_name.as_str())
    }

    /// True if the catalog's own abstract flag is set, or the local name
    /// matches one of the structural-header suffixes.
    pub fn is_structurally_abstract(&self) -> bool {
        self.is_abstract
            || ABSTRACT_SUFFIXES
                .iter()
                .any(|suffix| self.id.local_name.ends_with(suffix))
    }
}

/// Mapping from concept id to descriptor, shared and effectively immutable
/// after parse.
#[derive(Debug, Clone, Default)]
pub struct ElementCatalog {
    entries: HashMap<ConceptId, ElementDescriptor>,
}

impl ElementCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, descriptor: ElementDescriptor) {
        self.entries.insert(descriptor.id.clone(), descriptor);
    }

    pub fn get(&self, id: &ConceptId) -> Option<&ElementDescriptor> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &ConceptId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConceptId, &ElementDescriptor)> {
        self.entries.iter()
    }

    /// Attach a label to a concept's descriptor, inserting a minimal
    /// placeholder descriptor first if the concept hasn't been seen by the
    /// schema walk yet. Labels are parsed first, often before the concept's own type information.
    pub fn attach_label(&mut self, id: &ConceptId, role: String, text: String) {
        let entry = self.entries.entry(id.clone()).or_insert_with(|| ElementDescriptor {
            id: id.clone(),
            data_type: DataType::Other,
            period_type: PeriodType::Duration,
            balance_type: None,
            is_abstract: false,
            labels: HashMap::new(),
        });
        entry.labels.insert(role, text);
    }
}
