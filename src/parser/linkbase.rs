//! Schema and linkbase parsing: turns the raw XML of the
//! `.xsd` schema and the four linkbases into `ElementCatalog` entries and
//! `ArcTable` groups.
//!
//! All four linkbases share one shape: a set of `<link:loc>` locators
//! (an `xlink:label` name -> an href whose fragment is the concept's local
//! name), a set of resources or further locators that are the arc
//! targets, and a set of arcs (`xlink:from` / `xlink:to` by locator label,
//! plus `order`/`weight`/`preferredLabel`). The label linkbase's targets
//! are label resources (text); the other three linkbases' targets are
//! other concept locators.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{LinkbaseKind as ErrLinkbaseKind, Result, XbrlError};
use crate::model::arc::{Arc, DefinitionArcrole, LinkbaseKind};
use crate::model::element::{BalanceType, ConceptId, DataType, ElementDescriptor, PeriodType};
use crate::model::{ArcTable, ElementCatalog};

use super::xml_util::{attr, local_name, read_text};

/// Best-effort extraction of the concept local name and its schema's
/// default namespace from an `xlink:href` fragment, e.g.
/// `"msft-20230630.xsd#msft_SomeConceptMember"` -> `("msft-20230630.xsd",
/// "SomeConceptMember")` with the prefix ("msft") folded into the returned
/// namespace key by the caller's taxonomy-namespace table.
fn split_href_fragment(href: &str) -> Option<(&str, &str)> {
    let (file, frag) = href.split_once('#')?;
    Some((file, frag))
}

/// Resolve a locator's href fragment (commonly `prefix_LocalName`) into a
/// `ConceptId`, using the namespace table built while parsing schema
/// references so that `us-gaap_Assets` becomes
/// `ConceptId { namespace: "http://fasb.org/us-gaap/...", local_name: "Assets" }`.
fn concept_from_fragment(frag: &str, namespaces: &HashMap<String, String>) -> ConceptId {
    match frag.split_once('_') {
        Some((prefix, local)) if namespaces.contains_key(prefix) => {
            ConceptId::new(namespaces[prefix].clone(), local)
        }
        _ => ConceptId::new("unknown", frag),
    }
}

/// Parse the schema document's element declarations and role-type
/// definitions. Returns (catalog entries to merge, role URI -> definition
/// text, prefix -> namespace URI table built from `xmlns:*` declarations
/// on the schema root plus any `import`/`namespace` pairs).
pub fn parse_schema(
    content: &str,
    file_name: &str,
) -> Result<(Vec<ElementDescriptor>, HashMap<String, String>, HashMap<String, String>)> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut descriptors = Vec::new();
    let mut role_definitions = HashMap::new();
    let mut namespaces = HashMap::new();
    let mut buf = Vec::new();
    let mut target_namespace = String::new();
    let mut current_role_uri: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = local_name(e.name());
                match name.as_str() {
                    "schema" => {
                        if let Some(tns) = attr(e, "targetNamespace") {
                            target_namespace = tns.clone();
                            namespaces.insert("this".to_string(), tns);
                        }
                        for a in e.attributes().filter_map(|a| a.ok()) {
                            let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
                            if let Some(prefix) = key.strip_prefix("xmlns:") {
                                namespaces.insert(
                                    prefix.to_string(),
                                    String::from_utf8_lossy(&a.value).into_owned(),
                                );
                            }
                        }
                    }
                    "element" => {
                        if let Some(element_name) = attr(e, "name") {
                            let is_abstract = attr(e, "abstract")
                                .map(|v| v == "true" || v == "1")
                                .unwrap_or(false);
                            let period_type = match attr(e, "periodType").as_deref() {
                                Some("instant") => PeriodType::Instant,
                                _ => PeriodType::Duration,
                            };
                            let balance_type = match attr(e, "balance").as_deref() {
                                Some("debit") => Some(BalanceType::Debit),
                                Some("credit") => Some(BalanceType::Credit),
                                _ => None,
                            };
                            let data_type = attr(e, "type")
                                .map(|t| classify_data_type(&t))
                                .unwrap_or(DataType::Other);
                            descriptors.push(ElementDescriptor {
                                id: ConceptId::new(target_namespace.clone(), element_name),
                                data_type,
                                period_type,
                                balance_type,
                                is_abstract,
                                labels: HashMap::new(),
                            });
                        }
                    }
                    "roleType" => {
                        if let Some(role_uri) = attr(e, "roleURI") {
                            role_definitions.entry(role_uri.clone()).or_insert_with(String::new);
                            current_role_uri = Some(role_uri);
                        }
                    }
                    "definition" => {
                        let text = read_text(&mut reader);
                        if let Some(uri) = &current_role_uri {
                            role_definitions.insert(uri.clone(), text);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XbrlError::MalformedXbrl {
                    file: file_name.to_string(),
                    reason: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    Ok((descriptors, role_definitions, namespaces))
}

fn classify_data_type(xsd_type: &str) -> DataType {
    let t = xsd_type.to_ascii_lowercase();
    if t.contains("monetary") {
        DataType::Monetary
    } else if t.contains("shares") {
        DataType::Shares
    } else if t.contains("pershare") {
        DataType::PerShare
    } else if t.contains("pure") || t.contains("percent") {
        DataType::Pure
    } else if t.contains("date") {
        DataType::Date
    } else if t.contains("boolean") {
        DataType::Boolean
    } else if t.contains("string") || t.contains("text") {
        DataType::String
    } else {
        DataType::Other
    }
}

/// One `<link:loc>` locator: its `xlink:label` name and the concept it
/// resolves to.
struct Locator {
    concept: ConceptId,
}

fn insert_locator(
    e: &quick_xml::events::BytesStart,
    namespaces: &HashMap<String, String>,
    locators: &mut HashMap<String, Locator>,
) {
    if let (Some(href), Some(label)) = (attr(e, "href"), attr(e, "label")) {
        if let Some((_, frag)) = split_href_fragment(&href) {
            locators.insert(
                label,
                Locator {
                    concept: concept_from_fragment(frag, namespaces),
                },
            );
        }
    }
}

/// One label resource: role + language + text, keyed by `xlink:label`.
struct LabelResource {
    role: String,
    lang: String,
    text: String,
}

/// Parse the label linkbase, attaching every label resource to its
/// concept in the catalog via the loc -> labelArc -> label chain.
pub fn parse_label_linkbase(
    content: &str,
    file_name: &str,
    namespaces: &HashMap<String, String>,
    catalog: &mut ElementCatalog,
) -> Result<()> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut locators: HashMap<String, Locator> = HashMap::new();
    let mut labels: HashMap<String, LabelResource> = HashMap::new();
    let mut arcs: Vec<(String, String)> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) => {
                let name = local_name(e.name());
                match name.as_str() {
                    "loc" => insert_locator(e, namespaces, &mut locators),
                    "labelArc" => {
                        if let (Some(from), Some(to)) = (attr(e, "from"), attr(e, "to")) {
                            arcs.push((from, to));
                        }
                    }
                    "label" => {
                        // Self-closing label resource: no text content.
                        if let Some(label_name) = attr(e, "label") {
                            let role = attr(e, "role")
                                .unwrap_or_else(|| crate::model::element::LABEL_ROLE_STANDARD.to_string());
                            let lang = attr(e, "lang").unwrap_or_else(|| "en-US".to_string());
                            labels.insert(
                                label_name,
                                LabelResource {
                                    role,
                                    lang,
                                    text: String::new(),
                                },
                            );
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name());
                match name.as_str() {
                    "loc" => insert_locator(e, namespaces, &mut locators),
                    "labelArc" => {
                        if let (Some(from), Some(to)) = (attr(e, "from"), attr(e, "to")) {
                            arcs.push((from, to));
                        }
                    }
                    "label" => {
                        if let Some(label_name) = attr(e, "label") {
                            let role = attr(e, "role")
                                .unwrap_or_else(|| crate::model::element::LABEL_ROLE_STANDARD.to_string());
                            let lang = attr(e, "lang").unwrap_or_else(|| "en-US".to_string());
                            let text = read_text(&mut reader);
                            labels.insert(label_name, LabelResource { role, lang, text });
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XbrlError::MalformedXbrl {
                    file: file_name.to_string(),
                    reason: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    for (from, to) in arcs {
        if let (Some(loc), Some(label)) = (locators.get(&from), labels.get(&to)) {
            if label.lang.starts_with("en") {
                catalog.attach_label(&loc.concept, label.role.clone(), label.text.clone());
            }
        }
    }

    Ok(())
}

/// Parse one of the presentation/calculation/definition linkbases into
/// `Arc`s grouped by extended-link role.
///
/// Missing calculation/definition linkbases degrade to an empty
/// `ArcTable` contribution; callers simply don't invoke this
/// for a bundle that lacks the file, rather than treating absence as an
/// error here.
pub fn parse_relationship_linkbase(
    content: &str,
    file_name: &str,
    kind: LinkbaseKind,
    namespaces: &HashMap<String, String>,
    arcs_out: &mut ArcTable,
) -> Result<()> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut current_role = String::new();
    let mut locators: HashMap<String, Locator> = HashMap::new();
    let mut raw_arcs: Vec<RawArc> = Vec::new();
    let mut doc_order: f64 = 0.0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = local_name(e.name());
                match name.as_str() {
                    "presentationLink" | "calculationLink" | "definitionLink" => {
                        current_role = attr(e, "role").unwrap_or_default();
                        locators.clear();
                    }
                    "loc" => {
                        if let (Some(href), Some(label)) = (attr(e, "href"), attr(e, "label")) {
                            if let Some((_, frag)) = split_href_fragment(&href) {
                                locators.insert(
                                    label,
                                    Locator {
                                        concept: concept_from_fragment(frag, namespaces),
                                    },
                                );
                            }
                        }
                    }
                    "presentationArc" | "calculationArc" | "definitionArc" => {
                        let from = attr(e, "from");
                        let to = attr(e, "to");
                        let order = attr(e, "order")
                            .and_then(|v| v.parse::<f64>().ok())
                            .unwrap_or_else(|| {
                                doc_order += 1.0;
                                doc_order
                            });
                        let weight = attr(e, "weight").and_then(|v| v.parse::<f64>().ok());
                        let preferred_label = attr(e, "preferredLabel");
                        let arcrole = attr(e, "arcrole");
                        if let (Some(from), Some(to)) = (from, to) {
                            raw_arcs.push(RawArc {
                                from,
                                to,
                                order,
                                weight,
                                preferred_label,
                                arcrole,
                            });
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                let name = local_name(e.name());
                if matches!(
                    name.as_str(),
                    "presentationLink" | "calculationLink" | "definitionLink"
                ) {
                    flush_role(&current_role, kind, &locators, &raw_arcs, arcs_out);
                    raw_arcs.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XbrlError::MalformedXbrl {
                    file: file_name.to_string(),
                    reason: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

struct RawArc {
    from: String,
    to: String,
    order: f64,
    weight: Option<f64>,
    preferred_label: Option<String>,
    arcrole: Option<String>,
}

fn flush_role(
    role: &str,
    kind: LinkbaseKind,
    locators: &HashMap<String, Locator>,
    raw_arcs: &[RawArc],
    arcs_out: &mut ArcTable,
) {
    for raw in raw_arcs {
        let (Some(from), Some(to)) = (locators.get(&raw.from), locators.get(&raw.to)) else {
            continue;
        };
        let definition_arcrole = if kind == LinkbaseKind::Definition {
            raw.arcrole.as_deref().map(DefinitionArcrole::from_uri)
        } else {
            None
        };
        arcs_out.push(
            kind,
            Arc {
                from: from.concept.clone(),
                to: to.concept.clone(),
                role: role.to_string(),
                order: raw.order,
                preferred_label: raw.preferred_label.clone(),
                weight: if kind == LinkbaseKind::Calculation {
                    Some(raw.weight.unwrap_or(1.0))
                } else {
                    None
                },
                definition_arcrole,
            },
        );
    }
}

/// Surface a `MissingLinkbase` error for the required linkbases (presentation,
/// label). Calculation and definition are optional.
pub fn require_present(kind: ErrLinkbaseKind, present: bool) -> Result<()> {
    if present {
        Ok(())
    } else {
        Err(XbrlError::MissingLinkbase { kind })
    }
}
