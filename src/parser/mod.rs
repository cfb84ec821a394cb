//! Linkbase & Instance Parser: turns a bundle of named byte
//! buffers into the shared `XbrlDocument` model. This is the only
//! component that touches raw bytes — everything downstream operates on
//! the typed model.

mod instance;
mod linkbase;
mod xml_util;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{LinkbaseKind as ErrLinkbaseKind, Result, XbrlError};
use crate::model::arc::LinkbaseKind;
use crate::model::{ArcTable, ElementCatalog, XbrlDocument};

/// One named byte buffer from a filing bundle, e.g. `("msft-20230630_pre.xml",
/// bytes)`. The core does no I/O of its own — a byte-stream
/// provider collaborator supplies these.
pub struct NamedBuffer<'a> {
    pub file_name: &'a str,
    pub bytes: &'a [u8],
}

impl<'a> NamedBuffer<'a> {
    pub fn new(file_name: &'a str, bytes: &'a [u8]) -> Self {
        Self { file_name, bytes }
    }
}

fn suffix_kind(file_name: &str) -> Option<ErrLinkbaseKind> {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".xsd") {
        Some(ErrLinkbaseKind::Schema)
    } else if lower.ends_with("_pre.xml") || lower.contains("presentation") {
        Some(ErrLinkbaseKind::Presentation)
    } else if lower.ends_with("_cal.xml") || lower.contains("calculation") {
        Some(ErrLinkbaseKind::Calculation)
    } else if lower.ends_with("_def.xml") || lower.contains("definition") {
        Some(ErrLinkbaseKind::Definition)
    } else if lower.ends_with("_lab.xml") || lower.contains("label") {
        Some(ErrLinkbaseKind::Label)
    } else {
        None
    }
}

/// Parse a full filing bundle into an `XbrlDocument`. Missing
/// calculation/definition linkbases degrade to empty tree contributions;
/// a missing presentation or label linkbase, or an instance that never
/// resolves (no inline-XBRL region and no stand-alone XBRL root), is
/// fatal.
pub fn parse_bundle(buffers: &[NamedBuffer<'_>]) -> Result<XbrlDocument> {
    let mut catalog = ElementCatalog::new();
    let mut role_definitions = HashMap::new();
    let mut namespaces = HashMap::new();
    let mut arcs = ArcTable::new();

    let mut have_presentation = false;
    let mut have_label = false;
    let mut have_instance = false;

    // Schemas first: they establish the namespace table every locator
    // fragment in the linkbases needs to resolve against.
    for buf in buffers {
        if suffix_kind(buf.file_name) == Some(ErrLinkbaseKind::Schema) {
            let content = String::from_utf8_lossy(buf.bytes);
            debug!(file = buf.file_name, "parsing schema");
            let (descriptors, roles, ns) = linkbase::parse_schema(&content, buf.file_name)?;
            for d in descriptors {
                catalog.insert(d);
            }
            role_definitions.extend(roles);
            namespaces.extend(ns);
        }
    }

    // Labels next.
    for buf in buffers {
        if suffix_kind(buf.file_name) == Some(ErrLinkbaseKind::Label) {
            have_label = true;
            let content = String::from_utf8_lossy(buf.bytes);
            debug!(file = buf.file_name, "parsing label linkbase");
            linkbase::parse_label_linkbase(&content, buf.file_name, &namespaces, &mut catalog)?;
        }
    }

    for buf in buffers {
        let kind = match suffix_kind(buf.file_name) {
            Some(ErrLinkbaseKind::Presentation) => {
                have_presentation = true;
                Some(LinkbaseKind::Presentation)
            }
            Some(ErrLinkbaseKind::Calculation) => Some(LinkbaseKind::Calculation),
            Some(ErrLinkbaseKind::Definition) => Some(LinkbaseKind::Definition),
            _ => None,
        };
        if let Some(kind) = kind {
            let content = String::from_utf8_lossy(buf.bytes);
            debug!(file = buf.file_name, ?kind, "parsing relationship linkbase");
            linkbase::parse_relationship_linkbase(&content, buf.file_name, kind, &namespaces, &mut arcs)?;
        }
    }

    linkbase::require_present(ErrLinkbaseKind::Presentation, have_presentation)?;
    linkbase::require_present(ErrLinkbaseKind::Label, have_label)?;

    let mut contexts = HashMap::new();
    let mut units = HashMap::new();
    let mut facts = Vec::new();
    let mut document_period_end_date = None;
    let mut entity_identifier = None;

    for buf in buffers {
        if suffix_kind(buf.file_name).is_none() {
            // Candidate instance (stand-alone .xml or inline-XBRL .htm).
            let content = String::from_utf8_lossy(buf.bytes);
            if let Some(parsed) = instance::parse_instance(&content, buf.file_name, &namespaces)? {
                have_instance = true;
                contexts.extend(parsed.contexts);
                units.extend(parsed.units);
                facts.extend(parsed.facts);
                document_period_end_date = document_period_end_date.or(parsed.document_period_end_date);
                entity_identifier = entity_identifier.or(parsed.entity_identifier);
            }
        }
    }

    if !have_instance {
        return Err(XbrlError::MissingLinkbase {
            kind: ErrLinkbaseKind::Instance,
        });
    }

    if document_period_end_date.is_none() {
        warn!("no dei:DocumentPeriodEndDate found; period selector's document-date filter will admit all periods");
    }

    // Structural invariant: every concept referenced by an arc must
    // resolve in the catalog.
    for kind in [
        LinkbaseKind::Presentation,
        LinkbaseKind::Calculation,
        LinkbaseKind::Definition,
    ] {
        for role in arcs.roles(kind).map(str::to_string).collect::<Vec<_>>() {
            for arc in arcs.arcs_for(kind, &role) {
                if !catalog.contains(&arc.from) {
                    return Err(XbrlError::ConceptResolutionError {
                        concept: arc.from.qualified_name(),
                        referenced_by: role.clone(),
                    });
                }
                if !catalog.contains(&arc.to) {
                    return Err(XbrlError::ConceptResolutionError {
                        concept: arc.to.qualified_name(),
                        referenced_by: role.clone(),
                    });
                }
            }
        }
    }

    Ok(XbrlDocument {
        catalog,
        contexts,
        units,
        facts,
        arcs,
        role_definitions,
        document_period_end_date,
        entity_identifier,
    })
}
