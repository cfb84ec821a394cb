//! Instance document parsing: contexts, units, and facts,
//! including the inline-XBRL variant.

use std::collections::HashMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Result, XbrlError};
use crate::model::context::{DimensionMember, Period};
use crate::model::element::ConceptId;
use crate::model::fact::{Fact, FactValue};
use crate::model::{Context, Unit};

use super::xml_util::{attr, find_xbrl_root, is_inline_xbrl, local_name, read_text};

const STANDARD_ELEMENTS: &[&str] = &[
    "xbrl", "context", "entity", "identifier", "segment", "period", "startDate", "endDate",
    "instant", "unit", "measure", "divide", "numerator", "denominator", "linkbaseRef", "schemaRef",
    "roleRef", "arcroleRef", "footnoteLink",
];

pub struct ParsedInstance {
    pub contexts: HashMap<String, Context>,
    pub units: HashMap<String, Unit>,
    pub facts: Vec<Fact>,
    pub document_period_end_date: Option<NaiveDate>,
    pub entity_identifier: Option<String>,
}

/// Parse a stand-alone instance document, or detect and parse an embedded
/// inline-XBRL region inside an HTML wrapper. Returns `Ok(None)` when neither form of XBRL content is
/// found — e.g. the bytes are an SEC error response — which callers treat
/// as "nothing to parse" rather than a structural failure.
pub fn parse_instance(
    content: &str,
    file_name: &str,
    namespaces: &HashMap<String, String>,
) -> Result<Option<ParsedInstance>> {
    if is_inline_xbrl(content) {
        return Ok(Some(parse_inline(content, file_name, namespaces)?));
    }
    match find_xbrl_root(content) {
        Some(region) => Ok(Some(parse_plain(region, file_name, namespaces)?)),
        None => Ok(None),
    }
}

fn parse_plain(
    content: &str,
    file_name: &str,
    namespaces: &HashMap<String, String>,
) -> Result<ParsedInstance> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut contexts = HashMap::new();
    let mut units = HashMap::new();
    let mut facts = Vec::new();
    let mut entity_identifier = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name());
                match name.as_str() {
                    "context" => {
                        let (id, context) = parse_context(e, &mut reader, namespaces)?;
                        if entity_identifier.is_none() {
                            entity_identifier = Some(context.entity_identifier.clone());
                        }
                        contexts.insert(id, context);
                    }
                    "unit" => {
                        let (id, unit) = parse_unit(e, &mut reader)?;
                        units.insert(id, unit);
                    }
                    _ if !STANDARD_ELEMENTS.contains(&name.as_str()) => {
                        if let Some(fact) = parse_fact(e, &mut reader, namespaces)? {
                            facts.push(fact);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = local_name(e.name());
                if !STANDARD_ELEMENTS.contains(&name.as_str()) {
                    // Self-closing element with no text content: this is a
                    // nil fact unless it's a namespace-unqualified structural
                    // element we don't recognize; skip either way.
                    let _ = fact_concept(e, namespaces);
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

    let document_period_end_date = facts
        .iter()
        .find(|f| f.concept.local_name == "DocumentPeriodEndDate")
        .and_then(|f| match &f.value {
            FactValue::Text(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
            _ => None,
        });

    Ok(ParsedInstance {
        contexts,
        units,
        facts,
        document_period_end_date,
        entity_identifier,
    })
}

fn parse_inline(
    content: &str,
    file_name: &str,
    namespaces: &HashMap<String, String>,
) -> Result<ParsedInstance> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut contexts = HashMap::new();
    let mut units = HashMap::new();
    let mut facts = Vec::new();
    let mut entity_identifier = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = local_name(e.name());
                match name.as_str() {
                    "context" => {
                        let (id, context) = parse_context(e, &mut reader, namespaces)?;
                        if entity_identifier.is_none() {
                            entity_identifier = Some(context.entity_identifier.clone());
                        }
                        contexts.insert(id, context);
                    }
                    "unit" => {
                        let (id, unit) = parse_unit(e, &mut reader)?;
                        units.insert(id, unit);
                    }
                    "nonFraction" | "nonNumeric" => {
                        if let Some(fact) = parse_ix_fact(e, &mut reader, namespaces)? {
                            facts.push(fact);
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

    let document_period_end_date = facts
        .iter()
        .find(|f| f.concept.local_name == "DocumentPeriodEndDate")
        .and_then(|f| match &f.value {
            FactValue::Text(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
            _ => None,
        });

    Ok(ParsedInstance {
        contexts,
        units,
        facts,
        document_period_end_date,
        entity_identifier,
    })
}

fn parse_context(
    start: &BytesStart,
    reader: &mut Reader<&[u8]>,
    namespaces: &HashMap<String, String>,
) -> Result<(String, Context)> {
    let id = attr(start, "id").unwrap_or_default();
    let mut entity_identifier = String::new();
    let mut period = Period::Instant(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
    let mut dimensions = Vec::new();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = local_name(e.name());
                match name.as_str() {
                    "identifier" => {
                        entity_identifier = read_text(reader);
                    }
                    "startDate" => { /* handled via sibling endDate below */ }
                    "explicitMember" => {
                        let axis = attr(e, "dimension")
                            .map(|d| concept_from_qname(&d, namespaces))
                            .unwrap_or_else(|| ConceptId::new("unknown", "unknown"));
                        let member_text = read_text(reader);
                        let member = concept_from_qname(&member_text, namespaces);
                        dimensions.push(DimensionMember { axis, member });
                    }
                    "period" => {
                        period = parse_period(reader)?;
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                if local_name(e.name()) == "context" {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XbrlError::MalformedXbrl {
                    file: "instance".to_string(),
                    reason: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    Ok((
        id.clone(),
        Context {
            id,
            entity_identifier,
            period,
            dimensions,
        },
    ))
}

fn parse_period(reader: &mut Reader<&[u8]>) -> Result<Period> {
    let mut start = None;
    let mut end = None;
    let mut instant = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name());
                let text = read_text(reader);
                match name.as_str() {
                    "startDate" => start = NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok(),
                    "endDate" => end = NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok(),
                    "instant" => instant = NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok(),
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                if local_name(e.name()) == "period" {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XbrlError::MalformedXbrl {
                    file: "instance".to_string(),
                    reason: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    match (instant, start, end) {
        (Some(d), _, _) => Ok(Period::Instant(d)),
        (_, Some(s), Some(e)) => Ok(Period::Duration { start: s, end: e }),
        _ => Err(XbrlError::MalformedXbrl {
            file: "instance".to_string(),
            reason: "context period had neither instant nor start/end dates".to_string(),
        }),
    }
}

fn parse_unit(start: &BytesStart, reader: &mut Reader<&[u8]>) -> Result<(String, Unit)> {
    let id = attr(start, "id").unwrap_or_default();
    let mut measures = Vec::new();
    let mut numerator = None;
    let mut denominator = None;
    let mut in_numerator = false;
    let mut in_denominator = false;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name());
                match name.as_str() {
                    "numerator" => in_numerator = true,
                    "denominator" => in_denominator = true,
                    "measure" => {
                        let text = read_text(reader);
                        let measure = strip_measure_prefix(&text);
                        if in_numerator {
                            numerator = Some(measure);
                        } else if in_denominator {
                            denominator = Some(measure);
                        } else {
                            measures.push(measure);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                let name = local_name(e.name());
                match name.as_str() {
                    "numerator" => in_numerator = false,
                    "denominator" => in_denominator = false,
                    "unit" => break,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XbrlError::MalformedXbrl {
                    file: "instance".to_string(),
                    reason: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    let unit = match (numerator, denominator) {
        (Some(n), Some(d)) => Unit::Divide {
            numerator: n,
            denominator: d,
        },
        _ => Unit::Measure(measures.into_iter().next().unwrap_or_default()),
    };

    Ok((id, unit))
}

fn strip_measure_prefix(measure: &str) -> String {
    measure
        .split(':')
        .last()
        .unwrap_or(measure)
        .to_string()
}

fn concept_from_qname(qname: &str, namespaces: &HashMap<String, String>) -> ConceptId {
    match qname.trim().split_once(':') {
        Some((prefix, local)) => {
            let ns = namespaces.get(prefix).cloned().unwrap_or_else(|| prefix.to_string());
            ConceptId::new(ns, local)
        }
        None => ConceptId::new("unknown", qname.trim()),
    }
}

fn fact_concept(e: &BytesStart, namespaces: &HashMap<String, String>) -> ConceptId {
    let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    concept_from_qname(&qname, namespaces)
}

fn parse_fact(
    start: &BytesStart,
    reader: &mut Reader<&[u8]>,
    namespaces: &HashMap<String, String>,
) -> Result<Option<Fact>> {
    let concept = fact_concept(start, namespaces);
    let context_ref = attr(start, "contextRef").unwrap_or_default();
    let unit_ref = attr(start, "unitRef");
    let decimals = attr(start, "decimals").and_then(|d| {
        if d == "INF" {
            None
        } else {
            d.parse::<i32>().ok()
        }
    });
    let is_nil = attr(start, "nil").as_deref() == Some("true");
    let footnote_refs = Vec::new();

    if is_nil {
        return Ok(None);
    }

    let text = read_text(reader);
    if text.is_empty() && unit_ref.is_none() {
        // Likely a tuple or structural wrapper, not a leaf fact.
        return Ok(None);
    }

    let value = coerce_value(&text, unit_ref.is_some());

    Ok(Some(Fact {
        concept,
        context_ref,
        unit_ref,
        value,
        decimals,
        footnote_refs,
    }))
}

fn parse_ix_fact(
    start: &BytesStart,
    reader: &mut Reader<&[u8]>,
    namespaces: &HashMap<String, String>,
) -> Result<Option<Fact>> {
    let name_attr = attr(start, "name").unwrap_or_default();
    let concept = concept_from_qname(&name_attr, namespaces);
    let context_ref = attr(start, "contextRef").unwrap_or_default();
    let unit_ref = attr(start, "unitRef");
    let decimals = attr(start, "decimals").and_then(|d| d.parse::<i32>().ok());
    let sign_negative = attr(start, "sign").as_deref() == Some("-");

    let text = read_text(reader);
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace() || *c == ' ').collect();
    let cleaned = cleaned.replace(',', "");

    let mut value = coerce_value(cleaned.trim(), unit_ref.is_some());
    if sign_negative {
        if let FactValue::Decimal(d) = &value {
            value = FactValue::Decimal(-d.clone());
        }
    }

    Ok(Some(Fact {
        concept,
        context_ref,
        unit_ref,
        value,
        decimals,
        footnote_refs: Vec::new(),
    }))
}

fn coerce_value(text: &str, has_unit: bool) -> FactValue {
    if has_unit {
        if let Ok(d) = BigDecimal::from_str(text) {
            return FactValue::Decimal(d);
        }
    }
    match text {
        "true" => FactValue::Boolean(true),
        "false" => FactValue::Boolean(false),
        _ => FactValue::Text(text.to_string()),
    }
}
