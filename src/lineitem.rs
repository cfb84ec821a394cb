//! Line-Item Generator & Standardizer: depth-first
//! traversal of a presentation tree, attaching facts per period, applying
//! calculation-weight sign normalization, and optionally mapping concepts
//! to canonical labels.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::Duration;

use crate::model::context::DimensionMember;
use crate::model::{ConceptId, Fact, FactValue, Period, StatementType, Unit, XbrlDocument};
use crate::registry::RegistryBundle;
use crate::tree::{CalculationTree, PresentationNode, PresentationTree};

/// A single fact value attached to a line item for one period.
#[derive(Debug, Clone)]
pub struct LineItemValue {
    pub value: FactValue,
    pub unit: Option<Unit>,
    pub decimals: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct LineItem {
    pub concept: ConceptId,
    pub label: String,
    pub original_label: String,
    pub level: usize,
    pub is_abstract: bool,
    pub children: Vec<LineItem>,
    pub values: HashMap<String, LineItemValue>,
    pub preferred_label_role: Option<String>,
    pub calculation_weight_applied: Option<f64>,
}

/// Options controlling one line-item generation pass.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub include_dimensions: bool,
    pub standardize: bool,
}

/// Generate the ordered line-item list for `tree` over `periods`. `calc_tree` supplies calculation weights for sign normalization;
/// absent when the filing carries no calculation linkbase.
pub fn generate_line_items(
    document: &XbrlDocument,
    tree: &PresentationTree,
    calc_tree: Option<&CalculationTree>,
    periods: &[Period],
    statement_type: StatementType,
    registry: &RegistryBundle,
    options: &GenerationOptions,
) -> Vec<LineItem> {
    let index = FactIndex::build(document);
    let occurrence_counts = count_occurrences(tree);
    let mut seen = HashMap::new();

    let mut items: Vec<LineItem> = Vec::new();
    for root in &tree.roots {
        if let Some(item) = build_node(
            root,
            None,
            document,
            &index,
            calc_tree,
            periods,
            statement_type,
            registry,
            options,
            &occurrence_counts,
            &mut seen,
        ) {
            items.push(item);
        }
    }
    items
}

/// Count how many times each concept appears in the traversal, needed by
/// the Statement-of-Equity roll-forward special case to
/// know ahead of time which occurrence is "first" and which is "last".
fn count_occurrences(tree: &PresentationTree) -> HashMap<ConceptId, usize> {
    let mut counts = HashMap::new();
    for concept in tree.concepts_dfs() {
        *counts.entry(concept.clone()).or_insert(0) += 1;
    }
    counts
}

#[allow(clippy::too_many_arguments)]
fn build_node(
    node: &PresentationNode,
    parent_concept: Option<&ConceptId>,
    document: &XbrlDocument,
    index: &FactIndex,
    calc_tree: Option<&CalculationTree>,
    periods: &[Period],
    statement_type: StatementType,
    registry: &RegistryBundle,
    options: &GenerationOptions,
    occurrence_counts: &HashMap<ConceptId, usize>,
    seen: &mut HashMap<ConceptId, usize>,
) -> Option<LineItem> {
    let descriptor = document.catalog.get(&node.concept);
    let is_abstract = descriptor.map(|d| d.is_structurally_abstract()).unwrap_or(false);

    let original_label = resolve_label(document, &node.concept, node.preferred_label.as_deref());
    let weight = calc_tree.and_then(|t| parent_concept.and_then(|p| t.weight_of(p, &node.concept)));

    let total_occurrences = *occurrence_counts.get(&node.concept).unwrap_or(&1);
    let occurrence_index = {
        let counter = seen.entry(node.concept.clone()).or_insert(0);
        let idx = *counter;
        *counter += 1;
        idx
    };

    let equity_role = if statement_type == StatementType::StatementOfEquity && total_occurrences > 1 {
        if occurrence_index == 0 {
            Some(EquityRollForwardRole::Beginning)
        } else if occurrence_index == total_occurrences - 1 {
            Some(EquityRollForwardRole::Ending)
        } else {
            Some(EquityRollForwardRole::Movement)
        }
    } else {
        None
    };

    let mut values = HashMap::new();
    for period in periods {
        let Some(fact) = fact_for_period(index, &node.concept, period, equity_role) else {
            continue;
        };
        let mut value = fact.value.clone();
        if let (FactValue::Decimal(d), Some(w)) = (&value, weight) {
            let adjusted = apply_weight(d, w);
            value = FactValue::Decimal(adjusted);
        }
        if let FactValue::Decimal(d) = &value {
            if registry.expense_whitelist.matches(&node.concept.local_name) && *d < BigDecimal::from(0) {
                value = FactValue::Decimal(-d.clone());
            }
        }
        values.insert(
            period.key(),
            LineItemValue {
                value,
                unit: fact.unit_ref.as_deref().and_then(|u| document.unit(u)).cloned(),
                decimals: fact.decimals,
            },
        );
    }

    let mut children: Vec<LineItem> = Vec::new();
    for child in &node.children {
        if let Some(built) = build_node(
            child,
            Some(&node.concept),
            document,
            index,
            calc_tree,
            periods,
            statement_type,
            registry,
            options,
            occurrence_counts,
            seen,
        ) {
            children.push(built);
        }
    }

    if options.include_dimensions && !is_abstract {
        children.extend(dimensional_children(document, index, &node.concept, periods, node.depth + 1));
    }

    // Abstract-item filtering: drop abstract rows with no
    // values of their own and no surviving children.
    if is_abstract && values.is_empty() && children.is_empty() {
        return None;
    }

    let label = if options.standardize {
        registry
            .standardization
            .canonical_label(&node.concept.local_name)
            .map(str::to_string)
            .unwrap_or_else(|| original_label.clone())
    } else {
        original_label.clone()
    };

    let label = match equity_role {
        Some(EquityRollForwardRole::Beginning) => format!("{label} — Beginning balance"),
        Some(EquityRollForwardRole::Ending) => format!("{label} — Ending balance"),
        _ => label,
    };

    Some(LineItem {
        concept: node.concept.clone(),
        label,
        original_label,
        level: node.depth,
        is_abstract,
        children,
        values,
        preferred_label_role: node.preferred_label.clone(),
        calculation_weight_applied: weight,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EquityRollForwardRole {
    Beginning,
    Movement,
    Ending,
}

fn apply_weight(value: &BigDecimal, weight: f64) -> BigDecimal {
    if weight < 0.0 {
        -value.clone()
    } else {
        value.clone()
    }
}

fn resolve_label(document: &XbrlDocument, concept: &ConceptId, preferred_label_role: Option<&str>) -> String {
    let Some(descriptor) = document.catalog.get(concept) else {
        return concept.local_name.clone();
    };
    if let Some(role) = preferred_label_role {
        if let Some(label) = descriptor.label(role) {
            return label.to_string();
        }
    }
    descriptor.standard_label().to_string()
}

fn fact_for_period<'a>(
    index: &FactIndex<'a>,
    concept: &ConceptId,
    period: &Period,
    equity_role: Option<EquityRollForwardRole>,
) -> Option<&'a Fact> {
    match equity_role {
        Some(EquityRollForwardRole::Beginning) => {
            let start = period.start_date()?;
            index.instant(concept, start - Duration::days(1))
        }
        Some(EquityRollForwardRole::Ending) => index.instant(concept, period.end_date()),
        _ => index.plain(concept, &period.key()),
    }
}

fn dimensional_children<'a>(
    document: &'a XbrlDocument,
    index: &FactIndex<'a>,
    concept: &ConceptId,
    periods: &[Period],
    level: usize,
) -> Vec<LineItem> {
    let mut by_dims: HashMap<Vec<DimensionMember>, HashMap<String, LineItemValue>> = HashMap::new();
    for period in periods {
        for (dims, fact) in index.dimensional(concept, &period.key()) {
            let entry = by_dims.entry(dims.clone()).or_default();
            entry.insert(
                period.key(),
                LineItemValue {
                    value: fact.value.clone(),
                    unit: fact.unit_ref.as_deref().and_then(|u| document.unit(u)).cloned(),
                    decimals: fact.decimals,
                },
            );
        }
    }

    let mut entries: Vec<(Vec<DimensionMember>, HashMap<String, LineItemValue>)> = by_dims.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| dims_sort_key(a).cmp(&dims_sort_key(b)));

    entries
        .into_iter()
        .map(|(dims, values)| {
            let label = dims
                .iter()
                .map(|dm| {
                    document
                        .catalog
                        .get(&dm.member)
                        .map(|d| d.standard_label().to_string())
                        .unwrap_or_else(|| dm.member.local_name.clone())
                })
                .collect::<Vec<_>>()
                .join(", ");
            LineItem {
                concept: concept.clone(),
                label: label.clone(),
                original_label: label,
                level,
                is_abstract: false,
                children: Vec::new(),
                values,
                preferred_label_role: None,
                calculation_weight_applied: None,
            }
        })
        .collect()
}

/// Stable sort key for a dimension tuple: each member's qualified name,
/// in order, so the same segment combination sorts identically across
/// runs regardless of hash-map iteration order.
fn dims_sort_key(dims: &[DimensionMember]) -> Vec<String> {
    dims.iter().map(|dm| dm.axis.qualified_name() + "|" + &dm.member.qualified_name()).collect()
}

/// Pre-built lookup from (concept, period key) to facts, split into
/// non-dimensional, dimensional, and instant-by-date indices so the
/// Statement-of-Equity roll-forward case can look up an instant fact that
/// isn't one of the originally selected periods.
struct FactIndex<'a> {
    plain: HashMap<(ConceptId, String), &'a Fact>,
    dimensional: HashMap<(ConceptId, String), Vec<(Vec<DimensionMember>, &'a Fact)>>,
    instant: HashMap<(ConceptId, chrono::NaiveDate), &'a Fact>,
}

impl<'a> FactIndex<'a> {
    fn build(document: &'a XbrlDocument) -> Self {
        let mut plain = HashMap::new();
        let mut dimensional: HashMap<(ConceptId, String), Vec<(Vec<DimensionMember>, &Fact)>> = HashMap::new();
        let mut instant = HashMap::new();

        for fact in &document.facts {
            let Some(context) = document.context(&fact.context_ref) else {
                continue;
            };
            let period_key = context.period.key();
            if context.has_dimensions() {
                dimensional
                    .entry((fact.concept.clone(), period_key))
                    .or_default()
                    .push((context.dimensions.clone(), fact));
            } else {
                plain.insert((fact.concept.clone(), period_key), fact);
                if context.period.is_instant() {
                    instant.insert((fact.concept.clone(), context.period.end_date()), fact);
                }
            }
        }

        Self {
            plain,
            dimensional,
            instant,
        }
    }

    fn plain(&self, concept: &ConceptId, period_key: &str) -> Option<&'a Fact> {
        self.plain.get(&(concept.clone(), period_key.to_string())).copied()
    }

    fn instant(&self, concept: &ConceptId, date: chrono::NaiveDate) -> Option<&'a Fact> {
        self.instant.get(&(concept.clone(), date)).copied()
    }

    fn dimensional(&self, concept: &ConceptId, period_key: &str) -> Vec<(Vec<DimensionMember>, &'a Fact)> {
        self.dimensional
            .get(&(concept.clone(), period_key.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}
