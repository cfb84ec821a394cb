//! Period Selector: chooses which reporting periods to
//! display for a statement, scoring recency, fiscal-year alignment, and
//! data density, subject to a hard document-date filter.

use chrono::NaiveDate;
use tracing::debug;

use crate::model::{Period, StatementType, XbrlDocument};
use crate::tree::PresentationTree;

/// Default period count for a multi-filing stitched view.
pub const DEFAULT_MAX_PERIODS_MULTI: usize = 8;
/// Default period count for a single filing's own statement.
pub const DEFAULT_MAX_PERIODS_SINGLE: usize = 3;

/// Confidence below which a selection is logged at debug rather than left
/// silent.
const LOW_CONFIDENCE_LOG_THRESHOLD: f64 = 0.5;

const CASH_FLOW_DENSITY_FLOOR: usize = 5;

#[derive(Debug, Clone)]
pub struct PeriodCandidate {
    pub period_key: String,
    pub period: Period,
    pub recency: f64,
    pub alignment: f64,
    pub density: f64,
    pub combined_score: f64,
}

struct Weights {
    recency: f64,
    alignment: f64,
    density: f64,
}

fn weights_for(statement_type: StatementType) -> Weights {
    match statement_type {
        StatementType::CashFlowStatement => Weights {
            recency: 0.40,
            alignment: 0.20,
            density: 0.40,
        },
        _ => Weights {
            recency: 0.50,
            alignment: 0.25,
            density: 0.25,
        },
    }
}

fn duration_is_acceptable(statement_type: StatementType, days: i64) -> bool {
    let quarterly = (80..=100).contains(&days);
    let annual = (350..=380).contains(&days);
    let year_to_date = (180..=280).contains(&days);
    match statement_type {
        StatementType::CashFlowStatement => quarterly || annual || year_to_date,
        _ => quarterly || annual,
    }
}

/// Linear decay from the document's fiscal-year-end calendar anchor,
/// modulo roughly one quarter, so a period ending on- or near-anchor scores
/// near 1.0 regardless of how many quarters back it falls. The exact decay
/// curve is an implementation choice the source spec leaves open; documented in DESIGN.md.
fn fiscal_alignment_score(period_end: NaiveDate, anchor: NaiveDate) -> f64 {
    const QUARTER_DAYS: i64 = 91;
    const HALF_QUARTER: f64 = 45.5;
    let diff = (period_end - anchor).num_days().abs();
    let remainder = diff % QUARTER_DAYS;
    let distance_to_boundary = remainder.min(QUARTER_DAYS - remainder);
    (1.0 - (distance_to_boundary as f64 / HALF_QUARTER)).max(0.0)
}

/// Select the ordered list of period keys to display for `statement_type`,
/// most recent first.
pub fn select_periods(
    document: &XbrlDocument,
    tree: &PresentationTree,
    statement_type: StatementType,
    max_periods: usize,
) -> Vec<PeriodCandidate> {
    let statement_concepts: std::collections::HashSet<_> = tree.concepts_dfs().into_iter().collect();
    let non_abstract_concept_count = statement_concepts
        .iter()
        .filter(|c| {
            document
                .catalog
                .get(c)
                .map(|d| !d.is_structurally_abstract())
                .unwrap_or(true)
        })
        .count()
        .max(1);

    // Enumerate distinct period keys on facts tagged to this statement's
    // concepts, counting non-empty facts per period for the density score.
    let mut periods: std::collections::HashMap<String, (Period, usize)> = std::collections::HashMap::new();
    for fact in &document.facts {
        if !statement_concepts.contains(&fact.concept) {
            continue;
        }
        let Some(context) = document.context(&fact.context_ref) else {
            continue;
        };
        if context.has_dimensions() {
            continue;
        }
        let period = context.period;
        let is_instant_required = statement_type.requires_instant_periods();
        if period.is_instant() != is_instant_required {
            continue;
        }
        if !is_instant_required {
            let Some(days) = period.duration_days() else { continue };
            if !duration_is_acceptable(statement_type, days) {
                continue;
            }
        }
        if let Some(doc_end) = document.document_period_end_date {
            if period.end_date() > doc_end {
                continue;
            }
        }
        let entry = periods.entry(period.key()).or_insert((period, 0));
        entry.1 += 1;
    }

    if statement_type == StatementType::CashFlowStatement {
        periods.retain(|_, (_, count)| *count >= CASH_FLOW_DENSITY_FLOOR);
    }

    let max_end = periods.values().map(|(p, _)| p.end_date()).max();
    let min_end = periods.values().map(|(p, _)| p.end_date()).min();
    let anchor = document.document_period_end_date.or(max_end);

    let weights = weights_for(statement_type);
    let mut candidates: Vec<PeriodCandidate> = periods
        .into_iter()
        .map(|(period_key, (period, count))| {
            let recency = match (max_end, min_end) {
                (Some(max), Some(min)) if max != min => {
                    let span = (max - min).num_days() as f64;
                    let offset = (period.end_date() - min).num_days() as f64;
                    offset / span
                }
                _ => 1.0,
            };
            let alignment = anchor.map(|a| fiscal_alignment_score(period.end_date(), a)).unwrap_or(1.0);
            let density = (count as f64 / non_abstract_concept_count as f64).min(1.0);
            let combined_score = weights.recency * recency + weights.alignment * alignment + weights.density * density;
            PeriodCandidate {
                period_key,
                period,
                recency,
                alignment,
                density,
                combined_score,
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            // Tie-break (c): lexicographically smaller period key. Tie-breaks (a)/(b) require multi-filing provenance not
            // available to a single-document selection and are applied by
            // the stitcher instead (see DESIGN.md).
            .then_with(|| a.period_key.cmp(&b.period_key))
    });

    candidates.truncate(max_periods);
    candidates.sort_by(|a, b| b.period.end_date().cmp(&a.period.end_date()));

    if let Some(worst) = candidates
        .iter()
        .map(|c| c.combined_score)
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.min(s))))
    {
        if worst < LOW_CONFIDENCE_LOG_THRESHOLD {
            debug!(?statement_type, worst_combined_score = worst, "low-confidence period selection");
        }
    }

    candidates
}
