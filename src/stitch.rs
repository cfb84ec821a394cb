//! Statement Stitcher: merges multiple
//! single-filing statements into one multi-period comparative view.

use std::collections::HashMap;

use crate::lineitem::{LineItem, LineItemValue};
use crate::model::ConceptId;

/// Revenue-family concepts in descending precedence, used only when coverage is
/// comparable; a strictly-more-specific concept with strictly greater
/// coverage still wins.
const REVENUE_PRECEDENCE: &[&str] = &[
    "Revenues",
    "SalesRevenueNet",
    "RevenueFromContractWithCustomerExcludingAssessedTax",
    "RevenueFromContractWithCustomerIncludingAssessedTax",
    "ContractRevenue",
];

/// One filing's contribution to a stitch: its statement's line items,
/// ordered most recent filing first by the caller.
pub struct FilingStatement {
    pub filing_id: String,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone)]
pub struct StitchedRow {
    pub key: String,
    pub concept: ConceptId,
    pub label: String,
    pub level: usize,
    pub is_abstract: bool,
    pub values: HashMap<String, LineItemValue>,
}

#[derive(Debug, Clone, Default)]
pub struct StitchedStatement {
    pub rows: Vec<StitchedRow>,
    /// Quality-warning notes generated during deduplication.
    pub dedup_notes: Vec<String>,
}

/// Normalize a row to its merge key: canonical label when standardized
/// (original_label differs from label), else the concept id's qualified
/// name.
fn row_key(item: &LineItem) -> String {
    if item.label != item.original_label {
        item.label.clone()
    } else {
        item.concept.qualified_name()
    }
}

/// Flatten a line-item tree into a row list, preserving depth-first order
/// and the `(key, level, is_abstract, values)` needed for stitching.
/// Parent/child nesting itself is not re-derived post-stitch.
fn flatten(items: &[LineItem], out: &mut Vec<StitchedRow>) {
    for item in items {
        out.push(StitchedRow {
            key: row_key(item),
            concept: item.concept.clone(),
            label: item.label.clone(),
            level: item.level,
            is_abstract: item.is_abstract,
            values: item.values.clone(),
        });
        flatten(&item.children, out);
    }
}

fn revenue_precedence_rank(local_name: &str) -> Option<usize> {
    REVENUE_PRECEDENCE.iter().position(|c| *c == local_name)
}

/// Merge a sequence of per-filing statements.
/// `filings` must be ordered most-recent-first; later rows append only
/// the keys not already seen in an earlier (more recent) filing.
pub fn stitch(filings: &[FilingStatement]) -> StitchedStatement {
    let mut merged: Vec<StitchedRow> = Vec::new();
    let mut index_of_key: HashMap<String, usize> = HashMap::new();
    let mut dedup_notes = Vec::new();

    for filing in filings {
        let mut flat = Vec::new();
        flatten(&filing.items, &mut flat);
        for row in flat {
            match index_of_key.get(&row.key) {
                Some(&idx) => {
                    // Union period values, preferring whichever filing has
                    // more complete data for each cell.
                    for (period_key, value) in row.values {
                        merged[idx].values.entry(period_key).or_insert(value);
                    }
                }
                None => {
                    index_of_key.insert(row.key.clone(), merged.len());
                    merged.push(row);
                }
            }
        }
    }

    dedup_revenue(&mut merged, &mut index_of_key, &mut dedup_notes);

    // Filter out periods that ended up entirely empty across every row.
    let mut populated_periods: std::collections::HashSet<String> = std::collections::HashSet::new();
    for row in &merged {
        populated_periods.extend(row.values.keys().cloned());
    }
    for row in &mut merged {
        row.values.retain(|k, _| populated_periods.contains(k));
    }

    StitchedStatement {
        rows: merged,
        dedup_notes,
    }
}

/// Drop strictly-redundant revenue tags per the hierarchical precedence
/// rule, unless a lower-precedence (more specific) concept has strictly
/// greater coverage, in which case it wins instead.
fn dedup_revenue(
    rows: &mut Vec<StitchedRow>,
    index_of_key: &mut HashMap<String, usize>,
    notes: &mut Vec<String>,
) {
    let revenue_rows: Vec<(usize, usize)> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, r)| revenue_precedence_rank(&r.concept.local_name).map(|rank| (i, rank)))
        .collect();

    if revenue_rows.len() <= 1 {
        return;
    }

    let winner_idx = revenue_rows
        .iter()
        .max_by(|(ia, ra), (ib, rb)| {
            let cov_a = rows[*ia].values.values().filter(|v| !is_empty(v)).count();
            let cov_b = rows[*ib].values.values().filter(|v| !is_empty(v)).count();
            // Higher coverage wins outright; on comparable coverage, the
            // higher-precedence (lower rank number) concept wins.
            cov_a.cmp(&cov_b).then_with(|| rb.cmp(ra))
        })
        .map(|(i, _)| *i)
        .unwrap();

    let to_drop: Vec<usize> = revenue_rows.iter().map(|(i, _)| *i).filter(|i| *i != winner_idx).collect();
    for &i in &to_drop {
        notes.push(format!(
            "dropped redundant revenue tag \"{}\" in favor of \"{}\"",
            rows[i].key, rows[winner_idx].key
        ));
    }
    for &i in to_drop.iter().rev() {
        rows.remove(i);
    }
    index_of_key.clear();
    for (i, row) in rows.iter().enumerate() {
        index_of_key.insert(row.key.clone(), i);
    }
}

fn is_empty(value: &LineItemValue) -> bool {
    matches!(&value.value, crate::model::FactValue::Text(s) if s.is_empty())
}
