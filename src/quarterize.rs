//! Quarterizer: derives discrete quarterly
//! facts from a mix of reported quarters and cumulative year-to-date
//! reports, and assembles trailing-twelve-month windows from them.

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate};

use crate::error::{Result, XbrlError};

/// A duration fact's length bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationClass {
    /// 80-100 days: one discrete quarter.
    Quarter,
    /// 170-200 days: year-to-date through Q2.
    HalfYear,
    /// 260-285 days: year-to-date through Q3.
    NineMonth,
    /// 350-380 days: full fiscal year.
    FullYear,
}

pub fn classify_duration(days: i64) -> Option<DurationClass> {
    match days {
        80..=100 => Some(DurationClass::Quarter),
        170..=200 => Some(DurationClass::HalfYear),
        260..=285 => Some(DurationClass::NineMonth),
        350..=380 => Some(DurationClass::FullYear),
        _ => None,
    }
}

/// One reported duration fact available to the quarterizer, tagged with
/// the fiscal year it belongs to so Q4 = FY - 9M (and friends) can be
/// matched up by shared fiscal-year start date.
#[derive(Debug, Clone)]
pub struct PeriodFact {
    pub fiscal_year_label: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub value: BigDecimal,
    pub decimals: Option<i32>,
}

impl PeriodFact {
    fn duration_days(&self) -> i64 {
        (self.period_end - self.period_start).num_days()
    }

    fn class(&self) -> Option<DurationClass> {
        classify_duration(self.duration_days())
    }
}

/// One quarter in a trailing-twelve-month window: either reported
/// directly or derived by subtraction.
#[derive(Debug, Clone)]
pub struct Quarter {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub value: BigDecimal,
    pub decimals: Option<i32>,
    pub derived: bool,
    /// The fiscal year this quarter was reported in, or derived from.
    pub fiscal_year_label: String,
}

#[derive(Debug, Clone)]
pub struct TtmResult {
    pub quarters: Vec<Quarter>,
    pub total: BigDecimal,
    /// Fiscal-year labels of every FY/YTD fact used to derive a quarter in
    /// this window. A structured flag, not a log warning.
    pub quarters_derived: Vec<String>,
    /// True when the gap between any two consecutive quarters in the
    /// window falls outside the 70-110 day calendar tolerance.
    pub has_gaps: bool,
}

const GAP_TOLERANCE_MIN_DAYS: i64 = 70;
const GAP_TOLERANCE_MAX_DAYS: i64 = 110;
const REQUIRED_QUARTERS: usize = 4;

/// Reconstruct every discrete quarter obtainable (reported or derived)
/// from a set of duration facts spanning one or more fiscal years.
fn derive_all_quarters(facts: &[PeriodFact]) -> Vec<Quarter> {
    let mut quarters: Vec<Quarter> = Vec::new();

    // Directly reported quarters pass through unchanged.
    for f in facts {
        if f.class() == Some(DurationClass::Quarter) {
            quarters.push(Quarter {
                period_start: f.period_start,
                period_end: f.period_end,
                value: f.value.clone(),
                decimals: f.decimals,
                derived: false,
                fiscal_year_label: f.fiscal_year_label.clone(),
            });
        }
    }

    let has_quarter_covering = |quarters: &[Quarter], start: NaiveDate, end: NaiveDate| {
        quarters.iter().any(|q| q.period_start == start && q.period_end == end)
    };

    // Q4 = FY - 9M, sharing the fiscal year's start date.
    for fy in facts.iter().filter(|f| f.class() == Some(DurationClass::FullYear)) {
        if let Some(ytd9) = facts
            .iter()
            .find(|f| f.class() == Some(DurationClass::NineMonth) && f.period_start == fy.period_start)
        {
            let q4_start = ytd9.period_end + Duration::days(1);
            let q4_end = fy.period_end;
            if !has_quarter_covering(&quarters, q4_start, q4_end) {
                quarters.push(Quarter {
                    period_start: q4_start,
                    period_end: q4_end,
                    value: &fy.value - &ytd9.value,
                    decimals: min_decimals(fy.decimals, ytd9.decimals),
                    derived: true,
                    fiscal_year_label: fy.fiscal_year_label.clone(),
                });
            }
        }
    }

    // Q3 = 9M - H, sharing the fiscal year's start date.
    for ytd9 in facts.iter().filter(|f| f.class() == Some(DurationClass::NineMonth)) {
        if let Some(half) = facts
            .iter()
            .find(|f| f.class() == Some(DurationClass::HalfYear) && f.period_start == ytd9.period_start)
        {
            let q3_start = half.period_end + Duration::days(1);
            let q3_end = ytd9.period_end;
            if !has_quarter_covering(&quarters, q3_start, q3_end) {
                quarters.push(Quarter {
                    period_start: q3_start,
                    period_end: q3_end,
                    value: &ytd9.value - &half.value,
                    decimals: min_decimals(ytd9.decimals, half.decimals),
                    derived: true,
                    fiscal_year_label: ytd9.fiscal_year_label.clone(),
                });
            }
        }
    }

    // Q2 = H - Q1, sharing the fiscal year's start date.
    for half in facts.iter().filter(|f| f.class() == Some(DurationClass::HalfYear)) {
        if let Some(q1) = facts.iter().find(|f| {
            f.class() == Some(DurationClass::Quarter) && f.period_start == half.period_start
        }) {
            let q2_start = q1.period_end + Duration::days(1);
            let q2_end = half.period_end;
            if !has_quarter_covering(&quarters, q2_start, q2_end) {
                quarters.push(Quarter {
                    period_start: q2_start,
                    period_end: q2_end,
                    value: &half.value - &q1.value,
                    decimals: min_decimals(half.decimals, q1.decimals),
                    derived: true,
                    fiscal_year_label: half.fiscal_year_label.clone(),
                });
            }
        }
    }

    quarters.sort_by_key(|q| q.period_end);
    quarters
}

fn min_decimals(a: Option<i32>, b: Option<i32>) -> Option<i32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        _ => None,
    }
}

/// Select the four most recent consecutive quarters ending at
/// `target_end` and
/// sum them. Fails with `InsufficientData` when fewer than four quarters
/// (reported + derivable) are available ending there.
pub fn compute_ttm(facts: &[PeriodFact], target_end: NaiveDate) -> Result<TtmResult> {
    let all_quarters = derive_all_quarters(facts);

    let Some(last_idx) = all_quarters.iter().position(|q| q.period_end == target_end) else {
        return Err(XbrlError::InsufficientData {
            reason: format!("no quarter found ending at {target_end}"),
        });
    };

    if last_idx + 1 < REQUIRED_QUARTERS {
        return Err(XbrlError::InsufficientData {
            reason: format!(
                "only {} quarter(s) available ending at {target_end}, need {REQUIRED_QUARTERS}",
                last_idx + 1
            ),
        });
    }

    let window = &all_quarters[(last_idx + 1 - REQUIRED_QUARTERS)..=last_idx];

    // Consecutive quarter-end distance should itself read as one quarter;
    // anything outside tolerance means a quarter is missing or duplicated.
    let mut has_gaps = false;
    for pair in window.windows(2) {
        let gap = (pair[1].period_end - pair[0].period_end).num_days();
        if !(GAP_TOLERANCE_MIN_DAYS..=GAP_TOLERANCE_MAX_DAYS).contains(&gap) {
            has_gaps = true;
        }
    }

    let mut quarters_derived: Vec<String> = window
        .iter()
        .filter(|q| q.derived)
        .map(|q| q.fiscal_year_label.clone())
        .collect();
    quarters_derived.sort();
    quarters_derived.dedup();

    let total = window
        .iter()
        .fold(BigDecimal::from(0), |acc, q| acc + &q.value);

    Ok(TtmResult {
        quarters: window.to_vec(),
        total,
        quarters_derived,
        has_gaps,
    })
}
