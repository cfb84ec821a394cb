//! Fact model: concept + context + unit + value + decimals. Values are a tagged sum type, never a dynamically typed "any".

use bigdecimal::BigDecimal;

use super::element::ConceptId;

#[derive(Debug, Clone, PartialEq)]
pub enum FactValue {
    Decimal(BigDecimal),
    Text(String),
    Boolean(bool),
}

impl FactValue {
    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            FactValue::Decimal(d) => Some(d),
            _ => None,
        }
    }
}

/// A single fact from the instance document. Nil facts are never
/// represented as a zero `FactValue` — they are simply absent from the
/// fact list.
#[derive(Debug, Clone)]
pub struct Fact {
    pub concept: ConceptId,
    pub context_ref: String,
    pub unit_ref: Option<String>,
    pub value: FactValue,
    /// XBRL `decimals` attribute; e.g. -6 means rounded to millions.
    pub decimals: Option<i32>,
    pub footnote_refs: Vec<String>,
}

impl Fact {
    /// Decimals-aware approximate equality, used by the quarterization
    /// tolerance check (`|error| <= 10^(-decimals) * 4`) and exposed
    /// publicly since any caller reconciling derived vs. reported quarters
    /// needs the same tolerance logic.
    pub fn approx_eq(a: &BigDecimal, b: &BigDecimal, decimals: Option<i32>, multiplier: u32) -> bool {
        let tolerance = tolerance_for_decimals(decimals) * BigDecimal::from(multiplier);
        let diff = if a > b { a - b } else { b - a };
        diff <= tolerance
    }
}

fn tolerance_for_decimals(decimals: Option<i32>) -> BigDecimal {
    match decimals {
        None => BigDecimal::from(1),
        Some(d) if d >= 0 => {
            // decimals >= 0 means fractional precision; tolerance is
            // 10^-d, expressed via scale rather than float math.
            let mut value = BigDecimal::from(1);
            for _ in 0..d {
                value = value / BigDecimal::from(10);
            }
            value
        }
        Some(d) => {
            // negative decimals (e.g. -6 = rounded to millions): tolerance
            // is 10^(-d), i.e. 10^|d|.
            let mut value = BigDecimal::from(1);
            for _ in 0..d.unsigned_abs() {
                value = value * BigDecimal::from(10);
            }
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn approx_eq_respects_decimals_scale() {
        let a = BigDecimal::from_str("293810000000").unwrap();
        let b = BigDecimal::from_str("293810000003").unwrap();
        // decimals = -6 (millions precision) times four quarters of slack.
        assert!(Fact::approx_eq(&a, &b, Some(-6), 4));
    }

    #[test]
    fn approx_eq_rejects_large_drift() {
        let a = BigDecimal::from_str("293810000000").unwrap();
        let b = BigDecimal::from_str("293910000000").unwrap();
        assert!(!Fact::approx_eq(&a, &b, Some(-6), 4));
    }
}
