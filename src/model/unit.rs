//! Unit model: simple measures and divide (ratio / per-share) units.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Unit {
    /// A single measure: an ISO currency code ("USD"), "shares", or "pure".
    Measure(String),
    /// A divide unit for ratios and per-share amounts, e.g.
    /// USD / shares for earnings-per-share.
    Divide { numerator: String, denominator: String },
}

impl Unit {
    pub fn is_monetary(&self) -> bool {
        match self {
            Unit::Measure(m) => is_currency_code(m),
            Unit::Divide { numerator, .. } => is_currency_code(numerator),
        }
    }

    pub fn is_pure(&self) -> bool {
        matches!(self, Unit::Measure(m) if m.eq_ignore_ascii_case("pure"))
    }
}

/// Heuristic ISO-4217-ish check: three uppercase letters. Good enough to
/// distinguish "USD" from "shares" or "pure" without shipping a currency
/// table nobody in this pipeline needs.
fn is_currency_code(measure: &str) -> bool {
    measure.len() == 3 && measure.chars().all(|c| c.is_ascii_uppercase())
}
