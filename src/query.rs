//! Fact Query: a fluent,
//! composable filter over one filing's fact list. Every `.with_*` method
//! returns `Self` so calls chain; filters AND together by default.

use std::collections::HashSet;

use bigdecimal::BigDecimal;
use regex::Regex;

use crate::model::{ConceptId, Fact, FactValue, Period, Unit, XbrlDocument};

/// A predefined period window, kept as an enum rather than free text so
/// the query builder stays exhaustive-matchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodView {
    LatestAnnual,
    LatestQuarterly,
    TrailingTwelveMonths,
}

/// Coarse period-type classification for the `period_type` filter.
/// `Monthly` rounds out annual/quarterly/instant; nothing else in this
/// crate derives monthly facts, but some filers do report one (e.g. REIT
/// distribution schedules), so the filter recognizes the duration length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodTypeFilter {
    Annual,
    Quarterly,
    Monthly,
    Instant,
}

fn matches_period_type(period: &Period, filter: PeriodTypeFilter) -> bool {
    match filter {
        PeriodTypeFilter::Instant => period.is_instant(),
        PeriodTypeFilter::Annual => period.duration_days().map(|d| (350..=380).contains(&d)).unwrap_or(false),
        PeriodTypeFilter::Quarterly => period.duration_days().map(|d| (80..=100).contains(&d)).unwrap_or(false),
        PeriodTypeFilter::Monthly => period.duration_days().map(|d| (25..=35).contains(&d)).unwrap_or(false),
    }
}

/// A fluent, composable query over one document's facts. Each builder
/// method narrows the result set; nothing executes until `.execute()` is
/// called.
pub struct FactQuery<'a> {
    document: &'a XbrlDocument,
    concept_exact: Option<ConceptId>,
    concept_pattern: Option<Regex>,
    statement_concepts: Option<&'a HashSet<ConceptId>>,
    dimension: Option<(ConceptId, ConceptId)>,
    period_type: Option<PeriodTypeFilter>,
    period_view: Option<PeriodView>,
    label_text: Option<String>,
    value_min: Option<BigDecimal>,
    value_max: Option<BigDecimal>,
    unit_predicate: Option<Box<dyn Fn(&Unit) -> bool + 'a>>,
}

impl<'a> FactQuery<'a> {
    pub fn new(document: &'a XbrlDocument) -> Self {
        Self {
            document,
            concept_exact: None,
            concept_pattern: None,
            statement_concepts: None,
            dimension: None,
            period_type: None,
            period_view: None,
            label_text: None,
            value_min: None,
            value_max: None,
            unit_predicate: None,
        }
    }

    /// Filter by exact concept id.
    pub fn concept(mut self, concept: ConceptId) -> Self {
        self.concept_exact = Some(concept);
        self
    }

    /// Filter by a regex over the concept's local name.
    pub fn concept_pattern(mut self, pattern: Regex) -> Self {
        self.concept_pattern = Some(pattern);
        self
    }

    /// Filter by statement membership. Callers
    /// supply the set of concepts belonging to a resolved statement's
    /// presentation tree, e.g. via `PresentationTree::concepts_dfs()`
    /// collected into a set — this module doesn't depend on the tree
    /// builder or resolver to stay a leaf-level query over facts.
    pub fn statement(mut self, concepts: &'a HashSet<ConceptId>) -> Self {
        self.statement_concepts = Some(concepts);
        self
    }

    /// Filter by an explicit (axis, member) segment pair.
    pub fn dimension(mut self, axis: ConceptId, member: ConceptId) -> Self {
        self.dimension = Some((axis, member));
        self
    }

    /// Filter by period type (annual/quarterly/monthly/instant).
    pub fn period_type(mut self, filter: PeriodTypeFilter) -> Self {
        self.period_type = Some(filter);
        self
    }

    /// Filter by a predefined period view.
    pub fn period_view(mut self, view: PeriodView) -> Self {
        self.period_view = Some(view);
        self
    }

    /// Filter by substring match against the concept's standard label
    ///. Matching is
    /// case-insensitive.
    pub fn label_contains(mut self, text: impl Into<String>) -> Self {
        self.label_text = Some(text.into().to_ascii_lowercase());
        self
    }

    /// Filter by inclusive value range over the fact's decimal value
    ///. Non-decimal facts never match once
    /// a range is set.
    pub fn value_range(mut self, min: Option<BigDecimal>, max: Option<BigDecimal>) -> Self {
        self.value_min = min;
        self.value_max = max;
        self
    }

    /// Filter by unit.
    pub fn unit(mut self, predicate: impl Fn(&Unit) -> bool + 'a) -> Self {
        self.unit_predicate = Some(Box::new(predicate));
        self
    }

    /// Run every configured filter (ANDed together) and return the
    /// matching facts.
    pub fn execute(&self) -> Vec<&'a Fact> {
        let period_view_keys = self.period_view.map(|v| self.resolve_period_view(v));

        self.document
            .facts
            .iter()
            .filter(|fact| self.matches(fact, period_view_keys.as_ref()))
            .collect()
    }

    fn matches(&self, fact: &Fact, period_view_keys: Option<&HashSet<String>>) -> bool {
        if let Some(concept) = &self.concept_exact {
            if &fact.concept != concept {
                return false;
            }
        }
        if let Some(pattern) = &self.concept_pattern {
            if !pattern.is_match(&fact.concept.local_name) {
                return false;
            }
        }
        if let Some(concepts) = self.statement_concepts {
            if !concepts.contains(&fact.concept) {
                return false;
            }
        }

        let Some(context) = self.document.context(&fact.context_ref) else {
            return false;
        };

        if let Some((axis, member)) = &self.dimension {
            if context.member_for_axis(axis) != Some(member) {
                return false;
            }
        }
        if let Some(filter) = self.period_type {
            if !matches_period_type(&context.period, filter) {
                return false;
            }
        }
        if let Some(keys) = period_view_keys {
            if !keys.contains(&context.period.key()) {
                return false;
            }
        }
        if let Some(text) = &self.label_text {
            let label = self
                .document
                .catalog
                .get(&fact.concept)
                .map(|d| d.standard_label().to_ascii_lowercase())
                .unwrap_or_default();
            if !label.contains(text.as_str()) {
                return false;
            }
        }
        if self.value_min.is_some() || self.value_max.is_some() {
            match fact.value.as_decimal() {
                Some(d) => {
                    if let Some(min) = &self.value_min {
                        if d < min {
                            return false;
                        }
                    }
                    if let Some(max) = &self.value_max {
                        if d > max {
                            return false;
                        }
                    }
                }
                None => return false,
            }
        }
        if let Some(predicate) = &self.unit_predicate {
            let Some(unit) = fact.unit_ref.as_deref().and_then(|u| self.document.unit(u)) else {
                return false;
            };
            if !predicate(unit) {
                return false;
            }
        }
        true
    }

    /// Materialize a `PeriodView` into the set of period keys it selects,
    /// scoped to whatever other filters (statement, concept) are already
    /// configured, since "latest annual" only means something relative to
    /// the periods a particular concept or statement actually reports.
    fn resolve_period_view(&self, view: PeriodView) -> HashSet<String> {
        let wanted_type = match view {
            PeriodView::LatestAnnual => PeriodTypeFilter::Annual,
            PeriodView::LatestQuarterly | PeriodView::TrailingTwelveMonths => PeriodTypeFilter::Quarterly,
        };

        let mut candidate_periods: Vec<Period> = self
            .document
            .facts
            .iter()
            .filter(|f| self.concept_exact.as_ref().map(|c| &f.concept == c).unwrap_or(true))
            .filter(|f| self.concept_pattern.as_ref().map(|p| p.is_match(&f.concept.local_name)).unwrap_or(true))
            .filter(|f| self.statement_concepts.map(|c| c.contains(&f.concept)).unwrap_or(true))
            .filter_map(|f| self.document.context(&f.context_ref))
            .map(|c| c.period)
            .filter(|p| matches_period_type(p, wanted_type))
            .collect();

        candidate_periods.sort_by_key(|p| std::cmp::Reverse(p.end_date()));
        candidate_periods.dedup();

        match view {
            PeriodView::LatestAnnual | PeriodView::LatestQuarterly => {
                candidate_periods.into_iter().take(1).map(|p| p.key()).collect()
            }
            // A full reconstruction of the trailing-twelve-month window
            // (deriving Q4 = FY - 9M and friends) belongs to
            // `quarterize::compute_ttm`, which operates on typed
            // `PeriodFact`s rather than raw `Fact`s. Here, where only
            // discrete quarters are available, the view selects the four
            // most recent reported quarters as a best-effort approximation
            // and leaves derivation to the dedicated quarterizer.
            PeriodView::TrailingTwelveMonths => candidate_periods.into_iter().take(4).map(|p| p.key()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Context, ElementCatalog};
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::str::FromStr;

    fn doc_with_two_facts() -> XbrlDocument {
        let mut contexts = HashMap::new();
        contexts.insert(
            "ctx_q1".to_string(),
            Context {
                id: "ctx_q1".to_string(),
                entity_identifier: "1".to_string(),
                period: Period::Duration {
                    start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
                },
                dimensions: Vec::new(),
            },
        );
        contexts.insert(
            "ctx_instant".to_string(),
            Context {
                id: "ctx_instant".to_string(),
                entity_identifier: "1".to_string(),
                period: Period::Instant(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()),
                dimensions: Vec::new(),
            },
        );
        let mut units = HashMap::new();
        units.insert("usd".to_string(), Unit::Measure("USD".to_string()));

        let facts = vec![
            Fact {
                concept: ConceptId::new("us-gaap", "Revenues"),
                context_ref: "ctx_q1".to_string(),
                unit_ref: Some("usd".to_string()),
                value: FactValue::Decimal(BigDecimal::from_str("500").unwrap()),
                decimals: Some(-6),
                footnote_refs: Vec::new(),
            },
            Fact {
                concept: ConceptId::new("us-gaap", "Assets"),
                context_ref: "ctx_instant".to_string(),
                unit_ref: Some("usd".to_string()),
                value: FactValue::Decimal(BigDecimal::from_str("9000").unwrap()),
                decimals: Some(-6),
                footnote_refs: Vec::new(),
            },
        ];

        XbrlDocument {
            catalog: ElementCatalog::new(),
            contexts,
            units,
            facts,
            arcs: crate::model::ArcTable::new(),
            role_definitions: HashMap::new(),
            document_period_end_date: None,
            entity_identifier: None,
        }
    }

    #[test]
    fn filters_by_concept_and_period_type() {
        let doc = doc_with_two_facts();
        let results = FactQuery::new(&doc)
            .concept(ConceptId::new("us-gaap", "Revenues"))
            .period_type(PeriodTypeFilter::Quarterly)
            .execute();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].concept.local_name, "Revenues");
    }

    #[test]
    fn instant_filter_excludes_durations() {
        let doc = doc_with_two_facts();
        let results = FactQuery::new(&doc).period_type(PeriodTypeFilter::Instant).execute();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].concept.local_name, "Assets");
    }

    #[test]
    fn value_range_filters_decimal_bounds() {
        let doc = doc_with_two_facts();
        let results = FactQuery::new(&doc)
            .value_range(Some(BigDecimal::from_str("1000").unwrap()), None)
            .execute();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].concept.local_name, "Assets");
    }
}
