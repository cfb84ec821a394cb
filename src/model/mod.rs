//! Shared data model. Owned by parsing; read by every downstream
//! component. The catalog/context/unit tables are shared and immutable
//! after parse; trees own their nodes; line items reference concept ids,
//! never node pointers.

pub mod arc;
pub mod context;
pub mod element;
pub mod fact;
pub mod unit;

pub use arc::{Arc, ArcTable, DefinitionArcrole, LinkbaseKind};
pub use context::{Context, DimensionMember, Period};
pub use element::{BalanceType, ConceptId, DataType, ElementCatalog, ElementDescriptor, PeriodType};
pub use fact::{Fact, FactValue};
pub use unit::Unit;

use std::collections::HashMap;

/// The canonical statement types the resolver maps filing roles onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum StatementType {
    BalanceSheet,
    IncomeStatement,
    CashFlowStatement,
    StatementOfEquity,
    ComprehensiveIncome,
    CoverPage,
}

impl StatementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::BalanceSheet => "BalanceSheet",
            StatementType::IncomeStatement => "IncomeStatement",
            StatementType::CashFlowStatement => "CashFlowStatement",
            StatementType::StatementOfEquity => "StatementOfEquity",
            StatementType::ComprehensiveIncome => "ComprehensiveIncome",
            StatementType::CoverPage => "CoverPage",
        }
    }

    /// Balance Sheet facts are tagged to instant periods; every other
    /// primary statement is a duration.
    pub fn requires_instant_periods(&self) -> bool {
        matches!(self, StatementType::BalanceSheet)
    }
}

/// A complete in-memory parse of one filing's XBRL bundle. Shared, read-only input to the tree builder, resolver, period
/// selector, and line-item generator.
#[derive(Debug, Clone)]
pub struct XbrlDocument {
    pub catalog: ElementCatalog,
    pub contexts: HashMap<String, Context>,
    pub units: HashMap<String, Unit>,
    pub facts: Vec<Fact>,
    pub arcs: ArcTable,
    /// Role URI -> human readable definition text, parsed from the schema's
    /// role-type definitions.
    pub role_definitions: HashMap<String, String>,
    /// `dei:DocumentPeriodEndDate` from the instance, used by the period
    /// selector's hard document-date filter.
    pub document_period_end_date: Option<chrono::NaiveDate>,
    pub entity_identifier: Option<String>,
}

impl XbrlDocument {
    pub fn facts_for_concept<'a>(&'a self, concept: &'a ConceptId) -> impl Iterator<Item = &'a Fact> {
        self.facts.iter().filter(move |f| &f.concept == concept)
    }

    pub fn context(&self, context_ref: &str) -> Option<&Context> {
        self.contexts.get(context_ref)
    }

    pub fn unit(&self, unit_ref: &str) -> Option<&Unit> {
        self.units.get(unit_ref)
    }
}
