//! Process-wide configuration registries. Three JSON documents, loaded once and
//! held behind `Arc` by callers that parse many filings concurrently.

use std::collections::HashMap;
use std::io::Read;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, XbrlError};
use crate::model::StatementType;

const DEFAULT_STATEMENT_REGISTRY: &str = include_str!("../registry/statement_registry.json");
const DEFAULT_STANDARDIZATION: &str = include_str!("../registry/standardization.json");
const DEFAULT_EXPENSE_WHITELIST: &str = include_str!("../registry/expense_sign_whitelist.json");

/// One canonical statement type's resolution recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct StatementDefinition {
    pub primary_concepts: Vec<String>,
    pub namespace_patterns: Vec<String>,
    pub role_patterns: Vec<String>,
    pub content_weights: HashMap<String, f64>,
    #[serde(default = "default_min_score")]
    pub content_min_score: f64,
}

fn default_min_score() -> f64 {
    0.5
}

/// Compiled form of a `StatementDefinition`; regexes are compiled once at
/// load time rather than per-resolution call.
#[derive(Debug, Clone)]
pub struct CompiledStatementDefinition {
    pub primary_concepts: Vec<String>,
    pub namespace_patterns: Vec<Regex>,
    pub role_patterns: Vec<Regex>,
    pub content_weights: HashMap<String, f64>,
    pub content_min_score: f64,
}

/// Primary concepts, alternative/pattern regexes, role-text regexes, and
/// content-scoring weights per canonical statement type.
#[derive(Debug, Clone, Default)]
pub struct StatementRegistry {
    entries: HashMap<StatementType, CompiledStatementDefinition>,
}

impl StatementRegistry {
    fn from_raw(raw: HashMap<String, StatementDefinition>) -> Result<Self> {
        let mut entries = HashMap::new();
        for (key, def) in raw {
            let statement_type = parse_statement_type(&key)?;
            let namespace_patterns = def
                .namespace_patterns
                .iter()
                .map(|p| compile_pattern(p))
                .collect::<Result<Vec<_>>>()?;
            let role_patterns = def
                .role_patterns
                .iter()
                .map(|p| compile_pattern(p))
                .collect::<Result<Vec<_>>>()?;
            entries.insert(
                statement_type,
                CompiledStatementDefinition {
                    primary_concepts: def.primary_concepts,
                    namespace_patterns,
                    role_patterns,
                    content_weights: def.content_weights,
                    content_min_score: def.content_min_score,
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn get(&self, statement_type: StatementType) -> Option<&CompiledStatementDefinition> {
        self.entries.get(&statement_type)
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| XbrlError::InvalidRegistry(format!("bad pattern {pattern:?}: {e}")))
}

fn parse_statement_type(key: &str) -> Result<StatementType> {
    match key {
        "BalanceSheet" => Ok(StatementType::BalanceSheet),
        "IncomeStatement" => Ok(StatementType::IncomeStatement),
        "CashFlowStatement" => Ok(StatementType::CashFlowStatement),
        "StatementOfEquity" => Ok(StatementType::StatementOfEquity),
        "ComprehensiveIncome" => Ok(StatementType::ComprehensiveIncome),
        "CoverPage" => Ok(StatementType::CoverPage),
        other => Err(XbrlError::InvalidRegistry(format!(
            "unknown statement type key {other:?} in statement registry"
        ))),
    }
}

/// One concept-pattern -> canonical-label rule.
#[derive(Debug, Clone, Deserialize)]
struct RawStandardizationRule {
    pattern: String,
    canonical_label: String,
    priority: i32,
}

#[derive(Debug, Clone)]
pub struct StandardizationRule {
    pub pattern: Regex,
    pub canonical_label: String,
    pub priority: i32,
}

/// Concept-pattern -> canonical label mapping, ordered by descending
/// priority so the first match wins.
#[derive(Debug, Clone, Default)]
pub struct StandardizationMap {
    rules: Vec<StandardizationRule>,
}

impl StandardizationMap {
    fn from_raw(raw: Vec<RawStandardizationRule>) -> Result<Self> {
        let mut rules = raw
            .into_iter()
            .map(|r| {
                Ok(StandardizationRule {
                    pattern: compile_pattern(&r.pattern)?,
                    canonical_label: r.canonical_label,
                    priority: r.priority,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(Self { rules })
    }

    /// The canonical label for a concept's local name, if any rule
    /// matches; highest-priority match wins.
    pub fn canonical_label(&self, local_name: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.pattern.is_match(local_name))
            .map(|r| r.canonical_label.as_str())
    }
}

/// Local-name suffix/pattern list used to force expense concepts positive.
/// Kept runtime-extensible via [`ExpenseSignWhitelist::extend`] rather than
/// requiring a rebuild from JSON.
#[derive(Debug, Clone, Default)]
pub struct ExpenseSignWhitelist {
    patterns: Vec<String>,
}

impl ExpenseSignWhitelist {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    pub fn matches(&self, local_name: &str) -> bool {
        self.patterns.iter().any(|p| local_name == p || local_name.ends_with(p.as_str()))
    }

    pub fn extend(&mut self, patterns: impl IntoIterator<Item = String>) {
        self.patterns.extend(patterns);
    }
}

/// The three registries loaded once at initialization and held immutable
/// for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct RegistryBundle {
    pub statements: StatementRegistry,
    pub standardization: StandardizationMap,
    pub expense_whitelist: ExpenseSignWhitelist,
}

impl RegistryBundle {
    /// Load all three registries from arbitrary byte-stream providers,
    /// mirroring the core parser's own "byte-stream provider" contract
    /// so a caller-supplied override is a one-line
    /// call identical in shape to loading linkbase files.
    pub fn load_from_readers(
        statement_registry: impl Read,
        standardization: impl Read,
        expense_whitelist: impl Read,
    ) -> Result<Self> {
        let statements = load_statement_registry(statement_registry)?;
        let standardization = load_standardization(standardization)?;
        let expense_whitelist = load_expense_whitelist(expense_whitelist)?;
        Ok(Self {
            statements,
            standardization,
            expense_whitelist,
        })
    }
}

/// Parses the embedded default registries. Used by every test and by any
/// caller that doesn't want to manage its own configuration files.
impl Default for RegistryBundle {
    fn default() -> Self {
        Self::load_from_readers(
            DEFAULT_STATEMENT_REGISTRY.as_bytes(),
            DEFAULT_STANDARDIZATION.as_bytes(),
            DEFAULT_EXPENSE_WHITELIST.as_bytes(),
        )
        .expect("embedded default registries must parse")
    }
}

fn load_statement_registry(mut reader: impl Read) -> Result<StatementRegistry> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .map_err(|e| XbrlError::InvalidRegistry(format!("reading statement registry: {e}")))?;
    let raw: HashMap<String, StatementDefinition> = serde_json::from_str(&buf)
        .map_err(|e| XbrlError::InvalidRegistry(format!("parsing statement registry: {e}")))?;
    StatementRegistry::from_raw(raw)
}

fn load_standardization(mut reader: impl Read) -> Result<StandardizationMap> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .map_err(|e| XbrlError::InvalidRegistry(format!("reading standardization map: {e}")))?;
    let raw: Vec<RawStandardizationRule> = serde_json::from_str(&buf)
        .map_err(|e| XbrlError::InvalidRegistry(format!("parsing standardization map: {e}")))?;
    StandardizationMap::from_raw(raw)
}

fn load_expense_whitelist(mut reader: impl Read) -> Result<ExpenseSignWhitelist> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .map_err(|e| XbrlError::InvalidRegistry(format!("reading expense whitelist: {e}")))?;
    let patterns: Vec<String> = serde_json::from_str(&buf)
        .map_err(|e| XbrlError::InvalidRegistry(format!("parsing expense whitelist: {e}")))?;
    Ok(ExpenseSignWhitelist::new(patterns))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_and_cover_primary_statement_types() {
        let bundle = RegistryBundle::default();
        assert!(bundle.statements.get(StatementType::BalanceSheet).is_some());
        assert!(bundle.statements.get(StatementType::IncomeStatement).is_some());
        assert!(bundle.statements.get(StatementType::CashFlowStatement).is_some());
    }

    #[test]
    fn standardization_picks_highest_priority_match() {
        let bundle = RegistryBundle::default();
        assert_eq!(bundle.standardization.canonical_label("Revenues"), Some("Revenue"));
        assert_eq!(
            bundle.standardization.canonical_label("SalesRevenueNet"),
            Some("Revenue")
        );
    }

    #[test]
    fn expense_whitelist_matches_known_suffixes() {
        let bundle = RegistryBundle::default();
        assert!(bundle.expense_whitelist.matches("ResearchAndDevelopmentExpense"));
        assert!(!bundle.expense_whitelist.matches("NetIncomeLoss"));
    }
}
