//! **XBRL-to-Statement Core**
//!
//! Parses SEC EDGAR XBRL filing bundles (instance + presentation/
//! calculation/definition/label linkbases) into structured, comparable
//! financial statements: Balance Sheet, Income Statement, Cash Flow
//! Statement, Statement of Equity, and Comprehensive Income.
//!
//! # Pipeline
//!
//! The crate is organized as the six cooperating components named in the
//! design: [`parser`] turns raw bytes into a typed [`model::XbrlDocument`];
//! [`tree`] assembles presentation/calculation/definition trees from the
//! parsed arcs; [`resolver`] maps a canonical [`model::StatementType`] onto
//! one of those trees; [`period`] picks which reporting periods to
//! display; [`lineitem`] walks the chosen tree over the chosen periods to
//! produce displayable rows; and [`stitch`] / [`quarterize`] combine rows
//! across multiple filings into comparative and trailing-twelve-month
//! views. [`ParsedFiling`] wires the first five into one call for the
//! common case of "resolve and render one statement from one filing."
//!
//! # Examples
//!
//! ```rust,no_run
//! use xbrl_statements::{ParsedFiling, RegistryBundle, GenerationOptions};
//! use xbrl_statements::parser::NamedBuffer;
//! use xbrl_statements::model::StatementType;
//!
//! # fn example(buffers: &[NamedBuffer]) -> xbrl_statements::Result<()> {
//! let registry = RegistryBundle::default();
//! let filing = ParsedFiling::parse(buffers)?;
//! let outcome = filing.generate_statement(
//!     StatementType::BalanceSheet,
//!     false,
//!     None,
//!     &GenerationOptions::default(),
//!     &registry,
//! );
//! if let xbrl_statements::ResolutionOutcome::Found(statement) = outcome {
//!     println!("resolved {} rows at confidence {:.2}", statement.line_items.len(), statement.confidence);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod lineitem;
pub mod model;
pub mod parser;
pub mod period;
pub mod quarterize;
pub mod query;
pub mod registry;
pub mod resolver;
pub mod stitch;
pub mod tree;

use std::collections::HashMap;

use tracing::debug;

pub use error::{Result, XbrlError};
pub use lineitem::{GenerationOptions, LineItem, LineItemValue};
pub use model::{StatementType, XbrlDocument};
pub use parser::NamedBuffer;
pub use period::PeriodCandidate;
pub use quarterize::{compute_ttm, DurationClass, PeriodFact, Quarter, TtmResult};
pub use query::{FactQuery, PeriodTypeFilter, PeriodView};
pub use registry::RegistryBundle;
pub use resolver::ResolutionTier;
pub use stitch::{stitch, FilingStatement, StitchedStatement};
pub use tree::{CalculationTree, DefinitionTree, PresentationTree};

/// One fully parsed filing: the raw document plus every presentation,
/// calculation, and definition tree built from it, keyed by role URI.
pub struct ParsedFiling {
    pub document: XbrlDocument,
    pub presentation_trees: HashMap<String, PresentationTree>,
    pub calculation_trees: HashMap<String, CalculationTree>,
    pub definition_tree: DefinitionTree,
}

impl ParsedFiling {
    /// Parse a filing bundle and build every role's trees up front.
    /// Cheap relative to the parse itself — a typical filing has tens of
    /// roles, not thousands.
    pub fn parse(buffers: &[NamedBuffer<'_>]) -> Result<Self> {
        let document = parser::parse_bundle(buffers)?;
        let presentation_trees = tree::build_presentation_trees(&document.arcs)?;
        let calculation_trees = tree::build_calculation_trees(&document.arcs);
        let definition_tree = tree::build_definition_tree(&document.arcs);
        Ok(Self {
            document,
            presentation_trees,
            calculation_trees,
            definition_tree,
        })
    }

    /// Resolve `statement_type` to a role without generating line items.
    /// Exposed separately from [`ParsedFiling::generate_statement`]
    /// for callers that only need the role/confidence, e.g. to decide
    /// whether to bother requesting the full statement.
    pub fn resolve(&self, statement_type: StatementType, is_parenthetical: bool, registry: &RegistryBundle) -> Option<resolver::ResolvedRole> {
        resolver::resolve(
            &self.document,
            &self.presentation_trees,
            &registry.statements,
            statement_type,
            is_parenthetical,
        )
    }

    /// Run the full pipeline for one statement: resolve a role, select
    /// periods, and generate line items. Returns `ResolutionOutcome::NotFound`
    /// rather than an `Err` when nothing clears the resolver's confidence
    /// floor, distinguishing "no statement found" from "found but empty".
    pub fn generate_statement(
        &self,
        statement_type: StatementType,
        is_parenthetical: bool,
        max_periods: Option<usize>,
        options: &GenerationOptions,
        registry: &RegistryBundle,
    ) -> ResolutionOutcome {
        let Some(resolved) = self.resolve(statement_type, is_parenthetical, registry) else {
            debug!(?statement_type, "no role resolved for statement type");
            return ResolutionOutcome::NotFound {
                statement_type,
                best_confidence: 0.0,
            };
        };

        if resolved.confidence < resolver::MIN_CONFIDENCE {
            return ResolutionOutcome::NotFound {
                statement_type,
                best_confidence: resolved.confidence,
            };
        }

        let Some(tree) = self.presentation_trees.get(&resolved.role) else {
            return ResolutionOutcome::NotFound {
                statement_type,
                best_confidence: resolved.confidence,
            };
        };

        let max_periods = max_periods.unwrap_or(period::DEFAULT_MAX_PERIODS_SINGLE);
        let candidates = period::select_periods(&self.document, tree, statement_type, max_periods);
        let periods: Vec<model::Period> = candidates.iter().map(|c| c.period).collect();

        let calc_tree = self.calculation_trees.get(&resolved.role);
        let line_items = lineitem::generate_line_items(
            &self.document,
            tree,
            calc_tree,
            &periods,
            statement_type,
            registry,
            options,
        );

        ResolutionOutcome::Found(ResolvedStatement {
            statement_type,
            role: resolved.role,
            confidence: resolved.confidence,
            tier: resolved.tier,
            periods: candidates,
            line_items,
        })
    }

    /// Start a fluent fact query over this filing's facts.
    pub fn query(&self) -> FactQuery<'_> {
        FactQuery::new(&self.document)
    }
}

/// A fully generated statement: the resolved role/confidence plus the
/// periods selected and the line items produced for them.
#[derive(Debug, Clone)]
pub struct ResolvedStatement {
    pub statement_type: StatementType,
    pub role: String,
    pub confidence: f64,
    pub tier: ResolutionTier,
    pub periods: Vec<PeriodCandidate>,
    pub line_items: Vec<LineItem>,
}

/// The outcome of resolving and generating a statement. `NotFound` is a
/// normal, successful return value — not an error — distinguishing "no
/// role cleared the confidence floor" from a structural parse failure.
#[derive(Debug, Clone)]
pub enum ResolutionOutcome {
    Found(ResolvedStatement),
    NotFound {
        statement_type: StatementType,
        best_confidence: f64,
    },
}

impl ResolutionOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, ResolutionOutcome::Found(_))
    }

    pub fn into_statement(self) -> Option<ResolvedStatement> {
        match self {
            ResolutionOutcome::Found(s) => Some(s),
            ResolutionOutcome::NotFound { .. } => None,
        }
    }
}
