//! Typed error surface for the XBRL-to-statement pipeline.
//!
//! Structural failures (malformed XML, missing linkbases, unresolved
//! concepts, cyclic arc graphs) are fatal and unwind the current parse.
//! Semantic outcomes (statement not found, insufficient data for a TTM) are
//! not represented here as `Err` values at the public API boundary — they
//! are distinct `Ok` variants on the relevant result types, so that callers
//! can tell "no statement found" apart from "statement found but empty"
//! without downcasting an error. The variants below exist for internal use
//! and for the lower-level entry points tests exercise directly.

use thiserror::Error;

/// The five linkbase kinds (plus the instance) a filing bundle may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkbaseKind {
    Schema,
    Presentation,
    Calculation,
    Definition,
    Label,
    Instance,
}

impl std::fmt::Display for LinkbaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LinkbaseKind::Schema => "schema",
            LinkbaseKind::Presentation => "presentation",
            LinkbaseKind::Calculation => "calculation",
            LinkbaseKind::Definition => "definition",
            LinkbaseKind::Label => "label",
            LinkbaseKind::Instance => "instance",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum XbrlError {
    #[error("malformed XBRL in {file}: {reason}")]
    MalformedXbrl { file: String, reason: String },

    #[error("required linkbase missing: {kind}")]
    MissingLinkbase { kind: LinkbaseKind },

    #[error("arc in {referenced_by} references unresolved concept {concept}")]
    ConceptResolutionError {
        concept: String,
        referenced_by: String,
    },

    #[error("cyclic arc graph detected in role {role} at concept {concept}")]
    CyclicArcGraph { role: String, concept: String },

    #[error("no statement role met the confidence threshold for {statement_type} (best {best_confidence:.2})")]
    StatementNotFound {
        statement_type: String,
        best_confidence: f64,
    },

    #[error("insufficient data: {reason}")]
    InsufficientData { reason: String },

    #[error("unknown unit reference: {unit_ref}")]
    UnknownUnit { unit_ref: String },

    #[error("fact on concept {fact_concept} references unknown context {context_ref}")]
    InvalidContextReference {
        context_ref: String,
        fact_concept: String,
    },

    #[error("invalid registry configuration: {0}")]
    InvalidRegistry(String),
}

pub type Result<T> = std::result::Result<T, XbrlError>;
