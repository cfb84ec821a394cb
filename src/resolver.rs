//! Statement Resolver: decides which role in a filing
//! corresponds to each canonical statement type, via a multi-tier registry
//! match with confidence annotation.

use tracing::debug;

use crate::error::{Result, XbrlError};
use crate::model::{ElementCatalog, StatementType, XbrlDocument};
use crate::registry::StatementRegistry;
use crate::tree::PresentationTree;

pub const MIN_CONFIDENCE: f64 = 0.4;

/// Which tier produced the match, carried for diagnostics and for the
/// REGN-style "same role serves two canonical types" special case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    PrimaryConcept,
    NamespacePattern,
    RoleText,
    ContentScore,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct ResolvedRole {
    pub role: String,
    pub confidence: f64,
    pub tier: ResolutionTier,
}

/// Resolve a canonical statement type to a role, returning `None` rather
/// than erroring when nothing clears the minimum confidence — callers at
/// the public API boundary turn this into a `ResolutionOutcome::NotFound`
///; `resolve_strict` below is for callers (mainly tests) that want
/// the `Err` directly.
pub fn resolve(
    document: &XbrlDocument,
    trees: &std::collections::HashMap<String, PresentationTree>,
    registry: &StatementRegistry,
    statement_type: StatementType,
    is_parenthetical: bool,
) -> Option<ResolvedRole> {
    let def = registry.get(statement_type)?;

    let mut candidate_roles: Vec<&String> = trees
        .keys()
        .filter(|role| is_parenthetical_role(document, role) == is_parenthetical)
        .collect();
    candidate_roles.sort();

    // Tier 1: primary concept match.
    for role in &candidate_roles {
        let Some(tree) = trees.get(role.as_str()) else { continue };
        if tree_contains_any_near_root(tree, &def.primary_concepts) {
            return Some(ResolvedRole {
                role: (*role).clone(),
                confidence: 0.90,
                tier: ResolutionTier::PrimaryConcept,
            });
        }
    }

    // Tier 2: namespace/company-taxonomy pattern match on concept names.
    for role in &candidate_roles {
        let Some(tree) = trees.get(role.as_str()) else { continue };
        for concept in tree.concepts_dfs() {
            if def.namespace_patterns.iter().any(|p| p.is_match(&concept.local_name)) {
                return Some(ResolvedRole {
                    role: (*role).clone(),
                    confidence: 0.85,
                    tier: ResolutionTier::NamespacePattern,
                });
            }
        }
    }

    // Tier 3: role URI / role-definition text match.
    for role in &candidate_roles {
        let definition = document.role_definitions.get(role.as_str()).map(String::as_str).unwrap_or("");
        if def.role_patterns.iter().any(|p| p.is_match(role) || p.is_match(definition)) {
            return Some(ResolvedRole {
                role: (*role).clone(),
                confidence: 0.75,
                tier: ResolutionTier::RoleText,
            });
        }
    }

    // Tier 4: content-based scoring.
    let mut best: Option<(String, f64)> = None;
    for role in &candidate_roles {
        let Some(tree) = trees.get(role.as_str()) else { continue };
        let score = content_score(tree, &document.catalog, def);
        if score >= def.content_min_score && best.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
            best = Some(((*role).clone(), score));
        }
    }
    if let Some((role, score)) = best {
        let confidence = score.clamp(0.60, 0.85);
        return Some(ResolvedRole {
            role,
            confidence,
            tier: ResolutionTier::ContentScore,
        });
    }

    // Tier 5: fallback guess — the highest-scoring candidate regardless of
    // floor, capped at 0.50, or nothing at all.
    let mut fallback: Option<(String, f64)> = None;
    for role in &candidate_roles {
        let Some(tree) = trees.get(role.as_str()) else { continue };
        let score = content_score(tree, &document.catalog, def);
        if fallback.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
            fallback = Some(((*role).clone(), score));
        }
    }
    fallback.map(|(role, score)| {
        let confidence = score.min(0.50);
        debug!(?statement_type, role = %role, confidence, "fallback statement resolution");
        ResolvedRole {
            role,
            confidence,
            tier: ResolutionTier::Fallback,
        }
    })
}

/// Same as `resolve`, but returns the `StatementNotFound` error when
/// nothing clears `MIN_CONFIDENCE` rather than silently returning `None`.
/// Intended for internal use and for tests exercising the failure path
/// directly.
pub fn resolve_strict(
    document: &XbrlDocument,
    trees: &std::collections::HashMap<String, PresentationTree>,
    registry: &StatementRegistry,
    statement_type: StatementType,
    is_parenthetical: bool,
) -> Result<ResolvedRole> {
    match resolve(document, trees, registry, statement_type, is_parenthetical) {
        Some(resolved) if resolved.confidence >= MIN_CONFIDENCE => Ok(resolved),
        Some(resolved) => Err(XbrlError::StatementNotFound {
            statement_type: statement_type.as_str().to_string(),
            best_confidence: resolved.confidence,
        }),
        None => Err(XbrlError::StatementNotFound {
            statement_type: statement_type.as_str().to_string(),
            best_confidence: 0.0,
        }),
    }
}

fn is_parenthetical_role(document: &XbrlDocument, role: &str) -> bool {
    let definition = document.role_definitions.get(role).map(String::as_str).unwrap_or("");
    role.to_ascii_lowercase().contains("parenthetical") || definition.to_ascii_lowercase().contains("parenthetical")
}

/// True if any of `primary_concepts` appears at the tree's root or among
/// the root's immediate children.
fn tree_contains_any_near_root(tree: &PresentationTree, primary_concepts: &[String]) -> bool {
    for root in &tree.roots {
        if primary_concepts.iter().any(|c| c == &root.concept.local_name) {
            return true;
        }
        if root
            .children
            .iter()
            .any(|child| primary_concepts.iter().any(|c| c == &child.concept.local_name))
        {
            return true;
        }
    }
    false
}

/// Weighted sum of key-concept presence.
fn content_score(
    tree: &PresentationTree,
    catalog: &ElementCatalog,
    def: &crate::registry::CompiledStatementDefinition,
) -> f64 {
    let present: std::collections::HashSet<&str> =
        tree.concepts_dfs().into_iter().map(|c| c.local_name.as_str()).collect();
    let _ = catalog; // reserved for future data-type-aware scoring refinements
    def.content_weights
        .iter()
        .filter(|(concept, _)| present.contains(concept.as_str()))
        .map(|(_, weight)| *weight)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::arc::LinkbaseKind;
    use crate::model::{Arc as XbrlArc, ArcTable, ConceptId};
    use crate::registry::RegistryBundle;
    use crate::tree::build_presentation_trees;
    use std::collections::HashMap;

    fn doc_with_role(role: &str, root_local: &str) -> (XbrlDocument, HashMap<String, PresentationTree>) {
        let mut arcs = ArcTable::new();
        arcs.push(
            LinkbaseKind::Presentation,
            XbrlArc {
                from: ConceptId::new("co", root_local),
                to: ConceptId::new("us-gaap", "Assets"),
                role: role.to_string(),
                order: 1.0,
                preferred_label: None,
                weight: None,
                definition_arcrole: None,
            },
        );
        let trees = build_presentation_trees(&arcs).unwrap();
        let doc = XbrlDocument {
            catalog: ElementCatalog::new(),
            contexts: HashMap::new(),
            units: HashMap::new(),
            facts: Vec::new(),
            arcs,
            role_definitions: HashMap::new(),
            document_period_end_date: None,
            entity_identifier: None,
        };
        (doc, trees)
    }

    #[test]
    fn resolves_balance_sheet_by_primary_concept() {
        let (doc, trees) = doc_with_role("role1", "StatementOfFinancialPositionAbstract");
        let registry = RegistryBundle::default().statements;
        let resolved = resolve(&doc, &trees, &registry, StatementType::BalanceSheet, false).unwrap();
        assert_eq!(resolved.tier, ResolutionTier::PrimaryConcept);
        assert!((resolved.confidence - 0.90).abs() < 1e-9);
    }

    #[test]
    fn resolves_by_role_text_when_no_primary_concept_present() {
        let (doc, trees) = doc_with_role("http://co.com/role/BalanceSheets", "SomeRandomAbstract");
        let registry = RegistryBundle::default().statements;
        let resolved = resolve(&doc, &trees, &registry, StatementType::BalanceSheet, false).unwrap();
        assert_eq!(resolved.tier, ResolutionTier::RoleText);
    }

    #[test]
    fn excludes_parenthetical_role_unless_requested() {
        let (doc, trees) = doc_with_role(
            "http://co.com/role/BalanceSheetsParenthetical",
            "StatementOfFinancialPositionAbstract",
        );
        let registry = RegistryBundle::default().statements;
        let resolved = resolve(&doc, &trees, &registry, StatementType::BalanceSheet, false);
        assert!(resolved.is_none());
        let resolved = resolve(&doc, &trees, &registry, StatementType::BalanceSheet, true);
        assert!(resolved.is_some());
    }
}
