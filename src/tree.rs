//! Tree Builder: assembles the presentation, calculation,
//! and definition linkbases into depth-annotated, order-sorted trees, one
//! per role URI.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, XbrlError};
use crate::model::arc::{Arc, DefinitionArcrole, LinkbaseKind};
use crate::model::element::ConceptId;
use crate::model::ArcTable;

/// A node in the presentation tree.
/// Trees own their nodes outright; nodes carry a concept id, never a
/// pointer back into the catalog.
#[derive(Debug, Clone)]
pub struct PresentationNode {
    pub concept: ConceptId,
    pub depth: usize,
    pub preferred_label: Option<String>,
    pub children: Vec<PresentationNode>,
}

#[derive(Debug, Clone)]
pub struct PresentationTree {
    pub role: String,
    pub roots: Vec<PresentationNode>,
}

impl PresentationTree {
    /// All concepts appearing anywhere in the tree, depth-first,
    /// preserving the traversal order the line-item generator will use.
    pub fn concepts_dfs(&self) -> Vec<&ConceptId> {
        let mut out = Vec::new();
        for root in &self.roots {
            collect_dfs(root, &mut out);
        }
        out
    }
}

fn collect_dfs<'a>(node: &'a PresentationNode, out: &mut Vec<&'a ConceptId>) {
    out.push(&node.concept);
    for child in &node.children {
        collect_dfs(child, out);
    }
}

/// A node in the calculation tree: carries the weight applied to its own
/// contribution toward the parent's total.
#[derive(Debug, Clone)]
pub struct CalculationNode {
    pub concept: ConceptId,
    pub weight: f64,
    pub children: Vec<CalculationNode>,
}

#[derive(Debug, Clone, Default)]
pub struct CalculationTree {
    pub roots: Vec<CalculationNode>,
}

impl CalculationTree {
    /// Look up the weight of the calculation arc from `parent` to `child`,
    /// if one exists anywhere in the tree. Used by the line-item generator
    /// to apply sign adjustments.
    pub fn weight_of(&self, parent: &ConceptId, child: &ConceptId) -> Option<f64> {
        fn search(node: &CalculationNode, parent: &ConceptId, child: &ConceptId) -> Option<f64> {
            if &node.concept == parent {
                for c in &node.children {
                    if &c.concept == child {
                        return Some(c.weight);
                    }
                }
            }
            for c in &node.children {
                if let Some(w) = search(c, parent, child) {
                    return Some(w);
                }
            }
            None
        }
        self.roots.iter().find_map(|r| search(r, parent, child))
    }
}

/// Definition-linkbase dimensional metadata: for each
/// axis, the member implied when a context's segment omits it.
#[derive(Debug, Clone, Default)]
pub struct DefinitionTree {
    pub default_members: HashMap<ConceptId, ConceptId>,
}

impl DefinitionTree {
    pub fn default_member(&self, axis: &ConceptId) -> Option<&ConceptId> {
        self.default_members.get(axis)
    }
}

/// Build one presentation tree per role present in the arc table.
pub fn build_presentation_trees(arcs: &ArcTable) -> Result<HashMap<String, PresentationTree>> {
    let mut trees = HashMap::new();
    for role in arcs.roles(LinkbaseKind::Presentation).map(str::to_string).collect::<Vec<_>>() {
        let role_arcs = arcs.arcs_for(LinkbaseKind::Presentation, &role);
        let tree = build_one_presentation_tree(&role, role_arcs)?;
        trees.insert(role, tree);
    }
    Ok(trees)
}

fn build_one_presentation_tree(role: &str, role_arcs: &[Arc]) -> Result<PresentationTree> {
    let mut children_of: HashMap<ConceptId, Vec<&Arc>> = HashMap::new();
    let mut has_parent: HashSet<ConceptId> = HashSet::new();
    let mut all_from: Vec<ConceptId> = Vec::new();

    for arc in role_arcs {
        children_of.entry(arc.from.clone()).or_default().push(arc);
        has_parent.insert(arc.to.clone());
        if !all_from.contains(&arc.from) {
            all_from.push(arc.from.clone());
        }
    }

    // Roots are concepts that appear as `from` but never as `to`
    //.
    let mut roots = Vec::new();
    for from in &all_from {
        if !has_parent.contains(from) {
            let mut path = HashSet::new();
            roots.push(build_node(from.clone(), 0, None, &children_of, &mut path, role)?);
        }
    }

    Ok(PresentationTree {
        role: role.to_string(),
        roots,
    })
}

fn build_node(
    concept: ConceptId,
    depth: usize,
    preferred_label: Option<String>,
    children_of: &HashMap<ConceptId, Vec<&Arc>>,
    path: &mut HashSet<ConceptId>,
    role: &str,
) -> Result<PresentationNode> {
    if !path.insert(concept.clone()) {
        // Defensive cycle guard.
        return Err(XbrlError::CyclicArcGraph {
            role: role.to_string(),
            concept: concept.qualified_name(),
        });
    }

    let mut children = Vec::new();
    if let Some(arcs) = children_of.get(&concept) {
        let mut sorted: Vec<&&Arc> = arcs.iter().collect();
        sorted.sort_by(|a, b| a.order.partial_cmp(&b.order).unwrap_or(std::cmp::Ordering::Equal));
        for arc in sorted {
            // Refuse to descend into an already-visited concept within
            // this path rather than erroring the whole tree; valid XBRL
            // is acyclic so this only guards non-conformant input.
            if path.contains(&arc.to) {
                continue;
            }
            children.push(build_node(
                arc.to.clone(),
                depth + 1,
                arc.preferred_label.clone(),
                children_of,
                path,
                role,
            )?);
        }
    }

    path.remove(&concept);

    Ok(PresentationNode {
        concept,
        depth,
        preferred_label,
        children,
    })
}

/// Build one calculation tree per role (same shape as presentation, but
/// carrying weights instead of preferred labels).
pub fn build_calculation_trees(arcs: &ArcTable) -> HashMap<String, CalculationTree> {
    let mut trees = HashMap::new();
    for role in arcs.roles(LinkbaseKind::Calculation).map(str::to_string).collect::<Vec<_>>() {
        let role_arcs = arcs.arcs_for(LinkbaseKind::Calculation, &role);
        trees.insert(role.clone(), build_one_calculation_tree(role_arcs));
    }
    trees
}

fn build_one_calculation_tree(role_arcs: &[Arc]) -> CalculationTree {
    let mut children_of: HashMap<ConceptId, Vec<&Arc>> = HashMap::new();
    let mut has_parent: HashSet<ConceptId> = HashSet::new();
    let mut all_from: Vec<ConceptId> = Vec::new();

    for arc in role_arcs {
        children_of.entry(arc.from.clone()).or_default().push(arc);
        has_parent.insert(arc.to.clone());
        if !all_from.contains(&arc.from) {
            all_from.push(arc.from.clone());
        }
    }

    let mut roots = Vec::new();
    for from in &all_from {
        if !has_parent.contains(from) {
            let mut path = HashSet::new();
            roots.push(build_calc_node(from.clone(), 1.0, &children_of, &mut path));
        }
    }

    CalculationTree { roots }
}

fn build_calc_node(
    concept: ConceptId,
    weight: f64,
    children_of: &HashMap<ConceptId, Vec<&Arc>>,
    path: &mut HashSet<ConceptId>,
) -> CalculationNode {
    path.insert(concept.clone());
    let mut children = Vec::new();
    if let Some(arcs) = children_of.get(&concept) {
        let mut sorted: Vec<&&Arc> = arcs.iter().collect();
        sorted.sort_by(|a, b| a.order.partial_cmp(&b.order).unwrap_or(std::cmp::Ordering::Equal));
        for arc in sorted {
            if path.contains(&arc.to) {
                continue;
            }
            let child_weight = arc.weight.unwrap_or(1.0);
            children.push(build_calc_node(arc.to.clone(), child_weight, children_of, path));
        }
    }
    path.remove(&concept);
    CalculationNode {
        concept,
        weight,
        children,
    }
}

/// Build the definition-linkbase dimensional metadata: scan every `dimension-default` arc across every role, since
/// defaults are declared once per axis regardless of which statement role
/// uses that axis.
pub fn build_definition_tree(arcs: &ArcTable) -> DefinitionTree {
    let mut default_members = HashMap::new();
    for role in arcs.roles(LinkbaseKind::Definition).map(str::to_string).collect::<Vec<_>>() {
        for arc in arcs.arcs_for(LinkbaseKind::Definition, &role) {
            if arc.definition_arcrole == Some(DefinitionArcrole::DimensionDefault) {
                default_members.insert(arc.from.clone(), arc.to.clone());
            }
        }
    }
    DefinitionTree { default_members }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::arc::Arc;

    fn c(name: &str) -> ConceptId {
        ConceptId::new("us-gaap", name)
    }

    #[test]
    fn builds_ordered_tree_with_depths() {
        let mut arcs = ArcTable::new();
        arcs.push(
            LinkbaseKind::Presentation,
            Arc {
                from: c("BalanceSheetAbstract"),
                to: c("Assets"),
                role: "role1".into(),
                order: 2.0,
                preferred_label: None,
                weight: None,
                definition_arcrole: None,
            },
        );
        arcs.push(
            LinkbaseKind::Presentation,
            Arc {
                from: c("BalanceSheetAbstract"),
                to: c("Liabilities"),
                role: "role1".into(),
                order: 1.0,
                preferred_label: None,
                weight: None,
                definition_arcrole: None,
            },
        );

        let trees = build_presentation_trees(&arcs).unwrap();
        let tree = &trees["role1"];
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.roots[0].concept, c("BalanceSheetAbstract"));
        assert_eq!(tree.roots[0].children[0].concept, c("Liabilities"));
        assert_eq!(tree.roots[0].children[1].concept, c("Assets"));
        assert_eq!(tree.roots[0].children[0].depth, 1);
    }

    #[test]
    fn calculation_weight_lookup() {
        let mut arcs = ArcTable::new();
        arcs.push(
            LinkbaseKind::Calculation,
            Arc {
                from: c("NetIncomeLoss"),
                to: c("IncomeTaxExpenseBenefit"),
                role: "role1".into(),
                order: 1.0,
                preferred_label: None,
                weight: Some(-1.0),
                definition_arcrole: None,
            },
        );
        let trees = build_calculation_trees(&arcs);
        let tree = &trees["role1"];
        assert_eq!(
            tree.weight_of(&c("NetIncomeLoss"), &c("IncomeTaxExpenseBenefit")),
            Some(-1.0)
        );
    }
}
