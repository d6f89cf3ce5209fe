use std::collections::HashMap;

use crate::lang::{Library, StmtId};
use crate::tree::ParseNode;
use crate::transforms::{binary_op, distinct_vars};

/// `P(v1, K), .., P(vn, K) ⊢ P(F(v1, .., vn), K)`: results of `F` stay in `K`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClosureRule {
	pub assrt: StmtId,
	pub predicate: StmtId,
	pub class: ParseNode,
}

#[derive(Clone, Debug, Default)]
pub struct ClosureInfo {
	rules: HashMap<StmtId, Vec<ClosureRule>>,
}

impl ClosureInfo {
	pub fn new(library: &Library) -> Self {
		let mut rules: HashMap<StmtId, Vec<ClosureRule>> = HashMap::new();
		for id in library.logical_assertions() {
			if let Some((op, rule)) = closure_rule(library, id) {
				rules.entry(op).or_default().push(rule);
			}
		}
		ClosureInfo { rules }
	}

	/// Closure rules of the operator `op`, in library order.
	pub fn rules(&self, op: StmtId) -> &[ClosureRule] {
		self.rules.get(&op).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn has_rule(&self, op: StmtId, predicate: StmtId, class: &ParseNode) -> bool {
		self.rules(op).iter().any(|rule| rule.predicate == predicate && rule.class == *class)
	}
}

fn closure_rule(library: &Library, id: StmtId) -> Option<(StmtId, ClosureRule)> {
	let (concl, hyps) = library.assertion_trees(id)?;
	let (predicate, term, class) = binary_op(library, concl)?;
	let op = library.node_op(term)?;
	if !is_closed(library, class) {
		return None;
	}
	let vars = distinct_vars(library, &term.children.iter().collect::<Vec<_>>())?;

	let mut seen = Vec::new();
	for hyp in hyps {
		let (hyp_predicate, var, hyp_class) = requirement(library, hyp)?;
		if hyp_predicate != predicate || hyp_class != *class || !vars.contains(&var) || seen.contains(&var) {
			return None;
		}
		seen.push(var);
	}

	Some((op, ClosureRule { assrt: id, predicate, class: class.clone() }))
}

/// A tree without variables.
pub fn is_closed(library: &Library, node: &ParseNode) -> bool {
	!library.is_var_node(node) && node.children.iter().all(|child| is_closed(library, child))
}

/// Splits a hypothesis of the form `P(v, K)`, with `v` a variable and `K` without variables.
pub fn requirement(library: &Library, hyp: &ParseNode) -> Option<(StmtId, StmtId, ParseNode)> {
	let (predicate, var, class) = binary_op(library, hyp)?;
	let var = library.pattern_var(var)?;
	if is_closed(library, class) {
		Some((predicate, var, class.clone()))
	} else {
		None
	}
}

/// Predicates and classes of the hypotheses of an associativity or commutativity rule. Every
/// hypothesis has to be a requirement on one of `vars`.
pub fn requirements(library: &Library, hyps: &[&ParseNode], vars: &[StmtId]) -> Option<Vec<(StmtId, ParseNode)>> {
	let mut result: Vec<(StmtId, ParseNode)> = Vec::new();
	for hyp in hyps {
		let (predicate, var, class) = requirement(library, hyp)?;
		if !vars.contains(&var) {
			return None;
		}
		if !result.iter().any(|(p, c)| *p == predicate && *c == class) {
			result.push((predicate, class));
		}
	}
	Some(result)
}
