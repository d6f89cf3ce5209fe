use std::collections::HashMap;

use crate::lang::{Library, StmtId};
use crate::tree::ParseNode;
use crate::transforms::closure::requirements;
use crate::transforms::equivalence::EquivalenceInfo;
use crate::transforms::{binary_op, distinct_vars};

/// `R(F(F(x, y), z), F(x, F(y, z)))`, or the mirrored form when `left_grouped` is false.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssocRule {
	pub assrt: StmtId,
	pub left_grouped: bool,
	/// Predicate and class every operand has to be in.
	pub requirements: Vec<(StmtId, ParseNode)>,
}

#[derive(Clone, Debug, Default)]
pub struct AssociativeInfo {
	rules: HashMap<StmtId, AssocRule>,
}

impl AssociativeInfo {
	pub fn new(library: &Library, equivalence: &EquivalenceInfo) -> Self {
		let mut rules = HashMap::new();
		for id in library.logical_assertions() {
			if let Some((op, rule)) = assoc_rule(library, equivalence, id) {
				rules.entry(op).or_insert(rule);
			}
		}
		AssociativeInfo { rules }
	}

	pub fn rule(&self, op: StmtId) -> Option<&AssocRule> {
		self.rules.get(&op)
	}
}

/// `F(F(x, y), z)` as `[x, y, z]`.
fn left_group<'t>(library: &Library, op: StmtId, node: &'t ParseNode) -> Option<[&'t ParseNode; 3]> {
	let (outer, xy, z) = binary_op(library, node)?;
	let (inner, x, y) = binary_op(library, xy)?;
	if outer == op && inner == op {
		Some([x, y, z])
	} else {
		None
	}
}

/// `F(x, F(y, z))` as `[x, y, z]`.
fn right_group<'t>(library: &Library, op: StmtId, node: &'t ParseNode) -> Option<[&'t ParseNode; 3]> {
	let (outer, x, yz) = binary_op(library, node)?;
	let (inner, y, z) = binary_op(library, yz)?;
	if outer == op && inner == op {
		Some([x, y, z])
	} else {
		None
	}
}

fn assoc_rule(library: &Library, equivalence: &EquivalenceInfo, id: StmtId) -> Option<(StmtId, AssocRule)> {
	let (concl, hyps) = library.assertion_trees(id)?;
	let (eq, left, right) = binary_op(library, concl)?;
	let op = library.node_op(left)?;
	if equivalence.eq_op(library.stmt(op).typ)?.op != eq {
		return None;
	}

	let (vars, left_grouped) = match (left_group(library, op, left), right_group(library, op, right)) {
		(Some(l), Some(r)) if l == r => (l, true),
		_ => match (right_group(library, op, left), left_group(library, op, right)) {
			(Some(l), Some(r)) if l == r => (l, false),
			_ => return None,
		},
	};
	let vars = distinct_vars(library, &vars)?;
	let requirements = requirements(library, &hyps, &vars)?;

	Some((op, AssocRule { assrt: id, left_grouped, requirements }))
}
