use std::collections::HashMap;

use crate::lang::{Library, StmtId};
use crate::tree::ParseNode;
use crate::transforms::closure::requirements;
use crate::transforms::equivalence::EquivalenceInfo;
use crate::transforms::{binary_op, distinct_vars};

/// `R(F(x, y), F(y, x))`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommRule {
	pub assrt: StmtId,
	pub requirements: Vec<(StmtId, ParseNode)>,
}

#[derive(Clone, Debug, Default)]
pub struct CommutativeInfo {
	rules: HashMap<StmtId, CommRule>,
}

impl CommutativeInfo {
	pub fn new(library: &Library, equivalence: &EquivalenceInfo) -> Self {
		let mut rules = HashMap::new();
		for id in library.logical_assertions() {
			if let Some((op, rule)) = comm_rule(library, equivalence, id) {
				rules.entry(op).or_insert(rule);
			}
		}
		CommutativeInfo { rules }
	}

	pub fn rule(&self, op: StmtId) -> Option<&CommRule> {
		self.rules.get(&op)
	}
}

fn comm_rule(library: &Library, equivalence: &EquivalenceInfo, id: StmtId) -> Option<(StmtId, CommRule)> {
	let (concl, hyps) = library.assertion_trees(id)?;
	let (eq, left, right) = binary_op(library, concl)?;
	let (op, x, y) = binary_op(library, left)?;
	let (right_op, y2, x2) = binary_op(library, right)?;
	if op != right_op || x != x2 || y != y2 {
		return None;
	}
	if equivalence.eq_op(library.stmt(op).typ)?.op != eq {
		return None;
	}
	let vars = distinct_vars(library, &[x, y])?;
	let requirements = requirements(library, &hyps, &vars)?;

	Some((op, CommRule { assrt: id, requirements }))
}
