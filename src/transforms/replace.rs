use std::collections::HashMap;

use crate::lang::{Library, StmtId};
use crate::tree::ParseNode;
use crate::transforms::equivalence::EquivalenceInfo;
use crate::transforms::{binary_op, distinct_vars};

/// Replacement rules `R1(x, y) ⊢ R2(F(.. x ..), F(.. y ..))`, one per operator and child position.
#[derive(Clone, Debug, Default)]
pub struct ReplaceInfo {
	rules: HashMap<StmtId, Vec<Option<StmtId>>>,
}

impl ReplaceInfo {
	pub fn new(library: &Library, equivalence: &EquivalenceInfo) -> Self {
		let mut rules: HashMap<StmtId, Vec<Option<StmtId>>> = HashMap::new();
		for id in library.logical_assertions() {
			let found = library.assertion_trees(id).and_then(|(concl, hyps)| match hyps.as_slice() {
				[hyp] => replace_rule(library, equivalence, hyp, concl),
				_ => None,
			});
			if let Some((op, position, arity)) = found {
				let slots = rules.entry(op).or_insert_with(|| vec![None; arity]);
				if slots[position].is_none() {
					slots[position] = Some(id);
				}
			}
		}
		ReplaceInfo { rules }
	}

	pub fn rules(&self, op: StmtId) -> Option<&[Option<StmtId>]> {
		self.rules.get(&op).map(Vec::as_slice)
	}

	pub fn rule(&self, op: StmtId, position: usize) -> Option<StmtId> {
		self.rules(op)?.get(position).cloned().flatten()
	}

	/// Every child of `op` can be replaced.
	pub fn is_complete(&self, op: StmtId) -> bool {
		self.rules(op).map_or(false, |rules| rules.iter().all(Option::is_some))
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}
}

/// Operator, replaced position and arity of a replacement rule.
fn replace_rule(library: &Library, equivalence: &EquivalenceInfo, hyp: &ParseNode, concl: &ParseNode) -> Option<(StmtId, usize, usize)> {
	let (hyp_op, x, y) = binary_op(library, hyp)?;
	let vars = distinct_vars(library, &[x, y])?;
	let (concl_op, left, right) = binary_op(library, concl)?;
	let op = library.node_op(left)?;
	if library.node_op(right)? != op || left.children.len() != right.children.len() {
		return None;
	}

	let mut differences = left.children.iter()
		.zip(right.children.iter())
		.enumerate()
		.filter(|(_, (a, b))| a != b);
	let (position, (from, to)) = differences.next()?;
	if differences.next().is_some() || from != x || to != y {
		return None;
	}

	let child_type = library.stmt(vars[0]).typ;
	let op_type = library.stmt(op).typ;
	if equivalence.eq_op(child_type)?.op != hyp_op || equivalence.eq_op(op_type)?.op != concl_op {
		return None;
	}
	Some((op, position, left.children.len()))
}
