use std::collections::HashMap;

use crate::lang::{Library, StmtId, SymbolId};
use crate::tree::ParseNode;
use crate::transforms::{binary_op, distinct_vars};

/// Equivalence relation on one type: a binary operator with symmetry and transitivity rules.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EqOp {
	pub op: StmtId,
	/// `R(x, y) ⊢ R(y, x)`
	pub sym: StmtId,
	/// `R(x, y), R(y, z) ⊢ R(x, z)`
	pub trans: StmtId,
	/// `⊢ R(x, x)`
	pub refl: Option<StmtId>,
}

/// `x, R(x, y) ⊢ y`, in either hypothesis order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Implication {
	pub assrt: StmtId,
	pub var_hyp_first: bool,
}

#[derive(Clone, Debug, Default)]
pub struct EquivalenceInfo {
	by_type: HashMap<SymbolId, EqOp>,
	by_op: HashMap<StmtId, SymbolId>,
	implications: HashMap<SymbolId, Implication>,
}

impl EquivalenceInfo {
	pub fn new(library: &Library) -> Self {
		let mut sym = HashMap::new();
		let mut trans = HashMap::new();
		let mut refl = HashMap::new();
		for id in library.logical_assertions() {
			let (concl, hyps) = match library.assertion_trees(id) {
				Some(trees) => trees,
				None => continue,
			};
			match hyps.as_slice() {
				[] => if let Some(op) = reflexivity(library, concl) {
					refl.entry(op).or_insert(id);
				},
				[hyp] => if let Some(op) = symmetry(library, hyp, concl) {
					sym.entry(op).or_insert(id);
				},
				[first, second] => {
					let op = transitivity(library, first, second, concl)
						.or_else(|| transitivity(library, second, first, concl));
					if let Some(op) = op {
						trans.entry(op).or_insert(id);
					}
				},
				_ => {},
			}
		}

		let mut ops: Vec<StmtId> = sym.keys().filter(|op| trans.contains_key(op)).cloned().collect();
		ops.sort();

		let mut result = EquivalenceInfo::default();
		for op in ops {
			let typ = match library.stmt(op).frame().and_then(|frame| frame.var_hyps.first()) {
				Some(hyp) => library.stmt(*hyp).typ,
				None => continue,
			};
			if result.by_type.contains_key(&typ) {
				continue;
			}
			result.by_type.insert(typ, EqOp {
				op,
				sym: sym[&op],
				trans: trans[&op],
				refl: refl.get(&op).cloned(),
			});
			result.by_op.insert(op, typ);
		}

		for id in library.logical_assertions() {
			let (concl, hyps) = match library.assertion_trees(id) {
				Some(trees) => trees,
				None => continue,
			};
			if let [first, second] = hyps.as_slice() {
				let found = result.implication_type(library, first, second, concl)
					.map(|typ| (typ, true))
					.or_else(|| result.implication_type(library, second, first, concl).map(|typ| (typ, false)));
				if let Some((typ, var_hyp_first)) = found {
					result.implications.entry(typ).or_insert(Implication { assrt: id, var_hyp_first });
				}
			}
		}

		result
	}

	/// Equivalence on expressions of type `typ`.
	pub fn eq_op(&self, typ: SymbolId) -> Option<&EqOp> {
		self.by_type.get(&typ)
	}

	/// Type whose equivalence is `op`.
	pub fn eq_type(&self, op: StmtId) -> Option<SymbolId> {
		self.by_op.get(&op).cloned()
	}

	pub fn implication(&self, typ: SymbolId) -> Option<Implication> {
		self.implications.get(&typ).cloned()
	}

	pub fn len(&self) -> usize {
		self.by_type.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_type.is_empty()
	}

	/// Type of `x` when the hypotheses are `x` and `R(x, y)` and the conclusion is `y`.
	fn implication_type(&self, library: &Library, minor: &ParseNode, major: &ParseNode, concl: &ParseNode) -> Option<SymbolId> {
		let (op, left, right) = binary_op(library, major)?;
		let vars = distinct_vars(library, &[minor, concl])?;
		if library.pattern_var(left)? != vars[0] || library.pattern_var(right)? != vars[1] {
			return None;
		}
		let typ = library.stmt(vars[0]).typ;
		if self.eq_op(typ)?.op == op {
			Some(typ)
		} else {
			None
		}
	}
}

/// `⊢ R(x, x)`
fn reflexivity(library: &Library, concl: &ParseNode) -> Option<StmtId> {
	let (op, left, right) = binary_op(library, concl)?;
	if library.pattern_var(left)? == library.pattern_var(right)? {
		Some(op)
	} else {
		None
	}
}

/// `R(x, y) ⊢ R(y, x)`
fn symmetry(library: &Library, hyp: &ParseNode, concl: &ParseNode) -> Option<StmtId> {
	let (op, x, y) = binary_op(library, hyp)?;
	let (concl_op, y2, x2) = binary_op(library, concl)?;
	distinct_vars(library, &[x, y])?;
	if op == concl_op && x == x2 && y == y2 {
		Some(op)
	} else {
		None
	}
}

/// `R(x, y), R(y, z) ⊢ R(x, z)`
fn transitivity(library: &Library, first: &ParseNode, second: &ParseNode, concl: &ParseNode) -> Option<StmtId> {
	let (op, x, y) = binary_op(library, first)?;
	let (second_op, y2, z) = binary_op(library, second)?;
	let (concl_op, x2, z2) = binary_op(library, concl)?;
	distinct_vars(library, &[x, y, z])?;
	if op == second_op && op == concl_op && y == y2 && x == x2 && z == z2 {
		Some(op)
	} else {
		None
	}
}
