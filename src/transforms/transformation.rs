//! Canonical forms of trees and proofs that a tree equals its canonical form.
//!
//! A node is rewritten by the first applicable [`Transformation`]. Operands of associative or
//! commutative operators are collected into a left-leaning chain and sorted with
//! [`compare_nodes`]; other children are canonicalized in place through replacement rules.

use std::cmp::Ordering;

use crate::lang::StmtId;
use crate::tree::{compare_nodes, ParseNode};
use crate::transforms::associative::AssocRule;
use crate::transforms::commutative::CommRule;
use crate::transforms::proof::EqProof;
use crate::transforms::worksheet_info::WorksheetInfo;
use crate::transforms::{binary_op, make_binary, TransformError};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Transformation {
	/// Nothing to rewrite at this node.
	Identity,
	/// Children are canonicalized through the replacement rules of `op`, one per child position.
	Replace { op: StmtId, rules: Vec<Option<StmtId>> },
	/// Operands of `op` are regrouped and, with a commutativity rule, sorted.
	Associative {
		op: StmtId,
		assoc: Option<AssocRule>,
		comm: Option<CommRule>,
	},
}

/// A canonical tree and the proof of `R(original, tree)`; `None` when nothing was rewritten.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Canonical {
	pub tree: ParseNode,
	pub proof: Option<EqProof>,
}

impl Canonical {
	pub fn same(tree: ParseNode) -> Self {
		Canonical { tree, proof: None }
	}

	/// Rewrites the subtree at `path` by `step`, a proof of `R(subtree, new subtree)`.
	fn then_at(self, path: &[usize], step: EqProof, info: &WorksheetInfo) -> Result<Canonical, TransformError> {
		let lifted = lift(&self.tree, path, step, info)?;
		Ok(Canonical {
			tree: lifted.rhs().clone(),
			proof: EqProof::trans(self.proof, Some(lifted)),
		})
	}
}

/// The proof of `R(tree, tree')` where `tree'` has the subtree at `path` rewritten by `inner`.
fn lift(tree: &ParseNode, path: &[usize], inner: EqProof, info: &WorksheetInfo) -> Result<EqProof, TransformError> {
	let (position, tail) = match path {
		[position, tail @ ..] => (*position, tail),
		[] => return Ok(inner),
	};
	let child = tree.children.get(position).ok_or_else(|| TransformError::Malformed(info.render(tree)))?;
	let inner = lift(child, tail, inner, info)?;
	let op = info.library.node_op(tree).ok_or_else(|| TransformError::Malformed(info.render(tree)))?;
	let assrt = info.rules.replace.rule(op, position).ok_or_else(|| TransformError::NoReplacement {
		label: info.library.stmt(op).label.clone(),
		position,
	})?;

	Ok(EqProof::Congr {
		assrt,
		lhs: tree.clone(),
		rhs: tree.with_child(position, inner.rhs().clone()),
		inner: Box::new(inner),
	})
}

pub fn classify(node: &ParseNode, info: &WorksheetInfo) -> Result<Transformation, TransformError> {
	classify_with_operands(node, info).map(|(transformation, _)| transformation)
}

/// Classifies `node`. For the associative case also returns the node with its operands
/// canonicalized in place, which the requirement check needs anyway.
fn classify_with_operands(node: &ParseNode, info: &WorksheetInfo) -> Result<(Transformation, Option<Canonical>), TransformError> {
	let op = match info.library.node_op(node) {
		Some(op) => op,
		None => return Ok((Transformation::Identity, None)),
	};
	let rules = match info.rules.replace.rules(op) {
		Some(rules) => rules.to_vec(),
		None => return Ok((Transformation::Identity, None)),
	};

	if node.binary().is_some() && info.rules.replace.is_complete(op) {
		let assoc = info.rules.associative.rule(op).cloned();
		let comm = info.rules.commutative.rule(op).cloned();
		if assoc.is_some() || comm.is_some() {
			let flatten = assoc.is_some();
			let grouped = canonicalize_group(Canonical::same(node.clone()), &[], op, flatten, info)?;
			let operands = group_operands(info, op, flatten, &grouped.tree);
			let regroups = flatten && operands.len() > 2;
			if (regroups || comm.is_some()) && requirements_hold(info, op, &operands, assoc.as_ref(), comm.as_ref(), regroups) {
				return Ok((Transformation::Associative { op, assoc, comm }, Some(grouped)));
			}
		}
	}

	Ok((Transformation::Replace { op, rules }, None))
}

/// Every operand is in the classes the rules require. Regrouping also makes compound operands,
/// which need a closure rule of `op` for each class.
fn requirements_hold(
	info: &WorksheetInfo,
	op: StmtId,
	operands: &[&ParseNode],
	assoc: Option<&AssocRule>,
	comm: Option<&CommRule>,
	regroups: bool,
) -> bool {
	let assoc_requirements = assoc.map(|rule| rule.requirements.as_slice()).unwrap_or(&[]);
	let comm_requirements = comm.map(|rule| rule.requirements.as_slice()).unwrap_or(&[]);

	let operands_ok = assoc_requirements.iter()
		.chain(comm_requirements.iter())
		.all(|(predicate, class)| operands.iter().all(|operand| {
			info.closure_provable(&make_binary(*predicate, (*operand).clone(), class.clone()))
		}));
	let compound_ok = !regroups || assoc_requirements.iter()
		.all(|(predicate, class)| info.rules.closure.has_rule(op, *predicate, class));

	operands_ok && compound_ok
}

/// Canonical form of `node` with the proof of the rewrite. The input is left untouched.
pub fn canonicalize(node: &ParseNode, info: &WorksheetInfo) -> Result<Canonical, TransformError> {
	match classify_with_operands(node, info)? {
		(Transformation::Identity, _) => Ok(Canonical::same(node.clone())),
		(Transformation::Replace { rules, .. }, _) => {
			let mut current = Canonical::same(node.clone());
			for (position, child) in node.children.iter().enumerate() {
				if rules.get(position).cloned().flatten().is_none() {
					continue;
				}
				if let Some(proof) = canonicalize(child, info)?.proof {
					current = current.then_at(&[position], proof, info)?;
				}
			}
			Ok(current)
		},
		(Transformation::Associative { op, assoc, comm }, grouped) => {
			let mut current = match grouped {
				Some(grouped) => grouped,
				None => canonicalize_group(Canonical::same(node.clone()), &[], op, assoc.is_some(), info)?,
			};
			if let Some(assoc) = &assoc {
				current = left_chain(current, Vec::new(), op, assoc, info)?;
			}
			if let Some(comm) = &comm {
				current = sort_operands(current, op, assoc.as_ref(), comm, info)?;
			}
			Ok(current)
		},
	}
}

/// Canonicalizes the operands of the group of `op` rooted at `path`. With `flatten`, children
/// that apply `op` again belong to the group.
fn canonicalize_group(
	mut current: Canonical,
	path: &[usize],
	op: StmtId,
	flatten: bool,
	info: &WorksheetInfo,
) -> Result<Canonical, TransformError> {
	for position in 0..2 {
		let child_path: Vec<usize> = path.iter().cloned().chain(std::iter::once(position)).collect();
		let child = current.tree.get(&child_path)
			.cloned()
			.ok_or_else(|| TransformError::Malformed(info.render(&current.tree)))?;
		if flatten && info.library.node_op(&child) == Some(op) {
			current = canonicalize_group(current, &child_path, op, flatten, info)?;
		} else if let Some(proof) = canonicalize(&child, info)?.proof {
			current = current.then_at(&child_path, proof, info)?;
		}
	}
	Ok(current)
}

/// Operands of the group of `op` at `node`, left to right.
fn group_operands<'t>(info: &WorksheetInfo, op: StmtId, flatten: bool, node: &'t ParseNode) -> Vec<&'t ParseNode> {
	fn walk<'t>(info: &WorksheetInfo, op: StmtId, node: &'t ParseNode, out: &mut Vec<&'t ParseNode>) {
		match binary_op(info.library, node) {
			Some((node_op, left, right)) if node_op == op => {
				walk(info, op, left, out);
				walk(info, op, right, out);
			},
			_ => out.push(node),
		}
	}

	if flatten {
		let mut result = Vec::new();
		walk(info, op, node, &mut result);
		result
	} else {
		node.children.iter().collect()
	}
}

/// `F(F(x, y), z) = F(x, F(y, z))` for the node `F(F(x, y), z)`.
fn regroup_right(node: &ParseNode, rule: &AssocRule, info: &WorksheetInfo) -> Result<EqProof, TransformError> {
	let malformed = || TransformError::Malformed(info.render(node));
	let (op, xy, z) = binary_op(info.library, node).ok_or_else(malformed)?;
	let (_, x, y) = binary_op(info.library, xy).ok_or_else(malformed)?;
	let regrouped = make_binary(op, x.clone(), make_binary(op, y.clone(), z.clone()));
	Ok(orient(rule, node.clone(), regrouped, true))
}

/// `F(x, F(y, z)) = F(F(x, y), z)` for the node `F(x, F(y, z))`.
fn regroup_left(node: &ParseNode, rule: &AssocRule, info: &WorksheetInfo) -> Result<EqProof, TransformError> {
	let malformed = || TransformError::Malformed(info.render(node));
	let (op, x, yz) = binary_op(info.library, node).ok_or_else(malformed)?;
	let (_, y, z) = binary_op(info.library, yz).ok_or_else(malformed)?;
	let regrouped = make_binary(op, make_binary(op, x.clone(), y.clone()), z.clone());
	Ok(orient(rule, node.clone(), regrouped, false))
}

/// Instance of the associativity rule from `lhs` to `rhs`; `to_right` tells the direction.
fn orient(rule: &AssocRule, lhs: ParseNode, rhs: ParseNode, to_right: bool) -> EqProof {
	if rule.left_grouped == to_right {
		EqProof::Axiom { assrt: rule.assrt, lhs, rhs, self_inverse: false }
	} else {
		EqProof::Sym(Box::new(EqProof::Axiom { assrt: rule.assrt, lhs: rhs, rhs: lhs, self_inverse: false }))
	}
}

/// Turns the group at `path` into `F(F(F(a, b), c), d)` shape.
fn left_chain(mut current: Canonical, path: Vec<usize>, op: StmtId, rule: &AssocRule, info: &WorksheetInfo) -> Result<Canonical, TransformError> {
	loop {
		let node = current.tree.get(&path)
			.cloned()
			.ok_or_else(|| TransformError::Malformed(info.render(&current.tree)))?;
		let right_grouped = match binary_op(info.library, &node) {
			Some((node_op, _, right)) => node_op == op && info.library.node_op(right) == Some(op),
			None => false,
		};
		if !right_grouped {
			break;
		}
		let step = regroup_left(&node, rule, info)?;
		current = current.then_at(&path, step, info)?;
	}

	let mut left = path;
	left.push(0);
	match current.tree.get(&left).map(|node| info.library.node_op(node)) {
		Some(Some(left_op)) if left_op == op => left_chain(current, left, op, rule, info),
		_ => Ok(current),
	}
}

/// Operands of a left-leaning chain, left to right.
fn chain_operands(info: &WorksheetInfo, op: StmtId, flatten: bool, tree: &ParseNode) -> Vec<ParseNode> {
	if !flatten {
		return tree.children.clone();
	}
	let mut result = Vec::new();
	let mut node = tree;
	while let Some((node_op, left, right)) = binary_op(info.library, node) {
		if node_op != op {
			break;
		}
		result.push(right.clone());
		node = left;
	}
	result.push(node.clone());
	result.reverse();
	result
}

/// Bubble sort of the operands of a left-leaning chain. Adjacent operands are swapped by the
/// commutativity rule, regrouping around it when the pair is not at the bottom of the chain.
fn sort_operands(
	mut current: Canonical,
	op: StmtId,
	assoc: Option<&AssocRule>,
	comm: &CommRule,
	info: &WorksheetInfo,
) -> Result<Canonical, TransformError> {
	let mut operands = chain_operands(info, op, assoc.is_some(), &current.tree);
	let count = operands.len();
	if count < 2 {
		return Ok(current);
	}

	for pass in 0..count {
		let mut swapped = false;
		for index in 0..count - 1 - pass {
			if compare_nodes(info.library, &operands[index], &operands[index + 1]) != Ordering::Greater {
				continue;
			}
			// the node whose right operand is `operands[index + 1]`
			let path = vec![0; count - 2 - index];
			current = match (index, assoc) {
				(0, _) => swap_at(current, &path, comm, info)?,
				(_, Some(assoc)) => {
					let node = current.tree.get(&path).cloned().ok_or_else(|| TransformError::Malformed(info.render(&current.tree)))?;
					let current = current.then_at(&path, regroup_right(&node, assoc, info)?, info)?;
					let mut inner = path.clone();
					inner.push(1);
					let current = swap_at(current, &inner, comm, info)?;
					let node = current.tree.get(&path).cloned().ok_or_else(|| TransformError::Malformed(info.render(&current.tree)))?;
					current.then_at(&path, regroup_left(&node, assoc, info)?, info)?
				},
				(_, None) => return Err(TransformError::Malformed(info.render(&current.tree))),
			};
			operands.swap(index, index + 1);
			swapped = true;
		}
		if !swapped {
			break;
		}
	}
	Ok(current)
}

/// Swaps the operands of the node at `path` by the commutativity rule.
fn swap_at(current: Canonical, path: &[usize], comm: &CommRule, info: &WorksheetInfo) -> Result<Canonical, TransformError> {
	let node = current.tree.get(path).ok_or_else(|| TransformError::Malformed(info.render(&current.tree)))?;
	let (op, left, right) = binary_op(info.library, node).ok_or_else(|| TransformError::Malformed(info.render(node)))?;
	let step = EqProof::Axiom {
		assrt: comm.assrt,
		lhs: node.clone(),
		rhs: make_binary(op, right.clone(), left.clone()),
		self_inverse: true,
	};
	current.then_at(path, step, info)
}

/// Proof of `R(source, target)` for two trees with the same canonical form.
pub fn transform_to_target(source: Canonical, target: Canonical) -> EqProof {
	let Canonical { tree, proof } = source;
	EqProof::trans(proof, target.proof.map(EqProof::reverse)).unwrap_or(EqProof::Refl(tree))
}
