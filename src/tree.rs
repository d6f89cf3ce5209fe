//! Typed parse trees of formulas.

use std::cmp::Ordering;

use crate::lang::{Library, StmtId};
use crate::work_var::WorkVarId;

/// What a parse node instantiates.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum NodeRef {
	/// A syntax axiom, or a variable hypothesis for variable leaves.
	Stmt(StmtId),
	WorkVar(WorkVarId),
}

/// Node of a parse tree. Children follow the order of the mandatory variable hypotheses of the
/// syntax axiom; leaves have no children.
///
/// Equality is structural: two trees are equal when they are deep duplicates of each other.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ParseNode {
	pub stmt: NodeRef,
	pub children: Vec<ParseNode>,
}

impl ParseNode {
	pub fn new(stmt: NodeRef, children: Vec<ParseNode>) -> Self {
		ParseNode { stmt, children }
	}

	pub fn leaf(stmt: NodeRef) -> Self {
		ParseNode { stmt, children: Vec::new() }
	}

	pub fn is_deep_dup(&self, other: &ParseNode) -> bool {
		self == other
	}

	/// The operands of a node with exactly two children.
	pub fn binary(&self) -> Option<(&ParseNode, &ParseNode)> {
		match self.children.as_slice() {
			[left, right] => Some((left, right)),
			_ => None,
		}
	}

	/// A copy of this node with the child at `position` replaced.
	pub fn with_child(&self, position: usize, child: ParseNode) -> ParseNode {
		let mut result = self.clone();
		result.children[position] = child;
		result
	}

	/// Subtree at a path of child indexes.
	pub fn get(&self, position: &[usize]) -> Option<&ParseNode> {
		match position {
			[start, tail @ ..] => self.children.get(*start)?.get(tail),
			[] => Some(self),
		}
	}

	/// Node references in reverse Polish order: children first, left to right, then the node.
	pub fn to_rpn(&self) -> Vec<NodeRef> {
		fn walk(node: &ParseNode, out: &mut Vec<NodeRef>) {
			for child in &node.children {
				walk(child, out);
			}
			out.push(node.stmt);
		}

		let mut result = Vec::new();
		walk(self, &mut result);
		result
	}
}

/// Total order on trees: the earlier statement sorts first, equal statements compare their
/// children pairwise and the first difference decides.
pub fn compare_nodes(library: &Library, first: &ParseNode, second: &ParseNode) -> Ordering {
	if first.stmt == second.stmt {
		first.children.iter()
			.zip(second.children.iter())
			.map(|(a, b)| compare_nodes(library, a, b))
			.find(|ordering| *ordering != Ordering::Equal)
			.unwrap_or_else(|| first.children.len().cmp(&second.children.len()))
	} else {
		library.seq_of(first.stmt).cmp(&library.seq_of(second.stmt))
	}
}
