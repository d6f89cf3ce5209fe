use crate::lang::StmtId;
use crate::tree::ParseNode;

/// Proof of `R(lhs, rhs)` for the equivalence `R` of the type of both sides.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EqProof {
	/// Instance of an associativity or commutativity rule.
	Axiom {
		assrt: StmtId,
		lhs: ParseNode,
		rhs: ParseNode,
		/// Swapping the sides gives another instance of the same rule.
		self_inverse: bool,
	},
	Sym(Box<EqProof>),
	Trans(Box<EqProof>, Box<EqProof>),
	/// A child replaced by an equal one, through a replacement rule.
	Congr {
		assrt: StmtId,
		lhs: ParseNode,
		rhs: ParseNode,
		inner: Box<EqProof>,
	},
	Refl(ParseNode),
}

impl EqProof {
	pub fn lhs(&self) -> &ParseNode {
		match self {
			EqProof::Axiom { lhs, .. } | EqProof::Congr { lhs, .. } => lhs,
			EqProof::Sym(proof) => proof.rhs(),
			EqProof::Trans(first, _) => first.lhs(),
			EqProof::Refl(node) => node,
		}
	}

	pub fn rhs(&self) -> &ParseNode {
		match self {
			EqProof::Axiom { rhs, .. } | EqProof::Congr { rhs, .. } => rhs,
			EqProof::Sym(proof) => proof.lhs(),
			EqProof::Trans(_, second) => second.rhs(),
			EqProof::Refl(node) => node,
		}
	}

	/// Proof of `R(rhs, lhs)`. Symmetry ends up applied to rule instances only.
	pub fn reverse(self) -> EqProof {
		match self {
			EqProof::Axiom { assrt, lhs, rhs, self_inverse: true } => EqProof::Axiom {
				assrt,
				lhs: rhs,
				rhs: lhs,
				self_inverse: true,
			},
			axiom @ EqProof::Axiom { .. } => EqProof::Sym(Box::new(axiom)),
			EqProof::Sym(proof) => *proof,
			EqProof::Trans(first, second) => EqProof::Trans(Box::new(second.reverse()), Box::new(first.reverse())),
			EqProof::Congr { assrt, lhs, rhs, inner } => EqProof::Congr {
				assrt,
				lhs: rhs,
				rhs: lhs,
				inner: Box::new(inner.reverse()),
			},
			EqProof::Refl(node) => EqProof::Refl(node),
		}
	}

	/// Chains two optional proofs; a missing proof stands for no rewrite.
	pub fn trans(first: Option<EqProof>, second: Option<EqProof>) -> Option<EqProof> {
		match (first, second) {
			(Some(first), Some(second)) => Some(EqProof::Trans(Box::new(first), Box::new(second))),
			(first, None) => first,
			(None, second) => second,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tree::NodeRef;

	fn leaf(id: u32) -> ParseNode {
		ParseNode::leaf(NodeRef::Stmt(StmtId(id)))
	}

	#[test]
	fn reverse() {
		let comm = EqProof::Axiom { assrt: StmtId(10), lhs: leaf(1), rhs: leaf(2), self_inverse: true };
		let assoc = EqProof::Axiom { assrt: StmtId(11), lhs: leaf(2), rhs: leaf(3), self_inverse: false };
		let proof = EqProof::trans(Some(comm.clone()), Some(assoc.clone())).unwrap();
		assert_eq!(proof.lhs(), &leaf(1));
		assert_eq!(proof.rhs(), &leaf(3));

		let reversed = proof.clone().reverse();
		assert_eq!(reversed.lhs(), &leaf(3));
		assert_eq!(reversed.rhs(), &leaf(1));
		assert_eq!(reversed, EqProof::Trans(
			Box::new(EqProof::Sym(Box::new(assoc))),
			Box::new(EqProof::Axiom { assrt: StmtId(10), lhs: leaf(2), rhs: leaf(1), self_inverse: true }),
		));
		assert_eq!(reversed.reverse(), proof);
	}

	#[test]
	fn trans_of_nothing() {
		assert_eq!(EqProof::trans(None, None), None);
		let refl = EqProof::Refl(leaf(1));
		assert_eq!(EqProof::trans(None, Some(refl.clone())), Some(refl.clone()));
		assert_eq!(EqProof::trans(Some(refl.clone()), None), Some(refl));
	}
}
