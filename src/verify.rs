use crate::lang::*;
use crate::tree::{NodeRef, ParseNode};
use crate::work_var::WorkVarManager;

/// Converts parse trees back into formulas.
#[derive(Clone, Copy)]
pub struct VerifyProofs<'a> {
	library: &'a Library,
	work_vars: &'a WorkVarManager,
}

impl<'a> VerifyProofs<'a> {
	pub fn new(library: &'a Library, work_vars: &'a WorkVarManager) -> Self {
		VerifyProofs { library, work_vars }
	}

	pub fn work_vars(&self) -> &'a WorkVarManager {
		self.work_vars
	}

	/// Evaluates a tree given in reverse Polish order into a provable formula. Returns `None` when
	/// the sequence does not describe exactly one tree.
	pub fn convert_rpn_to_formula(&self, rpn: &[NodeRef]) -> Option<Formula> {
		let mut stack: Vec<Vec<Sym>> = Vec::new();
		for node in rpn {
			match *node {
				NodeRef::WorkVar(id) => stack.push(vec![Sym::Work(id)]),
				NodeRef::Stmt(id) => {
					let stmt = self.library.stmt(id);
					match &stmt.kind {
						StmtKind::VarHyp { var } => stack.push(vec![Sym::Lib(*var)]),
						StmtKind::Assertion(frame) => {
							let arity = frame.var_hyps.len();
							if stack.len() < arity {
								return None;
							}
							let args = stack.split_off(stack.len() - arity);
							let mut expr = Vec::new();
							for sym in &stmt.expr {
								match self.library.symbol(*sym).kind {
									SymbolKind::Constant => expr.push(Sym::Lib(*sym)),
									SymbolKind::Variable => {
										let slot = self.library.var_slot(frame, *sym)?;
										expr.extend(args[slot].iter().cloned());
									},
								}
							}
							stack.push(expr);
						},
						StmtKind::LogHyp => return None,
					}
				},
			}
		}

		let expr = stack.pop()?;
		if stack.is_empty() {
			Some(Formula::new(self.library.provable_type(), expr))
		} else {
			None
		}
	}

	pub fn formula(&self, tree: &ParseNode) -> Option<Formula> {
		self.convert_rpn_to_formula(&tree.to_rpn())
	}

	/// The whole formula as text, starting with the provable type code.
	pub fn render(&self, tree: &ParseNode) -> Option<String> {
		Some(self.formula(tree)?.render(self.library, self.work_vars))
	}

	/// Just the expression as text, used where a subtree replaces a work variable.
	pub fn render_expr(&self, tree: &ParseNode) -> Option<String> {
		Some(self.formula(tree)?.render_expr(self.library, self.work_vars))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Config;
	use crate::database::load_library;

	#[test]
	fn rpn() {
		let library = load_library(
			"$c ( ) + = class wff |- $. $v A B $. cA $f class A $. cB $f class B $.
			cplus $a class ( A + B ) $. wceq $a wff A = B $.",
			&Config::default(),
		).unwrap();
		let work_vars = WorkVarManager::default();
		let verifier = VerifyProofs::new(&library, &work_vars);
		let id = |label: &str| NodeRef::Stmt(library.lookup_stmt(label).unwrap());

		let rpn = vec![id("cB"), id("cA"), id("cplus"), id("cA"), id("wceq")];
		let formula = verifier.convert_rpn_to_formula(&rpn).unwrap();
		assert_eq!(formula.render(&library, &work_vars), "|- ( B + A ) = A");

		assert!(verifier.convert_rpn_to_formula(&[id("cA"), id("wceq")]).is_none());
		assert!(verifier.convert_rpn_to_formula(&[id("cA"), id("cB")]).is_none());
		assert!(verifier.convert_rpn_to_formula(&[]).is_none());
	}
}
