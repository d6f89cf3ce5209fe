use crate::binding::{apply_bindings, find_bindings, BindingStorage};
use crate::lang::{Library, StmtId, SymbolId};
use crate::step::ProofStepStmt;
use crate::tree::ParseNode;
use crate::transforms::equivalence::EqOp;
use crate::transforms::proof::EqProof;
use crate::transforms::{binary_op, make_binary, RuleIndex, TransformError};
use crate::verify::VerifyProofs;
use crate::worksheet::{ProofWorkStmt, ProofWorksheet};

/// State of one search: the worksheet, the step being justified and the steps made so far.
pub struct WorksheetInfo<'a> {
	pub worksheet: &'a ProofWorksheet,
	pub deriv_index: usize,
	pub library: &'a Library,
	pub rules: &'a RuleIndex,
	pub verifier: VerifyProofs<'a>,
	pub provable_type: SymbolId,
	new_steps: Vec<ProofStepStmt>,
	next_label: u32,
}

impl<'a> WorksheetInfo<'a> {
	pub fn new(worksheet: &'a ProofWorksheet, deriv_index: usize, library: &'a Library, rules: &'a RuleIndex) -> Self {
		WorksheetInfo {
			worksheet,
			deriv_index,
			library,
			rules,
			verifier: VerifyProofs::new(library, &worksheet.work_vars),
			provable_type: library.provable_type(),
			new_steps: Vec::new(),
			next_label: worksheet.next_step_number(),
		}
	}

	pub fn into_new_steps(self) -> Vec<ProofStepStmt> {
		self.new_steps
	}

	pub fn render(&self, tree: &ParseNode) -> String {
		self.verifier.render(tree).unwrap_or_else(|| format!("{:?}", tree.to_rpn()))
	}

	fn type_name(&self, typ: SymbolId) -> String {
		self.library.symbol(typ).name.clone()
	}

	pub fn eq_op(&self, node: &ParseNode) -> Result<&'a EqOp, TransformError> {
		let typ = self.library.node_type(node, &self.worksheet.work_vars);
		self.rules.equivalence.eq_op(typ).ok_or_else(|| TransformError::NoEquivalence(self.type_name(typ)))
	}

	/// `R(lhs, rhs)` for the equivalence of their type.
	pub fn equality(&self, lhs: ParseNode, rhs: ParseNode) -> Result<ParseNode, TransformError> {
		Ok(make_binary(self.eq_op(&lhs)?.op, lhs, rhs))
	}

	/// A step stating `tree` that the new steps may use: a hypothesis, an earlier step or a step
	/// made by this search.
	fn known_step(&self, tree: &ParseNode) -> Option<String> {
		self.worksheet.stmts.iter()
			.enumerate()
			.filter_map(|(index, stmt)| match stmt {
				ProofWorkStmt::Step(step) if step.is_hypothesis() || index < self.deriv_index => Some(step),
				_ => None,
			})
			.chain(self.new_steps.iter())
			.find(|step| step.parse_tree.as_ref() == Some(tree))
			.map(|step| step.step.clone())
	}

	/// Whether `P(t, K)` is stated by a step of the worksheet or follows from closure rules.
	///
	/// Canonical forms rely on this, so it looks at every step whatever step is being justified.
	/// Proving the fact for a particular step is left to `prove_closure`, which may still fail.
	pub fn closure_provable(&self, tree: &ParseNode) -> bool {
		if self.worksheet.steps().any(|step| step.parse_tree.as_ref() == Some(tree)) {
			return true;
		}
		let (predicate, term, class) = match binary_op(self.library, tree) {
			Some(parts) => parts,
			None => return false,
		};
		let op = match self.library.node_op(term) {
			Some(op) => op,
			None => return false,
		};

		self.rules.closure.rules(op).iter()
			.filter(|rule| rule.predicate == predicate && rule.class == *class)
			.any(|rule| {
				let (concl, hyps) = match self.library.assertion_trees(rule.assrt) {
					Some(trees) => trees,
					None => return false,
				};
				let mut storage = BindingStorage::default();
				find_bindings(tree, concl, &mut storage, self.library).is_some()
					&& hyps.iter().all(|hyp| {
						apply_bindings(hyp, &storage, self.library)
							.map_or(false, |hyp| self.closure_provable(&hyp))
					})
			})
	}

	fn prove_closure(&mut self, tree: &ParseNode) -> Result<String, TransformError> {
		if let Some(label) = self.known_step(tree) {
			return Ok(label);
		}
		let candidates: Vec<StmtId> = binary_op(self.library, tree)
			.and_then(|(predicate, term, class)| {
				let op = self.library.node_op(term)?;
				Some(self.rules.closure.rules(op).iter()
					.filter(|rule| rule.predicate == predicate && rule.class == *class)
					.map(|rule| rule.assrt)
					.collect())
			})
			.unwrap_or_default();

		let (steps, next_label) = (self.new_steps.len(), self.next_label);
		for assrt in candidates {
			match self.add_step(tree.clone(), assrt, &[]) {
				Ok(label) => return Ok(label),
				Err(_) => {
					self.new_steps.truncate(steps);
					self.next_label = next_label;
				},
			}
		}
		Err(TransformError::UndischargedHypothesis(self.render(tree)))
	}

	/// Adds a step stating `tree` by the assertion `assrt`. Logical hypotheses are taken from
	/// `provided` where possible and proved by closure rules otherwise. A step already stating
	/// `tree` is reused.
	pub fn add_step(&mut self, tree: ParseNode, assrt: StmtId, provided: &[(String, ParseNode)]) -> Result<String, TransformError> {
		if let Some(label) = self.known_step(&tree) {
			return Ok(label);
		}

		let library = self.library;
		let mismatch_error = TransformError::RuleMismatch {
			label: library.stmt(assrt).label.clone(),
			formula: self.render(&tree),
		};
		let mismatch = || mismatch_error.clone();
		let (concl, hyps) = library.assertion_trees(assrt).ok_or_else(mismatch)?;
		let mut storage = BindingStorage::default();
		find_bindings(&tree, concl, &mut storage, library).ok_or_else(mismatch)?;

		let mut labels = Vec::with_capacity(hyps.len());
		let mut required = Vec::new();
		for hyp in hyps {
			let matched = provided.iter().find_map(|(label, proved)| {
				let mut attempt = storage.clone();
				find_bindings(proved, hyp, &mut attempt, library).map(|_| (label.clone(), attempt))
			});
			match matched {
				Some((label, attempt)) => {
					storage = attempt;
					labels.push(Some(label));
				},
				None => {
					required.push((labels.len(), hyp));
					labels.push(None);
				},
			}
		}
		for (index, hyp) in required {
			let hyp = apply_bindings(hyp, &storage, library).ok_or_else(mismatch)?;
			labels[index] = Some(self.prove_closure(&hyp)?);
		}

		let labels = labels.into_iter().collect::<Option<Vec<_>>>().ok_or_else(mismatch)?;
		self.push_step(tree, assrt, labels)
	}

	fn push_step(&mut self, tree: ParseNode, assrt: StmtId, hyps: Vec<String>) -> Result<String, TransformError> {
		let formula = self.verifier.formula(&tree)
			.ok_or_else(|| TransformError::Malformed(format!("{:?}", tree.to_rpn())))?;
		let text = formula.render(self.library, &self.worksheet.work_vars);
		let label = self.fresh_label();
		self.new_steps.push(ProofStepStmt::generated(
			label.clone(),
			hyps,
			assrt,
			self.library.stmt(assrt).label.clone(),
			formula,
			tree,
			&text,
		));
		Ok(label)
	}

	fn fresh_label(&mut self) -> String {
		loop {
			let label = self.next_label.to_string();
			self.next_label += 1;
			if self.worksheet.step_index(&label).is_none() && self.new_steps.iter().all(|step| step.step != label) {
				return label;
			}
		}
	}

	/// Adds the steps of `proof`. Returns the label of the step stating the whole equality.
	pub fn emit(&mut self, proof: &EqProof) -> Result<(String, ParseNode), TransformError> {
		let stated = self.equality(proof.lhs().clone(), proof.rhs().clone())?;
		let label = match proof {
			EqProof::Axiom { assrt, .. } => self.add_step(stated.clone(), *assrt, &[])?,
			EqProof::Refl(node) => {
				let refl = self.eq_op(node)?.refl.ok_or_else(|| {
					TransformError::NoReflexivity(self.type_name(self.library.node_type(node, &self.worksheet.work_vars)))
				})?;
				self.add_step(stated.clone(), refl, &[])?
			},
			EqProof::Sym(inner) => {
				let hyp = self.emit(inner)?;
				let sym = self.eq_op(proof.lhs())?.sym;
				self.add_step(stated.clone(), sym, &[hyp])?
			},
			EqProof::Trans(first, second) => {
				let first = self.emit(first)?;
				let second = self.emit(second)?;
				let trans = self.eq_op(proof.lhs())?.trans;
				self.add_step(stated.clone(), trans, &[first, second])?
			},
			EqProof::Congr { assrt, inner, .. } => {
				let hyp = self.emit(inner)?;
				self.add_step(stated.clone(), *assrt, &[hyp])?
			},
		};
		Ok((label, stated))
	}
}
