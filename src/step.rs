//! Proof steps of a worksheet: their text, formula and work variables.

use std::cell::OnceCell;
use std::collections::HashMap;
use thiserror::Error;

use crate::grammar::{Grammar, HypContext};
use crate::lang::*;
use crate::stmt_text::{ref_field_column, relocate_prefix, substitute_tokens};
use crate::tree::ParseNode;
use crate::utils::span::*;
use crate::utils::tokenizer::{ProofTextTokenizer, Token};
use crate::verify::VerifyProofs;
use crate::work_var::{WorkVarId, WorkVarManager};
use crate::worksheet::Session;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StructuralError {
	#[error("formula should start with `{expected}`, found `{found}`")]
	BadTypeCode { expected: String, found: String },
	#[error("formula is missing")]
	MissingFormula,
	#[error("symbol `{0}` is not declared")]
	SymbolNotFound(String),
	#[error("variable `{0}` has no type in this scope")]
	VariableOutOfScope(String),
	#[error("`{0}` is declared after the theorem")]
	ForwardReference(String),
	#[error("work variable `{0}` is not allowed here")]
	WorkVarNotAllowed(String),
	#[error("formula cannot be parsed")]
	ParseFailed,
	#[error("malformed step field `{0}`")]
	InvalidPrefix(String),
	#[error("step `{0}` is defined twice")]
	DuplicateStep(String),
	#[error("hypothesis `{0}` does not refer to a step")]
	UnknownHypStep(String),
	#[error("step `{0}` depends on itself")]
	HypCycle(String),
	#[error("malformed header")]
	InvalidHeader,
}

impl ErrorCode for StructuralError {
	fn code(&self) -> &'static str {
		use StructuralError::*;

		match self {
			BadTypeCode { .. } => "E-PA-0101",
			MissingFormula => "E-PA-0102",
			SymbolNotFound(_) => "E-PA-0103",
			VariableOutOfScope(_) => "E-PA-0104",
			ForwardReference(_) => "E-PA-0105",
			WorkVarNotAllowed(_) => "E-PA-0106",
			ParseFailed => "E-PA-0107",
			InvalidPrefix(_) => "E-PA-0108",
			DuplicateStep(_) => "E-PA-0109",
			UnknownHypStep(_) => "E-PA-0110",
			HypCycle(_) => "E-PA-0111",
			InvalidHeader => "E-PA-0112",
		}
	}
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StepKind {
	Hypothesis,
	Derivation {
		/// `None` stands for `?`, a hypothesis still to be found.
		hyps: Vec<Option<String>>,
		/// Waiting for a justification to be found automatically.
		auto_step: bool,
	},
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum CanonicalForm {
	/// The parse tree is already canonical.
	Same,
	Different(ParseNode),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldId {
	Step,
	Hyp,
	Ref,
	Formula,
}

/// What loading a formula needs besides the tokens.
pub struct LoadContext<'a> {
	pub library: &'a Library,
	pub work_vars: &'a mut WorkVarManager,
	pub session: &'a mut Session,
	/// Symbols from this sequence number on are not visible.
	pub max_seq: u32,
}

#[derive(Clone, Debug)]
pub struct ProofStepStmt {
	pub step: String,
	pub kind: StepKind,
	pub reference: Option<StmtId>,
	/// Kept even when it names no statement of the library yet.
	pub ref_label: Option<String>,
	pub formula: Option<Formula>,
	pub parse_tree: Option<ParseNode>,
	/// Work variables of the formula in order of appearance, `None` when there are none.
	pub work_vars: Option<Vec<WorkVarId>>,
	pub formula_incomplete: bool,
	/// Distance from the `qed` step; 0 for `qed` and for steps it does not use.
	pub proof_level: usize,
	pub stmt_text: String,
	/// Location of the step field in the worksheet text.
	pub prefix_span: Option<GlobalSpan>,
	pub formula_span: Option<GlobalSpan>,
	canonical: OnceCell<CanonicalForm>,
}

impl ProofStepStmt {
	pub fn new(step: String, kind: StepKind, ref_label: Option<String>, stmt_text: String) -> Self {
		ProofStepStmt {
			step,
			kind,
			reference: None,
			ref_label,
			formula: None,
			parse_tree: None,
			work_vars: None,
			formula_incomplete: true,
			proof_level: 0,
			stmt_text,
			prefix_span: None,
			formula_span: None,
			canonical: OnceCell::new(),
		}
	}

	/// A derivation step built by the transformation search.
	pub fn generated(
		step: String,
		hyps: Vec<String>,
		reference: StmtId,
		ref_label: String,
		formula: Formula,
		tree: ParseNode,
		formula_text: &str,
	) -> Self {
		let stmt_text = format!("{}:{}:{} {}", step, hyps.join(","), ref_label, formula_text);
		ProofStepStmt {
			reference: Some(reference),
			formula: Some(formula),
			parse_tree: Some(tree),
			formula_incomplete: false,
			..ProofStepStmt::new(
				step,
				StepKind::Derivation {
					hyps: hyps.into_iter().map(Some).collect(),
					auto_step: false,
				},
				Some(ref_label),
				stmt_text,
			)
		}
	}

	pub fn is_hypothesis(&self) -> bool {
		self.kind == StepKind::Hypothesis
	}

	pub fn hyps(&self) -> &[Option<String>] {
		match &self.kind {
			StepKind::Hypothesis => &[],
			StepKind::Derivation { hyps, .. } => hyps,
		}
	}

	/// Reads the formula tokens that follow the step field. Returns the token starting the next
	/// statement, if any.
	pub fn load_statement_text<'t>(
		&mut self,
		tokens: &mut ProofTextTokenizer<'t>,
		ctx: &mut LoadContext,
		work_vars_ok: bool,
	) -> Result<Option<Token<'t>>, Spanned<StructuralError>> {
		let library = ctx.library;
		let type_token = match tokens.next() {
			Some(token) if !token.starts_statement() => token,
			next => {
				if self.is_hypothesis() {
					let end = tokens.offset();
					return Err(Spanned::new(StructuralError::MissingFormula, GlobalSpan(end..end)));
				}
				self.formula_incomplete = true;
				return Ok(next);
			},
		};

		let provable = library.provable_type();
		if library.lookup_symbol(type_token.text) != Some(provable) {
			return Err(Spanned::new(
				StructuralError::BadTypeCode {
					expected: library.symbol(provable).name.clone(),
					found: type_token.text.to_string(),
				},
				type_token.span(),
			));
		}

		let mut expr = Vec::new();
		let mut work_vars: Vec<WorkVarId> = Vec::new();
		let mut end = type_token.end();
		let next = loop {
			let token = match tokens.next() {
				Some(token) if !token.starts_statement() => token,
				next => break next,
			};
			let sym = resolve_token(&token, ctx, work_vars_ok)?;
			if let Sym::Work(id) = sym {
				if !work_vars.contains(&id) {
					work_vars.push(id);
				}
			}
			expr.push(sym);
			end = token.end();
		};

		if !work_vars.is_empty() {
			ctx.session.has_work_vars = true;
		}
		self.formula = Some(Formula::new(provable, expr));
		self.formula_span = Some(GlobalSpan(type_token.start..end));
		self.work_vars = if work_vars.is_empty() { None } else { Some(work_vars) };
		self.formula_incomplete = false;
		Ok(next)
	}

	/// Builds the parse tree of the loaded formula.
	pub fn parse_formula(&mut self, grammar: &dyn Grammar, context: &HypContext, max_seq: u32) -> Result<(), Spanned<StructuralError>> {
		let formula = match &self.formula {
			Some(formula) => formula,
			None => return Ok(()),
		};
		match grammar.parse_formula(formula, context, max_seq) {
			Some(tree) => {
				self.parse_tree = Some(tree);
				Ok(())
			},
			None => {
				self.formula_incomplete = true;
				let span = self.formula_span.clone().unwrap_or(GlobalSpan(0..0));
				Err(Spanned::new(StructuralError::ParseFailed, span))
			},
		}
	}

	/// Writes the values found for work variables into the statement text.
	///
	/// Returns `false` when there is no text or no work variable, and leaves the text untouched.
	pub fn update_stmt_text_with_work_var_updates(&mut self, verifier: &VerifyProofs) -> bool {
		if self.stmt_text.is_empty() {
			return false;
		}
		let vars = match &self.work_vars {
			Some(vars) => vars,
			None => return false,
		};

		let mut substitutions = Vec::new();
		for id in vars {
			let var = verifier.work_vars().var(*id);
			if let Some(subst) = &var.subst {
				match verifier.render_expr(subst) {
					Some(text) => substitutions.push((var.name.clone(), text)),
					None => return false,
				}
			}
		}
		if substitutions.is_empty() {
			return true;
		}

		match substitute_tokens(&self.stmt_text, &substitutions) {
			Some(text) => {
				self.stmt_text = text;
				true
			},
			None => false,
		}
	}

	/// Rebuilds the work variable list from the formula. A formula without work variables is
	/// complete.
	pub fn update_work_var_list(&mut self) {
		let vars = self.formula.as_ref().map(Formula::work_vars).unwrap_or_default();
		if vars.is_empty() {
			self.work_vars = None;
			self.formula_incomplete = false;
		} else {
			self.work_vars = Some(vars);
		}
	}

	/// Puts the values found for work variables into the text and the formula, then parses the
	/// formula again. Returns `false` when there was nothing to do.
	pub fn apply_work_var_updates(
		&mut self,
		verifier: &VerifyProofs,
		grammar: &dyn Grammar,
		context: &HypContext,
		max_seq: u32,
	) -> Result<bool, Spanned<StructuralError>> {
		let work_vars = verifier.work_vars();
		let resolved = self.work_vars.iter().flatten().any(|id| work_vars.var(*id).subst.is_some());
		if !resolved || self.formula.is_none() || !self.update_stmt_text_with_work_var_updates(verifier) {
			return Ok(false);
		}

		let formula = self.formula.as_ref().map(|formula| {
			formula.substitute(|id| Some(verifier.formula(work_vars.var(id).subst.as_ref()?)?.expr().to_vec()))
		});
		self.formula = formula;
		self.update_work_var_list();
		self.parse_tree = None;
		self.canonical = OnceCell::new();
		self.parse_formula(grammar, context, max_seq)?;
		Ok(true)
	}

	pub fn prefix_text(&self) -> String {
		let hyps = self.hyps().iter()
			.map(|hyp| hyp.as_deref().unwrap_or("?"))
			.collect::<Vec<_>>()
			.join(",");
		format!("{}:{}:{}", self.step, hyps, self.ref_label.as_deref().unwrap_or(""))
	}

	/// Rewrites the step field of the text from the current state of the step.
	pub fn reload_prefix_text(&mut self) {
		self.stmt_text = relocate_prefix(&self.stmt_text, &self.prefix_text());
	}

	/// 1-based column of a field in the statement text, used to place the cursor on errors.
	pub fn compute_field_column(&self, field: FieldId) -> usize {
		match field {
			FieldId::Ref => ref_field_column(&self.stmt_text),
			FieldId::Step | FieldId::Hyp | FieldId::Formula => 1,
		}
	}

	/// Justifies the step by `reference` applied to `hyps`.
	pub fn set_justification(&mut self, reference: StmtId, ref_label: String, new_hyps: Vec<String>) {
		self.reference = Some(reference);
		self.ref_label = Some(ref_label);
		if let StepKind::Derivation { hyps, auto_step } = &mut self.kind {
			*hyps = new_hyps.into_iter().map(Some).collect();
			*auto_step = false;
		}
	}

	/// Applies a map of old step labels to new ones.
	pub fn renumber(&mut self, map: &HashMap<String, String>) {
		if let Some(step) = map.get(&self.step) {
			self.step = step.clone();
		}
		if let StepKind::Derivation { hyps, .. } = &mut self.kind {
			for hyp in hyps.iter_mut().flatten() {
				if let Some(new) = map.get(hyp) {
					*hyp = new.clone();
				}
			}
		}
	}

	/// The first level computed for a step is kept.
	pub fn load_proof_level(&mut self, level: usize) {
		if self.proof_level == 0 {
			self.proof_level = level;
		}
	}

	/// The canonical tree, if it was computed in this pass.
	pub fn canonical_tree(&self) -> Option<&ParseNode> {
		match self.canonical.get()? {
			CanonicalForm::Same => self.parse_tree.as_ref(),
			CanonicalForm::Different(tree) => Some(tree),
		}
	}

	/// Stores the canonical tree. Only the first call of a pass has an effect.
	pub fn set_canonical_tree(&self, tree: ParseNode) {
		let form = if self.parse_tree.as_ref() == Some(&tree) {
			CanonicalForm::Same
		} else {
			CanonicalForm::Different(tree)
		};
		let _ = self.canonical.set(form);
	}

	pub fn reset_canonical_form(&mut self) {
		self.canonical = OnceCell::new();
	}
}

fn resolve_token(token: &Token, ctx: &mut LoadContext, work_vars_ok: bool) -> Result<Sym, Spanned<StructuralError>> {
	let error = |inner| Err(Spanned::new(inner, token.span()));

	if let Some(id) = ctx.work_vars.get(token.text) {
		return if work_vars_ok {
			Ok(Sym::Work(id))
		} else {
			error(StructuralError::WorkVarNotAllowed(token.text.to_string()))
		};
	}

	if let Some(id) = ctx.library.lookup_symbol(token.text) {
		let symbol = ctx.library.symbol(id);
		if symbol.seq >= ctx.max_seq {
			return error(StructuralError::ForwardReference(token.text.to_string()));
		}
		return match symbol.kind {
			SymbolKind::Constant => Ok(Sym::Lib(id)),
			SymbolKind::Variable => match ctx.library.var_hyp(id) {
				Some(hyp) if ctx.library.stmt(hyp).seq < ctx.max_seq => Ok(Sym::Lib(id)),
				_ => error(StructuralError::VariableOutOfScope(token.text.to_string())),
			},
		};
	}

	if ctx.work_vars.is_work_var_name(token.text) {
		if !work_vars_ok {
			return error(StructuralError::WorkVarNotAllowed(token.text.to_string()));
		}
		if let Some(id) = ctx.work_vars.alloc(token.text) {
			return Ok(Sym::Work(id));
		}
	}

	error(StructuralError::SymbolNotFound(token.text.to_string()))
}
