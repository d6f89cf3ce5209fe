//! Proof worksheets: the text the user edits, loaded into a list of statements.

use petgraph::algo::{is_cyclic_directed, kosaraju_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::config::Config;
use crate::grammar::{Grammar, HypContext};
use crate::lang::Library;
use crate::step::*;
use crate::transforms::TransformationManager;
use crate::utils::id::IdGenerator;
use crate::utils::span::*;
use crate::utils::tokenizer::{ProofTextTokenizer, Token};
use crate::verify::VerifyProofs;
use crate::work_var::WorkVarManager;

/// Worksheet-wide flags.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Session {
	pub has_work_vars: bool,
	pub has_auto_steps: bool,
}

#[derive(Clone, Debug)]
pub enum ProofWorkStmt {
	Header(String),
	Comment(String),
	Step(ProofStepStmt),
	Footer(String),
}

impl ProofWorkStmt {
	pub fn text(&self) -> &str {
		match self {
			ProofWorkStmt::Header(text) | ProofWorkStmt::Comment(text) | ProofWorkStmt::Footer(text) => text,
			ProofWorkStmt::Step(step) => &step.stmt_text,
		}
	}
}

peg::parser!(
	grammar prefix() for str {
		pub rule step_hyp_ref() -> (String, Vec<Option<String>>, Option<String>)
			= step:label() ":" hyps:(hyp() ** ",") ":" reference:label()? {
				(step, hyps, reference)
			}

		rule hyp() -> Option<String>
			= "?" { None }
			/ l:label() { Some(l) }

		rule label() -> String
			= s:$((!(":" / "," / "?") [_])+) { s.to_string() }
	}
);

#[derive(Clone, Debug)]
pub struct ProofWorksheet {
	pub theorem_label: Option<String>,
	pub loc_after: Option<String>,
	/// Symbols and statements from this sequence number on cannot be used.
	pub max_seq: u32,
	pub stmts: Vec<ProofWorkStmt>,
	pub session: Session,
	pub work_vars: WorkVarManager,
}

struct Loader<'a, 't> {
	library: &'a Library,
	text: &'t str,
	tokens: ProofTextTokenizer<'t>,
	errors: Vec<Spanned<StructuralError>>,
}

impl<'a, 't> Loader<'a, 't> {
	/// Consumes the rest of the current statement. Returns the next statement token and the end
	/// of the last consumed token.
	fn skip_statement(&mut self, mut end: usize) -> (Option<Token<'t>>, usize) {
		loop {
			match self.tokens.next() {
				Some(token) if !token.starts_statement() => end = token.end(),
				next => return (next, end),
			}
		}
	}
}

impl ProofWorksheet {
	/// An empty worksheet proving a theorem placed after the whole library.
	pub fn new(library: &Library, config: &Config) -> Self {
		ProofWorksheet {
			theorem_label: None,
			loc_after: None,
			max_seq: library.max_seq(),
			stmts: Vec::new(),
			session: Session::default(),
			work_vars: WorkVarManager::new(library, config),
		}
	}

	/// Loads a worksheet. Statements with errors are kept with whatever could be read.
	pub fn load(library: &Library, grammar: &dyn Grammar, config: &Config, text: &str) -> (ProofWorksheet, Vec<Spanned<StructuralError>>) {
		let mut worksheet = ProofWorksheet::new(library, config);
		let mut loader = Loader {
			library,
			text,
			tokens: ProofTextTokenizer::new(text),
			errors: Vec::new(),
		};

		let mut current = loader.tokens.next();
		while let Some(token) = current.take() {
			let start = token.start;
			if !token.starts_statement() {
				loader.errors.push(Spanned::new(StructuralError::InvalidPrefix(token.text.to_string()), token.span()));
				current = loader.skip_statement(token.end()).0;
				continue;
			}

			match token.text {
				"$(" => {
					let (next, end) = worksheet.load_header(&mut loader, token);
					worksheet.stmts.push(ProofWorkStmt::Header(text[start..end].to_string()));
					current = next;
				},
				"$)" => {
					let (next, end) = loader.skip_statement(token.end());
					worksheet.stmts.push(ProofWorkStmt::Footer(text[start..end].to_string()));
					current = next;
				},
				comment if comment.starts_with('*') => {
					let (next, end) = loader.skip_statement(token.end());
					worksheet.stmts.push(ProofWorkStmt::Comment(text[start..end].to_string()));
					current = next;
				},
				_ => current = worksheet.load_step(&mut loader, grammar, token),
			}
		}

		worksheet.validate_hyps(&mut loader.errors);
		(worksheet, loader.errors)
	}

	fn load_header<'t>(&mut self, loader: &mut Loader<'_, 't>, first: Token<'t>) -> (Option<Token<'t>>, usize) {
		let mut end = first.end();
		let mut fields = Vec::new();
		let next = loop {
			match loader.tokens.next() {
				Some(token) if !token.starts_statement() => {
					end = token.end();
					fields.push(token);
				},
				next => break next,
			}
		};

		let mut valid = fields.len() >= 3 && fields[0].text == "<MM>" && fields[1].text == "<PROOF_ASST>";
		for field in fields.iter().skip(2) {
			if let Some(label) = field.text.strip_prefix("THEOREM=") {
				self.theorem_label = Some(label.to_string());
			} else if let Some(label) = field.text.strip_prefix("LOC_AFTER=") {
				self.loc_after = Some(label.to_string());
			} else {
				valid = false;
			}
		}
		if !valid || self.theorem_label.is_none() {
			loader.errors.push(Spanned::new(StructuralError::InvalidHeader, GlobalSpan(first.start..end)));
		}

		let library = loader.library;
		let theorem = self.theorem_label.as_deref().and_then(|label| library.lookup_stmt(label));
		let loc_after = self.loc_after.as_deref().and_then(|label| library.lookup_stmt(label));
		self.max_seq = match (theorem, loc_after) {
			(Some(id), _) => library.stmt(id).seq,
			(None, Some(id)) => library.stmt(id).seq + 1,
			(None, None) => library.max_seq(),
		};
		(next, end)
	}

	fn load_step<'t>(&mut self, loader: &mut Loader<'_, 't>, grammar: &dyn Grammar, first: Token<'t>) -> Option<Token<'t>> {
		let start = first.start;
		let (label, hyps, ref_label) = match prefix::step_hyp_ref(first.text) {
			Ok(parsed) => parsed,
			Err(_) => {
				loader.errors.push(Spanned::new(StructuralError::InvalidPrefix(first.text.to_string()), first.span()));
				return loader.skip_statement(first.end()).0;
			},
		};

		let hypothesis = label.starts_with('h');
		if hypothesis && !hyps.is_empty() {
			loader.errors.push(Spanned::new(StructuralError::InvalidPrefix(first.text.to_string()), first.span()));
		}
		if self.step_index(&label).is_some() {
			loader.errors.push(Spanned::new(StructuralError::DuplicateStep(label.clone()), first.span()));
		}

		let kind = if hypothesis {
			StepKind::Hypothesis
		} else {
			StepKind::Derivation {
				hyps,
				auto_step: ref_label.is_none(),
			}
		};
		if let StepKind::Derivation { auto_step: true, .. } = kind {
			self.session.has_auto_steps = true;
		}
		let mut step = ProofStepStmt::new(label, kind, ref_label, String::new());
		step.prefix_span = Some(first.span());
		step.reference = step.ref_label.as_deref()
			.and_then(|label| loader.library.lookup_stmt(label))
			.filter(|id| loader.library.stmt(*id).seq < self.max_seq);

		let mut ctx = LoadContext {
			library: loader.library,
			work_vars: &mut self.work_vars,
			session: &mut self.session,
			max_seq: self.max_seq,
		};
		let (next, end) = match step.load_statement_text(&mut loader.tokens, &mut ctx, !hypothesis) {
			Ok(next) => {
				let end = step.formula_span.as_ref().map(|span| span.0.end).unwrap_or_else(|| first.end());
				let context = HypContext::worksheet(loader.library, &self.work_vars);
				if let Err(err) = step.parse_formula(grammar, &context, self.max_seq) {
					loader.errors.push(err);
				}
				(next, end)
			},
			Err(err) => {
				let end = err.span.0.end;
				loader.errors.push(err);
				step.formula = None;
				step.work_vars = None;
				step.formula_incomplete = true;
				loader.skip_statement(end)
			},
		};

		step.stmt_text = loader.text[start..end].to_string();
		self.stmts.push(ProofWorkStmt::Step(step));
		next
	}

	/// Every hypothesis has to name a step, and no step may depend on itself.
	fn validate_hyps(&mut self, errors: &mut Vec<Spanned<StructuralError>>) {
		let labels: HashSet<String> = self.steps().map(|step| step.step.clone()).collect();
		let mut ids = IdGenerator::default();
		let mut graph = DiGraph::<(), ()>::new();
		for step in self.steps() {
			let id = ids.get_or_add_id(step.step.clone());
			while graph.node_count() <= id {
				graph.add_node(());
			}
		}

		let mut has_unknown = false;
		for step in self.steps() {
			let from = ids.get_or_add_id(step.step.clone());
			let span = step.prefix_span.clone().unwrap_or(GlobalSpan(0..0));
			for hyp in step.hyps().iter().flatten() {
				if !labels.contains(hyp) {
					has_unknown = true;
					errors.push(Spanned::new(StructuralError::UnknownHypStep(hyp.clone()), span.clone()));
					continue;
				}
				let to = ids.get_or_add_id(hyp.clone());
				graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
			}
		}

		if is_cyclic_directed(&graph) {
			let first = kosaraju_scc(&graph)
				.into_iter()
				.find(|component| component.len() > 1 || graph.contains_edge(component[0], component[0]))
				.and_then(|component| ids.get_key(component[0].index()).cloned())
				.unwrap_or_default();
			let span = self.find_step(&first)
				.and_then(|step| step.prefix_span.clone())
				.unwrap_or(GlobalSpan(0..0));
			errors.push(Spanned::new(StructuralError::HypCycle(first), span));
		} else if !has_unknown {
			self.load_proof_levels();
		}
	}

	/// Levels are counted from the last `qed` step down its hypotheses.
	fn load_proof_levels(&mut self) {
		let index: HashMap<String, usize> = self.stmts.iter()
			.enumerate()
			.filter_map(|(i, stmt)| match stmt {
				ProofWorkStmt::Step(step) => Some((step.step.clone(), i)),
				_ => None,
			})
			.collect();
		let qed = match index.get("qed") {
			Some(qed) => *qed,
			None => return,
		};

		let mut stack = vec![(qed, 0)];
		let mut visited = HashSet::new();
		while let Some((i, level)) = stack.pop() {
			if !visited.insert(i) {
				continue;
			}
			if let ProofWorkStmt::Step(step) = &mut self.stmts[i] {
				step.load_proof_level(level);
				for hyp in step.hyps().iter().flatten() {
					if let Some(next) = index.get(hyp) {
						stack.push((*next, level + 1));
					}
				}
			}
		}
	}

	pub fn steps(&self) -> impl Iterator<Item = &ProofStepStmt> {
		self.stmts.iter().filter_map(|stmt| match stmt {
			ProofWorkStmt::Step(step) => Some(step),
			_ => None,
		})
	}

	pub fn step(&self, index: usize) -> Option<&ProofStepStmt> {
		match self.stmts.get(index)? {
			ProofWorkStmt::Step(step) => Some(step),
			_ => None,
		}
	}

	pub fn step_index(&self, label: &str) -> Option<usize> {
		self.stmts.iter().position(|stmt| match stmt {
			ProofWorkStmt::Step(step) => step.step == label,
			_ => false,
		})
	}

	pub fn find_step(&self, label: &str) -> Option<&ProofStepStmt> {
		self.step(self.step_index(label)?)
	}

	/// A numeric label greater than every numeric step label in use.
	pub fn next_step_number(&self) -> u32 {
		self.steps()
			.filter_map(|step| step.step.parse::<u32>().ok())
			.max()
			.map_or(1, |max| max + 1)
	}

	/// Gives derivation steps, except `qed`, the labels `start`, `start + increment` and so on.
	pub fn renumber(&mut self, start: u32, increment: u32) {
		let mut map = HashMap::new();
		let mut number = start;
		for step in self.steps() {
			if step.is_hypothesis() || step.step == "qed" {
				continue;
			}
			map.insert(step.step.clone(), number.to_string());
			number += increment;
		}

		for stmt in &mut self.stmts {
			if let ProofWorkStmt::Step(step) = stmt {
				step.renumber(&map);
				step.reload_prefix_text();
			}
		}
	}

	pub fn to_text(&self) -> String {
		let mut result = String::new();
		for stmt in &self.stmts {
			result.push_str(stmt.text());
			result.push('\n');
		}
		result
	}

	/// Steps the transformation search is tried on: parsed, complete and without a reference.
	fn is_unifiable(&self, index: usize) -> bool {
		match self.step(index) {
			Some(step) => !step.is_hypothesis()
				&& step.ref_label.is_none()
				&& step.parse_tree.is_some()
				&& step.work_vars.is_none(),
			None => false,
		}
	}

	/// Justifies every step it can by transformations, in document order. New steps are placed
	/// right before the step they justify. Returns the number of justified steps.
	pub fn unify_by_transformations(&mut self, manager: &TransformationManager) -> usize {
		for stmt in &mut self.stmts {
			if let ProofWorkStmt::Step(step) = stmt {
				step.reset_canonical_form();
			}
		}

		let mut justified = 0;
		let mut index = 0;
		while index < self.stmts.len() {
			if self.is_unifiable(index) {
				if let Some(mut new_steps) = manager.try_to_find_transformations(self, index) {
					if let Some(target) = new_steps.pop() {
						debug!("step {} is justified by {}", target.step, target.ref_label.as_deref().unwrap_or(""));
						self.stmts[index] = ProofWorkStmt::Step(target);
						let count = new_steps.len();
						let tail = self.stmts.split_off(index);
						self.stmts.extend(new_steps.into_iter().map(ProofWorkStmt::Step));
						self.stmts.extend(tail);
						index += count;
						justified += 1;
					}
				}
			}
			index += 1;
		}
		let has_auto_steps = self.steps().any(|step| matches!(step.kind, StepKind::Derivation { auto_step: true, .. }));
		self.session.has_auto_steps = has_auto_steps;
		justified
	}

	/// Writes the values found for work variables into the steps using them. A step left without
	/// work variables can then be justified by `unify_by_transformations`.
	pub fn apply_work_var_updates(&mut self, library: &Library, grammar: &dyn Grammar) -> Vec<Spanned<StructuralError>> {
		let verifier = VerifyProofs::new(library, &self.work_vars);
		let context = HypContext::worksheet(library, &self.work_vars);
		let mut errors = Vec::new();
		for stmt in &mut self.stmts {
			if let ProofWorkStmt::Step(step) = stmt {
				if let Err(err) = step.apply_work_var_updates(&verifier, grammar, &context, self.max_seq) {
					errors.push(err);
				}
			}
		}
		let has_work_vars = self.steps().any(|step| step.work_vars.is_some());
		self.session.has_work_vars = has_work_vars;
		errors
	}
}
