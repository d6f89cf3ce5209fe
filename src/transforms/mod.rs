//! Matching a new proof step against earlier ones up to associativity, commutativity and
//! replacement of equals.

use thiserror::Error;
use tracing::{debug, error};

use crate::lang::{Library, StmtId};
use crate::step::ProofStepStmt;
use crate::tree::{NodeRef, ParseNode};
use crate::utils::span::ErrorCode;
use crate::worksheet::ProofWorksheet;

pub mod associative;
pub mod closure;
pub mod commutative;
pub mod equivalence;
pub mod proof;
pub mod replace;
pub mod transformation;
pub mod worksheet_info;

use associative::AssociativeInfo;
use closure::ClosureInfo;
use commutative::CommutativeInfo;
use equivalence::EquivalenceInfo;
use proof::EqProof;
use replace::ReplaceInfo;
use transformation::{canonicalize, transform_to_target, Canonical};
use worksheet_info::WorksheetInfo;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TransformError {
	#[error("statement {0} of the worksheet is not a proof step")]
	NotAStep(usize),
	#[error("no equivalence operator for type `{0}`")]
	NoEquivalence(String),
	#[error("no reflexivity rule for type `{0}`")]
	NoReflexivity(String),
	#[error("no replacement rule for position {position} of `{label}`")]
	NoReplacement { label: String, position: usize },
	#[error("cannot prove `{0}`")]
	UndischargedHypothesis(String),
	#[error("`{label}` does not prove `{formula}`")]
	RuleMismatch { label: String, formula: String },
	#[error("tree has an unexpected shape: `{0}`")]
	Malformed(String),
}

impl ErrorCode for TransformError {
	fn code(&self) -> &'static str {
		use TransformError::*;

		match self {
			NotAStep(_) => "A-TR-0001",
			NoEquivalence(_) => "A-TR-0002",
			NoReflexivity(_) => "A-TR-0003",
			NoReplacement { .. } => "A-TR-0004",
			UndischargedHypothesis(_) => "A-TR-0005",
			RuleMismatch { .. } => "A-TR-0006",
			Malformed(_) => "A-TR-0007",
		}
	}
}

/// Rules the search relies on, found once in the whole library.
#[derive(Clone, Debug)]
pub struct RuleIndex {
	pub equivalence: EquivalenceInfo,
	pub closure: ClosureInfo,
	pub replace: ReplaceInfo,
	pub associative: AssociativeInfo,
	pub commutative: CommutativeInfo,
}

impl RuleIndex {
	pub fn new(library: &Library) -> Self {
		let equivalence = EquivalenceInfo::new(library);
		let closure = ClosureInfo::new(library);
		let replace = ReplaceInfo::new(library, &equivalence);
		let associative = AssociativeInfo::new(library, &equivalence);
		let commutative = CommutativeInfo::new(library, &equivalence);
		RuleIndex { equivalence, closure, replace, associative, commutative }
	}
}

pub struct TransformationManager<'a> {
	library: &'a Library,
	rules: RuleIndex,
}

impl<'a> TransformationManager<'a> {
	pub fn new(library: &'a Library) -> Self {
		let rules = RuleIndex::new(library);
		debug!(
			"{} equivalence operators, {} operators with replacement rules",
			rules.equivalence.len(),
			rules.replace.len(),
		);
		TransformationManager { library, rules }
	}

	pub fn library(&self) -> &'a Library {
		self.library
	}

	pub fn rules(&self) -> &RuleIndex {
		&self.rules
	}

	/// Canonical form of a tree in the context of a worksheet, with the proof of the rewrite.
	pub fn canonical_form(&self, worksheet: &ProofWorksheet, tree: &ParseNode) -> Result<Canonical, TransformError> {
		let info = WorksheetInfo::new(worksheet, worksheet.stmts.len(), self.library, &self.rules);
		canonicalize(tree, &info)
	}

	/// Looks for an earlier step equal to the derivation step at `deriv` up to transformations.
	///
	/// On success returns the new steps to place before the derivation step, followed by the
	/// justified derivation step. Failures of any kind give `None`.
	pub fn try_to_find_transformations(&self, worksheet: &ProofWorksheet, deriv: usize) -> Option<Vec<ProofStepStmt>> {
		match self.find_transformations(worksheet, deriv) {
			Ok(result) => result,
			Err(err) => {
				error!("[{}] transformation search failed: {}", err.code(), err);
				None
			},
		}
	}

	fn find_transformations(&self, worksheet: &ProofWorksheet, deriv: usize) -> Result<Option<Vec<ProofStepStmt>>, TransformError> {
		let target = worksheet.step(deriv).ok_or(TransformError::NotAStep(deriv))?;
		let target_tree = match &target.parse_tree {
			Some(tree) => tree,
			None => return Ok(None),
		};
		let typ = self.library.node_type(target_tree, &worksheet.work_vars);
		let implication = match self.rules.equivalence.implication(typ) {
			Some(implication) => implication,
			None => return Ok(None),
		};

		let mut info = WorksheetInfo::new(worksheet, deriv, self.library, &self.rules);
		let target_canonical = cached_canonical(target, target_tree, &info)?;

		for candidate in worksheet.stmts[..deriv].iter().filter_map(|stmt| match stmt {
			crate::worksheet::ProofWorkStmt::Step(step) => Some(step),
			_ => None,
		}) {
			let tree = match &candidate.parse_tree {
				Some(tree) => tree,
				None => continue,
			};
			if cached_canonical(candidate, tree, &info)? != target_canonical {
				continue;
			}
			debug!("step {} matches step {}", target.step, candidate.step);

			let proof = if tree == target_tree {
				EqProof::Refl(tree.clone())
			} else {
				transform_to_target(canonicalize(tree, &info)?, canonicalize(target_tree, &info)?)
			};
			let (equivalence, _) = info.emit(&proof)?;
			let hyps = if implication.var_hyp_first {
				vec![candidate.step.clone(), equivalence]
			} else {
				vec![equivalence, candidate.step.clone()]
			};

			let mut justified = target.clone();
			justified.set_justification(implication.assrt, self.library.stmt(implication.assrt).label.clone(), hyps);
			justified.reload_prefix_text();

			let mut steps = info.into_new_steps();
			steps.push(justified);
			return Ok(Some(steps));
		}
		Ok(None)
	}
}

/// Canonical tree of a step, computed once per pass.
fn cached_canonical(step: &ProofStepStmt, tree: &ParseNode, info: &WorksheetInfo) -> Result<ParseNode, TransformError> {
	if let Some(canonical) = step.canonical_tree() {
		return Ok(canonical.clone());
	}
	let canonical = canonicalize(tree, info)?.tree;
	debug!("canonical form of step {}: {}", step.step, info.render(&canonical));
	step.set_canonical_tree(canonical.clone());
	Ok(canonical)
}

/// Operator and operands of a node of a binary syntax axiom.
pub(crate) fn binary_op<'t>(library: &Library, node: &'t ParseNode) -> Option<(StmtId, &'t ParseNode, &'t ParseNode)> {
	let op = library.node_op(node)?;
	let (left, right) = node.binary()?;
	Some((op, left, right))
}

pub(crate) fn make_binary(op: StmtId, left: ParseNode, right: ParseNode) -> ParseNode {
	ParseNode::new(NodeRef::Stmt(op), vec![left, right])
}

/// Variable hypotheses of `nodes` if they all are distinct variable leaves.
pub(crate) fn distinct_vars(library: &Library, nodes: &[&ParseNode]) -> Option<Vec<StmtId>> {
	let vars = nodes.iter().map(|node| library.pattern_var(node)).collect::<Option<Vec<_>>>()?;
	let mut sorted = vars.clone();
	sorted.sort();
	sorted.dedup();
	if sorted.len() == vars.len() {
		Some(vars)
	} else {
		None
	}
}
