//! Turning symbol sequences into parse trees.

use std::collections::{HashMap, HashSet};

use crate::lang::*;
use crate::tree::{NodeRef, ParseNode};
use crate::work_var::WorkVarManager;

/// Where the variables of a formula get their types from.
pub struct HypContext<'a> {
	library: &'a Library,
	/// Hypotheses of the frame being parsed; the global scope is used for the rest.
	frame: HashMap<SymbolId, StmtId>,
	work_vars: Option<&'a WorkVarManager>,
}

impl<'a> HypContext<'a> {
	pub fn frame(library: &'a Library, var_hyps: &[StmtId]) -> Self {
		let frame = var_hyps.iter()
			.filter_map(|hyp| match library.stmt(*hyp).kind {
				StmtKind::VarHyp { var } => Some((var, *hyp)),
				_ => None,
			})
			.collect();
		HypContext { library, frame, work_vars: None }
	}

	pub fn worksheet(library: &'a Library, work_vars: &'a WorkVarManager) -> Self {
		HypContext { library, frame: HashMap::new(), work_vars: Some(work_vars) }
	}

	/// Type and leaf node of a variable symbol.
	pub fn leaf(&self, sym: Sym) -> Option<(SymbolId, NodeRef)> {
		match sym {
			Sym::Work(id) => Some((self.work_vars?.var(id).typ, NodeRef::WorkVar(id))),
			Sym::Lib(id) => {
				if self.library.symbol(id).kind != SymbolKind::Variable {
					return None;
				}
				let hyp = self.frame.get(&id).cloned().or_else(|| self.library.var_hyp(id))?;
				Some((self.library.stmt(hyp).typ, NodeRef::Stmt(hyp)))
			},
		}
	}
}

pub trait Grammar {
	/// Parses a formula, using only syntax axioms whose sequence number is below `max_seq`.
	fn parse_formula(&self, formula: &Formula, context: &HypContext, max_seq: u32) -> Option<ParseNode>;
}

/// Backtracking parser over the syntax axioms of a library.
///
/// Left-recursive syntax axioms are never applied at the position they are entered from.
pub struct SyntaxGrammar<'a> {
	library: &'a Library,
	axioms: HashMap<SymbolId, Vec<StmtId>>,
}

type Parses = Vec<(ParseNode, usize)>;

struct ParseState<'s> {
	syms: &'s [Sym],
	context: &'s HypContext<'s>,
	max_seq: u32,
	memo: HashMap<(SymbolId, usize), Parses>,
	active: HashSet<(SymbolId, usize)>,
}

impl<'a> SyntaxGrammar<'a> {
	pub fn new(library: &'a Library) -> Self {
		let mut axioms: HashMap<SymbolId, Vec<StmtId>> = HashMap::new();
		for id in library.syntax_axioms() {
			axioms.entry(library.stmt(id).typ).or_default().push(id);
		}
		SyntaxGrammar { library, axioms }
	}

	fn parse_type(&self, state: &mut ParseState, typ: SymbolId, pos: usize) -> Parses {
		let key = (typ, pos);
		if let Some(parses) = state.memo.get(&key) {
			return parses.clone();
		}
		if !state.active.insert(key) {
			return Vec::new();
		}

		let mut result = Vec::new();
		if let Some(sym) = state.syms.get(pos) {
			if let Some((leaf_type, leaf)) = state.context.leaf(*sym) {
				if leaf_type == typ {
					result.push((ParseNode::leaf(leaf), pos + 1));
				}
			}
		}
		for axiom in self.axioms.get(&typ).into_iter().flatten() {
			let stmt = self.library.stmt(*axiom);
			if stmt.seq >= state.max_seq {
				continue;
			}
			if let Some(frame) = stmt.frame() {
				let mut children = vec![None; frame.var_hyps.len()];
				self.match_axiom(state, *axiom, frame, 0, pos, &mut children, &mut result);
			}
		}

		state.active.remove(&key);
		state.memo.insert(key, result.clone());
		result
	}

	#[allow(clippy::too_many_arguments)]
	fn match_axiom(
		&self,
		state: &mut ParseState,
		axiom: StmtId,
		frame: &Frame,
		index: usize,
		pos: usize,
		children: &mut Vec<Option<ParseNode>>,
		result: &mut Parses,
	) {
		let expr = &self.library.stmt(axiom).expr;
		let sym = match expr.get(index) {
			Some(sym) => *sym,
			None => {
				if let Some(children) = children.iter().cloned().collect::<Option<Vec<_>>>() {
					result.push((ParseNode::new(NodeRef::Stmt(axiom), children), pos));
				}
				return;
			},
		};

		match self.library.symbol(sym).kind {
			SymbolKind::Constant => {
				if state.syms.get(pos) == Some(&Sym::Lib(sym)) {
					self.match_axiom(state, axiom, frame, index + 1, pos + 1, children, result);
				}
			},
			SymbolKind::Variable => {
				let slot = match self.library.var_slot(frame, sym) {
					Some(slot) => slot,
					None => return,
				};
				let typ = self.library.stmt(frame.var_hyps[slot]).typ;
				for (node, next) in self.parse_type(state, typ, pos) {
					let previous = children[slot].replace(node);
					self.match_axiom(state, axiom, frame, index + 1, next, children, result);
					children[slot] = previous;
				}
			},
		}
	}
}

impl<'a> Grammar for SyntaxGrammar<'a> {
	fn parse_formula(&self, formula: &Formula, context: &HypContext, max_seq: u32) -> Option<ParseNode> {
		let typ = match formula.typ() {
			Sym::Lib(id) if id == self.library.provable_type() => self.library.logic_type(),
			Sym::Lib(id) => id,
			Sym::Work(_) => return None,
		};
		let mut state = ParseState {
			syms: formula.expr(),
			context,
			max_seq,
			memo: HashMap::new(),
			active: HashSet::new(),
		};
		let len = formula.expr().len();
		self.parse_type(&mut state, typ, 0)
			.into_iter()
			.find(|(_, end)| *end == len)
			.map(|(node, _)| node)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Config;
	use crate::database::load_library;

	const LIBRARY: &str = "
		$c ( ) -> -. wff |- $.
		$v ph ps $.
		wph $f wff ph $.
		wps $f wff ps $.
		wn $a wff -. ph $.
		wi $a wff ( ph -> ps ) $.
		ax-1 $a |- ( ph -> ( ps -> ph ) ) $.
	";

	fn formula(library: &Library, text: &str) -> Formula {
		let mut syms = text.split_whitespace().map(|s| library.lookup_symbol(s).unwrap());
		let typ = syms.next().unwrap();
		Formula::new(typ, syms.map(Sym::Lib))
	}

	#[test]
	fn nested() {
		let library = load_library(LIBRARY, &Config::default()).unwrap();
		let grammar = SyntaxGrammar::new(&library);
		let context = HypContext::frame(&library, &[]);

		let tree = grammar.parse_formula(&formula(&library, "|- ( -. ph -> ps )"), &context, library.max_seq()).unwrap();
		let wi = library.lookup_stmt("wi").unwrap();
		let wn = library.lookup_stmt("wn").unwrap();
		let wph = library.lookup_stmt("wph").unwrap();
		let wps = library.lookup_stmt("wps").unwrap();
		assert_eq!(tree.to_rpn(), vec![NodeRef::Stmt(wph), NodeRef::Stmt(wn), NodeRef::Stmt(wps), NodeRef::Stmt(wi)]);

		let ax = library.lookup_stmt("ax-1").unwrap();
		assert_eq!(library.stmt(ax).tree.as_ref().map(ParseNode::depth), Some(3));
	}

	#[test]
	fn failures() {
		let library = load_library(LIBRARY, &Config::default()).unwrap();
		let grammar = SyntaxGrammar::new(&library);
		let context = HypContext::frame(&library, &[]);

		assert!(grammar.parse_formula(&formula(&library, "|- ( ph -> ps"), &context, library.max_seq()).is_none());
		assert!(grammar.parse_formula(&formula(&library, "|- ph ps"), &context, library.max_seq()).is_none());

		let wi = library.stmt(library.lookup_stmt("wi").unwrap()).seq;
		assert!(grammar.parse_formula(&formula(&library, "|- ( ph -> ps )"), &context, wi).is_none());
		assert!(grammar.parse_formula(&formula(&library, "|- -. ph"), &context, wi).is_some());
	}
}
