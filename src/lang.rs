//! Symbols, statements and formulas of a loaded library.

use itertools::Itertools;
use std::collections::HashMap;

use crate::tree::{NodeRef, ParseNode};
use crate::work_var::{WorkVarId, WorkVarManager};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SymbolId(pub u32);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StmtId(pub u32);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SymbolKind {
	Constant,
	Variable,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Symbol {
	pub name: String,
	pub kind: SymbolKind,
	pub seq: u32,
}

/// Mandatory hypotheses of an assertion.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Frame {
	/// Variable hypotheses in sequence order, one per child of a parse node.
	pub var_hyps: Vec<StmtId>,
	/// Logical hypotheses in declaration order.
	pub log_hyps: Vec<StmtId>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StmtKind {
	/// `$f`: the type declaration of one variable.
	VarHyp { var: SymbolId },
	/// `$e`
	LogHyp,
	/// `$a` or `$p`
	Assertion(Frame),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stmt {
	pub label: String,
	pub seq: u32,
	pub typ: SymbolId,
	pub expr: Vec<SymbolId>,
	pub kind: StmtKind,
	/// Parse tree of the expression, present for provable statements the grammar accepts.
	pub tree: Option<ParseNode>,
}

impl Stmt {
	pub fn frame(&self) -> Option<&Frame> {
		match &self.kind {
			StmtKind::Assertion(frame) => Some(frame),
			StmtKind::VarHyp { .. } | StmtKind::LogHyp => None,
		}
	}

	pub fn is_var_hyp(&self) -> bool {
		matches!(self.kind, StmtKind::VarHyp { .. })
	}
}

/// A symbol of a formula: either interned in the library or a work variable of a worksheet.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Sym {
	Lib(SymbolId),
	Work(WorkVarId),
}

/// Type code followed by an expression.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Formula(Vec<Sym>);

impl Formula {
	pub fn new(typ: SymbolId, expr: impl IntoIterator<Item = Sym>) -> Self {
		Formula(std::iter::once(Sym::Lib(typ)).chain(expr).collect())
	}

	pub fn typ(&self) -> Sym {
		self.0[0]
	}

	pub fn expr(&self) -> &[Sym] {
		&self.0[1..]
	}

	pub fn syms(&self) -> &[Sym] {
		&self.0
	}

	/// Work variables in order of first appearance.
	pub fn work_vars(&self) -> Vec<WorkVarId> {
		self.0.iter()
			.filter_map(|sym| match sym {
				Sym::Work(id) => Some(*id),
				Sym::Lib(_) => None,
			})
			.unique()
			.collect()
	}

	/// Replaces every work variable `subst` has an expression for.
	pub fn substitute(&self, mut subst: impl FnMut(WorkVarId) -> Option<Vec<Sym>>) -> Formula {
		Formula(self.0.iter()
			.flat_map(|sym| match *sym {
				Sym::Work(id) => subst(id).unwrap_or_else(|| vec![*sym]),
				Sym::Lib(_) => vec![*sym],
			})
			.collect())
	}

	pub fn render(&self, library: &Library, work_vars: &WorkVarManager) -> String {
		self.0.iter().map(|sym| library.sym_name(*sym, work_vars)).join(" ")
	}

	pub fn render_expr(&self, library: &Library, work_vars: &WorkVarManager) -> String {
		self.expr().iter().map(|sym| library.sym_name(*sym, work_vars)).join(" ")
	}
}

#[derive(Clone, Debug)]
pub struct Library {
	pub(crate) symbols: Vec<Symbol>,
	pub(crate) stmts: Vec<Stmt>,
	pub(crate) symbol_table: HashMap<String, SymbolId>,
	pub(crate) stmt_table: HashMap<String, StmtId>,
	/// Variable hypotheses in the outermost scope.
	pub(crate) global_var_hyps: HashMap<SymbolId, StmtId>,
	pub(crate) provable_type: SymbolId,
	pub(crate) logic_type: SymbolId,
	pub(crate) next_seq: u32,
}

impl Library {
	pub fn symbol(&self, id: SymbolId) -> &Symbol {
		&self.symbols[id.0 as usize]
	}

	pub fn stmt(&self, id: StmtId) -> &Stmt {
		&self.stmts[id.0 as usize]
	}

	pub fn lookup_symbol(&self, name: &str) -> Option<SymbolId> {
		self.symbol_table.get(name).cloned()
	}

	pub fn lookup_stmt(&self, label: &str) -> Option<StmtId> {
		self.stmt_table.get(label).cloned()
	}

	/// The `$f` hypothesis of a variable visible outside of every block.
	pub fn var_hyp(&self, var: SymbolId) -> Option<StmtId> {
		self.global_var_hyps.get(&var).cloned()
	}

	pub fn provable_type(&self) -> SymbolId {
		self.provable_type
	}

	pub fn logic_type(&self) -> SymbolId {
		self.logic_type
	}

	/// Upper bound (exclusive) of every sequence number in the library.
	pub fn max_seq(&self) -> u32 {
		self.next_seq
	}

	pub fn stmt_ids(&self) -> impl Iterator<Item = StmtId> {
		(0..self.stmts.len() as u32).map(StmtId)
	}

	/// Assertions of the provable type, in sequence order.
	pub fn logical_assertions<'a>(&'a self) -> impl Iterator<Item = StmtId> + 'a {
		let provable = self.provable_type;
		self.stmt_ids().filter(move |id| {
			let stmt = self.stmt(*id);
			stmt.frame().is_some() && stmt.typ == provable
		})
	}

	/// Assertions that define the syntax of some type code, in sequence order.
	pub fn syntax_axioms<'a>(&'a self) -> impl Iterator<Item = StmtId> + 'a {
		let provable = self.provable_type;
		self.stmt_ids().filter(move |id| {
			let stmt = self.stmt(*id);
			stmt.frame().is_some() && stmt.typ != provable
		})
	}

	/// Conclusion tree and logical hypothesis trees of an assertion, if all of them were parsed.
	pub fn assertion_trees(&self, id: StmtId) -> Option<(&ParseNode, Vec<&ParseNode>)> {
		let stmt = self.stmt(id);
		let frame = stmt.frame()?;
		let hyps = frame.log_hyps.iter()
			.map(|hyp| self.stmt(*hyp).tree.as_ref())
			.collect::<Option<Vec<_>>>()?;
		Some((stmt.tree.as_ref()?, hyps))
	}

	pub fn sym_name<'a>(&'a self, sym: Sym, work_vars: &'a WorkVarManager) -> &'a str {
		match sym {
			Sym::Lib(id) => &self.symbol(id).name,
			Sym::Work(id) => &work_vars.var(id).name,
		}
	}

	/// Type code of the expression a parse node stands for.
	pub fn node_type(&self, node: &ParseNode, work_vars: &WorkVarManager) -> SymbolId {
		match node.stmt {
			NodeRef::Stmt(id) => self.stmt(id).typ,
			NodeRef::WorkVar(id) => work_vars.var(id).typ,
		}
	}

	/// Position of a node reference in the global order; work variables sort after the library.
	pub fn seq_of(&self, node: NodeRef) -> u64 {
		match node {
			NodeRef::Stmt(id) => u64::from(self.stmt(id).seq),
			NodeRef::WorkVar(id) => u64::from(u32::MAX) + u64::from(id.0),
		}
	}

	/// The variable hypothesis a leaf of a library pattern refers to.
	pub fn pattern_var(&self, node: &ParseNode) -> Option<StmtId> {
		match node.stmt {
			NodeRef::Stmt(id) if self.stmt(id).is_var_hyp() => Some(id),
			_ => None,
		}
	}

	/// Index of the variable hypothesis of `var` in `frame`, which is also the child slot of the variable.
	pub fn var_slot(&self, frame: &Frame, var: SymbolId) -> Option<usize> {
		frame.var_hyps.iter().position(|hyp| match self.stmt(*hyp).kind {
			StmtKind::VarHyp { var: hyp_var } => hyp_var == var,
			_ => false,
		})
	}

	/// The syntax axiom a node applies, `None` for variables.
	pub fn node_op(&self, node: &ParseNode) -> Option<StmtId> {
		match node.stmt {
			NodeRef::Stmt(id) if !self.stmt(id).is_var_hyp() => Some(id),
			_ => None,
		}
	}

	pub fn is_var_node(&self, node: &ParseNode) -> bool {
		match node.stmt {
			NodeRef::Stmt(id) => self.stmt(id).is_var_hyp(),
			NodeRef::WorkVar(_) => true,
		}
	}
}
