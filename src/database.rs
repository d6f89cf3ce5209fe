//! Reader for the subset of the Metamath format the engine works with: `$c $v $f $e $a $p`,
//! `${ $}` blocks and `$( $)` comments. Proofs of `$p` statements are skipped.

use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

use crate::config::Config;
use crate::grammar::{Grammar, HypContext, SyntaxGrammar};
use crate::lang::*;
use crate::tree::ParseNode;
use crate::utils::span::*;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Statement {
	Constants(Vec<Spanned<String>>),
	Variables(Vec<Spanned<String>>),
	Floating { label: Spanned<String>, expr: Vec<Spanned<String>> },
	Essential { label: Spanned<String>, expr: Vec<Spanned<String>> },
	Axiom { label: Spanned<String>, expr: Vec<Spanned<String>> },
	Theorem { label: Spanned<String>, expr: Vec<Spanned<String>> },
	BlockStart,
	BlockEnd,
}

peg::parser!(
	grammar database() for str {
		pub rule statements() -> Vec<Spanned<Statement>>
			= _ s:(t:statement() _ { t })* { s }

		rule statement() -> Spanned<Statement>
			= start:position!() s:statement_kind() end:position!() {
				Spanned::new(s, GlobalSpan(start..end))
			}

		rule statement_kind() -> Statement
			= "${" { Statement::BlockStart }
			/ "$}" { Statement::BlockEnd }
			/ "$c" __ s:symbols() "$." { Statement::Constants(s) }
			/ "$v" __ s:symbols() "$." { Statement::Variables(s) }
			/ label:label() __ "$f" __ expr:symbols() "$." { Statement::Floating { label, expr } }
			/ label:label() __ "$e" __ expr:symbols() "$." { Statement::Essential { label, expr } }
			/ label:label() __ "$a" __ expr:symbols() "$." { Statement::Axiom { label, expr } }
			/ label:label() __ "$p" __ expr:symbols() "$=" __ (symbol() __)* "$." {
				Statement::Theorem { label, expr }
			}

		rule symbols() -> Vec<Spanned<String>>
			= s:(t:symbol() __ { t })* { s }

		rule symbol() -> Spanned<String>
			= start:position!() !"$" s:$((!ws_char() [_])+) end:position!() {
				Spanned::new(s.to_string(), GlobalSpan(start..end))
			}

		rule label() -> Spanned<String>
			= start:position!() s:$(['a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.']+) end:position!() {
				Spanned::new(s.to_string(), GlobalSpan(start..end))
			}

		rule ws_char() = [' ' | '\t' | '\n' | '\r' | '\x0c']

		rule comment() = "$(" (!"$)" [_])* "$)"

		rule _() = quiet!{(ws_char() / comment())*}

		rule __() = quiet!{(ws_char() / comment())+}
	}
);

pub fn parse_database(input: &str) -> Result<Vec<Spanned<Statement>>, peg::error::ParseError<peg::str::LineCol>> {
	database::statements(input)
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LibraryError {
	#[error("symbol `{0}` is already declared")]
	DuplicateSymbol(String),
	#[error("label `{0}` is already used")]
	DuplicateLabel(String),
	#[error("symbol `{0}` is not declared")]
	UnknownSymbol(String),
	#[error("`{0}` is not a constant")]
	NotAConstant(String),
	#[error("`{0}` is not a variable")]
	NotAVariable(String),
	#[error("variable `{0}` has no active `$f` statement")]
	UntypedVariable(String),
	#[error("`$f` statement should contain a type code and a variable")]
	MalformedFloating,
	#[error("statement should start with a type code")]
	EmptyStatement,
	#[error("`$}}` without matching `${{`")]
	UnbalancedBlock,
	#[error("block is not closed")]
	UnclosedBlock,
	#[error("type code `{0}` is not declared")]
	MissingTypeCode(String),
}

impl ErrorCode for LibraryError {
	fn code(&self) -> &'static str {
		use LibraryError::*;

		match self {
			DuplicateSymbol(_) => "E-LA-0001",
			DuplicateLabel(_) => "E-LA-0002",
			UnknownSymbol(_) => "E-LA-0003",
			NotAConstant(_) => "E-LA-0004",
			NotAVariable(_) => "E-LA-0005",
			UntypedVariable(_) => "E-LA-0006",
			MalformedFloating => "E-LA-0007",
			EmptyStatement => "E-LA-0008",
			UnbalancedBlock => "E-LA-0009",
			UnclosedBlock => "E-LA-0010",
			MissingTypeCode(_) => "E-LA-0011",
		}
	}
}

#[derive(Default)]
struct Scope {
	var_hyps: HashMap<SymbolId, StmtId>,
	log_hyps: Vec<StmtId>,
}

#[derive(Default)]
struct Reader {
	symbols: Vec<Symbol>,
	stmts: Vec<Stmt>,
	symbol_table: HashMap<String, SymbolId>,
	stmt_table: HashMap<String, StmtId>,
	scopes: Vec<Scope>,
	/// Variable hypotheses needed to parse each `$e` and assertion.
	parse_hyps: Vec<(StmtId, Vec<StmtId>)>,
	errors: Vec<Spanned<LibraryError>>,
	next_seq: u32,
}

impl Reader {
	fn error(&mut self, error: LibraryError, span: &GlobalSpan) {
		self.errors.push(Spanned::new(error, span.clone()));
	}

	fn take_seq(&mut self) -> u32 {
		self.next_seq += 1;
		self.next_seq - 1
	}

	fn declare_symbol(&mut self, name: &Spanned<String>, kind: SymbolKind) {
		if let Some(id) = self.symbol_table.get(&name.inner) {
			// variables may be declared again in another block
			if kind == SymbolKind::Variable && self.symbols[id.0 as usize].kind == SymbolKind::Variable {
				return;
			}
			self.error(LibraryError::DuplicateSymbol(name.inner.clone()), &name.span);
			return;
		}

		let seq = self.take_seq();
		let id = SymbolId(self.symbols.len() as u32);
		self.symbols.push(Symbol { name: name.inner.clone(), kind, seq });
		self.symbol_table.insert(name.inner.clone(), id);
	}

	fn symbol(&mut self, name: &Spanned<String>) -> Option<SymbolId> {
		match self.symbol_table.get(&name.inner) {
			Some(id) => Some(*id),
			None => {
				self.error(LibraryError::UnknownSymbol(name.inner.clone()), &name.span);
				None
			},
		}
	}

	fn kind(&self, id: SymbolId) -> SymbolKind {
		self.symbols[id.0 as usize].kind
	}

	fn active_var_hyp(&self, var: SymbolId) -> Option<StmtId> {
		self.scopes.iter().rev().find_map(|scope| scope.var_hyps.get(&var).cloned())
	}

	/// Resolves the type code and the expression of a statement.
	fn expression(&mut self, expr: &[Spanned<String>], span: &GlobalSpan) -> Option<(SymbolId, Vec<SymbolId>)> {
		let (typ_name, rest) = match expr.split_first() {
			Some(split) => split,
			None => {
				self.error(LibraryError::EmptyStatement, span);
				return None;
			},
		};
		let typ = self.symbol(typ_name)?;
		if self.kind(typ) != SymbolKind::Constant {
			self.error(LibraryError::NotAConstant(typ_name.inner.clone()), &typ_name.span);
			return None;
		}

		let mut result = Vec::with_capacity(rest.len());
		let mut ok = true;
		for name in rest {
			match self.symbol(name) {
				Some(id) => {
					if self.kind(id) == SymbolKind::Variable && self.active_var_hyp(id).is_none() {
						self.error(LibraryError::UntypedVariable(name.inner.clone()), &name.span);
						ok = false;
					}
					result.push(id);
				},
				None => ok = false,
			}
		}
		if ok {
			Some((typ, result))
		} else {
			None
		}
	}

	fn add_stmt(&mut self, label: &Spanned<String>, typ: SymbolId, expr: Vec<SymbolId>, kind: StmtKind) -> Option<StmtId> {
		if self.stmt_table.contains_key(&label.inner) {
			self.error(LibraryError::DuplicateLabel(label.inner.clone()), &label.span);
			return None;
		}

		let seq = self.take_seq();
		let id = StmtId(self.stmts.len() as u32);
		self.stmts.push(Stmt {
			label: label.inner.clone(),
			seq,
			typ,
			expr,
			kind,
			tree: None,
		});
		self.stmt_table.insert(label.inner.clone(), id);
		Some(id)
	}

	/// Variable hypotheses of the variables occurring in `exprs`, ordered by sequence number.
	fn var_hyps_of<'b>(&self, exprs: impl Iterator<Item = &'b Vec<SymbolId>>) -> Vec<StmtId> {
		let mut result: Vec<StmtId> = exprs
			.flat_map(|expr| expr.iter())
			.filter(|id| self.kind(**id) == SymbolKind::Variable)
			.filter_map(|id| self.active_var_hyp(*id))
			.collect();
		result.sort_by_key(|id| self.stmts[id.0 as usize].seq);
		result.dedup();
		result
	}

	fn read(&mut self, statement: &Spanned<Statement>) {
		match &statement.inner {
			Statement::Constants(names) => {
				for name in names {
					self.declare_symbol(name, SymbolKind::Constant);
				}
			},
			Statement::Variables(names) => {
				for name in names {
					self.declare_symbol(name, SymbolKind::Variable);
				}
			},
			Statement::Floating { label, expr } => {
				if expr.len() != 2 {
					self.error(LibraryError::MalformedFloating, &statement.span);
					return;
				}
				let typ = match self.symbol(&expr[0]) {
					Some(id) => id,
					None => return,
				};
				let var = match self.symbol(&expr[1]) {
					Some(id) => id,
					None => return,
				};
				if self.kind(typ) != SymbolKind::Constant {
					self.error(LibraryError::NotAConstant(expr[0].inner.clone()), &expr[0].span);
					return;
				}
				if self.kind(var) != SymbolKind::Variable {
					self.error(LibraryError::NotAVariable(expr[1].inner.clone()), &expr[1].span);
					return;
				}
				if let Some(id) = self.add_stmt(label, typ, vec![var], StmtKind::VarHyp { var }) {
					if let Some(scope) = self.scopes.last_mut() {
						scope.var_hyps.insert(var, id);
					}
				}
			},
			Statement::Essential { label, expr } => {
				let (typ, expr) = match self.expression(expr, &statement.span) {
					Some(x) => x,
					None => return,
				};
				let hyps = self.var_hyps_of(std::iter::once(&expr));
				if let Some(id) = self.add_stmt(label, typ, expr, StmtKind::LogHyp) {
					self.parse_hyps.push((id, hyps));
					if let Some(scope) = self.scopes.last_mut() {
						scope.log_hyps.push(id);
					}
				}
			},
			Statement::Axiom { label, expr } | Statement::Theorem { label, expr } => {
				let (typ, expr) = match self.expression(expr, &statement.span) {
					Some(x) => x,
					None => return,
				};
				let log_hyps: Vec<StmtId> = self.scopes.iter()
					.flat_map(|scope| scope.log_hyps.iter().cloned())
					.collect();
				let var_hyps = self.var_hyps_of(
					log_hyps.iter()
						.map(|hyp| &self.stmts[hyp.0 as usize].expr)
						.chain(std::iter::once(&expr))
				);
				let frame = Frame { var_hyps: var_hyps.clone(), log_hyps };
				if let Some(id) = self.add_stmt(label, typ, expr, StmtKind::Assertion(frame)) {
					self.parse_hyps.push((id, var_hyps));
				}
			},
			Statement::BlockStart => self.scopes.push(Scope::default()),
			Statement::BlockEnd => {
				if self.scopes.len() > 1 {
					self.scopes.pop();
				} else {
					self.error(LibraryError::UnbalancedBlock, &statement.span);
				}
			},
		}
	}
}

/// Builds a library out of parsed statements and attaches parse trees to every provable
/// statement the syntax axioms can parse.
pub fn read_library(statements: &[Spanned<Statement>], config: &Config) -> Result<Library, Vec<Spanned<LibraryError>>> {
	let mut reader = Reader::default();
	reader.scopes.push(Scope::default());
	for statement in statements {
		reader.read(statement);
	}

	let end = statements.last().map(|s| s.span.0.end).unwrap_or(0);
	if reader.scopes.len() > 1 {
		reader.error(LibraryError::UnclosedBlock, &GlobalSpan(end..end));
	}
	let provable_type = reader.symbol_table.get(&config.provable_type).cloned();
	let logic_type = reader.symbol_table.get(&config.logic_type).cloned();
	for (name, found) in &[(&config.provable_type, provable_type), (&config.logic_type, logic_type)] {
		if found.is_none() {
			reader.error(LibraryError::MissingTypeCode(name.to_string()), &GlobalSpan(0..0));
		}
	}

	let (provable_type, logic_type) = match (provable_type, logic_type) {
		(Some(provable), Some(logic)) if reader.errors.is_empty() => (provable, logic),
		_ => return Err(reader.errors),
	};

	let Reader { symbols, stmts, symbol_table, stmt_table, mut scopes, parse_hyps, next_seq, .. } = reader;
	let mut library = Library {
		symbols,
		stmts,
		symbol_table,
		stmt_table,
		global_var_hyps: scopes.swap_remove(0).var_hyps,
		provable_type,
		logic_type,
		next_seq,
	};

	let trees: Vec<(StmtId, Option<ParseNode>)> = {
		let grammar = SyntaxGrammar::new(&library);
		parse_hyps.iter()
			.filter(|(id, _)| library.stmt(*id).typ == provable_type)
			.map(|(id, hyps)| {
				let stmt = library.stmt(*id);
				let formula = Formula::new(stmt.typ, stmt.expr.iter().map(|sym| Sym::Lib(*sym)));
				let context = HypContext::frame(&library, hyps);
				let tree = grammar.parse_formula(&formula, &context, stmt.seq);
				if tree.is_none() {
					warn!("statement `{}` cannot be parsed", stmt.label);
				}
				(*id, tree)
			})
			.collect()
	};
	for (id, tree) in trees {
		library.stmts[id.0 as usize].tree = tree;
	}

	Ok(library)
}

/// Parses and reads a library, rendering every error as a snippet.
pub fn load_library(input: &str, config: &Config) -> Result<Library, String> {
	let statements = parse_database(input).map_err(|err| peg_error_to_snippet(&err, input))?;
	read_library(&statements, config).map_err(|errs| {
		errs.iter().map(|err| err.error_snippet(input)).collect::<Vec<_>>().join("\n")
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn statements() {
		let parsed = parse_database("$( header $) $c wff |- $.\n$v ph $. wph $f wff ph $.\n${ h $e |- ph $. ax $a |- ph $. $}").unwrap();
		let kinds: Vec<_> = parsed.iter().map(|s| match &s.inner {
			Statement::Constants(_) => "c",
			Statement::Variables(_) => "v",
			Statement::Floating { .. } => "f",
			Statement::Essential { .. } => "e",
			Statement::Axiom { .. } => "a",
			Statement::Theorem { .. } => "p",
			Statement::BlockStart => "{",
			Statement::BlockEnd => "}",
		}).collect();
		assert_eq!(kinds, vec!["c", "v", "f", "{", "e", "a", "}"]);
	}

	#[test]
	fn theorem_proof_is_skipped() {
		let parsed = parse_database("th $p |- ph $= ( wph ) AB $.").unwrap();
		match &parsed[0].inner {
			Statement::Theorem { label, expr } => {
				assert_eq!(label.inner, "th");
				assert_eq!(expr.len(), 2);
			},
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn frames() {
		let library = load_library(
			"$c wff |- ( -> ) $. $v ph ps $. wph $f wff ph $. wps $f wff ps $.
			wi $a wff ( ph -> ps ) $.
			${ min $e |- ph $. maj $e |- ( ph -> ps ) $. ax-mp $a |- ps $. $}",
			&Config::default(),
		).unwrap();
		let mp = library.lookup_stmt("ax-mp").unwrap();
		let frame = library.stmt(mp).frame().unwrap().clone();
		assert_eq!(frame.var_hyps, vec![library.lookup_stmt("wph").unwrap(), library.lookup_stmt("wps").unwrap()]);
		assert_eq!(frame.log_hyps, vec![library.lookup_stmt("min").unwrap(), library.lookup_stmt("maj").unwrap()]);
		assert!(library.assertion_trees(mp).is_some());
		assert_eq!(library.logical_assertions().count(), 1);
		assert_eq!(library.syntax_axioms().count(), 1);
	}

	#[test]
	fn errors() {
		let statements = parse_database("$c wff |- $. $v ph $. ax $a |- ph $. $}").unwrap();
		let errors = read_library(&statements, &Config::default()).unwrap_err();
		let errors: Vec<_> = errors.into_iter().map(|e| e.inner).collect();
		assert_eq!(errors, vec![
			LibraryError::UntypedVariable("ph".to_string()),
			LibraryError::UnbalancedBlock,
		]);
	}
}
