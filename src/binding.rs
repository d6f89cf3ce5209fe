use std::collections::BTreeMap;

use crate::lang::{Library, StmtId};
use crate::tree::ParseNode;

/// Values of the variables of an assertion, keyed by their `$f` statement.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct BindingStorage(BTreeMap<StmtId, ParseNode>);

impl BindingStorage {
	/// Adds a binding. If the variable is already bound, checks that both values are the same; returns `None` otherwise.
	pub fn add(&mut self, var: StmtId, value: ParseNode) -> Option<()> {
		use std::collections::btree_map::Entry::*;

		match self.0.entry(var) {
			Vacant(vacant) => {
				vacant.insert(value);
				Some(())
			},
			Occupied(occupied) => {
				if *occupied.get() == value {
					Some(())
				} else {
					None
				}
			},
		}
	}

	pub fn get(&self, var: StmtId) -> Option<&ParseNode> {
		self.0.get(&var)
	}
}

/// Matches `term` against a library `pattern`, whose variable leaves bind to subtrees of `term`.
pub fn find_bindings(
	term: &ParseNode,
	pattern: &ParseNode,
	binding_storage: &mut BindingStorage,
	library: &Library,
) -> Option<()> {
	match library.pattern_var(pattern) {
		Some(var) => binding_storage.add(var, term.clone()),
		None => {
			if pattern.stmt != term.stmt || pattern.children.len() != term.children.len() {
				return None;
			}
			for (term_child, pattern_child) in term.children.iter().zip(pattern.children.iter()) {
				find_bindings(term_child, pattern_child, binding_storage, library)?;
			}
			Some(())
		},
	}
}

/// Instantiates `pattern`. Returns `None` if some of its variables are not bound.
pub fn apply_bindings(
	pattern: &ParseNode,
	binding_storage: &BindingStorage,
	library: &Library,
) -> Option<ParseNode> {
	match library.pattern_var(pattern) {
		Some(var) => binding_storage.get(var).cloned(),
		None => Some(ParseNode::new(
			pattern.stmt,
			pattern.children
				.iter()
				.map(|child| apply_bindings(child, binding_storage, library))
				.collect::<Option<Vec<_>>>()?,
		)),
	}
}
