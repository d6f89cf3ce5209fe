//! Placeholder variables of incomplete derivations.

use std::collections::HashMap;

use crate::config::Config;
use crate::lang::{Library, SymbolId};
use crate::tree::ParseNode;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct WorkVarId(pub u32);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkVar {
	pub name: String,
	pub typ: SymbolId,
	/// Value found for the variable by unification elsewhere in the worksheet.
	pub subst: Option<ParseNode>,
}

/// Work variables of one worksheet. A name like `&W3` is allocated the first time it is met.
#[derive(Clone, Debug, Default)]
pub struct WorkVarManager {
	prefixes: Vec<(String, SymbolId)>,
	vars: Vec<WorkVar>,
	by_name: HashMap<String, WorkVarId>,
}

impl WorkVarManager {
	/// Prefixes whose type code is not declared in the library are ignored.
	pub fn new(library: &Library, config: &Config) -> Self {
		let prefixes = config.work_var_prefixes.iter()
			.filter_map(|(prefix, typ)| Some((prefix.clone(), library.lookup_symbol(typ)?)))
			.collect();
		WorkVarManager {
			prefixes,
			vars: Vec::new(),
			by_name: HashMap::new(),
		}
	}

	pub fn get(&self, name: &str) -> Option<WorkVarId> {
		self.by_name.get(name).cloned()
	}

	pub fn var(&self, id: WorkVarId) -> &WorkVar {
		&self.vars[id.0 as usize]
	}

	pub fn len(&self) -> usize {
		self.vars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.vars.is_empty()
	}

	/// Whether `token` is a known prefix followed by a positive number without leading zeros.
	pub fn is_work_var_name(&self, token: &str) -> bool {
		self.prefix_type(token).is_some()
	}

	fn prefix_type(&self, token: &str) -> Option<SymbolId> {
		self.prefixes.iter()
			.filter(|(prefix, _)| token.starts_with(prefix.as_str()))
			.map(|(prefix, typ)| (&token[prefix.len()..], *typ))
			.find(|(number, _)| {
				!number.is_empty()
					&& !number.starts_with('0')
					&& number.chars().all(|c| c.is_ascii_digit())
			})
			.map(|(_, typ)| typ)
	}

	/// Returns the work variable named `token`, allocating it when the name is a known prefix
	/// followed by a positive number. Other tokens give `None`.
	pub fn alloc(&mut self, token: &str) -> Option<WorkVarId> {
		if let Some(id) = self.get(token) {
			return Some(id);
		}

		let typ = self.prefix_type(token)?;

		let id = WorkVarId(self.vars.len() as u32);
		self.vars.push(WorkVar {
			name: token.to_string(),
			typ,
			subst: None,
		});
		self.by_name.insert(token.to_string(), id);
		Some(id)
	}

	pub fn set_subst(&mut self, id: WorkVarId, subst: Option<ParseNode>) {
		self.vars[id.0 as usize].subst = subst;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::database::load_library;

	#[test]
	fn names() {
		let library = load_library("$c wff class |- $.", &Config::default()).unwrap();
		let mut work_vars = WorkVarManager::new(&library, &Config::default());

		assert!(work_vars.is_work_var_name("&W1"));
		assert!(work_vars.is_work_var_name("&C12"));
		assert!(!work_vars.is_work_var_name("&W"));
		assert!(!work_vars.is_work_var_name("&W01"));
		assert!(!work_vars.is_work_var_name("&W1a"));
		// `setvar` is not declared
		assert!(!work_vars.is_work_var_name("&S1"));

		let w1 = work_vars.alloc("&W1").unwrap();
		assert_eq!(work_vars.alloc("&W1"), Some(w1));
		let c1 = work_vars.alloc("&C1").unwrap();
		assert_ne!(w1, c1);
		assert_eq!(work_vars.var(c1).typ, library.lookup_symbol("class").unwrap());
		assert_eq!(work_vars.alloc("ph"), None);
		assert_eq!(work_vars.len(), 2);
	}
}
