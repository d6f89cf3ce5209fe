use core::hash::Hash;
use std::collections::HashMap;

/// Assigns dense ids, starting from zero, to keys in order of first appearance.
///
/// Used to map step labels onto graph node indices.
#[derive(Default, Eq, PartialEq, Debug, Clone)]
pub struct IdGenerator<T: Hash + Eq + Clone> {
	storage: HashMap<T, usize>,
	keys: Vec<T>,
}

impl<T: Hash + Eq + Clone> IdGenerator<T> {
	pub fn get_or_add_id(&mut self, key: T) -> usize {
		let keys = &mut self.keys;
		*self.storage.entry(key.clone()).or_insert_with(|| {
			keys.push(key);
			keys.len() - 1
		})
	}

	pub fn get_key(&self, value: usize) -> Option<&T> {
		self.keys.get(value)
	}
}
