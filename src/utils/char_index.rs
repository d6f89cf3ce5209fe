#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CharIndex(pub usize);

/// Number of characters before byte position `byte` in `s`.
///
/// Positions past the end are clamped, positions inside a multibyte character round down.
pub fn char_offset(s: &str, byte: usize) -> CharIndex {
	CharIndex(s.char_indices().take_while(|(index, _)| *index < byte).count())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn offsets() {
		let s = "ab→c";
		assert_eq!(char_offset(s, 0), CharIndex(0));
		assert_eq!(char_offset(s, 2), CharIndex(2));
		assert_eq!(char_offset(s, 5), CharIndex(3));
		assert_eq!(char_offset(s, 100), CharIndex(4));
	}
}
