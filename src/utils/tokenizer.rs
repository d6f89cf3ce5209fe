//! Whitespace-separated tokens of Metamath and worksheet text.

use crate::utils::span::GlobalSpan;

pub fn is_whitespace(c: char) -> bool {
	c == ' ' || c == '\t' || c == '\n' || c == '\r' || c == '\x0c'
}

/// Length in bytes of the whitespace run starting at `offset`.
///
/// Returns `None` when `offset` is at or past the end of `text`.
pub fn whitespace_len(text: &str, offset: usize) -> Option<usize> {
	let rest = text.get(offset..).filter(|rest| !rest.is_empty())?;
	Some(rest.find(|c: char| !is_whitespace(c)).unwrap_or_else(|| rest.len()))
}

/// Length in bytes of the token starting at `offset`.
///
/// Returns `None` at the end of `text` or when `offset` points at whitespace.
pub fn token_len(text: &str, offset: usize) -> Option<usize> {
	let rest = text.get(offset..)?;
	let len = rest.find(is_whitespace).unwrap_or_else(|| rest.len());
	if len == 0 {
		None
	} else {
		Some(len)
	}
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token<'a> {
	pub text: &'a str,
	/// Byte offset in the whole text.
	pub start: usize,
	/// Zero-based character column in its line.
	pub column: usize,
}

impl<'a> Token<'a> {
	pub fn end(&self) -> usize {
		self.start + self.text.len()
	}

	pub fn span(&self) -> GlobalSpan {
		GlobalSpan(self.start..self.end())
	}

	/// A token in the first column starts a new worksheet statement.
	pub fn starts_statement(&self) -> bool {
		self.column == 0
	}
}

/// Token stream over a proof worksheet.
#[derive(Clone, Debug)]
pub struct ProofTextTokenizer<'a> {
	text: &'a str,
	offset: usize,
	line_start: usize,
}

impl<'a> ProofTextTokenizer<'a> {
	pub fn new(text: &'a str) -> Self {
		ProofTextTokenizer {
			text,
			offset: 0,
			line_start: 0,
		}
	}

	pub fn text(&self) -> &'a str {
		self.text
	}

	/// Byte offset right after the last returned token.
	pub fn offset(&self) -> usize {
		self.offset
	}
}

impl<'a> Iterator for ProofTextTokenizer<'a> {
	type Item = Token<'a>;

	fn next(&mut self) -> Option<Token<'a>> {
		let blank = whitespace_len(self.text, self.offset)?;
		if let Some(pos) = self.text[self.offset..self.offset + blank].rfind('\n') {
			self.line_start = self.offset + pos + 1;
		}
		self.offset += blank;

		let len = token_len(self.text, self.offset)?;
		let token = Token {
			text: &self.text[self.offset..self.offset + len],
			start: self.offset,
			column: self.text[self.line_start..self.offset].chars().count(),
		};
		self.offset += len;
		Some(token)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn primitives() {
		assert_eq!(whitespace_len("  ab", 0), Some(2));
		assert_eq!(whitespace_len("ab", 0), Some(0));
		assert_eq!(whitespace_len("ab", 2), None);
		assert_eq!(token_len("ab cd", 0), Some(2));
		assert_eq!(token_len("ab cd", 2), None);
		assert_eq!(token_len("ab cd", 3), Some(2));
		assert_eq!(token_len("ab", 2), None);
	}

	#[test]
	fn columns() {
		let tokens: Vec<_> = ProofTextTokenizer::new("h1::a |- ph\n   ps\nqed:: |-").collect();
		let columns: Vec<_> = tokens.iter().map(|t| (t.text, t.column)).collect();
		assert_eq!(columns, vec![
			("h1::a", 0),
			("|-", 6),
			("ph", 9),
			("ps", 3),
			("qed::", 0),
			("|-", 6),
		]);
		assert!(tokens[4].starts_statement());
		assert_eq!(tokens[2].span(), GlobalSpan(9..11));
	}
}
