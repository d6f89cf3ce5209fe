//! Edits of the text of a single worksheet statement. Every function returns a new buffer.

use crate::utils::tokenizer::{token_len, whitespace_len};

/// Ends the `step:hyps:ref` field. Carriage returns and form feeds do not.
fn is_field_break(c: char) -> bool {
	c == ' ' || c == '\t' || c == '\n'
}

/// Replaces the leading `step:hyps:ref` field, keeping the first formula token in its column
/// whenever the new field fits.
pub fn relocate_prefix(text: &str, new_prefix: &str) -> String {
	let field = text.find(is_field_break).unwrap_or_else(|| text.len());
	let blanks = text[field..].find(|c| c != ' ' && c != '\t').unwrap_or_else(|| text.len() - field);
	let width = field + blanks;

	let mut result = String::with_capacity(text.len() + new_prefix.len());
	result.push_str(new_prefix);
	result.push(' ');
	while result.len() < width {
		result.push(' ');
	}
	result.push_str(&text[width..]);
	result
}

/// Replaces whole tokens by their substitutions, skipping the first two tokens (the prefix and
/// the type code). Whitespace between tokens is kept as is.
///
/// Returns `None` when the text has fewer than two tokens.
pub fn substitute_tokens(text: &str, substitutions: &[(String, String)]) -> Option<String> {
	let mut offset = 0;
	for _ in 0..2 {
		offset += whitespace_len(text, offset)?;
		offset += token_len(text, offset)?;
	}

	let mut result = String::with_capacity(text.len());
	result.push_str(&text[..offset]);
	while let Some(blank) = whitespace_len(text, offset) {
		result.push_str(&text[offset..offset + blank]);
		offset += blank;
		let len = match token_len(text, offset) {
			Some(len) => len,
			None => break,
		};
		let token = &text[offset..offset + len];
		match substitutions.iter().find(|(name, _)| name == token) {
			Some((_, value)) => result.push_str(value),
			None => result.push_str(token),
		}
		offset += len;
	}
	Some(result)
}

/// 1-based column right after the second `:` of the statement, or 1 when whitespace comes first.
pub fn ref_field_column(text: &str) -> usize {
	let mut colons = 0;
	for (column, c) in text.chars().enumerate() {
		if is_field_break(c) {
			break;
		}
		if c == ':' {
			colons += 1;
			if colons == 2 {
				return column + 2;
			}
		}
	}
	1
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn relocate() {
		assert_eq!(relocate_prefix("2::     |- ph", "2:1:ax"), "2:1:ax  |- ph");
		assert_eq!(relocate_prefix("2:: |- ph", "2:1:ax-mp"), "2:1:ax-mp |- ph");
		assert_eq!(relocate_prefix("2:1:a\t|- ph\n  ps", "3:1:b"), "3:1:b |- ph\n  ps");
		assert_eq!(relocate_prefix("2::", "3::"), "3:: ");
		assert_eq!(relocate_prefix("2:\x0c: |- ph", "3::"), "3::  |- ph");
	}

	#[test]
	fn substitute() {
		let subst = vec![("&W1".to_string(), "( ph -> ps )".to_string())];
		assert_eq!(
			substitute_tokens("&W1::ax |- &W1\n   -> &W12  &W1", &subst).unwrap(),
			"&W1::ax |- ( ph -> ps )\n   -> &W12  ( ph -> ps )",
		);
		assert_eq!(substitute_tokens("1:: |-", &subst).unwrap(), "1:: |-");
		assert!(substitute_tokens("1::", &subst).is_none());
	}

	#[test]
	fn ref_column() {
		assert_eq!(ref_field_column("2:1:ax-mp |- ph"), 5);
		assert_eq!(ref_field_column("qed::"), 6);
		assert_eq!(ref_field_column("2:1 |- ph"), 1);
		assert_eq!(ref_field_column(""), 1);
		assert_eq!(ref_field_column("2:1\r:ax |- ph"), 6);
		assert_eq!(ref_field_column(" 2:1:ax"), 1);
	}
}
