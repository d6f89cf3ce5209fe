use annotate_snippets::{
	display_list::{DisplayList, FormatOptions},
	snippet::{Annotation, AnnotationType, Slice, Snippet, SourceAnnotation},
};
use itertools::Itertools;
use std::fmt::Display;
use std::ops::Range;

use crate::utils::char_index::{char_offset, CharIndex};

/// Byte range in the whole source text (library file or worksheet).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct GlobalSpan(pub Range<usize>);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Spanned<T> {
	pub span: GlobalSpan,
	pub inner: T,
}

impl GlobalSpan {
	/// Character offset of the span start, used to place the caret.
	pub fn char_start(&self, string: &str) -> CharIndex {
		char_offset(string, self.0.start)
	}
}

impl<T> Spanned<T> {
	pub fn new(t: T, span: GlobalSpan) -> Self {
		Spanned {
			span,
			inner: t,
		}
	}
}

/// Errors that carry a short classification code, shown next to the title of a snippet.
pub trait ErrorCode {
	fn code(&self) -> &'static str;
}

impl<T: Display + ErrorCode> Spanned<T> {
	/// Renders the error with the offending part of `string` underlined.
	pub fn error_snippet(&self, string: &str) -> String {
		let text = self.inner.to_string();
		let (line_no, line_range) = find_line_range(string, self.span.0.start, self.span.0.end);
		let source = &string[line_range.clone()];
		let start = self.span.0.start.max(line_range.start) - line_range.start;
		let end = self.span.0.end.min(line_range.end).max(self.span.0.start) - line_range.start;
		let range = (char_offset(source, start).0, char_offset(source, end).0.max(char_offset(source, start).0 + 1));
		let snippet = Snippet {
			title: Some(Annotation {
				label: Some(&text),
				id: Some(self.inner.code()),
				annotation_type: AnnotationType::Error,
			}),
			footer: vec![],
			slices: vec![
				Slice {
					source,
					line_start: line_no,
					origin: None,
					fold: true,
					annotations: vec![
						SourceAnnotation {
							label: "",
							annotation_type: AnnotationType::Error,
							range,
						},
					],
				},
			],
			opt: FormatOptions {
				color: true,
				..Default::default()
			},
		};
		DisplayList::from(snippet).to_string()
	}

	pub fn print_error_snippet(&self, string: &str) {
		println!("{}", self.error_snippet(string));
	}
}

/// Returns the 1-based line number of `start` and the byte range of the lines covering `start..end`.
fn find_line_range(string: &str, start: usize, end: usize) -> (usize, Range<usize>) {
	let start = start.min(string.len());
	let end = end.max(start).min(string.len());
	let line_start = string[..start].rfind('\n').map(|pos| pos + 1).unwrap_or(0);
	let line_end = string[end..].find('\n').map(|pos| end + pos).unwrap_or_else(|| string.len());
	let line_no = string[..line_start].matches('\n').count() + 1;
	(line_no, line_start..line_end)
}

/// Converts a `rust-peg` error into a rendered snippet.
pub fn peg_error_to_snippet(err: &peg::error::ParseError<peg::str::LineCol>, string: &str) -> String {
	let inner_text = format!("expected tokens: {}", err.expected.tokens().join(", "));
	let (line_no, line_range) = find_line_range(string, err.location.offset, err.location.offset);
	let source = &string[line_range.clone()];
	let column = char_offset(source, err.location.offset - line_range.start).0;

	let snippet = Snippet {
		title: Some(Annotation {
			label: Some("unexpected token"),
			id: None,
			annotation_type: AnnotationType::Error,
		}),
		footer: vec![Annotation {
			label: Some(&inner_text),
			id: None,
			annotation_type: AnnotationType::Note,
		}],
		slices: vec![
			Slice {
				source,
				line_start: line_no,
				origin: None,
				fold: true,
				annotations: vec![
					SourceAnnotation {
						label: "unexpected token",
						annotation_type: AnnotationType::Error,
						range: (column, column + 1),
					},
				],
			},
		],
		opt: FormatOptions {
			color: true,
			..Default::default()
		},
	};
	DisplayList::from(snippet).to_string()
}
