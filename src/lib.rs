use annotate_snippets::{
	display_list::{DisplayList, FormatOptions},
	snippet::{Annotation, AnnotationType, Snippet},
};
use tracing::info;

pub mod binding;
pub mod config;
pub mod database;
pub mod grammar;
pub mod lang;
pub mod step;
pub mod stmt_text;
pub mod transforms;
pub mod tree;
pub mod utils;
pub mod verify;
pub mod work_var;
pub mod worksheet;

use crate::config::Config;

/// Step numbering applied after the transformation pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Renumber {
	pub start: u32,
	pub increment: u32,
}

fn print_error(text: String) {
	let snippet = Snippet {
		title: Some(Annotation { label: Some(&text), id: None, annotation_type: AnnotationType::Error }),
		opt: FormatOptions { color: true, ..Default::default() },
		..Snippet::default()
	};
	println!("{}", DisplayList::from(snippet));
}

/// Loads a library and a worksheet, justifies what the transformation search can justify and
/// returns the new worksheet text. Errors are printed as they are found; errors in worksheet
/// statements do not stop the pass.
pub fn unify_worksheet(library_text: &str, worksheet_text: &str, config: &Config, renumber: Option<Renumber>) -> Result<String, ()> {
	use crate::{database::*, grammar::*, transforms::*, worksheet::*};

	let library = load_library(library_text, config).map_err(|text| println!("{}", text))?;
	let grammar = SyntaxGrammar::new(&library);

	let (mut worksheet, errors) = ProofWorksheet::load(&library, &grammar, config, worksheet_text);
	for err in &errors {
		err.print_error_snippet(worksheet_text);
	}
	if worksheet.steps().next().is_none() {
		print_error("worksheet has no proof steps".to_string());
		return Err(());
	}

	for err in worksheet.apply_work_var_updates(&library, &grammar) {
		err.print_error_snippet(worksheet_text);
	}

	let manager = TransformationManager::new(&library);
	let justified = worksheet.unify_by_transformations(&manager);
	info!("{} steps justified by transformations", justified);

	if let Some(Renumber { start, increment }) = renumber {
		worksheet.renumber(start, increment);
	}

	Ok(worksheet.to_text())
}
