mod common;

use common::*;
use stepmatch::config::Config;
use stepmatch::database::load_library;
use stepmatch::grammar::SyntaxGrammar;
use stepmatch::step::{FieldId, StepKind, StructuralError};
use stepmatch::stmt_text::relocate_prefix;
use stepmatch::transforms::TransformationManager;
use stepmatch::utils::span::GlobalSpan;
use stepmatch::verify::VerifyProofs;
use stepmatch::worksheet::{ProofWorkStmt, ProofWorksheet};

#[test]
fn unknown_symbol_without_work_vars() {
	let library = load_library(
		"$c wff class $. $v A B $. cA $f class A $. cB $f class B $.",
		&Config::with_types("wff", "wff"),
	).unwrap();
	let grammar = SyntaxGrammar::new(&library);
	let text = "2::wff A /\\ B\n";
	let (worksheet, errors) = ProofWorksheet::load(&library, &grammar, &Config::with_types("wff", "wff"), text);

	assert_eq!(errors.len(), 1);
	assert_eq!(errors[0].inner, StructuralError::SymbolNotFound("/\\".to_string()));
	assert_eq!(errors[0].span, GlobalSpan(9..11));
	assert_eq!(errors[0].span.char_start(text).0, 9);

	let step = worksheet.step(0).unwrap();
	assert!(step.formula.is_none());
	assert!(step.formula_incomplete);
	assert_eq!(step.stmt_text, "2::wff A /\\ B");
	assert!(!worksheet.session.has_work_vars);
}

#[test]
fn formula_errors() {
	let library = library();
	let text = proof(&[
		"h1::example.1 ( A = B )",
		"h2::example.2 |- &C1 = A",
		"3::           |- A = B",
		"4::           |- A = ",
		"5::           |- A = D",
	]);
	let (worksheet, errors) = load_worksheet(&library, &text);
	let inner: Vec<_> = errors.iter().map(|err| err.inner.clone()).collect();
	assert_eq!(inner, vec![
		StructuralError::BadTypeCode { expected: "|-".to_string(), found: "(".to_string() },
		StructuralError::WorkVarNotAllowed("&C1".to_string()),
		StructuralError::ParseFailed,
	]);
	assert_eq!(&text[errors[1].span.0.clone()], "&C1");
	assert!(worksheet.find_step("3").unwrap().parse_tree.is_some());
	assert!(worksheet.find_step("4").unwrap().formula_incomplete);
	assert!(worksheet.find_step("5").unwrap().parse_tree.is_some());
	assert_eq!(worksheet.steps().count(), 5);
}

#[test]
fn work_vars() {
	let library = library();
	let text = proof(&["1::  |- &C1 = &C2", "2::  |- &C1 = A", "qed:: |- &W1"]);
	let (mut worksheet, errors) = load_worksheet(&library, &text);
	assert!(errors.is_empty());
	assert!(worksheet.session.has_work_vars);
	assert!(worksheet.session.has_auto_steps);
	assert_eq!(worksheet.work_vars.len(), 3);

	let c1 = worksheet.work_vars.get("&C1").unwrap();
	let step = worksheet.find_step("2").unwrap();
	assert_eq!(step.work_vars, Some(vec![c1]));
	assert!(step.parse_tree.is_some());

	// nothing resolved yet
	let verifier = VerifyProofs::new(&library, &worksheet.work_vars);
	let mut copy = step.clone();
	assert!(copy.update_stmt_text_with_work_var_updates(&verifier));
	assert_eq!(copy.stmt_text, "2::  |- &C1 = A");

	worksheet.work_vars.set_subst(c1, Some(tree(&library, "class ( A + B )")));
	let verifier = VerifyProofs::new(&library, &worksheet.work_vars);
	if let ProofWorkStmt::Step(step) = &mut worksheet.stmts[2] {
		assert!(step.update_stmt_text_with_work_var_updates(&verifier));
		assert_eq!(step.stmt_text, "2::  |- ( A + B ) = A");
	} else {
		panic!("step 2 is not a step");
	}

	let mut no_vars = worksheet.find_step("qed").unwrap().clone();
	no_vars.work_vars = None;
	assert!(!no_vars.update_stmt_text_with_work_var_updates(&verifier));
}

#[test]
fn resolved_work_vars_are_released() {
	let library = library();
	let (mut worksheet, errors) = load_worksheet(&library, &proof(&[
		"h1::example.1 |- ( A + B ) = A",
		"qed::         |- &C1 = A",
	]));
	assert!(errors.is_empty());
	let manager = TransformationManager::new(&library);
	assert_eq!(worksheet.unify_by_transformations(&manager), 0);

	let c1 = worksheet.work_vars.get("&C1").unwrap();
	worksheet.work_vars.set_subst(c1, Some(tree(&library, "class ( B + A )")));
	let grammar = SyntaxGrammar::new(&library);
	assert!(worksheet.apply_work_var_updates(&library, &grammar).is_empty());

	let expected = tree(&library, "|- ( B + A ) = A");
	let qed = worksheet.find_step("qed").unwrap();
	assert_eq!(qed.stmt_text, "qed::         |- ( B + A ) = A");
	assert_eq!(qed.work_vars, None);
	assert!(!qed.formula_incomplete);
	assert_eq!(qed.parse_tree.as_ref(), Some(&expected));
	let verifier = VerifyProofs::new(&library, &worksheet.work_vars);
	assert_eq!(qed.formula, verifier.formula(&expected));
	assert!(!worksheet.session.has_work_vars);

	// nothing left to substitute
	assert!(worksheet.apply_work_var_updates(&library, &grammar).is_empty());
	assert_eq!(worksheet.find_step("qed").unwrap().stmt_text, "qed::         |- ( B + A ) = A");

	assert_eq!(worksheet.unify_by_transformations(&manager), 1);
	assert_eq!(worksheet.find_step("qed").unwrap().ref_label.as_deref(), Some("mpbi"));
}

#[test]
fn partly_resolved_work_vars() {
	let library = library();
	let (mut worksheet, _) = load_worksheet(&library, &proof(&["qed:: |- &C1 = &C2"]));
	let c1 = worksheet.work_vars.get("&C1").unwrap();
	let c2 = worksheet.work_vars.get("&C2").unwrap();
	worksheet.work_vars.set_subst(c1, Some(tree(&library, "class A")));
	let grammar = SyntaxGrammar::new(&library);
	assert!(worksheet.apply_work_var_updates(&library, &grammar).is_empty());

	let qed = worksheet.find_step("qed").unwrap();
	assert_eq!(qed.stmt_text, "qed:: |- A = &C2");
	assert_eq!(qed.work_vars, Some(vec![c2]));
	assert!(qed.parse_tree.is_some());
	assert!(worksheet.session.has_work_vars);
}

#[test]
fn hypotheses() {
	let library = library();
	let (worksheet, errors) = load_worksheet(&library, &proof(&[
		"h1::example.1 |- A = B",
		"2:h1:eqcomi   |- B = A",
		"3:2,?:        |- B = A",
		"qed:3,9:      |- B = A",
	]));
	assert_eq!(errors.iter().map(|err| err.inner.clone()).collect::<Vec<_>>(), vec![StructuralError::UnknownHypStep("9".to_string())]);
	assert_eq!(worksheet.find_step("3").unwrap().hyps(), &[Some("2".to_string()), None][..]);
	assert_eq!(worksheet.find_step("2").unwrap().reference, library.lookup_stmt("eqcomi"));

	let (_, errors) = load_worksheet(&library, &proof(&[
		"1:2:   |- A = B",
		"2:1:   |- B = A",
		"qed:2: |- B = A",
	]));
	assert_eq!(errors.len(), 1);
	assert!(matches!(errors[0].inner, StructuralError::HypCycle(_)));
}

#[test]
fn proof_levels() {
	let library = library();
	let (worksheet, errors) = load_worksheet(&library, &proof(&[
		"h1::example.1  |- A = B",
		"2:h1:eqcomi    |- B = A",
		"3::eqid        |- C = C",
		"qed:2,h1:      |- B = A",
	]));
	assert!(errors.is_empty());
	let level = |label: &str| worksheet.find_step(label).unwrap().proof_level;
	assert_eq!(level("qed"), 0);
	assert_eq!(level("2"), 1);
	assert_eq!(level("h1"), 1);
	assert_eq!(level("3"), 0);
}

#[test]
fn renumber() {
	let library = library();
	let (mut worksheet, errors) = load_worksheet(&library, &proof(&[
		"h1::example.1  |- A = B",
		"7:h1:eqcomi    |- B = A",
		"9:7,h1:        |- B = A",
		"qed:9:         |- B = A",
	]));
	assert!(errors.is_empty());
	worksheet.renumber(10, 10);

	let texts: Vec<_> = worksheet.steps().map(|step| step.stmt_text.as_str()).collect();
	assert_eq!(texts, vec![
		"h1::example.1  |- A = B",
		"10:h1:eqcomi   |- B = A",
		"20:10,h1:      |- B = A",
		"qed:20:        |- B = A",
	]);
	assert_eq!(worksheet.next_step_number(), 21);
}

#[test]
fn fields() {
	let library = library();
	let (worksheet, _) = load_worksheet(&library, &proof(&["2:1:eqcomi |- B = A", "qed::  |- B = A"]));
	let step = worksheet.find_step("2").unwrap();
	assert_eq!(step.compute_field_column(FieldId::Ref), 5);
	assert_eq!(step.compute_field_column(FieldId::Formula), 1);
	assert_eq!(step.prefix_text(), "2:1:eqcomi");
	assert!(matches!(step.kind, StepKind::Derivation { auto_step: false, .. }));

	let qed = worksheet.find_step("qed").unwrap();
	assert!(matches!(qed.kind, StepKind::Derivation { auto_step: true, .. }));
	assert_eq!(qed.compute_field_column(FieldId::Ref), 6);
}

#[test]
fn relocate_keeps_suffix() {
	let text = "2:1:eqcomi  |- B\n    = A";
	let moved = relocate_prefix(text, "3:2:eqcomi");
	assert_eq!(&moved[10..], &text[10..]);
	assert_eq!(relocate_prefix(&moved, "2:1:eqcomi"), text);
}

#[test]
fn text_round_trip() {
	let library = library();
	let text = proof(&["* a comment", "h1::example.1 |- A = B", "qed:h1:eqcomi |- B = A"]);
	let (worksheet, errors) = load_worksheet(&library, &text);
	assert!(errors.is_empty());
	assert_eq!(worksheet.theorem_label.as_deref(), Some("example"));
	assert_eq!(
		worksheet.to_text(),
		"$( <MM> <PROOF_ASST> THEOREM=example LOC_AFTER=?\n* a comment\nh1::example.1 |- A = B\nqed:h1:eqcomi |- B = A\n$)\n",
	);
}
