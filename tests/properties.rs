mod common;

use proptest::prelude::*;

use common::*;
use stepmatch::config::Config;
use stepmatch::lang::Library;
use stepmatch::stmt_text::relocate_prefix;
use stepmatch::transforms::TransformationManager;
use stepmatch::tree::{NodeRef, ParseNode};
use stepmatch::worksheet::ProofWorksheet;

fn operand(library: &Library, index: usize) -> ParseNode {
	match index {
		0..=3 => tree(library, &format!("class {}", ["A", "B", "C", "D"][index])),
		4 => tree(library, "class 0"),
		_ => tree(library, "class ( A x. B )"),
	}
}

/// Sum of the operands; `right[i]` adds operand `i + 1` on the right of the sum so far.
fn sum(library: &Library, operands: &[usize], right: &[bool]) -> ParseNode {
	let plus = NodeRef::Stmt(library.lookup_stmt("cplus").unwrap());
	let mut result = operand(library, operands[0]);
	for (index, next) in operands[1..].iter().enumerate() {
		let next = operand(library, *next);
		result = if right.get(index).cloned().unwrap_or(true) {
			ParseNode::new(plus, vec![result, next])
		} else {
			ParseNode::new(plus, vec![next, result])
		};
	}
	result
}

fn sums() -> impl Strategy<Value = (Vec<usize>, Vec<bool>)> {
	(prop::collection::vec(0..6usize, 1..6), prop::collection::vec(any::<bool>(), 5))
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	#[test]
	fn canonical_form_is_idempotent((operands, right) in sums()) {
		let library = library();
		let manager = TransformationManager::new(&library);
		let worksheet = ProofWorksheet::new(&library, &Config::default());

		let original = sum(&library, &operands, &right);
		let canonical = manager.canonical_form(&worksheet, &original).unwrap();
		if let Some(proof) = &canonical.proof {
			prop_assert_eq!(proof.lhs(), &original);
			prop_assert_eq!(proof.rhs(), &canonical.tree);
		} else {
			prop_assert_eq!(&canonical.tree, &original);
		}

		let again = manager.canonical_form(&worksheet, &canonical.tree).unwrap();
		prop_assert_eq!(&again.tree, &canonical.tree);
		prop_assert!(again.proof.is_none());
	}

	#[test]
	fn canonical_form_ignores_order(
		(operands, right) in sums(),
		shuffled in prop::collection::vec(0..6usize, 1..6).prop_shuffle(),
		other_right in prop::collection::vec(any::<bool>(), 5),
	) {
		let library = library();
		let manager = TransformationManager::new(&library);
		let worksheet = ProofWorksheet::new(&library, &Config::default());

		let mut permuted = operands.clone();
		permuted.reverse();
		let first = manager.canonical_form(&worksheet, &sum(&library, &operands, &right)).unwrap();
		let second = manager.canonical_form(&worksheet, &sum(&library, &permuted, &other_right)).unwrap();
		prop_assert_eq!(&first.tree, &second.tree);

		let mut sorted_operands = operands.clone();
		sorted_operands.sort();
		let mut sorted_shuffled = shuffled.clone();
		sorted_shuffled.sort();
		let third = manager.canonical_form(&worksheet, &sum(&library, &shuffled, &right)).unwrap();
		prop_assert_eq!(sorted_operands == sorted_shuffled, first.tree == third.tree);
	}

	#[test]
	fn deep_duplicates((operands, right) in sums(), (others, other_right) in sums()) {
		let library = library();
		let first = sum(&library, &operands, &right);
		let second = sum(&library, &others, &other_right);

		prop_assert!(first.is_deep_dup(&first.clone()));
		prop_assert_eq!(first.is_deep_dup(&second), second.is_deep_dup(&first));
		prop_assert_eq!(first.is_deep_dup(&second), first == second);
		if operands == others && right == other_right {
			prop_assert!(first.is_deep_dup(&second));
		}
		if first.is_deep_dup(&second) {
			prop_assert_eq!(first.to_rpn(), second.to_rpn());
		}
	}

	#[test]
	fn relocation_keeps_suffix(label in "[1-9][0-9]{0,3}", other in "[1-9][0-9]{0,3}", formula in "[a-z ]{0,20}") {
		prop_assume!(label.len() == other.len());
		let text = format!("{}::eqid   |- {}", label, formula);
		let moved = relocate_prefix(&text, &format!("{}::eqid", other));
		let width = label.len() + "::eqid   ".len();
		prop_assert_eq!(&moved[width..], &text[width..]);
		prop_assert_eq!(moved.len(), text.len());
	}
}
