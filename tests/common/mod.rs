#![allow(dead_code)]

use stepmatch::config::Config;
use stepmatch::database::load_library;
use stepmatch::grammar::{Grammar, HypContext, SyntaxGrammar};
use stepmatch::lang::{Formula, Library, Sym};
use stepmatch::tree::ParseNode;
use stepmatch::utils::span::Spanned;
use stepmatch::step::StructuralError;
use stepmatch::worksheet::ProofWorksheet;

/// Propositional equivalence, class equality, addition and multiplication over `CC`.
pub const LIBRARY: &str = "
$( Syntax $)
$c ( ) = <-> + x. e. CC 0 wff class |- $.
$v ph ps ch A B C D $.
wph $f wff ph $.
wps $f wff ps $.
wch $f wff ch $.
cA $f class A $.
cB $f class B $.
cC $f class C $.
cD $f class D $.
wb $a wff ( ph <-> ps ) $.
wceq $a wff A = B $.
wcel $a wff A e. B $.
cplus $a class ( A + B ) $.
cmul $a class ( A x. B ) $.
cc $a class CC $.
c0 $a class 0 $.

$( Equivalence $)
biid $a |- ( ph <-> ph ) $.
${ bicomi.1 $e |- ( ph <-> ps ) $. bicomi $a |- ( ps <-> ph ) $. $}
${ bitri.1 $e |- ( ph <-> ps ) $. bitri.2 $e |- ( ps <-> ch ) $. bitri $a |- ( ph <-> ch ) $. $}
${ mpbi.min $e |- ph $. mpbi.maj $e |- ( ph <-> ps ) $. mpbi $a |- ps $. $}

$( Equality $)
eqid $a |- A = A $.
${ eqcomi.1 $e |- A = B $. eqcomi $a |- B = A $. $}
${ eqtri.1 $e |- A = B $. eqtri.2 $e |- B = C $. eqtri $a |- A = C $. $}
eqcom $a |- ( A = B <-> B = A ) $.
${ eqeq1i.1 $e |- A = B $. eqeq1i $a |- ( A = C <-> B = C ) $. $}
${ eqeq2i.1 $e |- A = B $. eqeq2i $a |- ( C = A <-> C = B ) $. $}

$( Arithmetic $)
${ addeq1i.1 $e |- A = B $. addeq1i $a |- ( A + C ) = ( B + C ) $. $}
${ addeq2i.1 $e |- A = B $. addeq2i $a |- ( C + A ) = ( C + B ) $. $}
addcom $a |- ( A + B ) = ( B + A ) $.
addass $a |- ( ( A + B ) + C ) = ( A + ( B + C ) ) $.
${ mulcli.1 $e |- A e. CC $. mulcli.2 $e |- B e. CC $. mulcli $a |- ( A x. B ) e. CC $. $}
${ mulcomi.1 $e |- A e. CC $. mulcomi.2 $e |- B e. CC $. mulcomi $a |- ( A x. B ) = ( B x. A ) $. $}
${ muleq1i.1 $e |- A = B $. muleq1i $a |- ( A x. C ) = ( B x. C ) $. $}
${ muleq2i.1 $e |- A = B $. muleq2i $a |- ( C x. A ) = ( C x. B ) $. $}
0cn $a |- 0 e. CC $.
";

pub fn library() -> Library {
	load_library(LIBRARY, &Config::default()).unwrap()
}

/// Parses `|- ...` text with the library variables in scope.
pub fn tree(library: &Library, text: &str) -> ParseNode {
	let syms: Vec<_> = text.split_whitespace()
		.map(|s| library.lookup_symbol(s).unwrap_or_else(|| panic!("unknown symbol `{}`", s)))
		.collect();
	let formula = Formula::new(syms[0], syms[1..].iter().cloned().map(Sym::Lib));
	let context = HypContext::frame(library, &[]);
	SyntaxGrammar::new(library)
		.parse_formula(&formula, &context, library.max_seq())
		.unwrap_or_else(|| panic!("cannot parse `{}`", text))
}

pub fn load_worksheet(library: &Library, text: &str) -> (ProofWorksheet, Vec<Spanned<StructuralError>>) {
	let grammar = SyntaxGrammar::new(library);
	ProofWorksheet::load(library, &grammar, &Config::default(), text)
}

/// A worksheet with a header followed by `steps`.
pub fn proof(steps: &[&str]) -> String {
	let mut text = "$( <MM> <PROOF_ASST> THEOREM=example LOC_AFTER=?\n\n".to_string();
	for step in steps {
		text.push_str(step);
		text.push('\n');
	}
	text.push_str("\n$)\n");
	text
}
