use cubescript_cube::{Cube, RubiksCube};
use cubescript_notation::{Notation, NotationBuilder, Symbol, Syntax};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::error::ErrorKind;
use crate::{MoveMetrics, ScriptParser, to_permutation_string};

lazy_static! {
    static ref DEFAULT: Notation = Notation::default_notation(3).expect("default notation");
}

fn parse(script: &str) -> crate::Node {
    ScriptParser::new(&DEFAULT)
        .parse(script)
        .unwrap_or_else(|e| panic!("parse {script:?}: {e}"))
}

fn parse_err(script: &str) -> crate::ParseError {
    ScriptParser::new(&DEFAULT)
        .parse(script)
        .expect_err(script)
}

#[track_caller]
fn assert_parses_to(script: &str, expected: &str) {
    assert_eq!(parse(script).to_string(), expected, "script: {script:?}");
}

/// A notation with pre-infix conjugation and repetition, suffix
/// inversion, and a handful of move tokens.
fn preinfix_notation() -> Notation {
    let mut b = NotationBuilder::new(3).expect("layer count");
    for (token, mv) in [
        ("R", (0u8, 4u32, 1)),
        ("U", (1, 4, 1)),
        ("F", (2, 4, 1)),
        ("L", (0, 1, -1)),
        ("D", (1, 1, -1)),
        ("B", (2, 1, -1)),
        ("CU", (1, 7, 1)),
        ("CF", (2, 7, 1)),
    ] {
        let (axis, mask, angle) = mv;
        b.add_move(cubescript_notation::Move::new(3, axis, mask, angle), token)
            .expect("move");
    }
    b.add_token(Symbol::InversionOperator, "'").expect("token");
    b.add_token(Symbol::GroupingBegin, "(").expect("token");
    b.add_token(Symbol::GroupingEnd, ")").expect("token");
    b.add_token(Symbol::RepetitionOperator, "*").expect("token");
    b.add_token(Symbol::ConjugationBegin, "<").expect("token");
    b.add_token(Symbol::ConjugationEnd, ">").expect("token");
    b.add_token(Symbol::ConjugationOperator, "conj").expect("token");
    b.put_syntax(Symbol::Grouping, Syntax::Circumfix).expect("syntax");
    b.put_syntax(Symbol::Inversion, Syntax::Suffix).expect("syntax");
    b.put_syntax(Symbol::Repetition, Syntax::Preinfix).expect("syntax");
    b.put_syntax(Symbol::Conjugation, Syntax::Preinfix).expect("syntax");
    b.put_syntax(Symbol::Move, Syntax::Primary).expect("syntax");
    b.build()
}

mod parsing {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn primitive_moves() {
        assert_parses_to("R", "Sequence{ Move{ax:0 lm:4 an:1} }");
        assert_parses_to("U", "Sequence{ Move{ax:1 lm:4 an:1} }");
        assert_parses_to("F", "Sequence{ Move{ax:2 lm:4 an:1} }");
        assert_parses_to("L", "Sequence{ Move{ax:0 lm:1 an:-1} }");
        assert_parses_to("D", "Sequence{ Move{ax:1 lm:1 an:-1} }");
        assert_parses_to("B", "Sequence{ Move{ax:2 lm:1 an:-1} }");
        assert_parses_to("R2", "Sequence{ Move{ax:0 lm:4 an:2} }");
        assert_parses_to("L2", "Sequence{ Move{ax:0 lm:1 an:-2} }");
        assert_parses_to("MR", "Sequence{ Move{ax:0 lm:2 an:1} }");
        assert_parses_to("MB2", "Sequence{ Move{ax:2 lm:2 an:-2} }");
        assert_parses_to("TR", "Sequence{ Move{ax:0 lm:6 an:1} }");
        assert_parses_to("TL", "Sequence{ Move{ax:0 lm:3 an:-1} }");
        assert_parses_to("CR", "Sequence{ Move{ax:0 lm:7 an:1} }");
        assert_parses_to("SR", "Sequence{ Move{ax:0 lm:5 an:1} }");
        assert_parses_to("SD2", "Sequence{ Move{ax:1 lm:5 an:-2} }");
    }

    #[test]
    fn inversion_binds_as_suffix() {
        assert_parses_to("R'", "Sequence{ Inversion{ Move{ax:0 lm:4 an:1} } }");
        assert_parses_to("MR'", "Sequence{ Inversion{ Move{ax:0 lm:2 an:1} } }");
        assert_parses_to(
            "(R U F)'",
            "Sequence{ Inversion{ Grouping{ Move{ax:0 lm:4 an:1} Move{ax:1 lm:4 an:1} Move{ax:2 lm:4 an:1} } } }",
        );
        // '-' doubles as the inversion operator.
        assert_parses_to(
            "(R- U F)-",
            "Sequence{ Inversion{ Grouping{ Inversion{ Move{ax:0 lm:4 an:1} } Move{ax:1 lm:4 an:1} Move{ax:2 lm:4 an:1} } } }",
        );
    }

    #[test]
    fn suffixes_nest_left_to_right() {
        assert_parses_to(
            "(R)3",
            "Sequence{ Repetition{3, Grouping{ Move{ax:0 lm:4 an:1} } } }",
        );
        assert_parses_to(
            "(R U F)3'",
            "Sequence{ Inversion{ Repetition{3, Grouping{ Move{ax:0 lm:4 an:1} Move{ax:1 lm:4 an:1} Move{ax:2 lm:4 an:1} } } } }",
        );
        assert_parses_to(
            "(R U F)'3",
            "Sequence{ Repetition{3, Inversion{ Grouping{ Move{ax:0 lm:4 an:1} Move{ax:1 lm:4 an:1} Move{ax:2 lm:4 an:1} } } } }",
        );
        assert_parses_to(
            "(R U F)3'4",
            "Sequence{ Repetition{4, Inversion{ Repetition{3, Grouping{ Move{ax:0 lm:4 an:1} Move{ax:1 lm:4 an:1} Move{ax:2 lm:4 an:1} } } } } }",
        );
    }

    #[test]
    fn conjugation_and_rotation_share_their_begin_token() {
        assert_parses_to(
            "<CU>R",
            "Sequence{ Conjugation{ Sequence{ Move{ax:1 lm:7 an:1} }, Move{ax:0 lm:4 an:1} } }",
        );
        assert_parses_to(
            "<CU CF>(R B)",
            "Sequence{ Conjugation{ Sequence{ Move{ax:1 lm:7 an:1} Move{ax:2 lm:7 an:1} }, Grouping{ Move{ax:0 lm:4 an:1} Move{ax:2 lm:1 an:-1} } } }",
        );
        assert_parses_to(
            "<CU>'R",
            "Sequence{ Rotation{ Sequence{ Move{ax:1 lm:7 an:1} }, Move{ax:0 lm:4 an:1} } }",
        );
    }

    #[test]
    fn commutation_is_precircumfix() {
        assert_parses_to(
            "[CU,R]",
            "Sequence{ Commutation{ Sequence{ Move{ax:1 lm:7 an:1} }, Sequence{ Move{ax:0 lm:4 an:1} } } }",
        );
        assert_parses_to(
            "[CU CF,R B]",
            "Sequence{ Commutation{ Sequence{ Move{ax:1 lm:7 an:1} Move{ax:2 lm:7 an:1} }, Sequence{ Move{ax:0 lm:4 an:1} Move{ax:2 lm:1 an:-1} } } }",
        );
    }

    #[test]
    fn reflection_is_a_suffix() {
        assert_parses_to(
            "(R' U F)*",
            "Sequence{ Reflection{ Grouping{ Inversion{ Move{ax:0 lm:4 an:1} } Move{ax:1 lm:4 an:1} Move{ax:2 lm:4 an:1} } } }",
        );
    }

    #[test]
    fn nop_and_empty_scripts() {
        assert_parses_to(".", "Sequence{ NOP }");
        assert_parses_to(
            "R . U · F",
            "Sequence{ Move{ax:0 lm:4 an:1} NOP Move{ax:1 lm:4 an:1} NOP Move{ax:2 lm:4 an:1} }",
        );
        assert_parses_to("", "Sequence{ }");
    }

    #[test]
    fn comments_are_skipped() {
        assert_parses_to(
            "R /* a comment */ U // to the end\nF",
            "Sequence{ Move{ax:0 lm:4 an:1} Move{ax:1 lm:4 an:1} Move{ax:2 lm:4 an:1} }",
        );
    }

    #[test]
    fn permutation_cycles() {
        assert_parses_to(
            "(+urf,bru,drb,frd) (+ur,br,dr,fr) (+r) (r,b) (++u,d) (++f,+l)",
            "Sequence{ CornerPermutation{sign:2 0:0,2:2,3:0,1:2} \
             EdgePermutation{sign:1 0:0,4:1,2:0,1:1} \
             SidePermutation{sign:3 0:0} \
             SidePermutation{sign:0 0:0,5:0} \
             SidePermutation{sign:2 1:0,4:0} \
             SidePermutation{sign:2 2:0,3:3} }",
        );
    }

    #[test]
    fn spans_enclose_children() {
        fn check(node: &crate::Node) {
            for child in node.children() {
                assert!(child.start >= node.start && child.end <= node.end);
                check(child);
            }
        }
        let tree = parse("(R U F)3'4 [CU,R] <CF>U");
        check(&tree);
        assert_eq!(tree.start, 0);
        assert_eq!(tree.end, 23);
    }
}

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_word_names_the_statement() {
        let e = parse_err("knurps");
        assert_eq!(e.message, "Statement: Keyword or Number expected. Found \"knurps\".");
        assert_eq!(e.kind, ErrorKind::Syntax);
        assert_eq!(e.span(), 0..6);
    }

    #[test]
    fn missing_preinfix_operand_names_the_placement() {
        let notation = preinfix_notation();
        let e = ScriptParser::new(&notation)
            .parse("<CU CF> conj (R)")
            .expect_err("operand-less pre-infix operator");
        assert_eq!(e.message, "Preinfix: Operand expected. Found \"<\".");
        assert_eq!(e.span(), 0..1);
    }

    #[test]
    fn unbalanced_grouping() {
        let e = parse_err("(R U");
        assert_eq!(e.message, "Circumfix: Number, Keyword or End expected. Found \"<EOF>\".");
    }

    #[test]
    fn unterminated_comment_is_lexical() {
        let e = parse_err("R /* unterminated");
        assert_eq!(e.kind, ErrorKind::Lexical);
        assert_eq!(e.message, "Comment: End missing.");
    }

    #[test]
    fn malformed_permutation_member() {
        let e = parse_err("(urf,ur)");
        assert_eq!(
            e.message,
            "Permutation: Permutation of different part types is not supported."
        );
        let e = parse_err("(urr)");
        assert_eq!(e.message, "PermutationItem: Impossible corner part.");
    }

    #[test]
    fn nesting_ceiling_is_a_resource_error() {
        let mut parser = ScriptParser::new(&DEFAULT);
        parser.set_max_depth(8);
        let script = format!("{}R{}", "(".repeat(20), ")".repeat(20));
        let e = parser.parse(&script).expect_err("too deep");
        assert_eq!(e.kind, ErrorKind::Resource);

        // The same script parses with the default ceiling.
        ScriptParser::new(&DEFAULT).parse(&script).expect("parses");
    }
}

mod precedence {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn suffix_inversion_binds_tighter_than_preinfix_repetition() {
        let notation = preinfix_notation();
        let tree = ScriptParser::new(&notation).parse("3 * R'").expect("parses");
        assert_eq!(
            tree.to_string(),
            "Sequence{ Repetition{3, Inversion{ Move{ax:0 lm:4 an:1} } } }"
        );
    }

    #[test]
    fn preinfix_conjugation_wraps_whole_statements() {
        let notation = preinfix_notation();
        let tree = ScriptParser::new(&notation)
            .parse("(CU CF) conj R'")
            .expect("parses");
        assert_eq!(
            tree.to_string(),
            "Sequence{ Conjugation{ Grouping{ Move{ax:1 lm:7 an:1} Move{ax:2 lm:7 an:1} }, Inversion{ Move{ax:0 lm:4 an:1} } } }"
        );
    }
}

mod macros {
    use super::*;
    use pretty_assertions::assert_eq;

    fn local_macros() -> IndexMap<String, String> {
        IndexMap::from_iter([
            ("sexy".to_owned(), "R U R' U'".to_owned()),
            ("double".to_owned(), "sexy sexy".to_owned()),
            ("loop".to_owned(), "R loop".to_owned()),
        ])
    }

    #[test]
    fn macro_references_expand_to_their_body() {
        let parser = ScriptParser::with_local_macros(&DEFAULT, local_macros());
        let tree = parser.parse("sexy").expect("parses");
        let direct = parser.parse("R U R' U'").expect("parses");
        assert_eq!(tree.expand(false), direct.expand(false));
    }

    #[test]
    fn macros_may_reference_other_macros() {
        let parser = ScriptParser::with_local_macros(&DEFAULT, local_macros());
        let tree = parser.parse("double").expect("parses");
        let direct = parser.parse("R U R' U' R U R' U'").expect("parses");
        assert_eq!(tree.expand(false), direct.expand(false));
    }

    #[test]
    fn expansions_are_spanned_to_the_reference() {
        let parser = ScriptParser::with_local_macros(&DEFAULT, local_macros());
        let tree = parser.parse("R sexy").expect("parses");
        let children = tree.children();
        assert_eq!(children[1].start, 2);
        assert_eq!(children[1].end, 6);
        // All expansion nodes carry the reference span.
        fn check(node: &crate::Node, start: usize, end: usize) {
            assert_eq!((node.start, node.end), (start, end));
            for child in node.children() {
                check(child, start, end);
            }
        }
        if let crate::NodeKind::Macro { expansion, .. } = &children[1].kind {
            check(expansion, 2, 6);
        } else {
            panic!("expected a macro node, got {}", children[1]);
        }
    }

    #[test]
    fn notation_macros_are_resolved() {
        let mut b = NotationBuilder::new(3).expect("layer count");
        for (token, (axis, mask, angle)) in
            [("R", (0u8, 4u32, 1)), ("U", (1, 4, 1)), ("L", (0, 1, -1))]
        {
            b.add_move(cubescript_notation::Move::new(3, axis, mask, angle), token)
                .expect("move");
        }
        b.add_token(Symbol::InversionOperator, "'").expect("token");
        b.put_syntax(Symbol::Inversion, Syntax::Suffix).expect("syntax");
        b.put_macro("slide", "R U R'").expect("macro");
        let notation = b.build();

        let parser = ScriptParser::new(&notation);
        let tree = parser.parse("slide L").expect("parses");
        let direct = parser.parse("R U R' L").expect("parses");
        assert_eq!(tree.expand(false), direct.expand(false));
    }

    #[test]
    fn recursive_macros_are_rejected() {
        let parser = ScriptParser::with_local_macros(&DEFAULT, local_macros());
        let e = parser.parse("loop").expect_err("recursion");
        assert_eq!(e.kind, ErrorKind::Macro);
        assert!(e.message.contains("recursion"), "{}", e.message);
    }

    #[test]
    fn memoized_expansions_are_reused() {
        let parser = ScriptParser::with_local_macros(&DEFAULT, local_macros());
        let tree = parser.parse("sexy sexy").expect("parses");
        let children = tree.children();
        assert_eq!(children[0].expand(false), children[1].expand(false));
        assert_ne!(children[0].start, children[1].start);
    }
}

mod metrics {
    use super::*;
    use pretty_assertions::assert_eq;

    #[track_caller]
    fn assert_metrics(script: &str, btm: usize, ltm: usize, ftm: usize, qtm: usize, count: usize) {
        let tree = parse(script);
        let mut metrics = MoveMetrics::new();
        metrics.accept(&tree);
        assert_eq!(
            (
                metrics.block_turn_count(),
                metrics.layer_turn_count(),
                metrics.face_turn_count(),
                metrics.quarter_turn_count(),
                metrics.move_count(),
            ),
            (btm, ltm, ftm, qtm, count),
            "script: {script:?}"
        );
    }

    #[test]
    fn metrics_oracle() {
        assert_metrics("R", 1, 1, 1, 1, 1);
        assert_metrics("R2", 1, 1, 1, 2, 1);
        assert_metrics("R'", 1, 1, 1, 1, 1);
        assert_metrics("R R", 1, 1, 1, 2, 2);
        assert_metrics("R R R", 1, 1, 1, 1, 3);
        assert_metrics("R R R2", 0, 0, 0, 0, 3);
        assert_metrics("CR", 0, 0, 0, 0, 1);
        assert_metrics("CR2", 0, 0, 0, 0, 1);
        assert_metrics("CR'", 0, 0, 0, 0, 1);
        assert_metrics("R CR R", 1, 1, 1, 2, 3);
        assert_metrics("R U", 2, 2, 2, 2, 2);
        assert_metrics("R R U", 2, 2, 2, 3, 3);
        assert_metrics("R U R", 3, 3, 3, 3, 3);
        assert_metrics("R R U2", 2, 2, 2, 4, 3);
        assert_metrics("R U2 R", 3, 3, 3, 4, 3);
        assert_metrics("CR R R", 1, 1, 1, 2, 3);
        assert_metrics("R CU R", 2, 2, 2, 2, 3);
        assert_metrics("CU R R", 1, 1, 1, 2, 3);
        assert_metrics("(R)1", 1, 1, 1, 1, 1);
        assert_metrics("(R)2", 1, 1, 1, 2, 2);
        assert_metrics("(R)3", 1, 1, 1, 1, 3);
        assert_metrics("(R)4", 0, 0, 0, 0, 4);
        assert_metrics("R MR L'", 0, 0, 0, 0, 3);
        assert_metrics("MR2 MF2 MU2", 3, 3, 6, 12, 3);
    }
}

mod interpreting {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn commutation_group_identity() {
        for script in ["[R,U]", "[CU CF,R B]", "[MR,TL]"] {
            let tree = parse(script);
            let mut cube = RubiksCube::new();
            tree.apply(&mut cube, false);
            tree.apply(&mut cube, true);
            assert!(cube.is_solved(), "script: {script:?}");
        }
    }

    #[test]
    fn conjugation_applies_a_b_a_inverse() {
        let conjugated = parse("<CU>R");
        let spelled_out = parse("CU R CU'");
        let mut a = RubiksCube::new();
        conjugated.apply(&mut a, false);
        let mut b = RubiksCube::new();
        spelled_out.apply(&mut b, false);
        assert_eq!(a, b);
    }

    #[test]
    fn rotation_applies_a_inverse_b_a() {
        let rotated = parse("<CU>'R");
        let spelled_out = parse("CU' R CU");
        let mut a = RubiksCube::new();
        rotated.apply(&mut a, false);
        let mut b = RubiksCube::new();
        spelled_out.apply(&mut b, false);
        assert_eq!(a, b);
    }

    #[test]
    fn expansion_replays_like_apply() {
        for script in [
            "R U2 L'",
            "(R U F)3'4",
            "<CU CF>(R B)",
            "[CU CF,R B]",
            "(R' U F)*",
            "(+urf,bru,drb,frd) (+ur,br,dr,fr)",
        ] {
            let tree = parse(script);
            for inverse in [false, true] {
                let mut direct = RubiksCube::new();
                tree.apply(&mut direct, inverse);
                let mut replayed = RubiksCube::new();
                for leaf in tree.expand(inverse) {
                    leaf.apply(&mut replayed);
                }
                assert_eq!(direct, replayed, "script: {script:?} inverse: {inverse}");
            }
        }
    }
}

mod round_trip {
    use super::*;
    use pretty_assertions::assert_eq;

    #[track_caller]
    fn assert_round_trip(notation: &Notation, script: &str) {
        let parser = ScriptParser::new(notation);
        let tree = parser
            .parse(script)
            .unwrap_or_else(|e| panic!("parse {script:?}: {e}"));
        let printed = tree.serialize(notation).expect("serialize");
        let reparsed = parser
            .parse(&printed)
            .unwrap_or_else(|e| panic!("reparse {printed:?} of {script:?}: {e}"));
        assert_eq!(
            tree.expand(false),
            reparsed.expand(false),
            "script: {script:?} printed: {printed:?}"
        );
    }

    #[test]
    fn default_notation_round_trips() {
        for script in [
            "R",
            "R U2 L' MB2",
            "R'",
            "(R U F)'",
            "(R U F)3'4",
            "(R)2",
            "<CU>R",
            "<CU CF>(R B)",
            "<CU>'R",
            "[CU,R]",
            "[CU CF,R B]",
            "(R' U F)*",
            "R . U · F",
            "(+urf,bru,drb,frd) (+ur,br,dr,fr) (+r) (r,b) (++u,d) (++f,+l)",
        ] {
            assert_round_trip(&DEFAULT, script);
        }
    }

    #[test]
    fn preinfix_notation_round_trips() {
        let notation = preinfix_notation();
        for script in ["R U", "3 * R'", "CU conj R", "(CU CF) conj (R U)'"] {
            assert_round_trip(&notation, script);
        }
    }

    #[test]
    fn trees_serialize_under_other_notations() {
        let preinfix = preinfix_notation();
        let parser = ScriptParser::new(&DEFAULT);
        let tree = parser.parse("<CU>(R U)").expect("parses");
        let printed = tree.serialize(&preinfix).expect("serialize");
        let reparsed = ScriptParser::new(&preinfix)
            .parse(&printed)
            .unwrap_or_else(|e| panic!("reparse {printed:?}: {e}"));
        assert_eq!(tree.expand(false), reparsed.expand(false));
    }

    #[test]
    fn permutation_strings_round_trip() {
        let parser = ScriptParser::new(&DEFAULT);
        for script in [
            "",
            "R",
            "R U F' MR2",
            "(R U F)3",
            "[CU,R] <CF>U2",
            "MR MU' SD2",
        ] {
            let tree = parser.parse(script).expect(script);
            let mut cube = RubiksCube::new();
            tree.apply(&mut cube, false);
            let rendered = to_permutation_string(&cube, &DEFAULT);
            let reparsed = parser
                .parse(&rendered)
                .unwrap_or_else(|e| panic!("reparse {rendered:?} of {script:?}: {e}"));
            let mut replayed = RubiksCube::new();
            reparsed.apply(&mut replayed, false);
            assert_eq!(cube, replayed, "script: {script:?} rendered: {rendered:?}");
        }
    }

    #[test]
    fn solved_cube_renders_as_an_empty_cycle() {
        let cube = RubiksCube::new();
        assert_eq!(to_permutation_string(&cube, &DEFAULT), "()");
    }
}

fn script_strategy() -> impl Strategy<Value = String> {
    let leaf = prop::sample::select(vec![
        "R", "U2", "F'", "L", "D'", "B2", "MR", "TL", "SU", "CU", ".",
    ])
    .prop_map(str::to_owned);
    leaf.prop_recursive(3, 24, 4, |inner| {
        let seq = prop::collection::vec(inner, 1..4).prop_map(|v| v.join(" "));
        prop_oneof![
            seq.clone().prop_map(|s| format!("({s})")),
            seq.clone().prop_map(|s| format!("({s})'")),
            (1u32..4, seq.clone()).prop_map(|(n, s)| format!("({s}){n}")),
            (seq.clone(), seq.clone()).prop_map(|(a, b)| format!("[{a},{b}]")),
            (seq.clone(), seq.clone()).prop_map(|(a, b)| format!("<{a}>({b})")),
            seq.prop_map(|s| format!("({s})*")),
        ]
    })
}

proptest! {
    #[test]
    fn generated_scripts_round_trip(script in script_strategy()) {
        let parser = ScriptParser::new(&DEFAULT);
        let tree = parser.parse(&script).expect("parses");
        let printed = tree.serialize(&DEFAULT).expect("serialize");
        let reparsed = parser.parse(&printed).expect("reparses");
        prop_assert_eq!(tree.expand(false), reparsed.expand(false));
    }

    #[test]
    fn expansion_is_idempotent(script in script_strategy()) {
        let tree = ScriptParser::new(&DEFAULT).parse(&script).expect("parses");
        prop_assert_eq!(tree.expand(false), tree.expand(false));
        prop_assert_eq!(tree.expand(true), tree.expand(true));
    }
}
