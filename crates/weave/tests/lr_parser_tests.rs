//! End-to-end tests for LR table generation and parsing

use std::sync::Arc;
use weave::error::{GrammarError, TableError};
use weave::grammar::{Grammar, GrammarBuilder, Symbol};
use weave::lr::{Action, ConflictKind, Lexeme, LrConfig, LrParser, LrTable, TableAlgorithm};

/// `num` is a single digit; `+ -` priority 4 left, `*` 5 left, `^` 6 right.
fn calculator() -> Grammar<char, i64> {
    let mut g = GrammarBuilder::<char, i64>::new();
    let num = g.terminal("num");
    let plus = g.terminal("+");
    let minus = g.terminal("-");
    let times = g.terminal("*");
    let pow = g.terminal("^");
    let open = g.terminal("(");
    let close = g.terminal(")");
    let expr = g.non_terminal("expr");
    g.start(expr);

    let e = Symbol::from(expr);
    g.rule(expr, [e, plus.into(), e], |ctx| ctx.take(0) + ctx.take(2))
        .priority(4)
        .left();
    g.rule(expr, [e, minus.into(), e], |ctx| ctx.take(0) - ctx.take(2))
        .priority(4)
        .left();
    g.rule(expr, [e, times.into(), e], |ctx| ctx.take(0) * ctx.take(2))
        .priority(5)
        .left();
    g.rule(expr, [e, pow.into(), e], |ctx| {
        let base = ctx.take(0);
        let exponent = ctx.take(2);
        base.pow(u32::try_from(exponent).unwrap_or(0))
    })
    .priority(6)
    .right();
    g.rule(expr, [open.into(), e, close.into()], |ctx| ctx.take(1));
    g.rule(expr, [num.into()], |ctx| {
        ctx.lexeme(0).to_digit(10).map_or(0, i64::from)
    });
    g.build().expect("calculator grammar is valid")
}

fn lex(grammar: &Grammar<char, i64>, text: &str) -> Vec<Lexeme<char>> {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| {
            let name = if c.is_ascii_digit() {
                "num".to_string()
            } else {
                c.to_string()
            };
            let terminal = grammar.terminal(&name).expect("known terminal");
            Lexeme::new(terminal, c)
        })
        .collect()
}

fn eval(parser: &LrParser<char, i64>, text: &str) -> Option<i64> {
    parser.parse(lex(parser.grammar(), text))
}

#[test]
fn test_operator_precedence() {
    let parser = LrParser::from_grammar(calculator(), &LrConfig::default()).expect("table");
    assert_eq!(eval(&parser, "2 + 3 * 4"), Some(14));
    assert_eq!(eval(&parser, "2 * 3 + 4"), Some(10));
    assert_eq!(eval(&parser, "(2 + 3) * 4"), Some(20));
}

#[test]
fn test_associativity() {
    let parser = LrParser::from_grammar(calculator(), &LrConfig::default()).expect("table");
    assert_eq!(eval(&parser, "9 - 3 - 2"), Some(4));
    assert_eq!(eval(&parser, "2 ^ 3 ^ 2"), Some(512));
    assert_eq!(eval(&parser, "2 * 2 ^ 3"), Some(16));
}

#[test]
fn test_parse_errors_return_none() {
    let parser = LrParser::from_grammar(calculator(), &LrConfig::default()).expect("table");
    assert_eq!(eval(&parser, "2 +"), None);
    assert_eq!(eval(&parser, "(2"), None);
    assert_eq!(eval(&parser, "2 3"), None);
    assert_eq!(eval(&parser, ""), None);
}

#[test]
fn test_all_algorithms_agree_on_calculator() {
    let inputs = ["1+2*3", "(1+2)*3", "2^3^2-1", "9-3-2*2"];
    let mut results = Vec::new();
    for algorithm in [TableAlgorithm::Lr1, TableAlgorithm::Lalr1, TableAlgorithm::Slr] {
        let config = LrConfig::with_algorithm(algorithm);
        let parser = LrParser::from_grammar(calculator(), &config).expect("table");
        assert_eq!(parser.table().algorithm(), algorithm);
        results.push(inputs.map(|input| eval(&parser, input)));
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[1], results[2]);
}

#[test]
fn test_lalr_has_no_more_states_than_lr1() {
    let grammar = calculator();
    let lr1 = LrTable::generate(&grammar, &LrConfig::default()).expect("lr1");
    let lalr = LrTable::generate(&grammar, &LrConfig::with_algorithm(TableAlgorithm::Lalr1))
        .expect("lalr");
    assert!(lalr.state_count() <= lr1.state_count());
}

#[test]
fn test_resolutions_are_recorded() {
    let grammar = calculator();
    let table = weave::lr::generate(&grammar).expect("table");
    let plus = grammar.terminal("+").expect("+");
    let times = grammar.terminal("*").expect("*");

    assert!(!table.resolutions().is_empty());
    assert!(table
        .resolutions()
        .iter()
        .all(|r| r.kind == ConflictKind::ShiftReduce));
    // After `expr + expr`, `*` shifts and `+` reduces.
    let after_sum = table
        .resolutions()
        .iter()
        .find(|r| r.terminal == times && matches!(r.chosen, Action::Shift(_)))
        .map(|r| r.state)
        .expect("a state where `*` beats a reduction");
    assert!(matches!(table.action(after_sum, plus), Action::Reduce(_)));
}

#[test]
fn test_unresolved_shift_reduce_is_an_error() {
    let mut g = GrammarBuilder::<char, i64>::new();
    let num = g.terminal("num");
    let plus = g.terminal("+");
    let expr = g.non_terminal("expr");
    g.start(expr);
    g.rule(expr, [expr.into(), plus.into(), expr.into()], |ctx| {
        ctx.take(0) + ctx.take(2)
    });
    g.rule(expr, [num.into()], |_| 1);
    let grammar = g.build().expect("grammar");

    let err = LrTable::generate(&grammar, &LrConfig::default()).expect_err("ambiguous");
    assert!(matches!(err, TableError::ShiftReduce { ref terminal, .. } if terminal == "+"));
}

#[test]
fn test_grammar_errors_surface_from_builder() {
    let mut g = GrammarBuilder::<char, ()>::new();
    let a = g.non_terminal("a");
    let b = g.non_terminal("b");
    let x = g.terminal("x");
    g.start(a);
    g.rule(a, [x.into()], |_| ());
    g.rule(b, [x.into()], |_| ());
    assert_eq!(
        g.build().map(|_| ()),
        Err(GrammarError::UnreachableNonTerminal("b".into()))
    );

    let g = GrammarBuilder::<char, ()>::new();
    assert_eq!(g.build().map(|_| ()), Err(GrammarError::MissingStart));
}

#[test]
fn test_shared_table_across_threads() {
    let parser = LrParser::from_grammar(calculator(), &LrConfig::default()).expect("table");
    let table = Arc::clone(parser.table());
    let inputs = ["1+1", "2*3", "2^2^2", "(1+2)*(3+4)"];

    let results: Vec<Option<i64>> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| {
                let parser = parser.clone();
                scope.spawn(move || eval(&parser, input))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("parser thread"))
            .collect()
    });

    assert_eq!(results, vec![Some(2), Some(6), Some(16), Some(21)]);
    assert!(Arc::ptr_eq(&table, parser.table()));
}
