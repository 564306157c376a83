//! Property-based tests for parsing, printing and table generation

#![cfg(test)]

use proptest::prelude::*;
use std::sync::Arc;
use weave::demo::arith::{ArithSpec, BinOp, Expr};
use weave::hybrid::{HybridSpec, SpecPrinter, TokenListEditor};
use weave::lr::{LrConfig, LrTable, TableAlgorithm};
use weave::pretty;
use weave::token::{render, SymbolToken, Token};

fn operand() -> impl Strategy<Value = Vec<Token<Expr>>> {
    prop_oneof![
        "[a-e]{1,3}".prop_map(|name| vec![Token::identifier(name)]),
        (0i64..1000).prop_map(|value| vec![Token::Int(value)]),
    ]
}

/// Well-formed infix token sequences, possibly parenthesized.
fn expression() -> impl Strategy<Value = Vec<Token<Expr>>> {
    operand().prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(BinOp::ALL.to_vec()), inner.clone()).prop_map(
                |(mut left, op, right)| {
                    left.push(Token::symbol(op.symbol()));
                    left.extend(right);
                    left
                }
            ),
            inner.prop_map(|tokens| {
                let mut wrapped = vec![Token::Symbol(SymbolToken::new("(").no_space_right())];
                wrapped.extend(tokens);
                wrapped.push(Token::Symbol(SymbolToken::new(")").no_space_left()));
                wrapped
            }),
        ]
    })
}

fn spec() -> Arc<ArithSpec> {
    Arc::new(ArithSpec::new().expect("arith language builds"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_well_formed_tokens_parse(tokens in expression()) {
        let spec = spec();
        prop_assert!(spec.parse(&tokens).is_some());
    }

    #[test]
    fn prop_print_is_inverse_of_parse(tokens in expression()) {
        let spec = spec();
        let value = spec.parse(&tokens).expect("well-formed");
        let printed = pretty::print(&SpecPrinter(&*spec), &value);

        prop_assert_eq!(printed.tokens.len(), tokens.len());
        prop_assert_eq!(&printed.tokens, &tokens);
        prop_assert_eq!(spec.parse(&printed.tokens), Some(value));
    }

    #[test]
    fn prop_editor_reprint_is_stable(tokens in expression()) {
        let spec = spec();
        let mut editor = TokenListEditor::new(Arc::clone(&spec));
        editor.set_tokens(tokens);
        prop_assert!(editor.is_valid());

        let value = editor.value().cloned();
        let text = render(editor.tokens());
        editor.set_value(value.clone());
        prop_assert_eq!(render(editor.tokens()), text);
        prop_assert_eq!(editor.value().cloned(), value);
    }

    #[test]
    fn prop_algorithms_agree(tokens in expression()) {
        let results: Vec<Option<Expr>> = [TableAlgorithm::Lr1, TableAlgorithm::Lalr1, TableAlgorithm::Slr]
            .into_iter()
            .map(|algorithm| {
                ArithSpec::with_config(&LrConfig::with_algorithm(algorithm))
                    .expect("arith language builds")
                    .parse(&tokens)
            })
            .collect();
        prop_assert_eq!(&results[0], &results[1]);
        prop_assert_eq!(&results[1], &results[2]);
    }

    #[test]
    fn prop_dropping_a_token_never_panics(tokens in expression(), at in any::<prop::sample::Index>()) {
        let spec = spec();
        let mut editor = TokenListEditor::new(spec);
        editor.set_tokens(tokens);
        let before = editor.value().cloned();

        editor.remove_token(at.index(editor.len()));
        if !editor.is_valid() {
            prop_assert_eq!(editor.value().cloned(), before);
        }
    }
}

#[test]
fn table_generation_is_deterministic() {
    let grammar = ArithSpec::grammar().expect("grammar");
    for algorithm in [TableAlgorithm::Lr1, TableAlgorithm::Lalr1, TableAlgorithm::Slr] {
        let config = LrConfig::with_algorithm(algorithm);
        let first = LrTable::generate(&grammar, &config).expect("table");
        let second = LrTable::generate(&grammar, &config).expect("table");
        assert_eq!(first, second, "{algorithm:?}");
    }
}
