//! Token list / value synchronization through the public editor API

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use weave::demo::arith::{ArithSpec, BinOp, Expr};
use weave::demo::lambda::{LambdaSpec, Term};
use weave::hybrid::{EditorEvent, HybridSpec, SyncState, TokenListEditor};
use weave::token::{complete_unique, render, Token};

fn arith() -> Arc<ArithSpec> {
    Arc::new(ArithSpec::new().expect("arith language builds"))
}

fn tokens<S: HybridSpec>(spec: &S, text: &str) -> Vec<Token<S::Value>> {
    text.split_whitespace()
        .map(|word| {
            complete_unique(&spec.token_completion(word), word).unwrap_or_else(|| Token::error(word))
        })
        .collect()
}

#[test]
fn test_incomplete_input_keeps_tokens_and_last_value() {
    let spec = arith();
    let mut editor = TokenListEditor::new(Arc::clone(&spec));
    editor.set_tokens(tokens(&*spec, "a"));
    assert!(editor.is_valid());
    assert_eq!(editor.value(), Some(&Expr::id("a")));

    editor.insert_token(1, Token::symbol("+"));
    assert!(!editor.is_valid());
    assert_eq!(render(editor.tokens()), "a +");
    assert_eq!(editor.value(), Some(&Expr::id("a")));
    assert!(editor.parse_node().is_none());

    editor.insert_token(2, Token::Int(1));
    assert!(editor.is_valid());
    assert_eq!(
        editor.value(),
        Some(&Expr::binary(BinOp::Add, Expr::id("a"), Expr::Int(1)))
    );
}

#[test]
fn test_value_round_trips_through_tokens() {
    let spec = arith();
    let value = Expr::binary(
        BinOp::Mul,
        Expr::paren(Expr::binary(BinOp::Sub, Expr::id("x"), Expr::Int(3))),
        Expr::binary(BinOp::Pow, Expr::id("y"), Expr::Int(2)),
    );
    let mut editor = TokenListEditor::with_value(Arc::clone(&spec), value.clone());
    assert_eq!(render(editor.tokens()), "(x - 3) * y ^ 2");
    assert_eq!(editor.printed_tokens(), editor.tokens());

    // Feeding the printed tokens back parses to the same value.
    let printed = editor.save_state();
    let mut other = TokenListEditor::new(spec);
    other.set_tokens(printed);
    assert!(other.is_valid());
    assert_eq!(other.value(), Some(&value));
}

#[test]
fn test_reprint_is_idempotent() {
    let spec = arith();
    let mut editor = TokenListEditor::new(spec);
    editor.set_tokens(vec![
        Token::identifier("a"),
        Token::symbol("*"),
        Token::symbol("("),
        Token::identifier("b"),
        Token::symbol("+"),
        Token::Int(4),
        Token::symbol(")"),
    ]);
    assert!(editor.is_valid());
    assert_eq!(render(editor.tokens()), "a * ( b + 4 )");

    editor.update_to_printed_tokens();
    let once = editor.tokens().to_vec();
    assert_eq!(render(&once), "a * (b + 4)");

    editor.update_to_printed_tokens();
    assert_eq!(editor.tokens(), once.as_slice());
    assert_eq!(editor.printed_tokens(), once.as_slice());
}

#[test]
fn test_value_edit_replaces_tokens_and_ids() {
    let spec = arith();
    let mut editor = TokenListEditor::new(Arc::clone(&spec));
    editor.set_tokens(tokens(&*spec, "a + b"));
    let before = editor.token_ids().to_vec();

    let changed = editor.update_value(|value| {
        if let Expr::Binary { op, .. } = value {
            *op = BinOp::Div;
        }
    });
    assert!(changed);
    assert_eq!(render(editor.tokens()), "a / b");
    assert!(editor
        .token_ids()
        .iter()
        .all(|id| !before.contains(id)));
    assert_eq!(editor.state(), SyncState::Idle);
}

#[test]
fn test_update_value_without_value_is_a_no_op() {
    let mut editor = TokenListEditor::new(arith());
    assert!(!editor.update_value(|_| unreachable!()));
    assert!(editor.is_empty());
}

#[test]
fn test_clearing_value_clears_tokens() {
    let mut editor = TokenListEditor::with_value(arith(), Expr::id("q"));
    assert_eq!(editor.len(), 1);
    editor.set_value(None);
    assert!(editor.is_empty());
    assert!(editor.is_valid());
    assert!(editor.printed_tokens().is_empty());
}

#[test]
fn test_undo_through_snapshots() {
    let spec = arith();
    let mut editor = TokenListEditor::new(Arc::clone(&spec));
    editor.set_tokens(tokens(&*spec, "a * b"));
    let snapshot = editor.save_state();

    editor.remove_token(2);
    assert!(!editor.is_valid());

    editor.restore_state(Some(snapshot));
    assert!(editor.is_valid());
    assert_eq!(render(editor.tokens()), "a * b");
    assert_eq!(editor.state(), SyncState::Idle);
}

#[test]
fn test_events_for_a_failed_then_fixed_edit() {
    let spec = arith();
    let mut editor = TokenListEditor::new(Arc::clone(&spec));
    editor.set_tokens(tokens(&*spec, "a"));

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    editor.subscribe(move |event: &EditorEvent<Expr>| {
        let label = match event {
            EditorEvent::TokensChanged(tokens) => format!("tokens:{}", render(tokens)),
            EditorEvent::ValueChanged(value) => {
                format!("value:{}", value.as_ref().map_or(String::new(), ToString::to_string))
            }
            EditorEvent::ValidityChanged(valid) => format!("valid:{valid}"),
        };
        sink.borrow_mut().push(label);
    });

    editor.insert_token(1, Token::symbol("-"));
    editor.insert_token(2, Token::identifier("b"));

    assert_eq!(
        *events.borrow(),
        vec![
            "tokens:a -",
            "valid:false",
            "tokens:a - b",
            "value:(a - b)",
            "valid:true",
        ]
    );
}

#[test]
fn test_lambda_editor_tracks_sub_value_ranges() {
    let spec = Arc::new(LambdaSpec::new().expect("lambda language builds"));
    let mut editor = TokenListEditor::new(Arc::clone(&spec));
    editor.set_tokens(tokens(&*spec, "f ( \\ x . x )"));
    assert!(editor.is_valid());

    let abs = Term::abs("x", Term::var("x"));
    assert_eq!(editor.token_range_of(&abs), Some(2..6));
    assert_eq!(editor.value_at(0), Some(&Term::var("f")));

    editor.update_to_printed_tokens();
    assert_eq!(render(editor.tokens()), "f (\\x. x)");
}
