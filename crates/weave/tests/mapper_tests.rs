//! Token views kept in step with an editor through mappers

use std::sync::Arc;
use weave::demo::arith::{ArithSpec, Expr};
use weave::error::MapperError;
use weave::hybrid::{TokenCell, TokenListEditor, TokenView};
use weave::mapper::{MapperState, MappingContext, RoleSynchronizer};
use weave::token::Token;

fn editor() -> TokenListEditor<ArithSpec> {
    let mut editor = TokenListEditor::new(Arc::new(ArithSpec::new().expect("arith language builds")));
    editor.set_tokens(vec![
        Token::identifier("a"),
        Token::symbol("+"),
        Token::identifier("b"),
    ]);
    editor
}

fn texts(view: &TokenView<ArithSpec>) -> Vec<&str> {
    view.cells().iter().map(|cell| cell.text.as_str()).collect()
}

#[test]
fn test_view_mirrors_tokens() {
    let editor = editor();
    let mut view = TokenView::new();
    view.attach(&editor).expect("attach");

    assert_eq!(texts(&view), ["a", "+", "b"]);
    assert!(view.is_valid());
    let plus = editor.id_at(1).expect("token");
    assert_eq!(
        view.cell(plus),
        Some(&TokenCell {
            text: "+".into(),
            ..TokenCell::default()
        })
    );
}

#[test]
fn test_cells_survive_unrelated_edits() {
    let mut editor = editor();
    let mut view = TokenView::new();
    view.attach(&editor).expect("attach");

    let a = editor.id_at(0).expect("token");
    let b = editor.id_at(2).expect("token");
    let a_cell = view.cell_mapper(a);
    let b_cell = view.cell_mapper(b);

    editor.insert_token(2, Token::symbol("("));
    view.refresh(&editor).expect("refresh");

    assert_eq!(texts(&view), ["a", "+", "(", "b"]);
    assert!(!view.is_valid());
    assert_eq!(view.cell_mapper(a), a_cell);
    assert_eq!(view.cell_mapper(b), b_cell);
}

#[test]
fn test_replaced_token_gets_a_new_cell() {
    let mut editor = editor();
    let mut view = TokenView::new();
    view.attach(&editor).expect("attach");

    let b = editor.id_at(2).expect("token");
    editor
        .operations()
        .after_type(b, "b?", 2)
        .expect("typed");
    view.refresh(&editor).expect("refresh");

    assert_eq!(view.cell(b), None);
    let replacement = editor.id_at(2).expect("token");
    let cell = view.cell(replacement).expect("cell");
    assert_eq!(cell.text, "b?");
    assert!(cell.is_error);
}

#[test]
fn test_value_edit_rebuilds_every_cell() {
    let mut editor = editor();
    let mut view = TokenView::new();
    view.attach(&editor).expect("attach");
    let old_ids = editor.token_ids().to_vec();

    editor.set_value(Some(Expr::Embedded(Box::new(Expr::id("z")))));
    view.refresh(&editor).expect("refresh");

    assert_eq!(view.cells().len(), 1);
    assert!(view.cells()[0].is_value);
    assert!(old_ids.iter().all(|id| view.cell(*id).is_none()));
}

#[test]
fn test_detach_clears_the_view() {
    let editor = editor();
    let mut view = TokenView::new();
    view.attach(&editor).expect("attach");
    view.detach().expect("detach");

    assert!(view.cells().is_empty());
    assert_eq!(view.refresh(&editor), Err(MapperError::NotAttached(0)));
    assert_eq!(view.detach(), Err(MapperError::NotAttached(0)));
}

#[test]
fn test_role_synchronizer_over_plain_source() {
    type Names = Vec<String>;

    fn names(list: &[&str]) -> Names {
        list.iter().map(|name| (*name).to_string()).collect()
    }

    let mut source = names(&["x", "y"]);
    let mut ctx: MappingContext<Names, String, usize> = MappingContext::new();
    let root = ctx
        .attach_root(&source, "root".to_string(), 0)
        .expect("root");
    let role = RoleSynchronizer::new(
        |source: &Names| source.clone(),
        |_: &Names, key: &String| key.len(),
    );
    ctx.add_synchronizer(&source, root, Box::new(role))
        .expect("synchronizer");

    let x = ctx.mapper(&"x".to_string()).expect("x");
    source = names(&["yy", "x"]);
    ctx.refresh(&source, root).expect("refresh");

    let keys: Vec<&String> = ctx
        .children(root)
        .iter()
        .filter_map(|child| ctx.key(*child))
        .collect();
    assert_eq!(keys, ["yy", "x"]);
    assert_eq!(ctx.target(x), Some(&1));
    assert_eq!(ctx.mapper(&"x".to_string()), Some(x));
    assert_eq!(ctx.mapper(&"y".to_string()), None);
    assert_eq!(ctx.parent(x), Some(root));
    assert_eq!(ctx.state(x), Some(MapperState::Attached));
}
