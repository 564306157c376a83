//! Untyped lambda calculus.
//!
//! Application is juxtaposition and associates to the left; an abstraction
//! body extends as far right as possible.
//!
//! ```text
//! expr -> ID                 priority 10
//!       | ( expr )           priority 10
//!       | expr expr          priority 0, left
//!       | \ ID . expr        priority -1
//! ```

use crate::error::LanguageError;
use crate::grammar::{Grammar, GrammarBuilder, Terminal};
use crate::hybrid::{HybridSpec, LrHybridParser};
use crate::lr::{LrConfig, LrParser};
use crate::pretty::PrettyPrinterContext;
use crate::token::{CompletionItem, SymbolToken, Token};
use compact_str::CompactString;
use std::fmt;

const LAMBDA: &str = "\\";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Term {
    Var(CompactString),
    Paren(Box<Term>),
    App(Box<Term>, Box<Term>),
    Abs { param: CompactString, body: Box<Term> },
}

impl Term {
    #[must_use]
    pub fn var(name: impl Into<CompactString>) -> Self {
        Self::Var(name.into())
    }

    #[must_use]
    pub fn app(function: Self, argument: Self) -> Self {
        Self::App(Box::new(function), Box::new(argument))
    }

    #[must_use]
    pub fn abs(param: impl Into<CompactString>, body: Self) -> Self {
        Self::Abs {
            param: param.into(),
            body: Box::new(body),
        }
    }

    #[must_use]
    pub fn paren(inner: Self) -> Self {
        Self::Paren(Box::new(inner))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(name) => f.write_str(name),
            Self::Paren(inner) => write!(f, "({inner})"),
            Self::App(function, argument) => write!(f, "(app {function} {argument})"),
            Self::Abs { param, body } => write!(f, "(\\{param}. {body})"),
        }
    }
}

struct Terminals {
    id: Terminal,
    symbols: [(&'static str, Terminal); 4],
}

fn identifier<V: fmt::Debug>(token: &Token<V>) -> CompactString {
    match token {
        Token::Identifier(name) => name.clone(),
        other => unreachable!("ID matched {other:?}"),
    }
}

fn build_grammar() -> Result<(Grammar<Token<Term>, Term>, Terminals), LanguageError> {
    let mut g = GrammarBuilder::<Token<Term>, Term>::new();
    let id = g.terminal("ID");
    let open = g.terminal("(");
    let close = g.terminal(")");
    let lambda = g.terminal(LAMBDA);
    let dot = g.terminal(".");
    let expr = g.non_terminal("expr");
    g.start(expr);

    g.rule(expr, [id.into()], |ctx| Term::Var(identifier(ctx.lexeme(0))))
        .priority(10);
    g.rule(expr, [open.into(), expr.into(), close.into()], |ctx| {
        Term::paren(ctx.take(1))
    })
    .priority(10);
    g.rule(expr, [expr.into(), expr.into()], |ctx| {
        let function = ctx.take(0);
        let argument = ctx.take(1);
        Term::app(function, argument)
    })
    .priority(0)
    .left();
    g.rule(
        expr,
        [lambda.into(), id.into(), dot.into(), expr.into()],
        |ctx| {
            let param = identifier(ctx.lexeme(1));
            Term::abs(param, ctx.take(3))
        },
    )
    .priority(-1);

    let terminals = Terminals {
        id,
        symbols: [("(", open), (")", close), (LAMBDA, lambda), (".", dot)],
    };
    Ok((g.build()?, terminals))
}

/// The lambda-calculus language for hybrid editing.
#[derive(Debug)]
pub struct LambdaSpec {
    parser: LrHybridParser<Term>,
    completion: Vec<CompletionItem<Term>>,
}

impl LambdaSpec {
    /// # Errors
    /// Never fails for this grammar; the error type covers grammar and table
    /// construction.
    pub fn new() -> Result<Self, LanguageError> {
        Self::with_config(&LrConfig::default())
    }

    /// # Errors
    /// See [`new`](Self::new).
    pub fn with_config(config: &LrConfig) -> Result<Self, LanguageError> {
        let (grammar, terminals) = build_grammar()?;
        let parser = LrParser::from_grammar(grammar, config)?;
        let parser = LrHybridParser::new(parser, move |token| match token {
            Token::Identifier(_) => Some(terminals.id),
            Token::Symbol(symbol) => terminals
                .symbols
                .iter()
                .find(|(text, _)| *text == symbol.text())
                .map(|(_, terminal)| *terminal),
            _ => None,
        });

        let completion = vec![
            CompletionItem::symbol(SymbolToken::new("(").no_space_right()),
            CompletionItem::symbol(SymbolToken::new(")").no_space_left()),
            CompletionItem::symbol(SymbolToken::new(LAMBDA).no_space_right()),
            CompletionItem::symbol(SymbolToken::new(".").no_space_left()),
            CompletionItem::identifier(),
        ];
        Ok(Self { parser, completion })
    }

    /// The grammar alone, for tools.
    ///
    /// # Errors
    /// See [`new`](Self::new).
    pub fn grammar() -> Result<Grammar<Token<Term>, Term>, LanguageError> {
        build_grammar().map(|(grammar, _)| grammar)
    }
}

impl HybridSpec for LambdaSpec {
    type Value = Term;

    fn parse(&self, tokens: &[Token<Term>]) -> Option<Term> {
        self.parser.parse(tokens)
    }

    fn print(&self, value: &Term, ctx: &mut PrettyPrinterContext<'_, Term>) {
        match value {
            Term::Var(name) => ctx.append(Token::Identifier(name.clone())),
            Term::Paren(inner) => {
                ctx.append(Token::Symbol(SymbolToken::new("(").no_space_right()));
                ctx.append_child(inner);
                ctx.append(Token::Symbol(SymbolToken::new(")").no_space_left()));
            }
            Term::App(function, argument) => {
                ctx.append_child(function);
                ctx.append_child(argument);
            }
            Term::Abs { param, body } => {
                ctx.append(Token::Symbol(SymbolToken::new(LAMBDA).no_space_right()));
                ctx.append(Token::Identifier(param.clone()));
                ctx.append(Token::Symbol(SymbolToken::new(".").no_space_left()));
                ctx.append_child(body);
            }
        }
    }

    fn token_completion(&self, _text: &str) -> Vec<CompletionItem<Term>> {
        self.completion.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hybrid::SpecPrinter;
    use crate::pretty;
    use crate::token::render;

    fn parse(spec: &LambdaSpec, names: &[&str]) -> Option<Term> {
        let tokens: Vec<Token<Term>> = names
            .iter()
            .map(|word| {
                crate::token::complete_unique(&spec.token_completion(word), word)
                    .unwrap_or_else(|| Token::error(*word))
            })
            .collect();
        spec.parse(&tokens)
    }

    #[test]
    fn application_is_left_associative() {
        let spec = LambdaSpec::new().expect("lambda language builds");
        let term = parse(&spec, &["x", "y", "z"]);
        assert_eq!(
            term,
            Some(Term::app(
                Term::app(Term::var("x"), Term::var("y")),
                Term::var("z")
            ))
        );
    }

    #[test]
    fn abstraction_body_extends_right() {
        let spec = LambdaSpec::new().expect("lambda language builds");
        let term = parse(&spec, &["\\", "x", ".", "x", "y"]).expect("parses");
        assert_eq!(term.to_string(), "(\\x. (app x y))");
    }

    #[test]
    fn application_to_abstraction() {
        let spec = LambdaSpec::new().expect("lambda language builds");
        let term = parse(&spec, &["f", "\\", "x", ".", "x"]).expect("parses");
        assert_eq!(term.to_string(), "(app f (\\x. x))");
    }

    #[test]
    fn prints_glued_symbols() {
        let spec = LambdaSpec::new().expect("lambda language builds");
        let term = parse(&spec, &["(", "\\", "x", ".", "x", ")", "y"]).expect("parses");
        let printed = pretty::print(&SpecPrinter(&spec), &term);
        assert_eq!(render(&printed.tokens), "(\\x. x) y");
    }
}
