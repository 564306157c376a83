//! Arithmetic expressions over identifiers and integers.
//!
//! ```text
//! expr -> ID | INT | VALUE | ( expr )
//!       | expr + expr | expr - expr      priority 4, left
//!       | expr * expr | expr / expr      priority 5, left
//!       | expr ^ expr                    priority 6, right
//! ```

use crate::error::LanguageError;
use crate::grammar::{Associativity, Grammar, GrammarBuilder, RuleContext, Terminal};
use crate::hybrid::{HybridSpec, LrHybridParser};
use crate::lr::{LrConfig, LrParser};
use crate::pretty::PrettyPrinterContext;
use crate::token::{CompletionItem, SymbolToken, Token};
use compact_str::CompactString;
use std::fmt;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    pub const ALL: [Self; 5] = [Self::Add, Self::Sub, Self::Mul, Self::Div, Self::Pow];

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
        }
    }

    #[must_use]
    pub const fn priority(self) -> i32 {
        match self {
            Self::Add | Self::Sub => 4,
            Self::Mul | Self::Div => 5,
            Self::Pow => 6,
        }
    }

    #[must_use]
    pub const fn associativity(self) -> Associativity {
        match self {
            Self::Pow => Associativity::Right,
            _ => Associativity::Left,
        }
    }

    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An arithmetic expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    Id(CompactString),
    Int(i64),
    /// A sub-expression carried by a value token.
    Embedded(Box<Expr>),
    Paren(Box<Expr>),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    #[must_use]
    pub fn id(name: impl Into<CompactString>) -> Self {
        Self::Id(name.into())
    }

    #[must_use]
    pub fn binary(op: BinOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn paren(inner: Self) -> Self {
        Self::Paren(Box::new(inner))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(name) => f.write_str(name),
            Self::Int(value) => write!(f, "{value}"),
            Self::Embedded(inner) => write!(f, "[{inner}]"),
            Self::Paren(inner) => write!(f, "({inner})"),
            Self::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
        }
    }
}

struct Terminals {
    id: Terminal,
    int: Terminal,
    value: Terminal,
    symbols: Vec<(&'static str, Terminal)>,
}

impl Terminals {
    fn classify(&self, token: &Token<Expr>) -> Option<Terminal> {
        match token {
            Token::Identifier(_) => Some(self.id),
            Token::Int(_) => Some(self.int),
            Token::Value(_) => Some(self.value),
            Token::Symbol(symbol) => self
                .symbols
                .iter()
                .find(|(text, _)| *text == symbol.text())
                .map(|(_, terminal)| *terminal),
            Token::Bool(_) | Token::Str(_) | Token::Error(_) => None,
        }
    }
}

fn binary(op: BinOp) -> impl Fn(&mut RuleContext<'_, Token<Expr>, Expr>) -> Expr {
    move |ctx| {
        let left = ctx.take(0);
        let right = ctx.take(2);
        Expr::binary(op, left, right)
    }
}

fn build_grammar() -> Result<(Grammar<Token<Expr>, Expr>, Terminals), LanguageError> {
    let mut g = GrammarBuilder::<Token<Expr>, Expr>::new();
    let id = g.terminal("ID");
    let int = g.terminal("INT");
    let value = g.terminal("VALUE");
    let open = g.terminal("(");
    let close = g.terminal(")");
    let operators = BinOp::ALL.map(|op| (op, g.terminal(op.symbol())));
    let expr = g.non_terminal("expr");
    g.start(expr);

    g.rule(expr, [id.into()], |ctx| match ctx.take_lexeme(0) {
        Token::Identifier(name) => Expr::Id(name),
        other => unreachable!("ID matched {other:?}"),
    });
    g.rule(expr, [int.into()], |ctx| match ctx.take_lexeme(0) {
        Token::Int(value) => Expr::Int(value),
        other => unreachable!("INT matched {other:?}"),
    });
    g.rule(expr, [value.into()], |ctx| match ctx.take_lexeme(0) {
        Token::Value(inner) => Expr::Embedded(Box::new(inner)),
        other => unreachable!("VALUE matched {other:?}"),
    });
    g.rule(expr, [open.into(), expr.into(), close.into()], |ctx| {
        Expr::paren(ctx.take(1))
    });
    for (op, operator) in operators {
        g.rule(expr, [expr.into(), operator.into(), expr.into()], binary(op))
            .priority(op.priority())
            .associativity(op.associativity());
    }

    let mut symbols = vec![("(", open), (")", close)];
    symbols.extend(operators.map(|(op, terminal)| (op.symbol(), terminal)));
    let terminals = Terminals {
        id,
        int,
        value,
        symbols,
    };
    Ok((g.build()?, terminals))
}

/// The arithmetic language for hybrid editing.
#[derive(Debug)]
pub struct ArithSpec {
    parser: LrHybridParser<Expr>,
    completion: Vec<CompletionItem<Expr>>,
}

impl ArithSpec {
    /// Build with the default LR(1) table.
    ///
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
        let parser = LrHybridParser::new(parser, move |token| terminals.classify(token));

        let mut completion = vec![
            CompletionItem::symbol(SymbolToken::new("(").no_space_right()),
            CompletionItem::symbol(SymbolToken::new(")").no_space_left()),
        ];
        completion.extend(BinOp::ALL.map(|op| CompletionItem::symbol(SymbolToken::new(op.symbol()))));
        completion.push(CompletionItem::identifier());
        completion.push(CompletionItem::int());

        Ok(Self { parser, completion })
    }

    /// The grammar alone, for tools.
    ///
    /// # Errors
    /// See [`new`](Self::new).
    pub fn grammar() -> Result<Grammar<Token<Expr>, Expr>, LanguageError> {
        build_grammar().map(|(grammar, _)| grammar)
    }

    #[must_use]
    pub const fn parser(&self) -> &LrHybridParser<Expr> {
        &self.parser
    }
}

impl HybridSpec for ArithSpec {
    type Value = Expr;

    fn parse(&self, tokens: &[Token<Expr>]) -> Option<Expr> {
        self.parser.parse(tokens)
    }

    fn print(&self, value: &Expr, ctx: &mut PrettyPrinterContext<'_, Expr>) {
        match value {
            Expr::Id(name) => ctx.append(Token::Identifier(name.clone())),
            Expr::Int(value) => ctx.append(Token::Int(*value)),
            Expr::Embedded(inner) => ctx.append(Token::Value((**inner).clone())),
            Expr::Paren(inner) => {
                ctx.append(Token::Symbol(SymbolToken::new("(").no_space_right()));
                ctx.append_child(inner);
                ctx.append(Token::Symbol(SymbolToken::new(")").no_space_left()));
            }
            Expr::Binary { op, left, right } => {
                ctx.append_child(left);
                ctx.append(Token::symbol(op.symbol()));
                ctx.append_child(right);
            }
        }
    }

    fn token_completion(&self, _text: &str) -> Vec<CompletionItem<Expr>> {
        self.completion.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pretty;
    use crate::token::render;
    use crate::hybrid::SpecPrinter;

    fn tokens(text: &str) -> Vec<Token<Expr>> {
        let spec = ArithSpec::new().expect("arith language builds");
        text.split_whitespace()
            .map(|word| {
                crate::token::complete_unique(&spec.token_completion(word), word)
                    .unwrap_or_else(|| Token::error(word))
            })
            .collect()
    }

    #[test]
    fn precedence_and_associativity() {
        let spec = ArithSpec::new().expect("arith language builds");
        let parsed = spec.parse(&tokens("a + b * c ^ d ^ e - f"));
        let expected = "((a + (b * (c ^ (d ^ e)))) - f)";
        assert_eq!(parsed.map(|e| e.to_string()).as_deref(), Some(expected));
    }

    #[test]
    fn parens_print_glued() {
        let spec = ArithSpec::new().expect("arith language builds");
        let value = spec.parse(&tokens("( a + 1 ) * b")).expect("parses");
        let printed = pretty::print(&SpecPrinter(&spec), &value);
        assert_eq!(render(&printed.tokens), "(a + 1) * b");
    }

    #[test]
    fn value_tokens_embed() {
        let spec = ArithSpec::new().expect("arith language builds");
        let inner = Expr::binary(BinOp::Add, Expr::id("p"), Expr::id("q"));
        let parsed = spec.parse(&[
            Token::Value(inner.clone()),
            Token::symbol("*"),
            Token::identifier("r"),
        ]);
        assert_eq!(
            parsed,
            Some(Expr::binary(
                BinOp::Mul,
                Expr::Embedded(Box::new(inner)),
                Expr::id("r")
            ))
        );
    }

    #[test]
    fn error_tokens_do_not_parse() {
        let spec = ArithSpec::new().expect("arith language builds");
        assert_eq!(spec.parse(&tokens("a + ?")), None);
    }

    #[test]
    fn every_table_algorithm_accepts_the_grammar() {
        for algorithm in [
            crate::lr::TableAlgorithm::Lr1,
            crate::lr::TableAlgorithm::Lalr1,
            crate::lr::TableAlgorithm::Slr,
        ] {
            let config = LrConfig::with_algorithm(algorithm);
            assert!(ArithSpec::with_config(&config).is_ok(), "{algorithm:?}");
        }
    }

    #[test]
    #[should_panic(expected = "ID matched")]
    fn misclassified_lexeme_is_a_bug() {
        let grammar = ArithSpec::grammar().expect("arith grammar");
        let id = grammar.terminal("ID").expect("ID terminal");
        let parser = LrParser::from_grammar(grammar, &LrConfig::default()).expect("table builds");
        let _ = parser.parse([crate::lr::Lexeme::new(id, Token::Bool(true))]);
    }
}
