use crate::token::{SymbolToken, Token};
use compact_str::CompactString;
use std::fmt;
use std::sync::Arc;

type TextPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;
type TokenFactory<V> = Arc<dyn Fn(&str) -> Token<V> + Send + Sync>;

enum Matcher {
    Exact(CompactString),
    Predicate {
        full: TextPredicate,
        prefix: TextPredicate,
    },
}

/// One way a piece of typed text can become a token.
///
/// Exact items cover symbols and keywords; predicate items cover open
/// classes such as identifiers and numbers.
pub struct CompletionItem<V> {
    label: CompactString,
    matcher: Matcher,
    factory: TokenFactory<V>,
}

impl<V> Clone for CompletionItem<V> {
    fn clone(&self) -> Self {
        let matcher = match &self.matcher {
            Matcher::Exact(text) => Matcher::Exact(text.clone()),
            Matcher::Predicate { full, prefix } => Matcher::Predicate {
                full: Arc::clone(full),
                prefix: Arc::clone(prefix),
            },
        };
        Self {
            label: self.label.clone(),
            matcher,
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<V> fmt::Debug for CompletionItem<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionItem")
            .field("label", &self.label)
            .field("exact", &matches!(self.matcher, Matcher::Exact(_)))
            .finish_non_exhaustive()
    }
}

impl<V: 'static> CompletionItem<V> {
    /// Matches exactly `text` and produces `token`.
    pub fn exact(text: impl Into<CompactString>, token: Token<V>) -> Self
    where
        V: Clone + Send + Sync,
    {
        let text = text.into();
        Self {
            label: text.clone(),
            matcher: Matcher::Exact(text),
            factory: Arc::new(move |_| token.clone()),
        }
    }

    /// A symbol token with its spacing rules.
    #[must_use]
    pub fn symbol(symbol: SymbolToken) -> Self {
        let text = CompactString::from(symbol.text());
        Self {
            label: text.clone(),
            matcher: Matcher::Exact(text),
            factory: Arc::new(move |_| Token::Symbol(symbol.clone())),
        }
    }

    /// Matches any text accepted by `full`; `prefix` accepts text that can
    /// still grow into a match.
    pub fn predicate<F, P, M>(label: impl Into<CompactString>, full: F, prefix: P, make: M) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
        P: Fn(&str) -> bool + Send + Sync + 'static,
        M: Fn(&str) -> Token<V> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            matcher: Matcher::Predicate {
                full: Arc::new(full),
                prefix: Arc::new(prefix),
            },
            factory: Arc::new(make),
        }
    }

    /// Identifiers: a letter or `_` followed by letters, digits or `_`.
    #[must_use]
    pub fn identifier() -> Self {
        Self::predicate("identifier", is_identifier, is_identifier, |text| {
            Token::identifier(text)
        })
    }

    /// Like [`identifier`](Self::identifier) but never matching one of `reserved`.
    #[must_use]
    pub fn identifier_except(reserved: &'static [&'static str]) -> Self {
        Self::predicate(
            "identifier",
            move |text| is_identifier(text) && !reserved.iter().any(|word| *word == text),
            is_identifier,
            |text| Token::identifier(text),
        )
    }

    /// Non-negative decimal integers that fit an `i64`.
    #[must_use]
    pub fn int() -> Self {
        Self::predicate(
            "integer",
            |text| is_digits(text) && text.parse::<i64>().is_ok(),
            |text| text.is_empty() || is_digits(text),
            |text| text.parse().map_or_else(|_| Token::error(text), Token::Int),
        )
    }

    /// `true` and `false`.
    #[must_use]
    pub fn bool() -> Self {
        Self::predicate(
            "boolean",
            |text| text == "true" || text == "false",
            |text| "true".starts_with(text) || "false".starts_with(text),
            |text| Token::Bool(text == "true"),
        )
    }

    /// Double-quoted strings without escapes.
    #[must_use]
    pub fn string() -> Self {
        Self::predicate(
            "string",
            |text| {
                text.len() >= 2
                    && text.starts_with('"')
                    && text.ends_with('"')
                    && !text[1..text.len() - 1].contains('"')
            },
            |text| {
                text.is_empty()
                    || (text.starts_with('"') && !text[1..].trim_end_matches('"').contains('"'))
            },
            |text| {
                let inner = text.strip_prefix('"').unwrap_or(text);
                Token::Str(inner.strip_suffix('"').unwrap_or(inner).into())
            },
        )
    }
}

impl<V> CompletionItem<V> {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether `text` completes to this item as it stands.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Exact(exact) => exact.as_str() == text,
            Matcher::Predicate { full, .. } => full(text),
        }
    }

    /// Whether `text` could still grow into a match.
    #[must_use]
    pub fn is_prefix_match(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Exact(exact) => exact.starts_with(text),
            Matcher::Predicate { prefix, .. } => prefix(text),
        }
    }

    /// Build the token for `text`; only meaningful when [`is_match`](Self::is_match) holds.
    #[must_use]
    pub fn complete(&self, text: &str) -> Token<V> {
        (self.factory)(text)
    }
}

/// Complete `text` when exactly one item matches it.
#[must_use]
pub fn complete_unique<V>(items: &[CompletionItem<V>], text: &str) -> Option<Token<V>> {
    let mut matches = items.iter().filter(|item| item.is_match(text));
    match (matches.next(), matches.next()) {
        (Some(item), None) => Some(item.complete(text)),
        _ => None,
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<CompletionItem<()>> {
        vec![
            CompletionItem::symbol(SymbolToken::new("+")),
            CompletionItem::symbol(SymbolToken::new("++")),
            CompletionItem::identifier_except(&["let"]),
            CompletionItem::exact("let", Token::symbol("let")),
            CompletionItem::int(),
            CompletionItem::bool(),
            CompletionItem::string(),
        ]
    }

    #[test]
    fn unique_completion() {
        let items = items();
        assert_eq!(complete_unique(&items, "xyz"), Some(Token::identifier("xyz")));
        assert_eq!(complete_unique(&items, "42"), Some(Token::Int(42)));
        assert_eq!(complete_unique(&items, "+"), Some(Token::symbol("+")));
        assert_eq!(complete_unique(&items, "let"), Some(Token::symbol("let")));
        assert_eq!(complete_unique(&items, "\"a b\""), Some(Token::Str("a b".into())));
        assert_eq!(complete_unique(&items, "x+"), None);
        assert_eq!(complete_unique(&items, ""), None);
    }

    #[test]
    fn ambiguous_completion_is_rejected() {
        // `true` is both an identifier and a boolean here.
        let items = items();
        assert_eq!(complete_unique(&items, "true"), None);
    }

    #[test]
    fn prefix_matches() {
        let plus = CompletionItem::<()>::symbol(SymbolToken::new("++"));
        assert!(plus.is_prefix_match("+"));
        assert!(!plus.is_match("+"));
        assert!(CompletionItem::<()>::int().is_prefix_match(""));
        assert!(CompletionItem::<()>::string().is_prefix_match("\"ab"));
        assert!(!CompletionItem::<()>::int().is_prefix_match("1a"));
    }

    #[test]
    fn int_overflow_does_not_complete() {
        let int = CompletionItem::<()>::int();
        assert!(!int.is_match("99999999999999999999"));
    }
}
