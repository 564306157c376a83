//! Caret-aware edits on a [`TokenListEditor`].
//!
//! Each operation names the token it acts on by [`TokenId`], mutates the
//! editor's tokens (which reparses) and returns the [`Focus`] the
//! presentation layer should move the caret to.

use crate::error::EditorError;
use crate::hybrid::{HybridSpec, TokenId, TokenListEditor};
use crate::token::{complete_unique, Token};

/// Caret position inside a token's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Caret {
    Home,
    End,
    /// Offset in characters from the start of the text.
    Offset(usize),
}

/// Where the caret goes after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Focus {
    Token { index: usize, caret: Caret },
    /// The region has no tokens left.
    EmptyRegion,
}

impl Focus {
    #[must_use]
    pub const fn token(index: usize, caret: Caret) -> Self {
        Self::Token { index, caret }
    }
}

type Result<T> = std::result::Result<T, EditorError>;

/// Token edits bound to one editor.
#[derive(Debug)]
pub struct TokenOperations<'e, S: HybridSpec> {
    editor: &'e mut TokenListEditor<S>,
}

impl<'e, S: HybridSpec> TokenOperations<'e, S> {
    pub(crate) fn new(editor: &'e mut TokenListEditor<S>) -> Self {
        Self { editor }
    }

    fn index(&self, id: TokenId) -> Result<usize> {
        self.editor
            .index_of(id)
            .ok_or(EditorError::UnknownToken(id))
    }

    fn neighbor(&self, index: usize, delta: isize) -> Result<usize> {
        index
            .checked_add_signed(delta)
            .filter(|&at| at < self.editor.len())
            .ok_or(EditorError::NoNeighbor { index, delta })
    }

    fn complete(&self, text: &str) -> Option<Token<S::Value>> {
        let items = self.editor.spec().token_completion(text);
        complete_unique(&items, text)
    }

    fn complete_or_error(&self, text: &str) -> Token<S::Value> {
        self.complete(text).unwrap_or_else(|| Token::error(text))
    }

    /// Delete the token `delta` positions away from `id`.
    ///
    /// # Errors
    /// [`EditorError::UnknownToken`] for a stale id and
    /// [`EditorError::NoNeighbor`] when there is no token at that offset.
    pub fn delete_token(&mut self, id: TokenId, delta: isize) -> Result<Focus> {
        let index = self.index(id)?;
        let target = self.neighbor(index, delta)?;
        self.editor.remove_token(target);

        if self.editor.is_empty() {
            return Ok(Focus::EmptyRegion);
        }
        let focus = if delta < 0 {
            Focus::token(target, Caret::Home)
        } else if delta > 0 {
            Focus::token(index, Caret::End)
        } else if index > 0 {
            Focus::token(index - 1, Caret::End)
        } else {
            Focus::token(0, Caret::Home)
        };
        Ok(focus)
    }

    /// Whether `id` can be merged with its neighbour at `delta` (±1).
    ///
    /// A missing neighbour is `false`; value tokens never merge.
    ///
    /// # Errors
    /// [`EditorError::UnknownToken`] for a stale id and
    /// [`EditorError::InvalidDelta`] for a delta other than ±1.
    pub fn can_merge(&self, id: TokenId, delta: isize) -> Result<bool> {
        if delta != 1 && delta != -1 {
            return Err(EditorError::InvalidDelta(delta));
        }
        let index = self.index(id)?;
        let Ok(other) = self.neighbor(index, delta) else {
            return Ok(false);
        };
        let tokens = self.editor.tokens();
        Ok(!tokens[index].is_value() && !tokens[other].is_value())
    }

    /// Merge `id` with its neighbour at `delta` (±1) into one token.
    ///
    /// The joined text becomes the unique completion for it, or an error
    /// token when nothing (or more than one item) matches. The caret lands at
    /// the old boundary inside the merged token.
    ///
    /// # Errors
    /// [`EditorError::UnknownToken`], [`EditorError::InvalidDelta`],
    /// [`EditorError::NoNeighbor`], or [`EditorError::NotMergeable`] when
    /// either token is a value token.
    pub fn merge_tokens(&mut self, id: TokenId, delta: isize) -> Result<Focus> {
        if delta != 1 && delta != -1 {
            return Err(EditorError::InvalidDelta(delta));
        }
        let index = self.index(id)?;
        let other = self.neighbor(index, delta)?;
        let (left, right) = (index.min(other), index.max(other));

        let tokens = self.editor.tokens();
        if tokens[left].is_value() || tokens[right].is_value() {
            return Err(EditorError::NotMergeable { left, right });
        }
        let left_text = tokens[left].text();
        let boundary = left_text.chars().count();
        let text = format!("{left_text}{}", tokens[right].text());

        let merged = self.complete_or_error(&text);
        tracing::trace!(%text, error = merged.is_error(), "merged tokens");
        self.editor.splice(left..right + 1, vec![merged]);
        Ok(Focus::token(left, Caret::Offset(boundary)))
    }

    /// Re-tokenize `id` after the user typed into it.
    ///
    /// `text` is the token's full text after typing and `caret` the caret
    /// position (in characters) just after the typed character. In order:
    ///
    /// 1. a typed space splits the token in two at the caret;
    /// 2. the whole text completes to one token;
    /// 3. a 2-way split at the caret, then just before the typed character;
    /// 4. a 3-way split isolating the typed character;
    /// 5. otherwise the token becomes an error token with the typed text.
    ///
    /// # Errors
    /// [`EditorError::UnknownToken`] for a stale id and
    /// [`EditorError::InvalidCaret`] when `caret` is not in `1..=len`.
    pub fn after_type(&mut self, id: TokenId, text: &str, caret: usize) -> Result<Focus> {
        let index = self.index(id)?;
        let len = text.chars().count();
        if caret == 0 || caret > len {
            return Err(EditorError::InvalidCaret { caret, len });
        }
        let typed_at = byte_offset(text, caret - 1);
        let after_typed = byte_offset(text, caret);
        let typed = &text[typed_at..after_typed];

        if typed.chars().all(char::is_whitespace) {
            return Ok(self.split_on_space(index, &text[..typed_at], &text[after_typed..]));
        }

        if let Some(token) = self.complete(text) {
            self.editor.set_token(index, token);
            return Ok(Focus::token(index, Caret::Offset(caret)));
        }

        if let Some([left, right]) = self.split(&[&text[..after_typed], &text[after_typed..]]) {
            self.editor.splice(index..index + 1, vec![left, right]);
            return Ok(Focus::token(index, Caret::End));
        }
        if let Some([left, right]) = self.split(&[&text[..typed_at], &text[typed_at..]]) {
            self.editor.splice(index..index + 1, vec![left, right]);
            return Ok(Focus::token(index + 1, Caret::Offset(1)));
        }
        if let Some([left, middle, right]) =
            self.split(&[&text[..typed_at], typed, &text[after_typed..]])
        {
            self.editor.splice(index..index + 1, vec![left, middle, right]);
            return Ok(Focus::token(index + 1, Caret::End));
        }

        tracing::trace!(%text, "typed text does not complete");
        self.editor.set_token(index, Token::error(text));
        Ok(Focus::token(index, Caret::Offset(caret)))
    }

    fn split_on_space(&mut self, index: usize, left: &str, right: &str) -> Focus {
        match (left.is_empty(), right.is_empty()) {
            (true, true) => {
                self.editor.remove_token(index);
                if self.editor.is_empty() {
                    Focus::EmptyRegion
                } else if index > 0 {
                    Focus::token(index - 1, Caret::End)
                } else {
                    Focus::token(0, Caret::Home)
                }
            }
            (true, false) => {
                let token = self.complete_or_error(right);
                self.editor.set_token(index, token);
                Focus::token(index, Caret::Home)
            }
            (false, true) => {
                let token = self.complete_or_error(left);
                self.editor.set_token(index, token);
                if index + 1 < self.editor.len() {
                    Focus::token(index + 1, Caret::Home)
                } else {
                    Focus::token(index, Caret::End)
                }
            }
            (false, false) => {
                let tokens = vec![self.complete_or_error(left), self.complete_or_error(right)];
                self.editor.splice(index..index + 1, tokens);
                Focus::token(index + 1, Caret::Home)
            }
        }
    }

    /// Complete every part, or `None` if any part is empty or unmatched.
    fn split<const N: usize>(&self, parts: &[&str; N]) -> Option<[Token<S::Value>; N]> {
        if parts.iter().any(|part| part.is_empty()) {
            return None;
        }
        let tokens = parts
            .iter()
            .map(|part| self.complete(part))
            .collect::<Option<Vec<_>>>()?;
        tokens.try_into().ok()
    }

    /// Insert an error token holding `text` next to `id`: before it for
    /// `delta == 0`, after it for `delta == 1`.
    ///
    /// # Errors
    /// [`EditorError::UnknownToken`] for a stale id and
    /// [`EditorError::InvalidDelta`] for any other delta.
    pub fn expand_to_error(&mut self, id: TokenId, text: &str, delta: isize) -> Result<Focus> {
        let index = self.index(id)?;
        let at = match delta {
            0 => index,
            1 => index + 1,
            _ => return Err(EditorError::InvalidDelta(delta)),
        };
        self.editor.insert_token(at, Token::error(text));
        Ok(Focus::token(at, Caret::End))
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(offset, _)| offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::arith::{ArithSpec, Expr};
    use std::sync::Arc;

    fn editor(tokens: Vec<Token<Expr>>) -> TokenListEditor<ArithSpec> {
        let mut editor =
            TokenListEditor::new(Arc::new(ArithSpec::new().expect("arith language builds")));
        editor.set_tokens(tokens);
        editor
    }

    #[test]
    fn byte_offsets_follow_chars() {
        assert_eq!(byte_offset("aé+", 0), 0);
        assert_eq!(byte_offset("aé+", 2), 3);
        assert_eq!(byte_offset("aé+", 3), 4);
    }

    #[test]
    fn stale_ids_are_rejected() {
        let mut editor = editor(vec![Token::identifier("a")]);
        let id = editor.id_at(0).expect("one token");
        editor.set_token(0, Token::identifier("b"));
        assert_eq!(
            editor.operations().delete_token(id, 0),
            Err(EditorError::UnknownToken(id))
        );
    }

    #[test]
    fn invalid_caret() {
        let mut editor = editor(vec![Token::identifier("a")]);
        let id = editor.id_at(0).expect("one token");
        assert_eq!(
            editor.operations().after_type(id, "ab", 3),
            Err(EditorError::InvalidCaret { caret: 3, len: 2 })
        );
    }

    #[test]
    fn expand_to_error_rejects_other_deltas() {
        let mut editor = editor(vec![Token::identifier("a")]);
        let id = editor.id_at(0).expect("one token");
        assert_eq!(
            editor.operations().expand_to_error(id, "?", -1),
            Err(EditorError::InvalidDelta(-1))
        );
        assert_eq!(
            editor.operations().expand_to_error(id, "?", 1),
            Ok(Focus::token(1, Caret::End))
        );
        assert_eq!(editor.token(1), Some(&Token::error("?")));
        assert!(!editor.is_valid());
    }
}
