use crate::hybrid::ops::TokenOperations;
use crate::hybrid::{HybridSpec, SpecPrinter, TokenId};
use crate::observable::{Listeners, Registration};
use crate::pretty::{self, ParseNode};
use crate::token::Token;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Which synchronization, if any, is running.
///
/// A token mutation reparses only from `Idle`, and a value mutation reprints
/// only from `Idle`, so a reprint caused by a reparse (or the reverse) never
/// feeds back into another round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Reparsing,
    Reprinting,
    Restoring,
}

/// Change notifications delivered to editor subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent<V> {
    TokensChanged(Vec<Token<V>>),
    ValueChanged(Option<V>),
    ValidityChanged(bool),
}

/// Owns a live token list and the value parsed from it.
///
/// - Token mutations (`set_tokens`, `insert_token`, `splice`, ...) reparse.
///   On success the value is replaced and `valid` is set; on failure `valid`
///   is cleared while the tokens and the last good value are kept, so
///   half-typed text stays editable.
/// - Value mutations (`set_value`, `update_value`) reprint, replacing the
///   token list with the canonical printed form.
pub struct TokenListEditor<S: HybridSpec> {
    spec: Arc<S>,
    tokens: Vec<Token<S::Value>>,
    ids: Vec<TokenId>,
    next_id: u64,
    value: Option<S::Value>,
    valid: bool,
    printed_tokens: Vec<Token<S::Value>>,
    parse_node: Option<ParseNode<S::Value>>,
    state: SyncState,
    listeners: Listeners<EditorEvent<S::Value>>,
}

impl<S: HybridSpec> fmt::Debug for TokenListEditor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenListEditor")
            .field("tokens", &self.tokens)
            .field("value", &self.value)
            .field("valid", &self.valid)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S: HybridSpec> TokenListEditor<S> {
    #[must_use]
    pub fn new(spec: Arc<S>) -> Self {
        Self {
            spec,
            tokens: Vec::new(),
            ids: Vec::new(),
            next_id: 0,
            value: None,
            valid: true,
            printed_tokens: Vec::new(),
            parse_node: None,
            state: SyncState::Idle,
            listeners: Listeners::new(),
        }
    }

    /// An editor showing the printed form of `value`.
    #[must_use]
    pub fn with_value(spec: Arc<S>, value: S::Value) -> Self {
        let mut editor = Self::new(spec);
        editor.set_value(Some(value));
        editor
    }

    #[must_use]
    pub fn spec(&self) -> &Arc<S> {
        &self.spec
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token<S::Value>] {
        &self.tokens
    }

    #[must_use]
    pub fn token(&self, index: usize) -> Option<&Token<S::Value>> {
        self.tokens.get(index)
    }

    /// Ids of the live tokens, parallel to [`tokens`](Self::tokens).
    #[must_use]
    pub fn token_ids(&self) -> &[TokenId] {
        &self.ids
    }

    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<TokenId> {
        self.ids.get(index).copied()
    }

    #[must_use]
    pub fn index_of(&self, id: TokenId) -> Option<usize> {
        self.ids.iter().position(|live| *live == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The bound value; after a failed reparse this is the last good value.
    #[must_use]
    pub const fn value(&self) -> Option<&S::Value> {
        self.value.as_ref()
    }

    /// Whether the last reparse succeeded.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Canonical printed form of the value from the last successful sync.
    #[must_use]
    pub fn printed_tokens(&self) -> &[Token<S::Value>] {
        &self.printed_tokens
    }

    #[must_use]
    pub const fn parse_node(&self) -> Option<&ParseNode<S::Value>> {
        self.parse_node.as_ref()
    }

    #[must_use]
    pub const fn state(&self) -> SyncState {
        self.state
    }

    /// Token range printed for `value` (a sub-value of the bound value).
    #[must_use]
    pub fn token_range_of(&self, value: &S::Value) -> Option<Range<usize>> {
        self.parse_node.as_ref()?.token_range_of(value)
    }

    /// Innermost sub-value that printed the token at `index`.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<&S::Value> {
        self.parse_node
            .as_ref()?
            .innermost_at(index)
            .map(ParseNode::value)
    }

    /// Caret-aware token edits on this editor.
    pub fn operations(&mut self) -> TokenOperations<'_, S> {
        TokenOperations::new(self)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> Registration
    where
        F: FnMut(&EditorEvent<S::Value>) + 'static,
    {
        self.listeners.add(listener)
    }

    pub fn unsubscribe(&mut self, registration: Registration) -> bool {
        self.listeners.remove(registration)
    }

    // Token mutations

    pub fn set_tokens(&mut self, tokens: Vec<Token<S::Value>>) {
        let len = self.tokens.len();
        self.splice(0..len, tokens);
    }

    /// # Panics
    /// Panics if `index > len`.
    pub fn insert_token(&mut self, index: usize, token: Token<S::Value>) {
        self.splice(index..index, vec![token]);
    }

    /// # Panics
    /// Panics if `index > len`.
    pub fn insert_tokens(&mut self, index: usize, tokens: Vec<Token<S::Value>>) {
        self.splice(index..index, tokens);
    }

    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove_token(&mut self, index: usize) -> Token<S::Value> {
        let removed = self.tokens[index].clone();
        self.splice(index..index + 1, Vec::new());
        removed
    }

    /// Replace the token at `index`; the new token gets a new id.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn set_token(&mut self, index: usize, token: Token<S::Value>) {
        self.splice(index..index + 1, vec![token]);
    }

    /// Replace `range` with `tokens` as a single mutation (one reparse).
    ///
    /// # Panics
    /// Panics if `range` is out of bounds.
    pub fn splice(&mut self, range: Range<usize>, tokens: Vec<Token<S::Value>>) {
        let fresh: Vec<TokenId> = tokens.iter().map(|_| self.fresh_id()).collect();
        self.ids.splice(range.clone(), fresh);
        self.tokens.splice(range, tokens);
        self.on_tokens_changed();
    }

    // Value mutations

    pub fn set_value(&mut self, value: Option<S::Value>) {
        self.value = value;
        self.on_value_changed();
    }

    /// Mutate the bound value in place and reprint.
    ///
    /// Returns `false` (and does nothing) when there is no value.
    pub fn update_value<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut S::Value),
    {
        let Some(value) = self.value.as_mut() else {
            return false;
        };
        f(value);
        self.on_value_changed();
        true
    }

    // Synchronization

    fn on_tokens_changed(&mut self) {
        self.notify_tokens();
        if self.state == SyncState::Idle {
            self.state = SyncState::Reparsing;
            self.reparse();
            self.state = SyncState::Idle;
        }
    }

    fn on_value_changed(&mut self) {
        self.notify_value();
        if self.state == SyncState::Idle {
            self.state = SyncState::Reprinting;
            self.update();
            self.state = SyncState::Idle;
        }
    }

    /// Tokens → value.
    ///
    /// # Panics
    /// Panics if the printed form of a successfully parsed value has a
    /// different number of tokens than the input: the language's printer and
    /// parser are not inverses.
    pub fn reparse(&mut self) {
        if self.tokens.is_empty() {
            self.printed_tokens.clear();
            self.parse_node = None;
            self.replace_value(None);
            self.set_valid(true);
            return;
        }

        match self.spec.parse(&self.tokens) {
            Some(value) => {
                let printed = pretty::print(&SpecPrinter(&*self.spec), &value);
                assert!(
                    printed.tokens.len() == self.tokens.len(),
                    "printed {} tokens for a parsed list of {} tokens; printer and parser disagree",
                    printed.tokens.len(),
                    self.tokens.len(),
                );
                self.printed_tokens = printed.tokens;
                self.parse_node = Some(printed.parse_node);
                self.replace_value(Some(value));
                self.set_valid(true);
                tracing::trace!(tokens = self.tokens.len(), "reparsed");
            }
            None => {
                tracing::debug!(tokens = self.tokens.len(), "reparse failed");
                self.parse_node = None;
                self.set_valid(false);
            }
        }
    }

    /// Value → tokens: replace the token list with the printed form.
    pub fn update(&mut self) {
        match &self.value {
            Some(value) => {
                let printed = pretty::print(&SpecPrinter(&*self.spec), value);
                self.ids = printed.tokens.iter().map(|_| self.fresh_id()).collect();
                self.tokens = printed.tokens.clone();
                self.printed_tokens = printed.tokens;
                self.parse_node = Some(printed.parse_node);
            }
            None => {
                self.ids.clear();
                self.tokens.clear();
                self.printed_tokens.clear();
                self.parse_node = None;
            }
        }
        tracing::trace!(tokens = self.tokens.len(), "reprinted");
        self.set_valid(true);
        self.notify_tokens();
    }

    /// Overwrite live tokens that differ from the canonical printed form.
    ///
    /// Only applies while valid. Positions where either side is a value token
    /// are left alone. Ids are kept and no reparse happens.
    pub fn update_to_printed_tokens(&mut self) {
        if !self.valid {
            return;
        }
        let mut changed = false;
        for (live, printed) in self.tokens.iter_mut().zip(&self.printed_tokens) {
            if live.is_value() || printed.is_value() || live == printed {
                continue;
            }
            *live = printed.clone();
            changed = true;
        }
        if changed {
            self.notify_tokens();
        }
    }

    /// Snapshot of the tokens for undo.
    #[must_use]
    pub fn save_state(&self) -> Vec<Token<S::Value>> {
        self.tokens.clone()
    }

    /// Restore a snapshot taken with [`save_state`](Self::save_state).
    ///
    /// With a snapshot the tokens are replaced verbatim and reparsed. Without
    /// one, an invalid editor is reset to the printed form of its last good
    /// value.
    ///
    /// # Panics
    /// Panics if called while a restore is already running.
    pub fn restore_state(&mut self, snapshot: Option<Vec<Token<S::Value>>>) {
        assert!(
            self.state != SyncState::Restoring,
            "restore_state called while already restoring"
        );
        let previous = self.state;
        self.state = SyncState::Restoring;
        match snapshot {
            Some(tokens) => {
                self.ids = tokens.iter().map(|_| self.fresh_id()).collect();
                self.tokens = tokens;
                self.notify_tokens();
                self.reparse();
            }
            None => {
                if !self.valid {
                    self.update();
                }
            }
        }
        self.state = previous;
    }

    fn fresh_id(&mut self) -> TokenId {
        let id = TokenId(self.next_id);
        self.next_id += 1;
        id
    }

    fn replace_value(&mut self, value: Option<S::Value>) {
        if self.value != value {
            self.value = value;
            self.notify_value();
        }
    }

    fn set_valid(&mut self, valid: bool) {
        if self.valid != valid {
            self.valid = valid;
            if !self.listeners.is_empty() {
                self.listeners.fire(&EditorEvent::ValidityChanged(valid));
            }
        }
    }

    fn notify_tokens(&mut self) {
        if !self.listeners.is_empty() {
            self.listeners
                .fire(&EditorEvent::TokensChanged(self.tokens.clone()));
        }
    }

    fn notify_value(&mut self) {
        if !self.listeners.is_empty() {
            self.listeners
                .fire(&EditorEvent::ValueChanged(self.value.clone()));
        }
    }
}
