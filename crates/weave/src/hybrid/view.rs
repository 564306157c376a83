//! Presentation cells for an editor's tokens.

use crate::error::MapperError;
use crate::hybrid::{HybridSpec, TokenId, TokenListEditor};
use crate::mapper::{MapperId, MappingContext, PropertySynchronizer, RoleSynchronizer};
use crate::token::Token;

/// What the presentation layer shows for one token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCell {
    pub text: String,
    pub is_error: bool,
    pub is_value: bool,
    pub no_space_to_left: bool,
    pub no_space_to_right: bool,
}

impl TokenCell {
    #[must_use]
    pub fn from_token<V>(token: &Token<V>) -> Self {
        Self {
            text: token.text().into_owned(),
            is_error: token.is_error(),
            is_value: token.is_value(),
            no_space_to_left: token.no_space_to_left(),
            no_space_to_right: token.no_space_to_right(),
        }
    }

    fn for_id<S: HybridSpec>(editor: &TokenListEditor<S>, id: TokenId) -> Self {
        editor
            .index_of(id)
            .and_then(|index| editor.token(index))
            .map(Self::from_token)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKey {
    Row,
    Token(TokenId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewNode {
    Row { valid: bool },
    Cell(TokenCell),
}

/// A row of [`TokenCell`]s mirroring a [`TokenListEditor`].
///
/// Cells are keyed by [`TokenId`], so a refresh after an edit keeps the cells
/// of untouched tokens and only builds cells for new ones.
pub struct TokenView<S: HybridSpec> {
    context: MappingContext<TokenListEditor<S>, ViewKey, ViewNode>,
    row: Option<MapperId>,
}

impl<S: HybridSpec> std::fmt::Debug for TokenView<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenView")
            .field("cells", &self.cells())
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl<S: HybridSpec> Default for TokenView<S> {
    fn default() -> Self {
        Self {
            context: MappingContext::new(),
            row: None,
        }
    }
}

impl<S: HybridSpec + 'static> TokenView<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the row for `editor`, replacing any previous one.
    ///
    /// # Errors
    /// Mapper lifecycle errors; none occur for a fresh view.
    pub fn attach(&mut self, editor: &TokenListEditor<S>) -> Result<(), MapperError> {
        if self.row.is_some() {
            self.detach()?;
        }
        let row = self.context.attach_root(
            editor,
            ViewKey::Row,
            ViewNode::Row {
                valid: editor.is_valid(),
            },
        )?;
        let validity = PropertySynchronizer::new(|editor: &TokenListEditor<S>, node: &mut ViewNode| {
            if let ViewNode::Row { valid } = node {
                *valid = editor.is_valid();
            }
        });
        self.context.add_synchronizer(editor, row, Box::new(validity))?;

        let cells = RoleSynchronizer::new(
            |editor: &TokenListEditor<S>| {
                editor
                    .token_ids()
                    .iter()
                    .map(|id| ViewKey::Token(*id))
                    .collect()
            },
            |editor: &TokenListEditor<S>, key: &ViewKey| match key {
                ViewKey::Token(id) => ViewNode::Cell(TokenCell::for_id(editor, *id)),
                ViewKey::Row => ViewNode::Row {
                    valid: editor.is_valid(),
                },
            },
        )
        .with_update(|editor: &TokenListEditor<S>, key: &ViewKey, node: &mut ViewNode| {
            if let (ViewKey::Token(id), ViewNode::Cell(cell)) = (key, node) {
                *cell = TokenCell::for_id(editor, *id);
            }
        });
        self.context.add_synchronizer(editor, row, Box::new(cells))?;

        self.row = Some(row);
        Ok(())
    }

    /// Bring the cells up to date with `editor`.
    ///
    /// # Errors
    /// [`MapperError::NotAttached`] if the view was never attached.
    pub fn refresh(&mut self, editor: &TokenListEditor<S>) -> Result<(), MapperError> {
        let row = self.row.ok_or(MapperError::NotAttached(0))?;
        self.context.refresh(editor, row)
    }

    /// Drop the row and all its cells.
    ///
    /// # Errors
    /// [`MapperError::NotAttached`] if the view is not attached.
    pub fn detach(&mut self) -> Result<(), MapperError> {
        let row = self.row.take().ok_or(MapperError::NotAttached(0))?;
        self.context.detach(row)
    }
}

impl<S: HybridSpec> TokenView<S> {
    #[must_use]
    pub fn cells(&self) -> Vec<&TokenCell> {
        let Some(row) = self.row else {
            return Vec::new();
        };
        self.context
            .children(row)
            .iter()
            .filter_map(|child| match self.context.target(*child) {
                Some(ViewNode::Cell(cell)) => Some(cell),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn cell(&self, id: TokenId) -> Option<&TokenCell> {
        let mapper = self.context.mapper(&ViewKey::Token(id))?;
        match self.context.target(mapper)? {
            ViewNode::Cell(cell) => Some(cell),
            ViewNode::Row { .. } => None,
        }
    }

    /// Mapper backing the cell of `id`; stable across refreshes.
    #[must_use]
    pub fn cell_mapper(&self, id: TokenId) -> Option<MapperId> {
        self.context.mapper(&ViewKey::Token(id))
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.row
            .and_then(|row| self.context.target(row))
            .map_or(true, |node| matches!(node, ViewNode::Row { valid: true }))
    }
}
