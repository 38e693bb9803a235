//! Token mutations on a session's token list.
//!
//! These methods only touch the list. Authorization is checked before
//! they are called (see [`authorize`](crate::authorize)), and deciding who
//! hears about a change is the room layer's job.

use gridtable_protocol::{Token, TokenId};

use crate::{Session, SessionError};

impl Session {
    /// Appends `token` to the end of the list.
    ///
    /// # Errors
    /// Returns [`SessionError::DuplicateToken`] if a token with the same
    /// id is already present. The list is unchanged.
    pub fn add_token(&mut self, token: Token) -> Result<&Token, SessionError> {
        if self.tokens.iter().any(|t| t.id == token.id) {
            return Err(SessionError::DuplicateToken(token.id));
        }
        self.tokens.push(token);
        Ok(&self.tokens[self.tokens.len() - 1])
    }

    /// Moves the first token with `id` to `(col, row)` in place.
    ///
    /// Returns `None` when no such token exists.
    pub fn move_token(&mut self, id: TokenId, col: i64, row: i64) -> Option<&Token> {
        let token = self.tokens.iter_mut().find(|t| t.id == id)?;
        token.col = col;
        token.row = row;
        Some(token)
    }

    /// Removes the first token with `id` and returns it.
    pub fn remove_token(&mut self, id: TokenId) -> Option<Token> {
        let index = self.tokens.iter().position(|t| t.id == id)?;
        Some(self.tokens.remove(index))
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }
}
