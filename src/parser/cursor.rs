use crate::error::SourceLocation;
use crate::lexer::{Token, TokenKind};

/// Lookahead and consumption over a token stream.
///
/// The stream always ends in `Eof`; the cursor never moves past it.
pub struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenCursor {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            let location = tokens.last().map(|t| t.location).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                location,
            });
        }
        Self { tokens, pos: 0 }
    }

    /// Token `n` places ahead of the cursor
    pub fn peek(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    pub fn peek_kind(&self, n: usize) -> Option<&TokenKind> {
        self.peek(n).map(|t| &t.kind)
    }

    /// Compare by kind only; literal payloads are ignored
    pub fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind(0)
            .map(|k| std::mem::discriminant(k) == std::mem::discriminant(kind))
            .unwrap_or(false)
    }

    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if self.more_tokens() {
            self.pos += 1;
        }
        token
    }

    /// Consume the next token if it has the given kind
    pub fn match_and_remove(&mut self, kind: &TokenKind) -> Option<Token> {
        if self.check(kind) { self.advance() } else { None }
    }

    pub fn more_tokens(&self) -> bool {
        !matches!(self.peek_kind(0), None | Some(TokenKind::Eof))
    }

    /// Consume a run of separators, reporting whether there was one
    pub fn accept_separators(&mut self) -> bool {
        let mut found = false;
        while self.match_and_remove(&TokenKind::Separator).is_some() {
            found = true;
        }
        found
    }

    pub fn location(&self) -> SourceLocation {
        self.peek(0).map(|t| t.location).unwrap_or_default()
    }

    pub fn save(&self) -> usize {
        self.pos
    }

    pub fn restore(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len().saturating_sub(1));
    }
}
