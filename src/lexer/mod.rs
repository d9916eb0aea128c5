mod tokens;

pub use tokens::{Token, TokenKind, keyword_to_token, one_char_symbol, two_char_symbol};

use crate::error::{Error, Result};

/// Turns script source into a flat token stream terminated by `Eof`
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire source, returning all tokens
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let estimated_tokens = self.source.len() / 4 + 1;
        let mut tokens = Vec::with_capacity(estimated_tokens.min(1024));

        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let (line, col) = (self.line, self.column);

        let Some((_, ch)) = self.peek_char() else {
            return Ok(Token::new(TokenKind::Eof, line, col));
        };

        match ch {
            '"' => self.scan_string(),
            '`' => self.scan_pattern(),
            '0'..='9' => self.scan_number(),
            '.' if self.peek_next_is_digit() => self.scan_number(),
            c if c.is_alphabetic() || c == '_' => Ok(self.scan_word()),
            _ => self.scan_symbol(ch),
        }
    }

    fn peek_char(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn peek_next_is_digit(&self) -> bool {
        let mut chars = self.chars.clone();
        chars.next();
        chars.next().map(|(_, c)| c.is_ascii_digit()).unwrap_or(false)
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((_, ch)) = result {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    /// Byte offset of the next unread character
    fn offset(&mut self) -> usize {
        self.chars.peek().map(|(pos, _)| *pos).unwrap_or(self.source.len())
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some((_, ch)) = self.peek_char() {
            match ch {
                '\n' => break,
                '#' => {
                    while let Some((_, c)) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                c if c.is_whitespace() => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    /// Escapes are kept as written: `\n` stays a backslash and an `n`.
    fn scan_string(&mut self) -> Result<Token> {
        let (line, col) = (self.line, self.column);
        self.advance();

        let mut value = String::new();
        loop {
            match self.advance() {
                Some((_, '"')) => break,
                Some((_, '\\')) => {
                    value.push('\\');
                    match self.advance() {
                        Some((_, c)) => value.push(c),
                        None => return Err(Error::lexer("unterminated string literal", line, col)),
                    }
                }
                Some((_, c)) => value.push(c),
                None => return Err(Error::lexer("unterminated string literal", line, col)),
            }
        }

        Ok(Token::new(TokenKind::StringLiteral(value), line, col))
    }

    fn scan_pattern(&mut self) -> Result<Token> {
        let (line, col) = (self.line, self.column);
        self.advance();

        let start = self.offset();
        loop {
            match self.advance() {
                Some((pos, '`')) => {
                    let text = self.source[start..pos].to_string();
                    return Ok(Token::new(TokenKind::Pattern(text), line, col));
                }
                Some(_) => {}
                None => return Err(Error::lexer("unterminated pattern literal", line, col)),
            }
        }
    }

    /// Digits with at most one `.`. A run glued to a letter (`3A`) becomes a word.
    fn scan_number(&mut self) -> Result<Token> {
        let (line, col) = (self.line, self.column);
        let start = self.offset();
        let mut seen_dot = false;

        while let Some((_, ch)) = self.peek_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if matches!(self.peek_char(), Some((_, c)) if c.is_alphabetic()) {
            self.consume_word_chars();
            let text = self.source[start..self.offset()].to_string();
            return Ok(Token::new(TokenKind::Word(text), line, col));
        }

        let text = self.source[start..self.offset()].to_string();
        Ok(Token::new(TokenKind::Number(text), line, col))
    }

    fn scan_word(&mut self) -> Token {
        let (line, col) = (self.line, self.column);
        let start = self.offset();
        self.consume_word_chars();
        let word = &self.source[start..self.offset()];

        let kind = keyword_to_token(word).unwrap_or_else(|| TokenKind::Word(word.to_string()));
        Token::new(kind, line, col)
    }

    fn consume_word_chars(&mut self) {
        while let Some((_, ch)) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_symbol(&mut self, first: char) -> Result<Token> {
        let (line, col) = (self.line, self.column);

        let mut lookahead = self.chars.clone();
        lookahead.next();
        if let Some((_, second)) = lookahead.next()
            && let Some(kind) = two_char_symbol(first, second)
        {
            self.advance();
            self.advance();
            return Ok(Token::new(kind, line, col));
        }

        match one_char_symbol(first) {
            Some(kind) => {
                self.advance();
                Ok(Token::new(kind, line, col))
            }
            None => Err(Error::lexer(
                format!("unrecognized character '{}'", first),
                line,
                col,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_words_and_numbers() {
        let tokens = Lexer::new("remove these 4 tokens").tokenize().unwrap();
        let rendered: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        assert_eq!(rendered, ["WORD(remove)", "WORD(these)", "NUMBER(4)", "WORD(tokens)", "EOF"]);
    }

    #[test]
    fn test_separators() {
        let k = kinds("a;b\nc");
        assert_eq!(
            k,
            vec![
                TokenKind::Word("a".into()),
                TokenKind::Separator,
                TokenKind::Word("b".into()),
                TokenKind::Separator,
                TokenKind::Word("c".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        let k = kinds("BEGIN END if else while for print function nextfile");
        assert!(matches!(k[0], TokenKind::Begin));
        assert!(matches!(k[1], TokenKind::End));
        assert!(matches!(k[2], TokenKind::If));
        assert!(matches!(k[3], TokenKind::Else));
        assert!(matches!(k[4], TokenKind::While));
        assert!(matches!(k[5], TokenKind::For));
        assert!(matches!(k[6], TokenKind::Print));
        assert!(matches!(k[7], TokenKind::Function));
        assert!(matches!(k[8], TokenKind::Nextfile));
        assert!(k.iter().take(9).all(|t| t.is_keyword()));
    }

    #[test]
    fn test_numbers() {
        let k = kinds("42 3.14 .5 1.2.3");
        assert_eq!(k[0], TokenKind::Number("42".into()));
        assert_eq!(k[1], TokenKind::Number("3.14".into()));
        assert_eq!(k[2], TokenKind::Number(".5".into()));
        // a second dot ends the number
        assert_eq!(k[3], TokenKind::Number("1.2".into()));
        assert_eq!(k[4], TokenKind::Number(".3".into()));
    }

    #[test]
    fn test_number_followed_by_letter_is_word() {
        let k = kinds("3A 12abc_9");
        assert_eq!(k[0], TokenKind::Word("3A".into()));
        assert_eq!(k[1], TokenKind::Word("12abc_9".into()));
    }

    #[test]
    fn test_strings_keep_escapes() {
        let k = kinds(r#""hello" "tab\there" "say \"hi\"""#);
        assert_eq!(k[0], TokenKind::StringLiteral("hello".into()));
        assert_eq!(k[1], TokenKind::StringLiteral(r"tab\there".into()));
        assert_eq!(k[2], TokenKind::StringLiteral(r#"say \"hi\""#.into()));
    }

    #[test]
    fn test_pattern_literal() {
        let k = kinds("`^[a-z]+$` `/Pattern/`");
        assert_eq!(k[0], TokenKind::Pattern("^[a-z]+$".into()));
        assert_eq!(k[1], TokenKind::Pattern("/Pattern/".into()));
    }

    #[test]
    fn test_unterminated_literals() {
        let err = Lexer::new("\"never closed").tokenize().unwrap_err();
        assert!(matches!(err, Error::Lexer { .. }));
        assert!(err.to_string().contains("unterminated string"));

        let err = Lexer::new("x ~ `abc").tokenize().unwrap_err();
        assert!(err.to_string().contains("unterminated pattern"));
    }

    #[test]
    fn test_unrecognized_character() {
        let err = Lexer::new("a @ b").tokenize().unwrap_err();
        assert!(matches!(err, Error::Lexer { location, .. } if location.column == 3));

        // a lone ampersand is not in either symbol table
        assert!(Lexer::new("a & b").tokenize().is_err());
    }

    #[test]
    fn test_two_char_greedy() {
        let k = kinds("a>=b a>b a>>b x+=1 x++ !~ && ||");
        assert_eq!(k[1], TokenKind::GreaterEqual);
        assert_eq!(k[4], TokenKind::Greater);
        assert_eq!(k[7], TokenKind::Append);
        assert_eq!(k[10], TokenKind::PlusAssign);
        assert_eq!(k[13], TokenKind::Increment);
        assert_eq!(k[14], TokenKind::NotMatch);
        assert_eq!(k[15], TokenKind::And);
        assert_eq!(k[16], TokenKind::Or);
    }

    #[test]
    fn test_every_symbol_lexes_alone() {
        let two = [
            ">=", "++", "--", "<=", "==", "!=", "^=", "%=", "*=", "/=", "+=", "-=", "!~", "&&", ">>",
            "||",
        ];
        for text in two {
            let k = kinds(text);
            assert_eq!(k.len(), 2, "{}", text);
            let mut chars = text.chars();
            let expected = two_char_symbol(chars.next().unwrap(), chars.next().unwrap());
            assert_eq!(Some(k[0].clone()), expected, "{}", text);
        }

        for ch in "{}[]()$~=<>!+^-?:*/%;|,".chars() {
            let k = kinds(&ch.to_string());
            assert_eq!(k.len(), 2, "{}", ch);
            assert_eq!(Some(k[0].clone()), one_char_symbol(ch));
        }
    }

    #[test]
    fn test_comments_and_carriage_returns() {
        let k = kinds("a # comment here\r\nb");
        assert_eq!(
            k,
            vec![
                TokenKind::Word("a".into()),
                TokenKind::Separator,
                TokenKind::Word("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_line_tracking() {
        let tokens = Lexer::new("a\nb\n  c").tokenize().unwrap();
        assert_eq!(tokens[0].location.line, 1);
        assert_eq!(tokens[2].location.line, 2);
        assert_eq!(tokens[4].location.line, 3);
        assert_eq!(tokens[4].location.column, 3);
    }
}
