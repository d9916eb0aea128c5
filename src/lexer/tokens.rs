use std::fmt;

use crate::error::SourceLocation;

/// Every token kind the tokenizer can produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Literals, carrying their source text
    Word(String),
    Number(String),
    StringLiteral(String),
    Pattern(String),

    // Keywords
    While,
    If,
    Do,
    For,
    Break,
    Continue,
    Else,
    Return,
    Begin,
    End,
    Print,
    Printf,
    Next,
    In,
    Delete,
    Getline,
    Exit,
    Nextfile,
    Function,

    // Two-character operators
    GreaterEqual,   // >=
    Increment,      // ++
    Decrement,      // --
    LessEqual,      // <=
    Equal,          // ==
    NotEqual,       // !=
    CaretAssign,    // ^=
    PercentAssign,  // %=
    StarAssign,     // *=
    SlashAssign,    // /=
    PlusAssign,     // +=
    MinusAssign,    // -=
    NotMatch,       // !~
    And,            // &&
    Append,         // >>
    Or,             // ||

    // One-character operators and punctuation
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    LeftParen,    // (
    RightParen,   // )
    Dollar,       // $
    Match,        // ~
    Assign,       // =
    Less,         // <
    Greater,      // >
    Not,          // !
    Plus,         // +
    Caret,        // ^
    Minus,        // -
    Question,     // ?
    Colon,        // :
    Star,         // *
    Slash,        // /
    Percent,      // %
    Pipe,         // |
    Comma,        // ,

    /// `;` or a newline
    Separator,

    Eof,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::While
                | TokenKind::If
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Else
                | TokenKind::Return
                | TokenKind::Begin
                | TokenKind::End
                | TokenKind::Print
                | TokenKind::Printf
                | TokenKind::Next
                | TokenKind::In
                | TokenKind::Delete
                | TokenKind::Getline
                | TokenKind::Exit
                | TokenKind::Nextfile
                | TokenKind::Function
        )
    }

    /// Text carried by literal-bearing kinds
    pub fn literal(&self) -> Option<&str> {
        match self {
            TokenKind::Word(s)
            | TokenKind::Number(s)
            | TokenKind::StringLiteral(s)
            | TokenKind::Pattern(s) => Some(s),
            _ => None,
        }
    }

    /// Upper-case name used in diagnostics, e.g. `WORD` or `LEFTCURLYBRACES`
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Word(_) => "WORD",
            TokenKind::Number(_) => "NUMBER",
            TokenKind::StringLiteral(_) => "STRINGLITERAL",
            TokenKind::Pattern(_) => "PATTERN",
            TokenKind::While => "WHILE",
            TokenKind::If => "IF",
            TokenKind::Do => "DO",
            TokenKind::For => "FOR",
            TokenKind::Break => "BREAK",
            TokenKind::Continue => "CONTINUE",
            TokenKind::Else => "ELSE",
            TokenKind::Return => "RETURN",
            TokenKind::Begin => "BEGIN",
            TokenKind::End => "END",
            TokenKind::Print => "PRINT",
            TokenKind::Printf => "PRINTF",
            TokenKind::Next => "NEXT",
            TokenKind::In => "IN",
            TokenKind::Delete => "DELETE",
            TokenKind::Getline => "GETLINE",
            TokenKind::Exit => "EXIT",
            TokenKind::Nextfile => "NEXTFILE",
            TokenKind::Function => "FUNCTION",
            TokenKind::GreaterEqual => "GREATEREQUALTO",
            TokenKind::Increment => "INCREMENT",
            TokenKind::Decrement => "DECREMENT",
            TokenKind::LessEqual => "LESSEQUALTO",
            TokenKind::Equal => "COMPARETO",
            TokenKind::NotEqual => "NOTEQUALTO",
            TokenKind::CaretAssign => "EXPONENTASSIGNMENT",
            TokenKind::PercentAssign => "MODULUSASSIGNMENT",
            TokenKind::StarAssign => "MULTIPLYASSIGNMENT",
            TokenKind::SlashAssign => "DIVIDEASSIGNMENT",
            TokenKind::PlusAssign => "ADDASSIGNMENT",
            TokenKind::MinusAssign => "SUBTRACTASSIGNMENT",
            TokenKind::NotMatch => "NOTMATCH",
            TokenKind::And => "LOGICALAND",
            TokenKind::Append => "RIGHTSHIFT",
            TokenKind::Or => "LOGICALOR",
            TokenKind::LeftBrace => "LEFTCURLYBRACES",
            TokenKind::RightBrace => "RIGHTCURLYBRACES",
            TokenKind::LeftBracket => "LEFTSQUAREBRACES",
            TokenKind::RightBracket => "RIGHTSQUAREBRACES",
            TokenKind::LeftParen => "LEFTPARENTHESIS",
            TokenKind::RightParen => "RIGHTPARENTHESIS",
            TokenKind::Dollar => "DOLLARSIGN",
            TokenKind::Match => "MATCH",
            TokenKind::Assign => "EQUALS",
            TokenKind::Less => "LEFTARROW",
            TokenKind::Greater => "RIGHTARROW",
            TokenKind::Not => "EXCLAMATION",
            TokenKind::Plus => "ADD",
            TokenKind::Caret => "EXPONENT",
            TokenKind::Minus => "SUBTRACT",
            TokenKind::Question => "QUESTION",
            TokenKind::Colon => "COLON",
            TokenKind::Star => "MULTIPLY",
            TokenKind::Slash => "DIVIDE",
            TokenKind::Percent => "MODULUS",
            TokenKind::Pipe => "OR",
            TokenKind::Comma => "COMMA",
            TokenKind::Separator => "SEPARATOR",
            TokenKind::Eof => "EOF",
        }
    }

    /// Check if this token can start an expression
    pub fn can_start_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::Word(_)
                | TokenKind::Number(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::Pattern(_)
                | TokenKind::LeftParen
                | TokenKind::Dollar
                | TokenKind::Not
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Increment
                | TokenKind::Decrement
                | TokenKind::Print
                | TokenKind::Printf
                | TokenKind::Getline
                | TokenKind::Next
                | TokenKind::Nextfile
                | TokenKind::Exit
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.literal() {
            Some(text) => write!(f, "{}({})", self.name(), text),
            None => f.write_str(self.name()),
        }
    }
}

/// A token with its location in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            location: SourceLocation::new(line, column),
        }
    }

    pub fn literal(&self) -> Option<&str> {
        self.kind.literal()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// The 19 reserved words
pub fn keyword_to_token(s: &str) -> Option<TokenKind> {
    match s {
        "while" => Some(TokenKind::While),
        "if" => Some(TokenKind::If),
        "do" => Some(TokenKind::Do),
        "for" => Some(TokenKind::For),
        "break" => Some(TokenKind::Break),
        "continue" => Some(TokenKind::Continue),
        "else" => Some(TokenKind::Else),
        "return" => Some(TokenKind::Return),
        "BEGIN" => Some(TokenKind::Begin),
        "END" => Some(TokenKind::End),
        "print" => Some(TokenKind::Print),
        "printf" => Some(TokenKind::Printf),
        "next" => Some(TokenKind::Next),
        "in" => Some(TokenKind::In),
        "delete" => Some(TokenKind::Delete),
        "getline" => Some(TokenKind::Getline),
        "exit" => Some(TokenKind::Exit),
        "nextfile" => Some(TokenKind::Nextfile),
        "function" => Some(TokenKind::Function),
        _ => None,
    }
}

/// Greedy first pass: the 16 two-character operators
pub fn two_char_symbol(first: char, second: char) -> Option<TokenKind> {
    let kind = match (first, second) {
        ('>', '=') => TokenKind::GreaterEqual,
        ('+', '+') => TokenKind::Increment,
        ('-', '-') => TokenKind::Decrement,
        ('<', '=') => TokenKind::LessEqual,
        ('=', '=') => TokenKind::Equal,
        ('!', '=') => TokenKind::NotEqual,
        ('^', '=') => TokenKind::CaretAssign,
        ('%', '=') => TokenKind::PercentAssign,
        ('*', '=') => TokenKind::StarAssign,
        ('/', '=') => TokenKind::SlashAssign,
        ('+', '=') => TokenKind::PlusAssign,
        ('-', '=') => TokenKind::MinusAssign,
        ('!', '~') => TokenKind::NotMatch,
        ('&', '&') => TokenKind::And,
        ('>', '>') => TokenKind::Append,
        ('|', '|') => TokenKind::Or,
        _ => return None,
    };
    Some(kind)
}

/// Fallback: one-character operators and punctuation
pub fn one_char_symbol(ch: char) -> Option<TokenKind> {
    let kind = match ch {
        '{' => TokenKind::LeftBrace,
        '}' => TokenKind::RightBrace,
        '[' => TokenKind::LeftBracket,
        ']' => TokenKind::RightBracket,
        '(' => TokenKind::LeftParen,
        ')' => TokenKind::RightParen,
        '$' => TokenKind::Dollar,
        '~' => TokenKind::Match,
        '=' => TokenKind::Assign,
        '<' => TokenKind::Less,
        '>' => TokenKind::Greater,
        '!' => TokenKind::Not,
        '+' => TokenKind::Plus,
        '^' => TokenKind::Caret,
        '-' => TokenKind::Minus,
        '?' => TokenKind::Question,
        ':' => TokenKind::Colon,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        ';' | '\n' => TokenKind::Separator,
        '|' => TokenKind::Pipe,
        ',' => TokenKind::Comma,
        _ => return None,
    };
    Some(kind)
}
