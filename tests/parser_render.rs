//! Golden rendering tests: source text is parsed and the program rendered back.
//!
//! The rendered form is deterministic, so these strings pin the parser's tree
//! shape as well as the `Display` output.

use awk_lite::{Error, Lexer, Parser, Program, TokenKind, parse_source};

fn render(source: &str) -> String {
    parse_source(source)
        .unwrap_or_else(|e| panic!("{:?} failed to parse: {}", source, e))
        .to_string()
}

fn parse_err(source: &str) -> String {
    match parse_source(source) {
        Ok(program) => panic!("{:?} parsed as {:?}", source, program.to_string()),
        Err(e) => e.to_string(),
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_render_division() {
    assert_eq!(render("8/4"), "8/4 ");
}

#[test]
fn test_render_logical_and() {
    assert_eq!(render("a && b"), "a && b ");
}

#[test]
fn test_render_in() {
    assert_eq!(render("2 in array"), "2 in array ");
}

#[test]
fn test_render_concatenation() {
    assert_eq!(render("Hello world"), "Hello world ");
}

#[test]
fn test_render_ternary() {
    assert_eq!(render("expr1 ? expr2 : expr3"), "expr1 ? expr2 : expr3 ");
}

#[test]
fn test_render_function_call() {
    assert_eq!(render("functionCall(a, b, c)"), "functionCall(a, b, c)  ");
}

#[test]
fn test_render_precedence_tree() {
    // multiplication nests under addition, comparison over both
    assert_eq!(render("1 + 2 * 3 < 4"), "1+2*3 < 4 ");
    assert_eq!(render("$1 ~ `^a`"), "$1 ~ `^a` ");
    assert_eq!(render("!x"), "!x ");
}

#[test]
fn test_render_element_reference() {
    assert_eq!(render("arr[i+1]"), "arr[i+1] ");
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_render_if() {
    assert_eq!(render("if (a < b) {\n}"), "if (a < b) {\n} ");
}

#[test]
fn test_render_for() {
    assert_eq!(render("for (a; b; c) {\n}"), "for (a; b; c) {\n} ");
}

#[test]
fn test_render_for_in() {
    assert_eq!(render("for (k in arr) {\n}"), "for (k in arr) {\n} ");
}

#[test]
fn test_render_delete() {
    assert_eq!(render("delete array[index]"), "delete array[index] ");
    assert_eq!(render("delete array"), "delete array ");
}

#[test]
fn test_render_while_body() {
    assert_eq!(render("while (i < 3) { i = i + 1 }"), "while (i < 3) {\ni = i+1\n} ");
}

// ============================================================================
// Programs
// ============================================================================

#[test]
fn test_render_begin_and_end() {
    let rendered = render("BEGIN { x = 1 }\nEND { print x }");
    assert_eq!(rendered, "BEGIN x = 1\nEND print(x)\n");
}

#[test]
fn test_render_guarded_block() {
    assert_eq!(render("NR > 1 { print $2 }"), "NR > 1 {\nprint($2) \n} ");
}

#[test]
fn test_render_function_definition() {
    let rendered = render("function add(a, b) { return a + b }");
    assert_eq!(rendered, "function add(a, b) {\nreturn a+b \n}\n");
}

#[test]
fn test_render_is_stable() {
    // rendering a parsed program twice gives the same text
    let program = parse_source("{ if ($1 > 0) print \"pos\"; else print \"neg\" }").unwrap();
    assert_eq!(program.to_string(), program.clone().to_string());
}

// ============================================================================
// Tokenizer Properties
// ============================================================================

#[test]
fn test_keywords_tokenize_to_one_token() {
    let keywords = [
        ("while", TokenKind::While),
        ("if", TokenKind::If),
        ("do", TokenKind::Do),
        ("for", TokenKind::For),
        ("break", TokenKind::Break),
        ("continue", TokenKind::Continue),
        ("else", TokenKind::Else),
        ("return", TokenKind::Return),
        ("BEGIN", TokenKind::Begin),
        ("END", TokenKind::End),
        ("print", TokenKind::Print),
        ("printf", TokenKind::Printf),
        ("next", TokenKind::Next),
        ("in", TokenKind::In),
        ("delete", TokenKind::Delete),
        ("getline", TokenKind::Getline),
        ("exit", TokenKind::Exit),
        ("nextfile", TokenKind::Nextfile),
        ("function", TokenKind::Function),
    ];

    for (text, kind) in keywords {
        let tokens = Lexer::new(text).tokenize().unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![kind, TokenKind::Eof], "keyword {:?}", text);
    }
}

#[test]
fn test_symbols_tokenize_to_one_token() {
    let symbols = [
        (">=", TokenKind::GreaterEqual),
        ("++", TokenKind::Increment),
        ("--", TokenKind::Decrement),
        ("<=", TokenKind::LessEqual),
        ("==", TokenKind::Equal),
        ("!=", TokenKind::NotEqual),
        ("^=", TokenKind::CaretAssign),
        ("%=", TokenKind::PercentAssign),
        ("*=", TokenKind::StarAssign),
        ("/=", TokenKind::SlashAssign),
        ("+=", TokenKind::PlusAssign),
        ("-=", TokenKind::MinusAssign),
        ("!~", TokenKind::NotMatch),
        ("&&", TokenKind::And),
        (">>", TokenKind::Append),
        ("||", TokenKind::Or),
        ("{", TokenKind::LeftBrace),
        ("}", TokenKind::RightBrace),
        ("[", TokenKind::LeftBracket),
        ("]", TokenKind::RightBracket),
        ("(", TokenKind::LeftParen),
        (")", TokenKind::RightParen),
        ("$", TokenKind::Dollar),
        ("~", TokenKind::Match),
        ("=", TokenKind::Assign),
        ("<", TokenKind::Less),
        (">", TokenKind::Greater),
        ("!", TokenKind::Not),
        ("+", TokenKind::Plus),
        ("^", TokenKind::Caret),
        ("-", TokenKind::Minus),
        ("?", TokenKind::Question),
        (":", TokenKind::Colon),
        ("*", TokenKind::Star),
        ("/", TokenKind::Slash),
        ("%", TokenKind::Percent),
        (";", TokenKind::Separator),
        ("\n", TokenKind::Separator),
        ("|", TokenKind::Pipe),
        (",", TokenKind::Comma),
    ];

    for (text, kind) in symbols {
        let tokens = Lexer::new(text).tokenize().unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![kind, TokenKind::Eof], "symbol {:?}", text);
    }
}

#[test]
fn test_parse_yields_program_or_parse_error() {
    let sources = [
        "",
        "{",
        "}",
        "BEGIN",
        "x = = 1",
        "function (a) {}",
        "for (;;",
        "a ? b",
        "(1",
        "arr[1",
        "do { x } y",
        "print 1,",
        "{ print $1 }",
    ];

    for source in sources {
        let tokens = Lexer::new(source).tokenize().unwrap();
        match Parser::new(tokens).parse() {
            Ok(Program { .. }) => {}
            Err(Error::Parser { .. }) => {}
            Err(other) => panic!("{:?} produced a non-parse error: {}", source, other),
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

#[test]
fn test_error_messages() {
    assert!(parse_err("function (a) { }").contains("No name for function"));
    assert!(parse_err("function f a { }").contains("Function is not properly declared"));
    assert!(parse_err("BEGIN { x = 1").contains("Expected a closing curly brace '}'"));
    assert!(parse_err("a ? b").contains("Expected a colon (':') after the true case expression"));
    assert!(parse_err("x = 1 +").contains("Expected another expression"));
    assert!(parse_err("(1 + 2").contains("Expected a closing parenthesis ')'"));
    assert!(parse_err("arr[1").contains("Expected a closing square bracket ']'"));
    assert!(parse_err("do { x = 1 } y").contains("Expected 'while' after do block"));
}

#[test]
fn test_error_carries_location() {
    let err = parse_source("BEGIN {\n  x = (1 + 2\n}").unwrap_err();
    let location = err.location().expect("parse errors carry a location");
    assert_eq!(location.line, 2);
}
