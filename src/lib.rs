//! awk-lite - a small AWK dialect with backtick patterns
//!
//! Source text goes through [`Lexer`] and [`Parser`] into a [`Program`], which
//! the tree-walking [`Interpreter`] runs against the lines of a
//! [`RecordSource`]. Every value is a string; arithmetic renders its results
//! with a fractional part (`8 + 4` prints `12.0`).
//!
//! # Example
//!
//! ```
//! use awk_lite::{Interpreter, Lexer, Parser};
//!
//! let source = r#"BEGIN { print "Hello, World!" }"#;
//! let tokens = Lexer::new(source).tokenize().unwrap();
//! let program = Parser::new(tokens).parse().unwrap();
//!
//! let mut interpreter = Interpreter::new(&program);
//! let mut output = Vec::new();
//! interpreter.run(&mut output).unwrap();
//!
//! assert_eq!(String::from_utf8(output).unwrap(), "Hello, World!\n");
//! ```
//!
//! # Field Processing Example
//!
//! ```
//! use awk_lite::{Interpreter, RecordSource, parse_source};
//!
//! let program = parse_source("{ print $2, $1 }").unwrap();
//! let records = RecordSource::new(vec!["hello,world".into(), "foo,bar".into()]);
//!
//! let mut interpreter = Interpreter::new(&program).with_records(records);
//! interpreter.set_fs(",");
//! let mut output = Vec::new();
//! interpreter.run(&mut output).unwrap();
//!
//! assert_eq!(String::from_utf8(output).unwrap(), "world hello\nbar foo\n");
//! ```
//!
//! # Pattern Matching Example
//!
//! ```
//! use awk_lite::{Interpreter, RecordSource, parse_source};
//!
//! let program = parse_source(r#"$0 ~ `error` { print "Found:", $0 }"#).unwrap();
//! let lines = "info: ok\nerror: failed\ninfo: done\n";
//! let records = RecordSource::from_reader(lines.as_bytes()).unwrap();
//!
//! let mut interpreter = Interpreter::new(&program).with_records(records);
//! let mut output = Vec::new();
//! interpreter.run(&mut output).unwrap();
//!
//! assert_eq!(String::from_utf8(output).unwrap(), "Found: error: failed\n");
//! ```

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;

pub use ast::Program;
pub use error::{Error, Result, SourceLocation};
pub use interpreter::{Interpreter, RecordSource};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{Parser, parse_source};
pub use value::{Scalar, Value};
