#![no_main]

use awk_lite::{Lexer, TokenKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Any outcome but a panic is fine; a successful run ends in exactly one Eof
    if let Ok(tokens) = Lexer::new(data).tokenize() {
        let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
        assert_eq!(eofs, 1);
        assert!(matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)));
    }
});
