#![no_main]

use arbitrary::Arbitrary;
use awk_lite::{Interpreter, Lexer, Parser, RecordSource, TokenKind};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    program: String,
    field_separator: Option<String>,
    lines: Vec<String>,
}

fuzz_target!(|input: Input| {
    // Limit input sizes to prevent hangs
    if input.program.len() > 2000 || input.lines.len() > 200 {
        return;
    }

    let Ok(tokens) = Lexer::new(&input.program).tokenize() else {
        return;
    };

    // loops and recursion can legitimately run forever
    let unbounded = tokens.iter().any(|t| {
        matches!(
            t.kind,
            TokenKind::While | TokenKind::Do | TokenKind::For | TokenKind::Function
        )
    });
    if unbounded {
        return;
    }

    let Ok(program) = Parser::new(tokens).parse() else {
        return;
    };

    let mut interpreter = Interpreter::new(&program).with_records(RecordSource::new(input.lines));
    if let Some(fs) = &input.field_separator {
        interpreter.set_fs(fs);
    }

    let mut output = Vec::new();
    let _ = interpreter.run(&mut output);
});
