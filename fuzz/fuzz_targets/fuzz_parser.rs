#![no_main]

use awk_lite::{Error, parse_source};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    match parse_source(data) {
        // rendering must not panic on any tree the parser builds
        Ok(program) => {
            let _ = program.to_string();
        }
        Err(Error::Lexer { .. } | Error::Parser { .. }) => {}
        Err(other) => panic!("unexpected error kind from parsing: {}", other),
    }
});
