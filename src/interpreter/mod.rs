mod builtins;
mod expr;
pub mod format;
mod record;
mod scope;
pub mod stmt;

pub use builtins::{Arity, Builtin, BuiltinFn};
pub use record::RecordSource;
pub use scope::Scope;
pub use stmt::Signal;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::Write;

use regex::Regex;
use tracing::debug;

use crate::ast::*;
use crate::error::Result;
use crate::value::{Scalar, Value};

/// Tree-walking interpreter for a parsed [`Program`]
pub struct Interpreter<'a> {
    program: &'a Program,

    /// User-defined functions by name
    functions: HashMap<&'a str, &'a FunctionDef>,

    builtins: HashMap<&'static str, Builtin>,

    pub(crate) globals: Scope,

    /// One frame per active user function call; the last one is the local scope
    frames: Vec<Scope>,

    pub(crate) records: RecordSource,

    /// Compiled regex cache for `~`, `match`, `sub`, `gsub` and `split`
    pub(crate) regex_cache: HashMap<String, Regex>,

    /// Set by `exit`
    exit_code: Option<i32>,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a Program) -> Self {
        let functions = program
            .functions
            .iter()
            .map(|f| (f.name.as_str(), f))
            .collect();

        let mut globals = Scope::new();
        globals.set_scalar("FS", " ");
        globals.set_scalar("OFS", " ");
        globals.set_scalar("ORS", "\n");
        globals.set_scalar("OFMT", "%.6g");
        globals.set_scalar("FILENAME", "");
        globals.set_scalar("NR", "0");
        globals.set_scalar("FNR", "0");
        globals.set_scalar("NF", "0");

        Self {
            program,
            functions,
            builtins: builtins::registry(),
            globals,
            frames: Vec::new(),
            records: RecordSource::default(),
            regex_cache: HashMap::new(),
            exit_code: None,
        }
    }

    pub fn with_records(mut self, records: RecordSource) -> Self {
        self.records = records;
        self
    }

    /// Set the field separator
    pub fn set_fs(&mut self, fs: &str) {
        self.globals.set_scalar("FS", fs);
    }

    /// Set a global variable before execution
    pub fn set_variable(&mut self, name: &str, value: &str) {
        self.globals.set_scalar(name, value);
    }

    /// Set the current filename (FILENAME)
    pub fn set_filename(&mut self, filename: &str) {
        self.globals.set_scalar("FILENAME", filename);
    }

    /// Global variable lookup, mostly for inspecting state after [`run`](Self::run)
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Run BEGIN blocks, the record loop once per pattern-action block, then
    /// END blocks. Returns the exit status.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<i32> {
        let program = self.program;

        debug!(blocks = program.begin_blocks.len(), "running BEGIN");
        for block in &program.begin_blocks {
            if self.exit_requested() {
                break;
            }
            self.execute_block(block, out)?;
        }

        for (index, block) in program.other_blocks.iter().enumerate() {
            if self.exit_requested() {
                break;
            }
            debug!(index, "running record block");
            self.records.reset();
            while !self.exit_requested()
                && self
                    .records
                    .advance_and_split(&mut self.globals, &mut self.regex_cache)?
            {
                if self.guard_passes(block, out)? {
                    self.execute_block(block, out)?;
                }
            }
        }

        // an exit before END still runs END; an exit inside END stops it
        let pending_exit = self.exit_code.take();
        debug!(blocks = program.end_blocks.len(), "running END");
        for block in &program.end_blocks {
            if self.exit_requested() {
                break;
            }
            self.execute_block(block, out)?;
        }

        out.flush()?;
        Ok(self.exit_code.or(pending_exit).unwrap_or(0))
    }

    /// A bare pattern guard is matched against `$0`; any other guard must be `"1"`
    fn guard_passes(&mut self, block: &Block, out: &mut dyn Write) -> Result<bool> {
        match &block.condition {
            None => Ok(true),
            Some(Expr::Pattern(pattern)) => {
                let record = self.globals.scalar("$0");
                Ok(self.regex(pattern)?.is_match(record.as_str()))
            }
            Some(condition) => Ok(self.eval_scalar(condition, out)?.is_one()),
        }
    }

    pub(crate) fn request_exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }

    pub(crate) fn exit_requested(&self) -> bool {
        self.exit_code.is_some()
    }

    pub(crate) fn regex(&mut self, pattern: &str) -> Result<Regex> {
        match self.regex_cache.entry(pattern.to_string()) {
            Entry::Occupied(e) => Ok(e.get().clone()),
            Entry::Vacant(e) => Ok(e.insert(Regex::new(pattern)?).clone()),
        }
    }

    // ===== Scope resolution =====

    /// Globals win; otherwise the innermost call frame, or the globals at top level
    fn scope_for(&self, name: &str) -> &Scope {
        if self.globals.contains(name) {
            return &self.globals;
        }
        self.frames.last().unwrap_or(&self.globals)
    }

    fn scope_for_mut(&mut self, name: &str) -> &mut Scope {
        if self.globals.contains(name) {
            return &mut self.globals;
        }
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => &mut self.globals,
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&Value> {
        self.scope_for(name).get(name)
    }

    pub(crate) fn store(&mut self, name: &str, value: Value) {
        self.scope_for_mut(name).insert(name, value);
    }

    pub(crate) fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.scope_for_mut(name).remove(name)
    }

    pub(crate) fn record_text(&self) -> Scalar {
        self.globals.scalar("$0")
    }
}
