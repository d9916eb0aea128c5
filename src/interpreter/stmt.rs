use std::io::Write;

use crate::ast::*;
use crate::error::{Error, Result};
use crate::value::{Scalar, Value};

use super::Interpreter;

/// Control-flow outcome of executing a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    None,
    Break,
    Continue,
    Return(Option<Scalar>),
}

/// What a loop should do after its body ran
enum LoopStep {
    Next,
    Exit,
    Propagate(Signal),
}

impl LoopStep {
    fn from_body(signal: Signal) -> Self {
        match signal {
            Signal::None | Signal::Continue => LoopStep::Next,
            Signal::Break => LoopStep::Exit,
            ret @ Signal::Return(_) => LoopStep::Propagate(ret),
        }
    }
}

impl<'a> Interpreter<'a> {
    pub(crate) fn execute_block(&mut self, block: &Block, out: &mut dyn Write) -> Result<Signal> {
        self.execute_statements(&block.statements, out)
    }

    /// Run statements in order; the first signal other than `None` stops the list
    pub(crate) fn execute_statements(&mut self, statements: &[Stmt], out: &mut dyn Write) -> Result<Signal> {
        for stmt in statements {
            if self.exit_requested() {
                break;
            }
            match self.execute(stmt, out)? {
                Signal::None => continue,
                other => return Ok(other),
            }
        }
        Ok(Signal::None)
    }

    pub(crate) fn execute(&mut self, stmt: &Stmt, out: &mut dyn Write) -> Result<Signal> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr, out)?;
                Ok(Signal::None)
            }

            Stmt::Break { .. } => Ok(Signal::Break),

            Stmt::Continue { .. } => Ok(Signal::Continue),

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => Some(self.eval_scalar(expr, out)?),
                    None => None,
                };
                Ok(Signal::Return(value))
            }

            Stmt::If { branches, .. } => {
                for branch in branches {
                    let taken = match &branch.condition {
                        Some(condition) => self.eval_scalar(condition, out)?.is_one(),
                        None => true,
                    };
                    if taken {
                        return self.execute_block(&branch.body, out);
                    }
                }
                Ok(Signal::None)
            }

            Stmt::While {
                condition, body, ..
            } => {
                while !self.exit_requested() && self.eval_scalar(condition, out)?.is_one() {
                    match LoopStep::from_body(self.execute_block(body, out)?) {
                        LoopStep::Next => {}
                        LoopStep::Exit => break,
                        LoopStep::Propagate(signal) => return Ok(signal),
                    }
                }
                Ok(Signal::None)
            }

            Stmt::DoWhile {
                body, condition, ..
            } => {
                loop {
                    match LoopStep::from_body(self.execute_block(body, out)?) {
                        LoopStep::Next => {}
                        LoopStep::Exit => break,
                        LoopStep::Propagate(signal) => return Ok(signal),
                    }
                    if self.exit_requested() || !self.eval_scalar(condition, out)?.is_one() {
                        break;
                    }
                }
                Ok(Signal::None)
            }

            Stmt::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                if let Some(init) = init {
                    self.eval(init, out)?;
                }

                loop {
                    if self.exit_requested() {
                        break;
                    }
                    if let Some(condition) = condition
                        && !self.eval_scalar(condition, out)?.is_one()
                    {
                        break;
                    }

                    match LoopStep::from_body(self.execute_block(body, out)?) {
                        LoopStep::Next => {}
                        LoopStep::Exit => break,
                        LoopStep::Propagate(signal) => return Ok(signal),
                    }

                    if let Some(update) = update {
                        self.eval(update, out)?;
                    }
                }
                Ok(Signal::None)
            }

            Stmt::ForEach {
                variable,
                array,
                body,
                location,
            } => {
                let keys: Vec<String> = match self.lookup(array) {
                    Some(Value::Array(elements)) => elements.keys().cloned().collect(),
                    _ => {
                        return Err(Error::runtime_at(
                            format!("for-in needs an array, {} is not one", array),
                            Some(*location),
                        ));
                    }
                };

                for key in keys {
                    if self.exit_requested() {
                        break;
                    }
                    // elements deleted by the body are skipped
                    let Some(value) = self
                        .lookup(array)
                        .and_then(Value::as_array)
                        .and_then(|elements| elements.get(&key))
                        .cloned()
                    else {
                        continue;
                    };
                    self.store(variable, Value::Scalar(value));

                    match LoopStep::from_body(self.execute_block(body, out)?) {
                        LoopStep::Next => {}
                        LoopStep::Exit => break,
                        LoopStep::Propagate(signal) => return Ok(signal),
                    }
                }
                Ok(Signal::None)
            }

            Stmt::Delete {
                array,
                indices,
                location,
            } => {
                if indices.is_empty() {
                    if let Some(Value::Scalar(_)) = self.lookup(array) {
                        return Err(Error::runtime_at(
                            format!("delete needs an array, {} is not one", array),
                            Some(*location),
                        ));
                    }
                    self.remove_variable(array);
                    return Ok(Signal::None);
                }

                let mut keys = Vec::with_capacity(indices.len());
                for index in indices {
                    keys.push(self.eval_scalar(index, out)?);
                }

                match self.lookup(array) {
                    None => Ok(Signal::None),
                    Some(Value::Scalar(_)) => Err(Error::runtime_at(
                        format!("delete needs an array, {} is not one", array),
                        Some(*location),
                    )),
                    Some(Value::Array(_)) => {
                        let elements = self.array_mut(array, *location)?;
                        for key in keys {
                            elements.remove(key.as_str());
                        }
                        Ok(Signal::None)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::{Interpreter, RecordSource};
    use crate::parser::parse_source;
    use crate::value::Value;

    fn run(program: &str) -> String {
        let ast = parse_source(program).unwrap();
        let mut interpreter = Interpreter::new(&ast).with_records(RecordSource::new(vec![]));
        let mut out = Vec::new();
        interpreter.run(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_if_chain() {
        let program = r#"BEGIN {
            x = 2
            if (x == 1) print "one"
            else if (x == 2) print "two"
            else print "other"
        }"#;
        assert_eq!(run(program), "two\n");
    }

    #[test]
    fn test_while_break_continue() {
        let program = r#"BEGIN {
            while (i < 10) {
                i++
                if (i == 2) continue
                if (i == 4) break
                print i
            }
        }"#;
        assert_eq!(run(program), "1.0\n3.0\n");
    }

    #[test]
    fn test_for_loop_runs_update_on_continue() {
        let program = r#"BEGIN {
            for (i = 0; i < 4; i++) {
                if (i == 1) continue
                s = s i ","
            }
            print s
        }"#;
        assert_eq!(run(program), "0,2.0,3.0,\n");
    }

    #[test]
    fn test_do_while_runs_once() {
        assert_eq!(run(r#"BEGIN { do { print "once" } while (0) }"#), "once\n");
    }

    #[test]
    fn test_do_while_continue_checks_guard() {
        let program = r#"BEGIN {
            do {
                n++
                if (n < 3) continue
                print "reached"
            } while (n < 5)
            print n
        }"#;
        assert_eq!(run(program), "reached\nreached\nreached\n5.0\n");
    }

    #[test]
    fn test_for_each_binds_values() {
        let program = r#"BEGIN {
            a["k"] = "v"
            for (x in a) print x
        }"#;
        assert_eq!(run(program), "v\n");
    }

    #[test]
    fn test_for_each_requires_array() {
        let ast = parse_source("BEGIN { s = 1; for (x in s) print x }").unwrap();
        let mut interpreter = Interpreter::new(&ast);
        let err = interpreter.run(&mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("needs an array"));
    }

    #[test]
    fn test_delete_element_and_array() {
        let ast = parse_source(
            r#"BEGIN { a[1] = "x"; a[2] = "y"; delete a[1]; b[1] = 1; delete b }"#,
        )
        .unwrap();
        let mut interpreter = Interpreter::new(&ast);
        interpreter.run(&mut Vec::new()).unwrap();

        let Some(Value::Array(a)) = interpreter.global("a") else {
            panic!("a should be an array");
        };
        assert!(!a.contains_key("1"));
        assert!(a.contains_key("2"));
        assert!(interpreter.global("b").is_none());
    }

    #[test]
    fn test_return_stops_loop() {
        let program = r#"
            function first_even(n) {
                for (i = 1; i <= n; i++) if (i % 2 == 0) return i
                return "none"
            }
            BEGIN { print first_even(5); print first_even(1) }
        "#;
        assert_eq!(run(program), "2.0\nnone\n");
    }
}
