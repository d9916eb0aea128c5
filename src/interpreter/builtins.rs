use std::collections::HashMap;
use std::io::Write;

use tracing::{trace, warn};

use crate::ast::{Expr, FunctionDef};
use crate::error::{Error, Result, SourceLocation};
use crate::value::{Scalar, Value};

use super::record::{fields_to_array, split_fields};
use super::scope::Scope;
use super::stmt::Signal;
use super::{Interpreter, format};

/// Implementation of a built-in; receives the evaluated arguments in order
pub type BuiltinFn = fn(&mut Interpreter<'_>, &mut dyn Write, &mut [Value]) -> Result<Scalar>;

/// How many arguments a built-in accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub arity: Arity,
    pub func: BuiltinFn,
}

pub(crate) fn registry() -> HashMap<&'static str, Builtin> {
    let entries: [(&'static str, Arity, BuiltinFn); 16] = [
        ("print", Arity::AtLeast(0), print),
        ("printf", Arity::AtLeast(1), printf),
        ("sprintf", Arity::AtLeast(1), sprintf),
        ("getline", Arity::Exact(0), getline),
        ("next", Arity::Exact(0), next),
        ("nextfile", Arity::Exact(0), nextfile),
        ("exit", Arity::Range(0, 1), exit),
        ("gsub", Arity::Range(2, 3), gsub),
        ("sub", Arity::Range(2, 3), sub),
        ("match", Arity::Exact(2), match_fn),
        ("index", Arity::Exact(2), index),
        ("length", Arity::Range(0, 1), length),
        ("split", Arity::Range(2, 3), split),
        ("substr", Arity::Range(2, 3), substr),
        ("tolower", Arity::Exact(1), tolower),
        ("toupper", Arity::Exact(1), toupper),
    ];

    entries
        .into_iter()
        .map(|(name, arity, func)| (name, Builtin { arity, func }))
        .collect()
}

impl<'a> Interpreter<'a> {
    /// Built-ins first, then user functions
    pub(crate) fn call_function(
        &mut self,
        name: &str,
        args: &[Expr],
        location: SourceLocation,
        out: &mut dyn Write,
    ) -> Result<Scalar> {
        if let Some(builtin) = self.builtins.get(name).copied() {
            if !builtin.arity.accepts(args.len()) {
                return Err(Error::runtime_at(
                    format!("wrong number of arguments to {}: {}", name, args.len()),
                    Some(location),
                ));
            }

            let mut values = self.eval_args(args, out)?;
            trace!(name, argc = values.len(), "builtin call");
            let result = (builtin.func)(self, out, &mut values)?;
            self.write_back_arrays(args, values);
            return Ok(result);
        }

        if let Some(function) = self.functions.get(name).copied() {
            return self.call_user_function(function, args, location, out);
        }

        Err(Error::runtime_at(format!("unknown function: {}", name), Some(location)))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(name = %function.name))]
    fn call_user_function(
        &mut self,
        function: &'a FunctionDef,
        args: &[Expr],
        location: SourceLocation,
        out: &mut dyn Write,
    ) -> Result<Scalar> {
        if args.len() != function.params.len() {
            return Err(Error::runtime_at(
                format!("Parameter count mismatch for function {}", function.name),
                Some(location),
            ));
        }

        let values = self.eval_args(args, out)?;
        let mut frame = Scope::new();
        for (param, value) in function.params.iter().zip(values) {
            frame.insert(param.as_str(), value);
        }

        self.frames.push(frame);
        let result = self.execute_statements(&function.body, out);
        let mut frame = self.frames.pop().unwrap_or_default();
        let signal = result?;

        let returned: Vec<Value> = function
            .params
            .iter()
            .map(|p| frame.remove(p).unwrap_or_default())
            .collect();
        self.write_back_arrays(args, returned);

        Ok(match signal {
            Signal::Return(Some(value)) => value,
            _ => Scalar::empty(),
        })
    }

    /// Patterns are passed to built-ins as their source text
    fn eval_args(&mut self, args: &[Expr], out: &mut dyn Write) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let value = match arg {
                Expr::Pattern(pattern) => Value::Scalar(Scalar::new(pattern.as_str())),
                other => self.eval(other, out)?,
            };
            values.push(value);
        }
        Ok(values)
    }

    /// Arrays behave as by-reference: a bare variable argument that holds an
    /// array after the call gets that array back
    fn write_back_arrays(&mut self, args: &[Expr], values: Vec<Value>) {
        for (arg, value) in args.iter().zip(values) {
            if let Expr::VariableReference {
                name, index: None, ..
            } = arg
                && value.is_array()
            {
                self.store(name, value);
            }
        }
    }
}

fn scalar_arg(args: &[Value], i: usize) -> Result<Scalar> {
    match args.get(i) {
        Some(Value::Scalar(s)) => Ok(s.clone()),
        Some(Value::Array(_)) => Err(Error::runtime(format!(
            "argument {} is an array used in a scalar context",
            i + 1
        ))),
        None => Ok(Scalar::empty()),
    }
}

fn scalar_args(args: &[Value]) -> Result<Vec<Scalar>> {
    (0..args.len()).map(|i| scalar_arg(args, i)).collect()
}

/// Character offset of a byte offset, 1-based
fn char_position(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count() + 1
}

fn print(interp: &mut Interpreter<'_>, out: &mut dyn Write, args: &mut [Value]) -> Result<Scalar> {
    let ofs = interp.globals.scalar("OFS");
    let ors = interp.globals.scalar("ORS");

    let line = if args.is_empty() {
        interp.record_text().into_string()
    } else {
        scalar_args(args)?
            .iter()
            .map(Scalar::as_str)
            .collect::<Vec<_>>()
            .join(ofs.as_str())
    };

    out.write_all(line.as_bytes())?;
    out.write_all(ors.as_str().as_bytes())?;
    Ok(Scalar::empty())
}

fn printf(_interp: &mut Interpreter<'_>, out: &mut dyn Write, args: &mut [Value]) -> Result<Scalar> {
    let args = scalar_args(args)?;
    let text = format::sprintf(args[0].as_str(), &args[1..]);
    out.write_all(text.as_bytes())?;
    Ok(Scalar::empty())
}

fn sprintf(_interp: &mut Interpreter<'_>, _out: &mut dyn Write, args: &mut [Value]) -> Result<Scalar> {
    let args = scalar_args(args)?;
    Ok(Scalar::from(format::sprintf(args[0].as_str(), &args[1..])))
}

fn getline(interp: &mut Interpreter<'_>, _out: &mut dyn Write, _args: &mut [Value]) -> Result<Scalar> {
    let advanced = interp
        .records
        .advance_and_split(&mut interp.globals, &mut interp.regex_cache);
    match advanced {
        Ok(advanced) => Ok(Scalar::from_bool(advanced)),
        Err(err) => {
            warn!(error = %err, "getline failed");
            Ok(Scalar::from("-1"))
        }
    }
}

fn next(interp: &mut Interpreter<'_>, _out: &mut dyn Write, _args: &mut [Value]) -> Result<Scalar> {
    let advanced = interp
        .records
        .advance_and_split(&mut interp.globals, &mut interp.regex_cache)?;
    Ok(Scalar::from_bool(advanced))
}

fn nextfile(interp: &mut Interpreter<'_>, _out: &mut dyn Write, _args: &mut [Value]) -> Result<Scalar> {
    interp.records.skip_remaining();
    Ok(Scalar::from("1"))
}

fn exit(interp: &mut Interpreter<'_>, _out: &mut dyn Write, args: &mut [Value]) -> Result<Scalar> {
    let code = match args.first() {
        Some(_) => scalar_arg(args, 0)?.to_number() as i32,
        None => 0,
    };
    interp.request_exit(code);
    Ok(Scalar::empty())
}

/// `(regex, replacement[, subject])`, subject defaulting to `$0`
fn substitute(interp: &mut Interpreter<'_>, args: &[Value], global: bool) -> Result<Scalar> {
    let pattern = scalar_arg(args, 0)?;
    let replacement = scalar_arg(args, 1)?;
    let subject = if args.len() > 2 {
        scalar_arg(args, 2)?
    } else {
        interp.record_text()
    };

    let re = interp.regex(pattern.as_str())?;
    let replaced = if global {
        re.replace_all(subject.as_str(), replacement.as_str())
    } else {
        re.replace(subject.as_str(), replacement.as_str())
    };
    Ok(Scalar::from(replaced.into_owned()))
}

fn gsub(interp: &mut Interpreter<'_>, _out: &mut dyn Write, args: &mut [Value]) -> Result<Scalar> {
    substitute(interp, args, true)
}

fn sub(interp: &mut Interpreter<'_>, _out: &mut dyn Write, args: &mut [Value]) -> Result<Scalar> {
    substitute(interp, args, false)
}

fn match_fn(interp: &mut Interpreter<'_>, _out: &mut dyn Write, args: &mut [Value]) -> Result<Scalar> {
    let text = scalar_arg(args, 0)?;
    let re = interp.regex(scalar_arg(args, 1)?.as_str())?;
    Ok(match re.find(text.as_str()) {
        Some(m) => Scalar::from_count(char_position(text.as_str(), m.start())),
        None => Scalar::from("0"),
    })
}

fn index(_interp: &mut Interpreter<'_>, _out: &mut dyn Write, args: &mut [Value]) -> Result<Scalar> {
    let haystack = scalar_arg(args, 0)?;
    let needle = scalar_arg(args, 1)?;
    Ok(match haystack.as_str().find(needle.as_str()) {
        Some(offset) => Scalar::from_count(char_position(haystack.as_str(), offset)),
        None => Scalar::empty(),
    })
}

fn length(interp: &mut Interpreter<'_>, _out: &mut dyn Write, args: &mut [Value]) -> Result<Scalar> {
    let count = match args.first() {
        None => interp.record_text().as_str().chars().count(),
        Some(Value::Array(elements)) => elements.len(),
        Some(Value::Scalar(s)) => s.as_str().chars().count(),
    };
    Ok(Scalar::from_count(count))
}

/// `split(text, array[, separator])`; the separator defaults to `FS`
fn split(interp: &mut Interpreter<'_>, _out: &mut dyn Write, args: &mut [Value]) -> Result<Scalar> {
    let text = scalar_arg(args, 0)?;
    let separator = if args.len() > 2 {
        scalar_arg(args, 2)?
    } else {
        interp.globals.scalar("FS")
    };

    let fields = split_fields(text.as_str(), separator.as_str(), &mut interp.regex_cache)?;
    let count = fields.len();
    args[1] = fields_to_array(fields);
    Ok(Scalar::from_count(count))
}

/// Substring by 1-based character position, clamped to the string
fn substr(_interp: &mut Interpreter<'_>, _out: &mut dyn Write, args: &mut [Value]) -> Result<Scalar> {
    let text: Vec<char> = scalar_arg(args, 0)?.as_str().chars().collect();
    let start = (scalar_arg(args, 1)?.to_number().trunc() as i64).saturating_sub(1);

    let begin = start.clamp(0, text.len() as i64) as usize;
    let end = if args.len() > 2 {
        let len = scalar_arg(args, 2)?.to_number().trunc() as i64;
        start.saturating_add(len).clamp(begin as i64, text.len() as i64) as usize
    } else {
        text.len()
    };

    Ok(Scalar::from(text[begin..end].iter().collect::<String>()))
}

fn tolower(_interp: &mut Interpreter<'_>, _out: &mut dyn Write, args: &mut [Value]) -> Result<Scalar> {
    Ok(Scalar::from(scalar_arg(args, 0)?.as_str().to_lowercase()))
}

fn toupper(_interp: &mut Interpreter<'_>, _out: &mut dyn Write, args: &mut [Value]) -> Result<Scalar> {
    Ok(Scalar::from(scalar_arg(args, 0)?.as_str().to_uppercase()))
}
