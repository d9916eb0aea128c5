use std::cmp::Ordering;
use std::io::Write;

use crate::ast::*;
use crate::error::{Error, Result, SourceLocation};
use crate::value::{Array, Scalar, Value, compare_scalars};

use super::Interpreter;

impl<'a> Interpreter<'a> {
    /// Evaluate an expression to whatever it holds, scalar or array
    pub(crate) fn eval(&mut self, expr: &Expr, out: &mut dyn Write) -> Result<Value> {
        match expr {
            Expr::Constant(text) => Ok(Value::Scalar(Scalar::new(text.as_str()))),

            Expr::Pattern(pattern) => Err(Error::runtime(format!(
                "pattern `{}` used as a value; patterns belong in guards or after ~",
                pattern
            ))),

            Expr::VariableReference {
                name,
                index: Some(index),
                location,
            } => {
                let key = self.eval_scalar(index, out)?;
                match self.lookup(name) {
                    Some(Value::Array(array)) => {
                        Ok(Value::Scalar(array.get(key.as_str()).cloned().unwrap_or_default()))
                    }
                    Some(Value::Scalar(_)) => Err(Error::runtime_at(
                        format!("{} is not an array", name),
                        Some(*location),
                    )),
                    None => Ok(Value::empty()),
                }
            }

            Expr::VariableReference { name, .. } => {
                Ok(self.lookup(name).cloned().unwrap_or_default())
            }

            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                ..
            } => {
                if self.eval_scalar(condition, out)?.is_one() {
                    self.eval(then_expr, out)
                } else {
                    self.eval(else_expr, out)
                }
            }

            Expr::Operation {
                op,
                left,
                right,
                location,
            } => Ok(Value::Scalar(self.eval_operation(
                *op,
                left,
                right.as_deref(),
                *location,
                out,
            )?)),

            Expr::FunctionCall {
                name,
                args,
                location,
            } => Ok(Value::Scalar(self.call_function(name, args, *location, out)?)),

            Expr::Assignment {
                target,
                value,
                location,
                ..
            } => {
                let value = self.eval_scalar(value, out)?;
                self.assign(target, value.clone(), *location, out)?;
                Ok(Value::Scalar(value))
            }
        }
    }

    /// Evaluate where only a scalar makes sense
    pub(crate) fn eval_scalar(&mut self, expr: &Expr, out: &mut dyn Write) -> Result<Scalar> {
        match self.eval(expr, out)? {
            Value::Scalar(s) => Ok(s),
            Value::Array(_) => Err(Error::runtime_at(
                format!("array {} used in a scalar context", expr),
                expr.location(),
            )),
        }
    }

    fn eval_operation(
        &mut self,
        op: Operator,
        left: &Expr,
        right: Option<&Expr>,
        location: SourceLocation,
        out: &mut dyn Write,
    ) -> Result<Scalar> {
        let right_operand = || {
            right.ok_or_else(|| {
                Error::runtime_at(format!("operator {:?} needs two operands", op), Some(location))
            })
        };

        match op {
            Operator::Add
            | Operator::Subtract
            | Operator::Multiply
            | Operator::Divide
            | Operator::Modulo
            | Operator::Exponent => {
                let l = self.eval_scalar(left, out)?.to_number();
                let r = self.eval_scalar(right_operand()?, out)?.to_number();
                let result = match op {
                    Operator::Add => l + r,
                    Operator::Subtract => l - r,
                    Operator::Multiply => l * r,
                    Operator::Exponent => l.powf(r),
                    Operator::Divide => l / r,
                    _ => l % r,
                };
                Ok(Scalar::from_number(result))
            }

            Operator::Eq
            | Operator::Ne
            | Operator::Lt
            | Operator::Le
            | Operator::Gt
            | Operator::Ge => {
                let l = self.eval_scalar(left, out)?;
                let r = self.eval_scalar(right_operand()?, out)?;
                let ordering = compare_scalars(&l, &r);
                let result = match op {
                    Operator::Eq => ordering == Ordering::Equal,
                    Operator::Ne => ordering != Ordering::Equal,
                    Operator::Lt => ordering == Ordering::Less,
                    Operator::Le => ordering != Ordering::Greater,
                    Operator::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                Ok(Scalar::from_bool(result))
            }

            Operator::And => {
                if !self.eval_scalar(left, out)?.is_truthy() {
                    return Ok(Scalar::from_bool(false));
                }
                let r = self.eval_scalar(right_operand()?, out)?;
                Ok(Scalar::from_bool(r.is_truthy()))
            }

            Operator::Or => {
                if self.eval_scalar(left, out)?.is_truthy() {
                    return Ok(Scalar::from_bool(true));
                }
                let r = self.eval_scalar(right_operand()?, out)?;
                Ok(Scalar::from_bool(r.is_truthy()))
            }

            Operator::Not => Ok(Scalar::from_bool(!self.eval_scalar(left, out)?.is_truthy())),

            Operator::Match | Operator::NotMatch => {
                let Expr::Pattern(pattern) = right_operand()? else {
                    return Err(Error::runtime_at(
                        "the right side of ~ and !~ must be a pattern",
                        Some(location),
                    ));
                };
                let text = self.eval_scalar(left, out)?;
                let matched = self.regex(pattern)?.is_match(text.as_str());
                Ok(Scalar::from_bool(matched == (op == Operator::Match)))
            }

            Operator::Dollar => {
                let name = self.field_name(left, out)?;
                Ok(self.globals.scalar(&name))
            }

            Operator::PreInc | Operator::PostInc => {
                Ok(Scalar::from_number(self.eval_scalar(left, out)?.to_number() + 1.0))
            }

            Operator::PreDec | Operator::PostDec => {
                Ok(Scalar::from_number(self.eval_scalar(left, out)?.to_number() - 1.0))
            }

            Operator::UnaryPos => Ok(Scalar::from_number(self.eval_scalar(left, out)?.to_number())),

            Operator::UnaryNeg => Ok(Scalar::from_number(-self.eval_scalar(left, out)?.to_number())),

            Operator::Concatenation => {
                let l = self.eval_scalar(left, out)?;
                let r = self.eval_scalar(right_operand()?, out)?;
                Ok(Scalar::from(format!("{}{}", l, r)))
            }

            Operator::In => {
                let Expr::VariableReference {
                    name, index: None, ..
                } = right_operand()?
                else {
                    return Err(Error::runtime_at(
                        "the right side of `in` must be an array name",
                        Some(location),
                    ));
                };
                let key = self.eval_scalar(left, out)?;
                match self.lookup(name) {
                    Some(Value::Array(array)) => Ok(Scalar::from_bool(array.contains_key(key.as_str()))),
                    Some(Value::Scalar(_)) => Err(Error::runtime_at(
                        format!("{} is not an array", name),
                        Some(location),
                    )),
                    None => Ok(Scalar::from_bool(false)),
                }
            }
        }
    }

    /// The variable name `$expr` refers to. Numeric operands are truncated,
    /// so `$(1+1)` names `$2`.
    pub(crate) fn field_name(&mut self, operand: &Expr, out: &mut dyn Write) -> Result<String> {
        let value = self.eval_scalar(operand, out)?;
        Ok(match value.as_number() {
            Some(n) if n.is_finite() => format!("${}", n.trunc() as i64),
            _ => format!("${}", value),
        })
    }

    /// Write `value` through an assignment target
    pub(crate) fn assign(
        &mut self,
        target: &Expr,
        value: Scalar,
        location: SourceLocation,
        out: &mut dyn Write,
    ) -> Result<()> {
        match target {
            Expr::VariableReference {
                name, index: None, ..
            } => {
                if self.lookup(name).is_some_and(Value::is_array) {
                    return Err(Error::runtime_at(
                        format!("cannot assign a scalar to array {}", name),
                        Some(location),
                    ));
                }
                self.store(name, Value::Scalar(value));
                Ok(())
            }

            Expr::VariableReference {
                name,
                index: Some(index),
                ..
            } => {
                let key = self.eval_scalar(index, out)?;
                let array = self.array_mut(name, location)?;
                array.insert(key.into_string(), value);
                Ok(())
            }

            Expr::Operation {
                op: Operator::Dollar,
                left,
                ..
            } => {
                let name = self.field_name(left, out)?;
                self.globals.set_scalar(name, value);
                Ok(())
            }

            _ => Err(Error::runtime_at(
                format!("invalid assignment target: {}", target),
                Some(location),
            )),
        }
    }

    /// The array bound to `name`, created when the name is unset or an empty scalar
    pub(crate) fn array_mut(&mut self, name: &str, location: SourceLocation) -> Result<&mut Array> {
        let promote = match self.lookup(name) {
            None => true,
            Some(Value::Scalar(s)) if s.is_empty() => true,
            Some(Value::Scalar(_)) => {
                return Err(Error::runtime_at(
                    format!("{} is not an array", name),
                    Some(location),
                ));
            }
            Some(Value::Array(_)) => false,
        };
        if promote {
            self.store(name, Value::Array(Array::new()));
        }

        self.scope_for_mut(name)
            .get_mut(name)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| Error::runtime_at(format!("{} is not an array", name), Some(location)))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::interpreter::Interpreter;
    use crate::parser::parse_source;
    use crate::value::Value;

    fn eval_begin(body: &str) -> Result<String, Error> {
        let ast = parse_source(&format!("BEGIN {{ {} }}", body))?;
        let mut interpreter = Interpreter::new(&ast);
        let mut out = Vec::new();
        interpreter.run(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn test_comparisons() {
        let out = eval_begin(
            r#"print 8 < 4, 8 <= 4, 8 != 4, 8 == 4, 8 > 4, 8 >= 4; print "8" > "4", "abc" < "abd", "10" > "9""#,
        )
        .unwrap();
        assert_eq!(out, "0 0 1 0 1 1\n1 1 1\n");
    }

    #[test]
    fn test_boolean_truthiness() {
        let out = eval_begin(r#"print 1 && "x", 0 || "", !0, !"a", "0.0" && 1"#).unwrap();
        assert_eq!(out, "1 0 1 0 0\n");
    }

    #[test]
    fn test_short_circuit() {
        let out = eval_begin(r#"x = 0; 0 && (x = 1); 1 || (x = 2); print x"#).unwrap();
        assert_eq!(out, "0\n");
    }

    #[test]
    fn test_match_operators() {
        let out = eval_begin(r#"print "hello" ~ `ell`, "hello" !~ `^e`, "abc" ~ `^b`"#).unwrap();
        assert_eq!(out, "1 1 0\n");

        let err = eval_begin(r#"print "hello" ~ "ell""#).unwrap_err();
        assert!(err.to_string().contains("must be a pattern"));
    }

    #[test]
    fn test_pattern_as_value_is_error() {
        let err = eval_begin("x = `abc`").unwrap_err();
        assert!(err.is_runtime());
    }

    #[test]
    fn test_unary_and_increment() {
        let out = eval_begin("x = 5; print -x, +x, ++x, x++, x, --x").unwrap();
        assert_eq!(out, "-5.0 5.0 6.0 7.0 7.0 6.0\n");
    }

    #[test]
    fn test_ternary_uses_literal_one() {
        let out = eval_begin(r#"print (1 ? "y" : "n"), (2 ? "y" : "n"), (1 < 2 ? "y" : "n")"#).unwrap();
        assert_eq!(out, "y n y\n");
    }

    #[test]
    fn test_division_by_zero() {
        let out = eval_begin("print 8 / 0, -8 / 0, 8 % 0, 0 / 0").unwrap();
        assert_eq!(out, "Infinity -Infinity NaN NaN\n");
    }

    #[test]
    fn test_in_operator() {
        let out = eval_begin(r#"a["x"] = 1; print ("x" in a), ("y" in a), ("z" in missing)"#).unwrap();
        assert_eq!(out, "1 0 0\n");

        let err = eval_begin(r#"s = 1; print ("x" in s)"#).unwrap_err();
        assert!(err.to_string().contains("not an array"));
    }

    #[test]
    fn test_array_element_reads() {
        let out = eval_begin(r#"a[1] = "one"; print a[1], a[2] "|"; print length(a[3])"#).unwrap();
        assert_eq!(out, "one |\n0\n");

        let err = eval_begin(r#"s = 1; print s[1]"#).unwrap_err();
        assert!(err.to_string().contains("not an array"));
    }

    #[test]
    fn test_field_assignment_and_name() {
        let ast = parse_source("BEGIN { $(1+1) = \"two\"; print $2; print $\"2\" }").unwrap();
        let mut interpreter = Interpreter::new(&ast);
        let mut out = Vec::new();
        interpreter.run(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "two\ntwo\n");
        assert_eq!(interpreter.global("$2"), Some(&Value::from("two")));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = eval_begin("1 = 2").unwrap_err();
        assert!(err.to_string().contains("invalid assignment target"));
    }

    #[test]
    fn test_assignment_value() {
        let out = eval_begin("print (x = 3) + 1; a = b = \"q\"; print a b").unwrap();
        assert_eq!(out, "4.0\nqq\n");
    }

    #[test]
    fn test_array_in_scalar_context() {
        let err = eval_begin(r#"a[1] = 1; print a"#).unwrap_err();
        assert!(err.to_string().contains("scalar context"));

        let err = eval_begin(r#"a[1] = 1; a = 2"#).unwrap_err();
        assert!(err.to_string().contains("cannot assign"));
    }
}
