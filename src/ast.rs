//! Syntax tree shared by the parser and the interpreter.
//!
//! Every node implements [`Display`](std::fmt::Display) with a fixed,
//! deterministic layout that mirrors the production it was parsed from. The
//! renderings are used in diagnostics and golden-text tests, so spacing here
//! is part of the contract.

use std::fmt;

use crate::error::SourceLocation;

/// A parsed script: BEGIN, END and pattern-action blocks plus functions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub begin_blocks: Vec<Block>,
    pub end_blocks: Vec<Block>,
    pub other_blocks: Vec<Block>,
    pub functions: Vec<FunctionDef>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }
}

/// User-defined function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub location: SourceLocation,
}

/// A statement list with an optional guard.
///
/// At top level the guard is the rule's pattern; blocks nested in statements
/// never carry one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub condition: Option<Expr>,
    pub statements: Vec<Stmt>,
    pub location: SourceLocation,
}

impl Block {
    pub fn new(statements: Vec<Stmt>, location: SourceLocation) -> Self {
        Self {
            condition: None,
            statements,
            location,
        }
    }

    pub fn guarded(condition: Option<Expr>, statements: Vec<Stmt>, location: SourceLocation) -> Self {
        Self {
            condition,
            statements,
            location,
        }
    }

    /// Statements inside braces, one per line
    fn fmt_body(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            writeln!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// One arm of an `if` / `else if` / `else` chain. The final `else` has no condition.
#[derive(Debug, Clone, PartialEq)]
pub struct IfBranch {
    pub condition: Option<Expr>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Assignment or bare expression evaluated for its side effects
    Expr(Expr),

    If {
        branches: Vec<IfBranch>,
        location: SourceLocation,
    },

    For {
        init: Option<Expr>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Block,
        location: SourceLocation,
    },

    /// `for (variable in array)`
    ForEach {
        variable: String,
        array: String,
        body: Block,
        location: SourceLocation,
    },

    While {
        condition: Expr,
        body: Block,
        location: SourceLocation,
    },

    DoWhile {
        body: Block,
        condition: Expr,
        location: SourceLocation,
    },

    Return {
        value: Option<Expr>,
        location: SourceLocation,
    },

    Break {
        location: SourceLocation,
    },

    Continue {
        location: SourceLocation,
    },

    /// `delete array` when `indices` is empty, else `delete array[k, ...]`
    Delete {
        array: String,
        indices: Vec<Expr>,
        location: SourceLocation,
    },
}

/// How an assignment was written; only affects rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignForm {
    /// `target = value`
    Plain,
    /// `target op= value`, stored as `target = target op value`
    Compound(Operator),
    /// `++x`, `x--` and friends, stored as `x = Operation(op, x)`
    Step,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String or number literal; string escapes are already decoded
    Constant(String),

    /// Backtick regex literal, only valid on the right of `~` / `!~` or as a guard
    Pattern(String),

    VariableReference {
        name: String,
        index: Option<Box<Expr>>,
        location: SourceLocation,
    },

    /// Unary operators keep their operand in `left` and leave `right` empty
    Operation {
        op: Operator,
        left: Box<Expr>,
        right: Option<Box<Expr>>,
        location: SourceLocation,
    },

    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
        location: SourceLocation,
    },

    FunctionCall {
        name: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },

    Assignment {
        target: Box<Expr>,
        value: Box<Expr>,
        form: AssignForm,
        location: SourceLocation,
    },
}

impl Expr {
    pub fn constant(value: impl Into<String>) -> Self {
        Expr::Constant(value.into())
    }

    pub fn pattern(value: impl Into<String>) -> Self {
        Expr::Pattern(value.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::VariableReference {
            name: name.into(),
            index: None,
            location: SourceLocation::default(),
        }
    }

    pub fn element(name: impl Into<String>, index: Expr) -> Self {
        Expr::VariableReference {
            name: name.into(),
            index: Some(Box::new(index)),
            location: SourceLocation::default(),
        }
    }

    pub fn unary(op: Operator, operand: Expr) -> Self {
        Expr::Operation {
            op,
            left: Box::new(operand),
            right: None,
            location: SourceLocation::default(),
        }
    }

    pub fn binary(op: Operator, left: Expr, right: Expr) -> Self {
        Expr::Operation {
            op,
            left: Box::new(left),
            right: Some(Box::new(right)),
            location: SourceLocation::default(),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::FunctionCall {
            name: name.into(),
            args,
            location: SourceLocation::default(),
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assignment {
            target: Box::new(target),
            value: Box::new(value),
            form: AssignForm::Plain,
            location: SourceLocation::default(),
        }
    }

    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Expr::Constant(_) | Expr::Pattern(_) => None,
            Expr::VariableReference { location, .. }
            | Expr::Operation { location, .. }
            | Expr::Ternary { location, .. }
            | Expr::FunctionCall { location, .. }
            | Expr::Assignment { location, .. } => Some(*location),
        }
    }
}

/// The closed operator set of [`Expr::Operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Prefix
    PreInc,
    PreDec,
    Dollar,
    UnaryNeg,
    UnaryPos,
    Not,
    // Postfix
    PostInc,
    PostDec,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Boolean
    And,
    Or,
    // Regex
    Match,
    NotMatch,
    // Arithmetic
    Exponent,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    /// Juxtaposition
    Concatenation,
    /// Array membership
    In,
}

impl Operator {
    pub fn is_prefix(self) -> bool {
        matches!(
            self,
            Operator::PreInc
                | Operator::PreDec
                | Operator::Dollar
                | Operator::UnaryNeg
                | Operator::UnaryPos
                | Operator::Not
        )
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, Operator::PostInc | Operator::PostDec)
    }

    /// Text placed between (or before/after) the operands when rendering
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::PreInc | Operator::PostInc => "++",
            Operator::PreDec | Operator::PostDec => "--",
            Operator::Dollar => "$",
            Operator::UnaryNeg => "-",
            Operator::UnaryPos => "+",
            Operator::Not => "!",
            Operator::Eq => " == ",
            Operator::Ne => " != ",
            Operator::Lt => " < ",
            Operator::Le => " <= ",
            Operator::Gt => " > ",
            Operator::Ge => " >= ",
            Operator::And => " && ",
            Operator::Or => " || ",
            Operator::Match => " ~ ",
            Operator::NotMatch => " !~ ",
            Operator::Exponent => "^",
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Concatenation => " ",
            Operator::In => " in ",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for function in &self.functions {
            writeln!(f, "{}", function)?;
        }
        for block in &self.begin_blocks {
            writeln!(f, "BEGIN {}", block)?;
        }
        for block in &self.end_blocks {
            writeln!(f, "END {}", block)?;
        }
        for block in &self.other_blocks {
            write!(f, "{} ", block)?;
        }
        Ok(())
    }
}

impl fmt::Display for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "function {}({}) {{", self.name, self.params.join(", "))?;
        for stmt in &self.body {
            writeln!(f, "{}", stmt)?;
        }
        f.write_str("}")
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.condition, self.statements.is_empty()) {
            (Some(condition), true) => write!(f, "{}", condition),
            (Some(condition), false) => {
                writeln!(f, "{} {{", condition)?;
                self.fmt_body(f)?;
                f.write_str("}")
            }
            (None, _) => {
                let mut text = String::new();
                for stmt in &self.statements {
                    text.push_str(&stmt.to_string());
                    text.push(' ');
                }
                f.write_str(text.trim_end())
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expr(expr) => write!(f, "{}", expr),
            Stmt::If { branches, .. } => {
                for (i, branch) in branches.iter().enumerate() {
                    match (&branch.condition, i) {
                        (Some(c), 0) => writeln!(f, "if ({}) {{", c)?,
                        (Some(c), _) => writeln!(f, " else if ({}) {{", c)?,
                        (None, _) => writeln!(f, " else {{")?,
                    }
                    branch.body.fmt_body(f)?;
                    f.write_str("} ")?;
                }
                Ok(())
            }
            Stmt::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                writeln!(
                    f,
                    "for ({}; {}; {}) {{",
                    OptExpr(init),
                    OptExpr(condition),
                    OptExpr(update)
                )?;
                body.fmt_body(f)?;
                f.write_str("} ")
            }
            Stmt::ForEach {
                variable,
                array,
                body,
                ..
            } => {
                writeln!(f, "for ({} in {}) {{", variable, array)?;
                body.fmt_body(f)?;
                f.write_str("} ")
            }
            Stmt::While {
                condition, body, ..
            } => {
                writeln!(f, "while ({}) {{", condition)?;
                body.fmt_body(f)?;
                f.write_str("} ")
            }
            Stmt::DoWhile {
                body, condition, ..
            } => {
                writeln!(f, "do {{")?;
                body.fmt_body(f)?;
                write!(f, "}} while ({}); ", condition)
            }
            Stmt::Return { value, .. } => match value {
                Some(v) => write!(f, "return {} ", v),
                None => f.write_str("return "),
            },
            Stmt::Break { .. } => f.write_str("break "),
            Stmt::Continue { .. } => f.write_str("continue "),
            Stmt::Delete { array, indices, .. } => {
                if indices.is_empty() {
                    write!(f, "delete {} ", array)
                } else {
                    write!(f, "delete {}[{}] ", array, join(indices))
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(value) => f.write_str(value),
            Expr::Pattern(value) => write!(f, "`{}`", value),
            Expr::VariableReference { name, index, .. } => match index {
                Some(index) => write!(f, "{}[{}]", name, index),
                None => f.write_str(name),
            },
            Expr::Operation {
                op, left, right, ..
            } => {
                if op.is_prefix() {
                    write!(f, "{}{}", op.symbol(), left)
                } else if op.is_postfix() {
                    write!(f, "{}{}", left, op.symbol())
                } else {
                    write!(f, "{}{}{}", left, op.symbol(), OptExpr(right))
                }
            }
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                ..
            } => write!(f, "{} ? {} : {}", condition, then_expr, else_expr),
            Expr::FunctionCall { name, args, .. } => write!(f, "{}({}) ", name, join(args)),
            Expr::Assignment {
                target,
                value,
                form,
                ..
            } => match form {
                AssignForm::Plain => write!(f, "{} = {}", target, value),
                AssignForm::Compound(op) => {
                    write!(f, "{} {}= {}", target, op.symbol().trim(), value)
                }
                AssignForm::Step => write!(f, "{}{}", target, value),
            },
        }
    }
}

struct OptExpr<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for OptExpr<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(inner) => inner.fmt(f),
            None => Ok(()),
        }
    }
}

fn join(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
