mod cursor;

pub use cursor::TokenCursor;

use crate::ast::*;
use crate::error::{Error, Result, SourceLocation};
use crate::lexer::{Lexer, Token, TokenKind};

/// Recursive-descent parser producing a [`Program`]
pub struct Parser {
    cursor: TokenCursor,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
        }
    }

    /// Parse a complete program
    pub fn parse(&mut self) -> Result<Program> {
        let mut program = Program::new();

        loop {
            self.cursor.accept_separators();
            if !self.cursor.more_tokens() {
                break;
            }

            if self.cursor.check(&TokenKind::Function) {
                program.functions.push(self.parse_function()?);
            } else {
                self.parse_action(&mut program)?;
            }
        }

        Ok(program)
    }

    /// `function NAME ( [param {, param}] ) block`
    fn parse_function(&mut self) -> Result<FunctionDef> {
        let location = self.cursor.location();
        self.cursor.advance();

        let Some((name, _)) = self.word() else {
            return Err(self.error("No name for function"));
        };

        if self.cursor.match_and_remove(&TokenKind::LeftParen).is_none() {
            return Err(self.error("Function is not properly declared"));
        }

        let mut params = Vec::new();
        if !self.cursor.check(&TokenKind::RightParen) {
            loop {
                self.cursor.accept_separators();
                match self.word() {
                    Some((param, _)) => params.push(param),
                    None => return Err(self.error("Function is not properly declared")),
                }
                if self.cursor.match_and_remove(&TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        if self.cursor.match_and_remove(&TokenKind::RightParen).is_none() {
            return Err(self.error("Function is not properly declared"));
        }

        let body = self.parse_block()?;

        Ok(FunctionDef {
            name,
            params,
            body: body.statements,
            location,
        })
    }

    /// `BEGIN block`, `END block`, or `[guard] block`
    fn parse_action(&mut self, program: &mut Program) -> Result<()> {
        let location = self.cursor.location();

        if self.cursor.match_and_remove(&TokenKind::Begin).is_some() {
            program.begin_blocks.push(self.parse_block()?);
            return Ok(());
        }

        if self.cursor.match_and_remove(&TokenKind::End).is_some() {
            program.end_blocks.push(self.parse_block()?);
            return Ok(());
        }

        if self.cursor.check(&TokenKind::LeftBrace) || self.starts_statement() {
            program.other_blocks.push(self.parse_block()?);
            return Ok(());
        }

        let guard = self.parse_expression()?;
        let block = if self.cursor.check(&TokenKind::LeftBrace) {
            let body = self.parse_block()?;
            Block::guarded(Some(guard), body.statements, location)
        } else {
            Block::guarded(Some(guard), Vec::new(), location)
        };
        program.other_blocks.push(block);

        Ok(())
    }

    /// `{ statements }` or a single unbraced statement
    fn parse_block(&mut self) -> Result<Block> {
        self.cursor.accept_separators();
        let location = self.cursor.location();

        if self.cursor.match_and_remove(&TokenKind::LeftBrace).is_none() {
            let statement = self.parse_statement()?;
            return Ok(Block::new(vec![statement], location));
        }

        let mut statements = Vec::new();
        loop {
            self.cursor.accept_separators();
            if self.cursor.match_and_remove(&TokenKind::RightBrace).is_some() {
                break;
            }
            if !self.cursor.more_tokens() {
                return Err(self.error("Expected a closing curly brace '}'"));
            }
            statements.push(self.parse_statement()?);
        }

        Ok(Block::new(statements, location))
    }

    fn starts_statement(&self) -> bool {
        matches!(
            self.cursor.peek_kind(0),
            Some(
                TokenKind::If
                    | TokenKind::For
                    | TokenKind::While
                    | TokenKind::Do
                    | TokenKind::Continue
                    | TokenKind::Break
                    | TokenKind::Return
                    | TokenKind::Delete
            )
        )
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let location = self.cursor.location();

        if self.cursor.match_and_remove(&TokenKind::Continue).is_some() {
            return Ok(Stmt::Continue { location });
        }

        if self.cursor.match_and_remove(&TokenKind::Break).is_some() {
            return Ok(Stmt::Break { location });
        }

        if self.cursor.match_and_remove(&TokenKind::If).is_some() {
            return self.parse_if(location);
        }

        if self.cursor.match_and_remove(&TokenKind::For).is_some() {
            return self.parse_for(location);
        }

        if self.cursor.match_and_remove(&TokenKind::Delete).is_some() {
            return self.parse_delete(location);
        }

        if self.cursor.match_and_remove(&TokenKind::While).is_some() {
            let condition = self.parse_condition()?;
            let body = self.parse_block()?;
            return Ok(Stmt::While {
                condition,
                body,
                location,
            });
        }

        if self.cursor.match_and_remove(&TokenKind::Do).is_some() {
            let body = self.parse_block()?;
            self.cursor.accept_separators();
            if self.cursor.match_and_remove(&TokenKind::While).is_none() {
                return Err(self.error("Expected 'while' after do block"));
            }
            let condition = self.parse_condition()?;
            return Ok(Stmt::DoWhile {
                body,
                condition,
                location,
            });
        }

        if self.cursor.match_and_remove(&TokenKind::Return).is_some() {
            let value = if self.can_start_expression() {
                Some(self.parse_expression()?)
            } else {
                None
            };
            return Ok(Stmt::Return { value, location });
        }

        Ok(Stmt::Expr(self.parse_expression()?))
    }

    /// `( expr )` after `if` / `while`
    fn parse_condition(&mut self) -> Result<Expr> {
        if self.cursor.match_and_remove(&TokenKind::LeftParen).is_none() {
            return Err(self.error("Expected an opening parenthesis '('"));
        }
        let condition = self.parse_expression()?;
        self.expect_right_paren()?;
        Ok(condition)
    }

    fn parse_if(&mut self, location: SourceLocation) -> Result<Stmt> {
        let condition = self.parse_condition()?;
        let body = self.parse_block()?;
        let mut branches = vec![IfBranch {
            condition: Some(condition),
            body,
        }];

        loop {
            // separators before `else` belong to the if; otherwise leave them
            let mark = self.cursor.save();
            self.cursor.accept_separators();
            if self.cursor.match_and_remove(&TokenKind::Else).is_none() {
                self.cursor.restore(mark);
                break;
            }

            if self.cursor.match_and_remove(&TokenKind::If).is_some() {
                let condition = self.parse_condition()?;
                let body = self.parse_block()?;
                branches.push(IfBranch {
                    condition: Some(condition),
                    body,
                });
            } else {
                let body = self.parse_block()?;
                branches.push(IfBranch {
                    condition: None,
                    body,
                });
                break;
            }
        }

        Ok(Stmt::If { branches, location })
    }

    /// `for (init; cond; update) block` or `for (x in arr) block`
    fn parse_for(&mut self, location: SourceLocation) -> Result<Stmt> {
        if self.cursor.match_and_remove(&TokenKind::LeftParen).is_none() {
            return Err(self.error("Expected an opening parenthesis '('"));
        }

        let init = if self.cursor.check(&TokenKind::Separator) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        if let Some(Expr::Operation {
            op: Operator::In,
            left,
            right: Some(right),
            ..
        }) = &init
            && let Expr::VariableReference {
                name: variable,
                index: None,
                ..
            } = left.as_ref()
            && let Expr::VariableReference {
                name: array,
                index: None,
                ..
            } = right.as_ref()
            && self.cursor.check(&TokenKind::RightParen)
        {
            let (variable, array) = (variable.clone(), array.clone());
            self.cursor.advance();
            let body = self.parse_block()?;
            return Ok(Stmt::ForEach {
                variable,
                array,
                body,
                location,
            });
        }

        self.expect_separator()?;
        let condition = if self.cursor.check(&TokenKind::Separator) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.expect_separator()?;
        let update = if self.cursor.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_right_paren()?;

        let body = self.parse_block()?;
        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
            location,
        })
    }

    /// `delete name` or `delete name[k {, k}]`
    fn parse_delete(&mut self, location: SourceLocation) -> Result<Stmt> {
        let Some((array, _)) = self.word() else {
            return Err(self.error("Expected an array name after 'delete'"));
        };

        let mut indices = Vec::new();
        if self.cursor.match_and_remove(&TokenKind::LeftBracket).is_some() {
            indices.push(self.parse_expression()?);
            while self.cursor.match_and_remove(&TokenKind::Comma).is_some() {
                indices.push(self.parse_expression()?);
            }
            self.expect_right_bracket()?;
        }

        Ok(Stmt::Delete {
            array,
            indices,
            location,
        })
    }

    // ===== Expressions, lowest precedence first =====

    pub fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr> {
        let target = self.parse_ternary()?;
        let location = self.cursor.location();

        let op = match self.cursor.peek_kind(0) {
            Some(TokenKind::Assign) => None,
            Some(TokenKind::PlusAssign) => Some(Operator::Add),
            Some(TokenKind::MinusAssign) => Some(Operator::Subtract),
            Some(TokenKind::StarAssign) => Some(Operator::Multiply),
            Some(TokenKind::SlashAssign) => Some(Operator::Divide),
            Some(TokenKind::PercentAssign) => Some(Operator::Modulo),
            Some(TokenKind::CaretAssign) => Some(Operator::Exponent),
            _ => return Ok(target),
        };
        self.cursor.advance();

        let value = self.required(Self::parse_assignment)?;
        let (value, form) = match op {
            None => (value, AssignForm::Plain),
            Some(op) => (
                Expr::Operation {
                    op,
                    left: Box::new(target.clone()),
                    right: Some(Box::new(value)),
                    location,
                },
                AssignForm::Compound(op),
            ),
        };

        Ok(Expr::Assignment {
            target: Box::new(target),
            value: Box::new(value),
            form,
            location,
        })
    }

    fn parse_ternary(&mut self) -> Result<Expr> {
        let condition = self.parse_or()?;
        let location = self.cursor.location();

        if self.cursor.match_and_remove(&TokenKind::Question).is_none() {
            return Ok(condition);
        }

        let then_expr = self.required(Self::parse_ternary)?;
        if self.cursor.match_and_remove(&TokenKind::Colon).is_none() {
            return Err(self.error("Expected a colon (':') after the true case expression"));
        }
        let else_expr = self.required(Self::parse_ternary)?;

        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            location,
        })
    }

    fn parse_or(&mut self) -> Result<Expr> {
        self.binary_chain(Self::parse_and, |k| match k {
            TokenKind::Or => Some(Operator::Or),
            _ => None,
        })
    }

    fn parse_and(&mut self) -> Result<Expr> {
        self.binary_chain(Self::parse_in, |k| match k {
            TokenKind::And => Some(Operator::And),
            _ => None,
        })
    }

    fn parse_in(&mut self) -> Result<Expr> {
        self.binary_chain(Self::parse_match, |k| match k {
            TokenKind::In => Some(Operator::In),
            _ => None,
        })
    }

    fn parse_match(&mut self) -> Result<Expr> {
        self.binary_chain(Self::parse_comparison, |k| match k {
            TokenKind::Match => Some(Operator::Match),
            TokenKind::NotMatch => Some(Operator::NotMatch),
            _ => None,
        })
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        self.binary_chain(Self::parse_concatenation, |k| match k {
            TokenKind::Less => Some(Operator::Lt),
            TokenKind::LessEqual => Some(Operator::Le),
            TokenKind::NotEqual => Some(Operator::Ne),
            TokenKind::Equal => Some(Operator::Eq),
            TokenKind::Greater => Some(Operator::Gt),
            TokenKind::GreaterEqual => Some(Operator::Ge),
            _ => None,
        })
    }

    /// Juxtaposed operands, chained to the right
    fn parse_concatenation(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;
        if !self.can_start_concat_operand() {
            return Ok(left);
        }

        let location = self.cursor.location();
        let right = self.parse_concatenation()?;
        Ok(Expr::Operation {
            op: Operator::Concatenation,
            left: Box::new(left),
            right: Some(Box::new(right)),
            location,
        })
    }

    fn can_start_concat_operand(&self) -> bool {
        matches!(
            self.cursor.peek_kind(0),
            Some(
                TokenKind::Word(_)
                    | TokenKind::Number(_)
                    | TokenKind::StringLiteral(_)
                    | TokenKind::Dollar
                    | TokenKind::LeftParen
                    | TokenKind::Not
                    | TokenKind::Increment
                    | TokenKind::Decrement
            )
        )
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        self.binary_chain(Self::parse_multiplicative, |k| match k {
            TokenKind::Plus => Some(Operator::Add),
            TokenKind::Minus => Some(Operator::Subtract),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        self.binary_chain(Self::parse_exponent, |k| match k {
            TokenKind::Star => Some(Operator::Multiply),
            TokenKind::Slash => Some(Operator::Divide),
            TokenKind::Percent => Some(Operator::Modulo),
            _ => None,
        })
    }

    /// Right-associative: `2^3^2` is `2^(3^2)`
    fn parse_exponent(&mut self) -> Result<Expr> {
        let left = self.parse_postfix()?;
        let location = self.cursor.location();

        if self.cursor.match_and_remove(&TokenKind::Caret).is_none() {
            return Ok(left);
        }

        let right = self.required(Self::parse_exponent)?;
        Ok(Expr::Operation {
            op: Operator::Exponent,
            left: Box::new(left),
            right: Some(Box::new(right)),
            location,
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let operand = self.parse_primary()?;
        let location = self.cursor.location();

        let op = match self.cursor.peek_kind(0) {
            Some(TokenKind::Increment) => Operator::PostInc,
            Some(TokenKind::Decrement) => Operator::PostDec,
            _ => return Ok(operand),
        };
        self.cursor.advance();

        Ok(step_assignment(op, operand, location))
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let location = self.cursor.location();
        let Some(kind) = self.cursor.peek_kind(0).cloned() else {
            return Err(self.error("Expected another expression"));
        };

        match kind {
            TokenKind::StringLiteral(text) => {
                self.cursor.advance();
                Ok(Expr::Constant(decode_escapes(&text)))
            }
            TokenKind::Number(text) => {
                self.cursor.advance();
                Ok(Expr::Constant(text))
            }
            TokenKind::Pattern(text) => {
                self.cursor.advance();
                Ok(Expr::Pattern(text))
            }
            TokenKind::LeftParen => {
                self.cursor.advance();
                let inner = self.parse_expression()?;
                self.expect_right_paren()?;
                Ok(inner)
            }
            TokenKind::Not | TokenKind::Minus | TokenKind::Plus => {
                self.cursor.advance();
                let op = match kind {
                    TokenKind::Not => Operator::Not,
                    TokenKind::Minus => Operator::UnaryNeg,
                    _ => Operator::UnaryPos,
                };
                let operand = self.required(Self::parse_exponent)?;
                Ok(Expr::Operation {
                    op,
                    left: Box::new(operand),
                    right: None,
                    location,
                })
            }
            TokenKind::Increment | TokenKind::Decrement => {
                self.cursor.advance();
                let op = if kind == TokenKind::Increment {
                    Operator::PreInc
                } else {
                    Operator::PreDec
                };
                let operand = self.required(Self::parse_primary)?;
                Ok(step_assignment(op, operand, location))
            }
            TokenKind::Dollar => {
                self.cursor.advance();
                let operand = self.required(Self::parse_primary)?;
                Ok(Expr::Operation {
                    op: Operator::Dollar,
                    left: Box::new(operand),
                    right: None,
                    location,
                })
            }
            TokenKind::Print | TokenKind::Printf => {
                self.cursor.advance();
                let name = if kind == TokenKind::Print { "print" } else { "printf" };
                let args = self.parse_print_args()?;
                Ok(Expr::FunctionCall {
                    name: name.to_string(),
                    args,
                    location,
                })
            }
            TokenKind::Getline | TokenKind::Next | TokenKind::Nextfile | TokenKind::Exit => {
                self.cursor.advance();
                let name = match kind {
                    TokenKind::Getline => "getline",
                    TokenKind::Next => "next",
                    TokenKind::Nextfile => "nextfile",
                    _ => "exit",
                };
                let args = if self.cursor.check(&TokenKind::LeftParen) {
                    self.parse_call_args()?
                } else if kind == TokenKind::Exit && self.can_start_expression() {
                    vec![self.parse_expression()?]
                } else {
                    Vec::new()
                };
                Ok(Expr::FunctionCall {
                    name: name.to_string(),
                    args,
                    location,
                })
            }
            TokenKind::Word(name) => {
                self.cursor.advance();
                if self.cursor.check(&TokenKind::LeftParen) {
                    let args = self.parse_call_args()?;
                    return Ok(Expr::FunctionCall {
                        name,
                        args,
                        location,
                    });
                }

                let index = if self.cursor.match_and_remove(&TokenKind::LeftBracket).is_some() {
                    let index = self.parse_expression()?;
                    self.expect_right_bracket()?;
                    Some(Box::new(index))
                } else {
                    None
                };

                Ok(Expr::VariableReference {
                    name,
                    index,
                    location,
                })
            }
            other => Err(self.error(format!("unexpected {}", other))),
        }
    }

    /// `( [expr {, expr}] )`
    fn parse_call_args(&mut self) -> Result<Vec<Expr>> {
        self.cursor.advance();
        let mut args = Vec::new();
        if self.cursor.match_and_remove(&TokenKind::RightParen).is_some() {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if self.cursor.match_and_remove(&TokenKind::Comma).is_none() {
                break;
            }
            self.cursor.accept_separators();
        }
        self.expect_right_paren()?;
        Ok(args)
    }

    /// `print (a, b)` or `print a, b` running to the end of the statement
    fn parse_print_args(&mut self) -> Result<Vec<Expr>> {
        if self.cursor.check(&TokenKind::LeftParen) {
            let mark = self.cursor.save();
            if let Ok(args) = self.parse_call_args()
                && self.at_statement_end()
            {
                return Ok(args);
            }
            self.cursor.restore(mark);
        }

        let mut args = Vec::new();
        if self.at_statement_end() {
            return Ok(args);
        }

        args.push(self.parse_expression()?);
        while self.cursor.match_and_remove(&TokenKind::Comma).is_some() {
            args.push(self.required(Self::parse_expression)?);
        }
        Ok(args)
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.cursor.peek_kind(0),
            None | Some(TokenKind::Separator | TokenKind::RightBrace | TokenKind::Eof)
        )
    }

    // ===== Helper methods =====

    /// Left-associative chain of one precedence level
    fn binary_chain(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr>,
        operator: fn(&TokenKind) -> Option<Operator>,
    ) -> Result<Expr> {
        let mut left = operand(self)?;

        while let Some(op) = self.cursor.peek_kind(0).and_then(operator) {
            let location = self.cursor.location();
            self.cursor.advance();
            let right = self.required(operand)?;
            left = Expr::Operation {
                op,
                left: Box::new(left),
                right: Some(Box::new(right)),
                location,
            };
        }

        Ok(left)
    }

    /// Operand that must be present, e.g. after a binary operator
    fn required(&mut self, parse: fn(&mut Self) -> Result<Expr>) -> Result<Expr> {
        if !self.can_start_expression() {
            return Err(self.error("Expected another expression"));
        }
        parse(self)
    }

    fn can_start_expression(&self) -> bool {
        self.cursor
            .peek_kind(0)
            .map(|k| k.can_start_expression())
            .unwrap_or(false)
    }

    fn word(&mut self) -> Option<(String, SourceLocation)> {
        let token = self.cursor.match_and_remove(&TokenKind::Word(String::new()))?;
        match token.kind {
            TokenKind::Word(name) => Some((name, token.location)),
            _ => None,
        }
    }

    fn expect_right_paren(&mut self) -> Result<()> {
        match self.cursor.match_and_remove(&TokenKind::RightParen) {
            Some(_) => Ok(()),
            None => Err(self.error("Expected a closing parenthesis ')'")),
        }
    }

    fn expect_right_bracket(&mut self) -> Result<()> {
        match self.cursor.match_and_remove(&TokenKind::RightBracket) {
            Some(_) => Ok(()),
            None => Err(self.error("Expected a closing square bracket ']'")),
        }
    }

    fn expect_separator(&mut self) -> Result<()> {
        match self.cursor.match_and_remove(&TokenKind::Separator) {
            Some(_) => Ok(()),
            None => Err(self.error("Expected a ';' in for loop header")),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        let mut message = message.into();
        if let Some(token) = self.cursor.peek(0) {
            message.push_str(&format!(", found {}", token));
        }
        Error::parser(message, self.cursor.location())
    }
}

/// Lex and parse in one step
pub fn parse_source(source: &str) -> Result<Program> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse()
}

/// `x++` and `++x` become `x = Operation(op, x)` so the write-back is explicit
fn step_assignment(op: Operator, operand: Expr, location: SourceLocation) -> Expr {
    Expr::Assignment {
        target: Box::new(operand.clone()),
        value: Box::new(Expr::Operation {
            op,
            left: Box::new(operand),
            right: None,
            location,
        }),
        form: AssignForm::Step,
        location,
    }
}

/// Decode `\n \t \r \\ \" \/`; other escapes are kept as written
fn decode_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('/') => out.push('/'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
