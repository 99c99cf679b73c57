//! Recursive descent parser for Qalam

use super::tree::*;
use super::DEFAULT_MAX_DEPTH;
use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::ast::{BinaryOp, PassMode, UnaryOp};
use crate::frontend::lexer::{Lexer, Token, TokenKind};

/// Recursive descent parser producing a [`ProgramTree`]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    prev_span: Span,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source
    pub fn new(source: &'a str) -> CompileResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            prev_span: current.span,
            current,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// Limit nesting of instructions and expressions
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse a complete program, stopping at the first syntax error
    pub fn parse(&mut self) -> CompileResult<ProgramTree> {
        let start = self.current.span;
        self.expect(TokenKind::Program)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Semi)?;
        let block = self.parse_block()?;
        self.expect(TokenKind::Dot)?;
        let span = self.span_from(start);

        if !self.at_end() {
            return Err(CompileError::parser(
                format!("unexpected {} after end of program", self.current.kind),
                self.current.span,
            ));
        }

        Ok(ProgramTree { name, block, span })
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> CompileResult<Token> {
        let prev = std::mem::replace(&mut self.current, self.lexer.next_token()?);
        self.prev_span = prev.span;
        Ok(prev)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> CompileResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(&kind) {
            self.advance()
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_ident(&mut self) -> CompileResult<Ident> {
        if let TokenKind::Identifier(text) = &self.current.kind {
            let ident = Ident::new(text.clone(), self.current.span);
            self.advance()?;
            Ok(ident)
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    fn check_ident(&self) -> bool {
        matches!(self.current.kind, TokenKind::Identifier(_))
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        CompileError::parser(
            format!("expected {}, found {}", expected, self.current.kind),
            self.current.span,
        )
    }

    /// Span from `start` to the end of the last consumed token
    fn span_from(&self, start: Span) -> Span {
        start.merge(self.prev_span)
    }

    fn enter_nesting(&mut self) -> CompileResult<()> {
        if self.depth >= self.max_depth {
            return Err(CompileError::parser(
                format!("nesting too deep (limit {})", self.max_depth),
                self.current.span,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave_nesting(&mut self) {
        self.depth -= 1;
    }

    // =========================================================================
    // Blocks and definitions
    // =========================================================================

    fn parse_block(&mut self) -> CompileResult<BlockTree> {
        let start = self.current.span;
        let mut constants = Vec::new();
        let mut types = Vec::new();
        let mut variables = Vec::new();
        let mut procedures = Vec::new();
        let mut stage = 0;

        while self.current.kind.starts_section() {
            let rank = match self.current.kind {
                TokenKind::Const => 0,
                TokenKind::Type => 1,
                TokenKind::Var => 2,
                _ => 3,
            };
            if rank < stage {
                return Err(CompileError::parser(
                    format!(
                        "section {} must come before the sections already defined",
                        self.current.kind
                    ),
                    self.current.span,
                ));
            }
            stage = rank;

            match self.current.kind {
                TokenKind::Const => {
                    self.advance()?;
                    loop {
                        constants.push(self.parse_constant_def()?);
                        if !self.check_ident() {
                            break;
                        }
                    }
                }
                TokenKind::Type => {
                    self.advance()?;
                    loop {
                        types.push(self.parse_type_def()?);
                        if !self.check_ident() {
                            break;
                        }
                    }
                }
                TokenKind::Var => {
                    self.advance()?;
                    loop {
                        variables.push(self.parse_name_group()?);
                        self.expect(TokenKind::Semi)?;
                        if !self.check_ident() {
                            break;
                        }
                    }
                }
                _ => procedures.push(self.parse_procedure()?),
            }
        }

        let body = self.parse_compound()?;
        Ok(BlockTree {
            constants,
            types,
            variables,
            procedures,
            body,
            span: self.span_from(start),
        })
    }

    fn parse_constant_def(&mut self) -> CompileResult<ConstantDefTree> {
        let name = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;

        let value = if self.check_ident() {
            ConstantValueTree::Name(self.expect_ident()?)
        } else {
            let start = self.current.span;
            let negative = match self.current.kind {
                TokenKind::Minus => {
                    self.advance()?;
                    true
                }
                TokenKind::Plus => {
                    self.advance()?;
                    false
                }
                _ => {
                    let literal = self.parse_literal()?;
                    self.expect(TokenKind::Semi)?;
                    let span = name.span.merge(self.prev_span);
                    return Ok(ConstantDefTree {
                        name,
                        value: ConstantValueTree::Literal(literal),
                        span,
                    });
                }
            };

            let mut literal = self.parse_literal()?;
            literal.kind = match literal.kind {
                LiteralKind::Integer(v) if negative => LiteralKind::Integer(-v),
                LiteralKind::Real(v) if negative => LiteralKind::Real(-v),
                kind @ (LiteralKind::Integer(_) | LiteralKind::Real(_)) => kind,
                _ => {
                    return Err(CompileError::parser(
                        "a sign may only precede a numeric constant",
                        literal.span,
                    ))
                }
            };
            literal.span = start.merge(literal.span);
            ConstantValueTree::Literal(literal)
        };

        self.expect(TokenKind::Semi)?;
        let span = self.span_from(name.span);
        Ok(ConstantDefTree { name, value, span })
    }

    fn parse_type_def(&mut self) -> CompileResult<TypeDefTree> {
        let name = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;

        let spec = match self.current.kind {
            TokenKind::List => {
                self.advance()?;
                self.expect(TokenKind::LBracket)?;
                let size_token = self.expect(TokenKind::IntLiteral(String::new()))?;
                let size = match &size_token.kind {
                    TokenKind::IntLiteral(text) => text.parse::<usize>().ok(),
                    _ => None,
                };
                let size = match size {
                    Some(size) if size > 0 => size,
                    _ => {
                        return Err(CompileError::parser(
                            "list size must be a positive integer",
                            size_token.span,
                        ))
                    }
                };
                self.expect(TokenKind::RBracket)?;
                self.expect(TokenKind::Of)?;
                let element = self.expect_ident()?;
                CompositeTypeTree::List { size, element }
            }
            TokenKind::Record => {
                self.advance()?;
                self.expect(TokenKind::LBrace)?;
                let mut fields = Vec::new();
                loop {
                    fields.push(self.parse_name_group()?);
                    self.expect(TokenKind::Semi)?;
                    if !self.check_ident() {
                        break;
                    }
                }
                self.expect(TokenKind::RBrace)?;
                CompositeTypeTree::Record { fields }
            }
            _ => return Err(self.unexpected("'قائمة' or 'سجل'")),
        };

        self.expect(TokenKind::Semi)?;
        let span = self.span_from(name.span);
        Ok(TypeDefTree { name, spec, span })
    }

    /// `a، b: type` without the terminator
    fn parse_name_group(&mut self) -> CompileResult<NameGroupTree> {
        let start = self.current.span;
        let mut names = vec![self.expect_ident()?];
        while self.match_token(&TokenKind::Comma)? {
            names.push(self.expect_ident()?);
        }
        self.expect(TokenKind::Colon)?;
        let type_name = self.expect_ident()?;
        Ok(NameGroupTree {
            names,
            type_name,
            span: self.span_from(start),
        })
    }

    fn parse_procedure(&mut self) -> CompileResult<ProcedureTree> {
        self.enter_nesting()?;
        let result = self.parse_procedure_inner();
        self.leave_nesting();
        result
    }

    fn parse_procedure_inner(&mut self) -> CompileResult<ProcedureTree> {
        let start = self.expect(TokenKind::Procedure)?.span;
        let name = self.expect_ident()?;

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let mode = match self.current.kind {
                    TokenKind::ByValue => {
                        self.advance()?;
                        Some(PassMode::ByValue)
                    }
                    TokenKind::ByReference => {
                        self.advance()?;
                        Some(PassMode::ByReference)
                    }
                    _ => None,
                };
                let group = self.parse_name_group()?;
                params.push(ParamGroupTree { mode, group });

                if !self.match_token(&TokenKind::Semi)? {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let block = self.parse_block()?;
        Ok(ProcedureTree {
            name,
            params,
            block,
            span: self.span_from(start),
        })
    }

    // =========================================================================
    // Instructions
    // =========================================================================

    fn parse_compound(&mut self) -> CompileResult<CompoundTree> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut instructions = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            instructions.push(self.parse_instruction()?);
        }

        self.expect(TokenKind::RBrace)?;
        Ok(CompoundTree {
            instructions,
            span: self.span_from(start),
        })
    }

    fn parse_instruction(&mut self) -> CompileResult<InstructionTree> {
        self.enter_nesting()?;
        let result = self.parse_instruction_inner();
        self.leave_nesting();
        result
    }

    fn parse_instruction_inner(&mut self) -> CompileResult<InstructionTree> {
        let start = self.current.span;

        let kind = match self.current.kind {
            TokenKind::Identifier(_) => {
                if self.lexer.check(&TokenKind::LParen)? {
                    let name = self.expect_ident()?;
                    self.expect(TokenKind::LParen)?;
                    let args = if self.check(&TokenKind::RParen) {
                        Vec::new()
                    } else {
                        self.parse_expression_list()?
                    };
                    self.expect(TokenKind::RParen)?;
                    self.expect(TokenKind::Semi)?;
                    InstructionKind::Call { name, args }
                } else {
                    let target = self.parse_variable_access()?;
                    self.expect(TokenKind::Eq)?;
                    let value = self.parse_expression()?;
                    self.expect(TokenKind::Semi)?;
                    InstructionKind::Assignment { target, value }
                }
            }

            TokenKind::Read => {
                self.advance()?;
                self.expect(TokenKind::LParen)?;
                let target = self.parse_variable_access()?;
                self.expect(TokenKind::RParen)?;
                self.expect(TokenKind::Semi)?;
                InstructionKind::Input(target)
            }

            TokenKind::Print => {
                self.advance()?;
                self.expect(TokenKind::LParen)?;
                let items = self.parse_expression_list()?;
                self.expect(TokenKind::RParen)?;
                self.expect(TokenKind::Semi)?;
                InstructionKind::Output(items)
            }

            TokenKind::If => InstructionKind::If(self.parse_if()?),

            TokenKind::For => {
                self.advance()?;
                let variable = self.expect_ident()?;
                self.expect(TokenKind::Of)?;
                let start_expr = self.parse_expression()?;
                self.expect(TokenKind::To)?;
                let end = self.parse_expression()?;
                let step = if self.match_token(&TokenKind::Step)? {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                self.expect(TokenKind::Do)?;
                let body = Box::new(self.parse_instruction()?);
                InstructionKind::For {
                    variable,
                    start: start_expr,
                    end,
                    step,
                    body,
                }
            }

            TokenKind::While => {
                self.advance()?;
                let condition = self.parse_condition()?;
                self.expect(TokenKind::Do)?;
                let body = Box::new(self.parse_instruction()?);
                InstructionKind::While { condition, body }
            }

            TokenKind::Repeat => {
                self.advance()?;
                let body = Box::new(self.parse_instruction()?);
                self.expect(TokenKind::Until)?;
                let condition = self.parse_condition()?;
                self.expect(TokenKind::Semi)?;
                InstructionKind::Repeat { body, condition }
            }

            TokenKind::LBrace => InstructionKind::Compound(self.parse_compound()?),

            TokenKind::Semi => {
                self.advance()?;
                InstructionKind::Empty
            }

            _ => return Err(self.unexpected("instruction")),
        };

        Ok(InstructionTree {
            kind,
            span: self.span_from(start),
        })
    }

    /// `'(' expression ')'`
    fn parse_condition(&mut self) -> CompileResult<ExpressionTree> {
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        Ok(condition)
    }

    fn parse_if(&mut self) -> CompileResult<IfTree> {
        self.expect(TokenKind::If)?;
        let mut conditions = vec![self.parse_condition()?];
        self.expect(TokenKind::Then)?;
        let mut instructions = vec![self.parse_instruction()?];

        while self.check(&TokenKind::Else) {
            if self.lexer.check(&TokenKind::If)? {
                self.advance()?;
                self.advance()?;
                conditions.push(self.parse_condition()?);
                self.expect(TokenKind::Then)?;
                instructions.push(self.parse_instruction()?);
            } else {
                self.advance()?;
                instructions.push(self.parse_instruction()?);
                break;
            }
        }

        Ok(IfTree {
            conditions,
            instructions,
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expression_list(&mut self) -> CompileResult<Vec<ExpressionTree>> {
        let mut items = vec![self.parse_expression()?];
        while self.match_token(&TokenKind::Comma)? {
            items.push(self.parse_expression()?);
        }
        Ok(items)
    }

    fn parse_expression(&mut self) -> CompileResult<ExpressionTree> {
        self.enter_nesting()?;
        let result = self.parse_expression_inner();
        self.leave_nesting();
        result
    }

    fn parse_expression_inner(&mut self) -> CompileResult<ExpressionTree> {
        let start = self.current.span;
        let left = self.parse_simple_expression()?;

        let relation = match binary_op(&self.current.kind) {
            Some(op) if op.is_relational() => {
                self.advance()?;
                Some((op, self.parse_simple_expression()?))
            }
            _ => None,
        };

        Ok(ExpressionTree {
            left,
            relation,
            span: self.span_from(start),
        })
    }

    fn parse_simple_expression(&mut self) -> CompileResult<SimpleExpressionTree> {
        let start = self.current.span;
        let sign = match self.current.kind {
            TokenKind::Plus => Some((UnaryOp::Plus, self.advance()?.span)),
            TokenKind::Minus => Some((UnaryOp::Minus, self.advance()?.span)),
            _ => None,
        };

        let first = self.parse_term()?;
        let mut rest = Vec::new();
        while self.current.kind.is_add_op() {
            if let Some(op) = binary_op(&self.current.kind) {
                self.advance()?;
                rest.push((op, self.parse_term()?));
            }
        }

        Ok(SimpleExpressionTree {
            sign,
            first,
            rest,
            span: self.span_from(start),
        })
    }

    fn parse_term(&mut self) -> CompileResult<TermTree> {
        let start = self.current.span;
        let first = self.parse_factor()?;
        let mut rest = Vec::new();
        while self.current.kind.is_mul_op() {
            if let Some(op) = binary_op(&self.current.kind) {
                self.advance()?;
                rest.push((op, self.parse_factor()?));
            }
        }

        Ok(TermTree {
            first,
            rest,
            span: self.span_from(start),
        })
    }

    fn parse_factor(&mut self) -> CompileResult<FactorTree> {
        let start = self.current.span;

        let kind = match self.current.kind {
            TokenKind::Identifier(_) => FactorKind::Variable(self.parse_variable_access()?),

            TokenKind::LParen => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                FactorKind::Parenthesized(Box::new(inner))
            }

            TokenKind::Bang => {
                self.advance()?;
                self.enter_nesting()?;
                let operand = self.parse_factor();
                self.leave_nesting();
                FactorKind::Not(Box::new(operand?))
            }

            TokenKind::IntLiteral(_)
            | TokenKind::RealLiteral(_)
            | TokenKind::StringLiteral(_)
            | TokenKind::CharLiteral(_)
            | TokenKind::True
            | TokenKind::False => FactorKind::Literal(self.parse_literal()?),

            _ => return Err(self.unexpected("expression")),
        };

        Ok(FactorTree {
            kind,
            span: self.span_from(start),
        })
    }

    fn parse_variable_access(&mut self) -> CompileResult<VariableAccessTree> {
        let name = self.expect_ident()?;
        let mut selectors = Vec::new();

        loop {
            let start = self.current.span;
            let kind = if self.match_token(&TokenKind::LBracket)? {
                let index = self.parse_expression()?;
                self.expect(TokenKind::RBracket)?;
                SelectorTreeKind::Index(Box::new(index))
            } else if self.check(&TokenKind::Dot) && self.lexer.check(&TokenKind::Identifier(String::new()))? {
                self.advance()?;
                SelectorTreeKind::Field(self.expect_ident()?)
            } else {
                break;
            };
            selectors.push(SelectorTree {
                kind,
                span: self.span_from(start),
            });
        }

        let span = self.span_from(name.span);
        Ok(VariableAccessTree {
            name,
            selectors,
            span,
        })
    }

    fn parse_literal(&mut self) -> CompileResult<LiteralTree> {
        let token = self.advance()?;
        let kind = match token.kind {
            TokenKind::IntLiteral(text) => match text.parse::<i64>() {
                Ok(v) => LiteralKind::Integer(v),
                Err(_) => {
                    return Err(CompileError::parser(
                        format!("integer literal {} is out of range", text),
                        token.span,
                    ))
                }
            },
            TokenKind::RealLiteral(text) => match text.parse::<f64>() {
                Ok(v) => LiteralKind::Real(v),
                Err(_) => {
                    return Err(CompileError::parser(
                        format!("invalid real literal {}", text),
                        token.span,
                    ))
                }
            },
            TokenKind::StringLiteral(text) => LiteralKind::String(strip_quotes(&text, '"').to_string()),
            TokenKind::CharLiteral(text) => match strip_quotes(&text, '\'').chars().next() {
                Some(c) => LiteralKind::Char(c),
                None => return Err(CompileError::parser("empty character literal", token.span)),
            },
            TokenKind::True => LiteralKind::Boolean(true),
            TokenKind::False => LiteralKind::Boolean(false),
            other => {
                return Err(CompileError::parser(
                    format!("expected literal, found {}", other),
                    token.span,
                ))
            }
        };

        Ok(LiteralTree {
            kind,
            span: token.span,
        })
    }
}

fn strip_quotes(text: &str, quote: char) -> &str {
    text.strip_prefix(quote)
        .and_then(|s| s.strip_suffix(quote))
        .unwrap_or(text)
}

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Backslash => BinaryOp::IntDiv,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::AmpAmp => BinaryOp::And,
        TokenKind::PipePipe => BinaryOp::Or,
        _ => return None,
    })
}
