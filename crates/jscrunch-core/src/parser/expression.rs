use super::{Parser, ParserError};
use crate::ast::*;
use crate::lexer::TokenKind;

pub trait ExpressionParser {
    /// Full expression including the comma operator. `no_in` suppresses the
    /// `in` operator at this level, for for-loop heads.
    fn parse_expression(&mut self, no_in: bool) -> Result<Expression, ParserError>;
    fn parse_assignment(&mut self, no_in: bool) -> Result<Expression, ParserError>;
}

impl ExpressionParser for Parser {
    fn parse_expression(&mut self, no_in: bool) -> Result<Expression, ParserError> {
        let mut expr = self.parse_assignment(no_in)?;
        while self.match_token(&[TokenKind::Comma]) {
            let right = self.parse_assignment(no_in)?;
            expr = Expression::binary(BinaryOp::Comma, expr, right);
        }
        Ok(expr)
    }

    fn parse_assignment(&mut self, no_in: bool) -> Result<Expression, ParserError> {
        let target = self.parse_conditional(no_in)?;

        let Some(op) = assignment_op(self.current_kind()) else {
            return Ok(target);
        };
        if !matches!(
            target.kind,
            ExpressionKind::Identifier(_) | ExpressionKind::Member(..) | ExpressionKind::Index(..)
        ) {
            return Err(self.error_here("Invalid assignment target"));
        }
        self.advance();
        let value = self.parse_assignment(no_in)?;
        Ok(Expression::binary(op, target, value))
    }
}

impl Parser {
    fn parse_conditional(&mut self, no_in: bool) -> Result<Expression, ParserError> {
        let test = self.parse_binary(Precedence::LogicalOr, no_in)?;
        if !self.match_token(&[TokenKind::Question]) {
            return Ok(test);
        }
        let consequent = self.parse_assignment(false)?;
        self.consume(TokenKind::Colon, "Expected ':' in conditional expression")?;
        let alternate = self.parse_assignment(no_in)?;
        Ok(Expression::conditional(test, consequent, alternate))
    }

    /// Precedence climbing over the left-associative binary operators.
    fn parse_binary(&mut self, min: Precedence, no_in: bool) -> Result<Expression, ParserError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match binary_op(self.current_kind()) {
                Some(BinaryOp::In) if no_in => break,
                Some(op) if op.precedence() >= min => op,
                _ => break,
            };
            self.advance();
            let right = self.parse_binary(op.precedence().next(), no_in)?;
            left = Expression::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParserError> {
        let start_span = self.current_span();
        let op = match self.current_kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Minus,
            TokenKind::Typeof => UnaryOp::Typeof,
            TokenKind::Void => UnaryOp::Void,
            TokenKind::Delete => UnaryOp::Delete,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.at(&TokenKind::PlusPlus) {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.advance();
                let operand = self.parse_unary()?;
                return Ok(Expression::new(
                    ExpressionKind::Update {
                        op,
                        prefix: true,
                        operand: Box::new(operand),
                    },
                    self.span_from(start_span),
                ));
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expression::new(
            ExpressionKind::Unary(op, Box::new(operand)),
            self.span_from(start_span),
        ))
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParserError> {
        let start_span = self.current_span();
        let operand = self.parse_left_hand_side()?;
        let op = match self.current_kind() {
            _ if self.current().newline_before => return Ok(operand),
            TokenKind::PlusPlus => UpdateOp::Increment,
            TokenKind::MinusMinus => UpdateOp::Decrement,
            _ => return Ok(operand),
        };
        self.advance();
        Ok(Expression::new(
            ExpressionKind::Update {
                op,
                prefix: false,
                operand: Box::new(operand),
            },
            self.span_from(start_span),
        ))
    }

    /// Member access, calls, and `new`.
    fn parse_left_hand_side(&mut self) -> Result<Expression, ParserError> {
        let start_span = self.current_span();
        let mut expr = if self.at(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            expr = match self.current_kind() {
                TokenKind::LeftParen => {
                    let args = self.parse_arguments()?;
                    Expression::new(
                        ExpressionKind::Call(Box::new(expr), args),
                        self.span_from(start_span),
                    )
                }
                TokenKind::Dot | TokenKind::LeftBracket => self.parse_member_suffix(expr, start_span)?,
                _ => break,
            };
        }
        Ok(expr)
    }

    fn parse_new(&mut self) -> Result<Expression, ParserError> {
        let start_span = self.consume(TokenKind::New, "Expected 'new'")?;
        let mut callee = if self.at(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        while self.at(&TokenKind::Dot) || self.at(&TokenKind::LeftBracket) {
            callee = self.parse_member_suffix(callee, start_span)?;
        }
        let args = if self.at(&TokenKind::LeftParen) {
            Some(self.parse_arguments()?)
        } else {
            None
        };
        Ok(Expression::new(
            ExpressionKind::New(Box::new(callee), args),
            self.span_from(start_span),
        ))
    }

    fn parse_member_suffix(
        &mut self,
        object: Expression,
        start_span: crate::span::Span,
    ) -> Result<Expression, ParserError> {
        if self.match_token(&[TokenKind::Dot]) {
            let Some(name) = self.current_kind().identifier_name() else {
                return Err(self.error_here("Expected property name after '.'"));
            };
            self.advance();
            Ok(Expression::new(
                ExpressionKind::Member(Box::new(object), name),
                self.span_from(start_span),
            ))
        } else {
            self.consume(TokenKind::LeftBracket, "Expected '['")?;
            let index = self.parse_expression(false)?;
            self.consume(TokenKind::RightBracket, "Expected ']'")?;
            Ok(Expression::new(
                ExpressionKind::Index(Box::new(object), Box::new(index)),
                self.span_from(start_span),
            ))
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParserError> {
        self.consume(TokenKind::LeftParen, "Expected '('")?;
        let mut args = Vec::new();
        if !self.at(&TokenKind::RightParen) {
            loop {
                args.push(self.parse_assignment(false)?);
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParserError> {
        let span = self.current_span();
        let kind = match self.current_kind() {
            TokenKind::This => ExpressionKind::This,
            TokenKind::Null => ExpressionKind::Null,
            TokenKind::True => ExpressionKind::Boolean(true),
            TokenKind::False => ExpressionKind::Boolean(false),
            TokenKind::Number(value) => ExpressionKind::Number(*value),
            TokenKind::String(value) => ExpressionKind::String(value.clone()),
            TokenKind::Regex { pattern, flags } => ExpressionKind::Regex {
                pattern: pattern.clone(),
                flags: flags.clone(),
            },
            TokenKind::Identifier(name) => {
                ExpressionKind::Identifier(Identifier::new(name.clone(), span))
            }
            TokenKind::LeftParen => {
                self.advance();
                let mut inner = self.parse_expression(false)?;
                self.consume(TokenKind::RightParen, "Expected ')'")?;
                inner.span = self.span_from(span);
                return Ok(inner);
            }
            TokenKind::LeftBracket => return self.parse_array_literal(),
            TokenKind::LeftBrace => return self.parse_object_literal(),
            TokenKind::Function => {
                let func = self.parse_function(FunctionKind::Expression)?;
                let span = func.span;
                return Ok(Expression::new(ExpressionKind::Function(Box::new(func)), span));
            }
            _ => return Err(self.error_here("Expected expression")),
        };
        self.advance();
        Ok(Expression::new(kind, span))
    }

    fn parse_array_literal(&mut self) -> Result<Expression, ParserError> {
        let start_span = self.consume(TokenKind::LeftBracket, "Expected '['")?;
        let mut elements = Vec::new();
        while !self.at(&TokenKind::RightBracket) {
            if self.match_token(&[TokenKind::Comma]) {
                elements.push(None);
                continue;
            }
            elements.push(Some(self.parse_assignment(false)?));
            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
        }
        self.consume(TokenKind::RightBracket, "Expected ']' after array elements")?;
        Ok(Expression::new(
            ExpressionKind::Array(elements),
            self.span_from(start_span),
        ))
    }

    fn parse_object_literal(&mut self) -> Result<Expression, ParserError> {
        let start_span = self.consume(TokenKind::LeftBrace, "Expected '{'")?;
        let mut properties = Vec::new();
        while !self.at(&TokenKind::RightBrace) {
            properties.push(self.parse_object_property()?);
            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
        }
        self.consume(TokenKind::RightBrace, "Expected '}' after object literal")?;
        Ok(Expression::new(
            ExpressionKind::Object(properties),
            self.span_from(start_span),
        ))
    }

    fn parse_object_property(&mut self) -> Result<ObjectProperty, ParserError> {
        let start_span = self.current_span();

        // `get name() {}` and `set name(v) {}`; a plain `get: 1` is an
        // ordinary property.
        let accessor = match self.current_kind() {
            TokenKind::Identifier(word) if word == "get" => Some(PropertyKind::Get),
            TokenKind::Identifier(word) if word == "set" => Some(PropertyKind::Set),
            _ => None,
        };
        if let Some(kind) = accessor {
            if !matches!(
                self.peek_kind(1),
                TokenKind::Colon | TokenKind::Comma | TokenKind::RightBrace
            ) {
                self.advance();
                let key = self.parse_property_key()?;
                let function_kind = if kind == PropertyKind::Get {
                    FunctionKind::Getter
                } else {
                    FunctionKind::Setter
                };
                let func = self.parse_function_rest(function_kind, None, start_span)?;
                let span = func.span;
                return Ok(ObjectProperty {
                    key,
                    kind,
                    value: Expression::new(ExpressionKind::Function(Box::new(func)), span),
                    span: self.span_from(start_span),
                });
            }
        }

        let key = self.parse_property_key()?;
        self.consume(TokenKind::Colon, "Expected ':' after property name")?;
        let value = self.parse_assignment(false)?;
        Ok(ObjectProperty {
            key,
            kind: PropertyKind::Init,
            value,
            span: self.span_from(start_span),
        })
    }

    fn parse_property_key(&mut self) -> Result<PropertyKey, ParserError> {
        let key = match self.current_kind() {
            TokenKind::String(value) => PropertyKey::String(value.clone()),
            TokenKind::Number(value) => PropertyKey::Number(*value),
            kind => match kind.identifier_name() {
                Some(name) => PropertyKey::Identifier(name),
                None => return Err(self.error_here("Expected property name")),
            },
        };
        self.advance();
        Ok(key)
    }
}

fn assignment_op(kind: &TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Equal => BinaryOp::Assign,
        TokenKind::PlusEqual => BinaryOp::AddAssign,
        TokenKind::MinusEqual => BinaryOp::SubAssign,
        TokenKind::StarEqual => BinaryOp::MulAssign,
        TokenKind::SlashEqual => BinaryOp::DivAssign,
        TokenKind::PercentEqual => BinaryOp::ModAssign,
        TokenKind::LeftShiftEqual => BinaryOp::ShlAssign,
        TokenKind::RightShiftEqual => BinaryOp::ShrAssign,
        TokenKind::UnsignedRightShiftEqual => BinaryOp::UShrAssign,
        TokenKind::AmpersandEqual => BinaryOp::BitAndAssign,
        TokenKind::PipeEqual => BinaryOp::BitOrAssign,
        TokenKind::CaretEqual => BinaryOp::BitXorAssign,
        _ => return None,
    };
    Some(op)
}

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::PipePipe => BinaryOp::LogicalOr,
        TokenKind::AmpersandAmpersand => BinaryOp::LogicalAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Ampersand => BinaryOp::BitAnd,
        TokenKind::EqualEqual => BinaryOp::Equal,
        TokenKind::BangEqual => BinaryOp::NotEqual,
        TokenKind::EqualEqualEqual => BinaryOp::StrictEqual,
        TokenKind::BangEqualEqual => BinaryOp::StrictNotEqual,
        TokenKind::LessThan => BinaryOp::LessThan,
        TokenKind::GreaterThan => BinaryOp::GreaterThan,
        TokenKind::LessThanEqual => BinaryOp::LessThanEqual,
        TokenKind::GreaterThanEqual => BinaryOp::GreaterThanEqual,
        TokenKind::In => BinaryOp::In,
        TokenKind::Instanceof => BinaryOp::Instanceof,
        TokenKind::LeftShift => BinaryOp::Shl,
        TokenKind::RightShift => BinaryOp::Shr,
        TokenKind::UnsignedRightShift => BinaryOp::UShr,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}
