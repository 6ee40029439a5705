mod token;

pub use token::{is_reserved_word, Comment, CommentKind, Token, TokenKind, RESERVED_WORDS};

use crate::span::Span;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} at {span}")]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

/// Scanner turning source text into tokens.
///
/// Whether `/` starts a regular expression is decided from the previous
/// significant token. After `)` that token alone is ambiguous, so open
/// parentheses are tracked to tell a statement head from a grouped operand.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    byte_pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            chars: source.chars().collect(),
            pos: 0,
            byte_pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens: Vec<Token> = Vec::new();
        // One entry per open `(`: whether it opens an `if`/`for`/`while`/`with` head
        let mut parens: Vec<bool> = Vec::new();
        let mut closed_head = false;
        loop {
            let (newline_before, comments) = self.skip_trivia()?;
            let regex_allowed = match tokens.last() {
                None => true,
                Some(last) if last.kind == TokenKind::RightParen => closed_head,
                Some(last) => !last.kind.ends_operand(),
            };
            let mut token = self.next_token(regex_allowed)?;
            token.newline_before = newline_before || tokens.is_empty();
            token.comments = comments;
            match token.kind {
                TokenKind::LeftParen => parens.push(matches!(
                    tokens.last().map(|t| &t.kind),
                    Some(TokenKind::If | TokenKind::For | TokenKind::While | TokenKind::With)
                )),
                TokenKind::RightParen => closed_head = parens.pop().unwrap_or(false),
                _ => {}
            }
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        self.byte_pos += ch.len_utf8();
        if is_line_terminator(ch) {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn mark(&self) -> (u32, u32, u32) {
        (self.byte_pos as u32, self.line, self.column)
    }

    fn span_from(&self, mark: (u32, u32, u32)) -> Span {
        Span::new(mark.0, self.byte_pos as u32, mark.1, mark.2)
    }

    fn error(&self, message: impl Into<String>, mark: (u32, u32, u32)) -> LexError {
        LexError {
            message: message.into(),
            span: self.span_from(mark),
        }
    }

    /// Skips whitespace and comments, keeping the ones that must survive.
    fn skip_trivia(&mut self) -> Result<(bool, Vec<Comment>), LexError> {
        let mut newline = false;
        let mut comments = Vec::new();
        while let Some(ch) = self.peek() {
            if is_line_terminator(ch) {
                newline = true;
                self.advance();
            } else if ch.is_whitespace() || ch == '\u{feff}' {
                self.advance();
            } else if ch == '/' && self.peek_at(1) == Some('/') {
                while let Some(c) = self.peek() {
                    if is_line_terminator(c) {
                        break;
                    }
                    self.advance();
                }
            } else if ch == '/' && self.peek_at(1) == Some('*') {
                let mark = self.mark();
                let start = self.byte_pos;
                self.advance();
                self.advance();
                let mut closed = false;
                while let Some(c) = self.advance() {
                    if is_line_terminator(c) {
                        newline = true;
                    }
                    if c == '*' && self.peek() == Some('/') {
                        self.advance();
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(self.error("Unterminated comment", mark));
                }
                let text = &self.source[start..self.byte_pos];
                let kind = if text.starts_with("/*!") {
                    Some(CommentKind::Important)
                } else if text.starts_with("/*@") && text.ends_with("@*/") && text.len() >= 6 {
                    Some(CommentKind::Conditional)
                } else {
                    None
                };
                if let Some(kind) = kind {
                    comments.push(Comment {
                        kind,
                        text: text.to_string(),
                        span: self.span_from(mark),
                    });
                }
            } else {
                break;
            }
        }
        Ok((newline, comments))
    }

    fn next_token(&mut self, regex_allowed: bool) -> Result<Token, LexError> {
        let mark = self.mark();
        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Ok(Token::new(TokenKind::Eof, self.span_from(mark))),
        };

        if is_identifier_start(ch) {
            let word = self.scan_identifier();
            let kind = TokenKind::from_keyword(&word).unwrap_or(TokenKind::Identifier(word));
            return Ok(Token::new(kind, self.span_from(mark)));
        }

        if ch.is_ascii_digit() || (ch == '.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
        {
            let value = self.scan_number(mark)?;
            return Ok(Token::new(TokenKind::Number(value), self.span_from(mark)));
        }

        if ch == '"' || ch == '\'' {
            let value = self.scan_string(ch, mark)?;
            return Ok(Token::new(TokenKind::String(value), self.span_from(mark)));
        }

        if ch == '/' && regex_allowed {
            let kind = self.scan_regex(mark)?;
            return Ok(Token::new(kind, self.span_from(mark)));
        }

        self.advance();
        let kind = match ch {
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,
            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEqual
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusEqual
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('=') {
                    TokenKind::StarEqual
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    TokenKind::SlashEqual
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentEqual
                } else {
                    TokenKind::Percent
                }
            }
            '<' => {
                if self.eat('<') {
                    if self.eat('=') {
                        TokenKind::LeftShiftEqual
                    } else {
                        TokenKind::LeftShift
                    }
                } else if self.eat('=') {
                    TokenKind::LessThanEqual
                } else {
                    TokenKind::LessThan
                }
            }
            '>' => {
                if self.eat('>') {
                    if self.eat('>') {
                        if self.eat('=') {
                            TokenKind::UnsignedRightShiftEqual
                        } else {
                            TokenKind::UnsignedRightShift
                        }
                    } else if self.eat('=') {
                        TokenKind::RightShiftEqual
                    } else {
                        TokenKind::RightShift
                    }
                } else if self.eat('=') {
                    TokenKind::GreaterThanEqual
                } else {
                    TokenKind::GreaterThan
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::EqualEqualEqual
                    } else {
                        TokenKind::EqualEqual
                    }
                } else {
                    TokenKind::Equal
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::BangEqualEqual
                    } else {
                        TokenKind::BangEqual
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::AmpersandAmpersand
                } else if self.eat('=') {
                    TokenKind::AmpersandEqual
                } else {
                    TokenKind::Ampersand
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::PipePipe
                } else if self.eat('=') {
                    TokenKind::PipeEqual
                } else {
                    TokenKind::Pipe
                }
            }
            '^' => {
                if self.eat('=') {
                    TokenKind::CaretEqual
                } else {
                    TokenKind::Caret
                }
            }
            other => {
                return Err(self.error(format!("Unexpected character '{}'", other), mark));
            }
        };
        Ok(Token::new(kind, self.span_from(mark)))
    }

    fn scan_identifier(&mut self) -> String {
        let mut word = String::new();
        while let Some(ch) = self.peek() {
            if is_identifier_part(ch) {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        word
    }

    fn scan_number(&mut self, mark: (u32, u32, u32)) -> Result<f64, LexError> {
        let start = self.byte_pos;
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.advance();
            self.advance();
            let digits_start = self.byte_pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            let digits = &self.source[digits_start..self.byte_pos];
            if digits.is_empty() {
                return Err(self.error("Invalid hexadecimal literal", mark));
            }
            return Ok(parse_radix(digits, 16));
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let integer_part = &self.source[start..self.byte_pos];
        if integer_part.len() > 1
            && integer_part.starts_with('0')
            && integer_part.bytes().all(|b| (b'0'..=b'7').contains(&b))
            && self.peek() != Some('.')
        {
            return Ok(parse_radix(&integer_part[1..], 8));
        }

        if self.peek() == Some('.') {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error("Invalid exponent in numeric literal", mark));
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if self.peek().is_some_and(is_identifier_start) {
            return Err(self.error("Identifier directly after numeric literal", mark));
        }

        let text = &self.source[start..self.byte_pos];
        text.parse::<f64>()
            .map_err(|_| self.error(format!("Invalid numeric literal '{}'", text), mark))
    }

    fn scan_string(&mut self, quote: char, mark: (u32, u32, u32)) -> Result<String, LexError> {
        self.advance();
        let mut value = String::new();
        loop {
            let ch = match self.advance() {
                Some(ch) => ch,
                None => return Err(self.error("Unterminated string literal", mark)),
            };
            if ch == quote {
                break;
            }
            if is_line_terminator(ch) {
                return Err(self.error("Unterminated string literal", mark));
            }
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            let escaped = match self.advance() {
                Some(c) => c,
                None => return Err(self.error("Unterminated string literal", mark)),
            };
            match escaped {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                'b' => value.push('\u{8}'),
                'f' => value.push('\u{c}'),
                'v' => value.push('\u{b}'),
                '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => value.push('\0'),
                'x' => {
                    let code = self.scan_hex_digits(2, mark)?;
                    value.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                }
                'u' => {
                    let code = self.scan_hex_digits(4, mark)?;
                    value.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                }
                '\r' => {
                    self.eat('\n');
                }
                c if is_line_terminator(c) => {}
                c if c.is_digit(8) => {
                    let mut code = c.to_digit(8).unwrap_or(0);
                    for _ in 0..2 {
                        match self.peek().and_then(|d| d.to_digit(8)) {
                            Some(d) if code * 8 + d <= 0o377 => {
                                code = code * 8 + d;
                                self.advance();
                            }
                            _ => break,
                        }
                    }
                    value.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                }
                other => value.push(other),
            }
        }
        Ok(value)
    }

    fn scan_hex_digits(&mut self, count: usize, mark: (u32, u32, u32)) -> Result<u32, LexError> {
        let mut code = 0u32;
        for _ in 0..count {
            let digit = self
                .advance()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("Invalid escape sequence", mark))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn scan_regex(&mut self, mark: (u32, u32, u32)) -> Result<TokenKind, LexError> {
        self.advance();
        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            let ch = match self.advance() {
                Some(c) if !is_line_terminator(c) => c,
                _ => return Err(self.error("Unterminated regular expression", mark)),
            };
            match ch {
                '\\' => {
                    pattern.push(ch);
                    match self.advance() {
                        Some(c) if !is_line_terminator(c) => pattern.push(c),
                        _ => return Err(self.error("Unterminated regular expression", mark)),
                    }
                    continue;
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                _ => {}
            }
            pattern.push(ch);
        }
        let flags = self.scan_identifier();
        Ok(TokenKind::Regex { pattern, flags })
    }
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    digits.chars().fold(0.0, |acc, c| {
        acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
    })
}

pub fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

pub fn is_identifier_start(ch: char) -> bool {
    ch == '$' || ch == '_' || ch.is_alphabetic()
}

pub fn is_identifier_part(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_alphanumeric()
}

/// Whether `name` can be emitted as an identifier (or property name after `.`).
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => chars.all(is_identifier_part),
        _ => false,
    }
}
