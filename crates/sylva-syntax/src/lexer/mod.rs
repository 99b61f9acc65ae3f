// src/lexer/mod.rs
//
// Byte-oriented scanner producing tokens with attached leading trivia.
// Every input byte ends up either in a token's raw text or in trivia, so
// the token stream reproduces the buffer exactly.

mod numbers;
mod strings;

use sylva_text::{Diagnostic, Diagnostics, SourceBuffer, SourceLocation, SourceRange};

use crate::errors::LexerError;
use crate::keywords::{keyword_lookup, LanguageVersion};
use crate::token::{Token, TokenKind};
use crate::trivia::{Trivia, TriviaKind};

pub struct Lexer {
    buffer: SourceBuffer,
    start: usize,
    current: usize,
    version: LanguageVersion,
    errors: Diagnostics,
}

impl Lexer {
    pub fn new(buffer: SourceBuffer, version: LanguageVersion) -> Self {
        Lexer {
            buffer,
            start: 0,
            current: 0,
            version,
            errors: Diagnostics::new(),
        }
    }

    pub fn buffer(&self) -> &SourceBuffer {
        &self.buffer
    }

    /// Take all collected errors, leaving the internal list empty.
    pub fn take_errors(&mut self) -> Diagnostics {
        std::mem::take(&mut self.errors)
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        self.buffer.data.text().as_bytes()
    }

    pub(crate) fn text_range(&self, start: usize, end: usize) -> &str {
        &self.buffer.data.text()[start..end]
    }

    fn loc(&self, offset: usize) -> SourceLocation {
        SourceLocation::new(self.buffer.id, offset)
    }

    pub(crate) fn error(&mut self, error: LexerError, start: usize) {
        let range = SourceRange::new(self.loc(start), self.loc(self.current));
        tracing::debug!(offset = start, %error, "lexer error");
        self.errors.add(Diagnostic::new(&error, range));
    }

    pub(crate) fn peek_byte(&self) -> Option<u8> {
        self.bytes().get(self.current).copied()
    }

    pub(crate) fn peek_next(&self) -> Option<u8> {
        self.bytes().get(self.current + 1).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.current += 1;
        Some(b)
    }

    fn match_byte(&mut self, b: u8) -> bool {
        if self.peek_byte() == Some(b) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn make_token(&mut self, kind: TokenKind) -> Token {
        let text = self.text_range(self.start, self.current).to_string();
        Token::new(kind, self.loc(self.start), text)
    }

    /// The next token with its leading trivia attached.
    pub fn next_token(&mut self) -> Token {
        let trivia = self.collect_trivia();
        let mut token = self.lex_raw_token();
        token.trivia = trivia;
        token
    }

    fn collect_trivia(&mut self) -> Vec<Trivia> {
        let mut out = Vec::new();
        loop {
            self.start = self.current;
            match self.peek_byte() {
                Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => {
                    while matches!(self.peek_byte(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
                        self.current += 1;
                    }
                    out.push(Trivia::new(
                        TriviaKind::Whitespace,
                        self.text_range(self.start, self.current),
                    ));
                }
                Some(b'/') if self.peek_next() == Some(b'/') => {
                    while !matches!(self.peek_byte(), None | Some(b'\n') | Some(b'\r')) {
                        self.current += 1;
                    }
                    out.push(Trivia::new(
                        TriviaKind::LineComment,
                        self.text_range(self.start, self.current),
                    ));
                }
                Some(b'/') if self.peek_next() == Some(b'*') => {
                    self.current += 2;
                    let mut closed = false;
                    while let Some(b) = self.peek_byte() {
                        if b == b'*' && self.peek_next() == Some(b'/') {
                            self.current += 2;
                            closed = true;
                            break;
                        }
                        self.current += 1;
                    }
                    if !closed {
                        self.error(LexerError::UnterminatedBlockComment, self.start);
                    }
                    out.push(Trivia::new(
                        TriviaKind::BlockComment,
                        self.text_range(self.start, self.current),
                    ));
                }
                Some(b'\\')
                    if matches!(self.peek_next(), Some(b'\n') | Some(b'\r')) =>
                {
                    self.current += 2;
                    if matches!(self.peek_byte(), Some(b'\n' | b'\r'))
                        && self.bytes()[self.current - 1] != self.bytes()[self.current]
                    {
                        self.current += 1;
                    }
                    out.push(Trivia::new(
                        TriviaKind::LineContinuation,
                        self.text_range(self.start, self.current),
                    ));
                }
                _ => break,
            }
        }
        out
    }

    fn lex_raw_token(&mut self) -> Token {
        self.start = self.current;
        let Some(b) = self.advance() else {
            return Token::new(TokenKind::Eof, self.loc(self.current), "");
        };

        match b {
            b'(' => self.make_token(TokenKind::LParen),
            b')' => self.make_token(TokenKind::RParen),
            b'[' => self.make_token(TokenKind::LBracket),
            b']' => self.make_token(TokenKind::RBracket),
            b'{' => self.make_token(TokenKind::LBrace),
            b'}' => self.make_token(TokenKind::RBrace),
            b';' => self.make_token(TokenKind::Semicolon),
            b',' => self.make_token(TokenKind::Comma),
            b'@' => self.make_token(TokenKind::At),
            b'?' => self.make_token(TokenKind::Question),
            b'#' => self.make_token(TokenKind::Hash),
            b'.' => {
                if self.match_byte(b'*') {
                    self.make_token(TokenKind::DotStar)
                } else {
                    self.make_token(TokenKind::Dot)
                }
            }
            b':' => {
                if self.match_byte(b':') {
                    self.make_token(TokenKind::ColonColon)
                } else {
                    self.make_token(TokenKind::Colon)
                }
            }
            b'+' => {
                if self.match_byte(b'+') {
                    self.make_token(TokenKind::PlusPlus)
                } else if self.match_byte(b'=') {
                    self.make_token(TokenKind::PlusEq)
                } else if self.match_byte(b':') {
                    self.make_token(TokenKind::PlusColon)
                } else {
                    self.make_token(TokenKind::Plus)
                }
            }
            b'-' => {
                if self.match_byte(b'-') {
                    self.make_token(TokenKind::MinusMinus)
                } else if self.match_byte(b'=') {
                    self.make_token(TokenKind::MinusEq)
                } else if self.match_byte(b'>') {
                    self.make_token(TokenKind::MinusGt)
                } else if self.match_byte(b':') {
                    self.make_token(TokenKind::MinusColon)
                } else {
                    self.make_token(TokenKind::Minus)
                }
            }
            b'*' => {
                if self.match_byte(b'*') {
                    self.make_token(TokenKind::StarStar)
                } else if self.match_byte(b'=') {
                    self.make_token(TokenKind::StarEq)
                } else {
                    self.make_token(TokenKind::Star)
                }
            }
            b'/' => {
                if self.match_byte(b'=') {
                    self.make_token(TokenKind::SlashEq)
                } else {
                    self.make_token(TokenKind::Slash)
                }
            }
            b'%' => {
                if self.match_byte(b'=') {
                    self.make_token(TokenKind::PercentEq)
                } else {
                    self.make_token(TokenKind::Percent)
                }
            }
            b'=' => {
                if self.match_byte(b'=') {
                    if self.match_byte(b'=') {
                        self.make_token(TokenKind::EqEqEq)
                    } else if self.match_byte(b'?') {
                        self.make_token(TokenKind::EqEqQuestion)
                    } else {
                        self.make_token(TokenKind::EqEq)
                    }
                } else {
                    self.make_token(TokenKind::Eq)
                }
            }
            b'!' => {
                if self.match_byte(b'=') {
                    if self.match_byte(b'=') {
                        self.make_token(TokenKind::BangEqEq)
                    } else if self.match_byte(b'?') {
                        self.make_token(TokenKind::BangEqQuestion)
                    } else {
                        self.make_token(TokenKind::BangEq)
                    }
                } else {
                    self.make_token(TokenKind::Bang)
                }
            }
            b'<' => {
                if self.match_byte(b'<') {
                    if self.match_byte(b'<') {
                        if self.match_byte(b'=') {
                            self.make_token(TokenKind::LtLtLtEq)
                        } else {
                            self.make_token(TokenKind::LtLtLt)
                        }
                    } else if self.match_byte(b'=') {
                        self.make_token(TokenKind::LtLtEq)
                    } else {
                        self.make_token(TokenKind::LtLt)
                    }
                } else if self.match_byte(b'=') {
                    self.make_token(TokenKind::LtEq)
                } else if self.peek_byte() == Some(b'-') && self.peek_next() == Some(b'>') {
                    self.current += 2;
                    self.make_token(TokenKind::LtMinusGt)
                } else {
                    self.make_token(TokenKind::Lt)
                }
            }
            b'>' => {
                if self.match_byte(b'>') {
                    if self.match_byte(b'>') {
                        if self.match_byte(b'=') {
                            self.make_token(TokenKind::GtGtGtEq)
                        } else {
                            self.make_token(TokenKind::GtGtGt)
                        }
                    } else if self.match_byte(b'=') {
                        self.make_token(TokenKind::GtGtEq)
                    } else {
                        self.make_token(TokenKind::GtGt)
                    }
                } else if self.match_byte(b'=') {
                    self.make_token(TokenKind::GtEq)
                } else {
                    self.make_token(TokenKind::Gt)
                }
            }
            b'&' => {
                if self.match_byte(b'&') {
                    self.make_token(TokenKind::AmpAmp)
                } else if self.match_byte(b'=') {
                    self.make_token(TokenKind::AmpEq)
                } else {
                    self.make_token(TokenKind::Amp)
                }
            }
            b'|' => {
                if self.match_byte(b'|') {
                    self.make_token(TokenKind::PipePipe)
                } else if self.match_byte(b'=') {
                    self.make_token(TokenKind::PipeEq)
                } else {
                    self.make_token(TokenKind::Pipe)
                }
            }
            b'^' => {
                if self.match_byte(b'~') {
                    self.make_token(TokenKind::CaretTilde)
                } else if self.match_byte(b'=') {
                    self.make_token(TokenKind::CaretEq)
                } else {
                    self.make_token(TokenKind::Caret)
                }
            }
            b'~' => {
                if self.match_byte(b'&') {
                    self.make_token(TokenKind::TildeAmp)
                } else if self.match_byte(b'|') {
                    self.make_token(TokenKind::TildePipe)
                } else if self.match_byte(b'^') {
                    self.make_token(TokenKind::TildeCaret)
                } else {
                    self.make_token(TokenKind::Tilde)
                }
            }
            b'"' => self.string_literal(),
            b'`' => {
                if self.match_byte(b'"') {
                    self.make_token(TokenKind::MacroQuote)
                } else if self.match_byte(b'`') {
                    self.make_token(TokenKind::MacroPaste)
                } else if self.peek_byte().is_some_and(is_ident_start) {
                    while self.peek_byte().is_some_and(is_ident_char) {
                        self.current += 1;
                    }
                    self.make_token(TokenKind::Directive)
                } else {
                    self.error(LexerError::UnexpectedCharacter { ch: '`' }, self.start);
                    self.make_token(TokenKind::Unknown)
                }
            }
            b'\'' => self.apostrophe(),
            b'\\' => self.escaped_identifier(),
            b'$' => {
                if self.peek_byte().is_some_and(is_ident_start) {
                    while self.peek_byte().is_some_and(is_ident_char) {
                        self.current += 1;
                    }
                    self.make_token(TokenKind::SystemIdentifier)
                } else {
                    self.make_token(TokenKind::Dollar)
                }
            }
            b'0'..=b'9' => self.number(),
            b if is_ident_start(b) => {
                while self.peek_byte().is_some_and(is_ident_char) {
                    self.current += 1;
                }
                let text = self.text_range(self.start, self.current);
                let kind =
                    keyword_lookup(text, self.version).unwrap_or(TokenKind::Identifier);
                self.make_token(kind)
            }
            _ => {
                // Consume the full UTF-8 sequence so we never split a
                // character across tokens.
                while self
                    .peek_byte()
                    .is_some_and(|b| b & 0xC0 == 0x80)
                {
                    self.current += 1;
                }
                let ch = self
                    .text_range(self.start, self.current)
                    .chars()
                    .next()
                    .unwrap_or('?');
                self.error(LexerError::UnexpectedCharacter { ch }, self.start);
                self.make_token(TokenKind::Unknown)
            }
        }
    }

    fn escaped_identifier(&mut self) -> Token {
        // A backslash starts an escaped identifier running until whitespace.
        let mut any = false;
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_whitespace() {
                break;
            }
            any = true;
            self.current += 1;
        }
        if !any {
            self.error(LexerError::BadEscapedIdentifier, self.start);
            return self.make_token(TokenKind::Unknown);
        }
        self.make_token(TokenKind::Identifier)
    }

    /// Lexes the file-name argument of an `include directive from the raw
    /// stream: `"name"` or `<name>`. Returns the token and whether it used
    /// the system form.
    pub fn lex_include_filename(&mut self) -> Option<(Token, bool)> {
        // Skip horizontal whitespace only; a newline means the name is missing.
        while matches!(self.peek_byte(), Some(b' ' | b'\t')) {
            self.current += 1;
        }
        self.start = self.current;
        match self.peek_byte() {
            Some(b'"') => {
                self.current += 1;
                while !matches!(self.peek_byte(), None | Some(b'"' | b'\n' | b'\r')) {
                    self.current += 1;
                }
                if !self.match_byte(b'"') {
                    self.error(LexerError::UnterminatedString, self.start);
                    return None;
                }
                let token = self.make_token(TokenKind::StringLiteral);
                Some((token, false))
            }
            Some(b'<') => {
                self.current += 1;
                while !matches!(self.peek_byte(), None | Some(b'>' | b'\n' | b'\r')) {
                    self.current += 1;
                }
                if !self.match_byte(b'>') {
                    self.error(LexerError::UnterminatedString, self.start);
                    return None;
                }
                let token = self.make_token(TokenKind::StringLiteral);
                Some((token, true))
            }
            _ => None,
        }
    }
}

pub(crate) fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

pub(crate) fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

#[cfg(test)]
mod tests;
