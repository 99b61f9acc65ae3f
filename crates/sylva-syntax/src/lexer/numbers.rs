// src/lexer/numbers.rs
//
// Numeric literal lexing: sized and unsized vector literals with four-state
// digits, unbased unsized literals, reals with exponents, and time literals.

use sylva_numeric::{LiteralBase, Logic, SVInt, TimeUnit, VectorDigit};

use crate::errors::LexerError;
use crate::token::{Token, TokenKind, TokenValue};

use super::{is_ident_char, Lexer};

/// Largest literal size we accept; larger sizes are clamped after a
/// diagnostic.
const MAX_LITERAL_SIZE: u64 = (1 << 24) - 1;

impl Lexer {
    /// Scan a number. The first digit has already been consumed.
    ///
    /// Handles, in order of discovery:
    /// - sized vector literals `8'hff` (whitespace allowed around the base)
    /// - real literals `3.14`, `1e-9` (with out-of-range detection)
    /// - time literals `10ns`, `1.5ps`
    /// - plain decimal integers (32-bit signed by default)
    pub(super) fn number(&mut self) -> Token {
        while matches!(self.peek_byte(), Some(b'0'..=b'9' | b'_')) {
            self.current += 1;
        }

        // A following base specifier makes this the size of a vector literal.
        if let Some(base_start) = self.peek_base_specifier() {
            let size_text: String = self
                .text_range(self.start, self.current)
                .chars()
                .filter(|&c| c != '_')
                .collect();
            let size = size_text.parse::<u64>().unwrap_or(0);
            let size = if size == 0 || size > MAX_LITERAL_SIZE {
                self.error(LexerError::LiteralSizeTooLarge { size }, self.start);
                16
            } else {
                size
            };
            self.current = base_start;
            return self.based_literal(Some(size as u32));
        }

        // Real literal: fraction and/or exponent.
        let has_fraction = self.peek_byte() == Some(b'.')
            && self.peek_next().is_some_and(|b| b.is_ascii_digit());
        let has_exponent = matches!(self.peek_byte(), Some(b'e' | b'E'))
            && self.exponent_ahead();
        if has_fraction || has_exponent {
            return self.real_literal();
        }

        // Time literal: a unit suffix directly attached.
        if let Some(unit) = self.peek_time_unit() {
            return self.time_literal(unit);
        }

        let digits = self.collect_decimal_digits(self.start, self.current);
        let value = SVInt::from_digits(None, true, LiteralBase::Decimal, &digits);
        if value.width() > 32 || value.as_u64().is_some_and(|v| v > i32::MAX as u64) {
            // Simple decimals default to a 32-bit signed type; the parser
            // lifts this to a signed-overflow warning.
            tracing::debug!(offset = self.start, "decimal literal exceeds 32-bit signed range");
        }
        self.make_token(TokenKind::IntLiteral)
            .with_value(TokenValue::Int(value))
    }

    /// Scan a literal beginning with an apostrophe: `'{`, an unsized based
    /// literal, or an unbased unsized literal.
    pub(super) fn apostrophe(&mut self) -> Token {
        match self.peek_byte() {
            Some(b'{') => {
                self.current += 1;
                self.make_token(TokenKind::ApostropheLBrace)
            }
            Some(b's' | b'S' | b'b' | b'B' | b'o' | b'O' | b'd' | b'D' | b'h' | b'H') => {
                self.current = self.start;
                self.based_literal(None)
            }
            Some(c @ (b'0' | b'1' | b'x' | b'X' | b'z' | b'Z'))
                if !self
                    .peek_next()
                    .is_some_and(|b| b.is_ascii_hexdigit() || is_ident_char(b)) =>
            {
                self.current += 1;
                let logic = match c {
                    b'0' => Logic::Zero,
                    b'1' => Logic::One,
                    b'x' | b'X' => Logic::X,
                    _ => Logic::Z,
                };
                self.make_token(TokenKind::UnbasedUnsizedLiteral)
                    .with_value(TokenValue::UnbasedUnsized(logic))
            }
            _ => {
                self.error(LexerError::UnexpectedCharacter { ch: '\'' }, self.start);
                self.make_token(TokenKind::Unknown)
            }
        }
    }

    /// If the stream ahead (skipping horizontal whitespace) is a base
    /// specifier `'<s?><b|o|d|h>`, returns the offset of the apostrophe.
    fn peek_base_specifier(&self) -> Option<usize> {
        let bytes = self.bytes();
        let mut i = self.current;
        while matches!(bytes.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        if bytes.get(i) != Some(&b'\'') {
            return None;
        }
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b's' | b'S')) {
            j += 1;
        }
        match bytes.get(j) {
            Some(b'b' | b'B' | b'o' | b'O' | b'd' | b'D' | b'h' | b'H') => Some(i),
            _ => None,
        }
    }

    /// Scans `'<s?><base><digits>` starting at the apostrophe; whitespace
    /// between the base and the digits is part of the token text.
    fn based_literal(&mut self, size: Option<u32>) -> Token {
        // Apostrophe.
        self.current += 1;
        let mut signed = false;
        if matches!(self.peek_byte(), Some(b's' | b'S')) {
            signed = true;
            self.current += 1;
        }
        let base_char = self.peek_byte().unwrap_or(b'b') as char;
        self.current += 1;
        let base = LiteralBase::from_char(base_char).unwrap_or(LiteralBase::Binary);

        while matches!(self.peek_byte(), Some(b' ' | b'\t')) {
            self.current += 1;
        }

        let digit_start = self.current;
        while let Some(b) = self.peek_byte() {
            let ok = match base {
                LiteralBase::Binary | LiteralBase::Octal | LiteralBase::Decimal => {
                    b.is_ascii_digit() || matches!(b, b'_' | b'x' | b'X' | b'z' | b'Z' | b'?')
                }
                LiteralBase::Hex => {
                    b.is_ascii_hexdigit() || matches!(b, b'_' | b'x' | b'X' | b'z' | b'Z' | b'?')
                }
            };
            if !ok {
                break;
            }
            self.current += 1;
        }

        if digit_start == self.current {
            self.error(LexerError::MissingVectorDigits, self.start);
            let value = SVInt::zero(size.unwrap_or(32), signed);
            return self
                .make_token(TokenKind::IntLiteral)
                .with_value(TokenValue::Int(value));
        }

        let digits = match base {
            LiteralBase::Decimal => self.collect_decimal_digits(digit_start, self.current),
            _ => self.collect_vector_digits(base, digit_start, self.current),
        };
        let value = SVInt::from_digits(size, signed, base, &digits);
        self.make_token(TokenKind::IntLiteral)
            .with_value(TokenValue::Int(value))
    }

    fn collect_vector_digits(
        &mut self,
        base: LiteralBase,
        start: usize,
        end: usize,
    ) -> Vec<VectorDigit> {
        let text: String = self.text_range(start, end).to_string();
        let mut digits = Vec::new();
        for c in text.chars() {
            if c == '_' {
                continue;
            }
            match VectorDigit::from_char(c, base) {
                Some(d) => digits.push(d),
                None => self.error(LexerError::BadDigitForBase { digit: c }, start),
            }
        }
        if digits.is_empty() {
            digits.push(VectorDigit::Val(0));
        }
        digits
    }

    /// Decimal digit runs: ordinary digits, or a single whole-value x/z.
    fn collect_decimal_digits(&mut self, start: usize, end: usize) -> Vec<VectorDigit> {
        let text: String = self.text_range(start, end).to_string();
        let mut digits = Vec::new();
        let mut saw_xz = false;
        for c in text.chars() {
            if c == '_' {
                continue;
            }
            match c {
                '0'..='9' => digits.push(VectorDigit::Val(c as u8 - b'0')),
                'x' | 'X' => {
                    digits.push(VectorDigit::X);
                    saw_xz = true;
                }
                'z' | 'Z' | '?' => {
                    digits.push(VectorDigit::Z);
                    saw_xz = true;
                }
                _ => self.error(LexerError::BadDigitForBase { digit: c }, start),
            }
        }
        if saw_xz && digits.len() > 1 {
            self.error(LexerError::DecimalXZ, start);
            digits.retain(|d| matches!(d, VectorDigit::Val(_)));
            if digits.is_empty() {
                digits.push(VectorDigit::Val(0));
            }
        }
        if digits.is_empty() {
            digits.push(VectorDigit::Val(0));
        }
        digits
    }

    fn exponent_ahead(&self) -> bool {
        let bytes = self.bytes();
        let mut i = self.current + 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        bytes.get(i).is_some_and(|b| b.is_ascii_digit())
    }

    fn real_literal(&mut self) -> Token {
        if self.peek_byte() == Some(b'.') {
            self.current += 1;
            while matches!(self.peek_byte(), Some(b'0'..=b'9' | b'_')) {
                self.current += 1;
            }
        }
        if matches!(self.peek_byte(), Some(b'e' | b'E')) && self.exponent_ahead() {
            self.current += 1;
            if matches!(self.peek_byte(), Some(b'+' | b'-')) {
                self.current += 1;
            }
            while matches!(self.peek_byte(), Some(b'0'..=b'9' | b'_')) {
                self.current += 1;
            }
        }

        if let Some(unit) = self.peek_time_unit() {
            return self.time_literal(unit);
        }

        let text: String = self
            .text_range(self.start, self.current)
            .chars()
            .filter(|&c| c != '_')
            .collect();
        let value = text.parse::<f64>().unwrap_or(0.0);

        // Overflow parses to infinity; underflow parses to zero while the
        // mantissa has nonzero digits.
        let mantissa_nonzero = text
            .split(['e', 'E'])
            .next()
            .is_some_and(|m| m.chars().any(|c| ('1'..='9').contains(&c)));
        let out_of_range = !value.is_finite() || (value == 0.0 && mantissa_nonzero);

        self.make_token(TokenKind::RealLiteral)
            .with_value(TokenValue::Real { value, out_of_range })
    }

    /// A time unit suffix directly attached to the digits, not followed by
    /// more identifier characters.
    fn peek_time_unit(&self) -> Option<TimeUnit> {
        let bytes = self.bytes();
        let mut end = self.current;
        while end < bytes.len() && bytes[end].is_ascii_alphabetic() {
            end += 1;
        }
        if end == self.current || (end < bytes.len() && is_ident_char(bytes[end])) {
            return None;
        }
        TimeUnit::from_suffix(self.text_range(self.current, end))
    }

    fn time_literal(&mut self, unit: TimeUnit) -> Token {
        let digits_end = self.current;
        while self.peek_byte().is_some_and(|b| b.is_ascii_alphabetic()) {
            self.current += 1;
        }
        let text: String = self
            .text_range(self.start, digits_end)
            .chars()
            .filter(|&c| c != '_')
            .collect();
        let value = text.parse::<f64>().unwrap_or(0.0);
        self.make_token(TokenKind::TimeLiteral)
            .with_value(TokenValue::Time { value, unit })
    }
}
