// src/preprocessor/mod.rs
//
// The token-stream filter between lexer and parser: handles `define and
// macro expansion, conditional compilation, `include, `line, and the
// directives that carry semantic state (timescale, default nettype,
// unconnected drive, celldefine).
//
// Directives never reach the parser as tokens; each one is folded into a
// Directive trivium attached to the next real token, so printing the tree
// with directives preserved reproduces the input exactly.

mod macros;

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use sylva_numeric::{TimeScale, TimeScaleValue};
use sylva_text::{Diagnostic, Diagnostics, SourceLocation, SourceManager, SourceRange};

use crate::errors::PreprocessorError;
use crate::lexer::Lexer;
use crate::options::ParseOptions;
use crate::token::{Token, TokenKind, TokenValue};
use crate::trivia::{Trivia, TriviaKind};

pub(crate) use macros::MacroDef;

/// The net type applied to undeclared identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultNetType {
    #[default]
    Wire,
    Uwire,
    Tri,
    Tri0,
    Tri1,
    Wand,
    Wor,
    Trireg,
    None,
}

/// `unconnected_drive state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnconnectedDrive {
    #[default]
    None,
    Pull0,
    Pull1,
}

struct Conditional {
    /// A branch of this construct has been taken.
    taken: bool,
    /// We have seen the `else branch.
    has_else: bool,
}

pub struct Preprocessor<'sm> {
    sm: &'sm SourceManager,
    options: ParseOptions,
    lexers: Vec<Lexer>,
    raw_peeked: Option<Token>,
    expansion: VecDeque<Token>,
    pub(crate) macros: FxHashMap<String, MacroDef>,
    cond_stack: Vec<Conditional>,
    pending_trivia: Vec<Trivia>,
    diagnostics: Diagnostics,

    timescale: Option<TimeScale>,
    default_nettype: DefaultNetType,
    unconnected_drive: UnconnectedDrive,
    cell_define: bool,
}

impl<'sm> Preprocessor<'sm> {
    pub fn new(
        sm: &'sm SourceManager,
        buffer: sylva_text::SourceBuffer,
        options: ParseOptions,
    ) -> Self {
        let lexer = Lexer::new(buffer, options.language_version);
        let mut pp = Preprocessor {
            sm,
            lexers: vec![lexer],
            raw_peeked: None,
            expansion: VecDeque::new(),
            macros: FxHashMap::default(),
            cond_stack: Vec::new(),
            pending_trivia: Vec::new(),
            diagnostics: Diagnostics::new(),
            timescale: options.default_timescale,
            default_nettype: options.default_nettype,
            unconnected_drive: UnconnectedDrive::None,
            cell_define: false,
            options,
        };
        pp.install_predefined_macros();
        pp
    }

    pub fn source_manager(&self) -> &'sm SourceManager {
        self.sm
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Current `timescale in effect, if any.
    pub fn timescale(&self) -> Option<TimeScale> {
        self.timescale
    }

    pub fn default_nettype(&self) -> DefaultNetType {
        self.default_nettype
    }

    pub fn unconnected_drive(&self) -> UnconnectedDrive {
        self.unconnected_drive
    }

    pub fn in_cell_define(&self) -> bool {
        self.cell_define
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        for lexer in &mut self.lexers {
            self.diagnostics.extend(lexer.take_errors());
        }
        std::mem::take(&mut self.diagnostics)
    }

    pub(crate) fn error(&mut self, error: PreprocessorError, range: SourceRange) {
        self.diagnostics.add(Diagnostic::new(&error, range));
    }

    /// The next token the parser should see.
    pub fn next_token(&mut self) -> Token {
        loop {
            if let Some(mut tok) = self.expansion.pop_front() {
                self.attach_pending(&mut tok);
                return tok;
            }

            let tok = self.raw_next();
            match tok.kind {
                TokenKind::Directive => self.handle_directive(tok),
                TokenKind::Eof => {
                    if !self.cond_stack.is_empty() {
                        self.error(
                            PreprocessorError::MissingEndIfDirective,
                            SourceRange::at(tok.loc),
                        );
                        self.cond_stack.clear();
                    }
                    let mut tok = tok;
                    self.attach_pending(&mut tok);
                    return tok;
                }
                _ => {
                    let mut tok = tok;
                    self.attach_pending(&mut tok);
                    return tok;
                }
            }
        }
    }

    fn attach_pending(&mut self, tok: &mut Token) {
        if !self.pending_trivia.is_empty() {
            let mut trivia = std::mem::take(&mut self.pending_trivia);
            trivia.append(&mut tok.trivia);
            tok.trivia = trivia;
        }
    }

    // ----- raw token access ----------------------------------------------

    fn raw_next(&mut self) -> Token {
        if let Some(tok) = self.raw_peeked.take() {
            return tok;
        }
        loop {
            let tok = self.current_lexer().next_token();
            if tok.kind == TokenKind::Eof && self.lexers.len() > 1 {
                // End of an included file: keep its trailing trivia and
                // resume the including file.
                self.pending_trivia.extend(tok.trivia);
                let mut lexer = self.lexers.pop().expect("include stack underflow");
                self.diagnostics.extend(lexer.take_errors());
                continue;
            }
            return tok;
        }
    }

    fn raw_peek(&mut self) -> &Token {
        if self.raw_peeked.is_none() {
            let tok = self.raw_next();
            self.raw_peeked = Some(tok);
        }
        self.raw_peeked.as_ref().unwrap()
    }

    fn current_lexer(&mut self) -> &mut Lexer {
        self.lexers.last_mut().expect("no active lexer")
    }

    /// Collects raw tokens until end of line; the body of line-oriented
    /// directives. A token whose leading trivia crosses a newline belongs
    /// to the next line and is left in place.
    fn collect_directive_body(&mut self) -> Vec<Token> {
        let mut body = Vec::new();
        loop {
            let peek = self.raw_peek();
            if peek.kind == TokenKind::Eof || peek.trivia.iter().any(Trivia::ends_line) {
                break;
            }
            let tok = self.raw_next();
            body.push(tok);
        }
        body
    }

    // ----- directive dispatch --------------------------------------------

    fn handle_directive(&mut self, tok: Token) {
        let name = tok.text.trim_start_matches('`').to_string();
        match name.as_str() {
            "define" => self.handle_define(tok),
            "undef" => self.handle_undef(tok),
            "undefineall" => {
                self.macros.retain(|_, m| m.builtin);
                self.push_directive_trivia(vec![tok]);
            }
            "resetall" => {
                self.timescale = self.options.default_timescale;
                self.default_nettype = self.options.default_nettype;
                self.unconnected_drive = UnconnectedDrive::None;
                self.cell_define = false;
                self.push_directive_trivia(vec![tok]);
            }
            "include" => self.handle_include(tok),
            "ifdef" => self.handle_ifdef(tok, false),
            "ifndef" => self.handle_ifdef(tok, true),
            "elsif" | "else" => self.handle_dangling_branch(tok),
            "endif" => {
                if self.cond_stack.pop().is_none() {
                    self.error(
                        PreprocessorError::UnexpectedConditionalDirective {
                            directive: "endif".into(),
                        },
                        tok.range(),
                    );
                }
                self.push_directive_trivia(vec![tok]);
            }
            "line" => self.handle_line(tok),
            "timescale" => self.handle_timescale(tok),
            "default_nettype" => self.handle_default_nettype(tok),
            "unconnected_drive" => self.handle_unconnected_drive(tok),
            "nounconnected_drive" => {
                self.unconnected_drive = UnconnectedDrive::None;
                self.push_directive_trivia(vec![tok]);
            }
            "celldefine" => {
                self.cell_define = true;
                self.push_directive_trivia(vec![tok]);
            }
            "endcelldefine" => {
                self.cell_define = false;
                self.push_directive_trivia(vec![tok]);
            }
            "pragma" => {
                let mut body = vec![tok];
                body.extend(self.collect_directive_body());
                self.push_directive_trivia(body);
            }
            "error" => {
                let body = self.collect_directive_body();
                let message: String = body
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                self.error(PreprocessorError::UserDefinedError { message }, tok.range());
                let mut all = vec![tok];
                all.extend(body);
                self.push_directive_trivia(all);
            }
            "__FILE__" => {
                let file = self
                    .sm
                    .get_file_name(tok.loc)
                    .unwrap_or_default();
                let exp = self
                    .sm
                    .create_expansion_loc(tok.loc, tok.range(), Some(name.clone()));
                let mut out = Token::new(TokenKind::StringLiteral, exp, format!("\"{file}\""));
                out.value = Some(TokenValue::Str(file));
                self.push_directive_trivia(vec![tok]);
                self.expansion.push_back(out);
            }
            "__LINE__" => {
                let line = self.sm.get_line_number(tok.loc).unwrap_or(0);
                let exp = self
                    .sm
                    .create_expansion_loc(tok.loc, tok.range(), Some(name.clone()));
                let mut out = Token::new(TokenKind::IntLiteral, exp, line.to_string());
                out.value = Some(TokenValue::Int(sylva_numeric::SVInt::from_u64(line as u64)));
                self.push_directive_trivia(vec![tok]);
                self.expansion.push_back(out);
            }
            _ => self.handle_macro_usage(tok),
        }
    }

    fn push_directive_trivia(&mut self, tokens: Vec<Token>) {
        self.pending_trivia.push(Trivia::directive(tokens));
    }

    // ----- includes -------------------------------------------------------

    fn handle_include(&mut self, tok: Token) {
        let Some((name_tok, is_system)) = self.current_lexer().lex_include_filename() else {
            self.error(PreprocessorError::ExpectedIncludeFileName, tok.range());
            self.push_directive_trivia(vec![tok]);
            return;
        };

        let raw = name_tok.text.clone();
        let inner = raw
            .trim_start_matches(['"', '<'])
            .trim_end_matches(['"', '>'])
            .to_string();
        let range = tok.range();
        let include_loc = tok.loc;
        self.push_directive_trivia(vec![tok, name_tok]);

        if self.lexers.len() >= self.options.max_include_depth {
            self.error(PreprocessorError::ExceededMaxIncludeDepth, range);
            return;
        }

        match self.sm.read_header(&inner, include_loc, is_system) {
            Some(buffer) => {
                let lexer = Lexer::new(buffer, self.options.language_version);
                self.lexers.push(lexer);
            }
            None => {
                self.error(
                    PreprocessorError::CouldNotOpenIncludeFile { name: inner },
                    range,
                );
            }
        }
    }

    // ----- conditionals ---------------------------------------------------

    fn handle_ifdef(&mut self, tok: Token, invert: bool) {
        let name_tok = self.raw_next();
        let defined = self.macros.contains_key(name_tok.identifier());
        let active = defined != invert;
        self.push_directive_trivia(vec![tok, name_tok]);
        self.cond_stack.push(Conditional {
            taken: active,
            has_else: false,
        });
        if !active {
            self.skip_disabled_branches();
        }
    }

    /// An `elsif or `else reached from an *active* branch: every remaining
    /// branch of the construct is disabled.
    fn handle_dangling_branch(&mut self, tok: Token) {
        let name = tok.text.trim_start_matches('`').to_string();
        if self.cond_stack.is_empty() {
            self.error(
                PreprocessorError::UnexpectedConditionalDirective { directive: name },
                tok.range(),
            );
            self.push_directive_trivia(vec![tok]);
            return;
        }

        let mut tokens = vec![tok];
        if name == "elsif" {
            tokens.push(self.raw_next());
        } else if let Some(top) = self.cond_stack.last_mut() {
            top.has_else = true;
        }
        self.push_directive_trivia(tokens);
        // The active branch is over; everything to `endif is disabled.
        if let Some(top) = self.cond_stack.last_mut() {
            top.taken = true;
        }
        self.skip_disabled_branches();
    }

    /// Consumes tokens of disabled branches (tracking nesting) until a
    /// branch activates or the construct's `endif is reached. The raw text
    /// becomes DisabledText trivia.
    fn skip_disabled_branches(&mut self) {
        let mut disabled = String::new();
        let mut depth = 0usize;

        let flush = |disabled: &mut String, pending: &mut Vec<Trivia>| {
            if !disabled.is_empty() {
                pending.push(Trivia::new(TriviaKind::DisabledText, std::mem::take(disabled)));
            }
        };

        loop {
            let tok = self.raw_next();
            if tok.kind == TokenKind::Eof {
                flush(&mut disabled, &mut self.pending_trivia);
                self.error(
                    PreprocessorError::MissingEndIfDirective,
                    SourceRange::at(tok.loc),
                );
                self.cond_stack.pop();
                self.raw_peeked = Some(tok);
                return;
            }

            let directive = if tok.kind == TokenKind::Directive {
                tok.text.trim_start_matches('`').to_string()
            } else {
                String::new()
            };

            match directive.as_str() {
                "ifdef" | "ifndef" => {
                    depth += 1;
                    append_raw(&mut disabled, &tok);
                }
                "endif" if depth > 0 => {
                    depth -= 1;
                    append_raw(&mut disabled, &tok);
                }
                "endif" => {
                    flush(&mut disabled, &mut self.pending_trivia);
                    self.push_directive_trivia(vec![tok]);
                    self.cond_stack.pop();
                    return;
                }
                "elsif" if depth == 0 => {
                    let name_tok = self.raw_next();
                    let top_taken = self.cond_stack.last().map(|c| c.taken).unwrap_or(true);
                    let defined = self.macros.contains_key(name_tok.identifier());
                    flush(&mut disabled, &mut self.pending_trivia);
                    self.push_directive_trivia(vec![tok, name_tok]);
                    if !top_taken && defined {
                        if let Some(top) = self.cond_stack.last_mut() {
                            top.taken = true;
                        }
                        return;
                    }
                }
                "else" if depth == 0 => {
                    let top_taken = self.cond_stack.last().map(|c| c.taken).unwrap_or(true);
                    flush(&mut disabled, &mut self.pending_trivia);
                    self.push_directive_trivia(vec![tok]);
                    if let Some(top) = self.cond_stack.last_mut() {
                        top.has_else = true;
                    }
                    if !top_taken {
                        if let Some(top) = self.cond_stack.last_mut() {
                            top.taken = true;
                        }
                        return;
                    }
                }
                _ => append_raw(&mut disabled, &tok),
            }
        }
    }

    // ----- stateful directives -------------------------------------------

    fn handle_line(&mut self, tok: Token) {
        let body = self.collect_directive_body();
        let ok = (|| {
            let line = body.first()?.int_value()?.as_u64()?;
            let name = body.get(1)?.string_value()?.to_string();
            let level = match body.get(2) {
                Some(t) => t.int_value()?.as_u64()?,
                None => 0,
            };
            if level > 2 {
                return None;
            }
            self.sm
                .add_line_directive(tok.loc, line as usize, &name, level as u8);
            Some(())
        })();

        if ok.is_none() {
            self.error(PreprocessorError::InvalidLineDirective, tok.range());
        }
        let mut all = vec![tok];
        all.extend(body);
        self.push_directive_trivia(all);
    }

    fn handle_timescale(&mut self, tok: Token) {
        let body = self.collect_directive_body();
        let parsed = parse_timescale(&body);
        if let Some(ts) = parsed {
            self.timescale = Some(ts);
        } else {
            self.error(PreprocessorError::InvalidTimescale, tok.range());
        }
        let mut all = vec![tok];
        all.extend(body);
        self.push_directive_trivia(all);
    }

    fn handle_default_nettype(&mut self, tok: Token) {
        let arg = self.raw_next();
        let net = match arg.kind {
            TokenKind::KwWire => Some(DefaultNetType::Wire),
            TokenKind::KwUwire => Some(DefaultNetType::Uwire),
            TokenKind::KwTri => Some(DefaultNetType::Tri),
            TokenKind::KwTri0 => Some(DefaultNetType::Tri0),
            TokenKind::KwTri1 => Some(DefaultNetType::Tri1),
            TokenKind::KwWand => Some(DefaultNetType::Wand),
            TokenKind::KwWor => Some(DefaultNetType::Wor),
            TokenKind::KwTrireg => Some(DefaultNetType::Trireg),
            TokenKind::Identifier if arg.text == "none" => Some(DefaultNetType::None),
            _ => None,
        };
        match net {
            Some(n) => self.default_nettype = n,
            None => self.error(
                PreprocessorError::UnknownDirective {
                    name: format!("default_nettype {}", arg.text),
                },
                arg.range(),
            ),
        }
        self.push_directive_trivia(vec![tok, arg]);
    }

    fn handle_unconnected_drive(&mut self, tok: Token) {
        let arg = self.raw_next();
        match arg.text.as_str() {
            "pull0" => self.unconnected_drive = UnconnectedDrive::Pull0,
            "pull1" => self.unconnected_drive = UnconnectedDrive::Pull1,
            _ => self.error(
                PreprocessorError::UnknownDirective {
                    name: format!("unconnected_drive {}", arg.text),
                },
                arg.range(),
            ),
        }
        self.push_directive_trivia(vec![tok, arg]);
    }
}

fn append_raw(out: &mut String, tok: &Token) {
    for t in &tok.trivia {
        out.push_str(&t.text);
    }
    out.push_str(&tok.text);
}

fn parse_timescale(body: &[Token]) -> Option<TimeScale> {
    // `timescale 1ns / 1ps — two time literals around a slash.
    let mut parts = Vec::new();
    let mut iter = body.iter();
    for tok in iter.by_ref() {
        match &tok.value {
            Some(TokenValue::Time { value, unit }) => {
                let magnitude = *value;
                if magnitude.fract() != 0.0 {
                    return None;
                }
                parts.push(TimeScaleValue::new(magnitude as u16, *unit)?);
                if parts.len() == 2 {
                    break;
                }
            }
            _ if tok.kind == TokenKind::Slash => {}
            _ => return None,
        }
    }
    if parts.len() != 2 || iter.next().is_some() {
        return None;
    }
    Some(TimeScale {
        unit: parts[0],
        precision: parts[1],
    })
}

#[cfg(test)]
mod tests;
