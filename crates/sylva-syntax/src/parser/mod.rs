// src/parser/mod.rs
//
// Hand-written recursive descent over the preprocessed token stream.
// Every `parse_*` production returns a SyntaxNode that owns its tokens;
// error recovery skips to a synchronization point with one diagnostic for
// the first unexpected token and suppression of the cascade.

mod expr;
mod members;
mod stmt;
mod types;

use std::collections::VecDeque;

use sylva_text::{Diagnostic, Diagnostics, SourceRange};

use crate::cst::{SyntaxKind, SyntaxNode};
use crate::errors::ParserError;
use crate::preprocessor::Preprocessor;
use crate::token::{Token, TokenKind};
use crate::trivia::Trivia;

/// The construct whose members are currently being parsed; used to check
/// the "kind X is allowed inside parent Y" table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParentKind {
    CompilationUnit,
    Module,
    Interface,
    Program,
    Package,
    Class,
    GenerateBlock,
}

impl ParentKind {
    pub(crate) fn display(self) -> &'static str {
        match self {
            ParentKind::CompilationUnit => "the compilation unit",
            ParentKind::Module => "a module",
            ParentKind::Interface => "an interface",
            ParentKind::Program => "a program",
            ParentKind::Package => "a package",
            ParentKind::Class => "a class",
            ParentKind::GenerateBlock => "a generate block",
        }
    }
}

/// An out-of-block definition `function C::m...` recorded during parsing
/// for the class elaborator.
#[derive(Debug, Clone)]
pub struct OutOfBlockDef {
    pub class_name: String,
    pub member_name: String,
    pub syntax: SyntaxNode,
}

pub struct Parser<'sm> {
    pp: Preprocessor<'sm>,
    lookahead: VecDeque<Token>,
    diagnostics: Diagnostics,
    depth: usize,
    /// Set after an error until a token is consumed cleanly; suppresses
    /// cascading diagnostics inside one synchronization unit.
    recovering: bool,
    pub(crate) out_of_block: Vec<OutOfBlockDef>,
}

impl<'sm> Parser<'sm> {
    pub fn new(pp: Preprocessor<'sm>) -> Self {
        Parser {
            pp,
            lookahead: VecDeque::new(),
            diagnostics: Diagnostics::new(),
            depth: 0,
            recovering: false,
            out_of_block: Vec::new(),
        }
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        let mut out = self.pp.take_diagnostics();
        out.extend(std::mem::take(&mut self.diagnostics));
        out
    }

    pub fn into_parts(mut self) -> (Diagnostics, Vec<OutOfBlockDef>) {
        let diags = self.take_diagnostics();
        (diags, self.out_of_block)
    }

    // ----- token plumbing -------------------------------------------------

    pub(crate) fn peek_n(&mut self, n: usize) -> &Token {
        while self.lookahead.len() <= n {
            let tok = self.pp.next_token();
            self.lookahead.push_back(tok);
        }
        &self.lookahead[n]
    }

    pub(crate) fn peek(&mut self) -> &Token {
        self.peek_n(0)
    }

    pub(crate) fn at(&mut self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(crate) fn bump(&mut self) -> Token {
        self.peek();
        self.recovering = false;
        self.lookahead.pop_front().expect("lookahead primed")
    }

    /// Consume the current token if it matches.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    /// Require a token of the given kind; on mismatch emit one diagnostic
    /// (unless already recovering) and fabricate a missing token so later
    /// passes see a well-formed tree.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Token {
        if self.at(kind) {
            return self.bump();
        }
        let (found, loc) = {
            let tok = self.peek();
            (tok.kind.display().to_string(), tok.loc)
        };
        if !self.recovering {
            self.error(
                ParserError::ExpectedToken {
                    expected: kind.display().to_string(),
                    found,
                },
                SourceRange::at(loc),
            );
            self.recovering = true;
        }
        Token::missing(kind, loc)
    }

    pub(crate) fn error(&mut self, error: ParserError, range: SourceRange) {
        self.diagnostics.add(Diagnostic::new(&error, range));
    }

    /// Skips tokens up to (not including) one of the synchronization
    /// kinds, attaching them as skipped trivia to the token that follows.
    pub(crate) fn recover_to(&mut self, sync: &[TokenKind]) {
        let mut skipped = Vec::new();
        loop {
            let kind = self.peek().kind;
            if kind == TokenKind::Eof || sync.contains(&kind) {
                break;
            }
            skipped.push(self.bump());
        }
        if !skipped.is_empty() {
            let trivia = Trivia::skipped(skipped);
            let next = self.peek_n(0);
            let mut merged = vec![trivia];
            merged.extend(next.trivia.clone());
            self.lookahead[0].trivia = merged;
        }
        self.recovering = true;
    }

    /// Bounded-lookahead guard for deeply nested expressions.
    pub(crate) fn with_depth<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> T,
        fallback: impl FnOnce(&mut Self) -> T,
    ) -> T {
        if self.depth >= self.pp.options().max_parse_depth {
            let range = SourceRange::at(self.peek().loc);
            self.error(ParserError::ExceededMaxParseDepth, range);
            return fallback(self);
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    // ----- entry points ---------------------------------------------------

    /// Parses an entire compilation unit, consuming the stream to EOF. The
    /// EOF token is kept as the final child so trailing trivia survives.
    pub fn parse_compilation_unit(&mut self) -> SyntaxNode {
        let mut unit = SyntaxNode::new(SyntaxKind::CompilationUnit);
        loop {
            if self.at(TokenKind::Eof) {
                unit.push_token(self.bump());
                break;
            }
            let before = self.peek().loc;
            let member = self.parse_member(ParentKind::CompilationUnit);
            unit.push_node(member);
            // Guarantee forward progress even on pathological input.
            if self.peek().loc == before && !self.at(TokenKind::Eof) {
                let tok = self.bump();
                let mut skipped = SyntaxNode::new(SyntaxKind::SkippedMember);
                skipped.push_token(tok);
                unit.push_node(skipped);
            }
        }
        unit
    }

    /// Parses a lone expression (for scripting sessions); trailing tokens
    /// are left unconsumed.
    pub fn parse_expression_root(&mut self) -> SyntaxNode {
        self.parse_expr()
    }

    /// Parses a single statement (for scripting sessions).
    pub fn parse_statement_root(&mut self) -> SyntaxNode {
        self.parse_statement()
    }

    /// True if the remaining stream is only EOF.
    pub fn at_eof(&mut self) -> bool {
        self.at(TokenKind::Eof)
    }
}

#[cfg(test)]
mod tests;
