// src/parser/stmt.rs
//
// Statement productions, including the declarations that may open a
// statement list.

use sylva_text::SourceRange;

use crate::cst::{SyntaxKind, SyntaxNode};
use crate::errors::ParserError;
use crate::token::TokenKind;

use super::Parser;

const STMT_SYNC: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::KwEnd,
    TokenKind::KwEndcase,
    TokenKind::KwEndfunction,
    TokenKind::KwEndtask,
    TokenKind::KwEndclass,
    TokenKind::KwEndmodule,
    TokenKind::KwEndgenerate,
    TokenKind::KwJoin,
    TokenKind::KwElse,
];

impl<'sm> Parser<'sm> {
    pub(crate) fn parse_statement(&mut self) -> SyntaxNode {
        let peek_kind = self.peek().kind;
        match peek_kind {
            // `name : assert/assume/cover/begin` is a label on the
            // following construct.
            TokenKind::Identifier
                if self.peek_n(1).kind == TokenKind::Colon
                    && matches!(
                        self.peek_n(2).kind,
                        TokenKind::KwAssert
                            | TokenKind::KwAssume
                            | TokenKind::KwCover
                            | TokenKind::KwBegin
                    ) =>
            {
                let mut node = SyntaxNode::new(SyntaxKind::LabeledStatement);
                node.push_token(self.bump()); // name
                node.push_token(self.bump()); // :
                node.push_node(self.parse_statement());
                node
            }
            TokenKind::KwBegin => self.parse_block(TokenKind::KwEnd),
            TokenKind::KwFork => self.parse_fork_block(),
            TokenKind::KwIf => self.parse_conditional_statement(),
            TokenKind::KwUnique | TokenKind::KwUnique0 | TokenKind::KwPriority => {
                // Violation prefix on if or case.
                let prefix = self.bump();
                let mut inner = match self.peek().kind {
                    TokenKind::KwIf => self.parse_conditional_statement(),
                    TokenKind::KwCase | TokenKind::KwCasex | TokenKind::KwCasez => {
                        self.parse_case_statement()
                    }
                    _ => {
                        let found = self.peek().kind.display().to_string();
                        self.error(ParserError::ExpectedStatement { found }, prefix.range());
                        self.parse_statement()
                    }
                };
                inner.children.insert(0, crate::cst::SyntaxElement::Token(prefix));
                inner
            }
            TokenKind::KwCase | TokenKind::KwCasex | TokenKind::KwCasez => {
                self.parse_case_statement()
            }
            TokenKind::KwFor => self.parse_for_statement(),
            TokenKind::KwWhile => {
                let mut node = SyntaxNode::new(SyntaxKind::WhileStatement);
                node.push_token(self.bump());
                node.push_token(self.expect(TokenKind::LParen));
                node.push_node(self.parse_expr());
                node.push_token(self.expect(TokenKind::RParen));
                node.push_node(self.parse_statement());
                node
            }
            TokenKind::KwDo => {
                let mut node = SyntaxNode::new(SyntaxKind::DoWhileStatement);
                node.push_token(self.bump());
                node.push_node(self.parse_statement());
                node.push_token(self.expect(TokenKind::KwWhile));
                node.push_token(self.expect(TokenKind::LParen));
                node.push_node(self.parse_expr());
                node.push_token(self.expect(TokenKind::RParen));
                node.push_token(self.expect(TokenKind::Semicolon));
                node
            }
            TokenKind::KwRepeat => {
                let mut node = SyntaxNode::new(SyntaxKind::RepeatStatement);
                node.push_token(self.bump());
                node.push_token(self.expect(TokenKind::LParen));
                node.push_node(self.parse_expr());
                node.push_token(self.expect(TokenKind::RParen));
                node.push_node(self.parse_statement());
                node
            }
            TokenKind::KwForever => {
                let mut node = SyntaxNode::new(SyntaxKind::ForeverStatement);
                node.push_token(self.bump());
                node.push_node(self.parse_statement());
                node
            }
            TokenKind::KwForeach => {
                let mut node = SyntaxNode::new(SyntaxKind::ForeachStatement);
                node.push_token(self.bump());
                node.push_token(self.expect(TokenKind::LParen));
                node.push_node(self.parse_expr());
                node.push_token(self.expect(TokenKind::RParen));
                node.push_node(self.parse_statement());
                node
            }
            TokenKind::KwReturn => {
                let mut node = SyntaxNode::new(SyntaxKind::ReturnStatement);
                node.push_token(self.bump());
                if !self.at(TokenKind::Semicolon) {
                    node.push_node(self.parse_expr());
                }
                node.push_token(self.expect(TokenKind::Semicolon));
                node
            }
            TokenKind::KwBreak => {
                let mut node = SyntaxNode::new(SyntaxKind::BreakStatement);
                node.push_token(self.bump());
                node.push_token(self.expect(TokenKind::Semicolon));
                node
            }
            TokenKind::KwContinue => {
                let mut node = SyntaxNode::new(SyntaxKind::ContinueStatement);
                node.push_token(self.bump());
                node.push_token(self.expect(TokenKind::Semicolon));
                node
            }
            TokenKind::KwDisable => {
                let mut node = SyntaxNode::new(SyntaxKind::DisableStatement);
                node.push_token(self.bump());
                if self.at(TokenKind::KwFork) {
                    node.push_token(self.bump());
                } else {
                    node.push_token(self.expect(TokenKind::Identifier));
                }
                node.push_token(self.expect(TokenKind::Semicolon));
                node
            }
            TokenKind::KwWait => {
                let mut node = SyntaxNode::new(SyntaxKind::WaitStatement);
                node.push_token(self.bump());
                node.push_token(self.expect(TokenKind::LParen));
                node.push_node(self.parse_expr());
                node.push_token(self.expect(TokenKind::RParen));
                node.push_node(self.parse_statement());
                node
            }
            TokenKind::At => {
                let mut node = SyntaxNode::new(SyntaxKind::TimedStatement);
                node.push_node(self.parse_event_control());
                node.push_node(self.parse_statement());
                node
            }
            TokenKind::Hash => {
                let mut node = SyntaxNode::new(SyntaxKind::TimedStatement);
                node.push_node(self.parse_delay_control());
                node.push_node(self.parse_statement());
                node
            }
            TokenKind::KwAssert | TokenKind::KwAssume | TokenKind::KwCover => {
                self.parse_immediate_assertion()
            }
            TokenKind::KwTypedef => self.parse_typedef(),
            TokenKind::KwImport => {
                // Rare but legal inside blocks; reuse the member form.
                self.parse_member(super::ParentKind::GenerateBlock)
            }
            TokenKind::KwParameter | TokenKind::KwLocalparam => {
                self.parse_parameter_declaration(SyntaxKind::ParameterDeclaration, true)
            }
            TokenKind::Semicolon => {
                let mut node = SyntaxNode::new(SyntaxKind::EmptyStatement);
                node.push_token(self.bump());
                node
            }
            kind if starts_statement_decl(kind) => self.parse_variable_declaration(),
            TokenKind::Identifier if self.identifier_starts_decl() => {
                self.parse_variable_declaration()
            }
            TokenKind::Eof => {
                let loc = self.peek().loc;
                if !self.recovering {
                    self.error(
                        ParserError::ExpectedStatement {
                            found: "end of file".to_string(),
                        },
                        SourceRange::at(loc),
                    );
                    self.recovering = true;
                }
                SyntaxNode::new(SyntaxKind::EmptyStatement)
            }
            _ => {
                // Expression statement (assignments, calls, increments).
                let mut node = SyntaxNode::new(SyntaxKind::ExpressionStatement);
                let expr = self.parse_expr();
                let failed = expr.kind == SyntaxKind::Unknown;
                node.push_node(expr);
                if failed {
                    self.recover_to(STMT_SYNC);
                }
                node.push_token(self.expect(TokenKind::Semicolon));
                node
            }
        }
    }

    /// `type name ...` at statement level: a declaration when an
    /// identifier is followed by another identifier or a scoped type.
    fn identifier_starts_decl(&mut self) -> bool {
        match self.peek_n(1).kind {
            TokenKind::Identifier => true,
            TokenKind::ColonColon => self.peek_n(3).kind == TokenKind::Identifier,
            _ => false,
        }
    }

    fn parse_block(&mut self, end_kw: TokenKind) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::BlockStatement);
        node.push_token(self.bump()); // begin/fork
        let mut open_name = String::new();
        if self.at(TokenKind::Colon) {
            node.push_token(self.bump());
            let name = self.expect(TokenKind::Identifier);
            open_name = name.text.clone();
            node.push_token(name);
        }
        while !self.at(end_kw) && !self.at(TokenKind::Eof) {
            let before = self.peek().loc;
            node.push_node(self.parse_statement());
            if self.peek().loc == before && !self.at(end_kw) {
                self.recover_to(&[end_kw, TokenKind::Semicolon]);
                self.eat(TokenKind::Semicolon);
            }
        }
        node.push_token(self.expect(end_kw));
        self.parse_end_name(&mut node, &open_name);
        node
    }

    fn parse_fork_block(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::BlockStatement);
        node.push_token(self.bump()); // fork
        let mut open_name = String::new();
        if self.at(TokenKind::Colon) {
            node.push_token(self.bump());
            let name = self.expect(TokenKind::Identifier);
            open_name = name.text.clone();
            node.push_token(name);
        }
        let is_join = |k: TokenKind| {
            matches!(k, TokenKind::KwJoin | TokenKind::KwJoinAny | TokenKind::KwJoinNone)
        };
        while !is_join(self.peek().kind) && !self.at(TokenKind::Eof) {
            let before = self.peek().loc;
            node.push_node(self.parse_statement());
            if self.peek().loc == before && !is_join(self.peek().kind) {
                self.recover_to(&[TokenKind::KwJoin, TokenKind::Semicolon]);
                self.eat(TokenKind::Semicolon);
            }
        }
        if is_join(self.peek().kind) {
            node.push_token(self.bump());
        } else {
            node.push_token(self.expect(TokenKind::KwJoin));
        }
        self.parse_end_name(&mut node, &open_name);
        node
    }

    fn parse_conditional_statement(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ConditionalStatement);
        node.push_token(self.bump()); // if
        node.push_token(self.expect(TokenKind::LParen));
        node.push_node(self.parse_expr());
        node.push_token(self.expect(TokenKind::RParen));
        node.push_node(self.parse_statement());
        if self.at(TokenKind::KwElse) {
            node.push_token(self.bump());
            node.push_node(self.parse_statement());
        }
        node
    }

    fn parse_case_statement(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::CaseStatement);
        node.push_token(self.bump()); // case/casex/casez
        node.push_token(self.expect(TokenKind::LParen));
        node.push_node(self.parse_expr());
        node.push_token(self.expect(TokenKind::RParen));

        while !self.at(TokenKind::KwEndcase) && !self.at(TokenKind::Eof) {
            let before = self.peek().loc;
            let mut item = SyntaxNode::new(SyntaxKind::CaseItem);
            if self.at(TokenKind::KwDefault) {
                item.push_token(self.bump());
                if self.at(TokenKind::Colon) {
                    item.push_token(self.bump());
                }
            } else {
                loop {
                    item.push_node(self.parse_expr());
                    if self.at(TokenKind::Comma) {
                        item.push_token(self.bump());
                    } else {
                        break;
                    }
                }
                item.push_token(self.expect(TokenKind::Colon));
            }
            item.push_node(self.parse_statement());
            node.push_node(item);
            if self.peek().loc == before && !self.at(TokenKind::KwEndcase) {
                self.recover_to(&[TokenKind::KwEndcase, TokenKind::Semicolon]);
                self.eat(TokenKind::Semicolon);
            }
        }
        node.push_token(self.expect(TokenKind::KwEndcase));
        node
    }

    fn parse_for_statement(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ForLoopStatement);
        node.push_token(self.bump()); // for
        node.push_token(self.expect(TokenKind::LParen));

        // Initializer: a declaration (consumes its semicolon) or an
        // expression list.
        if starts_statement_decl(self.peek().kind)
            || (self.at(TokenKind::Identifier) && self.identifier_starts_decl())
        {
            node.push_node(self.parse_variable_declaration());
        } else {
            if !self.at(TokenKind::Semicolon) {
                loop {
                    node.push_node(self.parse_expr());
                    if self.at(TokenKind::Comma) {
                        node.push_token(self.bump());
                    } else {
                        break;
                    }
                }
            }
            node.push_token(self.expect(TokenKind::Semicolon));
        }

        if !self.at(TokenKind::Semicolon) {
            node.push_node(self.parse_expr());
        }
        node.push_token(self.expect(TokenKind::Semicolon));
        if !self.at(TokenKind::RParen) {
            loop {
                node.push_node(self.parse_expr());
                if self.at(TokenKind::Comma) {
                    node.push_token(self.bump());
                } else {
                    break;
                }
            }
        }
        node.push_token(self.expect(TokenKind::RParen));
        node.push_node(self.parse_statement());
        node
    }

    fn parse_immediate_assertion(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ImmediateAssertionStatement);
        node.push_token(self.bump()); // assert/assume/cover
        node.push_token(self.expect(TokenKind::LParen));
        node.push_node(self.parse_expr());
        node.push_token(self.expect(TokenKind::RParen));
        if self.at(TokenKind::KwElse) {
            node.push_token(self.bump());
            node.push_node(self.parse_statement());
        } else if !self.at(TokenKind::Semicolon) {
            node.push_node(self.parse_statement());
            if self.at(TokenKind::KwElse) {
                node.push_token(self.bump());
                node.push_node(self.parse_statement());
            }
        } else {
            node.push_token(self.bump()); // ;
        }
        node
    }

    /// `@(...)`, `@*`, or `@name`.
    fn parse_event_control(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::TimingControl);
        node.push_token(self.bump()); // @
        match self.peek().kind {
            TokenKind::Star => node.push_token(self.bump()),
            TokenKind::LParen => {
                node.push_token(self.bump());
                let mut depth = 0usize;
                while !self.at(TokenKind::Eof) {
                    match self.peek().kind {
                        TokenKind::LParen => depth += 1,
                        TokenKind::RParen if depth == 0 => break,
                        TokenKind::RParen => depth -= 1,
                        _ => {}
                    }
                    node.push_token(self.bump());
                }
                node.push_token(self.expect(TokenKind::RParen));
            }
            TokenKind::Identifier => node.push_token(self.bump()),
            _ => {
                node.push_token(self.expect(TokenKind::LParen));
            }
        }
        node
    }

    /// `#10`, `#1ns`, `#(expr)`, or `#identifier`.
    pub(crate) fn parse_delay_control(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::DelayControl);
        node.push_token(self.bump()); // #
        match self.peek().kind {
            TokenKind::IntLiteral | TokenKind::RealLiteral | TokenKind::TimeLiteral => {
                node.push_token(self.bump());
            }
            TokenKind::LParen => {
                node.push_token(self.bump());
                node.push_node(self.parse_expr());
                node.push_token(self.expect(TokenKind::RParen));
            }
            _ => {
                node.push_token(self.expect(TokenKind::Identifier));
            }
        }
        node
    }
}

fn starts_statement_decl(kind: TokenKind) -> bool {
    kind.is_integral_type_keyword()
        || matches!(
            kind,
            TokenKind::KwReal
                | TokenKind::KwShortreal
                | TokenKind::KwRealtime
                | TokenKind::KwString
                | TokenKind::KwEvent
                | TokenKind::KwChandle
                | TokenKind::KwStruct
                | TokenKind::KwUnion
                | TokenKind::KwEnum
                | TokenKind::KwVar
                | TokenKind::KwConst
                | TokenKind::KwAutomatic
                | TokenKind::KwStatic
        )
}
