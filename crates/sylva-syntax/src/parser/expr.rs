// src/parser/expr.rs
//
// Pratt expression parsing with the standard's precedence table.

use sylva_text::SourceRange;

use crate::cst::{SyntaxKind, SyntaxNode};
use crate::errors::ParserError;
use crate::token::{Token, TokenKind};

use super::Parser;

/// Left/right binding powers for binary operators. Left-associative
/// operators use `(bp, bp + 1)`; right-associative use `(bp, bp)`.
fn binary_bp(kind: TokenKind) -> Option<(u8, u8)> {
    use TokenKind::*;
    Some(match kind {
        Eq | PlusEq | MinusEq | StarEq | SlashEq | PercentEq | AmpEq | PipeEq | CaretEq
        | LtLtEq | GtGtEq | LtLtLtEq | GtGtGtEq => (2, 2),
        MinusGt | LtMinusGt => (4, 4),
        PipePipe => (8, 9),
        AmpAmp => (10, 11),
        Pipe => (12, 13),
        Caret | CaretTilde | TildeCaret => (14, 15),
        Amp => (16, 17),
        EqEq | BangEq | EqEqEq | BangEqEq | EqEqQuestion | BangEqQuestion => (18, 19),
        Lt | LtEq | Gt | GtEq => (20, 21),
        LtLt | GtGt | LtLtLt | GtGtGt => (22, 23),
        Plus | Minus => (24, 25),
        Star | Slash | Percent => (26, 27),
        StarStar => (28, 28),
        _ => return None,
    })
}

const CONDITIONAL_BP: u8 = 6;
const UNARY_BP: u8 = 30;

fn is_assignment_op(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Eq | PlusEq
            | MinusEq
            | StarEq
            | SlashEq
            | PercentEq
            | AmpEq
            | PipeEq
            | CaretEq
            | LtLtEq
            | GtGtEq
            | LtLtLtEq
            | GtGtGtEq
    )
}

fn is_unary_prefix(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Plus | Minus
            | Bang
            | Tilde
            | Amp
            | TildeAmp
            | Pipe
            | TildePipe
            | Caret
            | TildeCaret
            | CaretTilde
            | PlusPlus
            | MinusMinus
    )
}

impl<'sm> Parser<'sm> {
    pub(crate) fn parse_expr(&mut self) -> SyntaxNode {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> SyntaxNode {
        self.with_depth(
            |p| p.parse_expr_bp_inner(min_bp),
            |p| {
                let loc = p.peek().loc;
                let mut node = SyntaxNode::new(SyntaxKind::Unknown);
                node.push_token(Token::missing(TokenKind::Identifier, loc));
                node
            },
        )
    }

    fn parse_expr_bp_inner(&mut self, min_bp: u8) -> SyntaxNode {
        let mut lhs = self.parse_unary();

        loop {
            let kind = self.peek().kind;

            if kind == TokenKind::Question && CONDITIONAL_BP >= min_bp {
                let mut node = SyntaxNode::new(SyntaxKind::ConditionalExpression);
                node.push_node(lhs);
                node.push_token(self.bump()); // ?
                node.push_node(self.parse_expr_bp(0));
                node.push_token(self.expect(TokenKind::Colon));
                node.push_node(self.parse_expr_bp(CONDITIONAL_BP));
                lhs = node;
                continue;
            }

            let Some((lbp, rbp)) = binary_bp(kind) else {
                break;
            };
            if lbp < min_bp {
                break;
            }
            let op = self.bump();
            let rhs = self.parse_expr_bp(rbp);
            let node_kind = if is_assignment_op(op.kind) {
                SyntaxKind::AssignmentExpression
            } else {
                SyntaxKind::BinaryExpression
            };
            let mut node = SyntaxNode::new(node_kind);
            node.push_node(lhs);
            node.push_token(op);
            node.push_node(rhs);
            lhs = node;
        }
        lhs
    }

    fn parse_unary(&mut self) -> SyntaxNode {
        let kind = self.peek().kind;
        if is_unary_prefix(kind) {
            let mut node = SyntaxNode::new(SyntaxKind::UnaryExpression);
            node.push_token(self.bump());
            node.push_node(self.parse_expr_bp(UNARY_BP));
            return node;
        }
        let primary = self.parse_primary();
        self.parse_postfix(primary)
    }

    fn parse_postfix(&mut self, mut node: SyntaxNode) -> SyntaxNode {
        loop {
            match self.peek().kind {
                TokenKind::LParen => {
                    let mut call = SyntaxNode::new(SyntaxKind::CallExpression);
                    call.push_node(node);
                    call.push_node(self.parse_call_arguments());
                    node = call;
                }
                TokenKind::LBracket => {
                    node = self.parse_select(node);
                }
                TokenKind::Dot => {
                    let mut access = SyntaxNode::new(SyntaxKind::MemberAccessExpression);
                    access.push_node(node);
                    access.push_token(self.bump());
                    access.push_token(self.expect(TokenKind::Identifier));
                    node = access;
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let mut unary = SyntaxNode::new(SyntaxKind::UnaryExpression);
                    unary.push_node(node);
                    unary.push_token(self.bump());
                    node = unary;
                }
                _ => break,
            }
        }
        node
    }

    fn parse_select(&mut self, lhs: SyntaxNode) -> SyntaxNode {
        let lbracket = self.bump();
        let first = self.parse_expr_bp(0);
        match self.peek().kind {
            TokenKind::Colon | TokenKind::PlusColon | TokenKind::MinusColon => {
                let mut node = SyntaxNode::new(SyntaxKind::RangeSelectExpression);
                node.push_node(lhs);
                node.push_token(lbracket);
                node.push_node(first);
                node.push_token(self.bump());
                node.push_node(self.parse_expr_bp(0));
                node.push_token(self.expect(TokenKind::RBracket));
                node
            }
            _ => {
                let mut node = SyntaxNode::new(SyntaxKind::ElementSelectExpression);
                node.push_node(lhs);
                node.push_token(lbracket);
                node.push_node(first);
                node.push_token(self.expect(TokenKind::RBracket));
                node
            }
        }
    }

    fn parse_primary(&mut self) -> SyntaxNode {
        match self.peek().kind {
            TokenKind::IntLiteral
            | TokenKind::RealLiteral
            | TokenKind::TimeLiteral
            | TokenKind::StringLiteral
            | TokenKind::UnbasedUnsizedLiteral
            | TokenKind::KwNull
            | TokenKind::Dollar => {
                let mut node = SyntaxNode::new(SyntaxKind::LiteralExpression);
                node.push_token(self.bump());
                node
            }
            TokenKind::KwThis | TokenKind::KwSuper => {
                let mut node = SyntaxNode::new(SyntaxKind::NameExpression);
                node.push_token(self.bump());
                node
            }
            TokenKind::Identifier => {
                if self.peek_n(1).kind == TokenKind::ColonColon {
                    let mut node = SyntaxNode::new(SyntaxKind::ScopedNameExpression);
                    node.push_node(self.parse_scoped_name());
                    node
                } else {
                    let mut node = SyntaxNode::new(SyntaxKind::NameExpression);
                    node.push_token(self.bump());
                    node
                }
            }
            TokenKind::SystemIdentifier => {
                // `$unit::x` scopes into the compilation unit; anything else
                // is a system call.
                if self.peek_n(1).kind == TokenKind::ColonColon {
                    let mut node = SyntaxNode::new(SyntaxKind::ScopedNameExpression);
                    node.push_node(self.parse_scoped_name());
                    node
                } else {
                    let mut node = SyntaxNode::new(SyntaxKind::SystemCallExpression);
                    node.push_token(self.bump());
                    if self.at(TokenKind::LParen) {
                        node.push_node(self.parse_call_arguments());
                    }
                    node
                }
            }
            TokenKind::LParen => {
                let mut node = SyntaxNode::new(SyntaxKind::ParenthesizedExpression);
                node.push_token(self.bump());
                node.push_node(self.parse_expr_bp(0));
                node.push_token(self.expect(TokenKind::RParen));
                node
            }
            TokenKind::LBrace => self.parse_concatenation(),
            TokenKind::ApostropheLBrace => self.parse_assignment_pattern(),
            TokenKind::KwNew => {
                let mut node = SyntaxNode::new(SyntaxKind::NewExpression);
                node.push_token(self.bump());
                if self.at(TokenKind::LParen) {
                    node.push_node(self.parse_call_arguments());
                }
                node
            }
            _ => {
                let (found, loc) = {
                    let tok = self.peek();
                    (tok.kind.display().to_string(), tok.loc)
                };
                if !self.recovering {
                    self.error(
                        ParserError::ExpectedExpression { found },
                        SourceRange::at(loc),
                    );
                    self.recovering = true;
                }
                let mut node = SyntaxNode::new(SyntaxKind::Unknown);
                node.push_token(Token::missing(TokenKind::Identifier, loc));
                node
            }
        }
    }

    /// `{a, b}` concatenation or `{n {a, b}}` replication.
    fn parse_concatenation(&mut self) -> SyntaxNode {
        let lbrace = self.bump();
        let first = self.parse_expr_bp(0);

        if self.at(TokenKind::LBrace) {
            // Replication: the first expression is the count.
            let mut node = SyntaxNode::new(SyntaxKind::ReplicationExpression);
            node.push_token(lbrace);
            node.push_node(first);
            node.push_token(self.bump()); // inner {
            loop {
                node.push_node(self.parse_expr_bp(0));
                if self.at(TokenKind::Comma) {
                    node.push_token(self.bump());
                } else {
                    break;
                }
            }
            node.push_token(self.expect(TokenKind::RBrace)); // inner }
            node.push_token(self.expect(TokenKind::RBrace)); // outer }
            return node;
        }

        let mut node = SyntaxNode::new(SyntaxKind::ConcatenationExpression);
        node.push_token(lbrace);
        node.push_node(first);
        while self.at(TokenKind::Comma) {
            node.push_token(self.bump());
            node.push_node(self.parse_expr_bp(0));
        }
        node.push_token(self.expect(TokenKind::RBrace));
        node
    }

    /// `'{...}` assignment patterns parse with the same shape as a
    /// concatenation; the binder decides what they may initialize.
    fn parse_assignment_pattern(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ConcatenationExpression);
        node.push_token(self.bump()); // '{
        if !self.at(TokenKind::RBrace) {
            loop {
                node.push_node(self.parse_expr_bp(0));
                if self.at(TokenKind::Comma) {
                    node.push_token(self.bump());
                } else {
                    break;
                }
            }
        }
        node.push_token(self.expect(TokenKind::RBrace));
        node
    }

    /// `( [expr [, expr]*] )` with `.name(expr)` named arguments.
    pub(crate) fn parse_call_arguments(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ArgumentList);
        node.push_token(self.expect(TokenKind::LParen));
        while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Dot) {
                let mut named = SyntaxNode::new(SyntaxKind::NamedPortConnection);
                named.push_token(self.bump());
                named.push_token(self.expect(TokenKind::Identifier));
                named.push_token(self.expect(TokenKind::LParen));
                if !self.at(TokenKind::RParen) {
                    named.push_node(self.parse_expr_bp(0));
                }
                named.push_token(self.expect(TokenKind::RParen));
                node.push_node(named);
            } else {
                node.push_node(self.parse_expr_bp(0));
            }
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        node.push_token(self.expect(TokenKind::RParen));
        node
    }

    /// `name`, `pkg::name`, `$unit::name`, `C::m` — a chain of identifiers
    /// joined by `::`.
    pub(crate) fn parse_scoped_name(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ScopedName);
        if self.at(TokenKind::SystemIdentifier) {
            node.push_token(self.bump()); // $unit
        } else {
            node.push_token(self.expect(TokenKind::Identifier));
        }
        while self.at(TokenKind::ColonColon) {
            node.push_token(self.bump());
            node.push_token(self.expect(TokenKind::Identifier));
        }
        node
    }
}
