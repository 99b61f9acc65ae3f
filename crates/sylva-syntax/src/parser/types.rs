// src/parser/types.rs
//
// Data type productions: built-in integrals with signing and packed
// dimensions, floating and scalar keywords, enums, packed/unpacked structs
// and unions, virtual interfaces, named (possibly package-scoped) types,
// and the dimension grammar that distinguishes fixed, dynamic, queue, and
// associative arrays.

use crate::cst::{SyntaxKind, SyntaxNode};
use crate::token::TokenKind;

use super::Parser;

impl<'sm> Parser<'sm> {
    /// Parses a data type when the caller knows one is present.
    pub(crate) fn parse_data_type(&mut self) -> SyntaxNode {
        match self.peek().kind {
            kind if kind.is_integral_type_keyword() => {
                let mut node = SyntaxNode::new(SyntaxKind::DataType);
                node.push_token(self.bump());
                if matches!(self.peek().kind, TokenKind::KwSigned | TokenKind::KwUnsigned) {
                    node.push_token(self.bump());
                }
                while self.at(TokenKind::LBracket) {
                    node.push_node(self.parse_packed_dimension());
                }
                node
            }
            TokenKind::KwReal
            | TokenKind::KwShortreal
            | TokenKind::KwRealtime
            | TokenKind::KwString
            | TokenKind::KwEvent
            | TokenKind::KwChandle
            | TokenKind::KwVoid => {
                let mut node = SyntaxNode::new(SyntaxKind::DataType);
                node.push_token(self.bump());
                node
            }
            TokenKind::KwStruct | TokenKind::KwUnion => self.parse_struct_union(),
            TokenKind::KwEnum => self.parse_enum(),
            TokenKind::KwVirtual => self.parse_virtual_interface(),
            TokenKind::Identifier => {
                let mut node = SyntaxNode::new(SyntaxKind::DataType);
                node.push_node(self.parse_scoped_name());
                while self.at(TokenKind::LBracket) {
                    node.push_node(self.parse_packed_dimension());
                }
                node
            }
            _ => {
                // Implicit type: optional signing plus dimensions.
                let mut node = SyntaxNode::new(SyntaxKind::ImplicitType);
                if matches!(self.peek().kind, TokenKind::KwSigned | TokenKind::KwUnsigned) {
                    node.push_token(self.bump());
                }
                while self.at(TokenKind::LBracket) {
                    node.push_node(self.parse_packed_dimension());
                }
                node
            }
        }
    }

    /// Decides whether a data type precedes the declarator name, using
    /// bounded lookahead; returns `None` when the next token already is
    /// the name (implicit type).
    pub(crate) fn parse_opt_data_type_before_name(&mut self) -> Option<SyntaxNode> {
        match self.peek().kind {
            kind if kind.is_integral_type_keyword() => Some(self.parse_data_type()),
            TokenKind::KwReal
            | TokenKind::KwShortreal
            | TokenKind::KwRealtime
            | TokenKind::KwString
            | TokenKind::KwEvent
            | TokenKind::KwChandle
            | TokenKind::KwVoid
            | TokenKind::KwStruct
            | TokenKind::KwUnion
            | TokenKind::KwEnum
            | TokenKind::KwVirtual => Some(self.parse_data_type()),
            TokenKind::KwSigned | TokenKind::KwUnsigned => Some(self.parse_data_type()),
            TokenKind::LBracket => Some(self.parse_data_type()),
            TokenKind::Identifier => {
                match self.peek_n(1).kind {
                    // `type_name name` — a named type.
                    TokenKind::Identifier => Some(self.parse_data_type()),
                    // `pkg::type name` — scoped type; `pkg::name` alone is
                    // not a type in a declaration position.
                    TokenKind::ColonColon => {
                        if self.peek_n(3).kind == TokenKind::Identifier
                            || self.peek_n(3).kind == TokenKind::LBracket
                        {
                            Some(self.parse_data_type())
                        } else {
                            None
                        }
                    }
                    // `type_name [dims] name` vs `name [dims]` — look past
                    // the brackets for an identifier.
                    TokenKind::LBracket => {
                        let after = self.scan_past_brackets(1);
                        if self.peek_n(after).kind == TokenKind::Identifier {
                            Some(self.parse_data_type())
                        } else {
                            None
                        }
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Index of the token after a balanced bracket run starting at
    /// lookahead index `start` (which must be `[`).
    fn scan_past_brackets(&mut self, start: usize) -> usize {
        let mut i = start;
        loop {
            if self.peek_n(i).kind != TokenKind::LBracket {
                return i;
            }
            let mut depth = 0usize;
            loop {
                match self.peek_n(i).kind {
                    TokenKind::LBracket => depth += 1,
                    TokenKind::RBracket => {
                        depth -= 1;
                        if depth == 0 {
                            i += 1;
                            break;
                        }
                    }
                    TokenKind::Eof => return i,
                    _ => {}
                }
                i += 1;
            }
        }
    }

    fn parse_struct_union(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::StructUnionType);
        node.push_token(self.bump()); // struct/union
        if self.at(TokenKind::KwTagged) {
            node.push_token(self.bump());
        }
        if self.at(TokenKind::KwPacked) {
            node.push_token(self.bump());
        }
        if matches!(self.peek().kind, TokenKind::KwSigned | TokenKind::KwUnsigned) {
            node.push_token(self.bump());
        }
        node.push_token(self.expect(TokenKind::LBrace));
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let before = self.peek().loc;
            let mut member = SyntaxNode::new(SyntaxKind::StructUnionMember);
            member.push_node(self.parse_data_type());
            loop {
                member.push_node(self.parse_declarator(true));
                if self.at(TokenKind::Comma) {
                    member.push_token(self.bump());
                } else {
                    break;
                }
            }
            member.push_token(self.expect(TokenKind::Semicolon));
            node.push_node(member);
            if self.peek().loc == before && !self.at(TokenKind::RBrace) {
                self.recover_to(&[TokenKind::RBrace, TokenKind::Semicolon]);
                self.eat(TokenKind::Semicolon);
            }
        }
        node.push_token(self.expect(TokenKind::RBrace));
        while self.at(TokenKind::LBracket) {
            node.push_node(self.parse_packed_dimension());
        }
        node
    }

    fn parse_enum(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::EnumType);
        node.push_token(self.bump()); // enum
        if self.peek().kind.is_integral_type_keyword() || self.at(TokenKind::Identifier) {
            node.push_node(self.parse_data_type());
        }
        node.push_token(self.expect(TokenKind::LBrace));
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let mut member = SyntaxNode::new(SyntaxKind::EnumMember);
            member.push_token(self.expect(TokenKind::Identifier));
            if self.at(TokenKind::Eq) {
                let mut init = SyntaxNode::new(SyntaxKind::EqualsInitializer);
                init.push_token(self.bump());
                init.push_node(self.parse_expr());
                member.push_node(init);
            }
            node.push_node(member);
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        node.push_token(self.expect(TokenKind::RBrace));
        while self.at(TokenKind::LBracket) {
            node.push_node(self.parse_packed_dimension());
        }
        node
    }

    fn parse_virtual_interface(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::VirtualInterfaceType);
        node.push_token(self.bump()); // virtual
        if self.at(TokenKind::KwInterface) {
            node.push_token(self.bump());
        }
        node.push_token(self.expect(TokenKind::Identifier));
        if self.at(TokenKind::Dot) {
            node.push_token(self.bump());
            node.push_token(self.expect(TokenKind::Identifier));
        }
        node
    }

    /// `[msb:lsb]` or `[size]`.
    pub(crate) fn parse_packed_dimension(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::PackedDimension);
        node.push_token(self.bump()); // [
        node.push_node(self.parse_expr());
        if self.at(TokenKind::Colon) {
            node.push_token(self.bump());
            node.push_node(self.parse_expr());
        }
        node.push_token(self.expect(TokenKind::RBracket));
        node
    }

    /// Unpacked dimensions select the array flavor: `[n]`/`[l:r]` fixed,
    /// `[]` dynamic, `[$]`/`[$:n]` queue, `[*]`/`[type]` associative.
    pub(crate) fn parse_unpacked_dimension(&mut self) -> SyntaxNode {
        let lbracket = self.bump();
        let peek_kind = self.peek().kind;
        match peek_kind {
            TokenKind::RBracket => {
                let mut node = SyntaxNode::new(SyntaxKind::UnpackedDimension);
                node.push_token(lbracket);
                node.push_token(self.bump());
                node
            }
            TokenKind::Dollar => {
                let mut node = SyntaxNode::new(SyntaxKind::QueueDimension);
                node.push_token(lbracket);
                node.push_token(self.bump());
                if self.at(TokenKind::Colon) {
                    node.push_token(self.bump());
                    node.push_node(self.parse_expr());
                }
                node.push_token(self.expect(TokenKind::RBracket));
                node
            }
            TokenKind::Star if self.peek_n(1).kind == TokenKind::RBracket => {
                let mut node = SyntaxNode::new(SyntaxKind::AssociativeDimension);
                node.push_token(lbracket);
                node.push_token(self.bump());
                node.push_token(self.bump());
                node
            }
            kind if kind.is_integral_type_keyword() || kind == TokenKind::KwString => {
                let mut node = SyntaxNode::new(SyntaxKind::AssociativeDimension);
                node.push_token(lbracket);
                node.push_node(self.parse_data_type());
                node.push_token(self.expect(TokenKind::RBracket));
                node
            }
            _ => {
                let mut node = SyntaxNode::new(SyntaxKind::UnpackedDimension);
                node.push_token(lbracket);
                node.push_node(self.parse_expr());
                if self.at(TokenKind::Colon) {
                    node.push_token(self.bump());
                    node.push_node(self.parse_expr());
                }
                node.push_token(self.expect(TokenKind::RBracket));
                node
            }
        }
    }
}
