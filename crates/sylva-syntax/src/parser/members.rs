// src/parser/members.rs
//
// Member-level productions: design elements, class bodies, subroutines,
// declarations, hierarchy instantiation, and generate constructs. Member
// disambiguation uses bounded lookahead; when nothing matches we fall
// through to variable-declaration parsing for better error locality.

use sylva_text::SourceRange;

use crate::cst::{SyntaxKind, SyntaxNode};
use crate::errors::ParserError;
use crate::token::TokenKind;

use super::{ParentKind, Parser};

/// Synchronization set for member-level error recovery.
const MEMBER_SYNC: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::KwEndmodule,
    TokenKind::KwEndinterface,
    TokenKind::KwEndprogram,
    TokenKind::KwEndpackage,
    TokenKind::KwEndclass,
    TokenKind::KwEndfunction,
    TokenKind::KwEndtask,
    TokenKind::KwEndgenerate,
    TokenKind::KwEnd,
];

/// Which member kinds may appear inside which parents. Everything not
/// listed here is allowed anywhere (declarations, typedefs, imports).
fn member_allowed(kind: SyntaxKind, parent: ParentKind) -> bool {
    use ParentKind::*;
    match kind {
        SyntaxKind::ModuleDeclaration => matches!(parent, CompilationUnit | Module),
        SyntaxKind::InterfaceDeclaration
        | SyntaxKind::ProgramDeclaration
        | SyntaxKind::PackageDeclaration => parent == CompilationUnit,
        SyntaxKind::HierarchyInstantiation => {
            matches!(parent, CompilationUnit | Module | Interface | Program | GenerateBlock)
        }
        SyntaxKind::ContinuousAssign | SyntaxKind::ProceduralBlock => {
            matches!(parent, Module | Interface | Program | GenerateBlock)
        }
        SyntaxKind::GenerateRegion
        | SyntaxKind::LoopGenerate
        | SyntaxKind::IfGenerate
        | SyntaxKind::CaseGenerate
        | SyntaxKind::GenvarDeclaration => {
            matches!(parent, Module | Interface | Program | GenerateBlock)
        }
        SyntaxKind::NetDeclaration => {
            matches!(parent, CompilationUnit | Module | Interface | Program | GenerateBlock)
        }
        SyntaxKind::ModportDeclaration => parent == Interface,
        SyntaxKind::DefparamDeclaration | SyntaxKind::SpecparamDeclaration => {
            matches!(parent, Module | Interface | GenerateBlock)
        }
        SyntaxKind::ConstraintDeclaration => matches!(parent, Class | CompilationUnit),
        SyntaxKind::ClassMethod | SyntaxKind::ClassProperty => parent == Class,
        _ => true,
    }
}

impl<'sm> Parser<'sm> {
    pub(crate) fn parse_member(&mut self, parent: ParentKind) -> SyntaxNode {
        let node = self.parse_member_inner(parent);
        if !member_allowed(node.kind, parent) {
            let range = node.range();
            self.error(
                ParserError::NotAllowedInContext {
                    kind: member_display(node.kind).to_string(),
                    parent: parent.display().to_string(),
                },
                range,
            );
        }
        node
    }

    fn parse_member_inner(&mut self, parent: ParentKind) -> SyntaxNode {
        let peek_kind = self.peek().kind;
        match peek_kind {
            TokenKind::KwModule => {
                self.parse_module_like(SyntaxKind::ModuleDeclaration, TokenKind::KwEndmodule, ParentKind::Module)
            }
            TokenKind::KwInterface => {
                if self.peek_n(1).kind == TokenKind::KwClass {
                    self.parse_class()
                } else {
                    self.parse_module_like(
                        SyntaxKind::InterfaceDeclaration,
                        TokenKind::KwEndinterface,
                        ParentKind::Interface,
                    )
                }
            }
            TokenKind::KwProgram => self.parse_module_like(
                SyntaxKind::ProgramDeclaration,
                TokenKind::KwEndprogram,
                ParentKind::Program,
            ),
            TokenKind::KwPackage => self.parse_module_like(
                SyntaxKind::PackageDeclaration,
                TokenKind::KwEndpackage,
                ParentKind::Package,
            ),
            TokenKind::KwClass => self.parse_class(),
            TokenKind::KwVirtual if self.peek_n(1).kind == TokenKind::KwClass => self.parse_class(),
            TokenKind::KwFunction | TokenKind::KwTask => self.parse_subroutine(false),
            TokenKind::KwTypedef => self.parse_typedef(),
            TokenKind::KwParameter | TokenKind::KwLocalparam => {
                self.parse_parameter_declaration(SyntaxKind::ParameterDeclaration, true)
            }
            TokenKind::KwSpecparam => {
                self.parse_parameter_declaration(SyntaxKind::SpecparamDeclaration, true)
            }
            TokenKind::KwDefparam => self.parse_defparam(),
            TokenKind::KwImport => self.parse_import(),
            TokenKind::KwExport => self.parse_export(),
            TokenKind::KwGenvar => self.parse_genvar(),
            TokenKind::KwTimeunit | TokenKind::KwTimeprecision => self.parse_timeunits(),
            TokenKind::KwAssign => self.parse_continuous_assign(),
            TokenKind::KwAlways
            | TokenKind::KwAlwaysComb
            | TokenKind::KwAlwaysFf
            | TokenKind::KwAlwaysLatch
            | TokenKind::KwInitial
            | TokenKind::KwFinal => self.parse_procedural_block(),
            TokenKind::KwGenerate => self.parse_generate_region(),
            TokenKind::KwIf if parent != ParentKind::Class => self.parse_if_generate(),
            TokenKind::KwFor if parent != ParentKind::Class => self.parse_loop_generate(),
            TokenKind::KwCase if parent != ParentKind::Class => self.parse_case_generate(),
            TokenKind::KwModport => self.parse_modport(),
            TokenKind::KwConstraint => self.parse_constraint(),
            TokenKind::KwCovergroup => self.parse_skipped_until(TokenKind::KwEndgroup),
            TokenKind::KwBind => self.parse_skipped_until(TokenKind::Semicolon),
            TokenKind::Semicolon => {
                let mut node = SyntaxNode::new(SyntaxKind::EmptyStatement);
                node.push_token(self.bump());
                node
            }
            kind if kind.is_net_type_keyword() => self.parse_net_declaration(),
            kind if parent == ParentKind::Class && starts_class_item(kind) => {
                self.parse_class_item()
            }
            TokenKind::Identifier => self.disambiguate_identifier_member(),
            kind if starts_data_type(kind) => self.parse_variable_declaration(),
            _ => {
                let (found, loc) = {
                    let tok = self.peek();
                    (tok.kind.display().to_string(), tok.loc)
                };
                if !self.recovering {
                    self.error(
                        ParserError::ExpectedMember {
                            expected: parent.display().to_string(),
                            found,
                        },
                        SourceRange::at(loc),
                    );
                }
                self.recover_to(MEMBER_SYNC);
                let mut node = SyntaxNode::new(SyntaxKind::SkippedMember);
                if self.at(TokenKind::Semicolon) {
                    node.push_token(self.bump());
                }
                node
            }
        }
    }

    /// `identifier ...` at member level: an instantiation when followed by
    /// `#(` or `name (`, otherwise a declaration using a named type.
    fn disambiguate_identifier_member(&mut self) -> SyntaxNode {
        let next = self.peek_n(1).kind;
        match next {
            TokenKind::Hash => self.parse_hierarchy_instantiation(),
            TokenKind::Identifier => {
                if self.peek_n(2).kind == TokenKind::LParen {
                    self.parse_hierarchy_instantiation()
                } else {
                    self.parse_variable_declaration()
                }
            }
            _ => self.parse_variable_declaration(),
        }
    }

    // ----- design elements ------------------------------------------------

    pub(crate) fn parse_module_like(
        &mut self,
        kind: SyntaxKind,
        end_kw: TokenKind,
        body_parent: ParentKind,
    ) -> SyntaxNode {
        let mut node = SyntaxNode::new(kind);
        let mut header = SyntaxNode::new(SyntaxKind::ModuleHeader);
        header.push_token(self.bump()); // module/interface/program/package
        if self.at(TokenKind::KwAutomatic) || self.at(TokenKind::KwStatic) {
            header.push_token(self.bump());
        }
        let name = self.expect(TokenKind::Identifier);
        let open_name = name.text.clone();
        header.push_token(name);

        if self.at(TokenKind::Hash) {
            header.push_node(self.parse_parameter_port_list());
        }
        if self.at(TokenKind::LParen) {
            header.push_node(self.parse_port_list());
        }
        header.push_token(self.expect(TokenKind::Semicolon));
        node.push_node(header);

        while !self.at(end_kw) && !self.at(TokenKind::Eof) {
            let before = self.peek().loc;
            let member = self.parse_member(body_parent);
            node.push_node(member);
            if self.peek().loc == before && !self.at(end_kw) && !self.at(TokenKind::Eof) {
                self.recover_to(&[end_kw, TokenKind::Semicolon]);
                self.eat(TokenKind::Semicolon);
            }
        }

        node.push_token(self.expect(end_kw));
        self.parse_end_name(&mut node, &open_name);
        node
    }

    /// `: name` after an end keyword, validated against the opening name.
    pub(crate) fn parse_end_name(&mut self, node: &mut SyntaxNode, open_name: &str) {
        if self.at(TokenKind::Colon) {
            node.push_token(self.bump());
            let name = self.expect(TokenKind::Identifier);
            if !name.missing && name.text != open_name {
                self.error(
                    ParserError::EndNameMismatch {
                        expected: open_name.to_string(),
                        found: name.text.clone(),
                    },
                    name.range(),
                );
            }
            node.push_token(name);
        }
    }

    /// `#( parameter int P = 1, ... )`
    fn parse_parameter_port_list(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ParameterPortList);
        node.push_token(self.bump()); // #
        node.push_token(self.expect(TokenKind::LParen));
        while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
            node.push_node(self.parse_parameter_port_item());
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        node.push_token(self.expect(TokenKind::RParen));
        node
    }

    fn parse_parameter_port_item(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ParameterDeclaration);
        if self.at(TokenKind::KwParameter) || self.at(TokenKind::KwLocalparam) {
            node.push_token(self.bump());
        }
        if self.at(TokenKind::KwType) {
            node.push_token(self.bump());
            node.push_node(self.parse_declarator(true));
            return node;
        }
        if let Some(ty) = self.parse_opt_data_type_before_name() {
            node.push_node(ty);
        }
        node.push_node(self.parse_declarator(true));
        node
    }

    /// `( input logic [7:0] a, output b, ... )`
    fn parse_port_list(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::PortList);
        node.push_token(self.bump()); // (
        while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
            node.push_node(self.parse_port_declaration());
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        node.push_token(self.expect(TokenKind::RParen));
        node
    }

    fn parse_port_declaration(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::PortDeclaration);
        if matches!(
            self.peek().kind,
            TokenKind::KwInput | TokenKind::KwOutput | TokenKind::KwInout | TokenKind::KwRef
        ) {
            node.push_token(self.bump());
        }
        if self.peek().kind.is_net_type_keyword() || self.at(TokenKind::KwVar) {
            node.push_token(self.bump());
        }
        if let Some(ty) = self.parse_opt_data_type_before_name() {
            node.push_node(ty);
        }
        node.push_node(self.parse_declarator(true));
        node
    }

    // ----- classes --------------------------------------------------------

    pub(crate) fn parse_class(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ClassDeclaration);
        if self.at(TokenKind::KwVirtual) || self.at(TokenKind::KwInterface) {
            node.push_token(self.bump());
        }
        node.push_token(self.expect(TokenKind::KwClass));
        if self.at(TokenKind::KwAutomatic) || self.at(TokenKind::KwStatic) {
            node.push_token(self.bump());
        }
        let name = self.expect(TokenKind::Identifier);
        let open_name = name.text.clone();
        node.push_token(name);

        if self.at(TokenKind::Hash) {
            node.push_node(self.parse_parameter_port_list());
        }
        if self.at(TokenKind::KwExtends) {
            let mut ext = SyntaxNode::new(SyntaxKind::ExtendsClause);
            ext.push_token(self.bump());
            ext.push_node(self.parse_scoped_name());
            if self.at(TokenKind::LParen) {
                ext.push_node(self.parse_call_arguments());
            }
            node.push_node(ext);
        }
        if self.at(TokenKind::KwImplements) {
            let mut imp = SyntaxNode::new(SyntaxKind::ImplementsClause);
            imp.push_token(self.bump());
            loop {
                imp.push_node(self.parse_scoped_name());
                if self.at(TokenKind::Comma) {
                    imp.push_token(self.bump());
                } else {
                    break;
                }
            }
            node.push_node(imp);
        }
        node.push_token(self.expect(TokenKind::Semicolon));

        while !self.at(TokenKind::KwEndclass) && !self.at(TokenKind::Eof) {
            let before = self.peek().loc;
            node.push_node(self.parse_member(ParentKind::Class));
            if self.peek().loc == before
                && !self.at(TokenKind::KwEndclass)
                && !self.at(TokenKind::Eof)
            {
                self.recover_to(&[TokenKind::KwEndclass, TokenKind::Semicolon]);
                self.eat(TokenKind::Semicolon);
            }
        }
        node.push_token(self.expect(TokenKind::KwEndclass));
        self.parse_end_name(&mut node, &open_name);
        node
    }

    /// A class item that starts with qualifiers or a declaration.
    fn parse_class_item(&mut self) -> SyntaxNode {
        let mut qualifiers = Vec::new();
        let mut seen: Vec<TokenKind> = Vec::new();
        loop {
            let kind = self.peek().kind;
            let is_qual = matches!(
                kind,
                TokenKind::KwLocal
                    | TokenKind::KwProtected
                    | TokenKind::KwStatic
                    | TokenKind::KwVirtual
                    | TokenKind::KwPure
                    | TokenKind::KwExtern
                    | TokenKind::KwConst
                    | TokenKind::KwRand
                    | TokenKind::KwRandc
            );
            if !is_qual {
                break;
            }
            // `virtual class`/`virtual interface` are not qualifiers here.
            if kind == TokenKind::KwVirtual
                && matches!(self.peek_n(1).kind, TokenKind::KwClass | TokenKind::KwInterface)
            {
                break;
            }
            let tok = self.bump();
            self.check_qualifier(&seen, &tok);
            seen.push(tok.kind);
            qualifiers.push(tok);
        }

        let is_prototype = seen.contains(&TokenKind::KwExtern)
            || (seen.contains(&TokenKind::KwPure) && seen.contains(&TokenKind::KwVirtual));

        let next = self.peek().kind;
        if seen.contains(&TokenKind::KwPure)
            && !seen.contains(&TokenKind::KwVirtual)
            && next != TokenKind::KwConstraint
        {
            let range = qualifiers
                .first()
                .map(|t| t.range())
                .unwrap_or(SourceRange::NONE);
            self.error(ParserError::PureRequiresVirtual, range);
        }

        let body = match next {
            TokenKind::KwFunction | TokenKind::KwTask => self.parse_subroutine(is_prototype),
            TokenKind::KwClass => self.parse_class(),
            TokenKind::KwConstraint => self.parse_constraint(),
            TokenKind::KwTypedef => self.parse_typedef(),
            TokenKind::KwParameter | TokenKind::KwLocalparam => {
                self.parse_parameter_declaration(SyntaxKind::ParameterDeclaration, true)
            }
            TokenKind::KwCovergroup => self.parse_skipped_until(TokenKind::KwEndgroup),
            _ => self.parse_variable_declaration(),
        };

        let wrapper_kind = match body.kind {
            SyntaxKind::FunctionDeclaration
            | SyntaxKind::TaskDeclaration
            | SyntaxKind::FunctionPrototype => SyntaxKind::ClassMethod,
            SyntaxKind::VariableDeclaration => SyntaxKind::ClassProperty,
            _ if qualifiers.is_empty() => return body,
            _ => SyntaxKind::ClassProperty,
        };
        let mut node = SyntaxNode::new(wrapper_kind);
        for q in qualifiers {
            node.push_token(q);
        }
        node.push_node(body);
        node
    }

    /// The fixed conflict table for class qualifiers.
    fn check_qualifier(&mut self, seen: &[TokenKind], tok: &crate::token::Token) {
        use TokenKind::*;
        if seen.contains(&tok.kind) {
            self.error(
                ParserError::DuplicateQualifier {
                    qualifier: tok.text.clone(),
                },
                tok.range(),
            );
            return;
        }
        let conflicts: &[(TokenKind, TokenKind)] = &[
            (KwRand, KwRandc),
            (KwRand, KwConst),
            (KwRandc, KwConst),
            (KwLocal, KwProtected),
            (KwStatic, KwVirtual),
        ];
        for &(a, b) in conflicts {
            let clash = (tok.kind == a && seen.contains(&b)) || (tok.kind == b && seen.contains(&a));
            if clash {
                let other = if tok.kind == a { b } else { a };
                self.error(
                    ParserError::QualifierConflict {
                        qualifier: tok.text.clone(),
                        other: other.display().to_string(),
                    },
                    tok.range(),
                );
            }
        }
        // pure and extern must lead the qualifier list.
        if matches!(tok.kind, KwPure | KwExtern) && !seen.is_empty() {
            let leading_ok = seen.iter().all(|&k| matches!(k, KwPure | KwExtern | KwVirtual));
            if !leading_ok {
                self.error(
                    ParserError::QualifierNotFirst {
                        qualifier: tok.text.clone(),
                    },
                    tok.range(),
                );
            }
        }
    }

    // ----- subroutines ----------------------------------------------------

    /// Parses a function or task declaration. With `prototype` set, the
    /// declaration ends at the semicolon after the port list.
    pub(crate) fn parse_subroutine(&mut self, prototype: bool) -> SyntaxNode {
        let is_task = self.at(TokenKind::KwTask);
        let kind = if prototype {
            SyntaxKind::FunctionPrototype
        } else if is_task {
            SyntaxKind::TaskDeclaration
        } else {
            SyntaxKind::FunctionDeclaration
        };
        let end_kw = if is_task {
            TokenKind::KwEndtask
        } else {
            TokenKind::KwEndfunction
        };

        let mut node = SyntaxNode::new(kind);
        node.push_token(self.bump()); // function/task
        if self.at(TokenKind::KwAutomatic) || self.at(TokenKind::KwStatic) {
            node.push_token(self.bump());
        }

        // Distinguish the return type from the (possibly scoped) name.
        let explicit_type = self.scan_subroutine_return_type();
        if explicit_type {
            if let Some(ty) = self.parse_opt_data_type_before_name() {
                node.push_node(ty);
            }
        }
        let name_node = self.parse_scoped_name();
        let open_name = name_node
            .tokens()
            .last()
            .map(|t| t.text.clone())
            .unwrap_or_default();
        let names: Vec<String> = name_node
            .tokens()
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.text.clone())
            .collect();
        node.push_node(name_node);

        if self.at(TokenKind::LParen) {
            node.push_node(self.parse_function_port_list());
        }
        node.push_token(self.expect(TokenKind::Semicolon));

        if !prototype {
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
        }

        // An out-of-block body: record the (class, method) pair for the
        // class elaborator.
        if names.len() == 2 && kind != SyntaxKind::FunctionPrototype {
            self.out_of_block.push(super::OutOfBlockDef {
                class_name: names[0].clone(),
                member_name: names[1].clone(),
                syntax: node.clone(),
            });
        }
        node
    }

    /// Looks ahead past `function [lifetime]` to decide whether an
    /// explicit return type precedes the (possibly scoped) name.
    fn scan_subroutine_return_type(&mut self) -> bool {
        match self.peek().kind {
            TokenKind::Identifier => match self.peek_n(1).kind {
                // `C::m (` is a scoped name; `pkg::t m` is a return type.
                TokenKind::ColonColon => {
                    !matches!(self.peek_n(3).kind, TokenKind::LParen | TokenKind::Semicolon)
                }
                TokenKind::LParen | TokenKind::Semicolon => false,
                _ => true,
            },
            _ => true,
        }
    }

    fn parse_function_port_list(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::FunctionPortList);
        node.push_token(self.bump()); // (
        while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
            let mut port = SyntaxNode::new(SyntaxKind::FunctionPort);
            if matches!(
                self.peek().kind,
                TokenKind::KwInput | TokenKind::KwOutput | TokenKind::KwInout | TokenKind::KwRef
            ) {
                port.push_token(self.bump());
            }
            if let Some(ty) = self.parse_opt_data_type_before_name() {
                port.push_node(ty);
            }
            port.push_node(self.parse_declarator(true));
            node.push_node(port);
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        node.push_token(self.expect(TokenKind::RParen));
        node
    }

    // ----- declarations ---------------------------------------------------

    pub(crate) fn parse_typedef(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::TypedefDeclaration);
        node.push_token(self.bump()); // typedef

        // Forward declarations: `typedef class C;`
        if matches!(self.peek().kind, TokenKind::KwClass | TokenKind::KwInterface)
            && self.peek_n(1).kind == TokenKind::Identifier
            && self.peek_n(2).kind == TokenKind::Semicolon
        {
            node.push_token(self.bump());
            node.push_token(self.bump());
            node.push_token(self.expect(TokenKind::Semicolon));
            return node;
        }

        node.push_node(self.parse_data_type());
        node.push_node(self.parse_declarator(false));
        node.push_token(self.expect(TokenKind::Semicolon));
        node
    }

    pub(crate) fn parse_parameter_declaration(
        &mut self,
        kind: SyntaxKind,
        want_semi: bool,
    ) -> SyntaxNode {
        let mut node = SyntaxNode::new(kind);
        node.push_token(self.bump()); // parameter/localparam/specparam
        if self.at(TokenKind::KwType) {
            node.push_token(self.bump());
        } else if let Some(ty) = self.parse_opt_data_type_before_name() {
            node.push_node(ty);
        }
        loop {
            node.push_node(self.parse_declarator(true));
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        if want_semi {
            node.push_token(self.expect(TokenKind::Semicolon));
        }
        node
    }

    /// `name [dims] [= init]`; `allow_missing_init` distinguishes typedef
    /// declarators (no initializer) from the rest.
    pub(crate) fn parse_declarator(&mut self, allow_init: bool) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::Declarator);
        node.push_token(self.expect(TokenKind::Identifier));
        while self.at(TokenKind::LBracket) {
            node.push_node(self.parse_unpacked_dimension());
        }
        if allow_init && self.at(TokenKind::Eq) {
            let mut init = SyntaxNode::new(SyntaxKind::EqualsInitializer);
            init.push_token(self.bump());
            init.push_node(self.parse_expr());
            node.push_node(init);
        }
        node
    }

    pub(crate) fn parse_variable_declaration(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::VariableDeclaration);
        while matches!(
            self.peek().kind,
            TokenKind::KwVar | TokenKind::KwConst | TokenKind::KwAutomatic | TokenKind::KwStatic
        ) {
            node.push_token(self.bump());
        }
        if let Some(ty) = self.parse_opt_data_type_before_name() {
            node.push_node(ty);
        }
        loop {
            node.push_node(self.parse_declarator(true));
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        node.push_token(self.expect(TokenKind::Semicolon));
        node
    }

    fn parse_net_declaration(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::NetDeclaration);
        node.push_token(self.bump()); // net keyword
        if let Some(ty) = self.parse_opt_data_type_before_name() {
            node.push_node(ty);
        }
        loop {
            node.push_node(self.parse_declarator(true));
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        node.push_token(self.expect(TokenKind::Semicolon));
        node
    }

    fn parse_import(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ImportDeclaration);
        node.push_token(self.bump()); // import
        loop {
            let mut item = SyntaxNode::new(SyntaxKind::PackageImportItem);
            item.push_token(self.expect(TokenKind::Identifier));
            item.push_token(self.expect(TokenKind::ColonColon));
            if self.at(TokenKind::Star) {
                item.push_token(self.bump());
            } else {
                item.push_token(self.expect(TokenKind::Identifier));
            }
            node.push_node(item);
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        node.push_token(self.expect(TokenKind::Semicolon));
        node
    }

    fn parse_export(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ExportDeclaration);
        node.push_token(self.bump()); // export
        if self.at(TokenKind::Star) {
            // export *::*;
            node.push_token(self.bump());
            node.push_token(self.expect(TokenKind::ColonColon));
            node.push_token(self.expect(TokenKind::Star));
        } else {
            loop {
                let mut item = SyntaxNode::new(SyntaxKind::PackageImportItem);
                item.push_token(self.expect(TokenKind::Identifier));
                item.push_token(self.expect(TokenKind::ColonColon));
                if self.at(TokenKind::Star) {
                    item.push_token(self.bump());
                } else {
                    item.push_token(self.expect(TokenKind::Identifier));
                }
                node.push_node(item);
                if self.at(TokenKind::Comma) {
                    node.push_token(self.bump());
                } else {
                    break;
                }
            }
        }
        node.push_token(self.expect(TokenKind::Semicolon));
        node
    }

    fn parse_genvar(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::GenvarDeclaration);
        node.push_token(self.bump()); // genvar
        loop {
            node.push_token(self.expect(TokenKind::Identifier));
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        node.push_token(self.expect(TokenKind::Semicolon));
        node
    }

    fn parse_timeunits(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::TimeunitsDeclaration);
        while !self.at(TokenKind::Semicolon) && !self.at(TokenKind::Eof) {
            node.push_token(self.bump());
        }
        node.push_token(self.expect(TokenKind::Semicolon));
        node
    }

    fn parse_defparam(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::DefparamDeclaration);
        node.push_token(self.bump()); // defparam
        loop {
            node.push_node(self.parse_expr());
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        node.push_token(self.expect(TokenKind::Semicolon));
        node
    }

    fn parse_continuous_assign(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ContinuousAssign);
        node.push_token(self.bump()); // assign
        if self.at(TokenKind::Hash) {
            node.push_node(self.parse_delay_control());
        }
        loop {
            node.push_node(self.parse_expr());
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        node.push_token(self.expect(TokenKind::Semicolon));
        node
    }

    fn parse_procedural_block(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ProceduralBlock);
        node.push_token(self.bump()); // always/always_comb/.../initial/final
        node.push_node(self.parse_statement());
        node
    }

    // ----- generate constructs --------------------------------------------

    fn parse_generate_region(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::GenerateRegion);
        node.push_token(self.bump()); // generate
        while !self.at(TokenKind::KwEndgenerate) && !self.at(TokenKind::Eof) {
            let before = self.peek().loc;
            node.push_node(self.parse_member(ParentKind::GenerateBlock));
            if self.peek().loc == before && !self.at(TokenKind::KwEndgenerate) {
                self.recover_to(&[TokenKind::KwEndgenerate, TokenKind::Semicolon]);
                self.eat(TokenKind::Semicolon);
            }
        }
        node.push_token(self.expect(TokenKind::KwEndgenerate));
        node
    }

    fn parse_if_generate(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::IfGenerate);
        node.push_token(self.bump()); // if
        node.push_token(self.expect(TokenKind::LParen));
        node.push_node(self.parse_expr());
        node.push_token(self.expect(TokenKind::RParen));
        node.push_node(self.parse_generate_item());
        if self.at(TokenKind::KwElse) {
            node.push_token(self.bump());
            node.push_node(self.parse_generate_item());
        }
        node
    }

    fn parse_loop_generate(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::LoopGenerate);
        node.push_token(self.bump()); // for
        node.push_token(self.expect(TokenKind::LParen));
        if self.at(TokenKind::KwGenvar) {
            node.push_token(self.bump());
        }
        node.push_node(self.parse_expr());
        node.push_token(self.expect(TokenKind::Semicolon));
        node.push_node(self.parse_expr());
        node.push_token(self.expect(TokenKind::Semicolon));
        node.push_node(self.parse_expr());
        node.push_token(self.expect(TokenKind::RParen));
        node.push_node(self.parse_generate_item());
        node
    }

    fn parse_case_generate(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::CaseGenerate);
        node.push_token(self.bump()); // case
        node.push_token(self.expect(TokenKind::LParen));
        node.push_node(self.parse_expr());
        node.push_token(self.expect(TokenKind::RParen));
        while !self.at(TokenKind::KwEndcase) && !self.at(TokenKind::Eof) {
            let mut item = SyntaxNode::new(SyntaxKind::CaseItem);
            if self.at(TokenKind::KwDefault) {
                item.push_token(self.bump());
            } else {
                loop {
                    item.push_node(self.parse_expr());
                    if self.at(TokenKind::Comma) {
                        item.push_token(self.bump());
                    } else {
                        break;
                    }
                }
            }
            item.push_token(self.expect(TokenKind::Colon));
            item.push_node(self.parse_generate_item());
            node.push_node(item);
        }
        node.push_token(self.expect(TokenKind::KwEndcase));
        node
    }

    fn parse_generate_item(&mut self) -> SyntaxNode {
        if self.at(TokenKind::KwBegin) {
            let mut node = SyntaxNode::new(SyntaxKind::GenerateBlock);
            node.push_token(self.bump()); // begin
            let mut open_name = String::new();
            if self.at(TokenKind::Colon) {
                node.push_token(self.bump());
                let name = self.expect(TokenKind::Identifier);
                open_name = name.text.clone();
                node.push_token(name);
            }
            while !self.at(TokenKind::KwEnd) && !self.at(TokenKind::Eof) {
                let before = self.peek().loc;
                node.push_node(self.parse_member(ParentKind::GenerateBlock));
                if self.peek().loc == before && !self.at(TokenKind::KwEnd) {
                    self.recover_to(&[TokenKind::KwEnd, TokenKind::Semicolon]);
                    self.eat(TokenKind::Semicolon);
                }
            }
            node.push_token(self.expect(TokenKind::KwEnd));
            self.parse_end_name(&mut node, &open_name);
            node
        } else {
            self.parse_member(ParentKind::GenerateBlock)
        }
    }

    // ----- interface members ----------------------------------------------

    fn parse_modport(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ModportDeclaration);
        node.push_token(self.bump()); // modport
        loop {
            let mut item = SyntaxNode::new(SyntaxKind::ModportItem);
            item.push_token(self.expect(TokenKind::Identifier));
            item.push_token(self.expect(TokenKind::LParen));
            while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
                let mut port = SyntaxNode::new(SyntaxKind::ModportSimplePort);
                if matches!(
                    self.peek().kind,
                    TokenKind::KwInput | TokenKind::KwOutput | TokenKind::KwInout | TokenKind::KwRef
                ) {
                    port.push_token(self.bump());
                }
                port.push_token(self.expect(TokenKind::Identifier));
                item.push_node(port);
                if self.at(TokenKind::Comma) {
                    item.push_token(self.bump());
                } else {
                    break;
                }
            }
            item.push_token(self.expect(TokenKind::RParen));
            node.push_node(item);
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        node.push_token(self.expect(TokenKind::Semicolon));
        node
    }

    // ----- constraints and skipped constructs -----------------------------

    fn parse_constraint(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::ConstraintDeclaration);
        node.push_token(self.bump()); // constraint
        node.push_node(self.parse_scoped_name());
        node.push_token(self.expect(TokenKind::LBrace));
        let mut depth = 0usize;
        while !self.at(TokenKind::Eof) {
            let kind = self.peek().kind;
            if kind == TokenKind::RBrace && depth == 0 {
                break;
            }
            match kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            node.push_token(self.bump());
        }
        node.push_token(self.expect(TokenKind::RBrace));
        node
    }

    /// Consumes a construct we recognize but do not model, through the
    /// given terminator (inclusive).
    fn parse_skipped_until(&mut self, terminator: TokenKind) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::SkippedMember);
        while !self.at(terminator) && !self.at(TokenKind::Eof) {
            node.push_token(self.bump());
        }
        if self.at(terminator) {
            node.push_token(self.bump());
        }
        node
    }

    // ----- hierarchy instantiation ----------------------------------------

    pub(crate) fn parse_hierarchy_instantiation(&mut self) -> SyntaxNode {
        let mut node = SyntaxNode::new(SyntaxKind::HierarchyInstantiation);
        node.push_token(self.expect(TokenKind::Identifier)); // definition name

        if self.at(TokenKind::Hash) {
            let mut params = SyntaxNode::new(SyntaxKind::ParameterValueAssignment);
            params.push_token(self.bump()); // #
            params.push_token(self.expect(TokenKind::LParen));
            while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
                if self.at(TokenKind::Dot) {
                    let mut named = SyntaxNode::new(SyntaxKind::NamedParamAssignment);
                    named.push_token(self.bump()); // .
                    named.push_token(self.expect(TokenKind::Identifier));
                    named.push_token(self.expect(TokenKind::LParen));
                    if !self.at(TokenKind::RParen) {
                        named.push_node(self.parse_expr());
                    }
                    named.push_token(self.expect(TokenKind::RParen));
                    params.push_node(named);
                } else {
                    let mut ordered = SyntaxNode::new(SyntaxKind::OrderedParamAssignment);
                    ordered.push_node(self.parse_expr());
                    params.push_node(ordered);
                }
                if self.at(TokenKind::Comma) {
                    params.push_token(self.bump());
                } else {
                    break;
                }
            }
            params.push_token(self.expect(TokenKind::RParen));
            node.push_node(params);
        }

        loop {
            let mut inst = SyntaxNode::new(SyntaxKind::HierarchicalInstance);
            inst.push_token(self.expect(TokenKind::Identifier));
            while self.at(TokenKind::LBracket) {
                inst.push_node(self.parse_unpacked_dimension());
            }
            inst.push_token(self.expect(TokenKind::LParen));
            while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
                if self.at(TokenKind::DotStar) {
                    let mut wild = SyntaxNode::new(SyntaxKind::WildcardPortConnection);
                    wild.push_token(self.bump());
                    inst.push_node(wild);
                } else if self.at(TokenKind::Dot) {
                    let mut named = SyntaxNode::new(SyntaxKind::NamedPortConnection);
                    named.push_token(self.bump());
                    named.push_token(self.expect(TokenKind::Identifier));
                    if self.at(TokenKind::LParen) {
                        named.push_token(self.bump());
                        if !self.at(TokenKind::RParen) {
                            named.push_node(self.parse_expr());
                        }
                        named.push_token(self.expect(TokenKind::RParen));
                    }
                    inst.push_node(named);
                } else {
                    let mut ordered = SyntaxNode::new(SyntaxKind::OrderedPortConnection);
                    ordered.push_node(self.parse_expr());
                    inst.push_node(ordered);
                }
                if self.at(TokenKind::Comma) {
                    inst.push_token(self.bump());
                } else {
                    break;
                }
            }
            inst.push_token(self.expect(TokenKind::RParen));
            node.push_node(inst);
            if self.at(TokenKind::Comma) {
                node.push_token(self.bump());
            } else {
                break;
            }
        }
        node.push_token(self.expect(TokenKind::Semicolon));
        node
    }

}

fn starts_data_type(kind: TokenKind) -> bool {
    kind.is_integral_type_keyword()
        || matches!(
            kind,
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
                | TokenKind::KwVirtual
                | TokenKind::KwVar
                | TokenKind::KwConst
                | TokenKind::KwAutomatic
                | TokenKind::KwStatic
        )
}

fn starts_class_item(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::KwLocal
            | TokenKind::KwProtected
            | TokenKind::KwStatic
            | TokenKind::KwVirtual
            | TokenKind::KwPure
            | TokenKind::KwExtern
            | TokenKind::KwConst
            | TokenKind::KwRand
            | TokenKind::KwRandc
            | TokenKind::KwFunction
            | TokenKind::KwTask
            | TokenKind::KwClass
            | TokenKind::KwConstraint
            | TokenKind::KwCovergroup
    ) || kind.is_integral_type_keyword()
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
                | TokenKind::Identifier
        )
}

fn member_display(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::ModuleDeclaration => "a module declaration",
        SyntaxKind::InterfaceDeclaration => "an interface declaration",
        SyntaxKind::ProgramDeclaration => "a program declaration",
        SyntaxKind::PackageDeclaration => "a package declaration",
        SyntaxKind::ClassDeclaration => "a class declaration",
        SyntaxKind::HierarchyInstantiation => "a hierarchy instantiation",
        SyntaxKind::ContinuousAssign => "a continuous assignment",
        SyntaxKind::ProceduralBlock => "a procedural block",
        SyntaxKind::ModportDeclaration => "a modport declaration",
        SyntaxKind::NetDeclaration => "a net declaration",
        SyntaxKind::GenerateRegion
        | SyntaxKind::LoopGenerate
        | SyntaxKind::IfGenerate
        | SyntaxKind::CaseGenerate => "a generate construct",
        SyntaxKind::DefparamDeclaration => "a defparam",
        SyntaxKind::SpecparamDeclaration => "a specparam",
        SyntaxKind::ConstraintDeclaration => "a constraint block",
        SyntaxKind::GenvarDeclaration => "a genvar declaration",
        _ => "this construct",
    }
}
