// src/types/resolve.rs
//
// Type resolution from syntax: integral keywords become interned
// built-ins, packed dimensions wrap their element, enums mint their value
// symbols into the enclosing scope, and named types follow typedefs,
// classes, and package-scoped names.

use sylva_numeric::SVInt;
use sylva_syntax::cst::{SyntaxKind, SyntaxNode};
use sylva_syntax::TokenKind;

use crate::binder::BindContext;
use crate::compilation::Compilation;
use crate::errors::SemanticError;
use crate::symbols::{DefinitionKind, SymbolKind};
use crate::types::{FieldInfo, IntegralKind, Type, TypeId};

impl Compilation {
    pub fn resolve_type(&self, syntax: &SyntaxNode, ctx: &BindContext) -> TypeId {
        match syntax.kind {
            SyntaxKind::DataType => self.resolve_data_type(syntax, ctx),
            SyntaxKind::ImplicitType => self.resolve_implicit_type(syntax, ctx),
            SyntaxKind::EnumType => self.resolve_enum_type(syntax, ctx),
            SyntaxKind::StructUnionType => self.resolve_struct_union(syntax, ctx),
            SyntaxKind::VirtualInterfaceType => self.resolve_virtual_interface(syntax),
            _ => self.builtins().error,
        }
    }

    fn resolve_data_type(&self, syntax: &SyntaxNode, ctx: &BindContext) -> TypeId {
        let b = self.builtins();
        let first = syntax.tokens().next().map(|t| t.kind);

        // Scalar keywords that take no dimensions.
        match first {
            Some(TokenKind::KwReal) => return b.real,
            Some(TokenKind::KwShortreal) => return b.shortreal,
            Some(TokenKind::KwRealtime) => return b.realtime,
            Some(TokenKind::KwString) => return b.string,
            Some(TokenKind::KwChandle) => return b.chandle,
            Some(TokenKind::KwEvent) => return b.event,
            Some(TokenKind::KwVoid) => return b.void,
            _ => {}
        }

        if let Some(kind) = first.and_then(integral_kind_for) {
            return self.resolve_integral(syntax, kind, ctx);
        }

        // A named (possibly package-scoped) type.
        if let Some(name_node) = syntax.child_node(SyntaxKind::ScopedName) {
            let named = self.resolve_named_type(name_node, ctx);
            return self.wrap_packed_dimensions(named, syntax, ctx);
        }

        b.error
    }

    fn resolve_integral(&self, syntax: &SyntaxNode, kind: IntegralKind, ctx: &BindContext) -> TypeId {
        let signed_tok = syntax.tokens().find(|t| {
            matches!(t.kind, TokenKind::KwSigned | TokenKind::KwUnsigned)
        });
        let (default_signed, four_state, default_width) = match kind {
            IntegralKind::Bit => (false, false, 1),
            IntegralKind::Logic | IntegralKind::Reg => (false, true, 1),
            IntegralKind::Byte => (true, false, 8),
            IntegralKind::ShortInt => (true, false, 16),
            IntegralKind::Int => (true, false, 32),
            IntegralKind::LongInt => (true, false, 64),
            IntegralKind::Integer => (true, true, 32),
            IntegralKind::Time => (false, true, 64),
        };
        let signed = match signed_tok.map(|t| t.kind) {
            Some(TokenKind::KwSigned) => true,
            Some(TokenKind::KwUnsigned) => false,
            _ => default_signed,
        };

        let dims: Vec<(i64, i64)> = syntax
            .child_nodes(SyntaxKind::PackedDimension)
            .map(|d| self.packed_dimension_bounds(d, ctx))
            .collect();

        let mut types = self.types.borrow_mut();
        if dims.is_empty() {
            return types.intern(Type::Integral {
                kind,
                signed,
                four_state,
                left: default_width - 1,
                right: 0,
            });
        }

        // One dimension over a scalar keyword is a simple bit vector; any
        // further dimensions nest as packed arrays.
        let scalar = matches!(kind, IntegralKind::Bit | IntegralKind::Logic | IntegralKind::Reg);
        let (innermost, rest) = dims.split_last().unwrap();
        let mut ty = if scalar {
            types.intern(Type::Integral {
                kind,
                signed,
                four_state,
                left: innermost.0,
                right: innermost.1,
            })
        } else {
            let base = types.intern(Type::Integral {
                kind,
                signed,
                four_state,
                left: default_width - 1,
                right: 0,
            });
            types.intern(Type::PackedArray {
                element: base,
                left: innermost.0,
                right: innermost.1,
            })
        };
        for (left, right) in rest.iter().rev() {
            ty = types.intern(Type::PackedArray {
                element: ty,
                left: *left,
                right: *right,
            });
        }
        ty
    }

    fn resolve_implicit_type(&self, syntax: &SyntaxNode, ctx: &BindContext) -> TypeId {
        let signed = syntax.child_token(TokenKind::KwSigned).is_some();
        let dims: Vec<(i64, i64)> = syntax
            .child_nodes(SyntaxKind::PackedDimension)
            .map(|d| self.packed_dimension_bounds(d, ctx))
            .collect();

        let mut types = self.types.borrow_mut();
        match dims.split_last() {
            // An implicit type is a single logic bit unless dimensions say
            // otherwise.
            None => types.intern(Type::Integral {
                kind: IntegralKind::Logic,
                signed,
                four_state: true,
                left: 0,
                right: 0,
            }),
            Some((inner, rest)) => {
                let mut ty = types.intern(Type::Integral {
                    kind: IntegralKind::Logic,
                    signed,
                    four_state: true,
                    left: inner.0,
                    right: inner.1,
                });
                for (left, right) in rest.iter().rev() {
                    ty = types.intern(Type::PackedArray {
                        element: ty,
                        left: *left,
                        right: *right,
                    });
                }
                ty
            }
        }
    }

    /// Bounds in packed dimensions must be constant; they evaluate in the
    /// declaring context so parameter references resolve.
    fn packed_dimension_bounds(&self, dim: &SyntaxNode, ctx: &BindContext) -> (i64, i64) {
        let exprs: Vec<&SyntaxNode> = dim.nodes().collect();
        match exprs.len() {
            1 => {
                // `[n]` reads as `[n-1:0]`.
                let n = self.packed_bound(exprs[0], dim, ctx).unwrap_or(1).max(1);
                (n - 1, 0)
            }
            2 => {
                let left = self.packed_bound(exprs[0], dim, ctx).unwrap_or(0);
                let right = self.packed_bound(exprs[1], dim, ctx).unwrap_or(0);
                (left, right)
            }
            _ => (0, 0),
        }
    }

    fn packed_bound(&self, expr: &SyntaxNode, dim: &SyntaxNode, ctx: &BindContext) -> Option<i64> {
        let v = self.eval_integer_constant(expr, ctx);
        if v.is_none() {
            self.error(SemanticError::BadDimensionBound, dim.range());
        }
        v
    }

    fn resolve_named_type(&self, name_node: &SyntaxNode, ctx: &BindContext) -> TypeId {
        let idents: Vec<String> = name_node
            .tokens()
            .filter(|t| {
                t.kind == TokenKind::Identifier || t.kind == TokenKind::SystemIdentifier
            })
            .map(|t| t.text.clone())
            .collect();
        let Some((first, rest)) = idents.split_first() else {
            return self.builtins().error;
        };

        let found = if rest.is_empty() {
            self.lookup_unqualified(ctx, first)
        } else {
            self.lookup_scoped(ctx, first, rest)
        };

        let Some(found) = found else {
            self.error(
                SemanticError::UndeclaredIdentifier {
                    name: idents.join("::"),
                },
                name_node.range(),
            );
            return self.builtins().error;
        };

        match &self.symbol(found).kind {
            SymbolKind::Typedef { .. } => self.symbol_type(found),
            SymbolKind::Class { .. } => self.symbol_type(found),
            _ => {
                self.error(
                    SemanticError::NotAType {
                        name: idents.join("::"),
                    },
                    name_node.range(),
                );
                self.builtins().error
            }
        }
    }

    fn wrap_packed_dimensions(
        &self,
        element: TypeId,
        syntax: &SyntaxNode,
        ctx: &BindContext,
    ) -> TypeId {
        let dims: Vec<(i64, i64)> = syntax
            .child_nodes(SyntaxKind::PackedDimension)
            .map(|d| self.packed_dimension_bounds(d, ctx))
            .collect();
        if dims.is_empty() {
            return element;
        }
        let integral = self.types.borrow().is_integral(element);
        if !integral {
            self.error(SemanticError::BadPackedElement, syntax.range());
            return self.builtins().error;
        }
        let mut types = self.types.borrow_mut();
        let mut ty = element;
        for (left, right) in dims.iter().rev() {
            ty = types.intern(Type::PackedArray {
                element: ty,
                left: *left,
                right: *right,
            });
        }
        ty
    }

    /// Enum resolution mints the member symbols into the scope the enum
    /// appears in, with values assigned in order (an initializer resets
    /// the counter).
    fn resolve_enum_type(&self, syntax: &SyntaxNode, ctx: &BindContext) -> TypeId {
        let base = match syntax.nodes().find(|n| n.kind == SyntaxKind::DataType) {
            Some(t) => self.resolve_type(t, ctx),
            None => self.builtins().int,
        };
        let (width, signed) = {
            let types = self.types.borrow();
            (types.bit_width(base).max(1), types.is_signed(base))
        };

        let mut members: Vec<(String, SVInt)> = Vec::new();
        let mut first_value_symbol = None;
        let mut next = SVInt::zero(width, signed);
        for member in syntax.child_nodes(SyntaxKind::EnumMember) {
            let Some(name_tok) = member.name_token() else {
                continue;
            };
            let value = match member
                .child_node(SyntaxKind::EqualsInitializer)
                .and_then(|n| n.nodes().next())
            {
                Some(init) => {
                    let bound = self.bind_expression(init, &ctx.constant());
                    let mut eval = crate::eval::EvalContext::new(self);
                    match eval.eval(&bound).into_integer() {
                        Some(v) => {
                            let mut v = v.resize(width);
                            if signed {
                                v = v.as_signed();
                            }
                            v
                        }
                        None => {
                            self.error(
                                SemanticError::BadEnumValue {
                                    name: name_tok.text.clone(),
                                },
                                member.range(),
                            );
                            next.clone()
                        }
                    }
                }
                None => next.clone(),
            };
            next = value.add(&SVInt::new(width, signed, 1));

            let sym_id = self.insert_symbol(
                &name_tok.text.clone(),
                name_tok.loc,
                ctx.scope,
                SymbolKind::EnumValue {
                    ty: std::cell::OnceCell::new(),
                    value: value.clone(),
                },
            );
            first_value_symbol.get_or_insert(sym_id);
            members.push((name_tok.text.clone(), value));
        }

        let decl = first_value_symbol
            .unwrap_or_else(|| crate::symbols::SymbolId::from_raw(u32::MAX));
        let enum_ty = self
            .types
            .borrow_mut()
            .intern(Type::Enum { base, members, decl });

        // Patch the member symbols' types now that the enum exists.
        for member_id in self.scope_members(ctx.scope) {
            if let SymbolKind::EnumValue { ty, .. } = &self.symbol(member_id).kind {
                if ty.get().is_none() {
                    let _ = ty.set(enum_ty);
                }
            }
        }
        enum_ty
    }

    fn resolve_struct_union(&self, syntax: &SyntaxNode, ctx: &BindContext) -> TypeId {
        let is_union = syntax.tokens().next().map(|t| t.kind) == Some(TokenKind::KwUnion);
        let packed = syntax.child_token(TokenKind::KwPacked).is_some();
        let tagged = syntax.child_token(TokenKind::KwTagged).is_some();
        let signed = syntax.child_token(TokenKind::KwSigned).is_some();

        let mut fields = Vec::new();
        for member in syntax.child_nodes(SyntaxKind::StructUnionMember) {
            let ty_syntax = member.nodes().find(|n| crate::compilation::is_type_syntax(n.kind));
            let field_ty = match ty_syntax {
                Some(t) => self.resolve_type(t, ctx),
                None => self.builtins().error,
            };
            for declarator in member.child_nodes(SyntaxKind::Declarator) {
                if let Some(name_tok) = declarator.name_token() {
                    fields.push(FieldInfo {
                        name: name_tok.text.clone(),
                        ty: field_ty,
                    });
                }
            }
        }

        if packed {
            let all_integral = {
                let types = self.types.borrow();
                fields.iter().all(|f| types.is_integral(f.ty))
            };
            if !all_integral {
                self.error(SemanticError::BadPackedElement, syntax.range());
                return self.builtins().error;
            }
        }

        let mut types = self.types.borrow_mut();
        let ty = match (is_union, packed) {
            (false, true) => Type::PackedStruct { fields, signed },
            (false, false) => Type::UnpackedStruct { fields },
            (true, true) => Type::PackedUnion { fields, signed },
            (true, false) => Type::UnpackedUnion { fields, tagged },
        };
        let base = types.intern(ty);
        drop(types);
        self.wrap_packed_dimensions(base, syntax, ctx)
    }

    fn resolve_virtual_interface(&self, syntax: &SyntaxNode) -> TypeId {
        let mut idents = syntax.tokens().filter(|t| t.kind == TokenKind::Identifier);
        let Some(iface_name) = idents.next() else {
            return self.builtins().error;
        };
        let modport = idents.next().map(|t| t.text.clone());

        let Some(def) = self.find_definition(&iface_name.text, self.unit_scope()) else {
            self.error(
                SemanticError::UnknownDefinition {
                    name: iface_name.text.clone(),
                },
                syntax.range(),
            );
            return self.builtins().error;
        };
        let is_iface = matches!(
            &self.symbol(def).kind,
            SymbolKind::Definition { kind: DefinitionKind::Interface, .. }
        );
        if !is_iface {
            self.error(
                SemanticError::UnknownDefinition {
                    name: iface_name.text.clone(),
                },
                syntax.range(),
            );
            return self.builtins().error;
        }

        self.types.borrow_mut().intern(Type::VirtualInterface {
            iface: def,
            modport,
        })
    }

}

fn integral_kind_for(kind: TokenKind) -> Option<IntegralKind> {
    match kind {
        TokenKind::KwBit => Some(IntegralKind::Bit),
        TokenKind::KwLogic => Some(IntegralKind::Logic),
        TokenKind::KwReg => Some(IntegralKind::Reg),
        TokenKind::KwByte => Some(IntegralKind::Byte),
        TokenKind::KwShortint => Some(IntegralKind::ShortInt),
        TokenKind::KwInt => Some(IntegralKind::Int),
        TokenKind::KwLongint => Some(IntegralKind::LongInt),
        TokenKind::KwInteger => Some(IntegralKind::Integer),
        TokenKind::KwTime => Some(IntegralKind::Time),
        _ => None,
    }
}
