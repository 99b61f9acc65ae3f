// src/elaborate.rs
//
// Per-symbol lazy facts: declared types, parameter values, subroutine
// scopes/arguments/bodies. Everything here memoizes into the symbol's
// OnceCell slots and runs under the compilation's cycle guard where
// reentry is possible.

use std::cell::OnceCell;
use std::rc::Rc;

use sylva_numeric::ConstantValue;
use sylva_syntax::cst::{SyntaxKind, SyntaxNode};
use sylva_syntax::TokenKind;
use sylva_text::SourceRange;

use crate::binder::{BindContext, Statement, StmtKind};
use crate::compilation::{is_type_syntax, Compilation};
use crate::errors::SemanticError;
use crate::eval::EvalContext;
use crate::symbols::{ArgDirection, ScopeId, Symbol, SymbolId, SymbolKind};
use crate::types::{Type, TypeId};

impl Compilation {
    /// The type of a value symbol, resolved and memoized on first request.
    pub fn symbol_type(&self, id: SymbolId) -> TypeId {
        let sym = self.symbol(id);
        match &sym.kind {
            SymbolKind::Variable { ty, ty_syntax, declarator, .. }
            | SymbolKind::Net { ty, ty_syntax, declarator }
            | SymbolKind::FormalArgument { ty, ty_syntax, declarator, .. } => {
                if let Some(t) = ty.get() {
                    return *t;
                }
                let resolved = self.declared_type(&sym, ty_syntax.as_ref(), Some(declarator));
                let _ = ty.set(resolved);
                resolved
            }
            SymbolKind::Parameter { ty, .. } => {
                if let Some(t) = ty.get() {
                    return *t;
                }
                // The value computation settles the type as a side effect.
                self.parameter_value(id);
                match &self.symbol(id).kind {
                    SymbolKind::Parameter { ty, .. } => {
                        ty.get().copied().unwrap_or(self.builtins().error)
                    }
                    _ => self.builtins().error,
                }
            }
            SymbolKind::Typedef { ty, ty_syntax, declarator } => {
                if let Some(t) = ty.get() {
                    return *t;
                }
                let resolved = self.guard_cycle(
                    id,
                    |comp| comp.builtins().error,
                    |comp| {
                        let target = comp.declared_type(&sym, ty_syntax.as_ref(), Some(declarator));
                        comp.types.borrow_mut().intern(Type::Alias {
                            name: sym.name.clone(),
                            target,
                        })
                    },
                );
                let _ = ty.set(resolved);
                resolved
            }
            SymbolKind::EnumValue { ty, .. } => {
                ty.get().copied().unwrap_or(self.builtins().error)
            }
            SymbolKind::Subroutine { .. } => self.subroutine_return_type(id),
            SymbolKind::Class { .. } => {
                let mut types = self.types.borrow_mut();
                types.intern(Type::Class { class: id })
            }
            _ => self.builtins().error,
        }
    }

    /// Resolves a declared type in the symbol's own context and wraps any
    /// unpacked dimensions from the declarator.
    fn declared_type(
        &self,
        sym: &Symbol,
        ty_syntax: Option<&SyntaxNode>,
        declarator: Option<&SyntaxNode>,
    ) -> TypeId {
        let scope = sym.parent.unwrap_or(self.unit_scope());
        let ctx = BindContext::at_index(scope, sym.index);
        let base = match ty_syntax {
            Some(t) => self.resolve_type(t, &ctx),
            None => self.builtins().logic,
        };
        match declarator {
            Some(d) => self.wrap_unpacked_dimensions(base, d, &ctx),
            None => base,
        }
    }

    /// Applies `[n]`, `[l:r]`, `[]`, `[$]`, `[*]`, `[type]` declarator
    /// dimensions to the element type, outermost dimension first.
    pub(crate) fn wrap_unpacked_dimensions(
        &self,
        element: TypeId,
        declarator: &SyntaxNode,
        ctx: &BindContext,
    ) -> TypeId {
        let dims: Vec<&SyntaxNode> = declarator
            .nodes()
            .filter(|n| {
                matches!(
                    n.kind,
                    SyntaxKind::UnpackedDimension
                        | SyntaxKind::QueueDimension
                        | SyntaxKind::AssociativeDimension
                )
            })
            .collect();

        // Innermost dimension binds tightest, so fold from the right.
        let mut ty = element;
        for dim in dims.iter().rev() {
            ty = self.apply_unpacked_dimension(ty, dim, ctx);
        }
        ty
    }

    fn apply_unpacked_dimension(
        &self,
        element: TypeId,
        dim: &SyntaxNode,
        ctx: &BindContext,
    ) -> TypeId {
        let mut types_kind = |t: Type| self.types.borrow_mut().intern(t);
        match dim.kind {
            SyntaxKind::QueueDimension => {
                let max_bound = dim
                    .nodes()
                    .next()
                    .and_then(|e| self.eval_integer_constant(e, ctx))
                    .map(|v| v as u64);
                types_kind(Type::Queue { element, max_bound })
            }
            SyntaxKind::AssociativeDimension => {
                let index = dim
                    .nodes()
                    .find(|n| is_type_syntax(n.kind))
                    .map(|t| self.resolve_type(t, ctx));
                types_kind(Type::AssociativeArray { element, index })
            }
            _ => {
                let exprs: Vec<&SyntaxNode> = dim.nodes().collect();
                match exprs.len() {
                    0 => types_kind(Type::DynamicArray { element }),
                    1 => {
                        // `[n]` is shorthand for `[0:n-1]`.
                        let n = self.eval_integer_constant(exprs[0], ctx).unwrap_or_else(|| {
                            self.error(SemanticError::BadDimensionBound, dim.range());
                            1
                        });
                        types_kind(Type::FixedUnpackedArray {
                            element,
                            left: 0,
                            right: n.max(1) - 1,
                        })
                    }
                    _ => {
                        let left = self.eval_integer_constant(exprs[0], ctx).unwrap_or(0);
                        let right = self.eval_integer_constant(exprs[1], ctx).unwrap_or(0);
                        types_kind(Type::FixedUnpackedArray { element, left, right })
                    }
                }
            }
        }
    }

    /// Binds and evaluates a constant integer expression, e.g. a
    /// dimension bound.
    pub(crate) fn eval_integer_constant(
        &self,
        syntax: &SyntaxNode,
        ctx: &BindContext,
    ) -> Option<i64> {
        let bound = self.bind_expression(syntax, &ctx.constant());
        let mut eval = EvalContext::new(self);
        eval.eval(&bound).integer().and_then(|v| v.as_i64())
    }

    // ----- parameters -----------------------------------------------------

    /// The elaborated value of a parameter: the instantiation's override
    /// expression (bound at the instantiation site) when present,
    /// otherwise the declared default (bound in the parameter's own
    /// scope, seeing only earlier members).
    pub fn parameter_value(&self, id: SymbolId) -> ConstantValue {
        let sym = self.symbol(id);
        let SymbolKind::Parameter {
            value,
            ty,
            ty_syntax,
            declarator,
            override_expr,
            ..
        } = &sym.kind
        else {
            return ConstantValue::Invalid;
        };
        if let Some(v) = value.get() {
            return v.clone();
        }

        let computed = self.guard_cycle(
            id,
            |_| ConstantValue::Invalid,
            |comp| {
                let scope = sym.parent.unwrap_or(comp.unit_scope());
                let declared_ty = ty_syntax.as_ref().map(|t| {
                    let tctx = BindContext::at_index(scope, sym.index);
                    comp.resolve_type(t, &tctx)
                });

                let (expr_syntax, ctx) = match override_expr {
                    Some((expr, o_scope)) => {
                        (Some(expr.clone()), BindContext::new(*o_scope).constant())
                    }
                    None => {
                        let init = declarator
                            .child_node(SyntaxKind::EqualsInitializer)
                            .and_then(|n| n.nodes().next())
                            .cloned();
                        (init, BindContext::at_index(scope, sym.index).constant())
                    }
                };

                let Some(expr_syntax) = expr_syntax else {
                    comp.error(
                        SemanticError::ParameterHasNoValue { name: sym.name.clone() },
                        SourceRange::at(sym.loc),
                    );
                    let _ = ty.set(comp.builtins().error);
                    return ConstantValue::Invalid;
                };

                let mut bound = comp.bind_expression(&expr_syntax, &ctx);
                if let Some(target) = declared_ty {
                    bound = comp.convert_assignment(bound, target);
                }
                let _ = ty.set(bound.ty);

                let mut eval = EvalContext::new(comp);
                eval.eval(&bound)
            },
        );
        let _ = value.set(computed.clone());
        computed
    }

    // ----- subroutines ----------------------------------------------------

    /// A subroutine's scope holds its formal arguments and the implicit
    /// return variable named after the function itself.
    pub(crate) fn subroutine_scope(&self, id: SymbolId) -> ScopeId {
        let sym = self.symbol(id);
        let SymbolKind::Subroutine { scope, syntax, .. } = &sym.kind else {
            return self.unit_scope();
        };
        if let Some(s) = scope.get() {
            return *s;
        }

        let ret = self.subroutine_return_type(id);
        let new_scope = self.alloc_scope(Some(id), sym.parent);
        let _ = scope.set(new_scope);

        if let Some(ports) = syntax.child_node(SyntaxKind::FunctionPortList) {
            for port in ports.child_nodes(SyntaxKind::FunctionPort) {
                let direction = port
                    .tokens()
                    .find_map(|t| match t.kind {
                        TokenKind::KwInput => Some(ArgDirection::Input),
                        TokenKind::KwOutput => Some(ArgDirection::Output),
                        TokenKind::KwInout => Some(ArgDirection::Inout),
                        TokenKind::KwRef => Some(ArgDirection::Ref),
                        _ => None,
                    })
                    .unwrap_or(ArgDirection::Input);
                let ty_syntax = port.nodes().find(|n| is_type_syntax(n.kind)).cloned();
                if let Some(declarator) = port.child_node(SyntaxKind::Declarator) {
                    let (name, loc) = declarator
                        .name_token()
                        .map(|t| (t.text.clone(), t.loc))
                        .unwrap_or_default();
                    self.insert_symbol(
                        &name,
                        loc,
                        new_scope,
                        SymbolKind::FormalArgument {
                            direction,
                            ty: OnceCell::new(),
                            ty_syntax,
                            declarator: declarator.clone(),
                        },
                    );
                }
            }
        }

        // The function name doubles as the implicit return variable.
        if !sym.name.is_empty() {
            let ty_cell = OnceCell::new();
            let _ = ty_cell.set(ret);
            self.insert_symbol(
                &sym.name,
                sym.loc,
                new_scope,
                SymbolKind::Variable {
                    ty: ty_cell,
                    ty_syntax: None,
                    declarator: SyntaxNode::new(SyntaxKind::Declarator),
                    is_const: false,
                },
            );
        }
        new_scope
    }

    pub fn subroutine_return_type(&self, id: SymbolId) -> TypeId {
        let sym = self.symbol(id);
        let SymbolKind::Subroutine {
            return_type,
            syntax,
            is_task,
            ..
        } = &sym.kind
        else {
            return self.builtins().error;
        };
        if let Some(t) = return_type.get() {
            return *t;
        }
        let resolved = if *is_task {
            self.builtins().void
        } else {
            let scope = sym.parent.unwrap_or(self.unit_scope());
            let ctx = BindContext::at_index(scope, sym.index);
            match syntax.nodes().find(|n| is_type_syntax(n.kind)) {
                Some(t) => self.resolve_type(t, &ctx),
                // Functions without a declared return type produce a
                // single-bit logic result.
                None => self.builtins().logic,
            }
        };
        let _ = return_type.set(resolved);
        resolved
    }

    /// The formal argument symbols, in declaration order.
    pub fn subroutine_args(&self, id: SymbolId) -> Vec<SymbolId> {
        let sym = self.symbol(id);
        let SymbolKind::Subroutine { args, .. } = &sym.kind else {
            return Vec::new();
        };
        if let Some(a) = args.get() {
            return a.clone();
        }
        let scope = self.subroutine_scope(id);
        let list: Vec<SymbolId> = self
            .scope_members(scope)
            .into_iter()
            .filter(|m| matches!(self.symbol(*m).kind, SymbolKind::FormalArgument { .. }))
            .collect();
        let _ = args.set(list.clone());
        list
    }

    /// The bound body, built on demand. Local declarations bind in
    /// statement order, extending the subroutine scope as they appear.
    pub fn subroutine_body(&self, id: SymbolId) -> Option<Rc<Statement>> {
        let sym = self.symbol(id);
        let SymbolKind::Subroutine { body, syntax, .. } = &sym.kind else {
            return None;
        };
        if let Some(b) = body.get() {
            return b.clone();
        }

        let built = self.guard_cycle(
            id,
            |_| None,
            |comp| {
                let scope = comp.subroutine_scope(id);
                let ctx = BindContext::new(scope);
                let mut stmts = Vec::new();
                for child in syntax.nodes() {
                    if is_statement_syntax(child.kind) {
                        stmts.push(comp.bind_statement(child, &ctx));
                    }
                }
                let range = syntax.range();
                Some(Rc::new(Statement {
                    kind: StmtKind::Block(stmts),
                    range,
                }))
            },
        );
        let _ = body.set(built.clone());
        built
    }
}

/// Syntax kinds that bind as statements inside a subroutine body.
pub(crate) fn is_statement_syntax(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::BlockStatement
            | SyntaxKind::ExpressionStatement
            | SyntaxKind::ConditionalStatement
            | SyntaxKind::CaseStatement
            | SyntaxKind::ForLoopStatement
            | SyntaxKind::WhileStatement
            | SyntaxKind::DoWhileStatement
            | SyntaxKind::RepeatStatement
            | SyntaxKind::ForeverStatement
            | SyntaxKind::ForeachStatement
            | SyntaxKind::ReturnStatement
            | SyntaxKind::BreakStatement
            | SyntaxKind::ContinueStatement
            | SyntaxKind::EmptyStatement
            | SyntaxKind::VariableDeclaration
            | SyntaxKind::ParameterDeclaration
            | SyntaxKind::LabeledStatement
            | SyntaxKind::TimedStatement
            | SyntaxKind::ImmediateAssertionStatement
    )
}
