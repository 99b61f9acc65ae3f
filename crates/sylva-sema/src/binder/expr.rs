// src/binder/expr.rs
//
// Expression binding: CST expression nodes become typed bound trees with
// implicit conversions made explicit. Width and signedness follow the
// standard's context rules: arithmetic operands widen to the expression's
// effective width, while shift amounts, replication counts, and condition
// operands stay self-determined.

use sylva_numeric::SVInt;
use sylva_syntax::cst::{SyntaxKind, SyntaxNode};
use sylva_syntax::{TokenKind, TokenValue};
use sylva_text::SourceRange;

use crate::binder::{BindContext, BinaryOp, ExprKind, Expression, SystemFunc, UnaryOp};
use crate::compilation::Compilation;
use crate::errors::SemanticError;
use crate::symbols::{SymbolId, SymbolKind};
use crate::types::relations::is_assignment_compatible;
use crate::types::{Type, TypeId};

impl Compilation {
    pub fn bind_expression(&self, syntax: &SyntaxNode, ctx: &BindContext) -> Expression {
        let range = syntax.range();
        match syntax.kind {
            SyntaxKind::LiteralExpression => self.bind_literal(syntax, range),
            SyntaxKind::NameExpression => self.bind_name(syntax, ctx, range),
            SyntaxKind::ScopedNameExpression => self.bind_scoped_name(syntax, ctx, range),
            SyntaxKind::ParenthesizedExpression => match syntax.nodes().next() {
                Some(inner) => self.bind_expression(inner, ctx),
                None => Expression::invalid(self.builtins().error, range),
            },
            SyntaxKind::UnaryExpression => self.bind_unary(syntax, ctx, range),
            SyntaxKind::BinaryExpression => self.bind_binary(syntax, ctx, range),
            SyntaxKind::AssignmentExpression => self.bind_assignment(syntax, ctx, range),
            SyntaxKind::ConditionalExpression => self.bind_conditional(syntax, ctx, range),
            SyntaxKind::ConcatenationExpression => self.bind_concat(syntax, ctx, range),
            SyntaxKind::ReplicationExpression => self.bind_replication(syntax, ctx, range),
            SyntaxKind::ElementSelectExpression => self.bind_element_select(syntax, ctx, range),
            SyntaxKind::RangeSelectExpression => self.bind_range_select(syntax, ctx, range),
            SyntaxKind::CallExpression => self.bind_call(syntax, ctx, range),
            SyntaxKind::SystemCallExpression => self.bind_system_call(syntax, ctx, range),
            SyntaxKind::MemberAccessExpression => self.bind_member_access(syntax, ctx, range),
            _ => Expression::invalid(self.builtins().error, range),
        }
    }

    fn bind_literal(&self, syntax: &SyntaxNode, range: SourceRange) -> Expression {
        let Some(tok) = syntax.tokens().next() else {
            return Expression::invalid(self.builtins().error, range);
        };
        match (&tok.value, tok.kind) {
            (Some(TokenValue::Int(v)), _) => {
                let ty = self
                    .types
                    .borrow_mut()
                    .bit_vector(v.width(), v.is_signed(), v.has_unknown());
                Expression {
                    kind: ExprKind::IntLiteral(v.clone()),
                    ty,
                    range,
                }
            }
            (Some(TokenValue::UnbasedUnsized(logic)), _) => {
                let ty = self.types.borrow_mut().bit_vector(1, false, true);
                Expression {
                    kind: ExprKind::UnbasedUnsizedLiteral(*logic),
                    ty,
                    range,
                }
            }
            (Some(TokenValue::Real { value, .. }), _) => Expression {
                kind: ExprKind::RealLiteral(*value),
                ty: self.builtins().real,
                range,
            },
            (Some(TokenValue::Time { value, .. }), _) => Expression {
                kind: ExprKind::RealLiteral(*value),
                ty: self.builtins().realtime,
                range,
            },
            (Some(TokenValue::Str(s)), _) => Expression {
                kind: ExprKind::StringLiteral(s.clone()),
                ty: self.builtins().string,
                range,
            },
            (None, TokenKind::KwNull) => Expression {
                kind: ExprKind::NullLiteral,
                ty: self.builtins().null,
                range,
            },
            (None, TokenKind::Dollar) => Expression {
                kind: ExprKind::UnboundedLiteral,
                ty: self.builtins().unbounded,
                range,
            },
            _ => Expression::invalid(self.builtins().error, range),
        }
    }

    fn bind_name(&self, syntax: &SyntaxNode, ctx: &BindContext, range: SourceRange) -> Expression {
        let Some(tok) = syntax.tokens().next() else {
            return Expression::invalid(self.builtins().error, range);
        };
        let name = tok.identifier();
        match self.lookup_unqualified(ctx, name) {
            Some(id) => self.named_value(id, range),
            None => {
                self.error(
                    SemanticError::UndeclaredIdentifier { name: name.to_string() },
                    range,
                );
                Expression::invalid(self.builtins().error, range)
            }
        }
    }

    fn bind_scoped_name(
        &self,
        syntax: &SyntaxNode,
        ctx: &BindContext,
        range: SourceRange,
    ) -> Expression {
        let Some(name_node) = syntax.child_node(SyntaxKind::ScopedName) else {
            return Expression::invalid(self.builtins().error, range);
        };
        let parts: Vec<String> = name_node
            .tokens()
            .filter(|t| {
                t.kind == TokenKind::Identifier || t.kind == TokenKind::SystemIdentifier
            })
            .map(|t| t.text.clone())
            .collect();
        let Some((first, rest)) = parts.split_first() else {
            return Expression::invalid(self.builtins().error, range);
        };
        match self.lookup_scoped(ctx, first, rest) {
            Some(id) => self.named_value(id, range),
            None => {
                self.error(
                    SemanticError::UndeclaredIdentifier { name: parts.join("::") },
                    range,
                );
                Expression::invalid(self.builtins().error, range)
            }
        }
    }

    fn named_value(&self, id: SymbolId, range: SourceRange) -> Expression {
        let sym = self.symbol(id);
        match &sym.kind {
            SymbolKind::Parameter { .. }
            | SymbolKind::Variable { .. }
            | SymbolKind::Net { .. }
            | SymbolKind::FormalArgument { .. }
            | SymbolKind::EnumValue { .. }
            | SymbolKind::Genvar => Expression {
                kind: ExprKind::NamedValue(id),
                ty: self.symbol_type(id),
                range,
            },
            SymbolKind::Instance { .. } => Expression {
                // Instances are not values, but member access peels this
                // off before it ever evaluates.
                kind: ExprKind::NamedValue(id),
                ty: self.builtins().error,
                range,
            },
            _ => {
                self.error(
                    SemanticError::NotAValue { name: sym.name.clone() },
                    range,
                );
                Expression::invalid(self.builtins().error, range)
            }
        }
    }

    fn bind_unary(&self, syntax: &SyntaxNode, ctx: &BindContext, range: SourceRange) -> Expression {
        // The operator is the node's only token, whether the form is
        // prefix or postfix.
        let op_tok = syntax.tokens().next().map(|t| t.kind);
        let Some(operand_syntax) = syntax.nodes().next() else {
            return Expression::invalid(self.builtins().error, range);
        };

        // Increment and decrement rewrite into assignments.
        if matches!(op_tok, Some(TokenKind::PlusPlus | TokenKind::MinusMinus)) {
            let op = if op_tok == Some(TokenKind::PlusPlus) {
                BinaryOp::Add
            } else {
                BinaryOp::Sub
            };
            return self.bind_step_assignment(operand_syntax, op, ctx, range);
        }

        let operand = self.bind_expression(operand_syntax, ctx);
        let types_ok = self.types.borrow().is_numeric(operand.ty)
            || self.types.borrow().is_error(operand.ty);
        if !types_ok {
            let display = self.types.borrow().display(operand.ty);
            self.error(SemanticError::BadOperand { ty: display }, range);
            return Expression::invalid(self.builtins().error, range);
        }

        let (op, ty) = match op_tok {
            Some(TokenKind::Plus) => (UnaryOp::Plus, operand.ty),
            Some(TokenKind::Minus) => (UnaryOp::Minus, operand.ty),
            Some(TokenKind::Tilde) => (UnaryOp::BitwiseNot, operand.ty),
            Some(TokenKind::Bang) => (UnaryOp::LogicalNot, self.bit_result(operand.ty)),
            Some(TokenKind::Amp) => (UnaryOp::ReductionAnd, self.bit_result(operand.ty)),
            Some(TokenKind::TildeAmp) => (UnaryOp::ReductionNand, self.bit_result(operand.ty)),
            Some(TokenKind::Pipe) => (UnaryOp::ReductionOr, self.bit_result(operand.ty)),
            Some(TokenKind::TildePipe) => (UnaryOp::ReductionNor, self.bit_result(operand.ty)),
            Some(TokenKind::Caret) => (UnaryOp::ReductionXor, self.bit_result(operand.ty)),
            Some(TokenKind::TildeCaret) | Some(TokenKind::CaretTilde) => {
                (UnaryOp::ReductionXnor, self.bit_result(operand.ty))
            }
            _ => return Expression::invalid(self.builtins().error, range),
        };
        Expression {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
            range,
        }
    }

    /// `x++` / `--x` become `x = x +/- 1`.
    fn bind_step_assignment(
        &self,
        target_syntax: &SyntaxNode,
        op: BinaryOp,
        ctx: &BindContext,
        range: SourceRange,
    ) -> Expression {
        let target = self.bind_expression(target_syntax, ctx);
        let ExprKind::NamedValue(target_id) = target.kind else {
            self.error(SemanticError::BadAssignmentTarget, range);
            return Expression::invalid(self.builtins().error, range);
        };
        let ty = target.ty;
        let (width, signed, four) = self.integral_traits(ty);
        let one = Expression {
            kind: ExprKind::IntLiteral(SVInt::new(width.max(1), signed, 1)),
            ty,
            range,
        };
        let _ = four;
        let value = Expression {
            kind: ExprKind::Binary {
                op,
                left: Box::new(target),
                right: Box::new(one),
            },
            ty,
            range,
        };
        Expression {
            kind: ExprKind::Assignment {
                op: None,
                target: target_id,
                value: Box::new(value),
            },
            ty,
            range,
        }
    }

    fn bind_binary(&self, syntax: &SyntaxNode, ctx: &BindContext, range: SourceRange) -> Expression {
        let mut nodes = syntax.nodes();
        let (Some(lhs), Some(rhs)) = (nodes.next(), nodes.next()) else {
            return Expression::invalid(self.builtins().error, range);
        };
        let Some(op) = syntax.tokens().next().and_then(|t| binary_op_for(t.kind)) else {
            return Expression::invalid(self.builtins().error, range);
        };

        let left = self.bind_expression(lhs, ctx);
        let right = self.bind_expression(rhs, ctx);
        self.finish_binary(op, left, right, range)
    }

    pub(crate) fn finish_binary(
        &self,
        op: BinaryOp,
        left: Expression,
        right: Expression,
        range: SourceRange,
    ) -> Expression {
        let b = self.builtins();
        if self.types.borrow().is_error(left.ty) || self.types.borrow().is_error(right.ty) {
            return Expression::invalid(b.error, range);
        }

        let l_float = self.types.borrow().is_floating(left.ty);
        let r_float = self.types.borrow().is_floating(right.ty);

        // Shifts and power keep the left operand's type; the right side is
        // self-determined.
        if op.is_shift() || op == BinaryOp::Pow {
            let ty = left.ty;
            return Expression {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                ty,
                range,
            };
        }

        if op.is_logical() {
            let four = self.types.borrow().is_four_state(left.ty)
                || self.types.borrow().is_four_state(right.ty);
            let ty = self.types.borrow_mut().bit_vector(1, false, four);
            return Expression {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                ty,
                range,
            };
        }

        if l_float || r_float {
            if op.is_comparison() {
                let left = self.make_conversion(left, b.real);
                let right = self.make_conversion(right, b.real);
                let ty = self.types.borrow_mut().bit_vector(1, false, false);
                return Expression {
                    kind: ExprKind::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    ty,
                    range,
                };
            }
            let left = self.make_conversion(left, b.real);
            let right = self.make_conversion(right, b.real);
            return Expression {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                ty: b.real,
                range,
            };
        }

        // Integral operands widen to the common effective width.
        let (lw, ls, lf) = self.integral_traits(left.ty);
        let (rw, rs, rf) = self.integral_traits(right.ty);
        let width = lw.max(rw).max(1);
        let signed = ls && rs;
        let four = lf || rf;

        let common = self.types.borrow_mut().bit_vector(width, signed, four);
        let left = self.make_conversion(left, common);
        let right = self.make_conversion(right, common);

        let ty = if op.is_comparison() {
            // Case equality always produces a known bit.
            let result_four = four && !matches!(op, BinaryOp::CaseEq | BinaryOp::CaseNe);
            self.types.borrow_mut().bit_vector(1, false, result_four)
        } else {
            common
        };

        Expression {
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
            range,
        }
    }

    fn bind_assignment(
        &self,
        syntax: &SyntaxNode,
        ctx: &BindContext,
        range: SourceRange,
    ) -> Expression {
        let mut nodes = syntax.nodes();
        let (Some(lhs), Some(rhs)) = (nodes.next(), nodes.next()) else {
            return Expression::invalid(self.builtins().error, range);
        };

        let target = self.bind_expression(lhs, ctx);
        let ExprKind::NamedValue(target_id) = target.kind else {
            self.error(SemanticError::BadAssignmentTarget, range);
            return Expression::invalid(self.builtins().error, range);
        };
        let target_ty = target.ty;

        let op_tok = syntax.tokens().next().map(|t| t.kind);
        let op = op_tok.and_then(compound_op_for);

        let bound_rhs = self.bind_expression(rhs, ctx);
        let value = match op {
            Some(binary) => {
                // Compound assignment: fold the operation, then convert to
                // the target's type.
                let folded = self.finish_binary(binary, target.clone(), bound_rhs, range);
                self.convert_assignment(folded, target_ty)
            }
            None => self.convert_assignment(bound_rhs, target_ty),
        };

        Expression {
            kind: ExprKind::Assignment {
                op: None,
                target: target_id,
                value: Box::new(value),
            },
            ty: target_ty,
            range,
        }
    }

    fn bind_conditional(
        &self,
        syntax: &SyntaxNode,
        ctx: &BindContext,
        range: SourceRange,
    ) -> Expression {
        let mut nodes = syntax.nodes();
        let (Some(c), Some(t), Some(f)) = (nodes.next(), nodes.next(), nodes.next()) else {
            return Expression::invalid(self.builtins().error, range);
        };
        let cond = self.bind_expression(c, ctx);
        let if_true = self.bind_expression(t, ctx);
        let if_false = self.bind_expression(f, ctx);
        let b = self.builtins();

        let both_integral = self.types.borrow().is_integral(if_true.ty)
            && self.types.borrow().is_integral(if_false.ty);
        let (ty, if_true, if_false) = if both_integral {
            let (tw, ts, tf) = self.integral_traits(if_true.ty);
            let (fw, fs, ff) = self.integral_traits(if_false.ty);
            let cond_four = self.types.borrow().is_four_state(cond.ty);
            // An unknown condition merges the branches bit-by-bit, so the
            // result is four-state whenever the condition can be unknown.
            let ty = self.types.borrow_mut().bit_vector(
                tw.max(fw).max(1),
                ts && fs,
                tf || ff || cond_four,
            );
            (
                ty,
                self.make_conversion(if_true, ty),
                self.make_conversion(if_false, ty),
            )
        } else if self.types.borrow().is_numeric(if_true.ty)
            && self.types.borrow().is_numeric(if_false.ty)
        {
            (
                b.real,
                self.make_conversion(if_true, b.real),
                self.make_conversion(if_false, b.real),
            )
        } else {
            (if_true.ty, if_true, if_false)
        };

        Expression {
            kind: ExprKind::Conditional {
                cond: Box::new(cond),
                if_true: Box::new(if_true),
                if_false: Box::new(if_false),
            },
            ty,
            range,
        }
    }

    fn bind_concat(&self, syntax: &SyntaxNode, ctx: &BindContext, range: SourceRange) -> Expression {
        let mut parts = Vec::new();
        let mut width = 0u32;
        let mut four = false;
        for child in syntax.nodes() {
            let part = self.bind_expression(child, ctx);
            if part.is_invalid() {
                return Expression::invalid(self.builtins().error, range);
            }
            if let ExprKind::Replication { count: 0, .. } = part.kind {
                // Zero replication contributes no bits but stays legal
                // inside a concatenation.
                parts.push(part);
                continue;
            }
            let integral = self.types.borrow().is_integral(part.ty);
            if !integral {
                let display = self.types.borrow().display(part.ty);
                self.error(SemanticError::BadOperand { ty: display }, part.range);
                return Expression::invalid(self.builtins().error, range);
            }
            width += self.types.borrow().bit_width(part.ty);
            four |= self.types.borrow().is_four_state(part.ty);
            parts.push(part);
        }
        let ty = self.types.borrow_mut().bit_vector(width.max(1), false, four);
        Expression {
            kind: ExprKind::Concat { parts },
            ty,
            range,
        }
    }

    fn bind_replication(
        &self,
        syntax: &SyntaxNode,
        ctx: &BindContext,
        range: SourceRange,
    ) -> Expression {
        let mut nodes = syntax.nodes();
        let Some(count_syntax) = nodes.next() else {
            return Expression::invalid(self.builtins().error, range);
        };
        // The replication count is a self-determined constant.
        let count = self.eval_integer_constant(count_syntax, &ctx.constant());
        let Some(count) = count.filter(|&c| c >= 0) else {
            self.error(SemanticError::InvalidReplicationCount, range);
            return Expression::invalid(self.builtins().error, range);
        };
        let count = count as u32;

        let inner: Vec<Expression> = nodes.map(|n| self.bind_expression(n, ctx)).collect();
        let mut width = 0u32;
        let mut four = false;
        for part in &inner {
            width += self.types.borrow().bit_width(part.ty);
            four |= self.types.borrow().is_four_state(part.ty);
        }

        let operand = if inner.len() == 1 {
            inner.into_iter().next().unwrap()
        } else {
            let ty = self.types.borrow_mut().bit_vector(width.max(1), false, four);
            Expression {
                kind: ExprKind::Concat { parts: inner },
                ty,
                range,
            }
        };

        let ty = self
            .types
            .borrow_mut()
            .bit_vector((width * count).max(1), false, four);
        Expression {
            kind: ExprKind::Replication {
                count,
                operand: Box::new(operand),
            },
            ty,
            range,
        }
    }

    fn bind_element_select(
        &self,
        syntax: &SyntaxNode,
        ctx: &BindContext,
        range: SourceRange,
    ) -> Expression {
        let mut nodes = syntax.nodes();
        let (Some(value_syntax), Some(index_syntax)) = (nodes.next(), nodes.next()) else {
            return Expression::invalid(self.builtins().error, range);
        };
        let value = self.bind_expression(value_syntax, ctx);
        let index = self.bind_expression(index_syntax, ctx);

        let ty = {
            let types = self.types.borrow();
            if types.is_unpacked_array(value.ty) {
                types.element_type(value.ty).unwrap_or(self.builtins().error)
            } else if types.is_integral(value.ty) {
                drop(types);
                let four = self.types.borrow().is_four_state(value.ty);
                self.types.borrow_mut().bit_vector(1, false, four)
            } else {
                let display = types.display(value.ty);
                drop(types);
                self.error(SemanticError::BadSelect { ty: display }, range);
                self.builtins().error
            }
        };

        Expression {
            kind: ExprKind::ElementSelect {
                value: Box::new(value),
                index: Box::new(index),
            },
            ty,
            range,
        }
    }

    fn bind_range_select(
        &self,
        syntax: &SyntaxNode,
        ctx: &BindContext,
        range: SourceRange,
    ) -> Expression {
        let mut nodes = syntax.nodes();
        let (Some(value_syntax), Some(first), Some(second)) =
            (nodes.next(), nodes.next(), nodes.next())
        else {
            return Expression::invalid(self.builtins().error, range);
        };
        let value = self.bind_expression(value_syntax, ctx);

        let sep = syntax
            .tokens()
            .find(|t| {
                matches!(
                    t.kind,
                    TokenKind::Colon | TokenKind::PlusColon | TokenKind::MinusColon
                )
            })
            .map(|t| t.kind);

        let cctx = ctx.constant();
        let a = self.eval_integer_constant(first, &cctx);
        let b_val = self.eval_integer_constant(second, &cctx);
        let (Some(a), Some(b_val)) = (a, b_val) else {
            self.error(SemanticError::NotAConstant, range);
            return Expression::invalid(self.builtins().error, range);
        };

        let (msb, lsb) = match sep {
            Some(TokenKind::PlusColon) => (a + b_val - 1, a),
            Some(TokenKind::MinusColon) => (a, a - b_val + 1),
            _ => (a, b_val),
        };
        if msb < lsb {
            self.error(SemanticError::BadDimensionBound, range);
            return Expression::invalid(self.builtins().error, range);
        }

        let four = self.types.borrow().is_four_state(value.ty);
        let width = (msb - lsb + 1) as u32;
        let ty = self.types.borrow_mut().bit_vector(width, false, four);
        Expression {
            kind: ExprKind::RangeSelect {
                value: Box::new(value),
                msb,
                lsb,
            },
            ty,
            range,
        }
    }

    fn bind_call(&self, syntax: &SyntaxNode, ctx: &BindContext, range: SourceRange) -> Expression {
        let mut nodes = syntax.nodes();
        let (Some(callee), Some(arg_list)) = (nodes.next(), nodes.next()) else {
            return Expression::invalid(self.builtins().error, range);
        };

        let sub = self.resolve_callee(callee, ctx);
        let Some(sub) = sub else {
            let name = callee
                .first_token()
                .map(|t| t.text.clone())
                .unwrap_or_default();
            self.error(SemanticError::NotCallable { name }, range);
            return Expression::invalid(self.builtins().error, range);
        };

        let formals = self.subroutine_args(sub);
        let actuals: Vec<&SyntaxNode> = arg_list.nodes().collect();
        if actuals.len() > formals.len() {
            self.error(
                SemanticError::WrongArgCount {
                    name: self.symbol(sub).name.clone(),
                    expected: formals.len(),
                    got: actuals.len(),
                },
                range,
            );
        }

        let mut args = Vec::new();
        for (i, formal) in formals.iter().enumerate() {
            let formal_ty = self.symbol_type(*formal);
            match actuals.get(i) {
                Some(actual) => {
                    let bound = self.bind_expression(actual, ctx);
                    args.push(self.convert_assignment(bound, formal_ty));
                }
                None => {
                    // Default argument values bind in the subroutine's own
                    // context (the prototype side of the open question).
                    let default = match &self.symbol(*formal).kind {
                        SymbolKind::FormalArgument { declarator, .. } => declarator
                            .child_node(SyntaxKind::EqualsInitializer)
                            .and_then(|n| n.nodes().next())
                            .cloned(),
                        _ => None,
                    };
                    match default {
                        Some(d) => {
                            let sub_scope = self.subroutine_scope(sub);
                            let dctx = BindContext::new(sub_scope);
                            let bound = self.bind_expression(&d, &dctx);
                            args.push(self.convert_assignment(bound, formal_ty));
                        }
                        None => {
                            self.error(
                                SemanticError::WrongArgCount {
                                    name: self.symbol(sub).name.clone(),
                                    expected: formals.len(),
                                    got: actuals.len(),
                                },
                                range,
                            );
                            args.push(Expression::invalid(self.builtins().error, range));
                        }
                    }
                }
            }
        }

        let ty = self.subroutine_return_type(sub);
        Expression {
            kind: ExprKind::Call {
                subroutine: sub,
                args,
            },
            ty,
            range,
        }
    }

    fn resolve_callee(&self, callee: &SyntaxNode, ctx: &BindContext) -> Option<SymbolId> {
        let id = match callee.kind {
            SyntaxKind::NameExpression => {
                let name = callee.tokens().next()?.identifier().to_string();
                self.lookup_unqualified(ctx, &name)?
            }
            SyntaxKind::ScopedNameExpression => {
                let name_node = callee.child_node(SyntaxKind::ScopedName)?;
                let parts: Vec<String> = name_node
                    .tokens()
                    .filter(|t| {
                        t.kind == TokenKind::Identifier || t.kind == TokenKind::SystemIdentifier
                    })
                    .map(|t| t.text.clone())
                    .collect();
                let (first, rest) = parts.split_first()?;
                self.lookup_scoped(ctx, first, rest)?
            }
            _ => return None,
        };

        match &self.symbol(id).kind {
            SymbolKind::Subroutine { .. } => Some(id),
            SymbolKind::MethodPrototype { .. } => self.prototype_subroutine(id),
            _ => None,
        }
    }

    fn bind_system_call(
        &self,
        syntax: &SyntaxNode,
        ctx: &BindContext,
        range: SourceRange,
    ) -> Expression {
        let Some(name_tok) = syntax.tokens().next() else {
            return Expression::invalid(self.builtins().error, range);
        };
        let func = match name_tok.text.as_str() {
            "$clog2" => SystemFunc::Clog2,
            "$bits" => SystemFunc::Bits,
            "$signed" => SystemFunc::Signed,
            "$unsigned" => SystemFunc::Unsigned,
            other => {
                self.error(
                    SemanticError::UnknownSystemFunction { name: other.to_string() },
                    range,
                );
                return Expression::invalid(self.builtins().error, range);
            }
        };

        let args: Vec<Expression> = syntax
            .child_node(SyntaxKind::ArgumentList)
            .map(|list| list.nodes().map(|n| self.bind_expression(n, ctx)).collect())
            .unwrap_or_default();

        let ty = match func {
            SystemFunc::Clog2 | SystemFunc::Bits => self.builtins().int,
            SystemFunc::Signed | SystemFunc::Unsigned => {
                let operand_ty = args
                    .first()
                    .map(|a| a.ty)
                    .unwrap_or(self.builtins().error);
                let (w, _, f) = self.integral_traits(operand_ty);
                self.types
                    .borrow_mut()
                    .bit_vector(w.max(1), func == SystemFunc::Signed, f)
            }
        };

        Expression {
            kind: ExprKind::SystemCall { func, args },
            ty,
            range,
        }
    }

    fn bind_member_access(
        &self,
        syntax: &SyntaxNode,
        ctx: &BindContext,
        range: SourceRange,
    ) -> Expression {
        let Some(value_syntax) = syntax.nodes().next() else {
            return Expression::invalid(self.builtins().error, range);
        };
        let Some(member_tok) = syntax
            .tokens()
            .rfind(|t| t.kind == TokenKind::Identifier)
        else {
            return Expression::invalid(self.builtins().error, range);
        };
        let member_name = member_tok.text.clone();

        let value = self.bind_expression(value_syntax, ctx);

        // Access into an instance walks the elaborated hierarchy.
        if let ExprKind::NamedValue(id) = value.kind {
            if matches!(self.symbol(id).kind, SymbolKind::Instance { .. }) {
                if ctx.flags.in_constant && !self.options.allow_hierarchical_in_const {
                    self.error(SemanticError::HierarchicalInConst, range);
                    return Expression::invalid(self.builtins().error, range);
                }
                let Some(body) = self.instance_body(id) else {
                    return Expression::invalid(self.builtins().error, range);
                };
                let found = self.with_scope(body, |data| data.name_map.get(&member_name).copied());
                let Some(found) = found else {
                    self.error(
                        SemanticError::UnknownMember {
                            name: member_name,
                            scope: self.symbol(id).name.clone(),
                        },
                        range,
                    );
                    return Expression::invalid(self.builtins().error, range);
                };
                return Expression {
                    kind: ExprKind::HierarchicalValue(found),
                    ty: self.symbol_type(found),
                    range,
                };
            }
        }

        // Struct and union field access by name.
        let field_info = {
            let types = self.types.borrow();
            match types.get(types.canonical(value.ty)) {
                Type::PackedStruct { fields, .. }
                | Type::UnpackedStruct { fields }
                | Type::PackedUnion { fields, .. }
                | Type::UnpackedUnion { fields, .. } => fields
                    .iter()
                    .position(|f| f.name == member_name)
                    .map(|i| (i, fields[i].ty)),
                _ => None,
            }
        };
        match field_info {
            Some((index, field_ty)) => Expression {
                kind: ExprKind::MemberSelect {
                    value: Box::new(value),
                    field: index,
                },
                ty: field_ty,
                range,
            },
            None => {
                let scope = self.types.borrow().display(value.ty);
                self.error(
                    SemanticError::UnknownMember {
                        name: member_name,
                        scope,
                    },
                    range,
                );
                Expression::invalid(self.builtins().error, range)
            }
        }
    }

    // ----- conversions ----------------------------------------------------

    /// Integral width/sign/four-state of a type (reals report their bit
    /// width and signedness for widening decisions).
    pub(crate) fn integral_traits(&self, ty: TypeId) -> (u32, bool, bool) {
        let types = self.types.borrow();
        (types.bit_width(ty), types.is_signed(ty), types.is_four_state(ty))
    }

    fn bit_result(&self, operand_ty: TypeId) -> TypeId {
        let four = self.types.borrow().is_four_state(operand_ty);
        self.types.borrow_mut().bit_vector(1, false, four)
    }

    /// Wraps `expr` in a conversion when the types differ; no legality
    /// check (the caller has already decided the conversion exists).
    pub(crate) fn make_conversion(&self, expr: Expression, target: TypeId) -> Expression {
        let matching = {
            let types = self.types.borrow();
            crate::types::relations::is_matching(&types, expr.ty, target)
        };
        if matching {
            return expr;
        }
        let range = expr.range;
        Expression {
            kind: ExprKind::Conversion {
                operand: Box::new(expr),
            },
            ty: target,
            range,
        }
    }

    /// Checked conversion for assignment-like contexts: diagnoses and
    /// yields an invalid expression when the types are not assignment
    /// compatible.
    pub fn convert_assignment(&self, expr: Expression, target: TypeId) -> Expression {
        if matches!(expr.kind, ExprKind::UnbasedUnsizedLiteral(_)) {
            let integral = self.types.borrow().is_integral(target);
            if integral {
                return self.make_conversion(expr, target);
            }
        }
        let compatible = {
            let types = self.types.borrow();
            is_assignment_compatible(&types, target, expr.ty)
        };
        if !compatible {
            let (from, to) = {
                let types = self.types.borrow();
                (types.display(expr.ty), types.display(target))
            };
            self.error(SemanticError::BadConversion { from, to }, expr.range);
            return Expression::invalid(self.builtins().error, expr.range);
        }
        self.make_conversion(expr, target)
    }
}

fn binary_op_for(kind: TokenKind) -> Option<BinaryOp> {
    use TokenKind::*;
    Some(match kind {
        Plus => BinaryOp::Add,
        Minus => BinaryOp::Sub,
        Star => BinaryOp::Mul,
        Slash => BinaryOp::Div,
        Percent => BinaryOp::Mod,
        StarStar => BinaryOp::Pow,
        Amp => BinaryOp::BitAnd,
        Pipe => BinaryOp::BitOr,
        Caret => BinaryOp::BitXor,
        CaretTilde | TildeCaret => BinaryOp::BitXnor,
        AmpAmp => BinaryOp::LogicalAnd,
        PipePipe => BinaryOp::LogicalOr,
        MinusGt => BinaryOp::LogicalImplies,
        LtMinusGt => BinaryOp::LogicalIff,
        EqEq => BinaryOp::Eq,
        BangEq => BinaryOp::Ne,
        EqEqEq => BinaryOp::CaseEq,
        BangEqEq => BinaryOp::CaseNe,
        EqEqQuestion => BinaryOp::WildcardEq,
        BangEqQuestion => BinaryOp::WildcardNe,
        Lt => BinaryOp::Lt,
        LtEq => BinaryOp::Le,
        Gt => BinaryOp::Gt,
        GtEq => BinaryOp::Ge,
        LtLt => BinaryOp::Shl,
        GtGt => BinaryOp::LShr,
        LtLtLt => BinaryOp::AShl,
        GtGtGt => BinaryOp::AShr,
        _ => return None,
    })
}

fn compound_op_for(kind: TokenKind) -> Option<BinaryOp> {
    use TokenKind::*;
    Some(match kind {
        PlusEq => BinaryOp::Add,
        MinusEq => BinaryOp::Sub,
        StarEq => BinaryOp::Mul,
        SlashEq => BinaryOp::Div,
        PercentEq => BinaryOp::Mod,
        AmpEq => BinaryOp::BitAnd,
        PipeEq => BinaryOp::BitOr,
        CaretEq => BinaryOp::BitXor,
        LtLtEq => BinaryOp::Shl,
        GtGtEq => BinaryOp::LShr,
        LtLtLtEq => BinaryOp::AShl,
        GtGtGtEq => BinaryOp::AShr,
        _ => return None,
    })
}
