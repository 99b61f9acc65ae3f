// src/binder/stmt.rs
//
// Statement binding. Local declarations inside blocks extend the
// enclosing (subroutine or block) scope in statement order, so later
// statements see them and earlier ones do not.

use std::cell::OnceCell;

use sylva_syntax::cst::{SyntaxKind, SyntaxNode};
use sylva_syntax::TokenKind;

use crate::binder::{BindContext, CaseItem, Statement, StmtKind};
use crate::compilation::{is_type_syntax, Compilation};
use crate::symbols::SymbolKind;

impl Compilation {
    pub fn bind_statement(&self, syntax: &SyntaxNode, ctx: &BindContext) -> Statement {
        let range = syntax.range();
        let kind = match syntax.kind {
            SyntaxKind::EmptyStatement => StmtKind::Empty,
            SyntaxKind::BlockStatement => {
                let stmts = syntax
                    .nodes()
                    .map(|n| self.bind_statement(n, ctx))
                    .collect();
                StmtKind::Block(stmts)
            }
            SyntaxKind::LabeledStatement | SyntaxKind::TimedStatement => {
                // The label or timing control is transparent for constant
                // evaluation purposes.
                match syntax.nodes().find(|n| n.kind != SyntaxKind::TimingControl
                    && n.kind != SyntaxKind::DelayControl)
                {
                    Some(inner) => return self.bind_statement(inner, ctx),
                    None => StmtKind::Empty,
                }
            }
            SyntaxKind::ExpressionStatement => match syntax.nodes().next() {
                Some(e) => StmtKind::Expr(self.bind_expression(e, ctx)),
                None => StmtKind::Empty,
            },
            SyntaxKind::VariableDeclaration => {
                return self.bind_local_declaration(syntax, ctx);
            }
            SyntaxKind::ParameterDeclaration => {
                // Local parameters inside a body become scope members with
                // constant values; no runtime statement remains.
                self.add_parameters(ctx.scope, syntax, None);
                StmtKind::Empty
            }
            SyntaxKind::ConditionalStatement => {
                let mut nodes = syntax.nodes();
                let cond = match nodes.next() {
                    Some(c) => self.bind_expression(c, ctx),
                    None => return Statement { kind: StmtKind::Invalid, range },
                };
                let then_stmt = match nodes.next() {
                    Some(s) => self.bind_statement(s, ctx),
                    None => Statement { kind: StmtKind::Empty, range },
                };
                let else_stmt = nodes.next().map(|s| Box::new(self.bind_statement(s, ctx)));
                StmtKind::If {
                    cond,
                    then_stmt: Box::new(then_stmt),
                    else_stmt,
                }
            }
            SyntaxKind::CaseStatement => {
                let mut nodes = syntax.nodes();
                let expr = match nodes.next() {
                    Some(e) => self.bind_expression(e, ctx),
                    None => return Statement { kind: StmtKind::Invalid, range },
                };
                let mut items = Vec::new();
                let mut default = None;
                for item in syntax.child_nodes(SyntaxKind::CaseItem) {
                    let inner: Vec<&SyntaxNode> = item.nodes().collect();
                    let Some((stmt_syntax, exprs)) = inner.split_last() else {
                        continue;
                    };
                    let stmt = self.bind_statement(stmt_syntax, ctx);
                    if item.child_token(TokenKind::KwDefault).is_some() {
                        default = Some(Box::new(stmt));
                    } else {
                        let exprs = exprs
                            .iter()
                            .map(|e| self.bind_expression(e, ctx))
                            .collect();
                        items.push(CaseItem { exprs, stmt });
                    }
                }
                StmtKind::Case { expr, items, default }
            }
            SyntaxKind::ForLoopStatement => return self.bind_for(syntax, ctx),
            SyntaxKind::WhileStatement => {
                let mut nodes = syntax.nodes();
                let cond = match nodes.next() {
                    Some(c) => self.bind_expression(c, ctx),
                    None => return Statement { kind: StmtKind::Invalid, range },
                };
                let body = match nodes.next() {
                    Some(s) => self.bind_statement(s, ctx),
                    None => Statement { kind: StmtKind::Empty, range },
                };
                StmtKind::While { cond, body: Box::new(body) }
            }
            SyntaxKind::DoWhileStatement => {
                let mut nodes = syntax.nodes();
                let body = match nodes.next() {
                    Some(s) => self.bind_statement(s, ctx),
                    None => Statement { kind: StmtKind::Empty, range },
                };
                let cond = match nodes.next() {
                    Some(c) => self.bind_expression(c, ctx),
                    None => return Statement { kind: StmtKind::Invalid, range },
                };
                StmtKind::DoWhile { cond, body: Box::new(body) }
            }
            SyntaxKind::RepeatStatement => {
                let mut nodes = syntax.nodes();
                let count = match nodes.next() {
                    Some(c) => self.bind_expression(c, ctx),
                    None => return Statement { kind: StmtKind::Invalid, range },
                };
                let body = match nodes.next() {
                    Some(s) => self.bind_statement(s, ctx),
                    None => Statement { kind: StmtKind::Empty, range },
                };
                StmtKind::Repeat { count, body: Box::new(body) }
            }
            SyntaxKind::ForeverStatement => {
                let body = match syntax.nodes().next() {
                    Some(s) => self.bind_statement(s, ctx),
                    None => Statement { kind: StmtKind::Empty, range },
                };
                StmtKind::Forever { body: Box::new(body) }
            }
            SyntaxKind::ReturnStatement => {
                let expr = syntax.nodes().next().map(|e| self.bind_expression(e, ctx));
                StmtKind::Return(expr)
            }
            SyntaxKind::BreakStatement => StmtKind::Break,
            SyntaxKind::ContinueStatement => StmtKind::Continue,
            SyntaxKind::ImmediateAssertionStatement => {
                // Assertions are not executed during constant evaluation;
                // the condition still binds for type checking.
                if let Some(c) = syntax.nodes().next() {
                    let _ = self.bind_expression(c, ctx);
                }
                StmtKind::Empty
            }
            _ => StmtKind::Invalid,
        };
        Statement { kind, range }
    }

    /// A local variable declaration: mint the symbols into the current
    /// scope (so later statements can see them) and produce a VarDecl
    /// statement per declarator carrying the bound initializer.
    fn bind_local_declaration(&self, syntax: &SyntaxNode, ctx: &BindContext) -> Statement {
        let range = syntax.range();
        let ty_syntax = syntax.nodes().find(|n| is_type_syntax(n.kind)).cloned();
        let is_const = syntax.child_token(TokenKind::KwConst).is_some();

        let mut decls = Vec::new();
        for declarator in syntax.child_nodes(SyntaxKind::Declarator) {
            let (name, loc) = declarator
                .name_token()
                .map(|t| (t.text.clone(), t.loc))
                .unwrap_or_default();
            let id = self.insert_symbol(
                &name,
                loc,
                ctx.scope,
                SymbolKind::Variable {
                    ty: OnceCell::new(),
                    ty_syntax: ty_syntax.clone(),
                    declarator: declarator.clone(),
                    is_const,
                },
            );
            let var_ty = self.symbol_type(id);
            let initializer = declarator
                .child_node(SyntaxKind::EqualsInitializer)
                .and_then(|n| n.nodes().next())
                .map(|init| {
                    let bound = self.bind_expression(init, ctx);
                    self.convert_assignment(bound, var_ty)
                });
            decls.push(Statement {
                kind: StmtKind::VarDecl {
                    symbol: id,
                    initializer,
                },
                range,
            });
        }

        if decls.len() == 1 {
            decls.into_iter().next().unwrap()
        } else {
            Statement {
                kind: StmtKind::Block(decls),
                range,
            }
        }
    }

    fn bind_for(&self, syntax: &SyntaxNode, ctx: &BindContext) -> Statement {
        let range = syntax.range();
        let nodes: Vec<&SyntaxNode> = syntax.nodes().collect();
        let Some((body_syntax, header)) = nodes.split_last() else {
            return Statement { kind: StmtKind::Invalid, range };
        };

        // Header layout: [decl | init exprs...], cond?, steps...; the
        // parser kept the semicolon positions, so classify by shape: the
        // first entries up to the condition are initializers.
        let mut init = Vec::new();
        let mut cond = None;
        let mut steps = Vec::new();

        // A declaration initializer is a VariableDeclaration node; the
        // remaining nodes in order are condition then step expressions.
        let mut rest = header;
        if let Some(first) = rest.first() {
            if first.kind == SyntaxKind::VariableDeclaration {
                init.push(self.bind_statement(first, ctx));
                rest = &rest[1..];
            } else if matches!(
                first.kind,
                SyntaxKind::AssignmentExpression | SyntaxKind::BinaryExpression
            ) && rest.len() >= 2
            {
                init.push(Statement {
                    kind: StmtKind::Expr(self.bind_expression(first, ctx)),
                    range,
                });
                rest = &rest[1..];
            }
        }
        if let Some((first, tail)) = rest.split_first() {
            cond = Some(self.bind_expression(first, ctx));
            for step in tail {
                steps.push(self.bind_expression(step, ctx));
            }
        }

        let body = self.bind_statement(body_syntax, ctx);
        Statement {
            kind: StmtKind::For {
                init,
                cond,
                steps,
                body: Box::new(body),
            },
            range,
        }
    }
}
