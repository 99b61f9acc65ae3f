// src/session.rs
//
// A REPL-style scripting session: each textual input is parsed either as
// declarations (a compilation unit fragment) or as an expression, and
// elaborated against the cumulative scope. Variable declarations execute
// their initializers into a persistent global frame, so later expressions
// see earlier state.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use sylva_numeric::{ConstantValue, SVInt};
use sylva_sema::binder::BindContext;
use sylva_sema::symbols::{SymbolId, SymbolKind};
use sylva_sema::{Compilation, EvalContext};
use sylva_syntax::{Lexer, SyntaxTree, TokenKind};
use sylva_text::{SourceLocation, SourceManager};

use crate::Options;

pub struct ScriptSession {
    source_manager: Arc<SourceManager>,
    compilation: Compilation,
    options: Options,
    globals: FxHashMap<SymbolId, ConstantValue>,
}

impl Default for ScriptSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptSession {
    pub fn new() -> ScriptSession {
        Self::with_options(Options::default())
    }

    pub fn with_options(mut options: Options) -> ScriptSession {
        // Hierarchical references like `a0.LP` are the point of a
        // scripting session, so the constant-context restriction lifts.
        options.compile.allow_hierarchical_in_const = true;

        let source_manager = Arc::new(SourceManager::new());
        for dir in &options.include_dirs_user {
            source_manager.add_user_directory(dir.clone());
        }
        for dir in &options.include_dirs_system {
            source_manager.add_system_directory(dir.clone());
        }

        ScriptSession {
            source_manager,
            compilation: Compilation::new(options.compile.clone()),
            options,
            globals: FxHashMap::default(),
        }
    }

    pub fn compilation(&self) -> &Compilation {
        &self.compilation
    }

    pub fn source_manager(&self) -> &Arc<SourceManager> {
        &self.source_manager
    }

    /// Evaluates one input. Declarations elaborate into the cumulative
    /// scope and yield a placeholder true value; expressions bind against
    /// it and evaluate to their constant result.
    pub fn eval(&mut self, text: &str) -> ConstantValue {
        if self.looks_like_declaration(text) {
            self.eval_declaration(text)
        } else {
            self.eval_expression(text)
        }
    }

    /// Classifies an input by its first tokens: declaration keywords and
    /// `name name` / `name #(` shapes start declarations, everything else
    /// is an expression.
    fn looks_like_declaration(&self, text: &str) -> bool {
        let scratch = SourceManager::new();
        let buffer = scratch.assign_text("", text, SourceLocation::NONE);
        let mut lexer = Lexer::new(buffer, self.options.parse.language_version);
        let first = lexer.next_token();
        let second = lexer.next_token();

        match first.kind {
            TokenKind::KwModule
            | TokenKind::KwInterface
            | TokenKind::KwProgram
            | TokenKind::KwPackage
            | TokenKind::KwClass
            | TokenKind::KwVirtual
            | TokenKind::KwFunction
            | TokenKind::KwTask
            | TokenKind::KwTypedef
            | TokenKind::KwParameter
            | TokenKind::KwLocalparam
            | TokenKind::KwImport
            | TokenKind::KwGenvar
            | TokenKind::KwConst
            | TokenKind::KwVar
            | TokenKind::KwStruct
            | TokenKind::KwUnion
            | TokenKind::KwEnum
            | TokenKind::KwReal
            | TokenKind::KwShortreal
            | TokenKind::KwRealtime
            | TokenKind::KwString
            | TokenKind::KwEvent
            | TokenKind::KwChandle => true,
            kind if kind.is_integral_type_keyword() => true,
            kind if kind.is_net_type_keyword() => true,
            TokenKind::Identifier => {
                matches!(second.kind, TokenKind::Identifier | TokenKind::Hash)
            }
            _ => false,
        }
    }

    fn eval_declaration(&mut self, text: &str) -> ConstantValue {
        let before = self
            .compilation
            .scope_members(self.compilation.unit_scope())
            .len();

        let tree = SyntaxTree::from_text(
            text,
            self.source_manager.clone(),
            self.options.parse.clone(),
        );
        self.compilation.add_syntax_tree(&tree);

        // Run the initializers of any new unit-scope variables so later
        // expressions observe their values.
        let members = self.compilation.scope_members(self.compilation.unit_scope());
        for &id in &members[before..] {
            let sym = self.compilation.symbol(id);
            let SymbolKind::Variable { declarator, .. } = &sym.kind else {
                continue;
            };
            let var_ty = self.compilation.symbol_type(id);
            let init = declarator
                .child_node(sylva_syntax::SyntaxKind::EqualsInitializer)
                .and_then(|n| n.nodes().next())
                .cloned();
            let value = match init {
                Some(init) => {
                    let ctx = BindContext::at_index(self.compilation.unit_scope(), sym.index);
                    let bound = self.compilation.bind_expression(&init, &ctx);
                    let converted = self.compilation.convert_assignment(bound, var_ty);
                    let mut eval =
                        EvalContext::with_globals(&self.compilation, &mut self.globals);
                    eval.eval(&converted)
                }
                None => {
                    let mut eval =
                        EvalContext::with_globals(&self.compilation, &mut self.globals);
                    eval.default_value(var_ty)
                }
            };
            self.globals.insert(id, value);
        }

        // Declarations have no value of their own; report success as a
        // known true bit so callers can check them.
        ConstantValue::Int(SVInt::new(1, false, 1))
    }

    fn eval_expression(&mut self, text: &str) -> ConstantValue {
        let (node, diags) = SyntaxTree::expression_from_text(
            text,
            self.source_manager.clone(),
            self.options.parse.clone(),
        );
        for d in diags.iter() {
            self.compilation.add_diagnostic(d.clone());
        }

        let ctx = BindContext::new(self.compilation.unit_scope());
        let bound = self.compilation.bind_expression(&node, &ctx);
        let mut eval = EvalContext::with_globals(&self.compilation, &mut self.globals);
        eval.eval(&bound)
    }

    /// All diagnostics accumulated so far, in insertion order.
    pub fn diagnostics(&self) -> Vec<sylva_text::Diagnostic> {
        self.compilation.diagnostics().iter().cloned().collect()
    }
}
