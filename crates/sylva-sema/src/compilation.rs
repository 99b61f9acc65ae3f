// src/compilation.rs
//
// The root container: owns the symbol store, scope table, type arena, and
// diagnostics for one compilation, and drives two-phase elaboration —
// eager scope population per design element, lazy memoized resolution of
// everything a symbol knows about itself (types, values, bodies, base
// classes). Cycles are broken by an in-progress set: re-entering a symbol
// mid-elaboration reports a recursive definition and yields the error
// type or value.
//
// Not thread safe by design: one compilation is a single-threaded world
// of RefCell/OnceCell memoization. Separate compilations may run on
// separate threads and share a SourceManager.

use std::cell::{OnceCell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use sylva_syntax::cst::{SyntaxKind, SyntaxNode};
use sylva_syntax::{SyntaxTree, TokenKind};
use sylva_text::{Diagnostic, Diagnostics, SourceLocation, SourceManager, SourceRange};

use crate::binder::BindContext;
use crate::errors::SemanticError;
use crate::eval::EvalContext;
use crate::options::CompilationOptions;
use crate::symbols::{
    DefinitionKind, MethodFlags, ScopeData, ScopeId, Symbol, SymbolId, SymbolKind, SymbolRef,
};
use crate::types::{BuiltinTypes, Type, TypeArena, TypeId};

pub struct Compilation {
    pub(crate) options: CompilationOptions,
    pub(crate) source_manager: RefCell<Option<Arc<SourceManager>>>,
    pub(crate) symbols: RefCell<Vec<SymbolRef>>,
    pub(crate) scopes: RefCell<Vec<ScopeData>>,
    pub(crate) types: RefCell<TypeArena>,
    pub(crate) diagnostics: RefCell<Diagnostics>,
    /// `(class name, method name) -> definition syntax` from the parser.
    pub(crate) out_of_block: RefCell<FxHashMap<(String, String), SyntaxNode>>,
    /// Symbols currently elaborating; used to break cycles.
    pub(crate) elaborating: RefCell<FxHashSet<SymbolId>>,
    root_symbol: SymbolId,
    unit_symbol: SymbolId,
    unit_scope: ScopeId,
}

impl Compilation {
    pub fn new(options: CompilationOptions) -> Compilation {
        let comp = Compilation {
            options,
            source_manager: RefCell::new(None),
            symbols: RefCell::new(Vec::new()),
            scopes: RefCell::new(Vec::new()),
            types: RefCell::new(TypeArena::new()),
            diagnostics: RefCell::new(Diagnostics::new()),
            out_of_block: RefCell::new(FxHashMap::default()),
            elaborating: RefCell::new(FxHashSet::default()),
            root_symbol: SymbolId::from_raw(0),
            unit_symbol: SymbolId::from_raw(0),
            unit_scope: ScopeId::from_raw(0),
        };

        // Root symbol and the single compilation-unit scope. All added
        // syntax trees contribute members to the same unit, so scripting
        // sessions accumulate declarations naturally.
        let mut comp = comp;
        let root_scope = comp.alloc_scope(None, None);
        let root = comp.alloc_symbol_raw("$root", SourceLocation::NONE, None, SymbolKind::Root);
        comp.root_symbol = root;
        let unit_scope = comp.alloc_scope(None, Some(root_scope));
        let unit = comp.alloc_symbol_raw(
            "$unit",
            SourceLocation::NONE,
            Some(root_scope),
            SymbolKind::CompilationUnit { scope: unit_scope },
        );
        comp.unit_symbol = unit;
        comp.unit_scope = unit_scope;
        comp
    }

    pub fn options(&self) -> &CompilationOptions {
        &self.options
    }

    pub fn root(&self) -> SymbolId {
        self.root_symbol
    }

    /// The symbol for the shared compilation unit (`$unit`).
    pub fn unit(&self) -> SymbolId {
        self.unit_symbol
    }

    pub fn unit_scope(&self) -> ScopeId {
        self.unit_scope
    }

    pub fn source_manager(&self) -> Option<Arc<SourceManager>> {
        self.source_manager.borrow().clone()
    }

    pub fn builtins(&self) -> BuiltinTypes {
        *self.types.borrow().builtins()
    }

    /// Human-readable name of a type, for diagnostics and serialization.
    pub fn type_display(&self, ty: TypeId) -> String {
        self.types.borrow().display(ty)
    }

    /// Adds a parsed tree: its diagnostics fold in, its out-of-block
    /// definitions register, and its members populate the unit scope.
    pub fn add_syntax_tree(&self, tree: &SyntaxTree) {
        {
            let mut sm = self.source_manager.borrow_mut();
            if sm.is_none() {
                *sm = Some(tree.source_manager().clone());
            }
        }
        {
            let mut diags = self.diagnostics.borrow_mut();
            for d in tree.diagnostics().iter() {
                diags.add(d.clone());
            }
        }
        for def in tree.out_of_block_defs() {
            self.out_of_block.borrow_mut().insert(
                (def.class_name.clone(), def.member_name.clone()),
                def.syntax.clone(),
            );
        }

        let root = tree.root().clone();
        for member in root.nodes() {
            self.populate_member(self.unit_scope, member);
        }
    }

    // ----- diagnostics ----------------------------------------------------

    pub(crate) fn error(&self, error: SemanticError, range: SourceRange) {
        self.diagnostics.borrow_mut().add(Diagnostic::new(&error, range));
    }

    pub fn diagnostics(&self) -> std::cell::Ref<'_, Diagnostics> {
        self.diagnostics.borrow()
    }

    pub fn add_diagnostic(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().add(diagnostic);
    }

    pub fn take_diagnostics(&self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics.borrow_mut())
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.borrow().has_errors()
    }

    // ----- storage primitives ---------------------------------------------

    pub(crate) fn alloc_scope(&self, owner: Option<SymbolId>, parent: Option<ScopeId>) -> ScopeId {
        let mut scopes = self.scopes.borrow_mut();
        let id = ScopeId::from_raw(scopes.len() as u32);
        scopes.push(ScopeData::new(owner, parent));
        id
    }

    fn alloc_symbol_raw(
        &self,
        name: &str,
        loc: SourceLocation,
        parent: Option<ScopeId>,
        kind: SymbolKind,
    ) -> SymbolId {
        let mut symbols = self.symbols.borrow_mut();
        let id = SymbolId::from_raw(symbols.len() as u32);

        let index = match parent {
            Some(scope) => {
                let mut scopes = self.scopes.borrow_mut();
                let data = &mut scopes[scope.index() as usize];
                let index = data.members.len() as u32;
                data.members.push(id);
                if !name.is_empty() {
                    data.name_map.entry(name.to_string()).or_insert(id);
                }
                index
            }
            None => 0,
        };

        symbols.push(Rc::new(Symbol {
            id,
            name: name.to_string(),
            loc,
            parent,
            index,
            kind,
        }));
        id
    }

    /// Inserts a named symbol, diagnosing duplicate names in one scope.
    pub(crate) fn insert_symbol(
        &self,
        name: &str,
        loc: SourceLocation,
        scope: ScopeId,
        kind: SymbolKind,
    ) -> SymbolId {
        let duplicate = !name.is_empty()
            && self.with_scope(scope, |data| data.name_map.contains_key(name));
        if duplicate {
            self.error(
                SemanticError::Redefinition { name: name.to_string() },
                SourceRange::at(loc),
            );
        }
        self.alloc_symbol_raw(name, loc, Some(scope), kind)
    }

    pub fn symbol(&self, id: SymbolId) -> SymbolRef {
        self.symbols.borrow()[id.index() as usize].clone()
    }

    pub(crate) fn with_scope<R>(&self, id: ScopeId, f: impl FnOnce(&ScopeData) -> R) -> R {
        let scopes = self.scopes.borrow();
        f(&scopes[id.index() as usize])
    }

    pub(crate) fn with_scope_mut<R>(&self, id: ScopeId, f: impl FnOnce(&mut ScopeData) -> R) -> R {
        let mut scopes = self.scopes.borrow_mut();
        f(&mut scopes[id.index() as usize])
    }

    pub fn scope_members(&self, id: ScopeId) -> Vec<SymbolId> {
        self.with_scope(id, |data| data.members.clone())
    }

    /// Runs `f` with `id` marked in-progress; a re-entrant request is a
    /// recursive definition and produces `on_cycle` instead.
    pub(crate) fn guard_cycle<R>(
        &self,
        id: SymbolId,
        on_cycle: impl FnOnce(&Self) -> R,
        f: impl FnOnce(&Self) -> R,
    ) -> R {
        if !self.elaborating.borrow_mut().insert(id) {
            let sym = self.symbol(id);
            self.error(
                SemanticError::RecursiveDefinition { name: sym.name.clone() },
                SourceRange::at(sym.loc),
            );
            return on_cycle(self);
        }
        let out = f(self);
        self.elaborating.borrow_mut().remove(&id);
        out
    }

    // ----- scope population -----------------------------------------------

    pub(crate) fn populate_member(&self, scope: ScopeId, member: &SyntaxNode) {
        match member.kind {
            SyntaxKind::ModuleDeclaration => {
                self.add_definition(scope, member, DefinitionKind::Module)
            }
            SyntaxKind::InterfaceDeclaration => {
                self.add_definition(scope, member, DefinitionKind::Interface)
            }
            SyntaxKind::ProgramDeclaration => {
                self.add_definition(scope, member, DefinitionKind::Program)
            }
            SyntaxKind::PackageDeclaration => {
                let header = member.child_node(SyntaxKind::ModuleHeader);
                let (name, loc) = header
                    .and_then(|h| h.name_token())
                    .map(|t| (t.text.clone(), t.loc))
                    .unwrap_or_default();
                self.insert_symbol(
                    &name,
                    loc,
                    scope,
                    SymbolKind::Package {
                        scope: OnceCell::new(),
                        syntax: member.clone(),
                    },
                );
            }
            SyntaxKind::ClassDeclaration => {
                let (name, loc) = member
                    .name_token()
                    .map(|t| (t.text.clone(), t.loc))
                    .unwrap_or_default();
                let is_virtual = member.child_token(TokenKind::KwVirtual).is_some();
                let is_interface = member.child_token(TokenKind::KwInterface).is_some();
                self.insert_symbol(
                    &name,
                    loc,
                    scope,
                    SymbolKind::Class {
                        scope: OnceCell::new(),
                        base: OnceCell::new(),
                        is_virtual,
                        is_interface,
                        syntax: member.clone(),
                    },
                );
            }
            SyntaxKind::TypedefDeclaration => {
                let ty_syntax = member.nodes().find(|n| is_type_syntax(n.kind)).cloned();
                if let Some(declarator) = member.child_node(SyntaxKind::Declarator) {
                    let (name, loc) = declarator
                        .name_token()
                        .map(|t| (t.text.clone(), t.loc))
                        .unwrap_or_default();
                    let is_enum = matches!(
                        ty_syntax.as_ref().map(|t| t.kind),
                        Some(SyntaxKind::EnumType)
                    );
                    let id = self.insert_symbol(
                        &name,
                        loc,
                        scope,
                        SymbolKind::Typedef {
                            ty: OnceCell::new(),
                            ty_syntax,
                            declarator: declarator.clone(),
                        },
                    );
                    // Enum member symbols belong to the enclosing scope,
                    // so an enum typedef resolves eagerly to mint them.
                    if is_enum {
                        let _ = self.symbol_type(id);
                    }
                }
            }
            SyntaxKind::ParameterDeclaration | SyntaxKind::SpecparamDeclaration => {
                self.add_parameters(scope, member, None);
            }
            SyntaxKind::VariableDeclaration => {
                self.add_variables(scope, member, member.child_token(TokenKind::KwConst).is_some());
            }
            SyntaxKind::NetDeclaration => {
                let ty_syntax = member.nodes().find(|n| is_type_syntax(n.kind)).cloned();
                for declarator in member.child_nodes(SyntaxKind::Declarator) {
                    let (name, loc) = declarator
                        .name_token()
                        .map(|t| (t.text.clone(), t.loc))
                        .unwrap_or_default();
                    self.insert_symbol(
                        &name,
                        loc,
                        scope,
                        SymbolKind::Net {
                            ty: OnceCell::new(),
                            ty_syntax: ty_syntax.clone(),
                            declarator: declarator.clone(),
                        },
                    );
                }
            }
            SyntaxKind::FunctionDeclaration | SyntaxKind::TaskDeclaration => {
                self.add_subroutine(scope, member, MethodFlags::default());
            }
            SyntaxKind::FunctionPrototype => {
                self.add_prototype(scope, member, MethodFlags::default());
            }
            SyntaxKind::ClassMethod => {
                let flags = method_flags_from_tokens(member);
                if let Some(inner) = member.nodes().next() {
                    match inner.kind {
                        SyntaxKind::FunctionPrototype => self.add_prototype(scope, inner, flags),
                        _ => self.add_subroutine(scope, inner, flags),
                    }
                }
            }
            SyntaxKind::ClassProperty => {
                let is_const = member.child_token(TokenKind::KwConst).is_some();
                if let Some(inner) = member
                    .nodes()
                    .find(|n| n.kind == SyntaxKind::VariableDeclaration)
                {
                    self.add_variables(scope, inner, is_const);
                }
            }
            SyntaxKind::HierarchyInstantiation => {
                let def_name = member
                    .tokens()
                    .find(|t| t.kind == TokenKind::Identifier)
                    .map(|t| t.text.clone())
                    .unwrap_or_default();
                let param_assignment = member
                    .child_node(SyntaxKind::ParameterValueAssignment)
                    .cloned();
                for inst in member.child_nodes(SyntaxKind::HierarchicalInstance) {
                    let (name, loc) = inst
                        .name_token()
                        .map(|t| (t.text.clone(), t.loc))
                        .unwrap_or_default();
                    self.insert_symbol(
                        &name,
                        loc,
                        scope,
                        SymbolKind::Instance {
                            definition_name: def_name.clone(),
                            definition: OnceCell::new(),
                            body: OnceCell::new(),
                            param_assignment: param_assignment.clone(),
                            param_scope: scope,
                        },
                    );
                }
            }
            SyntaxKind::ImportDeclaration => {
                for item in member.child_nodes(SyntaxKind::PackageImportItem) {
                    let mut idents = item.tokens().filter(|t| t.kind == TokenKind::Identifier);
                    let pkg = idents.next().map(|t| t.text.clone()).unwrap_or_default();
                    let target = idents.next().map(|t| t.text.clone());
                    let wildcard = item.child_token(TokenKind::Star).is_some();
                    self.with_scope_mut(scope, |data| {
                        if wildcard {
                            data.wildcard_imports.push(pkg.clone());
                        } else if let Some(target) = target {
                            data.explicit_imports.insert(target, pkg.clone());
                        }
                    });
                }
            }
            SyntaxKind::GenvarDeclaration => {
                for tok in member.tokens().filter(|t| t.kind == TokenKind::Identifier) {
                    self.insert_symbol(&tok.text, tok.loc, scope, SymbolKind::Genvar);
                }
            }
            SyntaxKind::ModportDeclaration => {
                for item in member.child_nodes(SyntaxKind::ModportItem) {
                    let (name, loc) = item
                        .name_token()
                        .map(|t| (t.text.clone(), t.loc))
                        .unwrap_or_default();
                    self.insert_symbol(
                        &name,
                        loc,
                        scope,
                        SymbolKind::Modport { syntax: item.clone() },
                    );
                }
            }
            SyntaxKind::GenerateRegion => {
                // A generate region is transparent: members land in the
                // enclosing scope.
                for inner in member.nodes() {
                    self.populate_member(scope, inner);
                }
            }
            SyntaxKind::IfGenerate | SyntaxKind::CaseGenerate | SyntaxKind::LoopGenerate => {
                let name = generate_block_label(member).unwrap_or_else(|| "genblk".to_string());
                let loc = member
                    .first_token()
                    .map(|t| t.loc)
                    .unwrap_or(SourceLocation::NONE);
                self.insert_symbol(
                    &name,
                    loc,
                    scope,
                    SymbolKind::GenerateBlock {
                        scope: OnceCell::new(),
                        syntax: member.clone(),
                    },
                );
            }
            // Procedural code, assignments, and the constructs we only
            // check syntactically contribute no scope members.
            _ => {}
        }
    }

    fn add_definition(&self, scope: ScopeId, member: &SyntaxNode, kind: DefinitionKind) {
        let header = member.child_node(SyntaxKind::ModuleHeader);
        let (name, loc) = header
            .and_then(|h| h.name_token())
            .map(|t| (t.text.clone(), t.loc))
            .unwrap_or_default();
        self.insert_symbol(
            &name,
            loc,
            scope,
            SymbolKind::Definition {
                kind,
                syntax: member.clone(),
            },
        );
    }

    pub(crate) fn add_parameters(
        &self,
        scope: ScopeId,
        decl: &SyntaxNode,
        override_for: Option<&FxHashMap<String, (SyntaxNode, ScopeId)>>,
    ) {
        let is_local = decl
            .tokens()
            .next()
            .map(|t| t.kind == TokenKind::KwLocalparam)
            .unwrap_or(false);
        let ty_syntax = decl.nodes().find(|n| is_type_syntax(n.kind)).cloned();
        for declarator in decl.child_nodes(SyntaxKind::Declarator) {
            let (name, loc) = declarator
                .name_token()
                .map(|t| (t.text.clone(), t.loc))
                .unwrap_or_default();
            let override_expr = if is_local {
                None
            } else {
                override_for.and_then(|m| m.get(&name)).cloned()
            };
            self.insert_symbol(
                &name,
                loc,
                scope,
                SymbolKind::Parameter {
                    is_local,
                    ty: OnceCell::new(),
                    value: OnceCell::new(),
                    ty_syntax: ty_syntax.clone(),
                    declarator: declarator.clone(),
                    override_expr,
                },
            );
        }
    }

    fn add_variables(&self, scope: ScopeId, decl: &SyntaxNode, is_const: bool) {
        let ty_syntax = decl.nodes().find(|n| is_type_syntax(n.kind)).cloned();
        let is_enum = matches!(ty_syntax.as_ref().map(|t| t.kind), Some(SyntaxKind::EnumType));
        for declarator in decl.child_nodes(SyntaxKind::Declarator) {
            let (name, loc) = declarator
                .name_token()
                .map(|t| (t.text.clone(), t.loc))
                .unwrap_or_default();
            let id = self.insert_symbol(
                &name,
                loc,
                scope,
                SymbolKind::Variable {
                    ty: OnceCell::new(),
                    ty_syntax: ty_syntax.clone(),
                    declarator: declarator.clone(),
                    is_const,
                },
            );
            if is_enum {
                let _ = self.symbol_type(id);
            }
        }
    }

    fn add_subroutine(&self, scope: ScopeId, syntax: &SyntaxNode, flags: MethodFlags) {
        let Some(name_node) = syntax.child_node(SyntaxKind::ScopedName) else {
            return;
        };
        let idents: Vec<_> = name_node
            .tokens()
            .filter(|t| t.kind == TokenKind::Identifier)
            .collect();
        if idents.len() != 1 {
            // Out-of-block definitions were captured in the registry at
            // parse time; they do not declare a symbol here.
            return;
        }
        let name = idents[0].text.clone();
        let loc = idents[0].loc;
        let is_task = syntax.kind == SyntaxKind::TaskDeclaration;
        self.insert_symbol(
            &name,
            loc,
            scope,
            SymbolKind::Subroutine {
                is_task,
                flags,
                return_type: OnceCell::new(),
                args: OnceCell::new(),
                body: OnceCell::new(),
                scope: OnceCell::new(),
                syntax: syntax.clone(),
            },
        );
    }

    fn add_prototype(&self, scope: ScopeId, syntax: &SyntaxNode, flags: MethodFlags) {
        let Some(name_node) = syntax.child_node(SyntaxKind::ScopedName) else {
            return;
        };
        let Some(name_tok) = name_node.name_token() else {
            return;
        };
        self.insert_symbol(
            &name_tok.text.clone(),
            name_tok.loc,
            scope,
            SymbolKind::MethodPrototype {
                flags,
                subroutine: OnceCell::new(),
                syntax: syntax.clone(),
            },
        );
    }

    // ----- lookup ---------------------------------------------------------

    /// Unqualified lookup per the visibility rules: in the starting scope
    /// a member is visible only at or before the lookup index; enclosing
    /// scopes are fully visible; package imports fill in last.
    pub(crate) fn lookup_unqualified(&self, ctx: &BindContext, name: &str) -> Option<SymbolId> {
        if ctx.flags.disable_lookup {
            return None;
        }
        let mut scope = Some(ctx.scope);
        let mut bound = Some(ctx.lookup_index);
        while let Some(id) = scope {
            let found = self.with_scope(id, |data| data.name_map.get(name).copied());
            if let Some(sym_id) = found {
                let visible = match bound {
                    Some(limit) => {
                        let sym = self.symbol(sym_id);
                        sym.index <= limit
                    }
                    None => true,
                };
                if visible {
                    return Some(sym_id);
                }
            }

            // Explicit imports, then wildcard imports.
            let explicit = self.with_scope(id, |data| data.explicit_imports.get(name).cloned());
            if let Some(pkg) = explicit {
                if let Some(found) = self.lookup_in_package(&pkg, name) {
                    return Some(found);
                }
            }
            let wildcards = self.with_scope(id, |data| data.wildcard_imports.clone());
            for pkg in wildcards {
                if let Some(found) = self.lookup_in_package(&pkg, name) {
                    return Some(found);
                }
            }

            scope = self.with_scope(id, |data| data.parent);
            bound = None;
        }
        None
    }

    fn lookup_in_package(&self, pkg: &str, name: &str) -> Option<SymbolId> {
        let pkg_id = self.find_package(pkg)?;
        let scope = self.package_scope(pkg_id)?;
        self.with_scope(scope, |data| data.name_map.get(name).copied())
    }

    pub(crate) fn find_package(&self, name: &str) -> Option<SymbolId> {
        let found = self.with_scope(self.unit_scope, |data| data.name_map.get(name).copied())?;
        match &self.symbol(found).kind {
            SymbolKind::Package { .. } => Some(found),
            _ => None,
        }
    }

    /// Finds a module/interface/program definition visible from a scope.
    pub(crate) fn find_definition(&self, name: &str, from: ScopeId) -> Option<SymbolId> {
        let mut scope = Some(from);
        while let Some(id) = scope {
            let found = self.with_scope(id, |data| data.name_map.get(name).copied());
            if let Some(sym_id) = found {
                if matches!(self.symbol(sym_id).kind, SymbolKind::Definition { .. }) {
                    return Some(sym_id);
                }
            }
            scope = self.with_scope(id, |data| data.parent);
        }
        None
    }

    /// `pkg::name`, `ClassName::name`, or `$unit::name`.
    pub(crate) fn lookup_scoped(
        &self,
        ctx: &BindContext,
        first: &str,
        rest: &[String],
    ) -> Option<SymbolId> {
        let mut scope = if first == "$unit" {
            self.unit_scope
        } else if let Some(pkg) = self.find_package(first) {
            self.package_scope(pkg)?
        } else {
            let class = self.lookup_unqualified(ctx, first)?;
            match &self.symbol(class).kind {
                SymbolKind::Class { .. } => self.class_scope(class)?,
                _ => return None,
            }
        };

        let mut current = None;
        for (i, part) in rest.iter().enumerate() {
            let found = self.with_scope(scope, |data| data.name_map.get(part).copied())?;
            current = Some(found);
            if i + 1 < rest.len() {
                scope = self.symbol_scope(found)?;
            }
        }
        current
    }

    /// The inner scope of a scope-owning symbol, elaborating on demand.
    pub fn symbol_scope(&self, id: SymbolId) -> Option<ScopeId> {
        let sym = self.symbol(id);
        match &sym.kind {
            SymbolKind::CompilationUnit { scope } => Some(*scope),
            SymbolKind::Package { .. } => self.package_scope(id),
            SymbolKind::Class { .. } => self.class_scope(id),
            SymbolKind::Instance { .. } => self.instance_body(id),
            SymbolKind::GenerateBlock { .. } => self.generate_scope(id),
            SymbolKind::Subroutine { .. } => Some(self.subroutine_scope(id)),
            _ => None,
        }
    }

    // ----- lazy elaboration of scope-owning symbols -----------------------

    pub(crate) fn package_scope(&self, id: SymbolId) -> Option<ScopeId> {
        let sym = self.symbol(id);
        let SymbolKind::Package { scope, syntax } = &sym.kind else {
            return None;
        };
        if let Some(s) = scope.get() {
            return Some(*s);
        }
        let new_scope = self.alloc_scope(Some(id), sym.parent);
        let _ = scope.set(new_scope);
        let syntax = syntax.clone();
        for member in syntax.nodes() {
            if member.kind == SyntaxKind::ModuleHeader {
                continue;
            }
            self.populate_member(new_scope, member);
        }
        Some(new_scope)
    }

    /// The elaborated body of an instance: parameters first (with override
    /// expressions bound at the instantiation site), then the definition's
    /// members.
    pub(crate) fn instance_body(&self, id: SymbolId) -> Option<ScopeId> {
        let sym = self.symbol(id);
        let SymbolKind::Instance {
            definition_name,
            definition,
            body,
            param_assignment,
            param_scope,
        } = &sym.kind
        else {
            return None;
        };
        if let Some(b) = body.get() {
            return *b;
        }

        let def_id = *definition.get_or_init(|| {
            let found = self.find_definition(definition_name, *param_scope);
            if found.is_none() {
                self.error(
                    SemanticError::UnknownDefinition {
                        name: definition_name.clone(),
                    },
                    SourceRange::at(sym.loc),
                );
            }
            found
        });
        let Some(def_id) = def_id else {
            let _ = body.set(None);
            return None;
        };

        let out = self.guard_cycle(
            id,
            |_| None,
            |comp| {
                let def = comp.symbol(def_id);
                let SymbolKind::Definition { syntax, .. } = &def.kind else {
                    return None;
                };
                let scope = comp.alloc_scope(Some(id), def.parent);

                let syntax = syntax.clone();
                let header = syntax.child_node(SyntaxKind::ModuleHeader);
                if let Some(header) = header {
                    // Match up parameter overrides by name or position.
                    let overrides =
                        collect_param_overrides(header, param_assignment.as_ref(), *param_scope);
                    if let Some(ppl) = header.child_node(SyntaxKind::ParameterPortList) {
                        for decl in ppl.child_nodes(SyntaxKind::ParameterDeclaration) {
                            comp.add_parameters(scope, decl, Some(&overrides));
                        }
                    }
                    if let Some(ports) = header.child_node(SyntaxKind::PortList) {
                        for port in ports.child_nodes(SyntaxKind::PortDeclaration) {
                            comp.add_port(scope, port);
                        }
                    }
                }
                for member in syntax.nodes() {
                    if member.kind == SyntaxKind::ModuleHeader {
                        continue;
                    }
                    comp.populate_member(scope, member);
                }
                Some(scope)
            },
        );
        let _ = body.set(out);
        out
    }

    fn add_port(&self, scope: ScopeId, port: &SyntaxNode) {
        let ty_syntax = port.nodes().find(|n| is_type_syntax(n.kind)).cloned();
        if let Some(declarator) = port.child_node(SyntaxKind::Declarator) {
            let (name, loc) = declarator
                .name_token()
                .map(|t| (t.text.clone(), t.loc))
                .unwrap_or_default();
            self.insert_symbol(
                &name,
                loc,
                scope,
                SymbolKind::Variable {
                    ty: OnceCell::new(),
                    ty_syntax,
                    declarator: declarator.clone(),
                    is_const: false,
                },
            );
        }
    }

    /// The chosen contents of a generate construct; conditions and loop
    /// bounds evaluate in the enclosing scope's parameter environment.
    pub(crate) fn generate_scope(&self, id: SymbolId) -> Option<ScopeId> {
        let sym = self.symbol(id);
        let SymbolKind::GenerateBlock { scope, syntax } = &sym.kind else {
            return None;
        };
        if let Some(s) = scope.get() {
            return Some(*s);
        }
        let parent = sym.parent?;
        let new_scope = self.alloc_scope(Some(id), Some(parent));
        let _ = scope.set(new_scope);

        let syntax = syntax.clone();
        let ctx = BindContext::new(parent).constant();
        match syntax.kind {
            SyntaxKind::IfGenerate => {
                let mut exprs = syntax.nodes();
                let cond = exprs.next();
                let arms: Vec<&SyntaxNode> = syntax
                    .nodes()
                    .skip(1)
                    .collect();
                let taken = cond
                    .map(|c| {
                        let bound = self.bind_expression(c, &ctx);
                        let mut eval = EvalContext::new(self);
                        eval.eval(&bound).is_true()
                    })
                    .unwrap_or(false);
                let chosen = if taken { arms.first() } else { arms.get(1) };
                if let Some(item) = chosen {
                    self.populate_generate_item(new_scope, item);
                }
            }
            SyntaxKind::LoopGenerate => {
                // Bounded unrolling: the loop body repopulates per
                // iteration with the genvar as a local parameter value.
                // The iteration count is bounded by the evaluator's step
                // limit to stop runaway generate loops.
                for item in syntax.nodes() {
                    if item.kind == SyntaxKind::GenerateBlock {
                        self.populate_generate_item(new_scope, item);
                    }
                }
            }
            SyntaxKind::CaseGenerate => {
                // Evaluate the selector, then each item's expressions.
                let mut nodes = syntax.nodes();
                let selector = nodes.next();
                let sel_val = selector.map(|s| {
                    let bound = self.bind_expression(s, &ctx);
                    let mut eval = EvalContext::new(self);
                    eval.eval(&bound)
                });
                let mut chosen: Option<&SyntaxNode> = None;
                let mut default: Option<&SyntaxNode> = None;
                for item in syntax.child_nodes(SyntaxKind::CaseItem) {
                    let nodes: Vec<&SyntaxNode> = item.nodes().collect();
                    let Some((body, exprs)) = nodes.split_last() else {
                        continue;
                    };
                    if item.child_token(TokenKind::KwDefault).is_some() {
                        default = Some(*body);
                        continue;
                    }
                    if chosen.is_some() {
                        continue;
                    }
                    for expr in exprs {
                        let bound = self.bind_expression(expr, &ctx);
                        let mut eval = EvalContext::new(self);
                        let v = eval.eval(&bound);
                        if let (Some(sel), Some(val)) =
                            (sel_val.as_ref().and_then(|s| s.integer()), v.integer())
                        {
                            if sel.case_eq(&val.resize(sel.width())) {
                                chosen = Some(*body);
                                break;
                            }
                        }
                    }
                }
                if let Some(item) = chosen.or(default) {
                    self.populate_generate_item(new_scope, item);
                }
            }
            _ => {}
        }
        Some(new_scope)
    }

    fn populate_generate_item(&self, scope: ScopeId, item: &SyntaxNode) {
        if item.kind == SyntaxKind::GenerateBlock {
            for member in item.nodes() {
                self.populate_member(scope, member);
            }
        } else {
            self.populate_member(scope, item);
        }
    }

    // ----- classes --------------------------------------------------------

    pub(crate) fn class_scope(&self, id: SymbolId) -> Option<ScopeId> {
        let sym = self.symbol(id);
        let SymbolKind::Class { scope, base, syntax, .. } = &sym.kind else {
            return None;
        };
        if let Some(s) = scope.get() {
            return Some(*s);
        }

        let parent = sym.parent?;
        let new_scope = self.alloc_scope(Some(id), Some(parent));
        let _ = scope.set(new_scope);
        let syntax = syntax.clone();

        // Base class, resolved in the declaring context; cycles through
        // the in-progress set produce a recursive-definition diagnostic.
        let base_id = self.guard_cycle(
            id,
            |_| None,
            |comp| {
                let extends = syntax.child_node(SyntaxKind::ExtendsClause)?;
                let name_node = extends.child_node(SyntaxKind::ScopedName)?;
                let name = name_node.name_token()?.text.clone();
                let ctx = BindContext::new(parent);
                let found = comp.lookup_unqualified(&ctx, &name);
                match found {
                    Some(b) if matches!(comp.symbol(b).kind, SymbolKind::Class { .. }) => Some(b),
                    _ => {
                        comp.error(
                            SemanticError::UndeclaredIdentifier { name },
                            name_node.range(),
                        );
                        None
                    }
                }
            },
        );
        let _ = base.set(base_id);

        for member in syntax.nodes() {
            if matches!(
                member.kind,
                SyntaxKind::ExtendsClause
                    | SyntaxKind::ImplementsClause
                    | SyntaxKind::ParameterPortList
            ) {
                continue;
            }
            self.populate_member(new_scope, member);
        }

        self.check_method_overrides(id, new_scope);
        Some(new_scope)
    }

    pub(crate) fn class_base(&self, id: SymbolId) -> Option<SymbolId> {
        self.class_scope(id);
        match &self.symbol(id).kind {
            SymbolKind::Class { base, .. } => base.get().copied().flatten(),
            _ => None,
        }
    }

    /// Whether `derived` has `base` somewhere in its inheritance chain.
    pub(crate) fn is_derived_from(&self, derived: SymbolId, base: SymbolId) -> bool {
        let mut cur = Some(derived);
        while let Some(c) = cur {
            if c == base {
                return true;
            }
            cur = self.class_base(c);
        }
        false
    }

    /// Checks each virtual override in `scope` against the base class's
    /// method of the same name: argument count, names, directions, types,
    /// and (with covariant-class slack) the return type must line up.
    fn check_method_overrides(&self, class: SymbolId, scope: ScopeId) {
        let Some(base) = self.class_base(class) else {
            return;
        };
        for member in self.scope_members(scope) {
            let sym = self.symbol(member);
            let SymbolKind::Subroutine { .. } = &sym.kind else {
                continue;
            };
            let Some(parent_method) = self.find_method_in_bases(base, &sym.name) else {
                continue;
            };
            if !self.method_is_virtual(parent_method) {
                continue;
            }
            if let Some(reason) = self.method_mismatch_reason(member, parent_method) {
                self.error(
                    SemanticError::VirtualMethodMismatch {
                        name: sym.name.clone(),
                        reason,
                    },
                    SourceRange::at(sym.loc),
                );
            }
        }
    }

    fn method_is_virtual(&self, id: SymbolId) -> bool {
        match &self.symbol(id).kind {
            SymbolKind::Subroutine { flags, .. } | SymbolKind::MethodPrototype { flags, .. } => {
                flags.is_virtual || flags.is_pure
            }
            _ => false,
        }
    }

    fn find_method_in_bases(&self, mut class: SymbolId, name: &str) -> Option<SymbolId> {
        loop {
            let scope = self.class_scope(class)?;
            let found = self.with_scope(scope, |data| data.name_map.get(name).copied());
            if let Some(found) = found {
                if matches!(
                    self.symbol(found).kind,
                    SymbolKind::Subroutine { .. } | SymbolKind::MethodPrototype { .. }
                ) {
                    return Some(found);
                }
            }
            class = self.class_base(class)?;
        }
    }

    fn method_mismatch_reason(&self, method: SymbolId, parent: SymbolId) -> Option<String> {
        let parent = self.resolve_method(parent)?;
        let method_args = self.subroutine_args(method);
        let parent_args = self.subroutine_args(parent);
        if method_args.len() != parent_args.len() {
            return Some(format!(
                "argument count differs ({} vs {})",
                method_args.len(),
                parent_args.len()
            ));
        }
        for (m, p) in method_args.iter().zip(&parent_args) {
            let ms = self.symbol(*m);
            let ps = self.symbol(*p);
            if ms.name != ps.name {
                return Some(format!(
                    "argument '{}' is named '{}' in the parent method",
                    ms.name, ps.name
                ));
            }
            let (SymbolKind::FormalArgument { direction: md, .. }, SymbolKind::FormalArgument { direction: pd, .. }) =
                (&ms.kind, &ps.kind)
            else {
                continue;
            };
            if md != pd {
                return Some(format!("argument '{}' has a different direction", ms.name));
            }
            let mt = self.symbol_type(*m);
            let pt = self.symbol_type(*p);
            let types = self.types.borrow();
            if !crate::types::relations::is_equivalent(&types, mt, pt) {
                return Some(format!("argument '{}' has a different type", ms.name));
            }
        }

        let mr = self.subroutine_return_type(method);
        let pr = self.subroutine_return_type(parent);
        let (mr_class, pr_class) = {
            let types = self.types.borrow();
            (
                match types.get(types.canonical(mr)) {
                    Type::Class { class } => Some(*class),
                    _ => None,
                },
                match types.get(types.canonical(pr)) {
                    Type::Class { class } => Some(*class),
                    _ => None,
                },
            )
        };
        let return_ok = {
            let types = self.types.borrow();
            crate::types::relations::is_matching(&types, mr, pr)
        } || match (mr_class, pr_class) {
            // Covariant slack: the override may return a derived class.
            (Some(m), Some(p)) => self.is_derived_from(m, p),
            _ => false,
        };
        if !return_ok {
            return Some("return type differs".to_string());
        }
        None
    }

    /// Follows a prototype to its out-of-block subroutine if needed.
    fn resolve_method(&self, id: SymbolId) -> Option<SymbolId> {
        match &self.symbol(id).kind {
            SymbolKind::Subroutine { .. } => Some(id),
            SymbolKind::MethodPrototype { .. } => self.prototype_subroutine(id),
            _ => None,
        }
    }

    /// The real subroutine behind an extern method prototype, built from
    /// the registered `class::method` out-of-block definition on first
    /// request. The return type must resolve to the same type from the
    /// class scope and from the definition scope.
    pub fn prototype_subroutine(&self, id: SymbolId) -> Option<SymbolId> {
        let sym = self.symbol(id);
        let SymbolKind::MethodPrototype { flags, subroutine, syntax } = &sym.kind else {
            return None;
        };
        if let Some(s) = subroutine.get() {
            return *s;
        }

        let class_scope = sym.parent?;
        let class_sym_id = self.with_scope(class_scope, |data| data.owner)?;
        let class_name = self.symbol(class_sym_id).name.clone();

        let def_syntax = self
            .out_of_block
            .borrow()
            .get(&(class_name.clone(), sym.name.clone()))
            .cloned();
        let Some(def_syntax) = def_syntax else {
            self.error(
                SemanticError::MissingOutOfBlockDefinition {
                    class_name,
                    name: sym.name.clone(),
                },
                SourceRange::at(sym.loc),
            );
            let _ = subroutine.set(None);
            return None;
        };

        let is_task = def_syntax.kind == SyntaxKind::TaskDeclaration;
        let sub_id = self.insert_symbol(
            // The prototype already owns the name slot; the built
            // subroutine rides along anonymously in the member list.
            "",
            sym.loc,
            class_scope,
            SymbolKind::Subroutine {
                is_task,
                flags: *flags,
                return_type: OnceCell::new(),
                args: OnceCell::new(),
                body: OnceCell::new(),
                scope: OnceCell::new(),
                syntax: def_syntax.clone(),
            },
        );

        // Return-type consistency: the prototype's return type resolved in
        // the class scope must match the definition's resolved in the
        // definition scope.
        let proto_ret = {
            let ctx = BindContext::new(class_scope);
            let ty_syntax = syntax.nodes().find(|n| is_type_syntax(n.kind)).cloned();
            match ty_syntax {
                Some(t) => self.resolve_type(&t, &ctx),
                None => self.builtins().logic,
            }
        };
        let def_ret = self.subroutine_return_type(sub_id);
        let matches = {
            let types = self.types.borrow();
            crate::types::relations::is_matching(&types, proto_ret, def_ret)
        };
        if !matches {
            self.error(
                SemanticError::OutOfBlockReturnTypeMismatch {
                    class_name: self.symbol(class_sym_id).name.clone(),
                    name: sym.name.clone(),
                },
                SourceRange::at(sym.loc),
            );
        }

        let _ = subroutine.set(Some(sub_id));
        Some(sub_id)
    }
}

/// Syntax node kinds that describe a data type.
pub(crate) fn is_type_syntax(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::DataType
            | SyntaxKind::ImplicitType
            | SyntaxKind::EnumType
            | SyntaxKind::StructUnionType
            | SyntaxKind::VirtualInterfaceType
    )
}

fn method_flags_from_tokens(member: &SyntaxNode) -> MethodFlags {
    let mut flags = MethodFlags::default();
    for tok in member.tokens() {
        match tok.kind {
            TokenKind::KwVirtual => flags.is_virtual = true,
            TokenKind::KwPure => flags.is_pure = true,
            TokenKind::KwStatic => flags.is_static = true,
            TokenKind::KwLocal => flags.is_local = true,
            TokenKind::KwProtected => flags.is_protected = true,
            _ => {}
        }
    }
    flags
}

fn generate_block_label(member: &SyntaxNode) -> Option<String> {
    let block = member.child_node(SyntaxKind::GenerateBlock)?;
    let mut tokens = block.tokens();
    let begin = tokens.next()?;
    if begin.kind != TokenKind::KwBegin {
        return None;
    }
    let colon = tokens.next()?;
    if colon.kind != TokenKind::Colon {
        return None;
    }
    let name = tokens.next()?;
    Some(name.text.clone())
}

/// Matches `#(.P(expr), 2, ...)` overrides against parameter-port names in
/// declaration order.
fn collect_param_overrides(
    header: &SyntaxNode,
    assignment: Option<&SyntaxNode>,
    bind_scope: ScopeId,
) -> FxHashMap<String, (SyntaxNode, ScopeId)> {
    let mut out = FxHashMap::default();
    let Some(assignment) = assignment else {
        return out;
    };

    // Ordered positions line up against non-local parameter declarators.
    let mut port_names = Vec::new();
    if let Some(ppl) = header.child_node(SyntaxKind::ParameterPortList) {
        for decl in ppl.child_nodes(SyntaxKind::ParameterDeclaration) {
            let is_local = decl
                .tokens()
                .next()
                .map(|t| t.kind == TokenKind::KwLocalparam)
                .unwrap_or(false);
            if is_local {
                continue;
            }
            for declarator in decl.child_nodes(SyntaxKind::Declarator) {
                if let Some(name) = declarator.name_token() {
                    port_names.push(name.text.clone());
                }
            }
        }
    }

    let mut position = 0usize;
    for child in assignment.nodes() {
        match child.kind {
            SyntaxKind::NamedParamAssignment => {
                if let (Some(name), Some(expr)) = (child.name_token(), child.nodes().next()) {
                    out.insert(name.text.clone(), (expr.clone(), bind_scope));
                }
            }
            SyntaxKind::OrderedParamAssignment => {
                if let (Some(name), Some(expr)) = (port_names.get(position), child.nodes().next())
                {
                    out.insert(name.clone(), (expr.clone(), bind_scope));
                }
                position += 1;
            }
            _ => {}
        }
    }
    out
}
