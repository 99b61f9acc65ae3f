// src/symbols.rs
//
// The symbol and scope model. Symbols live in a per-compilation store
// behind Rc handles; lazily computed facts (types, values, bodies,
// elaborated scopes) sit in OnceCell slots memoized on first request.
// Scopes keep an ordered member list plus a name map; a member's position
// in that list is its index, which bounds visibility during lookup.

use std::cell::OnceCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use sylva_numeric::{ConstantValue, SVInt};
use sylva_syntax::cst::SyntaxNode;
use sylva_text::SourceLocation;

use crate::binder::Statement;
use crate::types::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn from_raw(raw: u32) -> SymbolId {
        SymbolId(raw)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn from_raw(raw: u32) -> ScopeId {
        ScopeId(raw)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

/// Position of a member within its scope; lookups see a symbol only when
/// its index is at or before the lookup location (or the symbol lives in
/// an enclosing scope).
pub type SymbolIndex = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Module,
    Interface,
    Program,
}

impl DefinitionKind {
    pub fn display(self) -> &'static str {
        match self {
            DefinitionKind::Module => "module",
            DefinitionKind::Interface => "interface",
            DefinitionKind::Program => "program",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgDirection {
    Input,
    Output,
    Inout,
    Ref,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodFlags {
    pub is_virtual: bool,
    pub is_pure: bool,
    pub is_static: bool,
    pub is_local: bool,
    pub is_protected: bool,
}

/// Kind-specific payload of a symbol. Lazily computed slots use OnceCell;
/// everything else is immutable after construction.
pub enum SymbolKind {
    Root,
    CompilationUnit {
        scope: ScopeId,
    },
    Package {
        scope: OnceCell<ScopeId>,
        syntax: SyntaxNode,
    },
    /// An uninstantiated module/interface/program definition.
    Definition {
        kind: DefinitionKind,
        syntax: SyntaxNode,
    },
    /// An instance of a definition; the body scope elaborates on demand
    /// with the instance's parameter environment.
    Instance {
        definition_name: String,
        definition: OnceCell<Option<SymbolId>>,
        body: OnceCell<Option<ScopeId>>,
        /// The `#(...)` parameter value assignment at the instantiation,
        /// if any, together with the scope it binds in.
        param_assignment: Option<SyntaxNode>,
        param_scope: ScopeId,
    },
    Parameter {
        is_local: bool,
        ty: OnceCell<TypeId>,
        value: OnceCell<ConstantValue>,
        ty_syntax: Option<SyntaxNode>,
        declarator: SyntaxNode,
        /// Override expression from the instantiation site, bound in the
        /// instantiation's scope rather than the instance body.
        override_expr: Option<(SyntaxNode, ScopeId)>,
    },
    Variable {
        ty: OnceCell<TypeId>,
        ty_syntax: Option<SyntaxNode>,
        declarator: SyntaxNode,
        is_const: bool,
    },
    Net {
        ty: OnceCell<TypeId>,
        ty_syntax: Option<SyntaxNode>,
        declarator: SyntaxNode,
    },
    Typedef {
        ty: OnceCell<TypeId>,
        ty_syntax: Option<SyntaxNode>,
        declarator: SyntaxNode,
    },
    Subroutine {
        is_task: bool,
        flags: MethodFlags,
        return_type: OnceCell<TypeId>,
        args: OnceCell<Vec<SymbolId>>,
        body: OnceCell<Option<Rc<Statement>>>,
        scope: OnceCell<ScopeId>,
        syntax: SyntaxNode,
    },
    /// An extern method prototype inside a class; the real subroutine is
    /// built from the registered out-of-block definition on first use.
    MethodPrototype {
        flags: MethodFlags,
        subroutine: OnceCell<Option<SymbolId>>,
        syntax: SyntaxNode,
    },
    FormalArgument {
        direction: ArgDirection,
        ty: OnceCell<TypeId>,
        ty_syntax: Option<SyntaxNode>,
        declarator: SyntaxNode,
    },
    Class {
        scope: OnceCell<ScopeId>,
        base: OnceCell<Option<SymbolId>>,
        is_virtual: bool,
        is_interface: bool,
        syntax: SyntaxNode,
    },
    EnumValue {
        ty: OnceCell<TypeId>,
        value: SVInt,
    },
    GenerateBlock {
        scope: OnceCell<ScopeId>,
        syntax: SyntaxNode,
    },
    Genvar,
    Modport {
        syntax: SyntaxNode,
    },
}

impl SymbolKind {
    /// A short noun for diagnostics and serialization.
    pub fn name(&self) -> &'static str {
        match self {
            SymbolKind::Root => "root",
            SymbolKind::CompilationUnit { .. } => "compilation unit",
            SymbolKind::Package { .. } => "package",
            SymbolKind::Definition { kind, .. } => kind.display(),
            SymbolKind::Instance { .. } => "instance",
            SymbolKind::Parameter { is_local: true, .. } => "localparam",
            SymbolKind::Parameter { .. } => "parameter",
            SymbolKind::Variable { .. } => "variable",
            SymbolKind::Net { .. } => "net",
            SymbolKind::Typedef { .. } => "typedef",
            SymbolKind::Subroutine { is_task: true, .. } => "task",
            SymbolKind::Subroutine { .. } => "function",
            SymbolKind::MethodPrototype { .. } => "method prototype",
            SymbolKind::FormalArgument { .. } => "argument",
            SymbolKind::Class { .. } => "class",
            SymbolKind::EnumValue { .. } => "enum value",
            SymbolKind::GenerateBlock { .. } => "generate block",
            SymbolKind::Genvar => "genvar",
            SymbolKind::Modport { .. } => "modport",
        }
    }
}

/// One symbol: shared fields plus the kind payload. Handed out as
/// `Rc<Symbol>`; cross-references use ids, so cycles between classes or
/// instances never create ownership cycles.
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub loc: SourceLocation,
    pub parent: Option<ScopeId>,
    pub index: SymbolIndex,
    pub kind: SymbolKind,
}

/// Storage for one lexical scope.
pub struct ScopeData {
    pub owner: Option<SymbolId>,
    pub parent: Option<ScopeId>,
    pub members: Vec<SymbolId>,
    pub name_map: FxHashMap<String, SymbolId>,
    /// Packages named by `import pkg::*`; consulted after local names.
    pub wildcard_imports: Vec<String>,
    /// `import pkg::name` bindings: local name -> package name.
    pub explicit_imports: FxHashMap<String, String>,
}

impl ScopeData {
    pub fn new(owner: Option<SymbolId>, parent: Option<ScopeId>) -> ScopeData {
        ScopeData {
            owner,
            parent,
            members: Vec::new(),
            name_map: FxHashMap::default(),
            wildcard_imports: Vec::new(),
            explicit_imports: FxHashMap::default(),
        }
    }
}

/// Shared handle type used throughout the compilation.
pub type SymbolRef = Rc<Symbol>;
