// src/lib.rs
//! sylva: a SystemVerilog (IEEE 1800) front-end library.
//!
//! The pipeline runs source text through the shared `SourceManager`,
//! lexer, preprocessor, and parser into a lossless concrete syntax tree,
//! then elaborates a typed semantic model with lazy symbol resolution and
//! four-state constant evaluation. This crate is the public surface;
//! the work lives in `sylva-text`, `sylva-numeric`, `sylva-syntax`, and
//! `sylva-sema`.

mod serialize;
mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use serialize::to_json;
pub use session::ScriptSession;

pub use sylva_numeric::{ConstantValue, Logic, SVInt, TimeScale, TimeUnit};
pub use sylva_sema::{Compilation, CompilationOptions, EvalContext};
pub use sylva_syntax::{
    LanguageVersion, ParseOptions, SyntaxKind, SyntaxNode, SyntaxPrinter, SyntaxTree,
};
pub use sylva_text::{
    BufferId, Diagnostic, Diagnostics, Severity, SourceLocation, SourceManager, SourceRange,
};

/// Combined options for the full pipeline.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub parse: ParseOptions,
    pub compile: CompilationOptions,
    pub include_dirs_user: Vec<PathBuf>,
    pub include_dirs_system: Vec<PathBuf>,
}

/// Parses in-memory text with a fresh source manager.
pub fn parse_from_text(text: &str, options: ParseOptions) -> SyntaxTree {
    SyntaxTree::from_text(text, Arc::new(SourceManager::new()), options)
}

/// Parses a file through the given source manager; `None` when the file
/// cannot be read.
pub fn parse_from_file(
    source_manager: Arc<SourceManager>,
    path: impl AsRef<Path>,
    options: ParseOptions,
) -> Option<SyntaxTree> {
    SyntaxTree::from_file(path, source_manager, options)
}

/// Builds a compilation over a set of parsed trees.
pub fn compile(trees: &[SyntaxTree], options: CompilationOptions) -> Compilation {
    let comp = Compilation::new(options);
    for tree in trees {
        comp.add_syntax_tree(tree);
    }
    comp
}
