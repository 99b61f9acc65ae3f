// src/syntax_tree.rs
//
// The parse-level entry points: turn text or a file into a syntax tree,
// carrying its diagnostics, options, and the out-of-block definition
// registry for the elaborator.

use std::path::Path;
use std::sync::Arc;

use sylva_text::{Diagnostics, SourceLocation, SourceManager};

use crate::cst::SyntaxNode;
use crate::options::ParseOptions;
use crate::parser::{OutOfBlockDef, Parser};
use crate::preprocessor::Preprocessor;

pub struct SyntaxTree {
    root: SyntaxNode,
    source_manager: Arc<SourceManager>,
    diagnostics: Diagnostics,
    options: ParseOptions,
    out_of_block: Vec<OutOfBlockDef>,
}

impl SyntaxTree {
    /// Parses in-memory text as a compilation unit.
    pub fn from_text(
        text: &str,
        source_manager: Arc<SourceManager>,
        options: ParseOptions,
    ) -> SyntaxTree {
        let buffer = source_manager.assign_text("", text, SourceLocation::NONE);
        Self::parse_buffer(buffer, source_manager, options)
    }

    /// Parses text under a given file name (useful for diagnostics).
    pub fn from_named_text(
        name: &str,
        text: &str,
        source_manager: Arc<SourceManager>,
        options: ParseOptions,
    ) -> SyntaxTree {
        let buffer = source_manager.assign_text(name, text, SourceLocation::NONE);
        Self::parse_buffer(buffer, source_manager, options)
    }

    /// Reads and parses a file; `None` when the file cannot be read.
    pub fn from_file(
        path: impl AsRef<Path>,
        source_manager: Arc<SourceManager>,
        options: ParseOptions,
    ) -> Option<SyntaxTree> {
        let buffer = source_manager.read_source(path)?;
        Some(Self::parse_buffer(buffer, source_manager, options))
    }

    fn parse_buffer(
        buffer: sylva_text::SourceBuffer,
        source_manager: Arc<SourceManager>,
        options: ParseOptions,
    ) -> SyntaxTree {
        let pp = Preprocessor::new(&source_manager, buffer, options.clone());
        let mut parser = Parser::new(pp);
        let root = parser.parse_compilation_unit();
        let (diagnostics, out_of_block) = parser.into_parts();
        SyntaxTree {
            root,
            source_manager,
            diagnostics,
            options,
            out_of_block,
        }
    }

    /// Parses a lone expression; used by scripting sessions.
    pub fn expression_from_text(
        text: &str,
        source_manager: Arc<SourceManager>,
        options: ParseOptions,
    ) -> (SyntaxNode, Diagnostics) {
        let buffer = source_manager.assign_text("", text, SourceLocation::NONE);
        let pp = Preprocessor::new(&source_manager, buffer, options);
        let mut parser = Parser::new(pp);
        let root = parser.parse_expression_root();
        let (diags, _) = parser.into_parts();
        (root, diags)
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    pub fn source_manager(&self) -> &Arc<SourceManager> {
        &self.source_manager
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// The textual `(class, method) -> syntax` registry collected from
    /// out-of-block definitions, consumed during class elaboration.
    pub fn out_of_block_defs(&self) -> &[OutOfBlockDef] {
        &self.out_of_block
    }
}
