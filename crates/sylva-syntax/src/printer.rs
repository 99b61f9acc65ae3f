// src/printer.rs
//
// Byte-exact reproduction of parsed source from the syntax tree, with
// flags to expand macros and includes, strip comments or trivia, surface
// skipped/disabled text, and squash blank-line runs.

use sylva_text::{SourceLocation, SourceManager};

use crate::cst::{SyntaxElement, SyntaxNode};
use crate::token::Token;
use crate::trivia::{Trivia, TriviaKind};

/// Classification of a directive trivium by the directive that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectiveClass {
    Include,
    /// A macro usage or `__FILE__`/`__LINE__`; printing it is the
    /// alternative to printing the expansion tokens.
    Expansion,
    Other,
}

const KNOWN_DIRECTIVES: &[&str] = &[
    "define",
    "undef",
    "undefineall",
    "resetall",
    "ifdef",
    "ifndef",
    "elsif",
    "else",
    "endif",
    "line",
    "timescale",
    "default_nettype",
    "unconnected_drive",
    "nounconnected_drive",
    "celldefine",
    "endcelldefine",
    "pragma",
    "error",
];

fn classify_directive(trivia: &Trivia) -> DirectiveClass {
    let Some(first) = trivia.tokens.first() else {
        return DirectiveClass::Other;
    };
    let name = first.text.trim_start_matches('`');
    if name == "include" {
        DirectiveClass::Include
    } else if KNOWN_DIRECTIVES.contains(&name) {
        DirectiveClass::Other
    } else {
        DirectiveClass::Expansion
    }
}

pub struct SyntaxPrinter<'a> {
    sm: Option<&'a SourceManager>,
    include_trivia: bool,
    include_comments: bool,
    include_directives: bool,
    include_skipped: bool,
    include_missing: bool,
    expand_macros: bool,
    expand_includes: bool,
    squash_newlines: bool,
    output: String,
}

impl<'a> SyntaxPrinter<'a> {
    pub fn new(sm: &'a SourceManager) -> Self {
        SyntaxPrinter {
            sm: Some(sm),
            include_trivia: true,
            include_comments: true,
            include_directives: true,
            include_skipped: true,
            include_missing: false,
            expand_macros: false,
            expand_includes: false,
            squash_newlines: false,
            output: String::new(),
        }
    }

    /// A printer with no source manager: every token prints, which is
    /// right for trees that never went through preprocessing.
    pub fn without_source_manager() -> SyntaxPrinter<'static> {
        SyntaxPrinter {
            sm: None,
            include_trivia: true,
            include_comments: true,
            include_directives: true,
            include_skipped: true,
            include_missing: false,
            expand_macros: false,
            expand_includes: false,
            squash_newlines: false,
            output: String::new(),
        }
    }

    pub fn include_trivia(mut self, value: bool) -> Self {
        self.include_trivia = value;
        self
    }

    pub fn include_comments(mut self, value: bool) -> Self {
        self.include_comments = value;
        self
    }

    pub fn include_directives(mut self, value: bool) -> Self {
        self.include_directives = value;
        self
    }

    pub fn include_skipped(mut self, value: bool) -> Self {
        self.include_skipped = value;
        self
    }

    pub fn include_missing(mut self, value: bool) -> Self {
        self.include_missing = value;
        self
    }

    pub fn expand_macros(mut self, value: bool) -> Self {
        self.expand_macros = value;
        self
    }

    pub fn expand_includes(mut self, value: bool) -> Self {
        self.expand_includes = value;
        self
    }

    pub fn squash_newlines(mut self, value: bool) -> Self {
        self.squash_newlines = value;
        self
    }

    pub fn print_node(mut self, node: &SyntaxNode) -> Self {
        self.visit_node(node);
        self
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn visit_node(&mut self, node: &SyntaxNode) {
        for child in &node.children {
            match child {
                SyntaxElement::Token(tok) => self.visit_token(tok),
                SyntaxElement::Node(n) => self.visit_node(n),
            }
        }
    }

    fn visit_token(&mut self, token: &Token) {
        let excluded = token.missing || !self.location_printable(token.loc);

        for trivia in &token.trivia {
            self.visit_trivia(trivia, excluded);
        }

        if token.missing {
            if self.include_missing {
                self.append(token.kind.display());
            }
            return;
        }
        if !excluded {
            self.append(&token.text);
        }
    }

    fn visit_trivia(&mut self, trivia: &Trivia, token_excluded: bool) {
        match trivia.kind {
            TriviaKind::Directive => {
                let class = classify_directive(trivia);
                let suppressed = match class {
                    DirectiveClass::Expansion => self.expand_macros,
                    DirectiveClass::Include => self.expand_includes,
                    DirectiveClass::Other => false,
                };
                let loc_ok = trivia
                    .tokens
                    .first()
                    .map(|t| self.location_printable(t.loc))
                    .unwrap_or(false);
                if self.include_directives && !suppressed && loc_ok {
                    for tok in &trivia.tokens {
                        self.visit_token(tok);
                    }
                } else if loc_ok || suppressed {
                    // Keep the leading whitespace so lines do not fuse.
                    if let Some(first) = trivia.tokens.first() {
                        for t in &first.trivia {
                            self.visit_trivia(t, false);
                        }
                    }
                }
            }
            TriviaKind::SkippedTokens => {
                if self.include_skipped {
                    for tok in &trivia.tokens {
                        self.visit_token(tok);
                    }
                }
            }
            TriviaKind::DisabledText => {
                if self.include_skipped && !token_excluded {
                    self.append(&trivia.text);
                }
            }
            TriviaKind::LineComment | TriviaKind::BlockComment => {
                if self.include_trivia && self.include_comments && !token_excluded {
                    self.append(&trivia.text);
                }
            }
            TriviaKind::Whitespace | TriviaKind::LineContinuation => {
                if self.include_trivia && !token_excluded {
                    if self.squash_newlines {
                        self.append_squashed(&trivia.text);
                    } else {
                        self.append(&trivia.text);
                    }
                }
            }
        }
    }

    fn location_printable(&self, loc: SourceLocation) -> bool {
        let Some(sm) = self.sm else {
            return true;
        };
        if !loc.is_valid() {
            return true;
        }
        if sm.is_macro_loc(loc) {
            return self.expand_macros;
        }
        if sm.is_included_file_loc(loc) {
            return self.expand_includes;
        }
        true
    }

    fn append(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Appends whitespace, limiting consecutive newlines to two.
    fn append_squashed(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                let trailing = self
                    .output
                    .chars()
                    .rev()
                    .take_while(|&c| c == '\n')
                    .count();
                if trailing >= 2 {
                    continue;
                }
            }
            self.output.push(ch);
        }
    }
}
