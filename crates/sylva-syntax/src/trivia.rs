// src/trivia.rs

use crate::token::Token;

/// Classification of the source bytes between tokens. Every trivium is
/// owned by the token that follows it; there is no trailing trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriviaKind {
    Whitespace,
    LineComment,
    BlockComment,
    /// A backslash-newline pair inside a directive.
    LineContinuation,
    /// A preprocessor directive (including macro usages); the tokens of
    /// the directive itself are kept for byte-exact printing.
    Directive,
    /// Tokens skipped during parser error recovery.
    SkippedTokens,
    /// Raw text of a false conditional branch.
    DisabledText,
}

/// One piece of trivia: its kind, the raw text it covers, and, for
/// directive and skipped-token trivia, the tokens inside it.
#[derive(Debug, Clone)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
    pub tokens: Vec<Token>,
}

impl Trivia {
    pub fn new(kind: TriviaKind, text: impl Into<String>) -> Trivia {
        Trivia {
            kind,
            text: text.into(),
            tokens: Vec::new(),
        }
    }

    pub fn directive(tokens: Vec<Token>) -> Trivia {
        let mut text = String::new();
        for tok in &tokens {
            for t in &tok.trivia {
                text.push_str(&t.text);
            }
            text.push_str(&tok.text);
        }
        Trivia {
            kind: TriviaKind::Directive,
            text,
            tokens,
        }
    }

    pub fn skipped(tokens: Vec<Token>) -> Trivia {
        let mut text = String::new();
        for tok in &tokens {
            for t in &tok.trivia {
                text.push_str(&t.text);
            }
            text.push_str(&tok.text);
        }
        Trivia {
            kind: TriviaKind::SkippedTokens,
            text,
            tokens,
        }
    }

    /// Whether this trivium ends the current line (used to delimit
    /// directive bodies).
    pub fn ends_line(&self) -> bool {
        match self.kind {
            TriviaKind::Whitespace => self.text.contains('\n') || self.text.contains('\r'),
            TriviaKind::LineComment => true,
            _ => false,
        }
    }
}
