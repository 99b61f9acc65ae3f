// src/preprocessor/macros.rs
//
// The macro table and expansion engine: `define bodies, argument
// substitution, token pasting, stringification, and the expansion-location
// bookkeeping that lets diagnostics point through macros into user code.

use sylva_text::{SourceLocation, SourceRange};

use crate::errors::PreprocessorError;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind, TokenValue};

use super::Preprocessor;

#[derive(Debug, Clone)]
pub(crate) struct MacroParam {
    pub name: String,
    pub default: Vec<Token>,
}

#[derive(Debug, Clone)]
pub(crate) struct MacroDef {
    pub name: String,
    /// `None` for object-like macros; `Some` for function-like, even with
    /// zero parameters.
    pub params: Option<Vec<MacroParam>>,
    pub body: Vec<Token>,
    pub loc: SourceLocation,
    pub builtin: bool,
}

impl MacroDef {
    /// Two definitions are the same if their parameter lists and body
    /// token texts agree; redefinition with the same body is silent.
    fn same_as(&self, other: &MacroDef) -> bool {
        let params_eq = match (&self.params, &other.params) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| {
                        x.name == y.name
                            && token_texts(&x.default) == token_texts(&y.default)
                    })
            }
            _ => false,
        };
        params_eq && token_texts(&self.body) == token_texts(&other.body)
    }
}

fn token_texts(tokens: &[Token]) -> Vec<&str> {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

impl<'sm> Preprocessor<'sm> {
    pub(super) fn install_predefined_macros(&mut self) {
        let mut defs: Vec<(String, String)> = vec![
            ("__sylva__".to_string(), "1".to_string()),
            (
                "__sylva_version__".to_string(),
                format!("\"{}\"", env!("CARGO_PKG_VERSION")),
            ),
        ];
        defs.extend(self.options.predefined_macros.clone());

        for (name, body) in defs {
            let buffer = self.sm.assign_text(
                &format!("<predefined:{name}>"),
                body,
                SourceLocation::NONE,
            );
            let mut lexer = Lexer::new(buffer, self.options.language_version);
            let mut tokens = Vec::new();
            loop {
                let tok = lexer.next_token();
                if tok.kind == TokenKind::Eof {
                    break;
                }
                tokens.push(tok);
            }
            self.macros.insert(
                name.clone(),
                MacroDef {
                    name,
                    params: None,
                    body: tokens,
                    loc: SourceLocation::NONE,
                    builtin: true,
                },
            );
        }
    }

    pub(super) fn handle_define(&mut self, tok: Token) {
        let mut consumed = vec![tok];
        let name_tok = self.raw_next();
        let name = name_tok.identifier().to_string();
        let loc = name_tok.loc;
        let is_name = matches!(name_tok.kind, TokenKind::Identifier) || name_tok.kind.is_keyword();
        consumed.push(name_tok);
        if !is_name || name.is_empty() {
            self.error(
                PreprocessorError::UnknownDirective { name: "define".into() },
                consumed[0].range(),
            );
            self.push_directive_trivia(consumed);
            return;
        }

        // A parameter list only when the paren is directly attached.
        let params = if self.raw_peek().kind == TokenKind::LParen
            && self.raw_peek().trivia.is_empty()
        {
            Some(self.parse_define_params(&mut consumed))
        } else {
            None
        };

        let body = self.collect_directive_body();
        consumed.extend(body.iter().cloned());

        let def = MacroDef {
            name: name.clone(),
            params,
            body,
            loc,
            builtin: false,
        };
        if let Some(existing) = self.macros.get(&name) {
            if !existing.same_as(&def) {
                let range = SourceRange::at(loc);
                self.error(PreprocessorError::MacroRedefined { name: name.clone() }, range);
            }
        }
        self.macros.insert(name, def);
        self.push_directive_trivia(consumed);
    }

    fn parse_define_params(&mut self, consumed: &mut Vec<Token>) -> Vec<MacroParam> {
        let mut params = Vec::new();
        consumed.push(self.raw_next()); // (
        loop {
            let tok = self.raw_next();
            match tok.kind {
                TokenKind::RParen | TokenKind::Eof => {
                    consumed.push(tok);
                    break;
                }
                TokenKind::Comma => {
                    consumed.push(tok);
                }
                TokenKind::Identifier => {
                    let name = tok.identifier().to_string();
                    consumed.push(tok);
                    let mut default = Vec::new();
                    if self.raw_peek().kind == TokenKind::Eq {
                        consumed.push(self.raw_next()); // =
                        let mut depth = 0usize;
                        loop {
                            let peek = self.raw_peek();
                            let done = match peek.kind {
                                TokenKind::Comma | TokenKind::RParen if depth == 0 => true,
                                TokenKind::Eof => true,
                                _ => false,
                            };
                            if done {
                                break;
                            }
                            let t = self.raw_next();
                            match t.kind {
                                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                                    depth += 1
                                }
                                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                                    depth = depth.saturating_sub(1)
                                }
                                _ => {}
                            }
                            consumed.push(t.clone());
                            default.push(t);
                        }
                    }
                    params.push(MacroParam { name, default });
                }
                _ => {
                    consumed.push(tok);
                }
            }
        }
        params
    }

    pub(super) fn handle_undef(&mut self, tok: Token) {
        let name_tok = self.raw_next();
        let name = name_tok.identifier();
        if self.macros.remove(name).is_none() {
            self.error(
                PreprocessorError::UndefinedMacro { name: name.to_string() },
                name_tok.range(),
            );
        }
        self.push_directive_trivia(vec![tok, name_tok]);
    }

    pub(super) fn handle_macro_usage(&mut self, tok: Token) {
        let name = tok.text.trim_start_matches('`').to_string();
        let Some(def) = self.macros.get(&name).cloned() else {
            self.error(
                PreprocessorError::UnknownDirective { name: name.clone() },
                tok.range(),
            );
            self.push_directive_trivia(vec![tok]);
            return;
        };

        let mut consumed = vec![tok.clone()];
        let args = if def.params.is_some() {
            match self.collect_raw_args(&mut consumed) {
                Some(args) => Some(args),
                None => {
                    self.push_directive_trivia(consumed);
                    return;
                }
            }
        } else {
            None
        };

        let usage_end = consumed
            .last()
            .map(|t| t.loc + t.text.len())
            .unwrap_or(tok.loc);
        let usage_range = SourceRange::new(tok.loc, usage_end);

        let body = self.substitute(&def, args.as_deref(), usage_range);
        let mut active = vec![name];
        let expanded = self.expand_list(body, &mut active, usage_range);
        self.push_directive_trivia(consumed);
        self.expansion.extend(expanded);
    }

    /// Collects `(...)` argument tokens from the raw stream, splitting on
    /// top-level commas.
    fn collect_raw_args(&mut self, consumed: &mut Vec<Token>) -> Option<Vec<Vec<Token>>> {
        if self.raw_peek().kind != TokenKind::LParen {
            let range = consumed[0].range();
            self.error(PreprocessorError::ExpectedMacroArgs, range);
            return None;
        }
        consumed.push(self.raw_next()); // (

        let mut args = vec![Vec::new()];
        let mut depth = 0usize;
        loop {
            let tok = self.raw_next();
            match tok.kind {
                TokenKind::Eof => {
                    let range = consumed[0].range();
                    self.error(PreprocessorError::UnterminatedMacroArgs, range);
                    self.raw_peeked = Some(tok);
                    return None;
                }
                TokenKind::RParen if depth == 0 => {
                    consumed.push(tok);
                    break;
                }
                TokenKind::Comma if depth == 0 => {
                    consumed.push(tok);
                    args.push(Vec::new());
                }
                _ => {
                    match tok.kind {
                        TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                        TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                            depth = depth.saturating_sub(1)
                        }
                        _ => {}
                    }
                    consumed.push(tok.clone());
                    args.last_mut().unwrap().push(tok);
                }
            }
        }
        Some(args)
    }

    /// Splits argument tokens out of an already-expanded token list.
    fn collect_list_args(
        &mut self,
        tokens: &[Token],
        start: usize,
        usage_range: SourceRange,
    ) -> Option<(Vec<Vec<Token>>, usize)> {
        if tokens.get(start).map(|t| t.kind) != Some(TokenKind::LParen) {
            self.error(PreprocessorError::ExpectedMacroArgs, usage_range);
            return None;
        }
        let mut args = vec![Vec::new()];
        let mut depth = 0usize;
        let mut i = start + 1;
        while let Some(tok) = tokens.get(i) {
            match tok.kind {
                TokenKind::RParen if depth == 0 => return Some((args, i + 1)),
                TokenKind::Comma if depth == 0 => args.push(Vec::new()),
                _ => {
                    match tok.kind {
                        TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                        TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                            depth = depth.saturating_sub(1)
                        }
                        _ => {}
                    }
                    args.last_mut().unwrap().push(tok.clone());
                }
            }
            i += 1;
        }
        self.error(PreprocessorError::UnterminatedMacroArgs, usage_range);
        None
    }

    /// Clones the macro body into a fresh expansion buffer, substituting
    /// parameters with their argument tokens (which get argument-expansion
    /// locations pointing back at the use site).
    fn substitute(
        &mut self,
        def: &MacroDef,
        args: Option<&[Vec<Token>]>,
        usage_range: SourceRange,
    ) -> Vec<Token> {
        if def.body.is_empty() {
            return Vec::new();
        }

        // Validate the argument count against the parameter list.
        let params = def.params.as_deref().unwrap_or(&[]);
        if let Some(args) = args {
            let effective = if args.len() == 1 && args[0].is_empty() && params.is_empty() {
                0
            } else {
                args.len()
            };
            if effective > params.len()
                || params[effective.min(params.len())..]
                    .iter()
                    .any(|p| p.default.is_empty())
            {
                self.error(
                    PreprocessorError::WrongMacroArgCount {
                        name: def.name.clone(),
                        expected: params.len(),
                        got: effective,
                    },
                    usage_range,
                );
            }
        }

        let body_start = def.body[0].loc;
        let exp_start =
            self.sm
                .create_expansion_loc(body_start, usage_range, Some(def.name.clone()));

        let relocate = |tok: &Token, base: SourceLocation, origin: SourceLocation| -> Token {
            let mut out = tok.clone();
            if tok.loc.buffer() == origin.buffer() && tok.loc.offset() >= origin.offset() {
                out.loc = base + (tok.loc.offset() - origin.offset());
            }
            out
        };

        let mut out = Vec::new();
        for tok in &def.body {
            let param_index = if tok.kind == TokenKind::Identifier {
                params.iter().position(|p| p.name == tok.text)
            } else {
                None
            };

            match param_index {
                Some(idx) => {
                    let actual = args
                        .and_then(|a| a.get(idx))
                        .filter(|a| !a.is_empty())
                        .cloned()
                        .unwrap_or_else(|| params[idx].default.clone());
                    if actual.is_empty() {
                        continue;
                    }
                    let arg_origin = actual[0].loc;
                    let arg_base = self.sm.create_macro_arg_loc(arg_origin, usage_range);
                    for (i, arg_tok) in actual.iter().enumerate() {
                        let mut t = relocate(arg_tok, arg_base, arg_origin);
                        if i == 0 {
                            // Spacing inside the macro body wins over the
                            // spacing at the argument site.
                            t.trivia = tok.trivia.clone();
                        }
                        out.push(t);
                    }
                }
                None => out.push(relocate(tok, exp_start, body_start)),
            }
        }
        out
    }

    /// Expands nested macro usages, token pastes, and stringification in
    /// an already-substituted token list.
    pub(super) fn expand_list(
        &mut self,
        tokens: Vec<Token>,
        active: &mut Vec<String>,
        usage_range: SourceRange,
    ) -> Vec<Token> {
        let mut out: Vec<Token> = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let tok = &tokens[i];
            match tok.kind {
                TokenKind::Directive => {
                    let name = tok.text.trim_start_matches('`').to_string();
                    if active.iter().any(|n| n == &name) {
                        self.error(
                            PreprocessorError::RecursiveMacro { name: name.clone() },
                            tok.range(),
                        );
                        let mut ident = Token::new(TokenKind::Identifier, tok.loc, name);
                        ident.trivia = tok.trivia.clone();
                        out.push(ident);
                        i += 1;
                        continue;
                    }
                    let Some(def) = self.macros.get(&name).cloned() else {
                        self.error(
                            PreprocessorError::UndefinedMacro { name },
                            tok.range(),
                        );
                        i += 1;
                        continue;
                    };
                    if active.len() >= self.options.max_macro_depth {
                        self.error(PreprocessorError::ExceededMaxMacroDepth, tok.range());
                        i += 1;
                        continue;
                    }

                    let (args, next) = if def.params.is_some() {
                        match self.collect_list_args(&tokens, i + 1, usage_range) {
                            Some((args, next)) => (Some(args), next),
                            None => {
                                i += 1;
                                continue;
                            }
                        }
                    } else {
                        (None, i + 1)
                    };

                    let body = self.substitute(&def, args.as_deref(), usage_range);
                    active.push(def.name.clone());
                    let expanded = self.expand_list(body, active, usage_range);
                    active.pop();
                    out.extend(expanded);
                    i = next;
                }
                TokenKind::MacroPaste => {
                    let left = out.pop();
                    let right = tokens.get(i + 1);
                    match (left, right) {
                        (Some(left), Some(right)) => {
                            let pasted = self.paste_tokens(&left, right);
                            out.push(pasted);
                            i += 2;
                        }
                        (left, _) => {
                            self.error(PreprocessorError::BadTokenPaste, tok.range());
                            if let Some(l) = left {
                                out.push(l);
                            }
                            i += 1;
                        }
                    }
                }
                TokenKind::MacroQuote => {
                    // Stringify everything up to the closing `".
                    let mut text = String::new();
                    let mut j = i + 1;
                    while let Some(t) = tokens.get(j) {
                        if t.kind == TokenKind::MacroQuote {
                            break;
                        }
                        if j > i + 1 {
                            for tr in &t.trivia {
                                text.push_str(&tr.text);
                            }
                        }
                        text.push_str(&t.text);
                        j += 1;
                    }
                    let mut tok_out = Token::new(
                        TokenKind::StringLiteral,
                        tok.loc,
                        format!("\"{text}\""),
                    );
                    tok_out.trivia = tok.trivia.clone();
                    tok_out.value = Some(TokenValue::Str(text));
                    out.push(tok_out);
                    i = j + 1;
                }
                _ => {
                    out.push(tok.clone());
                    i += 1;
                }
            }
        }
        out
    }

    /// Concatenates two tokens' text and re-lexes the result; the paste
    /// must form exactly one token.
    fn paste_tokens(&mut self, left: &Token, right: &Token) -> Token {
        let text = format!("{}{}", left.text, right.text);
        let buffer = self
            .sm
            .assign_text("<paste>", text.clone(), SourceLocation::NONE);
        let mut lexer = Lexer::new(buffer, self.options.language_version);
        let mut tok = lexer.next_token();
        let rest = lexer.next_token();
        if tok.kind == TokenKind::Eof || rest.kind != TokenKind::Eof {
            self.error(
                PreprocessorError::BadTokenPaste,
                SourceRange::new(left.loc, right.loc + right.text.len()),
            );
            let mut out = left.clone();
            out.text = text;
            return out;
        }
        tok.trivia = left.trivia.clone();
        tok.loc = left.loc;
        tok
    }
}

/// Render a token list back to text; used by tests to check losslessness.
#[cfg(test)]
pub(crate) fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    for tok in tokens {
        for t in &tok.trivia {
            out.push_str(&t.text);
        }
        out.push_str(&tok.text);
    }
    out
}
