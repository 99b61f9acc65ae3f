use sylva_text::{SourceLocation, SourceManager};

use super::macros::render;
use super::*;
use crate::token::TokenKind;

fn preprocess(sm: &SourceManager, text: &str) -> (Vec<Token>, Diagnostics) {
    let buf = sm.assign_text("test.sv", text, SourceLocation::NONE);
    let mut pp = Preprocessor::new(sm, buf, ParseOptions::default());
    let mut out = Vec::new();
    loop {
        let tok = pp.next_token();
        let done = tok.kind == TokenKind::Eof;
        out.push(tok);
        if done {
            break;
        }
    }
    (out, pp.take_diagnostics())
}

fn texts(tokens: &[Token]) -> Vec<&str> {
    tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.text.as_str())
        .collect()
}

#[test]
fn object_macro_expands() {
    let sm = SourceManager::new();
    let (toks, diags) = preprocess(&sm, "`define W 8\nlogic [`W-1:0] x;");
    assert!(!diags.has_errors());
    assert_eq!(
        texts(&toks),
        vec!["logic", "[", "8", "-", "1", ":", "0", "]", "x", ";"]
    );
    // The expanded token's location traces back to the use site.
    let eight = toks.iter().find(|t| t.text == "8").unwrap();
    assert!(sm.is_macro_loc(eight.loc));
    assert_eq!(sm.get_macro_name(eight.loc).as_deref(), Some("W"));
}

#[test]
fn function_macro_substitutes_arguments() {
    let sm = SourceManager::new();
    let (toks, diags) = preprocess(&sm, "`define ADD(a, b) (a + b)\nint y = `ADD(2, 3);");
    assert!(!diags.has_errors());
    assert_eq!(
        texts(&toks),
        vec!["int", "y", "=", "(", "2", "+", "3", ")", ";"]
    );
    // Argument tokens point back at the argument site.
    let two = toks.iter().find(|t| t.text == "2").unwrap();
    assert!(sm.is_macro_arg_loc(two.loc));
    let lparen = toks.iter().find(|t| t.text == "(").unwrap();
    assert!(sm.is_macro_loc(lparen.loc));
    assert!(!sm.is_macro_arg_loc(lparen.loc));
}

#[test]
fn default_arguments_fill_in() {
    let sm = SourceManager::new();
    let (toks, diags) = preprocess(&sm, "`define D(x = 7) x\nint v = `D();");
    assert!(!diags.has_errors());
    assert_eq!(texts(&toks), vec!["int", "v", "=", "7", ";"]);
}

#[test]
fn nested_macros_expand() {
    let sm = SourceManager::new();
    let (toks, diags) =
        preprocess(&sm, "`define INNER 5\n`define OUTER (`INNER + 1)\nint v = `OUTER;");
    assert!(!diags.has_errors());
    assert_eq!(
        texts(&toks),
        vec!["int", "v", "=", "(", "5", "+", "1", ")", ";"]
    );
}

#[test]
fn recursive_macro_is_diagnosed_and_left_verbatim() {
    let sm = SourceManager::new();
    let (toks, diags) = preprocess(&sm, "`define SELF 1 + `SELF\nint v = `SELF;");
    assert!(diags.iter().any(|d| d.code == "E0509"));
    // The recursive reference comes through as a plain identifier.
    assert_eq!(texts(&toks), vec!["int", "v", "=", "1", "+", "SELF", ";"]);
}

#[test]
fn redefinition_same_body_is_silent() {
    let sm = SourceManager::new();
    let (_, diags) = preprocess(&sm, "`define A 1\n`define A 1\n");
    assert!(!diags.has_errors());
    assert!(diags.is_empty());

    let (_, diags) = preprocess(&sm, "`define B 1\n`define B 2\n");
    assert!(diags.iter().any(|d| d.code == "E0503"));
}

#[test]
fn undef_removes_macro() {
    let sm = SourceManager::new();
    let (toks, diags) = preprocess(&sm, "`define A 1\n`undef A\n`ifdef A\nint x;\n`endif\n");
    assert!(!diags.has_errors());
    assert_eq!(texts(&toks), Vec::<&str>::new());
}

#[test]
fn conditional_true_branch() {
    let sm = SourceManager::new();
    let (toks, diags) =
        preprocess(&sm, "`define COND\n`ifdef COND\nint a;\n`else\nint b;\n`endif\n");
    assert!(!diags.has_errors());
    assert_eq!(texts(&toks), vec!["int", "a", ";"]);
}

#[test]
fn conditional_false_branch_becomes_disabled_text() {
    let sm = SourceManager::new();
    let (toks, diags) = preprocess(&sm, "`ifdef MISSING\nint a;\n`else\nint b;\n`endif\n");
    assert!(!diags.has_errors());
    assert_eq!(texts(&toks), vec!["int", "b", ";"]);

    // The false branch's raw text survives as DisabledText trivia.
    let int_tok = &toks[0];
    assert!(int_tok
        .trivia
        .iter()
        .any(|t| t.kind == TriviaKind::DisabledText && t.text.contains("int a;")));
}

#[test]
fn elsif_chains() {
    let sm = SourceManager::new();
    let source = "`define B\n`ifdef A\nint a;\n`elsif B\nint b;\n`elsif C\nint c;\n`else\nint d;\n`endif\n";
    let (toks, diags) = preprocess(&sm, source);
    assert!(!diags.has_errors());
    assert_eq!(texts(&toks), vec!["int", "b", ";"]);
}

#[test]
fn unbalanced_endif_is_diagnosed() {
    let sm = SourceManager::new();
    let (_, diags) = preprocess(&sm, "`endif\n");
    assert!(diags.iter().any(|d| d.code == "E0504"));

    let (_, diags) = preprocess(&sm, "`ifdef A\nint x;\n");
    assert!(diags.iter().any(|d| d.code == "E0505"));
}

#[test]
fn include_pulls_in_file() {
    let sm = SourceManager::new();
    sm.assign_text("defs.svh", "`define WIDTH 16\n", SourceLocation::NONE);
    let (toks, diags) = preprocess(&sm, "`include \"defs.svh\"\nint [`WIDTH-1:0] x;");
    assert!(!diags.has_errors());
    assert!(texts(&toks).contains(&"16"));
}

#[test]
fn missing_include_is_one_diagnostic() {
    let sm = SourceManager::new();
    let (_, diags) = preprocess(&sm, "`include \"nope.svh\"\nint x;");
    assert_eq!(diags.iter().filter(|d| d.code == "E0506").count(), 1);
    assert_eq!(diags.len(), 1);
}

#[test]
fn stringification_and_pasting() {
    let sm = SourceManager::new();
    let (toks, diags) = preprocess(&sm, "`define STR(x) `\"x`\"\nstring s = `STR(abc);");
    assert!(!diags.has_errors());
    let lit = toks.iter().find(|t| t.kind == TokenKind::StringLiteral).unwrap();
    assert_eq!(lit.string_value(), Some("abc"));

    let (toks, diags) = preprocess(&sm, "`define CAT(a, b) a``b\nint `CAT(foo, bar);");
    assert!(!diags.has_errors());
    assert!(toks.iter().any(|t| t.text == "foobar" && t.kind == TokenKind::Identifier));
}

#[test]
fn line_directive_remaps_reporting() {
    let sm = SourceManager::new();
    let (toks, diags) = preprocess(&sm, "`line 100 \"virtual.sv\" 0\nint x;");
    assert!(!diags.has_errors());
    let int_tok = &toks[0];
    assert_eq!(sm.get_line_number(int_tok.loc), Some(100));
    assert_eq!(sm.get_file_name(int_tok.loc).as_deref(), Some("virtual.sv"));
}

#[test]
fn timescale_and_nettype_state() {
    let sm = SourceManager::new();
    let buf = sm.assign_text(
        "t.sv",
        "`timescale 10ns / 1ps\n`default_nettype none\nmodule m; endmodule\n",
        SourceLocation::NONE,
    );
    let mut pp = Preprocessor::new(&sm, buf, ParseOptions::default());
    // Drain the stream; state queries reflect the directives.
    loop {
        if pp.next_token().kind == TokenKind::Eof {
            break;
        }
    }
    let ts = pp.timescale().unwrap();
    assert_eq!(ts.unit.magnitude, 10);
    assert_eq!(pp.default_nettype(), DefaultNetType::None);
    assert!(!pp.take_diagnostics().has_errors());
}

#[test]
fn predefined_tool_macros_exist() {
    let sm = SourceManager::new();
    let (toks, diags) = preprocess(&sm, "int v = `__sylva__;");
    assert!(!diags.has_errors());
    assert_eq!(texts(&toks), vec!["int", "v", "=", "1", ";"]);
}

#[test]
fn directive_only_input_renders_losslessly() {
    let sm = SourceManager::new();
    let source = "`define A 1\n`ifdef A\nint x;\n`endif\n// done\n";
    let (toks, diags) = preprocess(&sm, source);
    assert!(!diags.has_errors());
    assert_eq!(render(&toks), source);
}
