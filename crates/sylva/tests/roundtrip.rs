// tests/roundtrip.rs
//
// Byte-exact reproduction of source through the syntax tree, and the
// serialized view of the elaborated model.

use sylva::{
    parse_from_text, to_json, Compilation, CompilationOptions, ParseOptions, SyntaxPrinter,
};

fn roundtrip(text: &str) {
    let tree = parse_from_text(text, ParseOptions::default());
    let printed = SyntaxPrinter::new(tree.source_manager())
        .print_node(tree.root())
        .finish();
    assert_eq!(printed, text, "print did not reproduce the input bytes");
}

#[test]
fn roundtrip_plain_source() {
    roundtrip("module m;\n  logic [7:0] data;\n  assign data = 8'hff;\nendmodule\n");
    roundtrip("  // leading comment\nmodule m; /* inline */ endmodule  \n\n");
    roundtrip("class C extends B;\n  rand int x;\nendclass : C\n");
}

#[test]
fn roundtrip_with_preprocessor() {
    roundtrip("`define W 8\nmodule m;\n  logic [`W-1:0] x;\nendmodule\n");
    roundtrip("`ifdef MISSING\nint a;\n`else\nint b;\n`endif\n");
    roundtrip("`timescale 1ns / 1ps\nmodule m; endmodule\n");
    roundtrip("`define ADD(a, b) (a + b)\nint y = `ADD(1, 2);\n");
}

#[test]
fn roundtrip_with_errors_preserves_skipped_tokens() {
    // The parser skips garbage into trivia; the bytes still survive.
    let text = "module m; int 5bad; wire w; endmodule\n";
    let tree = parse_from_text(text, ParseOptions::default());
    assert!(tree.diagnostics().has_errors());
    let printed = SyntaxPrinter::new(tree.source_manager())
        .print_node(tree.root())
        .finish();
    assert_eq!(printed, text);
}

#[test]
fn printer_flag_variants() {
    let text = "module m;\n  // a comment\n  logic x;\nendmodule\n";
    let tree = parse_from_text(text, ParseOptions::default());

    let without_comments = SyntaxPrinter::new(tree.source_manager())
        .include_comments(false)
        .print_node(tree.root())
        .finish();
    assert!(!without_comments.contains("a comment"));
    assert!(without_comments.contains("logic x;"));

    let squashed = {
        let text = "module m;\n\n\n\n  logic x;\nendmodule\n";
        let tree = parse_from_text(text, ParseOptions::default());
        SyntaxPrinter::new(tree.source_manager())
            .squash_newlines(true)
            .print_node(tree.root())
            .finish()
    };
    assert!(!squashed.contains("\n\n\n"));
}

#[test]
fn serialized_model_exposes_symbols() {
    let tree = parse_from_text(
        "localparam int WIDTH = 8;\n\
         function int double(int x); return x * 2; endfunction\n\
         module A #(parameter int P = 1); localparam LP = P + 1; endmodule\n\
         A #(.P(3)) a0();\n",
        ParseOptions::default(),
    );
    let comp = Compilation::new(CompilationOptions {
        allow_hierarchical_in_const: true,
        ..CompilationOptions::default()
    });
    comp.add_syntax_tree(&tree);

    let json = to_json(&comp);
    let members = json["members"].as_array().expect("members array");

    let width = members
        .iter()
        .find(|m| m["name"] == "WIDTH")
        .expect("WIDTH parameter");
    assert_eq!(width["kind"], "localparam");
    assert_eq!(width["value"]["width"], 32);
    assert_eq!(width["value"]["signed"], true);
    assert_eq!(width["value"]["four_state"], false);

    let func = members
        .iter()
        .find(|m| m["name"] == "double")
        .expect("function symbol");
    assert_eq!(func["kind"], "function");
    assert_eq!(func["returnType"], "int");
    assert_eq!(func["arguments"].as_array().unwrap().len(), 1);

    let inst = members
        .iter()
        .find(|m| m["name"] == "a0")
        .expect("instance symbol");
    assert_eq!(inst["definition"], "A");
    let body = inst["body"].as_array().expect("instance body");
    let lp = body.iter().find(|m| m["name"] == "LP").expect("LP");
    let bits = lp["value"]["bits"].as_str().expect("bits string");
    assert_eq!(bits.len(), 32);
    assert!(bits.ends_with("100")); // 4 as binary
}
