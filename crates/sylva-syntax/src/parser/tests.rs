use std::sync::Arc;

use sylva_text::SourceManager;

use crate::cst::{SyntaxKind, SyntaxNode};
use crate::options::ParseOptions;
use crate::printer::SyntaxPrinter;
use crate::syntax_tree::SyntaxTree;
use crate::token::TokenKind;

fn parse(text: &str) -> SyntaxTree {
    SyntaxTree::from_text(text, Arc::new(SourceManager::new()), ParseOptions::default())
}

fn parse_expr(text: &str) -> SyntaxNode {
    let (node, diags) = SyntaxTree::expression_from_text(
        text,
        Arc::new(SourceManager::new()),
        ParseOptions::default(),
    );
    assert!(!diags.has_errors(), "unexpected errors in {text:?}");
    node
}

fn roundtrip(text: &str) {
    let tree = parse(text);
    let printed = SyntaxPrinter::new(tree.source_manager())
        .print_node(tree.root())
        .finish();
    assert_eq!(printed, text);
}

#[test]
fn parse_empty_module() {
    let tree = parse("module m; endmodule\n");
    assert!(!tree.diagnostics().has_errors());
    let module = tree.root().child_node(SyntaxKind::ModuleDeclaration).unwrap();
    let header = module.child_node(SyntaxKind::ModuleHeader).unwrap();
    assert_eq!(header.name_token().unwrap().text, "m");
}

#[test]
fn parse_module_with_parameter_ports() {
    let tree = parse("module A #(parameter int P, localparam L = 3)(input logic clk); endmodule\n");
    assert!(!tree.diagnostics().has_errors());
    let module = tree.root().child_node(SyntaxKind::ModuleDeclaration).unwrap();
    let header = module.child_node(SyntaxKind::ModuleHeader).unwrap();
    let params = header.child_node(SyntaxKind::ParameterPortList).unwrap();
    assert_eq!(params.child_nodes(SyntaxKind::ParameterDeclaration).count(), 2);
    let ports = header.child_node(SyntaxKind::PortList).unwrap();
    assert_eq!(ports.child_nodes(SyntaxKind::PortDeclaration).count(), 1);
}

#[test]
fn parse_module_members() {
    let tree = parse(
        "module m;\n  localparam LP = 4;\n  logic [7:0] data;\n  wire w = 1'b0;\n  assign w = data[0];\n  always_comb data = '0;\nendmodule\n",
    );
    assert!(!tree.diagnostics().has_errors());
    let module = tree.root().child_node(SyntaxKind::ModuleDeclaration).unwrap();
    assert!(module.child_node(SyntaxKind::ParameterDeclaration).is_some());
    assert!(module.child_node(SyntaxKind::VariableDeclaration).is_some());
    assert!(module.child_node(SyntaxKind::NetDeclaration).is_some());
    assert!(module.child_node(SyntaxKind::ContinuousAssign).is_some());
    assert!(module.child_node(SyntaxKind::ProceduralBlock).is_some());
}

#[test]
fn parse_hierarchy_instantiation() {
    let tree = parse("module top; A #(.P(2)) a0(.clk(c), .d(d0)); endmodule\n");
    assert!(!tree.diagnostics().has_errors());
    let module = tree.root().child_node(SyntaxKind::ModuleDeclaration).unwrap();
    let inst = module.child_node(SyntaxKind::HierarchyInstantiation).unwrap();
    assert!(inst.child_node(SyntaxKind::ParameterValueAssignment).is_some());
    let hier = inst.child_node(SyntaxKind::HierarchicalInstance).unwrap();
    assert_eq!(hier.name_token().unwrap().text, "a0");
    assert_eq!(hier.child_nodes(SyntaxKind::NamedPortConnection).count(), 2);
}

#[test]
fn instantiation_vs_declaration_disambiguation() {
    // `foo_t x;` is a variable declaration, `foo u0();` an instantiation.
    let tree = parse("module m; foo_t x; foo u0(); endmodule\n");
    assert!(!tree.diagnostics().has_errors());
    let module = tree.root().child_node(SyntaxKind::ModuleDeclaration).unwrap();
    assert!(module.child_node(SyntaxKind::VariableDeclaration).is_some());
    assert!(module.child_node(SyntaxKind::HierarchyInstantiation).is_some());
}

#[test]
fn parse_class_with_qualifiers() {
    let tree = parse(
        "class C extends Base implements I;\n  local int x;\n  rand logic [3:0] r;\n  static function int get(); return x; endfunction\n  pure virtual function void hook();\nendclass\n",
    );
    assert!(!tree.diagnostics().has_errors());
    let class = tree.root().child_node(SyntaxKind::ClassDeclaration).unwrap();
    assert!(class.child_node(SyntaxKind::ExtendsClause).is_some());
    assert!(class.child_node(SyntaxKind::ImplementsClause).is_some());
    assert_eq!(class.child_nodes(SyntaxKind::ClassProperty).count(), 2);
    assert!(class.child_nodes(SyntaxKind::ClassMethod).count() >= 2);
}

#[test]
fn qualifier_conflicts_are_diagnosed() {
    let tree = parse("class C; rand randc int x; endclass\n");
    assert!(tree.diagnostics().iter().any(|d| d.code == "E1009"));

    let tree = parse("class C; local protected int x; endclass\n");
    assert!(tree.diagnostics().iter().any(|d| d.code == "E1009"));

    let tree = parse("class C; pure function void f(); endclass\n");
    assert!(tree.diagnostics().iter().any(|d| d.code == "E1011"));
}

#[test]
fn out_of_block_definition_is_registered() {
    let tree = parse(
        "class C; extern function int get(); endclass\nfunction int C::get(); return 5; endfunction\n",
    );
    assert!(!tree.diagnostics().has_errors());
    let defs = tree.out_of_block_defs();
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].class_name, "C");
    assert_eq!(defs[0].member_name, "get");
    assert_eq!(defs[0].syntax.kind, SyntaxKind::FunctionDeclaration);
}

#[test]
fn end_block_name_mismatch() {
    let tree = parse("module m; endmodule : wrong\n");
    assert!(tree.diagnostics().iter().any(|d| d.code == "E1007"));

    // A matching name is fine.
    let tree = parse("module m; endmodule : m\n");
    assert!(!tree.diagnostics().has_errors());
}

#[test]
fn member_not_allowed_in_parent() {
    // A modport outside an interface.
    let tree = parse("module m; modport mp (input a); endmodule\n");
    assert!(tree.diagnostics().iter().any(|d| d.code == "E1008"));

    // always blocks are fine in modules but not packages.
    let tree = parse("package p; always_comb x = 1; endpackage\n");
    assert!(tree.diagnostics().iter().any(|d| d.code == "E1008"));
}

#[test]
fn parse_generate_constructs() {
    let tree = parse(
        "module m;\n  genvar i;\n  generate\n    for (i = 0; i < 4; i = i + 1) begin : g\n      wire w;\n    end\n  endgenerate\n  if (P) begin wire a; end else begin wire b; end\nendmodule\n",
    );
    assert!(!tree.diagnostics().has_errors());
    let module = tree.root().child_node(SyntaxKind::ModuleDeclaration).unwrap();
    let region = module.child_node(SyntaxKind::GenerateRegion).unwrap();
    assert!(region.child_node(SyntaxKind::LoopGenerate).is_some());
    assert!(module.child_node(SyntaxKind::IfGenerate).is_some());
}

#[test]
fn parse_typedef_enum_struct() {
    let tree = parse(
        "typedef enum logic [1:0] { A = 0, B, C } state_t;\ntypedef struct packed { logic [7:0] lo; logic [7:0] hi; } pair_t;\n",
    );
    assert!(!tree.diagnostics().has_errors());
    let typedefs: Vec<_> = tree
        .root()
        .child_nodes(SyntaxKind::TypedefDeclaration)
        .collect();
    assert_eq!(typedefs.len(), 2);
    let en = typedefs[0].child_node(SyntaxKind::EnumType).unwrap();
    assert_eq!(en.child_nodes(SyntaxKind::EnumMember).count(), 3);
    let st = typedefs[1].child_node(SyntaxKind::StructUnionType).unwrap();
    assert_eq!(st.child_nodes(SyntaxKind::StructUnionMember).count(), 2);
}

#[test]
fn parse_function_with_statements() {
    let tree = parse(
        "function logic [15:0] foo(int a, int b);\n  if (a == 3)\n    return 4;\n  else\n    return a + b;\nendfunction\n",
    );
    assert!(!tree.diagnostics().has_errors());
    let func = tree
        .root()
        .child_node(SyntaxKind::FunctionDeclaration)
        .unwrap();
    let ports = func.child_node(SyntaxKind::FunctionPortList).unwrap();
    assert_eq!(ports.child_nodes(SyntaxKind::FunctionPort).count(), 2);
    assert!(func.child_node(SyntaxKind::ConditionalStatement).is_some());
}

#[test]
fn expression_precedence() {
    // 1 + 2 * 3: the multiply binds tighter.
    let expr = parse_expr("1 + 2 * 3");
    assert_eq!(expr.kind, SyntaxKind::BinaryExpression);
    let plus = expr.child_token(TokenKind::Plus);
    assert!(plus.is_some());
    let rhs = expr.nodes().nth(1).unwrap();
    assert_eq!(rhs.kind, SyntaxKind::BinaryExpression);
    assert!(rhs.child_token(TokenKind::Star).is_some());

    // Shifts bind looser than addition.
    let expr = parse_expr("a + b << c");
    assert!(expr.child_token(TokenKind::LtLt).is_some());

    // Power is right-associative.
    let expr = parse_expr("2 ** 3 ** 2");
    let rhs = expr.nodes().nth(1).unwrap();
    assert_eq!(rhs.kind, SyntaxKind::BinaryExpression);
}

#[test]
fn conditional_and_selects() {
    let expr = parse_expr("sel ? a[3:0] : b[i]");
    assert_eq!(expr.kind, SyntaxKind::ConditionalExpression);
    let range = expr
        .nodes()
        .find(|n| n.kind == SyntaxKind::RangeSelectExpression);
    assert!(range.is_some());
    let elem = expr
        .nodes()
        .find(|n| n.kind == SyntaxKind::ElementSelectExpression);
    assert!(elem.is_some());
}

#[test]
fn concatenation_and_replication() {
    let expr = parse_expr("{2'b11, 3'b101}");
    assert_eq!(expr.kind, SyntaxKind::ConcatenationExpression);

    let expr = parse_expr("{4 {2'b10}}");
    assert_eq!(expr.kind, SyntaxKind::ReplicationExpression);
}

#[test]
fn scoped_names_and_system_calls() {
    let expr = parse_expr("pkg::value + $clog2(16)");
    assert!(expr
        .nodes()
        .any(|n| n.kind == SyntaxKind::ScopedNameExpression));
    assert!(expr.nodes().any(|n| n.kind == SyntaxKind::SystemCallExpression));
}

#[test]
fn labeled_assertion_statement() {
    let tree = parse(
        "module m; initial begin check_it : assert (x == 1) else y = 0; end endmodule\n",
    );
    assert!(!tree.diagnostics().has_errors());
    let mut found = false;
    fn walk(n: &SyntaxNode, found: &mut bool) {
        if n.kind == SyntaxKind::LabeledStatement {
            *found = true;
        }
        for c in n.nodes() {
            walk(c, found);
        }
    }
    walk(tree.root(), &mut found);
    assert!(found);
}

#[test]
fn error_recovery_produces_one_diagnostic() {
    let tree = parse("module m; int 5x; wire w; endmodule\n");
    // One expected-token error for the bad declarator, then recovery; the
    // following member still parses.
    let errors: Vec<_> = tree.diagnostics().iter().filter(|d| d.is_error()).collect();
    assert!(!errors.is_empty());
    let module = tree.root().child_node(SyntaxKind::ModuleDeclaration).unwrap();
    assert!(module.child_node(SyntaxKind::NetDeclaration).is_some());
    assert!(module.last_token().is_some());
}

#[test]
fn missing_tokens_keep_tree_well_formed() {
    let tree = parse("module m\nendmodule\n"); // missing semicolon
    assert!(tree.diagnostics().has_errors());
    let module = tree.root().child_node(SyntaxKind::ModuleDeclaration).unwrap();
    let header = module.child_node(SyntaxKind::ModuleHeader).unwrap();
    let semi = header.child_token(TokenKind::Semicolon).unwrap();
    assert!(semi.missing);
}

#[test]
fn roundtrip_preserves_bytes() {
    roundtrip("module m; endmodule\n");
    roundtrip("  /* c */ module m;\n  logic [7:0] x = 8'hff; // t\nendmodule\n");
    roundtrip("`define W 8\nmodule m; logic [`W-1:0] x; endmodule\n");
    roundtrip("`ifdef NOPE\nint a;\n`else\nint b;\n`endif\n");
    roundtrip("class C; rand randc int x; endclass\n"); // even with errors
}

#[test]
fn roundtrip_with_expanded_macros() {
    let text = "`define W 8\nlogic [`W-1:0] x;\n";
    let tree = parse(text);
    let expanded = SyntaxPrinter::new(tree.source_manager())
        .expand_macros(true)
        .include_directives(false)
        .print_node(tree.root())
        .finish();
    assert!(expanded.contains("8-1:0]"));
    assert!(!expanded.contains("`W"));
}
