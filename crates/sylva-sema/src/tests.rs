use std::sync::Arc;

use sylva_syntax::{ParseOptions, SyntaxTree};
use sylva_text::SourceManager;

use crate::binder::BindContext;
use crate::{Compilation, CompilationOptions, EvalContext};

fn compile(sources: &[&str]) -> Compilation {
    let comp = Compilation::new(CompilationOptions {
        allow_hierarchical_in_const: true,
        ..CompilationOptions::default()
    });
    let sm = Arc::new(SourceManager::new());
    for src in sources {
        let tree = SyntaxTree::from_text(src, sm.clone(), ParseOptions::default());
        comp.add_syntax_tree(&tree);
    }
    comp
}

fn eval_expr(comp: &Compilation, text: &str) -> sylva_numeric::ConstantValue {
    let sm = comp
        .source_manager()
        .unwrap_or_else(|| Arc::new(SourceManager::new()));
    let (node, diags) = SyntaxTree::expression_from_text(text, sm, ParseOptions::default());
    assert!(!diags.has_errors(), "parse errors in {text:?}");
    let ctx = BindContext::new(comp.unit_scope());
    let bound = comp.bind_expression(&node, &ctx);
    let mut eval = EvalContext::new(comp);
    eval.eval(&bound)
}

fn eval_int(comp: &Compilation, text: &str) -> i64 {
    eval_expr(comp, text)
        .integer()
        .and_then(|v| v.as_i64())
        .unwrap_or_else(|| panic!("{text:?} did not produce an integer"))
}

#[test]
fn parameters_elaborate_in_declaration_order() {
    let comp = compile(&["localparam int A = 4; localparam B = A * 2;"]);
    assert_eq!(eval_int(&comp, "B"), 8);
    assert_eq!(eval_int(&comp, "A + B"), 12);
    assert!(!comp.has_errors());
}

#[test]
fn self_referential_parameter_is_recursive() {
    let comp = compile(&["localparam int A = A + 1;"]);
    let _ = eval_expr(&comp, "A");
    assert!(comp.diagnostics().iter().any(|d| d.code == "E2010"));
}

#[test]
fn forward_reference_is_not_visible() {
    // B is declared after A, so A's initializer cannot see it.
    let comp = compile(&["localparam int A = B; localparam int B = 1;"]);
    let _ = eval_expr(&comp, "A");
    assert!(comp.diagnostics().iter().any(|d| d.code == "E2001"));
}

#[test]
fn module_parameters_flow_into_instances() {
    let comp = compile(&[
        "module A #(parameter int P); localparam LP = P + 3; endmodule",
        "A #(.P(2)) a0();",
    ]);
    let v = eval_expr(&comp, "a0.LP");
    assert_eq!(v.integer().and_then(|i| i.as_i64()), Some(5));
    let int_val = v.integer().unwrap();
    assert_eq!(int_val.width(), 32);
    assert!(int_val.is_signed());
}

#[test]
fn interface_parameters_with_positional_override() {
    let comp = compile(&[
        "interface IFACE #(parameter int W = 8); logic valid; logic [W-1:0] data; endinterface",
        "IFACE #(6) i0();",
    ]);
    assert_eq!(eval_int(&comp, "i0.W"), 6);
}

#[test]
fn default_parameter_value_applies_without_override() {
    let comp = compile(&[
        "module M #(parameter int W = 16); localparam HALF = W / 2; endmodule",
        "M m0();",
    ]);
    assert_eq!(eval_int(&comp, "m0.HALF"), 8);
}

#[test]
fn functions_evaluate_with_arguments() {
    let comp = compile(&[
        "function logic [15:0] foo(int a, int b); return a + b; endfunction",
    ]);
    let v = eval_expr(&comp, "foo(3, 4)");
    let i = v.integer().unwrap();
    assert_eq!(i.as_u64(), Some(7));
    assert_eq!(i.width(), 16);
    assert!(!i.is_signed());
}

#[test]
fn first_return_wins() {
    let comp = compile(&["function int bar(); return 2; return 3; endfunction"]);
    assert_eq!(eval_int(&comp, "bar()"), 2);
}

#[test]
fn function_if_else_branches() {
    let comp = compile(&[
        "function logic [15:0] foo(int a); if (a == 3) return 4; else return 5; endfunction",
    ]);
    assert_eq!(eval_int(&comp, "foo(3)"), 4);
    assert_eq!(eval_int(&comp, "foo(2)"), 5);
}

#[test]
fn nested_function_calls_with_system_functions() {
    let comp = compile(&[
        "function automatic int symbols_in_data(int dataBitsPerSymbol, int data_width);\n\
           return data_width / dataBitsPerSymbol;\n\
         endfunction",
        "function automatic int num_words_in_address_space(int dataBitsPerSymbol, int data_width, int address_width);\n\
           int address_bits_per_word = $clog2(symbols_in_data(dataBitsPerSymbol, data_width));\n\
           return 2**(address_width - address_bits_per_word);\n\
         endfunction",
    ]);
    assert_eq!(eval_int(&comp, "num_words_in_address_space(8, 64, 20)"), 131072);
}

#[test]
fn typedefs_resolve_through_aliases() {
    let comp = compile(&[
        "typedef logic [7:0] byte_t; localparam byte_t X = 8'hAB;",
    ]);
    assert_eq!(eval_int(&comp, "X"), 0xAB);
    assert!(!comp.has_errors());
}

#[test]
fn enum_values_enter_the_enclosing_scope() {
    let comp = compile(&["typedef enum logic [1:0] { A = 0, B, C } state_t;"]);
    assert_eq!(eval_int(&comp, "B"), 1);
    assert_eq!(eval_int(&comp, "C"), 2);
}

#[test]
fn package_scoped_lookup() {
    let comp = compile(&[
        "package p; localparam int V = 42; endpackage",
        "localparam int W = p::V + 1;",
    ]);
    assert_eq!(eval_int(&comp, "W"), 43);
    assert_eq!(eval_int(&comp, "p::V"), 42);
}

#[test]
fn wildcard_imports_fill_in_after_locals() {
    let comp = compile(&[
        "package p; localparam int V = 10; endpackage",
        "import p::*; localparam int W = V * 2;",
    ]);
    assert_eq!(eval_int(&comp, "W"), 20);
}

#[test]
fn out_of_block_method_definition_links_up() {
    let comp = compile(&[
        "class C; extern function int get(); endclass\n\
         function int C::get(); return 5; endfunction",
    ]);
    // Elaborate the class; the prototype resolves through the registry.
    let _ = eval_expr(&comp, "1");
    let unit = comp.unit_scope();
    let class = comp
        .scope_members(unit)
        .into_iter()
        .find(|id| comp.symbol(*id).name == "C")
        .expect("class symbol");
    let scope = comp.symbol_scope(class).expect("class scope");
    let proto = comp
        .scope_members(scope)
        .into_iter()
        .find(|id| comp.symbol(*id).name == "get")
        .expect("prototype symbol");
    let sub = comp.prototype_subroutine(proto);
    assert!(sub.is_some());
    assert!(!comp.has_errors());
}

#[test]
fn missing_out_of_block_definition_is_diagnosed() {
    let comp = compile(&["class C; extern function int get(); endclass"]);
    let unit = comp.unit_scope();
    let class = comp
        .scope_members(unit)
        .into_iter()
        .find(|id| comp.symbol(*id).name == "C")
        .unwrap();
    let scope = comp.symbol_scope(class).unwrap();
    let proto = comp
        .scope_members(scope)
        .into_iter()
        .find(|id| comp.symbol(*id).name == "get")
        .unwrap();
    assert!(comp.prototype_subroutine(proto).is_none());
    assert!(comp.diagnostics().iter().any(|d| d.code == "E2018"));
}

#[test]
fn virtual_method_override_mismatch_is_diagnosed() {
    let comp = compile(&[
        "class Base; virtual function int get(int a); return a; endfunction endclass\n\
         class Derived extends Base; virtual function int get(int a, int b); return a; endfunction endclass",
    ]);
    let unit = comp.unit_scope();
    let derived = comp
        .scope_members(unit)
        .into_iter()
        .find(|id| comp.symbol(*id).name == "Derived")
        .unwrap();
    let _ = comp.symbol_scope(derived);
    assert!(comp.diagnostics().iter().any(|d| d.code == "E2017"));
}

#[test]
fn if_generate_selects_a_branch() {
    let comp = compile(&[
        "module M #(parameter int SEL = 1);\n\
           if (SEL) begin : g\n\
             localparam int V = 100;\n\
           end else begin : g2\n\
             localparam int V = 200;\n\
           end\n\
         endmodule",
        "M m0();",
    ]);
    // The taken branch's generate block exposes its members.
    let unit = comp.unit_scope();
    let inst = comp
        .scope_members(unit)
        .into_iter()
        .find(|id| comp.symbol(*id).name == "m0")
        .unwrap();
    let body = comp.symbol_scope(inst).unwrap();
    let gen = comp
        .scope_members(body)
        .into_iter()
        .find(|id| comp.symbol(*id).name == "g")
        .expect("generate block");
    let gen_scope = comp.symbol_scope(gen).expect("generate scope");
    let v = comp
        .scope_members(gen_scope)
        .into_iter()
        .find(|id| comp.symbol(*id).name == "V")
        .expect("generated parameter");
    let value = comp.parameter_value(v);
    assert_eq!(value.integer().and_then(|i| i.as_i64()), Some(100));
}

#[test]
fn undeclared_name_produces_error_value() {
    let comp = compile(&[]);
    let v = eval_expr(&comp, "nonexistent + 1");
    assert!(v.is_invalid());
    assert!(comp.diagnostics().iter().any(|d| d.code == "E2001"));
}
