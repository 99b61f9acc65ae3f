// tests/eval.rs
//
// End-to-end constant evaluation through the scripting session.

use sylva::{ConstantValue, SVInt, ScriptSession};

fn int_result(value: &ConstantValue) -> &SVInt {
    value.integer().expect("expected an integer result")
}

fn check_exact(value: &ConstantValue, literal: &str) {
    let expected: SVInt = literal.parse().expect("bad literal in test");
    let got = int_result(value);
    assert!(
        got.exact_equal(&expected),
        "expected {expected}, got {got}"
    );
}

#[test]
fn simple_eval() {
    let mut session = ScriptSession::new();
    let value = session.eval("3 * 3");
    assert_eq!(*int_result(&value), 9u64);

    session.eval("int i = 4;");
    let value = session.eval("i + 9");
    let v = int_result(&value);
    assert_eq!(v.as_i64(), Some(13));
    assert_eq!(v.width(), 32);
    assert!(v.is_signed());
}

#[test]
fn eval_function_calls() {
    let mut session = ScriptSession::new();
    session.eval(
        "function logic [15:0] foo(int a, int b);\n    return a + b;\nendfunction\n",
    );
    let value = session.eval("foo(3, 4)");
    let v = int_result(&value);
    assert_eq!(v.as_u64(), Some(7));
    assert_eq!(v.width(), 16);
    assert!(!v.is_signed());

    session.eval("function int bar();\n    return 2;\n    return 3;\nendfunction\n");
    let value = session.eval("bar()");
    assert_eq!(*int_result(&value), 2u64);
}

#[test]
fn nested_functions() {
    let mut session = ScriptSession::new();
    session.eval(
        "function automatic int symbols_in_data(int dataBitsPerSymbol, int data_width);\n\
             return data_width / dataBitsPerSymbol;\n\
         endfunction\n",
    );
    session.eval(
        "function automatic int num_words_in_address_space(int dataBitsPerSymbol, int data_width, int address_width);\n\
             int address_bits_per_word = $clog2(symbols_in_data(dataBitsPerSymbol, data_width));\n\
             return 2**(address_width - address_bits_per_word);\n\
         endfunction\n",
    );
    let value = session.eval("num_words_in_address_space(8, 64, 20)");
    assert_eq!(*int_result(&value), 131072u64);
}

#[test]
fn module_param() {
    let mut session = ScriptSession::new();
    let module = session.eval("module A#(parameter int P); localparam LP = P + 3; endmodule");
    assert!(module.is_true());
    let instance = session.eval("A #(.P(2)) a0();");
    assert!(instance.is_true());
    let value = session.eval("a0.LP");
    let v = int_result(&value);
    assert_eq!(v.as_i64(), Some(5));
    assert_eq!(v.width(), 32);
    assert!(v.is_signed());
}

#[test]
fn interface_param() {
    let mut session = ScriptSession::new();
    let iface = session.eval(
        "interface IFACE#(parameter int W = 8); logic valid; logic [W-1:0] data; endinterface",
    );
    assert!(iface.is_true());
    let instance = session.eval("IFACE #(6) i0();");
    assert!(instance.is_true());
    let value = session.eval("i0.W");
    assert_eq!(*int_result(&value), 6u64);
}

#[test]
fn eval_if_statement() {
    let mut session = ScriptSession::new();
    session.eval(
        "function logic [15:0] foo(int a);\n\
             if (a == 3)\n        return 4;\n    else\n        return 5;\n\
         endfunction\n",
    );
    assert_eq!(*int_result(&session.eval("foo(3)")), 4u64);
    assert_eq!(*int_result(&session.eval("foo(2)")), 5u64);
}

#[test]
fn shifts() {
    let mut session = ScriptSession::new();
    assert_eq!(*int_result(&session.eval("4 << 2")), 16u64);
    assert_eq!(*int_result(&session.eval("4 <<< 2")), 16u64);
    assert_eq!(*int_result(&session.eval("4 >> 1")), 2u64);
    check_exact(&session.eval("-4 >>> 1"), "-2");
    check_exact(&session.eval("-65'sd4 >>> 1"), "-65'sb10");
}

#[test]
fn conditionals() {
    let mut session = ScriptSession::new();
    assert_eq!(*int_result(&session.eval("2 == 2 ? 5 : 4")), 5u64);
    assert_eq!(*int_result(&session.eval("(2 * 2) == 3 ? 5 : 4")), 4u64);
    // Unknown selectors merge the branches bit-by-bit.
    check_exact(&session.eval("'z ? 5 : 6"), "32'sb1xx");
    check_exact(&session.eval("(1 / 0) ? 128'b101 : 128'b110"), "128'b1xx");
    assert_eq!(*int_result(&session.eval("'x ? 5 : 5")), 5u64);
}

#[test]
fn unbased_unsized_literals() {
    let mut session = ScriptSession::new();
    // Self-determined on the right of a shift: a single one bit.
    assert_eq!(*int_result(&session.eval("1 << '1")), 2u64);
    // Context-determined: expands to the full 65-bit width.
    check_exact(&session.eval("'1 + 65'b0"), "65'h1ffffffffffffffff");
}

#[test]
fn concatenation_and_replication() {
    let mut session = ScriptSession::new();
    check_exact(&session.eval("{2'b11, 3'b101}"), "5'b11101");
    check_exact(&session.eval("{22'b0, 43'b100, 1'b1 / 1'b0}"), "66'b100x");
    check_exact(&session.eval("{4 {2'b10}}"), "8'b10101010");

    // Zero replication is legal inside a concatenation and adds no bits.
    check_exact(&session.eval("{4'b1010, {0 {1'b1}}}"), "4'b1010");
}

#[test]
fn wildcard_equality() {
    let mut session = ScriptSession::new();
    let value = session.eval("{1'b1 / 1'b0, 4'b1001} ==? 5'b11001");
    let v = int_result(&value);
    assert_eq!(v.width(), 1);
    assert_eq!(v.as_u64(), Some(1));
}

#[test]
fn case_equality_is_two_state() {
    let mut session = ScriptSession::new();
    assert_eq!(*int_result(&session.eval("4'b1x0z === 4'b1x0z")), 1u64);
    assert_eq!(*int_result(&session.eval("4'b1x0z === 4'b1x00")), 0u64);
    // Plain equality over unknowns is unknown.
    let v = session.eval("4'b1x00 == 4'b1x00");
    assert!(int_result(&v).has_unknown());
}

#[test]
fn division_and_modulo_by_zero() {
    let mut session = ScriptSession::new();
    let v = session.eval("7 / 0");
    assert!(int_result(&v).has_unknown());
    let v = session.eval("7 % 0");
    assert!(int_result(&v).has_unknown());
    // Division by zero is a warning, not an error.
    assert!(!session.compilation().has_errors());
}

#[test]
fn arithmetic_widths_and_signs() {
    let mut session = ScriptSession::new();
    // Context-determined widening to the larger operand.
    let v = session.eval("16'd40000 + 16'd40000");
    assert_eq!(int_result(&v).width(), 16); // wraps at the common width
    assert_eq!(int_result(&v).as_u64(), Some((80000u64) & 0xFFFF));

    // Signedness only survives when both operands are signed.
    let v = session.eval("-1 < 1");
    assert_eq!(int_result(&v).as_u64(), Some(1));
    let v = session.eval("8'hFF > 8'sh01");
    assert_eq!(int_result(&v).as_u64(), Some(1));
}

#[test]
fn real_arithmetic() {
    let mut session = ScriptSession::new();
    let v = session.eval("1.5 + 2.25");
    assert_eq!(v.real(), Some(3.75));
    let v = session.eval("10 / 4.0");
    assert_eq!(v.real(), Some(2.5));
    let v = session.eval("1.0 < 2.0");
    assert_eq!(*int_result(&v), 1u64);
}

#[test]
fn session_state_accumulates() {
    let mut session = ScriptSession::new();
    session.eval("int a = 1;");
    session.eval("int b = a + 1;");
    session.eval("localparam int C = 10;");
    assert_eq!(*int_result(&session.eval("a + b + C")), 13u64);
}

#[test]
fn enum_and_typedef_declarations() {
    let mut session = ScriptSession::new();
    session.eval("typedef enum logic [1:0] { IDLE = 0, RUN, DONE } state_t;");
    assert_eq!(*int_result(&session.eval("RUN")), 1u64);
    session.eval("typedef logic [7:0] byte_t;");
    session.eval("localparam byte_t MASK = 8'hF0;");
    assert_eq!(*int_result(&session.eval("MASK")), 0xF0u64);
}

#[test]
fn packages_and_imports() {
    let mut session = ScriptSession::new();
    session.eval("package config_pkg; localparam int WIDTH = 12; endpackage");
    assert_eq!(*int_result(&session.eval("config_pkg::WIDTH")), 12u64);
    session.eval("import config_pkg::*;");
    assert_eq!(*int_result(&session.eval("WIDTH + 1")), 13u64);
}

#[test]
fn system_functions() {
    let mut session = ScriptSession::new();
    assert_eq!(*int_result(&session.eval("$clog2(1)")), 0u64);
    assert_eq!(*int_result(&session.eval("$clog2(2)")), 1u64);
    assert_eq!(*int_result(&session.eval("$clog2(7)")), 3u64);
    assert_eq!(*int_result(&session.eval("$clog2(8)")), 3u64);
    assert_eq!(*int_result(&session.eval("$bits(9'b0)")), 9u64);
    let v = session.eval("$signed(4'b1111)");
    assert_eq!(int_result(&v).as_i64(), Some(-1));
}

#[test]
fn power_operator() {
    let mut session = ScriptSession::new();
    assert_eq!(*int_result(&session.eval("2 ** 10")), 1024u64);
    assert_eq!(*int_result(&session.eval("3 ** 0")), 1u64);
    check_exact(&session.eval("(-2) ** 3"), "-8");
}

#[test]
fn undefined_names_are_diagnosed_once() {
    let mut session = ScriptSession::new();
    let v = session.eval("not_defined + 1");
    assert!(v.is_invalid());
    let errors = session
        .diagnostics()
        .into_iter()
        .filter(|d| d.code == "E2001")
        .count();
    assert_eq!(errors, 1);
}
