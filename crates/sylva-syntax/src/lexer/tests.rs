use sylva_numeric::{Logic, TimeUnit};
use sylva_text::{SourceLocation, SourceManager};

use super::*;
use crate::token::TokenValue;

fn lex_all(text: &str) -> Vec<Token> {
    let sm = SourceManager::new();
    let buf = sm.assign_text("test.sv", text, SourceLocation::NONE);
    let mut lexer = Lexer::new(buf, LanguageVersion::default());
    let mut out = Vec::new();
    loop {
        let tok = lexer.next_token();
        let done = tok.kind == TokenKind::Eof;
        out.push(tok);
        if done {
            break;
        }
    }
    out
}

fn kinds(text: &str) -> Vec<TokenKind> {
    lex_all(text)
        .into_iter()
        .map(|t| t.kind)
        .filter(|&k| k != TokenKind::Eof)
        .collect()
}

#[test]
fn punctuation_and_operators() {
    assert_eq!(
        kinds("a <= b >>> 2"),
        vec![
            TokenKind::Identifier,
            TokenKind::LtEq,
            TokenKind::Identifier,
            TokenKind::GtGtGt,
            TokenKind::IntLiteral
        ]
    );
    assert_eq!(kinds("==?"), vec![TokenKind::EqEqQuestion]);
    assert_eq!(kinds("==="), vec![TokenKind::EqEqEq]);
    assert_eq!(kinds("<<<="), vec![TokenKind::LtLtLtEq]);
    assert_eq!(kinds("::"), vec![TokenKind::ColonColon]);
    assert_eq!(kinds("'{"), vec![TokenKind::ApostropheLBrace]);
    assert_eq!(kinds("<->"), vec![TokenKind::LtMinusGt]);
}

#[test]
fn keywords_and_identifiers() {
    assert_eq!(
        kinds("module foo endmodule"),
        vec![TokenKind::KwModule, TokenKind::Identifier, TokenKind::KwEndmodule]
    );
    // Version gating: `implements` is 1800-2012.
    let sm = SourceManager::new();
    let buf = sm.assign_text("t.sv", "implements", SourceLocation::NONE);
    let mut lexer = Lexer::new(buf, LanguageVersion::V2009);
    assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
}

#[test]
fn escaped_and_system_identifiers() {
    let toks = lex_all("\\esc@ped! $clog2 $");
    assert_eq!(toks[0].kind, TokenKind::Identifier);
    assert_eq!(toks[0].identifier(), "esc@ped!");
    assert_eq!(toks[1].kind, TokenKind::SystemIdentifier);
    assert_eq!(toks[1].text, "$clog2");
    assert_eq!(toks[2].kind, TokenKind::Dollar);
}

#[test]
fn sized_literals() {
    let toks = lex_all("8'hff 5'b11001 -65'sd4 12'o777");
    let v = toks[0].int_value().unwrap();
    assert_eq!(v.width(), 8);
    assert_eq!(v.as_u64(), Some(255));

    let v = toks[1].int_value().unwrap();
    assert_eq!(v.width(), 5);
    assert_eq!(v.as_u64(), Some(25));

    // The minus is a separate token; the literal itself is signed 65-bit.
    assert_eq!(toks[2].kind, TokenKind::Minus);
    let v = toks[3].int_value().unwrap();
    assert_eq!(v.width(), 65);
    assert!(v.is_signed());
    assert_eq!(v.as_u64(), Some(4));
}

#[test]
fn spaced_literal_is_one_token() {
    let toks = lex_all("8 'h ff");
    assert_eq!(toks[0].kind, TokenKind::IntLiteral);
    assert_eq!(toks[0].text, "8 'h ff");
    assert_eq!(toks[0].int_value().unwrap().as_u64(), Some(255));
}

#[test]
fn four_state_literals() {
    let toks = lex_all("4'b10xz 6'b?? 'x");
    let v = toks[0].int_value().unwrap();
    assert_eq!(v.get_bit(0), Logic::Z);
    assert_eq!(v.get_bit(1), Logic::X);
    assert_eq!(v.get_bit(3), Logic::One);

    // `?` reads as Z and the leading unknown extends.
    let v = toks[1].int_value().unwrap();
    assert_eq!(v.get_bit(5), Logic::Z);

    assert_eq!(toks[2].kind, TokenKind::UnbasedUnsizedLiteral);
    assert_eq!(
        toks[2].value,
        Some(TokenValue::UnbasedUnsized(Logic::X))
    );
}

#[test]
fn unbased_unsized_literals() {
    let toks = lex_all("'0 '1 'z");
    for (tok, expect) in toks.iter().zip([Logic::Zero, Logic::One, Logic::Z]) {
        assert_eq!(tok.kind, TokenKind::UnbasedUnsizedLiteral);
        assert_eq!(tok.value, Some(TokenValue::UnbasedUnsized(expect)));
    }
}

#[test]
fn real_literals() {
    let toks = lex_all("3.14 1e10 2.5e-3 1e400 1e-400");
    let real = |t: &Token| match t.value {
        Some(TokenValue::Real { value, out_of_range }) => (value, out_of_range),
        _ => panic!("expected real"),
    };
    assert_eq!(real(&toks[0]), (3.14, false));
    assert_eq!(real(&toks[1]), (1e10, false));
    assert_eq!(real(&toks[2]), (2.5e-3, false));
    // Overflow and underflow carry the out-of-range flag.
    assert!(real(&toks[3]).1);
    assert!(real(&toks[4]).1);
}

#[test]
fn time_literals() {
    let toks = lex_all("10ns 1.5ps 100s");
    let time = |t: &Token| match t.value {
        Some(TokenValue::Time { value, unit }) => (value, unit),
        _ => panic!("expected time"),
    };
    assert_eq!(toks[0].kind, TokenKind::TimeLiteral);
    assert_eq!(time(&toks[0]), (10.0, TimeUnit::Nanoseconds));
    assert_eq!(time(&toks[1]), (1.5, TimeUnit::Picoseconds));
    assert_eq!(time(&toks[2]), (100.0, TimeUnit::Seconds));
}

#[test]
fn strings_and_escapes() {
    let toks = lex_all(r#""hello" "a\n\t\"b" "oct\101" "hex\x41""#);
    assert_eq!(toks[0].string_value(), Some("hello"));
    assert_eq!(toks[1].string_value(), Some("a\n\t\"b"));
    assert_eq!(toks[2].string_value(), Some("octA"));
    assert_eq!(toks[3].string_value(), Some("hexA"));
}

#[test]
fn unterminated_string_reports_error() {
    let sm = SourceManager::new();
    let buf = sm.assign_text("t.sv", "\"abc\nmore", SourceLocation::NONE);
    let mut lexer = Lexer::new(buf, LanguageVersion::default());
    let tok = lexer.next_token();
    assert_eq!(tok.kind, TokenKind::StringLiteral);
    assert!(lexer.take_errors().has_errors());
}

#[test]
fn directives_and_macro_operators() {
    let toks = lex_all("`define `FOO `` `\"");
    assert_eq!(toks[0].kind, TokenKind::Directive);
    assert_eq!(toks[0].text, "`define");
    assert_eq!(toks[1].kind, TokenKind::Directive);
    assert_eq!(toks[1].text, "`FOO");
    assert_eq!(toks[2].kind, TokenKind::MacroPaste);
    assert_eq!(toks[3].kind, TokenKind::MacroQuote);
}

#[test]
fn trivia_attachment_is_lossless() {
    let text = "  // lead\nmodule /* inner */ m;\n";
    let toks = lex_all(text);
    let mut rebuilt = String::new();
    for tok in &toks {
        for t in &tok.trivia {
            rebuilt.push_str(&t.text);
        }
        rebuilt.push_str(&tok.text);
    }
    assert_eq!(rebuilt, text);

    // The module keyword owns the comment and leading blank run.
    assert_eq!(toks[0].kind, TokenKind::KwModule);
    assert_eq!(toks[0].trivia.len(), 3);
    assert_eq!(toks[0].trivia[1].kind, TriviaKind::LineComment);
}

#[test]
fn line_continuation_trivia() {
    let toks = lex_all("a \\\nb");
    assert_eq!(toks[1].trivia.iter().filter(|t| t.kind == TriviaKind::LineContinuation).count(), 1);
    // A continuation does not end the line.
    assert!(!toks[1].trivia.iter().any(|t| t.ends_line()));
}

#[test]
fn include_filename_lexing() {
    let sm = SourceManager::new();
    let buf = sm.assign_text("t.sv", " \"foo.svh\" <bar.svh>", SourceLocation::NONE);
    let mut lexer = Lexer::new(buf, LanguageVersion::default());
    let (tok, system) = lexer.lex_include_filename().unwrap();
    assert_eq!(tok.text, "\"foo.svh\"");
    assert!(!system);
    let (tok, system) = lexer.lex_include_filename().unwrap();
    assert_eq!(tok.text, "<bar.svh>");
    assert!(system);
}
