// src/errors.rs
//! Lexer (E0xxx), preprocessor (E05xx), and parser (E1xxx) errors.

#![allow(unused_assignments)] // False positives from thiserror derive

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum LexerError {
    #[error("unexpected character '{ch}'")]
    #[diagnostic(code(E0001))]
    UnexpectedCharacter { ch: char },

    #[error("unterminated string literal")]
    #[diagnostic(code(E0002), help("add a closing '\"' to terminate the string"))]
    UnterminatedString,

    #[error("unterminated block comment")]
    #[diagnostic(code(E0003))]
    UnterminatedBlockComment,

    #[error("nested block comments are not allowed")]
    #[diagnostic(code(E0004))]
    NestedBlockComment,

    #[error("invalid integer literal")]
    #[diagnostic(code(E0005))]
    InvalidNumber,

    #[error("expected digits after the base specifier")]
    #[diagnostic(code(E0006))]
    MissingVectorDigits,

    #[error("digit '{digit}' is not valid in this base")]
    #[diagnostic(code(E0007))]
    BadDigitForBase { digit: char },

    #[error("decimal literals may use x/z only as the whole value")]
    #[diagnostic(code(E0008))]
    DecimalXZ,

    #[error("real literal is out of range and was rounded to {rounded}")]
    #[diagnostic(code(E0009), severity(Warning))]
    RealLiteralOutOfRange { rounded: f64 },

    #[error("escaped identifier must be terminated by whitespace")]
    #[diagnostic(code(E0010))]
    BadEscapedIdentifier,

    #[error("invalid string escape '\\{ch}'")]
    #[diagnostic(code(E0011))]
    InvalidEscapeSequence { ch: char },

    #[error("expected an identifier after '$'")]
    #[diagnostic(code(E0012))]
    MissingSystemName,

    #[error("literal size {size} is too large")]
    #[diagnostic(code(E0013))]
    LiteralSizeTooLarge { size: u64 },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum PreprocessorError {
    #[error("unknown directive `{name}")]
    #[diagnostic(code(E0501))]
    UnknownDirective { name: String },

    #[error("macro `{name} is not defined")]
    #[diagnostic(code(E0502))]
    UndefinedMacro { name: String },

    #[error("macro '{name}' redefined with a different body")]
    #[diagnostic(code(E0503), severity(Warning))]
    MacroRedefined { name: String },

    #[error("`{directive} without a matching `ifdef")]
    #[diagnostic(code(E0504))]
    UnexpectedConditionalDirective { directive: String },

    #[error("missing `endif before end of file")]
    #[diagnostic(code(E0505))]
    MissingEndIfDirective,

    #[error("could not find include file {name}")]
    #[diagnostic(code(E0506))]
    CouldNotOpenIncludeFile { name: String },

    #[error("include files are nested too deeply")]
    #[diagnostic(code(E0507))]
    ExceededMaxIncludeDepth,

    #[error("macro expansions are nested too deeply")]
    #[diagnostic(code(E0508))]
    ExceededMaxMacroDepth,

    #[error("macro '{name}' cannot expand inside its own expansion")]
    #[diagnostic(code(E0509))]
    RecursiveMacro { name: String },

    #[error("wrong number of arguments for macro '{name}': expected {expected}, got {got}")]
    #[diagnostic(code(E0510))]
    WrongMacroArgCount {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("expected a macro argument list")]
    #[diagnostic(code(E0511))]
    ExpectedMacroArgs,

    #[error("token paste does not form a single valid token")]
    #[diagnostic(code(E0512))]
    BadTokenPaste,

    #[error("expected include file name")]
    #[diagnostic(code(E0513))]
    ExpectedIncludeFileName,

    #[error("malformed `line directive")]
    #[diagnostic(code(E0514))]
    InvalidLineDirective,

    #[error("malformed `timescale directive")]
    #[diagnostic(code(E0515))]
    InvalidTimescale,

    #[error("`error: {message}")]
    #[diagnostic(code(E0516))]
    UserDefinedError { message: String },

    #[error("unterminated macro argument list")]
    #[diagnostic(code(E0517))]
    UnterminatedMacroArgs,
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParserError {
    #[error("expected {expected}, found '{found}'")]
    #[diagnostic(code(E1001))]
    ExpectedToken { expected: String, found: String },

    #[error("expected expression, found '{found}'")]
    #[diagnostic(code(E1002))]
    ExpectedExpression { found: String },

    #[error("expected identifier")]
    #[diagnostic(code(E1003))]
    ExpectedIdentifier,

    #[error("expected a data type, found '{found}'")]
    #[diagnostic(code(E1004))]
    ExpectedDataType { found: String },

    #[error("expected statement, found '{found}'")]
    #[diagnostic(code(E1005))]
    ExpectedStatement { found: String },

    #[error("expected {expected} member, found '{found}'")]
    #[diagnostic(code(E1006))]
    ExpectedMember { expected: String, found: String },

    #[error("block name '{found}' does not match '{expected}'")]
    #[diagnostic(code(E1007))]
    EndNameMismatch { expected: String, found: String },

    #[error("{kind} is not allowed in {parent}")]
    #[diagnostic(code(E1008))]
    NotAllowedInContext { kind: String, parent: String },

    #[error("qualifier '{qualifier}' conflicts with '{other}'")]
    #[diagnostic(code(E1009))]
    QualifierConflict { qualifier: String, other: String },

    #[error("qualifier '{qualifier}' is repeated")]
    #[diagnostic(code(E1010))]
    DuplicateQualifier { qualifier: String },

    #[error("'pure' requires the method to also be 'virtual'")]
    #[diagnostic(code(E1011))]
    PureRequiresVirtual,

    #[error("'{qualifier}' must come first in the qualifier list")]
    #[diagnostic(code(E1012))]
    QualifierNotFirst { qualifier: String },

    #[error("expressions are nested too deeply")]
    #[diagnostic(code(E1013))]
    ExceededMaxParseDepth,

    #[error("real literal is out of range")]
    #[diagnostic(code(E1014), severity(Warning))]
    RealLiteralOutOfRange,

    #[error("signed integer literal overflows 32 bits")]
    #[diagnostic(code(E1015), severity(Warning))]
    SignedIntegerOverflow,

    #[error("replication count must come before a nested concatenation")]
    #[diagnostic(code(E1016))]
    InvalidReplication,
}
