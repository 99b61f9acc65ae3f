// src/token.rs

use sylva_numeric::{Logic, SVInt, TimeUnit};
use sylva_text::{SourceLocation, SourceRange};

use crate::trivia::Trivia;

/// All token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Markers
    Eof,
    Unknown,

    // Literals and names
    Identifier,
    SystemIdentifier,
    IntLiteral,
    UnbasedUnsizedLiteral,
    RealLiteral,
    TimeLiteral,
    StringLiteral,

    // Preprocessor
    Directive,
    MacroQuote, // `"
    MacroPaste, // ``

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    ApostropheLBrace, // '{
    Semicolon,
    Comma,
    Dot,
    DotStar, // .*
    Colon,
    ColonColon,
    Hash,
    At,
    Dollar,
    Question,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    Eq,
    EqEq,
    BangEq,
    EqEqEq,
    BangEqEq,
    EqEqQuestion,
    BangEqQuestion,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AmpAmp,
    PipePipe,
    Bang,
    MinusGt,   // ->
    LtMinusGt, // <->
    Amp,
    Pipe,
    Caret,
    Tilde,
    TildeAmp,
    TildePipe,
    TildeCaret,
    CaretTilde,
    LtLt,
    GtGt,
    LtLtLt,
    GtGtGt,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    LtLtEq,
    GtGtEq,
    LtLtLtEq,
    GtGtGtEq,
    PlusPlus,
    MinusMinus,
    PlusColon,  // +: (part select width)
    MinusColon, // -:

    // Keywords
    KwAlias,
    KwAlways,
    KwAlwaysComb,
    KwAlwaysFf,
    KwAlwaysLatch,
    KwAnd,
    KwAssert,
    KwAssign,
    KwAssume,
    KwAutomatic,
    KwBegin,
    KwBind,
    KwBit,
    KwBreak,
    KwByte,
    KwCase,
    KwCasex,
    KwCasez,
    KwChandle,
    KwChecker,
    KwClass,
    KwClocking,
    KwConst,
    KwConstraint,
    KwContinue,
    KwCover,
    KwCovergroup,
    KwDefault,
    KwDefparam,
    KwDisable,
    KwDo,
    KwEdge,
    KwElse,
    KwEnd,
    KwEndcase,
    KwEndchecker,
    KwEndclass,
    KwEndclocking,
    KwEndfunction,
    KwEndgenerate,
    KwEndgroup,
    KwEndinterface,
    KwEndmodule,
    KwEndpackage,
    KwEndprogram,
    KwEndproperty,
    KwEndsequence,
    KwEndtask,
    KwEnum,
    KwEvent,
    KwExport,
    KwExtends,
    KwExtern,
    KwFinal,
    KwFor,
    KwForce,
    KwForeach,
    KwForever,
    KwFork,
    KwFunction,
    KwGenerate,
    KwGenvar,
    KwGlobal,
    KwIf,
    KwImplements,
    KwImport,
    KwInitial,
    KwInout,
    KwInput,
    KwInt,
    KwInteger,
    KwInterconnect,
    KwInterface,
    KwJoin,
    KwJoinAny,
    KwJoinNone,
    KwLet,
    KwLocal,
    KwLocalparam,
    KwLogic,
    KwLongint,
    KwModport,
    KwModule,
    KwNettype,
    KwNew,
    KwNegedge,
    KwNot,
    KwNull,
    KwOr,
    KwOutput,
    KwPackage,
    KwPacked,
    KwParameter,
    KwPosedge,
    KwPriority,
    KwProgram,
    KwProperty,
    KwProtected,
    KwPure,
    KwRand,
    KwRandc,
    KwReal,
    KwRealtime,
    KwRef,
    KwReg,
    KwRelease,
    KwRepeat,
    KwReturn,
    KwSequence,
    KwShortint,
    KwShortreal,
    KwSigned,
    KwSoft,
    KwSpecparam,
    KwStatic,
    KwString,
    KwStruct,
    KwSuper,
    KwSupply0,
    KwSupply1,
    KwTagged,
    KwTask,
    KwThis,
    KwTime,
    KwTimeprecision,
    KwTimeunit,
    KwTri,
    KwTri0,
    KwTri1,
    KwTriand,
    KwTrior,
    KwTrireg,
    KwType,
    KwTypedef,
    KwUnion,
    KwUnique,
    KwUnique0,
    KwUnsigned,
    KwUwire,
    KwVar,
    KwVirtual,
    KwVoid,
    KwWait,
    KwWand,
    KwWhile,
    KwWire,
    KwWor,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        (self as u32) >= (TokenKind::KwAlias as u32)
    }

    /// Built-in integral type keywords.
    pub fn is_integral_type_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::KwBit
                | TokenKind::KwLogic
                | TokenKind::KwReg
                | TokenKind::KwByte
                | TokenKind::KwShortint
                | TokenKind::KwInt
                | TokenKind::KwLongint
                | TokenKind::KwInteger
                | TokenKind::KwTime
        )
    }

    pub fn is_net_type_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::KwWire
                | TokenKind::KwWand
                | TokenKind::KwWor
                | TokenKind::KwTri
                | TokenKind::KwTri0
                | TokenKind::KwTri1
                | TokenKind::KwTriand
                | TokenKind::KwTrior
                | TokenKind::KwTrireg
                | TokenKind::KwSupply0
                | TokenKind::KwSupply1
                | TokenKind::KwUwire
        )
    }

    /// A short display name for diagnostics.
    pub fn display(self) -> &'static str {
        match self {
            TokenKind::Eof => "end of file",
            TokenKind::Unknown => "invalid token",
            TokenKind::Identifier => "identifier",
            TokenKind::SystemIdentifier => "system name",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::UnbasedUnsizedLiteral => "literal",
            TokenKind::RealLiteral => "real literal",
            TokenKind::TimeLiteral => "time literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Directive => "directive",
            TokenKind::MacroQuote => "`\"",
            TokenKind::MacroPaste => "``",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::ApostropheLBrace => "'{",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::DotStar => ".*",
            TokenKind::Colon => ":",
            TokenKind::ColonColon => "::",
            TokenKind::Hash => "#",
            TokenKind::At => "@",
            TokenKind::Dollar => "$",
            TokenKind::Question => "?",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::StarStar => "**",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::BangEq => "!=",
            TokenKind::EqEqEq => "===",
            TokenKind::BangEqEq => "!==",
            TokenKind::EqEqQuestion => "==?",
            TokenKind::BangEqQuestion => "!=?",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::Bang => "!",
            TokenKind::MinusGt => "->",
            TokenKind::LtMinusGt => "<->",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::TildeAmp => "~&",
            TokenKind::TildePipe => "~|",
            TokenKind::TildeCaret => "~^",
            TokenKind::CaretTilde => "^~",
            TokenKind::LtLt => "<<",
            TokenKind::GtGt => ">>",
            TokenKind::LtLtLt => "<<<",
            TokenKind::GtGtGt => ">>>",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::AmpEq => "&=",
            TokenKind::PipeEq => "|=",
            TokenKind::CaretEq => "^=",
            TokenKind::LtLtEq => "<<=",
            TokenKind::GtGtEq => ">>=",
            TokenKind::LtLtLtEq => "<<<=",
            TokenKind::GtGtGtEq => ">>>=",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::PlusColon => "+:",
            TokenKind::MinusColon => "-:",
            _ => crate::keywords::keyword_text(self).unwrap_or("keyword"),
        }
    }
}

/// The parsed payload of a literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Int(SVInt),
    UnbasedUnsized(Logic),
    Real { value: f64, out_of_range: bool },
    Time { value: f64, unit: TimeUnit },
    Str(String),
}

/// One lexed token: kind, location, raw text exactly as written, an
/// optional parsed value, and the trivia that preceded it. Tokens are
/// immutable once produced; the syntax tree keeps every one so printing
/// reproduces the input byte for byte.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: SourceLocation,
    pub text: String,
    pub value: Option<TokenValue>,
    pub trivia: Vec<Trivia>,
    /// True for tokens fabricated by parser error recovery; they have no
    /// source text of their own.
    pub missing: bool,
}

impl Token {
    pub fn new(kind: TokenKind, loc: SourceLocation, text: impl Into<String>) -> Token {
        Token {
            kind,
            loc,
            text: text.into(),
            value: None,
            trivia: Vec::new(),
            missing: false,
        }
    }

    pub fn with_value(mut self, value: TokenValue) -> Token {
        self.value = Some(value);
        self
    }

    /// A parser-fabricated placeholder for a token that should have been
    /// present.
    pub fn missing(kind: TokenKind, loc: SourceLocation) -> Token {
        Token {
            kind,
            loc,
            text: String::new(),
            value: None,
            trivia: Vec::new(),
            missing: true,
        }
    }

    pub fn range(&self) -> SourceRange {
        SourceRange::new(self.loc, self.loc + self.text.len())
    }

    /// The integer payload of an `IntLiteral`.
    pub fn int_value(&self) -> Option<&SVInt> {
        match &self.value {
            Some(TokenValue::Int(v)) => Some(v),
            _ => None,
        }
    }

    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            Some(TokenValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Identifier text, stripping the leading backslash of escaped
    /// identifiers.
    pub fn identifier(&self) -> &str {
        match self.text.strip_prefix('\\') {
            Some(rest) => rest,
            None => &self.text,
        }
    }
}
