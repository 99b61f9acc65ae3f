// src/keywords.rs
//
// Versioned keyword table. Each keyword records the language version that
// introduced it; the lexer only recognizes keywords at or below the
// configured version, so e.g. `implements` stays an identifier under
// 1800-2009.

use crate::token::TokenKind;

/// The IEEE 1800 revision to compile against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LanguageVersion {
    V2005,
    V2009,
    V2012,
    #[default]
    V2017,
    V2023,
}

impl LanguageVersion {
    pub fn name(self) -> &'static str {
        match self {
            LanguageVersion::V2005 => "1800-2005",
            LanguageVersion::V2009 => "1800-2009",
            LanguageVersion::V2012 => "1800-2012",
            LanguageVersion::V2017 => "1800-2017",
            LanguageVersion::V2023 => "1800-2023",
        }
    }
}

macro_rules! keyword_table {
    ($(($text:literal, $kind:ident, $version:ident)),* $(,)?) => {
        /// Looks up a keyword, honoring the version it was introduced in.
        pub fn keyword_lookup(text: &str, version: LanguageVersion) -> Option<TokenKind> {
            let (kind, introduced) = match text {
                $($text => (TokenKind::$kind, LanguageVersion::$version),)*
                _ => return None,
            };
            if introduced <= version {
                Some(kind)
            } else {
                None
            }
        }

        /// The source text of a keyword kind.
        pub fn keyword_text(kind: TokenKind) -> Option<&'static str> {
            match kind {
                $(TokenKind::$kind => Some($text),)*
                _ => None,
            }
        }
    };
}

keyword_table! {
    ("alias", KwAlias, V2005),
    ("always", KwAlways, V2005),
    ("always_comb", KwAlwaysComb, V2005),
    ("always_ff", KwAlwaysFf, V2005),
    ("always_latch", KwAlwaysLatch, V2005),
    ("and", KwAnd, V2005),
    ("assert", KwAssert, V2005),
    ("assign", KwAssign, V2005),
    ("assume", KwAssume, V2005),
    ("automatic", KwAutomatic, V2005),
    ("begin", KwBegin, V2005),
    ("bind", KwBind, V2005),
    ("bit", KwBit, V2005),
    ("break", KwBreak, V2005),
    ("byte", KwByte, V2005),
    ("case", KwCase, V2005),
    ("casex", KwCasex, V2005),
    ("casez", KwCasez, V2005),
    ("chandle", KwChandle, V2005),
    ("checker", KwChecker, V2009),
    ("class", KwClass, V2005),
    ("clocking", KwClocking, V2005),
    ("const", KwConst, V2005),
    ("constraint", KwConstraint, V2005),
    ("continue", KwContinue, V2005),
    ("cover", KwCover, V2005),
    ("covergroup", KwCovergroup, V2005),
    ("default", KwDefault, V2005),
    ("defparam", KwDefparam, V2005),
    ("disable", KwDisable, V2005),
    ("do", KwDo, V2005),
    ("edge", KwEdge, V2005),
    ("else", KwElse, V2005),
    ("end", KwEnd, V2005),
    ("endcase", KwEndcase, V2005),
    ("endchecker", KwEndchecker, V2009),
    ("endclass", KwEndclass, V2005),
    ("endclocking", KwEndclocking, V2005),
    ("endfunction", KwEndfunction, V2005),
    ("endgenerate", KwEndgenerate, V2005),
    ("endgroup", KwEndgroup, V2005),
    ("endinterface", KwEndinterface, V2005),
    ("endmodule", KwEndmodule, V2005),
    ("endpackage", KwEndpackage, V2005),
    ("endprogram", KwEndprogram, V2005),
    ("endproperty", KwEndproperty, V2005),
    ("endsequence", KwEndsequence, V2005),
    ("endtask", KwEndtask, V2005),
    ("enum", KwEnum, V2005),
    ("event", KwEvent, V2005),
    ("export", KwExport, V2005),
    ("extends", KwExtends, V2005),
    ("extern", KwExtern, V2005),
    ("final", KwFinal, V2005),
    ("for", KwFor, V2005),
    ("force", KwForce, V2005),
    ("foreach", KwForeach, V2005),
    ("forever", KwForever, V2005),
    ("fork", KwFork, V2005),
    ("function", KwFunction, V2005),
    ("generate", KwGenerate, V2005),
    ("genvar", KwGenvar, V2005),
    ("global", KwGlobal, V2009),
    ("if", KwIf, V2005),
    ("implements", KwImplements, V2012),
    ("import", KwImport, V2005),
    ("initial", KwInitial, V2005),
    ("inout", KwInout, V2005),
    ("input", KwInput, V2005),
    ("int", KwInt, V2005),
    ("integer", KwInteger, V2005),
    ("interconnect", KwInterconnect, V2012),
    ("interface", KwInterface, V2005),
    ("join", KwJoin, V2005),
    ("join_any", KwJoinAny, V2005),
    ("join_none", KwJoinNone, V2005),
    ("let", KwLet, V2009),
    ("local", KwLocal, V2005),
    ("localparam", KwLocalparam, V2005),
    ("logic", KwLogic, V2005),
    ("longint", KwLongint, V2005),
    ("modport", KwModport, V2005),
    ("module", KwModule, V2005),
    ("nettype", KwNettype, V2012),
    ("new", KwNew, V2005),
    ("negedge", KwNegedge, V2005),
    ("not", KwNot, V2005),
    ("null", KwNull, V2005),
    ("or", KwOr, V2005),
    ("output", KwOutput, V2005),
    ("package", KwPackage, V2005),
    ("packed", KwPacked, V2005),
    ("parameter", KwParameter, V2005),
    ("posedge", KwPosedge, V2005),
    ("priority", KwPriority, V2005),
    ("program", KwProgram, V2005),
    ("property", KwProperty, V2005),
    ("protected", KwProtected, V2005),
    ("pure", KwPure, V2005),
    ("rand", KwRand, V2005),
    ("randc", KwRandc, V2005),
    ("real", KwReal, V2005),
    ("realtime", KwRealtime, V2005),
    ("ref", KwRef, V2005),
    ("reg", KwReg, V2005),
    ("release", KwRelease, V2005),
    ("repeat", KwRepeat, V2005),
    ("return", KwReturn, V2005),
    ("sequence", KwSequence, V2005),
    ("shortint", KwShortint, V2005),
    ("shortreal", KwShortreal, V2005),
    ("signed", KwSigned, V2005),
    ("soft", KwSoft, V2012),
    ("specparam", KwSpecparam, V2005),
    ("static", KwStatic, V2005),
    ("string", KwString, V2005),
    ("struct", KwStruct, V2005),
    ("super", KwSuper, V2005),
    ("supply0", KwSupply0, V2005),
    ("supply1", KwSupply1, V2005),
    ("tagged", KwTagged, V2005),
    ("task", KwTask, V2005),
    ("this", KwThis, V2005),
    ("time", KwTime, V2005),
    ("timeprecision", KwTimeprecision, V2005),
    ("timeunit", KwTimeunit, V2005),
    ("tri", KwTri, V2005),
    ("tri0", KwTri0, V2005),
    ("tri1", KwTri1, V2005),
    ("triand", KwTriand, V2005),
    ("trior", KwTrior, V2005),
    ("trireg", KwTrireg, V2005),
    ("type", KwType, V2005),
    ("typedef", KwTypedef, V2005),
    ("union", KwUnion, V2005),
    ("unique", KwUnique, V2005),
    ("unique0", KwUnique0, V2009),
    ("unsigned", KwUnsigned, V2005),
    ("uwire", KwUwire, V2005),
    ("var", KwVar, V2005),
    ("virtual", KwVirtual, V2005),
    ("void", KwVoid, V2005),
    ("wait", KwWait, V2005),
    ("wand", KwWand, V2005),
    ("while", KwWhile, V2005),
    ("wire", KwWire, V2005),
    ("wor", KwWor, V2005),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_gating() {
        assert_eq!(
            keyword_lookup("implements", LanguageVersion::V2017),
            Some(TokenKind::KwImplements)
        );
        assert_eq!(keyword_lookup("implements", LanguageVersion::V2009), None);
        assert_eq!(keyword_lookup("module", LanguageVersion::V2005), Some(TokenKind::KwModule));
        assert_eq!(keyword_lookup("not_a_keyword", LanguageVersion::V2023), None);
    }

    #[test]
    fn keyword_text_roundtrip() {
        assert_eq!(keyword_text(TokenKind::KwEndmodule), Some("endmodule"));
        assert_eq!(keyword_text(TokenKind::Identifier), None);
    }
}
