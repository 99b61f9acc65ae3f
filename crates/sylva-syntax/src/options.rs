// src/options.rs

use sylva_numeric::TimeScale;

use crate::keywords::LanguageVersion;
use crate::preprocessor::DefaultNetType;

/// Options controlling lexing, preprocessing, and parsing.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Keyword and grammar set to compile against.
    pub language_version: LanguageVersion,
    /// Cap on recursive `include expansion.
    pub max_include_depth: usize,
    /// Cap on recursive macro expansion.
    pub max_macro_depth: usize,
    /// Cap on parser recursion (deeply nested expressions).
    pub max_parse_depth: usize,
    /// Timescale in effect before any `timescale directive.
    pub default_timescale: Option<TimeScale>,
    /// Net type in effect before any `default_nettype directive.
    pub default_nettype: DefaultNetType,
    /// `(name, body)` pairs defined before every compilation unit.
    pub predefined_macros: Vec<(String, String)>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            language_version: LanguageVersion::default(),
            max_include_depth: 1024,
            max_macro_depth: 32,
            max_parse_depth: 512,
            default_timescale: None,
            default_nettype: DefaultNetType::Wire,
            predefined_macros: Vec::new(),
        }
    }
}
