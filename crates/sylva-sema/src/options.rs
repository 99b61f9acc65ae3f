// src/options.rs

/// Options controlling elaboration and constant evaluation.
#[derive(Debug, Clone)]
pub struct CompilationOptions {
    /// Cap on constant-evaluator recursion (function call depth).
    pub max_constexpr_depth: usize,
    /// Cap on loop iterations inside one constant evaluation.
    pub max_constexpr_steps: usize,
    /// Relax the ban on hierarchical names in constant expressions.
    pub allow_hierarchical_in_const: bool,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        CompilationOptions {
            max_constexpr_depth: 128,
            max_constexpr_steps: 1 << 20,
            allow_hierarchical_in_const: false,
        }
    }
}
