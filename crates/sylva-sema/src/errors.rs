// src/errors.rs
//! Semantic (E2xxx) and constant-evaluation (E3xxx) errors.

#![allow(unused_assignments)] // False positives from thiserror derive

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SemanticError {
    #[error("use of undeclared identifier '{name}'")]
    #[diagnostic(code(E2001))]
    UndeclaredIdentifier { name: String },

    #[error("'{name}' is already declared in this scope")]
    #[diagnostic(code(E2002))]
    Redefinition { name: String },

    #[error("cannot convert '{from}' to '{to}'")]
    #[diagnostic(code(E2003))]
    BadConversion { from: String, to: String },

    #[error("operator is not valid for type '{ty}'")]
    #[diagnostic(code(E2004))]
    BadOperand { ty: String },

    #[error("'{name}' is not a value")]
    #[diagnostic(code(E2005))]
    NotAValue { name: String },

    #[error("'{name}' is not callable")]
    #[diagnostic(code(E2006))]
    NotCallable { name: String },

    #[error("wrong number of arguments to '{name}': expected {expected}, got {got}")]
    #[diagnostic(code(E2007))]
    WrongArgCount {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("unknown package '{name}'")]
    #[diagnostic(code(E2008))]
    UnknownPackage { name: String },

    #[error("unknown module or interface '{name}'")]
    #[diagnostic(code(E2009))]
    UnknownDefinition { name: String },

    #[error("'{name}' has a recursive definition")]
    #[diagnostic(code(E2010))]
    RecursiveDefinition { name: String },

    #[error("replication count must be a non-negative constant")]
    #[diagnostic(code(E2011))]
    InvalidReplicationCount,

    #[error("expression is not constant")]
    #[diagnostic(code(E2012))]
    NotAConstant,

    #[error("hierarchical names are not allowed in constant expressions")]
    #[diagnostic(code(E2013))]
    HierarchicalInConst,

    #[error("parameter '{name}' has no value")]
    #[diagnostic(code(E2014))]
    ParameterHasNoValue { name: String },

    #[error("packed array element must be an integral type")]
    #[diagnostic(code(E2015))]
    BadPackedElement,

    #[error("dimension bound is not a constant integer")]
    #[diagnostic(code(E2016))]
    BadDimensionBound,

    #[error("virtual method '{name}' does not match the overridden method: {reason}")]
    #[diagnostic(code(E2017))]
    VirtualMethodMismatch { name: String, reason: String },

    #[error("no out-of-block definition found for '{class_name}::{name}'")]
    #[diagnostic(code(E2018))]
    MissingOutOfBlockDefinition { class_name: String, name: String },

    #[error("return type of '{class_name}::{name}' does not resolve identically at the prototype and the definition")]
    #[diagnostic(code(E2019))]
    OutOfBlockReturnTypeMismatch { class_name: String, name: String },

    #[error("'{name}' is not a type")]
    #[diagnostic(code(E2020))]
    NotAType { name: String },

    #[error("cannot select from type '{ty}'")]
    #[diagnostic(code(E2021))]
    BadSelect { ty: String },

    #[error("unknown member '{name}' in '{scope}'")]
    #[diagnostic(code(E2022))]
    UnknownMember { name: String, scope: String },

    #[error("unknown system function '{name}'")]
    #[diagnostic(code(E2023))]
    UnknownSystemFunction { name: String },

    #[error("assignment requires a variable target")]
    #[diagnostic(code(E2024))]
    BadAssignmentTarget,

    #[error("enum initializer for '{name}' is not an integral constant")]
    #[diagnostic(code(E2025))]
    BadEnumValue { name: String },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum EvalError {
    #[error("division by zero in constant expression")]
    #[diagnostic(code(E3001), severity(Warning))]
    DivideByZero,

    #[error("constant evaluation recursed past the configured depth limit")]
    #[diagnostic(code(E3002))]
    ExceededMaxDepth,

    #[error("index {index} is out of range for this value")]
    #[diagnostic(code(E3003), severity(Warning))]
    IndexOutOfRange { index: i64 },

    #[error("expression cannot be evaluated at compile time")]
    #[diagnostic(code(E3004))]
    NotConstant,

    #[error("value of '{name}' is not available in a constant context")]
    #[diagnostic(code(E3005))]
    ValueNotAvailable { name: String },

    #[error("infinite loop detected in constant evaluation")]
    #[diagnostic(code(E3006))]
    InfiniteLoop,
}
