// src/constant_value.rs
//
// The result universe of constant evaluation.

use std::fmt;

use crate::logic::Logic;
use crate::svint::SVInt;

/// A fully evaluated constant: the sum of every value a constant
/// expression can produce. `Invalid` is the error value; it is absorbing
/// (operating on it yields it) so that one failure doesn't cascade into a
/// wall of diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Invalid,
    Int(SVInt),
    Real(f64),
    ShortReal(f32),
    Str(String),
    Null,
    Unbounded,
    /// Fixed-size or dynamic array elements, index order.
    Array(Vec<ConstantValue>),
    Queue(Vec<ConstantValue>),
    /// Associative array entries in insertion order.
    Assoc(Vec<(ConstantValue, ConstantValue)>),
    /// Struct field values in declaration order.
    Struct(Vec<ConstantValue>),
}

impl ConstantValue {
    pub fn is_invalid(&self) -> bool {
        matches!(self, ConstantValue::Invalid)
    }

    /// The integer payload, if this is an integer.
    pub fn integer(&self) -> Option<&SVInt> {
        match self {
            ConstantValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_integer(self) -> Option<SVInt> {
        match self {
            ConstantValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn real(&self) -> Option<f64> {
        match self {
            ConstantValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn string(&self) -> Option<&str> {
        match self {
            ConstantValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Definite truth for control flow: integers use four-state truthiness
    /// collapsed to "definitely one", reals compare against zero, strings
    /// against emptiness.
    pub fn is_true(&self) -> bool {
        match self {
            ConstantValue::Int(v) => v.to_logic() == Logic::One,
            ConstantValue::Real(v) => *v != 0.0,
            ConstantValue::ShortReal(v) => *v != 0.0,
            ConstantValue::Str(s) => !s.is_empty(),
            _ => false,
        }
    }

    /// The four-state truth of the value, where integers may be unknown.
    pub fn to_logic(&self) -> Logic {
        match self {
            ConstantValue::Int(v) => v.to_logic(),
            ConstantValue::Real(v) => Logic::from_bool(*v != 0.0),
            ConstantValue::ShortReal(v) => Logic::from_bool(*v != 0.0),
            ConstantValue::Str(s) => Logic::from_bool(!s.is_empty()),
            ConstantValue::Invalid => Logic::X,
            _ => Logic::Zero,
        }
    }
}

impl From<SVInt> for ConstantValue {
    fn from(v: SVInt) -> Self {
        ConstantValue::Int(v)
    }
}

impl From<f64> for ConstantValue {
    fn from(v: f64) -> Self {
        ConstantValue::Real(v)
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Invalid => write!(f, "<error>"),
            ConstantValue::Int(v) => write!(f, "{v}"),
            ConstantValue::Real(v) => write!(f, "{v}"),
            ConstantValue::ShortReal(v) => write!(f, "{v}"),
            ConstantValue::Str(s) => write!(f, "\"{s}\""),
            ConstantValue::Null => write!(f, "null"),
            ConstantValue::Unbounded => write!(f, "$"),
            ConstantValue::Array(elems) | ConstantValue::Queue(elems) => {
                write!(f, "'{{")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, "}}")
            }
            ConstantValue::Assoc(entries) => {
                write!(f, "'{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                write!(f, "}}")
            }
            ConstantValue::Struct(fields) => {
                write!(f, "'{{")?;
                for (i, e) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(ConstantValue::Int(SVInt::from_i64(1)).is_true());
        assert!(!ConstantValue::Int(SVInt::from_i64(0)).is_true());
        assert!(!ConstantValue::Int("32'bx".parse().unwrap()).is_true());
        assert!(ConstantValue::Real(0.5).is_true());
        assert!(!ConstantValue::Null.is_true());
        assert_eq!(
            ConstantValue::Int("32'bx".parse().unwrap()).to_logic(),
            Logic::X
        );
    }

    #[test]
    fn accessors() {
        let v = ConstantValue::Int(SVInt::from_i64(7));
        assert_eq!(v.integer().unwrap().as_i64(), Some(7));
        assert!(v.real().is_none());
        assert!(!v.is_invalid());
        assert!(ConstantValue::Invalid.is_invalid());
    }
}
