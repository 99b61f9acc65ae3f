// src/lib.rs
//! Numeric foundations for the sylva SystemVerilog front-end: the
//! four-state arbitrary-precision `SVInt`, the `Logic` scalar, time
//! scales, and the constant-value universe produced by evaluation.

mod constant_value;
mod logic;
mod svint;
mod time;

pub use constant_value::ConstantValue;
pub use logic::Logic;
pub use svint::{LiteralBase, ParseSVIntError, SVInt, VectorDigit};
pub use time::{TimeScale, TimeScaleValue, TimeUnit};
