//! Error types for the TinyFormer kernel
//!
//! The numeric path has no error channel: out-of-range LUT indices clamp and
//! protocol misuse is undefined. Only shape conversion, checked GEMV runs and
//! weight loading can fail.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Unsupported GEMV dimension: {0} (expected 32 or 64)")]
    UnsupportedDim(usize),

    #[error("Operand length mismatch for {operand}: need {needed}, got {provided}")]
    OperandLength {
        operand: &'static str,
        needed: usize,
        provided: usize,
    },

    #[error("Weight blob has wrong size: need {needed} bytes, got {provided}")]
    WeightBlobSize { needed: usize, provided: usize },
}

pub type Result<T> = core::result::Result<T, Error>;
