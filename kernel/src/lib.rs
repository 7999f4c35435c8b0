//! ╔══════════════════════════════════════════════════════════════════╗
//! ║   TinyFormer Kernel — Fixed-Point Encoder + Accelerator Drivers  ║
//! ║                                                                  ║
//! ║   Modules:                                                       ║
//! ║   - quantization: saturating casts and frozen shift constants    ║
//! ║   - exp_lut: Q10 exp table (software / MMIO)                     ║
//! ║   - dot8: 4-lane int8 dot product (software / custom-0)          ║
//! ║   - gemv: register-protocol matrix-vector engine                 ║
//! ║   - weights: fixed-shape int8 weight set                         ║
//! ║   - encoder: streaming single-head encoder block                 ║
//! ║   - selftest: hardware/software equivalence harness              ║
//! ╚══════════════════════════════════════════════════════════════════╝

#![cfg_attr(not(test), no_std)]

pub mod dot8;
pub mod encoder;
pub mod error;
pub mod exp_lut;
pub mod gemv;
pub mod quantization;
pub mod selftest;
pub mod weights;

// Re-export commonly used items
pub use dot8::{dot8_4_lanes, pack, unpack, Dot8, SoftwareDot8};
pub use encoder::{checksum, Encoder, TokenMatrix, D_FFN, D_MODEL, SEQ_LEN};
pub use error::{Error, Result};
pub use exp_lut::{exp_lut_value, score_to_exp, ExpLut, SoftwareExpLut, EXP_LUT_GOLDEN};
pub use quantization::saturate_i8;
pub use gemv::{reference_gemv, Dim, Gemv, GemvRegisters, SimGemv};
pub use selftest::{run_all, test_dot8, test_gemv, test_lut, Lcg, SelfTestError, Summary};
pub use weights::Weights;
