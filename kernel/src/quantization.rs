//! ╔══════════════════════════════════════════════════════════════════╗
//! ║   QUANTIZATION HELPERS                                           ║
//! ║   Saturating int32 → int8 casts and the frozen rescale shifts    ║
//! ║                                                                  ║
//! ║   Every backend shares these constants. Changing any of them     ║
//! ║   changes the encoder checksum of every build mode.              ║
//! ╚══════════════════════════════════════════════════════════════════╝

use fixed::types::{U1F15, U6F10};

/// Accumulator → int8 rescale after every linear layer.
pub const PROJ_SHIFT: u32 = 7;

/// Attention score scale, stands in for 1/sqrt(D) at D = 32.
pub const ATTN_SCALE_SHIFT: u32 = 5;

/// Extra compression of (score - max) before the exp lookup.
pub const SOFTMAX_RANGE_SHIFT: u32 = 3;

/// Fractional bits of the softmax weights.
pub const Q15_SHIFT: u32 = 15;

/// Lowest exponent the exp table covers.
pub const EXP_MIN: i32 = -15;

/// Q10 fixed-point (exp table entries).
pub type Q10 = U6F10;

/// Q15 fixed-point (normalised softmax weights).
pub type Q15 = U1F15;

/// Saturate a 32-bit accumulator to the signed 8-bit range [-128, 127].
#[inline]
pub fn saturate_i8(x: i32) -> i8 {
    x.clamp(i8::MIN as i32, i8::MAX as i32) as i8
}

/// Rescale an accumulator by [`PROJ_SHIFT`] and saturate.
#[inline]
pub fn requantize(acc: i32) -> i8 {
    saturate_i8(acc >> PROJ_SHIFT)
}

/// Like [`requantize`], but negative accumulators become zero before the
/// saturation step.
#[inline]
pub fn requantize_relu(acc: i32) -> i8 {
    let scaled = acc >> PROJ_SHIFT;
    if scaled < 0 {
        0
    } else {
        saturate_i8(scaled)
    }
}

/// View a raw exp table entry as a Q10 number.
#[inline]
pub fn q10(raw: u16) -> Q10 {
    Q10::from_bits(raw)
}

/// View a raw softmax weight as a Q15 number.
#[inline]
pub fn q15(raw: u16) -> Q15 {
    Q15::from_bits(raw)
}
