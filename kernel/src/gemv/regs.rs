//! GEMV register map (byte offsets from the peripheral base).
//!
//! ```text
//! 0x00  CTRL     W   [0]=start (pulse) [3]=clear_done (pulse)
//!                    [4]=len_64 [5]=out_dim_64 [6]=enable_bias
//! 0x04  X_IN     W   next int8 X value
//! 0x08  W_IN     W   next int8 W value (row-major)
//! 0x0C  B_IN     W   next int32 bias value
//! 0x10  Y_OUT    R   int32 Y at the current read index
//! 0x14  STATUS   R   [0]=busy [1]=done
//! 0x18  Y_NEXT   W   any write advances the Y read index (pulse)
//! ```
//!
//! Offsets and bit positions are a binary contract with the hardware.

pub const CTRL: usize = 0x00;
pub const X_IN: usize = 0x04;
pub const W_IN: usize = 0x08;
pub const B_IN: usize = 0x0C;
pub const Y_OUT: usize = 0x10;
pub const STATUS: usize = 0x14;
pub const Y_NEXT: usize = 0x18;

pub mod ctrl {
    /// Start a run (pulse).
    pub const START: u32 = 1 << 0;
    /// Clear done and reset every stream cursor (pulse).
    pub const CLEAR_DONE: u32 = 1 << 3;
    /// Input length is 64 (otherwise 32).
    pub const LEN_64: u32 = 1 << 4;
    /// Output dimension is 64 (otherwise 32).
    pub const OUT_DIM_64: u32 = 1 << 5;
    /// Add B to every output row.
    pub const ENABLE_BIAS: u32 = 1 << 6;

    /// Level bits the peripheral stores from the last CTRL write.
    pub const CONFIG_MASK: u32 = LEN_64 | OUT_DIM_64 | ENABLE_BIAS;
}

pub mod status {
    pub const BUSY: u32 = 1 << 0;
    pub const DONE: u32 = 1 << 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_are_word_aligned_and_distinct() {
        let offsets = [CTRL, X_IN, W_IN, B_IN, Y_OUT, STATUS, Y_NEXT];
        for (i, a) in offsets.iter().enumerate() {
            assert_eq!(a % 4, 0);
            for b in &offsets[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_ctrl_bits_do_not_overlap() {
        let bits = [ctrl::START, ctrl::CLEAR_DONE, ctrl::LEN_64, ctrl::OUT_DIM_64, ctrl::ENABLE_BIAS];
        let combined = bits.iter().fold(0u32, |acc, b| {
            assert_eq!(acc & b, 0, "bit {:#x} overlaps", b);
            acc | b
        });
        assert_eq!(combined, 0b111_1001);
    }
}
