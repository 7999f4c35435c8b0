//! ╔══════════════════════════════════════════════════════════════════╗
//! ║   EXP LOOKUP TABLE                                               ║
//! ║   Decaying exp for x in [-15, 0], Q10 fixed point                ║
//! ║                                                                  ║
//! ║   Index i = -x, entry / 1024 = exp value, entry 0 = 1.0          ║
//! ╚══════════════════════════════════════════════════════════════════╝

use crate::quantization::EXP_MIN;

/// Number of entries in the table.
pub const EXP_LUT_LEN: usize = 16;

/// Golden table shared by the encoder, the software backend and the
/// hardware peripheral. The self-test compares hardware against it.
pub const EXP_LUT_GOLDEN: [u16; EXP_LUT_LEN] = [
    1024, 754, 556, 410, 302, 223, 165, 122, 90, 67, 50, 37, 28, 21, 16, 12,
];

/// Exp table backend.
pub trait ExpLut {
    /// Q10 table entry for exponent `-index`. Indices past the end clamp to
    /// the last entry.
    fn value(&self, index: u32) -> u16;
}

/// Table lookup in software.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareExpLut;

impl ExpLut for SoftwareExpLut {
    #[inline]
    fn value(&self, index: u32) -> u16 {
        exp_lut_value(index)
    }
}

/// Software lookup into [`EXP_LUT_GOLDEN`].
#[inline]
pub fn exp_lut_value(index: u32) -> u16 {
    let idx = (index as usize).min(EXP_LUT_LEN - 1);
    EXP_LUT_GOLDEN[idx]
}

/// Clamp an exponent to [-15, 0] and look up e^x.
///
/// Positive exponents map to e^0, exponents below -15 map to e^-15.
#[inline]
pub fn score_to_exp<L: ExpLut + ?Sized>(lut: &L, x: i32) -> u16 {
    let clamped = x.clamp(EXP_MIN, 0);
    lut.value((-clamped) as u32)
}

#[cfg(feature = "exp-lut-hw")]
pub use mmio::MmioExpLut;

#[cfg(feature = "exp-lut-hw")]
mod mmio {
    use super::{ExpLut, EXP_LUT_GOLDEN, EXP_LUT_LEN};
    use core::ptr;

    const INDEX: usize = 0x00;
    const VALUE: usize = 0x04;

    /// Exp LUT peripheral: write INDEX, read VALUE (low 16 bits).
    #[derive(Debug)]
    pub struct MmioExpLut {
        base: usize,
    }

    impl MmioExpLut {
        /// # Safety
        ///
        /// `base` must be the address of the exp LUT register block, mapped
        /// for the lifetime of the returned value, and no other code may
        /// drive the peripheral concurrently.
        pub const unsafe fn new(base: usize) -> Self {
            Self { base }
        }
    }

    impl ExpLut for MmioExpLut {
        fn value(&self, index: u32) -> u16 {
            if index as usize >= EXP_LUT_LEN {
                return EXP_LUT_GOLDEN[EXP_LUT_LEN - 1];
            }
            // SAFETY: register addresses come from the contract of `new`.
            unsafe {
                ptr::write_volatile((self.base + INDEX) as *mut u32, index);
                (ptr::read_volatile((self.base + VALUE) as *const u32) & 0xFFFF) as u16
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantization::{q10, Q10};

    #[test]
    fn test_table_in_range() {
        for i in 0..EXP_LUT_LEN {
            assert_eq!(exp_lut_value(i as u32), EXP_LUT_GOLDEN[i]);
        }
    }

    #[test]
    fn test_index_clamps() {
        assert_eq!(exp_lut_value(16), 12);
        assert_eq!(exp_lut_value(1000), 12);
        assert_eq!(exp_lut_value(u32::MAX), 12);
    }

    #[test]
    fn test_table_is_monotonic() {
        for w in EXP_LUT_GOLDEN.windows(2) {
            assert!(w[0] > w[1], "exp table must strictly decrease: {:?}", w);
        }
    }

    #[test]
    fn test_entry_zero_is_one() {
        assert_eq!(q10(EXP_LUT_GOLDEN[0]).to_num::<u32>(), 1);
        assert!(q10(EXP_LUT_GOLDEN[15]) < Q10::from_num(0.02));
    }

    #[test]
    fn test_score_to_exp_clamps() {
        let lut = SoftwareExpLut;
        for x in -15..=0 {
            assert_eq!(score_to_exp(&lut, x), EXP_LUT_GOLDEN[(-x) as usize]);
        }
        assert_eq!(score_to_exp(&lut, 1), 1024);
        assert_eq!(score_to_exp(&lut, i32::MAX), 1024);
        assert_eq!(score_to_exp(&lut, -16), 12);
        assert_eq!(score_to_exp(&lut, i32::MIN), 12);
    }
}
