//! ╔══════════════════════════════════════════════════════════════════╗
//! ║   EQUIVALENCE SELF-TESTS                                         ║
//! ║   Backend under test vs software reference, exact equality       ║
//! ║                                                                  ║
//! ║   DOT8: 1000 random lane pairs                                   ║
//! ║   LUT:  16 table entries + 16 clamped exponent probes            ║
//! ║   GEMV: (len, out_dim) ∈ {32, 64}², bias off                     ║
//! ╚══════════════════════════════════════════════════════════════════╝
//!
//! Operands come from a fixed-seed LCG so every run, on every target,
//! exercises the same vectors. A comparator stops at its first mismatch.

use thiserror::Error;

use crate::dot8::{pack, Dot8};
use crate::encoder::TokenMatrix;
use crate::exp_lut::{score_to_exp, ExpLut, EXP_LUT_GOLDEN, EXP_LUT_LEN};
use crate::gemv::{reference_gemv, Dim, Gemv, GemvRegisters, MAX_LEN, MAX_OUT};

pub const LCG_SEED: u32 = 1;
pub const LCG_MUL: u32 = 1_664_525;
pub const LCG_INC: u32 = 1_013_904_223;

pub const DOT8_TRIALS: u32 = 1000;

/// Deterministic linear-congruential generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
        self.state
    }

    /// High byte of the next state.
    pub fn next_u8(&mut self) -> u8 {
        (self.next_u32() >> 24) as u8
    }

    pub fn next_i8(&mut self) -> i8 {
        self.next_u8() as i8
    }

    /// Row-major token matrix of `high_byte - 128` samples.
    pub fn token_matrix(&mut self) -> TokenMatrix {
        let mut m = [[0i8; crate::D_MODEL]; crate::SEQ_LEN];
        for v in m.iter_mut().flatten() {
            *v = self.next_u8().wrapping_sub(128) as i8;
        }
        m
    }
}

impl Default for Lcg {
    fn default() -> Self {
        Self::new(LCG_SEED)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfTestError {
    #[error("DOT8 FAIL iter={iter:#010x} sw={sw:#010x} hw={hw:#010x}")]
    Dot8Mismatch { iter: u32, sw: i32, hw: i32 },

    #[error("LUT FAIL idx={index:#010x} golden={golden:#010x} hw={hw:#010x}")]
    LutMismatch { index: u32, golden: u16, hw: u16 },

    #[error("LUT FAIL score_to_exp x={x:#010x} expected={expected:#010x} got={got:#010x}")]
    ScoreToExpMismatch { x: i32, expected: u16, got: u16 },

    #[error(
        "GEMV FAIL len={len:#010x} out_dim={out_dim:#010x} i={index:#010x} ref={reference:#010x} hw={hw:#010x}"
    )]
    GemvMismatch {
        len: usize,
        out_dim: usize,
        index: usize,
        reference: i32,
        hw: i32,
    },
}

/// DOT8 backend vs scalar lane products.
pub fn test_dot8<D: Dot8 + ?Sized>(engine: &D) -> Result<(), SelfTestError> {
    let mut lcg = Lcg::default();

    for iter in 0..DOT8_TRIALS {
        let mut a = [0i8; 4];
        let mut b = [0i8; 4];
        for i in 0..4 {
            a[i] = lcg.next_i8();
            b[i] = lcg.next_i8();
        }
        let sw: i32 = a.iter().zip(&b).map(|(&x, &y)| x as i32 * y as i32).sum();
        let hw = engine.dot(pack(a), pack(b));

        if hw != sw {
            let err = SelfTestError::Dot8Mismatch { iter, sw, hw };
            tracing::error!(iter, sw, hw, "{}", err);
            return Err(err);
        }
    }

    tracing::info!("DOT8 PASS");
    Ok(())
}

/// LUT backend vs golden table, then the clamped exponent mapping.
pub fn test_lut<L: ExpLut + ?Sized>(lut: &L) -> Result<(), SelfTestError> {
    for (index, &golden) in EXP_LUT_GOLDEN.iter().enumerate() {
        let index = index as u32;
        let hw = lut.value(index);
        if hw != golden {
            let err = SelfTestError::LutMismatch { index, golden, hw };
            tracing::error!(index, golden, hw, "{}", err);
            return Err(err);
        }
    }

    for x in (-(EXP_LUT_LEN as i32 - 1)..=0).rev() {
        let expected = EXP_LUT_GOLDEN[(-x) as usize];
        let got = score_to_exp(lut, x);
        if got != expected {
            let err = SelfTestError::ScoreToExpMismatch { x, expected, got };
            tracing::error!(x, expected, got, "{}", err);
            return Err(err);
        }
    }

    tracing::info!("LUT PASS");
    Ok(())
}

/// GEMV device vs [`reference_gemv`] for all four shapes.
pub fn test_gemv<R: GemvRegisters>(gemv: &mut Gemv<R>) -> Result<(), SelfTestError> {
    for (len, out_dim) in [
        (Dim::D32, Dim::D32),
        (Dim::D64, Dim::D32),
        (Dim::D32, Dim::D64),
        (Dim::D64, Dim::D64),
    ] {
        gemv_one(gemv, len, out_dim)?;
    }

    tracing::info!("GEMV self-test PASS");
    Ok(())
}

fn gemv_one<R: GemvRegisters>(
    gemv: &mut Gemv<R>,
    len_dim: Dim,
    out_dim_dim: Dim,
) -> Result<(), SelfTestError> {
    let (len, out_dim) = (len_dim.get(), out_dim_dim.get());
    let mut x = [0i8; MAX_LEN];
    let mut w = [0i8; MAX_OUT * MAX_LEN];
    let mut ref_y = [0i32; MAX_OUT];
    let mut hw_y = [0i32; MAX_OUT];

    let (x, w) = (&mut x[..len], &mut w[..out_dim * len]);
    let (ref_y, hw_y) = (&mut ref_y[..out_dim], &mut hw_y[..out_dim]);

    let mut lcg = Lcg::default();
    x.iter_mut().for_each(|v| *v = lcg.next_i8());
    w.iter_mut().for_each(|v| *v = lcg.next_i8());

    reference_gemv(w, x, None, ref_y);

    gemv.clear_done();
    gemv.load_x(x);
    gemv.load_w(w);
    gemv.start(len_dim, out_dim_dim, false);
    gemv.wait_done();
    gemv.read_y(hw_y);

    for (index, (&reference, &hw)) in ref_y.iter().zip(hw_y.iter()).enumerate() {
        if hw != reference {
            let err = SelfTestError::GemvMismatch {
                len,
                out_dim,
                index,
                reference,
                hw,
            };
            tracing::error!(len, out_dim, index, reference, hw, "{}", err);
            return Err(err);
        }
    }
    Ok(())
}

/// Outcome of every comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub dot8: Result<(), SelfTestError>,
    pub lut: Result<(), SelfTestError>,
    pub gemv: Result<(), SelfTestError>,
}

impl Summary {
    pub fn all_passed(&self) -> bool {
        self.dot8.is_ok() && self.lut.is_ok() && self.gemv.is_ok()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SelfTestError> {
        [&self.dot8, &self.lut, &self.gemv]
            .into_iter()
            .filter_map(|r| r.as_ref().err())
    }
}

/// Run all three comparators. A failure in one does not skip the others.
pub fn run_all<D, L, R>(dot8: &D, lut: &L, gemv: &mut Gemv<R>) -> Summary
where
    D: Dot8 + ?Sized,
    L: ExpLut + ?Sized,
    R: GemvRegisters,
{
    let summary = Summary {
        dot8: test_dot8(dot8),
        lut: test_lut(lut),
        gemv: test_gemv(gemv),
    };
    tracing::debug!(passed = summary.all_passed(), "self-test summary");
    summary
}
