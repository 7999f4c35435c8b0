//! ╔══════════════════════════════════════════════════════════════════╗
//! ║   GEMV ENGINE                                                    ║
//! ║   Y = W · X (+ B), int8 operands, int32 accumulators             ║
//! ║                                                                  ║
//! ║   Idle → Loading → Started → Busy → Done → Draining → Idle       ║
//! ╚══════════════════════════════════════════════════════════════════╝
//!
//! The device is driven through [`GemvRegisters`]. X, W and B are written
//! one element per access into auto-incrementing cursors; Y is drained with
//! read-then-advance. A clear-done pulse resets every cursor, so each run is
//!
//! ```text
//! clear_done → load_x / load_w / [load_b] → start → wait_done → read_y
//! ```
//!
//! Callers must stream exactly `len` X values, `out_dim * len` W values and
//! `out_dim` B values when bias is on, and must drain exactly `out_dim` Y
//! values before the next clear. None of this is checked on the raw steps;
//! [`Gemv::run`] validates slice lengths first.

pub mod regs;
pub mod sim;

#[cfg(feature = "gemv-hw")]
pub mod mmio;

#[cfg(feature = "gemv-hw")]
pub use mmio::MmioGemv;
pub use sim::SimGemv;

use crate::error::{Error, Result};
use regs::{ctrl, status};

/// Largest supported input length.
pub const MAX_LEN: usize = 64;

/// Largest supported output dimension.
pub const MAX_OUT: usize = 64;

/// One of the two shapes the engine supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dim {
    D32,
    D64,
}

impl Dim {
    pub const ALL: [Dim; 2] = [Dim::D32, Dim::D64];

    #[inline]
    pub const fn get(self) -> usize {
        match self {
            Dim::D32 => 32,
            Dim::D64 => 64,
        }
    }
}

impl TryFrom<usize> for Dim {
    type Error = Error;

    fn try_from(n: usize) -> Result<Self> {
        match n {
            32 => Ok(Dim::D32),
            64 => Ok(Dim::D64),
            other => Err(Error::UnsupportedDim(other)),
        }
    }
}

/// Register-level access to a GEMV device.
///
/// CTRL writes are pulses: each call is one event, never re-asserted.
/// The stream methods move the device's implicit cursors.
pub trait GemvRegisters {
    fn write_ctrl(&mut self, value: u32);
    fn read_status(&mut self) -> u32;
    fn stream_write_x(&mut self, value: i8);
    fn stream_write_w(&mut self, value: i8);
    fn stream_write_b(&mut self, value: i32);
    fn stream_read_y_and_advance(&mut self) -> i32;
}

/// Protocol driver over a register backend.
#[derive(Debug)]
pub struct Gemv<R> {
    regs: R,
}

impl<R: GemvRegisters> Gemv<R> {
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Clear the done flag and reset the X/W/B write cursors and the Y
    /// read cursor.
    pub fn clear_done(&mut self) {
        self.regs.write_ctrl(ctrl::CLEAR_DONE);
    }

    pub fn load_x(&mut self, x: &[i8]) {
        for &v in x {
            self.regs.stream_write_x(v);
        }
    }

    /// Row-major, row i feeds output i.
    pub fn load_w(&mut self, w: &[i8]) {
        for &v in w {
            self.regs.stream_write_w(v);
        }
    }

    pub fn load_b(&mut self, b: &[i32]) {
        for &v in b {
            self.regs.stream_write_b(v);
        }
    }

    /// Latch the shape and bias bits and pulse start, all in one CTRL write.
    pub fn start(&mut self, len: Dim, out_dim: Dim, enable_bias: bool) {
        let mut value = ctrl::START;
        if len == Dim::D64 {
            value |= ctrl::LEN_64;
        }
        if out_dim == Dim::D64 {
            value |= ctrl::OUT_DIM_64;
        }
        if enable_bias {
            value |= ctrl::ENABLE_BIAS;
        }
        self.regs.write_ctrl(value);
    }

    /// Busy-poll STATUS until DONE. There is no timeout: a device that never
    /// finishes hangs the caller.
    pub fn wait_done(&mut self) {
        while self.regs.read_status() & status::DONE == 0 {
            core::hint::spin_loop();
        }
    }

    /// Drain `y.len()` results. Must be exactly the `out_dim` of the run.
    pub fn read_y(&mut self, y: &mut [i32]) {
        for slot in y.iter_mut() {
            *slot = self.regs.stream_read_y_and_advance();
        }
    }

    /// Full run with the shape taken from `x.len()` and `y.len()`.
    ///
    /// Every slice length is validated before the device is touched.
    pub fn run(&mut self, x: &[i8], w: &[i8], bias: Option<&[i32]>, y: &mut [i32]) -> Result<()> {
        let len = Dim::try_from(x.len())?;
        let out_dim = Dim::try_from(y.len())?;

        let needed = len.get() * out_dim.get();
        if w.len() != needed {
            return Err(Error::OperandLength {
                operand: "W",
                needed,
                provided: w.len(),
            });
        }
        if let Some(b) = bias {
            if b.len() != out_dim.get() {
                return Err(Error::OperandLength {
                    operand: "B",
                    needed: out_dim.get(),
                    provided: b.len(),
                });
            }
        }

        tracing::debug!(
            len = len.get(),
            out_dim = out_dim.get(),
            bias = bias.is_some(),
            "gemv run"
        );

        self.clear_done();
        self.load_x(x);
        self.load_w(w);
        if let Some(b) = bias {
            self.load_b(b);
        }
        self.start(len, out_dim, bias.is_some());
        self.wait_done();
        self.read_y(y);
        Ok(())
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    pub fn into_inner(self) -> R {
        self.regs
    }
}

/// Software reference: `y[i] = Σ_k w[i * len + k] * x[k] (+ bias[i])`
/// with `len = x.len()` and `out_dim = y.len()`.
///
/// Raw 32-bit accumulators, no saturation (wrapping like the hardware).
pub fn reference_gemv(w: &[i8], x: &[i8], bias: Option<&[i32]>, y: &mut [i32]) {
    let len = x.len();
    debug_assert_eq!(w.len(), len * y.len(), "W dimension mismatch");

    for (i, out) in y.iter_mut().enumerate() {
        let row = &w[i * len..(i + 1) * len];
        let mut acc = bias.map_or(0, |b| b[i]);
        for (&wv, &xv) in row.iter().zip(x) {
            acc = acc.wrapping_add(wv as i32 * xv as i32);
        }
        *out = acc;
    }
}
