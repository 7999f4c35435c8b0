//! In-process GEMV device model.
//!
//! Follows the peripheral's register semantics: stream writes land at
//! auto-incrementing cursors, CTRL writes are single events, Y advances
//! only on an explicit advance, and a clear-done resets every cursor.
//! Writes past a buffer's capacity are dropped.

use super::regs::{ctrl, status};
use super::{GemvRegisters, MAX_LEN, MAX_OUT};

pub struct SimGemv {
    x: [i8; MAX_LEN],
    w: [i8; MAX_OUT * MAX_LEN],
    b: [i32; MAX_OUT],
    y: [i32; MAX_OUT],
    x_pos: usize,
    w_pos: usize,
    b_pos: usize,
    y_pos: usize,
    /// Level bits stored from the last CTRL write.
    config: u32,
    done: bool,
    latency: u32,
    busy_polls: u32,
}

impl SimGemv {
    /// A device that reports done on the first status read after start.
    pub const fn new() -> Self {
        Self::with_latency(0)
    }

    /// A device that reports BUSY for `latency` status reads after start.
    pub const fn with_latency(latency: u32) -> Self {
        Self {
            x: [0; MAX_LEN],
            w: [0; MAX_OUT * MAX_LEN],
            b: [0; MAX_OUT],
            y: [0; MAX_OUT],
            x_pos: 0,
            w_pos: 0,
            b_pos: 0,
            y_pos: 0,
            config: 0,
            done: false,
            latency,
            busy_polls: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_busy(&self) -> bool {
        self.busy_polls > 0
    }

    /// Current (X, W, B, Y) cursor positions.
    pub fn cursors(&self) -> (usize, usize, usize, usize) {
        (self.x_pos, self.w_pos, self.b_pos, self.y_pos)
    }

    fn clear(&mut self) {
        self.done = false;
        self.busy_polls = 0;
        self.x_pos = 0;
        self.w_pos = 0;
        self.b_pos = 0;
        self.y_pos = 0;
    }

    fn compute(&mut self) {
        let len = if self.config & ctrl::LEN_64 != 0 { 64 } else { 32 };
        let out_dim = if self.config & ctrl::OUT_DIM_64 != 0 { 64 } else { 32 };
        let bias = self.config & ctrl::ENABLE_BIAS != 0;

        tracing::trace!(len, out_dim, bias, "sim gemv start");

        let x = &self.x[..len];
        for (i, y) in self.y[..out_dim].iter_mut().enumerate() {
            let row = &self.w[i * len..(i + 1) * len];
            let mut acc = if bias { self.b[i] } else { 0 };
            for (&wv, &xv) in row.iter().zip(x) {
                acc = acc.wrapping_add(wv as i32 * xv as i32);
            }
            *y = acc;
        }

        if self.latency == 0 {
            self.done = true;
        } else {
            self.busy_polls = self.latency;
        }
    }
}

impl Default for SimGemv {
    fn default() -> Self {
        Self::new()
    }
}

impl GemvRegisters for SimGemv {
    fn write_ctrl(&mut self, value: u32) {
        self.config = value & ctrl::CONFIG_MASK;
        if value & ctrl::CLEAR_DONE != 0 {
            self.clear();
        }
        if value & ctrl::START != 0 {
            self.compute();
        }
    }

    fn read_status(&mut self) -> u32 {
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            if self.busy_polls == 0 {
                self.done = true;
            }
            return status::BUSY;
        }
        if self.done {
            status::DONE
        } else {
            0
        }
    }

    fn stream_write_x(&mut self, value: i8) {
        if let Some(slot) = self.x.get_mut(self.x_pos) {
            *slot = value;
            self.x_pos += 1;
        } else {
            tracing::trace!(value, "sim gemv: X write past capacity dropped");
        }
    }

    fn stream_write_w(&mut self, value: i8) {
        if let Some(slot) = self.w.get_mut(self.w_pos) {
            *slot = value;
            self.w_pos += 1;
        } else {
            tracing::trace!(value, "sim gemv: W write past capacity dropped");
        }
    }

    fn stream_write_b(&mut self, value: i32) {
        if let Some(slot) = self.b.get_mut(self.b_pos) {
            *slot = value;
            self.b_pos += 1;
        } else {
            tracing::trace!(value, "sim gemv: B write past capacity dropped");
        }
    }

    fn stream_read_y_and_advance(&mut self) -> i32 {
        let value = self.y.get(self.y_pos).copied().unwrap_or(0);
        self.y_pos = (self.y_pos + 1).min(MAX_OUT);
        value
    }
}
