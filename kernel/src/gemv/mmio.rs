//! Memory-mapped GEMV peripheral. All volatile access lives here.

use core::ptr;

use super::regs;
use super::GemvRegisters;

#[derive(Debug)]
pub struct MmioGemv {
    base: usize,
}

impl MmioGemv {
    /// # Safety
    ///
    /// `base` must be the address of the GEMV register block, mapped for the
    /// lifetime of the returned value. The device's stream cursors are not
    /// guarded, so this must be the only handle to it.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    #[inline]
    fn write(&mut self, offset: usize, value: u32) {
        // SAFETY: `offset` is one of the register offsets inside the block
        // promised by `new`.
        unsafe { ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }

    #[inline]
    fn read(&mut self, offset: usize) -> u32 {
        // SAFETY: as in `write`.
        unsafe { ptr::read_volatile((self.base + offset) as *const u32) }
    }
}

impl GemvRegisters for MmioGemv {
    fn write_ctrl(&mut self, value: u32) {
        self.write(regs::CTRL, value);
    }

    fn read_status(&mut self) -> u32 {
        self.read(regs::STATUS)
    }

    fn stream_write_x(&mut self, value: i8) {
        self.write(regs::X_IN, value as u8 as u32);
    }

    fn stream_write_w(&mut self, value: i8) {
        self.write(regs::W_IN, value as u8 as u32);
    }

    fn stream_write_b(&mut self, value: i32) {
        self.write(regs::B_IN, value as u32);
    }

    fn stream_read_y_and_advance(&mut self) -> i32 {
        let value = self.read(regs::Y_OUT) as i32;
        self.write(regs::Y_NEXT, 1);
        value
    }
}
