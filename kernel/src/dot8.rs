//! ╔══════════════════════════════════════════════════════════════════╗
//! ║   DOT8 — 4-LANE SIGNED INT8 DOT PRODUCT                          ║
//! ║                                                                  ║
//! ║   dot8(a, b) = Σ_{i<4} a_i * b_i                                 ║
//! ║   Packing: lane 0 in byte 0 (LSB) .. lane 3 in byte 3 (MSB)      ║
//! ╚══════════════════════════════════════════════════════════════════╝
//!
//! The accelerated path is the custom-0 instruction (opcode 0x0B,
//! funct7 = 0x01): rs1/rs2 hold packed lanes, rd receives the signed sum.
//! It is selected at build time with the `dot8-hw` feature on RISC-V
//! targets; every other build uses the software reference.

/// 4-lane dot product backend.
pub trait Dot8 {
    fn dot(&self, a_packed: u32, b_packed: u32) -> i32;
}

/// Pack four signed lanes, lane 0 in the least-significant byte.
#[inline]
pub const fn pack(lanes: [i8; 4]) -> u32 {
    u32::from_le_bytes([lanes[0] as u8, lanes[1] as u8, lanes[2] as u8, lanes[3] as u8])
}

/// Inverse of [`pack`].
#[inline]
pub const fn unpack(word: u32) -> [i8; 4] {
    let b = word.to_le_bytes();
    [b[0] as i8, b[1] as i8, b[2] as i8, b[3] as i8]
}

/// Software reference. Max magnitude is 4 * 128 * 128 = 65536, so the sum
/// never overflows.
#[inline]
pub fn dot8_sw(a_packed: u32, b_packed: u32) -> i32 {
    let a = unpack(a_packed);
    let b = unpack(b_packed);
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| x as i32 * y as i32)
        .sum()
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareDot8;

impl Dot8 for SoftwareDot8 {
    #[inline]
    fn dot(&self, a_packed: u32, b_packed: u32) -> i32 {
        dot8_sw(a_packed, b_packed)
    }
}

/// Custom-0 DOT8 instruction. Touches no state besides rd.
#[cfg(all(feature = "dot8-hw", target_arch = "riscv32"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct CustomInsnDot8;

#[cfg(all(feature = "dot8-hw", target_arch = "riscv32"))]
impl Dot8 for CustomInsnDot8 {
    #[inline]
    fn dot(&self, a_packed: u32, b_packed: u32) -> i32 {
        let rd: i32;
        // SAFETY: the instruction reads rs1/rs2, writes rd and nothing else.
        unsafe {
            core::arch::asm!(
                ".insn r 0x0B, 0, 1, {rd}, {rs1}, {rs2}",
                rd = out(reg) rd,
                rs1 = in(reg) a_packed,
                rs2 = in(reg) b_packed,
                options(pure, nomem, nostack),
            );
        }
        rd
    }
}

/// Backend chosen for this build.
#[cfg(all(feature = "dot8-hw", target_arch = "riscv32"))]
pub type Dot8Engine = CustomInsnDot8;

/// Backend chosen for this build.
#[cfg(not(all(feature = "dot8-hw", target_arch = "riscv32")))]
pub type Dot8Engine = SoftwareDot8;

/// Whether [`Dot8Engine`] is the custom instruction.
pub const DOT8_HW: bool = cfg!(all(feature = "dot8-hw", target_arch = "riscv32"));

/// 4-lane dot product through the build-selected backend.
#[inline]
pub fn dot8_4_lanes(a_packed: u32, b_packed: u32) -> i32 {
    Dot8Engine::default().dot(a_packed, b_packed)
}

/// Dot product of two equal-length int8 rows, four lanes at a time.
/// A tail shorter than four lanes is finished in scalar code.
pub fn dot_i8<D: Dot8 + ?Sized>(engine: &D, a: &[i8], b: &[i8]) -> i32 {
    debug_assert_eq!(a.len(), b.len(), "row length mismatch");

    let mut acc = 0i32;
    let mut a_chunks = a.chunks_exact(4);
    let mut b_chunks = b.chunks_exact(4);
    for (ca, cb) in (&mut a_chunks).zip(&mut b_chunks) {
        let la = [ca[0], ca[1], ca[2], ca[3]];
        let lb = [cb[0], cb[1], cb[2], cb[3]];
        acc += engine.dot(pack(la), pack(lb));
    }
    for (&x, &y) in a_chunks.remainder().iter().zip(b_chunks.remainder()) {
        acc += x as i32 * y as i32;
    }
    acc
}
