//! ╔══════════════════════════════════════════════════════════════════╗
//! ║   TINYFORMER ENCODER BLOCK                                       ║
//! ║   S = 16 tokens, D = 32 dims, single head, FFN = 64              ║
//! ║                                                                  ║
//! ║   Y = X + Wo · Attn(Wq X, Wk X, Wv X)                            ║
//! ║   Z = Y + W2 · ReLU(W1 · Y)                                      ║
//! ╚══════════════════════════════════════════════════════════════════╝
//!
//! int8 activations and weights, int32 accumulators, no floating point and
//! no allocation. Attention is streamed one query at a time, so the largest
//! attention buffer is a single row of S scores; no S×S matrix exists.

use crate::exp_lut::{score_to_exp, SoftwareExpLut};
use crate::quantization::{
    requantize, requantize_relu, saturate_i8, ATTN_SCALE_SHIFT, Q15_SHIFT, SOFTMAX_RANGE_SHIFT,
};
use crate::weights::Weights;

/// Sequence length.
pub const SEQ_LEN: usize = 16;
/// Model dimension.
pub const D_MODEL: usize = 32;
/// Feed-forward hidden width.
pub const D_FFN: usize = 64;

/// One encoder input or output: [S][D] int8.
pub type TokenMatrix = [[i8; D_MODEL]; SEQ_LEN];

static PLACEHOLDER_WEIGHTS: Weights = Weights::PLACEHOLDER;

/// Working buffers reused by every call.
struct Scratch {
    q: TokenMatrix,
    k: TokenMatrix,
    v: TokenMatrix,
    /// Attention context, then the post-attention residual.
    attn: TokenMatrix,
    hidden: [[i8; D_FFN]; SEQ_LEN],
    ffn: TokenMatrix,
    /// Scores of one query against every key.
    scores: [i32; SEQ_LEN],
    /// Exp values of one query row, then their Q15 normalisation.
    probs: [u16; SEQ_LEN],
}

impl Scratch {
    const fn new() -> Self {
        Self {
            q: [[0; D_MODEL]; SEQ_LEN],
            k: [[0; D_MODEL]; SEQ_LEN],
            v: [[0; D_MODEL]; SEQ_LEN],
            attn: [[0; D_MODEL]; SEQ_LEN],
            hidden: [[0; D_FFN]; SEQ_LEN],
            ffn: [[0; D_MODEL]; SEQ_LEN],
            scores: [0; SEQ_LEN],
            probs: [0; SEQ_LEN],
        }
    }
}

/// Encoder block bound to a weight set, owning its scratch arena.
///
/// `encode` takes `&mut self`, so a call can only start after the previous
/// one has returned.
pub struct Encoder<'w> {
    weights: &'w Weights,
    scratch: Scratch,
}

impl<'w> Encoder<'w> {
    pub const fn new(weights: &'w Weights) -> Self {
        Self {
            weights,
            scratch: Scratch::new(),
        }
    }

    pub fn weights(&self) -> &'w Weights {
        self.weights
    }

    /// Encode one token matrix. Pure in `input` and the weights: the scratch
    /// buffers are fully rewritten on every call.
    pub fn encode(&mut self, input: &TokenMatrix) -> TokenMatrix {
        let w = self.weights;
        let s = &mut self.scratch;

        // 1. Q/K/V projections
        linear_all(input, &mut s.q, &w.w_q, &w.b_q);
        linear_all(input, &mut s.k, &w.w_k, &w.b_k);
        linear_all(input, &mut s.v, &w.w_v, &w.b_v);

        // 2. Streaming attention
        attention(&s.q, &s.k, &s.v, &mut s.attn, &mut s.scores, &mut s.probs);

        // 3. Output projection (into q, no longer needed) + residual
        linear_all(&s.attn, &mut s.q, &w.w_o, &w.b_o);
        residual(input, &s.q, &mut s.attn);

        // 4. Feed-forward
        for ((x, h), y) in s.attn.iter().zip(s.hidden.iter_mut()).zip(s.ffn.iter_mut()) {
            *h = linear(x, &w.w_ff1, &w.b_ff1, true);
            *y = linear(h, &w.w_ff2, &w.b_ff2, false);
        }

        // 5. Final residual
        let mut output = [[0i8; D_MODEL]; SEQ_LEN];
        residual(&s.attn, &s.ffn, &mut output);

        tracing::debug!(checksum = checksum(&output), "encode");
        output
    }
}

impl Encoder<'static> {
    /// Encoder over the all-zero placeholder weights.
    pub fn placeholder() -> Self {
        Self::new(&PLACEHOLDER_WEIGHTS)
    }
}

/// Cross-build correctness checksum: wrapping sum of every output byte
/// taken as unsigned.
pub fn checksum(m: &TokenMatrix) -> u32 {
    bytemuck::bytes_of(m)
        .iter()
        .fold(0u32, |acc, &b| acc.wrapping_add(b as u32))
}

/// `out[o] = requantize(b[o] + Σ_i W[o][i] · x[i])`, ReLU'd on request.
fn linear<const IN: usize, const OUT: usize>(
    x: &[i8; IN],
    w: &[[i8; IN]; OUT],
    b: &[i8; OUT],
    relu: bool,
) -> [i8; OUT] {
    let mut out = [0i8; OUT];
    for ((o, row), &bias) in out.iter_mut().zip(w).zip(b) {
        let acc = row
            .iter()
            .zip(x)
            .fold(bias as i32, |acc, (&wv, &xv)| acc + wv as i32 * xv as i32);
        *o = if relu { requantize_relu(acc) } else { requantize(acc) };
    }
    out
}

fn linear_all(
    src: &TokenMatrix,
    dst: &mut TokenMatrix,
    w: &[[i8; D_MODEL]; D_MODEL],
    b: &[i8; D_MODEL],
) {
    for (x, y) in src.iter().zip(dst.iter_mut()) {
        *y = linear(x, w, b, false);
    }
}

/// `out = saturate(a + b)` element-wise.
fn residual(a: &TokenMatrix, b: &TokenMatrix, out: &mut TokenMatrix) {
    for ((ra, rb), ro) in a.iter().zip(b).zip(out.iter_mut()) {
        for ((&x, &y), o) in ra.iter().zip(rb).zip(ro.iter_mut()) {
            *o = saturate_i8(x as i32 + y as i32);
        }
    }
}

/// Single-head scaled dot-product attention, one query row at a time.
fn attention(
    q: &TokenMatrix,
    k: &TokenMatrix,
    v: &TokenMatrix,
    context: &mut TokenMatrix,
    scores: &mut [i32; SEQ_LEN],
    probs: &mut [u16; SEQ_LEN],
) {
    let lut = SoftwareExpLut;

    for (qi, ctx) in q.iter().zip(context.iter_mut()) {
        // Raw scores and their running max
        let mut max_score = i32::MIN;
        for (score, kj) in scores.iter_mut().zip(k) {
            let dot = qi
                .iter()
                .zip(kj)
                .fold(0i32, |acc, (&a, &b)| acc + a as i32 * b as i32);
            *score = dot >> ATTN_SCALE_SHIFT;
            max_score = max_score.max(*score);
        }

        // exp(score - max), compressed into the table's range
        let mut sum_exp = 0u32;
        for (p, &score) in probs.iter_mut().zip(scores.iter()) {
            *p = score_to_exp(&lut, (score - max_score) >> SOFTMAX_RANGE_SHIFT);
            sum_exp += *p as u32;
        }
        if sum_exp == 0 {
            sum_exp = 1;
        }

        // Q15 weights, truncated
        for p in probs.iter_mut() {
            *p = (((*p as u32) << Q15_SHIFT) / sum_exp) as u16;
        }

        for (d, out) in ctx.iter_mut().enumerate() {
            let acc = probs
                .iter()
                .zip(v)
                .fold(0i32, |acc, (&p, vj)| acc + ((p as i32 * vj[d] as i32) >> Q15_SHIFT));
            *out = saturate_i8(acc);
        }
    }
}
