//! Fixed-shape int8 weight set for one encoder block.
//!
//! The in-memory layout is also the on-disk blob layout: tensors in field
//! order, row-major, one byte per value, no padding.
//!
//! ```text
//! W_q W_k W_v W_o   [32][32] each
//! W_ff1             [64][32]
//! W_ff2             [32][64]
//! b_q b_k b_v b_o   [32] each
//! b_ff1             [64]
//! b_ff2             [32]
//! ```

use bytemuck::{Pod, Zeroable};
use sha2::{Digest, Sha256};

use crate::encoder::{D_FFN, D_MODEL};
use crate::error::{Error, Result};

/// Size of a serialized weight set in bytes.
pub const WEIGHTS_BLOB_LEN: usize = core::mem::size_of::<Weights>();

#[derive(Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Weights {
    pub w_q: [[i8; D_MODEL]; D_MODEL],
    pub w_k: [[i8; D_MODEL]; D_MODEL],
    pub w_v: [[i8; D_MODEL]; D_MODEL],
    pub w_o: [[i8; D_MODEL]; D_MODEL],
    pub w_ff1: [[i8; D_MODEL]; D_FFN],
    pub w_ff2: [[i8; D_FFN]; D_MODEL],
    pub b_q: [i8; D_MODEL],
    pub b_k: [i8; D_MODEL],
    pub b_v: [i8; D_MODEL],
    pub b_o: [i8; D_MODEL],
    pub b_ff1: [i8; D_FFN],
    pub b_ff2: [i8; D_MODEL],
}

impl Weights {
    /// All-zero placeholder. A deployment swaps in trained values; the
    /// algorithm is unchanged.
    pub const PLACEHOLDER: Weights = Weights {
        w_q: [[0; D_MODEL]; D_MODEL],
        w_k: [[0; D_MODEL]; D_MODEL],
        w_v: [[0; D_MODEL]; D_MODEL],
        w_o: [[0; D_MODEL]; D_MODEL],
        w_ff1: [[0; D_MODEL]; D_FFN],
        w_ff2: [[0; D_FFN]; D_MODEL],
        b_q: [0; D_MODEL],
        b_k: [0; D_MODEL],
        b_v: [0; D_MODEL],
        b_o: [0; D_MODEL],
        b_ff1: [0; D_FFN],
        b_ff2: [0; D_MODEL],
    };

    /// Load a weight set from its blob form.
    pub fn from_bytes(blob: &[u8]) -> Result<Self> {
        if blob.len() != WEIGHTS_BLOB_LEN {
            return Err(Error::WeightBlobSize {
                needed: WEIGHTS_BLOB_LEN,
                provided: blob.len(),
            });
        }
        Ok(bytemuck::pod_read_unaligned(blob))
    }

    /// Blob form of this weight set.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// SHA-256 of the blob, used as the model identity.
    pub fn model_hash(&self) -> [u8; 32] {
        Sha256::digest(self.as_bytes()).into()
    }

    pub fn is_placeholder(&self) -> bool {
        self.as_bytes().iter().all(|&b| b == 0)
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::PLACEHOLDER
    }
}

impl core::fmt::Debug for Weights {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let hash = self.model_hash();
        f.debug_struct("Weights")
            .field("bytes", &WEIGHTS_BLOB_LEN)
            .field("hash_prefix", &[hash[0], hash[1], hash[2], hash[3]])
            .field("placeholder", &self.is_placeholder())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_len() {
        assert_eq!(WEIGHTS_BLOB_LEN, 4 * 32 * 32 + 2 * 64 * 32 + 5 * 32 + 64);
        assert_eq!(WEIGHTS_BLOB_LEN, 8416);
    }

    #[test]
    fn test_placeholder_is_zero() {
        assert!(Weights::PLACEHOLDER.is_placeholder());
        assert_eq!(Weights::default(), Weights::PLACEHOLDER);
    }

    #[test]
    fn test_from_bytes_field_order() {
        let mut blob = vec![0u8; WEIGHTS_BLOB_LEN];
        blob[0] = 1; // W_q[0][0]
        blob[32 * 32] = 2; // W_k[0][0]
        blob[4 * 32 * 32 + 33] = 0xFF; // W_ff1[1][1] = -1
        blob[4 * 32 * 32 + 2 * 64 * 32] = 0x80; // b_q[0] = -128
        *blob.last_mut().unwrap() = 5; // b_ff2[31]

        let w = Weights::from_bytes(&blob).unwrap();
        assert_eq!(w.w_q[0][0], 1);
        assert_eq!(w.w_k[0][0], 2);
        assert_eq!(w.w_ff1[1][1], -1);
        assert_eq!(w.b_q[0], -128);
        assert_eq!(w.b_ff2[31], 5);
        assert_eq!(w.as_bytes(), &blob[..]);
    }

    #[test]
    fn test_from_bytes_rejects_wrong_size() {
        let err = Weights::from_bytes(&[0u8; 100]).unwrap_err();
        assert_eq!(
            err,
            Error::WeightBlobSize {
                needed: WEIGHTS_BLOB_LEN,
                provided: 100
            }
        );
    }

    #[test]
    fn test_model_hash_tracks_content() {
        let a = Weights::PLACEHOLDER;
        let mut b = Weights::PLACEHOLDER;
        assert_eq!(a.model_hash(), b.model_hash(), "Same weights should produce same hash");

        b.b_ff2[0] = 1;
        assert_ne!(a.model_hash(), b.model_hash());
    }
}
