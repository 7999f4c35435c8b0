//! On-disk weight files.
//!
//! Named tensors, bincode-encoded with the standard config. Converting to
//! kernel [`Weights`] flattens them into the kernel's blob order.

use anyhow::{bail, Context, Result};
use bincode::config;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use tinyformer_kernel::selftest::Lcg;
use tinyformer_kernel::weights::WEIGHTS_BLOB_LEN;
use tinyformer_kernel::{Weights, D_FFN, D_MODEL};

/// Transformer weights, row-major per tensor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WeightFile {
    pub w_q: Vec<i8>,
    pub w_k: Vec<i8>,
    pub w_v: Vec<i8>,
    pub w_o: Vec<i8>,
    pub w_ff1: Vec<i8>,
    pub w_ff2: Vec<i8>,
    pub b_q: Vec<i8>,
    pub b_k: Vec<i8>,
    pub b_v: Vec<i8>,
    pub b_o: Vec<i8>,
    pub b_ff1: Vec<i8>,
    pub b_ff2: Vec<i8>,
}

impl WeightFile {
    /// Tensors in blob order with their expected element counts.
    fn tensors(&self) -> [(&'static str, &[i8], usize); 12] {
        let sq = D_MODEL * D_MODEL;
        let ff = D_MODEL * D_FFN;
        [
            ("w_q", self.w_q.as_slice(), sq),
            ("w_k", self.w_k.as_slice(), sq),
            ("w_v", self.w_v.as_slice(), sq),
            ("w_o", self.w_o.as_slice(), sq),
            ("w_ff1", self.w_ff1.as_slice(), ff),
            ("w_ff2", self.w_ff2.as_slice(), ff),
            ("b_q", self.b_q.as_slice(), D_MODEL),
            ("b_k", self.b_k.as_slice(), D_MODEL),
            ("b_v", self.b_v.as_slice(), D_MODEL),
            ("b_o", self.b_o.as_slice(), D_MODEL),
            ("b_ff1", self.b_ff1.as_slice(), D_FFN),
            ("b_ff2", self.b_ff2.as_slice(), D_MODEL),
        ]
    }

    pub fn from_weights(weights: &Weights) -> Self {
        fn flat<const N: usize, const M: usize>(t: &[[i8; N]; M]) -> Vec<i8> {
            t.iter().flatten().copied().collect()
        }

        Self {
            w_q: flat(&weights.w_q),
            w_k: flat(&weights.w_k),
            w_v: flat(&weights.w_v),
            w_o: flat(&weights.w_o),
            w_ff1: flat(&weights.w_ff1),
            w_ff2: flat(&weights.w_ff2),
            b_q: weights.b_q.to_vec(),
            b_k: weights.b_k.to_vec(),
            b_v: weights.b_v.to_vec(),
            b_o: weights.b_o.to_vec(),
            b_ff1: weights.b_ff1.to_vec(),
            b_ff2: weights.b_ff2.to_vec(),
        }
    }

    /// Every byte drawn from the self-test generator.
    pub fn random(seed: u32) -> Result<Self> {
        let mut lcg = Lcg::new(seed);
        let blob: Vec<u8> = (0..WEIGHTS_BLOB_LEN).map(|_| lcg.next_u8()).collect();
        Ok(Self::from_weights(&Weights::from_bytes(&blob)?))
    }

    pub fn to_weights(&self) -> Result<Weights> {
        let mut blob = Vec::with_capacity(WEIGHTS_BLOB_LEN);
        for (name, tensor, expected) in self.tensors() {
            if tensor.len() != expected {
                bail!(
                    "tensor {} has {} elements, expected {}",
                    name,
                    tensor.len(),
                    expected
                );
            }
            blob.extend(tensor.iter().map(|&v| v as u8));
        }
        Ok(Weights::from_bytes(&blob)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (file, read): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, config::standard())
                .context("Failed to decode weight file")?;
        if read != bytes.len() {
            bail!("{} trailing bytes after weight file", bytes.len() - read);
        }
        Ok(file)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(self, config::standard())
            .context("Failed to encode weight file")
    }

    pub fn load(path: &Path) -> Result<Weights> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::decode(&bytes)?
            .to_weights()
            .with_context(|| format!("Invalid weight file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.encode()?;
        fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_file() {
        let file = WeightFile::from_weights(&Weights::PLACEHOLDER);
        assert_eq!(file.w_ff1.len(), 64 * 32);
        assert!(file.to_weights().unwrap().is_placeholder());
    }

    #[test]
    fn test_random_file_survives_bincode() {
        let file = WeightFile::random(5).unwrap();
        let weights = file.to_weights().unwrap();
        assert!(!weights.is_placeholder());

        let decoded = WeightFile::decode(&file.encode().unwrap()).unwrap();
        assert_eq!(decoded.to_weights().unwrap().model_hash(), weights.model_hash());
    }

    #[test]
    fn test_flatten_follows_blob_order() {
        let mut file = WeightFile::from_weights(&Weights::PLACEHOLDER);
        file.w_ff2[64 + 3] = -7; // row 1, col 3
        file.b_ff1[63] = 9;

        let weights = file.to_weights().unwrap();
        assert_eq!(weights.w_ff2[1][3], -7);
        assert_eq!(weights.b_ff1[63], 9);
    }

    #[test]
    fn test_wrong_tensor_length() {
        let mut file = WeightFile::from_weights(&Weights::PLACEHOLDER);
        file.b_v.pop();
        let err = file.to_weights().unwrap_err();
        assert!(err.to_string().contains("b_v"), "error should name the tensor: {}", err);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = WeightFile::from_weights(&Weights::PLACEHOLDER).encode().unwrap();
        bytes.push(0);
        assert!(WeightFile::decode(&bytes).is_err());
    }
}
