//! Configuration management

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use tinyformer_kernel::selftest::LCG_SEED;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Seed for generated encoder input.
    pub seed: u32,
    /// Busy polls the simulated GEMV device reports before done.
    pub gemv_latency: u32,
    pub weights: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            seed: get("TINYFORMER_SEED")
                .map(|s| parse_u32(&s))
                .transpose()
                .context("Invalid TINYFORMER_SEED")?
                .unwrap_or(LCG_SEED),

            gemv_latency: get("TINYFORMER_GEMV_LATENCY")
                .unwrap_or_else(|| "0".to_string())
                .parse()
                .context("Invalid TINYFORMER_GEMV_LATENCY")?,

            weights: get("TINYFORMER_WEIGHTS").filter(|s| !s.is_empty()).map(PathBuf::from),
        })
    }
}

/// Decimal or `0x`-prefixed hex.
pub fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.with_context(|| format!("not a u32: {:?}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(
            config,
            Config {
                seed: 1,
                gemv_latency: 0,
                weights: None
            }
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("TINYFORMER_SEED", "0xDEADBEEF"),
            ("TINYFORMER_GEMV_LATENCY", "12"),
            ("TINYFORMER_WEIGHTS", "model.bin"),
        ]))
        .unwrap();
        assert_eq!(config.seed, 0xDEAD_BEEF);
        assert_eq!(config.gemv_latency, 12);
        assert_eq!(config.weights, Some(PathBuf::from("model.bin")));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(Config::from_lookup(lookup(&[("TINYFORMER_SEED", "seven")])).is_err());
        assert!(Config::from_lookup(lookup(&[("TINYFORMER_GEMV_LATENCY", "-1")])).is_err());
    }

    #[test]
    fn test_parse_u32() {
        assert_eq!(parse_u32("42").unwrap(), 42);
        assert_eq!(parse_u32(" 0x10 ").unwrap(), 16);
        assert!(parse_u32("0xZZ").is_err());
    }
}
