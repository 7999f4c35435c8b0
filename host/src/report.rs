//! Printable outcomes of host commands.

use serde::Serialize;

use tinyformer_kernel::selftest::{SelfTestError, Summary};
use tinyformer_kernel::{EXP_LUT_GOLDEN, TokenMatrix};

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl From<&Result<(), SelfTestError>> for CheckReport {
    fn from(result: &Result<(), SelfTestError>) -> Self {
        Self {
            passed: result.is_ok(),
            failure: result.as_ref().err().map(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SelfTestReport {
    pub dot8_backend: &'static str,
    pub gemv_latency: u32,
    pub dot8: CheckReport,
    pub lut: CheckReport,
    pub gemv: CheckReport,
    pub passed: bool,
}

impl SelfTestReport {
    pub fn new(summary: &Summary, dot8_backend: &'static str, gemv_latency: u32) -> Self {
        Self {
            dot8_backend,
            gemv_latency,
            dot8: (&summary.dot8).into(),
            lut: (&summary.lut).into(),
            gemv: (&summary.gemv).into(),
            passed: summary.all_passed(),
        }
    }

    pub fn print(&self) {
        println!("[*] DOT8 backend: {}", self.dot8_backend);
        println!("[*] GEMV device latency: {} polls", self.gemv_latency);
        for (name, check) in [("DOT8", &self.dot8), ("LUT", &self.lut), ("GEMV", &self.gemv)] {
            match &check.failure {
                None => println!("    [✓] {} PASS", name),
                Some(line) => println!("    [✗] {}", line),
            }
        }
        println!();
        println!("{}", if self.passed { "ALL PASS" } else { "FAILED" });
    }
}

#[derive(Debug, Serialize)]
pub struct EncodeReport {
    pub seed: u32,
    pub model_hash: String,
    pub placeholder_weights: bool,
    pub checksum: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<Vec<i8>>>,
}

impl EncodeReport {
    pub fn set_output(&mut self, m: &TokenMatrix) {
        self.output = Some(m.iter().map(|row| row.to_vec()).collect());
    }

    pub fn print(&self) {
        println!("[*] Seed: {:#010x}", self.seed);
        println!("[*] Model hash: 0x{}", self.model_hash);
        if self.placeholder_weights {
            println!("    (placeholder weights)");
        }
        if let Some(rows) = &self.output {
            for (t, row) in rows.iter().enumerate() {
                println!("    tok {:2}: {:?}", t, row);
            }
        }
        println!("ENC_CKSUM={:#010x}", self.checksum);
    }
}

#[derive(Debug, Serialize)]
pub struct LutEntry {
    pub index: usize,
    pub raw: u16,
    pub value: f64,
}

pub fn lut_entries() -> Vec<LutEntry> {
    EXP_LUT_GOLDEN
        .iter()
        .enumerate()
        .map(|(index, &raw)| LutEntry {
            index,
            raw,
            value: tinyformer_kernel::quantization::q10(raw).to_num::<f64>(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_report_carries_diagnostic() {
        let failed: Result<(), SelfTestError> = Err(SelfTestError::LutMismatch {
            index: 2,
            golden: 556,
            hw: 0,
        });
        let report = CheckReport::from(&failed);
        assert!(!report.passed);
        assert_eq!(
            report.failure.as_deref(),
            Some("LUT FAIL idx=0x00000002 golden=0x0000022c hw=0x00000000")
        );

        let json = serde_json::to_value(CheckReport::from(&Ok(()))).unwrap();
        assert_eq!(json, serde_json::json!({ "passed": true }));
    }

    #[test]
    fn test_lut_entries() {
        let entries = lut_entries();
        assert_eq!(entries.len(), 16);
        assert_eq!(entries[0].value, 1.0);
        assert!(entries[15].value < 0.02);
    }
}
