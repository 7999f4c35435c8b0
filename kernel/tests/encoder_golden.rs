//! End-to-end encoder runs against checksums from an independent model of
//! the arithmetic.

use tinyformer_kernel::weights::WEIGHTS_BLOB_LEN;
use tinyformer_kernel::{checksum, Encoder, Lcg, Weights};

fn generated_weights(seed: u32, shift: u32) -> Weights {
    let mut lcg = Lcg::new(seed);
    let blob: Vec<u8> = (0..WEIGHTS_BLOB_LEN)
        .map(|_| (lcg.next_i8() >> shift) as u8)
        .collect();
    Weights::from_bytes(&blob).unwrap()
}

#[test]
fn test_placeholder_checksum() {
    let input = Lcg::new(1).token_matrix();
    let output = Encoder::placeholder().encode(&input);
    assert_eq!(output, input, "zero weights leave both residual paths empty");
    assert_eq!(checksum(&output), 0x0000_f6af);
}

#[test]
fn test_generated_weights_checksums() {
    let cases = [
        (5, 1, 0x0001_29e0),
        (0x1234, 7, 0x0001_2c15),
        (42, 0xDEAD_BEEF, 0x0001_29e2),
    ];
    for (weight_seed, input_seed, expected) in cases {
        let weights = generated_weights(weight_seed, 0);
        let output = Encoder::new(&weights).encode(&Lcg::new(input_seed).token_matrix());
        assert_eq!(
            checksum(&output),
            expected,
            "weights seed {:#x}, input seed {:#x}",
            weight_seed,
            input_seed
        );
    }
}

#[test]
fn test_small_weights_output() {
    let weights = generated_weights(5, 4);
    let output = Encoder::new(&weights).encode(&Lcg::new(1).token_matrix());

    assert_eq!(output[0][..8], [-69i8, -39, 2, 49, -116, -35, 75, 10]);
    assert_eq!(output[15][28..], [-7i8, 27, 34, 45]);
    assert_eq!(checksum(&output), 0x0000_f6dc);
}

#[test]
fn test_encoder_is_reusable() {
    let weights = generated_weights(9, 2);
    let mut encoder = Encoder::new(&weights);
    let a = Lcg::new(1).token_matrix();
    let b = Lcg::new(2).token_matrix();

    let first = encoder.encode(&a);
    let _ = encoder.encode(&b);
    assert_eq!(encoder.encode(&a), first, "scratch state must not leak between calls");
}
