//! Self-test harness through the public API.

use tinyformer_kernel::dot8::{dot_i8, Dot8Engine};
use tinyformer_kernel::gemv::MAX_LEN;
use tinyformer_kernel::{
    reference_gemv, run_all, score_to_exp, Dim, Gemv, Lcg, SimGemv, SoftwareDot8,
    SoftwareExpLut, EXP_LUT_GOLDEN,
};

#[test]
fn test_all_software_backends_pass() {
    let summary = run_all(&SoftwareDot8, &SoftwareExpLut, &mut Gemv::new(SimGemv::new()));
    assert!(summary.all_passed(), "{:?}", summary);
    assert_eq!(summary.failures().count(), 0);
}

#[test]
fn test_build_selected_dot8_passes() {
    let summary = run_all(
        &Dot8Engine::default(),
        &SoftwareExpLut,
        &mut Gemv::new(SimGemv::with_latency(8)),
    );
    assert!(summary.all_passed(), "{:?}", summary);
}

#[test]
fn test_harness_is_repeatable_on_one_device() {
    let mut gemv = Gemv::new(SimGemv::with_latency(3));
    for _ in 0..3 {
        assert!(run_all(&SoftwareDot8, &SoftwareExpLut, &mut gemv).all_passed());
    }
}

#[test]
fn test_gemv_checked_run_against_reference() {
    let mut lcg = Lcg::new(11);
    let mut gemv = Gemv::new(SimGemv::with_latency(2));

    for len in Dim::ALL {
        for out_dim in Dim::ALL {
            let (len, out_dim) = (len.get(), out_dim.get());
            let x: Vec<i8> = (0..len).map(|_| lcg.next_i8()).collect();
            let w: Vec<i8> = (0..len * out_dim).map(|_| lcg.next_i8()).collect();
            let b: Vec<i32> = (0..out_dim).map(|_| lcg.next_u32() as i32 >> 8).collect();

            let mut expected = vec![0; out_dim];
            let mut y = vec![0; out_dim];
            reference_gemv(&w, &x, Some(&b), &mut expected);
            gemv.run(&x, &w, Some(&b), &mut y).unwrap();
            assert_eq!(y, expected, "len={} out_dim={}", len, out_dim);
        }
    }
}

#[test]
fn test_gemv_rejects_unsupported_shape() {
    let mut gemv = Gemv::new(SimGemv::new());
    let x = [0i8; 48];
    let w = [0i8; 48 * 32];
    let mut y = [0i32; 32];
    assert!(gemv.run(&x, &w, None, &mut y).is_err());
    assert!(gemv.run(&[0i8; MAX_LEN], &w, None, &mut y).is_err());
}

#[test]
fn test_dot_i8_matches_gemv_row() {
    let mut lcg = Lcg::new(3);
    let x: Vec<i8> = (0..32).map(|_| lcg.next_i8()).collect();
    let w: Vec<i8> = (0..32 * 32).map(|_| lcg.next_i8()).collect();
    let mut y = [0i32; 32];
    reference_gemv(&w, &x, None, &mut y);

    for (i, &yi) in y.iter().enumerate() {
        assert_eq!(dot_i8(&Dot8Engine::default(), &w[i * 32..(i + 1) * 32], &x), yi);
    }
}

#[test]
fn test_score_to_exp_edges() {
    assert_eq!(score_to_exp(&SoftwareExpLut, 5), EXP_LUT_GOLDEN[0]);
    assert_eq!(score_to_exp(&SoftwareExpLut, -100), EXP_LUT_GOLDEN[15]);
    assert_eq!(score_to_exp(&SoftwareExpLut, i32::MIN), 12);
}
