mod common;

use approx::assert_relative_eq;
use nf_engine::nfm::{ModelWriter, OpSpec};
use nf_engine::ElementType;
use nf_filter::{Direction, FilterError, FilterFramework, FilterState, NfmFilter};

use common::*;

fn configured(model: &std::path::Path, n_in: usize, n_out: usize) -> NfmFilter {
    let mut filter = NfmFilter::new();
    filter.configure(&props(model, n_in, n_out)).unwrap();
    filter
}

#[test]
fn identity_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path(), "id.nfm", identity_model(64));
    let mut filter = configured(&model, 1, 1);

    let input: Vec<u8> = (0..64).collect();
    let mut output = vec![0u8; 64];
    filter.invoke(&[&input], &mut [&mut output]).unwrap();
    assert_eq!(output, input);
    assert_eq!(filter.run_count(), Some(1));

    // Later frames overwrite earlier results.
    let input: Vec<u8> = (0..64).rev().collect();
    filter.invoke(&[&input], &mut [&mut output]).unwrap();
    assert_eq!(output, input);
    assert_eq!(filter.run_count(), Some(2));
}

#[test]
fn input_size_mismatch_skips_run() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path(), "id.nfm", identity_model(16));
    let mut filter = configured(&model, 1, 1);

    let input = [7u8; 12];
    let mut output = [0xAAu8; 16];
    match filter.invoke(&[&input], &mut [&mut output]) {
        Err(FilterError::SizeMismatch {
            direction,
            tensor,
            declared,
            engine,
        }) => {
            assert_eq!(direction, Direction::Input);
            assert_eq!(tensor, "in");
            assert_eq!(declared, 12);
            assert_eq!(engine, 16);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(filter.run_count(), Some(0));
    assert_eq!(output, [0xAAu8; 16]);

    // The filter stays usable.
    assert_eq!(filter.state(), FilterState::Configured);
    let input = [7u8; 16];
    filter.invoke(&[&input], &mut [&mut output]).unwrap();
    assert_eq!(output, input);
}

#[test]
fn output_size_mismatch_skips_run() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path(), "id.nfm", identity_model(8));
    let mut filter = configured(&model, 1, 1);

    let input = [1u8; 8];
    let mut output = [0u8; 4];
    let err = filter.invoke(&[&input], &mut [&mut output]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "output tensor 'out': buffer holds 4 bytes, model expects 8"
    );
    assert_eq!(filter.run_count(), Some(0));
    assert_eq!(output, [0u8; 4]);
}

#[test]
fn buffer_count_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path(), "id.nfm", identity_model(4));
    let mut filter = configured(&model, 1, 1);

    let a = [0u8; 4];
    let mut out = [0u8; 4];
    let err = filter.invoke(&[&a, &a], &mut [&mut out]).unwrap_err();
    assert!(matches!(
        err,
        FilterError::BufferCount {
            direction: Direction::Input,
            expected: 1,
            got: 2,
        }
    ));
    let err = filter.invoke(&[&a], &mut []).unwrap_err();
    assert!(matches!(
        err,
        FilterError::BufferCount {
            direction: Direction::Output,
            expected: 1,
            got: 0,
        }
    ));
    assert_eq!(filter.run_count(), Some(0));
}

#[test]
fn arithmetic_model() {
    let dir = tempfile::tempdir().unwrap();
    let bias = f32_bytes(&[0.5, -1.0, 2.0, 0.0]);
    let model = write_model(
        dir.path(),
        "affine.nfm",
        ModelWriter::new()
            .name("affine")
            .input("x", ElementType::F32, &[1, 4])
            .input("w", ElementType::F32, &[1, 4])
            .constant("b", ElementType::F32, &[1, 4], bias)
            .output("xw", ElementType::F32, &[1, 4], OpSpec::mul("x", "w"))
            .output("y", ElementType::F32, &[1, 4], OpSpec::add("xw", "b"))
            .output("half", ElementType::F32, &[1, 4], OpSpec::scale("y", 0.5)),
    );
    let mut filter = configured(&model, 2, 3);

    let x = f32_bytes(&[1.0, 2.0, 3.0, 4.0]);
    let w = f32_bytes(&[2.0, 2.0, 0.5, -1.0]);
    let mut xw = vec![0u8; 16];
    let mut y = vec![0u8; 16];
    let mut half = vec![0u8; 16];
    filter
        .invoke(&[&x, &w], &mut [&mut xw, &mut y, &mut half])
        .unwrap();

    let expected_y = [2.5f32, 3.0, 3.5, -4.0];
    for (got, want) in f32_values(&xw).iter().zip([2.0f32, 4.0, 1.5, -4.0]) {
        assert_relative_eq!(*got, want);
    }
    for (got, want) in f32_values(&y).iter().zip(expected_y) {
        assert_relative_eq!(*got, want);
    }
    for (got, want) in f32_values(&half).iter().zip(expected_y) {
        assert_relative_eq!(*got, want * 0.5);
    }
}

#[test]
fn independent_instances_on_threads() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path(), "id.nfm", identity_model(32));

    let handles: Vec<_> = (0..4u8)
        .map(|seed| {
            let model = model.clone();
            std::thread::spawn(move || {
                let mut filter = configured(&model, 1, 1);
                for frame in 0..10u8 {
                    let input = [seed.wrapping_mul(31).wrapping_add(frame); 32];
                    let mut output = [0u8; 32];
                    filter.invoke(&[&input], &mut [&mut output]).unwrap();
                    assert_eq!(output, input);
                }
                filter.run_count()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Some(10));
    }
}
