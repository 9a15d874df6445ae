//! Property-based tests for the node building blocks.
//!
//! Uses proptest to check invariants that must hold for any input: the delay
//! line reproduces its input exactly `n` samples later, math operations stay
//! finite, and wavetable lookups never leave the range of the table.

use patchbay_nodes::{DelayLine, MathOp, Wavetable};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Whatever was written `delay` samples ago is what `read(delay)` returns.
    #[test]
    fn delay_line_echoes_input(
        input in prop::collection::vec(-1.0f32..=1.0f32, 1..256),
        delay in 0usize..64,
    ) {
        let mut line = DelayLine::new(64);
        let mut output = Vec::with_capacity(input.len());
        for &sample in &input {
            line.write(sample);
            output.push(line.read(delay));
        }

        for (i, &out) in output.iter().enumerate() {
            let expected = if i >= delay { input[i - delay] } else { 0.0 };
            prop_assert_eq!(out, expected, "sample {} with delay {}", i, delay);
        }
    }

    /// Reads beyond the capacity clamp to the oldest sample instead of
    /// wrapping into newer ones.
    #[test]
    fn delay_line_clamps_long_reads(
        input in prop::collection::vec(-1.0f32..=1.0f32, 16..64),
        extra in 1usize..1000,
    ) {
        let mut line = DelayLine::new(8);
        for &sample in &input {
            line.write(sample);
        }
        prop_assert_eq!(line.read(8 + extra), line.read(8));
    }

    /// Every operation maps any operands, including NaN, infinities and
    /// subnormal divisors, to a finite result.
    #[test]
    fn math_ops_stay_finite(
        a in prop::num::f32::ANY,
        b in prop_oneof![Just(0.0f32), Just(1e-39f32), prop::num::f32::ANY],
    ) {
        for op in MathOp::ALL {
            let result = op.apply(a, b);
            prop_assert!(result.is_finite(), "{:?}({}, {}) = {}", op, a, b, result);
        }
    }

    /// Linear interpolation never overshoots the table's extremes.
    #[test]
    fn wavetable_lookup_within_table_range(
        samples in prop::collection::vec(-1.0f32..=1.0f32, 1..64),
        phase in -4.0f32..4.0f32,
    ) {
        let min = samples.iter().copied().fold(f32::INFINITY, f32::min);
        let max = samples.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let table = Wavetable::from_samples(samples);

        let value = table.lookup(phase);
        prop_assert!(value >= min - 1e-6 && value <= max + 1e-6, "{} not in [{}, {}]", value, min, max);
    }
}
