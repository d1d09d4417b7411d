//! Numerically stable `log(e^a + e^b)`, used thousands of times per DP cell.
//!
//! Grounded in `fb-pruner`'s `p7_FLogsum` (a precomputed `log1p(exp(-x))`
//! table interpolated over `x in [0, 16]`), per spec.md §4.1. We keep the
//! table implementation since it's the one the rest of the corpus'
//! numeric DP code (the astar-pairwise-aligner examples) reaches for when
//! a closed-form `ln_1p`/`exp` call per cell would dominate runtime.

use std::sync::OnceLock;

const TABLE_STEPS_PER_UNIT: f32 = 128.0;
const TABLE_MAX: f32 = 16.0;

struct LogSumTable {
    values: Vec<f32>,
}

impl LogSumTable {
    fn build() -> Self {
        let entries = (TABLE_MAX * TABLE_STEPS_PER_UNIT) as usize + 1;
        let values = (0..entries)
            .map(|i| {
                let x = i as f32 / TABLE_STEPS_PER_UNIT;
                (-x).exp().ln_1p()
            })
            .collect();
        LogSumTable { values }
    }

    /// Linear interpolation of `log1p(exp(-x))` for `x >= 0`.
    fn lookup(&self, x: f32) -> f32 {
        if x >= TABLE_MAX {
            return 0.0;
        }
        let scaled = x * TABLE_STEPS_PER_UNIT;
        let lo = scaled as usize;
        let frac = scaled - lo as f32;
        let a = self.values[lo];
        let b = self.values[(lo + 1).min(self.values.len() - 1)];
        a + frac * (b - a)
    }
}

static TABLE: OnceLock<LogSumTable> = OnceLock::new();

fn table() -> &'static LogSumTable {
    TABLE.get_or_init(LogSumTable::build)
}

/// `log(e^a + e^b)`, stable for very negative inputs.
///
/// Returns `a` when `b` is `-inf`, and symmetrically. Commutative and
/// monotone up to floating-point error; errors in the last 0.001 nats are
/// within the contract (spec.md §4.1) since downstream score comparisons
/// only care about 0.01 bits.
#[inline]
pub fn logsum(a: f32, b: f32) -> f32 {
    if a == f32::NEG_INFINITY {
        return b;
    }
    if b == f32::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + table().lookup(hi - lo)
}

/// `log(e^a + e^b + e^c)`, used by the E-state accumulator in Bounded
/// Forward/Backward (spec.md §4.6).
#[inline]
pub fn logsum3(a: f32, b: f32, c: f32) -> f32 {
    logsum(logsum(a, b), c)
}

/// `log(e^a + e^b + e^c + e^d)`, used by the M-state recurrence.
#[inline]
pub fn logsum4(a: f32, b: f32, c: f32, d: f32) -> f32 {
    logsum(logsum(a, b), logsum(c, d))
}

/// Closed-form variant, used as the accuracy reference in tests: `max(a,b) + ln_1p(exp(-|a-b|))`.
#[inline]
pub fn logsum_exact(a: f32, b: f32) -> f32 {
    if a == f32::NEG_INFINITY {
        return b;
    }
    if b == f32::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + (-(hi - lo)).exp().ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_with_neg_inf() {
        assert_eq!(logsum(1.5, f32::NEG_INFINITY), 1.5);
        assert_eq!(logsum(f32::NEG_INFINITY, 1.5), 1.5);
        assert_eq!(logsum(f32::NEG_INFINITY, f32::NEG_INFINITY), f32::NEG_INFINITY);
    }

    #[test]
    fn commutative() {
        for (a, b) in [(1.0, 2.0), (-5.0, 3.2), (0.0, 0.0), (-100.0, -1.0)] {
            assert!((logsum(a, b) - logsum(b, a)).abs() < 1e-6);
        }
    }

    #[test]
    fn matches_closed_form_within_tolerance() {
        for (a, b) in [(1.0, 2.0), (-5.0, 3.2), (0.0, 0.0), (-100.0, -1.0), (7.3, 7.30001)] {
            let table_val = logsum(a, b);
            let exact_val = logsum_exact(a, b);
            assert!(
                (table_val - exact_val).abs() < 1e-3,
                "a={a} b={b} table={table_val} exact={exact_val}"
            );
        }
    }

    #[test]
    fn monotone_in_each_argument() {
        let base = logsum(1.0, 2.0);
        let bumped = logsum(1.5, 2.0);
        assert!(bumped >= base);
    }

    #[test]
    fn large_gap_returns_larger_operand() {
        // when the gap exceeds the table's 16-nat range, logsum(a,b) == a
        assert!((logsum(0.0, -30.0) - 0.0).abs() < 1e-6);
    }
}
