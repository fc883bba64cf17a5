//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Quantile monotonicity: the unweighted quantile never decreases in q
//! 2. Quantile extremes: q=0 is the minimum, q=1 the maximum
//! 3. Decay limits: huge half-life approaches unweighted, tiny half-life
//!    approaches the latest value
//! 4. Breadth range: every retained fraction lies in [0, 1]

use breadthlab_core::{
    ages_from_positions, compute_breadth, linear_quantile, weighted_quantile, Decay, PriceRow,
    PriceTable,
};
use chrono::NaiveDate;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_series() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0..1.0_f64, 1..200)
}

fn arb_level() -> impl Strategy<Value = f64> {
    0.0..=1.0_f64
}

/// A few tickers over a few dozen dates, with occasional gaps (NaN closes).
fn arb_history() -> impl Strategy<Value = Vec<PriceRow>> {
    let column = prop::collection::vec(prop::option::weighted(0.9, 1.0..500.0_f64), 5..60);
    prop::collection::vec(column, 1..6).prop_map(|columns| {
        let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        columns
            .into_iter()
            .enumerate()
            .flat_map(|(t, closes)| {
                closes.into_iter().enumerate().map(move |(i, close)| {
                    PriceRow::new(
                        base + chrono::Duration::days(i as i64),
                        format!("T{t}"),
                        close.unwrap_or(f64::NAN),
                    )
                })
            })
            .collect()
    })
}

// ── 1-2. Unweighted quantile ─────────────────────────────────────────

proptest! {
    #[test]
    fn quantile_monotone_in_level(values in arb_series(), a in arb_level(), b in arb_level()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let q_lo = linear_quantile(&values, lo).unwrap();
        let q_hi = linear_quantile(&values, hi).unwrap();
        prop_assert!(q_lo <= q_hi + 1e-15, "q({lo})={q_lo} > q({hi})={q_hi}");
    }

    #[test]
    fn quantile_extremes_are_min_and_max(values in arb_series()) {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(linear_quantile(&values, 0.0).unwrap(), min);
        prop_assert_eq!(linear_quantile(&values, 1.0).unwrap(), max);
    }

    #[test]
    fn weighted_quantile_stays_within_range(
        values in arb_series(),
        q in arb_level(),
        half_life in 0.01..10_000.0_f64,
    ) {
        let ages = ages_from_positions(values.len());
        let got = weighted_quantile(&values, &ages, q, Decay::HalfLife { days: half_life }).unwrap();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(got >= min && got <= max);
    }
}

// ── 3. Decay limits ──────────────────────────────────────────────────

proptest! {
    /// Uniform weights put the first CDF knot at 1/n, so the weighted and
    /// unweighted estimators can differ by at most one order-statistic gap.
    #[test]
    fn huge_half_life_approaches_unweighted(values in arb_series(), q in arb_level()) {
        let ages = ages_from_positions(values.len());
        let weighted =
            weighted_quantile(&values, &ages, q, Decay::HalfLife { days: 1e12 }).unwrap();
        let unweighted = linear_quantile(&values, q).unwrap();

        let mut sorted = values.clone();
        sorted.sort_by(f64::total_cmp);
        let max_gap = sorted.windows(2).map(|w| w[1] - w[0]).fold(0.0, f64::max);
        prop_assert!((weighted - unweighted).abs() <= max_gap + 1e-9);
    }

    /// With all weight on the latest observation the inverse CDF jumps to 1
    /// at its sorted position, so the result lies between the latest value
    /// and the largest value below it.
    #[test]
    fn tiny_half_life_approaches_latest(values in arb_series(), q in 0.01..1.0_f64) {
        let ages = ages_from_positions(values.len());
        let got = weighted_quantile(&values, &ages, q, Decay::HalfLife { days: 1e-3 }).unwrap();

        let latest = *values.last().unwrap();
        let below = values
            .iter()
            .copied()
            .filter(|&v| v < latest)
            .fold(f64::NEG_INFINITY, f64::max);
        let lower = if below.is_finite() { below } else { latest };
        prop_assert!(got >= lower && got <= latest, "got={got} lower={lower} latest={latest}");
    }

    /// When the latest observation is also the smallest, it is the answer.
    #[test]
    fn tiny_half_life_returns_latest_minimum(mut values in arb_series(), q in 0.0..1.0_f64) {
        values.push(-1.0);
        let ages = ages_from_positions(values.len());
        let got = weighted_quantile(&values, &ages, q, Decay::HalfLife { days: 1e-3 }).unwrap();
        prop_assert_eq!(got, -1.0);
    }
}

// ── 4. Breadth range ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn breadth_fraction_within_unit_interval(rows in arb_history(), window in 1usize..8) {
        let table = PriceTable::from_rows(&rows).unwrap();
        if let Ok(series) = compute_breadth(&table, window) {
            prop_assert!(!series.is_empty());
            for p in series.points() {
                prop_assert!(p.valid > 0);
                prop_assert!(p.above <= p.valid);
                prop_assert!((0.0..=1.0).contains(&p.fraction));
            }
            prop_assert!(series.points().windows(2).all(|w| w[0].date < w[1].date));
        }
    }
}
