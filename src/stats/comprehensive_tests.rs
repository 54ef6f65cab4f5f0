//! Property-based tests for the statistics reducer

use super::{loss_percent, RttSummary};
use proptest::collection::vec;
use proptest::prelude::*;
use std::time::Duration;

mod generators {
    use super::*;

    /// (sent, received) with received <= sent
    pub fn counters() -> impl Strategy<Value = (u64, u64)> {
        (1u64..1_000_000).prop_flat_map(|sent| (Just(sent), 0..=sent))
    }

    pub fn round_trips() -> impl Strategy<Value = Vec<Duration>> {
        vec((1u64..5_000_000).prop_map(Duration::from_micros), 1..200)
    }
}

proptest! {
    /// Loss is a whole percentage and matches the truncating formula
    #[test]
    fn loss_within_bounds((sent, received) in generators::counters()) {
        let loss = loss_percent(sent, received);
        prop_assert!(loss <= 100);
        prop_assert_eq!(loss, 100 - (100 * received) / sent);
    }

    /// Full delivery is zero loss, no delivery is total loss
    #[test]
    fn loss_extremes(sent in 1u64..1_000_000) {
        prop_assert_eq!(loss_percent(sent, sent), 0);
        prop_assert_eq!(loss_percent(sent, 0), 100);
    }

    /// The mean never leaves the [min, max] range
    #[test]
    fn avg_between_min_and_max(samples in generators::round_trips()) {
        let summary = RttSummary::from_samples(samples.iter().copied()).unwrap();
        prop_assert!(summary.min <= summary.avg);
        prop_assert!(summary.avg <= summary.max);
        prop_assert_eq!(Some(&summary.min), samples.iter().min());
        prop_assert_eq!(Some(&summary.max), samples.iter().max());
    }
}

#[test]
fn empty_sample_has_no_summary() {
    assert!(RttSummary::from_samples(Vec::new()).is_none());
}

#[test]
fn identical_samples() {
    let summary = RttSummary::from_samples(vec![Duration::from_millis(7); 10]).unwrap();
    assert_eq!(summary.min, Duration::from_millis(7));
    assert_eq!(summary.max, Duration::from_millis(7));
    assert_eq!(summary.avg, Duration::from_millis(7));
}
