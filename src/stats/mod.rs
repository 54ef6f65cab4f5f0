//! Statistics reducer for a finished run

use crate::models::RunReport;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Summary of a run, ready for the summary and RTT lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub sent: u64,
    pub received: u64,
    /// Whole percent of probes without a matched reply
    pub loss_percent: u64,
    /// Round-trip extremes and mean; `None` when nothing was received
    pub rtt: Option<RttSummary>,
    /// Wall time from the start of the run to the reduction
    pub elapsed: Duration,
}

/// Round-trip statistics over the matched replies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RttSummary {
    pub min: Duration,
    pub max: Duration,
    pub avg: Duration,
}

impl RttSummary {
    /// `None` for an empty sample
    pub fn from_samples<I>(samples: I) -> Option<Self>
    where
        I: IntoIterator<Item = Duration>,
    {
        let mut iter = samples.into_iter();
        let first = iter.next()?;

        let (mut min, mut max, mut total, mut n) = (first, first, first, 1u32);
        for sample in iter {
            min = min.min(sample);
            max = max.max(sample);
            total += sample;
            n += 1;
        }

        Some(Self {
            min,
            max,
            avg: total / n,
        })
    }
}

impl RunStatistics {
    /// Fold a report into statistics; `None` when no probe was sent
    pub fn reduce(report: &RunReport, now: Instant) -> Option<Self> {
        if report.sent == 0 {
            return None;
        }

        Some(Self {
            sent: report.sent,
            received: report.received,
            loss_percent: loss_percent(report.sent, report.received),
            rtt: RttSummary::from_samples(report.observations.iter().map(|o| o.round_trip)),
            elapsed: now.saturating_duration_since(report.started_at),
        })
    }

    pub fn has_replies(&self) -> bool {
        self.received > 0
    }
}

/// `100 - 100 * received / sent`, truncating; 0 when nothing was sent
pub fn loss_percent(sent: u64, received: u64) -> u64 {
    if sent == 0 {
        return 0;
    }
    let received = received.min(sent);
    100 - (100 * received) / sent
}

#[cfg(test)]
mod comprehensive_tests;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;
    use crate::types::ShutdownReason;

    fn report(sent: u64, rtts_ms: &[u64]) -> RunReport {
        RunReport {
            sent,
            received: rtts_ms.len() as u64,
            started_at: Instant::now(),
            observations: rtts_ms
                .iter()
                .enumerate()
                .map(|(i, ms)| Observation {
                    sequence: i as u64,
                    round_trip: Duration::from_millis(*ms),
                    ttl: Some(64),
                    bytes: 64,
                    source: "10.0.0.1".parse().unwrap(),
                })
                .collect(),
            reason: ShutdownReason::CountReached,
            receive_error: None,
        }
    }

    #[test]
    fn test_loss_percent() {
        assert_eq!(loss_percent(10, 7), 30);
        assert_eq!(loss_percent(3, 1), 67);
        assert_eq!(loss_percent(3, 0), 100);
        assert_eq!(loss_percent(4, 4), 0);
        assert_eq!(loss_percent(0, 0), 0);
    }

    #[test]
    fn test_zero_sent_yields_nothing() {
        let report = report(0, &[]);
        assert!(RunStatistics::reduce(&report, Instant::now()).is_none());
    }

    #[test]
    fn test_no_replies_has_no_rtt() {
        let report = report(3, &[]);
        let stats = RunStatistics::reduce(&report, Instant::now()).unwrap();
        assert_eq!(stats.loss_percent, 100);
        assert!(stats.rtt.is_none());
        assert!(!stats.has_replies());
    }

    #[test]
    fn test_rtt_summary() {
        let report = report(4, &[10, 30, 20]);
        let stats = RunStatistics::reduce(&report, report.started_at + Duration::from_secs(4)).unwrap();

        assert_eq!(stats.sent, 4);
        assert_eq!(stats.received, 3);
        assert_eq!(stats.loss_percent, 25);
        assert_eq!(stats.elapsed, Duration::from_secs(4));

        let rtt = stats.rtt.unwrap();
        assert_eq!(rtt.min, Duration::from_millis(10));
        assert_eq!(rtt.max, Duration::from_millis(30));
        assert_eq!(rtt.avg, Duration::from_millis(20));
    }

    #[test]
    fn test_statistics_serialize() {
        let report = report(2, &[5]);
        let stats = RunStatistics::reduce(&report, Instant::now()).unwrap();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["loss_percent"], 50);
        assert_eq!(json["received"], 1);
    }
}
