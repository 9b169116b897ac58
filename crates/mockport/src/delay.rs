//! Simulated network delay.

use crate::metrics;
use crate::model::OperationSettings;
use std::time::Duration;
use tracing::debug;

/// Suspend the current request for the operation's configured delay.
///
/// Each request sleeps on its own timer, so concurrent requests never wait
/// on each other. Returns the delay that was applied.
pub async fn simulate(settings: &OperationSettings, protocol: &str) -> Option<Duration> {
    let delay = settings.effective_delay()?;
    debug!(delay_ms = delay.as_millis() as u64, "Simulating network delay");
    metrics::record_delay(protocol, delay.as_millis() as u64);
    tokio::time::sleep(delay).await;
    Some(delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn settings(simulate: bool, delay_ms: i64) -> OperationSettings {
        OperationSettings {
            simulate_network_delay: simulate,
            network_delay_ms: delay_ms,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_sleeps_for_configured_delay() {
        let start = Instant::now();
        let applied = simulate(&settings(true, 1500), "soap").await;
        assert_eq!(applied, Some(Duration::from_millis(1500)));
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_when_disabled_or_not_positive() {
        let start = Instant::now();
        assert_eq!(simulate(&settings(false, 1500), "soap").await, None);
        assert_eq!(simulate(&settings(true, 0), "soap").await, None);
        assert_eq!(simulate(&settings(true, -5), "soap").await, None);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_delays_do_not_serialize() {
        let start = Instant::now();
        let delayed = settings(true, 1000);
        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let delayed = delayed.clone();
                tokio::spawn(async move { simulate(&delayed, "rest").await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        assert!(start.elapsed() < Duration::from_millis(2000));
    }
}
