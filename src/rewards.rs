//! Rewards polling loop.
//!
//! Periodically asks every configured on-chain source how much is scheduled
//! for the station's wallet and folds the sum into the metrics snapshot.
//! The chain client itself is an external collaborator: the station only
//! ever sees the [`RewardSource`] trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::StationError;
use crate::store::{MetricsSink, MetricsUpdate};

/// One on-chain source of scheduled rewards.
///
/// Implementations report failures through `anyhow::Error`; the loop maps a
/// failing source to zero for that round and keeps going.
#[async_trait]
pub trait RewardSource: Send + Sync {
    /// Short name for logs, e.g. a contract address.
    fn name(&self) -> &str;

    /// Rewards currently scheduled for `wallet`, in attoFIL.
    async fn rewards_scheduled_for(&self, wallet: &str) -> anyhow::Result<u128>;
}

/// Shared, late-populated set of reward sources.
///
/// Starts empty in the production wiring; the embedding layer fills it once
/// its chain client is up. The loop idles until then.
pub type SharedRewardSources = Arc<RwLock<Vec<Arc<dyn RewardSource>>>>;

/// Pacing of the polling rounds: a fixed base interval plus uniform jitter
/// in either direction, so a fleet of stations does not poll in lockstep.
#[derive(Debug, Clone, Copy)]
pub struct PollPacing {
    /// Base delay between polling rounds.
    pub base: Duration,
    /// Maximum deviation in either direction.
    pub jitter: Duration,
}

impl PollPacing {
    /// Next delay: `base ± random[0, jitter]`, never below zero.
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as i64;
        if jitter_ms == 0 {
            return self.base;
        }
        let mut rng = rand::rng();
        let offset = rng.random_range(-jitter_ms..=jitter_ms);
        let base_ms = self.base.as_millis() as i64;
        Duration::from_millis(base_ms.saturating_add(offset).max(0) as u64)
    }
}

/// The polling loop itself.
///
/// Runs until cancelled. One round queries every source, sums with
/// saturating addition and submits the total as
/// `rewardsScheduledForAddress`; a failure to persist that is fatal and
/// propagates, everything else is survivable.
pub struct RewardsLoop<S> {
    sources: SharedRewardSources,
    wallet: String,
    sink: S,
    contracts_poll: Duration,
    pacing: PollPacing,
}

impl<S: MetricsSink> RewardsLoop<S> {
    pub fn new(
        sources: SharedRewardSources,
        wallet: impl Into<String>,
        sink: S,
        contracts_poll: Duration,
        pacing: PollPacing,
    ) -> Self {
        Self {
            sources,
            wallet: wallet.into(),
            sink,
            contracts_poll,
            pacing,
        }
    }

    /// Runs rounds until `token` cancels. Cancellation is the only
    /// non-error way out.
    pub async fn run(self, token: CancellationToken) -> Result<(), StationError> {
        loop {
            while self.sources.read().await.is_empty() {
                tokio::select! {
                    _ = token.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(self.contracts_poll) => {}
                }
            }

            let total = self.poll_once().await;
            self.sink
                .submit(MetricsUpdate {
                    rewards_scheduled_for_address: Some(total.to_string()),
                    ..Default::default()
                })
                .await?;

            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.pacing.next_delay()) => {}
            }
        }
    }

    async fn poll_once(&self) -> u128 {
        // Snapshot the set so the lock is not held across chain queries.
        let sources: Vec<Arc<dyn RewardSource>> = self.sources.read().await.clone();
        let mut total: u128 = 0;
        for source in sources {
            match source.rewards_scheduled_for(&self.wallet).await {
                Ok(amount) => total = total.saturating_add(amount),
                Err(err) => {
                    tracing::error!(
                        "failed to get scheduled rewards from {}: {err:#}",
                        source.name()
                    );
                }
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedSource {
        name: &'static str,
        amount: u128,
    }

    #[async_trait]
    impl RewardSource for FixedSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn rewards_scheduled_for(&self, _wallet: &str) -> anyhow::Result<u128> {
            Ok(self.amount)
        }
    }

    struct FailingSource;

    #[async_trait]
    impl RewardSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn rewards_scheduled_for(&self, _wallet: &str) -> anyhow::Result<u128> {
            anyhow::bail!("chain unreachable")
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        updates: Arc<Mutex<Vec<MetricsUpdate>>>,
    }

    impl RecordingSink {
        fn recorded(&self) -> Vec<MetricsUpdate> {
            self.updates.lock().expect("sink lock").clone()
        }
    }

    #[async_trait]
    impl MetricsSink for RecordingSink {
        async fn submit(&self, update: MetricsUpdate) -> Result<(), StationError> {
            self.updates.lock().expect("sink lock").push(update);
            Ok(())
        }
    }

    fn fast_pacing() -> PollPacing {
        PollPacing {
            base: Duration::from_millis(10),
            jitter: Duration::ZERO,
        }
    }

    async fn wait_for_updates(sink: &RecordingSink, n: usize) -> Vec<MetricsUpdate> {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let updates = sink.recorded();
                if updates.len() >= n {
                    return updates;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("updates must arrive in time")
    }

    #[test]
    fn test_pacing_stays_within_the_jitter_band() {
        let pacing = PollPacing {
            base: Duration::from_millis(100),
            jitter: Duration::from_millis(20),
        };
        for _ in 0..200 {
            let delay = pacing.next_delay();
            assert!(
                (Duration::from_millis(80)..=Duration::from_millis(120)).contains(&delay),
                "delay out of band: {delay:?}"
            );
        }

        let fixed = PollPacing {
            base: Duration::from_millis(100),
            jitter: Duration::ZERO,
        };
        assert_eq!(fixed.next_delay(), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_failing_source_contributes_zero_and_loop_continues() {
        let sources: SharedRewardSources = Arc::new(RwLock::new(vec![
            Arc::new(FailingSource) as Arc<dyn RewardSource>,
            Arc::new(FixedSource {
                name: "fixed",
                amount: 5,
            }),
        ]));
        let sink = RecordingSink::default();
        let handle = tokio::spawn(
            RewardsLoop::new(
                sources,
                "f1wallet",
                sink.clone(),
                Duration::from_millis(5),
                fast_pacing(),
            )
            .run(CancellationToken::new()),
        );

        let updates = wait_for_updates(&sink, 2).await;
        assert_eq!(
            updates[0].rewards_scheduled_for_address,
            Some("5".to_string()),
            "the failing source must fall back to zero, not poison the sum"
        );
        assert!(updates.len() >= 2, "loop must keep polling after a failure");

        handle.abort();
    }

    #[tokio::test]
    async fn test_sum_saturates_instead_of_overflowing() {
        let sources: SharedRewardSources = Arc::new(RwLock::new(vec![
            Arc::new(FixedSource {
                name: "max",
                amount: u128::MAX,
            }) as Arc<dyn RewardSource>,
            Arc::new(FixedSource {
                name: "more",
                amount: 5,
            }),
        ]));
        let sink = RecordingSink::default();
        let handle = tokio::spawn(
            RewardsLoop::new(
                sources,
                "f1wallet",
                sink.clone(),
                Duration::from_millis(5),
                fast_pacing(),
            )
            .run(CancellationToken::new()),
        );

        let updates = wait_for_updates(&sink, 1).await;
        assert_eq!(
            updates[0].rewards_scheduled_for_address,
            Some(u128::MAX.to_string())
        );
        handle.abort();
    }

    #[tokio::test]
    async fn test_loop_idles_until_sources_appear() {
        let sources: SharedRewardSources = Arc::new(RwLock::new(Vec::new()));
        let sink = RecordingSink::default();
        let token = CancellationToken::new();
        let handle = tokio::spawn(
            RewardsLoop::new(
                sources.clone(),
                "f1wallet",
                sink.clone(),
                Duration::from_millis(5),
                fast_pacing(),
            )
            .run(token.clone()),
        );

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(
            sink.recorded().is_empty(),
            "no sources means nothing to report"
        );

        sources.write().await.push(Arc::new(FixedSource {
            name: "fixed",
            amount: 3,
        }));
        let updates = wait_for_updates(&sink, 1).await;
        assert_eq!(
            updates[0].rewards_scheduled_for_address,
            Some("3".to_string())
        );

        token.cancel();
        let result = handle.await.expect("join");
        assert!(result.is_ok(), "cancellation is a clean exit");
    }
}
