//! Availability Monitor - probes capabilities and caches the verdict

use std::collections::HashMap;
use std::time::Duration;

use apilama_core::{AvailabilityState, CapabilityAdapter};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

/// How long a probe result is trusted
pub const DEFAULT_AVAILABILITY_TTL: Duration = Duration::from_secs(30);

/// Upper bound on a single probe, independent of operation timeouts
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of the most recent probe of one capability
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityRecord {
    pub capability_name: String,
    pub state: AvailabilityState,
    /// Monotonic probe time, used for freshness
    #[serde(skip)]
    pub checked_at: Instant,
    /// Wall-clock probe time, for reporting
    #[serde(rename = "checked_at")]
    pub checked_at_utc: DateTime<Utc>,
    #[serde(skip)]
    pub ttl: Duration,
}

impl AvailabilityRecord {
    pub fn is_fresh(&self) -> bool {
        self.checked_at.elapsed() < self.ttl
    }

    /// State to act on: an expired record counts as unknown
    pub fn effective_state(&self) -> AvailabilityState {
        if self.is_fresh() {
            self.state
        } else {
            AvailabilityState::Unknown
        }
    }
}

/// Lazily probes capabilities and caches each verdict for `ttl`.
///
/// Records are created on first check and replaced wholesale on refresh.
/// Concurrent refreshes of the same expired record may both probe; the
/// last one to finish wins.
pub struct AvailabilityMonitor {
    ttl: Duration,
    probe_timeout: Duration,
    records: RwLock<HashMap<String, AvailabilityRecord>>,
}

impl AvailabilityMonitor {
    pub fn new(ttl: Duration, probe_timeout: Duration) -> Self {
        Self {
            ttl,
            probe_timeout,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Current state of `capability`, probing through `adapter` if the
    /// cached record is missing or expired. Never fails: a probe that
    /// times out yields `Unavailable`.
    pub async fn check(
        &self,
        capability: &str,
        adapter: &dyn CapabilityAdapter,
    ) -> AvailabilityState {
        if let Some(state) = self.cached(capability) {
            return state;
        }

        let state = match tokio::time::timeout(self.probe_timeout, adapter.probe()).await {
            Ok(state) => state,
            Err(_) => {
                debug!(
                    capability = %capability,
                    timeout_ms = self.probe_timeout.as_millis() as u64,
                    "Probe timed out"
                );
                AvailabilityState::Unavailable
            }
        };

        self.record(capability, state);
        state
    }

    /// Fresh cached state, if any
    pub fn cached(&self, capability: &str) -> Option<AvailabilityState> {
        self.records
            .read()
            .get(capability)
            .filter(|record| record.is_fresh())
            .map(|record| record.state)
    }

    /// Store a probe result, replacing any previous record
    pub fn record(&self, capability: &str, state: AvailabilityState) {
        let record = AvailabilityRecord {
            capability_name: capability.to_string(),
            state,
            checked_at: Instant::now(),
            checked_at_utc: Utc::now(),
            ttl: self.ttl,
        };

        let previous = self.records.write().insert(capability.to_string(), record);
        match previous.map(|p| p.state) {
            Some(old) if old != state => {
                info!(capability = %capability, from = ?old, to = ?state, "Availability changed")
            }
            None => debug!(capability = %capability, state = ?state, "Availability recorded"),
            _ => {}
        }
    }

    /// Last record for `capability`, fresh or not
    pub fn snapshot(&self, capability: &str) -> Option<AvailabilityRecord> {
        self.records.read().get(capability).cloned()
    }

    /// Drop the cached record so the next check probes again
    pub fn invalidate(&self, capability: &str) {
        self.records.write().remove(capability);
    }
}

impl Default for AvailabilityMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_AVAILABILITY_TTL, DEFAULT_PROBE_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apilama_core::{Arguments, Operation, OperationOutcome, Payload};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ProbeCounter {
        state: AvailabilityState,
        delay: Duration,
        probes: AtomicUsize,
    }

    impl ProbeCounter {
        fn new(state: AvailabilityState) -> Self {
            Self {
                state,
                delay: Duration::ZERO,
                probes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CapabilityAdapter for ProbeCounter {
        fn capability(&self) -> &str {
            "test"
        }

        async fn probe(&self) -> AvailabilityState {
            self.probes.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.state
        }

        async fn execute(&self, _: Operation, _: &Arguments) -> OperationOutcome {
            Ok(Payload::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reuses_record_until_ttl_elapses() {
        let monitor = AvailabilityMonitor::new(Duration::from_secs(30), DEFAULT_PROBE_TIMEOUT);
        let adapter = ProbeCounter::new(AvailabilityState::Available);

        assert_eq!(monitor.check("files", &adapter).await, AvailabilityState::Available);
        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(monitor.check("files", &adapter).await, AvailabilityState::Available);
        assert_eq!(adapter.probes.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(monitor.check("files", &adapter).await, AvailabilityState::Available);
        assert_eq!(adapter.probes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_probe_is_unavailable() {
        let monitor = AvailabilityMonitor::new(Duration::from_secs(30), Duration::from_millis(100));
        let mut adapter = ProbeCounter::new(AvailabilityState::Available);
        adapter.delay = Duration::from_secs(10);

        assert_eq!(monitor.check("slow", &adapter).await, AvailabilityState::Unavailable);
        assert_eq!(monitor.cached("slow"), Some(AvailabilityState::Unavailable));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_record_reads_as_unknown() {
        let monitor = AvailabilityMonitor::new(Duration::from_secs(5), DEFAULT_PROBE_TIMEOUT);
        monitor.record("files", AvailabilityState::Available);
        assert_eq!(
            monitor.snapshot("files").unwrap().effective_state(),
            AvailabilityState::Available
        );

        tokio::time::advance(Duration::from_secs(6)).await;
        let record = monitor.snapshot("files").unwrap();
        assert!(!record.is_fresh());
        assert_eq!(record.effective_state(), AvailabilityState::Unknown);
        assert_eq!(monitor.cached("files"), None);
    }

    #[tokio::test]
    async fn test_last_probe_wins_and_invalidate() {
        let monitor = AvailabilityMonitor::default();
        monitor.record("files", AvailabilityState::Available);
        monitor.record("files", AvailabilityState::Unavailable);
        assert_eq!(monitor.cached("files"), Some(AvailabilityState::Unavailable));

        monitor.invalidate("files");
        assert!(monitor.snapshot("files").is_none());

        let adapter = ProbeCounter::new(AvailabilityState::Available);
        assert_eq!(monitor.check("files", &adapter).await, AvailabilityState::Available);
        assert_eq!(adapter.probes.load(Ordering::SeqCst), 1);
    }
}
