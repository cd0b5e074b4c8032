//! Provider Health Tracker - rolling per-provider counters and cooldowns.
//!
//! One record per registered provider, created at registration and never
//! deleted. The orchestrator is the only writer (after each call attempt);
//! the selector reads eligibility and error counts. All mutation goes
//! through the operations here so the cooldown invariant holds under
//! concurrent failures from multiple conversations hitting one provider.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::ports::ErrorClass;

/// Cooldown and decay policy.
///
/// Backoff grows geometrically with the consecutive error count, capped at
/// `max_cooldown`. Rate limiting and server errors use the larger base.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Base cooldown for `RateLimited`, `ServerError`, and `AuthInvalid`.
    pub severe_base: Duration,
    /// Base cooldown for `Timeout` and `Malformed`.
    pub mild_base: Duration,
    /// Upper bound on any single cooldown.
    pub max_cooldown: Duration,
    /// Grace interval after which one consecutive error is forgiven.
    pub decay_grace: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            severe_base: Duration::seconds(30),
            mild_base: Duration::seconds(10),
            max_cooldown: Duration::minutes(10),
            decay_grace: Duration::seconds(60),
        }
    }
}

impl BackoffPolicy {
    /// Cooldown for the nth consecutive error of the given class.
    pub fn backoff(&self, consecutive_errors: u32, class: ErrorClass) -> Duration {
        let base = match class {
            ErrorClass::RateLimited | ErrorClass::ServerError | ErrorClass::AuthInvalid => {
                self.severe_base
            }
            ErrorClass::Timeout | ErrorClass::Malformed => self.mild_base,
        };
        // base * 2^(count-1), saturating well before overflow
        let exponent = consecutive_errors.saturating_sub(1).min(16);
        let cooldown = base * 2_i32.pow(exponent);
        cooldown.min(self.max_cooldown)
    }
}

/// Rolling health state for one provider.
#[derive(Debug, Clone, Default)]
struct HealthRecord {
    consecutive_errors: u32,
    total_requests: u64,
    total_errors: u64,
    last_success: Option<DateTime<Utc>>,
    last_failure: Option<DateTime<Utc>>,
    cooldown_until: Option<DateTime<Utc>>,
    last_decay: Option<DateTime<Utc>>,
}

impl HealthRecord {
    /// Forgive one consecutive error per elapsed grace interval since the
    /// later of the last failure and the last applied decay.
    fn apply_decay(&mut self, now: DateTime<Utc>, grace: Duration) {
        if self.consecutive_errors == 0 {
            return;
        }
        let Some(last_failure) = self.last_failure else {
            return;
        };
        let basis = match self.last_decay {
            Some(d) if d > last_failure => d,
            _ => last_failure,
        };
        let elapsed = now - basis;
        if elapsed <= grace {
            return;
        }
        let decrements = (elapsed.num_seconds() / grace.num_seconds().max(1)) as u32;
        let applied = decrements.min(self.consecutive_errors);
        self.consecutive_errors -= applied;
        self.last_decay = Some(basis + grace * applied as i32);
    }

    fn in_cooldown(&self, now: DateTime<Utc>) -> bool {
        matches!(self.cooldown_until, Some(until) if now < until)
    }
}

/// Read-only health snapshot for one provider, exposed for observability.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    pub name: String,
    pub total_requests: u64,
    pub total_errors: u64,
    pub consecutive_errors: u32,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub in_cooldown: bool,
}

/// Tracks rolling health for every registered provider.
#[derive(Debug)]
pub struct HealthTracker {
    policy: BackoffPolicy,
    /// Registration order, preserved for snapshots.
    names: Vec<String>,
    records: RwLock<HashMap<String, HealthRecord>>,
}

impl HealthTracker {
    /// Creates a tracker with one fresh record per provider name.
    pub fn new(names: impl IntoIterator<Item = String>, policy: BackoffPolicy) -> Self {
        let names: Vec<String> = names.into_iter().collect();
        let records = names
            .iter()
            .map(|n| (n.clone(), HealthRecord::default()))
            .collect();
        Self {
            policy,
            names,
            records: RwLock::new(records),
        }
    }

    /// Creates a tracker with the default backoff policy.
    pub fn with_defaults(names: impl IntoIterator<Item = String>) -> Self {
        Self::new(names, BackoffPolicy::default())
    }

    /// Record a successful call: consecutive errors reset, cooldown cleared.
    pub async fn record_success(&self, provider: &str, now: DateTime<Utc>) {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(provider) {
            record.total_requests += 1;
            record.consecutive_errors = 0;
            record.last_success = Some(now);
            record.cooldown_until = None;
            record.last_decay = None;
        }
    }

    /// Record a classified failure and start a cooldown.
    pub async fn record_failure(&self, provider: &str, class: ErrorClass, now: DateTime<Utc>) {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(provider) {
            record.total_requests += 1;
            record.total_errors += 1;
            record.consecutive_errors += 1;
            record.last_failure = Some(now);
            record.last_decay = None;
            let cooldown = self.policy.backoff(record.consecutive_errors, class);
            // cooldown_until >= last_failure holds since cooldown is positive
            record.cooldown_until = Some(now + cooldown);
        }
    }

    /// Whether a provider may be selected at `now`.
    ///
    /// Applies lazy decay first so a provider that went quiet after a burst
    /// of errors gradually recovers its ordering position.
    pub async fn is_eligible(&self, provider: &str, now: DateTime<Utc>) -> bool {
        let mut records = self.records.write().await;
        match records.get_mut(provider) {
            Some(record) => {
                record.apply_decay(now, self.policy.decay_grace);
                !record.in_cooldown(now)
            }
            None => false,
        }
    }

    /// Apply decay to every record.
    pub async fn decay(&self, now: DateTime<Utc>) {
        let mut records = self.records.write().await;
        for record in records.values_mut() {
            record.apply_decay(now, self.policy.decay_grace);
        }
    }

    /// Current consecutive error count, for selection ordering.
    pub async fn consecutive_errors(&self, provider: &str) -> u32 {
        let records = self.records.read().await;
        records
            .get(provider)
            .map(|r| r.consecutive_errors)
            .unwrap_or(0)
    }

    /// Read-only snapshot of every provider, in registration order.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Vec<ProviderHealth> {
        let records = self.records.read().await;
        self.names
            .iter()
            .filter_map(|name| {
                records.get(name).map(|r| ProviderHealth {
                    name: name.clone(),
                    total_requests: r.total_requests,
                    total_errors: r.total_errors,
                    consecutive_errors: r.consecutive_errors,
                    last_success: r.last_success,
                    last_failure: r.last_failure,
                    cooldown_until: r.cooldown_until,
                    in_cooldown: r.in_cooldown(now),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        "2025-01-15T12:00:00Z".parse().unwrap()
    }

    fn tracker() -> HealthTracker {
        HealthTracker::with_defaults(vec!["gemini".to_string(), "openrouter".to_string()])
    }

    #[tokio::test]
    async fn fresh_provider_is_eligible() {
        let tracker = tracker();
        assert!(tracker.is_eligible("gemini", t0()).await);
    }

    #[tokio::test]
    async fn unknown_provider_is_not_eligible() {
        let tracker = tracker();
        assert!(!tracker.is_eligible("nonexistent", t0()).await);
    }

    #[tokio::test]
    async fn failure_starts_cooldown() {
        let tracker = tracker();
        let now = t0();

        tracker
            .record_failure("gemini", ErrorClass::ServerError, now)
            .await;

        assert!(!tracker.is_eligible("gemini", now).await);
        // Severe base is 30s: still cooling at +29s, eligible at +30s
        assert!(
            !tracker
                .is_eligible("gemini", now + Duration::seconds(29))
                .await
        );
        assert!(
            tracker
                .is_eligible("gemini", now + Duration::seconds(30))
                .await
        );
    }

    #[tokio::test]
    async fn timeout_cooldown_is_shorter_than_server_error() {
        let tracker = tracker();
        let now = t0();

        tracker
            .record_failure("gemini", ErrorClass::Timeout, now)
            .await;
        tracker
            .record_failure("openrouter", ErrorClass::ServerError, now)
            .await;

        // Mild base is 10s
        assert!(
            tracker
                .is_eligible("gemini", now + Duration::seconds(10))
                .await
        );
        assert!(
            !tracker
                .is_eligible("openrouter", now + Duration::seconds(10))
                .await
        );
    }

    #[tokio::test]
    async fn backoff_grows_geometrically() {
        let policy = BackoffPolicy::default();

        assert_eq!(
            policy.backoff(1, ErrorClass::ServerError),
            Duration::seconds(30)
        );
        assert_eq!(
            policy.backoff(2, ErrorClass::ServerError),
            Duration::seconds(60)
        );
        assert_eq!(
            policy.backoff(3, ErrorClass::ServerError),
            Duration::seconds(120)
        );
    }

    #[tokio::test]
    async fn backoff_is_capped() {
        let policy = BackoffPolicy::default();
        assert_eq!(
            policy.backoff(20, ErrorClass::ServerError),
            Duration::minutes(10)
        );
        assert_eq!(
            policy.backoff(u32::MAX, ErrorClass::Timeout),
            Duration::minutes(10)
        );
    }

    #[tokio::test]
    async fn success_resets_consecutive_errors_and_cooldown() {
        let tracker = tracker();
        let now = t0();

        tracker
            .record_failure("gemini", ErrorClass::ServerError, now)
            .await;
        tracker
            .record_failure("gemini", ErrorClass::ServerError, now + Duration::seconds(1))
            .await;
        assert_eq!(tracker.consecutive_errors("gemini").await, 2);

        tracker
            .record_success("gemini", now + Duration::seconds(2))
            .await;

        assert_eq!(tracker.consecutive_errors("gemini").await, 0);
        assert!(
            tracker
                .is_eligible("gemini", now + Duration::seconds(2))
                .await
        );
    }

    #[tokio::test]
    async fn decay_forgives_one_error_per_grace_interval() {
        let tracker = tracker();
        let now = t0();

        for i in 0..3 {
            tracker
                .record_failure("gemini", ErrorClass::Timeout, now + Duration::seconds(i))
                .await;
        }
        assert_eq!(tracker.consecutive_errors("gemini").await, 3);

        // Grace is 60s; ~65s of quiet forgives one error
        tracker.decay(now + Duration::seconds(67)).await;
        assert_eq!(tracker.consecutive_errors("gemini").await, 2);

        // Two more intervals forgive the rest
        tracker.decay(now + Duration::seconds(200)).await;
        assert_eq!(tracker.consecutive_errors("gemini").await, 0);
    }

    #[tokio::test]
    async fn decay_does_not_go_below_zero() {
        let tracker = tracker();
        let now = t0();

        tracker
            .record_failure("gemini", ErrorClass::Timeout, now)
            .await;
        tracker.decay(now + Duration::hours(1)).await;
        assert_eq!(tracker.consecutive_errors("gemini").await, 0);

        tracker.decay(now + Duration::hours(2)).await;
        assert_eq!(tracker.consecutive_errors("gemini").await, 0);
    }

    #[tokio::test]
    async fn single_failure_recovers_after_cooldown() {
        // Eventual recovery: one failure, then quiet, then eligible again.
        let tracker = tracker();
        let now = t0();

        tracker
            .record_failure("gemini", ErrorClass::RateLimited, now)
            .await;
        assert!(!tracker.is_eligible("gemini", now + Duration::seconds(5)).await);
        assert!(tracker.is_eligible("gemini", now + Duration::minutes(5)).await);
    }

    #[tokio::test]
    async fn snapshot_reports_counters_in_registration_order() {
        let tracker = tracker();
        let now = t0();

        tracker.record_success("gemini", now).await;
        tracker
            .record_failure("openrouter", ErrorClass::RateLimited, now)
            .await;

        let snapshot = tracker.snapshot(now).await;
        assert_eq!(snapshot.len(), 2);

        assert_eq!(snapshot[0].name, "gemini");
        assert_eq!(snapshot[0].total_requests, 1);
        assert_eq!(snapshot[0].total_errors, 0);
        assert!(!snapshot[0].in_cooldown);

        assert_eq!(snapshot[1].name, "openrouter");
        assert_eq!(snapshot[1].total_errors, 1);
        assert_eq!(snapshot[1].consecutive_errors, 1);
        assert!(snapshot[1].in_cooldown);
    }

    #[tokio::test]
    async fn cooldown_until_never_precedes_last_failure() {
        let tracker = tracker();
        let now = t0();

        tracker
            .record_failure("gemini", ErrorClass::Malformed, now)
            .await;

        let snapshot = tracker.snapshot(now).await;
        let record = &snapshot[0];
        assert!(record.cooldown_until.unwrap() >= record.last_failure.unwrap());
    }
}
