use crate::core::{DbError, SQLSTATE_DEADLOCK_DETECTED, SQLSTATE_SERIALIZATION_FAILURE};
use rand::Rng;
use std::time::Duration;

/// A failed attempt, classified once at the executor boundary.
///
/// Retry logic pattern-matches on this instead of re-inspecting vendor codes
/// throughout; the SQLSTATE is looked at exactly here.
#[derive(Debug)]
pub(crate) enum AttemptFailure {
    /// The database aborted the attempt with a serialization or deadlock
    /// code. The operation may be retried on the same connection.
    Retryable(DbError),
    /// Anything else; roll back and propagate immediately.
    Fatal(DbError),
}

pub(crate) fn classify(error: DbError) -> AttemptFailure {
    match error.sqlstate() {
        Some(SQLSTATE_SERIALIZATION_FAILURE) | Some(SQLSTATE_DEADLOCK_DETECTED) => {
            AttemptFailure::Retryable(error)
        }
        _ => AttemptFailure::Fatal(error),
    }
}

/// Exponentially growing, jittered delay between retry attempts.
///
/// Jitter keeps colliding operations from retrying in lockstep and
/// conflicting again.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(20),
            multiplier: 2.0,
            max_delay: Duration::from_secs(1),
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `retry` (1-based), jittered down to at most
    /// half the nominal value.
    pub fn delay(&self, retry: u32) -> Duration {
        let nominal = self.initial_delay.as_secs_f64()
            * self.multiplier.powi(retry.saturating_sub(1) as i32);
        let capped = nominal.min(self.max_delay.as_secs_f64());
        let jitter = rand::thread_rng().gen_range(0.5..1.0);
        Duration::from_secs_f64(capped * jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_codes_are_retryable() {
        assert!(matches!(
            classify(DbError::serialization("conflict")),
            AttemptFailure::Retryable(_)
        ));
        assert!(matches!(
            classify(DbError::Sql {
                code: "40P01".into(),
                message: "deadlock".into()
            }),
            AttemptFailure::Retryable(_)
        ));
    }

    #[test]
    fn test_other_failures_are_fatal() {
        assert!(matches!(
            classify(DbError::Execution("boom".into())),
            AttemptFailure::Fatal(_)
        ));
        assert!(matches!(
            classify(DbError::read_only("write rejected")),
            AttemptFailure::Fatal(_)
        ));
        assert!(matches!(
            classify(DbError::TableNotFound("t".into())),
            AttemptFailure::Fatal(_)
        ));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = BackoffPolicy {
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_millis(300),
        };
        for retry in 1..=6 {
            let delay = policy.delay(retry);
            let nominal = (100.0 * 2f64.powi(retry as i32 - 1)).min(300.0);
            assert!(delay <= Duration::from_secs_f64(nominal / 1000.0));
            assert!(delay >= Duration::from_secs_f64(nominal / 2000.0));
        }
    }
}
