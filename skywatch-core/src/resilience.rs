//! Circuit breaking and degraded fallback around a [`WeatherSource`].

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::{
    config::{BreakerSettings, Config},
    error::{ProviderError, ProviderErrorKind},
    model::Location,
    provider::WeatherSource,
    record::WeatherRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls are refused until the cool-down elapses.
    Open,
    /// One trial call is in flight; its outcome decides the next state.
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

/// Consecutive-failure circuit breaker. State transitions are serialized by
/// one mutex; the guarded call itself runs outside the lock.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cool_down: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cool_down: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cool_down,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    pub fn from_settings(settings: &BreakerSettings) -> Self {
        Self::new(settings.failure_threshold, settings.cool_down())
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    /// Whether a call may proceed now. An open circuit whose cool-down has
    /// elapsed moves to half-open and admits exactly one trial call.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let cooled = inner.opened_at.is_none_or(|at| at.elapsed() >= self.cool_down);
                if cooled {
                    tracing::info!("circuit half-open, admitting trial call");
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_in_flight = true;
                }
                cooled
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    false
                } else {
                    inner.trial_in_flight = true;
                    true
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            tracing::info!("circuit closed after successful call");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.trial_in_flight = false;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.trial_in_flight = false;

        let trip = match inner.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => inner.consecutive_failures >= self.failure_threshold,
            CircuitState::Open => false,
        };
        if trip {
            tracing::warn!(failures = inner.consecutive_failures, "circuit opened");
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    pub fn reset(&self) {
        self.record_success();
    }

    /// Like [`CircuitBreaker::try_acquire`], but hands out a permit that must
    /// be resolved with the call's outcome.
    pub fn acquire(&self) -> Option<CallPermit<'_>> {
        if self.try_acquire() {
            Some(CallPermit { breaker: self, resolved: false })
        } else {
            None
        }
    }

    /// A trial call ended without an outcome. Reopen so the next cool-down
    /// can admit a fresh trial.
    fn abandon(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen && inner.trial_in_flight {
            tracing::warn!("trial call abandoned, circuit reopened");
            inner.trial_in_flight = false;
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    fn is_refusing(&self) -> bool {
        let inner = self.inner.lock();
        inner.state == CircuitState::Open
            && inner.opened_at.is_some_and(|at| at.elapsed() < self.cool_down)
    }
}

/// Admission through a [`CircuitBreaker`]. Dropping it unresolved, as when
/// the calling future is cancelled, releases a half-open trial slot.
#[derive(Debug)]
#[must_use]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    resolved: bool,
}

impl CallPermit<'_> {
    pub fn succeed(mut self) {
        self.resolved = true;
        self.breaker.record_success();
    }

    pub fn fail(mut self) {
        self.resolved = true;
        self.breaker.record_failure();
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            self.breaker.abandon();
        }
    }
}

/// Decorates a source so that callers always receive a record: failures,
/// timeouts and an open circuit all yield [`WeatherRecord::unavailable`].
#[derive(Debug)]
pub struct ResilientSource {
    inner: Arc<dyn WeatherSource>,
    breaker: CircuitBreaker,
    call_timeout: Duration,
}

impl ResilientSource {
    pub fn new(inner: Arc<dyn WeatherSource>, breaker: CircuitBreaker, call_timeout: Duration) -> Self {
        Self { inner, breaker, call_timeout }
    }

    pub fn from_config(inner: Arc<dyn WeatherSource>, config: &Config) -> Self {
        Self::new(
            inner,
            CircuitBreaker::from_settings(&config.circuit_breaker),
            config.http.call_timeout(),
        )
    }

    pub fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Fetch through the breaker, substituting a degraded record on any failure.
    pub async fn fetch(&self, location: &Location) -> WeatherRecord {
        match self.try_fetch(location).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    provider = self.provider_name(),
                    %location,
                    error = %e,
                    "serving fallback weather record"
                );
                WeatherRecord::unavailable(location.clone(), self.provider_name())
            }
        }
    }

    /// Fetch through the breaker without the fallback.
    pub async fn try_fetch(&self, location: &Location) -> Result<WeatherRecord, ProviderError> {
        let Some(permit) = self.breaker.acquire() else {
            return Err(ProviderError::new(
                ProviderErrorKind::ServiceUnavailable,
                self.provider_name(),
                "circuit open",
            ));
        };

        let outcome = match tokio::time::timeout(self.call_timeout, self.inner.fetch(location)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(ProviderError::new(
                ProviderErrorKind::Transport,
                self.provider_name(),
                format!("no response within {} ms", self.call_timeout.as_millis()),
            )),
        };

        match &outcome {
            Ok(_) => permit.succeed(),
            // The provider answered; the query itself was wrong.
            Err(e) if e.kind == ProviderErrorKind::LocationNotFound => permit.succeed(),
            Err(_) => permit.fail(),
        }
        outcome
    }

    pub async fn is_available(&self) -> bool {
        if self.breaker.is_refusing() {
            return false;
        }
        tokio::time::timeout(self.call_timeout, self.inner.is_available())
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        for _ in 0..2 {
            assert!(breaker.try_acquire());
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Closed);

        assert!(breaker.try_acquire());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.try_acquire());
    }

    #[test]
    fn success_resets_failure_count() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        assert_eq!(breaker.consecutive_failures(), 0);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_admits_a_single_trial() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(10));
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(20));
        assert!(breaker.try_acquire());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(!breaker.try_acquire());

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire());
    }

    #[test]
    fn failed_trial_reopens() {
        let breaker = CircuitBreaker::new(2, Duration::from_millis(10));
        breaker.record_failure();
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(20));
        assert!(breaker.try_acquire());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.try_acquire());
    }

    #[test]
    fn dropped_trial_permit_reopens_the_circuit() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(10));
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(20));

        let permit = breaker.acquire().unwrap();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        drop(permit);
        assert_eq!(breaker.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(20));
        breaker.acquire().unwrap().succeed();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn dropped_permit_while_closed_changes_nothing() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        drop(breaker.acquire());
        assert_eq!(breaker.state(), CircuitState::Closed);

        breaker.record_failure();
        breaker.record_failure();
        // Refused while open; the refusal must not disturb the cool-down.
        assert!(breaker.acquire().is_none());
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[test]
    fn zero_threshold_is_treated_as_one() {
        let breaker = CircuitBreaker::new(0, Duration::from_secs(60));
        assert!(breaker.try_acquire());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }
}
