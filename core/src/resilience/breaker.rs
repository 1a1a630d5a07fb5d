// bazaar/src/resilience/breaker.rs

//! Circuit breaker for one remote dependency.
//!
//! CLOSED lets calls through and tracks outcomes in a sliding window. When the
//! window's failure rate crosses the threshold the breaker OPENs and rejects calls
//! without touching the network. After `open_duration` exactly one probe is let
//! through (HALF_OPEN): success closes the breaker, failure reopens it and restarts
//! the open timer.
//!
//! State and counters are atomics; the window and timestamps sit behind short
//! parking_lot locks that are never held across an `.await`.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::config::BreakerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum CircuitState {
  Closed = 0,
  Open = 1,
  HalfOpen = 2,
}

impl From<u8> for CircuitState {
  fn from(value: u8) -> Self {
    match value {
      0 => Self::Closed,
      2 => Self::HalfOpen,
      _ => Self::Open,
    }
  }
}

impl fmt::Display for CircuitState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CircuitState::Closed => f.write_str("CLOSED"),
      CircuitState::Open => f.write_str("OPEN"),
      CircuitState::HalfOpen => f.write_str("HALF_OPEN"),
    }
  }
}

/// Returned by `try_acquire` when the breaker refuses the call.
#[derive(Debug, Clone, Error)]
#[error("Circuit breaker '{name}' is {state}; call rejected")]
pub struct BreakerRejected {
  pub name: String,
  pub state: CircuitState,
  pub last_failure: Option<String>,
}

/// Point-in-time view of a breaker, for health reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerSnapshot {
  pub name: String,
  pub state: CircuitState,
  pub calls_in_window: u64,
  pub failures_in_window: u64,
  pub rejected_calls: u64,
  pub last_failure: Option<String>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
  name: String,
  config: BreakerConfig,
  state: AtomicU8,
  window: Mutex<VecDeque<(Instant, bool)>>,
  opened_at: Mutex<Option<Instant>>,
  probe_in_flight: AtomicBool,
  rejected_calls: AtomicU64,
  last_failure: Mutex<Option<String>>,
}

/// Admission ticket for one call. Settle it with `success()` or `failure()`.
///
/// A probe permit dropped without being settled (the caller's future was cancelled)
/// counts as a failed probe, so the breaker can never stay stuck in HALF_OPEN.
#[must_use = "a permit must be settled with success() or failure()"]
#[derive(Debug)]
pub struct CallPermit<'a> {
  breaker: &'a CircuitBreaker,
  probe: bool,
  settled: bool,
}

impl CallPermit<'_> {
  pub fn is_probe(&self) -> bool {
    self.probe
  }

  pub fn success(mut self) {
    self.settled = true;
    self.breaker.on_success(self.probe);
  }

  pub fn failure(mut self, reason: &str) {
    self.settled = true;
    self.breaker.on_failure(self.probe, reason);
  }
}

impl Drop for CallPermit<'_> {
  fn drop(&mut self) {
    if !self.settled && self.probe {
      self.breaker.on_failure(true, "probe call abandoned before completion");
    }
  }
}

impl CircuitBreaker {
  pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
    Self {
      name: name.into(),
      config,
      state: AtomicU8::new(CircuitState::Closed as u8),
      window: Mutex::new(VecDeque::new()),
      opened_at: Mutex::new(None),
      probe_in_flight: AtomicBool::new(false),
      rejected_calls: AtomicU64::new(0),
      last_failure: Mutex::new(None),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn state(&self) -> CircuitState {
    CircuitState::from(self.state.load(Ordering::Acquire))
  }

  /// Gate for one call: `Ok` lets it through, `Err` means fail fast.
  pub fn try_acquire(&self) -> Result<CallPermit<'_>, BreakerRejected> {
    match self.state() {
      CircuitState::Closed => Ok(self.permit(false)),
      CircuitState::Open => {
        // No timestamp yet means the breaker is still being opened.
        let opened_at = *self.opened_at.lock();
        let cooled_down = opened_at.map_or(false, |at| at.elapsed() >= self.config.open_duration);
        if cooled_down && self.claim_probe() {
          self.state.store(CircuitState::HalfOpen as u8, Ordering::Release);
          info!(breaker = %self.name, "Circuit breaker half-open; admitting probe call.");
          return Ok(self.permit(true));
        }
        Err(self.reject())
      }
      CircuitState::HalfOpen => {
        if self.claim_probe() {
          Ok(self.permit(true))
        } else {
          Err(self.reject())
        }
      }
    }
  }

  pub fn snapshot(&self) -> BreakerSnapshot {
    let (calls_in_window, failures_in_window) = self.window_counts();
    BreakerSnapshot {
      name: self.name.clone(),
      state: self.state(),
      calls_in_window,
      failures_in_window,
      rejected_calls: self.rejected_calls.load(Ordering::Relaxed),
      last_failure: self.last_failure.lock().clone(),
    }
  }

  /// Forces OPEN, restarting the open timer.
  pub fn force_open(&self) {
    warn!(breaker = %self.name, "Manually forcing circuit breaker open.");
    *self.last_failure.lock() = Some("manually forced open".to_string());
    self.transition_to_open();
  }

  fn permit(&self, probe: bool) -> CallPermit<'_> {
    CallPermit {
      breaker: self,
      probe,
      settled: false,
    }
  }

  fn claim_probe(&self) -> bool {
    self
      .probe_in_flight
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }

  fn reject(&self) -> BreakerRejected {
    self.rejected_calls.fetch_add(1, Ordering::Relaxed);
    BreakerRejected {
      name: self.name.clone(),
      state: self.state(),
      last_failure: self.last_failure.lock().clone(),
    }
  }

  fn on_success(&self, probe: bool) {
    if probe {
      info!(breaker = %self.name, "Probe call succeeded; closing circuit breaker.");
      self.transition_to_closed();
      self.probe_in_flight.store(false, Ordering::Release);
      return;
    }
    self.record_outcome(true);
  }

  fn on_failure(&self, probe: bool, reason: &str) {
    *self.last_failure.lock() = Some(reason.to_string());

    if probe {
      warn!(breaker = %self.name, reason, "Probe call failed; reopening circuit breaker.");
      self.transition_to_open();
      self.probe_in_flight.store(false, Ordering::Release);
      return;
    }

    let (total, failures) = self.record_outcome(false);
    if self.state() == CircuitState::Closed && self.config.is_tripped_by(total, failures) {
      // Held across the swap so no reader sees OPEN without its timestamp.
      let mut opened_at = self.opened_at.lock();
      let opened = self
        .state
        .compare_exchange(
          CircuitState::Closed as u8,
          CircuitState::Open as u8,
          Ordering::AcqRel,
          Ordering::Acquire,
        )
        .is_ok();
      if opened {
        *opened_at = Some(Instant::now());
        drop(opened_at);
        self.window.lock().clear();
        error!(
          breaker = %self.name,
          failures,
          total,
          threshold_percent = self.config.failure_rate_threshold,
          "Circuit breaker opened."
        );
      }
    }
  }

  /// Appends an outcome, prunes expired entries, returns (calls, failures) in window.
  fn record_outcome(&self, ok: bool) -> (u64, u64) {
    let now = Instant::now();
    let mut window = self.window.lock();
    window.push_back((now, ok));
    Self::prune(&mut window, now, self.config.window);
    Self::count(&window)
  }

  fn window_counts(&self) -> (u64, u64) {
    let mut window = self.window.lock();
    Self::prune(&mut window, Instant::now(), self.config.window);
    Self::count(&window)
  }

  fn prune(window: &mut VecDeque<(Instant, bool)>, now: Instant, span: std::time::Duration) {
    while let Some((recorded_at, _)) = window.front() {
      if now.duration_since(*recorded_at) > span {
        window.pop_front();
      } else {
        break;
      }
    }
  }

  fn count(window: &VecDeque<(Instant, bool)>) -> (u64, u64) {
    let total = window.len() as u64;
    let failures = window.iter().filter(|(_, ok)| !*ok).count() as u64;
    (total, failures)
  }

  fn transition_to_closed(&self) {
    self.state.store(CircuitState::Closed as u8, Ordering::Release);
    *self.opened_at.lock() = None;
    self.window.lock().clear();
  }

  fn transition_to_open(&self) {
    *self.opened_at.lock() = Some(Instant::now());
    self.window.lock().clear();
    self.state.store(CircuitState::Open as u8, Ordering::Release);
  }
}
