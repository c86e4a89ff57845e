//! Circuit breaker with a sliding outcome window and bounded half-open probes.
//!
//! State machine:
//!
//! ```text
//! Closed    → Open:      failure rate over the full window >= threshold
//! Open      → Half-Open: after the cooldown elapses (next permitted call)
//! Half-Open → Closed:    `half_open_trials` consecutive probe successes
//! Half-Open → Open:      any probe failure
//! ```
//!
//! One breaker instance is shared (via `Arc`) by every concurrent call for its
//! name; all mutation goes through [`CircuitBreaker::allow`],
//! [`CircuitBreaker::on_success`] and [`CircuitBreaker::on_failure`].

use crate::{Error, Result};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

/// Circuit states, observable through [`CircuitSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Failure percentage (0–100) over a full window that opens the circuit.
    pub failure_rate_threshold: f64,
    /// Number of recent call outcomes considered; the rate is only evaluated
    /// once the window is full.
    pub window_size: usize,
    /// How long the circuit stays open before permitting probes.
    pub cooldown: Duration,
    /// Probe budget in half-open state; this many consecutive successes close
    /// the circuit again.
    pub half_open_trials: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            window_size: 10,
            cooldown: Duration::from_secs(30),
            half_open_trials: 3,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_rate_threshold(mut self, percent: f64) -> Self {
        self.failure_rate_threshold = percent;
        self
    }

    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size.max(1);
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_half_open_trials(mut self, trials: u32) -> Self {
        self.half_open_trials = trials.max(1);
        self
    }
}

/// Point-in-time view of a circuit, for logs and operational endpoints.
#[derive(Debug, Clone)]
pub struct CircuitSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    /// Remaining open time in ms, if currently open.
    pub open_remaining_ms: Option<u64>,
    pub last_transition: Instant,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    /// Recent outcomes, `true` meaning failure. Only maintained while closed.
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    half_open_successes: u32,
    half_open_permits: u32,
    last_transition: Instant,
}

pub struct CircuitBreaker {
    name: String,
    cfg: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, cfg: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            cfg,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                window: VecDeque::new(),
                opened_at: None,
                half_open_successes: 0,
                half_open_permits: 0,
                last_transition: Instant::now(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gate consulted before every attempt.
    ///
    /// Fails fast with [`Error::CircuitOpen`] while open (and the cooldown has
    /// not elapsed) or when the half-open probe budget is exhausted — the
    /// short-circuit that protects the downstream. No network I/O happens on
    /// the rejection path.
    pub fn allow(&self) -> Result<()> {
        let mut st = self
            .inner
            .lock()
            .map_err(|_| Error::internal(format!("circuit breaker '{}' lock poisoned", self.name)))?;

        match st.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let elapsed = st.opened_at.map(|at| at.elapsed()).unwrap_or_default();
                if elapsed < self.cfg.cooldown {
                    return Err(Error::CircuitOpen {
                        circuit: self.name.clone(),
                    });
                }
                // Cooldown elapsed: permit a bounded set of probes.
                st.state = CircuitState::HalfOpen;
                st.half_open_successes = 0;
                st.half_open_permits = 1;
                st.last_transition = Instant::now();
                Ok(())
            }
            CircuitState::HalfOpen => {
                if st.half_open_permits < self.cfg.half_open_trials {
                    st.half_open_permits += 1;
                    Ok(())
                } else {
                    Err(Error::CircuitOpen {
                        circuit: self.name.clone(),
                    })
                }
            }
        }
    }

    pub fn on_success(&self) {
        if let Ok(mut st) = self.inner.lock() {
            match st.state {
                CircuitState::Closed => {
                    st.window.push_back(false);
                    while st.window.len() > self.cfg.window_size {
                        st.window.pop_front();
                    }
                }
                CircuitState::HalfOpen => {
                    st.half_open_successes += 1;
                    if st.half_open_successes >= self.cfg.half_open_trials {
                        st.state = CircuitState::Closed;
                        st.window.clear();
                        st.opened_at = None;
                        st.last_transition = Instant::now();
                    }
                }
                // A late success from a call admitted before opening.
                CircuitState::Open => {}
            }
        }
    }

    pub fn on_failure(&self) {
        if let Ok(mut st) = self.inner.lock() {
            match st.state {
                CircuitState::Closed => {
                    st.window.push_back(true);
                    while st.window.len() > self.cfg.window_size {
                        st.window.pop_front();
                    }
                    if st.window.len() == self.cfg.window_size {
                        let failures = st.window.iter().filter(|f| **f).count();
                        let rate = failures as f64 * 100.0 / self.cfg.window_size as f64;
                        if rate >= self.cfg.failure_rate_threshold {
                            warn!(
                                circuit = self.name.as_str(),
                                failure_rate = rate,
                                "failure rate threshold exceeded, opening circuit"
                            );
                            st.state = CircuitState::Open;
                            st.opened_at = Some(Instant::now());
                            st.last_transition = Instant::now();
                        }
                    }
                }
                CircuitState::HalfOpen => {
                    warn!(circuit = self.name.as_str(), "probe failed, reopening circuit");
                    st.state = CircuitState::Open;
                    st.opened_at = Some(Instant::now());
                    st.half_open_successes = 0;
                    st.half_open_permits = 0;
                    st.last_transition = Instant::now();
                }
                CircuitState::Open => {}
            }
        }
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let now = Instant::now();
        match self.inner.lock() {
            Ok(st) => {
                let failures = st.window.iter().filter(|f| **f).count() as u32;
                let successes = st.window.len() as u32 - failures;
                let open_remaining_ms = st.opened_at.and_then(|at| {
                    let until = at + self.cfg.cooldown;
                    if until > now {
                        Some((until - now).as_millis() as u64)
                    } else {
                        None
                    }
                });
                CircuitSnapshot {
                    name: self.name.clone(),
                    state: st.state,
                    failure_count: failures,
                    success_count: successes,
                    open_remaining_ms,
                    last_transition: st.last_transition,
                }
            }
            Err(_) => CircuitSnapshot {
                name: self.name.clone(),
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                open_remaining_ms: None,
                last_transition: now,
            },
        }
    }
}
