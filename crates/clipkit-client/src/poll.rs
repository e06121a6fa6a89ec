//! Bounded poll-until-terminal machine.
//!
//! Generic over the status fetch so it can be driven by the orchestrator
//! against the real service, or by tests against a paused clock. The first
//! attempt fires immediately; later attempts run on a fixed interval. A
//! transient fetch failure is expressed by the step returning
//! [`PollStep::Pending`], consuming one attempt.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::interval;

/// Polling budget.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Interval between attempts
    pub interval: Duration,
    /// Max attempts before giving up
    pub max_attempts: u32,
}

/// Result of one polling attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep<T> {
    /// A terminal value was observed; stop polling.
    Done(T),
    /// Not terminal yet (or a transient failure); keep polling.
    Pending,
}

/// Why the polling loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The step observed a terminal value.
    Terminal(T),
    /// The attempt budget ran out.
    TimedOut,
    /// The operation was cancelled, reset, or replaced while polling.
    Superseded,
}

/// Run `step` until it reports a terminal value, the budget runs out, or
/// `is_live` turns false.
///
/// `wake` interrupts the idle wait so a supersede is observed without
/// sleeping out the rest of the interval.
pub async fn poll_until<T, F, Fut>(
    config: &PollConfig,
    wake: &Notify,
    is_live: impl Fn() -> bool,
    mut step: F,
) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PollStep<T>>,
{
    let mut ticker = interval(config.interval);
    let mut attempts = 0u32;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = wake.notified() => {}
        }

        if !is_live() {
            return PollOutcome::Superseded;
        }

        attempts += 1;
        if attempts > config.max_attempts {
            return PollOutcome::TimedOut;
        }

        if let PollStep::Done(value) = step().await {
            return PollOutcome::Terminal(value);
        }

        // A supersede that landed while the step was in flight must not
        // leave the timer running until the next tick.
        if !is_live() {
            return PollOutcome::Superseded;
        }
    }
}
