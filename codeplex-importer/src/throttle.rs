//! Adaptive request throttling for the GitHub API.
//!
//! Every outbound call that consumes API quota is preceded by
//! [`RequestThrottler::throttle`], which enforces a minimum spacing between
//! requests. The spacing adapts to the remaining-quota trend reported by
//! GitHub: a sustained depletion ratchets the delay up, recovery brings it
//! back down to the floor.

use octocrab::Octocrab;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Lower bound for the delay between consecutive requests.
const MIN_DELAY: Duration = Duration::from_secs(1);

/// Amount the delay moves per observed quota trend change.
const DELAY_STEP: Duration = Duration::from_millis(500);

/// Minimum interval between rate limit samples.
const SAMPLE_INTERVAL: Duration = Duration::from_secs(30);

/// The feedback state driving the adaptive delay.
///
/// The rule is integral, not instantaneous: it reacts to the running total of
/// remaining-quota deltas, so a single burst does not overcorrect while a
/// sustained depletion trend keeps increasing the delay.
#[derive(Debug, Clone)]
pub struct ThrottleState {
    current_delay: Duration,
    last_observed_remaining: Option<u64>,
    cumulative_delta: i64,
}

impl Default for ThrottleState {
    fn default() -> Self {
        Self::new()
    }
}

impl ThrottleState {
    /// Creates the initial state at the minimum delay.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_delay: MIN_DELAY,
            last_observed_remaining: None,
            cumulative_delta: 0,
        }
    }

    /// Returns the currently enforced delay between requests.
    #[must_use]
    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    /// Returns the running total of remaining-quota deltas.
    #[must_use]
    pub fn cumulative_delta(&self) -> i64 {
        self.cumulative_delta
    }

    /// Feeds one remaining-quota sample into the feedback rule.
    ///
    /// The very first sample only seeds the baseline. Afterwards, a negative
    /// running total (quota depleting) increases the delay by one step, a
    /// positive one (quota recovering) decreases it down to the floor, and an
    /// exactly-zero total leaves the delay unchanged.
    pub fn observe(&mut self, remaining: u64) {
        let previous = self.last_observed_remaining.unwrap_or(remaining);
        self.cumulative_delta += remaining as i64 - previous as i64;
        self.last_observed_remaining = Some(remaining);

        if self.cumulative_delta < 0 {
            self.current_delay += DELAY_STEP;
        } else if self.cumulative_delta > 0 {
            self.current_delay = self.current_delay.saturating_sub(DELAY_STEP).max(MIN_DELAY);
        }
    }
}

/// Paces outbound GitHub API calls against the remaining-quota budget.
///
/// Usage: await [`throttle`][Self::throttle] before every quota-consuming
/// call, then call [`record_request_sent`][Self::record_request_sent]
/// immediately after the call completes. Recording is the caller's
/// responsibility so that pure reads could opt out, though the importer
/// records after every call.
pub struct RequestThrottler {
    octocrab: Octocrab,
    state: ThrottleState,
    last_request: Option<Instant>,
    last_sample: Option<Instant>,
}

impl RequestThrottler {
    /// Creates a throttler sampling quota through the given client.
    #[must_use]
    pub fn new(octocrab: Octocrab) -> Self {
        Self {
            octocrab,
            state: ThrottleState::new(),
            last_request: None,
            last_sample: None,
        }
    }

    /// Returns the current feedback state.
    #[must_use]
    pub fn state(&self) -> &ThrottleState {
        &self.state
    }

    /// Waits until the enforced delay since the previous request has elapsed.
    ///
    /// Refreshes the rate sample first: unconditionally on the first call,
    /// afterwards at most once per [`SAMPLE_INTERVAL`].
    ///
    /// # Errors
    ///
    /// Returns an error if the rate limit API call fails.
    pub async fn throttle(&mut self) -> Result<(), octocrab::Error> {
        self.refresh_sample().await?;

        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            let delay = self.state.current_delay();
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
        }

        Ok(())
    }

    /// Marks now as the time of the most recent request.
    pub fn record_request_sent(&mut self) {
        self.last_request = Some(Instant::now());
    }

    /// Fetches a fresh quota sample if the coalescing interval has passed.
    ///
    /// The sample fetch itself is not throttled; under a tight delay the
    /// pacing loop would otherwise starve itself.
    async fn refresh_sample(&mut self) -> Result<(), octocrab::Error> {
        if let Some(last) = self.last_sample {
            if last.elapsed() < SAMPLE_INTERVAL {
                return Ok(());
            }
        }

        let rate_limit = self.octocrab.ratelimit().get().await?;
        self.last_sample = Some(Instant::now());
        self.state.observe(rate_limit.resources.core.remaining as u64);

        debug!(
            remaining = rate_limit.resources.core.remaining,
            delay_ms = self.state.current_delay().as_millis() as u64,
            cumulative_delta = self.state.cumulative_delta(),
            "Refreshed rate sample"
        );

        Ok(())
    }
}
