use std::time::Duration;

pub const DEFAULT_RETRY_AFTER_SECS: u64 = 5;
pub const RETRY_AFTER_HEADER: &str = "Retry-After";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    RateLimited { retry_after_secs: u64 },
    Failure { status: u16 },
}

pub fn classify_status(status: u16, retry_after: Option<&str>) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        429 => StatusClass::RateLimited {
            retry_after_secs: parse_retry_after(retry_after),
        },
        status => StatusClass::Failure { status },
    }
}

/// Integer seconds only; HTTP-date values fall back to the default.
pub fn parse_retry_after(header: Option<&str>) -> u64 {
    header
        .map(str::trim)
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Browsers store timer delays as a signed 32-bit millisecond count and fire
/// anything larger immediately.
pub const MAX_TIMER_DELAY_MS: u32 = i32::MAX as u32;

pub fn timer_delay_ms(delay: Duration) -> u32 {
    u32::try_from(delay.as_millis())
        .unwrap_or(MAX_TIMER_DELAY_MS)
        .min(MAX_TIMER_DELAY_MS)
}

/// Which request a scheduled retry re-issues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryTarget {
    Leaderboard,
    Lookup(String),
}

/// Timer handle backing a scheduled retry.
pub trait PendingRetry {
    /// Stop the timer before it fires.
    fn cancel(self);

    /// Let go of a handle whose timer is already firing.
    fn release(self)
    where
        Self: Sized,
    {
    }
}

/// Single-slot retry scheduler. Scheduling always cancels whatever was
/// pending first, so at most one retry is outstanding.
pub struct RetryScheduler<T: PendingRetry> {
    pending: Option<Pending<T>>,
    generation: u64,
}

struct Pending<T> {
    generation: u64,
    delay: Duration,
    target: RetryTarget,
    handle: T,
}

impl<T: PendingRetry> Default for RetryScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PendingRetry> RetryScheduler<T> {
    pub fn new() -> Self {
        Self {
            pending: None,
            generation: 0,
        }
    }

    /// `start` arms the timer; it receives the generation the firing task
    /// must hand back to [`RetryScheduler::fire`].
    pub fn schedule_retry<F>(&mut self, delay: Duration, target: RetryTarget, start: F) -> u64
    where
        F: FnOnce(u64) -> T,
    {
        self.cancel_pending();
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        let handle = start(generation);
        self.pending = Some(Pending {
            generation,
            delay,
            target,
            handle,
        });
        generation
    }

    pub fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Consumes the pending slot if `generation` is still the current one.
    /// Returns the target to re-issue, or `None` for a superseded timer.
    pub fn fire(&mut self, generation: u64) -> Option<RetryTarget> {
        match self.pending.take() {
            Some(pending) if pending.generation == generation => {
                pending.handle.release();
                Some(pending.target)
            }
            other => {
                self.pending = other;
                None
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_delay(&self) -> Option<Duration> {
        self.pending.as_ref().map(|pending| pending.delay)
    }

    pub fn pending_target(&self) -> Option<&RetryTarget> {
        self.pending.as_ref().map(|pending| &pending.target)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PendingRetry for tokio::task::JoinHandle<()> {
    fn cancel(self) {
        self.abort();
    }
}

#[cfg(target_arch = "wasm32")]
impl PendingRetry for gloo_timers::callback::Timeout {
    fn cancel(self) {
        let _ = gloo_timers::callback::Timeout::cancel(self);
    }

    fn release(self) {
        // Dropping a Timeout from inside its own callback frees the running closure.
        let _ = self.forget();
    }
}
