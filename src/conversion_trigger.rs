//! One-shot, microsecond-granularity deferral between pin hand-off and sampling.
//!
//! See [`ConversionTrigger`].

use embassy_futures::select::{Either, select};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embassy_time::Instant;
use embedded_hal_async::delay::DelayNs;

/// Cancels a settling conversion from any context.
pub type CancelSignal = Signal<CriticalSectionRawMutex, ()>;

/// How an armed trigger finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerOutcome {
    /// The settle delay elapsed; the sample may be taken.
    Fired,
    /// The trigger was cancelled, or was never armed.
    Cancelled,
}

#[derive(Clone, Copy, Debug)]
struct Deadline {
    armed_at: Instant,
    delay_us: u32,
}

impl Deadline {
    /// Microseconds still to wait as of `now`.
    fn remaining_us(&self, now: Instant) -> u32 {
        let elapsed_us = now.saturating_duration_since(self.armed_at).as_micros();
        u32::try_from(elapsed_us).map_or(0, |elapsed_us| self.delay_us.saturating_sub(elapsed_us))
    }
}

/// Arms a single deferred "sample ready" notification.
///
/// The delay runs from [`arm`](Self::arm), not from when [`fired`](Self::fired) is first
/// polled, so work done in between eats into the settle time instead of stretching it.
/// The trigger only reports that the delay elapsed. Whoever awaits `fired` performs the
/// sampling, so no state is mutated from the timer side.
pub struct ConversionTrigger<'a, D> {
    delay: D,
    cancel_signal: &'a CancelSignal,
    deadline: Option<Deadline>,
}

impl<'a, D: DelayNs> ConversionTrigger<'a, D> {
    #[must_use]
    pub const fn new(delay: D, cancel_signal: &'a CancelSignal) -> Self {
        Self {
            delay,
            cancel_signal,
            deadline: None,
        }
    }

    /// Schedules one firing `delay_us` microseconds from now.
    ///
    /// At most one firing is outstanding: arming again replaces the earlier deadline.
    /// Clears any cancellation left over from an earlier cycle.
    pub fn arm(&mut self, delay_us: u32) {
        self.cancel_signal.reset();
        self.deadline = Some(Deadline {
            armed_at: Instant::now(),
            delay_us,
        });
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarms synchronously. Returns whether a firing was outstanding.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Waits out whatever is left of the armed delay unless the cancel signal arrives first.
    ///
    /// The trigger is disarmed either way. Dropping this future leaves it armed;
    /// call [`cancel`](Self::cancel) afterwards.
    pub async fn fired(&mut self) -> TriggerOutcome {
        let Some(deadline) = self.deadline else {
            return TriggerOutcome::Cancelled;
        };
        let remaining_us = deadline.remaining_us(Instant::now());
        let outcome = if self.cancel_signal.try_take().is_some() {
            TriggerOutcome::Cancelled
        } else if remaining_us == 0 {
            TriggerOutcome::Fired
        } else {
            match select(self.delay.delay_us(remaining_us), self.cancel_signal.wait()).await {
                Either::First(()) => TriggerOutcome::Fired,
                Either::Second(()) => TriggerOutcome::Cancelled,
            }
        };
        self.deadline = None;
        outcome
    }
}
