//! The sensing engine: one cycle at a time through hand-off, settle, sample and release.
//!
//! See [`LightSensor`].

use embedded_hal_async::delay::DelayNs;

use crate::averager::{Averager, Averages, ReadMode, Validity};
use crate::channel_scheduler::ChannelScheduler;
use crate::conversion_trigger::{CancelSignal, ConversionTrigger, TriggerOutcome};
use crate::event_bridge::{Event, Publish};
use crate::hardware_arbiter::{HardwareArbiter, MatrixPins, SenseHandle};
use crate::{Error, LightSenseConfig, MatrixMap, Result};

/// Where the current sensing cycle is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensePhase {
    #[default]
    Idle,
    /// Pin hand-off in progress.
    Acquiring,
    /// Trigger armed, waiting for the front end to settle.
    Settling,
    /// Sample captured and pin released; averages being updated.
    Sampled,
}

/// What one completed cycle produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleOutcome {
    pub channel: usize,
    pub raw: u16,
    pub validity: Validity,
    pub averages: Averages,
}

/// Turns the columns of an LED matrix into an ambient-light sensor with `C` channels.
///
/// A cycle is [`start_sensing`](Self::start_sensing) (Idle → Acquiring → Settling),
/// [`settle`](Self::settle), then [`complete_conversion`](Self::complete_conversion)
/// (Settling → Sampled → Idle) or [`abort`](Self::abort).
/// [`run_cycle`](Self::run_cycle) does all three.
///
/// All result-set mutation happens in `complete_conversion`, on whichever single task owns
/// the sensor. [`teardown`](Self::teardown) consumes the sensor, so no deferred
/// completion can run after it.
pub struct LightSensor<'a, P, D, const C: usize> {
    arbiter: HardwareArbiter<P>,
    trigger: ConversionTrigger<'a, D>,
    scheduler: ChannelScheduler<C>,
    averager: Averager<C>,
    config: LightSenseConfig,
    phase: SensePhase,
    handle: Option<SenseHandle>,
}

impl<'a, P: MatrixPins, D: DelayNs, const C: usize> LightSensor<'a, P, D, C> {
    /// Creates a sensor. Every channel starts never sampled and both averages unset.
    ///
    /// `cancel_signal` is how other contexts abort a settling conversion.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` does not fit `matrix_map` with `C` channels.
    /// See [`LightSenseConfig::validate`].
    pub fn new(
        pins: P,
        matrix_map: MatrixMap,
        config: LightSenseConfig,
        delay: D,
        cancel_signal: &'a CancelSignal,
    ) -> Result<Self> {
        config.validate::<C>(&matrix_map)?;

        #[cfg(feature = "defmt")]
        defmt::info!("light sensor: {} channels on {}", C, matrix_map);
        Ok(Self {
            arbiter: HardwareArbiter::new(pins, matrix_map),
            trigger: ConversionTrigger::new(delay, cancel_signal),
            scheduler: ChannelScheduler::new(),
            averager: Averager::new(config),
            config,
            phase: SensePhase::Idle,
            handle: None,
        })
    }

    /// Begins a cycle on the current channel: takes its column and arms the trigger.
    ///
    /// The settle delay starts here, so [`settle`](Self::settle) waits only for whatever is
    /// left of it. Returns the channel being sensed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleInFlight`] unless the sensor is idle; nothing changes.
    pub fn start_sensing(&mut self) -> Result<usize> {
        if self.phase != SensePhase::Idle {
            #[cfg(feature = "defmt")]
            defmt::warn!("light sensor: start rejected, {} in flight", self.phase);
            return Err(Error::CycleInFlight);
        }
        self.phase = SensePhase::Acquiring;
        let channel = self.scheduler.current();
        let handle = match self.arbiter.acquire(channel) {
            Ok(handle) => handle,
            Err(err) => {
                self.phase = SensePhase::Idle;
                return Err(err);
            }
        };

        self.trigger.arm(self.config.settle_delay_us());
        self.handle = Some(handle);
        self.phase = SensePhase::Settling;

        #[cfg(feature = "defmt")]
        defmt::debug!("light sensor: ch{} settling", channel);
        Ok(channel)
    }

    /// Waits for the armed trigger to fire or be cancelled.
    pub async fn settle(&mut self) -> TriggerOutcome {
        if self.phase != SensePhase::Settling {
            return TriggerOutcome::Cancelled;
        }
        self.trigger.fired().await
    }

    /// Captures the sample, releases the column, advances the channel and updates the averages.
    ///
    /// Publishes [`Event::READING_READY`] on `publisher` if the cycle was fully valid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSettling`] if no cycle is settling; nothing changes.
    /// If the sample cannot be recorded the column is still released and the sensor goes
    /// back to idle on the same channel.
    pub fn complete_conversion(&mut self, publisher: &impl Publish) -> Result<CycleOutcome> {
        if self.phase != SensePhase::Settling {
            return Err(Error::NotSettling);
        }
        let handle = self.handle.take().ok_or(Error::NotSettling)?;
        self.trigger.cancel();

        let raw = self.arbiter.sample(&handle);
        let channel = handle.channel();
        self.arbiter.release(handle);
        self.phase = SensePhase::Sampled;

        let recorded = self.averager.record(channel, raw);
        // Column already released; idle whether or not the sample is kept.
        self.phase = SensePhase::Idle;
        let validity = recorded?;

        let advanced_from = self.scheduler.next();
        debug_assert_eq!(advanced_from, channel);
        if validity.is_valid() {
            publisher.publish(Event::READING_READY);
        }

        Ok(CycleOutcome {
            channel,
            raw,
            validity,
            averages: self.averager.averages(),
        })
    }

    /// Abandons the cycle in flight, if any, without recording or advancing.
    ///
    /// Returns whether a cycle was abandoned.
    pub fn abort(&mut self) -> bool {
        self.trigger.cancel();
        let Some(handle) = self.handle.take() else {
            return false;
        };
        self.arbiter.release(handle);
        self.phase = SensePhase::Idle;

        #[cfg(feature = "defmt")]
        defmt::info!("light sensor: cycle aborted");
        true
    }

    /// Runs one whole cycle for the current channel.
    ///
    /// Returns `Ok(None)` if the cycle was cancelled while settling.
    ///
    /// # Errors
    ///
    /// See [`start_sensing`](Self::start_sensing).
    pub async fn run_cycle(&mut self, publisher: &impl Publish) -> Result<Option<CycleOutcome>> {
        self.start_sensing()?;
        match self.settle().await {
            TriggerOutcome::Fired => self.complete_conversion(publisher).map(Some),
            TriggerOutcome::Cancelled => {
                self.abort();
                Ok(None)
            }
        }
    }

    /// Brightness from 0 (dark) to 255 (bright), or `None` if `read_mode` is
    /// [`ReadMode::ValidOnly`] and no fully valid cycle has completed yet.
    ///
    /// Repeated reads without a new cycle return the same value.
    #[must_use]
    pub fn read(&self, read_mode: ReadMode) -> Option<u8> {
        self.averager.read(read_mode)
    }

    #[must_use]
    pub const fn averages(&self) -> Averages {
        self.averager.averages()
    }

    #[must_use]
    pub const fn results(&self) -> &[Option<u16>; C] {
        self.averager.results()
    }

    #[must_use]
    pub const fn phase(&self) -> SensePhase {
        self.phase
    }

    /// The channel the next cycle will sense.
    #[must_use]
    pub const fn channel(&self) -> usize {
        self.scheduler.current()
    }

    #[must_use]
    pub const fn config(&self) -> &LightSenseConfig {
        &self.config
    }

    #[must_use]
    pub const fn pins(&self) -> &P {
        self.arbiter.pins()
    }

    /// Destroys the sensor and hands the pin backend back.
    ///
    /// The trigger is cancelled before the column is released, so a settling conversion
    /// never completes against released state.
    pub fn teardown(mut self) -> P {
        let was_armed = self.trigger.cancel();
        if let Some(handle) = self.handle.take() {
            self.arbiter.release(handle);
        }

        #[cfg(feature = "defmt")]
        defmt::info!("light sensor: torn down (trigger was armed: {})", was_armed);
        #[cfg(not(feature = "defmt"))]
        let _ = was_armed;
        self.arbiter.into_pins()
    }
}
