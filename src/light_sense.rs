//! A device abstraction that runs the light sensor in its own task.
//!
//! See [`LightSense`] for the main usage example.

use core::cell::Cell;
use core::convert::Infallible;

use embassy_futures::select::{Either, select};
use embassy_sync::{
    blocking_mutex::{Mutex, raw::CriticalSectionRawMutex},
    signal::Signal,
};
use embedded_hal_async::delay::DelayNs;

use crate::averager::{Averages, ReadMode};
use crate::conversion_trigger::CancelSignal;
use crate::event_bridge::EventBridge;
use crate::hardware_arbiter::MatrixPins;
use crate::light_sensor::{CycleOutcome, LightSensor};
use crate::LightSenseConfig;

type LightSenseSignal = Signal<CriticalSectionRawMutex, ()>;
type LightSenseCompletionSignal = Signal<CriticalSectionRawMutex, CycleOutcome>;

/// Signal resources for [`LightSense`].
pub struct LightSenseStatic {
    start_signal: LightSenseSignal,
    cancel_signal: CancelSignal,
    stop_signal: LightSenseSignal,
    stopped_signal: LightSenseSignal,
    completion_signal: LightSenseCompletionSignal,
    averages: Mutex<CriticalSectionRawMutex, Cell<Averages>>,
    // The running sensor's config, so readers scale with the same range it validates against.
    config: Mutex<CriticalSectionRawMutex, Cell<Option<LightSenseConfig>>>,
}

impl LightSenseStatic {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            start_signal: Signal::new(),
            cancel_signal: Signal::new(),
            stop_signal: Signal::new(),
            stopped_signal: Signal::new(),
            completion_signal: Signal::new(),
            averages: Mutex::new(Cell::new(Averages::EMPTY)),
            config: Mutex::new(Cell::new(None)),
        }
    }

    /// The signal a [`LightSensor`] driven by this device must be built with.
    #[must_use]
    pub const fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel_signal
    }

    fn averages(&self) -> Averages {
        self.averages.lock(Cell::get)
    }

    fn set_averages(&self, averages: Averages) {
        self.averages.lock(|cell| cell.set(averages));
    }

    fn config(&self) -> Option<LightSenseConfig> {
        self.config.lock(Cell::get)
    }

    fn set_config(&self, config: LightSenseConfig) {
        self.config.lock(|cell| cell.set(Some(config)));
    }
}

impl Default for LightSenseStatic {
    fn default() -> Self {
        Self::new()
    }
}

/// Ambient-light sensing interleaved into an LED matrix's own scan.
///
/// The device task waits for the display to offer a slot on the [`NotificationBus`]
/// (or for [`start_sensing`](Self::start_sensing)), runs one cycle, and publishes
/// [`Event::READING_READY`](crate::Event::READING_READY) whenever a full rotation of
/// in-range samples completes.
///
/// ```ignore
/// #![no_std]
/// #![no_main]
///
/// use matrix_light_sense::{
///     Hardware, LightSense, LightSenseConfig, LightSenseStatic, NotificationBus, ReadMode,
/// };
/// # use embassy_executor::Spawner;
/// # use core::panic::PanicInfo;
/// # #[panic_handler]
/// # fn panic(_: &PanicInfo) -> ! { loop {} }
///
/// async fn example(spawner: Spawner) -> matrix_light_sense::Result<()> {
///     static BUS: NotificationBus = NotificationBus::new();
///     static LIGHT_SENSE_STATIC: LightSenseStatic = LightSense::new_static();
///
///     let hardware = Hardware::new()?;
///     let light_sense = LightSense::new(
///         &LIGHT_SENSE_STATIC,
///         hardware.matrix_pins,
///         hardware.matrix_map,
///         LightSenseConfig::new(),
///         &BUS,
///         spawner,
///     )?;
///
///     // Brightness from 0 (dark) to 255 (bright), once a full rotation is in.
///     let _brightness: Option<u8> = light_sense.read(ReadMode::ValidOnly);
///     Ok(())
/// }
/// ```
///
/// [`NotificationBus`]: crate::NotificationBus
pub struct LightSense<'a> {
    light_sense_static: &'a LightSenseStatic,
}

impl<'a> LightSense<'a> {
    /// Creates static signal resources for the device.
    #[must_use]
    pub const fn new_static() -> LightSenseStatic {
        LightSenseStatic::new()
    }

    /// A handle onto a device loop you drive yourself with [`inner_device_loop`].
    ///
    /// Brightness is scaled with the config of the sensor the loop runs.
    #[must_use]
    pub const fn from_static(light_sense_static: &'a LightSenseStatic) -> Self {
        Self { light_sense_static }
    }

    /// Starts a cycle without waiting for the display to offer a slot.
    ///
    /// A request made while a cycle is in flight is coalesced, never interleaved.
    pub fn start_sensing(&self) {
        self.light_sense_static.start_signal.signal(());
    }

    /// Brightness from 0 (dark) to 255 (bright), or `None` if `read_mode` is
    /// [`ReadMode::ValidOnly`] and no fully valid cycle has completed yet.
    ///
    /// Also `None` before any sensor has been attached to the device loop.
    #[must_use]
    pub fn read(&self, read_mode: ReadMode) -> Option<u8> {
        let config = self.light_sense_static.config()?;
        self.averages().brightness(read_mode, &config)
    }

    /// The averages as of the last completed cycle.
    #[must_use]
    pub fn averages(&self) -> Averages {
        self.light_sense_static.averages()
    }

    /// Waits for the next completed cycle.
    pub async fn next_cycle(&self) -> CycleOutcome {
        self.light_sense_static.completion_signal.wait().await
    }

    /// Cancels the cycle in flight, if any. Its channel is retried on the next slot.
    pub fn abort(&self) {
        self.light_sense_static.cancel_signal.signal(());
    }

    /// Tears the sensor down: cancels any settling conversion, gives the column back to the
    /// display and leaves the notification bus.
    pub fn stop(&self) {
        self.light_sense_static.stop_signal.signal(());
    }

    /// Waits until a [`stop`](Self::stop) has completed.
    pub async fn wait_stopped(&self) {
        self.light_sense_static.stopped_signal.wait().await;
    }
}

/// The device loop behind [`LightSense`], generic over the pin backend and delay.
///
/// Runs until [`LightSense::stop`], then tears the sensor down, drops `event_bridge`
/// (deregistering from the bus) and returns the pin backend.
pub async fn inner_device_loop<P: MatrixPins, D: DelayNs, const C: usize>(
    mut sensor: LightSensor<'_, P, D, C>,
    mut event_bridge: EventBridge<'_>,
    light_sense_static: &LightSenseStatic,
) -> P {
    light_sense_static.set_config(*sensor.config());
    // The sensing loop (and any settling conversion inside it) is dropped before teardown.
    if let Either::First(never) = select(
        sensing_loop(&mut sensor, &mut event_bridge, light_sense_static),
        light_sense_static.stop_signal.wait(),
    )
    .await
    {
        match never {}
    }

    let pins = sensor.teardown();
    drop(event_bridge);
    light_sense_static.stopped_signal.signal(());
    pins
}

async fn sensing_loop<P: MatrixPins, D: DelayNs, const C: usize>(
    sensor: &mut LightSensor<'_, P, D, C>,
    event_bridge: &mut EventBridge<'_>,
    light_sense_static: &LightSenseStatic,
) -> Infallible {
    loop {
        select(
            event_bridge.slot_offered(),
            light_sense_static.start_signal.wait(),
        )
        .await;

        match sensor.run_cycle(&*event_bridge).await {
            Ok(Some(cycle_outcome)) => {
                light_sense_static.set_averages(cycle_outcome.averages);
                light_sense_static.completion_signal.signal(cycle_outcome);
            }
            Ok(None) => {}
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("light sense: slot skipped: {}", defmt::Display2Format(&_err));
            }
        }

        // Offers that arrived mid-cycle collapse into nothing; the next one starts fresh.
        let _stale = event_bridge.drain_stale();
        light_sense_static.start_signal.reset();

        #[cfg(feature = "sense-trace")]
        defmt::info!("light sense: dropped {} stale offers", _stale);
    }
}

// ============================================================================
// RP2040 task
// ============================================================================

#[cfg(feature = "pico1")]
mod rp {
    use embassy_executor::Spawner;
    use embassy_time::Delay;

    use super::{LightSense, LightSenseStatic, inner_device_loop};
    use crate::event_bridge::{EventBridge, NotificationBus};
    use crate::light_sensor::LightSensor;
    use crate::rp_matrix_pins::{RpMatrixPins, SENSE_COLUMNS, SENSE_ROWS};
    use crate::shared_constants::CHANNEL_COUNT;
    use crate::{LightSenseConfig, MatrixMap, Result};

    /// The concrete sensor the RP2040 device task runs.
    pub type RpLightSensor = LightSensor<
        'static,
        RpMatrixPins<'static, SENSE_ROWS, SENSE_COLUMNS>,
        Delay,
        CHANNEL_COUNT,
    >;

    impl LightSense<'static> {
        /// Creates the sensor, registers it on `bus` and spawns its background task.
        ///
        /// # Errors
        ///
        /// Returns an error if `config` does not fit `matrix_map`, if the bus has no free
        /// subscriber slot, or if the task cannot be spawned.
        pub fn new(
            light_sense_static: &'static LightSenseStatic,
            matrix_pins: RpMatrixPins<'static, SENSE_ROWS, SENSE_COLUMNS>,
            matrix_map: MatrixMap,
            config: LightSenseConfig,
            bus: &'static NotificationBus,
            spawner: Spawner,
        ) -> Result<Self> {
            let sensor: RpLightSensor = LightSensor::new(
                matrix_pins,
                matrix_map,
                config,
                Delay,
                light_sense_static.cancel_signal(),
            )?;
            let event_bridge = EventBridge::new(bus)?;
            // Published before spawning so `read` scales correctly from the start.
            light_sense_static.set_config(config);
            let token = device_loop(sensor, event_bridge, light_sense_static)?;
            spawner.spawn(token);
            Ok(Self::from_static(light_sense_static))
        }
    }

    #[embassy_executor::task]
    async fn device_loop(
        sensor: RpLightSensor,
        event_bridge: EventBridge<'static>,
        light_sense_static: &'static LightSenseStatic,
    ) {
        // The column pins stay configured for the display after teardown.
        let _matrix_pins = inner_device_loop(sensor, event_bridge, light_sense_static).await;
    }
}

#[cfg(feature = "pico1")]
pub use rp::RpLightSensor;
