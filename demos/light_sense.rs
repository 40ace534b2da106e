//! Light Sense - ambient brightness from a 3x3 LED matrix
//!
//! Architecture:
//! - Display task: stands in for the matrix refresh, offers a sensing slot every frame
//! - Light sense task: borrows a column per slot, publishes "reading ready" per valid rotation
//! - Main orchestrator: logs brightness on every "reading ready"
//!
//! Run with: cargo run --release --bin light_sense --features pico1,arm,defmt --target thumbv6m-none-eabi

#![no_std]
#![no_main]
#![allow(clippy::future_not_send, reason = "single-threaded")]

use core::convert::Infallible;

use defmt::{info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Timer};
use matrix_light_sense::{
    Event, Hardware, LightSense, LightSenseConfig, LightSenseStatic, NotificationBus, Publish,
    ReadMode, Result,
};
use panic_probe as _;

// ============================================================================
// Channels & Notifiers
// ============================================================================

static BUS: NotificationBus = NotificationBus::new();
static LIGHT_SENSE_STATIC: LightSenseStatic = LightSense::new_static();

/// One display frame; the scan leaves a sensing window at the end of each.
const FRAME_PERIOD: Duration = Duration::from_millis(20);
/// How long to go without a valid rotation before logging the running average instead.
const STALE_AFTER: Duration = Duration::from_secs(2);

#[embassy_executor::main]
pub async fn main(spawner: Spawner) -> ! {
    let Err(err) = inner_main(spawner).await;
    core::panic!("{}", defmt::Display2Format(&err));
}

async fn inner_main(spawner: Spawner) -> Result<Infallible> {
    info!("Light sense demo");
    let hardware = Hardware::new()?;

    // Subscribe before anything can publish.
    let mut subscriber = BUS.subscriber()?;

    let light_sense = LightSense::new(
        &LIGHT_SENSE_STATIC,
        hardware.matrix_pins,
        hardware.matrix_map,
        LightSenseConfig::new(),
        &BUS,
        spawner,
    )?;
    spawner.spawn(display_task(&BUS)?);

    loop {
        match select(subscriber.next_message_pure(), Timer::after(STALE_AFTER)).await {
            Either::First(Event::READING_READY) => {
                if let Some(brightness) = light_sense.read(ReadMode::ValidOnly) {
                    info!("brightness {} ({})", brightness, light_sense.averages());
                }
            }
            Either::First(_) => {}
            Either::Second(()) => {
                warn!(
                    "no valid rotation for {} ms; latest brightness {}",
                    STALE_AFTER.as_millis(),
                    light_sense.read(ReadMode::Latest)
                );
            }
        }
    }
}

#[embassy_executor::task]
async fn display_task(bus: &'static NotificationBus) -> ! {
    loop {
        Timer::after(FRAME_PERIOD).await;
        bus.publish(Event::SLOT_OFFERED);
    }
}
