//! Ambient-light sensing through the drive pins of a multiplexed LED matrix.
//!
//! A column pin is briefly handed from the display to the ADC, left to settle, sampled and
//! handed back. Samples rotate over symmetric sections of the display and are averaged
//! into a 0 (dark) ..= 255 (bright) brightness.
//!
//! [`LightSensor`] is the synchronous engine; [`LightSense`] runs it as an embassy task
//! driven by a [`NotificationBus`].
#![no_std]

pub mod averager;
pub mod channel_scheduler;
pub mod config;
pub mod conversion_trigger;
mod error;
pub mod event_bridge;
#[cfg(feature = "pico1")]
mod hardware;
pub mod hardware_arbiter;
pub mod light_sense;
pub mod light_sensor;
pub mod matrix_map;
#[cfg(feature = "pico1")]
mod output_array;
#[cfg(feature = "pico1")]
pub mod rp_matrix_pins;
mod shared_constants;

// Re-export commonly used items
pub use averager::{Averager, Averages, ReadMode, Validity};
pub use channel_scheduler::ChannelScheduler;
pub use config::LightSenseConfig;
pub use conversion_trigger::{CancelSignal, ConversionTrigger, TriggerOutcome};
pub use error::{Error, Result};
pub use event_bridge::{Event, EventBridge, EventCode, NotificationBus, Publish, SourceId};
pub use hardware_arbiter::{HardwareArbiter, MatrixPins, SenseHandle};
pub use light_sense::{LightSense, LightSenseStatic, inner_device_loop};
pub use light_sensor::{CycleOutcome, LightSensor, SensePhase};
pub use matrix_map::MatrixMap;
pub use shared_constants::*;

#[cfg(feature = "pico1")]
pub use hardware::{DEMO_MATRIX, Hardware};
#[cfg(feature = "pico1")]
pub use light_sense::RpLightSensor;
#[cfg(feature = "pico1")]
pub use output_array::OutputArray;
#[cfg(feature = "pico1")]
pub use rp_matrix_pins::RpMatrixPins;
