//! Host fakes shared by the integration tests.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::digital::PinState;
use embedded_hal_async::delay::DelayNs;
use matrix_light_sense::{Event, MatrixMap, MatrixPins, Publish};

/// Rows on 18..=20, columns on 26..=28.
pub const TEST_MAP: MatrixMap = MatrixMap::new(18, 3, 26, 3);

/// One call made on [`FakePins`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinOp {
    Drive(u8, PinState),
    ReleaseInput(u8),
    AttachAnalog(u8),
    ReadRaw,
    DisableAnalog,
}

/// Records every pin operation and plays back queued ADC samples (0 once empty).
#[derive(Debug, Default)]
pub struct FakePins {
    pub ops: Vec<PinOp>,
    samples: VecDeque<u16>,
}

impl FakePins {
    pub fn with_samples(samples: impl IntoIterator<Item = u16>) -> Self {
        Self {
            ops: Vec::new(),
            samples: samples.into_iter().collect(),
        }
    }

    /// Pins bound to the ADC, in order.
    pub fn attached(&self) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PinOp::AttachAnalog(pin) => Some(*pin),
                _ => None,
            })
            .collect()
    }

    pub fn read_count(&self) -> usize {
        self.ops.iter().filter(|op| **op == PinOp::ReadRaw).count()
    }
}

impl MatrixPins for FakePins {
    fn drive(&mut self, pin: u8, state: PinState) {
        self.ops.push(PinOp::Drive(pin, state));
    }

    fn release_input(&mut self, pin: u8) {
        self.ops.push(PinOp::ReleaseInput(pin));
    }

    fn attach_analog(&mut self, pin: u8) {
        self.ops.push(PinOp::AttachAnalog(pin));
    }

    fn read_raw(&mut self) -> u16 {
        self.ops.push(PinOp::ReadRaw);
        self.samples.pop_front().unwrap_or(0)
    }

    fn disable_analog(&mut self) {
        self.ops.push(PinOp::DisableAnalog);
    }
}

/// Completes every delay immediately.
#[derive(Debug, Default)]
pub struct InstantDelay;

impl DelayNs for InstantDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

/// Yields once per delay so other futures get polled mid-settle.
#[derive(Debug, Default)]
pub struct YieldDelay;

impl DelayNs for YieldDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        embassy_futures::yield_now().await;
    }
}

/// Never completes; only cancellation ends a settle.
#[derive(Debug, Default)]
pub struct NeverDelay;

impl DelayNs for NeverDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        core::future::pending::<()>().await;
    }
}

/// Completes immediately but remembers every requested wait, in microseconds.
///
/// Clones share one log, so a test keeps a clone after moving the delay into a sensor.
#[derive(Clone, Debug, Default)]
pub struct RecordingDelay {
    requested_us: Rc<RefCell<Vec<u32>>>,
}

impl RecordingDelay {
    pub fn requested_us(&self) -> Vec<u32> {
        self.requested_us.borrow().clone()
    }
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.requested_us.borrow_mut().push(ns / 1_000);
    }

    async fn delay_us(&mut self, us: u32) {
        self.requested_us.borrow_mut().push(us);
    }
}

/// Keeps every published event.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub events: RefCell<Vec<Event>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }
}

impl Publish for RecordingPublisher {
    fn publish(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}
