//! Connects the light sensor to a publish/subscribe notification bus.
//!
//! See [`EventBridge`].

use embassy_sync::{
    blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex},
    pubsub::{PubSubChannel, Subscriber},
};

use crate::Result;
use crate::shared_constants::{BUS_CAPACITY, BUS_PUBLISHERS, BUS_SUBSCRIBERS};

/// Identifies the component that produced an [`Event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SourceId(pub u16);

impl SourceId {
    pub const DISPLAY: Self = Self(6);
    pub const LIGHT_SENSOR: Self = Self(17);
}

/// What happened, scoped by the [`SourceId`] that raised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventCode(pub u16);

impl EventCode {
    /// The display has an idle window in its scan that sensing may borrow.
    pub const LIGHT_SENSE: Self = Self(4);
    /// A fully valid averaging cycle completed.
    pub const LIGHT_SENSE_READY: Self = Self(2);
}

/// A (producer id, event code) notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Event {
    pub source: SourceId,
    pub code: EventCode,
}

impl Event {
    /// Raised by the display subsystem when a light-sensing slot is offered.
    pub const SLOT_OFFERED: Self = Self::new(SourceId::DISPLAY, EventCode::LIGHT_SENSE);
    /// Raised by the sensor once per fully valid averaging cycle.
    pub const READING_READY: Self = Self::new(SourceId::LIGHT_SENSOR, EventCode::LIGHT_SENSE_READY);

    #[must_use]
    pub const fn new(source: SourceId, code: EventCode) -> Self {
        Self { source, code }
    }
}

/// Synchronous, immediate publication of an [`Event`].
pub trait Publish {
    fn publish(&self, event: Event);
}

impl<M: RawMutex, const CAP: usize, const SUBS: usize, const PUBS: usize> Publish
    for PubSubChannel<M, Event, CAP, SUBS, PUBS>
{
    fn publish(&self, event: Event) {
        self.immediate_publisher().publish_immediate(event);
    }
}

/// The bus the sensor listens and publishes on.
///
/// ```rust
/// use matrix_light_sense::NotificationBus;
///
/// static BUS: NotificationBus = NotificationBus::new();
/// ```
pub type NotificationBus =
    PubSubChannel<CriticalSectionRawMutex, Event, BUS_CAPACITY, BUS_SUBSCRIBERS, BUS_PUBLISHERS>;

type BusSubscriber<'a> =
    Subscriber<'a, CriticalSectionRawMutex, Event, BUS_CAPACITY, BUS_SUBSCRIBERS, BUS_PUBLISHERS>;

/// Listens for "slot offered" on the bus and publishes "reading ready" back to it.
///
/// Construction registers a subscriber; dropping the bridge deregisters it.
pub struct EventBridge<'a> {
    bus: &'a NotificationBus,
    subscriber: BusSubscriber<'a>,
}

impl<'a> EventBridge<'a> {
    /// Registers on `bus`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BusSubscribersExhausted`](crate::Error::BusSubscribersExhausted)
    /// if every subscriber slot is taken.
    pub fn new(bus: &'a NotificationBus) -> Result<Self> {
        let subscriber = bus.subscriber()?;
        Ok(Self { bus, subscriber })
    }

    /// Waits for the display to offer a light-sensing slot. Other events are skipped.
    pub async fn slot_offered(&mut self) {
        while self.subscriber.next_message_pure().await != Event::SLOT_OFFERED {}
    }

    /// Discards offers that queued up while a cycle was in flight.
    ///
    /// Returns how many were dropped.
    pub fn drain_stale(&mut self) -> usize {
        let mut dropped = 0;
        while let Some(event) = self.subscriber.try_next_message_pure() {
            if event == Event::SLOT_OFFERED {
                dropped += 1;
            }
        }
        dropped
    }
}

impl Publish for EventBridge<'_> {
    fn publish(&self, event: Event) {
        self.bus.publish(event);
    }
}
