//! Host-level tests for the device loop and its notification bus wiring.

mod common;

use common::{FakePins, InstantDelay, NeverDelay, PinOp, TEST_MAP, YieldDelay};
use embassy_futures::{block_on, join::join, yield_now};
use embedded_hal::digital::PinState;
use embedded_hal_async::delay::DelayNs;
use matrix_light_sense::{
    BUS_SUBSCRIBERS, Error, Event, EventBridge, LightSense, LightSenseConfig, LightSenseStatic,
    LightSensor, NotificationBus, Publish, ReadMode, inner_device_loop,
};

const WIDE: LightSenseConfig = LightSenseConfig::new().with_valid_max(450).with_range(0, 450);

fn sensor<'a, D: DelayNs>(
    samples: impl IntoIterator<Item = u16>,
    delay: D,
    light_sense_static: &'a LightSenseStatic,
) -> LightSensor<'a, FakePins, D, 3> {
    LightSensor::new(
        FakePins::with_samples(samples),
        TEST_MAP,
        WIDE,
        delay,
        light_sense_static.cancel_signal(),
    )
    .expect("valid config")
}

async fn settle_a_little() {
    for _ in 0..4 {
        yield_now().await;
    }
}

#[test]
fn slot_offers_drive_cycles_and_reading_ready() {
    let bus = NotificationBus::new();
    let light_sense_static = LightSenseStatic::new();
    let light_sense = LightSense::from_static(&light_sense_static);
    let event_bridge = EventBridge::new(&bus).expect("free subscriber");
    let mut listener = bus.subscriber().expect("free subscriber");

    let (pins, ready_count) = block_on(join(
        inner_device_loop(
            sensor([100, 150, 125], InstantDelay, &light_sense_static),
            event_bridge,
            &light_sense_static,
        ),
        async {
            assert_eq!(light_sense.read(ReadMode::ValidOnly), None);
            let mut ready_count = 0;
            for expected_channel in 0..3 {
                bus.publish(Event::SLOT_OFFERED);
                let outcome = light_sense.next_cycle().await;
                assert_eq!(outcome.channel, expected_channel);
                while let Some(event) = listener.try_next_message_pure() {
                    if event == Event::READING_READY {
                        ready_count += 1;
                    }
                }
            }
            assert_eq!(light_sense.averages().valid, Some(125));
            assert_eq!(light_sense.read(ReadMode::ValidOnly), Some(184));
            light_sense.stop();
            light_sense.wait_stopped().await;
            ready_count
        },
    ));

    assert_eq!(ready_count, 1);
    assert_eq!(pins.attached(), [26, 27, 28]);
}

#[test]
fn start_sensing_runs_a_cycle_without_an_offer() {
    let bus = NotificationBus::new();
    let light_sense_static = LightSenseStatic::new();
    let light_sense = LightSense::from_static(&light_sense_static);
    let event_bridge = EventBridge::new(&bus).expect("free subscriber");

    let (pins, outcome) = block_on(join(
        inner_device_loop(
            sensor([77], InstantDelay, &light_sense_static),
            event_bridge,
            &light_sense_static,
        ),
        async {
            light_sense.start_sensing();
            let outcome = light_sense.next_cycle().await;
            light_sense.stop();
            outcome
        },
    ));

    assert_eq!(outcome.raw, 77);
    assert_eq!(pins.read_count(), 1);
}

#[test]
fn offers_during_a_cycle_coalesce() {
    let bus = NotificationBus::new();
    let light_sense_static = LightSenseStatic::new();
    let light_sense = LightSense::from_static(&light_sense_static);
    let event_bridge = EventBridge::new(&bus).expect("free subscriber");

    let (pins, ()) = block_on(join(
        inner_device_loop(
            sensor([100, 150, 125], YieldDelay, &light_sense_static),
            event_bridge,
            &light_sense_static,
        ),
        async {
            bus.publish(Event::SLOT_OFFERED);
            // One yield: the device loop is now mid-settle.
            yield_now().await;
            bus.publish(Event::SLOT_OFFERED);
            bus.publish(Event::SLOT_OFFERED);
            light_sense.start_sensing();
            let outcome = light_sense.next_cycle().await;
            assert_eq!(outcome.channel, 0);
            settle_a_little().await;
            light_sense.stop();
        },
    ));

    assert_eq!(pins.read_count(), 1);
}

#[test]
fn stop_while_settling_releases_column_without_sampling() {
    let bus = NotificationBus::new();
    let light_sense_static = LightSenseStatic::new();
    let light_sense = LightSense::from_static(&light_sense_static);
    let event_bridge = EventBridge::new(&bus).expect("free subscriber");

    let (pins, ()) = block_on(join(
        inner_device_loop(
            sensor([100], NeverDelay, &light_sense_static),
            event_bridge,
            &light_sense_static,
        ),
        async {
            bus.publish(Event::SLOT_OFFERED);
            settle_a_little().await;
            light_sense.stop();
            light_sense.wait_stopped().await;
        },
    ));

    assert_eq!(pins.attached(), [26]);
    assert_eq!(pins.read_count(), 0);
    assert_eq!(
        pins.ops[pins.ops.len() - 2..],
        [PinOp::DisableAnalog, PinOp::Drive(26, PinState::High)]
    );
    assert_eq!(light_sense.averages().valid, None);
}

#[test]
fn abort_retries_the_same_channel() {
    let bus = NotificationBus::new();
    let light_sense_static = LightSenseStatic::new();
    let light_sense = LightSense::from_static(&light_sense_static);
    let event_bridge = EventBridge::new(&bus).expect("free subscriber");

    let (pins, ()) = block_on(join(
        inner_device_loop(
            sensor([], NeverDelay, &light_sense_static),
            event_bridge,
            &light_sense_static,
        ),
        async {
            bus.publish(Event::SLOT_OFFERED);
            settle_a_little().await;
            light_sense.abort();
            settle_a_little().await;
            bus.publish(Event::SLOT_OFFERED);
            settle_a_little().await;
            light_sense.stop();
        },
    ));

    assert_eq!(pins.attached(), [26, 26]);
    assert_eq!(pins.read_count(), 0);
}

#[test]
fn other_events_are_ignored() {
    let bus = NotificationBus::new();
    let light_sense_static = LightSenseStatic::new();
    let light_sense = LightSense::from_static(&light_sense_static);
    let event_bridge = EventBridge::new(&bus).expect("free subscriber");

    let (pins, ()) = block_on(join(
        inner_device_loop(
            sensor([], InstantDelay, &light_sense_static),
            event_bridge,
            &light_sense_static,
        ),
        async {
            bus.publish(Event::READING_READY);
            settle_a_little().await;
            light_sense.stop();
        },
    ));

    assert!(pins.ops.is_empty());
}

#[test]
fn bridge_registration_is_bounded_and_released_on_drop() {
    let bus = NotificationBus::new();
    let bridges: Vec<_> = (0..BUS_SUBSCRIBERS)
        .map(|_| EventBridge::new(&bus).expect("free subscriber"))
        .collect();

    assert!(matches!(
        EventBridge::new(&bus),
        Err(Error::BusSubscribersExhausted)
    ));
    drop(bridges);
    assert!(EventBridge::new(&bus).is_ok());
}

#[test]
fn read_scales_with_the_running_sensor_config() {
    let bus = NotificationBus::new();
    let light_sense_static = LightSenseStatic::new();
    let light_sense = LightSense::from_static(&light_sense_static);
    let event_bridge = EventBridge::new(&bus).expect("free subscriber");

    // No sensor attached yet.
    assert_eq!(light_sense.read(ReadMode::Latest), None);

    let (_pins, latest) = block_on(join(
        inner_device_loop(
            sensor([125, 125, 125], InstantDelay, &light_sense_static),
            event_bridge,
            &light_sense_static,
        ),
        async {
            light_sense.start_sensing();
            light_sense.next_cycle().await;
            let latest = light_sense.read(ReadMode::Latest);
            light_sense.stop();
            latest
        },
    ));

    // 125 / 3 = 41, scaled over 0..=450 rather than the default 75..=338.
    assert_eq!(latest, Some(WIDE.brightness(41)));
    assert_ne!(latest, Some(LightSenseConfig::new().brightness(41)));
}
