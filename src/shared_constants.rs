use embassy_time::Duration;

// Defaults follow the micro:bit runtime's light sensor.

/// Channels (display sections) sampled per rotation.
pub const CHANNEL_COUNT: usize = 3;

/// Time a column is left floating as an analog input before it is sampled.
pub const SETTLE_DELAY: Duration = Duration::from_micros(4_000);

/// Largest raw sample still considered a plausible reading.
pub const VALID_MAX: u16 = 450;

/// Raw averages at or below this read as full brightness.
pub const MIN_VALUE: u16 = 75;

/// Raw averages at or above this read as full darkness.
pub const MAX_VALUE: u16 = 338;

/// Top of the public brightness scale.
pub const BRIGHTNESS_MAX: u8 = 255;

// Notification bus sizing
pub const BUS_CAPACITY: usize = 4;
pub const BUS_SUBSCRIBERS: usize = 4;
pub const BUS_PUBLISHERS: usize = 2;
