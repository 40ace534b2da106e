//! Tunable constants for the light sensor.
//!
//! See [`LightSenseConfig`].

use embassy_time::Duration;

use crate::shared_constants::{BRIGHTNESS_MAX, MAX_VALUE, MIN_VALUE, SETTLE_DELAY, VALID_MAX};
use crate::{Error, MatrixMap, Result};

/// Settle delay, validity window and output clamp range for a light sensor.
///
/// The channel count is not stored here; it is the `C` const generic of
/// [`LightSensor`](crate::LightSensor) so the per-channel result set has a fixed size.
///
/// ```rust
/// use embassy_time::Duration;
/// use matrix_light_sense::LightSenseConfig;
///
/// const CONFIG: LightSenseConfig = LightSenseConfig::new()
///     .with_settle_delay(Duration::from_micros(2_500))
///     .with_valid_max(450)
///     .with_range(0, 450);
///
/// // Lower raw magnitude means brighter ambient light.
/// assert_eq!(CONFIG.brightness(125), 184);
/// assert_eq!(CONFIG.brightness(0), 255);
/// assert_eq!(CONFIG.brightness(1_000), 0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightSenseConfig {
    settle_delay: Duration,
    valid_max: u16,
    min_value: u16,
    max_value: u16,
}

impl Default for LightSenseConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LightSenseConfig {
    /// The micro:bit defaults: 4 ms settle, validity window `0..=450`, clamp range `75..=338`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            settle_delay: SETTLE_DELAY,
            valid_max: VALID_MAX,
            min_value: MIN_VALUE,
            max_value: MAX_VALUE,
        }
    }

    #[must_use]
    pub const fn with_settle_delay(self, settle_delay: Duration) -> Self {
        Self {
            settle_delay,
            ..self
        }
    }

    /// Sets the inclusive upper bound of the validity window. The lower bound is always 0.
    #[must_use]
    pub const fn with_valid_max(self, valid_max: u16) -> Self {
        Self { valid_max, ..self }
    }

    /// Sets the `[min_value, max_value]` range averages are clamped into before scaling.
    #[must_use]
    pub const fn with_range(self, min_value: u16, max_value: u16) -> Self {
        Self {
            min_value,
            max_value,
            ..self
        }
    }

    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    #[must_use]
    pub const fn valid_max(&self) -> u16 {
        self.valid_max
    }

    #[must_use]
    pub const fn min_value(&self) -> u16 {
        self.min_value
    }

    #[must_use]
    pub const fn max_value(&self) -> u16 {
        self.max_value
    }

    /// Settle delay in whole microseconds, saturating at `u32::MAX`.
    #[must_use]
    pub fn settle_delay_us(&self) -> u32 {
        u32::try_from(self.settle_delay.as_micros()).unwrap_or(u32::MAX)
    }

    /// Checks this configuration against a matrix for a sensor with `C` channels.
    ///
    /// # Errors
    ///
    /// Returns an error if `C` is zero or exceeds the matrix's column count, if the clamp
    /// range is empty, or if the settle delay does not fit in `u32` microseconds.
    pub fn validate<const C: usize>(&self, matrix_map: &MatrixMap) -> Result<()> {
        if C == 0 {
            return Err(Error::NoChannels);
        }
        if C > usize::from(matrix_map.columns()) {
            return Err(Error::TooManyChannels {
                channels: C,
                columns: matrix_map.columns(),
            });
        }
        if self.min_value >= self.max_value {
            return Err(Error::EmptyRange {
                min: self.min_value,
                max: self.max_value,
            });
        }
        if u32::try_from(self.settle_delay.as_micros()).is_err() {
            return Err(Error::SettleDelayTooLong);
        }
        Ok(())
    }

    /// Converts a raw average into the public 0 (dark) ..= 255 (bright) scale.
    ///
    /// The average is clamped into `[min_value, max_value]`, inverted so that a lower raw
    /// magnitude reads brighter, then rescaled with truncating division.
    #[must_use]
    pub fn brightness(&self, average: u16) -> u8 {
        let min = u32::from(self.min_value);
        let max = u32::from(self.max_value);
        let clamped = u32::from(average).max(min).min(max);
        let inverted = max.saturating_sub(clamped).saturating_add(min);
        let normalised = inverted
            .saturating_sub(min)
            .saturating_mul(u32::from(BRIGHTNESS_MAX))
            .checked_div(max.saturating_sub(min))
            .unwrap_or(0);
        u8::try_from(normalised).unwrap_or(BRIGHTNESS_MAX)
    }
}
