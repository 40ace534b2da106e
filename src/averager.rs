//! Per-channel raw samples and the running/valid averages derived from them.
//!
//! See [`Averager`].

use crate::{Error, LightSenseConfig, Result};

/// Which average [`Averager::read`] reports.
///
/// Instead of describing the choice with a bare `bool`, this enum names both options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadMode {
    /// The last average computed from a cycle where every channel was in range.
    /// Reads `None` until the first such cycle.
    #[default]
    ValidOnly,
    /// The unconditional running average, counting never-sampled channels as 0.
    Latest,
}

/// Outcome of recording one sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Validity {
    /// Every channel holds an in-range sample; the valid average was updated.
    Valid,
    /// At least one channel is unsampled or out of range; the valid average is unchanged.
    Invalid,
}

impl Validity {
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// A copyable snapshot of both averages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Averages {
    /// Recomputed every cycle regardless of validity.
    pub running: u16,
    /// `None` until the first fully valid cycle; sticky across invalid cycles after that.
    pub valid: Option<u16>,
}

impl Averages {
    /// Before any sample has been taken.
    pub const EMPTY: Self = Self {
        running: 0,
        valid: None,
    };

    /// The raw average `read_mode` selects, if there is one.
    #[must_use]
    pub const fn select(&self, read_mode: ReadMode) -> Option<u16> {
        match read_mode {
            ReadMode::ValidOnly => self.valid,
            ReadMode::Latest => Some(self.running),
        }
    }

    /// Brightness on the 0 (dark) ..= 255 (bright) scale, or `None` if `read_mode` is
    /// [`ReadMode::ValidOnly`] and no fully valid cycle has completed yet.
    #[must_use]
    pub fn brightness(&self, read_mode: ReadMode, config: &LightSenseConfig) -> Option<u8> {
        self.select(read_mode)
            .map(|average| config.brightness(average))
    }
}

/// Stores the latest raw sample per channel and derives the running and valid averages.
///
/// ```rust
/// use matrix_light_sense::{Averager, LightSenseConfig, ReadMode, Validity};
///
/// let config = LightSenseConfig::new().with_valid_max(450).with_range(0, 450);
/// let mut averager = Averager::<3>::new(config);
///
/// assert_eq!(averager.record(0, 100).unwrap(), Validity::Invalid);
/// assert_eq!(averager.record(1, 150).unwrap(), Validity::Invalid);
/// assert_eq!(averager.read(ReadMode::ValidOnly), None);
///
/// assert_eq!(averager.record(2, 125).unwrap(), Validity::Valid);
/// assert_eq!(averager.averages().valid, Some(125));
/// assert_eq!(averager.read(ReadMode::Latest), Some(184));
/// ```
#[derive(Clone, Debug)]
pub struct Averager<const C: usize> {
    results: [Option<u16>; C],
    averages: Averages,
    config: LightSenseConfig,
}

impl<const C: usize> Averager<C> {
    /// Every channel starts out never sampled.
    #[must_use]
    pub const fn new(config: LightSenseConfig) -> Self {
        Self {
            results: [None; C],
            averages: Averages::EMPTY,
            config,
        }
    }

    /// Stores `raw` for `channel`, recomputes the running average and, if every channel
    /// now lies in `0..=valid_max`, overwrites the valid average.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelOutOfRange`] if `channel >= C`; nothing is updated.
    pub fn record(&mut self, channel: usize, raw: u16) -> Result<Validity> {
        let slot = self
            .results
            .get_mut(channel)
            .ok_or(Error::ChannelOutOfRange(channel))?;
        *slot = Some(raw);

        self.averages.running = self.running_average();

        let valid_max = self.config.valid_max();
        // An unsampled channel fails here, forcing one full rotation first.
        let validity = if self
            .results
            .iter()
            .all(|sample| sample.is_some_and(|value| value <= valid_max))
        {
            self.averages.valid = Some(self.averages.running);
            Validity::Valid
        } else {
            Validity::Invalid
        };

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "light sense: ch{}={} running={} valid={}",
            channel,
            raw,
            self.averages.running,
            self.averages.valid
        );
        Ok(validity)
    }

    fn running_average(&self) -> u16 {
        let sum: u32 = self
            .results
            .iter()
            .map(|sample| u32::from(sample.unwrap_or(0)))
            .sum();
        let average = u32::try_from(C)
            .ok()
            .and_then(|count| sum.checked_div(count))
            .unwrap_or(0);
        u16::try_from(average).unwrap_or(u16::MAX)
    }

    /// Brightness from the average `read_mode` selects. See [`Averages::brightness`].
    #[must_use]
    pub fn read(&self, read_mode: ReadMode) -> Option<u8> {
        self.averages.brightness(read_mode, &self.config)
    }

    #[must_use]
    pub const fn averages(&self) -> Averages {
        self.averages
    }

    /// The latest raw sample per channel; `None` for channels never sampled.
    #[must_use]
    pub const fn results(&self) -> &[Option<u16>; C] {
        &self.results
    }

    #[must_use]
    pub const fn config(&self) -> &LightSenseConfig {
        &self.config
    }
}
