//! Round-robin choice of the next display section to sample.

/// Tracks which of `C` channels is sampled next.
///
/// Channels correspond to symmetric sections of the display, so one full rotation of
/// `C` samples approximates brightness across the whole panel rather than one hotspot.
/// On the micro:bit the three channels cover these sections of the 5x5 face:
///
/// ```text
///  ___________________
/// | 1 |   | 2 |   | 3 |
/// |___|___|___|___|___|
/// |   |   |   |   |   |
/// |___|___|___|___|___|
/// | 2 |   | 3 |   | 1 |
/// |___|___|___|___|___|
/// |   |   |   |   |   |
/// |___|___|___|___|___|
/// | 3 |   | 1 |   | 2 |
/// |___|___|___|___|___|
/// ```
///
/// The scheduler does not know that table; it only counts.
///
/// ```rust
/// use matrix_light_sense::ChannelScheduler;
///
/// let mut scheduler = ChannelScheduler::<3>::new();
/// let order: [usize; 5] = core::array::from_fn(|_| scheduler.next());
/// assert_eq!(order, [0, 1, 2, 0, 1]);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelScheduler<const C: usize> {
    current: usize,
}

impl<const C: usize> ChannelScheduler<C> {
    #[must_use]
    pub const fn new() -> Self {
        Self { current: 0 }
    }

    /// The channel the next sensing cycle will use.
    #[must_use]
    pub const fn current(&self) -> usize {
        self.current
    }

    /// Returns the channel to sample and advances by one, wrapping modulo `C`.
    pub const fn next(&mut self) -> usize {
        let channel = self.current;
        self.current = if channel + 1 >= C { 0 } else { channel + 1 };
        channel
    }
}
