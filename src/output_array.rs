use core::convert::Infallible;

use embassy_rp::gpio::{self, Level};
use embedded_hal::digital::{OutputPin, PinState};

/// The matrix row pins, driven as a group.
pub struct OutputArray<'a, const N: usize>([gpio::Output<'a>; N]);

impl<'a, const N: usize> OutputArray<'a, N> {
    pub fn new(outputs: [gpio::Output<'a>; N]) -> Self {
        Self(outputs)
    }

    #[inline]
    pub fn set_all(&mut self, level: Level) {
        for output in &mut self.0 {
            output.set_level(level);
        }
    }

    /// Returns `false` if there is no pin at `index`.
    #[inline]
    #[must_use = "Possible missing pin should not be ignored"]
    // on some hardware (but not here), setting a pin can fail, so we go through OutputPin
    pub fn set_state_at(&mut self, index: usize, state: PinState) -> Result<bool, Infallible> {
        let Some(output) = self.0.get_mut(index) else {
            return Ok(false);
        };
        output.set_state(state)?;
        Ok(true)
    }
}
