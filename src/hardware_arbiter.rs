//! Hands a display column pin over to the analog front end and back again.
//!
//! See [`HardwareArbiter`].

use embedded_hal::digital::PinState;

#[cfg(feature = "sense-trace")]
use defmt::info;

use crate::{Error, MatrixMap, Result};

/// GPIO and analog primitives the arbiter needs, addressed by physical pin number.
///
/// The analog side is a single pre-allocated slot: [`attach_analog`](Self::attach_analog)
/// rebinds it to a pin, [`disable_analog`](Self::disable_analog) unbinds it.
pub trait MatrixPins {
    /// Configures `pin` as a digital output at `state`.
    fn drive(&mut self, pin: u8, state: PinState);

    /// Tears down any digital-input configuration lingering on `pin`.
    fn release_input(&mut self, pin: u8);

    /// Routes `pin` into the analog front end.
    fn attach_analog(&mut self, pin: u8);

    /// Takes one conversion from the attached pin.
    fn read_raw(&mut self) -> u16;

    /// Disables the analog front end at the register level.
    ///
    /// Some parts (nRF51 PAN 3) keep the pin claimed by the ADC until this happens, and
    /// the display then loses that column for good.
    fn disable_analog(&mut self);
}

/// Proof of exclusive ownership of one column pin for the duration of a sensing cycle.
///
/// Not `Clone`: the handle moves from [`HardwareArbiter::acquire`] to
/// [`HardwareArbiter::release`], so the pin cannot be released twice or sampled after.
#[must_use = "an acquired column stays an analog input until released"]
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SenseHandle {
    channel: usize,
    pin: u8,
}

impl SenseHandle {
    #[must_use]
    pub const fn channel(&self) -> usize {
        self.channel
    }

    #[must_use]
    pub const fn pin(&self) -> u8 {
        self.pin
    }
}

/// Performs the pin mode hand-off between display drive and analog sensing.
pub struct HardwareArbiter<P> {
    pins: P,
    matrix_map: MatrixMap,
    bound: Option<u8>,
}

impl<P: MatrixPins> HardwareArbiter<P> {
    #[must_use]
    pub const fn new(pins: P, matrix_map: MatrixMap) -> Self {
        Self {
            pins,
            matrix_map,
            bound: None,
        }
    }

    /// Puts the matrix into the sensing pattern and takes `channel`'s column as an analog input.
    ///
    /// All rows go low and all columns go high (the display's idle pattern), then the
    /// target column's digital configuration is torn down and it is bound to the ADC.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleInFlight`] if a handle is already outstanding and
    /// [`Error::ChannelOutOfRange`] if the matrix has no such column. No pin is touched
    /// in either case.
    pub fn acquire(&mut self, channel: usize) -> Result<SenseHandle> {
        if self.bound.is_some() {
            return Err(Error::CycleInFlight);
        }
        let pin = u8::try_from(channel)
            .ok()
            .and_then(|column| self.matrix_map.column_pin(column))
            .ok_or(Error::ChannelOutOfRange(channel))?;

        for row_pin in self.matrix_map.row_pins() {
            self.pins.drive(row_pin, PinState::Low);
        }
        for column_pin in self.matrix_map.column_pins() {
            self.pins.drive(column_pin, PinState::High);
        }
        self.pins.release_input(pin);
        self.pins.attach_analog(pin);
        self.bound = Some(pin);

        #[cfg(feature = "sense-trace")]
        info!("arbiter: ch{} took pin {}", channel, pin);
        Ok(SenseHandle { channel, pin })
    }

    /// Reads the column `handle` owns.
    pub fn sample(&mut self, handle: &SenseHandle) -> u16 {
        debug_assert_eq!(self.bound, Some(handle.pin));
        self.pins.read_raw()
    }

    /// Disables the analog front end and drives the column high again for the display.
    pub fn release(&mut self, handle: SenseHandle) {
        self.pins.disable_analog();
        self.pins.drive(handle.pin, PinState::High);
        self.bound = None;

        #[cfg(feature = "sense-trace")]
        info!("arbiter: pin {} back to display", handle.pin);
    }

    /// Whether a column is currently held as an analog input.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    #[must_use]
    pub const fn matrix_map(&self) -> &MatrixMap {
        &self.matrix_map
    }

    #[must_use]
    pub const fn pins(&self) -> &P {
        &self.pins
    }

    /// Gives the pin backend back. Release any outstanding handle first.
    pub fn into_pins(self) -> P {
        debug_assert!(self.bound.is_none(), "column still bound to the ADC");
        self.pins
    }
}
