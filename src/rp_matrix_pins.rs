//! RP2040 backend for [`MatrixPins`]: rows on plain outputs, sense columns on ADC pins.
//!
//! The ADC is driven by register so a column can be rebound every cycle without
//! giving up the `Flex` the display drives it through.

use embassy_rp::adc::{Adc, Blocking};
use embassy_rp::gpio::{Flex, Level};
use embassy_rp::pac;
use embedded_hal::digital::PinState;

use crate::hardware_arbiter::MatrixPins;
use crate::output_array::OutputArray;
use crate::{Error, MatrixMap, Result};

/// Rows in the demo wiring.
pub const SENSE_ROWS: usize = 3;
/// Columns in the demo wiring; one per ADC input on GPIO 26..=28.
pub const SENSE_COLUMNS: usize = 3;

/// GPIO 26..=29 are ADC inputs 0..=3.
const ADC_FIRST_PIN: u8 = 26;
const ADC_LAST_PIN: u8 = 29;

/// LED matrix pins on an RP2040 with `R` rows and `K` analog-capable columns.
pub struct RpMatrixPins<'d, const R: usize, const K: usize> {
    matrix_map: MatrixMap,
    rows: OutputArray<'d, R>,
    columns: [Flex<'d>; K],
    // Held so the ADC stays out of reset and clocked.
    _adc: Adc<'d, Blocking>,
}

impl<'d, const R: usize, const K: usize> RpMatrixPins<'d, R, K> {
    /// `rows` and `columns` must be in the order of `matrix_map`'s pin ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PinCountMismatch`] if the arrays do not match the map and
    /// [`Error::PinNotAnalogCapable`] if a column pin is not one of GPIO 26..=29.
    pub fn new(
        matrix_map: MatrixMap,
        mut rows: OutputArray<'d, R>,
        columns: [Flex<'d>; K],
        adc: Adc<'d, Blocking>,
    ) -> Result<Self> {
        if usize::from(matrix_map.rows()) != R {
            return Err(Error::PinCountMismatch {
                expected: matrix_map.rows(),
                actual: R,
            });
        }
        if usize::from(matrix_map.columns()) != K {
            return Err(Error::PinCountMismatch {
                expected: matrix_map.columns(),
                actual: K,
            });
        }
        if let Some(pin) = matrix_map
            .column_pins()
            .find(|pin| !(ADC_FIRST_PIN..=ADC_LAST_PIN).contains(pin))
        {
            return Err(Error::PinNotAnalogCapable(pin));
        }

        rows.set_all(Level::Low);
        Ok(Self {
            matrix_map,
            rows,
            columns,
            _adc: adc,
        })
    }
}

const fn level(state: PinState) -> Level {
    match state {
        PinState::Low => Level::Low,
        PinState::High => Level::High,
    }
}

impl<const R: usize, const K: usize> MatrixPins for RpMatrixPins<'_, R, K> {
    fn drive(&mut self, pin: u8, state: PinState) {
        if let Some(row) = self.matrix_map.row_of(pin) {
            let Ok(_) = self.rows.set_state_at(usize::from(row), state);
            return;
        }
        let Some(column) = self
            .matrix_map
            .column_of(pin)
            .and_then(|column| self.columns.get_mut(usize::from(column)))
        else {
            return;
        };
        // Undo any analog pad setup before the SIO drives the pin again.
        pac::PADS_BANK0.gpio(usize::from(pin)).modify(|w| {
            w.set_od(false);
            w.set_ie(true);
        });
        column.set_level(level(state));
        column.set_as_output();
    }

    fn release_input(&mut self, pin: u8) {
        pac::PADS_BANK0.gpio(usize::from(pin)).modify(|w| {
            w.set_ie(false);
            w.set_pue(false);
            w.set_pde(false);
        });
    }

    fn attach_analog(&mut self, pin: u8) {
        // The column floats from the level it was last driven to.
        pac::PADS_BANK0
            .gpio(usize::from(pin))
            .modify(|w| w.set_od(true));
        let channel = pin.saturating_sub(ADC_FIRST_PIN);
        pac::ADC.cs().modify(|w| {
            w.set_en(true);
            w.set_ainsel(channel);
        });
        while !pac::ADC.cs().read().ready() {}
    }

    fn read_raw(&mut self) -> u16 {
        pac::ADC.cs().modify(|w| w.set_start_once(true));
        while !pac::ADC.cs().read().ready() {}
        pac::ADC.result().read().result()
    }

    fn disable_analog(&mut self) {
        // Full write: clears AINSEL and every other field along with EN.
        pac::ADC.cs().write(|w| w.set_en(false));
    }
}
