use embassy_rp::{
    adc::{self, Adc},
    gpio::{self, Flex, Level},
};

use crate::output_array::OutputArray;
use crate::rp_matrix_pins::{RpMatrixPins, SENSE_COLUMNS, SENSE_ROWS};
use crate::{MatrixMap, Result};

/// Demo wiring: rows on GPIO 18..=20, columns on the ADC pins GPIO 26..=28.
pub const DEMO_MATRIX: MatrixMap = MatrixMap::new(18, 3, 26, 3);

/// The board as the demo wires it.
pub struct Hardware {
    pub matrix_pins: RpMatrixPins<'static, SENSE_ROWS, SENSE_COLUMNS>,
    pub matrix_map: MatrixMap,
}

impl Hardware {
    /// Takes the RP2040 peripherals and puts the matrix in its idle pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the wiring does not match [`DEMO_MATRIX`].
    pub fn new() -> Result<Self> {
        let peripherals: embassy_rp::Peripherals =
            embassy_rp::init(embassy_rp::config::Config::default());

        let rows = OutputArray::new([
            gpio::Output::new(peripherals.PIN_18, Level::Low),
            gpio::Output::new(peripherals.PIN_19, Level::Low),
            gpio::Output::new(peripherals.PIN_20, Level::Low),
        ]);

        let mut columns = [
            Flex::new(peripherals.PIN_26),
            Flex::new(peripherals.PIN_27),
            Flex::new(peripherals.PIN_28),
        ];
        for column in &mut columns {
            column.set_high();
            column.set_as_output();
        }

        let adc = Adc::new_blocking(peripherals.ADC, adc::Config::default());

        let matrix_pins = RpMatrixPins::new(DEMO_MATRIX, rows, columns, adc)?;

        Ok(Self {
            matrix_pins,
            matrix_map: DEMO_MATRIX,
        })
    }
}
