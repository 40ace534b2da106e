//! Static description of which physical pins drive an LED matrix.
//!
//! See [`MatrixMap`].

/// Which physical pin indices correspond to the rows and columns of an LED matrix.
///
/// Rows and columns each occupy a contiguous pin range. The map is read-only for the
/// lifetime of the sensor and is shared with whatever refreshes the display.
///
/// ```rust
/// use matrix_light_sense::MatrixMap;
///
/// const MAP: MatrixMap = MatrixMap::new(18, 3, 26, 3);
/// assert_eq!(MAP.column_pin(2), Some(28));
/// assert_eq!(MAP.column_pin(3), None);
/// ```
///
/// Invalid maps are rejected at compile time when built in a const:
///
/// ```compile_fail
/// use matrix_light_sense::MatrixMap;
///
/// // Column range runs past pin 255
/// const BAD: MatrixMap = MatrixMap::new(0, 3, 250, 9);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MatrixMap {
    row_start: u8,
    rows: u8,
    column_start: u8,
    columns: u8,
}

impl MatrixMap {
    /// The micro:bit (v1) matrix: 3 electrical rows on pins 13..=15 and 9 columns on pins 4..=12.
    ///
    /// The 25 visible LEDs are wired onto this 3x9 grid, so every physical section of the
    /// display shares column pins with the others.
    pub const MICROBIT: Self = Self::new(13, 3, 4, 9);

    /// Creates a map from the first row pin, the row count, the first column pin and the
    /// column count.
    ///
    /// # Panics
    ///
    /// Panics (at compile time in const context) if either count is zero or a pin range
    /// runs past pin 255.
    #[must_use]
    pub const fn new(row_start: u8, rows: u8, column_start: u8, columns: u8) -> Self {
        assert!(rows > 0, "a matrix needs at least one row");
        assert!(columns > 0, "a matrix needs at least one column");
        assert!(
            row_start as u16 + rows as u16 <= 256,
            "row pins run past pin 255"
        );
        assert!(
            column_start as u16 + columns as u16 <= 256,
            "column pins run past pin 255"
        );
        Self {
            row_start,
            rows,
            column_start,
            columns,
        }
    }

    #[must_use]
    pub const fn row_start(&self) -> u8 {
        self.row_start
    }

    #[must_use]
    pub const fn rows(&self) -> u8 {
        self.rows
    }

    #[must_use]
    pub const fn column_start(&self) -> u8 {
        self.column_start
    }

    #[must_use]
    pub const fn columns(&self) -> u8 {
        self.columns
    }

    /// Physical pin of `column`, or `None` if the matrix has no such column.
    #[must_use]
    pub const fn column_pin(&self, column: u8) -> Option<u8> {
        if column < self.columns {
            Some(self.column_start + column)
        } else {
            None
        }
    }

    /// Row index of a physical pin, if the pin is one of the row pins.
    #[must_use]
    pub const fn row_of(&self, pin: u8) -> Option<u8> {
        match pin.checked_sub(self.row_start) {
            Some(row) if row < self.rows => Some(row),
            _ => None,
        }
    }

    /// Column index of a physical pin, if the pin is one of the column pins.
    #[must_use]
    pub const fn column_of(&self, pin: u8) -> Option<u8> {
        match pin.checked_sub(self.column_start) {
            Some(column) if column < self.columns => Some(column),
            _ => None,
        }
    }

    /// Every row pin, in row order.
    pub fn row_pins(&self) -> impl Iterator<Item = u8> + use<> {
        let row_start = self.row_start;
        (0..self.rows).map(move |row| row_start + row)
    }

    /// Every column pin, in column order.
    pub fn column_pins(&self) -> impl Iterator<Item = u8> + use<> {
        let column_start = self.column_start;
        (0..self.columns).map(move |column| column_start + column)
    }
}
