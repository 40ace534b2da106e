use derive_more::derive::{Display, Error};

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Define a unified error type for this crate.
#[derive(Debug, Display, Error)]
pub enum Error {
    // `#[error(not(source))]` below tells `derive_more` that `embassy_executor::SpawnError` does
    // not implement Rust's `core::error::Error` trait.
    #[cfg(feature = "pico1")]
    #[display("{_0:?}")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),

    #[display("A light sensor needs at least one channel")]
    NoChannels,

    #[display("{channels} channels requested but the matrix has only {columns} columns")]
    TooManyChannels { channels: usize, columns: u8 },

    #[display("Sensing range is empty (min {min} >= max {max})")]
    EmptyRange { min: u16, max: u16 },

    #[display("Settle delay does not fit in u32 microseconds")]
    SettleDelayTooLong,

    #[display("A sensing cycle is already in flight")]
    CycleInFlight,

    #[display("No conversion is settling")]
    NotSettling,

    #[display("Channel {_0} is outside the matrix")]
    ChannelOutOfRange(#[error(not(source))] usize),

    #[display("Pin {_0} cannot be routed to the ADC")]
    PinNotAnalogCapable(#[error(not(source))] u8),

    #[display("Matrix map wants {expected} pins but {actual} were supplied")]
    PinCountMismatch { expected: u8, actual: usize },

    #[display("The notification bus has no free subscriber slots")]
    BusSubscribersExhausted,
}

#[cfg(feature = "pico1")]
impl From<embassy_executor::SpawnError> for Error {
    fn from(err: embassy_executor::SpawnError) -> Self {
        Self::TaskSpawn(err)
    }
}

impl From<embassy_sync::pubsub::Error> for Error {
    fn from(_: embassy_sync::pubsub::Error) -> Self {
        Self::BusSubscribersExhausted
    }
}
