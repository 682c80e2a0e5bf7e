#[allow(unused_imports)]
use crate::OneWireSearch;

/// One wire communication error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OneWireError<E> {
    /// Encapsulates the error type from the underlying hardware.
    Other(E),
    /// The bus never returned to idle (high) before a reset could be issued.
    BusTimeout,
    /// Indicates that no device answered the reset with a presence pulse.
    NoDevicePresent,
    /// Both bits of a search step read back as 1, i.e. no device took part in
    /// the step. The device candidate of the current [`OneWireSearch`] pass is
    /// dropped.
    BusFault,
    /// A ROM code or data block failed the CRC-8 check.
    CrcMismatch,
}

impl<E> From<E> for OneWireError<E> {
    fn from(other: E) -> Self {
        Self::Other(other)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for OneWireError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Other(e) => write!(f, "bus line error: {e:?}"),
            Self::BusTimeout => f.write_str("bus did not return to idle"),
            Self::NoDevicePresent => f.write_str("no presence pulse"),
            Self::BusFault => f.write_str("no device answered the search step"),
            Self::CrcMismatch => f.write_str("CRC-8 mismatch"),
        }
    }
}

impl<E: core::fmt::Debug> core::error::Error for OneWireError<E> {}
