use core::fmt::{Debug, Display, Formatter, Result as FmtResult};

/// Error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E: Sized + Debug> {
    /// No presence pulse after reset
    NoPresence,
    /// Both the id bit and its complement read high during a search, at the
    /// given bit position (counted from 64 down to 1)
    CollisionFault(u8),
    /// CRC8 over the received bytes did not check out, holds the residual
    CrcMismatch(u8),
    /// The family code is not one of the DS18x20 families
    UnsupportedFamily(u8),
    /// Resolution outside 9..=12 bits
    InvalidResolution(u8),
    /// A single device was required but the given number was found
    NotSingleDevice(usize),
    /// More devices than the scan buffer holds
    TooManyDevices(usize),
    /// A device did not release the line in time
    Timeout,
    /// Busy polling was requested on a parasite powered bus, where devices
    /// cannot hold the line low while converting
    BusyPollUnavailable,
    PortError(E),
}

impl<E: Sized + Debug> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::PortError(e)
    }
}

impl<E: Sized + Debug> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Error::NoPresence => write!(f, "no presence pulse"),
            Error::CollisionFault(bit) => write!(f, "no device answered search bit {}", bit),
            Error::CrcMismatch(residual) => write!(f, "crc mismatch (residual {:#04x})", residual),
            Error::UnsupportedFamily(code) => write!(f, "unsupported family code {:#04x}", code),
            Error::InvalidResolution(bits) => write!(f, "invalid resolution of {} bits", bits),
            Error::NotSingleDevice(count) => write!(f, "expected one device, found {}", count),
            Error::TooManyDevices(capacity) => {
                write!(f, "more than {} devices on the bus", capacity)
            }
            Error::Timeout => write!(f, "device stayed busy"),
            Error::BusyPollUnavailable => write!(f, "busy polling needs external power"),
            Error::PortError(e) => write!(f, "port error: {:?}", e),
        }
    }
}
