#![no_std]
#![doc = include_str!("../README.md")]

mod address;
mod bus;
mod command;
mod crc;
mod driver;
#[cfg(feature = "ds18x20")]
pub mod ds18x20;
mod interrupt;
mod iowire;
mod result;
mod search;
#[cfg(feature = "ds18x20")]
mod single;
#[cfg(feature = "ds18x20")]
pub mod temperature;
mod timing;
mod transport;

pub use address::{Address, AddressError};
pub use bus::{OneWireBus, PowerMode};
pub use command::{Command, OpCode};
pub use crc::{check_crc8, crc8};
pub use driver::Driver;
use interrupt::DisableInterrupts;
pub use iowire::{Inverted, IoWire, StrongPullup};
pub use result::Error;
pub use search::{DeviceSearchIter, RomSearch};
#[cfg(feature = "ds18x20")]
pub use single::Ds18x20Single;
pub use timing::SlotTiming;
pub use transport::BitTransport;
