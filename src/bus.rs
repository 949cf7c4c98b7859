use crate::{
    Address, BitTransport, Command, DeviceSearchIter, Error, OpCode, RomSearch,
};
use heapless::Vec;
use log::debug;

/// How the devices on the bus are powered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerMode {
    /// Devices have their own supply pin
    #[default]
    External,
    /// Devices draw power from the data line and need the strong pull-up
    /// during conversions and EEPROM writes
    Parasite,
}

/// A 1-Wire bus session on top of a [`BitTransport`].
///
/// Holds the power mode of the bus and whether the strong pull-up is
/// currently asserted. Every bus-active call releases the strong pull-up
/// before touching the line.
pub struct OneWireBus<T: BitTransport> {
    transport: T,
    power_mode: PowerMode,
    pullup_active: bool,
}

impl<T: BitTransport> OneWireBus<T> {
    pub fn new(transport: T) -> Self {
        OneWireBus {
            transport,
            power_mode: PowerMode::External,
            pullup_active: false,
        }
    }

    pub fn with_power_mode(mut self, power_mode: PowerMode) -> Self {
        self.power_mode = power_mode;
        self
    }

    pub fn power_mode(&self) -> PowerMode {
        self.power_mode
    }

    pub fn set_power_mode(&mut self, power_mode: PowerMode) {
        self.power_mode = power_mode;
    }

    pub fn is_pullup_active(&self) -> bool {
        self.pullup_active
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn release(self) -> T {
        self.transport
    }

    fn release_pullup(&mut self) -> Result<(), Error<T::Error>> {
        if self.pullup_active {
            self.transport.strong_pullup(false)?;
            self.pullup_active = false;
        }
        Ok(())
    }

    /// Asserts the strong pull-up when the bus runs on parasite power, so
    /// devices can draw current for the operation just started
    pub fn hold_power(&mut self) -> Result<(), Error<T::Error>> {
        if self.power_mode == PowerMode::Parasite {
            self.transport.strong_pullup(true)?;
            self.pullup_active = true;
        }
        Ok(())
    }

    /// Sends a reset pulse, returns whether any device is present
    pub fn reset(&mut self) -> Result<bool, Error<T::Error>> {
        self.release_pullup()?;
        Ok(self.transport.reset()?)
    }

    /// Sends a reset pulse, fails with [`Error::NoPresence`] if nothing answered
    pub fn reset_required(&mut self) -> Result<(), Error<T::Error>> {
        if self.reset()? {
            Ok(())
        } else {
            Err(Error::NoPresence)
        }
    }

    /// Resets the bus and addresses the device with the given ROM. Only that
    /// device listens to the following function command.
    pub fn select(&mut self, addr: &Address) -> Result<(), Error<T::Error>> {
        self.reset_required()?;
        self.transport.write_byte(Command::MatchRom.op_code())?;
        self.transport.write_bytes(addr.as_ref())?;
        Ok(())
    }

    /// Resets the bus and addresses all devices at once
    pub fn skip(&mut self) -> Result<(), Error<T::Error>> {
        self.reset_required()?;
        self.transport.write_byte(Command::SkipRom.op_code())?;
        Ok(())
    }

    /// Selects the given device, or all of them when `addr` is `None`
    pub fn address(&mut self, addr: Option<&Address>) -> Result<(), Error<T::Error>> {
        match addr {
            Some(addr) => self.select(addr),
            None => self.skip(),
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, Error<T::Error>> {
        self.release_pullup()?;
        Ok(self.transport.read_bit()?)
    }

    pub fn write_bit(&mut self, bit: bool) -> Result<(), Error<T::Error>> {
        self.release_pullup()?;
        Ok(self.transport.write_bit(bit)?)
    }

    pub fn read_byte(&mut self) -> Result<u8, Error<T::Error>> {
        self.release_pullup()?;
        Ok(self.transport.read_byte()?)
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), Error<T::Error>> {
        self.release_pullup()?;
        Ok(self.transport.write_byte(byte)?)
    }

    pub fn read_bytes(&mut self, dst: &mut [u8]) -> Result<(), Error<T::Error>> {
        self.release_pullup()?;
        Ok(self.transport.read_bytes(dst)?)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error<T::Error>> {
        self.release_pullup()?;
        Ok(self.transport.write_bytes(bytes)?)
    }

    /// Writes a command byte, then powers the bus if it runs on parasite power
    pub fn write_command_powered(&mut self, cmd: impl OpCode) -> Result<(), Error<T::Error>> {
        self.write_byte(cmd.op_code())?;
        self.hold_power()
    }

    /// Writes bytes, then powers the bus if it runs on parasite power
    pub fn write_bytes_powered(&mut self, bytes: &[u8]) -> Result<(), Error<T::Error>> {
        self.write_bytes(bytes)?;
        self.hold_power()
    }

    /// A device busy with a conversion or EEPROM copy holds the read slot low.
    /// Only externally powered devices do this, the strong pull-up keeps the
    /// line high for parasite powered ones.
    pub fn is_busy(&mut self) -> Result<bool, Error<T::Error>> {
        Ok(!self.read_bit()?)
    }

    /// Reads the ROM of the only device on the bus. With several devices
    /// present the result is the AND of their ROMs and fails the CRC.
    pub fn read_rom(&mut self) -> Result<Address, Error<T::Error>> {
        self.reset_required()?;
        self.transport.write_byte(Command::ReadRom.op_code())?;
        let mut address = Address::default();
        self.transport.read_bytes(address.as_mut())?;
        if !address.is_crc_valid() {
            return Err(Error::CrcMismatch(crate::crc8(address.as_ref())));
        }
        Ok(address)
    }

    /// Runs one pass of the given search
    pub fn search_next(&mut self, search: &mut RomSearch) -> Result<Option<Address>, Error<T::Error>> {
        self.release_pullup()?;
        search.step(&mut self.transport)
    }

    /// Iterates over the ROMs of all devices on the bus
    pub fn devices(&mut self) -> DeviceSearchIter<'_, T> {
        RomSearch::new().into_iter(self)
    }

    /// Discovers every device on the bus. The order depends only on the set
    /// of ROMs present. An empty bus yields an empty list.
    pub fn scan<const N: usize>(&mut self) -> Result<Vec<Address, N>, Error<T::Error>> {
        let mut found = Vec::new();
        let mut search = RomSearch::new();
        while let Some(address) = self.search_next(&mut search)? {
            found
                .push(address)
                .map_err(|_| Error::TooManyDevices(N))?;
        }
        debug!("scan: {} device(s)", found.len());
        Ok(found)
    }
}
