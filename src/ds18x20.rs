//! Function commands of the DS18S20, DS18B20 and DS1822 temperature sensors.
//!
//! Conversions are started with [`convert`] and take up to
//! [`Resolution::conversion_time_ms`]. This module never sleeps: wait that long,
//! or poll with [`read_temperature_async`], before reading the result.

use crate::temperature::{decode_temperature, DeviceFamily, Scratchpad, Temperature};
use crate::{crc8, Address, BitTransport, Error, OneWireBus, OpCode, PowerMode};
use core::fmt::Debug;
use log::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Convert = 0x44,
    WriteScratchpad = 0x4E,
    ReadScratchpad = 0xBE,
    CopyScratchpad = 0x48,
    RecallE2 = 0xB8,
    ReadPowerSupply = 0xB4,
}

impl OpCode for Command {
    fn op_code(&self) -> u8 {
        *self as _
    }
}

/// Read slots to poll for a finished EEPROM recall, about 10ms worth
const RECALL_POLL_SLOTS: usize = 210;

/// Conversion resolution of the 12-bit family, as stored in the
/// configuration register
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum Resolution {
    Bits9 = 0b0001_1111,
    Bits10 = 0b0011_1111,
    Bits11 = 0b0101_1111,
    #[default]
    Bits12 = 0b0111_1111,
}

impl Resolution {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            9 => Some(Resolution::Bits9),
            10 => Some(Resolution::Bits10),
            11 => Some(Resolution::Bits11),
            12 => Some(Resolution::Bits12),
            _ => None,
        }
    }

    pub fn bits(&self) -> u8 {
        ((*self as u8 >> 5) & 0x03) + 9
    }

    /// Bits 5 and 6 select the resolution, the rest is ignored
    pub fn from_config_register(config: u8) -> Self {
        match (config >> 5) & 0x03 {
            0 => Resolution::Bits9,
            1 => Resolution::Bits10,
            2 => Resolution::Bits11,
            _ => Resolution::Bits12,
        }
    }

    pub fn to_config_register(&self) -> u8 {
        *self as u8
    }

    /// Maximum conversion time at this resolution
    pub fn conversion_time_ms(&self) -> u16 {
        match self {
            Resolution::Bits9 => 94,
            Resolution::Bits10 => 188,
            Resolution::Bits11 => 375,
            Resolution::Bits12 => 750,
        }
    }
}

/// What to write into the alarm registers when changing the resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alarms {
    /// Read the scratchpad first and write back the thresholds found there
    #[default]
    Preserve,
    /// Overwrite the thresholds
    Set { high: i8, low: i8 },
}

pub(crate) fn family<E: Debug>(address: &Address) -> Result<DeviceFamily, Error<E>> {
    DeviceFamily::from_address(address).ok_or(Error::UnsupportedFamily(address.family_code()))
}

/// Starts a conversion on one device, or on all devices at once when `rom`
/// is `None`. On parasite power the strong pull-up stays on until the next
/// bus access.
pub fn convert<T: BitTransport>(
    bus: &mut OneWireBus<T>,
    rom: Option<&Address>,
) -> Result<(), Error<T::Error>> {
    bus.address(rom)?;
    bus.write_command_powered(Command::Convert)
}

/// Reads and CRC checks the scratchpad of a device
pub fn read_scratchpad<T: BitTransport>(
    bus: &mut OneWireBus<T>,
    rom: &Address,
) -> Result<Scratchpad, Error<T::Error>> {
    bus.select(rom)?;
    bus.write_byte(Command::ReadScratchpad.op_code())?;
    let mut raw = [0u8; Scratchpad::BYTES];
    bus.read_bytes(&mut raw)?;
    let scratchpad = Scratchpad::from(raw);
    if !scratchpad.is_crc_valid() {
        warn!("{}: scratchpad crc mismatch", rom);
        return Err(Error::CrcMismatch(crc8(&raw)));
    }
    Ok(scratchpad)
}

/// Writes TH, TL and the configuration register. The legacy family has no
/// configuration register and ignores the third byte.
pub fn write_scratchpad<T: BitTransport>(
    bus: &mut OneWireBus<T>,
    rom: &Address,
    data: [u8; 3],
) -> Result<(), Error<T::Error>> {
    bus.select(rom)?;
    bus.write_byte(Command::WriteScratchpad.op_code())?;
    bus.write_bytes_powered(&data)
}

/// Stores TH, TL and configuration in EEPROM. Takes up to 10ms, during which
/// parasite powered devices need the strong pull-up.
pub fn copy_scratchpad<T: BitTransport>(
    bus: &mut OneWireBus<T>,
    rom: Option<&Address>,
) -> Result<(), Error<T::Error>> {
    bus.address(rom)?;
    bus.write_command_powered(Command::CopyScratchpad)
}

/// Reloads TH, TL and configuration from EEPROM and waits for the devices to
/// finish
pub fn recall_eeprom<T: BitTransport>(
    bus: &mut OneWireBus<T>,
    rom: Option<&Address>,
) -> Result<(), Error<T::Error>> {
    bus.address(rom)?;
    bus.write_byte(Command::RecallE2.op_code())?;
    for _ in 0..RECALL_POLL_SLOTS {
        if !bus.is_busy()? {
            return Ok(());
        }
    }
    Err(Error::Timeout)
}

/// Asks whether any addressed device runs on parasite power and stores the
/// answer in the bus session
pub fn detect_power_mode<T: BitTransport>(
    bus: &mut OneWireBus<T>,
    rom: Option<&Address>,
) -> Result<PowerMode, Error<T::Error>> {
    bus.address(rom)?;
    bus.write_byte(Command::ReadPowerSupply.op_code())?;
    let mode = if bus.read_bit()? {
        PowerMode::External
    } else {
        PowerMode::Parasite
    };
    debug!("power mode: {:?}", mode);
    bus.set_power_mode(mode);
    Ok(mode)
}

/// Reads the scratchpad and decodes the last converted temperature
pub fn read_temperature<T: BitTransport>(
    bus: &mut OneWireBus<T>,
    rom: &Address,
) -> Result<Temperature, Error<T::Error>> {
    let family = family(rom)?;
    let scratchpad = read_scratchpad(bus, rom)?;
    Ok(decode_temperature(family, &scratchpad))
}

/// Like [`read_temperature`], but returns `Ok(None)` while a conversion
/// started right before is still running.
///
/// Parasite powered devices cannot signal busy while the strong pull-up feeds
/// them, so on such a bus this fails with [`Error::BusyPollUnavailable`] and
/// leaves the pull-up on. Wait the conversion time and use
/// [`read_temperature`] there.
pub fn read_temperature_async<T: BitTransport>(
    bus: &mut OneWireBus<T>,
    rom: &Address,
) -> Result<Option<Temperature>, Error<T::Error>> {
    if bus.power_mode() == PowerMode::Parasite {
        return Err(Error::BusyPollUnavailable);
    }
    if bus.is_busy()? {
        return Ok(None);
    }
    read_temperature(bus, rom).map(Some)
}

/// Resolution the device converts at. The legacy family always reports 9
/// bits, its extra precision comes from the count registers.
pub fn resolution<T: BitTransport>(
    bus: &mut OneWireBus<T>,
    rom: &Address,
) -> Result<Resolution, Error<T::Error>> {
    let family = family(rom)?;
    let scratchpad = read_scratchpad(bus, rom)?;
    Ok(match family {
        DeviceFamily::Legacy9Bit => Resolution::Bits9,
        DeviceFamily::Extended12Bit => Resolution::from_config_register(scratchpad.configuration()),
    })
}

/// Sets the conversion resolution to `bits` (9 to 12). The alarm thresholds
/// are handled according to `alarms`.
pub fn set_resolution<T: BitTransport>(
    bus: &mut OneWireBus<T>,
    rom: &Address,
    bits: u8,
    alarms: Alarms,
) -> Result<(), Error<T::Error>> {
    let resolution = Resolution::from_bits(bits).ok_or(Error::InvalidResolution(bits))?;
    if family(rom)? == DeviceFamily::Legacy9Bit {
        return Err(Error::UnsupportedFamily(rom.family_code()));
    }
    let (high, low) = match alarms {
        Alarms::Preserve => {
            let scratchpad = read_scratchpad(bus, rom)?;
            (scratchpad.alarm_high(), scratchpad.alarm_low())
        }
        Alarms::Set { high, low } => (high, low),
    };
    write_scratchpad(
        bus,
        rom,
        [high as u8, low as u8, resolution.to_config_register()],
    )
}

/// A temperature sensor on a shared bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ds18x20 {
    address: Address,
    family: DeviceFamily,
}

impl From<Ds18x20> for Address {
    fn from(device: Ds18x20) -> Self {
        device.address
    }
}

impl Ds18x20 {
    /// `None` for ROMs of other devices
    pub fn new(address: Address) -> Option<Self> {
        Some(Ds18x20 {
            family: DeviceFamily::from_address(&address)?,
            address,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// Starts a conversion on this device only
    pub fn convert<T: BitTransport>(&self, bus: &mut OneWireBus<T>) -> Result<(), Error<T::Error>> {
        convert(bus, Some(&self.address))
    }

    pub fn read_scratchpad<T: BitTransport>(
        &self,
        bus: &mut OneWireBus<T>,
    ) -> Result<Scratchpad, Error<T::Error>> {
        read_scratchpad(bus, &self.address)
    }

    pub fn write_scratchpad<T: BitTransport>(
        &self,
        bus: &mut OneWireBus<T>,
        data: [u8; 3],
    ) -> Result<(), Error<T::Error>> {
        write_scratchpad(bus, &self.address, data)
    }

    pub fn read_temperature<T: BitTransport>(
        &self,
        bus: &mut OneWireBus<T>,
    ) -> Result<Temperature, Error<T::Error>> {
        let scratchpad = read_scratchpad(bus, &self.address)?;
        Ok(decode_temperature(self.family, &scratchpad))
    }

    pub fn read_temperature_async<T: BitTransport>(
        &self,
        bus: &mut OneWireBus<T>,
    ) -> Result<Option<Temperature>, Error<T::Error>> {
        read_temperature_async(bus, &self.address)
    }

    pub fn resolution<T: BitTransport>(
        &self,
        bus: &mut OneWireBus<T>,
    ) -> Result<Resolution, Error<T::Error>> {
        resolution(bus, &self.address)
    }

    pub fn set_resolution<T: BitTransport>(
        &self,
        bus: &mut OneWireBus<T>,
        bits: u8,
        alarms: Alarms,
    ) -> Result<(), Error<T::Error>> {
        set_resolution(bus, &self.address, bits, alarms)
    }

    pub fn copy_scratchpad<T: BitTransport>(
        &self,
        bus: &mut OneWireBus<T>,
    ) -> Result<(), Error<T::Error>> {
        copy_scratchpad(bus, Some(&self.address))
    }

    pub fn recall_eeprom<T: BitTransport>(
        &self,
        bus: &mut OneWireBus<T>,
    ) -> Result<(), Error<T::Error>> {
        recall_eeprom(bus, Some(&self.address))
    }

    pub fn power_mode<T: BitTransport>(
        &self,
        bus: &mut OneWireBus<T>,
    ) -> Result<PowerMode, Error<T::Error>> {
        detect_power_mode(bus, Some(&self.address))
    }

    /// Time to wait after [`Ds18x20::convert`] at the given resolution
    pub fn conversion_time_ms(&self, resolution: Resolution) -> u16 {
        match self.family {
            DeviceFamily::Legacy9Bit => 750,
            DeviceFamily::Extended12Bit => resolution.conversion_time_ms(),
        }
    }
}
