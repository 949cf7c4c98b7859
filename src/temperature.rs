//! Decoding DS18x20 scratchpad contents into temperatures.

use crate::{check_crc8, crc8, Address};
use byteorder::{ByteOrder, LittleEndian};
use core::ops::Deref;

/// Temperature sensor families, picked by the first ROM byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFamily {
    /// DS18S20 and DS1820: 9-bit reading extended by the count registers
    Legacy9Bit,
    /// DS18B20 and DS1822: 12-bit two's complement reading
    Extended12Bit,
}

impl DeviceFamily {
    pub const DS18S20: u8 = 0x10;
    pub const DS1822: u8 = 0x22;
    pub const DS18B20: u8 = 0x28;

    pub fn from_code(family_code: u8) -> Option<Self> {
        match family_code {
            Self::DS18S20 => Some(DeviceFamily::Legacy9Bit),
            Self::DS1822 | Self::DS18B20 => Some(DeviceFamily::Extended12Bit),
            _ => None,
        }
    }

    pub fn from_address(address: &Address) -> Option<Self> {
        Self::from_code(address.family_code())
    }
}

/// The 9 bytes read from a sensor.
///
/// | Byte | Content |
/// |------|---------|
/// | 0 | temperature LSB |
/// | 1 | temperature MSB |
/// | 2 | TH alarm register |
/// | 3 | TL alarm register |
/// | 4 | configuration (12-bit family), reserved otherwise |
/// | 5 | reserved |
/// | 6 | reserved / COUNT REMAIN (legacy family) |
/// | 7 | reserved / COUNT PER °C (legacy family) |
/// | 8 | CRC8 of bytes 0 to 7 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scratchpad([u8; Scratchpad::BYTES]);

impl Scratchpad {
    pub const BYTES: usize = 9;

    /// Builds a scratchpad from its first 8 bytes, appending the CRC
    pub fn with_crc(data: [u8; 8]) -> Self {
        let mut raw = [0; Self::BYTES];
        raw[..8].copy_from_slice(&data);
        raw[8] = crc8(&data);
        Scratchpad(raw)
    }

    pub fn temperature_lsb(&self) -> u8 {
        self.0[0]
    }

    pub fn temperature_msb(&self) -> u8 {
        self.0[1]
    }

    pub fn alarm_high(&self) -> i8 {
        self.0[2] as i8
    }

    pub fn alarm_low(&self) -> i8 {
        self.0[3] as i8
    }

    pub fn configuration(&self) -> u8 {
        self.0[4]
    }

    pub fn count_remain(&self) -> u8 {
        self.0[6]
    }

    pub fn count_per_degree(&self) -> u8 {
        self.0[7]
    }

    pub fn crc8(&self) -> u8 {
        self.0[8]
    }

    pub fn is_crc_valid(&self) -> bool {
        check_crc8(&self.0)
    }

    /// Raw temperature register as a signed value
    pub fn raw_temperature(&self) -> i16 {
        LittleEndian::read_i16(&self.0[0..2])
    }
}

impl From<[u8; Scratchpad::BYTES]> for Scratchpad {
    fn from(raw: [u8; Scratchpad::BYTES]) -> Self {
        Scratchpad(raw)
    }
}

impl From<Scratchpad> for [u8; Scratchpad::BYTES] {
    fn from(scratchpad: Scratchpad) -> Self {
        scratchpad.0
    }
}

impl Deref for Scratchpad {
    type Target = [u8; Scratchpad::BYTES];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Scratchpad {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A decoded reading in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Temperature(f32);

impl Temperature {
    pub fn from_celsius(celsius: f32) -> Self {
        Temperature(celsius)
    }

    /// Decodes the temperature register of a scratchpad
    pub fn decode(family: DeviceFamily, scratchpad: &Scratchpad) -> Self {
        decode_temperature(family, scratchpad)
    }

    pub fn celsius(&self) -> f32 {
        self.0
    }

    pub fn fahrenheit(&self) -> f32 {
        self.0 * 9.0 / 5.0 + 32.0
    }

    pub fn kelvin(&self) -> f32 {
        self.0 + 273.15
    }

    /// Hundredths of a degree Celsius, truncated toward zero like
    /// [`decode_centi_celsius`]
    pub fn centi_celsius(&self) -> i32 {
        (self.0 * 100.0) as i32
    }
}

/// Integer part of a legacy reading, half degree bit dropped
fn legacy_whole_degrees(scratchpad: &Scratchpad) -> i32 {
    let lsb = scratchpad.temperature_lsb();
    if scratchpad.temperature_msb() != 0 {
        // sign extend the 8 bit value left after dropping bit 0
        ((lsb >> 1) | 0x80) as i8 as i32
    } else {
        (lsb >> 1) as i32
    }
}

/// Decodes a scratchpad into degrees Celsius.
///
/// The legacy family applies the datasheet's extended resolution formula
/// `whole - 0.25 + (COUNT_PER_C - COUNT_REMAIN) / COUNT_PER_C`. A zero count
/// per degree only shows up on a corrupted read, and falls back to the plain
/// half degree reading.
pub fn decode_temperature(family: DeviceFamily, scratchpad: &Scratchpad) -> Temperature {
    match family {
        DeviceFamily::Legacy9Bit => {
            let per_degree = scratchpad.count_per_degree();
            if per_degree == 0 {
                return Temperature(scratchpad.raw_temperature() as f32 / 2.0);
            }
            let whole = legacy_whole_degrees(scratchpad) as f32;
            let counted = per_degree as f32 - scratchpad.count_remain() as f32;
            Temperature(whole - 0.25 + counted / per_degree as f32)
        }
        DeviceFamily::Extended12Bit => Temperature(scratchpad.raw_temperature() as f32 / 16.0),
    }
}

/// Integer variant of [`decode_temperature`], in hundredths of a degree
/// Celsius. Divisions truncate toward zero, so results may sit one hundredth
/// closer to zero than the float decode.
pub fn decode_centi_celsius(family: DeviceFamily, scratchpad: &Scratchpad) -> i32 {
    match family {
        DeviceFamily::Legacy9Bit => {
            let per_degree = scratchpad.count_per_degree() as i32;
            if per_degree == 0 {
                return scratchpad.raw_temperature() as i32 * 100 / 2;
            }
            let counted = per_degree - scratchpad.count_remain() as i32;
            legacy_whole_degrees(scratchpad) * 100 - 25 + counted * 100 / per_degree
        }
        DeviceFamily::Extended12Bit => scratchpad.raw_temperature() as i32 * 100 / 16,
    }
}

/// Converts a reading to Fahrenheit, a missing reading stays missing
pub fn fahrenheit(celsius: Option<f32>) -> Option<f32> {
    celsius.map(|c| c * 9.0 / 5.0 + 32.0)
}

/// Converts a reading to Kelvin, a missing reading stays missing
pub fn kelvin(celsius: Option<f32>) -> Option<f32> {
    celsius.map(|c| c + 273.15)
}
