#![allow(dead_code)]

use onewire_ds18x20::temperature::DeviceFamily;
use onewire_ds18x20::{crc8, Address, BitTransport};
use std::collections::VecDeque;
use std::convert::Infallible;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds a ROM with a valid CRC
pub fn rom(family: u8, serial: [u8; 6]) -> Address {
    let mut raw = [0u8; 8];
    raw[0] = family;
    raw[1..7].copy_from_slice(&serial);
    raw[7] = crc8(&raw[..7]);
    Address::from(raw)
}

/// Sets the CRC byte of a scratchpad
pub fn seal(scratchpad: &mut [u8; 9]) {
    scratchpad[8] = crc8(&scratchpad[..8]);
}

/// A temperature sensor answering on the simulated bus
#[derive(Debug, Clone)]
pub struct SimDevice {
    pub rom: Address,
    pub scratchpad: [u8; 9],
    pub eeprom: [u8; 3],
    pub parasite: bool,
    /// Temperature register loaded by the next conversion
    pub reading: [u8; 2],
    /// COUNT REMAIN and COUNT PER °C loaded by the next conversion
    pub counts: (u8, u8),
    /// Read slots a conversion keeps the line low
    pub conversion_slots: usize,
    /// Flip a bit of the CRC byte on every scratchpad read
    pub corrupt_reads: bool,
    pub conversions: usize,
    active: bool,
    busy: usize,
}

impl SimDevice {
    pub fn new(rom: Address) -> Self {
        let legacy = DeviceFamily::from_address(&rom) == Some(DeviceFamily::Legacy9Bit);
        // power-on contents: 85°C, TH 75, TL 70, 12 bit
        let mut scratchpad = if legacy {
            [0xAA, 0x00, 0x4B, 0x46, 0xFF, 0xFF, 0x0C, 0x10, 0x00]
        } else {
            [0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x00]
        };
        seal(&mut scratchpad);
        SimDevice {
            rom,
            eeprom: [scratchpad[2], scratchpad[3], scratchpad[4]],
            scratchpad,
            parasite: false,
            reading: [scratchpad[0], scratchpad[1]],
            counts: (0x0C, 0x10),
            conversion_slots: 0,
            corrupt_reads: false,
            conversions: 0,
            active: false,
            busy: 0,
        }
    }

    pub fn with_reading(mut self, lsb: u8, msb: u8) -> Self {
        self.reading = [lsb, msb];
        self
    }

    pub fn with_counts(mut self, count_remain: u8, count_per_degree: u8) -> Self {
        self.counts = (count_remain, count_per_degree);
        self
    }

    pub fn with_conversion_slots(mut self, slots: usize) -> Self {
        self.conversion_slots = slots;
        self
    }

    pub fn parasite(mut self) -> Self {
        self.parasite = true;
        self
    }

    pub fn corrupted(mut self) -> Self {
        self.corrupt_reads = true;
        self
    }

    fn is_legacy(&self) -> bool {
        DeviceFamily::from_address(&self.rom) == Some(DeviceFamily::Legacy9Bit)
    }

    fn rom_bit(&self, bit: usize) -> bool {
        self.rom[bit / 8] & (1 << (bit % 8)) != 0
    }

    fn convert(&mut self) {
        self.scratchpad[0] = self.reading[0];
        self.scratchpad[1] = self.reading[1];
        if self.is_legacy() {
            self.scratchpad[6] = self.counts.0;
            self.scratchpad[7] = self.counts.1;
        }
        seal(&mut self.scratchpad);
        self.busy = self.conversion_slots;
        self.conversions += 1;
    }

    fn write_scratchpad(&mut self, index: usize, byte: u8) {
        let writable = if self.is_legacy() { 2 } else { 3 };
        if index >= writable {
            return;
        }
        self.scratchpad[2 + index] = if index == 2 {
            (byte & 0x60) | 0x1F
        } else {
            byte
        };
        seal(&mut self.scratchpad);
    }

    fn scratchpad_out(&self) -> [u8; 9] {
        let mut out = self.scratchpad;
        if self.corrupt_reads {
            out[8] ^= 0x01;
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    RomCommand,
    Search { bit: usize, reads: u8 },
    MatchRom(Vec<u8>),
    Function,
    WriteScratchpad(usize),
}

/// Bus simulator: every device sees every slot, and the line reads as the
/// AND of what the selected devices drive
pub struct SimBus {
    pub devices: Vec<SimDevice>,
    /// Makes both search reads come back high at this bit index (0..64)
    pub collision_at: Option<usize>,
    /// Every strong pull-up switch, in order
    pub pullup_log: Vec<bool>,
    /// Slots run while the strong pull-up was on
    pub slots_with_pullup: usize,
    pub resets: usize,
    /// Function commands received, in order
    pub function_log: Vec<u8>,
    phase: Phase,
    output: VecDeque<bool>,
    bit_buf: u8,
    bit_count: u8,
    pullup_on: bool,
}

impl SimBus {
    pub fn new(devices: Vec<SimDevice>) -> Self {
        SimBus {
            devices,
            collision_at: None,
            pullup_log: Vec::new(),
            slots_with_pullup: 0,
            resets: 0,
            function_log: Vec::new(),
            phase: Phase::Idle,
            output: VecDeque::new(),
            bit_buf: 0,
            bit_count: 0,
            pullup_on: false,
        }
    }

    pub fn device(&self, rom: &Address) -> &SimDevice {
        self.devices
            .iter()
            .find(|d| d.rom == *rom)
            .expect("no such simulated device")
    }

    fn slot(&mut self) {
        if self.pullup_on {
            self.slots_with_pullup += 1;
        }
    }

    fn active(&mut self) -> impl Iterator<Item = &mut SimDevice> {
        self.devices.iter_mut().filter(|d| d.active)
    }

    fn queue_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            for bit in 0..8 {
                self.output.push_back(byte & (1 << bit) != 0);
            }
        }
    }

    fn wired_and<const N: usize>(&self, bytes: impl Fn(&SimDevice) -> [u8; N]) -> [u8; N] {
        self.devices
            .iter()
            .filter(|d| d.active)
            .fold([0xFF; N], |mut acc, d| {
                for (a, b) in acc.iter_mut().zip(bytes(d)) {
                    *a &= b;
                }
                acc
            })
    }

    fn handle_byte(&mut self, byte: u8) {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::RomCommand => match byte {
                0xF0 => self.phase = Phase::Search { bit: 0, reads: 0 },
                0x55 => self.phase = Phase::MatchRom(Vec::new()),
                0xCC => self.phase = Phase::Function,
                0x33 => {
                    let rom = self.wired_and(|d| <[u8; 8]>::from(d.rom));
                    self.queue_bytes(&rom);
                }
                _ => {}
            },
            Phase::MatchRom(mut received) => {
                received.push(byte);
                if received.len() == 8 {
                    for device in self.devices.iter_mut() {
                        device.active = device.active && device.rom.as_ref() == received.as_slice();
                    }
                    self.phase = Phase::Function;
                } else {
                    self.phase = Phase::MatchRom(received);
                }
            }
            Phase::Function => {
                self.function_log.push(byte);
                match byte {
                    0x44 => self.active().for_each(|d| d.convert()),
                    0xBE => {
                        let scratchpad = self.wired_and(|d| d.scratchpad_out());
                        self.queue_bytes(&scratchpad);
                    }
                    0x4E => self.phase = Phase::WriteScratchpad(0),
                    0x48 => self.active().for_each(|d| {
                        d.eeprom = [d.scratchpad[2], d.scratchpad[3], d.scratchpad[4]];
                    }),
                    0xB8 => self.active().for_each(|d| {
                        let eeprom = d.eeprom;
                        d.scratchpad[2..5].copy_from_slice(&eeprom);
                        seal(&mut d.scratchpad);
                        d.busy = 2;
                    }),
                    0xB4 => {
                        let parasite = self.devices.iter().any(|d| d.active && d.parasite);
                        self.output.push_back(!parasite);
                    }
                    _ => {}
                }
            }
            Phase::WriteScratchpad(index) => {
                self.active().for_each(|d| d.write_scratchpad(index, byte));
                self.phase = Phase::WriteScratchpad(index + 1);
            }
            other => self.phase = other,
        }
    }
}

impl BitTransport for SimBus {
    type Error = Infallible;

    fn reset(&mut self) -> Result<bool, Infallible> {
        self.slot();
        self.resets += 1;
        self.output.clear();
        self.bit_buf = 0;
        self.bit_count = 0;
        for device in self.devices.iter_mut() {
            device.active = true;
        }
        self.phase = Phase::RomCommand;
        Ok(!self.devices.is_empty())
    }

    fn read_bit(&mut self) -> Result<bool, Infallible> {
        self.slot();
        if let Phase::Search { bit, reads } = self.phase {
            if reads >= 2 {
                return Ok(true);
            }
            self.phase = Phase::Search {
                bit,
                reads: reads + 1,
            };
            if self.collision_at == Some(bit) {
                return Ok(true);
            }
            let complement = reads == 1;
            let level = self
                .devices
                .iter()
                .filter(|d| d.active)
                .all(|d| d.rom_bit(bit) != complement);
            return Ok(level);
        }
        if let Some(bit) = self.output.pop_front() {
            return Ok(bit);
        }
        let mut busy = false;
        for device in self.active() {
            if device.busy > 0 {
                device.busy -= 1;
                busy = true;
            }
        }
        Ok(!busy)
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), Infallible> {
        self.slot();
        if let Phase::Search { bit: index, .. } = self.phase {
            for device in self.devices.iter_mut() {
                device.active = device.active && device.rom_bit(index) == bit;
            }
            self.phase = if index + 1 == Address::BITS as usize {
                Phase::Idle
            } else {
                Phase::Search {
                    bit: index + 1,
                    reads: 0,
                }
            };
            return Ok(());
        }
        if bit {
            self.bit_buf |= 1 << self.bit_count;
        }
        self.bit_count += 1;
        if self.bit_count == 8 {
            let byte = self.bit_buf;
            self.bit_buf = 0;
            self.bit_count = 0;
            self.handle_byte(byte);
        }
        Ok(())
    }

    fn strong_pullup(&mut self, enable: bool) -> Result<(), Infallible> {
        self.pullup_on = enable;
        self.pullup_log.push(enable);
        Ok(())
    }
}
