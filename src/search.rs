use crate::{Address, BitTransport, Command, Error, OneWireBus, OpCode};
use log::{trace, warn};

/// Discrepancy value before the first pass, above every bit position
const SEARCH_START: u8 = Address::BITS + 1;

/// State of a ROM search carried from one pass to the next.
///
/// Every pass walks the 64 ROM bits while all remaining devices answer in
/// lock-step. Where devices disagree the pass takes the 1 branch unless it
/// reached the position where the previous pass took 1 last, in which case
/// it takes 0. The lowest position where 1 was taken becomes the
/// discrepancy steering the next pass, and a pass that never took 1 over a
/// conflict ends the search. For a fixed set of devices the passes, and so
/// the order of the ROMs found, are always the same.
#[derive(Debug, Clone)]
pub struct RomSearch {
    last_rom: Address,
    last_discrepancy: u8,
    finished: bool,
    check_crc: bool,
}

impl Default for RomSearch {
    fn default() -> Self {
        RomSearch {
            last_rom: Address::default(),
            last_discrepancy: SEARCH_START,
            finished: false,
            check_crc: false,
        }
    }
}

impl RomSearch {
    pub fn new() -> RomSearch {
        RomSearch::default()
    }

    /// Fails the pass with [`Error::CrcMismatch`] when a discovered ROM does
    /// not carry a valid CRC8
    pub fn with_crc_check(mut self, check_crc: bool) -> Self {
        self.check_crc = check_crc;
        self
    }

    /// ROM found by the last pass, all zero before the first one
    pub fn last_rom(&self) -> &Address {
        &self.last_rom
    }

    /// Bit position (64 down to 1) the next pass will branch at, 0 once the
    /// last device was found
    pub fn last_discrepancy(&self) -> u8 {
        self.last_discrepancy
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Runs one pass of the search. Returns `Ok(None)` once every device was
    /// found or no device answered the reset.
    pub(crate) fn step<T: BitTransport>(
        &mut self,
        transport: &mut T,
    ) -> Result<Option<Address>, Error<T::Error>> {
        if self.finished {
            return Ok(None);
        }

        if !transport.reset()? {
            self.finished = true;
            return Ok(None);
        }
        transport.write_byte(Command::SearchRom.op_code())?;

        let mut rom = Address::default();
        let mut next_discrepancy = 0;
        let mut position = Address::BITS;

        for byte in 0..Address::BYTES as usize {
            for bit in 0..8 {
                let mask = 1 << bit;
                let id_bit = transport.read_bit()?;
                let comp_bit = transport.read_bit()?;

                let chosen = match (id_bit, comp_bit) {
                    (true, true) => {
                        warn!("search: no device answered bit {}", position);
                        self.finished = true;
                        return Err(Error::CollisionFault(position));
                    }
                    (false, false) => {
                        let previous = self.last_rom[byte] & mask != 0;
                        if self.last_discrepancy > position
                            || (previous && self.last_discrepancy != position)
                        {
                            next_discrepancy = position;
                            true
                        } else {
                            false
                        }
                    }
                    (agreed, _) => agreed,
                };

                transport.write_bit(chosen)?;
                if chosen {
                    rom[byte] |= mask;
                }
                position -= 1;
            }
        }

        self.last_rom = rom;
        self.last_discrepancy = next_discrepancy;
        self.finished = next_discrepancy == 0;
        trace!("search: found {} (discrepancy {})", rom, next_discrepancy);

        if self.check_crc && !rom.is_crc_valid() {
            warn!("search: {} fails its crc", rom);
            self.finished = true;
            return Err(Error::CrcMismatch(crate::crc8(rom.as_ref())));
        }
        Ok(Some(rom))
    }

    pub fn into_iter<T: BitTransport>(self, bus: &mut OneWireBus<T>) -> DeviceSearchIter<'_, T> {
        DeviceSearchIter {
            search: Some(self),
            bus,
        }
    }
}

/// Yields one ROM per search pass. Stops after the first error.
pub struct DeviceSearchIter<'a, T: BitTransport> {
    search: Option<RomSearch>,
    bus: &'a mut OneWireBus<T>,
}

impl<T: BitTransport> Iterator for DeviceSearchIter<'_, T> {
    type Item = Result<Address, Error<T::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut search = self.search.take()?;
        let result = self.bus.search_next(&mut search).transpose()?;
        if result.is_ok() {
            self.search = Some(search);
        }
        Some(result)
    }
}
