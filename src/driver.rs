use crate::{BitTransport, DisableInterrupts, IoWire, SlotTiming};
use embedded_hal::delay::DelayNs;

/// Bit-banged 1-Wire master on a single open-drain GPIO
pub struct Driver<W: IoWire, D: DelayNs> {
    io_wire: W,
    delay: D,
    timing: SlotTiming,
}

impl<W: IoWire, D: DelayNs> Driver<W, D> {
    pub fn new(io_wire: W, delay: D) -> Self {
        Driver {
            io_wire,
            delay,
            timing: SlotTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: SlotTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn timing(&self) -> &SlotTiming {
        &self.timing
    }

    pub fn release(self) -> (W, D) {
        (self.io_wire, self.delay)
    }

    #[inline(always)]
    pub(crate) fn set_high(&mut self) -> Result<(), W::Error> {
        self.io_wire.set_high()
    }

    #[inline(always)]
    pub(crate) fn set_low(&mut self) -> Result<(), W::Error> {
        self.io_wire.set_low()
    }

    #[inline(always)]
    pub(crate) fn set_level(&mut self, high: bool) -> Result<(), W::Error> {
        if high {
            self.set_high()
        } else {
            self.set_low()
        }
    }

    #[inline(always)]
    pub(crate) fn is_high(&mut self) -> Result<bool, W::Error> {
        self.io_wire.is_high()
    }

    #[inline(always)]
    pub(crate) fn is_low(&mut self) -> Result<bool, W::Error> {
        self.io_wire.is_low()
    }
}

impl<W: IoWire, D: DelayNs> BitTransport for Driver<W, D> {
    type Error = W::Error;

    /// Performs a reset and listens for a presence pulse.
    /// Returns Ok(true) if at least one device pulled the line low after
    /// the reset pulse, Ok(false) if the bus stayed high.
    fn reset(&mut self) -> Result<bool, W::Error> {
        let timing = self.timing;
        self.set_low()?;
        self.delay.delay_us(timing.reset_low_us);

        let cli = DisableInterrupts::new();
        self.set_high()?;
        self.delay.delay_us(timing.presence_sample_us);
        let presence = self.is_low()?;
        drop(cli);

        self.delay.delay_us(timing.reset_recovery_us);
        Ok(presence)
    }

    fn read_bit(&mut self) -> Result<bool, W::Error> {
        let timing = self.timing;
        // some devices miss the slot unless the line is released beforehand
        self.set_high()?;

        let cli = DisableInterrupts::new();
        self.set_low()?;
        self.delay.delay_us(timing.read_low_us);
        self.set_high()?;
        self.delay.delay_us(timing.read_sample_us);
        let value = self.is_high()?;
        drop(cli);

        self.delay.delay_us(timing.read_recovery_us);
        Ok(value)
    }

    fn write_bit(&mut self, high: bool) -> Result<(), W::Error> {
        let timing = self.timing;
        let cli = DisableInterrupts::new();
        self.set_low()?;
        self.set_level(high)?;
        self.delay.delay_us(timing.write_slot_us);
        self.set_high()?;
        drop(cli);

        self.delay.delay_us(timing.write_recovery_us);
        Ok(())
    }

    fn strong_pullup(&mut self, enable: bool) -> Result<(), W::Error> {
        self.io_wire.set_strong_pullup(enable)
    }
}

#[cfg(test)]
mod tests {
    use super::Driver;
    use crate::BitTransport;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    fn read_slot(level: State) -> [Transaction; 4] {
        [
            Transaction::set(State::High),
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::get(level),
        ]
    }

    fn level(bit: bool) -> State {
        if bit {
            State::High
        } else {
            State::Low
        }
    }

    fn write_slot(level: State) -> [Transaction; 3] {
        [
            Transaction::set(State::Low),
            Transaction::set(level),
            Transaction::set(State::High),
        ]
    }

    #[test]
    fn reset_detects_presence() {
        let expectations = [
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::get(State::Low), // presence pulse
        ];
        let mut pin = PinMock::new(&expectations);
        let mut driver = Driver::new((pin.clone(),), NoopDelay::new());

        assert!(driver.reset().unwrap());

        pin.done();
    }

    #[test]
    fn reset_without_presence() {
        let expectations = [
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::get(State::High),
        ];
        let mut pin = PinMock::new(&expectations);
        let mut driver = Driver::new((pin.clone(),), NoopDelay::new());

        assert!(!driver.reset().unwrap());

        pin.done();
    }

    #[test]
    fn read_bit_samples_after_release() {
        let one = read_slot(State::High);
        let zero = read_slot(State::Low);
        let mut pin = PinMock::new(one.iter().chain(zero.iter()));
        let mut driver = Driver::new((pin.clone(),), NoopDelay::new());

        assert!(driver.read_bit().unwrap());
        assert!(!driver.read_bit().unwrap());

        pin.done();
    }

    #[test]
    fn write_bit_holds_level_for_the_slot() {
        let one = write_slot(State::High);
        let zero = write_slot(State::Low);
        let mut pin = PinMock::new(one.iter().chain(zero.iter()));
        let mut driver = Driver::new((pin.clone(),), NoopDelay::new());

        driver.write_bit(true).unwrap();
        driver.write_bit(false).unwrap();

        pin.done();
    }

    #[test]
    fn write_byte_sends_lsb_first() {
        // 0xCC = 0b1100_1100
        let bits = [false, false, true, true, false, false, true, true];
        let expectations: [Transaction; 24] =
            core::array::from_fn(|i| write_slot(level(bits[i / 3]))[i % 3].clone());
        let mut pin = PinMock::new(&expectations);
        let mut driver = Driver::new((pin.clone(),), NoopDelay::new());

        driver.write_byte(0xCC).unwrap();

        pin.done();
    }

    #[test]
    fn read_byte_assembles_lsb_first() {
        // 0x28 = 0b0010_1000
        let bits = [false, false, false, true, false, true, false, false];
        let expectations: [Transaction; 32] =
            core::array::from_fn(|i| read_slot(level(bits[i / 4]))[i % 4].clone());
        let mut pin = PinMock::new(&expectations);
        let mut driver = Driver::new((pin.clone(),), NoopDelay::new());

        assert_eq!(driver.read_byte().unwrap(), 0x28);

        pin.done();
    }
}
