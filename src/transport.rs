use core::fmt::Debug;

/// The four primitive slots of a 1-Wire master.
///
/// [`Driver`](crate::Driver) implements this by bit-banging a GPIO. Bridge
/// chips or simulated buses can implement it to reuse the search and device
/// logic on top.
pub trait BitTransport {
    type Error: Debug;

    /// Sends a reset pulse and returns whether any device answered with a
    /// presence pulse
    fn reset(&mut self) -> Result<bool, Self::Error>;

    fn read_bit(&mut self) -> Result<bool, Self::Error>;

    fn write_bit(&mut self, bit: bool) -> Result<(), Self::Error>;

    /// Switches the strong pull-up powering parasite devices, if there is one
    fn strong_pullup(&mut self, _enable: bool) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Reads a byte, least significant bit first
    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut byte = 0_u8;
        for _ in 0..8 {
            byte >>= 1;
            if self.read_bit()? {
                byte |= 0x80;
            }
        }
        Ok(byte)
    }

    /// Writes a byte, least significant bit first
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        let mut byte = byte;
        for _ in 0..8 {
            self.write_bit((byte & 0x01) == 0x01)?;
            byte >>= 1;
        }
        Ok(())
    }

    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<(), Self::Error> {
        for d in dst {
            *d = self.read_byte()?;
        }
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for b in bytes {
            self.write_byte(*b)?;
        }
        Ok(())
    }
}
