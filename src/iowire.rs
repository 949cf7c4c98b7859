use embedded_hal::digital::{Error, ErrorType, InputPin, OutputPin};

pub trait IoWire {
    type Error: Error;

    /// Is the input pin high?
    fn is_high(&mut self) -> Result<bool, Self::Error>;

    /// Is the input pin low?
    fn is_low(&mut self) -> Result<bool, Self::Error>;

    /// Drives the line low
    ///
    /// *NOTE* the actual electrical state of the pin may not actually be low, e.g. due to external
    /// electrical sources
    fn set_low(&mut self) -> Result<(), Self::Error>;

    /// Releases the open-drain line, letting the pull-up take it high
    ///
    /// *NOTE* the actual electrical state of the pin may not actually be high, e.g. a device
    /// holding the line low
    fn set_high(&mut self) -> Result<(), Self::Error>;

    /// Switches the strong pull-up used to power parasite devices.
    ///
    /// Wires without a dedicated pull-up transistor ignore this.
    fn set_strong_pullup(&mut self, _enable: bool) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Single open-drain line config wrapper
impl<IO> IoWire for (IO,)
where
    IO: ErrorType + OutputPin + InputPin,
{
    type Error = IO::Error;

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }
}

/// Dual line config wrapper
impl<E, I, O> IoWire for (I, O)
where
    E: Error,
    I: ErrorType<Error = E> + InputPin,
    O: ErrorType<Error = E> + OutputPin,
{
    type Error = E;

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.1.set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.1.set_high()
    }
}

/// Data wire with an extra output driving a strong pull-up transistor
///
/// The pull-up pin is driven high while enabled. It must be switched off before the next slot,
/// which [`OneWireBus`](crate::OneWireBus) takes care of.
pub struct StrongPullup<W, P> {
    wire: W,
    pin: P,
}

impl<W, P> StrongPullup<W, P> {
    pub fn new(wire: W, pin: P) -> Self {
        StrongPullup { wire, pin }
    }

    pub fn release(self) -> (W, P) {
        (self.wire, self.pin)
    }
}

impl<W, P> IoWire for StrongPullup<W, P>
where
    W: IoWire,
    P: OutputPin<Error = W::Error>,
{
    type Error = W::Error;

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.wire.is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.wire.is_low()
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.wire.set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.wire.set_high()
    }

    fn set_strong_pullup(&mut self, enable: bool) -> Result<(), Self::Error> {
        if enable {
            self.wire.set_high()?;
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }
}

/// Inverted wire wrapper
pub struct Inverted<P>(pub P);

impl<I: ErrorType> ErrorType for Inverted<I> {
    type Error = I::Error;
}

impl<I> InputPin for Inverted<I>
where
    I: InputPin,
{
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }
}

impl<O> OutputPin for Inverted<O>
where
    O: OutputPin,
{
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }
}
