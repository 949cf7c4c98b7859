use crate::ds18x20::{Alarms, Ds18x20, Resolution};
use crate::temperature::Temperature;
use crate::{BitTransport, Error, OneWireBus};
use log::debug;

/// Convenience handle for a bus with exactly one temperature sensor
pub struct Ds18x20Single<'a, T: BitTransport> {
    bus: &'a mut OneWireBus<T>,
    device: Ds18x20,
}

impl<'a, T: BitTransport> Ds18x20Single<'a, T> {
    /// Searches the bus and keeps the only DS18x20 on it. Fails with
    /// [`Error::NotSingleDevice`] when there is none or more than one.
    pub fn new(bus: &'a mut OneWireBus<T>) -> Result<Self, Error<T::Error>> {
        let mut found = None;
        let mut count = 0;
        for address in bus.devices() {
            if let Some(device) = Ds18x20::new(address?) {
                count += 1;
                found.get_or_insert(device);
            }
        }
        match found {
            Some(device) if count == 1 => {
                debug!("single sensor {}", device.address());
                Ok(Ds18x20Single { bus, device })
            }
            _ => Err(Error::NotSingleDevice(count)),
        }
    }

    pub fn device(&self) -> &Ds18x20 {
        &self.device
    }

    pub fn bus(&mut self) -> &mut OneWireBus<T> {
        &mut *self.bus
    }

    pub fn convert(&mut self) -> Result<(), Error<T::Error>> {
        self.device.convert(self.bus)
    }

    pub fn read_temperature(&mut self) -> Result<Temperature, Error<T::Error>> {
        self.device.read_temperature(self.bus)
    }

    pub fn read_temperature_async(&mut self) -> Result<Option<Temperature>, Error<T::Error>> {
        self.device.read_temperature_async(self.bus)
    }

    pub fn resolution(&mut self) -> Result<Resolution, Error<T::Error>> {
        self.device.resolution(self.bus)
    }

    pub fn set_resolution(&mut self, bits: u8, alarms: Alarms) -> Result<(), Error<T::Error>> {
        self.device.set_resolution(self.bus, bits, alarms)
    }
}
