/// Durations, in microseconds, of the phases of the standard speed slots.
///
/// The defaults sit inside the tolerances of every DS18x20 datasheet. Only
/// adjust them to compensate for slow GPIO on a particular target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTiming {
    /// Reset pulse, line held low
    pub reset_low_us: u32,
    /// Release to presence sample
    pub presence_sample_us: u32,
    /// Presence sample to end of the reset slot
    pub reset_recovery_us: u32,
    /// Low pulse opening a read slot
    pub read_low_us: u32,
    /// Release to sample of a read slot
    pub read_sample_us: u32,
    /// Sample to start of the next slot
    pub read_recovery_us: u32,
    /// Length of a write slot
    pub write_slot_us: u32,
    /// Gap after a write slot
    pub write_recovery_us: u32,
}

impl Default for SlotTiming {
    fn default() -> Self {
        SlotTiming {
            reset_low_us: 480,
            presence_sample_us: 60,
            reset_recovery_us: 420,
            read_low_us: 2,
            read_sample_us: 6,
            read_recovery_us: 40,
            write_slot_us: 60,
            write_recovery_us: 2,
        }
    }
}

impl SlotTiming {
    /// Total length of a read slot
    pub fn read_slot_us(&self) -> u32 {
        self.read_low_us + self.read_sample_us + self.read_recovery_us
    }
}
