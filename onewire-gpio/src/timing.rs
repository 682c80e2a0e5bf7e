/// Slot timing of the bit primitives, in microseconds.
///
/// Every primitive is a fixed sequence of "drive low / release / sample" steps
/// separated by these delays. [`Timing::STANDARD`] holds the standard speed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Interval between two idle checks before a reset.
    pub idle_poll_us: u32,
    /// Length of the reset pulse.
    pub reset_low_us: u32,
    /// Wait between releasing the reset pulse and sampling for presence.
    pub presence_sample_us: u32,
    /// Remainder of the reset slot after sampling presence.
    pub reset_recovery_us: u32,
    /// Low time of a write-1 slot.
    pub write_one_low_us: u32,
    /// Remainder of a write-1 slot.
    pub write_one_recovery_us: u32,
    /// Low time of a write-0 slot.
    pub write_zero_low_us: u32,
    /// Remainder of a write-0 slot.
    pub write_zero_recovery_us: u32,
    /// Low time starting a read slot.
    pub read_init_us: u32,
    /// Wait between releasing the line and sampling the bit.
    pub read_sample_us: u32,
    /// Remainder of a read slot after sampling.
    pub read_recovery_us: u32,
}

impl Timing {
    /// Standard speed timing (~70 µs bit slots).
    pub const STANDARD: Timing = Timing {
        idle_poll_us: 2,
        reset_low_us: 480,
        presence_sample_us: 70,
        reset_recovery_us: 410,
        write_one_low_us: 6,
        write_one_recovery_us: 64,
        write_zero_low_us: 60,
        write_zero_recovery_us: 10,
        read_init_us: 6,
        read_sample_us: 9,
        read_recovery_us: 55,
    };
}

impl Default for Timing {
    fn default() -> Self {
        Self::STANDARD
    }
}
