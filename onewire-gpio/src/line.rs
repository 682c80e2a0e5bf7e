use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// The single open-drain 1-Wire signal line.
///
/// The line is only ever driven low; releasing it lets the external pull-up
/// (or any device still holding it low) decide the level.
pub trait BusLine {
    /// Error reported by the pin driver.
    type Error;

    /// Actively pull the line low.
    fn drive_low(&mut self) -> Result<(), Self::Error>;

    /// Stop driving the line (high impedance).
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Current level of the line, `true` for high.
    fn sample(&mut self) -> Result<bool, Self::Error>;
}

/// Any open-drain GPIO: `set_low` pulls the line, `set_high` releases it,
/// and the input buffer reads the actual bus level.
impl<P: OutputPin + InputPin> BusLine for P {
    type Error = <P as ErrorType>::Error;

    fn drive_low(&mut self) -> Result<(), Self::Error> {
        self.set_low()
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.set_high()
    }

    fn sample(&mut self) -> Result<bool, Self::Error> {
        self.is_high()
    }
}
