use crate::{BusLine, OneWireGpio};
use embedded_hal::delay::DelayNs;
use onewire_core::{OneWire, OneWireError, OneWireResult, Presence};

impl<P: BusLine, D: DelayNs> OneWireGpio<P, D> {
    /// Waits for the line to read high, polling `idle_polls` times.
    fn wait_idle(&mut self) -> OneWireResult<(), P::Error> {
        for _ in 0..self.idle_polls {
            if self.line.sample()? {
                return Ok(());
            }
            self.delay.delay_us(self.timing.idle_poll_us);
        }
        Err(OneWireError::BusTimeout)
    }

    /// Drives the line low for `low_us`, releases it and waits `recovery_us`.
    fn pulse(&mut self, low_us: u32, recovery_us: u32) -> OneWireResult<(), P::Error> {
        self.line.drive_low()?;
        self.delay.delay_us(low_us);
        self.line.release()?;
        self.delay.delay_us(recovery_us);
        Ok(())
    }
}

impl<P: BusLine, D: DelayNs> OneWire for OneWireGpio<P, D> {
    type BusError = P::Error;

    fn reset(&mut self) -> OneWireResult<Presence, Self::BusError> {
        let t = self.timing;
        let presence = critical_section::with(|_| {
            self.wait_idle()?;
            self.pulse(t.reset_low_us, t.presence_sample_us)?;
            // devices answer the reset by holding the line low
            let present = !self.line.sample()?;
            self.delay.delay_us(t.reset_recovery_us);
            Ok::<_, OneWireError<P::Error>>(Presence::from(present))
        })?;
        log::trace!("bus reset: {:?}", presence);
        Ok(presence)
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        let t = self.timing;
        let (low, recovery) = if bit {
            (t.write_one_low_us, t.write_one_recovery_us)
        } else {
            (t.write_zero_low_us, t.write_zero_recovery_us)
        };
        critical_section::with(|_| self.pulse(low, recovery))
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        let t = self.timing;
        critical_section::with(|_| {
            self.pulse(t.read_init_us, t.read_sample_us)?;
            let bit = self.line.sample()?;
            self.delay.delay_us(t.read_recovery_us);
            Ok::<_, OneWireError<P::Error>>(bit)
        })
    }
}
