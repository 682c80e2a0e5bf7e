#![no_std]
#![deny(missing_docs)]

/*! # onewire-gpio
 *
 * A bit-banged 1-Wire master implementing the [`OneWire`] trait from `onewire-core`
 * on a single open-drain GPIO line and a blocking delay.
 *
 * Each bit primitive runs inside a [`critical_section`], so the platform must provide
 * a critical section implementation (interrupt masking on bare metal, the `std`
 * implementation on hosted targets).
 */

pub use onewire_core::{
    Address, MAX_BUS_FAULTS, OneWire, OneWireError, OneWireResult, OneWireSearch,
    OneWireSearchKind, Presence, SearchEnd, SearchReport,
};
mod line;
mod onewire;
mod timing;

pub use line::BusLine;
pub use timing::Timing;

/// A bit-banged 1-Wire bus master.
///
/// Takes ownership of a bus line (implementing [`BusLine`], e.g. any open-drain
/// [`OutputPin`](embedded_hal::digital::OutputPin) + [`InputPin`](embedded_hal::digital::InputPin))
/// and a timer object implementing the [`DelayNs`](embedded_hal::delay::DelayNs) trait.
pub struct OneWireGpio<P, D> {
    pub(crate) line: P,
    pub(crate) delay: D,
    pub(crate) timing: Timing,
    pub(crate) idle_polls: u8,
}

/// Builder for creating a [`OneWireGpio`] instance with custom configuration.
pub struct OneWireGpioBuilder {
    pub(crate) idle_polls: u8,
    pub(crate) timing: Timing,
}

impl Default for OneWireGpioBuilder {
    fn default() -> Self {
        OneWireGpioBuilder {
            idle_polls: 100,
            timing: Timing::STANDARD,
        }
    }
}

impl OneWireGpioBuilder {
    /// Sets the number of idle checks before a reset.
    ///
    /// A reset waits at most `idle_polls` times [`Timing::idle_poll_us`]
    /// for the line to read high before failing with
    /// [`OneWireError::BusTimeout`].
    pub fn with_idle_polls(mut self, idle_polls: u8) -> Self {
        self.idle_polls = idle_polls;
        self
    }

    /// Sets the slot timing.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Builds a new `OneWireGpio` instance, releasing the line.
    pub fn build<P: BusLine, D>(
        self,
        mut line: P,
        delay: D,
    ) -> OneWireResult<OneWireGpio<P, D>, P::Error> {
        line.release()?;
        Ok(OneWireGpio {
            line,
            delay,
            timing: self.timing,
            idle_polls: self.idle_polls,
        })
    }
}

impl<P, D> OneWireGpio<P, D> {
    /// The slot timing in use.
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Releases the bus line and the delay.
    pub fn free(self) -> (P, D) {
        (self.line, self.delay)
    }
}
