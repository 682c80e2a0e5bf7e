use crate::{
    Address, OneWireError, OneWireResult, OneWireSearch, OneWireSearchKind, SearchReport,
    consts::{ONEWIRE_MATCH_ROM_CMD, ONEWIRE_READ_ROM_CMD, ONEWIRE_SKIP_ROM_CMD},
};

/// Outcome of a successful bus reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Presence {
    /// At least one device pulled the line low after the reset pulse.
    Present,
    /// The line stayed high: the bus is empty.
    Absent,
}

impl Presence {
    /// Whether at least one device answered the reset.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }
}

impl From<bool> for Presence {
    fn from(present: bool) -> Self {
        if present { Self::Present } else { Self::Absent }
    }
}

/// Trait for 1-Wire communication.
/// This trait defines the bit-level primitives required for 1-Wire communication (resetting the bus,
/// writing and reading single bits), and provides byte transfers and the ROM command layer on top of them.
///
/// Implementors only supply [`reset`](OneWire::reset), [`write_bit`](OneWire::write_bit) and
/// [`read_bit`](OneWire::read_bit). Every other method is composed from these, so an implementation
/// talking to a bus master chip may still override the byte transfers with native commands.
pub trait OneWire {
    /// The error type returned by the operations of this trait.
    /// This type is used to indicate errors in the underlying hardware or communication.
    type BusError;

    /// Resets the 1-Wire bus and reports whether any device answered with a presence pulse.
    ///
    /// # Errors
    /// [`OneWireError::BusTimeout`] if the line never returned to idle before the reset pulse,
    /// [`OneWireError::Other`] on hardware errors.
    fn reset(&mut self) -> OneWireResult<Presence, Self::BusError>;

    /// Writes a single bit to the 1-Wire bus.
    /// # Arguments
    /// * `bit` - The bit to write.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError>;

    /// Reads a single bit from the 1-Wire bus.
    /// # Returns
    /// The bit read from the bus.
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Writes a byte to the 1-Wire bus, least significant bit first.
    /// # Arguments
    /// * `byte` - The byte to write to the bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        for bit in 0..8 {
            self.write_bit(byte & (1 << bit) != 0)?;
        }
        Ok(())
    }

    /// Reads a byte from the 1-Wire bus, least significant bit first.
    /// # Returns
    /// Byte read from the bus.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        let mut byte = 0;
        for bit in 0..8 {
            if self.read_bit()? {
                byte |= 1 << bit;
            }
        }
        Ok(byte)
    }

    /// Writes every byte of `bytes` in order.
    fn write_bytes(&mut self, bytes: &[u8]) -> OneWireResult<(), Self::BusError> {
        for &b in bytes.iter() {
            self.write_byte(b)?;
        }
        Ok(())
    }

    /// Fills `buf` with bytes read from the bus.
    fn read_bytes(&mut self, buf: &mut [u8]) -> OneWireResult<(), Self::BusError> {
        for b in buf.iter_mut() {
            *b = self.read_byte()?;
        }
        Ok(())
    }

    /// Reads the ROM address of the only device on the bus.
    ///
    /// # Errors
    /// [`OneWireError::NoDevicePresent`] on an empty bus, [`OneWireError::CrcMismatch`] if the
    /// received code fails the CRC check, which is what happens when several devices answer at once.
    fn read_single_address(&mut self) -> OneWireResult<Address, Self::BusError> {
        self.command(ONEWIRE_READ_ROM_CMD)?;
        let mut rom = [0; 8];
        self.read_bytes(&mut rom)?;
        Address::try_from(rom).map_err(|_| OneWireError::CrcMismatch)
    }

    /// Addresses the device with the given ROM code. Other devices ignore the bus until the next reset.
    fn select(&mut self, address: &Address) -> OneWireResult<(), Self::BusError> {
        self.command(ONEWIRE_MATCH_ROM_CMD)?;
        self.write_bytes(address.as_bytes())
    }

    /// Addresses all devices on the bus at once.
    fn select_all(&mut self) -> OneWireResult<(), Self::BusError> {
        self.command(ONEWIRE_SKIP_ROM_CMD)
    }

    /// Resets the bus and issues a search command.
    ///
    /// The command must be followed by the bit-pair protocol of the search, not by byte transfers.
    /// [`OneWireSearch`] takes care of both.
    fn begin_search(&mut self, kind: OneWireSearchKind) -> OneWireResult<(), Self::BusError> {
        self.command(kind as u8)
    }

    /// Addresses devices on the 1-Wire bus.
    /// The first [`OneWire::read_byte`], [`OneWire::read_bit`], [`OneWire::write_byte`], [`OneWire::write_bit`] operation should be preceded by this method to address devices on the bus.
    /// Note: A [`OneWire::read_byte`] or [`OneWire::read_bit`] call will return garbage data if this method is called without specifying a ROM address on a bus with multiple devices.
    /// # Arguments
    /// * `rom` - The ROM address of the device to address. Pass [`None`] to skip ROM addressing and address all devices on the bus.
    fn address(&mut self, rom: Option<&Address>) -> OneWireResult<(), Self::BusError> {
        match rom {
            Some(rom) => self.select(rom),
            None => self.select_all(),
        }
    }

    /// Resets the bus and sends a ROM command byte.
    ///
    /// # Errors
    /// [`OneWireError::NoDevicePresent`] if no device answered the reset.
    fn command(&mut self, cmd: u8) -> OneWireResult<(), Self::BusError> {
        if !self.reset()?.is_present() {
            return Err(OneWireError::NoDevicePresent);
        }
        self.write_byte(cmd)
    }

    /// Enumerates up to `max_devices` devices (and at most `N`) with a normal search.
    ///
    /// See [`OneWireSearch::collect`].
    fn search<const N: usize>(
        &mut self,
        max_devices: usize,
    ) -> OneWireResult<SearchReport<N>, Self::BusError>
    where
        Self: Sized,
    {
        OneWireSearch::new(self, OneWireSearchKind::Normal).collect(max_devices)
    }
}
