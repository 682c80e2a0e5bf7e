use crate::{
    Address, OneWire, OneWireResult,
    consts::{ONEWIRE_CONDITIONAL_SEARCH_CMD, ONEWIRE_SEARCH_CMD},
    error::OneWireError,
};

/// A structure for searching devices on a 1-Wire bus.
/// This structure implements the search algorithm for discovering devices on the 1-Wire bus.
/// It maintains the state of the search between calls to [`next`](OneWireSearch::next),
/// one bus reset per device.
pub struct OneWireSearch<'a, T> {
    onewire: &'a mut T,
    kind: OneWireSearchKind,
    last_device: bool,
    last_discrepancy: u8,
    absent: bool,
    family: Option<u8>,
    rom: [u8; 8],
}

impl<T> core::fmt::Debug for OneWireSearch<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OneWireSearch")
            .field("kind", &self.kind)
            .field("last_device", &self.last_device)
            .field("last_discrepancy", &self.last_discrepancy)
            .field("family", &self.family)
            .field("rom", &self.rom)
            .finish()
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Type of search performed using [`OneWireSearch`].
pub enum OneWireSearchKind {
    /// Normal search
    Normal = ONEWIRE_SEARCH_CMD,
    /// Search only for devices with alarm
    Alarmed = ONEWIRE_CONDITIONAL_SEARCH_CMD,
}

/// Number of consecutive [`OneWireError::BusFault`] passes after which
/// [`OneWireSearch::collect`] gives up.
pub const MAX_BUS_FAULTS: usize = 3;

/// Why [`OneWireSearch::collect`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SearchEnd {
    /// Every device on the bus has been visited.
    Complete,
    /// The requested number of devices was reached before the end of the search.
    Limit,
    /// No device answered a reset.
    NoDevicePresent,
    /// The line did not return to idle before a reset.
    BusTimeout,
    /// No device answered a search step, on every retry.
    BusFault,
}

/// Devices found by [`OneWireSearch::collect`], in search order.
#[derive(Debug, Clone)]
pub struct SearchReport<const N: usize> {
    /// Addresses that passed the CRC check.
    pub devices: heapless::Vec<Address, N>,
    /// Search passes abandoned because no device answered a bit pair.
    pub bus_faults: usize,
    /// Search passes whose ROM code failed the CRC check.
    pub crc_mismatches: usize,
    /// Reason the enumeration stopped.
    pub end: SearchEnd,
}

impl<'a, T> OneWireSearch<'a, T> {
    /// Creates a new [`OneWireSearch`] instance.
    ///
    /// # Arguments
    /// * `onewire` - A mutable reference to a type that implements the `OneWire` trait.
    /// * `kind` - The search command to use (`0xf0` for normal search, `0xec` for search in alarm state).
    pub fn new(onewire: &'a mut T, kind: OneWireSearchKind) -> Self {
        Self {
            onewire,
            kind,
            last_device: false,
            last_discrepancy: 0,
            absent: false,
            family: None,
            rom: [0; 8],
        }
    }

    /// Creates a new [`OneWireSearch`] instance with a specific family code.
    ///
    /// The first pass starts at the lowest address of the family and the session
    /// ends at the first device of another family.
    /// # Arguments
    /// * `onewire` - A mutable reference to a type that implements the `OneWire` trait.
    /// * `kind` - The search command to use (`0xf0` for normal search, `0xec` for search in alarm state).
    /// * `family` - The family code of the devices to search for.
    pub fn with_family(onewire: &'a mut T, kind: OneWireSearchKind, family: u8) -> Self {
        let mut search = Self::new(onewire, kind);
        search.family = Some(family);
        search.restart();
        search
    }

    /// Resets the search state, so that the next call to [`next`](OneWireSearch::next)
    /// starts a new session.
    pub fn restart(&mut self) {
        self.last_device = false;
        self.absent = false;
        match self.family {
            Some(family) => {
                self.rom = [family, 0, 0, 0, 0, 0, 0, 0];
                self.last_discrepancy = 64;
            }
            None => {
                self.rom = [0; 8];
                self.last_discrepancy = 0;
            }
        }
    }

    /// Bit position (1-based) of the last branch that still has an unexplored `1` side, 0 if none.
    pub fn last_discrepancy(&self) -> u8 {
        self.last_discrepancy
    }

    /// Whether the session has ended and [`next`](OneWireSearch::next) will only return `None`.
    pub fn is_finished(&self) -> bool {
        self.last_device
    }
}

impl<T: OneWire> OneWireSearch<'_, T> {
    /// Searches for the next device on the 1-Wire bus.
    /// This method implements the [1-Wire search algorithm](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html) to discover devices connected to the bus.
    /// The [next](OneWireSearch::next) method can be called repeatedly to find all devices on the bus,
    /// which are returned in ascending [`Address::search_key`] order.
    /// At the end of the search, calling this method will return `None` until [restart](OneWireSearch::restart) is called.
    ///
    /// # Errors
    /// * [`OneWireError::BusFault`] - no device answered a bit pair. The pass is dropped and the
    ///   next call starts the walk from the beginning.
    /// * [`OneWireError::CrcMismatch`] - the ROM code read in this pass is corrupt. The search state
    ///   still advances, so the next call continues with the following device. A code with family
    ///   `0x00` is rejected the same way but ends the session.
    /// * [`OneWireError::BusTimeout`] and [`OneWireError::Other`] from the bus itself.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> OneWireResult<Option<Address>, T::BusError> {
        if self.last_device {
            return Ok(None);
        }
        match self.onewire.begin_search(self.kind) {
            Ok(()) => {}
            Err(OneWireError::NoDevicePresent) => {
                log::debug!("no presence pulse, search session ends");
                self.last_device = true;
                self.absent = true;
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
        let mut last_zero: u8 = 0;
        for id_bit_num in 1..=64u8 {
            let idx = ((id_bit_num - 1) / 8) as usize; // Index in the ROM array
            let rom_mask = 1u8 << ((id_bit_num - 1) % 8); // Mask for the current bit in the ROM byte
            let id_bit = self.onewire.read_bit()?;
            let complement_bit = self.onewire.read_bit()?;
            let dir = match (id_bit, complement_bit) {
                (true, true) => {
                    // Nobody is driving the bus, drop this pass
                    self.last_discrepancy = 0;
                    self.last_device = false;
                    log::warn!("no device answered search bit {}", id_bit_num);
                    return Err(OneWireError::BusFault);
                }
                // All remaining devices agree on this bit
                (true, false) | (false, true) => id_bit,
                (false, false) => {
                    let dir = if id_bit_num < self.last_discrepancy {
                        self.rom[idx] & rom_mask > 0
                    } else {
                        id_bit_num == self.last_discrepancy
                    };
                    if !dir {
                        last_zero = id_bit_num;
                    }
                    dir
                }
            };
            if dir {
                self.rom[idx] |= rom_mask;
            } else {
                self.rom[idx] &= !rom_mask;
            }
            self.onewire.write_bit(dir)?;
        }
        self.last_discrepancy = last_zero;

        let address = Address::from_bytes(self.rom);
        if !address.is_valid() {
            log::warn!("discarding {} with invalid CRC", address);
            return Err(OneWireError::CrcMismatch);
        }
        if address.family() == 0 {
            // All-zero codes pass the CRC: the line was held low through the search
            log::warn!(
                "discarding {} with family code 0, search session ends",
                address
            );
            self.last_device = true;
            return Err(OneWireError::CrcMismatch);
        }
        self.last_device = self.last_discrepancy == 0;
        if self.family.is_some_and(|family| family != address.family()) {
            log::debug!("left family subtree at {}, search session ends", address);
            self.last_device = true;
            return Ok(None);
        }
        log::debug!("found device {}", address);
        Ok(Some(address))
    }

    /// Verifies if the device with the given ROM code is present on the 1-Wire bus.
    ///
    /// This runs one search pass steered along `address` and resets the search state afterwards,
    /// so calling [next](OneWireSearch::next) after this call will start a new search.
    pub fn verify(&mut self, address: &Address) -> OneWireResult<bool, T::BusError> {
        self.restart();
        self.rom = *address.as_bytes();
        self.last_discrepancy = 64;
        let res = self.next();
        self.restart();
        match res {
            Ok(found) => Ok(found.as_ref() == Some(address)),
            Err(OneWireError::BusFault | OneWireError::CrcMismatch) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Enumerates devices until the search ends or `max_devices` (capped at `N`) are found.
    ///
    /// Passes ending in [`OneWireError::CrcMismatch`] are counted and skipped. A pass ending in
    /// [`OneWireError::BusFault`] is counted and retried from the same branch with a fresh reset;
    /// the enumeration only ends with [`SearchEnd::BusFault`] after [`MAX_BUS_FAULTS`] faults in a
    /// row with no progress in between. A failed reset ends the enumeration. The reason is reported
    /// in [`SearchReport::end`] together with the devices found so far.
    ///
    /// # Errors
    /// Only errors of the bus line itself ([`OneWireError::Other`]) are returned.
    pub fn collect<const N: usize>(
        &mut self,
        max_devices: usize,
    ) -> OneWireResult<SearchReport<N>, T::BusError> {
        let limit = max_devices.min(N);
        let mut devices: heapless::Vec<Address, N> = heapless::Vec::new();
        let mut bus_faults = 0;
        let mut crc_mismatches = 0;
        let mut faults_in_a_row = 0;
        let end = loop {
            if devices.len() >= limit && !self.last_device {
                break SearchEnd::Limit;
            }
            let branch = (self.rom, self.last_discrepancy);
            match self.next() {
                Ok(Some(address)) => {
                    faults_in_a_row = 0;
                    if devices.push(address).is_err() {
                        break SearchEnd::Limit;
                    }
                }
                Ok(None) if self.absent => break SearchEnd::NoDevicePresent,
                Ok(None) => break SearchEnd::Complete,
                Err(OneWireError::CrcMismatch) => {
                    faults_in_a_row = 0;
                    crc_mismatches += 1;
                    if self.last_discrepancy == 0 {
                        // The corrupt code was the last leaf of the tree
                        break SearchEnd::Complete;
                    }
                }
                Err(OneWireError::BusFault) => {
                    bus_faults += 1;
                    faults_in_a_row += 1;
                    if faults_in_a_row >= MAX_BUS_FAULTS {
                        break SearchEnd::BusFault;
                    }
                    (self.rom, self.last_discrepancy) = branch;
                }
                Err(OneWireError::BusTimeout) => break SearchEnd::BusTimeout,
                Err(e) => return Err(e),
            }
        };
        log::debug!(
            "search ended ({:?}) with {} devices, {} faults, {} CRC errors",
            end,
            devices.len(),
            bus_faults,
            crc_mismatches
        );
        Ok(SearchReport {
            devices,
            bus_faults,
            crc_mismatches,
            end,
        })
    }
}
