use crate::{OneWireCrc, OneWireError};

/// A 64-bit 1-Wire ROM code.
///
/// | Byte | Description |
/// |------|-------------|
/// | 0 | Family code (e.g., 0x28 for DS18B20) |
/// | 1-6 | Serial number, least significant byte first |
/// | 7 | CRC-8 (`0b1_0001_1001` poly) of bytes 0-6 |
///
/// Bytes travel on the bus in this order, each one least significant bit first.
/// Addresses order the way the ROM search visits them: by [`search_key`](Address::search_key),
/// in which the first bit on the wire is the most significant one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address([u8; 8]);

impl Address {
    /// Creates an address from its raw bytes without checking the CRC.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Builds a valid address from a family code and a 48-bit serial number,
    /// appending the matching CRC byte.
    pub fn new(family: u8, serial: [u8; 6]) -> Self {
        let mut bytes = [0; 8];
        bytes[0] = family;
        bytes[1..7].copy_from_slice(&serial);
        bytes[7] = OneWireCrc::compute(&bytes[..7]);
        Self(bytes)
    }

    /// Family code of the device.
    pub const fn family(&self) -> u8 {
        self.0[0]
    }

    /// Serial number of the device.
    pub fn serial(&self) -> [u8; 6] {
        let mut serial = [0; 6];
        serial.copy_from_slice(&self.0[1..7]);
        serial
    }

    /// The CRC byte carried by the address.
    pub const fn crc(&self) -> u8 {
        self.0[7]
    }

    /// Raw bytes in bus order.
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Whether the trailing byte is the CRC-8 of the first seven.
    pub fn is_valid(&self) -> bool {
        OneWireCrc::validate(&self.0)
    }

    /// The address as a little-endian `u64`, family code in the low byte.
    pub const fn to_u64(&self) -> u64 {
        u64::from_le_bytes(self.0)
    }

    /// The address read in the order the ROM search resolves it.
    ///
    /// The search walks bit positions 1 through 64 (bit 0 of byte 0 first)
    /// and takes the 0 branch first at every collision, so devices are found
    /// in ascending order of this key.
    pub const fn search_key(&self) -> u64 {
        self.to_u64().reverse_bits()
    }

    /// Value of the bit at search position `position`.
    ///
    /// Positions are 1-based in wire order: position 1 is bit 0 of the family code,
    /// position 64 the most significant bit of the CRC byte.
    ///
    /// # Panics
    /// If `position` is not in `1..=64`.
    pub fn bit(&self, position: u8) -> bool {
        assert!((1..=64).contains(&position), "bit position out of range");
        let idx = (position - 1) as usize;
        self.0[idx / 8] & (1 << (idx % 8)) != 0
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Self(value.to_le_bytes())
    }
}

impl From<Address> for u64 {
    fn from(value: Address) -> Self {
        value.to_u64()
    }
}

impl TryFrom<[u8; 8]> for Address {
    type Error = OneWireError<()>;

    fn try_from(bytes: [u8; 8]) -> Result<Self, Self::Error> {
        let address = Self(bytes);
        if address.is_valid() {
            Ok(address)
        } else {
            Err(OneWireError::CrcMismatch)
        }
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.search_key().cmp(&other.search_key())
    }
}

impl core::fmt::LowerHex for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:016x}", self.to_u64())
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::LowerHex::fmt(self, f)
    }
}
