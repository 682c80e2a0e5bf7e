/// Reflected form of the Dallas/Maxim polynomial x^8 + x^5 + x^4 + 1.
const CRC8_POLY: u8 = 0x8c;

#[cfg(feature = "crc-table")]
static CRC8_TABLE: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = update_bitwise(0, i as u8);
        i += 1;
    }
    table
};

const fn update_bitwise(crc: u8, byte: u8) -> u8 {
    let mut crc = crc ^ byte; // XOR the byte with the current CRC value
    let mut bit = 0;
    while bit < 8 {
        if crc & 0x1 == 0x1 {
            crc = (crc >> 1) ^ CRC8_POLY;
        } else {
            crc >>= 1;
        }
        bit += 1;
    }
    crc
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Calculate CRC-8 used in 1-Wire communications.
///
/// This is the Dallas/Maxim "iButton" CRC-8 with an initial value of zero.
/// With the `crc-table` feature the update runs through a 256-byte lookup table,
/// otherwise the polynomial is applied bit by bit.
pub struct OneWireCrc(u8);

impl OneWireCrc {
    /// Get the current CRC value
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Update the CRC with the incoming byte.
    pub fn update(&mut self, byte: u8) {
        #[cfg(feature = "crc-table")]
        {
            self.0 = CRC8_TABLE[(self.0 ^ byte) as usize];
        }
        #[cfg(not(feature = "crc-table"))]
        {
            self.0 = update_bitwise(self.0, byte);
        }
    }

    /// Compute the CRC-8 of a sequence of bytes.
    pub fn compute(sequence: &[u8]) -> u8 {
        let mut crc = OneWireCrc::default();
        for &byte in sequence.iter() {
            crc.update(byte);
        }
        crc.value()
    }

    /// Validate a sequence of bytes where the last byte is the 1-Wire CRC of
    /// the previous bytes.
    pub fn validate(sequence: &[u8]) -> bool {
        // If the last byte is the CRC of the preceding ones, the running CRC ends at 0
        Self::compute(sequence) == 0x0
    }
}
