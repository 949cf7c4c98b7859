//! Dallas/Maxim CRC8 (x^8 + x^5 + x^4 + 1, reflected)

/// Contribution of the low nibble of the accumulator
const LOW_NIBBLE: [u8; 16] = [
    0x00, 0x5E, 0xBC, 0xE2, 0x61, 0x3F, 0xDD, 0x83, 0xC2, 0x9C, 0x7E, 0x20, 0xA3, 0xFD, 0x1F, 0x41,
];

/// Contribution of the high nibble of the accumulator
const HIGH_NIBBLE: [u8; 16] = [
    0x00, 0x9D, 0x23, 0xBE, 0x46, 0xDB, 0x65, 0xF8, 0x8C, 0x11, 0xAF, 0x32, 0xCA, 0x57, 0xE9, 0x74,
];

pub fn compute_partial_crc8(crc: u8, data: &[u8]) -> u8 {
    data.iter().fold(crc, |crc, byte| {
        let acc = crc ^ byte;
        LOW_NIBBLE[(acc & 0x0F) as usize] ^ HIGH_NIBBLE[(acc >> 4) as usize]
    })
}

pub fn crc8(data: &[u8]) -> u8 {
    compute_partial_crc8(0, data)
}

/// Checks a sequence whose last byte is the CRC8 of the bytes before it.
pub fn check_crc8(data: &[u8]) -> bool {
    crc8(data) == 0
}
