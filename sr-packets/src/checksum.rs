/// Internet checksum (RFC 1071) over `data`.
///
/// Sums the buffer as big-endian 16 bit words, padding an odd trailing byte with zero,
/// folds the carries back into the low 16 bits and returns the one's complement.
///
/// To compute a checksum, zero the checksum field first and write the result into it.
/// To validate one, leave the field in place: a correct header sums to zero.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum = data.chunks(2).fold(0u32, |acc, word| {
        let high = u32::from(word[0]) << 8;
        let low = word.get(1).copied().map_or(0, u32::from);
        acc + (high | low)
    });
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}
