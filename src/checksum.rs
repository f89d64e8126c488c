//! Packet checksums.
//!
//! Only LEDnetWF framing carries a checksum; the other families send their
//! packets without one.

/// Payload offset used as checksum start by LEDnetWF packets
pub const LEDNETWF_CHECKSUM_START: usize = 9;

/// Sums `bytes[start..len - 1]` modulo 256.
///
/// The last byte of `bytes` is the checksum slot and is never included.
/// Returns 0 when the range is empty.
pub fn checksum(bytes: &[u8], start: usize) -> u8 {
    let end = bytes.len().saturating_sub(1);
    if start >= end {
        return 0;
    }

    bytes[start..end]
        .iter()
        .fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}
