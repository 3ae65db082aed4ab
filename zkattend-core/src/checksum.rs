//! ZKTeco checksum algorithm
//!
//! Ones-complement sum over the packet as little-endian 16-bit words, with the
//! checksum field itself taken as zero. Carries are folded back in, an odd
//! trailing byte counts as a low byte.

/// Calculate the checksum for a packet header and payload.
///
/// # Examples
///
/// ```
/// use zkattend_core::checksum;
///
/// // CMD_CONNECT with session 0 and reply 0 is always 0xFC17
/// assert_eq!(checksum::calculate(1000, 0, 0, &[]), 0xFC17);
/// ```
pub fn calculate(command: u16, session_id: u16, reply_id: u16, payload: &[u8]) -> u16 {
    let mut sum: u32 = u32::from(command) + u32::from(session_id) + u32::from(reply_id);
    sum = fold(sum);

    for chunk in payload.chunks(2) {
        let word = match chunk {
            [lo, hi] => u16::from_le_bytes([*lo, *hi]),
            [lo] => u16::from(*lo),
            _ => unreachable!("chunks(2) yields one or two bytes"),
        };
        sum = fold(sum + u32::from(word));
    }

    !(sum as u16)
}

/// Verify a received checksum
pub fn verify(command: u16, session_id: u16, reply_id: u16, payload: &[u8], received: u16) -> bool {
    calculate(command, session_id, reply_id, payload) == received
}

fn fold(mut sum: u32) -> u32 {
    while sum > 0xFFFF {
        sum -= 0xFFFF;
    }
    sum
}
