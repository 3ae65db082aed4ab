//! CommKey authentication
//!
//! Terminals with a communication password answer `CMD_CONNECT` with
//! `CMD_ACK_UNAUTH`. The host must then send `CMD_AUTH` carrying the password
//! scrambled against the session id.

use bytes::Bytes;

/// Scramble a CommKey password against the session id.
///
/// Steps: reverse the password bits, add the session id, XOR the bytes with
/// `ZKSO`, swap the 16-bit halves, then mix in `ticks`.
///
/// # Examples
///
/// ```
/// use zkattend_core::auth;
///
/// let key = auth::make_commkey(0, 32031, 50);
/// assert_eq!(key.len(), 4);
/// ```
pub fn make_commkey(password: u32, session_id: u16, ticks: u8) -> Bytes {
    let k = password.reverse_bits().wrapping_add(u32::from(session_id));

    let b = k.to_le_bytes();
    let x = [b[0] ^ b'Z', b[1] ^ b'K', b[2] ^ b'S', b[3] ^ b'O'];

    // Halves swapped: high word first
    let mut key = [x[2], x[3], x[0], x[1]];

    key[0] ^= ticks;
    key[1] ^= ticks;
    key[2] = ticks;
    key[3] ^= ticks;

    Bytes::copy_from_slice(&key)
}
