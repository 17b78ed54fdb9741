//! Packing of the first value and the embedded message into blinding scalars.
//!
//! `alpha` carries the little-endian bytes `v0 (8 bytes) || message[..23]`
//! and `tau1` carries `message[23..]`.  Both encodings stay below
//! \\(2^{248}\\), so they are canonical scalars and survive the
//! arithmetic used to strip the nonce-derived blindings back off.

use curve25519_dalek::scalar::Scalar;

use config::{MESSAGE_PREFIX_SIZE, MESSAGE_SUFFIX_CAPACITY};
use util::{scalar_from_padded_bytes, trimmed_bytes};

const VALUE_BYTES: usize = 8;

/// Scalar added to `alpha`: the first value followed by the message prefix.
pub(crate) fn prefix_scalar(value0: u64, message: &[u8]) -> Scalar {
    let prefix_len = message.len().min(MESSAGE_PREFIX_SIZE);
    let mut bytes = [0u8; VALUE_BYTES + MESSAGE_PREFIX_SIZE];
    bytes[..VALUE_BYTES].copy_from_slice(&value0.to_le_bytes());
    bytes[VALUE_BYTES..VALUE_BYTES + prefix_len].copy_from_slice(&message[..prefix_len]);
    scalar_from_padded_bytes(&bytes)
}

/// Scalar added to `tau1`: whatever of the message did not fit into the prefix.
pub(crate) fn suffix_scalar(message: &[u8]) -> Scalar {
    if message.len() <= MESSAGE_PREFIX_SIZE {
        return Scalar::zero();
    }
    let suffix = &message[MESSAGE_PREFIX_SIZE..];
    let len = suffix.len().min(MESSAGE_SUFFIX_CAPACITY);
    scalar_from_padded_bytes(&suffix[..len])
}

/// Splits a recovered `alpha` payload into the first value and the raw
/// 23-byte message prefix.
pub(crate) fn split_prefix(packed: &Scalar) -> (u64, [u8; MESSAGE_PREFIX_SIZE]) {
    let bytes = packed.as_bytes();
    let mut value = [0u8; VALUE_BYTES];
    value.copy_from_slice(&bytes[..VALUE_BYTES]);
    let mut prefix = [0u8; MESSAGE_PREFIX_SIZE];
    prefix.copy_from_slice(&bytes[VALUE_BYTES..VALUE_BYTES + MESSAGE_PREFIX_SIZE]);
    (u64::from_le_bytes(value), prefix)
}

/// Reassembles the message from the raw prefix and the recovered `tau1` payload.
///
/// Trailing zero bytes cannot be told apart from padding and are dropped.
/// The prefix is kept whole when a suffix follows it.
pub(crate) fn join(prefix: &[u8; MESSAGE_PREFIX_SIZE], suffix: &Scalar) -> Vec<u8> {
    let suffix = trimmed_bytes(suffix);
    if suffix.is_empty() {
        let len = prefix.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        return prefix[..len].to_vec();
    }
    let mut message = Vec::with_capacity(MESSAGE_PREFIX_SIZE + suffix.len());
    message.extend_from_slice(prefix);
    message.extend_from_slice(&suffix);
    message
}
