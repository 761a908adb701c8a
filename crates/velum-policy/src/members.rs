//! Decoding of the whitelist getter's binary payload

use velum_core::{Address, VelumError, VelumResult};

const ADDRESS_WIDTH: usize = 32;

/// Decode the member getter's payload: a u32 little-endian count followed
/// by `count` fixed-width 32-byte addresses.
///
/// Trailing bytes or a short payload are rejected as serialization errors
/// rather than silently truncated.
pub fn decode_member_payload(payload: &[u8]) -> VelumResult<Vec<Address>> {
    if payload.len() < 4 {
        return Err(VelumError::serialization(
            "member payload shorter than its length prefix",
        ));
    }
    let (prefix, body) = payload.split_at(4);
    let count = u32::from_le_bytes(prefix.try_into().map_err(|_| {
        VelumError::serialization("member payload has malformed length prefix")
    })?) as usize;

    if body.len() != count * ADDRESS_WIDTH {
        return Err(VelumError::serialization(format!(
            "member payload declares {count} addresses but carries {} bytes",
            body.len()
        )));
    }

    let mut members = Vec::with_capacity(count);
    for chunk in body.chunks_exact(ADDRESS_WIDTH) {
        let bytes: [u8; 32] = chunk
            .try_into()
            .map_err(|_| VelumError::serialization("member payload chunking failed"))?;
        members.push(Address::from_bytes(bytes));
    }
    Ok(members)
}

/// Encode a member list into the getter's wire shape. Handlers use this to
/// produce payloads; it is the inverse of [`decode_member_payload`].
pub fn encode_member_payload(members: &[Address]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + members.len() * ADDRESS_WIDTH);
    payload.extend_from_slice(&(members.len() as u32).to_le_bytes());
    for member in members {
        payload.extend_from_slice(member.as_bytes());
    }
    payload
}
