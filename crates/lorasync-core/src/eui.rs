// ── Device EUI validation ──
//
// An EUI is the join key between a platform asset's device-id list and a
// network-server device. Accepted lengths are 16, 32 or 64 hex digits.

const VALID_LENGTHS: [usize; 3] = [16, 32, 64];

/// `true` iff `s` is 16, 32 or 64 case-insensitive hexadecimal characters.
pub fn is_valid_eui(s: &str) -> bool {
    VALID_LENGTHS.contains(&s.len()) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// First syntactically valid EUI in a device-id list.
pub fn first_valid_eui<S: AsRef<str>>(device_ids: &[S]) -> Option<&str> {
    device_ids
        .iter()
        .map(AsRef::as_ref)
        .find(|id| is_valid_eui(id))
}
