// -- Hex shape recognizers --

/// True iff `s` is `0x` followed by exactly 64 hex digits (a 32-byte value
/// such as a transaction hash or a `bytes32` document hash).
pub fn is_hex32(s: &str) -> bool {
	has_hex_tail(s, 64)
}

/// True iff `s` is `0x` followed by exactly 40 hex digits.
///
/// Checksum casing is not verified; this only recognizes the shape.
pub fn is_address(s: &str) -> bool {
	has_hex_tail(s, 40)
}

fn has_hex_tail(s: &str, digits: usize) -> bool {
	match s.strip_prefix("0x") {
		Some(tail) => tail.len() == digits && tail.bytes().all(|b| b.is_ascii_hexdigit()),
		None => false,
	}
}
