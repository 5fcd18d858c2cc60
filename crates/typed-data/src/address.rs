use alloy_primitives::Address;

/// Parses a `0x`-prefixed 20-byte address string.
///
/// All-lowercase and all-uppercase inputs are accepted as-is. Mixed case is
/// treated as an EIP-55 checksum and must match exactly.
///
/// Returns the failure reason as a plain message; callers attach the payload
/// location.
pub fn parse_address(address: &str) -> Result<Address, String> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| format!("address `{address}` must start with 0x"))?;

    if hex_part.len() != 40 {
        return Err(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        ));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("address `{address}` contains non-hex characters"));
    }

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(hex_part, &mut bytes)
        .map_err(|e| format!("address `{address}`: {e}"))?;
    let parsed = Address::from(bytes);

    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());
    if is_all_lower || is_all_upper {
        return Ok(parsed);
    }

    // Mixed case: verify EIP-55.
    let checksummed = checksum_address(&parsed);
    if &checksummed[2..] != hex_part {
        return Err(format!(
            "address `{address}` has an invalid EIP-55 checksum (expected {checksummed})"
        ));
    }

    Ok(parsed)
}

/// Renders an address with its EIP-55 mixed-case checksum.
pub fn checksum_address(address: &Address) -> String {
    address.to_checksum(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eip55_checksum_known_addresses() {
        // Test vectors from EIP-55.
        let cases = [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ];

        for expected in &cases {
            let parsed = parse_address(expected).unwrap();
            assert_eq!(&checksum_address(&parsed), expected);
        }
    }

    #[test]
    fn all_lowercase_address_is_accepted() {
        let parsed = parse_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(
            checksum_address(&parsed),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn all_uppercase_address_is_accepted() {
        assert!(parse_address("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED").is_ok());
    }

    #[test]
    fn bad_checksum_is_rejected() {
        let err = parse_address("0x5AAEB6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap_err();
        assert!(err.contains("checksum"));
    }

    #[test]
    fn short_address_is_rejected() {
        assert!(parse_address("0x5aAeb6053F").is_err());
    }

    #[test]
    fn missing_prefix_is_rejected() {
        assert!(parse_address("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
    }

    #[test]
    fn non_hex_is_rejected() {
        assert!(parse_address("0xGGGGb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
    }
}
