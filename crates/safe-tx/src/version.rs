use std::fmt;
use std::str::FromStr;

use crate::error::SafeTxError;

/// A Safe contract version (`major.minor.patch`).
///
/// The version decides the shape of the `SafeTx` typed data: 1.0.0 renamed
/// `dataGas` to `baseGas`, and 1.3.0 added `chainId` to the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SafeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SafeVersion {
    pub const V1_0_0: SafeVersion = SafeVersion::new(1, 0, 0);
    pub const V1_3_0: SafeVersion = SafeVersion::new(1, 3, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        SafeVersion {
            major,
            minor,
            patch,
        }
    }

    /// Name of the refund gas field in `SafeTx`.
    pub fn base_gas_field(&self) -> &'static str {
        if *self >= SafeVersion::V1_0_0 {
            "baseGas"
        } else {
            "dataGas"
        }
    }

    pub fn domain_has_chain_id(&self) -> bool {
        *self >= SafeVersion::V1_3_0
    }
}

impl FromStr for SafeVersion {
    type Err = SafeTxError;

    /// Accepts `1.3.0` and build-tagged forms such as `1.3.0+L2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let core = s.split(['+', '-']).next().unwrap_or_default();
        let parts: Vec<&str> = core.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(SafeTxError::InvalidVersion(s.to_string()));
        }

        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| SafeTxError::InvalidVersion(s.to_string()))?;
        }

        Ok(SafeVersion::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl fmt::Display for SafeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
