//! IPv4 CIDR parsing and the pods CIDR rule.

use crate::error::ValidationError;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Ranges a secondary pods CIDR must fall into.
pub const PODS_CIDR_POOLS: [Ipv4Cidr; 2] = [
    Ipv4Cidr::new_unchecked(Ipv4Addr::new(100, 64, 0, 0), 10),
    Ipv4Cidr::new_unchecked(Ipv4Addr::new(198, 19, 0, 0), 16),
];

/// Smallest accepted pods CIDR, `/28` (16 addresses).
pub const PODS_CIDR_MAX_PREFIX: u8 = 28;
/// Largest accepted pods CIDR, `/16` (65 536 addresses).
pub const PODS_CIDR_MIN_PREFIX: u8 = 16;

/// An IPv4 network in CIDR notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    address: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    const fn new_unchecked(address: Ipv4Addr, prefix: u8) -> Self {
        Self { address, prefix }
    }

    /// Prefix length.
    #[must_use]
    pub const fn prefix(self) -> u8 {
        self.prefix
    }

    const fn mask(self) -> u32 {
        if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - self.prefix)
        }
    }

    /// First address of the block, host bits cleared.
    #[must_use]
    pub const fn first(self) -> u32 {
        self.address.to_bits() & self.mask()
    }

    /// Last address of the block.
    #[must_use]
    pub const fn last(self) -> u32 {
        self.first() | !self.mask()
    }

    /// Number of addresses covered.
    #[must_use]
    pub const fn size(self) -> u64 {
        1_u64 << (32 - self.prefix)
    }

    /// True when `other` lies entirely inside this block.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.first() <= other.first() && other.last() <= self.last()
    }
}

/// Failure parsing an IPv4 CIDR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidrParseError {
    input: String,
}

impl fmt::Display for CidrParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "`{}` is not a valid IPv4 CIDR", self.input)
    }
}

impl std::error::Error for CidrParseError {}

impl FromStr for Ipv4Cidr {
    type Err = CidrParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let error = || CidrParseError {
            input: input.to_string(),
        };
        let (address, prefix) = input.trim().split_once('/').ok_or_else(error)?;
        let address = address.parse::<Ipv4Addr>().map_err(|_| error())?;
        let prefix = prefix.parse::<u8>().map_err(|_| error())?;
        if prefix > 32 {
            return Err(error());
        }
        Ok(Self { address, prefix })
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", Ipv4Addr::from_bits(self.first()), self.prefix)
    }
}

/// Parse `value` or report it against `spec.networks.<field>`.
pub fn parse_cidr(value: &str, field: &str) -> Result<Ipv4Cidr, ValidationError> {
    value
        .parse::<Ipv4Cidr>()
        .map_err(|error| ValidationError::invalid("spec.networks", field, error.to_string()))
}

/// Secondary pods CIDR: IPv4, between `/16` and `/28`, inside a reserved pool.
pub fn validate_pods_cidr(value: &str) -> Result<(), ValidationError> {
    let cidr = parse_cidr(value, "pods_cidr")?;
    if !(PODS_CIDR_MIN_PREFIX..=PODS_CIDR_MAX_PREFIX).contains(&cidr.prefix()) {
        return Err(ValidationError::invalid(
            "spec.networks",
            "pods_cidr",
            format!(
                "CIDR block sizes must be between a /{PODS_CIDR_MIN_PREFIX} and /{PODS_CIDR_MAX_PREFIX} netmask"
            ),
        ));
    }
    if PODS_CIDR_POOLS.iter().any(|pool| pool.contains(cidr)) {
        return Ok(());
    }
    let pools: Vec<String> = PODS_CIDR_POOLS.iter().map(ToString::to_string).collect();
    Err(ValidationError::invalid(
        "spec.networks",
        "pods_cidr",
        format!("CIDR block must be within {}", pools.join(" or ")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_and_normalizes() -> Result<(), CidrParseError> {
        let cidr: Ipv4Cidr = "100.64.1.7/24".parse()?;
        assert_eq!(cidr.to_string(), "100.64.1.0/24");
        assert_eq!(cidr.size(), 256);
        assert!("100.64.0.0".parse::<Ipv4Cidr>().is_err());
        assert!("100.64.0.0/33".parse::<Ipv4Cidr>().is_err());
        assert!("fd00::/64".parse::<Ipv4Cidr>().is_err());
        Ok(())
    }

    #[test]
    fn pods_cidr_examples() {
        assert_eq!(validate_pods_cidr("100.64.0.0/24"), Ok(()));
        assert_eq!(validate_pods_cidr("198.19.128.0/20"), Ok(()));
        assert!(validate_pods_cidr("203.0.113.0/24").is_err());
        assert!(validate_pods_cidr("100.64.0.0/30").is_err());
        assert!(validate_pods_cidr("100.64.0.0/15").is_err());
        assert!(validate_pods_cidr("not-a-cidr").is_err());
    }

    #[test]
    fn pool_boundaries() {
        assert_eq!(validate_pods_cidr("100.127.255.240/28"), Ok(()));
        assert!(validate_pods_cidr("100.128.0.0/28").is_err());
        assert!(validate_pods_cidr("198.18.255.240/28").is_err());
    }

    proptest! {
        #[test]
        fn blocks_inside_the_cgnat_pool_pass(offset in 0_u32..(1 << 22), prefix in 16_u8..=28) {
            let address = Ipv4Addr::from_bits((100_u32 << 24) | (64 << 16) | offset);
            let cidr = format!("{address}/{prefix}");
            prop_assert_eq!(validate_pods_cidr(&cidr), Ok(()));
        }

        #[test]
        fn blocks_outside_the_accepted_sizes_fail(prefix in prop_oneof![0_u8..16, 29_u8..=32]) {
            let cidr = format!("100.64.0.0/{prefix}");
            prop_assert!(validate_pods_cidr(&cidr).is_err());
        }
    }
}
