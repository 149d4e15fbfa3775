//! IPv4 CIDR blocks

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::ProvisionError;

/// An IPv4 address range in `a.b.c.d/n` notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Cidr {
    addr: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self, ProvisionError> {
        if prefix > 32 {
            return Err(ProvisionError::invalid(format!(
                "prefix length must be between 0 and 32, got {}",
                prefix
            )));
        }
        Ok(Self { addr, prefix })
    }

    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    fn mask(&self) -> u32 {
        if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix))
        }
    }

    /// First address of the range
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) & self.mask())
    }

    /// Last address of the range
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) | !self.mask())
    }

    /// True if every address of `other` lies inside this range
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix >= self.prefix
            && u32::from(other.network()) & self.mask() == u32::from(self.network())
    }

    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s.split_once('/').ok_or_else(|| {
            ProvisionError::invalid(format!("CIDR block '{}' must be in format x.x.x.x/n", s))
        })?;
        let addr: Ipv4Addr = addr.parse().map_err(|_| {
            ProvisionError::invalid(format!("invalid IP address in CIDR block '{}'", s))
        })?;
        let prefix: u8 = prefix.parse().map_err(|_| {
            ProvisionError::invalid(format!("invalid prefix length in CIDR block '{}'", s))
        })?;
        Self::new(addr, prefix)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

/// Check that `value` is a syntactically valid CIDR block
pub fn validate(value: &str) -> Result<(), ProvisionError> {
    value.parse::<Ipv4Cidr>().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_blocks() {
        let cidr: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();
        assert_eq!(cidr.prefix(), 16);
        assert_eq!(cidr.to_string(), "10.0.0.0/16");
        assert!(validate("0.0.0.0/0").is_ok());
    }

    #[test]
    fn rejects_malformed_blocks() {
        assert!(validate("10.0.0.0").is_err());
        assert!(validate("10.0.0/16").is_err());
        assert!(validate("10.0.0.256/16").is_err());
        assert!(validate("10.0.0.0/33").is_err());
        assert!(validate("10.0.0.0/x").is_err());
    }

    #[test]
    fn containment_and_overlap() {
        let vpc: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();
        let subnet: Ipv4Cidr = "10.0.1.0/24".parse().unwrap();
        let outside: Ipv4Cidr = "10.1.0.0/24".parse().unwrap();

        assert!(vpc.contains(&subnet));
        assert!(!subnet.contains(&vpc));
        assert!(!vpc.contains(&outside));
        assert!(subnet.overlaps(&vpc));
        assert!(!subnet.overlaps(&outside));
    }

    #[test]
    fn network_and_broadcast() {
        let cidr: Ipv4Cidr = "192.168.1.77/24".parse().unwrap();
        assert_eq!(cidr.network(), Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(cidr.broadcast(), Ipv4Addr::new(192, 168, 1, 255));

        let all: Ipv4Cidr = "0.0.0.0/0".parse().unwrap();
        assert!(all.contains(&cidr));
    }
}
