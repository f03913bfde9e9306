//! Wireless radio trait
//!
//! The radio is the station-mode WiFi interface. Association may block for
//! a bounded, implementation-defined time.

use core::fmt;
use core::str::FromStr;

/// Errors that can occur with radio operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// The radio did not answer
    NotResponding,
    /// Access point rejected or could not be found
    AssociationFailed,
    /// Answer did not have the expected shape
    Malformed,
    /// Underlying serial/bus error
    Link,
}

/// Hardware (MAC) address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacAddress(pub [u8; 6]);

/// IPv4 address assigned to the station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IpAddress(pub [u8; 4]);

impl IpAddress {
    /// 0.0.0.0, reported by radios without a lease
    pub const UNSPECIFIED: Self = Self([0; 4]);

    /// Whether this is 0.0.0.0
    pub fn is_unspecified(&self) -> bool {
        *self == Self::UNSPECIFIED
    }
}

/// Text did not parse as an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AddressParseError;

impl FromStr for MacAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or(AddressParseError)?;
            if part.len() != 2 {
                return Err(AddressParseError);
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| AddressParseError)?;
        }
        if parts.next().is_some() {
            return Err(AddressParseError);
        }
        Ok(Self(octets))
    }
}

impl FromStr for IpAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 4];
        let mut parts = s.split('.');
        for octet in octets.iter_mut() {
            *octet = parts
                .next()
                .and_then(|p| p.parse().ok())
                .ok_or(AddressParseError)?;
        }
        if parts.next().is_some() {
            return Err(AddressParseError);
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

/// Trait for the station-mode wireless interface
///
/// Every query takes `&mut self`: radios behind a command link have to send
/// a request and read the answer.
pub trait Radio {
    /// Whether the station is currently associated with an access point
    fn is_associated(&mut self) -> bool;

    /// Attempt to associate with the given network
    fn associate(&mut self, ssid: &str, password: &str) -> Result<(), RadioError>;

    /// Hardware address of the station interface
    fn mac_address(&mut self) -> Result<MacAddress, RadioError>;

    /// Address currently assigned to the station interface
    fn local_ip(&mut self) -> Result<IpAddress, RadioError>;
}
