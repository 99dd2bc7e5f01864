//! Resolves a subnet written in CIDR notation to the IPv4 broadcast address
//! that magic packets are sent to.
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV4};

use ipnetwork::Ipv4Network;
use log::debug;
use thiserror::Error;

/// Conventional "discard" port used for wake on LAN.
pub const WOL_PORT: u16 = 9;

/// Longest dotted-quad IPv4 address, "255.255.255.255".
const MAX_ADDRESS_LEN: usize = 15;
const IPV4_MAX_PREFIX: i64 = 32;
const IPV6_MAX_PREFIX: i64 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastAddress {
    ip: Ipv4Addr,
    port: u16,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubnetError {
    #[error("expected <address>/<prefix-length>")]
    MissingPrefix,

    #[error("address '{0}' is longer than 15 characters")]
    AddressTooLong(String),

    #[error("invalid prefix length '{0}'")]
    InvalidPrefix(String),

    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    /// The address is a well-formed IPv6 address, which cannot be broadcast to.
    #[error("IPv6 is not supported")]
    Ipv6Unsupported,
}

impl SubnetError {
    pub fn is_ipv6_unsupported(&self) -> bool {
        matches!(self, SubnetError::Ipv6Unsupported)
    }
}

impl BroadcastAddress {
    pub fn new(ip: Ipv4Addr, port: u16) -> BroadcastAddress {
        BroadcastAddress { ip, port }
    }

    pub fn with_port(self, port: u16) -> BroadcastAddress {
        BroadcastAddress { port, ..self }
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.ip, self.port)
    }
}

impl fmt::Display for BroadcastAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Parses `<address>/<prefix-length>` and returns the subnet's broadcast
/// address (`address | !mask`) on the wake on LAN port.
///
/// A prefix of 0 yields 255.255.255.255. An IPv6 subnet is recognised and
/// rejected with [`SubnetError::Ipv6Unsupported`] so that callers can tell it
/// apart from malformed input.
pub fn resolve_broadcast(cidr: &str) -> Result<BroadcastAddress, SubnetError> {
    let (address, prefix_text) = cidr.split_once('/').ok_or(SubnetError::MissingPrefix)?;

    if address.len() > MAX_ADDRESS_LEN {
        return Err(SubnetError::AddressTooLong(address.to_string()));
    }

    let invalid_prefix = || SubnetError::InvalidPrefix(prefix_text.to_string());
    let prefix: i64 = prefix_text.parse().map_err(|_| invalid_prefix())?;

    let ip = match address.parse::<Ipv4Addr>() {
        Ok(ip) => ip,
        Err(_) => {
            return match address.parse::<Ipv6Addr>() {
                Ok(_) if (0..=IPV6_MAX_PREFIX).contains(&prefix) => Err(SubnetError::Ipv6Unsupported),
                Ok(_) => Err(invalid_prefix()),
                Err(_) => Err(SubnetError::InvalidAddress(address.to_string())),
            };
        }
    };

    if !(0..=IPV4_MAX_PREFIX).contains(&prefix) {
        return Err(invalid_prefix());
    }

    let network = Ipv4Network::new(ip, prefix as u8).map_err(|_| invalid_prefix())?;
    let broadcast = BroadcastAddress::new(network.broadcast(), WOL_PORT);
    debug!("subnet {} resolved to broadcast address {}", network, broadcast);

    Ok(broadcast)
}
