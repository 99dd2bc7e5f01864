//! Turns the outcome of parsing both command line inputs into a single
//! message that names every input at fault.
use log::debug;
use thiserror::Error;

use crate::subnet::{resolve_broadcast, BroadcastAddress, SubnetError};
use crate::wol::{HardwareAddress, ParseError};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueError {
    #[error("ValueError: MAC")]
    Mac,

    #[error("ValueError: SubNet")]
    Subnet,

    #[error("ValueError: MAC and SubNet")]
    MacAndSubnet,

    #[error("ValueError: IPv6 Not Supported")]
    Ipv6Unsupported,

    #[error("ValueError: MAC and IPv6 Not Supported")]
    MacAndIpv6Unsupported,
}

/// Both inputs, validated and ready to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub mac: HardwareAddress,
    pub broadcast: BroadcastAddress,
}

pub fn usage(program: &str) -> String {
    format!("Usage: {} <MAC_ADDRESS> <SUBNET_CIDR>", program)
}

/// Validates whatever positional arguments were given. With only one
/// argument it is tried as both a hardware address and a subnet to guess
/// which of the two is missing.
pub fn validate_args(mac: Option<&str>, subnet: Option<&str>) -> Result<Target, ValueError> {
    match (mac, subnet) {
        (Some(mac), Some(subnet)) => validate(mac, subnet),
        (Some(single), None) => Err(diagnose_single(single)),
        (None, _) => Err(ValueError::MacAndSubnet),
    }
}

pub fn validate(mac: &str, subnet: &str) -> Result<Target, ValueError> {
    let mac = mac.parse::<HardwareAddress>();
    let broadcast = resolve_broadcast(subnet);

    if let Err(e) = &mac {
        debug!("invalid hardware address: {}", e);
    }
    if let Err(e) = &broadcast {
        debug!("invalid subnet: {}", e);
    }

    match (mac, broadcast) {
        (Ok(mac), Ok(broadcast)) => Ok(Target { mac, broadcast }),
        (mac, broadcast) => Err(combine(mac.err().as_ref(), broadcast.err().as_ref())
            .unwrap_or(ValueError::MacAndSubnet)),
    }
}

/// Joins the two independent failures so neither is dropped.
fn combine(mac: Option<&ParseError>, subnet: Option<&SubnetError>) -> Option<ValueError> {
    let ipv6 = subnet.map_or(false, SubnetError::is_ipv6_unsupported);

    match (mac.is_some(), subnet.is_some(), ipv6) {
        (false, false, _) => None,
        (true, false, _) => Some(ValueError::Mac),
        (false, true, false) => Some(ValueError::Subnet),
        (false, true, true) => Some(ValueError::Ipv6Unsupported),
        (true, true, false) => Some(ValueError::MacAndSubnet),
        (true, true, true) => Some(ValueError::MacAndIpv6Unsupported),
    }
}

fn diagnose_single(arg: &str) -> ValueError {
    let is_mac = arg.parse::<HardwareAddress>().is_ok();

    match resolve_broadcast(arg) {
        Err(e) if e.is_ipv6_unsupported() => ValueError::Ipv6Unsupported,
        Err(_) if is_mac => ValueError::Subnet,
        Ok(_) if !is_mac => ValueError::Mac,
        _ => ValueError::MacAndSubnet,
    }
}
