//! Parses an IEEE EUI-48 hardware address and continues to construct a
//! WakeOnLAN packet (so called "Magic Packet Technology") which is then
//! broadcast to a subnet over UDP.
use std::fmt;
use std::io;
use std::net::{Ipv4Addr, UdpSocket};
use std::str::FromStr;

use log::{debug, warn};
use thiserror::Error;

use crate::subnet::BroadcastAddress;

const EUI48_LEN: usize = 6;
const SYNC_STREAM: [u8; EUI48_LEN] = [0xFF; EUI48_LEN];
const MAC_REPETITIONS: usize = 16;
const MAGIC_PACKET_LEN: usize = EUI48_LEN + EUI48_LEN * MAC_REPETITIONS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareAddress([u8; EUI48_LEN]);

pub struct MagicPacket([u8; MAGIC_PACKET_LEN]);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Wrong number of groups or digits
    #[error("invalid length")]
    InvalidLength,

    /// A group is not one or two hexadecimal digits
    #[error("invalid hexadecimal group '{0}'")]
    InvalidGroup(String),

    /// Only ':' and '-' may separate groups
    #[error("unexpected separator '{0}'")]
    UnexpectedSeparator(char),

    /// Both ':' and '-' appear in the same address
    #[error("mixed separators")]
    MixedSeparators,
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("socket failure: {0}")]
    Socket(#[from] io::Error),
}

impl HardwareAddress {
    pub fn octets(&self) -> [u8; EUI48_LEN] {
        self.0
    }
}

/// Accepts six groups of one or two hex digits separated consistently by
/// either colons or hyphens, or twelve contiguous hex digits.
impl FromStr for HardwareAddress {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let octets = match input.chars().find(|c| !c.is_ascii_hexdigit()) {
            Some(separator) => parse_separated(input, separator)?,
            None => parse_contiguous(input)?,
        };

        Ok(HardwareAddress(octets))
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups: Vec<String> = self.octets().iter().map(|b| format!("{:02X}", b)).collect();
        write!(f, "{}", groups.join(":"))
    }
}

fn parse_separated(input: &str, separator: char) -> Result<[u8; EUI48_LEN], ParseError> {
    if separator != ':' && separator != '-' {
        return Err(ParseError::UnexpectedSeparator(separator));
    }

    let other = if separator == ':' { '-' } else { ':' };
    if input.contains(other) {
        return Err(ParseError::MixedSeparators);
    }

    let groups: Vec<&str> = input.split(separator).collect();
    if groups.len() != EUI48_LEN {
        return Err(ParseError::InvalidLength);
    }

    let mut octets = [0u8; EUI48_LEN];
    for (octet, group) in octets.iter_mut().zip(groups) {
        *octet = parse_group(group)?;
    }

    Ok(octets)
}

fn parse_group(group: &str) -> Result<u8, ParseError> {
    // from_str_radix would also accept a leading '+'
    if group.is_empty() || group.len() > 2 || !group.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ParseError::InvalidGroup(group.to_string()));
    }

    u8::from_str_radix(group, 16).map_err(|_| ParseError::InvalidGroup(group.to_string()))
}

/// Every adjacent pair of the twelve digits is one byte.
fn parse_contiguous(input: &str) -> Result<[u8; EUI48_LEN], ParseError> {
    if input.len() != EUI48_LEN * 2 {
        return Err(ParseError::InvalidLength);
    }

    let mut octets = [0u8; EUI48_LEN];
    for (i, octet) in octets.iter_mut().enumerate() {
        let pair = &input[i * 2..i * 2 + 2];
        *octet = u8::from_str_radix(pair, 16).map_err(|_| ParseError::InvalidGroup(pair.to_string()))?;
    }

    Ok(octets)
}

impl MagicPacket {
    /// Creates a magic packet for the given hardware address: six bytes of
    /// 0xFF followed by sixteen repetitions of the address.
    pub fn new(mac: &HardwareAddress) -> MagicPacket {
        let mut packet = [0u8; MAGIC_PACKET_LEN];
        packet[..EUI48_LEN].copy_from_slice(&SYNC_STREAM);

        // the address starts at the 7th byte so that the
        // first 6 bytes stay as 0xFF
        for chunk in packet[EUI48_LEN..].chunks_exact_mut(EUI48_LEN) {
            chunk.copy_from_slice(&mac.0);
        }

        MagicPacket(packet)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Sends the packet as a single UDP datagram. The socket is dropped on
    /// every return path; a short send counts as a failure and is not retried.
    pub fn broadcast(&self, target: BroadcastAddress) -> Result<(), SendError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(|e| {
            warn!("unable to create udp socket: {}", e);
            e
        })?;
        socket.set_broadcast(true).map_err(|e| {
            warn!("unable to enable broadcast on udp socket: {}", e);
            e
        })?;

        debug!("sending {} byte magic packet to {}", MAGIC_PACKET_LEN, target);
        let sent = socket.send_to(self.as_bytes(), target.socket_addr()).map_err(|e| {
            warn!("unable to send magic packet to {}: {}", target, e);
            e
        })?;

        if sent != MAGIC_PACKET_LEN {
            warn!("short send to {}: {} of {} bytes", target, sent, MAGIC_PACKET_LEN);
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {} of {} bytes", sent, MAGIC_PACKET_LEN),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(input: &str) -> Result<HardwareAddress, ParseError> {
        input.parse()
    }

    #[test]
    fn test_parse_colons() {
        let mac = parse("AA:BB:CC:DD:EE:FF").unwrap();
        assert_eq!(mac.octets(), [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[test]
    fn test_parse_hyphens() {
        let mac = parse("aa-bb-cc-dd-ee-ff").unwrap();
        assert_eq!(mac.octets(), [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[test]
    fn test_parse_single_digit_groups() {
        let mac = parse("1:2:3:a:b:c").unwrap();
        assert_eq!(mac.octets(), [0x01, 0x02, 0x03, 0x0A, 0x0B, 0x0C]);
    }

    #[test]
    fn test_parse_contiguous() {
        assert_eq!(parse("aabbccddeeff").unwrap(), parse("AA:BB:CC:DD:EE:FF").unwrap());
        assert_eq!(parse("001122334455").unwrap().octets(), [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    }

    #[test]
    fn test_parse_mixed_separators() {
        assert_eq!(parse("AA:BB-CC:DD:EE:FF"), Err(ParseError::MixedSeparators));
        assert_eq!(parse("AA-aa:aa-aa-aa-aa"), Err(ParseError::MixedSeparators));
    }

    #[test]
    fn test_parse_gibberish() {
        assert!(parse("hello").is_err());
        assert!(parse("bad-mac").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_parse_separator_order() {
        assert!(parse("-----abababababab").is_err());
    }

    #[test]
    fn test_parse_invalid_alphabet() {
        assert!(parse("he-js-an-cc-dd-ee").is_err());
        assert!(parse("aabbccddeegg").is_err());
        assert_eq!(parse("AA.BB.CC.DD.EE.FF"), Err(ParseError::UnexpectedSeparator('.')));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(parse("ab-cd"), Err(ParseError::InvalidLength));
        assert_eq!(parse("ab-cd-ab-cd-ab-cd-ab"), Err(ParseError::InvalidLength));
        assert_eq!(parse("aabbccddeef"), Err(ParseError::InvalidLength));
        assert_eq!(parse("aabbccddeeff00"), Err(ParseError::InvalidLength));
    }

    #[test]
    fn test_parse_out_of_range_group() {
        assert_eq!(
            parse("100:BB:CC:DD:EE:FF"),
            Err(ParseError::InvalidGroup(String::from("100")))
        );
        assert!(parse("+A:BB:CC:DD:EE:FF").is_err());
        assert!(parse("AA::CC:DD:EE:FF").is_err());
    }

    #[test]
    fn test_display() {
        let mac = parse("0a-1b-2c-3d-4e-5f").unwrap();
        assert_eq!(mac.to_string(), "0A:1B:2C:3D:4E:5F");

        let mac = parse("000000000001").unwrap();
        assert_eq!(mac.to_string(), "00:00:00:00:00:01");
    }

    #[test]
    fn test_magic() {
        let mac = parse("01:02:03:04:05:06").unwrap();
        let pkt = MagicPacket::new(&mac);
        let bytes = pkt.as_bytes();
        assert_eq!(bytes.len(), 102);

        // starts with padding
        assert_eq!(&bytes[..6], &[0xFF; 6]);

        // follows with 16 copies of the mac
        for chunk in bytes[6..].chunks(6) {
            assert_eq!(chunk, &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        }
        assert_eq!(&bytes[96..102], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    fn test_broadcast_delivers_whole_packet() {
        let receiver = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        receiver.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let port = receiver.local_addr().unwrap().port();

        let mac = parse("AA:BB:CC:DD:EE:FF").unwrap();
        let pkt = MagicPacket::new(&mac);
        pkt.broadcast(BroadcastAddress::new(Ipv4Addr::LOCALHOST, port)).unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(len, 102);
        assert_eq!(&buf[..len], pkt.as_bytes());
    }
}
