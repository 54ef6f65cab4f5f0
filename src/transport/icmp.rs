//! ICMP / ICMPv6 echo message codec
//!
//! Only the echo pair is understood in detail; everything else decodes to
//! [`IcmpMessage::Other`] carrying its type and code. ICMPv6 checksums are
//! left at zero on encode because the kernel fills them in for raw ICMPv6
//! sockets (it needs the pseudo-header, which user space does not see).

use crate::types::IpVersion;
use thiserror::Error;

/// Size of the fixed ICMP echo header
pub const ICMP_HEADER_SIZE: usize = 8;

const ICMPV4_ECHO_REPLY: u8 = 0;
const ICMPV4_ECHO_REQUEST: u8 = 8;
const ICMPV6_ECHO_REQUEST: u8 = 128;
const ICMPV6_ECHO_REPLY: u8 = 129;

/// Identifier, sequence and payload shared by echo requests and replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Echo {
    pub identifier: u16,
    pub sequence: u16,
    pub payload: Vec<u8>,
}

/// A decoded ICMP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcmpMessage {
    EchoRequest(Echo),
    EchoReply(Echo),
    Other { icmp_type: u8, code: u8 },
}

/// Reasons a datagram does not decode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("packet too short: {0} bytes")]
    Truncated(usize),

    #[error("bad checksum: expected {expected:#06x}, computed {computed:#06x}")]
    BadChecksum { expected: u16, computed: u16 },
}

impl From<CodecError> for crate::error::AppError {
    fn from(error: CodecError) -> Self {
        Self::codec(error.to_string())
    }
}

impl IcmpMessage {
    /// Echo request with a zero-filled payload of `payload_size` bytes
    pub fn echo_request(identifier: u16, sequence: u16, payload_size: usize) -> Self {
        Self::EchoRequest(Echo {
            identifier,
            sequence,
            payload: vec![0; payload_size],
        })
    }

    /// Serialize for the given IP version
    pub fn encode(&self, version: IpVersion) -> Vec<u8> {
        let (icmp_type, code, echo) = match self {
            Self::EchoRequest(echo) => (request_type(version), 0, Some(echo)),
            Self::EchoReply(echo) => (reply_type(version), 0, Some(echo)),
            Self::Other { icmp_type, code } => (*icmp_type, *code, None),
        };

        let payload_len = echo.map_or(0, |e| e.payload.len());
        let mut packet = Vec::with_capacity(ICMP_HEADER_SIZE + payload_len);
        packet.extend_from_slice(&[icmp_type, code, 0, 0]);
        match echo {
            Some(echo) => {
                packet.extend_from_slice(&echo.identifier.to_be_bytes());
                packet.extend_from_slice(&echo.sequence.to_be_bytes());
                packet.extend_from_slice(&echo.payload);
            }
            None => packet.extend_from_slice(&[0; 4]),
        }

        if version == IpVersion::V4 {
            let sum = checksum(&packet);
            packet[2..4].copy_from_slice(&sum.to_be_bytes());
        }
        packet
    }

    /// Parse an ICMP message (IP header already stripped)
    pub fn decode(version: IpVersion, bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < ICMP_HEADER_SIZE {
            return Err(CodecError::Truncated(bytes.len()));
        }

        if version == IpVersion::V4 {
            // Summing a packet with its checksum in place yields zero.
            let computed = checksum(bytes);
            if computed != 0 {
                let expected = u16::from_be_bytes([bytes[2], bytes[3]]);
                return Err(CodecError::BadChecksum { expected, computed });
            }
        }

        let icmp_type = bytes[0];
        let code = bytes[1];
        let echo = || Echo {
            identifier: u16::from_be_bytes([bytes[4], bytes[5]]),
            sequence: u16::from_be_bytes([bytes[6], bytes[7]]),
            payload: bytes[ICMP_HEADER_SIZE..].to_vec(),
        };

        let message = if code != 0 {
            Self::Other { icmp_type, code }
        } else if icmp_type == reply_type(version) {
            Self::EchoReply(echo())
        } else if icmp_type == request_type(version) {
            Self::EchoRequest(echo())
        } else {
            Self::Other { icmp_type, code }
        };
        Ok(message)
    }
}

fn reply_type(version: IpVersion) -> u8 {
    match version {
        IpVersion::V4 => ICMPV4_ECHO_REPLY,
        IpVersion::V6 => ICMPV6_ECHO_REPLY,
    }
}

fn request_type(version: IpVersion) -> u8 {
    match version {
        IpVersion::V4 => ICMPV4_ECHO_REQUEST,
        IpVersion::V6 => ICMPV6_ECHO_REQUEST,
    }
}

/// RFC 1071 internet checksum
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for pair in &mut chunks {
        sum = sum.wrapping_add(u32::from(u16::from_be_bytes([pair[0], pair[1]])));
    }
    if let [last] = chunks.remainder() {
        sum = sum.wrapping_add(u32::from(*last) << 8);
    }
    while (sum >> 16) != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

/// Split a raw IPv4 datagram into its TTL and ICMP body
///
/// Raw IPv4 sockets deliver the IP header; returns `None` when the bytes
/// do not start with a plausible one.
pub fn strip_ipv4_header(datagram: &[u8]) -> Option<(u8, &[u8])> {
    let first = *datagram.first()?;
    if first >> 4 != 4 {
        return None;
    }
    let header_len = usize::from(first & 0x0f) * 4;
    if header_len < 20 || datagram.len() < header_len {
        return None;
    }
    Some((datagram[8], &datagram[header_len..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_request_layout_v4() {
        let packet = IcmpMessage::echo_request(0x1234, 7, 56).encode(IpVersion::V4);
        assert_eq!(packet.len(), ICMP_HEADER_SIZE + 56);
        assert_eq!(packet[0], 8);
        assert_eq!(packet[1], 0);
        assert_eq!(&packet[4..6], &[0x12, 0x34]);
        assert_eq!(&packet[6..8], &[0, 7]);
        assert!(packet[8..].iter().all(|&b| b == 0));
        assert_eq!(checksum(&packet), 0);
    }

    #[test]
    fn test_echo_request_layout_v6() {
        let packet = IcmpMessage::echo_request(1, 2, 0).encode(IpVersion::V6);
        assert_eq!(packet, vec![128, 0, 0, 0, 0, 1, 0, 2]);
    }

    #[test]
    fn test_known_checksum() {
        // Echo request, id 1, seq 1, no payload
        let packet = IcmpMessage::echo_request(1, 1, 0).encode(IpVersion::V4);
        assert_eq!(&packet[2..4], &[0xf7, 0xfd]);
    }

    #[test]
    fn test_odd_length_checksum() {
        let packet = IcmpMessage::echo_request(9, 3, 5).encode(IpVersion::V4);
        assert_eq!(checksum(&packet), 0);
        assert!(IcmpMessage::decode(IpVersion::V4, &packet).is_ok());
    }

    #[test]
    fn test_decode_echo_reply() {
        let reply = IcmpMessage::EchoReply(Echo {
            identifier: 42,
            sequence: 3,
            payload: b"abc".to_vec(),
        });
        let decoded = IcmpMessage::decode(IpVersion::V4, &reply.encode(IpVersion::V4)).unwrap();
        assert_eq!(decoded, reply);
    }

    #[test]
    fn test_decode_v6_reply_ignores_checksum() {
        let bytes = [129, 0, 0xde, 0xad, 0, 5, 0, 9];
        match IcmpMessage::decode(IpVersion::V6, &bytes).unwrap() {
            IcmpMessage::EchoReply(echo) => {
                assert_eq!(echo.identifier, 5);
                assert_eq!(echo.sequence, 9);
                assert!(echo.payload.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(
            IcmpMessage::decode(IpVersion::V4, &[0, 0, 0]),
            Err(CodecError::Truncated(3))
        );
    }

    #[test]
    fn test_decode_bad_checksum() {
        let mut packet = IcmpMessage::echo_request(1, 1, 4).encode(IpVersion::V4);
        packet[9] ^= 0xff;
        assert!(matches!(
            IcmpMessage::decode(IpVersion::V4, &packet),
            Err(CodecError::BadChecksum { .. })
        ));
    }

    #[test]
    fn test_decode_other_messages() {
        let unreachable = IcmpMessage::Other { icmp_type: 3, code: 1 }.encode(IpVersion::V4);
        let decoded = IcmpMessage::decode(IpVersion::V4, &unreachable).unwrap();
        assert_eq!(decoded, IcmpMessage::Other { icmp_type: 3, code: 1 });

        let neighbor_solicit = [135, 0, 0, 0, 0, 0, 0, 0];
        let decoded = IcmpMessage::decode(IpVersion::V6, &neighbor_solicit).unwrap();
        assert_eq!(decoded, IcmpMessage::Other { icmp_type: 135, code: 0 });
    }

    #[test]
    fn test_strip_ipv4_header() {
        let icmp = IcmpMessage::echo_request(1, 1, 0).encode(IpVersion::V4);
        let mut datagram = vec![0x45, 0, 0, 28, 0, 0, 0, 0, 57, 1, 0, 0, 127, 0, 0, 1, 127, 0, 0, 1];
        datagram.extend_from_slice(&icmp);

        let (ttl, body) = strip_ipv4_header(&datagram).unwrap();
        assert_eq!(ttl, 57);
        assert_eq!(body, icmp.as_slice());

        assert!(strip_ipv4_header(&icmp).is_none());
        assert!(strip_ipv4_header(&[0x46, 0, 0]).is_none());
    }
}
