//! SYN probe packet construction and reply parsing.
//!
//! Outgoing packets are built by explicit encoders that write each header
//! field at a fixed offset into an exact-length buffer. The TCP checksum is
//! computed over a separately assembled pseudo-header followed by the TCP
//! segment. Replies are read back through `pnet` packet views.

use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::tcp::{TcpFlags, TcpPacket};
use std::net::Ipv4Addr;

/// IPv4 header length without options.
pub const IPV4_HEADER_LEN: usize = 20;
/// TCP header length without options.
pub const TCP_HEADER_LEN: usize = 20;
/// Size of a complete SYN probe.
pub const SYN_PACKET_LEN: usize = IPV4_HEADER_LEN + TCP_HEADER_LEN;
/// Size of the TCP pseudo-header used for checksumming.
pub const PSEUDO_HEADER_LEN: usize = 12;

const PROTO_TCP: u8 = 6;
const FLAG_SYN: u8 = 0x02;
#[cfg(test)]
const FLAG_RST: u8 = 0x04;
#[cfg(test)]
const FLAG_ACK: u8 = 0x10;
const DEFAULT_TTL: u8 = 64;
const DEFAULT_WINDOW: u16 = 65535;

/// Fields of a single SYN probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynProbe {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence: u32,
    pub identification: u16,
    pub window: u16,
    pub ttl: u8,
}

impl SynProbe {
    /// Probe with randomized source port, sequence number and IP id.
    pub fn randomized(source: Ipv4Addr, destination: Ipv4Addr, destination_port: u16) -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        Self {
            source,
            destination,
            source_port: rng.gen_range(40000..60000),
            destination_port,
            sequence: rng.gen(),
            identification: rng.gen(),
            window: DEFAULT_WINDOW,
            ttl: DEFAULT_TTL,
        }
    }

    /// Encode the IP and TCP headers, checksums filled in.
    pub fn encode(&self) -> [u8; SYN_PACKET_LEN] {
        let mut packet = [0u8; SYN_PACKET_LEN];
        packet[..IPV4_HEADER_LEN].copy_from_slice(&self.encode_ipv4_header());
        packet[IPV4_HEADER_LEN..].copy_from_slice(&self.encode_tcp_header());
        packet
    }

    /// Encode the 20-byte IPv4 header.
    pub fn encode_ipv4_header(&self) -> [u8; IPV4_HEADER_LEN] {
        let mut h = [0u8; IPV4_HEADER_LEN];
        h[0] = 0x45; // version 4, IHL 5
        h[1] = 0; // DSCP/ECN
        h[2..4].copy_from_slice(&(SYN_PACKET_LEN as u16).to_be_bytes());
        h[4..6].copy_from_slice(&self.identification.to_be_bytes());
        h[6..8].copy_from_slice(&0u16.to_be_bytes()); // flags + fragment offset
        h[8] = self.ttl;
        h[9] = PROTO_TCP;
        h[12..16].copy_from_slice(&self.source.octets());
        h[16..20].copy_from_slice(&self.destination.octets());
        let checksum = internet_checksum(&h);
        h[10..12].copy_from_slice(&checksum.to_be_bytes());
        h
    }

    /// Encode the 20-byte TCP header with the SYN flag set.
    pub fn encode_tcp_header(&self) -> [u8; TCP_HEADER_LEN] {
        let mut t = [0u8; TCP_HEADER_LEN];
        t[0..2].copy_from_slice(&self.source_port.to_be_bytes());
        t[2..4].copy_from_slice(&self.destination_port.to_be_bytes());
        t[4..8].copy_from_slice(&self.sequence.to_be_bytes());
        t[8..12].copy_from_slice(&0u32.to_be_bytes()); // ack
        t[12] = ((TCP_HEADER_LEN / 4) as u8) << 4; // data offset
        t[13] = FLAG_SYN;
        t[14..16].copy_from_slice(&self.window.to_be_bytes());
        // 16..18 checksum, 18..20 urgent pointer
        let checksum = tcp_checksum(self.source, self.destination, &t);
        t[16..18].copy_from_slice(&checksum.to_be_bytes());
        t
    }
}

/// Internet checksum (RFC 1071).
///
/// One's-complement sum of big-endian 16-bit words with carries folded back
/// into the low 16 bits. A trailing odd byte is padded with zero.
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = words.remainder() {
        sum += u32::from(u16::from_be_bytes([*last, 0]));
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

/// Build the TCP pseudo-header for a segment of `tcp_len` bytes.
pub fn pseudo_header(source: Ipv4Addr, destination: Ipv4Addr, tcp_len: u16) -> [u8; PSEUDO_HEADER_LEN] {
    let mut p = [0u8; PSEUDO_HEADER_LEN];
    p[0..4].copy_from_slice(&source.octets());
    p[4..8].copy_from_slice(&destination.octets());
    p[8] = 0;
    p[9] = PROTO_TCP;
    p[10..12].copy_from_slice(&tcp_len.to_be_bytes());
    p
}

/// TCP checksum over pseudo-header plus segment.
///
/// The segment's own checksum field is included as-is, so pass it zeroed
/// when computing and filled in when validating.
pub fn tcp_checksum(source: Ipv4Addr, destination: Ipv4Addr, segment: &[u8]) -> u16 {
    let tcp_len = u16::try_from(segment.len()).unwrap_or(u16::MAX);
    let mut buf = Vec::with_capacity(PSEUDO_HEADER_LEN + segment.len());
    buf.extend_from_slice(&pseudo_header(source, destination, tcp_len));
    buf.extend_from_slice(segment);
    internet_checksum(&buf)
}

/// Check a segment whose checksum field is already filled in.
pub fn verify_tcp_checksum(source: Ipv4Addr, destination: Ipv4Addr, segment: &[u8]) -> bool {
    tcp_checksum(source, destination, segment) == 0
}

/// The interesting parts of an inbound TCP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpReply {
    pub source: Ipv4Addr,
    pub source_port: u16,
    pub destination_port: u16,
    pub syn: bool,
    pub ack: bool,
    pub rst: bool,
}

impl TcpReply {
    /// Parse a raw IPv4 datagram. Returns `None` for anything that is not
    /// a well-formed IPv4/TCP packet.
    pub fn parse(datagram: &[u8]) -> Option<Self> {
        if datagram.len() < IPV4_HEADER_LEN + TCP_HEADER_LEN {
            return None;
        }
        let ip = Ipv4Packet::new(datagram)?;
        if ip.get_version() != 4 || ip.get_next_level_protocol() != IpNextHeaderProtocols::Tcp {
            return None;
        }
        let header_len = usize::from(ip.get_header_length()) * 4;
        if header_len < IPV4_HEADER_LEN || datagram.len() < header_len + TCP_HEADER_LEN {
            return None;
        }
        let tcp = TcpPacket::new(&datagram[header_len..])?;
        let flags = tcp.get_flags();
        Some(Self {
            source: ip.get_source(),
            source_port: tcp.get_source(),
            destination_port: tcp.get_destination(),
            syn: flags & TcpFlags::SYN != 0,
            ack: flags & TcpFlags::ACK != 0,
            rst: flags & TcpFlags::RST != 0,
        })
    }

    /// Whether this packet answers `probe`: it must come from the probed
    /// address and port and be addressed to the probe's source port.
    pub fn answers(&self, probe: &SynProbe) -> bool {
        self.source == probe.destination
            && self.source_port == probe.destination_port
            && self.destination_port == probe.source_port
    }

    pub fn is_syn_ack(&self) -> bool {
        self.syn && self.ack
    }

    pub fn is_reset(&self) -> bool {
        self.rst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::packet::ipv4;
    use pnet::packet::tcp;

    fn probe() -> SynProbe {
        SynProbe {
            source: Ipv4Addr::new(192, 168, 1, 20),
            destination: Ipv4Addr::new(192, 168, 1, 1),
            source_port: 45000,
            destination_port: 443,
            sequence: 0xdead_beef,
            identification: 0x1234,
            window: 65535,
            ttl: 64,
        }
    }

    /// Build a reply as the target would send it.
    fn reply(probe: &SynProbe, flags: u8) -> Vec<u8> {
        let mirrored = SynProbe {
            source: probe.destination,
            destination: probe.source,
            source_port: probe.destination_port,
            destination_port: probe.source_port,
            ..*probe
        };
        let mut packet = mirrored.encode().to_vec();
        packet[IPV4_HEADER_LEN + 13] = flags;
        packet
    }

    #[test]
    fn test_checksum_known_vector() {
        // RFC 1071 example words.
        let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(internet_checksum(&data), !0xddf2);
    }

    #[test]
    fn test_checksum_odd_length_pads_with_zero() {
        assert_eq!(internet_checksum(&[0xab]), internet_checksum(&[0xab, 0x00]));
    }

    #[test]
    fn test_encoded_layout() {
        let p = probe();
        let packet = p.encode();
        assert_eq!(packet.len(), SYN_PACKET_LEN);
        assert_eq!(packet[0] >> 4, 4);
        assert_eq!(packet[9], PROTO_TCP);
        assert_eq!(&packet[16..20], &[192, 168, 1, 1]);
        assert_eq!(u16::from_be_bytes([packet[22], packet[23]]), 443);
        assert_eq!(packet[IPV4_HEADER_LEN + 13], FLAG_SYN);
        assert_eq!(packet[IPV4_HEADER_LEN + 12] >> 4, 5);
    }

    #[test]
    fn test_tcp_checksum_zero_residual() {
        let p = probe();
        let packet = p.encode();
        assert!(verify_tcp_checksum(p.source, p.destination, &packet[IPV4_HEADER_LEN..]));
    }

    #[test]
    fn test_ip_checksum_zero_residual() {
        let packet = probe().encode();
        assert_eq!(internet_checksum(&packet[..IPV4_HEADER_LEN]), 0);
    }

    #[test]
    fn test_checksum_residual_with_payload() {
        let p = probe();
        let mut segment = p.encode()[IPV4_HEADER_LEN..].to_vec();
        segment[16] = 0;
        segment[17] = 0;
        segment.extend_from_slice(b"odd");
        let sum = tcp_checksum(p.source, p.destination, &segment);
        segment[16..18].copy_from_slice(&sum.to_be_bytes());
        assert!(verify_tcp_checksum(p.source, p.destination, &segment));
    }

    #[test]
    fn test_checksums_match_pnet() {
        let p = probe();
        let packet = p.encode();

        let ip = Ipv4Packet::new(&packet).unwrap();
        assert_eq!(ipv4::checksum(&ip), ip.get_checksum());

        let segment = TcpPacket::new(&packet[IPV4_HEADER_LEN..]).unwrap();
        assert_eq!(
            tcp::ipv4_checksum(&segment, &p.source, &p.destination),
            segment.get_checksum()
        );
    }

    #[test]
    fn test_randomized_probe_ranges() {
        for _ in 0..64 {
            let p = SynProbe::randomized(Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST, 80);
            assert!((40000..60000).contains(&p.source_port));
            assert_eq!(p.destination_port, 80);
        }
    }

    #[test]
    fn test_parse_syn_ack_reply() {
        let p = probe();
        let r = TcpReply::parse(&reply(&p, FLAG_SYN | FLAG_ACK)).unwrap();
        assert!(r.answers(&p));
        assert!(r.is_syn_ack());
        assert!(!r.is_reset());
    }

    #[test]
    fn test_parse_rst_reply() {
        let p = probe();
        let r = TcpReply::parse(&reply(&p, FLAG_RST | FLAG_ACK)).unwrap();
        assert!(r.answers(&p));
        assert!(r.is_reset());
        assert!(!r.is_syn_ack());
    }

    #[test]
    fn test_uncorrelated_reply_rejected() {
        let p = probe();
        let mut other = p;
        other.destination_port = 22;
        let r = TcpReply::parse(&reply(&other, FLAG_SYN | FLAG_ACK)).unwrap();
        assert!(!r.answers(&p));

        let mut stranger = p;
        stranger.destination = Ipv4Addr::new(10, 9, 9, 9);
        let r = TcpReply::parse(&reply(&stranger, FLAG_RST)).unwrap();
        assert!(!r.answers(&p));
    }

    #[test]
    fn test_parse_rejects_non_tcp_and_short() {
        let mut packet = probe().encode();
        packet[9] = 17; // UDP
        assert!(TcpReply::parse(&packet).is_none());
        assert!(TcpReply::parse(&packet[..30]).is_none());
    }
}
