//! The network layer parts a TCP segment depends on.
//!
//! Only as much of IPv4 as the transport checksum and the connection identity require: the
//! address type, the protocol number and the checksum primitives.
use core::fmt;
#[cfg(feature = "std")]
use core::str::FromStr;

enum_with_unknown! {
    /// IP datagram encapsulated protocol.
    pub enum Protocol(u8) {
        /// The internet control message protocol.
        Icmp = 0x01,
        /// The transmission control protocol.
        Tcp  = 0x06,
        /// The user datagram protocol.
        Udp  = 0x11,
    }
}

/// A four-octet IPv4 address.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Address(pub [u8; 4]);

impl Address {
    /// Construct an IPv4 address from parts.
    pub const fn new(a0: u8, a1: u8, a2: u8, a3: u8) -> Address {
        Address([a0, a1, a2, a3])
    }

    /// Return an IPv4 address as a sequence of octets, in big-endian.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(feature = "std")]
impl From<::std::net::Ipv4Addr> for Address {
    fn from(x: ::std::net::Ipv4Addr) -> Address {
        Address(x.octets())
    }
}

#[cfg(feature = "std")]
impl From<Address> for ::std::net::Ipv4Addr {
    fn from(Address(x): Address) -> ::std::net::Ipv4Addr {
        x.into()
    }
}

#[cfg(feature = "std")]
impl FromStr for Address {
    type Err = ::std::net::AddrParseError;

    fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
        ::std::net::Ipv4Addr::from_str(s).map(Address::from)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.0;
        write!(f, "{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

/// Internet checksum primitives.
///
/// All sums here are RFC 1071 one's complement sums *without* the final complement, so that
/// partial sums over separate buffers can be combined.
pub mod checksum {
    use byteorder::{ByteOrder, NetworkEndian};

    use super::{Address, Protocol};

    /// Length of the IPv4 pseudo header of a transport checksum.
    pub const PSEUDO_HEADER_LEN: usize = 12;

    fn propagate_carries(word: u32) -> u16 {
        let sum = (word >> 16) + (word & 0xffff);
        ((sum >> 16) as u16) + (sum as u16)
    }

    /// Compute an RFC 1071 compliant checksum (without the final complement).
    pub fn data(mut data: &[u8]) -> u16 {
        let mut accum = 0;

        // For each 32-byte chunk...
        const CHUNK_SIZE: usize = 32;
        while data.len() >= CHUNK_SIZE {
            let mut d = &data[..CHUNK_SIZE];
            // ... take by 2 bytes and sum them.
            while d.len() >= 2 {
                accum += NetworkEndian::read_u16(d) as u32;
                d = &d[2..];
            }

            data = &data[CHUNK_SIZE..];
        }

        // Sum the rest that does not fit the last 32-byte chunk,
        // taking by 2 bytes.
        while data.len() >= 2 {
            accum += NetworkEndian::read_u16(data) as u32;
            data = &data[2..];
        }

        // Add the last remaining odd byte, if any.
        if let Some(&value) = data.first() {
            accum += (value as u32) << 8;
        }

        propagate_carries(accum)
    }

    /// Combine several RFC 1071 compliant checksums.
    pub fn combine(checksums: &[u16]) -> u16 {
        let mut accum: u32 = 0;
        for &word in checksums {
            accum += word as u32;
        }
        propagate_carries(accum)
    }

    /// Write the pseudo header of a transport segment.
    ///
    /// The layout is source address, destination address, a zero octet, the protocol number and
    /// the 16-bit segment length, in network byte order and without padding.
    ///
    /// # Panics
    /// This function panics if `buffer` is shorter than [`PSEUDO_HEADER_LEN`].
    ///
    /// [`PSEUDO_HEADER_LEN`]: constant.PSEUDO_HEADER_LEN.html
    pub fn emit_pseudo_header(
        buffer: &mut [u8],
        src_addr: Address,
        dst_addr: Address,
        protocol: Protocol,
        length: u16,
    ) {
        buffer[0..4].copy_from_slice(src_addr.as_bytes());
        buffer[4..8].copy_from_slice(dst_addr.as_bytes());
        buffer[8] = 0;
        buffer[9] = protocol.into();
        NetworkEndian::write_u16(&mut buffer[10..12], length);
    }

    /// Compute an IP pseudo header checksum.
    pub fn pseudo_header(src_addr: Address, dst_addr: Address, protocol: Protocol, length: u16)
        -> u16
    {
        let mut header = [0u8; PSEUDO_HEADER_LEN];
        emit_pseudo_header(&mut header, src_addr, dst_addr, protocol, length);
        data(&header)
    }
}
