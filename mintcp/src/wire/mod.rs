/*! Low-level segment access and construction.

The `wire` module deals with the segment *representation*. It provides two levels of
functionality.

 * First, it provides functions to extract fields from sequences of octets, and to insert fields
   into sequences of octets. This happens in the lowercase byte wrapper [`tcp_packet`].
 * Second, it provides a compact, high-level representation of header data that can be created
   from parsing and emitted into a sequence of octets. This happens through [`TcpRepr`].

[`tcp_packet`]: struct.tcp_packet.html
[`TcpRepr`]: struct.TcpRepr.html

The segment header has a fixed length of 20 octets. Unlike the standard layout, the octet at
offset 12 holds the flag bits directly and the octet at offset 13 is reserved and always zero.
There are no options, so the payload starts right after the urgent pointer.

If `tcp_packet::check_len()` returned `Ok(())` then no field accessor or setter will panic.
`TcpRepr::parse()` never panics and `TcpRepr::emit()` never panics as long as the buffer is at
least `TcpRepr::buffer_len()` octets long.

# Examples

To emit a segment header into an octet buffer, and then parse it back:

```rust
use mintcp::wire::*;
let repr = TcpRepr {
    src_port:    5000,
    dst_port:    443,
    seq_number:  TcpSeqNumber(1),
    ack_number:  TcpSeqNumber(0),
    flags:       TcpFlags::SYN,
    window_len:  65535,
    payload_len: 0,
};
let src_addr = Ipv4Address::new(10, 0, 0, 1);
let dst_addr = Ipv4Address::new(10, 0, 0, 2);
let mut buffer = vec![0; repr.buffer_len()];
{ // emission
    let packet = tcp_packet::new_unchecked_mut(&mut buffer);
    repr.emit(packet);
    packet.fill_checksum(src_addr, dst_addr);
}
{ // parsing
    let packet = tcp_packet::new_checked(&buffer)
        .expect("truncated segment");
    let parsed = TcpRepr::parse(packet, TcpChecksum::Manual { src_addr, dst_addr })
        .expect("malformed segment");
    assert_eq!(repr, parsed);
}
```
*/
// Copyright (C) 2016 whitequark@whitequark.org
//
// in parts from `smoltcp` originally distributed under 0-clause BSD

mod field {
    pub(crate) type Field = ::core::ops::Range<usize>;
    pub(crate) type Rest  = ::core::ops::RangeFrom<usize>;
}

mod error;
pub mod ip;
mod tcp;

/// Describes how to handle checksums of received segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Checksum {
    /// Checksum must be checked manually.
    Manual,

    /// The checksum was checked by a lower layer or the device.
    Ignored,
}

pub use self::error::{
    Error,
    Result};

pub use self::ip::{
    Address as Ipv4Address,
    Protocol as IpProtocol};

pub use self::tcp::{
    tcp as tcp_packet,
    Checksum as TcpChecksum,
    Flags as TcpFlags,
    Repr as TcpRepr,
    SeqNumber as TcpSeqNumber,
    HEADER_LEN as TCP_HEADER_LEN};

impl Default for Checksum {
    fn default() -> Self {
        Checksum::Manual
    }
}
