use alloc::vec::Vec;

use crate::wire::{self, IpProtocol, Ipv4Address, TcpChecksum, TcpRepr, tcp_packet};
use super::{Deliver, DeliveryError};

/// A network layer that keeps every delivered datagram in memory.
///
/// Stands in for a device in tests and demos: segments handed to it are recorded in order and
/// can be inspected, re-targeted or fed to another endpoint. It can also be told to refuse
/// delivery, to exercise the failure paths of a sender.
#[derive(Clone, Debug)]
pub struct Capture {
    local_addr: Ipv4Address,
    sent: Vec<Datagram>,
    failure: Option<DeliveryError>,
}

/// One delivered datagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Datagram {
    /// The source address, the local address of the capturing layer.
    pub src_addr: Ipv4Address,
    /// The destination the segment was addressed to.
    pub dst_addr: Ipv4Address,
    /// The encapsulated protocol.
    pub protocol: IpProtocol,
    /// A copy of the segment.
    pub payload: Vec<u8>,
}

impl Capture {
    /// Create a layer reachable at `local_addr` that accepts all segments.
    pub fn new(local_addr: Ipv4Address) -> Self {
        Capture {
            local_addr,
            sent: Vec::new(),
            failure: None,
        }
    }

    /// Refuse all following segments with the given error, or accept them again with `None`.
    pub fn fail_with(&mut self, failure: Option<DeliveryError>) {
        self.failure = failure;
    }

    /// All datagrams delivered so far, oldest first.
    pub fn sent(&self) -> &[Datagram] {
        &self.sent
    }

    /// Take all delivered datagrams, leaving the record empty.
    pub fn take(&mut self) -> Vec<Datagram> {
        core::mem::replace(&mut self.sent, Vec::new())
    }
}

impl Datagram {
    /// Parse the header of the contained segment.
    ///
    /// The checksum is verified against the addresses of the datagram.
    pub fn repr(&self) -> wire::Result<TcpRepr> {
        let packet = tcp_packet::new_checked(&self.payload)?;
        TcpRepr::parse(packet, TcpChecksum::Manual {
            src_addr: self.src_addr,
            dst_addr: self.dst_addr,
        })
    }

    /// The payload following the segment header.
    pub fn segment_payload(&self) -> &[u8] {
        self.payload.get(wire::TCP_HEADER_LEN..).unwrap_or(&[])
    }
}

impl Deliver for Capture {
    fn local_addr(&self) -> Ipv4Address {
        self.local_addr
    }

    fn send(&mut self, dst_addr: Ipv4Address, protocol: IpProtocol, segment: &[u8])
        -> Result<(), DeliveryError>
    {
        if let Some(failure) = self.failure {
            return Err(failure);
        }

        self.sent.push(Datagram {
            src_addr: self.local_addr,
            dst_addr,
            protocol,
            payload: segment.to_vec(),
        });
        Ok(())
    }
}
