//! The IP layer, as seen from the transport.
//!
//! The tcp endpoint needs exactly two things from the layer below: the address it is reachable
//! at, which becomes the local side of every new connection, and a way to hand a finished
//! segment to a destination. Both are described by [`Deliver`]. Routing, fragmentation and the
//! device are entirely the implementor's concern.
//!
//! In the other direction, the implementor calls [`Endpoint::receive`] with the payload of every
//! datagram carrying the tcp protocol, together with the datagram's addresses.
//!
//! [`Deliver`]: trait.Deliver.html
//! [`Endpoint::receive`]: ../tcp/struct.Endpoint.html#method.receive
use core::fmt;

use crate::wire::{IpProtocol, Ipv4Address};

mod capture;

pub use capture::{Capture, Datagram};

/// A network layer able to transmit transport segments.
pub trait Deliver {
    /// The address of this host.
    fn local_addr(&self) -> Ipv4Address;

    /// Transmit one complete segment to `dst_addr`.
    ///
    /// The buffer is only borrowed for the duration of the call.
    fn send(&mut self, dst_addr: Ipv4Address, protocol: IpProtocol, segment: &[u8])
        -> Result<(), DeliveryError>;
}

/// Reasons for the network layer to refuse a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeliveryError {
    /// No route towards the destination address.
    Unreachable,

    /// The device queue or the buffers of the layer are full.
    Exhausted,

    /// The device reported an error.
    Device,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeliveryError::Unreachable => write!(f, "destination unreachable"),
            DeliveryError::Exhausted => write!(f, "no transmit buffer available"),
            DeliveryError::Device => write!(f, "device error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DeliveryError {}

impl<D: Deliver + ?Sized> Deliver for &'_ mut D {
    fn local_addr(&self) -> Ipv4Address {
        (**self).local_addr()
    }

    fn send(&mut self, dst_addr: Ipv4Address, protocol: IpProtocol, segment: &[u8])
        -> Result<(), DeliveryError>
    {
        (**self).send(dst_addr, protocol, segment)
    }
}
