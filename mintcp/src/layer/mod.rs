//! The process logic of protocol layers.
//!
//! ## Layering
//!
//! Each protocol is split into two parts; the segment logic contained in `wire` and the
//! processing part in this module. An endpoint represents the local state of a protocol. This
//! state is used to process segments of that layer and is open to inspection and modification by
//! the user program while no processing takes place.
//!
//! The network layer is not implemented here. It is only described by the [`ip::Deliver`] trait
//! through which the tcp endpoint hands out finished segments, while inbound segments are passed
//! to [`tcp::Endpoint::receive`] by whoever implements that layer.
//!
//! [`ip::Deliver`]: ip/trait.Deliver.html
//! [`tcp::Endpoint::receive`]: tcp/struct.Endpoint.html#method.receive
use core::fmt;

pub mod ip;
pub mod tcp;

/// The result type of layer operations.
pub type Result<T> = core::result::Result<T, Error>;

/// The error type of layer operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// The operation was not permitted.
    ///
    /// Returned for a connection that already exists or a request that the connection state does
    /// not allow.
    Illegal,

    /// The handle does not refer to an existing connection.
    Unknown,

    /// The requested segment does not fit into the 16-bit length of the pseudo header.
    BadSize,

    /// Memory for a record or a buffer could not be obtained.
    ///
    /// Nothing was committed when this is returned, the operation can be retried once memory
    /// was freed.
    Allocation,

    /// The network layer failed to deliver a segment.
    ///
    /// Unlike `Allocation`, the state of the connection was already advanced as if the segment
    /// had been transmitted and lost.
    Delivery(ip::DeliveryError),

    /// An inbound segment was rejected before processing.
    Malformed(crate::wire::Error),
}

/// Can convert from a wire error.
///
/// This indicates the tcp layer tried to operate on a segment that did not parse.
impl From<crate::wire::Error> for Error {
    fn from(err: crate::wire::Error) -> Self {
        Error::Malformed(err)
    }
}

impl From<ip::DeliveryError> for Error {
    fn from(err: ip::DeliveryError) -> Self {
        Error::Delivery(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Illegal => write!(f, "operation not permitted"),
            Error::Unknown => write!(f, "no such connection"),
            Error::BadSize => write!(f, "segment too large"),
            Error::Allocation => write!(f, "allocation failure"),
            Error::Delivery(err) => write!(f, "delivery failure: {}", err),
            Error::Malformed(err) => write!(f, "rejected segment: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
