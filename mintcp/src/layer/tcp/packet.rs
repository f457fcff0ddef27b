//! Construction of outbound segments.
use crate::layer::{Error, Result};
use crate::layer::ip::Deliver;
use crate::storage::Arena;
use crate::wire::{IpProtocol, TcpFlags, tcp_packet, TCP_HEADER_LEN};

use super::checksum::checksum;
use super::connection::Connection;

/// Build one segment of a connection and hand it to the network layer.
///
/// Nothing about the connection changes when the segment could not be built. Once it was handed
/// to `ip` the sequence number advances by its sequence length, also when delivery failed.
pub(crate) fn transmit<A, D>(
    arena: &mut A,
    ip: &mut D,
    connection: &mut Connection,
    flags: TcpFlags,
    payload: &[u8],
) -> Result<()>
where
    A: Arena + ?Sized,
    D: Deliver + ?Sized,
{
    if payload.len() > usize::from(u16::max_value()) - TCP_HEADER_LEN {
        net_debug!("tcp: payload of {} bytes does not fit a segment", payload.len());
        return Err(Error::BadSize);
    }

    let mut repr = connection.segment(flags);
    repr.payload_len = payload.len() as u16;
    let len = repr.buffer_len();

    let mut buffer = match arena.allocate(len) {
        Some(buffer) => buffer,
        None => {
            net_debug!("tcp: no transmit buffer for {}", repr);
            return Err(Error::Allocation);
        },
    };
    if buffer.len() != len {
        arena.release(buffer);
        return Err(Error::Allocation);
    }

    {
        let packet = tcp_packet::new_unchecked_mut(&mut buffer);
        repr.emit(packet);
        packet.payload_mut_slice().copy_from_slice(payload);
    }

    let (header, data) = buffer.split_at(TCP_HEADER_LEN);
    let sum = match checksum(arena, header, data, connection.local, connection.remote) {
        Ok(sum) => sum,
        Err(err) => {
            net_debug!("tcp: no checksum for {}: {}", repr, err);
            arena.release(buffer);
            return Err(err);
        },
    };
    tcp_packet::new_unchecked_mut(&mut buffer).set_checksum(sum);

    let delivered = ip.send(connection.remote, IpProtocol::Tcp, &buffer);
    connection.send.next += repr.sequence_len();
    arena.release(buffer);

    match delivered {
        Ok(()) => {
            net_trace!("tcp: {} -> {}: {}", connection.local, connection.remote, repr);
            Ok(())
        },
        Err(err) => {
            net_debug!("tcp: {} -> {}: {} not delivered: {}",
                connection.local, connection.remote, repr, err);
            Err(Error::Delivery(err))
        },
    }
}
