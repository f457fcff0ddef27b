use core::convert::TryFrom;

use crate::storage::Arena;
use crate::wire::{ip::checksum as ip_checksum, IpProtocol, Ipv4Address};
use crate::layer::{Error, Result};

/// Compute the checksum of an outbound segment.
///
/// The pseudo header, `header` and `payload` are concatenated into one buffer drawn from the
/// arena, which is summed and released again. The header must have its checksum field zeroed.
/// The returned value is complemented and ready to be written into the checksum field.
///
/// Fails with `Error::Allocation` if the arena can not provide the buffer, and with
/// `Error::BadSize` if the segment is longer than the pseudo header can describe.
pub fn checksum<A: Arena + ?Sized>(
    arena: &mut A,
    header: &[u8],
    payload: &[u8],
    src_addr: Ipv4Address,
    dst_addr: Ipv4Address,
) -> Result<u16> {
    let segment_len = header.len() + payload.len();
    let length = u16::try_from(segment_len).map_err(|_| Error::BadSize)?;

    let total = ip_checksum::PSEUDO_HEADER_LEN + segment_len;
    let mut scratch = arena.allocate(total).ok_or(Error::Allocation)?;
    if scratch.len() != total {
        arena.release(scratch);
        return Err(Error::Allocation);
    }

    let (pseudo, segment) = scratch.split_at_mut(ip_checksum::PSEUDO_HEADER_LEN);
    ip_checksum::emit_pseudo_header(pseudo, src_addr, dst_addr, IpProtocol::Tcp, length);
    let (head, tail) = segment.split_at_mut(header.len());
    head.copy_from_slice(header);
    tail.copy_from_slice(payload);

    let sum = !ip_checksum::data(&scratch);
    arena.release(scratch);
    Ok(sum)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::{Bounded, Heap};
    use crate::wire::{TcpFlags, TcpRepr, TcpSeqNumber, tcp_packet};

    const SRC: Ipv4Address = Ipv4Address::new(10, 0, 0, 1);
    const DST: Ipv4Address = Ipv4Address::new(203, 0, 113, 9);

    fn segment(payload: &[u8]) -> Vec<u8> {
        let repr = TcpRepr {
            src_port: 5000,
            dst_port: 443,
            seq_number: TcpSeqNumber(0x0102_0304),
            ack_number: TcpSeqNumber(0),
            flags: TcpFlags::SYN | TcpFlags::FIN,
            window_len: 65535,
            payload_len: payload.len() as u16,
        };
        let mut buffer = vec![0; repr.buffer_len()];
        let packet = tcp_packet::new_unchecked_mut(&mut buffer);
        repr.emit(packet);
        packet.payload_mut_slice().copy_from_slice(payload);
        buffer
    }

    #[test]
    fn matches_fill() {
        let payloads: [&[u8]; 3] = [b"", b"hello", b"odd"];
        for payload in payloads.iter() {
            let mut buffer = segment(payload);
            let (header, data) = buffer.split_at(20);
            let sum = checksum(&mut Heap, header, data, SRC, DST).unwrap();

            let packet = tcp_packet::new_unchecked_mut(&mut buffer);
            packet.fill_checksum(SRC, DST);
            assert_eq!(packet.checksum(), sum);
        }
    }

    #[test]
    fn round_trip_is_zero() {
        let mut buffer = segment(b"hello");
        let sum = {
            let (header, data) = buffer.split_at(20);
            checksum(&mut Heap, header, data, SRC, DST).unwrap()
        };
        tcp_packet::new_unchecked_mut(&mut buffer).set_checksum(sum);

        let (header, data) = buffer.split_at(20);
        assert_eq!(checksum(&mut Heap, header, data, SRC, DST), Ok(0));
        assert!(tcp_packet::new_unchecked(&buffer).verify_checksum(SRC, DST));
    }

    #[test]
    fn scratch_exhausted() {
        let buffer = segment(b"hello");
        let (header, data) = buffer.split_at(20);

        let mut arena = Bounded::new(12 + 24);
        assert_eq!(checksum(&mut arena, header, data, SRC, DST), Err(Error::Allocation));
        assert_eq!(arena.outstanding(), 0);

        let mut arena = Bounded::new(12 + 25);
        assert!(checksum(&mut arena, header, data, SRC, DST).is_ok());
        assert_eq!(arena.outstanding(), 0);
        assert_eq!(arena.peak(), 37);
    }

    #[test]
    fn oversized() {
        let payload = vec![0; 65536 - 20];
        let header = [0; 20];
        assert_eq!(checksum(&mut Heap, &header, &payload, SRC, DST), Err(Error::BadSize));
    }
}
