use crate::layer::Error;
use crate::layer::ip::{Capture, DeliveryError};
use crate::storage::Bounded;
use crate::wire::{self, Checksum, IpProtocol, Ipv4Address, TcpFlags, TcpRepr, TcpSeqNumber, tcp_packet};

use super::*;

const LOCAL: Ipv4Address = Ipv4Address::new(10, 0, 0, 1);
const REMOTE: Ipv4Address = Ipv4Address::new(203, 0, 113, 9);
const LOCAL_PORT: u16 = 5000;
const REMOTE_PORT: u16 = 443;

fn endpoint() -> Endpoint {
    Endpoint::new(Config::new(LOCAL))
}

fn bounded(limit: usize) -> Endpoint<Bounded> {
    Endpoint::with_arena(Config::new(LOCAL), Bounded::new(limit))
}

/// A segment from the remote to the local side.
fn inbound(flags: TcpFlags, seq: u32, payload: &[u8]) -> Vec<u8> {
    let repr = TcpRepr {
        src_port: REMOTE_PORT,
        dst_port: LOCAL_PORT,
        seq_number: TcpSeqNumber(seq),
        ack_number: TcpSeqNumber(0),
        flags,
        window_len: 1024,
        payload_len: payload.len() as u16,
    };
    let mut buffer = vec![0; repr.buffer_len()];
    let packet = tcp_packet::new_unchecked_mut(&mut buffer);
    repr.emit(packet);
    packet.payload_mut_slice().copy_from_slice(payload);
    packet.fill_checksum(REMOTE, LOCAL);
    buffer
}

fn state<A: crate::storage::Arena>(tcp: &Endpoint<A>, key: SlotKey) -> State {
    tcp.get(key).unwrap().current
}

/// Drive a fresh connection through a passive open.
fn established(tcp: &mut Endpoint, ip: &mut Capture) -> SlotKey {
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    tcp.listen(key).unwrap();
    tcp.receive(ip, &inbound(TcpFlags::SYN, 1000, &[]), REMOTE, LOCAL).unwrap();
    tcp.receive(ip, &inbound(TcpFlags::ACK, 1001, &[]), REMOTE, LOCAL).unwrap();
    assert_eq!(tcp.get(key).unwrap().current, State::Established);
    ip.take();
    key
}

#[test]
fn find_from_segment_perspective() {
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    let other = tcp.create(REMOTE, REMOTE_PORT + 1, LOCAL_PORT).unwrap();
    assert_ne!(key, other);

    assert_eq!(tcp.find(REMOTE, LOCAL, REMOTE_PORT, LOCAL_PORT), Some(key));
    assert_eq!(tcp.find(REMOTE, LOCAL, REMOTE_PORT + 1, LOCAL_PORT), Some(other));
    // The tuple seen from the local side does not match.
    assert_eq!(tcp.find(LOCAL, REMOTE, LOCAL_PORT, REMOTE_PORT), None);
    assert_eq!(tcp.find(REMOTE, LOCAL, REMOTE_PORT, LOCAL_PORT + 1), None);
    assert_eq!(tcp.find(LOCAL, LOCAL, REMOTE_PORT, LOCAL_PORT), None);

    let connection = tcp.get(key).unwrap();
    assert_eq!(connection.local, LOCAL);
    assert_eq!(connection.remote, REMOTE);
    assert_eq!(connection.local_port, LOCAL_PORT);
    assert_eq!(connection.remote_port, REMOTE_PORT);
    assert_eq!(connection.current, State::Closed);
}

#[test]
fn create_then_close() {
    let mut tcp = endpoint();
    assert!(tcp.is_empty());

    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    assert_eq!(tcp.len(), 1);
    tcp.close(key);

    assert!(tcp.is_empty());
    assert_eq!(tcp.find(REMOTE, LOCAL, REMOTE_PORT, LOCAL_PORT), None);
    assert!(tcp.get(key).is_none());
    assert_eq!(tcp.iter().count(), 0);

    // Stale keys are ignored, also after their slot was reused.
    tcp.close(key);
    let again = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    assert_ne!(key, again);
    tcp.close(key);
    assert_eq!(tcp.len(), 1);
    assert!(tcp.get(again).is_some());
}

#[test]
fn increasing_initial_sequence() {
    let mut tcp = endpoint();
    let mut isns = Vec::new();
    for port in 0..4 {
        let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT + port).unwrap();
        isns.push(tcp.get(key).unwrap().send.initial_seq);
    }

    for pair in isns.windows(2) {
        assert!(pair[0] < pair[1]);
        assert_eq!(pair[1] - pair[0], ISN_STEP as usize);
    }
    assert_eq!(isns[0], TcpSeqNumber(0));
}

#[test]
fn configured_initial_sequence_wraps() {
    let mut config = Config::new(LOCAL);
    config.initial_seq = TcpSeqNumber(u32::max_value() - 10);
    let mut tcp = Endpoint::new(config);

    let first = tcp.create(REMOTE, REMOTE_PORT, 1).unwrap();
    let second = tcp.create(REMOTE, REMOTE_PORT, 2).unwrap();
    let first = tcp.get(first).unwrap().send.next;
    let second = tcp.get(second).unwrap().send.next;
    assert_eq!(second, TcpSeqNumber(ISN_STEP - 11));
    assert!(first < second);
}

#[test]
fn duplicate_tuple() {
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    assert_eq!(tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT), Err(Error::Illegal));
    assert_eq!(tcp.len(), 1);
    assert_eq!(tcp.find(REMOTE, LOCAL, REMOTE_PORT, LOCAL_PORT), Some(key));

    // The failed attempt did not consume a sequence number.
    let next = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT + 1).unwrap();
    assert_eq!(tcp.get(next).unwrap().send.initial_seq, TcpSeqNumber(ISN_STEP));
}

#[test]
fn capacity_exhausted() {
    let mut config = Config::new(LOCAL);
    config.capacity = 1;
    let mut tcp = Endpoint::new(config);

    let first = tcp.create(REMOTE, REMOTE_PORT, 1).unwrap();
    assert_eq!(tcp.create(REMOTE, REMOTE_PORT, 2), Err(Error::Allocation));
    assert_eq!(tcp.find(REMOTE, LOCAL, REMOTE_PORT, 2), None);

    tcp.close(first);
    let second = tcp.create(REMOTE, REMOTE_PORT, 2).unwrap();
    assert_eq!(tcp.get(second).unwrap().send.initial_seq, TcpSeqNumber(ISN_STEP));
}

#[test]
fn listen_then_syn() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    tcp.listen(key).unwrap();
    assert_eq!(state(&tcp, key), State::Listen);
    assert!(ip.sent().is_empty());

    tcp.receive(&mut ip, &inbound(TcpFlags::SYN, 1000, &[]), REMOTE, LOCAL).unwrap();
    let connection = *tcp.get(key).unwrap();
    assert_eq!(connection.current, State::SynReceived);
    assert_eq!(connection.recv.next, TcpSeqNumber(1001));
    assert_eq!(connection.send.next, TcpSeqNumber(1));

    let sent = ip.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].dst_addr, REMOTE);
    assert_eq!(sent[0].protocol, IpProtocol::Tcp);
    assert_eq!(sent[0].repr(), Ok(TcpRepr {
        src_port: LOCAL_PORT,
        dst_port: REMOTE_PORT,
        seq_number: TcpSeqNumber(0),
        ack_number: TcpSeqNumber(1001),
        flags: TcpFlags::SYN | TcpFlags::ACK,
        window_len: 65535,
        payload_len: 0,
    }));
}

#[test]
fn syn_ack_while_listening() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    tcp.listen(key).unwrap();

    // SYN is evaluated first, the ACK then sees SYN-RECEIVED.
    let segment = inbound(TcpFlags::SYN | TcpFlags::ACK, 7, &[]);
    tcp.receive(&mut ip, &segment, REMOTE, LOCAL).unwrap();
    assert_eq!(state(&tcp, key), State::Established);
    assert_eq!(tcp.get(key).unwrap().recv.next, TcpSeqNumber(8));

    let sent = ip.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].repr().unwrap().flags, TcpFlags::SYN | TcpFlags::ACK);
}

#[test]
fn passive_close() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = established(&mut tcp, &mut ip);
    let seq = tcp.get(key).unwrap().send.next;

    tcp.receive(&mut ip, &inbound(TcpFlags::FIN, 2000, &[]), REMOTE, LOCAL).unwrap();
    let connection = *tcp.get(key).unwrap();
    assert_eq!(connection.current, State::LastAck);
    assert_eq!(connection.recv.next, TcpSeqNumber(2001));
    assert_eq!(connection.send.next, seq + 1);

    let sent: Vec<_> = ip.take()
        .iter()
        .map(|datagram| datagram.repr().unwrap())
        .collect();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].flags, TcpFlags::ACK);
    assert_eq!(sent[0].seq_number, seq);
    assert_eq!(sent[0].ack_number, TcpSeqNumber(2001));
    assert_eq!(sent[1].flags, TcpFlags::FIN | TcpFlags::ACK);
    assert_eq!(sent[1].seq_number, seq);
    assert_eq!(sent[1].ack_number, TcpSeqNumber(2001));

    // The final ACK is not consumed.
    tcp.receive(&mut ip, &inbound(TcpFlags::ACK, 2001, &[]), REMOTE, LOCAL).unwrap();
    assert_eq!(state(&tcp, key), State::LastAck);
    assert!(ip.sent().is_empty());
}

#[test]
fn active_open_acknowledged() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    assert_eq!(state(&tcp, key), State::Closed);

    tcp.get_mut(key).unwrap().current = State::SynSent;
    tcp.receive(&mut ip, &inbound(TcpFlags::ACK, 1, &[]), REMOTE, LOCAL).unwrap();
    assert_eq!(state(&tcp, key), State::Established);
    assert!(ip.sent().is_empty());
}

#[test]
fn connect_sends_syn() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();

    tcp.connect(&mut ip, key).unwrap();
    assert_eq!(state(&tcp, key), State::SynSent);
    assert_eq!(tcp.get(key).unwrap().send.next, TcpSeqNumber(1));

    let sent = ip.take();
    assert_eq!(sent.len(), 1);
    let repr = sent[0].repr().unwrap();
    assert_eq!(repr.flags, TcpFlags::SYN);
    assert_eq!(repr.seq_number, TcpSeqNumber(0));
}

#[test]
fn open_requires_closed() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    tcp.listen(key).unwrap();

    assert_eq!(tcp.connect(&mut ip, key), Err(Error::Illegal));
    assert_eq!(tcp.listen(key), Err(Error::Illegal));
    assert_eq!(state(&tcp, key), State::Listen);
    assert!(ip.sent().is_empty());

    tcp.close(key);
    assert_eq!(tcp.connect(&mut ip, key), Err(Error::Unknown));
    assert_eq!(tcp.listen(key), Err(Error::Unknown));
    assert_eq!(tcp.send(&mut ip, key, TcpFlags::SYN, &[]), Err(Error::Unknown));
}

#[test]
fn send_advances_sequence() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();

    tcp.send(&mut ip, key, TcpFlags::SYN, &[]).unwrap();
    assert_eq!(tcp.get(key).unwrap().send.next, TcpSeqNumber(1));

    tcp.send(&mut ip, key, TcpFlags::SYN | TcpFlags::FIN, b"hello").unwrap();
    assert_eq!(tcp.get(key).unwrap().send.next, TcpSeqNumber(8));

    tcp.send(&mut ip, key, TcpFlags::ACK, &[]).unwrap();
    assert_eq!(tcp.get(key).unwrap().send.next, TcpSeqNumber(8));

    // Sending does not change the state.
    assert_eq!(state(&tcp, key), State::Closed);

    let sent = ip.take();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[1].segment_payload(), b"hello");
    let repr = sent[1].repr().unwrap();
    assert_eq!(repr.seq_number, TcpSeqNumber(1));
    assert_eq!(repr.payload_len, 5);
    assert_eq!(repr.window_len, WINDOW);

    let packet = tcp_packet::new_checked(&sent[1].payload).unwrap();
    assert_eq!(packet.urgent_at(), 0);
    assert_eq!(packet.as_bytes()[13], 0);
}

#[test]
fn window_changed_by_user() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    assert_eq!(tcp.get(key).unwrap().window, WINDOW);

    tcp.get_mut(key).unwrap().window = 512;
    tcp.connect(&mut ip, key).unwrap();
    let sent = ip.take();
    assert_eq!(sent[0].repr().unwrap().window_len, 512);
}

#[test]
fn emitted_checksum_round_trip() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    tcp.send(&mut ip, key, TcpFlags::ACK, b"odd").unwrap();

    let sent = ip.take();
    let payload = &sent[0].payload;
    let packet = tcp_packet::new_checked(payload).unwrap();
    assert!(packet.verify_checksum(LOCAL, REMOTE));

    let (header, data) = payload.split_at(wire::TCP_HEADER_LEN);
    assert_eq!(checksum(&mut crate::storage::Heap, header, data, LOCAL, REMOTE), Ok(0));
}

#[test]
fn transmit_buffer_exhausted() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = bounded(19);
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();

    assert_eq!(tcp.send(&mut ip, key, TcpFlags::SYN, &[]), Err(Error::Allocation));
    assert_eq!(tcp.get(key).unwrap().send.next, TcpSeqNumber(0));
    assert!(ip.sent().is_empty());
    assert_eq!(tcp.arena().outstanding(), 0);
}

#[test]
fn checksum_buffer_exhausted() {
    let mut ip = Capture::new(LOCAL);
    // Room for the segment, but not for the pseudo header copy next to it.
    let mut tcp = bounded(51);
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();

    assert_eq!(tcp.send(&mut ip, key, TcpFlags::SYN, &[]), Err(Error::Allocation));
    assert_eq!(tcp.get(key).unwrap().send.next, TcpSeqNumber(0));
    assert!(ip.sent().is_empty());
    assert_eq!(tcp.arena().outstanding(), 0);

    let mut tcp = bounded(52);
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    tcp.send(&mut ip, key, TcpFlags::SYN, &[]).unwrap();
    assert_eq!(tcp.arena().outstanding(), 0);
    assert_eq!(tcp.arena().peak(), 52);
}

#[test]
fn delivery_failure_advances() {
    let mut ip = Capture::new(LOCAL);
    ip.fail_with(Some(DeliveryError::Unreachable));
    let mut tcp = bounded(1024);
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();

    assert_eq!(
        tcp.send(&mut ip, key, TcpFlags::SYN, &[]),
        Err(Error::Delivery(DeliveryError::Unreachable)));
    assert_eq!(tcp.get(key).unwrap().send.next, TcpSeqNumber(1));
    assert_eq!(tcp.arena().outstanding(), 0);
    assert!(ip.sent().is_empty());
}

#[test]
fn payload_too_large() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();

    let payload = vec![0; 65535 - 20 + 1];
    assert_eq!(tcp.send(&mut ip, key, TcpFlags::ACK, &payload), Err(Error::BadSize));
    assert_eq!(tcp.get(key).unwrap().send.next, TcpSeqNumber(0));

    tcp.send(&mut ip, key, TcpFlags::ACK, &payload[1..]).unwrap();
    assert_eq!(tcp.get(key).unwrap().send.next, TcpSeqNumber(65515));
}

#[test]
fn syn_reply_not_built() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = bounded(19);
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    tcp.listen(key).unwrap();

    let segment = inbound(TcpFlags::SYN, 1000, &[]);
    assert_eq!(tcp.receive(&mut ip, &segment, REMOTE, LOCAL), Err(Error::Allocation));
    let connection = tcp.get(key).unwrap();
    assert_eq!(connection.current, State::Listen);
    assert_eq!(connection.recv.next, TcpSeqNumber(0));
    assert_eq!(connection.send.next, TcpSeqNumber(0));
    assert!(ip.sent().is_empty());
}

#[test]
fn fin_replies_not_delivered() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = established(&mut tcp, &mut ip);
    let seq = tcp.get(key).unwrap().send.next;

    ip.fail_with(Some(DeliveryError::Exhausted));
    let segment = inbound(TcpFlags::FIN, 2000, &[]);
    assert_eq!(
        tcp.receive(&mut ip, &segment, REMOTE, LOCAL),
        Err(Error::Delivery(DeliveryError::Exhausted)));

    let connection = tcp.get(key).unwrap();
    assert_eq!(connection.current, State::LastAck);
    assert_eq!(connection.recv.next, TcpSeqNumber(2001));
    assert_eq!(connection.send.next, seq + 1);
}

#[test]
fn truncated_segment() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    tcp.listen(key).unwrap();

    let segment = inbound(TcpFlags::SYN, 1000, &[]);
    assert_eq!(
        tcp.receive(&mut ip, &segment[..19], REMOTE, LOCAL),
        Err(Error::Malformed(wire::Error::Truncated)));
    assert_eq!(state(&tcp, key), State::Listen);
    assert!(ip.sent().is_empty());
}

#[test]
fn zero_port_segment() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let mut segment = inbound(TcpFlags::SYN, 1000, &[]);
    {
        let packet = tcp_packet::new_unchecked_mut(&mut segment);
        packet.set_src_port(0);
        packet.fill_checksum(REMOTE, LOCAL);
    }

    // Without a connection on port zero the segment is ignored.
    tcp.receive(&mut ip, &segment, REMOTE, LOCAL).unwrap();
    assert!(ip.sent().is_empty());

    let key = tcp.create(REMOTE, 0, LOCAL_PORT).unwrap();
    tcp.listen(key).unwrap();
    assert_eq!(tcp.find(REMOTE, LOCAL, 0, LOCAL_PORT), Some(key));

    tcp.receive(&mut ip, &segment, REMOTE, LOCAL).unwrap();
    assert_eq!(state(&tcp, key), State::SynReceived);
    let sent = ip.take();
    assert_eq!(sent.len(), 1);
    let repr = sent[0].repr().unwrap();
    assert_eq!(repr.src_port, LOCAL_PORT);
    assert_eq!(repr.dst_port, 0);
    assert_eq!(repr.flags, TcpFlags::SYN | TcpFlags::ACK);
}

#[test]
fn corrupted_checksum() {
    let mut segment = inbound(TcpFlags::SYN, 1000, b"data");
    segment[21] ^= 0x40;

    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    tcp.listen(key).unwrap();
    assert_eq!(
        tcp.receive(&mut ip, &segment, REMOTE, LOCAL),
        Err(Error::Malformed(wire::Error::WrongChecksum)));
    assert_eq!(state(&tcp, key), State::Listen);
    assert!(ip.sent().is_empty());

    let mut config = Config::new(LOCAL);
    config.checksum = Checksum::Ignored;
    let mut tcp = Endpoint::new(config);
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();
    tcp.listen(key).unwrap();
    tcp.receive(&mut ip, &segment, REMOTE, LOCAL).unwrap();
    assert_eq!(state(&tcp, key), State::SynReceived);
    assert_eq!(ip.sent().len(), 1);
}

#[test]
fn unknown_connection() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();

    tcp.receive(&mut ip, &inbound(TcpFlags::SYN, 1000, &[]), REMOTE, LOCAL).unwrap();
    tcp.receive(&mut ip, &inbound(TcpFlags::ACK, 1000, &[]), REMOTE, LOCAL).unwrap();
    tcp.receive(&mut ip, &inbound(TcpFlags::FIN, 1000, &[]), REMOTE, LOCAL).unwrap();
    assert!(tcp.is_empty());
    assert!(ip.sent().is_empty());
}

#[test]
fn ignored_flags() {
    let mut ip = Capture::new(LOCAL);
    let mut tcp = endpoint();
    let key = tcp.create(REMOTE, REMOTE_PORT, LOCAL_PORT).unwrap();

    // Nothing is accepted by a closed connection.
    let before = *tcp.get(key).unwrap();
    for &flags in [TcpFlags::SYN, TcpFlags::ACK, TcpFlags::FIN, TcpFlags::RST].iter() {
        tcp.receive(&mut ip, &inbound(flags, 5, &[]), REMOTE, LOCAL).unwrap();
        assert_eq!(*tcp.get(key).unwrap(), before);
    }
    assert!(ip.sent().is_empty());

    tcp.close(key);
    let key = established(&mut tcp, &mut ip);
    let before = *tcp.get(key).unwrap();
    let segment = inbound(TcpFlags::SYN | TcpFlags::ACK | TcpFlags::PSH, 3000, b"payload");
    tcp.receive(&mut ip, &segment, REMOTE, LOCAL).unwrap();
    assert_eq!(*tcp.get(key).unwrap(), before);
    assert!(ip.sent().is_empty());
}

#[test]
fn teardown_counts() {
    let mut tcp = endpoint();
    let first = tcp.create(REMOTE, REMOTE_PORT, 1).unwrap();
    tcp.create(REMOTE, REMOTE_PORT, 2).unwrap();
    tcp.create(REMOTE, REMOTE_PORT, 3).unwrap();
    tcp.close(first);
    assert_eq!(tcp.teardown(), 2);
}

#[test]
fn loopback_handshake() {
    const CLIENT: Ipv4Address = Ipv4Address::new(10, 0, 0, 1);
    const SERVER: Ipv4Address = Ipv4Address::new(10, 0, 0, 2);

    let mut client_ip = Capture::new(CLIENT);
    let mut server_ip = Capture::new(SERVER);
    let mut client = Endpoint::new(Config::for_layer(&client_ip));
    let mut server = Endpoint::new(Config::for_layer(&server_ip));

    let active = client.create(SERVER, 80, 4000).unwrap();
    let passive = server.create(CLIENT, 4000, 80).unwrap();
    server.listen(passive).unwrap();

    client.connect(&mut client_ip, active).unwrap();
    for datagram in client_ip.take() {
        assert_eq!(datagram.dst_addr, SERVER);
        server.receive(&mut server_ip, &datagram.payload, datagram.src_addr, datagram.dst_addr)
            .unwrap();
    }
    assert_eq!(server.get(passive).unwrap().current, State::SynReceived);

    for datagram in server_ip.take() {
        client.receive(&mut client_ip, &datagram.payload, datagram.src_addr, datagram.dst_addr)
            .unwrap();
    }
    assert_eq!(client.get(active).unwrap().current, State::Established);

    client.send(&mut client_ip, active, TcpFlags::ACK, &[]).unwrap();
    client.send(&mut client_ip, active, TcpFlags::FIN | TcpFlags::ACK, &[]).unwrap();
    for datagram in client_ip.take() {
        server.receive(&mut server_ip, &datagram.payload, datagram.src_addr, datagram.dst_addr)
            .unwrap();
    }

    let connection = server.get(passive).unwrap();
    assert_eq!(connection.current, State::LastAck);
    assert_eq!(connection.recv.next, TcpSeqNumber(2));
    assert_eq!(server_ip.sent().len(), 2);
}
