//! Contains main TCP handling.
//!
//! Relevant material for reading:
//! Main TCP rfc: https://tools.ietf.org/html/rfc793
//! Checksum computation: https://tools.ietf.org/html/rfc1071
use alloc::collections::BTreeMap;
use core::fmt;

use crate::layer::{Error, Result};
use crate::layer::ip::Deliver;
use crate::managed::{Key, SlotMap};
use crate::storage::{Arena, Heap};
use crate::wire::{Checksum, Ipv4Address, TcpChecksum, TcpFlags, TcpRepr, TcpSeqNumber, tcp_packet};

use super::connection::{Connection, Event, State, Transition};
use super::packet;

/// The distance between the initial sequence numbers of two consecutively created connections.
pub const ISN_STEP: u32 = 64_000;

/// Handles TCP connection states.
///
/// The endpoint is the registry of all connections of one host. It owns every connection record,
/// hands out copyable [`SlotKey`]s to refer to them and is the only place where their state
/// changes, either by a request of the user or by an inbound segment.
///
/// [`SlotKey`]: struct.SlotKey.html
pub struct Endpoint<A: Arena = Heap> {
    ports: BTreeMap<FourTuple, Key>,
    states: SlotMap<Connection>,
    local_addr: Ipv4Address,
    checksum: Checksum,
    /// Initial sequence number of the next created connection.
    next_seq: TcpSeqNumber,
    arena: A,
}

/// The configuration of an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Config {
    /// The address used as the local side of every created connection.
    pub local_addr: Ipv4Address,

    /// The maximum number of simultaneous connections.
    pub capacity: usize,

    /// The initial sequence number of the first created connection.
    pub initial_seq: TcpSeqNumber,

    /// Whether the checksum of inbound segments is verified.
    pub checksum: Checksum,
}

/// The identity of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FourTuple {
    /// The address of this host.
    pub local: Ipv4Address,
    /// The address of the other side.
    pub remote: Ipv4Address,
    /// The port of this host.
    pub local_port: u16,
    /// The port of the other side.
    pub remote_port: u16,
}

/// The index of a connection.
///
/// Useful for storing in other structs to reference the connection at another point in time. Note
/// that the index will be invalidated when the connection itself is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotKey {
    key: Key,
}

impl Config {
    /// The default configuration for a host at `local_addr`.
    pub fn new(local_addr: Ipv4Address) -> Self {
        Config {
            local_addr,
            capacity: 64,
            initial_seq: TcpSeqNumber(0),
            checksum: Checksum::Manual,
        }
    }

    /// The default configuration for the host behind a network layer.
    pub fn for_layer<D: Deliver + ?Sized>(ip: &D) -> Self {
        Config::new(ip.local_addr())
    }
}

impl Endpoint {
    /// Create an endpoint drawing its buffers from the global heap.
    pub fn new(config: Config) -> Self {
        Endpoint::with_arena(config, Heap)
    }
}

impl<A: Arena> Endpoint<A> {
    /// Create an endpoint drawing its buffers from `arena`.
    pub fn with_arena(config: Config, arena: A) -> Self {
        net_debug!("tcp: endpoint at {} for {} connections", config.local_addr, config.capacity);
        Endpoint {
            ports: BTreeMap::new(),
            states: SlotMap::with_capacity(config.capacity),
            local_addr: config.local_addr,
            checksum: config.checksum,
            next_seq: config.initial_seq,
            arena,
        }
    }

    /// Close all remaining connections and dispose of the endpoint.
    ///
    /// Returns the number of connections that were closed.
    pub fn teardown(mut self) -> usize {
        let keys = self.states.keys();
        let count = keys.len();
        for key in keys {
            self.close(SlotKey { key });
        }
        net_debug!("tcp: endpoint at {} torn down, {} connections closed", self.local_addr, count);
        count
    }

    /// The address of this host.
    pub fn local_addr(&self) -> Ipv4Address {
        self.local_addr
    }

    /// The arena providing transmit buffers.
    pub fn arena(&self) -> &A {
        &self.arena
    }

    /// Create a closed connection to a remote port.
    ///
    /// The connection is registered under the local address of the endpoint and gets the next
    /// initial sequence number. Open it with [`connect`] or [`listen`].
    ///
    /// Fails with `Error::Illegal` if a connection with the same four-tuple exists and with
    /// `Error::Allocation` when no more connections can be stored. The sequence counter only
    /// advances for successfully created connections. Ports are not validated, a zero port is
    /// matched by segments carrying a zero port like any other.
    ///
    /// Only the connection slot is fallible. The tuple index is bounded by the capacity of the
    /// endpoint but its nodes come from the global allocator, where exhaustion aborts.
    ///
    /// [`connect`]: #method.connect
    /// [`listen`]: #method.listen
    pub fn create(&mut self, remote_addr: Ipv4Address, remote_port: u16, local_port: u16)
        -> Result<SlotKey>
    {
        let tuple = FourTuple {
            local: self.local_addr,
            remote: remote_addr,
            local_port,
            remote_port,
        };

        if self.ports.contains_key(&tuple) {
            net_debug!("tcp: {} exists already", tuple);
            return Err(Error::Illegal);
        }

        let isn = self.next_seq;
        let key = match self.states.insert(Connection::new(tuple, isn)) {
            Some(key) => key,
            None => {
                net_debug!("tcp: no slot for {}", tuple);
                return Err(Error::Allocation);
            },
        };

        self.ports.insert(tuple, key);
        self.next_seq += ISN_STEP as usize;
        net_debug!("tcp: created {} isn={}", tuple, isn);
        Ok(SlotKey { key })
    }

    /// Find the connection an inbound segment belongs to.
    ///
    /// The arguments are those of the segment, so its source is the remote side of the
    /// connection and its destination the local side.
    pub fn find(&self, src_addr: Ipv4Address, dst_addr: Ipv4Address, src_port: u16, dst_port: u16)
        -> Option<SlotKey>
    {
        let tuple = FourTuple {
            local: dst_addr,
            remote: src_addr,
            local_port: dst_port,
            remote_port: src_port,
        };

        self.ports
            .get(&tuple)
            .map(|&key| SlotKey { key })
    }

    /// Remove a connection, invalidating its key.
    ///
    /// Does nothing if the key is stale.
    pub fn close(&mut self, index: SlotKey) {
        if let Some(connection) = self.states.remove(index.key) {
            let tuple = connection.four_tuple();
            self.ports.remove(&tuple);
            net_debug!("tcp: closed {} in {}", tuple, connection.current);
        }
    }

    /// Get a connection by its key.
    pub fn get(&self, index: SlotKey) -> Option<&Connection> {
        self.states.get(index.key)
    }

    /// Get a connection by its key, for inspection or modification.
    ///
    /// Changing the addressing of the connection leaves it registered under its old tuple.
    pub fn get_mut(&mut self, index: SlotKey) -> Option<&mut Connection> {
        self.states.get_mut(index.key)
    }

    /// The number of connections.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check whether there are no connections.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterate over all connections.
    pub fn iter(&self) -> impl Iterator<Item=(SlotKey, &Connection)> + '_ {
        self.states
            .iter()
            .map(|(key, connection)| (SlotKey { key }, connection))
    }

    /// Actively open a closed connection by sending a SYN.
    ///
    /// Fails with `Error::Illegal` if the connection is not closed.
    pub fn connect<D>(&mut self, ip: &mut D, index: SlotKey) -> Result<()>
        where D: Deliver + ?Sized,
    {
        let transition = self.transition(index, Event::Open)?
            .ok_or(Error::Illegal)?;
        self.dispatch(ip, index, Event::Open, transition)
    }

    /// Passively open a closed connection, waiting for the SYN of its remote.
    ///
    /// Fails with `Error::Illegal` if the connection is not closed.
    pub fn listen(&mut self, index: SlotKey) -> Result<()> {
        let transition = self.transition(index, Event::Listen)?
            .ok_or(Error::Illegal)?;
        debug_assert!(transition.replies.is_empty());
        self.enter(index, Event::Listen, &transition)?;
        self.settle(index, transition.settle)
    }

    /// Send one segment on a connection.
    ///
    /// The segment carries the current sequence and acknowledgment numbers of the connection.
    /// Afterwards the sequence number has advanced by the payload length plus one for each of
    /// SYN and FIN. The state of the connection is not changed. The advertised window is the
    /// `window` of the connection, [`WINDOW`] unless changed through [`get_mut`].
    ///
    /// Fails with `Error::Allocation` if no buffer could be obtained, leaving the connection
    /// untouched. When the network layer fails to deliver the segment the sequence number still
    /// advances and `Error::Delivery` is returned.
    ///
    /// [`WINDOW`]: constant.WINDOW.html
    /// [`get_mut`]: #method.get_mut
    pub fn send<D>(&mut self, ip: &mut D, index: SlotKey, flags: TcpFlags, payload: &[u8])
        -> Result<()>
        where D: Deliver + ?Sized,
    {
        let connection = self.states.get_mut(index.key)
            .ok_or(Error::Unknown)?;
        packet::transmit(&mut self.arena, ip, connection, flags, payload)
    }

    /// Process an inbound segment.
    ///
    /// The segment is the payload of an IP datagram from `src_addr` to `dst_addr`. It is parsed,
    /// its checksum verified unless configured otherwise, and its flags are applied to the
    /// matching connection. Replies go out through `ip`.
    ///
    /// Segments without a matching connection and flags without an effect in the state of the
    /// connection are silently accepted. A segment that can not be parsed is rejected with
    /// `Error::Malformed` and has no effect.
    pub fn receive<D>(
        &mut self,
        ip: &mut D,
        segment: &[u8],
        src_addr: Ipv4Address,
        dst_addr: Ipv4Address,
    ) -> Result<()>
        where D: Deliver + ?Sized,
    {
        let checksum = match self.checksum {
            Checksum::Manual => TcpChecksum::Manual { src_addr, dst_addr },
            Checksum::Ignored => TcpChecksum::Ignored,
        };

        let repr = match tcp_packet::new_checked(segment)
            .and_then(|packet| TcpRepr::parse(packet, checksum))
        {
            Ok(repr) => repr,
            Err(err) => {
                net_debug!("tcp: {} -> {}: dropped segment: {}", src_addr, dst_addr, err);
                return Err(Error::Malformed(err));
            },
        };

        let index = match self.find(src_addr, dst_addr, repr.src_port, repr.dst_port) {
            Some(index) => index,
            None => {
                net_trace!("tcp: {} -> {}: no connection for {}", src_addr, dst_addr, repr);
                return Ok(());
            },
        };

        net_trace!("tcp: {} -> {}: {}", src_addr, dst_addr, repr);
        let mut result = Ok(());
        for &event in Event::arrivals(&repr).iter().flatten() {
            let transition = match self.transition(index, event)? {
                Some(transition) => transition,
                None => continue,
            };

            match self.dispatch(ip, index, event, transition) {
                Ok(()) => (),
                Err(Error::Delivery(err)) => if result.is_ok() {
                    result = Err(Error::Delivery(err));
                },
                Err(err) => return Err(err),
            }
        }

        result
    }

    /// Look up the transition of an event for a connection.
    fn transition(&self, index: SlotKey, event: Event) -> Result<Option<Transition>> {
        let connection = self.get(index).ok_or(Error::Unknown)?;
        let transition = connection.current.on(event);
        if transition.is_none() {
            net_trace!("tcp: {} ignores {} in {}",
                connection.four_tuple(), event, connection.current);
        }
        Ok(transition)
    }

    /// Apply a transition and send its replies.
    ///
    /// If the first reply can not be built, the connection is restored to where it was before
    /// and the error returned. Later failures to build a reply stop the transition in its
    /// intermediate state. Delivery failures do not stop the transition, the first of them is
    /// returned after the connection settled.
    fn dispatch<D>(&mut self, ip: &mut D, index: SlotKey, event: Event, transition: Transition)
        -> Result<()>
        where D: Deliver + ?Sized,
    {
        let snapshot = self.enter(index, event, &transition)?;

        let mut delivery = None;
        for (count, &flags) in transition.replies.iter().enumerate() {
            match self.send(ip, index, flags, &[]) {
                Ok(()) => (),
                Err(Error::Delivery(err)) => {
                    delivery.get_or_insert(err);
                },
                Err(err) => {
                    if count == 0 {
                        if let Some(connection) = self.get_mut(index) {
                            *connection = snapshot;
                        }
                    }
                    return Err(err);
                },
            }
        }

        self.settle(index, transition.settle)?;
        match delivery {
            Some(err) => Err(Error::Delivery(err)),
            None => Ok(()),
        }
    }

    /// Enter the intermediate state of a transition, returning the connection as it was.
    fn enter(&mut self, index: SlotKey, event: Event, transition: &Transition)
        -> Result<Connection>
    {
        let connection = self.get_mut(index).ok_or(Error::Unknown)?;
        let snapshot = *connection;
        connection.current = transition.enter;
        if let Some(ack_number) = transition.ack_number {
            connection.recv.next = ack_number;
        }
        net_debug!("tcp: {} {} on {} -> {}",
            connection.four_tuple(), snapshot.current, event, transition.enter);
        Ok(snapshot)
    }

    fn settle(&mut self, index: SlotKey, state: State) -> Result<()> {
        let connection = self.get_mut(index).ok_or(Error::Unknown)?;
        if connection.current != state {
            net_debug!("tcp: {} {} -> {}", connection.four_tuple(), connection.current, state);
            connection.current = state;
        }
        Ok(())
    }
}

impl fmt::Display for FourTuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{} <-> {}:{}", self.local, self.local_port, self.remote, self.remote_port)
    }
}
