//! The TCP layer abstraction.
//!
//! A deliberately small subset of the protocol: connections are opened actively or passively,
//! established by the three-way handshake and closed passively by the other side. There are no
//! timers, so nothing is retransmitted, and received data is not buffered or reassembled.
//!
//! ## Structure
//!
//! The [`Endpoint`] stores the states of all connections, unlike other layers which mostly store
//! configuration options. Connections are referred to by a [`SlotKey`] that becomes invalid once
//! the connection is closed.
//!
//! Unlike standard stacks where state and user must be assumed to be in different protection
//! domains and which manage their state opaquely, it poses no problem for this library to allow
//! inspection of internal state or modification (by the user) beyond the transitions mandated in
//! the protocol standard.
//!
//! ## Processing
//!
//! Each inbound segment is split into events, one for each of its SYN, ACK and FIN flags and in
//! that order. Every event is looked up in the transition table of [`State::on`] for the current
//! state of the connection. Events without a transition are dropped silently, so a single
//! segment may drive zero, one or several transitions.
//!
//! | state        | event | next state   | sends            |
//! |--------------|-------|--------------|------------------|
//! | CLOSED       | open  | SYN-SENT     | SYN              |
//! | CLOSED       | listen| LISTEN       |                  |
//! | LISTEN       | SYN   | SYN-RECEIVED | SYN+ACK          |
//! | SYN-SENT     | ACK   | ESTABLISHED  |                  |
//! | SYN-RECEIVED | ACK   | ESTABLISHED  |                  |
//! | ESTABLISHED  | FIN   | LAST-ACK     | ACK, then FIN+ACK|
//!
//! ## Creating a connection
//!
//! ```
//! use mintcp::layer::ip::Capture;
//! use mintcp::layer::tcp::{Config, Endpoint, State};
//! use mintcp::wire::Ipv4Address;
//!
//! let local = Ipv4Address::new(10, 0, 0, 1);
//! let mut ip = Capture::new(local);
//! let mut tcp = Endpoint::new(Config::new(local));
//!
//! let key = tcp.create(Ipv4Address::new(203, 0, 113, 9), 443, 5000).unwrap();
//! tcp.connect(&mut ip, key).unwrap();
//! assert_eq!(tcp.get(key).unwrap().current, State::SynSent);
//! assert_eq!(ip.sent().len(), 1);
//! ```
//!
//! [`Endpoint`]: struct.Endpoint.html
//! [`SlotKey`]: struct.SlotKey.html
//! [`State::on`]: enum.State.html#method.on
mod checksum;
mod connection;
mod endpoint;
mod packet;

pub use checksum::checksum;

pub use connection::{
    Connection,
    Event,
    Receive,
    Send,
    State,
    Transition,
    WINDOW};

pub use endpoint::{
    Config,
    Endpoint,
    FourTuple,
    SlotKey,
    ISN_STEP};

#[cfg(test)]
mod tests;
