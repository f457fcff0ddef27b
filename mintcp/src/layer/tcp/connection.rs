use core::fmt;

use crate::wire::{Ipv4Address, TcpFlags, TcpRepr, TcpSeqNumber};

use super::endpoint::FourTuple;

/// The window advertised by every connection unless changed by the user.
pub const WINDOW: u16 = 65535;

/// The state of a connection.
///
/// Includes the current state machine state, the addressing that stays constant during a
/// connection and the sequence space of both directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    /// The current state of the state machine.
    pub current: State,

    /// The address of this host.
    pub local: Ipv4Address,

    /// The address of the other side.
    pub remote: Ipv4Address,

    /// The port of this host.
    pub local_port: u16,

    /// The port of the other side.
    pub remote_port: u16,

    /// The sending state.
    ///
    /// In RFC793 this is referred to as `SND`.
    pub send: Send,

    /// The receiving state.
    ///
    /// In RFC793 this is referred to as `RCV`.
    pub recv: Receive,

    /// The window advertised in every segment we send.
    ///
    /// Starts out as `WINDOW` and is never changed by the endpoint itself.
    pub window: u16,
}

/// Sequence space of the sending direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Send {
    /// The next sequence number to use for transmission.
    ///
    /// Advances by the sequence length of every segment handed to the network, whether or not it
    /// was delivered. In RFC793 this is referred to as `SND.NXT`.
    pub next: TcpSeqNumber,

    /// The initial sequence number.
    ///
    /// This is read-only and only kept for debugging. In RFC793 this is referred to as `ISS`.
    pub initial_seq: TcpSeqNumber,
}

/// Sequence space of the receiving direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Receive {
    /// The next expected sequence number, sent as our acknowledgment number.
    ///
    /// Zero until a transition consumes a SYN or FIN of the other side. In RFC793 this is
    /// referred to as `RCV.NXT`.
    pub next: TcpSeqNumber,
}

/// State enum of the statemachine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// A connection that was created but not opened.
    ///
    /// Also the nominal end of a connection, although no transition leads back here.
    Closed,

    /// A connection waiting for the SYN of its remote.
    Listen,

    /// An open connection request.
    SynSent,

    /// Connection request we answered, waiting on ack.
    SynReceived,

    /// An open connection.
    Established,

    /// Other side closed its connection.
    CloseWait,

    /// Connection closed after other side closed its already.
    ///
    /// The final ACK of the other side is not consumed, a connection stays here until it is
    /// closed by the user.
    LastAck,
}

/// An input of the state machine.
///
/// Inbound segments are split into one event per evaluated flag, the user provides the events
/// opening a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// The user requested an active open.
    Open,

    /// The user requested a passive open.
    Listen,

    /// A segment with SYN arrived, carrying this sequence number.
    Syn(TcpSeqNumber),

    /// A segment with ACK arrived.
    Ack,

    /// A segment with FIN arrived, carrying this sequence number.
    Fin(TcpSeqNumber),
}

/// The effect of one event on a connection.
///
/// Applying a transition happens in three steps. The connection enters `enter` and, if given,
/// takes over the acknowledgment number. Then one segment per entry of `replies` is sent, in
/// order, each carrying the sequence number left by the previous one. Finally the connection
/// settles in `settle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// The state while replies are sent.
    pub enter: State,

    /// The new acknowledgment number.
    pub ack_number: Option<TcpSeqNumber>,

    /// The flags of the segments to send.
    pub replies: &'static [TcpFlags],

    /// The state after all replies were sent.
    pub settle: State,
}

const SYN: &[TcpFlags] = &[TcpFlags::SYN];
const SYN_ACK: &[TcpFlags] = &[TcpFlags(TcpFlags::SYN.0 | TcpFlags::ACK.0)];
const ACK_THEN_FIN_ACK: &[TcpFlags] = &[
    TcpFlags::ACK,
    TcpFlags(TcpFlags::FIN.0 | TcpFlags::ACK.0),
];

impl Connection {
    /// A closed connection on the given tuple, starting its sequence space at `initial_seq`.
    pub fn new(tuple: FourTuple, initial_seq: TcpSeqNumber) -> Self {
        Connection {
            current: State::Closed,
            local: tuple.local,
            remote: tuple.remote,
            local_port: tuple.local_port,
            remote_port: tuple.remote_port,
            send: Send {
                next: initial_seq,
                initial_seq,
            },
            recv: Receive {
                next: TcpSeqNumber::default(),
            },
            window: WINDOW,
        }
    }

    /// The tuple identifying this connection.
    pub fn four_tuple(&self) -> FourTuple {
        FourTuple {
            local: self.local,
            remote: self.remote,
            local_port: self.local_port,
            remote_port: self.remote_port,
        }
    }

    /// Set up the next segment to send on this connection.
    ///
    /// Ports and sequence numbers come from the connection, the payload length is left for the
    /// caller to fill in.
    pub fn segment(&self, flags: TcpFlags) -> TcpRepr {
        TcpRepr {
            src_port: self.local_port,
            dst_port: self.remote_port,
            seq_number: self.send.next,
            ack_number: self.recv.next,
            flags,
            window_len: self.window,
            payload_len: 0,
        }
    }
}

impl State {
    /// Determine the transition of an event in this state.
    ///
    /// Returns `None` when the event has no effect in this state.
    pub fn on(self, event: Event) -> Option<Transition> {
        match (self, event) {
            (State::Closed, Event::Open) => Some(Transition {
                enter: State::SynSent,
                ack_number: None,
                replies: SYN,
                settle: State::SynSent,
            }),
            (State::Closed, Event::Listen) => Some(Transition::to(State::Listen)),
            (State::Listen, Event::Syn(seq)) => Some(Transition {
                enter: State::SynReceived,
                ack_number: Some(seq + 1),
                replies: SYN_ACK,
                settle: State::SynReceived,
            }),
            (State::SynSent, Event::Ack) => Some(Transition::to(State::Established)),
            (State::SynReceived, Event::Ack) => Some(Transition::to(State::Established)),
            (State::Established, Event::Fin(seq)) => Some(Transition {
                enter: State::CloseWait,
                ack_number: Some(seq + 1),
                replies: ACK_THEN_FIN_ACK,
                settle: State::LastAck,
            }),
            (State::Closed, _)
            | (State::Listen, _)
            | (State::SynSent, _)
            | (State::SynReceived, _)
            | (State::Established, _)
            | (State::CloseWait, _)
            | (State::LastAck, _) => None,
        }
    }
}

impl Event {
    /// Split an inbound segment into its events.
    ///
    /// The events are evaluated in the order SYN, ACK, FIN. Each one sees the state left by the
    /// previous, so that a single segment can drive several transitions.
    pub fn arrivals(repr: &TcpRepr) -> [Option<Event>; 3] {
        let flags = repr.flags;
        [
            if flags.syn() { Some(Event::Syn(repr.seq_number)) } else { None },
            if flags.ack() { Some(Event::Ack) } else { None },
            if flags.fin() { Some(Event::Fin(repr.seq_number)) } else { None },
        ]
    }
}

impl Transition {
    /// A silent change of state.
    fn to(state: State) -> Self {
        Transition {
            enter: state,
            ack_number: None,
            replies: &[],
            settle: state,
        }
    }
}

impl Default for State {
    fn default() -> Self {
        State::Closed
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            State::Closed => "CLOSED",
            State::Listen => "LISTEN",
            State::SynSent => "SYN-SENT",
            State::SynReceived => "SYN-RECEIVED",
            State::Established => "ESTABLISHED",
            State::CloseWait => "CLOSE-WAIT",
            State::LastAck => "LAST-ACK",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Event::Open => write!(f, "open"),
            Event::Listen => write!(f, "listen"),
            Event::Syn(seq) => write!(f, "syn seq={}", seq),
            Event::Ack => write!(f, "ack"),
            Event::Fin(seq) => write!(f, "fin seq={}", seq),
        }
    }
}
