//! A minimal TCP protocol engine.
//!
//! ## Table of contents
//!
//! 1. [Design](#design)
//! 2. [The wire module](wire/index.html)
//! 3. [The layers](layer/index.html)
//!    1. [The ip collaborator](layer/ip/index.html)
//!    1. [Tcp](layer/tcp/index.html)
//! 4. Internals
//!    1. [The managed module](managed/index.html)
//!    2. [The storage module](storage/index.html)
//!
//! ## Design
//!
//! The engine consists of three pieces that only make sense together: a registry of connection
//! records, a transition machine evaluating the flags of inbound segments, and the codec that
//! builds and checksums outbound segments. Everything below and above it is someone else's
//! business. The IP layer hands in segments and takes segments out through the [`Deliver`]
//! trait, and transmit buffers are drawn from an [`Arena`] that the engine returns every buffer
//! to before an operation finishes.
//!
//! All state lives in one [`Endpoint`] value. There are no globals, no timers and no background
//! work. Each call runs to completion, which is also why the engine does not retransmit, does
//! no flow or congestion control and does not reassemble out-of-order data.
//!
//! [`Deliver`]: layer/ip/trait.Deliver.html
//! [`Arena`]: storage/trait.Arena.html
//! [`Endpoint`]: layer/tcp/struct.Endpoint.html
#![warn(missing_docs)]
#![warn(unreachable_pub)]

// tests should be able to use `std`
#![cfg_attr(all(
    not(feature = "std"),
    not(test)),
no_std)]

/// The `alloc` crate, with or without `std`.
pub extern crate alloc;

#[macro_use] mod macros;
pub mod layer;
pub mod managed;
pub mod storage;
pub mod wire;
