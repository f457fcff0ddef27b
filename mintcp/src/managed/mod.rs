//! Owned containers with explicit resource limits.
//!
//! Containers here never grow past a limit chosen at construction and report exhaustion as a
//! value instead of aborting, so callers can turn it into a protocol level error.
pub mod slotmap;

pub use self::slotmap::{Key, SlotMap};
