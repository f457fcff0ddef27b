use core::fmt;

/// The error type for parsing of segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// An incoming segment could not be parsed because it was shorter than its fixed header.
    Truncated,

    /// An incoming segment had an incorrect checksum and was dropped.
    ///
    /// Checksum checks can be switched off when a lower layer already performed them, see
    /// [`Checksum::Ignored`](enum.Checksum.html).
    WrongChecksum,

    /// An incoming segment was recognized but was self-contradictory.
    ///
    /// Example: a TCP segment longer than the 16-bit length of its pseudo header.
    Malformed,
}

/// The result type for segment parsing.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Truncated     => write!(f, "truncated segment"),
            Error::WrongChecksum => write!(f, "checksum error"),
            Error::Malformed     => write!(f, "malformed segment"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
