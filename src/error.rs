use thiserror::Error;

/// Errors that can occur while decoding an AVS+ elementary stream.
///
/// `BadStream` covers every syntax or semantic rule violation (range checks,
/// out-of-bounds table lookups, exhausted bit reader); it never indicates a
/// bug in the decoder itself.
#[derive(Debug, Error)]
pub enum Error {
    #[error("bad stream: {reason}")]
    BadStream { reason: &'static str },

    #[error("unsupported profile 0x{profile:02x}")]
    UnsupportedProfile { profile: u8 },

    #[error("out of memory")]
    OutOfMemory,

    #[error("cancelled")]
    Cancelled,
}

impl Error {
    pub fn bad_stream(reason: &'static str) -> Self {
        Error::BadStream { reason }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
