//! Errors produced by the bit buffer and versioned decoder.

/// Errors that can occur while decoding a bit-packed versioned stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Attempted to read past the end of the underlying buffer.
    #[error("attempted to read past end of buffer")]
    Eof,
    /// Requested more than 64 bits in a single `read_bits` call.
    #[error("cannot read {0} bits at once (max 64)")]
    TooManyBits(u32),
    /// The one-byte type tag at the head of a node was not one of the nine known kinds.
    #[error("unknown data type tag: 0x{0:02x}")]
    UnknownTag(u8),
    /// A varint-encoded length prefix decoded to a negative value.
    #[error("negative length prefix: {0}")]
    NegativeLength(i64),
    /// A varint-encoded length prefix is too large to use as a byte/element count.
    #[error("length prefix too large: {0}")]
    LengthOverflow(i64),
}
