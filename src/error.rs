use core::fmt;

/// A structured code identifying the reason an encode or decode was rejected.
///
/// This enum is intentionally stable and string-free so that errors stay cheap
/// on hot decode paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCode {
    /// The wire shape at the current position did not match the expected kind:
    /// a CBOR major type or JSON token of the wrong sort, a link tag other
    /// than 42, a byte-string multibase prefix other than `0x00`, or a record
    /// field that is absent, duplicated, unknown, or (in strict mode)
    /// mis-ordered.
    InvalidType,
    /// The wire shape was right but the value was not: an unknown enumeration
    /// variant, a reserved `"/"` key inside a plain map, a malformed link or
    /// bytes object, or a duplicate map key.
    InvalidValue,
    /// An integer exceeded the i64 range on decode, or a narrowing target
    /// type cannot hold the decoded value.
    Overflow,
    /// A strict decoder observed a non-canonical but otherwise well-formed
    /// encoding: a non-minimal argument, a 2- or 4-byte float, or an
    /// unsorted map.
    Strict,
    /// Trailing bytes remain after a complete top-level value.
    ExtraneousData,
    /// The JSON decoder did not reach end-of-document after the value.
    ExpectedEod,
    /// An encoder was asked to emit NaN or an infinity.
    UnsupportedValue,
    /// Unexpected end-of-input while decoding.
    UnexpectedEof,
    /// Arithmetic overflow while computing a length or offset.
    LengthOverflow,
    /// A text string was not valid UTF-8.
    InvalidUtf8,
    /// Memory allocation failed while decoding into owned structures.
    AllocationFailed,
    /// Nesting depth exceeded the configured limit.
    DepthLimitExceeded,
}

/// A codec error carrying a stable code and the byte offset where it was
/// detected.
///
/// For decode errors the offset refers to the input; for encode errors it is
/// the position in the output written so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
    /// The error code.
    pub code: ErrorCode,
    /// Byte offset where the error was detected.
    pub offset: usize,
}

impl Error {
    /// Construct an error at `offset`.
    #[inline]
    #[must_use]
    pub const fn new(code: ErrorCode, offset: usize) -> Self {
        Self { code, offset }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self.code {
            ErrorCode::InvalidType => "wire shape does not match the expected kind",
            ErrorCode::InvalidValue => "malformed or unrecognized value",
            ErrorCode::Overflow => "integer outside the representable range",
            ErrorCode::Strict => "non-canonical encoding rejected in strict mode",
            ErrorCode::ExtraneousData => "trailing bytes after top-level value",
            ErrorCode::ExpectedEod => "expected end of document",
            ErrorCode::UnsupportedValue => "NaN and infinities cannot be encoded",
            ErrorCode::UnexpectedEof => "unexpected end of input",
            ErrorCode::LengthOverflow => "length overflow",
            ErrorCode::InvalidUtf8 => "text must be valid UTF-8",
            ErrorCode::AllocationFailed => "allocation failed",
            ErrorCode::DepthLimitExceeded => "nesting depth limit exceeded",
        };
        write!(f, "codec error at {}: {msg}", self.offset)
    }
}

impl std::error::Error for Error {}
