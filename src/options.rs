/// Default maximum nesting depth for the decoders and the dynamic encoders.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Decode-time configuration shared by both codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Reject non-canonical but otherwise well-formed input.
    ///
    /// For dag-cbor this enforces minimal argument encoding, 8-byte floats,
    /// sorted map keys, and rejects `undefined`. For dag-json it enforces
    /// canonical key ordering when decoding records on the static path.
    pub strict: bool,
    /// Maximum container nesting depth; a guard against pathologically deep
    /// inputs exhausting the stack.
    pub max_depth: usize,
}

impl DecodeOptions {
    /// Strict decoding with the default depth limit.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            strict: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Lenient decoding: tolerate non-minimal arguments, narrow floats, and
    /// unsorted maps; `undefined` decodes as null.
    #[must_use]
    pub const fn lenient() -> Self {
        Self {
            strict: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::strict()
    }
}
