use core::fmt;

/// The nine kinds of the IPLD data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The null kind.
    Null,
    /// The boolean kind.
    Bool,
    /// Signed 64-bit integers.
    Integer,
    /// IEEE-754 binary64 floats.
    Float,
    /// UTF-8 text.
    String,
    /// Arbitrary octet sequences.
    Bytes,
    /// Ordered sequences of values.
    List,
    /// Ordered string-keyed mappings.
    Map,
    /// Links to other content-addressed blocks (CIDs).
    Link,
}

impl Kind {
    /// Lowercase name of the kind as used by the IPLD data model.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::List => "list",
            Self::Map => "map",
            Self::Link => "link",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
