//! The dag-json codec: RFC 8259 JSON restricted to the IPLD profile.
//!
//! Links travel as `{"/": "<cid>"}` and byte strings as
//! `{"/": {"bytes": "<base64url-nopad>"}}`; the `"/"` key is reserved and may
//! not appear in regular maps. The encoder emits minimal separators with map
//! keys in byte-wise lexicographic order; float rendering is governed by
//! [`FloatFormat`].

mod decode;
mod encode;
mod lexer;
mod typed;

use std::io;

use crate::{DecodeOptions, Error, Value};

pub use decode::Decoder;
pub use encode::Encoder;
pub use typed::{Decode, Encode};

/// Rendering policy for floats on the dag-json wire.
///
/// Negative zero is always emitted as `-0.0` regardless of the policy, and
/// NaN or infinities are always errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatFormat {
    /// Always print in exponent form, e.g. `1e0`, `3.141592653589793e0`.
    Scientific,
    /// Always print in decimal form, appending `.0` when the value is
    /// integral (e.g. `10.0`).
    #[default]
    Decimal,
    /// Use decimal form when `⌊log10 |v|⌋` lies in the given range, exponent
    /// form otherwise. Either bound may be absent (unbounded).
    DecimalInRange {
        /// Inclusive lower bound on the decimal exponent.
        min_exp10: Option<i32>,
        /// Inclusive upper bound on the decimal exponent.
        max_exp10: Option<i32>,
    },
}

/// Encode-time configuration for dag-json.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    /// Float rendering policy.
    pub float_format: FloatFormat,
    /// Escape all non-ASCII characters as `\uXXXX` sequences.
    pub escape_unicode: bool,
}

/// Encode a dynamic value into canonical dag-json bytes with default options.
///
/// # Errors
///
/// Returns `UnsupportedValue` for NaN or infinite floats and `InvalidValue`
/// for maps containing the reserved `"/"` key.
pub fn encode_value(value: &Value) -> Result<Vec<u8>, Error> {
    encode_value_with(value, EncodeOptions::default())
}

/// Encode a dynamic value into canonical dag-json bytes.
///
/// # Errors
///
/// Returns `UnsupportedValue` for NaN or infinite floats and `InvalidValue`
/// for maps containing the reserved `"/"` key.
pub fn encode_value_with(value: &Value, opts: EncodeOptions) -> Result<Vec<u8>, Error> {
    let mut enc = Encoder::with_options(opts);
    enc.value(value)?;
    Ok(enc.into_vec())
}

/// Encode a dynamic value as canonical dag-json into a writer.
///
/// # Errors
///
/// Codec errors are wrapped in [`io::ErrorKind::InvalidData`].
pub fn encode_value_to<W: io::Write>(value: &Value, mut writer: W) -> io::Result<()> {
    let bytes = encode_value(value).map_err(into_io)?;
    writer.write_all(&bytes)
}

/// Decode dag-json bytes into a dynamic value with strict defaults.
///
/// The input must contain exactly one document.
///
/// # Errors
///
/// Returns a typed error for malformed input or data past the document end.
pub fn decode_value(bytes: &[u8]) -> Result<Value, Error> {
    decode_value_with(bytes, DecodeOptions::default())
}

/// Decode dag-json bytes into a dynamic value with explicit options.
///
/// # Errors
///
/// Returns a typed error for malformed input or data past the document end.
pub fn decode_value_with(bytes: &[u8], opts: DecodeOptions) -> Result<Value, Error> {
    let mut dec = Decoder::with_options(bytes, opts);
    let value = dec.value()?;
    dec.finish()?;
    Ok(value)
}

/// Decode one dag-json value from a reader, consuming it to the end.
///
/// # Errors
///
/// Codec errors are wrapped in [`io::ErrorKind::InvalidData`].
pub fn decode_value_from<R: io::Read>(mut reader: R) -> io::Result<Value> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_value(&bytes).map_err(into_io)
}

/// Encode a statically-typed value into canonical dag-json bytes with
/// default options.
///
/// The emitted bytes match [`encode_value`] applied to the corresponding
/// dynamic value.
///
/// # Errors
///
/// Returns a typed error when the value cannot be represented.
pub fn encode<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    encode_with(value, EncodeOptions::default())
}

/// Encode a statically-typed value into canonical dag-json bytes.
///
/// # Errors
///
/// Returns a typed error when the value cannot be represented.
pub fn encode_with<T: Encode + ?Sized>(value: &T, opts: EncodeOptions) -> Result<Vec<u8>, Error> {
    let mut enc = Encoder::with_options(opts);
    value.encode(&mut enc)?;
    Ok(enc.into_vec())
}

/// Encode a statically-typed value as canonical dag-json into a writer.
///
/// # Errors
///
/// Codec errors are wrapped in [`io::ErrorKind::InvalidData`].
pub fn encode_to<T: Encode + ?Sized, W: io::Write>(value: &T, mut writer: W) -> io::Result<()> {
    let bytes = encode(value).map_err(into_io)?;
    writer.write_all(&bytes)
}

/// Decode dag-json bytes into a statically-typed value with strict defaults.
///
/// # Errors
///
/// Returns a typed error when the input does not match the shape of `T`.
pub fn decode<T: Decode>(bytes: &[u8]) -> Result<T, Error> {
    decode_with(bytes, DecodeOptions::default())
}

/// Decode dag-json bytes into a statically-typed value with explicit options.
///
/// In strict mode record fields must arrive in canonical (lexicographic) key
/// order; lenient mode accepts any permutation but requires each declared
/// field exactly once.
///
/// # Errors
///
/// Returns a typed error when the input does not match the shape of `T`.
pub fn decode_with<T: Decode>(bytes: &[u8], opts: DecodeOptions) -> Result<T, Error> {
    let mut dec = Decoder::with_options(bytes, opts);
    let value = T::decode(&mut dec)?;
    dec.finish()?;
    Ok(value)
}

/// Decode one statically-typed dag-json value from a reader, consuming it to
/// the end.
///
/// # Errors
///
/// Codec errors are wrapped in [`io::ErrorKind::InvalidData`].
pub fn decode_from<T: Decode, R: io::Read>(mut reader: R) -> io::Result<T> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode(&bytes).map_err(into_io)
}

fn into_io(err: Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}
