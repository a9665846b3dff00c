//! The dag-cbor codec: RFC 8949 CBOR restricted to the IPLD profile.
//!
//! The profile admits only definite lengths, minimal argument encoding,
//! 8-byte floats, maps sorted by the length-then-lexicographic key rule, and
//! links as tag 42 over an identity-prefixed CID byte string. The encoder
//! always produces canonical bytes; the decoder rejects non-canonical input
//! unless configured lenient.

mod decode;
mod encode;
mod typed;

use std::io;

use crate::{DecodeOptions, Error, Value};

pub use decode::Decoder;
pub use encode::Encoder;
pub use typed::{Decode, Encode};

/// Encode a dynamic value into canonical dag-cbor bytes.
///
/// The exact output length is computed up front, so the returned buffer is
/// sized precisely.
///
/// # Errors
///
/// Returns `UnsupportedValue` for NaN or infinite floats, or an allocation
/// failure.
pub fn encode_value(value: &Value) -> Result<Vec<u8>, Error> {
    let mut enc = Encoder::new();
    enc.value(value)?;
    Ok(enc.into_vec())
}

/// Encode a dynamic value as canonical dag-cbor into a writer.
///
/// # Errors
///
/// Codec errors are wrapped in [`io::ErrorKind::InvalidData`].
pub fn encode_value_to<W: io::Write>(value: &Value, mut writer: W) -> io::Result<()> {
    let bytes = encode_value(value).map_err(into_io)?;
    writer.write_all(&bytes)
}

/// Decode dag-cbor bytes into a dynamic value with strict defaults.
///
/// The input must contain exactly one data item.
///
/// # Errors
///
/// Returns a typed error for malformed, non-canonical, or trailing input.
pub fn decode_value(bytes: &[u8]) -> Result<Value, Error> {
    decode_value_with(bytes, DecodeOptions::default())
}

/// Decode dag-cbor bytes into a dynamic value with explicit options.
///
/// # Errors
///
/// Returns a typed error for malformed input; canonicality violations are
/// errors only when `opts.strict` is set.
pub fn decode_value_with(bytes: &[u8], opts: DecodeOptions) -> Result<Value, Error> {
    let mut dec = Decoder::with_options(bytes, opts);
    let value = dec.value()?;
    dec.finish()?;
    Ok(value)
}

/// Decode one dag-cbor value from a reader, consuming it to the end.
///
/// # Errors
///
/// Codec errors are wrapped in [`io::ErrorKind::InvalidData`].
pub fn decode_value_from<R: io::Read>(mut reader: R) -> io::Result<Value> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_value(&bytes).map_err(into_io)
}

/// Encode a statically-typed value into canonical dag-cbor bytes.
///
/// The emitted bytes match [`encode_value`] applied to the corresponding
/// dynamic value.
///
/// # Errors
///
/// Returns a typed error when the value cannot be represented.
pub fn encode<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    let mut enc = Encoder::new();
    value.encode(&mut enc)?;
    Ok(enc.into_vec())
}

/// Encode a statically-typed value as canonical dag-cbor into a writer.
///
/// # Errors
///
/// Codec errors are wrapped in [`io::ErrorKind::InvalidData`].
pub fn encode_to<T: Encode + ?Sized, W: io::Write>(value: &T, mut writer: W) -> io::Result<()> {
    let bytes = encode(value).map_err(into_io)?;
    writer.write_all(&bytes)
}

/// Decode dag-cbor bytes into a statically-typed value with strict defaults.
///
/// # Errors
///
/// Returns a typed error when the input does not match the shape of `T`.
pub fn decode<'de, T: Decode<'de>>(bytes: &'de [u8]) -> Result<T, Error> {
    decode_with(bytes, DecodeOptions::default())
}

/// Decode dag-cbor bytes into a statically-typed value with explicit options.
///
/// In lenient mode record fields may arrive in any order, but each declared
/// field must be present exactly once.
///
/// # Errors
///
/// Returns a typed error when the input does not match the shape of `T`.
pub fn decode_with<'de, T: Decode<'de>>(bytes: &'de [u8], opts: DecodeOptions) -> Result<T, Error> {
    let mut dec = Decoder::with_options(bytes, opts);
    let value = T::decode(&mut dec)?;
    dec.finish()?;
    Ok(value)
}

/// Decode one statically-typed dag-cbor value from a reader, consuming it to
/// the end.
///
/// # Errors
///
/// Codec errors are wrapped in [`io::ErrorKind::InvalidData`].
pub fn decode_from<T, R: io::Read>(mut reader: R) -> io::Result<T>
where
    T: for<'de> Decode<'de>,
{
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode(&bytes).map_err(into_io)
}

fn into_io(err: Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}
