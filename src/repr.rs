//! Representation adapters for the schema-driven codecs.
//!
//! A user type can opt out of the structural record/enum framing and instead
//! travel as an IPLD string, byte string, or integer by implementing one of
//! the adapter traits below and annotating the derive with
//! `#[ipld(repr = "string" | "bytes" | "int")]`.

use crate::Error;

/// Adapter for types represented as an IPLD string.
pub trait StringRepr: Sized {
    /// Append the string form of `self` to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if `self` has no string form.
    fn write_string(&self, out: &mut String) -> Result<(), Error>;

    /// Reconstruct `Self` from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if `s` is not a valid representation.
    fn parse_string(s: &str) -> Result<Self, Error>;
}

/// Adapter for types represented as an IPLD byte string.
///
/// An adapter may legitimately produce an empty byte string.
pub trait BytesRepr: Sized {
    /// Append the byte form of `self` to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if `self` has no byte form.
    fn write_bytes(&self, out: &mut Vec<u8>) -> Result<(), Error>;

    /// Reconstruct `Self` from its byte form.
    ///
    /// # Errors
    ///
    /// Returns an error if `b` is not a valid representation.
    fn parse_bytes(b: &[u8]) -> Result<Self, Error>;
}

/// Adapter for types represented as an IPLD integer.
pub trait IntRepr: Sized {
    /// The integer form of `self`.
    fn encode_integer(&self) -> i64;

    /// Reconstruct `Self` from its integer form.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` is not a recognized value.
    fn decode_integer(v: i64) -> Result<Self, Error>;
}

/// Marker for types that may appear as list elements.
///
/// `u8` deliberately does not implement it, so `Vec<u8>` keeps its byte-string
/// representation while every other `Vec<T>` maps to an IPLD list.
pub trait ListElem {}

impl ListElem for bool {}
impl ListElem for i8 {}
impl ListElem for i16 {}
impl ListElem for i32 {}
impl ListElem for i64 {}
impl ListElem for u16 {}
impl ListElem for u32 {}
impl ListElem for u64 {}
impl ListElem for f32 {}
impl ListElem for f64 {}
impl ListElem for String {}
impl ListElem for &str {}
impl ListElem for cid::Cid {}
impl ListElem for crate::Value {}
impl<T: ListElem> ListElem for Option<T> {}
impl<T: ListElem> ListElem for Vec<T> {}
impl<T: ListElem, const N: usize> ListElem for [T; N] {}
