//! # dagwire
//!
//! Bit-exact, round-tripping encoders and decoders for the two IPLD wire
//! formats: **dag-cbor** (a canonical CBOR subset) and **dag-json** (a
//! canonical JSON subset with reserved-key conventions for links and byte
//! strings).
//!
//! ## Design principles
//!
//! - **One logical value, one byte sequence.** Both encoders are
//!   deterministic; decoding equivalent dag-cbor and dag-json inputs yields
//!   structurally equal [`Value`]s, and re-encoding canonical bytes
//!   reproduces them exactly.
//! - **Dynamic and static paths share the wire.** [`Value`] covers schemaless
//!   data; the [`cbor::Encode`]/[`cbor::Decode`] and
//!   [`json::Encode`]/[`json::Decode`] traits (derivable with the `derive`
//!   feature) encode user types to the very same bytes without building a
//!   `Value`.
//! - **Strict by default.** Decoders reject non-canonical input; lenient
//!   mode is an explicit opt-in via [`DecodeOptions`].
//!
//! CID parsing and rendering are delegated to the [`cid`] crate;
//! base64url-nopad for dag-json byte strings comes from [`base64`].
//!
//! ## Safety
//!
//! This crate forbids `unsafe` code.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::module_name_repetitions
)]

pub mod cbor;
mod error;
pub mod json;
mod kind;
mod options;
mod order;
mod repr;
mod value;

pub use crate::error::{Error, ErrorCode};
pub use crate::kind::Kind;
pub use crate::options::{DecodeOptions, DEFAULT_MAX_DEPTH};
pub use crate::order::{cmp_cbor_keys, cmp_json_keys};
pub use crate::repr::{BytesRepr, IntRepr, ListElem, StringRepr};
pub use crate::value::{List, Map, Value};

#[cfg(feature = "derive")]
pub use dagwire_derive::{Decode, Encode};

// Re-exported for the derive macros and for callers constructing links.
pub use cid::Cid;
