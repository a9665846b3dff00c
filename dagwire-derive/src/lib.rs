//! Procedural macro derives for `dagwire`.
//!
//! `#[derive(Encode)]` and `#[derive(Decode)]` implement both codec trait
//! pairs (`dagwire::cbor` and `dagwire::json`) so that a user type encodes to
//! exactly the bytes the dynamic codecs would emit for the corresponding
//! dynamic value. Record field order is computed here, at expansion time,
//! once per codec.

#![deny(clippy::all)]
#![deny(missing_docs)]

extern crate proc_macro;

mod attrs;
mod decode;
mod encode;
mod util;

use proc_macro::TokenStream;
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput};

use crate::attrs::parse_container_attrs;

#[proc_macro_derive(Encode, attributes(ipld))]
/// Derive `dagwire::cbor::Encode` and `dagwire::json::Encode`.
pub fn derive_encode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let out = (|| -> syn::Result<proc_macro2::TokenStream> {
        let container = parse_container_attrs(&input.attrs)?;
        match &input.data {
            Data::Struct(data) => {
                encode::encode_struct(&input.ident, &input.generics, data, &container)
            }
            Data::Enum(data) => {
                encode::encode_enum(&input.ident, &input.generics, data, &container)
            }
            Data::Union(u) => Err(syn::Error::new(
                u.union_token.span(),
                "Encode is not supported for unions",
            )),
        }
    })();

    match out {
        Ok(ts) => TokenStream::from(ts),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}

#[proc_macro_derive(Decode, attributes(ipld))]
/// Derive `dagwire::cbor::Decode` and `dagwire::json::Decode`.
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let out = (|| -> syn::Result<proc_macro2::TokenStream> {
        let container = parse_container_attrs(&input.attrs)?;
        match &input.data {
            Data::Struct(data) => {
                decode::decode_struct(&input.ident, &input.generics, data, &container)
            }
            Data::Enum(data) => {
                decode::decode_enum(&input.ident, &input.generics, data, &container)
            }
            Data::Union(u) => Err(syn::Error::new(
                u.union_token.span(),
                "Decode is not supported for unions",
            )),
        }
    })();

    match out {
        Ok(ts) => TokenStream::from(ts),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}
