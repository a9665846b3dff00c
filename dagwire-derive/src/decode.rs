use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    GenericParam, Generics, Ident, Lifetime, LifetimeParam, DataEnum, DataStruct, Fields,
};

use crate::attrs::{ensure_no_ipld_attrs, Adapter, ContainerAttr, EnumRepr};
use crate::encode::enum_variants;
use crate::util::{add_where_bound, cbor_field_order, json_field_order, type_mentions_self};

/// Synthesize the decode lifetime for the cbor impl, avoiding collisions
/// with the type's own lifetimes.
fn decode_lifetime(generics: &Generics) -> (Generics, Lifetime) {
    let mut out = generics.clone();
    let mut name = "__de".to_string();
    let mut counter = 0usize;
    loop {
        let probe = Ident::new(&name, proc_macro2::Span::call_site());
        if !out.lifetimes().any(|lt| lt.lifetime.ident == probe) {
            break;
        }
        counter += 1;
        name = format!("__de{counter}");
    }
    let lt = Lifetime::new(&format!("'{name}"), proc_macro2::Span::call_site());
    out.params
        .insert(0, GenericParam::Lifetime(LifetimeParam::new(lt.clone())));

    let wc = out.make_where_clause();
    for lifetime in generics.lifetimes() {
        let lt_ident = &lifetime.lifetime;
        wc.predicates.push(syn::parse_quote!(#lt: #lt_ident));
    }

    (out, lt)
}

fn err(code: TokenStream, off: TokenStream) -> TokenStream {
    quote!(::dagwire::Error::new(::dagwire::ErrorCode::#code, #off))
}

struct AdapterBodies {
    repr_trait: TokenStream,
    cbor: TokenStream,
    json: TokenStream,
}

fn adapter_bodies(adapter: Adapter) -> AdapterBodies {
    match adapter {
        Adapter::String => AdapterBodies {
            repr_trait: quote!(::dagwire::StringRepr),
            cbor: quote! {
                let s = dec.text()?;
                <Self as ::dagwire::StringRepr>::parse_string(s)
            },
            json: quote! {
                let s = dec.str()?;
                <Self as ::dagwire::StringRepr>::parse_string(s)
            },
        },
        Adapter::Bytes => AdapterBodies {
            repr_trait: quote!(::dagwire::BytesRepr),
            cbor: quote! {
                let b = dec.bytes()?;
                <Self as ::dagwire::BytesRepr>::parse_bytes(b)
            },
            json: quote! {
                let b = dec.bytes()?;
                <Self as ::dagwire::BytesRepr>::parse_bytes(&b)
            },
        },
        Adapter::Int => AdapterBodies {
            repr_trait: quote!(::dagwire::IntRepr),
            cbor: quote! {
                <Self as ::dagwire::IntRepr>::decode_integer(dec.int()?)
            },
            json: quote! {
                <Self as ::dagwire::IntRepr>::decode_integer(dec.int()?)
            },
        },
    }
}

fn adapter_decode(name: &Ident, generics: &Generics, adapter: Adapter) -> TokenStream {
    let bodies = adapter_bodies(adapter);
    let AdapterBodies {
        repr_trait,
        cbor,
        json,
    } = bodies;

    let (cbor_generics, de) = decode_lifetime(generics);
    let (cbor_impl_generics, _, cbor_wc) = cbor_generics.split_for_impl();
    let (impl_generics, ty_generics, base_wc) = generics.split_for_impl();

    let mut cbor_wc = cbor_wc.cloned().unwrap_or_else(empty_where);
    cbor_wc
        .predicates
        .push(syn::parse_quote!(#name #ty_generics: #repr_trait));
    let mut json_wc = base_wc.cloned().unwrap_or_else(empty_where);
    json_wc
        .predicates
        .push(syn::parse_quote!(#name #ty_generics: #repr_trait));

    quote! {
        impl #cbor_impl_generics ::dagwire::cbor::Decode<#de> for #name #ty_generics #cbor_wc {
            fn decode(dec: &mut ::dagwire::cbor::Decoder<#de>) -> Result<Self, ::dagwire::Error> {
                #cbor
            }
        }

        impl #impl_generics ::dagwire::json::Decode for #name #ty_generics #json_wc {
            fn decode(dec: &mut ::dagwire::json::Decoder<'_>) -> Result<Self, ::dagwire::Error> {
                #json
            }
        }
    }
}

fn empty_where() -> syn::WhereClause {
    syn::WhereClause {
        where_token: Default::default(),
        predicates: Default::default(),
    }
}

pub(crate) fn decode_struct(
    name: &Ident,
    generics: &Generics,
    data: &DataStruct,
    container: &ContainerAttr,
) -> syn::Result<TokenStream> {
    if container.repr.is_some() {
        return Err(syn::Error::new(
            name.span(),
            "`ipld(repr=...)` is only valid on enums; use `ipld(adapter=...)` for structs",
        ));
    }
    if let Some(adapter) = container.adapter {
        return Ok(adapter_decode(name, generics, adapter));
    }

    let (cbor_generics, de) = decode_lifetime(generics);
    let (cbor_impl_generics, _, cbor_base_wc) = cbor_generics.split_for_impl();
    let (impl_generics, ty_generics, base_wc) = generics.split_for_impl();

    match &data.fields {
        Fields::Named(named) => {
            let fields = crate::encode::collect_record_fields(named)?;
            let len = fields.len();

            let mut cbor_wc = cbor_base_wc.cloned().unwrap_or_else(empty_where);
            let mut json_wc = base_wc.cloned().unwrap_or_else(empty_where);
            for f in &fields {
                if !type_mentions_self(&f.ty, name) {
                    add_where_bound(&mut cbor_wc, &f.ty, quote!(::dagwire::cbor::Decode<#de>));
                    add_where_bound(&mut json_wc, &f.ty, quote!(::dagwire::json::Decode));
                }
            }

            // Strict arms walk the canonical key sequence; lenient arms
            // accept any permutation but each declared field exactly once.
            let cbor_strict: Vec<_> = cbor_field_order(&fields)
                .into_iter()
                .map(|i| {
                    let f = &fields[i];
                    let var = format_ident!("__f_{}", f.ident);
                    let key = &f.key;
                    let e = err(quote!(InvalidType), quote!(key_off));
                    quote! {
                        let key_off = dec.position();
                        if dec.key()? != #key {
                            return Err(#e);
                        }
                        let #var = ::dagwire::cbor::Decode::decode(dec)?;
                    }
                })
                .collect();

            let json_strict: Vec<_> = json_field_order(&fields)
                .into_iter()
                .enumerate()
                .map(|(pos, i)| {
                    let f = &fields[i];
                    let var = format_ident!("__f_{}", f.ident);
                    let key = &f.key;
                    let first = pos == 0;
                    let e = err(quote!(InvalidType), quote!(key_off));
                    quote! {
                        let key_off = dec.position();
                        match dec.entry_key(#first)? {
                            Some(k) if k == #key => {}
                            _ => return Err(#e),
                        }
                        let #var = ::dagwire::json::Decode::decode(dec)?;
                    }
                })
                .collect();

            let inits: Vec<_> = fields
                .iter()
                .map(|f| {
                    let var = format_ident!("__f_{}", f.ident);
                    let ty = &f.ty;
                    quote! {
                        let mut #var: ::core::option::Option<#ty> = ::core::option::Option::None;
                    }
                })
                .collect();

            let cbor_lenient_arms: Vec<_> = fields
                .iter()
                .map(|f| {
                    let var = format_ident!("__f_{}", f.ident);
                    let key = &f.key;
                    let e = err(quote!(InvalidType), quote!(key_off));
                    quote! {
                        #key => {
                            if #var.is_some() {
                                return Err(#e);
                            }
                            #var = ::core::option::Option::Some(
                                ::dagwire::cbor::Decode::decode(dec)?,
                            );
                        }
                    }
                })
                .collect();

            let json_key_arms: Vec<_> = fields
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let key = &f.key;
                    quote! { ::core::option::Option::Some(#key) => #i, }
                })
                .collect();

            let json_field_arms: Vec<_> = fields
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let var = format_ident!("__f_{}", f.ident);
                    let e = err(quote!(InvalidType), quote!(key_off));
                    quote! {
                        #i => {
                            if #var.is_some() {
                                return Err(#e);
                            }
                            #var = ::core::option::Option::Some(
                                ::dagwire::json::Decode::decode(dec)?,
                            );
                        }
                    }
                })
                .collect();

            let finals: Vec<_> = fields
                .iter()
                .map(|f| {
                    let ident = &f.ident;
                    let var = format_ident!("__f_{}", f.ident);
                    let e = err(quote!(InvalidType), quote!(map_off));
                    quote! { #ident: #var.ok_or(#e)?, }
                })
                .collect();

            let strict_finals: Vec<_> = fields
                .iter()
                .map(|f| {
                    let ident = &f.ident;
                    let var = format_ident!("__f_{}", f.ident);
                    quote! { #ident: #var, }
                })
                .collect();

            let len_err = err(quote!(InvalidType), quote!(map_off));
            let unknown_key_err = err(quote!(InvalidType), quote!(key_off));

            Ok(quote! {
                impl #cbor_impl_generics ::dagwire::cbor::Decode<#de> for #name #ty_generics #cbor_wc {
                    fn decode(dec: &mut ::dagwire::cbor::Decoder<#de>) -> Result<Self, ::dagwire::Error> {
                        let map_off = dec.position();
                        let map_len = dec.map_begin()?;
                        if map_len != #len {
                            return Err(#len_err);
                        }
                        if dec.strict() {
                            #(#cbor_strict)*
                            Ok(Self { #(#strict_finals)* })
                        } else {
                            #(#inits)*
                            for _ in 0..map_len {
                                let key_off = dec.position();
                                match dec.key()? {
                                    #(#cbor_lenient_arms)*
                                    _ => return Err(#unknown_key_err),
                                }
                            }
                            Ok(Self { #(#finals)* })
                        }
                    }
                }

                impl #impl_generics ::dagwire::json::Decode for #name #ty_generics #json_wc {
                    fn decode(dec: &mut ::dagwire::json::Decoder<'_>) -> Result<Self, ::dagwire::Error> {
                        let map_off = dec.position();
                        dec.object_begin()?;
                        if dec.strict() {
                            #(#json_strict)*
                            dec.object_end()?;
                            Ok(Self { #(#strict_finals)* })
                        } else {
                            #(#inits)*
                            let mut first = true;
                            loop {
                                let key_off = dec.position();
                                let idx = match dec.entry_key(first)? {
                                    ::core::option::Option::None => break,
                                    #(#json_key_arms)*
                                    ::core::option::Option::Some(_) => {
                                        return Err(#unknown_key_err)
                                    }
                                };
                                first = false;
                                match idx {
                                    #(#json_field_arms)*
                                    _ => unreachable!(),
                                }
                            }
                            Ok(Self { #(#finals)* })
                        }
                    }
                }
            })
        }

        Fields::Unnamed(unnamed) => {
            let mut cbor_wc = cbor_base_wc.cloned().unwrap_or_else(empty_where);
            let mut json_wc = base_wc.cloned().unwrap_or_else(empty_where);
            let mut vars = Vec::new();
            let mut cbor_items = Vec::new();
            let mut json_items = Vec::new();
            for (idx, field) in unnamed.unnamed.iter().enumerate() {
                ensure_no_ipld_attrs(&field.attrs, "tuple struct fields")?;
                let var = format_ident!("__v{idx}");
                vars.push(var.clone());
                if !type_mentions_self(&field.ty, name) {
                    add_where_bound(&mut cbor_wc, &field.ty, quote!(::dagwire::cbor::Decode<#de>));
                    add_where_bound(&mut json_wc, &field.ty, quote!(::dagwire::json::Decode));
                }
                let first = idx == 0;
                let e = err(quote!(InvalidType), quote!(off));
                cbor_items.push(quote! {
                    let #var = ::dagwire::cbor::Decode::decode(dec)?;
                });
                json_items.push(quote! {
                    if !dec.array_next(#first)? {
                        return Err(#e);
                    }
                    let #var = ::dagwire::json::Decode::decode(dec)?;
                });
            }
            let len = vars.len();
            let len_err = err(quote!(InvalidType), quote!(off));
            let trailing_err = err(quote!(InvalidType), quote!(off));
            let json_empty = len == 0;

            Ok(quote! {
                impl #cbor_impl_generics ::dagwire::cbor::Decode<#de> for #name #ty_generics #cbor_wc {
                    fn decode(dec: &mut ::dagwire::cbor::Decoder<#de>) -> Result<Self, ::dagwire::Error> {
                        let off = dec.position();
                        let arr_len = dec.list_begin()?;
                        if arr_len != #len {
                            return Err(#len_err);
                        }
                        #(#cbor_items)*
                        Ok(Self( #(#vars),* ))
                    }
                }

                impl #impl_generics ::dagwire::json::Decode for #name #ty_generics #json_wc {
                    fn decode(dec: &mut ::dagwire::json::Decoder<'_>) -> Result<Self, ::dagwire::Error> {
                        let off = dec.position();
                        dec.array_begin()?;
                        #(#json_items)*
                        if dec.array_next(#json_empty)? {
                            return Err(#trailing_err);
                        }
                        Ok(Self( #(#vars),* ))
                    }
                }
            })
        }

        Fields::Unit => Ok(quote! {
            impl #cbor_impl_generics ::dagwire::cbor::Decode<#de> for #name #ty_generics #cbor_base_wc {
                fn decode(dec: &mut ::dagwire::cbor::Decoder<#de>) -> Result<Self, ::dagwire::Error> {
                    dec.null()?;
                    Ok(Self)
                }
            }

            impl #impl_generics ::dagwire::json::Decode for #name #ty_generics #base_wc {
                fn decode(dec: &mut ::dagwire::json::Decoder<'_>) -> Result<Self, ::dagwire::Error> {
                    dec.null()?;
                    Ok(Self)
                }
            }
        }),
    }
}

pub(crate) fn decode_enum(
    name: &Ident,
    generics: &Generics,
    data: &DataEnum,
    container: &ContainerAttr,
) -> syn::Result<TokenStream> {
    if let Some(adapter) = container.adapter {
        return Ok(adapter_decode(name, generics, adapter));
    }

    let variants = enum_variants(data)?;
    let (cbor_generics, de) = decode_lifetime(generics);
    let (cbor_impl_generics, _, cbor_wc) = cbor_generics.split_for_impl();
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let unknown = err(quote!(InvalidValue), quote!(off));

    let (cbor_body, json_body) = match container.repr.unwrap_or_default() {
        EnumRepr::Int => {
            let arms: Vec<_> = variants
                .iter()
                .map(|(ident, _, tag)| quote! { #tag => Ok(Self::#ident), })
                .collect();
            let body = quote! {
                let off = dec.position();
                match dec.int()? {
                    #(#arms)*
                    _ => Err(#unknown),
                }
            };
            (body.clone(), body)
        }
        EnumRepr::String => {
            let arms: Vec<_> = variants
                .iter()
                .map(|(ident, wire, _)| quote! { #wire => Ok(Self::#ident), })
                .collect();
            (
                quote! {
                    let off = dec.position();
                    match dec.text()? {
                        #(#arms)*
                        _ => Err(#unknown),
                    }
                },
                quote! {
                    let off = dec.position();
                    match dec.str()? {
                        #(#arms)*
                        _ => Err(#unknown),
                    }
                },
            )
        }
    };

    Ok(quote! {
        impl #cbor_impl_generics ::dagwire::cbor::Decode<#de> for #name #ty_generics #cbor_wc {
            fn decode(dec: &mut ::dagwire::cbor::Decoder<#de>) -> Result<Self, ::dagwire::Error> {
                #cbor_body
            }
        }

        impl #impl_generics ::dagwire::json::Decode for #name #ty_generics #where_clause {
            fn decode(dec: &mut ::dagwire::json::Decoder<'_>) -> Result<Self, ::dagwire::Error> {
                #json_body
            }
        }
    })
}
